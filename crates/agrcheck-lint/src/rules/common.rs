//! Rules shared by both tiers, parameterized by tier thresholds and ids.

use crate::finding::Check;
use crate::geometry::duplicate_vertex_count;
use crate::geometry::math::{length_squared, world_points};
use crate::rules::{LintRule, RuleFault, RuleInput};
use agrcheck_scene::{BundleEntry, ClassifiedFile, Role, Tier};
use std::collections::BTreeMap;

pub const TRANSFORMS: &str = "Geometry. Transforms";
pub const POLYCOUNT: &str = "Geometry. Polygon count";
pub const TRIANGULATION: &str = "Geometry. Triangulation";
pub const DUPLICATES: &str = "Geometry. Duplicate vertices";
pub const FILE_FORMAT: &str = "Files. Format";
pub const ARCHIVE_SIZE: &str = "Files. Archive size";
pub const NAME_CHARSET: &str = "Naming. Forbidden characters";
pub const NAME_LENGTH: &str = "Naming. Length";
pub const COLOR_ATTRIBUTES: &str = "FBX. Color attributes";

const LOCATION_EPSILON: f64 = 0.0001;
const ROTATION_EPSILON: f64 = 0.001;
const SCALE_EPSILON: f64 = 0.001;
const MIB: f64 = 1_048_576.0;

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn vector_text(v: [f64; 3]) -> String {
    format!("{}, {}, {}", round3(v[0]), round3(v[1]), round3(v[2]))
}

/// One non-neutral transform component of an object.
struct TransformFault<'a> {
    component: &'static str,
    object: &'a str,
    value: String,
}

impl TransformFault<'_> {
    fn line(&self) -> String {
        format!("{}, {}={}", self.object, self.component, self.value)
    }

    fn group_key(&self) -> String {
        self.object.chars().take(3).collect()
    }
}

/// Transform-identity lines for a file. Lights are exempt; runs of
/// collision proxies collapse to their first and last entry.
pub(crate) fn transform_errors(file: &ClassifiedFile, check: &mut Check, ignore_location: bool) {
    let mut faults = Vec::new();
    for (object, role) in file.objects() {
        if matches!(role, Role::Light(_)) {
            continue;
        }
        check.inspect();
        let t = &object.transform;
        if !ignore_location && length_squared(t.location) > LOCATION_EPSILON {
            faults.push(TransformFault {
                component: "Location",
                object: &object.name,
                value: vector_text(t.location),
            });
        }
        if length_squared(t.rotation) > ROTATION_EPSILON {
            faults.push(TransformFault {
                component: "Rotation",
                object: &object.name,
                value: vector_text(t.rotation.map(f64::to_degrees)),
            });
        }
        if t.scale.iter().any(|s| (s - 1.0).abs() > SCALE_EPSILON) {
            faults.push(TransformFault {
                component: "Scale",
                object: &object.name,
                value: vector_text(t.scale),
            });
        }
    }
    faults.sort_by_key(|f| f.group_key());

    let mut start = 0;
    while start < faults.len() {
        let key = faults[start].group_key();
        let end = faults[start..]
            .iter()
            .position(|f| f.group_key() != key)
            .map_or(faults.len(), |p| start + p);
        let group = &faults[start..end];
        if key.contains("UCX") && group.len() > 2 {
            check.add_error(group[0].line());
            check.add_error("...");
            check.add_error(group[group.len() - 1].line());
        } else {
            check.add_errors(group.iter().map(TransformFault::line));
        }
        start = end;
    }
}

/// Location, rotation and scale must be neutral.
pub struct TransformsRule {
    pub tier: Tier,
}

impl LintRule for TransformsRule {
    fn id(&self) -> &'static str {
        match self.tier {
            Tier::High => "high/transforms",
            Tier::Low => "low/transforms",
        }
    }

    fn description(&self) -> &'static str {
        "Objects carry identity transforms (low tier ignores location)"
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        match self.tier {
            Tier::High => &["2.3.21", "2.9.3"],
            Tier::Low => &["2.3.16"],
        }
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let mut checks = Vec::new();
        for file in &input.files {
            let mut check = Check::new(TRANSFORMS, file.name(), &[self.requirement_ids()[0]]);
            transform_errors(file, &mut check, self.tier == Tier::Low);
            if self.tier == Tier::High {
                let mut location = Check::new(TRANSFORMS, file.name(), &["2.9.3"])
                    .with_checked(check.checked_count);
                location.add_errors(check.errors.iter().filter(|e| e.contains("Location=")).cloned());
                checks.push(check);
                checks.push(location);
            } else {
                checks.push(check);
            }
        }
        Ok(checks)
    }
}

/// Polygon budgets, collision polygon budget and triangulation.
pub struct PolycountRule {
    pub tier: Tier,
}

impl LintRule for PolycountRule {
    fn id(&self) -> &'static str {
        match self.tier {
            Tier::High => "high/polycount",
            Tier::Low => "low/polycount",
        }
    }

    fn description(&self) -> &'static str {
        "Polygon count within the tier budget and every face a triangle"
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        match self.tier {
            Tier::High => &["2.3.12", "2.13.10", "2.13.11", "2.3.19"],
            Tier::Low => &["2.3.6", "2.3.12"],
        }
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let budget = &input.profile.polygons;
        let mut checks = Vec::new();
        for file in &input.files {
            let mut polycount = 0usize;
            let mut collision_polycount = 0usize;
            let mut non_triangles: Vec<(&str, usize)> = Vec::new();
            for (object, role) in file.meshes() {
                let faces = object.mesh.face_count();
                if role.is_collision() {
                    collision_polycount += faces;
                } else {
                    polycount += faces;
                }
                let quads = object.mesh.faces.iter().filter(|f| f.len() > 3).count();
                if quads > 0 {
                    non_triangles.push((&object.name, quads));
                }
            }
            let total = polycount + collision_polycount;

            let (limit, budget_id, tri_id) = match self.tier {
                Tier::High => (budget.high_max_polygons, "2.3.12", "2.3.19"),
                Tier::Low if file.kind.is_ground() => (budget.low_ground_max_polygons, "2.3.6", "2.3.12"),
                Tier::Low => (budget.low_max_polygons, "2.3.6", "2.3.12"),
            };
            let mut count = Check::new(POLYCOUNT, file.name(), &[budget_id]).with_checked(total);
            if polycount > limit {
                count.add_error(format!(
                    "{}: {} polygons, must be at most {}",
                    file.name(),
                    polycount,
                    limit
                ));
            }
            checks.push(count);

            if self.tier == Tier::High {
                let mut ratio = Check::new(POLYCOUNT, file.name(), &["2.13.10"]).with_checked(total);
                let mut absolute = Check::new(POLYCOUNT, file.name(), &["2.13.11"]).with_checked(total);
                if polycount < budget.collision_main_threshold {
                    if collision_polycount > budget.collision_max_polygons {
                        absolute.add_error(format!(
                            "{}: {} collision polygons (at most {})",
                            file.name(),
                            collision_polycount,
                            budget.collision_max_polygons
                        ));
                    }
                } else {
                    let max = polycount as f64 * budget.collision_max_ratio;
                    if collision_polycount as f64 > max {
                        ratio.add_error(format!(
                            "{}: {} collision polygons (at most {})",
                            file.name(),
                            collision_polycount,
                            max.round()
                        ));
                    }
                }
                checks.push(ratio);
                checks.push(absolute);
            }

            let mut triangulation = Check::new(TRIANGULATION, file.name(), &[tri_id]).with_checked(total);
            for (name, quads) in non_triangles {
                triangulation.add_error(format!("{}: {} non-triangular polygons", name, quads));
            }
            checks.push(triangulation);
        }
        Ok(checks)
    }
}

/// Vertices closer than the merge distance.
pub struct DuplicatesRule {
    pub tier: Tier,
}

impl LintRule for DuplicatesRule {
    fn id(&self) -> &'static str {
        match self.tier {
            Tier::High => "high/duplicates",
            Tier::Low => "low/duplicates",
        }
    }

    fn description(&self) -> &'static str {
        "No vertices within the merge distance of each other"
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        match self.tier {
            Tier::High => &["2.3.13"],
            Tier::Low => &["2.3.7"],
        }
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let distance = input.profile.polygons.merge_distance;
        let mut checks = Vec::new();
        for file in &input.files {
            let mut check = Check::new(DUPLICATES, file.name(), self.requirement_ids());
            for (object, _) in file.meshes() {
                check.inspect();
                let points = world_points(&object.transform, &object.mesh.vertices);
                let count = duplicate_vertex_count(&points, distance);
                if count > 0 {
                    check.add_error(format!("{}: {} duplicate vertices", object.name, count));
                }
            }
            checks.push(check);
        }
        Ok(checks)
    }
}

/// True when a directory or file name starts with four digits, the low
/// tier convention.
pub(crate) fn is_low_name(name: &str) -> bool {
    name.len() >= 4 && name.as_bytes()[..4].iter().all(u8::is_ascii_digit)
}

fn has_forbidden_chars(name: &str) -> bool {
    name.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
}

/// Bundle layout: formats, archive sizes and file name hygiene.
pub struct FilesRule {
    pub tier: Tier,
}

impl FilesRule {
    fn allowed_formats(&self) -> &'static [&'static str] {
        match self.tier {
            Tier::High => &["fbx", "geojson", "png"],
            Tier::Low => &["fbx"],
        }
    }

    fn max_archive_bytes(&self, input: &RuleInput) -> u64 {
        match self.tier {
            Tier::High => input.profile.files.high_max_archive_bytes,
            Tier::Low => input.profile.files.low_max_archive_bytes,
        }
    }
}

impl LintRule for FilesRule {
    fn id(&self) -> &'static str {
        match self.tier {
            Tier::High => "high/files",
            Tier::Low => "low/files",
        }
    }

    fn description(&self) -> &'static str {
        "Allowed file formats, archive sizes, name characters and lengths"
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.1.2", "2.1.1", "2.10.1", "2.10.2"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let mut by_directory: BTreeMap<&str, Vec<&BundleEntry>> = BTreeMap::new();
        by_directory.entry("").or_default();
        for entry in input.bundle {
            by_directory.entry(entry.directory()).or_default().push(entry);
        }

        let want_low = self.tier == Tier::Low;
        let max_name = input.profile.files.max_name_length;
        let mut checks = Vec::new();
        for (directory, entries) in by_directory {
            let root = directory.is_empty();
            let base = directory.rsplit('/').next().unwrap_or(directory);
            if !root && is_low_name(base) != want_low {
                continue;
            }
            let context = if root { input.root_name } else { base };
            let mut format = Check::new(FILE_FORMAT, context, &["2.1.2"]);
            let mut size = Check::new(ARCHIVE_SIZE, context, &["2.1.1"]);
            let mut charset = Check::new(NAME_CHARSET, context, &["2.10.1"]);
            let mut length = Check::new(NAME_LENGTH, context, &["2.10.2"]);

            for entry in entries {
                let name = entry.file_name();
                if name.contains(".blend") {
                    continue;
                }
                let extension = entry.extension();
                if root {
                    if extension == "zip" {
                        if is_low_name(name) != want_low {
                            continue;
                        }
                        size.inspect();
                        if entry.size > self.max_archive_bytes(input) {
                            size.add_error(format!("{} ({:.2} Mb)", name, entry.size as f64 / MIB));
                        }
                    } else if want_low {
                        // stray top level files are reported once, by the high tier
                        continue;
                    } else {
                        format.add_error(name);
                    }
                } else {
                    format.inspect();
                    if !self.allowed_formats().contains(&extension.as_str()) {
                        format.add_error(name);
                    }
                }
                charset.inspect();
                length.inspect();
                if has_forbidden_chars(name) {
                    charset.add_error(format!("Forbidden characters: {}", name));
                }
                if name.len() > max_name {
                    length.add_error(format!("Name too long: {}", name));
                }
            }
            checks.extend([format, size, charset, length]);
        }
        Ok(checks)
    }
}

/// Meshes must not carry vertex colour layers.
pub struct ColorAttributesRule {
    pub tier: Tier,
}

impl LintRule for ColorAttributesRule {
    fn id(&self) -> &'static str {
        match self.tier {
            Tier::High => "high/color-attributes",
            Tier::Low => "low/color-attributes",
        }
    }

    fn description(&self) -> &'static str {
        "Meshes carry no colour attributes"
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["4.1.1"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let limit = input.profile.throttle.repeated_names;
        let mut checks = Vec::new();
        for file in &input.files {
            let mut check = Check::new(COLOR_ATTRIBUTES, file.name(), &["4.1.1"]);
            let mut collisions = Vec::new();
            for (object, role) in file.meshes() {
                check.inspect();
                if object.color_attribute_count == 0 {
                    continue;
                }
                if role.is_collision() {
                    collisions.push(object.name.clone());
                } else {
                    check.add_error(object.name.as_str());
                }
            }
            let elided = collisions.len() > limit;
            check.add_errors(collisions.into_iter().take(limit));
            if elided {
                check.add_error("and so on");
            }
            checks.push(check);
        }
        Ok(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrcheck_scene::{MeshData, MeshObject, ModelFile, SceneSnapshot, TierProfile, Transform};
    use pretty_assertions::assert_eq;

    fn run(rule: &dyn LintRule, snapshot: &SceneSnapshot) -> Vec<Check> {
        let profile = TierProfile::default();
        let input = RuleInput::new(snapshot, rule.tier(), &profile);
        rule.check(&input).unwrap()
    }

    fn quad_mesh() -> MeshData {
        MeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            faces: vec![vec![0, 1, 2, 3]],
            loose_edges: Vec::new(),
        }
    }

    fn high_snapshot(objects: Vec<MeshObject>) -> SceneSnapshot {
        let mut file = ModelFile::new("SM_Lenina12_001.fbx");
        for object in objects {
            file = file.with_object(object);
        }
        SceneSnapshot {
            root_name: "Lenina12".to_string(),
            high_files: vec![file],
            ..Default::default()
        }
    }

    #[test]
    fn test_transforms_location_goes_to_both_ids() {
        let snapshot = high_snapshot(vec![
            MeshObject::new_mesh("SM_Lenina12_001_Main", quad_mesh()).with_transform(Transform::at([1.0, 0.0, 0.0])),
        ]);
        let checks = run(&TransformsRule { tier: Tier::High }, &snapshot);
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].errors, vec!["SM_Lenina12_001_Main, Location=1, 0, 0".to_string()]);
        assert_eq!(checks[1].requirement_ids, vec!["2.9.3".to_string()]);
        assert_eq!(checks[1].errors, checks[0].errors);
    }

    #[test]
    fn test_transforms_reject_mirrored_and_collapsed_scale() {
        for scale in [[1.0, 1.0, -1.0], [-1.0, -1.0, -1.0], [2f64.sqrt(), 1.0, 0.0]] {
            let snapshot = high_snapshot(vec![MeshObject::new_mesh("SM_Lenina12_001_Main", quad_mesh())
                .with_transform(Transform {
                    scale,
                    ..Default::default()
                })]);
            let checks = run(&TransformsRule { tier: Tier::High }, &snapshot);
            assert!(!checks[0].verified, "{:?}", scale);
            assert!(checks[0].errors[0].starts_with("SM_Lenina12_001_Main, Scale="));
        }

        let snapshot = high_snapshot(vec![MeshObject::new_mesh("SM_Lenina12_001_Main", quad_mesh())
            .with_transform(Transform {
                scale: [1.0, 1.0, -1.0],
                ..Default::default()
            })]);
        let checks = run(&TransformsRule { tier: Tier::High }, &snapshot);
        assert_eq!(checks[0].errors, vec!["SM_Lenina12_001_Main, Scale=1, 1, -1".to_string()]);
    }

    #[test]
    fn test_transforms_collapse_collision_runs() {
        let moved = Transform::at([0.0, 0.0, 2.0]);
        let snapshot = high_snapshot(
            (1..=4)
                .map(|i| {
                    MeshObject::new_mesh(format!("UCX_SM_Lenina12_001_Main_00{}", i), quad_mesh())
                        .with_transform(moved)
                })
                .collect(),
        );
        let checks = run(&TransformsRule { tier: Tier::High }, &snapshot);
        assert_eq!(
            checks[0].errors,
            vec![
                "UCX_SM_Lenina12_001_Main_001, Location=0, 0, 2".to_string(),
                "...".to_string(),
                "UCX_SM_Lenina12_001_Main_004, Location=0, 0, 2".to_string(),
            ]
        );
    }

    #[test]
    fn test_low_transforms_ignore_location() {
        let mut file = ModelFile::new("0001_Lenina12_01.fbx");
        file = file.with_object(
            MeshObject::new_mesh("SM_Lenina12_001_Main", quad_mesh()).with_transform(Transform::at([5.0, 5.0, 0.0])),
        );
        let snapshot = SceneSnapshot {
            low_files: vec![file],
            ..Default::default()
        };
        let checks = run(&TransformsRule { tier: Tier::Low }, &snapshot);
        assert_eq!(checks.len(), 1);
        assert!(checks[0].verified);
    }

    #[test]
    fn test_polycount_reports_quads_per_object() {
        let snapshot = high_snapshot(vec![MeshObject::new_mesh("SM_Lenina12_001_Main", quad_mesh())]);
        let checks = run(&PolycountRule { tier: Tier::High }, &snapshot);
        let ids: Vec<&str> = checks.iter().filter_map(|c| c.primary_id()).collect();
        assert_eq!(ids, vec!["2.3.12", "2.13.10", "2.13.11", "2.3.19"]);
        assert_eq!(checks[3].errors, vec!["SM_Lenina12_001_Main: 1 non-triangular polygons".to_string()]);
        assert!(checks[..3].iter().all(|c| c.verified));
    }

    #[test]
    fn test_duplicates_found() {
        let mut mesh = quad_mesh();
        mesh.vertices.push([0.0, 0.0, 0.0005]);
        let snapshot = high_snapshot(vec![MeshObject::new_mesh("SM_Lenina12_001_Main", mesh)]);
        let checks = run(&DuplicatesRule { tier: Tier::High }, &snapshot);
        assert_eq!(checks[0].errors, vec!["SM_Lenina12_001_Main: 1 duplicate vertices".to_string()]);
    }

    #[test]
    fn test_files_by_tier() {
        let snapshot = SceneSnapshot {
            root_name: "Lenina12".to_string(),
            high_files: vec![ModelFile::new("SM_Lenina12_001.fbx")],
            low_files: vec![ModelFile::new("0001_Lenina12_01.fbx")],
            bundle_entries: vec![
                BundleEntry::new("SM_Lenina12_001.zip", 600 * 1024 * 1024),
                BundleEntry::new("0001_Lenina12.zip", 10),
                BundleEntry::new("notes.txt", 10),
                BundleEntry::new("SM_Lenina12_001/SM_Lenina12_001.fbx", 10),
                BundleEntry::new("SM_Lenina12_001/preview.jpg", 10),
                BundleEntry::new("0001_Lenina12/0001_Lenina12_01.fbx", 10),
                BundleEntry::new("0001_Lenina12/0001 Lenina12.png", 10),
            ],
            ..Default::default()
        };
        let high = run(&FilesRule { tier: Tier::High }, &snapshot);
        let errors: Vec<String> = high.iter().flat_map(|c| c.errors.clone()).collect();
        assert_eq!(
            errors,
            vec!["notes.txt".to_string(), "SM_Lenina12_001.zip (600.00 Mb)".to_string(), "preview.jpg".to_string()]
        );

        let low = run(&FilesRule { tier: Tier::Low }, &snapshot);
        let errors: Vec<String> = low.iter().flat_map(|c| c.errors.clone()).collect();
        assert_eq!(
            errors,
            vec!["0001 Lenina12.png".to_string(), "Forbidden characters: 0001 Lenina12.png".to_string()]
        );
    }

    #[test]
    fn test_color_attributes_throttle_collisions() {
        let mut objects = vec![{
            let mut main = MeshObject::new_mesh("SM_Lenina12_001_Main", quad_mesh());
            main.color_attribute_count = 1;
            main
        }];
        for i in 1..=7 {
            let mut ucx = MeshObject::new_mesh(format!("UCX_SM_Lenina12_001_Main_00{}", i), quad_mesh());
            ucx.color_attribute_count = 1;
            objects.push(ucx);
        }
        let checks = run(&ColorAttributesRule { tier: Tier::High }, &high_snapshot(objects));
        assert_eq!(checks[0].error_count(), 1 + 5 + 1);
        assert_eq!(checks[0].errors.last().map(String::as_str), Some("and so on"));
    }
}
