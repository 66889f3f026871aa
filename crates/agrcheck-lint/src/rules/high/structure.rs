//! Structural rules of high tier files: object composition, materials,
//! lights and collision proxies.

use crate::finding::Check;
use crate::geometry::math::scaled_points;
use crate::geometry::{euler_closed, is_convex, overlapping_pairs, WorldMesh, CONVEX_TOLERANCE_FACTOR};
use crate::naming::{join_capped, numeric_suffix, sequence_breaks};
use crate::rules::{LintRule, RuleFault, RuleInput};
use agrcheck_scene::{LightType, ObjectKind, ShaderChannel, Tier};

pub const EXTRA_OBJECTS: &str = "Composition. Extra objects";
pub const COLLECTIONS: &str = "Composition. Collections";
pub const HIERARCHY: &str = "Composition. Hierarchy";
pub const COLLISION_PRESENT: &str = "Composition. Collision geometry";
pub const SINGLE_MESH: &str = "Composition. Single mesh";
pub const SINGLE_GLASS: &str = "Composition. Single glazing";
pub const UV_MAPS: &str = "Materials. UV maps";
pub const COLLISION_UV: &str = "Materials. Collision UV maps";
pub const GLASS_MATERIALS: &str = "Materials. Glazing materials";
pub const COLLISION_MATERIALS: &str = "Materials. Collision materials";
pub const MATERIAL_COUNT: &str = "Materials. Count";
pub const SINGLE_MATERIAL: &str = "Materials. One material";
pub const SHADER_LINKS: &str = "Materials. Shader links";
pub const TEXTURE_NODES: &str = "Materials. Texture nodes";
pub const LIGHT_HIERARCHY: &str = "Lights. Hierarchy";
pub const LIGHT_TYPE: &str = "Lights. Type";
pub const LIGHT_DISTANCE: &str = "Lights. Custom distance";
pub const LIGHT_COUNT: &str = "Lights. Count";
pub const CONVEXITY: &str = "Collision. Convexity";
pub const NUMBERING: &str = "Collision. Numbering";
pub const INTERSECTIONS: &str = "Collision. Intersections";

/// Object inventory of a file: one body, one glazing, collision proxies,
/// nothing else.
pub struct CompositionRule;

impl LintRule for CompositionRule {
    fn id(&self) -> &'static str {
        "high/composition"
    }

    fn description(&self) -> &'static str {
        "One merged body, at most one glazing mesh, collision present, no extras or hierarchy"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.3.1а", "2.3.3", "2.3.10", "2.13.3", "2.3.7", "2.8.1"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let mut checks = Vec::new();
        for file in &input.files {
            let name = file.name();
            let objects = file.file.meshes.len();
            let mut extras = Check::new(EXTRA_OBJECTS, name, &["2.3.1а"]).with_checked(objects);
            let mut collections = Check::new(COLLECTIONS, name, &["2.3.3"]);
            let mut hierarchy = Check::new(HIERARCHY, name, &["2.3.10"]).with_checked(objects);
            let mut collision = Check::new(COLLISION_PRESENT, name, &["2.13.3"]).with_checked(objects);
            let mut single = Check::new(SINGLE_MESH, name, &["2.3.7"]).with_checked(objects);
            let mut glazing = Check::new(SINGLE_GLASS, name, &["2.8.1"]).with_checked(objects);

            if file.kind.is_light() {
                for object in &file.file.meshes {
                    if !matches!(object.kind, ObjectKind::Light | ObjectKind::Empty) {
                        extras.add_error(format!("Extra object: {} ({})", object.name, object.kind));
                    }
                }
            } else {
                let (mut ucx, mut glass, mut other) = (0usize, 0usize, 0usize);
                for (object, role) in file.objects() {
                    if let Some(parent) = &object.parent {
                        hierarchy.add_error(format!("{}: geometry objects must not be linked in a hierarchy", parent));
                    }
                    if !object.is_mesh() {
                        extras.add_error(format!("Extra object: {} ({})", object.name, object.kind));
                        continue;
                    }
                    if role.is_collision() {
                        ucx += 1;
                    } else if role.is_glass() {
                        glass += 1;
                    } else {
                        other += 1;
                    }
                }
                if ucx == 0 {
                    collision.add_error("No collision geometry found");
                }
                if other != 1 {
                    single.add_error(format!(
                        "All geometry except glass and collisions must be merged into a single mesh (Main or Ground). Found {} objects",
                        other
                    ));
                }
                if glass > 1 {
                    glazing.add_error(format!(
                        "{}: glazing must be merged into a single object. Found {} glass meshes",
                        name, glass
                    ));
                }
            }

            let source = file.file;
            if source.extraneous_animation_count > 0 {
                extras.add_error(format!("Extra animations: {}", source.extraneous_animation_count));
            }
            if source.extraneous_camera_count > 0 {
                extras.add_error(format!("Extra cameras: {}", source.extraneous_camera_count));
            }
            collections.inspect();
            if source.extraneous_collection_count > 1 {
                collections.add_error(format!("Extra collections: {}", source.extraneous_collection_count - 1));
            }
            checks.extend([extras, collections, hierarchy, collision, single, glazing]);
        }
        Ok(checks)
    }
}

/// UV layer counts, material ceilings and shader wiring.
pub struct MaterialsRule;

impl LintRule for MaterialsRule {
    fn id(&self) -> &'static str {
        "high/materials"
    }

    fn description(&self) -> &'static str {
        "One UV map per mesh, material ceilings by role, only Normal may be linked, no texture nodes"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.5.2.1.3а", "2.5.2.2.6", "2.8.2", "2.13.7", "2.4.7", "2.4.4", "2.4.3", "2.4.2"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let max = input.profile.materials.max_materials;
        let mut checks = Vec::new();
        for file in &input.files {
            let name = file.name();
            let mut uv_maps = Check::new(UV_MAPS, name, &["2.5.2.1.3а"]);
            let mut collision_uv = Check::new(COLLISION_UV, name, &["2.5.2.2.6"]);
            let mut glass_materials = Check::new(GLASS_MATERIALS, name, &["2.8.2"]);
            let mut collision_materials = Check::new(COLLISION_MATERIALS, name, &["2.13.7"]);
            let mut count = Check::new(MATERIAL_COUNT, name, &["2.4.7"]);
            let mut single = Check::new(SINGLE_MATERIAL, name, &["2.4.4"]);
            let mut links = Check::new(SHADER_LINKS, name, &["2.4.3"]);
            let mut nodes = Check::new(TEXTURE_NODES, name, &["2.4.2"]);

            let (mut collisions_with_uv, mut collisions_with_material) = (0usize, 0usize);
            for (object, role) in file.meshes() {
                let layers = object.uv_layers.len();
                if role.is_collision() {
                    collision_uv.inspect();
                    collision_materials.inspect();
                    if layers > 0 {
                        collisions_with_uv += 1;
                    }
                    if !object.materials.is_empty() {
                        collisions_with_material += 1;
                    }
                    continue;
                }

                uv_maps.inspect();
                if layers > 1 {
                    uv_maps.add_error(format!("{} - more than one UV map", object.name));
                } else if layers == 0 {
                    uv_maps.add_error(format!("{} - no UV map found", object.name));
                }

                let materials = object.materials.len();
                if role.is_glass() {
                    glass_materials.inspect();
                    if materials > max {
                        glass_materials.add_error(format!("{}: more than {} glass materials", object.name, max));
                    }
                } else {
                    count.inspect();
                    single.inspect();
                    if materials > max {
                        count.add_error(format!("{}: more than {} materials", object.name, max));
                    } else if materials == 0 {
                        count.add_error(format!("{}: no material", object.name));
                    }
                    if materials > 1 {
                        single.add_error(format!("{}: more than one material", object.name));
                    }
                }

                for material in &object.materials {
                    links.inspect();
                    nodes.inspect();
                    for channel in material.linked_channels() {
                        if channel != ShaderChannel::Normal {
                            links.add_error(format!("Extra link in material {} ({})", material.name, channel));
                        }
                    }
                    if !material.texture_nodes.is_empty() {
                        nodes.add_error(format!("{}: materials must not contain textures", material.name));
                    }
                }
            }
            if collisions_with_material > 0 {
                collision_materials.add_error(format!(
                    "Collision geometry must have no material. Collisions with material: {}",
                    collisions_with_material
                ));
            }
            if collisions_with_uv > 0 {
                collision_uv.add_error(format!(
                    "Collision objects must have no UV map. Collisions with UV map: {}",
                    collisions_with_uv
                ));
            }
            checks.extend([uv_maps, collision_uv, glass_materials, collision_materials, count, single, links, nodes]);
        }
        Ok(checks)
    }
}

/// Light files: a Root locator parenting point and spot lights.
pub struct LightsRule;

impl LintRule for LightsRule {
    fn id(&self) -> &'static str {
        "high/lights"
    }

    fn description(&self) -> &'static str {
        "Lights are point or spot, parented to Root, without custom distance, at most 50"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.15.9", "2.15.6", "2.15.8", "2.15.3"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let max = input.profile.materials.max_lights;
        let mut checks = Vec::new();
        for file in &input.files {
            let name = file.name();
            let mut hierarchy = Check::new(LIGHT_HIERARCHY, name, &["2.15.9"]);
            let mut kind = Check::new(LIGHT_TYPE, name, &["2.15.6"]);
            let mut distance = Check::new(LIGHT_DISTANCE, name, &["2.15.8"]);
            let mut count = Check::new(LIGHT_COUNT, name, &["2.15.3"]);

            if file.kind.is_light() {
                let mut lights = 0usize;
                for object in &file.file.meshes {
                    hierarchy.inspect();
                    match (object.kind, &object.light) {
                        (ObjectKind::Empty, _) => {
                            if object.parent.is_some() {
                                hierarchy.add_error(format!("{}: Root must not have a parent", object.name));
                            }
                        }
                        (ObjectKind::Light, Some(light)) => {
                            lights += 1;
                            kind.inspect();
                            distance.inspect();
                            if file.file.parent_of(object).is_none() {
                                hierarchy.add_error(format!("{}: lights must be parented to the Root locator", object.name));
                            }
                            if light.use_custom_distance {
                                distance.add_error(format!("{}: custom light distance must be disabled", object.name));
                            }
                            if !matches!(light.light_type, LightType::Point | LightType::Spot) {
                                kind.add_error(format!("{}: light type must be point or spot", object.name));
                            }
                        }
                        _ => hierarchy.add_error(format!(
                            "{}: unexpected {} object in a light file",
                            object.name, object.kind
                        )),
                    }
                }
                count.checked_count = lights;
                if lights > max {
                    count.add_error(format!("More than {} lights", max));
                }
            }
            checks.extend([hierarchy, kind, distance, count]);
        }
        Ok(checks)
    }
}

/// Collision proxies: closed, convex, disjoint and numbered from 001.
pub struct CollisionRule;

impl LintRule for CollisionRule {
    fn id(&self) -> &'static str {
        "high/collision"
    }

    fn description(&self) -> &'static str {
        "Collision proxies are closed, convex, do not intersect and are numbered contiguously"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.13.1", "2.10.4.2", "2.13.4"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let pair_limit = input.profile.throttle.collision_pairs;
        let mut checks = Vec::new();
        for file in &input.files {
            let name = file.name();
            let proxies: Vec<_> = file.meshes_where(|r| r.is_collision()).collect();
            let mut convexity = Check::new(CONVEXITY, name, &["2.13.1"]).with_checked(proxies.len());
            let mut numbering = Check::new(NUMBERING, name, &["2.10.4.2"]).with_checked(proxies.len());
            let mut intersections = Check::new(INTERSECTIONS, name, &["2.13.4"]).with_checked(proxies.len());

            let mut numbers = Vec::new();
            let mut unclosed = Vec::new();
            let mut concave = Vec::new();
            for proxy in &proxies {
                if let Some(number) = numeric_suffix(&proxy.name) {
                    numbers.push(number);
                }
                let label = proxy.name.get(proxy.name.len().saturating_sub(3)..).unwrap_or(&proxy.name);
                if !euler_closed(&proxy.mesh) {
                    unclosed.push(label.to_string());
                } else if !is_convex(&scaled_points(proxy), &proxy.mesh.faces, CONVEX_TOLERANCE_FACTOR) {
                    concave.push(label.to_string());
                }
            }
            unclosed.sort();
            concave.sort();
            if !unclosed.is_empty() {
                convexity.add_error(format!(
                    "Unclosed geometry. {} pcs, collision numbers - {}.",
                    unclosed.len(),
                    unclosed.join(", ")
                ));
            }
            if !concave.is_empty() {
                convexity.add_error(format!(
                    "Non-convex geometry. {} pcs, collision numbers - {}.",
                    concave.len(),
                    concave.join(", ")
                ));
            }

            let world: Vec<WorldMesh> = proxies.iter().map(|p| WorldMesh::from_object(p)).collect();
            let pairs: Vec<String> = overlapping_pairs(&world)
                .into_iter()
                .map(|(a, b)| {
                    let label = |i: usize| {
                        numeric_suffix(&proxies[i].name)
                            .map(|n| format!("{:03}", n))
                            .unwrap_or_else(|| proxies[i].name.clone())
                    };
                    format!("({} and {})", label(a), label(b))
                })
                .collect();
            if !pairs.is_empty() {
                intersections.add_error(format!(
                    "Collision intersections. {} pcs, collision numbers - {}",
                    pairs.len(),
                    join_capped(&pairs, pair_limit)
                ));
            }

            for number in sequence_breaks(&numbers) {
                numbering.add_error(format!("Collision numbering error (number {})", number));
            }
            checks.extend([convexity, numbering, intersections]);
        }
        Ok(checks)
    }
}
