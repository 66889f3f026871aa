//! Low tier file composition and material rules.

use crate::finding::Check;
use crate::rules::{LintRule, RuleFault, RuleInput};
use agrcheck_scene::{Role, ShaderChannel, Tier};

pub const FILE_COUNT: &str = "Files. FBX count";
pub const GROUND_PRESENT: &str = "Files. Ground file";
pub const GROUND_SINGLE: &str = "Files. Single ground file";
pub const EXTRA_OBJECTS: &str = "FBX. Extra objects";
pub const HIERARCHY: &str = "FBX. Hierarchy";
pub const GROUND_CONTENT: &str = "FBX. Ground file content";
pub const GROUND_MATERIALS: &str = "Materials. Ground count";
pub const GLASS_MATERIALS: &str = "Materials. Glazing count";
pub const SET_RESOLUTION: &str = "Textures. Set resolution";
pub const GROUND_EL_RESOLUTION: &str = "Textures. Ground element resolution";
pub const GLASS_TEXTURES: &str = "Textures. Glazing";
pub const MATERIAL_COUNT: &str = "Materials. Count";
pub const FLORA_MAPS: &str = "Materials. Flora diffuse";

/// Meshes a ground file must hold, with the roles that satisfy each.
const GROUND_CONTENT_ROLES: [(&str, Role); 3] = [
    ("Ground", Role::Ground),
    ("GroundEl", Role::GroundEl),
    ("Flora", Role::Flora),
];

/// Bundle composition: file count, a single ground file and clean files.
pub struct CompositionRule;

impl LintRule for CompositionRule {
    fn id(&self) -> &'static str {
        "low/composition"
    }

    fn description(&self) -> &'static str {
        "At most 21 files, exactly one ground file holding Ground, GroundEl and Flora, no extras"
    }

    fn tier(&self) -> Tier {
        Tier::Low
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.1.2", "2.1.5", "2.3.3", "2.1.3", "2.3.5", "2.1.4"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let max_files = input.profile.files.low_max_files;
        let files = input.files.len();
        let mut count = Check::new(FILE_COUNT, "", &["2.1.2"]).with_checked(files);
        let mut present = Check::new(GROUND_PRESENT, "", &["2.1.5"]).with_checked(files);
        let mut single = Check::new(GROUND_SINGLE, "", &["2.3.3"]).with_checked(files);
        if files > max_files {
            count.add_error(format!("More than {} FBX files", max_files));
        }

        let mut per_file = Vec::new();
        let mut grounds = 0usize;
        for file in &input.files {
            let name = file.name();
            let objects = file.file.meshes.len();
            let mut extras = Check::new(EXTRA_OBJECTS, name, &["2.1.3"]).with_checked(objects);
            let mut hierarchy = Check::new(HIERARCHY, name, &["2.3.5"]).with_checked(objects);
            let mut content = Check::new(GROUND_CONTENT, name, &["2.1.4"]);

            if file.kind.is_ground() {
                grounds += 1;
                for (mesh, role) in GROUND_CONTENT_ROLES {
                    content.inspect();
                    if !file.meshes().any(|(_, r)| r == role) {
                        content.add_error(format!("Ground file is incomplete. Mesh {} is missing", mesh));
                    }
                }
            }

            for object in &file.file.meshes {
                if !object.is_mesh() {
                    extras.add_error(format!("Extra object: {} ({})", object.name, object.kind));
                }
                if let Some(parent) = &object.parent {
                    hierarchy.add_error(format!("{}: geometry objects must not be linked in a hierarchy", parent));
                }
            }
            let source = file.file;
            if source.extraneous_animation_count > 0 {
                extras.add_error(format!("Extra animations: {}", source.extraneous_animation_count));
            }
            if source.extraneous_camera_count > 0 {
                extras.add_error(format!("Extra cameras: {}", source.extraneous_camera_count));
            }
            if source.extraneous_collection_count > 1 {
                extras.add_error(format!("Extra collections: {}", source.extraneous_collection_count - 1));
            }
            per_file.extend([extras, hierarchy, content]);
        }

        if grounds == 0 {
            present.add_error("The ground file is a mandatory part of the bundle");
        } else if grounds > 1 {
            single.add_error("Ground, ground elements and vegetation must be delivered in a single FBX file");
        }
        let mut checks = vec![count, present, single];
        checks.extend(per_file);
        Ok(checks)
    }
}

/// Material ceilings by role and texture constraints per material.
pub struct MaterialsRule;

impl LintRule for MaterialsRule {
    fn id(&self) -> &'static str {
        "low/materials"
    }

    fn description(&self) -> &'static str {
        "Material ceilings by role, uniform texture sizes, untextured glazing, Flora diffuse only"
    }

    fn tier(&self) -> Tier {
        Tier::Low
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.5.10", "2.4.6", "2.5.7", "2.5.11", "2.4.2", "2.5.9", "2.5.12"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let budget = &input.profile.materials;
        let ground_el_max = input.profile.textures.ground_el_max_resolution;
        let mut checks = Vec::new();
        for file in &input.files {
            let name = file.name();
            let mut ground = Check::new(GROUND_MATERIALS, name, &["2.5.10"]);
            let mut glass = Check::new(GLASS_MATERIALS, name, &["2.4.6"]);
            let mut sizes = Check::new(SET_RESOLUTION, name, &["2.5.7"]);
            let mut ground_el = Check::new(GROUND_EL_RESOLUTION, name, &["2.5.11"]);
            let mut glass_textures = Check::new(GLASS_TEXTURES, name, &["2.4.2"]);
            let mut count = Check::new(MATERIAL_COUNT, name, &["2.5.9"]);
            let mut flora = Check::new(FLORA_MAPS, name, &["2.5.12"]);

            for (object, role) in file.meshes() {
                let materials = object.materials.len();
                if role == Role::Ground {
                    ground.inspect();
                    if materials > budget.low_ground_max_materials {
                        ground.add_error(format!(
                            "{}: more than {} ground materials",
                            object.name, budget.low_ground_max_materials
                        ));
                    }
                } else if role.is_glass() {
                    glass.inspect();
                    if materials > budget.max_materials {
                        glass.add_error(format!("{}: more than {} glass materials", object.name, budget.max_materials));
                    }
                } else {
                    count.inspect();
                    if materials > 1 {
                        count.add_error(format!("{}: more than one material", object.name));
                    }
                }

                for material in &object.materials {
                    sizes.inspect();
                    let widths: Vec<u32> = material.texture_nodes.iter().map(|t| t.width).collect();
                    if widths.iter().any(|w| Some(w) != widths.first()) {
                        sizes.add_error(format!("{}: every texture of a material must have the same size", material.name));
                    }
                    if matches!(role, Role::GroundEl | Role::GroundElGlass) && widths.iter().any(|w| *w > ground_el_max) {
                        ground_el.add_error(format!(
                            "{}: ground element textures must be at most {}px",
                            object.name, ground_el_max
                        ));
                    }
                    if role.is_glass() && !widths.is_empty() {
                        glass_textures.add_error(format!("{}: translucent parts must not contain textures", object.name));
                    }
                    if role == Role::Flora && material.has_principled() {
                        flora.inspect();
                        if material.is_linked(ShaderChannel::Metallic) {
                            flora.add_error(format!("{}: Flora must not use a metallic map", material.name));
                        }
                        if material.is_linked(ShaderChannel::Roughness) {
                            flora.add_error(format!("{}: Flora must not use a roughness map", material.name));
                        }
                        let diffuse = material.input(ShaderChannel::BaseColor);
                        if !diffuse.is_some_and(|i| i.linked && i.source_texture.is_some()) {
                            flora.add_error(format!("{}: diffuse map is missing", material.name));
                        }
                    }
                }
            }
            checks.extend([ground, glass, sizes, ground_el, glass_textures, count, flora]);
        }
        Ok(checks)
    }
}
