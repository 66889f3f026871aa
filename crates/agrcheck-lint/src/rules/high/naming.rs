//! High tier naming: files, objects, lights, materials and textures.

use crate::finding::Check;
use crate::naming::{numeric_suffix, Throttle};
use crate::rules::{mask, LintRule, RuleFault, RuleInput};
use agrcheck_scene::{ClassifiedFile, FileKind, LightRole, Role, Tier};
use regex::escape;

pub const FILES: &str = "Naming. Files";
pub const OBJECTS: &str = "Naming. Objects";
pub const LIGHTS: &str = "Naming. Lights";
pub const MATERIALS: &str = "Naming. Materials";
pub const TEXTURES: &str = "Naming. Textures";
pub const BUILDING_INDEX: &str = "Naming. Building index";

/// Address fragments a file's names are built from.
struct NameParts {
    /// Escaped site address.
    site: String,
    /// Escaped building address: the file name without prefixes on
    /// multi-building sites, otherwise the site address.
    building: String,
    /// `_Ground` for ground files.
    ground_suffix: &'static str,
}

impl NameParts {
    fn new(input: &RuleInput, file: &ClassifiedFile) -> Self {
        let name = file.name();
        let site = escape(&input.address);
        let multi = input.is_multi_building() && !name.contains("Ground");
        let building = if multi {
            escape(&name.replace("SM_", "").replace("_Light", ""))
        } else {
            site.clone()
        };
        Self {
            site,
            building,
            ground_suffix: if name.contains("Ground") { "_Ground" } else { "" },
        }
    }
}

/// Name templates for every file, object, material and texture.
pub struct NamingRule;

impl NamingRule {
    fn file_masks(&self, parts: &NameParts, kind: FileKind) -> Vec<String> {
        let site = &parts.site;
        let building = &parts.building;
        match kind {
            FileKind::Ground => vec![
                format!(r"SM_{}_Ground\.fbx", site),
                format!(r"SM_{}_Ground\.geojson", site),
                format!(r"SM_{}_Ground\.zip", site),
            ],
            FileKind::GroundLight => vec![format!(r"SM_{}_Ground_Light\.fbx", site)],
            FileKind::BuildingLight => vec![format!(r"SM_{}_Light\.fbx", building)],
            FileKind::Building => vec![
                format!(r"SM_{}\.fbx", building),
                format!(r"SM_{}\.geojson", building),
                format!(r"SM_{}\.zip", building),
            ],
        }
    }

    fn check_files(&self, file: &ClassifiedFile, parts: &NameParts, check: &mut Check) -> Result<(), RuleFault> {
        let masks = self.file_masks(parts, file.kind);
        let names: Vec<Option<&str>> = match masks.len() {
            1 => vec![Some(file.file.file_name.as_str())],
            _ => vec![
                Some(file.file.file_name.as_str()),
                file.file.json_name.as_deref(),
                Some(file.file.zip_name.as_str()),
            ],
        };
        for (pattern, name) in masks.into_iter().zip(names) {
            check.inspect();
            match name {
                Some(name) => {
                    mask(self.id(), pattern)?.check(check, name);
                }
                None => check.add_error(format!("{}: geojson file not found", file.name())),
            }
        }
        Ok(())
    }

    fn material_pattern(parts: &NameParts, role: Role) -> Option<String> {
        match role {
            Role::Ground => Some(format!(r"M_{}_Ground_\d", parts.site)),
            Role::GroundGlass => Some(format!(r"M_{}_GroundGlass_\d", parts.site)),
            Role::Main => Some(format!(r"M_{}_Main_\d", parts.building)),
            Role::MainGlass => Some(format!(r"M_{}_MainGlass_\d", parts.building)),
            _ => None,
        }
    }

    fn object_pattern(parts: &NameParts, role: Role) -> Option<String> {
        match role {
            Role::Ground => Some(format!("SM_{}_Ground", parts.site)),
            Role::GroundGlass => Some(format!("SM_{}_GroundGlass", parts.site)),
            Role::Main => Some(format!("SM_{}_Main", parts.building)),
            Role::MainGlass => Some(format!("SM_{}_MainGlass", parts.building)),
            _ => None,
        }
    }

    fn light_pattern(parts: &NameParts, role: Role) -> Option<String> {
        let prefix = format!("{}{}", parts.building, parts.ground_suffix);
        match role {
            Role::Root => Some(format!("{}_Root", prefix)),
            Role::Light(LightRole::Omni) => Some(format!(r"{}_Omni_\d\d\d", prefix)),
            Role::Light(LightRole::Spot) => Some(format!(r"{}_Spot_\d\d\d", prefix)),
            _ => None,
        }
    }
}

impl LintRule for NamingRule {
    fn id(&self) -> &'static str {
        "high/naming"
    }

    fn description(&self) -> &'static str {
        "File, object, light, material and texture names follow the address templates"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.10.4.1", "2.10.4.2", "2.10.4.5", "2.10.4.6", "2.10.4.4", "2.10.4.3", "1.3.7"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let limit = input.profile.throttle.repeated_names;
        let mut checks = Vec::new();
        for file in &input.files {
            let name = file.name();
            let parts = NameParts::new(input, file);
            let multi = input.is_multi_building() && !name.contains("Ground");

            let mut files = Check::new(FILES, name, &["2.10.4.1"]);
            let mut objects = Check::new(OBJECTS, name, &["2.10.4.2"]);
            let lights_id = if file.kind.is_ground() { "2.10.4.6" } else { "2.10.4.5" };
            let mut lights = Check::new(LIGHTS, name, &[lights_id]);
            let mut materials = Check::new(MATERIALS, name, &["2.10.4.4"]);
            let mut textures = Check::new(TEXTURES, name, &["2.10.4.3"]);
            let mut index = Check::new(BUILDING_INDEX, name, &["1.3.7"]);

            if multi {
                index.inspect();
                if !file.kind.is_light() && numeric_suffix(name).is_none() {
                    index.add_error(file.file.file_name.as_str());
                }
                if !input.address.is_empty() && !name.contains(input.address.as_str()) {
                    files.add_error(format!("{}: building address does not match the site address", name));
                }
            }
            self.check_files(file, &parts, &mut files)?;

            let mut light_throttle = Throttle::new(limit);
            let mut collision_throttle = Throttle::new(limit);
            for (object, role) in file.objects() {
                if let Some(pattern) = Self::light_pattern(&parts, role) {
                    lights.inspect();
                    light_throttle.check_mask(&mut lights, &mask(self.id(), pattern)?, &object.name);
                    continue;
                }
                if !object.is_mesh() {
                    continue;
                }
                objects.inspect();
                match role {
                    Role::Collision { ground: false } => {
                        let pattern = format!(r"UCX_SM_{}_Main_\d\d\d", parts.building);
                        collision_throttle.check_mask(&mut objects, &mask(self.id(), pattern)?, &object.name);
                        continue;
                    }
                    Role::Collision { ground: true } => {
                        let pattern = format!(r"UCX_SM_{}_Ground_\d\d\d", parts.site);
                        mask(self.id(), pattern)?.check(&mut objects, &object.name);
                        continue;
                    }
                    _ => {}
                }
                match Self::object_pattern(&parts, role) {
                    Some(pattern) => {
                        mask(self.id(), pattern)?.check(&mut objects, &object.name);
                    }
                    None => objects.add_error(format!(
                        "Could not check mesh name {} (Main suffix may be missing)",
                        object.name
                    )),
                }
                for material in &object.materials {
                    materials.inspect();
                    match Self::material_pattern(&parts, role) {
                        Some(pattern) => {
                            mask(self.id(), pattern)?.check(&mut materials, &material.name);
                        }
                        None => materials.add_error(format!("Could not check material name of {}", object.name)),
                    }
                }
            }

            let prefix = format!("{}{}", parts.building, parts.ground_suffix);
            for (_, channel, texture) in file.file.udim_tiles.textures() {
                textures.inspect();
                let pattern = format!(r"T_{}_{}_\d\.\d\d\d\d\.png", prefix, channel);
                mask(self.id(), pattern)?.check(&mut textures, &texture.file_name);
            }

            checks.extend([files, objects, lights, materials, textures, index]);
        }
        Ok(checks)
    }
}
