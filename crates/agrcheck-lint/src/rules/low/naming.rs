//! Low tier naming and the packed-texture checks that share its walk over
//! materials.

use crate::finding::Check;
use crate::rules::{inner_segments, mask, LintRule, RuleFault, RuleInput};
use agrcheck_scene::{ShaderChannel, Tier};
use regex::escape;

pub const ZIP: &str = "Naming. Zip";
pub const FBX: &str = "Naming. Fbx";
pub const OBJECTS: &str = "Naming. Objects";
pub const MATERIALS: &str = "Naming. Materials";
pub const TEXTURES: &str = "Naming. Textures";
pub const PACKED: &str = "FBX. Packed textures";
pub const RESOLUTION: &str = "Textures. Resolution";
pub const ALPHA: &str = "Textures. Alpha channel";

/// Archive, file, object, material and texture templates of the low tier.
pub struct NamingRule;

impl LintRule for NamingRule {
    fn id(&self) -> &'static str {
        "low/naming"
    }

    fn description(&self) -> &'static str {
        "Low tier names follow the index and address templates; textures are packed, square and opaque"
    }

    fn tier(&self) -> Tier {
        Tier::Low
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.10.3.1", "2.10.3.2", "2.10.3.3", "2.10.3.5", "2.10.3.4", "2.5.1", "2.5.2", "2.5.5"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let allowed = &input.profile.textures.low_allowed_resolutions;
        let mut checks = Vec::new();
        for file in &input.files {
            let name = file.name();
            let mut zip = Check::new(ZIP, name, &["2.10.3.1"]);
            let mut fbx = Check::new(FBX, name, &["2.10.3.2"]);
            let mut objects = Check::new(OBJECTS, name, &["2.10.3.3"]);
            let mut materials = Check::new(MATERIALS, name, &["2.10.3.5"]);
            let mut textures = Check::new(TEXTURES, name, &["2.10.3.4"]);
            let mut packed = Check::new(PACKED, name, &["2.5.1"]);
            let mut resolution = Check::new(RESOLUTION, name, &["2.5.2"]);
            let mut alpha = Check::new(ALPHA, name, &["2.5.5"]);

            if !name.contains(input.address.as_str()) {
                fbx.add_error(format!("{}: building address does not match the site address", name));
            }
            let address = escape(&inner_segments(name));

            if file.kind.is_ground() {
                fbx.checked_count += 2;
                mask(self.id(), format!(r"\d\d\d\d_{}_Ground\.fbx", address))?.check(&mut fbx, &file.file.file_name);
                zip.inspect();
                mask(self.id(), format!(r"\d\d\d\d_{}\.zip", address))?.check(&mut zip, &file.file.zip_name);
            } else {
                fbx.checked_count += 3;
                mask(self.id(), format!(r"\d\d\d\d_{}_\d\d\.fbx", address))?.check(&mut fbx, &file.file.file_name);
            }

            for (object, role) in file.meshes() {
                let suffix = role.low_suffix();
                objects.inspect();
                mask(self.id(), format!("SM_{}{}", address, suffix))?.check(&mut objects, &object.name);

                for material in &object.materials {
                    materials.inspect();
                    let pattern = if role.is_glass() {
                        r"M_Glass_\d\d".to_string()
                    } else {
                        format!(r"M_{}{}_\d{{1,2}}", address, suffix)
                    };
                    mask(self.id(), pattern)?.check(&mut materials, &material.name);

                    for channel in ShaderChannel::TEXTURED {
                        let Some(texture) = material
                            .input(channel)
                            .filter(|i| i.linked)
                            .and_then(|i| i.source_texture.as_ref())
                        else {
                            continue;
                        };
                        let image = texture.file_name.as_str();
                        textures.inspect();
                        alpha.inspect();
                        packed.inspect();
                        resolution.inspect();
                        let pattern = format!(r"T_{}{}_{}_\d{{1,2}}\.png", address, suffix, channel.symbol());
                        mask(self.id(), pattern)?.check(&mut textures, image);
                        if texture.alpha_output_linked {
                            alpha.add_error(format!("Image alpha channel must not be used {}", image));
                        }
                        if !texture.is_packed {
                            packed.add_error(format!("Texture {} is not packed into the FBX", image));
                        }
                        if !texture.is_square() || !allowed.contains(&texture.width) {
                            resolution.add_error(format!(
                                "{}: invalid resolution {}x{}",
                                image, texture.width, texture.height
                            ));
                        }
                    }
                }
            }
            checks.extend([zip, fbx, objects, materials, textures, packed, resolution, alpha]);
        }
        Ok(checks)
    }
}
