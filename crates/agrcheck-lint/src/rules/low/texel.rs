//! Texel density of the low tier ground surface.

use crate::finding::Check;
use crate::geometry::{texel_density, TexelMode};
use crate::rules::high::textures::{density_lines, TEXEL_DENSITY};
use crate::rules::{LintRule, RuleFault, RuleInput};
use agrcheck_scene::{ShaderChannel, Tier};
use std::collections::BTreeMap;

/// Density of `*_Ground` meshes against their base colour texture, ignoring
/// the vertical skirt faces.
pub struct TexelRule;

impl LintRule for TexelRule {
    fn id(&self) -> &'static str {
        "low/texel"
    }

    fn description(&self) -> &'static str {
        "Ground surface density between 10 and 40 px/m"
    }

    fn tier(&self) -> Tier {
        Tier::Low
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.6.1"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let textures = &input.profile.textures;
        let band = textures.low_texel_band();
        let mut checks = Vec::new();
        for file in input.files.iter().filter(|f| f.kind.is_ground()) {
            for (object, _) in file.meshes() {
                if !object.name.to_lowercase().ends_with("_ground") {
                    continue;
                }
                let mut check = Check::new(TEXEL_DENSITY, &object.name, self.requirement_ids())
                    .with_checked(object.mesh.face_count());

                let resolution = object
                    .materials
                    .first()
                    .and_then(|m| m.input(ShaderChannel::BaseColor))
                    .and_then(|i| i.source_texture.as_ref())
                    .map(|t| t.width);
                let Some(resolution) = resolution else {
                    check.add_error(format!("{}: no base colour texture, density not computed", object.name));
                    checks.push(check);
                    continue;
                };

                let tiles = BTreeMap::from([(agrcheck_scene::udim::FIRST_TILE, resolution)]);
                let report = texel_density(
                    object,
                    &tiles,
                    TexelMode::SingleTile,
                    band.clone(),
                    textures.placeholder_resolution,
                    textures.scene_unit_length,
                );
                if report.densities.is_empty() {
                    check.add_error("Could not compute texel density");
                }
                let prefix = |_: u32| object.name.clone();
                check.add_errors(density_lines(prefix, "<", *band.start(), &report.less));
                check.add_errors(density_lines(prefix, ">", *band.end(), &report.greater));
                checks.push(check);
            }
        }
        Ok(checks)
    }
}
