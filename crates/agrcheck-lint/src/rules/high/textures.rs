//! UDIM texture rules: texel density, tile numbering, resolutions,
//! glazing UVs and placeholder images.

use crate::finding::Check;
use crate::geometry::texel::round2;
use crate::geometry::{texel_density, TexelMode, TileStats};
use crate::rules::{LintRule, RuleFault, RuleInput};
use agrcheck_scene::udim::udim_tile_number;
use agrcheck_scene::{TileChannel, Tier};
use log::debug;
use std::collections::BTreeMap;

pub const REQUIRED_SET: &str = "UDIM. Required set";
pub const OUT_OF_BOUNDS: &str = "UDIM. Out of bounds";
pub const TEXEL_DENSITY: &str = "UDIM. Texel density";
pub const UNUSED_TEXTURES: &str = "UDIM. Unused textures";
pub const NUMBERING: &str = "UDIM. Numbering integrity";
pub const SET_RESOLUTION: &str = "UDIM. Texture set resolution";
pub const GLASS_UV: &str = "UDIM. Glazing";
pub const PNG_ALPHA: &str = "PNG. ERM, Normal alpha channel";
pub const PLACEHOLDER_ALPHA: &str = "PNG. Placeholder alpha channel";
pub const PLACEHOLDER_COLOR: &str = "PNG. Placeholder single colour";

/// Slack for glazing UVs lying on the tile border.
const UV_EPSILON: f64 = 1e-6;

/// One line per tile bucket that fell outside the density band.
pub(crate) fn density_lines(
    prefix: impl Fn(u32) -> String,
    relation: &str,
    bound: f64,
    buckets: &BTreeMap<u32, TileStats>,
) -> Vec<String> {
    buckets
        .iter()
        .map(|(tile, stats)| {
            format!(
                "{}: polygons {} {} px/m - {} pcs, mean density - {} px/m, total area - {} m2 (texture resolution - {})",
                prefix(*tile),
                relation,
                bound,
                stats.count(),
                round2(stats.mean()),
                round2(stats.total_area()),
                stats.resolution
            )
        })
        .collect()
}

/// Texel density of the main mesh against its UDIM tiles.
pub struct TexelRule;

impl LintRule for TexelRule {
    fn id(&self) -> &'static str {
        "high/texel"
    }

    fn description(&self) -> &'static str {
        "Main mesh UVs stay inside textured tiles at 512..1706 px/m"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.5.1.4.1", "2.5.2.1.5", "2.6.1", "2.5.1.8"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let textures = &input.profile.textures;
        let band = textures.high_texel_band();
        let mut checks = Vec::new();
        for file in &input.files {
            let Some(object) = file.file.main_mesh() else {
                continue;
            };
            let faces = object.mesh.face_count();
            let tiles = &file.file.udim_tiles;
            let mut required = Check::new(REQUIRED_SET, &object.name, &["2.5.1.4.1"]);
            let mut bounds = Check::new(OUT_OF_BOUNDS, &object.name, &["2.5.2.1.5"]).with_checked(faces);
            let mut density = Check::new(TEXEL_DENSITY, &object.name, &["2.6.1"]).with_checked(faces);
            let mut unused = Check::new(UNUSED_TEXTURES, &object.name, &["2.5.1.8"]);

            if TileChannel::ALL.iter().any(|c| tiles.channel(*c).next().is_none()) {
                required.add_error("Required texture set is Diffuse, ERM, Normal. Not every kind was found");
            }

            let resolutions = tiles.resolution_by_tile();
            if resolutions.values().all(|r| *r == textures.placeholder_resolution) {
                debug!("{}: only placeholder tiles, texel density skipped", file.name());
                checks.extend([required, bounds, density, unused]);
                continue;
            }

            let report = texel_density(
                object,
                &resolutions,
                TexelMode::Udim,
                band.clone(),
                textures.placeholder_resolution,
                textures.scene_unit_length,
            );
            if report.missing_uv_faces > 0 {
                debug!("{}: {} faces without UV coordinates", object.name, report.missing_uv_faces);
            }
            if report.densities.is_empty() {
                density.add_error("Could not compute texel density");
            }
            let udim = |tile: u32| format!("UDIM {}", tile);
            density.add_errors(density_lines(udim, "<", *band.start(), &report.less));
            density.add_errors(density_lines(udim, ">", *band.end(), &report.greater));

            if let Some((min, max)) = report.boundary_extent() {
                bounds.add_error(format!("Polygons outside UDIM bounds: {} pcs", report.boundary_faces));
                bounds.add_error("Approximate UV coordinates:");
                bounds.add_error(format!(
                    "    Minimum point uv=({}, {}), maximum point uv=({}, {})",
                    round2(min[0]),
                    round2(min[1]),
                    round2(max[0]),
                    round2(max[1])
                ));
            }

            let unused_tiles = report.unused_tiles(&resolutions);
            if !unused_tiles.is_empty() {
                let numbers: Vec<String> = unused_tiles.iter().map(u32::to_string).collect();
                unused.add_error(format!("Unused textures. UDIM numbers - {}", numbers.join(", ")));
            }
            checks.extend([required, bounds, density, unused]);
        }
        Ok(checks)
    }
}

/// Every tile carries all three channels, tiles numbered from 1001 on.
pub struct UdimNumberingRule;

impl LintRule for UdimNumberingRule {
    fn id(&self) -> &'static str {
        "high/udim-numbering"
    }

    fn description(&self) -> &'static str {
        "UDIM tiles are contiguous and each has Diffuse, ERM and Normal"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.5.2.1.3б"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let mut checks = Vec::new();
        for file in &input.files {
            if file.file.main_mesh().is_none() {
                continue;
            }
            let tiles = &file.file.udim_tiles;
            let mut check = Check::new(NUMBERING, file.name(), self.requirement_ids())
                .with_checked(tiles.textures().count());
            if !tiles.gaps().is_empty() {
                check.add_error("Diffuse  ERM      Normal   ");
                for tile in tiles.tiles() {
                    let row: String = TileChannel::ALL
                        .iter()
                        .map(|c| {
                            let cell = tile
                                .get(*c)
                                .map(|t| udim_tile_number(&t.file_name).to_string())
                                .unwrap_or_else(|| "....".to_string());
                            format!("{:<9}", cell)
                        })
                        .collect();
                    check.add_error(row);
                }
            }
            for texture in tiles.unresolved() {
                check.add_error(format!("{}: no tile number in the file name", texture.file_name));
            }
            checks.push(check);
        }
        Ok(checks)
    }
}

/// Allowed, square and consistent resolutions per tile.
pub struct ResolutionRule;

impl LintRule for ResolutionRule {
    fn id(&self) -> &'static str {
        "high/resolution"
    }

    fn description(&self) -> &'static str {
        "Tile textures are square, use allowed sizes and match within a tile"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.5.1.2", "2.5.1.3"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let textures = &input.profile.textures;
        let mut checks = Vec::new();
        for file in &input.files {
            if file.file.main_mesh().is_none() {
                continue;
            }
            let tiles = &file.file.udim_tiles;
            let mut allowed = Check::new(SET_RESOLUTION, file.name(), &["2.5.1.2"]);
            let mut matching = Check::new(SET_RESOLUTION, file.name(), &["2.5.1.3"]);
            // sets with missing slots are reported by the numbering rule
            if !tiles.gaps().is_empty() {
                checks.extend([allowed, matching]);
                continue;
            }

            for tile in tiles.tiles() {
                let mut widths = Vec::new();
                for (_, texture) in tile.textures() {
                    allowed.inspect();
                    let name = &texture.file_name;
                    if texture.width == 0 || texture.height == 0 {
                        allowed.add_error(format!("Could not read texture resolution {}", name));
                        continue;
                    }
                    for side in [texture.width, texture.height] {
                        if !textures.high_allowed_resolutions.contains(&side) {
                            allowed.add_error(format!("Invalid resolution: {} ({})", name, side));
                        }
                    }
                    if !texture.is_square() {
                        allowed.add_error(format!(
                            "Texture is not square: {} ({}x{})",
                            name, texture.width, texture.height
                        ));
                    }
                    widths.push(texture.width);
                }
                if widths.len() == TileChannel::ALL.len() {
                    let reference = widths.iter().copied().max().unwrap_or_default();
                    if widths
                        .iter()
                        .any(|w| *w != textures.placeholder_resolution && *w != reference)
                    {
                        matching.add_error(format!(
                            "Different resolutions in one tile are not allowed (udim: {})",
                            tile.number
                        ));
                    }
                }
            }
            checks.extend([allowed, matching]);
        }
        Ok(checks)
    }
}

/// The glazing mesh is unwrapped inside tile 1001.
pub struct GlassUvRule;

impl LintRule for GlassUvRule {
    fn id(&self) -> &'static str {
        "high/glass-uv"
    }

    fn description(&self) -> &'static str {
        "Glazing UVs lie inside UDIM tile 1001"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.5.2.2.1а"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let inside = |x: f64| (-UV_EPSILON..=1.0 + UV_EPSILON).contains(&x);
        let mut checks = Vec::new();
        for file in &input.files {
            let Some(glass) = file.meshes_where(|r| r.is_glass()).last() else {
                continue;
            };
            let mut check = Check::new(GLASS_UV, file.name(), self.requirement_ids()).with_checked(1);
            match glass.active_uv_layer() {
                None => check.add_error(format!("Could not find a UV map, obj={}", glass.name)),
                Some(layer) => {
                    let outside = layer
                        .faces
                        .iter()
                        .flatten()
                        .any(|uv| !inside(uv[0]) || !inside(uv[1]));
                    if outside {
                        check.add_error("Glazing UVs lie outside UDIM tile 1001");
                    }
                }
            }
            checks.push(check);
        }
        Ok(checks)
    }
}

/// Alpha and single-colour rules for tile images.
pub struct PngRule;

impl LintRule for PngRule {
    fn id(&self) -> &'static str {
        "high/png"
    }

    fn description(&self) -> &'static str {
        "ERM and Normal maps have no alpha; placeholders are opaque and single-coloured"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.5.1.6", "2.5.3.3", "2.5.3.4"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let placeholder = input.profile.textures.placeholder_resolution;
        let mut checks = Vec::new();
        for file in &input.files {
            let mut alpha = Check::new(PNG_ALPHA, file.name(), &["2.5.1.6"]);
            let mut placeholder_alpha = Check::new(PLACEHOLDER_ALPHA, file.name(), &["2.5.3.3"]);
            let mut single_color = Check::new(PLACEHOLDER_COLOR, file.name(), &["2.5.3.4"]);

            for (_, channel, texture) in file.file.udim_tiles.textures() {
                let name = &texture.file_name;
                alpha.inspect();
                let is_placeholder = texture.width == placeholder;
                match channel {
                    TileChannel::Diffuse => {
                        if is_placeholder && texture.has_alpha {
                            placeholder_alpha.add_error(format!("{}: placeholder with alpha channel", name));
                        }
                    }
                    TileChannel::Erm | TileChannel::Normal => {
                        if texture.has_alpha {
                            alpha.add_error(format!("{}: {} map with alpha channel", name, channel));
                        }
                    }
                }
                if !is_placeholder {
                    continue;
                }
                single_color.inspect();
                match texture.uniform_color {
                    Some(false) => single_color.add_error(format!("{}: multi-coloured placeholder", name)),
                    Some(true) => {}
                    None => single_color.add_error(format!("{}: pixels were not sampled, colour not verified", name)),
                }
            }
            checks.extend([alpha, placeholder_alpha, single_color]);
        }
        Ok(checks)
    }
}
