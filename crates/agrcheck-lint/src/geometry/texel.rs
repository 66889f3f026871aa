//! Texel density of a mesh against its UDIM tile resolutions.

use super::math::{angle, newell_normal, scaled_points, triangle_area, uv_area, Vec3};
use agrcheck_scene::udim::{uv_tile_number, FIRST_TILE};
use agrcheck_scene::MeshObject;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

const UNIT_SCALE: f64 = 100.0;
/// Density recorded for triangles with no UV or world area.
const DEGENERATE_DENSITY: f64 = 0.0001 * UNIT_SCALE;
/// Slack for UV corners lying exactly on a tile border.
const TILE_EPSILON: f64 = 1e-6;

/// How tiles are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelMode {
    /// Tiles come from the UV coordinates; triangles must stay inside one.
    Udim,
    /// Everything maps to tile 1001 and vertical faces are skipped.
    SingleTile,
}

/// Density samples of one tile that fell on the same side of the band.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileStats {
    pub resolution: u32,
    pub densities: Vec<f64>,
    pub areas: Vec<f64>,
}

impl TileStats {
    pub fn count(&self) -> usize {
        self.densities.len()
    }

    pub fn mean(&self) -> f64 {
        if self.densities.is_empty() {
            return 0.0;
        }
        self.densities.iter().sum::<f64>() / self.densities.len() as f64
    }

    pub fn total_area(&self) -> f64 {
        self.areas.iter().sum()
    }
}

/// Result of a texel density pass over one object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TexelReport {
    /// Every density that could be computed.
    pub densities: Vec<f64>,
    pub less: BTreeMap<u32, TileStats>,
    pub greater: BTreeMap<u32, TileStats>,
    /// Triangles whose UVs leave their tile or land on a tile with no
    /// texture.
    pub boundary_faces: usize,
    /// UV corners of those triangles.
    pub boundary_points: Vec<[f64; 2]>,
    /// Faces without UV coordinates.
    pub missing_uv_faces: usize,
    pub used_tiles: BTreeSet<u32>,
}

impl TexelReport {
    /// Tiles with a texture that no triangle maps to.
    pub fn unused_tiles(&self, resolutions: &BTreeMap<u32, u32>) -> Vec<u32> {
        resolutions
            .keys()
            .filter(|n| !self.used_tiles.contains(n))
            .copied()
            .collect()
    }

    /// Lexicographically smallest and largest boundary UV points.
    pub fn boundary_extent(&self) -> Option<([f64; 2], [f64; 2])> {
        let cmp = |a: &&[f64; 2], b: &&[f64; 2]| {
            a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1]))
        };
        let min = self.boundary_points.iter().min_by(cmp)?;
        let max = self.boundary_points.iter().max_by(cmp)?;
        Some((*min, *max))
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Texel density of a triangle in pixels per metre. `unit_length` is the
/// length of one scene unit.
pub fn density(resolution: u32, uv_area: f64, world_area: f64, unit_length: f64) -> f64 {
    if uv_area > 0.0 && world_area > 0.0 && unit_length > 0.0 {
        (resolution as f64 * uv_area.sqrt()) / (world_area.sqrt() * UNIT_SCALE)
            / unit_length
            * UNIT_SCALE
    } else {
        DEGENERATE_DENSITY
    }
}

/// Tile under the triangle centroid, and whether every corner stays in it.
fn tile_of(uvs: &[[f64; 2]]) -> (i64, bool) {
    let n = uvs.len() as f64;
    let cu = uvs.iter().map(|p| p[0]).sum::<f64>() / n;
    let cv = uvs.iter().map(|p| p[1]).sum::<f64>() / n;
    let (tu, tv) = (cu.floor(), cv.floor());
    let inside = uvs.iter().all(|p| {
        p[0] >= tu - TILE_EPSILON
            && p[0] <= tu + 1.0 + TILE_EPSILON
            && p[1] >= tv - TILE_EPSILON
            && p[1] <= tv + 1.0 + TILE_EPSILON
    });
    (uv_tile_number(cu, cv), inside)
}

/// Computes per-triangle densities of `object` and buckets those outside
/// `band`. Tiles whose resolution is at most `placeholder` are skipped.
pub fn texel_density(
    object: &MeshObject,
    resolutions: &BTreeMap<u32, u32>,
    mode: TexelMode,
    band: RangeInclusive<f64>,
    placeholder: u32,
    unit_length: f64,
) -> TexelReport {
    let mut report = TexelReport::default();
    let points = scaled_points(object);
    let layer = object.active_uv_layer();
    let up: Vec3 = [0.0, 0.0, 1.0];

    for (index, face) in object.mesh.faces.iter().enumerate() {
        let corners: Vec<Vec3> = face
            .iter()
            .filter_map(|&i| points.get(i as usize).copied())
            .collect();
        if corners.len() < 3 {
            continue;
        }
        if mode == TexelMode::SingleTile
            && angle(newell_normal(&corners), up).to_degrees().round() == 90.0
        {
            continue;
        }
        let uvs = match layer.and_then(|l| l.faces.get(index)) {
            Some(uvs) if uvs.len() == corners.len() => uvs,
            _ => {
                report.missing_uv_faces += 1;
                continue;
            }
        };

        for k in 1..corners.len() - 1 {
            let tri_uv = [uvs[0], uvs[k], uvs[k + 1]];
            let tile = match mode {
                TexelMode::SingleTile => FIRST_TILE,
                TexelMode::Udim => {
                    let (number, inside) = tile_of(&tri_uv);
                    let number = u32::try_from(number).ok().filter(|n| *n >= FIRST_TILE);
                    if let Some(n) = number {
                        report.used_tiles.insert(n);
                    }
                    match number.filter(|n| inside && resolutions.contains_key(n)) {
                        Some(n) => n,
                        None => {
                            report.boundary_faces += 1;
                            report.boundary_points.extend_from_slice(&tri_uv);
                            continue;
                        }
                    }
                }
            };
            let Some(&resolution) = resolutions.get(&tile) else {
                continue;
            };
            if resolution <= placeholder {
                continue;
            }

            let world = triangle_area(corners[0], corners[k], corners[k + 1]);
            let value = density(resolution, uv_area(&tri_uv), world, unit_length);
            let bucket = if value < *band.start() {
                Some(&mut report.less)
            } else if value > *band.end() {
                Some(&mut report.greater)
            } else {
                None
            };
            if let Some(bucket) = bucket {
                let stats = bucket.entry(tile).or_insert_with(|| TileStats {
                    resolution,
                    ..TileStats::default()
                });
                stats.densities.push(round2(value));
                stats.areas.push(round2(world));
            }
            report.densities.push(value);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrcheck_scene::{MeshData, UvLayer};

    const HIGH: RangeInclusive<f64> = 512.0..=1706.0;
    const LOW: RangeInclusive<f64> = 10.0..=40.0;

    fn quad(size: f64, uv: [[f64; 2]; 4]) -> MeshObject {
        let mesh = MeshData {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [size, 0.0, 0.0],
                [size, size, 0.0],
                [0.0, size, 0.0],
            ],
            faces: vec![vec![0, 1, 2, 3]],
            loose_edges: Vec::new(),
        };
        MeshObject::new_mesh("SM_Lenina12_001_Main", mesh).with_uv_layer(UvLayer {
            name: "UVMap".to_string(),
            faces: vec![uv.to_vec()],
        })
    }

    fn square(u0: f64, v0: f64, side: f64) -> [[f64; 2]; 4] {
        [[u0, v0], [u0 + side, v0], [u0 + side, v0 + side], [u0, v0 + side]]
    }

    fn tiles(resolution: u32) -> BTreeMap<u32, u32> {
        BTreeMap::from([(1001, resolution)])
    }

    #[test]
    fn test_full_tile_density_equals_resolution() {
        let report = texel_density(&quad(1.0, square(0.0, 0.0, 1.0)), &tiles(1024), TexelMode::Udim, HIGH, 256, 1.0);
        assert_eq!(report.densities.len(), 2);
        assert!(report.densities.iter().all(|d| (d - 1024.0).abs() < 1e-9));
        assert!(report.less.is_empty() && report.greater.is_empty());
        assert!(report.unused_tiles(&tiles(1024)).is_empty());
    }

    #[test]
    fn test_unit_length_divides_density() {
        let report = texel_density(&quad(1.0, square(0.0, 0.0, 1.0)), &tiles(1024), TexelMode::Udim, HIGH, 256, 2.0);
        assert!(report.densities.iter().all(|d| (d - 512.0).abs() < 1e-9));
        assert_eq!(density(1024, 1.0, 1.0, 0.0), DEGENERATE_DENSITY);
    }

    #[test]
    fn test_full_tile_is_outside_low_band() {
        let report = texel_density(&quad(1.0, square(0.0, 0.0, 1.0)), &tiles(1024), TexelMode::SingleTile, LOW, 256, 1.0);
        assert_eq!(report.greater[&1001].count(), 2);
    }

    #[test]
    fn test_density_scales_with_uv_and_world_size() {
        // A sixteenth of the tile on the same quad drops below the band.
        let small_uv = texel_density(&quad(1.0, square(0.0, 0.0, 0.25)), &tiles(1024), TexelMode::Udim, HIGH, 256, 1.0);
        assert!((small_uv.less[&1001].mean() - 256.0).abs() < 1e-9);
        assert_eq!(small_uv.less[&1001].total_area(), 1.0);

        // The full tile on a quad a quarter the side crosses the upper bound.
        let small_world = texel_density(&quad(0.25, square(0.0, 0.0, 1.0)), &tiles(1024), TexelMode::Udim, HIGH, 256, 1.0);
        assert!((small_world.greater[&1001].mean() - 4096.0).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_and_unused_tiles() {
        let resolutions = BTreeMap::from([(1001, 2048), (1002, 2048), (1003, 2048)]);
        let report = texel_density(&quad(1.0, square(0.5, 0.0, 1.0)), &resolutions, TexelMode::Udim, HIGH, 256, 1.0);
        assert_eq!(report.boundary_faces, 2);
        assert_eq!(report.unused_tiles(&resolutions), vec![1003]);
        let (min, max) = report.boundary_extent().unwrap();
        assert_eq!(min, [0.5, 0.0]);
        assert_eq!(max, [1.5, 1.0]);
    }

    #[test]
    fn test_second_tile_and_placeholder() {
        let resolutions = BTreeMap::from([(1001, 2048), (1002, 256)]);
        let report = texel_density(&quad(1.0, square(1.0, 0.0, 1.0)), &resolutions, TexelMode::Udim, HIGH, 256, 1.0);
        assert!(report.used_tiles.contains(&1002));
        assert!(report.densities.is_empty());
        assert_eq!(report.boundary_faces, 0);
    }

    #[test]
    fn test_vertical_faces_skipped_in_single_tile_mode() {
        let mesh = MeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
            faces: vec![vec![0, 1, 2, 3]],
            loose_edges: Vec::new(),
        };
        let wall = MeshObject::new_mesh("SM_Lenina12_Ground", mesh);
        let report = texel_density(&wall, &tiles(1024), TexelMode::SingleTile, LOW, 256, 1.0);
        assert!(report.densities.is_empty());
        assert_eq!(report.missing_uv_faces, 0);
    }

    #[test]
    fn test_missing_uv_layer() {
        let mut object = quad(1.0, square(0.0, 0.0, 1.0));
        object.uv_layers.clear();
        let report = texel_density(&object, &tiles(1024), TexelMode::Udim, HIGH, 256, 1.0);
        assert_eq!(report.missing_uv_faces, 1);
        assert!(report.densities.is_empty());
    }
}
