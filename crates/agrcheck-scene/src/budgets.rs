//! Tier threshold profiles.
//!
//! Every numeric limit the rules compare against lives here so that a
//! stricter profile can be swapped in without touching rule code.
//!
//! This module provides:
//! - Threshold structs per concern (polygons, textures, materials, files)
//! - A unified `TierProfile` that combines all thresholds
//! - Pre-defined profiles: default, strict

use crate::error::SceneError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// Polygon and vertex limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonBudget {
    /// Maximum non-collision polygons in one high tier file.
    pub high_max_polygons: usize,
    /// Maximum polygons in a low tier ground file.
    pub low_ground_max_polygons: usize,
    /// Maximum polygons in any other low tier file.
    pub low_max_polygons: usize,
    /// Main meshes below this count use the absolute collision limit.
    pub collision_main_threshold: usize,
    /// Absolute collision polygon limit for small main meshes.
    pub collision_max_polygons: usize,
    /// Collision polygon limit as a fraction of the main mesh.
    pub collision_max_ratio: f64,
    /// Merge distance for duplicate vertex detection.
    pub merge_distance: f64,
}

impl Default for PolygonBudget {
    fn default() -> Self {
        Self {
            high_max_polygons: Self::DEFAULT_HIGH_MAX_POLYGONS,
            low_ground_max_polygons: Self::DEFAULT_LOW_GROUND_MAX_POLYGONS,
            low_max_polygons: Self::DEFAULT_LOW_MAX_POLYGONS,
            collision_main_threshold: 50_000,
            collision_max_polygons: 15_000,
            collision_max_ratio: 0.05,
            merge_distance: Self::DEFAULT_MERGE_DISTANCE,
        }
    }
}

impl PolygonBudget {
    pub const DEFAULT_HIGH_MAX_POLYGONS: usize = 2_000_000;
    pub const DEFAULT_LOW_GROUND_MAX_POLYGONS: usize = 180_000;
    pub const DEFAULT_LOW_MAX_POLYGONS: usize = 150_000;
    pub const DEFAULT_MERGE_DISTANCE: f64 = 0.0015;
}

/// Texture resolution and texel density limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureBudget {
    /// Resolution reserved for stand-in textures.
    pub placeholder_resolution: u32,
    pub high_allowed_resolutions: Vec<u32>,
    pub low_allowed_resolutions: Vec<u32>,
    /// Largest texture a low tier GroundEl material may use.
    pub ground_el_max_resolution: u32,
    pub high_texel_min: f64,
    pub high_texel_max: f64,
    pub low_texel_min: f64,
    pub low_texel_max: f64,
    /// Length of one scene unit; densities are divided by it.
    pub scene_unit_length: f64,
}

impl Default for TextureBudget {
    fn default() -> Self {
        Self {
            placeholder_resolution: Self::DEFAULT_PLACEHOLDER_RESOLUTION,
            high_allowed_resolutions: vec![256, 2048, 4096],
            low_allowed_resolutions: vec![128, 256, 512, 1024, 2048],
            ground_el_max_resolution: 512,
            high_texel_min: 512.0,
            high_texel_max: 1706.0,
            low_texel_min: 10.0,
            low_texel_max: 40.0,
            scene_unit_length: 1.0,
        }
    }
}

impl TextureBudget {
    pub const DEFAULT_PLACEHOLDER_RESOLUTION: u32 = 256;

    pub fn high_texel_band(&self) -> RangeInclusive<f64> {
        self.high_texel_min..=self.high_texel_max
    }

    pub fn low_texel_band(&self) -> RangeInclusive<f64> {
        self.low_texel_min..=self.low_texel_max
    }
}

/// Material and light count ceilings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialBudget {
    /// Materials per high tier object, and per low tier glass object.
    pub max_materials: usize,
    /// Materials on a low tier ground object.
    pub low_ground_max_materials: usize,
    pub max_lights: usize,
}

impl Default for MaterialBudget {
    fn default() -> Self {
        Self {
            max_materials: 7,
            low_ground_max_materials: 20,
            max_lights: 50,
        }
    }
}

/// Bundle layout limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBudget {
    pub high_max_archive_bytes: u64,
    pub low_max_archive_bytes: u64,
    pub max_name_length: usize,
    pub low_max_files: usize,
    /// Allowed pivot offset as a percentage of the x/y dimension.
    pub pivot_tolerance_percent: f64,
}

impl Default for FileBudget {
    fn default() -> Self {
        Self {
            high_max_archive_bytes: 500 * 1024 * 1024,
            low_max_archive_bytes: 1024 * 1024 * 1024,
            max_name_length: Self::DEFAULT_MAX_NAME_LENGTH,
            low_max_files: 21,
            pivot_tolerance_percent: 10.0,
        }
    }
}

impl FileBudget {
    pub const DEFAULT_MAX_NAME_LENGTH: usize = 254;
}

/// How many repetitive lines a rule prints before eliding the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportThrottle {
    pub collision_pairs: usize,
    pub repeated_names: usize,
}

impl Default for ReportThrottle {
    fn default() -> Self {
        Self {
            collision_pairs: 15,
            repeated_names: 5,
        }
    }
}

/// A complete threshold profile for both tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierProfile {
    /// Profile identifier (e.g., "default", "strict").
    pub name: String,
    pub polygons: PolygonBudget,
    pub textures: TextureBudget,
    pub materials: MaterialBudget,
    pub files: FileBudget,
    pub throttle: ReportThrottle,
}

impl Default for TierProfile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            polygons: PolygonBudget::default(),
            textures: TextureBudget::default(),
            materials: MaterialBudget::default(),
            files: FileBudget::default(),
            throttle: ReportThrottle::default(),
        }
    }
}

impl TierProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the strict profile with halved polygon budgets and a
    /// narrower texel band.
    pub fn strict() -> Self {
        Self {
            name: "strict".to_string(),
            polygons: PolygonBudget {
                high_max_polygons: 1_000_000,
                low_ground_max_polygons: 90_000,
                low_max_polygons: 75_000,
                collision_max_polygons: 7_500,
                ..PolygonBudget::default()
            },
            textures: TextureBudget {
                high_texel_min: 768.0,
                low_texel_min: 15.0,
                ..TextureBudget::default()
            },
            materials: MaterialBudget {
                max_materials: 5,
                low_ground_max_materials: 15,
                max_lights: 30,
            },
            files: FileBudget {
                pivot_tolerance_percent: 5.0,
                ..FileBudget::default()
            },
            throttle: ReportThrottle::default(),
        }
    }

    /// Looks up a profile by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "strict" => Some(Self::strict()),
            _ => None,
        }
    }

    /// Parses a profile from JSON. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolves a profile name, falling back to reading a JSON file at
    /// that path.
    pub fn resolve(name_or_path: &str) -> Result<Self, SceneError> {
        if let Some(profile) = Self::by_name(name_or_path) {
            return Ok(profile);
        }
        let path = Path::new(name_or_path);
        if !path.is_file() {
            return Err(SceneError::UnknownProfile(name_or_path.to_string()));
        }
        log::debug!("loading tier profile from {}", path.display());
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
