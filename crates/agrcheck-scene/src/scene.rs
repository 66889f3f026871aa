//! Files and the snapshot the importer hands to the engine.

use crate::error::SceneError;
use crate::mesh::MeshObject;
use crate::metadata::GeoMetadata;
use crate::udim::UdimTileSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    High,
    Low,
}

impl Tier {
    /// Low tier names start with a four digit code.
    pub fn from_name(name: &str) -> Self {
        let mut chars = name.chars();
        if (0..4).all(|_| chars.next().is_some_and(|c| c.is_ascii_digit())) {
            Tier::Low
        } else {
            Tier::High
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tier::High => "Highpoly",
            Tier::Low => "Lowpoly",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::High => write!(f, "high"),
            Tier::Low => write!(f, "low"),
        }
    }
}

/// One imported geometry file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub file_name: String,
    /// Directory the file was extracted into, relative to the bundle root.
    #[serde(default)]
    pub root_directory: String,
    /// Archive the file came from.
    #[serde(default)]
    pub zip_name: String,
    /// Geojson descriptor expected next to the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    #[serde(default)]
    pub meshes: Vec<MeshObject>,
    #[serde(default, rename = "textures")]
    pub udim_tiles: UdimTileSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GeoMetadata>,
    #[serde(default)]
    pub extraneous_animation_count: usize,
    #[serde(default)]
    pub extraneous_camera_count: usize,
    /// Collections in the file, including the scene collection.
    #[serde(default = "one")]
    pub extraneous_collection_count: usize,
}

fn one() -> usize {
    1
}

impl ModelFile {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            extraneous_collection_count: 1,
            ..Default::default()
        }
    }

    pub fn with_object(mut self, object: MeshObject) -> Self {
        self.meshes.push(object);
        self
    }

    pub fn with_tiles(mut self, tiles: UdimTileSet) -> Self {
        self.udim_tiles = tiles;
        self
    }

    pub fn with_metadata(mut self, metadata: GeoMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// File name without its extension.
    pub fn name(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.file_name)
    }

    pub fn tier(&self) -> Tier {
        Tier::from_name(&self.file_name)
    }

    pub fn is_low_tier(&self) -> bool {
        self.tier() == Tier::Low
    }

    /// The building body used as texel and pivot reference. Low tier files
    /// have none.
    pub fn main_mesh(&self) -> Option<&MeshObject> {
        if self.is_low_tier() {
            return None;
        }
        self.meshes.iter().find(|m| {
            let name = m.name.to_lowercase();
            m.is_mesh()
                && (name.contains("main") || name.contains("ground"))
                && !["ucx", "light", "glass"].iter().any(|s| name.contains(s))
        })
    }

    pub fn object(&self, name: &str) -> Option<&MeshObject> {
        self.meshes.iter().find(|m| m.name == name)
    }

    /// Resolves an object's parent within this file.
    pub fn parent_of(&self, object: &MeshObject) -> Option<&MeshObject> {
        object.parent.as_deref().and_then(|p| self.object(p))
    }
}

/// One on-disk entry of the delivered bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleEntry {
    /// Path relative to the bundle root, `/` separated.
    pub path: String,
    #[serde(default)]
    pub size: u64,
}

impl BundleEntry {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Parent directory, empty for top level entries.
    pub fn directory(&self) -> &str {
        self.path.rsplit_once('/').map(|(d, _)| d).unwrap_or("")
    }

    /// Lowercase extension without the dot.
    pub fn extension(&self) -> String {
        self.file_name()
            .rsplit_once('.')
            .map(|(_, e)| e.to_lowercase())
            .unwrap_or_default()
    }
}

/// Everything one sweep looks at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    /// Name of the delivered bundle directory.
    #[serde(default)]
    pub root_name: String,
    #[serde(default)]
    pub high_files: Vec<ModelFile>,
    #[serde(default)]
    pub low_files: Vec<ModelFile>,
    #[serde(default)]
    pub bundle_entries: Vec<BundleEntry>,
    /// Building count override; derived from the bundle when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oks_count: Option<usize>,
    /// Site address override; derived from file names when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl SceneSnapshot {
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(text)?)
    }

    /// True when there is nothing to validate.
    pub fn is_empty(&self) -> bool {
        self.high_files.is_empty() && self.low_files.is_empty()
    }

    pub fn files(&self, tier: Tier) -> &[ModelFile] {
        match tier {
            Tier::High => &self.high_files,
            Tier::Low => &self.low_files,
        }
    }

    /// Number of building archives: top level high tier zips that are not
    /// the ground archive.
    pub fn oks_count(&self) -> usize {
        if let Some(count) = self.oks_count {
            return count;
        }
        self.bundle_entries
            .iter()
            .filter(|e| {
                e.directory().is_empty()
                    && e.extension() == "zip"
                    && !e.file_name().to_lowercase().contains("ground")
                    && Tier::from_name(e.file_name()) == Tier::High
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshData;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tier_from_name() {
        assert_eq!(Tier::from_name("0123_Lenina12_Ground.fbx"), Tier::Low);
        assert_eq!(Tier::from_name("SM_Lenina12_Ground.fbx"), Tier::High);
        assert_eq!(Tier::from_name("012"), Tier::High);
    }

    #[test]
    fn test_name_strips_extension() {
        assert_eq!(ModelFile::new("SM_Lenina12_001.fbx").name(), "SM_Lenina12_001");
        assert_eq!(ModelFile::new("noext").name(), "noext");
    }

    #[test]
    fn test_main_mesh_skips_collision_and_glass() {
        let file = ModelFile::new("SM_Lenina12_001.fbx")
            .with_object(MeshObject::new_mesh("UCX_SM_Lenina12_001_Main_001", MeshData::default()))
            .with_object(MeshObject::new_mesh("SM_Lenina12_001_MainGlass", MeshData::default()))
            .with_object(MeshObject::new_mesh("SM_Lenina12_001_Main", MeshData::default()));
        assert_eq!(file.main_mesh().map(|m| m.name.as_str()), Some("SM_Lenina12_001_Main"));

        let low = ModelFile::new("0123_Lenina12_01.fbx")
            .with_object(MeshObject::new_mesh("SM_Lenina12_001_Main", MeshData::default()));
        assert!(low.main_mesh().is_none());
    }

    #[test]
    fn test_parent_lookup() {
        let file = ModelFile::new("SM_Lenina12_001_Light.fbx")
            .with_object(MeshObject::new_empty("Lenina12_001_Root"))
            .with_object(MeshObject::new_empty("child").with_parent("Lenina12_001_Root"));
        let child = file.object("child").unwrap();
        assert_eq!(file.parent_of(child).map(|p| p.name.as_str()), Some("Lenina12_001_Root"));
        assert!(file.parent_of(file.object("Lenina12_001_Root").unwrap()).is_none());
    }

    #[test]
    fn test_oks_count_from_bundle() {
        let snapshot = SceneSnapshot {
            bundle_entries: vec![
                BundleEntry::new("SM_Lenina12_Ground.zip", 10),
                BundleEntry::new("SM_Lenina12_001.zip", 10),
                BundleEntry::new("SM_Lenina12_002.zip", 10),
                BundleEntry::new("0123_Lenina12.zip", 10),
                BundleEntry::new("SM_Lenina12_001/SM_Lenina12_001.fbx", 10),
            ],
            ..Default::default()
        };
        assert_eq!(snapshot.oks_count(), 2);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_snapshot_json_defaults() {
        let snapshot = SceneSnapshot::from_json(
            r#"{"high_files": [{"file_name": "SM_A_Ground.fbx", "meshes": []}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.high_files[0].extraneous_collection_count, 1);
        assert!(snapshot.high_files[0].udim_tiles.is_empty());
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_bundle_entry_parts() {
        let entry = BundleEntry::new("dir/sub/T_A.1001.PNG", 3);
        assert_eq!(entry.file_name(), "T_A.1001.PNG");
        assert_eq!(entry.directory(), "dir/sub");
        assert_eq!(entry.extension(), "png");
    }
}
