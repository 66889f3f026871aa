//! Agrcheck scene model
//!
//! This crate holds the data an importer produces for one delivered asset
//! bundle and the conformance engine consumes: geometry files with their
//! objects, materials, UV layers and texture tiles, site metadata, and the
//! threshold profiles the rules compare against.
//!
//! Nothing here inspects geometry for conformance; see `agrcheck-lint`.
//!
//! # Modules
//!
//! - [`scene`]: snapshot, files and bundle entries
//! - [`mesh`]: objects, transforms, mesh data and UV layers
//! - [`material`]: shader inputs and texture nodes
//! - [`texture`]: texture images and PNG decoding
//! - [`udim`]: UDIM tile sets
//! - [`metadata`]: geojson site descriptors
//! - [`classifier`]: functional-use code table
//! - [`role`]: object and file classification
//! - [`budgets`]: tier threshold profiles

pub mod budgets;
pub mod classifier;
pub mod error;
pub mod material;
pub mod mesh;
pub mod metadata;
pub mod role;
pub mod scene;
pub mod texture;
pub mod udim;

pub use budgets::TierProfile;
pub use classifier::{FnoClassifier, FnoLookup};
pub use error::SceneError;
pub use material::{Material, ShaderChannel, ShaderInput};
pub use mesh::{LightData, LightType, MeshData, MeshObject, ObjectKind, Transform, UvLayer};
pub use metadata::{FieldMismatch, GeoMetadata, GlassParams};
pub use role::{ClassifiedFile, FileKind, LightRole, Role};
pub use scene::{BundleEntry, ModelFile, SceneSnapshot, Tier};
pub use texture::TextureImage;
pub use udim::{TileChannel, UdimTile, UdimTileSet};
