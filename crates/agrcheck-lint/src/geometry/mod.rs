//! Geometry analysis kernel.
//!
//! Pure functions over immutable mesh snapshots: closedness, convexity,
//! duplicate vertices, proxy intersections and texel density.

pub mod math;
pub mod overlap;
pub mod texel;
pub mod topology;

pub use overlap::{overlapping_pairs, pairwise_overlap, WorldMesh};
pub use texel::{texel_density, TexelMode, TexelReport, TileStats};
pub use topology::{duplicate_vertex_count, euler_closed, is_convex, CONVEX_TOLERANCE_FACTOR};
