//! High tier rules.
//!
//! Seventeen rules run in a fixed order for deterministic reporting:
//! - **Geometry**: transforms, polygon budgets, duplicate vertices, pivot
//! - **Textures**: texel density, UDIM numbering, resolutions, glazing UVs, PNG placeholders
//! - **Structure**: naming, file composition, materials, lights, collision proxies
//! - **Bundle**: file formats and sizes, geojson descriptors, colour attributes

pub mod naming;
pub mod site;
pub mod structure;
pub mod textures;


use crate::rules::common::{
    ColorAttributesRule, DuplicatesRule, FilesRule, PolycountRule, TransformsRule,
};
use crate::rules::LintRule;
use agrcheck_scene::Tier;

pub use naming::NamingRule;
pub use site::{GeojsonRule, PivotRule};
pub use structure::{CollisionRule, CompositionRule, LightsRule, MaterialsRule};
pub use textures::{GlassUvRule, PngRule, ResolutionRule, TexelRule, UdimNumberingRule};

/// Returns all high tier rules in pipeline order.
pub fn all_rules() -> Vec<Box<dyn LintRule>> {
    vec![
        Box::new(TransformsRule { tier: Tier::High }),
        Box::new(PolycountRule { tier: Tier::High }),
        Box::new(DuplicatesRule { tier: Tier::High }),
        Box::new(TexelRule),
        Box::new(NamingRule),
        Box::new(CompositionRule),
        Box::new(UdimNumberingRule),
        Box::new(ResolutionRule),
        Box::new(GlassUvRule),
        Box::new(MaterialsRule),
        Box::new(LightsRule),
        Box::new(CollisionRule),
        Box::new(FilesRule { tier: Tier::High }),
        Box::new(GeojsonRule),
        Box::new(PivotRule),
        Box::new(PngRule),
        Box::new(ColorAttributesRule { tier: Tier::High }),
    ]
}
