//! Low tier rules.
//!
//! The simplified tier ships one archive per site: a ground file and up to
//! twenty building files, each with textures packed into the FBX.

pub mod naming;
pub mod structure;
pub mod texel;


use crate::rules::common::{
    ColorAttributesRule, DuplicatesRule, FilesRule, PolycountRule, TransformsRule,
};
use crate::rules::LintRule;
use agrcheck_scene::Tier;

pub use naming::NamingRule;
pub use structure::{CompositionRule, MaterialsRule};
pub use texel::TexelRule;

/// Returns all low tier rules in pipeline order.
pub fn all_rules() -> Vec<Box<dyn LintRule>> {
    vec![
        Box::new(NamingRule),
        Box::new(TransformsRule { tier: Tier::Low }),
        Box::new(PolycountRule { tier: Tier::Low }),
        Box::new(DuplicatesRule { tier: Tier::Low }),
        Box::new(TexelRule),
        Box::new(CompositionRule),
        Box::new(FilesRule { tier: Tier::Low }),
        Box::new(MaterialsRule),
        Box::new(ColorAttributesRule { tier: Tier::Low }),
    ]
}
