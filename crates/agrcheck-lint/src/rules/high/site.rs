//! Site descriptor and placement rules.

use crate::finding::Check;
use crate::geometry::texel::round2;
use crate::rules::{LintRule, RuleFault, RuleInput};
use agrcheck_scene::classifier::strip_spaces;
use agrcheck_scene::{FileKind, FnoLookup, Tier};

pub const GEOJSON_FIELDS: &str = "Geojson. Fields";
pub const PIVOT: &str = "Geometry. Pivot";

/// Functional-use code and required properties of each geojson.
pub struct GeojsonRule;

impl LintRule for GeojsonRule {
    fn id(&self) -> &'static str {
        "high/geojson"
    }

    fn description(&self) -> &'static str {
        "Geojson carries every required property and a classifier-consistent FNO code"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.2.1"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let mut checks = Vec::new();
        for file in &input.files {
            let mut check = Check::new(GEOJSON_FIELDS, file.name(), self.requirement_ids());
            let Some(metadata) = &file.file.metadata else {
                if !file.kind.is_light() {
                    let source = file.file.json_name.as_deref().unwrap_or(file.name());
                    check.add_error(format!("Could not read geojson data from {}", source));
                }
                checks.push(check);
                continue;
            };
            check.inspect();
            let code = metadata.fno_code().unwrap_or_default();
            let name = metadata.fno_name().unwrap_or_default();

            if file.kind == FileKind::Ground {
                if strip_spaces(&code) != "000" {
                    check.add_error("Use FNO_code \"000\" for the ground file");
                }
                checks.push(check);
                continue;
            }

            match input.classifier.map(|c| c.lookup(&code)) {
                None => check.add_error(format!("{}: classifier not loaded, FNO code not validated", code)),
                Some(FnoLookup::Malformed) => {
                    check.add_error(format!("{}: code does not match XXX, XXX XXX, XXX XXX XXX", code));
                    checks.push(check);
                    continue;
                }
                Some(FnoLookup::NotFound) => check.add_error(format!("{}: code not found in the classifier", code)),
                Some(FnoLookup::Found(names)) => {
                    for expected in names {
                        if strip_spaces(&expected) != strip_spaces(&name) {
                            check.add_error(format!(
                                "{}: code does not match name {}, should be {}",
                                code, name, expected
                            ));
                        }
                    }
                }
            }
            for property in metadata.missing_properties() {
                check.add_error(format!("Property \"{}\" not found", property));
            }
            checks.push(check);
        }
        Ok(checks)
    }
}

/// The main mesh origin sits near its bounding box centre.
pub struct PivotRule;

impl LintRule for PivotRule {
    fn id(&self) -> &'static str {
        "high/pivot"
    }

    fn description(&self) -> &'static str {
        "Main mesh origin within 10% of its footprint centre"
    }

    fn tier(&self) -> Tier {
        Tier::High
    }

    fn requirement_ids(&self) -> &'static [&'static str] {
        &["2.9.4а"]
    }

    fn check(&self, input: &RuleInput) -> Result<Vec<Check>, RuleFault> {
        let tolerance = input.profile.files.pivot_tolerance_percent;
        let mut checks = Vec::new();
        for file in &input.files {
            let Some(object) = file.file.main_mesh() else {
                continue;
            };
            let mut check = Check::new(PIVOT, file.name(), self.requirement_ids()).with_checked(1);
            let Some((min, max)) = object.mesh.bounds() else {
                checks.push(check);
                continue;
            };
            let dimensions = object.dimensions();
            let offset = |axis: usize| {
                if dimensions[axis] == 0.0 {
                    return 0.0;
                }
                let centre = (min[axis] + max[axis]) / 2.0;
                round2((centre * object.transform.scale[axis] / dimensions[axis] * 100.0).abs())
            };
            let (x, y) = (offset(0), offset(1));
            if x > tolerance || y > tolerance {
                check.add_error(format!(
                    "Origin is offset from the geometric centre (x: {}%, y: {}%)",
                    x, y
                ));
            }
            checks.push(check);
        }
        Ok(checks)
    }
}
