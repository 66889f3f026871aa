//! Full sweeps over hand-built snapshots: pipeline wiring, aggregation into
//! the checklist and re-run stability.

use agrcheck_lint::{
    run_sweep, Catalogue, CheckState, Checklist, Diagnostic, ReportData, RuleRegistry, SweepOptions, TierSweep,
};
use agrcheck_scene::{
    Material, MeshData, MeshObject, ModelFile, SceneSnapshot, Tier, TierProfile, Transform,
};
use pretty_assertions::assert_eq;

// =============================================================================
// Helper Functions
// =============================================================================

fn cube() -> MeshData {
    MeshData {
        vertices: vec![
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ],
        faces: vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![1, 2, 6, 5],
            vec![2, 3, 7, 6],
            vec![3, 0, 4, 7],
        ],
        loose_edges: Vec::new(),
    }
}

fn model(stem: &str) -> ModelFile {
    let mut file = ModelFile::new(format!("{}.fbx", stem));
    file.zip_name = format!("{}.zip", stem);
    file.json_name = Some(format!("{}.geojson", stem));
    file
}

/// A two-file high tier site whose main mesh carries a scaled transform.
fn high_site() -> SceneSnapshot {
    let ground = model("SM_Lenina12_Ground")
        .with_object(MeshObject::new_mesh("SM_Lenina12_Ground", cube()).with_material(Material::new("M_Lenina12_Ground_1")));
    let building = model("SM_Lenina12").with_object(
        MeshObject::new_mesh("SM_Lenina12_Main", cube())
            .with_material(Material::new("M_Lenina12_Main_1"))
            .with_transform(Transform {
                scale: [2.0, 1.0, 1.0],
                ..Default::default()
            }),
    );
    SceneSnapshot {
        root_name: "Lenina12".to_string(),
        high_files: vec![ground, building],
        ..Default::default()
    }
}

fn low_site() -> SceneSnapshot {
    let mut ground = ModelFile::new("0001_Lenina12_Ground.fbx");
    ground.zip_name = "0001_Lenina12.zip".to_string();
    let ground = ground
        .with_object(MeshObject::new_mesh("SM_Lenina12_Ground", cube()))
        .with_object(MeshObject::new_mesh("SM_Lenina12_GroundEl", cube()));
    SceneSnapshot {
        root_name: "0001_Lenina12".to_string(),
        low_files: vec![ground],
        ..Default::default()
    }
}

/// Catalogue holding one automatic row per requirement id the tier's rules
/// decide, plus one manual row and one automatic row no rule covers.
fn catalogue(tier: Tier) -> Catalogue {
    let mut rows = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for meta in RuleRegistry::for_tier(tier).rule_metadata() {
        for id in meta.requirement_ids {
            if seen.insert(id.clone()) {
                rows.push(serde_json::json!({
                    "req_id": id, "req_num": id, "category": meta.id, "name": meta.description, "auto": "1"
                }));
            }
        }
    }
    rows.push(serde_json::json!({"req_id": "m", "req_num": "9.1", "category": "Manual", "name": "Visual", "auto": "0"}));
    rows.push(serde_json::json!({"req_id": "u", "req_num": "9.2", "category": "Manual", "name": "Orphan", "auto": "1"}));
    Catalogue::from_json(tier, &serde_json::Value::Array(rows).to_string()).unwrap()
}

fn sweep(snapshot: &SceneSnapshot, tier: Tier) -> TierSweep {
    let profile = TierProfile::default();
    run_sweep(snapshot, tier, SweepOptions { profile: &profile, classifier: None })
}

// =============================================================================
// Integration Tests
// =============================================================================

#[test]
fn test_high_sweep_reports_scaled_main_mesh() {
    let snapshot = high_site();
    let sweep = sweep(&snapshot, Tier::High);
    assert!(sweep.faults.is_empty());

    let mut checklist = Checklist::from_catalogue(&catalogue(Tier::High));
    let diagnostics = checklist.apply_sweep(&sweep);

    let transforms = checklist.item("2.3.21").unwrap();
    assert_eq!(transforms.check_state, CheckState::Failed);
    assert!(transforms.error_text.contains("SM_Lenina12_Main, Scale=2, 1, 1"));
    assert!(!checklist.automatic_passed());

    assert!(diagnostics.contains(&Diagnostic::UnusedRequirement {
        tier: Tier::High,
        requirement_id: "9.2".to_string(),
    }));
    assert!(!checklist.item("9.2").unwrap().is_automatic);
    assert_eq!(checklist.item("9.1").unwrap().check_state, CheckState::Undefined);
}

#[test]
fn test_low_sweep_flags_incomplete_ground_file() {
    let snapshot = low_site();
    let sweep = sweep(&snapshot, Tier::Low);
    assert!(sweep.faults.is_empty());

    let mut checklist = Checklist::from_catalogue(&catalogue(Tier::Low));
    checklist.apply_sweep(&sweep);
    let content = checklist.item("2.1.4").unwrap();
    assert_eq!(content.check_state, CheckState::Failed);
    assert!(content.error_text.contains("Ground file is incomplete. Mesh Flora is missing"));
    assert_eq!(checklist.item("2.1.5").unwrap().check_state, CheckState::Verified);
    assert_eq!(checklist.item("2.3.3").unwrap().check_state, CheckState::Verified);
}

#[test]
fn test_rerun_is_idempotent() {
    let snapshot = high_site();
    let first_sweep = sweep(&snapshot, Tier::High);
    let second_sweep = sweep(&snapshot, Tier::High);
    assert_eq!(first_sweep.checks, second_sweep.checks);

    let mut checklist = Checklist::from_catalogue(&catalogue(Tier::High));
    checklist.apply_sweep(&first_sweep);
    let first = ReportData::new(&checklist, Some(&first_sweep), "Lenina12");
    checklist.apply_sweep(&second_sweep);
    let second = ReportData::new(&checklist, Some(&second_sweep), "Lenina12");

    assert_eq!(first.entries, second.entries);
    assert_eq!(first.digest, second.digest);
}

#[test]
fn test_every_check_names_a_requirement() {
    for (snapshot, tier) in [(high_site(), Tier::High), (low_site(), Tier::Low)] {
        let sweep = sweep(&snapshot, tier);
        assert!(!sweep.checks.is_empty());
        assert!(sweep.checks.iter().all(|c| c.primary_id().is_some()));

        let mut checklist = Checklist::from_catalogue(&catalogue(tier));
        let diagnostics = checklist.apply_sweep(&sweep);
        assert!(
            !diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::UnknownRequirement { .. })),
            "{:?}",
            diagnostics
        );
    }
}

#[test]
fn test_empty_snapshot_has_nothing_to_validate() {
    let snapshot = SceneSnapshot::from_json(r#"{"root_name": "Lenina12"}"#).unwrap();
    assert!(snapshot.is_empty());
}
