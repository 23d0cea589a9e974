//! Tests for the apply engine: gates, per-action verification, rollback

use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tidy_core::{
    ApplyEngine, ApprovalStore, AuditLedger, Error, EventKind, FileOps, LocalFileOps, Observation,
    Plan, PlanGenerator, RuleSet,
};
use tidy_fs::MetaLayout;
use tidy_inventory::{InventoryProvider, LocalWalkProvider};
use tidy_test_utils::TestTree;

fn plan_for(tree: &TestTree) -> (MetaLayout, Plan) {
    let layout = MetaLayout::ensure(tree.root()).unwrap();
    let records = LocalWalkProvider::new().enumerate(layout.root()).unwrap();
    let plan = PlanGenerator::new(&layout, &RuleSet::default()).generate(&records);
    plan.save(&layout).unwrap();
    (layout, plan)
}

fn approve(layout: &MetaLayout, plan: &Plan) {
    ApprovalStore::new(layout.clone()).create(&plan.plan_id).unwrap();
}

fn kinds(layout: &MetaLayout, plan: &Plan) -> Vec<EventKind> {
    AuditLedger::for_layout(layout)
        .events_for(&plan.plan_id)
        .unwrap()
        .into_iter()
        .map(|e| e.event)
        .collect()
}

// ============================================================================
// Gates
// ============================================================================

#[test]
fn test_apply_without_approval_is_authorization_error() {
    let tree = TestTree::new();
    tree.write("x.tmp", "tmp");
    let (layout, plan) = plan_for(&tree);
    let engine = ApplyEngine::new(&layout);

    assert!(matches!(engine.dry_run(&plan), Err(Error::Authorization { .. })));

    // Ledger history does not substitute for approval
    AuditLedger::for_layout(&layout)
        .append(tidy_core::AuditEvent::new(EventKind::DryRun, &plan.plan_id))
        .unwrap();
    assert!(matches!(engine.apply(&plan), Err(Error::Authorization { .. })));
    tree.assert_file_exists("x.tmp");
}

#[test]
fn test_apply_without_dry_run_is_policy_violation() {
    let tree = TestTree::new();
    tree.write("x.tmp", "tmp");
    let (layout, plan) = plan_for(&tree);
    approve(&layout, &plan);

    let result = ApplyEngine::new(&layout).apply(&plan);

    assert!(matches!(result, Err(Error::PolicyViolation { .. })));
    tree.assert_file_exists("x.tmp");
    assert!(kinds(&layout, &plan).is_empty());
}

#[test]
fn test_dry_run_of_another_plan_does_not_count() {
    let tree = TestTree::new();
    tree.write("x.tmp", "tmp");
    let (layout, plan) = plan_for(&tree);
    approve(&layout, &plan);
    AuditLedger::for_layout(&layout)
        .append(tidy_core::AuditEvent::new(EventKind::DryRun, "some-other-plan"))
        .unwrap();

    let result = ApplyEngine::new(&layout).apply(&plan);

    assert!(matches!(result, Err(Error::PolicyViolation { .. })));
}

#[test]
fn test_corrupt_ledger_fails_dry_run_gate_closed() {
    let tree = TestTree::new();
    tree.write("x.tmp", "tmp");
    let (layout, plan) = plan_for(&tree);
    approve(&layout, &plan);
    let engine = ApplyEngine::new(&layout);
    engine.dry_run(&plan).unwrap();

    let mut file = OpenOptions::new()
        .append(true)
        .open(layout.audit_log_path())
        .unwrap();
    std::io::Write::write_all(&mut file, b"garbage\n").unwrap();

    assert!(matches!(engine.apply(&plan), Err(Error::PolicyViolation { .. })));
    tree.assert_file_exists("x.tmp");
}

#[test]
fn test_dry_run_not_required_when_policy_says_so() {
    let tree = TestTree::new();
    tree.write("x.tmp", "tmp");
    let (layout, mut plan) = plan_for(&tree);
    plan.policy.require_dry_run = false;
    approve(&layout, &plan);

    let outcome = ApplyEngine::new(&layout).apply(&plan).unwrap();

    assert_eq!(outcome.committed, 1);
    tree.assert_file_exists("99_QUARANTINE/x.tmp");
}

#[test]
fn test_action_budget_exceeded_touches_nothing() {
    // Scenario C
    let tree = TestTree::new();
    tree.write("x.tmp", "tmp");
    let (layout, mut plan) = plan_for(&tree);
    plan.policy.max_actions = 0;
    approve(&layout, &plan);
    let engine = ApplyEngine::new(&layout);

    assert!(matches!(engine.dry_run(&plan), Err(Error::PolicyViolation { .. })));
    assert!(matches!(engine.apply(&plan), Err(Error::PolicyViolation { .. })));

    tree.assert_file_exists("x.tmp");
    tree.assert_file_not_exists("99_QUARANTINE/x.tmp");
    assert!(kinds(&layout, &plan).is_empty());
}

#[test]
fn test_dry_run_mutates_nothing_but_the_ledger() {
    let tree = TestTree::new();
    tree.write("a.tmp", "a");
    tree.write("keep.txt", "k");
    let (layout, plan) = plan_for(&tree);
    approve(&layout, &plan);
    let before: Vec<_> = tree
        .files()
        .into_iter()
        .filter(|f| !f.starts_with("_meta/audit"))
        .collect();

    let outcome = ApplyEngine::new(&layout).dry_run(&plan).unwrap();

    let after: Vec<_> = tree
        .files()
        .into_iter()
        .filter(|f| !f.starts_with("_meta/audit"))
        .collect();
    assert_eq!(before, after);
    assert_eq!(outcome.lines.len(), 1);
    assert!(outcome.lines[0].starts_with("[DRY] quarantine: "));
    assert!(outcome.lines[0].contains("a.tmp -> "));
    assert_eq!(kinds(&layout, &plan), vec![EventKind::DryRun]);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scenario_a_full_pipeline() {
    let tree = TestTree::new();
    tree.write("a.tmp", "scratch data");
    let (layout, plan) = plan_for(&tree);
    assert_eq!(plan.actions.len(), 1);
    assert_eq!(plan.actions[0].dst, tree.path("99_QUARANTINE/a.tmp"));

    approve(&layout, &plan);
    let engine = ApplyEngine::new(&layout);
    engine.dry_run(&plan).unwrap();
    tree.assert_file_exists("a.tmp");

    let outcome = engine.apply(&plan).unwrap();

    assert_eq!(outcome.committed, 1);
    tree.assert_file_not_exists("a.tmp");
    assert_eq!(tree.read("99_QUARANTINE/a.tmp"), "scratch data");
    assert_eq!(
        kinds(&layout, &plan),
        vec![
            EventKind::DryRun,
            EventKind::ApplyStart,
            EventKind::ActionCommitted,
            EventKind::ApplyDone
        ]
    );

    let committed = AuditLedger::for_layout(&layout)
        .query(&plan.plan_id, EventKind::ActionCommitted)
        .unwrap();
    assert_eq!(committed[0].field_str("action_id"), Some("A-001"));
    assert_eq!(committed[0].field_str("type"), Some("quarantine"));
    assert_eq!(committed[0].payload["pre_size"], 12);
    assert_eq!(committed[0].payload["post_size"], 12);
}

#[test]
fn test_scenario_b_reapply_fails_on_missing_source() {
    let tree = TestTree::new();
    tree.write("a.tmp", "scratch");
    let (layout, plan) = plan_for(&tree);
    approve(&layout, &plan);
    let engine = ApplyEngine::new(&layout);
    engine.dry_run(&plan).unwrap();
    engine.apply(&plan).unwrap();

    let result = engine.apply(&plan);

    assert!(matches!(result, Err(Error::Precondition { ref action_id, .. }) if action_id == "A-001"));
    let committed = AuditLedger::for_layout(&layout)
        .query(&plan.plan_id, EventKind::ActionCommitted)
        .unwrap();
    assert_eq!(committed.len(), 1);
    assert_eq!(tree.read("99_QUARANTINE/a.tmp"), "scratch");
}

#[test]
fn test_existing_destination_stops_everything() {
    let tree = TestTree::new();
    tree.write("a.tmp", "first");
    tree.write("b.tmp", "second");
    tree.write("99_QUARANTINE/a.tmp", "unrelated data");
    let (layout, plan) = plan_for(&tree);
    assert_eq!(plan.actions.len(), 2);
    approve(&layout, &plan);
    let engine = ApplyEngine::new(&layout);
    engine.dry_run(&plan).unwrap();

    let result = engine.apply(&plan);

    assert!(matches!(result, Err(Error::Precondition { .. })));
    assert_eq!(tree.read("a.tmp"), "first");
    assert_eq!(tree.read("99_QUARANTINE/a.tmp"), "unrelated data");
    // The later action never ran
    assert_eq!(tree.read("b.tmp"), "second");
    tree.assert_file_not_exists("99_QUARANTINE/b.tmp");
    assert_eq!(
        kinds(&layout, &plan),
        vec![EventKind::DryRun, EventKind::ApplyStart, EventKind::ApplyFailed]
    );
}

#[test]
fn test_colliding_destinations_commit_first_and_stop() {
    let tree = TestTree::new();
    tree.write("one/dup.tmp", "from one");
    tree.write("two/dup.tmp", "from two");
    let (layout, plan) = plan_for(&tree);
    assert_eq!(plan.actions[0].dst, plan.actions[1].dst);
    approve(&layout, &plan);
    let engine = ApplyEngine::new(&layout);
    engine.dry_run(&plan).unwrap();

    let result = engine.apply(&plan);

    assert!(matches!(result, Err(Error::Precondition { ref action_id, .. }) if action_id == "A-002"));
    assert_eq!(tree.read("99_QUARANTINE/dup.tmp"), "from one");
    assert_eq!(tree.read("two/dup.tmp"), "from two");
    // Committed actions are not undone
    tree.assert_file_not_exists("one/dup.tmp");
}

#[test]
fn test_empty_plan_applies_trivially() {
    let tree = TestTree::new();
    tree.write("keep.txt", "k");
    let (layout, plan) = plan_for(&tree);
    assert!(plan.actions.is_empty());
    approve(&layout, &plan);
    let engine = ApplyEngine::new(&layout);
    engine.dry_run(&plan).unwrap();

    let outcome = engine.apply(&plan).unwrap();

    assert_eq!(outcome.committed, 0);
    assert_eq!(
        kinds(&layout, &plan),
        vec![EventKind::DryRun, EventKind::ApplyStart, EventKind::ApplyDone]
    );
}

// ============================================================================
// Verification and rollback
// ============================================================================

/// Reports a wrong fingerprint for anything inside the quarantine dir.
struct LyingObserver;

impl FileOps for LyingObserver {
    fn rename_no_clobber(&self, src: &Path, dst: &Path) -> tidy_fs::Result<()> {
        LocalFileOps.rename_no_clobber(src, dst)
    }

    fn observe(&self, path: &Path, fingerprint: bool) -> tidy_fs::Result<Observation> {
        let mut obs = LocalFileOps.observe(path, fingerprint)?;
        if path.components().any(|c| c.as_os_str() == "99_QUARANTINE") {
            obs.fingerprint = Some("sha256:0000".into());
        }
        Ok(obs)
    }
}

/// Truncates the destination right after moving it.
struct TruncatingMover;

impl FileOps for TruncatingMover {
    fn rename_no_clobber(&self, src: &Path, dst: &Path) -> tidy_fs::Result<()> {
        LocalFileOps.rename_no_clobber(src, dst)?;
        if dst.components().any(|c| c.as_os_str() == "99_QUARANTINE") {
            fs::write(dst, b"").unwrap();
        }
        Ok(())
    }

    fn observe(&self, path: &Path, fingerprint: bool) -> tidy_fs::Result<Observation> {
        LocalFileOps.observe(path, fingerprint)
    }
}

/// Lies about the destination and refuses every rename after the first.
struct StuckRollback {
    renames: Cell<usize>,
}

impl FileOps for StuckRollback {
    fn rename_no_clobber(&self, src: &Path, dst: &Path) -> tidy_fs::Result<()> {
        self.renames.set(self.renames.get() + 1);
        if self.renames.get() > 1 {
            return Err(tidy_fs::Error::io(
                dst,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        LocalFileOps.rename_no_clobber(src, dst)
    }

    fn observe(&self, path: &Path, fingerprint: bool) -> tidy_fs::Result<Observation> {
        LyingObserver.observe(path, fingerprint)
    }
}

/// Replaces the audit ledger with a directory once a file reaches quarantine.
struct LedgerBreaker {
    audit_log: PathBuf,
}

impl FileOps for LedgerBreaker {
    fn rename_no_clobber(&self, src: &Path, dst: &Path) -> tidy_fs::Result<()> {
        LocalFileOps.rename_no_clobber(src, dst)?;
        if dst.components().any(|c| c.as_os_str() == "99_QUARANTINE") {
            fs::remove_file(&self.audit_log).unwrap();
            fs::create_dir(&self.audit_log).unwrap();
        }
        Ok(())
    }

    fn observe(&self, path: &Path, fingerprint: bool) -> tidy_fs::Result<Observation> {
        LocalFileOps.observe(path, fingerprint)
    }
}

fn dry_run_ready(tree: &TestTree) -> (MetaLayout, Plan) {
    let (layout, plan) = plan_for(tree);
    approve(&layout, &plan);
    ApplyEngine::new(&layout).dry_run(&plan).unwrap();
    (layout, plan)
}

#[test]
fn test_fingerprint_mismatch_rolls_back_exact_content() {
    let tree = TestTree::new();
    tree.write("a.tmp", "precious bytes");
    tree.write("b.tmp", "never touched");
    let (layout, plan) = dry_run_ready(&tree);

    let result = ApplyEngine::with_ops(&layout, LyingObserver).apply(&plan);

    match result {
        Err(Error::Verification {
            action_id,
            rollback_failed,
            ..
        }) => {
            assert_eq!(action_id, "A-001");
            assert!(!rollback_failed);
        }
        other => panic!("expected Verification, got {:?}", other),
    }
    assert_eq!(tree.read("a.tmp"), "precious bytes");
    tree.assert_file_not_exists("99_QUARANTINE/a.tmp");
    tree.assert_file_exists("b.tmp");
    let committed = AuditLedger::for_layout(&layout)
        .query(&plan.plan_id, EventKind::ActionCommitted)
        .unwrap();
    assert!(committed.is_empty());
}

#[test]
fn test_truncated_destination_is_detected_and_moved_back() {
    let tree = TestTree::new();
    tree.write("a.tmp", "will be truncated");
    let (layout, plan) = dry_run_ready(&tree);

    let result = ApplyEngine::with_ops(&layout, TruncatingMover).apply(&plan);

    assert!(matches!(result, Err(Error::Verification { rollback_failed: false, .. })));
    tree.assert_file_exists("a.tmp");
    tree.assert_file_not_exists("99_QUARANTINE/a.tmp");
}

#[test]
fn test_size_is_verified_even_without_hashing() {
    let tree = TestTree::new();
    tree.write("a.tmp", "will be truncated");
    let (layout, mut plan) = plan_for(&tree);
    plan.policy.require_hash_verify = false;
    approve(&layout, &plan);
    let engine = ApplyEngine::with_ops(&layout, TruncatingMover);
    engine.dry_run(&plan).unwrap();

    let result = engine.apply(&plan);

    match result {
        Err(Error::Verification { detail, .. }) => assert!(detail.contains("size")),
        other => panic!("expected Verification, got {:?}", other),
    }
}

#[test]
fn test_failed_rollback_does_not_mask_verification_error() {
    let tree = TestTree::new();
    tree.write("a.tmp", "stuck");
    let (layout, plan) = dry_run_ready(&tree);

    let engine = ApplyEngine::with_ops(
        &layout,
        StuckRollback {
            renames: Cell::new(0),
        },
    );
    let result = engine.apply(&plan);

    assert!(matches!(result, Err(Error::Verification { rollback_failed: true, .. })));
    assert_eq!(tree.read("99_QUARANTINE/a.tmp"), "stuck");
    assert_eq!(
        kinds(&layout, &plan),
        vec![EventKind::DryRun, EventKind::ApplyStart, EventKind::ApplyFailed]
    );
}

#[test]
fn test_unrecorded_commit_is_moved_back() {
    let tree = TestTree::new();
    tree.write("a.tmp", "must not strand");
    tree.write("b.tmp", "never touched");
    let (layout, plan) = dry_run_ready(&tree);

    let engine = ApplyEngine::with_ops(
        &layout,
        LedgerBreaker {
            audit_log: layout.audit_log_path(),
        },
    );
    let result = engine.apply(&plan);

    assert!(matches!(result, Err(Error::Fs(_))), "got {:?}", result);
    assert_eq!(tree.read("a.tmp"), "must not strand");
    tree.assert_file_not_exists("99_QUARANTINE/a.tmp");
    tree.assert_file_exists("b.tmp");
}
