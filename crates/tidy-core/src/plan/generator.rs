//! Plan generation from an inventory

use super::{Action, Plan, Policy, Rule, RuleSet};
use chrono::Utc;
use tidy_fs::MetaLayout;
use tidy_inventory::FileRecord;
use uuid::Uuid;

/// Builds plans by running rules over an ordered inventory.
///
/// Action ids follow inventory order, so a deterministic provider yields the
/// same ids and destinations for an unchanged tree. Destination collisions
/// between different sources are not detected here; apply refuses to
/// overwrite instead.
pub struct PlanGenerator {
    root: std::path::PathBuf,
    rules: Vec<Box<dyn Rule>>,
    policy: Policy,
}

impl PlanGenerator {
    /// Generator for `layout`'s root using the quarantine rule and policy
    /// defaults from `rule_set`.
    pub fn new(layout: &MetaLayout, rule_set: &RuleSet) -> Self {
        Self {
            root: layout.root().to_path_buf(),
            rules: vec![Box::new(rule_set.quarantine_rule(layout))],
            policy: rule_set.policy(),
        }
    }

    /// Generator with an explicit rule list. The first rule that proposes
    /// an action for a file wins.
    pub fn with_rules(layout: &MetaLayout, rules: Vec<Box<dyn Rule>>, policy: Policy) -> Self {
        Self {
            root: layout.root().to_path_buf(),
            rules,
            policy,
        }
    }

    /// Produce a plan with a fresh id.
    pub fn generate(&self, records: &[FileRecord]) -> Plan {
        self.generate_with_id(new_plan_id(), records)
    }

    /// Produce a plan with the given id.
    pub fn generate_with_id(&self, plan_id: String, records: &[FileRecord]) -> Plan {
        let actions: Vec<Action> = records
            .iter()
            .filter_map(|record| {
                let proposed = self.rules.iter().find_map(|rule| rule.propose(record))?;
                Some((record, proposed))
            })
            .enumerate()
            .map(|(idx, (record, proposed))| Action {
                id: format!("A-{:03}", idx + 1),
                kind: proposed.kind,
                src: record.path.clone(),
                dst: proposed.dst,
            })
            .collect();

        tracing::debug!(
            plan_id = %plan_id,
            scanned = records.len(),
            actions = actions.len(),
            "Plan generated"
        );

        Plan {
            plan_id,
            root: self.root.clone(),
            policy: self.policy.clone(),
            actions,
        }
    }
}

/// A sortable, collision-resistant plan id: UTC timestamp with microseconds
/// plus eight random hex digits, e.g. `20260101T120000.123456Z-9f86d081`.
pub fn new_plan_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}",
        Utc::now().format("%Y%m%dT%H%M%S%.6fZ"),
        &suffix[..8]
    )
}
