//! Per-collection schema migration.
//!
//! Each collection declares a current schema version and an ordered list of
//! pure upgrade steps, each taking a document at version N to version N+1.
//! The migrator runs during the collection load step: every stored document
//! whose `schema_version` is behind gets the remaining steps applied in
//! order, and each step is persisted to the storage backend before the next
//! one runs - a step is all-or-nothing against the persisted copy.
//!
//! A failing step aborts migration for that document only: the document
//! stays at its last successfully persisted version, the failure is logged,
//! and the other documents continue. Documents already at the current
//! version are not rewritten, so re-running a migration pass leaves their
//! stored blobs byte-identical.

use serde_json::Value;

/// Pure upgrade function from one schema version to the next.
///
/// Steps receive the document without its `schema_version` updated and must
/// not set it themselves; the migrator stamps the target version after a
/// successful application.
pub type StepFn = fn(Value) -> std::result::Result<Value, String>;

/// One upgrade step.
pub struct MigrationStep {
    /// Version the document is at after this step.
    pub to_version: u32,
    pub apply: StepFn,
}

/// Ordered upgrade steps for one collection.
pub struct MigrationSet {
    current_version: u32,
    steps: Vec<MigrationStep>,
}

impl MigrationSet {
    /// A set with no steps; documents below `current_version` cannot be
    /// upgraded and will be reported as failed.
    pub fn new(current_version: u32) -> Self {
        Self {
            current_version,
            steps: Vec::new(),
        }
    }

    /// Register the step producing `to_version`. Steps must be added in
    /// ascending, contiguous order ending at the current version.
    pub fn step(mut self, to_version: u32, apply: StepFn) -> Self {
        debug_assert!(
            self.steps
                .last()
                .map(|s| s.to_version + 1 == to_version)
                .unwrap_or(true),
            "migration steps must be contiguous"
        );
        debug_assert!(to_version <= self.current_version);

        self.steps.push(MigrationStep { to_version, apply });
        self
    }

    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    /// Steps still to apply for a document at `version`.
    pub(crate) fn steps_from(&self, version: u32) -> impl Iterator<Item = &MigrationStep> {
        self.steps.iter().filter(move |s| s.to_version > version)
    }
}

/// Summary of one migration pass over a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Documents inspected.
    pub scanned: usize,
    /// Documents brought up to the current version.
    pub migrated: usize,
    /// Documents left behind by a failing step.
    pub failed: usize,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
