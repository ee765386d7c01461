//! Structural queries and field-level patches.
//!
//! Predicates are conjunctions of clauses over dotted field paths
//! (`"flags.is_favourite"`), matched by structural equality against the
//! document JSON. Patches set, unset or increment fields along the same
//! paths. This is the entire query surface - collections that need more
//! sort or filter in memory.

use serde_json::{Map, Value};

/// Conjunction of field clauses. An empty query matches every document.
#[derive(Debug, Clone, Default)]
pub struct Query {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
enum Clause {
    /// Field at path equals value.
    Eq(String, Value),
    /// Field at path is absent or null.
    Missing(String),
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Require structural equality at `path`.
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(path.into(), value.into()));
        self
    }

    /// Require the field at `path` to be absent or null.
    pub fn missing(mut self, path: impl Into<String>) -> Self {
        self.clauses.push(Clause::Missing(path.into()));
        self
    }

    /// Whether `doc` satisfies every clause.
    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(path, expected) => lookup_path(doc, path) == Some(expected),
            Clause::Missing(path) => {
                matches!(lookup_path(doc, path), None | Some(Value::Null))
            }
        })
    }

    /// Equality clauses, used to synthesize the base document on upsert.
    pub(crate) fn eq_clauses(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::Eq(path, value) => Some((path.as_str(), value)),
            Clause::Missing(_) => None,
        })
    }
}

/// Field-level update applied to a matched document.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    ops: Vec<PatchOp>,
}

#[derive(Debug, Clone)]
enum PatchOp {
    Set(String, Value),
    Unset(String),
    Inc(String, i64),
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field at `path`, creating intermediate objects as needed.
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(PatchOp::Set(path.into(), value.into()));
        self
    }

    /// Remove the field at `path`. Absent fields are left alone.
    pub fn unset(mut self, path: impl Into<String>) -> Self {
        self.ops.push(PatchOp::Unset(path.into()));
        self
    }

    /// Add `delta` to the integer at `path`; absent or null counts as 0.
    pub fn inc(mut self, path: impl Into<String>, delta: i64) -> Self {
        self.ops.push(PatchOp::Inc(path.into(), delta));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Whether any op writes to `path`.
    pub(crate) fn touches(&self, path: &str) -> bool {
        self.ops.iter().any(|op| match op {
            PatchOp::Set(p, _) | PatchOp::Unset(p) | PatchOp::Inc(p, _) => p == path,
        })
    }

    /// Apply all ops to `doc` in order.
    pub(crate) fn apply(&self, doc: &mut Value) {
        for op in &self.ops {
            match op {
                PatchOp::Set(path, value) => set_path(doc, path, value.clone()),
                PatchOp::Unset(path) => unset_path(doc, path),
                PatchOp::Inc(path, delta) => {
                    let current = lookup_path(doc, path).and_then(Value::as_i64).unwrap_or(0);
                    set_path(doc, path, Value::from(current + delta));
                }
            }
        }
    }
}

/// Options for `Collection::update`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Update every matching document instead of only the first.
    pub multi: bool,
    /// Insert a document synthesized from query and patch when nothing
    /// matches.
    pub upsert: bool,
}

/// Options for `Collection::remove`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    /// Remove every matching document instead of only the first.
    pub multi: bool,
}

/// Result of `Collection::update`.
#[derive(Debug, Clone)]
pub struct UpdateOutcome<T> {
    /// Number of documents matched by the predicate.
    pub matched: usize,
    /// The documents after the patch was applied (includes an upserted one).
    pub updated_documents: Vec<T>,
    /// Whether an upsert happened.
    pub upserted: bool,
}

/// Resolve a dotted path inside a JSON document.
pub(crate) fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, segment| value.get(segment))
}

fn set_path(doc: &mut Value, path: &str, new_value: Value) {
    let mut current = doc;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let object = current.as_object_mut().expect("object ensured above");

        if segments.peek().is_none() {
            object.insert(segment.to_string(), new_value);
            return;
        }

        current = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

fn unset_path(doc: &mut Value, path: &str) {
    let (parent_path, field) = match path.rsplit_once('.') {
        Some((parent, field)) => (Some(parent), field),
        None => (None, path),
    };

    let parent = match parent_path {
        Some(p) => match lookup_path_mut(doc, p) {
            Some(v) => v,
            None => return,
        },
        None => doc,
    };

    if let Some(object) = parent.as_object_mut() {
        object.remove(field);
    }
}

fn lookup_path_mut<'a>(doc: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.')
        .try_fold(doc, |value, segment| value.get_mut(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eq_matches_nested_paths() {
        let doc = json!({"id": "x1", "flags": {"is_favourite": true}});

        assert!(Query::new().eq("id", "x1").matches(&doc));
        assert!(Query::new().eq("flags.is_favourite", true).matches(&doc));
        assert!(!Query::new().eq("flags.is_favourite", false).matches(&doc));
        assert!(!Query::new().eq("missing", 1).matches(&doc));
    }

    #[test]
    fn missing_matches_absent_and_null() {
        let doc = json!({"file": {"local_id": null}});

        assert!(Query::new().missing("file.local_id").matches(&doc));
        assert!(Query::new().missing("file.path").matches(&doc));
        assert!(!Query::new().missing("file").matches(&doc));
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(Query::all().matches(&json!({"any": 1})));
    }

    #[test]
    fn patch_set_creates_intermediate_objects() {
        let mut doc = json!({"id": "x1"});
        Patch::new().set("flags.is_downloaded", true).apply(&mut doc);

        assert_eq!(doc, json!({"id": "x1", "flags": {"is_downloaded": true}}));
    }

    #[test]
    fn patch_inc_defaults_to_zero() {
        let mut doc = json!({"play_count": 2});
        Patch::new().inc("play_count", 1).inc("other", 5).apply(&mut doc);

        assert_eq!(doc["play_count"], json!(3));
        assert_eq!(doc["other"], json!(5));
    }

    #[test]
    fn patch_unset_removes_field() {
        let mut doc = json!({"file": {"local_id": "abc", "path": "/p"}});
        Patch::new().unset("file.local_id").unset("file.gone").apply(&mut doc);

        assert_eq!(doc, json!({"file": {"path": "/p"}}));
    }
}
