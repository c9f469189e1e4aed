// plans10x/src/plan.rs

//! Locating plan records inside a parsed document.
//!
//! Plan files come in three shapes: the canonical `<plans><plan .../>`
//! container, a bare top-level `<plan .../>`, or (for degenerate inputs)
//! neither. [`PlanSet`] flattens all three into one ordered sequence and
//! remembers which shape it came from so [`PlanSet::commit`] can write
//! the mutated records back without changing the document's cardinality.

use crate::xml::{Document, Value};
use linked_hash_map::LinkedHashMap;

/// Where in the document the plan list was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanShape {
    /// `root.plans.plan`
    Nested,
    /// `root.plan`
    TopLevel,
    /// Neither field was present; a single empty plan was synthesized
    /// and commit is a no-op.
    Synthesized,
}

/// A uniform, ordered view of the plan records in a document.
#[derive(Debug)]
pub struct PlanSet {
    plans: Vec<Value>,
    shape: PlanShape,
}

impl PlanSet {
    /// Find the plan records in `doc`.
    ///
    /// Resolution order, first match wins: `plans.plan`, then top-level
    /// `plan`, then a synthesized single empty record. A single record
    /// is coerced to a one-element sequence either way, so the result
    /// is never empty.
    pub fn locate(doc: &Document) -> Self {
        if let Value::Node(root) = &doc.root {
            if let Some(container) = root.get("plans").and_then(Value::as_map) {
                if let Some(plan) = container.get("plan") {
                    return Self {
                        plans: coerce_list(plan.clone()),
                        shape: PlanShape::Nested,
                    };
                }
            }
            if let Some(plan) = root.get("plan") {
                return Self {
                    plans: coerce_list(plan.clone()),
                    shape: PlanShape::TopLevel,
                };
            }
        }
        log::warn!("document has no plan records; synthesizing an empty one");
        Self {
            plans: vec![Value::node()],
            shape: PlanShape::Synthesized,
        }
    }

    /// Number of located plan records.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Whether the set is empty. Locate never produces an empty set
    /// unless the source held an explicitly empty list.
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Iterate mutably over the located plan records.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.plans.iter_mut()
    }

    /// Write the (possibly mutated) records back into the document.
    ///
    /// A one-element sequence is stored as a single record rather than
    /// a one-element list, restoring the shape that round-trips through
    /// the serializer. The synthesized fallback discards its record.
    pub fn commit(self, doc: &mut Document) {
        let Self { plans, shape } = self;
        match shape {
            PlanShape::Synthesized => {}
            PlanShape::Nested => {
                if let Some(container) = doc
                    .root
                    .as_map_mut()
                    .and_then(|root| root.get_mut("plans"))
                    .and_then(Value::as_map_mut)
                {
                    store(container, plans);
                }
            }
            PlanShape::TopLevel => {
                if let Some(root) = doc.root.as_map_mut() {
                    store(root, plans);
                }
            }
        }
    }
}

fn coerce_list(value: Value) -> Vec<Value> {
    match value {
        Value::List(items) => items,
        single => vec![single],
    }
}

fn store(container: &mut LinkedHashMap<String, Value>, mut plans: Vec<Value>) {
    let value = if plans.len() == 1 {
        plans.remove(0)
    } else {
        Value::List(plans)
    };
    container.insert("plan".to_string(), value);
}
