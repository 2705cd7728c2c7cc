//! Live set of scheduled operations

use crate::error::{Result, TweenError};
use crate::operation::Scheduled;
use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};
use std::sync::Arc;

new_key_type! {
    /// Identity of a registered operation
    pub struct OperationId;
}

/// An operation shared between the registry and an in-flight tick
pub(crate) type SharedOperation = Arc<Mutex<Box<dyn Scheduled>>>;

struct Entry {
    name: Option<String>,
    operation: SharedOperation,
}

/// Registered operations in insertion order
///
/// Iteration goes through [`snapshot`](Registry::snapshot), which copies the
/// handles out so the caller can release the registry before touching any
/// operation. Anything added or removed afterwards does not affect a snapshot
/// already taken.
#[derive(Default)]
pub(crate) struct Registry {
    entries: SlotMap<OperationId, Entry>,
    order: Vec<OperationId>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert an operation, rejecting non-positive (or NaN) durations
    pub(crate) fn add(
        &mut self,
        name: Option<String>,
        operation: Box<dyn Scheduled>,
    ) -> Result<OperationId> {
        let duration = operation.duration();
        // Written so NaN is rejected too
        if !(duration > 0.0) {
            tracing::warn!(
                name = name.as_deref().unwrap_or("<unnamed>"),
                duration,
                "rejecting tween operation with non-positive duration"
            );
            return Err(TweenError::NonPositiveDuration(duration));
        }

        let id = self.entries.insert(Entry {
            name,
            operation: Arc::new(Mutex::new(operation)),
        });
        self.order.push(id);
        Ok(id)
    }

    pub(crate) fn remove(&mut self, id: OperationId) -> bool {
        if self.entries.remove(id).is_none() {
            return false;
        }
        self.order.retain(|existing| *existing != id);
        true
    }

    /// Remove the first operation (in insertion order) with this name
    pub(crate) fn remove_by_name(&mut self, name: &str) -> Option<OperationId> {
        let id = self.find_by_name(name)?;
        self.remove(id);
        Some(id)
    }

    /// Remove everything, returning how many operations were dropped
    pub(crate) fn remove_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        count
    }

    pub(crate) fn find_by_name(&self, name: &str) -> Option<OperationId> {
        self.order.iter().copied().find(|id| {
            self.entries
                .get(*id)
                .is_some_and(|entry| entry.name.as_deref() == Some(name))
        })
    }

    pub(crate) fn get(&self, id: OperationId) -> Option<&SharedOperation> {
        self.entries.get(id).map(|entry| &entry.operation)
    }

    pub(crate) fn contains(&self, id: OperationId) -> bool {
        self.entries.contains_key(id)
    }

    pub(crate) fn contains_name(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Point-in-time copy of the live set, in insertion order
    pub(crate) fn snapshot(&self) -> Vec<(OperationId, SharedOperation)> {
        self.order
            .iter()
            .filter_map(|id| {
                self.entries
                    .get(*id)
                    .map(|entry| (*id, Arc::clone(&entry.operation)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;

    fn op(duration: f64) -> Box<dyn Scheduled> {
        Box::new(Operation::tween(0.0f64, 1.0, duration))
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.add(None, op(0.0)),
            Err(TweenError::NonPositiveDuration(d)) if d == 0.0
        ));
        assert!(registry.add(None, op(-1.0)).is_err());
        assert!(registry.add(None, op(f64::NAN)).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_by_identity() {
        let mut registry = Registry::new();
        let a = registry.add(None, op(1.0)).unwrap();
        let b = registry.add(None, op(1.0)).unwrap();

        assert!(registry.remove(a));
        assert!(!registry.remove(a));
        assert!(registry.contains(b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_by_name_takes_first_match() {
        let mut registry = Registry::new();
        let first = registry.add(Some("a".into()), op(1.0)).unwrap();
        let second = registry.add(Some("a".into()), op(1.0)).unwrap();
        let b = registry.add(Some("b".into()), op(1.0)).unwrap();

        assert_eq!(registry.remove_by_name("a"), Some(first));
        assert!(registry.contains(second));
        assert!(registry.contains(b));
        assert_eq!(registry.remove_by_name("missing"), None);
    }

    #[test]
    fn test_snapshot_is_insertion_ordered_and_detached() {
        let mut registry = Registry::new();
        let ids: Vec<_> = (0..4)
            .map(|_| registry.add(None, op(1.0)).unwrap())
            .collect();

        let snapshot = registry.snapshot();
        registry.remove(ids[1]);
        registry.add(None, op(1.0)).unwrap();

        let snapshot_ids: Vec<_> = snapshot.iter().map(|(id, _)| *id).collect();
        assert_eq!(snapshot_ids, ids);
        assert_eq!(registry.snapshot().len(), 4);
    }

    #[test]
    fn test_remove_all() {
        let mut registry = Registry::new();
        registry.add(Some("x".into()), op(1.0)).unwrap();
        registry.add(None, op(2.0)).unwrap();
        assert_eq!(registry.remove_all(), 2);
        assert!(registry.is_empty());
        assert!(!registry.contains_name("x"));
    }
}
