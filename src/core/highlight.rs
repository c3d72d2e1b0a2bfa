use crate::domain::model::{HighlightSet, QueryId};
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

/// Single shared cell holding the floats highlighted by the latest query.
///
/// Cloning yields another handle to the same cell. Readers receive an
/// immutable snapshot; every `publish` swaps the whole set, never merges.
#[derive(Debug, Clone, Default)]
pub struct HighlightBroadcaster {
    cell: Arc<RwLock<Arc<HighlightSet>>>,
}

impl HighlightBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish<I>(&self, float_ids: I, query_id: QueryId)
    where
        I: IntoIterator<Item = i64>,
    {
        // 先在鎖外建好新集合，鎖內只做指標替換
        let next = Arc::new(HighlightSet {
            float_ids: float_ids.into_iter().collect::<BTreeSet<_>>(),
            source_query_id: Some(query_id),
        });

        let count = next.float_ids.len();
        let mut guard = self.cell.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
        drop(guard);

        tracing::debug!("🗺️ Highlighted {} floats for {}", count, query_id);
    }

    /// Latest published set, or an empty set if never published or cleared.
    pub fn current(&self) -> Arc<HighlightSet> {
        let guard = self.cell.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn clear(&self) {
        let mut guard = self.cell.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(HighlightSet::default());
        drop(guard);

        tracing::debug!("Highlights cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let highlights = HighlightBroadcaster::new();
        assert!(highlights.current().is_empty());
        assert_eq!(highlights.current().source_query_id, None);
    }

    #[test]
    fn test_publish_replaces_never_merges() {
        let highlights = HighlightBroadcaster::new();
        highlights.publish([1, 2, 3], QueryId(1));
        highlights.publish([3, 4], QueryId(2));

        let current = highlights.current();
        assert_eq!(current.float_ids, BTreeSet::from([3, 4]));
        assert_eq!(current.source_query_id, Some(QueryId(2)));
    }

    #[test]
    fn test_snapshot_survives_later_publish() {
        let highlights = HighlightBroadcaster::new();
        highlights.publish([7], QueryId(1));
        let snapshot = highlights.current();

        highlights.publish([8, 9], QueryId(2));
        assert_eq!(snapshot.float_ids, BTreeSet::from([7]));
    }

    #[test]
    fn test_clear_and_shared_handles() {
        let highlights = HighlightBroadcaster::new();
        let view = highlights.clone();

        highlights.publish([5, 5, 6], QueryId(3));
        assert_eq!(view.current().float_ids.len(), 2);

        view.clear();
        assert!(highlights.current().is_empty());
        assert_eq!(highlights.current().source_query_id, None);
    }

    #[test]
    fn test_concurrent_readers_see_whole_sets() {
        let highlights = HighlightBroadcaster::new();
        let sets: Vec<Vec<i64>> = (0..20).map(|i| (i * 10..i * 10 + 10).collect()).collect();

        std::thread::scope(|scope| {
            let writer = highlights.clone();
            let sets_ref = &sets;
            scope.spawn(move || {
                for (i, set) in sets_ref.iter().enumerate() {
                    writer.publish(set.iter().copied(), QueryId(i as u64 + 1));
                }
            });

            for _ in 0..4 {
                let reader = highlights.clone();
                scope.spawn(move || {
                    for _ in 0..200 {
                        let snapshot = reader.current();
                        if let Some(id) = snapshot.source_query_id {
                            let expected: BTreeSet<i64> =
                                sets_ref[(id.0 - 1) as usize].iter().copied().collect();
                            assert_eq!(snapshot.float_ids, expected);
                        }
                    }
                });
            }
        });

        assert_eq!(highlights.current().source_query_id, Some(QueryId(20)));
    }
}
