use std::sync::{Arc, Mutex, PoisonError};

use crate::payload::ResultPayload;

/// Shared slot holding the most recent partial result a running pipeline
/// has assembled.
///
/// The pipeline records into it at stage boundaries; when the per-job
/// timeout fires and the pipeline future is dropped mid-flight, the worker
/// still holds the slot and attaches whatever was assembled to the failed
/// job. Clone is cheap and shares state.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSlot {
    latest: Arc<Mutex<Option<ResultPayload>>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot with a newer snapshot.
    pub fn record(&self, payload: ResultPayload) {
        let mut latest = self
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *latest = Some(payload);
    }

    /// Take the latest snapshot, leaving the slot empty.
    pub fn take(&self) -> Option<ResultPayload> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::ResultStats;

    fn payload(total: usize) -> ResultPayload {
        ResultPayload {
            clusters: Vec::new(),
            stats: ResultStats {
                total_citations: total,
                verified: 0,
                clusters: 0,
            },
        }
    }

    #[test]
    fn test_latest_record_wins() {
        let slot = SnapshotSlot::new();
        assert!(slot.take().is_none());

        slot.record(payload(1));
        slot.record(payload(2));
        assert_eq!(slot.take().unwrap().stats.total_citations, 2);
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let slot = SnapshotSlot::new();
        let clone = slot.clone();
        slot.record(payload(7));
        assert_eq!(clone.take().unwrap().stats.total_citations, 7);
    }
}
