//! Bounded history of ledger notifications for the event listing

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use surety_ledger::EventEnvelope;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

pub struct EventLog {
    capacity: usize,
    entries: RwLock<VecDeque<EventEnvelope>>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn push(&self, envelope: EventEnvelope) {
        if let Ok(mut entries) = self.entries.write() {
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(envelope);
        }
    }

    /// Most recent first, optionally filtered by event kind
    pub fn recent(&self, limit: usize, kind: Option<&str>) -> Vec<EventEnvelope> {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .iter()
                    .rev()
                    .filter(|e| kind.map_or(true, |k| e.event.kind() == k))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Record everything published on `rx` until the channel closes
    pub fn spawn_recorder(self: Arc<Self>, mut rx: broadcast::Receiver<EventEnvelope>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        tracing::debug!(kind = envelope.event.kind(), id = %envelope.id, "Ledger event");
                        self.push(envelope);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event recorder lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surety_ledger::LedgerEvent;

    #[test]
    fn test_history_is_bounded() {
        let log = EventLog::new(2);
        for operational in [true, false, true] {
            log.push(EventEnvelope::new(LedgerEvent::OperationalChanged { operational }));
        }
        let recent = log.recent(10, None);
        assert_eq!(recent.len(), 2);
        assert_eq!(
            recent[0].event,
            LedgerEvent::OperationalChanged { operational: true }
        );
        assert!(log.recent(10, Some("flight_registered")).is_empty());
    }
}
