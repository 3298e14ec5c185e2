use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// Per-match broadcast registry used to push committed score changes to every
/// subscribed viewer of that match.
///
/// Channels are created lazily on the first subscription and torn down via
/// [`ScoreFanout::release`] once the last subscriber disconnects, so an idle
/// match holds no resources. Delivery is best-effort: a lagged or
/// disconnected receiver misses events and is expected to resynchronize
/// through a fresh `GET` of the score.
pub struct ScoreFanout {
    channels: DashMap<Uuid, broadcast::Sender<ServerEvent>>,
    capacity: usize,
}

impl ScoreFanout {
    /// Create the registry; `capacity` bounds each per-match channel.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Register a subscriber for one match, creating its channel on demand.
    pub fn subscribe(&self, match_id: Uuid) -> broadcast::Receiver<ServerEvent> {
        self.channels
            .entry(match_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Fan an event out to the subscribers of one match, in publish order.
    ///
    /// A match nobody watches has no channel; the event is simply dropped,
    /// since the store remains the authoritative log.
    pub fn publish(&self, match_id: Uuid, event: ServerEvent) {
        if let Some(sender) = self.channels.get(&match_id) {
            let _ = sender.send(event);
        }
    }

    /// Fan an event out to every match that currently has subscribers.
    pub fn publish_all(&self, event: ServerEvent) {
        for entry in self.channels.iter() {
            let _ = entry.value().send(event.clone());
        }
    }

    /// Drop the channel of a match once its last subscriber is gone.
    ///
    /// Called from the SSE teardown path after a receiver is dropped; a
    /// no-op while other subscribers remain.
    pub fn release(&self, match_id: Uuid) {
        self.channels
            .remove_if(&match_id, |_, sender| sender.receiver_count() == 0);
    }

    /// Number of live subscribers for a match.
    pub fn subscriber_count(&self, match_id: Uuid) -> usize {
        self.channels
            .get(&match_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Number of matches that currently hold a channel.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
