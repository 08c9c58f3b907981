//! Registry of named streams.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::config::StreamsConfig;
use crate::observability::metrics;
use crate::streams::event::StreamEvent;

struct Channel {
    sender: broadcast::Sender<StreamEvent>,
    /// Recent events for replay. Also serializes publish against subscribe
    /// so a new subscriber sees each event exactly once.
    history: Mutex<VecDeque<StreamEvent>>,
}

impl Channel {
    fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            history: Mutex::new(VecDeque::new()),
        }
    }

    fn history(&self) -> MutexGuard<'_, VecDeque<StreamEvent>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Concurrent registry of named event streams.
pub struct StreamManager {
    streams: DashMap<String, Arc<Channel>>,
    config: StreamsConfig,
}

impl StreamManager {
    /// Create an empty manager. A zero capacity is raised to one.
    pub fn new(config: StreamsConfig) -> Self {
        Self {
            streams: DashMap::new(),
            config: StreamsConfig {
                capacity: config.capacity.max(1),
                ..config
            },
        }
    }

    /// Create `name`. Returns `false` if it already existed.
    pub fn create_stream(&self, name: &str) -> bool {
        match self.streams.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Channel::new(self.config.capacity)));
                tracing::debug!(stream = %name, "Stream created");
                true
            }
        }
    }

    /// Close and forget `name`. Every subscription to it ends.
    pub fn remove_stream(&self, name: &str) -> bool {
        let removed = self.streams.remove(name).is_some();
        if removed {
            tracing::debug!(stream = %name, "Stream removed");
            metrics::record_subscribers(name, 0);
        }
        removed
    }

    pub fn stream_exists(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    /// Names of all open streams, in no particular order.
    pub fn stream_names(&self) -> Vec<String> {
        self.streams.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Publish to `name`. Returns how many subscribers it was handed to;
    /// publishing to a missing stream is a no-op.
    pub fn publish(&self, name: &str, event: impl Into<StreamEvent>) -> usize {
        let Some(channel) = self.channel(name) else {
            tracing::debug!(stream = %name, "Publish to unknown stream dropped");
            return 0;
        };
        let event = event.into();

        let mut history = channel.history();
        if self.config.auto_replay && self.config.replay_depth > 0 {
            if history.len() == self.config.replay_depth {
                history.pop_front();
            }
            history.push_back(event.clone());
        }
        let delivered = channel.sender.send(event).unwrap_or(0);
        drop(history);

        metrics::record_stream_event(name);
        metrics::record_subscribers(name, channel.sender.receiver_count());
        delivered
    }

    /// Subscribe to `name`, or `None` if it does not exist.
    pub fn subscribe(&self, name: &str) -> Option<Subscription> {
        let channel = self.channel(name)?;
        let history = channel.history();
        let receiver = channel.sender.subscribe();
        let replay = if self.config.auto_replay {
            history.iter().cloned().collect()
        } else {
            Vec::new()
        };
        drop(history);

        metrics::record_subscribers(name, channel.sender.receiver_count());
        Some(Subscription { replay, receiver })
    }

    /// Live subscribers of `name`; zero for a missing stream.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.channel(name)
            .map_or(0, |channel| channel.sender.receiver_count())
    }

    /// Close every stream.
    pub fn close_all(&self) {
        let names = self.stream_names();
        self.streams.clear();
        for name in &names {
            metrics::record_subscribers(name, 0);
        }
        let count = names.len();
        if count > 0 {
            tracing::info!(streams = count, "Closed all streams");
        }
    }

    fn channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.streams.get(name).map(|entry| Arc::clone(entry.value()))
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new(StreamsConfig::default())
    }
}

/// One subscriber's view of a stream.
pub struct Subscription {
    replay: Vec<StreamEvent>,
    receiver: broadcast::Receiver<StreamEvent>,
}

impl Subscription {
    /// Replayed events first, then live events until the stream closes.
    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send + 'static {
        let live = BroadcastStream::new(self.receiver).filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Stream subscriber lagged");
                None
            }
        });
        tokio_stream::iter(self.replay).chain(live)
    }
}
