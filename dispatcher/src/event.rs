use std::sync::Mutex;

use futures::{channel::mpsc, SinkExt as _, StreamExt as _};

/// Bounded fan-out of typed events.
///
/// Each subscriber gets its own queue of `capacity` slots. A slow
/// subscriber makes `publish` wait; events are never dropped.
pub struct EventTopic<T> {
    senders: Mutex<Vec<mpsc::Sender<T>>>,
}

impl<T> Default for EventTopic<T> {
    fn default() -> Self {
        Self {
            senders: Mutex::default(),
        }
    }
}

impl<T: Clone> EventTopic<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, capacity: usize) -> EventSubscription<T> {
        let (tx, rx) = mpsc::channel(capacity);

        self.senders
            .lock()
            .expect("event topic mutex is poisoned")
            .push(tx);

        EventSubscription { rx }
    }

    pub async fn publish(&self, event: T) {
        // The senders are moved out for the duration of the sends so the
        // lock is not held across a suspension point. A subscriber added
        // meanwhile starts receiving from the next event.
        let targets = core::mem::take(
            &mut *self.senders.lock().expect("event topic mutex is poisoned"),
        );

        let mut kept = Vec::with_capacity(targets.len());

        for mut sender in targets {
            // A send only fails once the subscription is dropped.
            if sender.send(event.clone()).await.is_ok() {
                kept.push(sender);
            }
        }

        self.senders
            .lock()
            .expect("event topic mutex is poisoned")
            .extend(kept);
    }
}

pub struct EventSubscription<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> EventSubscription<T> {
    pub async fn next(&mut self) -> Option<T> {
        self.rx.next().await
    }
}
