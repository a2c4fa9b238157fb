//! # Latest Value Module
//!
//! A single-slot channel between one producer and one consumer where
//! only the newest value matters. The producer never blocks: publishing
//! over an unread value replaces it. The consumer never blocks either:
//! it keeps showing the last value it saw until a newer one arrives.
//!
//! The publisher holds a receiving handle of its own to evict stale
//! values, so the channel never disconnects from its side. Reader
//! liveness is tracked separately and reported by [`Publisher::publish`].

use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

/// Writing half of a latest-value channel.
#[derive(Debug)]
pub struct Publisher<T> {
    slot: Sender<T>,
    /// Used to evict an unread value when the slot is full.
    evict: Receiver<T>,
    reader: Weak<()>,
}

/// Reading half of a latest-value channel.
#[derive(Debug)]
pub struct Subscriber<T> {
    slot: Receiver<T>,
    current: T,
    connected: bool,
    _alive: Arc<()>,
}

/// Creates a latest-value channel whose reader starts out seeing `initial`.
pub fn channel<T>(initial: T) -> (Publisher<T>, Subscriber<T>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let alive = Arc::new(());
    (
        Publisher {
            slot: tx,
            evict: rx.clone(),
            reader: Arc::downgrade(&alive),
        },
        Subscriber {
            slot: rx,
            current: initial,
            connected: true,
            _alive: alive,
        },
    )
}

impl<T> Publisher<T> {
    /// Publishes `value`, replacing any value the reader has not picked up yet.
    ///
    /// Returns `false` without storing anything once the subscriber is gone.
    pub fn publish(&self, mut value: T) -> bool {
        if !self.has_subscriber() {
            return false;
        }
        loop {
            match self.slot.try_send(value) {
                Err(TrySendError::Full(rejected)) => {
                    // Either we drop the stale value or the reader just took it.
                    let _ = self.evict.try_recv();
                    value = rejected;
                }
                // `evict` keeps the channel connected, so anything else is a stored value.
                _ => return true,
            }
        }
    }

    /// Whether the [`Subscriber`] still exists.
    pub fn has_subscriber(&self) -> bool {
        self.reader.strong_count() > 0
    }
}

impl<T> Subscriber<T> {
    /// Returns the newest published value, or the last one seen if nothing new arrived.
    pub fn latest(&mut self) -> &T {
        match self.slot.try_recv() {
            Ok(value) => self.current = value,
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => self.connected = false,
        }
        &self.current
    }

    /// Whether the publisher was still alive at the last [`Self::latest`] call.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}
