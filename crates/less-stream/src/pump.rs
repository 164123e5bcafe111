//! EventPump: moves events produced on other threads or tasks onto the
//! context that owns a stream graph.
//!
//! The stream core never queues: whoever calls [`Repeater::send`] runs every
//! handler on its own stack. When a source calls back from a background
//! thread, hand it a [`PumpSender`] instead of the repeater and let the owning
//! context deliver with [`EventPump::drain`] (polling) or [`EventPump::run`]
//! (as a task).

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    error::StreamError,
    event::Event,
    listenable::Listenable,
    repeater::Repeater,
};

/// Thread-safe producer half of an [`EventPump`].
pub struct PumpSender<T> {
    tx: UnboundedSender<Event<T>>,
}

impl<T> Clone for PumpSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> PumpSender<T> {
    /// Queue `event`. Returns `false` if the pump is gone.
    pub fn send(&self, event: Event<T>) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn send_value(&self, value: T) -> bool {
        self.send(Event::Value(value))
    }

    pub fn send_error(&self, error: StreamError) -> bool {
        self.send(Event::Error(error))
    }
}

/// Consumer half: a queue feeding a [`Repeater`].
pub struct EventPump<T> {
    rx: UnboundedReceiver<Event<T>>,
    repeater: Repeater<T>,
}

impl<T: Send + Sync + 'static> EventPump<T> {
    /// Create a connected sender / pump pair.
    pub fn channel() -> (PumpSender<T>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            PumpSender { tx },
            Self {
                rx,
                repeater: Repeater::new(),
            },
        )
    }

    /// The stream of delivered events.
    pub fn listenable(&self) -> Listenable<T> {
        self.repeater.listenable()
    }

    /// Deliver every queued event on the calling context. Returns the number
    /// delivered.
    pub fn drain(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.repeater.send(event);
            delivered += 1;
        }
        delivered
    }

    /// Deliver events as they arrive until every sender is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.repeater.send(event);
        }
        tracing::debug!("event pump finished, all senders dropped");
    }
}
