//! Listenable<T>: the uniform "can be subscribed" capability.
//!
//! A `Listenable` is a cheap, cloneable handle to something implementing
//! [`Subscribe`]. Building one (directly or through an operator) does no work;
//! the upstream is only wired when somebody calls [`Listenable::listening`]
//! or [`Listenable::listening_item`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{
    disposable::Disposable,
    event::{Event, Handler},
    listening_item::ListeningItem,
};

// ============================================================================
// ConnectionToken / Connection
// ============================================================================

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of one live attachment to a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionToken(u64);

impl ConnectionToken {
    /// Allocate a process-unique token.
    pub fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a token handed out by an external observer service.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live attachment: the token identifying it and the handle that ends it.
#[derive(Debug, Clone)]
pub struct Connection {
    pub token: ConnectionToken,
    pub disposable: Disposable,
}

impl Connection {
    pub fn new(token: ConnectionToken, disposable: Disposable) -> Self {
        Self { token, disposable }
    }

    pub fn dispose(&self) {
        self.disposable.dispose();
    }
}

// ============================================================================
// Subscribe
// ============================================================================

/// Something a handler can be attached to.
pub trait Subscribe<T>: Send + Sync {
    /// Attach `handler` and return the live connection.
    fn subscribe(&self, handler: Handler<T>) -> Connection;
}

impl<T, F> Subscribe<T> for F
where
    F: Fn(Handler<T>) -> Connection + Send + Sync,
{
    fn subscribe(&self, handler: Handler<T>) -> Connection {
        self(handler)
    }
}

// ============================================================================
// Listenable
// ============================================================================

/// A stream of [`Event`]s that can be subscribed to.
pub struct Listenable<T> {
    source: Arc<dyn Subscribe<T>>,
}

impl<T> Clone for Listenable<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T: Send + Sync + 'static> Listenable<T> {
    pub fn new(source: impl Subscribe<T> + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Build a listenable from a subscribe closure.
    pub fn from_fn(subscribe: impl Fn(Handler<T>) -> Connection + Send + Sync + 'static) -> Self {
        Self::new(subscribe)
    }

    /// Attach `handler`. The caller owns the returned disposable and must
    /// dispose it to detach.
    pub fn listening(&self, handler: impl Fn(&Event<T>) + Send + Sync + 'static) -> Disposable {
        self.source.subscribe(Arc::new(handler)).disposable
    }

    /// Attach a value-only handler. Error events are logged and skipped.
    pub fn listening_values(&self, on_value: impl Fn(&T) + Send + Sync + 'static) -> Disposable {
        self.listening(move |event| match event {
            Event::Value(v) => on_value(v),
            Event::Error(e) => tracing::debug!(error = %e, "error event skipped by value listener"),
        })
    }

    /// Attach `handler` as a pausable subscription. The item starts connected.
    pub fn listening_item(
        &self,
        handler: impl Fn(&Event<T>) + Send + Sync + 'static,
    ) -> ListeningItem<T> {
        ListeningItem::new(Arc::clone(&self.source), Arc::new(handler))
    }

    /// Attach an already shared handler and return the full connection.
    pub fn connect(&self, handler: Handler<T>) -> Connection {
        self.source.subscribe(handler)
    }
}
