//! Repeater<T>: a manually driven multicast source.
//!
//! Every [`attach`](Repeater::attach) mints a fresh [`ConnectionToken`] and
//! hands back a [`Connection`] whose disposable removes exactly that entry.
//! Attaching the same handler twice gives two independent entries. A send
//! delivers to the entries present when it started, in attach order; a
//! disposal made mid-send takes effect from the next send on.
//!
//! Clones share one handler list, which is how `Shared`, `Share` and the
//! operators fan out without owning the source.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    disposable::Disposable,
    error::StreamError,
    event::{Event, Handler},
    listenable::{Connection, ConnectionToken, Listenable, Subscribe},
};

struct RepeaterInner<T> {
    handlers: Mutex<Vec<(ConnectionToken, Handler<T>)>>,
}

/// Multicast source: everything sent is delivered to every attached handler,
/// in attachment order, before `send` returns.
///
/// Clones share the same handler list.
pub struct Repeater<T> {
    inner: Arc<RepeaterInner<T>>,
}

impl<T> Clone for Repeater<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> Repeater<T> {
    /// Create a repeater with no handlers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RepeaterInner {
                handlers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Attach `handler`; the returned disposable detaches exactly that handler.
    pub fn listen(&self, handler: impl Fn(&Event<T>) + Send + Sync + 'static) -> Disposable {
        self.attach(Arc::new(handler)).disposable
    }

    /// Attach an already shared handler and report the token it was filed under.
    pub fn attach(&self, handler: Handler<T>) -> Connection {
        let token = ConnectionToken::next();
        self.inner.handlers.lock().push((token, handler));

        let inner = Arc::clone(&self.inner);
        Connection::new(
            token,
            Disposable::new(move || {
                inner.handlers.lock().retain(|(t, _)| *t != token);
            }),
        )
    }

    /// Deliver `event` to every currently attached handler.
    ///
    /// A snapshot of the handler list is taken before iteration and the lock
    /// is released before any handler runs.
    pub fn send(&self, event: Event<T>) {
        let snapshot: Vec<Handler<T>> = {
            let guard = self.inner.handlers.lock();
            guard.iter().map(|(_, h)| Arc::clone(h)).collect()
        };
        tracing::trace!(handlers = snapshot.len(), "repeater send");
        for handler in snapshot {
            handler(&event);
        }
    }

    pub fn send_value(&self, value: T) {
        self.send(Event::Value(value));
    }

    pub fn send_error(&self, error: StreamError) {
        self.send(Event::Error(error));
    }

    /// Number of currently attached handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handler_count() == 0
    }

    /// A lazy view of this repeater; subscribing attaches a handler.
    pub fn listenable(&self) -> Listenable<T> {
        Listenable::new(self.clone())
    }
}

impl<T: Send + Sync + 'static> Default for Repeater<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Subscribe<T> for Repeater<T> {
    fn subscribe(&self, handler: Handler<T>) -> Connection {
        self.attach(handler)
    }
}
