//! Shared<T>: a multicast adapter that owns its upstream connection.
//!
//! Downstream disposables only hold a weak reference to the adapter. Dropping
//! the `Shared` value closes the upstream connection immediately; handlers
//! that were never disposed simply stop receiving events, and disposing them
//! afterwards is a harmless no-op.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::{
    disposable::Disposable,
    error::StreamError,
    event::{Event, Handler},
    listenable::{Connection, ConnectionToken, Listenable},
    multicast::MulticastCore,
    strategy::{LiveState, LiveStrategy, ShareOptions},
};

/// Adapter-owned multicast of one upstream [`Listenable`].
pub struct Shared<T> {
    core: Arc<MulticastCore<T>>,
}

impl<T: Clone + Send + Sync + 'static> Shared<T> {
    pub fn new(upstream: Listenable<T>, options: impl Into<ShareOptions>) -> Self {
        Self {
            core: Arc::new(MulticastCore::new(upstream, &options.into())),
        }
    }

    /// Attach one downstream consumer.
    pub fn listening(&self, handler: impl Fn(&Event<T>) + Send + Sync + 'static) -> Disposable {
        attach_weak(&self.core, Arc::new(handler)).disposable
    }

    /// Current strategy, listener count and connection state.
    pub fn live_state(&self) -> LiveState {
        self.core.live_state()
    }

    /// A listenable view of this adapter. It does not keep the adapter
    /// alive; subscribing after the adapter is dropped delivers a single
    /// [`StreamError::Disconnected`] and returns an inert handle.
    pub fn listenable(&self) -> Listenable<T> {
        let core = Arc::downgrade(&self.core);
        Listenable::from_fn(move |handler: Handler<T>| match core.upgrade() {
            Some(core) => attach_weak(&core, handler),
            None => {
                tracing::debug!("subscribe on a dropped shared adapter");
                handler(&Event::Error(StreamError::Disconnected));
                Connection::new(ConnectionToken::next(), Disposable::empty())
            }
        })
    }
}

fn attach_weak<T: Clone + Send + Sync + 'static>(
    core: &Arc<MulticastCore<T>>,
    handler: Handler<T>,
) -> Connection {
    let downstream = core.attach(handler);
    let token = downstream.token;
    let weak: Weak<MulticastCore<T>> = Arc::downgrade(core);
    Connection::new(
        token,
        Disposable::new(move || {
            downstream.dispose();
            if let Some(core) = weak.upgrade() {
                core.detach();
            }
        }),
    )
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        // A downstream disposal may hold a short-lived upgrade of the core;
        // close here instead of waiting for the core itself to drop.
        self.core.close();
    }
}

impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("live_state", &self.core.live_state())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Listenable<T> {
    /// Multicast this stream through an adapter that owns the connection.
    pub fn shared(&self, strategy: LiveStrategy) -> Shared<T> {
        Shared::new(self.clone(), strategy)
    }

    pub fn shared_with(&self, options: ShareOptions) -> Shared<T> {
        Shared::new(self.clone(), options)
    }
}
