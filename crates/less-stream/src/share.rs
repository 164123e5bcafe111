//! Share<T>: a multicast adapter whose connection is owned jointly by the
//! adapter and every attached downstream disposable.
//!
//! Each downstream disposable keeps a strong reference to the core until it
//! is disposed. Dropping the `Share` value therefore leaves attached
//! consumers untouched: events keep flowing to them, and the upstream
//! connection closes only once the last joint owner lets go (continuous) or
//! the listener count reaches zero (repeatable).

use std::fmt;
use std::sync::Arc;

use crate::{
    disposable::Disposable,
    event::{Event, Handler},
    listenable::{Connection, Listenable},
    multicast::MulticastCore,
    strategy::{LiveState, LiveStrategy, ShareOptions},
};

/// Jointly owned multicast of one upstream [`Listenable`].
///
/// Clones are additional owners of the same connection.
pub struct Share<T> {
    core: Arc<MulticastCore<T>>,
}

impl<T> Clone for Share<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Share<T> {
    pub fn new(upstream: Listenable<T>, options: impl Into<ShareOptions>) -> Self {
        Self {
            core: Arc::new(MulticastCore::new(upstream, &options.into())),
        }
    }

    /// Attach one downstream consumer. The returned disposable co-owns the
    /// upstream connection until it is disposed.
    pub fn listening(&self, handler: impl Fn(&Event<T>) + Send + Sync + 'static) -> Disposable {
        attach_owned(&self.core, Arc::new(handler)).disposable
    }

    /// Current strategy, listener count and connection state.
    pub fn live_state(&self) -> LiveState {
        self.core.live_state()
    }

    /// A listenable view that co-owns the connection like a clone does.
    pub fn listenable(&self) -> Listenable<T> {
        let core = Arc::clone(&self.core);
        Listenable::from_fn(move |handler: Handler<T>| attach_owned(&core, handler))
    }
}

fn attach_owned<T: Clone + Send + Sync + 'static>(
    core: &Arc<MulticastCore<T>>,
    handler: Handler<T>,
) -> Connection {
    let downstream = core.attach(handler);
    let token = downstream.token;
    let core = Arc::clone(core);
    Connection::new(
        token,
        Disposable::new(move || {
            downstream.dispose();
            core.detach();
        }),
    )
}

impl<T> fmt::Debug for Share<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("live_state", &self.core.live_state())
            .field("owners", &Arc::strong_count(&self.core))
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Listenable<T> {
    /// Multicast this stream; attached consumers co-own the connection.
    pub fn share(&self, strategy: LiveStrategy) -> Share<T> {
        Share::new(self.clone(), strategy)
    }

    pub fn share_with(&self, options: ShareOptions) -> Share<T> {
        Share::new(self.clone(), options)
    }
}
