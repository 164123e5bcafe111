//! MulticastCore<T>: connection bookkeeping shared by `Shared` and `Share`.
//!
//! The core fans one upstream connection out through an internal `Repeater`
//! and decides, per [`LiveStrategy`], when that connection is opened and
//! closed. Who keeps the core alive is up to the wrapping adapter.
//!
//! # Locking
//!
//! `state` is a `parking_lot::Mutex` that is never held while calling the
//! upstream's subscribe, a connection's dispose, or any handler. Upstream
//! sources are allowed to emit synchronously from inside subscribe, and those
//! emissions may re-enter the adapter.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    event::{Event, Handler},
    listenable::{Connection, Listenable},
    repeater::Repeater,
    strategy::{LiveState, LiveStrategy, ShareOptions},
};

struct CoreState {
    listeners: usize,
    connection: Option<Connection>,
    /// An upstream subscribe call is in flight.
    opening: bool,
    /// The owner is gone; never open again.
    closed: bool,
}

pub(crate) struct MulticastCore<T> {
    upstream: Listenable<T>,
    repeater: Repeater<T>,
    strategy: LiveStrategy,
    label: String,
    state: Mutex<CoreState>,
}

impl<T: Clone + Send + Sync + 'static> MulticastCore<T> {
    pub(crate) fn new(upstream: Listenable<T>, options: &ShareOptions) -> Self {
        Self {
            upstream,
            repeater: Repeater::new(),
            strategy: options.strategy,
            label: options.label().to_string(),
            state: Mutex::new(CoreState {
                listeners: 0,
                connection: None,
                opening: false,
                closed: false,
            }),
        }
    }

    /// Attach a downstream handler, opening the upstream if the strategy
    /// calls for it. The handler is attached first so a source that emits
    /// during subscribe reaches it.
    pub(crate) fn attach(&self, handler: Handler<T>) -> Connection {
        let need_open = {
            let mut st = self.state.lock();
            st.listeners += 1;
            let wanted = match self.strategy {
                LiveStrategy::Continuous => true,
                LiveStrategy::Repeatable => st.listeners == 1,
            };
            let need_open = wanted && !st.closed && !st.opening && st.connection.is_none();
            if need_open {
                st.opening = true;
            }
            need_open
        };

        let downstream = self.repeater.attach(handler);
        if need_open {
            self.open();
        }
        downstream
    }

    /// Undo one [`attach`](Self::attach). The caller has already detached the
    /// downstream handler from the repeater.
    pub(crate) fn detach(&self) {
        let closing = {
            let mut st = self.state.lock();
            st.listeners = st.listeners.saturating_sub(1);
            match self.strategy {
                LiveStrategy::Repeatable if st.listeners == 0 => st.connection.take(),
                _ => None,
            }
        };
        if let Some(connection) = closing {
            connection.dispose();
            tracing::debug!(
                label = %self.label,
                token = %connection.token,
                "upstream closed, no listeners left"
            );
        }
    }

    fn open(&self) {
        let repeater = self.repeater.clone();
        let connection = self
            .upstream
            .connect(Arc::new(move |event: &Event<T>| repeater.send(event.clone())));

        // Listeners may have come and gone while subscribe ran.
        let stale = {
            let mut st = self.state.lock();
            st.opening = false;
            let wanted = !st.closed
                && st.connection.is_none()
                && match self.strategy {
                    LiveStrategy::Continuous => true,
                    LiveStrategy::Repeatable => st.listeners > 0,
                };
            if wanted {
                st.connection = Some(connection.clone());
                None
            } else {
                Some(connection.clone())
            }
        };

        match stale {
            Some(connection) => {
                connection.dispose();
                tracing::debug!(
                    label = %self.label,
                    token = %connection.token,
                    "upstream opened after last listener left; dropped"
                );
            }
            None => {
                tracing::debug!(
                    label = %self.label,
                    token = %connection.token,
                    strategy = ?self.strategy,
                    "upstream opened"
                );
            }
        }
    }
}

impl<T> MulticastCore<T> {
    /// Close the upstream for good.
    pub(crate) fn close(&self) {
        let closing = {
            let mut st = self.state.lock();
            st.closed = true;
            st.connection.take()
        };
        if let Some(connection) = closing {
            connection.dispose();
            tracing::debug!(
                label = %self.label,
                token = %connection.token,
                "upstream closed, owner released"
            );
        }
    }

    pub(crate) fn live_state(&self) -> LiveState {
        let st = self.state.lock();
        LiveState {
            strategy: self.strategy,
            listeners: st.listeners,
            connected: st.connection.is_some(),
        }
    }
}

impl<T> Drop for MulticastCore<T> {
    fn drop(&mut self) {
        if let Some(connection) = self.state.get_mut().connection.take() {
            connection.dispose();
            tracing::debug!(
                label = %self.label,
                token = %connection.token,
                "upstream closed, adapter dropped"
            );
        }
    }
}
