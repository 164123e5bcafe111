//! ListeningItem: a subscription that can be paused and resumed without
//! being destroyed.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    event::Handler,
    listenable::{Connection, ConnectionToken, Subscribe},
};

struct ItemState {
    live: Option<Connection>,
    disposed: bool,
}

/// A resumable subscription.
///
/// While resumed it holds one live connection to its source; pausing
/// disconnects (the token becomes `None`) and resuming attaches the same
/// handler again under a fresh token.
pub struct ListeningItem<T> {
    source: Arc<dyn Subscribe<T>>,
    handler: Handler<T>,
    state: Mutex<ItemState>,
}

impl<T: Send + Sync + 'static> ListeningItem<T> {
    pub(crate) fn new(source: Arc<dyn Subscribe<T>>, handler: Handler<T>) -> Self {
        let item = Self {
            source,
            handler,
            state: Mutex::new(ItemState {
                live: None,
                disposed: false,
            }),
        };
        item.resume();
        item
    }

    /// Reconnect if paused. No-op when already connected or disposed.
    pub fn resume(&self) {
        {
            let st = self.state.lock();
            if st.disposed || st.live.is_some() {
                return;
            }
        }
        // Subscribe without the lock: the source may deliver synchronously
        // and the handler may call back into this item.
        let connection = self.source.subscribe(Arc::clone(&self.handler));
        let mut st = self.state.lock();
        if st.disposed || st.live.is_some() {
            drop(st);
            connection.dispose();
            return;
        }
        st.live = Some(connection);
    }

    /// Disconnect if connected. No-op when already paused.
    pub fn pause(&self) {
        let live = self.state.lock().live.take();
        if let Some(connection) = live {
            connection.dispose();
        }
    }

    /// Token of the live connection, or `None` while paused.
    pub fn token(&self) -> Option<ConnectionToken> {
        self.state.lock().live.as_ref().map(|c| c.token)
    }

    pub fn is_paused(&self) -> bool {
        self.token().is_none()
    }

    /// Disconnect for good; later `resume` calls do nothing.
    pub fn dispose(&self) {
        let live = {
            let mut st = self.state.lock();
            st.disposed = true;
            st.live.take()
        };
        if let Some(connection) = live {
            connection.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }
}

impl<T> fmt::Debug for ListeningItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.lock();
        f.debug_struct("ListeningItem")
            .field("token", &st.live.as_ref().map(|c| c.token))
            .field("disposed", &st.disposed)
            .finish()
    }
}
