//! Adapter from an external observer service to a `Listenable`.
//!
//! The service side is a callback API: `attach` registers a value callback
//! and an error callback for one kind of event and returns a token; `detach`
//! removes that registration. Everything else in the crate only sees the
//! resulting [`Listenable`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    disposable::Disposable,
    error::StreamError,
    event::{Event, Handler},
    listenable::{Connection, ConnectionToken, Listenable, Subscribe},
};

/// Which changes an observer is notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The whole node, on attach and after every change.
    Value,
    ChildAdded,
    ChildChanged,
    ChildRemoved,
}

/// Failure reported by an observer service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverFailure {
    pub code: String,
    pub message: String,
}

impl From<ObserverFailure> for StreamError {
    fn from(f: ObserverFailure) -> Self {
        StreamError::Remote {
            code: f.code,
            message: f.message,
        }
    }
}

pub type ValueCallback<S> = Arc<dyn Fn(S) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(ObserverFailure) + Send + Sync>;

/// An external push-based observation API.
///
/// Callbacks may arrive on any thread the service likes; implementations
/// that deliver off the consumer's context should marshal first (see
/// [`EventPump`](crate::pump::EventPump)).
pub trait ObserverService: Send + Sync {
    type Snapshot: Send + Sync + 'static;

    /// Register callbacks for `kind` and return the registration token.
    fn attach(
        &self,
        kind: EventKind,
        on_value: ValueCallback<Self::Snapshot>,
        on_error: ErrorCallback,
    ) -> ConnectionToken;

    /// Remove the registration behind `token`. Unknown tokens are ignored.
    fn detach(&self, token: ConnectionToken);
}

/// [`Subscribe`] implementation over an [`ObserverService`].
pub struct ObservedSource<S> {
    service: Arc<S>,
    kind: EventKind,
}

impl<S: ObserverService + 'static> ObservedSource<S> {
    pub fn new(service: Arc<S>, kind: EventKind) -> Self {
        Self { service, kind }
    }
}

impl<S: ObserverService + 'static> Subscribe<S::Snapshot> for ObservedSource<S> {
    fn subscribe(&self, handler: Handler<S::Snapshot>) -> Connection {
        let on_value: ValueCallback<S::Snapshot> = {
            let handler = Arc::clone(&handler);
            Arc::new(move |snapshot: S::Snapshot| handler(&Event::Value(snapshot)))
        };
        let on_error: ErrorCallback = Arc::new(move |failure: ObserverFailure| {
            handler(&Event::Error(failure.into()));
        });

        let kind = self.kind;
        let token = self.service.attach(kind, on_value, on_error);
        tracing::debug!(%token, ?kind, "observer attached");

        let service = Arc::clone(&self.service);
        Connection::new(
            token,
            Disposable::new(move || {
                service.detach(token);
                tracing::debug!(%token, ?kind, "observer detached");
            }),
        )
    }
}

impl<S> fmt::Debug for ObservedSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedSource")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Observe `kind` events from `service` as a lazy [`Listenable`].
pub fn observe<S: ObserverService + 'static>(
    service: Arc<S>,
    kind: EventKind,
) -> Listenable<S::Snapshot> {
    Listenable::new(ObservedSource::new(service, kind))
}
