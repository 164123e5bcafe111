//! Push-based event streams with shared upstream connections.
//!
//! # Overview
//!
//! Streams are [`Listenable`] values: subscribing with
//! [`Listenable::listening`] attaches a handler and returns a [`Disposable`]
//! the caller must keep and eventually dispose. Delivery is synchronous on the
//! context that pushes each [`Event`].
//!
//! # Modules
//!
//! - [`event`]: [`Event`] and the [`Handler`] callback type.
//! - [`disposable`]: [`Disposable`] and [`DisposeStore`].
//! - [`repeater`]: [`Repeater`], the manually driven multicast source.
//! - [`listenable`]: [`Listenable`], [`Subscribe`], connection tokens.
//! - [`listening_item`]: [`ListeningItem`], pausable subscriptions.
//! - [`operators`]: `map`, `try_map`, `tap`, [`merge`], `combine_latest*`.
//! - [`shared`] / [`share`]: multicast adapters; [`strategy`] holds their
//!   options.
//! - [`observer`]: adapter over external observer services.
//! - [`pump`]: cross-thread marshalling into a repeater.

pub mod error;

mod accumulator;
pub mod disposable;
pub mod event;
pub mod listenable;
pub mod listening_item;
mod multicast;
pub mod observer;
pub mod operators;
pub mod pump;
pub mod repeater;
pub mod share;
pub mod shared;
pub mod strategy;

pub use disposable::{Disposable, DisposeStore};
pub use error::{Result, StreamError};
pub use event::{Event, Handler};
pub use listenable::{Connection, ConnectionToken, Listenable, Subscribe};
pub use listening_item::ListeningItem;
pub use operators::{combine_latest2, combine_latest3, combine_latest4, merge};
pub use pump::{EventPump, PumpSender};
pub use repeater::Repeater;
pub use share::Share;
pub use shared::Shared;
pub use strategy::{LiveState, LiveStrategy, ShareOptions};
