//! Observer layer: adapting attach/detach-by-token observation APIs into
//! [`Listenable`](crate::Listenable)s.
//!
//! # Modules
//!
//! - [`adapter`]: the [`ObserverService`] boundary and [`observe`].
//! - [`memory`]: [`MemoryNode`], an in-process service holding one document
//!   node, used as a reference backend and in tests.

pub mod adapter;
pub mod memory;

pub use adapter::{
    observe, ErrorCallback, EventKind, ObservedSource, ObserverFailure, ObserverService,
    ValueCallback,
};
pub use memory::{DataSnapshot, MemoryNode};
