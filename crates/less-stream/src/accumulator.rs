//! Accumulator<T>: the state machine behind `merge` and `combine_latest`.
//!
//! Per-source state is a fixed-size vector of optional slots indexed by source
//! position. Slots are type-erased (`Arc<dyn Any>`) so sources of different
//! element types can share one accumulator; combine mode recovers the concrete
//! types with a downcast when it assembles the output tuple.
//!
//! One accumulator is built per downstream subscription. It never owns the
//! upstream connections; those live in the disposable built by [`composite`],
//! so upstream handlers and the accumulator they feed form no cycle.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    disposable::Disposable,
    error::soft_assert,
    event::{Event, Handler},
    listenable::{Connection, Listenable},
    repeater::Repeater,
};

/// Last value received from one source.
pub(crate) type Slot = Arc<dyn Any + Send + Sync>;

/// Builds the combined output from a fully seeded slot vector.
pub(crate) type Assemble<T> = Arc<dyn Fn(&[Slot]) -> Option<T> + Send + Sync>;

pub(crate) enum Mode<T> {
    /// Homogeneous sources; every value is forwarded as it arrives.
    Merge,
    /// Heterogeneous sources; emit only once every slot is seeded.
    CombineLatest(Assemble<T>),
}

pub(crate) struct Accumulator<T> {
    slots: Mutex<Vec<Option<Slot>>>,
    mode: Mode<T>,
    output: Repeater<T>,
}

impl<T: Clone + Send + Sync + 'static> Accumulator<T> {
    pub(crate) fn merge(sources: usize) -> Arc<Self> {
        Self::with_mode(sources, Mode::Merge)
    }

    pub(crate) fn combine_latest(sources: usize, assemble: Assemble<T>) -> Arc<Self> {
        Self::with_mode(sources, Mode::CombineLatest(assemble))
    }

    fn with_mode(sources: usize, mode: Mode<T>) -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(vec![None; sources]),
            mode,
            output: Repeater::new(),
        })
    }

    /// Attach the downstream handler to the output side.
    pub(crate) fn attach_downstream(&self, handler: Handler<T>) -> Connection {
        self.output.attach(handler)
    }

    /// Subscribe to `upstream` as source number `index`.
    pub(crate) fn feed<S>(self: &Arc<Self>, index: usize, upstream: &Listenable<S>) -> Connection
    where
        S: Clone + Send + Sync + 'static,
    {
        let acc = Arc::clone(self);
        upstream.connect(Arc::new(move |event: &Event<S>| match event {
            Event::Value(v) => acc.accept(index, Arc::new(v.clone())),
            Event::Error(e) => acc.output.send_error(e.clone()),
        }))
    }

    /// Record `slot` for source `index` and emit if the mode allows it.
    fn accept(&self, index: usize, slot: Slot) {
        let out = {
            let mut slots = self.slots.lock();
            match slots.get_mut(index) {
                Some(entry) => *entry = Some(Arc::clone(&slot)),
                None => {
                    soft_assert!(false, "accumulator source index out of range");
                    return;
                }
            }
            match &self.mode {
                Mode::Merge => {
                    let value = slot.downcast_ref::<T>().cloned();
                    soft_assert!(value.is_some(), "merge source produced a foreign type");
                    value
                }
                Mode::CombineLatest(assemble) => {
                    let seeded: Option<Vec<Slot>> = slots.iter().cloned().collect();
                    seeded.and_then(|s| assemble(&s))
                }
            }
        };
        // Lock released; downstream handlers may re-enter.
        if let Some(value) = out {
            self.output.send_value(value);
        }
    }
}

/// Wrap a downstream attachment and its upstream connections into one
/// connection whose disposal tears everything down, upstream first.
pub(crate) fn composite(downstream: Connection, upstream: Vec<Connection>) -> Connection {
    let token = downstream.token;
    Connection::new(
        token,
        Disposable::new(move || {
            for connection in upstream {
                connection.dispose();
            }
            downstream.dispose();
        }),
    )
}
