//! Stream operators: `map`, `try_map`, `tap`, `merge`, `combine_latest`.
//!
//! Every operator returns a new [`Listenable`] and does nothing until that
//! listenable is subscribed. Each subscription wires its own upstream
//! connections; disposing it releases them.

use std::sync::Arc;

use crate::{
    accumulator::{composite, Accumulator, Assemble, Slot},
    error::{soft_assert, Result},
    event::{Event, Handler},
    listenable::Listenable,
};

impl<T: Send + Sync + 'static> Listenable<T> {
    /// Forward `f(value)` for every value; errors pass through unchanged.
    pub fn map<U, F>(&self, f: F) -> Listenable<U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let f = Arc::new(f);
        Listenable::from_fn(move |handler: Handler<U>| {
            let f = Arc::clone(&f);
            upstream.connect(Arc::new(move |event: &Event<T>| {
                handler(&event.map(|v| f(v)));
            }))
        })
    }

    /// Like [`map`](Self::map), but `Err` results become error events.
    /// The stream keeps going after a rejected value.
    pub fn try_map<U, F>(&self, f: F) -> Listenable<U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> Result<U> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let f = Arc::new(f);
        Listenable::from_fn(move |handler: Handler<U>| {
            let f = Arc::clone(&f);
            upstream.connect(Arc::new(move |event: &Event<T>| {
                let mapped = match event {
                    Event::Value(v) => Event::from(f(v)),
                    Event::Error(e) => Event::Error(e.clone()),
                };
                handler(&mapped);
            }))
        })
    }

    /// Run `on_value` for every value before passing the event on unchanged.
    pub fn tap<F>(&self, on_value: F) -> Listenable<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let on_value = Arc::new(on_value);
        Listenable::from_fn(move |handler: Handler<T>| {
            let on_value = Arc::clone(&on_value);
            upstream.connect(Arc::new(move |event: &Event<T>| {
                if let Event::Value(v) = event {
                    on_value(v);
                }
                handler(event);
            }))
        })
    }
}

impl<T: Clone + Send + Sync + 'static> Listenable<T> {
    /// Merge with one other stream of the same element type.
    pub fn merge(&self, other: &Listenable<T>) -> Listenable<T> {
        merge([self.clone(), other.clone()])
    }

    /// Pair the latest value of this stream with the latest value of `other`.
    pub fn combine<U>(&self, other: &Listenable<U>) -> Listenable<(T, U)>
    where
        U: Clone + Send + Sync + 'static,
    {
        combine_latest2(self, other)
    }
}

/// Forward every event from any of `sources`, as it arrives.
pub fn merge<T, I>(sources: I) -> Listenable<T>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = Listenable<T>>,
{
    let sources: Vec<Listenable<T>> = sources.into_iter().collect();
    soft_assert!(!sources.is_empty(), "merge needs at least one source");
    Listenable::from_fn(move |handler: Handler<T>| {
        let acc = Accumulator::merge(sources.len());
        let downstream = acc.attach_downstream(handler);
        let upstream = sources
            .iter()
            .enumerate()
            .map(|(i, source)| acc.feed(i, source))
            .collect();
        composite(downstream, upstream)
    })
}

fn slot<V: Clone + 'static>(slots: &[Slot], index: usize) -> Option<V> {
    slots.get(index)?.downcast_ref::<V>().cloned()
}

macro_rules! combine_latest_fn {
    ($(#[$doc:meta])* $name:ident, $($src:ident : $ty:ident @ $idx:tt),+) => {
        $(#[$doc])*
        pub fn $name<$($ty),+>($($src: &Listenable<$ty>),+) -> Listenable<($($ty,)+)>
        where
            $($ty: Clone + Send + Sync + 'static),+
        {
            $(let $src = $src.clone();)+
            let assemble: Assemble<($($ty,)+)> =
                Arc::new(|slots: &[Slot]| Some(($(slot::<$ty>(slots, $idx)?,)+)));
            let count = [$($idx),+].len();
            Listenable::from_fn(move |handler: Handler<($($ty,)+)>| {
                let acc = Accumulator::combine_latest(count, Arc::clone(&assemble));
                let downstream = acc.attach_downstream(handler);
                let upstream = vec![$(acc.feed($idx, &$src)),+];
                composite(downstream, upstream)
            })
        }
    };
}

combine_latest_fn!(
    /// Emit `(a, b)` on every event once both sources have produced a value.
    /// Errors from either source are forwarded immediately.
    combine_latest2,
    a: A @ 0,
    b: B @ 1
);

combine_latest_fn!(
    /// Three-source [`combine_latest2`].
    combine_latest3,
    a: A @ 0,
    b: B @ 1,
    c: C @ 2
);

combine_latest_fn!(
    /// Four-source [`combine_latest2`].
    combine_latest4,
    a: A @ 0,
    b: B @ 1,
    c: C @ 2,
    d: D @ 3
);
