//! Disposable, a one-shot teardown handle, and DisposeStore, a bag of them.
//!
//! Dropping a `Disposable` does not run its action. Subscriptions live until
//! somebody calls [`Disposable::dispose`]; keep the handle (or put it in a
//! [`DisposeStore`]) for as long as the subscription should stay attached.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

type Teardown = Box<dyn FnOnce() + Send>;

struct DisposeInner {
    action: Mutex<Option<Teardown>>,
    disposed: AtomicBool,
}

/// A handle whose teardown action runs at most once.
///
/// Clones share the same action: disposing any clone disposes all of them.
#[derive(Clone)]
pub struct Disposable {
    inner: Arc<DisposeInner>,
}

impl Disposable {
    /// Wrap `action` so it runs on the first call to [`dispose`](Self::dispose).
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(DisposeInner {
                action: Mutex::new(Some(Box::new(action))),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// A handle with nothing to tear down.
    pub fn empty() -> Self {
        Self::new(|| {})
    }

    /// Run the teardown action if it has not run yet.
    ///
    /// The action is taken out of the lock before it runs, so it may safely
    /// re-enter the stream it detaches from (including disposing itself).
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let action = self.inner.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ============================================================================
// DisposeStore
// ============================================================================

/// Owns many disposables and releases them together.
///
/// Disposing the store (or dropping it) disposes every held handle in the
/// order it was added. A store that has been disposed stays usable: handles
/// added afterwards are disposed immediately.
#[derive(Default)]
pub struct DisposeStore {
    items: Mutex<Vec<Disposable>>,
    disposed: AtomicBool,
}

impl DisposeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, disposable: Disposable) {
        if self.disposed.load(Ordering::Acquire) {
            disposable.dispose();
            return;
        }
        self.items.lock().push(disposable);
    }

    /// Dispose every held handle in insertion order and empty the store.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        // Drain under the lock, dispose outside it: teardown actions may
        // call back into this store.
        let items: Vec<Disposable> = self.items.lock().drain(..).collect();
        for item in items {
            item.dispose();
        }
    }

    /// Number of handles currently held.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for DisposeStore {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Extend<Disposable> for DisposeStore {
    fn extend<I: IntoIterator<Item = Disposable>>(&mut self, iter: I) {
        for d in iter {
            self.add(d);
        }
    }
}
