//! Reactive key/value store.
//!
//! The store is the single source of truth for every layout consumer. It is
//! created once per session and shared as a cheap handle (`Store` is an `Rc`
//! around the real state); components keep the handle and re-read values each
//! frame instead of caching them.
//!
//! # Notification order
//!
//! `mutate` merges the patch into the snapshot, then notifies:
//! 1. every any-mutation subscriber, once, in registration order;
//! 2. for each key in the patch (patch order), that key's per-key subscribers in
//!    registration order, with the new value.
//!
//! One-shot subscribers are removed before they are invoked, so they fire at
//! most once no matter how many batches touch their key.
//!
//! # Re-entrancy
//!
//! Callbacks may call `mutate`. The nested patch is merged into the snapshot
//! immediately, but its notifications are queued: the batch being dispatched
//! finishes its own subscriber list first, then queued batches run FIFO.

use super::value::StateValue;
use crate::model::{StoreError, Vec2};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::trace;

/// A set of key/value writes applied by one `mutate` call.
///
/// Entries keep insertion order; when a key appears twice the later value wins
/// in the snapshot, and per-key subscribers are notified once per entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    entries: Vec<(String, StateValue)>,
}

impl Patch {
    /// Empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Patch::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Append a write.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StateValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Number of writes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the patch writes nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over writes in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Value written for `key`, last write wins.
    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

impl<K: Into<String>, V: Into<StateValue>> FromIterator<(K, V)> for Patch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut patch = Patch::new();
        for (key, value) in iter {
            patch.set(key, value);
        }
        patch
    }
}

/// Handle returned by `subscribe*`, required to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// How a subscription is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionMode {
    /// Fires when a mutation writes the subscription's key.
    PerKey,
    /// Fires on every mutation, whatever keys it writes.
    AnyMutation,
}

type KeyHandler = Rc<RefCell<dyn FnMut(&StateValue)>>;
type AnyHandler = Rc<RefCell<dyn FnMut()>>;

#[derive(Clone)]
enum Handler {
    Key(KeyHandler),
    Any(AnyHandler),
}

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    key: String,
    once: bool,
    handler: Handler,
}

impl Subscription {
    fn mode(&self) -> SubscriptionMode {
        match self.handler {
            Handler::Key(_) => SubscriptionMode::PerKey,
            Handler::Any(_) => SubscriptionMode::AnyMutation,
        }
    }
}

struct StoreInner {
    snapshot: RefCell<HashMap<String, StateValue>>,
    subscriptions: RefCell<Vec<Subscription>>,
    queue: RefCell<VecDeque<Patch>>,
    dispatching: Cell<bool>,
    next_id: Cell<u64>,
}

/// Shared handle to the reactive store.
///
/// Cloning the handle does not copy the snapshot; all clones observe and write
/// the same state.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use transcript_layout::state::{Patch, Store};
///
/// let store = Store::new(Patch::new().with("lineHeight", 10.0));
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
/// store.subscribe("lineHeight", move |v| sink.borrow_mut().push(v.as_number()));
///
/// store.mutate(Patch::new().with("lineHeight", 12.0));
/// assert_eq!(*seen.borrow(), vec![Some(12.0)]);
/// assert_eq!(store.number("lineHeight"), Some(12.0));
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("keys", &self.inner.snapshot.borrow().len())
            .field("subscriptions", &self.inner.subscriptions.borrow().len())
            .field("dispatching", &self.inner.dispatching.get())
            .finish()
    }
}

/// Non-owning store handle.
///
/// Callbacks registered on the store hold this instead of a [`Store`] so the
/// subscription registry does not keep its own store alive.
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<StoreInner>,
}

impl WeakStore {
    /// Owning handle, or `None` once every [`Store`] clone is gone.
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl fmt::Debug for WeakStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Resets the dispatch flag even if a callback panics.
struct DispatchGuard<'a>(&'a StoreInner);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.dispatching.set(false);
    }
}

impl Store {
    /// Create a store seeded with an initial snapshot.
    ///
    /// The initial patch is applied without notifying anyone; there are no
    /// subscribers yet.
    pub fn new(initial: Patch) -> Self {
        let snapshot = initial.entries.into_iter().collect();
        Self {
            inner: Rc::new(StoreInner {
                snapshot: RefCell::new(snapshot),
                subscriptions: RefCell::new(Vec::new()),
                queue: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Non-owning handle to this store.
    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // === Mutation ===

    /// Merge `patch` into the snapshot and notify subscribers.
    ///
    /// See the module docs for ordering and re-entrancy.
    pub fn mutate(&self, patch: Patch) {
        if patch.is_empty() {
            return;
        }
        {
            let mut snapshot = self.inner.snapshot.borrow_mut();
            for (key, value) in &patch.entries {
                snapshot.insert(key.clone(), value.clone());
            }
        }
        self.inner.queue.borrow_mut().push_back(patch);

        if self.inner.dispatching.get() {
            trace!("nested mutate queued");
            return;
        }
        self.inner.dispatching.set(true);
        let _guard = DispatchGuard(&self.inner);

        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            match next {
                Some(batch) => self.dispatch(&batch),
                None => break,
            }
        }
    }

    /// Convenience for a single-key mutation.
    pub fn set(&self, key: impl Into<String>, value: impl Into<StateValue>) {
        self.mutate(Patch::new().with(key, value));
    }

    fn dispatch(&self, batch: &Patch) {
        let any: Vec<Subscription> = self
            .inner
            .subscriptions
            .borrow()
            .iter()
            .filter(|s| s.mode() == SubscriptionMode::AnyMutation)
            .cloned()
            .collect();
        for sub in any {
            if let Some(Handler::Any(handler)) = self.claim(&sub) {
                (&mut *handler.borrow_mut())();
            }
        }

        for (key, value) in batch.iter() {
            let targets: Vec<Subscription> = self
                .inner
                .subscriptions
                .borrow()
                .iter()
                .filter(|s| s.mode() == SubscriptionMode::PerKey && s.key == key)
                .cloned()
                .collect();
            for sub in targets {
                if let Some(Handler::Key(handler)) = self.claim(&sub) {
                    (&mut *handler.borrow_mut())(value);
                }
            }
        }
    }

    /// Returns the handler to invoke, or `None` if the subscription was removed
    /// since the target list was taken. One-shot subscriptions are removed
    /// here, before the caller invokes them.
    fn claim(&self, sub: &Subscription) -> Option<Handler> {
        let mut subs = self.inner.subscriptions.borrow_mut();
        let pos = subs.iter().position(|s| s.id == sub.id)?;
        if sub.once {
            subs.remove(pos);
        }
        Some(sub.handler.clone())
    }

    // === Subscription ===

    /// Register a per-key subscriber.
    pub fn subscribe(
        &self,
        key: impl Into<String>,
        callback: impl FnMut(&StateValue) + 'static,
    ) -> SubscriptionId {
        self.register(key.into(), false, Handler::Key(Rc::new(RefCell::new(callback))))
    }

    /// Register a per-key subscriber that removes itself after its first call.
    pub fn subscribe_once(
        &self,
        key: impl Into<String>,
        callback: impl FnMut(&StateValue) + 'static,
    ) -> SubscriptionId {
        self.register(key.into(), true, Handler::Key(Rc::new(RefCell::new(callback))))
    }

    /// Register a subscriber fired on every mutation.
    ///
    /// `key` only names the subscription for `unsubscribe`.
    pub fn subscribe_any(
        &self,
        key: impl Into<String>,
        callback: impl FnMut() + 'static,
    ) -> SubscriptionId {
        self.register(key.into(), false, Handler::Any(Rc::new(RefCell::new(callback))))
    }

    /// Register an any-mutation subscriber that removes itself after one call.
    pub fn subscribe_any_once(
        &self,
        key: impl Into<String>,
        callback: impl FnMut() + 'static,
    ) -> SubscriptionId {
        self.register(key.into(), true, Handler::Any(Rc::new(RefCell::new(callback))))
    }

    fn register(&self, key: String, once: bool, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.subscriptions.borrow_mut().push(Subscription {
            id,
            key,
            once,
            handler,
        });
        id
    }

    /// Remove a subscription.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no subscription with this id is
    /// registered under `key` (including one-shot subscriptions that already
    /// fired).
    pub fn unsubscribe(&self, key: &str, id: SubscriptionId) -> Result<(), StoreError> {
        let mut subs = self.inner.subscriptions.borrow_mut();
        let pos = subs
            .iter()
            .position(|s| s.id == id && s.key == key)
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
                id: id.0,
            })?;
        subs.remove(pos);
        Ok(())
    }

    /// Number of live subscriptions registered under `key`.
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner
            .subscriptions
            .borrow()
            .iter()
            .filter(|s| s.key == key)
            .count()
    }

    // === Reading ===

    /// Clone of the value at `key`.
    pub fn get(&self, key: &str) -> Option<StateValue> {
        self.inner.snapshot.borrow().get(key).cloned()
    }

    /// True when `key` has been written.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.snapshot.borrow().contains_key(key)
    }

    /// Numeric value at `key`.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.inner.snapshot.borrow().get(key)?.as_number()
    }

    /// Numeric value at `key`, narrowed to `f32`.
    pub fn f32(&self, key: &str) -> Option<f32> {
        self.inner.snapshot.borrow().get(key)?.as_f32()
    }

    /// Text value at `key`.
    pub fn text(&self, key: &str) -> Option<String> {
        self.inner
            .snapshot
            .borrow()
            .get(key)?
            .as_text()
            .map(str::to_string)
    }

    /// Boolean value at `key`.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.inner.snapshot.borrow().get(key)?.as_bool()
    }

    /// Point value at `key`.
    pub fn vec2(&self, key: &str) -> Option<Vec2> {
        self.inner.snapshot.borrow().get(key)?.as_vec2()
    }

    /// Ordered copy of the whole snapshot, for diagnostics and reports.
    pub fn snapshot(&self) -> BTreeMap<String, StateValue> {
        self.inner
            .snapshot
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
