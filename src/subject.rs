use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DispatchConfig;
use crate::error::{Error, Result};
use crate::listener::{Detach, Listener, ListenerKey};
use crate::schema::Companion;

static NEXT_SUBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a subject, unique for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubjectId(u64);

impl SubjectId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SUBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a notification pass walks the listener collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Iteration {
    /// Re-read the live collection at every step. A listener attached by a
    /// hook during the pass is notified in that same pass; a removal shifts
    /// the remaining listeners down one slot.
    #[default]
    Live,
    /// Walk a copy of the collection taken when the pass starts
    Snapshot,
}

struct Registry<L: ?Sized + Listener + Companion> {
    id: SubjectId,
    iteration: Iteration,
    warn_on_foreign: bool,
    entries: RefCell<Vec<Rc<L>>>,
}

impl<L: ?Sized + Listener + Companion> Registry<L> {
    fn get(&self, idx: usize) -> Option<Rc<L>> {
        self.entries.borrow().get(idx).cloned()
    }

    fn snapshot(&self) -> Vec<Rc<L>> {
        self.entries.borrow().clone()
    }

    // No borrow of `entries` is held while `f` runs, hooks may attach or detach
    fn each(&self, mut f: impl FnMut(&L)) {
        match self.iteration {
            Iteration::Live => {
                let mut idx = 0;
                while let Some(listener) = self.get(idx) {
                    f(&*listener);
                    idx += 1;
                }
            }
            Iteration::Snapshot => {
                for listener in self.snapshot() {
                    f(&*listener);
                }
            }
        }
    }

    fn call<R>(&self, pre: impl Fn(&L), body: impl FnOnce() -> R, post: impl Fn(&L, &R)) -> R {
        self.each(|listener| pre(listener));
        let result = body();
        self.each(|listener| post(listener, &result));
        result
    }

    fn try_call<R, E>(
        &self,
        pre: impl Fn(&L),
        body: impl FnOnce() -> Result<R, E>,
        post: impl Fn(&L, &R),
    ) -> Result<R, E> {
        self.each(|listener| pre(listener));
        let result = body()?;
        self.each(|listener| post(listener, &result));
        Ok(result)
    }

    fn remove(&self, key: ListenerKey) -> Option<Rc<L>> {
        let mut entries = self.entries.borrow_mut();
        let idx = entries
            .iter()
            .position(|listener| ListenerKey::of_rc(listener) == key)?;
        Some(entries.remove(idx))
    }
}

impl<L: ?Sized + Listener + Companion> Detach for Registry<L> {
    fn detach_key(&self, key: ListenerKey) -> Result<()> {
        let subject = self.id;
        self.try_call(
            |listener| listener.on_remove_listener(key),
            || {
                let removed = self
                    .remove(key)
                    .ok_or(Error::ListenerNotFound { subject })?;
                removed.subscriptions().forget(subject);
                debug!(target: "listeners", "Detached {:?} from subject {}", key, subject);
                Ok(())
            },
            |listener, _| listener.on_remove_listener_finished(subject, key),
        )
    }
}

impl<L: ?Sized + Listener + Companion> Drop for Registry<L> {
    fn drop(&mut self) {
        for listener in self.entries.get_mut().drain(..) {
            listener.subscriptions().forget(self.id);
        }
    }
}

/// The ordered collection of listeners attached to one subject.
///
/// `L` is the subject's companion listener trait object, e.g.
/// `dyn CounterListener`. Listeners are kept in attachment order and the same
/// listener may be attached more than once.
pub struct Listeners<L: ?Sized + Listener + Companion> {
    registry: Rc<Registry<L>>,
}

impl<L: ?Sized + Listener + Companion> Listeners<L> {
    pub fn new() -> Self {
        Self::with_config(&DispatchConfig::default())
    }

    pub fn with_config(config: &DispatchConfig) -> Self {
        Self {
            registry: Rc::new(Registry {
                id: SubjectId::next(),
                iteration: config.iteration,
                warn_on_foreign: config.warn_on_foreign,
                entries: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> SubjectId {
        self.registry.id
    }

    pub fn iteration(&self) -> Iteration {
        self.registry.iteration
    }

    pub fn len(&self) -> usize {
        self.registry.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.entries.borrow().is_empty()
    }

    /// Whether `listener` is attached at least once
    pub fn contains<T: ?Sized>(&self, listener: &Rc<T>) -> bool {
        let key = ListenerKey::of_rc(listener);
        self.registry
            .entries
            .borrow()
            .iter()
            .any(|l| ListenerKey::of_rc(l) == key)
    }

    /// The attached listeners in notification order
    pub fn snapshot(&self) -> Vec<Rc<L>> {
        self.registry.snapshot()
    }

    /// Run an observable method.
    ///
    /// `pre` is invoked on every attached listener, then `body` runs, then
    /// `post` is invoked on every listener attached at that point with the
    /// result. A panicking hook aborts the remaining notifications and the
    /// call itself.
    pub fn call<R>(&self, pre: impl Fn(&L), body: impl FnOnce() -> R, post: impl Fn(&L, &R)) -> R {
        self.registry.call(pre, body, post)
    }

    /// Like [`call`](Self::call) for a fallible body. When the body fails the
    /// error is returned and `post` is not invoked.
    pub fn try_call<R, E>(
        &self,
        pre: impl Fn(&L),
        body: impl FnOnce() -> Result<R, E>,
        post: impl Fn(&L, &R),
    ) -> Result<R, E> {
        self.registry.try_call(pre, body, post)
    }

    /// Attach `listener`, notifying `on_add_listener` before and
    /// `on_add_listener_finished` after. The new listener receives the latter.
    pub fn attach(&self, listener: Rc<L>) {
        let registry = &self.registry;
        let (subject, key) = (registry.id, ListenerKey::of_rc(&listener));

        if registry.warn_on_foreign && !listener.observes(L::SCHEMA) {
            warn!(
                target: "listeners",
                "Listener {:?} is not an instance of {}, attaching to subject {} anyway",
                key,
                L::SCHEMA.name,
                subject
            );
        }

        let handle: Weak<Registry<L>> = Rc::downgrade(registry);
        let handle: Weak<dyn Detach> = handle;
        registry.call(
            |l| l.on_add_listener(key),
            || {
                registry.entries.borrow_mut().push(listener.clone());
                listener.subscriptions().record(subject, handle);
                debug!(target: "listeners", "Attached {:?} to subject {}", key, subject);
            },
            |l, _| l.on_add_listener_finished(subject, key),
        );
    }

    /// Detach the first occurrence of `listener`.
    ///
    /// `on_remove_listener` has already been delivered when this fails with
    /// [`Error::ListenerNotFound`]; the detached listener itself does not
    /// receive `on_remove_listener_finished`.
    pub fn detach<T: ?Sized>(&self, listener: &Rc<T>) -> Result<()> {
        self.registry.detach_key(ListenerKey::of_rc(listener))
    }

    /// Detach by identity, for a listener that only holds `&self` (e.g. from
    /// inside one of its own hooks)
    pub fn detach_key(&self, key: ListenerKey) -> Result<()> {
        self.registry.detach_key(key)
    }

    /// Detach every listener attached when the call starts
    pub fn detach_all(&self) -> Result<()> {
        let snapshot = self.registry.snapshot();
        debug!(
            target: "listeners",
            "Detaching {} listener(s) from subject {}",
            snapshot.len(),
            self.registry.id
        );
        for listener in &snapshot {
            self.registry.detach_key(ListenerKey::of_rc(listener))?;
        }
        Ok(())
    }
}

impl<L: ?Sized + Listener + Companion> Default for Listeners<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Attaches each listener in order, firing the attach hooks as it goes
impl<L: ?Sized + Listener + Companion> Extend<Rc<L>> for Listeners<L> {
    fn extend<I: IntoIterator<Item = Rc<L>>>(&mut self, iter: I) {
        for listener in iter {
            self.attach(listener);
        }
    }
}

impl<L: ?Sized + Listener + Companion> FromIterator<Rc<L>> for Listeners<L> {
    fn from_iter<I: IntoIterator<Item = Rc<L>>>(iter: I) -> Self {
        let mut listeners = Self::new();
        listeners.extend(iter);
        listeners
    }
}

impl<L: ?Sized + Listener + Companion> fmt::Debug for Listeners<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("id", &self.registry.id)
            .field("companion", &L::SCHEMA.name)
            .field("iteration", &self.registry.iteration)
            .field("len", &self.len())
            .finish()
    }
}

/// An object whose observable methods notify a [`Listeners`] collection.
pub trait Subject {
    /// The companion listener trait object of this subject type
    type Observer: ?Sized + Listener + Companion;

    fn listeners(&self) -> &Listeners<Self::Observer>;

    fn subject_id(&self) -> SubjectId {
        self.listeners().id()
    }

    fn attach(&self, listener: Rc<Self::Observer>) {
        self.listeners().attach(listener)
    }

    fn detach<T: ?Sized>(&self, listener: &Rc<T>) -> Result<()> {
        self.listeners().detach(listener)
    }

    fn detach_all(&self) -> Result<()> {
        self.listeners().detach_all()
    }
}
