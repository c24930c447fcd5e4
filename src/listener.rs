use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::error::Result;
use crate::schema::{Companion, SubjectSchema};
use crate::subject::SubjectId;

/// Identity of a listener instance.
///
/// Two keys are equal when they were taken from the same allocation, so a
/// listener can recognise itself in the reserved attach/detach hooks with
/// `ListenerKey::of(self) == listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(usize);

impl ListenerKey {
    pub fn of<T: ?Sized>(listener: &T) -> Self {
        Self(listener as *const T as *const () as usize)
    }

    pub fn of_rc<T: ?Sized>(listener: &Rc<T>) -> Self {
        Self::of(&**listener)
    }
}

/// Type-erased handle a listener keeps to each subject it is attached to
pub(crate) trait Detach {
    fn detach_key(&self, key: ListenerKey) -> Result<()>;
}

struct Subscription {
    subject: SubjectId,
    handle: Weak<dyn Detach>,
}

/// The subjects a listener is currently attached to, one entry per attachment.
///
/// Maintained by the attach and detach operations of the subjects themselves.
#[derive(Default)]
pub struct Subscriptions {
    entries: RefCell<Vec<Subscription>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attached subjects in attachment order
    pub fn subjects(&self) -> Vec<SubjectId> {
        self.entries.borrow().iter().map(|s| s.subject).collect()
    }

    pub fn contains(&self, subject: SubjectId) -> bool {
        self.entries.borrow().iter().any(|s| s.subject == subject)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub(crate) fn record(&self, subject: SubjectId, handle: Weak<dyn Detach>) {
        self.entries
            .borrow_mut()
            .push(Subscription { subject, handle });
    }

    /// Drop the first entry for `subject`
    pub(crate) fn forget(&self, subject: SubjectId) -> bool {
        let mut entries = self.entries.borrow_mut();
        match entries.iter().position(|s| s.subject == subject) {
            Some(idx) => {
                entries.remove(idx);
                true
            }
            None => false,
        }
    }

    fn handles(&self) -> Vec<(SubjectId, Weak<dyn Detach>)> {
        self.entries
            .borrow()
            .iter()
            .map(|s| (s.subject, s.handle.clone()))
            .collect()
    }
}

impl fmt::Debug for Subscriptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriptions")
            .field("subjects", &self.subjects())
            .finish()
    }
}

/// Root of every companion listener trait.
///
/// Carries the reserved hooks fired when listeners are attached to or detached
/// from a subject, plus the listener's subscription bookkeeping. All hooks
/// default to no-ops.
pub trait Listener {
    /// Bookkeeping of the subjects this listener is attached to
    fn subscriptions(&self) -> &Subscriptions;

    /// Called before `listener` is attached to a subject this listener observes
    fn on_add_listener(&self, _listener: ListenerKey) {}

    /// Called once `listener` has been attached to `subject`
    fn on_add_listener_finished(&self, _subject: SubjectId, _listener: ListenerKey) {}

    /// Called before `listener` is detached from a subject this listener observes
    fn on_remove_listener(&self, _listener: ListenerKey) {}

    /// Called once `listener` has been detached from `subject`
    fn on_remove_listener_finished(&self, _subject: SubjectId, _listener: ListenerKey) {}

    /// Whether this listener counts as an instance of the companion trait
    /// described by `schema`. Statically typed listeners always do.
    fn observes(&self, _schema: &SubjectSchema) -> bool {
        true
    }

    /// Detach from every subject this listener is attached to.
    ///
    /// Subjects that have been dropped since are forgotten.
    fn unsubscribe_all(&self) -> Result<()> {
        let key = ListenerKey::of(self);
        let handles = self.subscriptions().handles();
        debug!(target: "listeners", "Unsubscribing {:?} from {} subject(s)", key, handles.len());

        for (subject, handle) in handles {
            match handle.upgrade() {
                Some(registry) => registry.detach_key(key)?,
                None => {
                    self.subscriptions().forget(subject);
                }
            }
        }
        Ok(())
    }
}

impl Companion for dyn Listener {
    const SCHEMA: &'static SubjectSchema = &SubjectSchema {
        name: concat!(module_path!(), "::Listener"),
        parent: None,
        methods: &["add_listener", "remove_listener"],
    };
}
