use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::Result;
use crate::listener::{Listener, ListenerKey, Subscriptions};
use crate::schema::{self, Companion, SubjectSchema};
use crate::subject::SubjectId;

/// Hook body: pre-call hooks get the method arguments, post-call hooks get the
/// result followed by the arguments
pub type Hook = Box<dyn Fn(&[&dyn Any])>;

/// A listener whose hooks are closures registered by name.
///
/// Useful when the set of observed methods is only known at runtime. Hook
/// names are checked against the declared targets when the listener is built,
/// so a typo fails before the listener can be attached.
///
/// Only companion traits declared as `dyn trait` in
/// [`listenable!`](crate::listenable) are implemented for it.
pub struct DynListener {
    name: String,
    targets: Vec<&'static SubjectSchema>,
    hooks: BTreeMap<String, Hook>,
    subscriptions: Subscriptions,
}

impl DynListener {
    pub fn builder(name: impl Into<String>) -> DynListenerBuilder {
        DynListenerBuilder {
            name: name.into(),
            targets: Vec::new(),
            hooks: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn targets(&self) -> &[&'static SubjectSchema] {
        &self.targets
    }

    pub fn has_hook(&self, hook: &str) -> bool {
        self.hooks.contains_key(hook)
    }

    #[doc(hidden)]
    pub fn dispatch(&self, hook: &str, args: &[&dyn Any]) {
        if let Some(hook) = self.hooks.get(hook) {
            hook(args);
        }
    }
}

impl Listener for DynListener {
    fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    fn on_add_listener(&self, listener: ListenerKey) {
        self.dispatch("on_add_listener", &[&listener as &dyn Any]);
    }

    fn on_add_listener_finished(&self, subject: SubjectId, listener: ListenerKey) {
        self.dispatch(
            "on_add_listener_finished",
            &[&subject as &dyn Any, &listener as &dyn Any],
        );
    }

    fn on_remove_listener(&self, listener: ListenerKey) {
        self.dispatch("on_remove_listener", &[&listener as &dyn Any]);
    }

    fn on_remove_listener_finished(&self, subject: SubjectId, listener: ListenerKey) {
        self.dispatch(
            "on_remove_listener_finished",
            &[&subject as &dyn Any, &listener as &dyn Any],
        );
    }

    fn observes(&self, schema: &SubjectSchema) -> bool {
        schema.parent.is_none() || self.targets.iter().any(|target| target.is_a(schema))
    }
}

impl fmt::Debug for DynListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynListener")
            .field("name", &self.name)
            .field(
                "targets",
                &self.targets.iter().map(|t| t.name).collect::<Vec<_>>(),
            )
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}

pub struct DynListenerBuilder {
    name: String,
    targets: Vec<&'static SubjectSchema>,
    hooks: BTreeMap<String, Hook>,
}

impl DynListenerBuilder {
    /// Observe the subject type whose companion trait object is `L`
    pub fn observe<L: ?Sized + Companion>(self) -> Self {
        self.target(L::SCHEMA)
    }

    pub fn target(mut self, schema: &'static SubjectSchema) -> Self {
        self.targets.push(schema);
        self
    }

    /// Register a hook; a later registration under the same name replaces it
    pub fn hook(mut self, name: impl Into<String>, hook: impl Fn(&[&dyn Any]) + 'static) -> Self {
        self.hooks.insert(name.into(), Box::new(hook));
        self
    }

    /// Validate the hook names against the targets and build the listener
    pub fn build(self) -> Result<Rc<DynListener>> {
        schema::validate(
            &self.name,
            self.hooks.keys().map(String::as_str),
            &self.targets,
        )?;

        debug!(
            target: "listeners",
            "Declared dynamic listener {} with {} hook(s) over {} target(s)",
            self.name,
            self.hooks.len(),
            self.targets.len()
        );

        Ok(Rc::new(DynListener {
            name: self.name,
            targets: self.targets,
            hooks: self.hooks,
            subscriptions: Subscriptions::new(),
        }))
    }
}

impl fmt::Debug for DynListenerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynListenerBuilder")
            .field("name", &self.name)
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;

    #[test]
    fn test_reserved_hooks_need_no_target() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let listener = DynListener::builder("plain")
            .hook("on_add_listener_finished", move |args| {
                let subject = args[0].downcast_ref::<SubjectId>().copied();
                sink.borrow_mut().push(subject);
            })
            .build()
            .unwrap();

        let subject = SubjectId::next();
        listener.on_add_listener_finished(subject, ListenerKey::of_rc(&listener));
        assert_eq!(*seen.borrow(), vec![Some(subject)]);
        assert!(listener.has_hook("on_add_listener_finished"));
    }

    #[test]
    fn test_unknown_hook_is_rejected() {
        let err = DynListener::builder("typo")
            .hook("on_add_listner", |_| {})
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            Error::UnknownHook {
                listener: "typo".to_string(),
                hook: "on_add_listner".to_string(),
            }
        );
    }

    #[test]
    fn test_untargeted_listener_observes_only_the_root() {
        let listener = DynListener::builder("plain").build().unwrap();
        assert!(listener.observes(<dyn Listener as Companion>::SCHEMA));
        assert!(listener.targets().is_empty());
        assert_eq!(listener.name(), "plain");
    }
}
