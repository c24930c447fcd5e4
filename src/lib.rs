//! Typed observer pattern.
//!
//! A subject type declares which of its methods are observable with
//! [`listenable!`], which generates the subject's companion listener trait:
//! one `on_<method>` and one `on_<method>_finished` hook per observable
//! method, each a no-op by default. Subjects keep their attached listeners in
//! a [`Listeners`] collection and run observable methods through
//! [`Listeners::call`], which notifies every listener before and after the
//! method body.
//!
//! Every listener also tracks the subjects it is attached to, so it can
//! detach from all of them at once with [`Listener::unsubscribe_all`].
#![warn(missing_debug_implementations, rust_2018_idioms)]

mod macros;

pub mod config;
pub mod dynamic;
pub mod error;
pub mod listener;
pub mod logging;
pub mod schema;
pub mod subject;

pub use config::{Config, ConfigError, DispatchConfig, LoggingConfig};
pub use dynamic::{DynListener, DynListenerBuilder};
pub use error::{Error, Result};
pub use listener::{Listener, ListenerKey, Subscriptions};
pub use schema::{Companion, SubjectSchema};
pub use subject::{Iteration, Listeners, Subject, SubjectId};
