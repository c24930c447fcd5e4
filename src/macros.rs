/// Declare the companion listener trait of a subject type.
///
/// Each observable method of the subject is listed with its argument types,
/// its return type and the names of its two hooks, which must be `on_<method>`
/// and `on_<method>_finished` (checked at compile time). The generated trait
/// extends the companion trait of the parent subject type, so a listener for
/// a derived subject can override hooks for every inherited observable method
/// too. Every hook defaults to a no-op.
///
/// Pre-call hooks receive the arguments by reference, post-call hooks receive
/// the result followed by the arguments. An argument declared as `name: str`
/// reaches the hooks as `&str`, the same goes for slices.
///
/// The parent must be [`Listener`](crate::Listener) or another trait declared
/// with this macro.
///
/// # Example
/// ```
/// use std::cell::{Cell, RefCell};
/// use std::rc::Rc;
///
/// use metapatterns::{listenable, Companion, Listener, Listeners, Subject, Subscriptions};
///
/// listenable! {
///     pub trait CounterListener: Listener {
///         fn increment(by: i64) -> i64 => on_increment, on_increment_finished;
///         fn rename(label: str) => on_rename, on_rename_finished;
///     }
/// }
///
/// pub struct Counter<L: ?Sized + CounterListener + Companion = dyn CounterListener> {
///     value: Cell<i64>,
///     label: RefCell<String>,
///     listeners: Listeners<L>,
/// }
///
/// impl<L: ?Sized + CounterListener + Companion> Counter<L> {
///     pub fn increment(&self, by: i64) -> i64 {
///         self.listeners.call(
///             |l| l.on_increment(&by),
///             || {
///                 self.value.set(self.value.get() + by);
///                 self.value.get()
///             },
///             |l, total| l.on_increment_finished(total, &by),
///         )
///     }
///
///     pub fn rename(&self, label: &str) {
///         self.listeners.call(
///             |l| l.on_rename(label),
///             || *self.label.borrow_mut() = label.to_string(),
///             |l, result| l.on_rename_finished(result, label),
///         )
///     }
/// }
///
/// impl<L: ?Sized + CounterListener + Companion> Subject for Counter<L> {
///     type Observer = L;
///
///     fn listeners(&self) -> &Listeners<L> {
///         &self.listeners
///     }
/// }
///
/// #[derive(Default)]
/// struct Tally {
///     total: Cell<i64>,
///     label: RefCell<String>,
///     subscriptions: Subscriptions,
/// }
///
/// impl Listener for Tally {
///     fn subscriptions(&self) -> &Subscriptions {
///         &self.subscriptions
///     }
/// }
///
/// impl CounterListener for Tally {
///     fn on_increment_finished(&self, total: &i64, _by: &i64) {
///         self.total.set(*total);
///     }
///
///     fn on_rename(&self, label: &str) {
///         *self.label.borrow_mut() = label.to_string();
///     }
/// }
///
/// fn main() {
///     let counter: Counter = Counter {
///         value: Cell::new(0),
///         label: RefCell::new(String::new()),
///         listeners: Listeners::new(),
///     };
///     let tally = Rc::new(Tally::default());
///     counter.attach(tally.clone());
///
///     counter.increment(2);
///     assert_eq!(counter.increment(3), 5);
///     assert_eq!(tally.total.get(), 5);
///
///     counter.rename("clicks");
///     assert_eq!(*tally.label.borrow(), "clicks");
/// }
/// ```
///
/// # Dynamic listeners
///
/// Writing `dyn` before `trait` also implements the companion trait for
/// [`DynListener`](crate::DynListener), so listeners built at runtime can be
/// attached to the subject. Every hook then forwards its values as
/// `&dyn Any`, which requires `'static + Sized` argument and return types.
/// The parent of a `dyn` companion must itself be `dyn` (or `Listener`).
///
/// ```
/// # use metapatterns::{listenable, Listener};
/// listenable! {
///     pub dyn trait GaugeListener: Listener {
///         fn set(value: i32) -> i32 => on_set, on_set_finished;
///     }
/// }
/// # fn main() {}
/// ```
///
/// # Hooks are checked at compile time
///
/// A listener cannot implement a hook its companion trait does not declare:
///
/// ```compile_fail
/// # use metapatterns::{listenable, Listener, Subscriptions};
/// listenable! {
///     pub trait CounterListener: Listener {
///         fn increment(by: i64) -> i64 => on_increment, on_increment_finished;
///     }
/// }
///
/// struct Typo {
///     subscriptions: Subscriptions,
/// }
///
/// impl Listener for Typo {
///     fn subscriptions(&self) -> &Subscriptions {
///         &self.subscriptions
///     }
/// }
///
/// impl CounterListener for Typo {
///     // `decrement` is not observable
///     fn on_decrement(&self, _by: &i64) {}
/// }
/// # fn main() {}
/// ```
///
/// Nor can a declaration name hooks that do not derive from the method:
///
/// ```compile_fail
/// # use metapatterns::{listenable, Listener};
/// listenable! {
///     pub trait CounterListener: Listener {
///         fn increment(by: i64) -> i64 => on_add, on_add_finished;
///     }
/// }
/// # fn main() {}
/// ```
#[macro_export]
macro_rules! listenable {
    (@ret) => { () };
    (@ret $ret:ty) => { $ret };
    (
        $(#[$meta:meta])*
        $vis:vis dyn trait $name:ident: $parent:path {
            $(
                $(#[$hook_meta:meta])*
                fn $method:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)? => $pre:ident, $post:ident;
            )*
        }
    ) => {
        $crate::listenable! {
            $(#[$meta])*
            $vis trait $name: $parent {
                $(
                    $(#[$hook_meta])*
                    fn $method($($arg: $ty),*) $(-> $ret)? => $pre, $post;
                )*
            }
        }

        impl $name for $crate::DynListener {
            $(
                fn $pre(&self, $($arg: &$ty),*) {
                    self.dispatch(stringify!($pre), &[$($arg as &dyn ::std::any::Any),*]);
                }

                fn $post(&self, result: &$crate::listenable!(@ret $($ret)?), $($arg: &$ty),*) {
                    self.dispatch(
                        stringify!($post),
                        &[result as &dyn ::std::any::Any, $($arg as &dyn ::std::any::Any),*],
                    );
                }
            )*
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis trait $name:ident: $parent:path {
            $(
                $(#[$hook_meta:meta])*
                fn $method:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)? => $pre:ident, $post:ident;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis trait $name: $parent {
            $(
                $(#[$hook_meta])*
                #[allow(unused_variables)]
                fn $pre(&self, $($arg: &$ty),*) {}

                $(#[$hook_meta])*
                #[allow(unused_variables)]
                fn $post(&self, result: &$crate::listenable!(@ret $($ret)?), $($arg: &$ty),*) {}
            )*
        }

        impl $crate::Companion for dyn $name {
            const SCHEMA: &'static $crate::SubjectSchema = &$crate::SubjectSchema {
                name: concat!(module_path!(), "::", stringify!($name)),
                parent: Some(<dyn $parent as $crate::Companion>::SCHEMA),
                methods: &[$(stringify!($method)),*],
            };
        }

        const _: () = {
            $(
                assert!(
                    $crate::schema::derives(stringify!($method), stringify!($pre), stringify!($post)),
                    "observable hooks must be named `on_<method>` and `on_<method>_finished`"
                );
            )*
        };
    };
}
