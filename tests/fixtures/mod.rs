#![allow(dead_code)]

use std::cell::Cell;
use std::ops::Deref;
use std::rc::Rc;

use metapatterns::{listenable, Companion, Listener, Listeners, Subject, Subscriptions};

listenable! {
    /// Listener for [`TestSubject`]
    pub dyn trait SubjectListener: Listener {
        fn myfunc(arg: i32) -> i32 => on_myfunc, on_myfunc_finished;
    }
}

/// `myfunc` is observable, `myfunc2` is not
pub struct TestSubject<L: ?Sized + SubjectListener + Companion = dyn SubjectListener> {
    pub myfunc_arg: Cell<Option<i32>>,
    pub myfunc2_arg: Cell<Option<i32>>,
    listeners: Listeners<L>,
}

impl<L: ?Sized + SubjectListener + Companion> TestSubject<L> {
    pub fn new() -> Self {
        Self::with_listeners(Vec::new())
    }

    pub fn with_listeners(listeners: impl IntoIterator<Item = Rc<L>>) -> Self {
        Self::with_collection(listeners.into_iter().collect())
    }

    pub fn with_collection(listeners: Listeners<L>) -> Self {
        Self {
            myfunc_arg: Cell::new(None),
            myfunc2_arg: Cell::new(None),
            listeners,
        }
    }

    pub fn myfunc(&self, arg: i32) -> i32 {
        self.listeners.call(
            |l| l.on_myfunc(&arg),
            || {
                self.myfunc_arg.set(Some(arg));
                arg * 2
            },
            |l, result| l.on_myfunc_finished(result, &arg),
        )
    }

    pub fn myfunc2(&self, arg: i32) -> i32 {
        self.myfunc2_arg.set(Some(arg));
        arg * 4
    }
}

impl<L: ?Sized + SubjectListener + Companion> Subject for TestSubject<L> {
    type Observer = L;

    fn listeners(&self) -> &Listeners<L> {
        &self.listeners
    }
}

pub fn subject() -> TestSubject {
    TestSubject::new()
}

#[derive(Default)]
pub struct MyListener {
    pub myfunc_calls: Cell<usize>,
    pub myfunc_arg: Cell<Option<i32>>,
    pub myfunc_res: Cell<Option<i32>>,
    subscriptions: Subscriptions,
}

impl MyListener {
    pub fn myfunc_called(&self) -> bool {
        self.myfunc_calls.get() > 0
    }
}

impl Listener for MyListener {
    fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }
}

impl SubjectListener for MyListener {
    fn on_myfunc(&self, arg: &i32) {
        self.myfunc_calls.set(self.myfunc_calls.get() + 1);
        self.myfunc_arg.set(Some(*arg));
    }

    fn on_myfunc_finished(&self, result: &i32, _arg: &i32) {
        self.myfunc_res.set(Some(*result));
    }
}

pub fn subject_listener() -> Rc<MyListener> {
    Rc::new(MyListener::default())
}

listenable! {
    /// Listener for [`SubSubject`], which also hears about `myfunc`
    pub dyn trait SubSubjectListener: SubjectListener {
        fn myfunc3(arg: i32) -> i32 => on_myfunc3, on_myfunc3_finished;
    }
}

pub struct SubSubject {
    base: TestSubject<dyn SubSubjectListener>,
    pub myfunc3_arg: Cell<Option<i32>>,
}

impl SubSubject {
    pub fn new() -> Self {
        Self {
            base: TestSubject::new(),
            myfunc3_arg: Cell::new(None),
        }
    }

    pub fn myfunc3(&self, arg: i32) -> i32 {
        self.listeners().call(
            |l| l.on_myfunc3(&arg),
            || {
                self.myfunc3_arg.set(Some(arg));
                arg * 10
            },
            |l, result| l.on_myfunc3_finished(result, &arg),
        )
    }
}

impl Deref for SubSubject {
    type Target = TestSubject<dyn SubSubjectListener>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl Subject for SubSubject {
    type Observer = dyn SubSubjectListener;

    fn listeners(&self) -> &Listeners<dyn SubSubjectListener> {
        self.base.listeners()
    }
}

#[derive(Default)]
pub struct SubSubjectRecorder {
    pub myfunc_arg: Cell<Option<i32>>,
    pub myfunc3_arg: Cell<Option<i32>>,
    pub myfunc3_res: Cell<Option<i32>>,
    subscriptions: Subscriptions,
}

impl Listener for SubSubjectRecorder {
    fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }
}

impl SubjectListener for SubSubjectRecorder {
    fn on_myfunc(&self, arg: &i32) {
        self.myfunc_arg.set(Some(*arg));
    }
}

impl SubSubjectListener for SubSubjectRecorder {
    fn on_myfunc3(&self, arg: &i32) {
        self.myfunc3_arg.set(Some(*arg));
    }

    fn on_myfunc3_finished(&self, result: &i32, arg: &i32) {
        assert_eq!(self.myfunc3_arg.get(), Some(*arg));
        self.myfunc3_res.set(Some(*result));
    }
}

listenable! {
    /// A subject type without observable methods
    pub trait QuietListener: Listener {}
}

listenable! {
    /// Unrelated to [`SubjectListener`] but with a same-named method
    pub dyn trait EchoListener: Listener {
        fn myfunc() => on_myfunc, on_myfunc_finished;
    }
}

pub struct Echo {
    listeners: Listeners<dyn EchoListener>,
}

impl Echo {
    pub fn new() -> Self {
        Self {
            listeners: Listeners::new(),
        }
    }

    pub fn myfunc(&self) {
        self.listeners
            .call(|l| l.on_myfunc(), || (), |l, result| l.on_myfunc_finished(result))
    }
}

impl Subject for Echo {
    type Observer = dyn EchoListener;

    fn listeners(&self) -> &Listeners<dyn EchoListener> {
        &self.listeners
    }
}
