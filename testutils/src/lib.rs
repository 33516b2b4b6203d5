//! Utilities used in tests in multiple crates within the workspace.

use std::{
    cell::RefCell,
    fmt::{Debug, Display},
    marker::PhantomData,
    rc::Rc,
};

use futures::channel::oneshot;
use googletest::{
    description::Description,
    matcher::{Matcher, MatcherBase, MatcherResult},
};

/// Creates a matcher against an `anyhow::Error` that downcasts to the given
/// type and matches the inner matcher against a reference to it.
pub fn anyhow_downcasts_to<E, M>(inner: M) -> AnyhowDowncastTo<E, M> {
    AnyhowDowncastTo::<E, M> {
        inner,
        phantom_e: Default::default(),
    }
}

pub struct AnyhowDowncastTo<E, M> {
    inner: M,
    phantom_e: PhantomData<E>,
}

impl<E, M> AnyhowDowncastTo<E, M> {
    fn type_name() -> &'static str {
        std::any::type_name::<E>()
    }
}

impl<E, M> MatcherBase for AnyhowDowncastTo<E, M> {}

impl<E, M> Matcher<&anyhow::Error> for AnyhowDowncastTo<E, M>
where
    E: Display + Debug + Send + Sync + 'static,
    M: for<'a> Matcher<&'a E>,
{
    fn matches(&self, actual: &anyhow::Error) -> MatcherResult {
        actual
            .downcast_ref::<E>()
            .map(|v| self.inner.matches(v))
            .unwrap_or(MatcherResult::NoMatch)
    }

    fn explain_match(&self, actual: &anyhow::Error) -> Description {
        match actual.downcast_ref::<E>() {
            Some(e) => Description::new()
                .text(format!(
                    "which is of the expected concrete error type {}",
                    Self::type_name()
                ))
                .text("with value")
                .nested(self.inner.explain_match(e)),
            None => Description::new().text(format!(
                "which is not the expected concrete error type {}",
                Self::type_name()
            )),
        }
    }

    fn describe(&self, matcher_result: MatcherResult) -> Description {
        match matcher_result {
            MatcherResult::Match => format!(
                "is of concrete error type {} with value which {}",
                Self::type_name(),
                self.inner.describe(MatcherResult::Match)
            )
            .into(),
            MatcherResult::NoMatch => format!(
                "is or is not a concrete error type {} with value which {}",
                Self::type_name(),
                self.inner.describe(MatcherResult::NoMatch)
            )
            .into(),
        }
    }
}

/// Opens a [Gated] future with a value.
pub struct Gate<T>(oneshot::Sender<T>);

impl<T> Gate<T> {
    /// Releases the waiting future. Does nothing if it was dropped.
    pub fn open(self, value: T) {
        let _ = self.0.send(value);
    }
}

/// Value that only becomes available once its [Gate] is opened.
pub struct Gated<T>(oneshot::Receiver<T>);

impl<T> Gated<T> {
    /// A gated value that is available immediately.
    pub fn ready(value: T) -> Self {
        let (gate, gated) = gate();
        gate.open(value);
        gated
    }

    /// Waits for the gate to be opened.
    ///
    /// Panics if the gate is dropped without being opened.
    pub async fn wait(self) -> T {
        self.0.await.expect("gate dropped without being opened")
    }
}

/// Creates a manually released future, for controlling the order in which concurrent
/// operations complete.
pub fn gate<T>() -> (Gate<T>, Gated<T>) {
    let (sender, receiver) = oneshot::channel();
    (Gate(sender), Gated(receiver))
}

/// Records calls made to a fake collaborator. Clones share the same record.
pub struct CallLog<C>(Rc<RefCell<Vec<C>>>);

impl<C> Default for CallLog<C> {
    fn default() -> Self {
        Self(Default::default())
    }
}

impl<C> Clone for CallLog<C> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<C: Clone> CallLog<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: C) {
        self.0.borrow_mut().push(call);
    }

    /// Calls recorded so far, in order.
    pub fn calls(&self) -> Vec<C> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}
