use std::cell::RefCell;
use std::rc::Rc;

enum State<S, T> {
    Pending(S),
    Ready(Rc<T>),
}

/// A value that starts as a description and is resolved at most once.
///
/// Resolution failures leave the value pending, so a later call may try again.
pub(crate) struct Lazy<S, T> {
    state: RefCell<State<S, T>>,
}

impl<S, T> Lazy<S, T> {
    pub fn pending(spec: S) -> Self {
        Lazy {
            state: RefCell::new(State::Pending(spec)),
        }
    }

    pub fn ready(value: T) -> Self {
        Lazy {
            state: RefCell::new(State::Ready(Rc::new(value))),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.borrow(), State::Ready(_))
    }

    /// Returns the resolved value, running `resolve` against the description on first use.
    pub fn get_or_try_resolve<E>(&self, resolve: impl FnOnce(&S) -> Result<T, E>) -> Result<Rc<T>, E> {
        let value = match &*self.state.borrow() {
            State::Ready(value) => return Ok(Rc::clone(value)),
            State::Pending(spec) => Rc::new(resolve(spec)?),
        };
        *self.state.borrow_mut() = State::Ready(Rc::clone(&value));
        Ok(value)
    }
}

impl<S: Clone, T> Clone for Lazy<S, T> {
    /// A resolved value is shared with the clone, a pending one is resolved separately.
    fn clone(&self) -> Self {
        let state = match &*self.state.borrow() {
            State::Pending(spec) => State::Pending(spec.clone()),
            State::Ready(value) => State::Ready(Rc::clone(value)),
        };
        Lazy {
            state: RefCell::new(state),
        }
    }
}

impl<S: std::fmt::Debug, T> std::fmt::Debug for Lazy<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &*self.state.borrow() {
            State::Pending(spec) => f.debug_tuple("Pending").field(spec).finish(),
            State::Ready(_) => f.write_str("Ready"),
        }
    }
}
