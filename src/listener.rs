use std::rc::{Rc, Weak};

/// A trait to take a [Callback] or other custom callback type and
/// produce a [Listener], a weak reference to that callback.
pub trait AsListener<State> {
    /// Produce a [Listener], a weak reference to this callback.
    fn as_listener(&self) -> Listener<State>;
}

/// A weak reference to a callback function (usually [Callback]) which
/// is notified with the new `State` of a [Store](crate::Store) after
/// every dispatch.
pub struct Listener<State>(Weak<dyn Fn(Rc<State>)>);

impl<State> Clone for Listener<State> {
    fn clone(&self) -> Self {
        Listener(self.0.clone())
    }
}

impl<State> Listener<State> {
    /// Attempt to upgrade the weak reference in this listener to a
    /// [Callback], otherwise if unable to, returns `None`.
    pub fn as_callback(&self) -> Option<Callback<State>> {
        self.0.upgrade().map(Callback)
    }

    /// Returns `true` while the [Callback] this listener points to is
    /// still alive.
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl<State> AsListener<State> for Listener<State> {
    fn as_listener(&self) -> Listener<State> {
        Listener(self.0.clone())
    }
}

/// A wrapper for a callback which is notified of changes to
/// [Store](crate::Store) `State`.
///
/// The store only holds a [Listener] to this callback, so the
/// subscription lives exactly as long as the last clone of the
/// `Callback`. Dropping it is how a subscription gets cancelled.
pub struct Callback<State>(Rc<dyn Fn(Rc<State>)>);

impl<State> Clone for Callback<State> {
    fn clone(&self) -> Self {
        Callback(self.0.clone())
    }
}

impl<State> AsListener<State> for &Callback<State> {
    fn as_listener(&self) -> Listener<State> {
        Listener(Rc::downgrade(&self.0))
    }
}

impl<State> Callback<State> {
    pub fn new<C: Fn(Rc<State>) + 'static>(closure: C) -> Self {
        Callback(Rc::new(closure))
    }

    pub fn emit(&self, state: Rc<State>) {
        (self.0)(state)
    }
}

impl<C, State> From<C> for Callback<State>
where
    C: Fn(Rc<State>) + 'static,
{
    fn from(closure: C) -> Self {
        Callback(Rc::new(closure))
    }
}

#[cfg(feature = "yew")]
impl<State> From<yew::Callback<Rc<State>>> for Callback<State>
where
    State: 'static,
{
    fn from(yew_callback: yew::Callback<Rc<State>>) -> Self {
        Callback(Rc::new(move |state| {
            yew_callback.emit(state);
        }))
    }
}

#[cfg(feature = "yew")]
impl<State> From<yew::Callback<()>> for Callback<State>
where
    State: 'static,
{
    fn from(yew_callback: yew::Callback<()>) -> Self {
        Callback(Rc::new(move |_| {
            yew_callback.emit(());
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{AsListener, Callback};
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn listener_dies_with_callback() {
        let hits = Rc::new(Cell::new(0));
        let hits_copy = hits.clone();
        let callback: Callback<i32> = Callback::new(move |state: Rc<i32>| {
            hits_copy.set(hits_copy.get() + *state);
        });

        let listener = (&callback).as_listener();
        assert!(listener.is_alive());
        listener.as_callback().unwrap().emit(Rc::new(3));
        assert_eq!(3, hits.get());

        drop(callback);
        assert!(!listener.is_alive());
        assert!(listener.as_callback().is_none());
    }

    #[cfg(feature = "yew")]
    #[test]
    fn yew_callbacks_become_store_callbacks() {
        let seen = Rc::new(Cell::new(0));
        let seen_copy = seen.clone();
        let with_state: yew::Callback<Rc<i32>> =
            yew::Callback::from(move |state: Rc<i32>| seen_copy.set(*state));
        Callback::from(with_state).emit(Rc::new(4));
        assert_eq!(seen.get(), 4);

        let pings = Rc::new(Cell::new(0));
        let pings_copy = pings.clone();
        let without_state: yew::Callback<()> =
            yew::Callback::from(move |_| pings_copy.set(pings_copy.get() + 1));
        let callback: Callback<i32> = Callback::from(without_state);
        callback.emit(Rc::new(1));
        callback.emit(Rc::new(2));
        assert_eq!(pings.get(), 2);
    }
}
