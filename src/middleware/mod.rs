//! [Middleware] used to modify the behaviour of a [Store] during a
//! [Store::dispatch()]. This module also contains a simple logging
//! middleware implementation which can be used as a utility in an
//! application.

#[cfg(feature = "simple_logger")]
pub mod simple_logger;

use crate::Store;

/// Executes subsequent middleware and then runs the [Reducer](crate::Reducer).
pub type ReduceFn<State, Action> = fn(&Store<State, Action>, Option<&Action>);

/// Executes subsequent middleware and then notifies the listeners.
pub type NotifyFn<State, Action> = fn(&Store<State, Action>);

/// `Middleware` used to modify the behaviour of a [Store] during a
/// [Store::dispatch()].
pub trait Middleware<State, Action> {
    /// This method is invoked by the [Store] during a
    /// [Store::dispatch()] just before the `Action` is sent to the
    /// [Reducer](crate::Reducer). It is necessary to call the
    /// provided `reduce` function, which executes subsequent
    /// middleware and runs the [Reducer](crate::Reducer).
    ///
    /// This method allows replacing the action in question, or
    /// removing it by passing `None`, which prevents the
    /// [Reducer](crate::Reducer) from seeing the action at all.
    fn on_reduce(
        &self,
        store: &Store<State, Action>,
        action: Option<&Action>,
        reduce: ReduceFn<State, Action>,
    ) {
        reduce(store, action)
    }

    /// This method is invoked by the [Store] during a
    /// [Store::dispatch()] after the [Reducer](crate::Reducer) has
    /// produced the next state, just before the listeners are
    /// notified of it. Call the provided `notify` function to
    /// execute subsequent middleware and then notify the listeners.
    fn on_notify(&self, store: &Store<State, Action>, notify: NotifyFn<State, Action>) {
        notify(store)
    }
}
