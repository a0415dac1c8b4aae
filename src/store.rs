use crate::{middleware::Middleware, AsListener, Listener, Reducer};
use std::ops::Deref;
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt::{self, Debug},
    rc::Rc,
};

/// An action to modify some aspect of the [Store], to be stored in a
/// queue and executed at the start of a [Store::dispatch()] for a
/// given `Action`.
enum StoreModification<State, Action> {
    AddListener(Listener<State>),
    AddMiddleware(Rc<dyn Middleware<State, Action>>),
}

/// A wrapper for an [Rc] reference to a [Store].
///
/// This is the handle which gets bound to a
/// [StoreProvider](crate::provider::StoreProvider) and handed to
/// connectors. Two `StoreRef`s are equal only when they point at the
/// very same store: a structurally identical but distinct store is a
/// different store.
pub struct StoreRef<State, Action>(Rc<Store<State, Action>>);

impl<State, Action> StoreRef<State, Action> {
    pub fn new<R: Reducer<State, Action> + 'static>(reducer: R, initial_state: State) -> Self {
        Self(Rc::new(Store::new(reducer, initial_state)))
    }

    /// Returns `true` if both references point to the same [Store].
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<State, Action> Clone for StoreRef<State, Action> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<State, Action> Deref for StoreRef<State, Action> {
    type Target = Store<State, Action>;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl<State, Action> PartialEq for StoreRef<State, Action> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<State, Action> Debug for StoreRef<State, Action> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreRef(store @ {:p})", Rc::as_ptr(&self.0))
    }
}

/// This struct is designed to operate as a central source of truth
/// and global "immutable" state within your application.
///
/// The current state of this store ([Store::state()]) can only be
/// modified by dispatching an `Action` via [Store::dispatch()] to the
/// store. These actions are taken by a [Reducer] which you provided
/// to the store (at construction) and a new current state is
/// produced. The previous state is never mutated.
///
/// Listeners subscribe to changes with [Store::subscribe()]. Every
/// dispatched action notifies every listener exactly once, in
/// dispatch order, even when the reducer hands back an unchanged
/// state.
pub struct Store<State, Action> {
    /// This lock is used to prevent dispatch recursion.
    dispatch_lock: RefCell<()>,
    /// Queue of actions to be dispatched by [Store::dispatch()].
    dispatch_queue: RefCell<VecDeque<Action>>,
    /// Queue of [StoreModification]s to be executed by
    /// [Store::dispatch()] before the next `Action` is dispatched.
    modification_queue: RefCell<VecDeque<StoreModification<State, Action>>>,
    /// The [Reducer] for this store, which takes `Actions` and
    /// produces the next `State`.
    reducer: Box<dyn Reducer<State, Action>>,
    /// The current state of this store.
    state: RefCell<Rc<State>>,
    /// The listeners which are notified of changes to the state of
    /// this store.
    listeners: RefCell<Vec<Listener<State>>>,
    /// Middleware which modifies the functionality of this store.
    middleware: RefCell<Vec<Rc<dyn Middleware<State, Action>>>>,
    /// Used during recursive execution of [Middleware] to keep track
    /// of the middleware currently executing. It is an index into
    /// [Store::middleware].
    prev_middleware: Cell<i32>,
}

impl<State, Action> Store<State, Action> {
    /// Create a new [Store], which uses the specified `reducer` to
    /// handle `Action`s, starting from `initial_state`.
    pub fn new<R: Reducer<State, Action> + 'static>(reducer: R, initial_state: State) -> Self {
        Self {
            dispatch_lock: RefCell::new(()),
            dispatch_queue: RefCell::new(VecDeque::new()),
            modification_queue: RefCell::new(VecDeque::new()),
            reducer: Box::new(reducer),
            state: RefCell::new(Rc::new(initial_state)),
            listeners: RefCell::new(Vec::new()),
            middleware: RefCell::new(Vec::new()),
            prev_middleware: Cell::new(-1),
        }
    }

    /// Get the current `State` stored in this store.
    ///
    /// Modifications to this state need to be performed by
    /// dispatching an `Action` to the store using
    /// [dispatch()](Store::dispatch()).
    pub fn state(&self) -> Rc<State> {
        self.state.borrow().clone()
    }

    /// Dispatch an `Action` to the reducer on this `Store` without
    /// invoking middleware.
    fn dispatch_reducer(&self, action: &Action) {
        let next_state = self.reducer.reduce(&self.state(), action);
        *self.state.borrow_mut() = next_state;
    }

    /// Dispatch an `Action` to the reducer on this `Store`, invoking
    /// all middleware's [on_reduce()][Middleware::on_reduce()] first.
    fn middleware_reduce(&self, action: &Action) {
        self.prev_middleware.set(-1);
        self.middleware_reduce_next(Some(action));
    }

    /// A recursive function which executes each middleware for this
    /// store, and invokes the next middleware, until all middleware
    /// has been invoked, at which point the `Action` is sent to the
    /// reducer.
    fn middleware_reduce_next(&self, action: Option<&Action>) {
        let current_middleware = self.prev_middleware.get() + 1;
        self.prev_middleware.set(current_middleware);

        if current_middleware == self.middleware.borrow().len() as i32 {
            if let Some(action) = action {
                self.dispatch_reducer(action);
            }
            return;
        }

        let middleware = self.middleware.borrow()[current_middleware as usize].clone();
        middleware.on_reduce(self, action, Self::middleware_reduce_next);
    }

    /// Notify store listeners of the state produced as a result of an
    /// `Action` being dispatched, invoking all middleware's
    /// [on_notify()][Middleware::on_notify()] first.
    fn middleware_notify(&self) {
        self.prev_middleware.set(-1);
        self.middleware_notify_next();
    }

    /// A recursive function which executes each middleware for this
    /// store, and invokes the next middleware, until all middleware
    /// has been invoked, at which point the listeners are notified.
    fn middleware_notify_next(&self) {
        let current_middleware = self.prev_middleware.get() + 1;
        self.prev_middleware.set(current_middleware);

        if current_middleware == self.middleware.borrow().len() as i32 {
            self.notify_listeners();
            return;
        }

        let middleware = self.middleware.borrow()[current_middleware as usize].clone();
        middleware.on_notify(self, Self::middleware_notify_next);
    }

    /// Notify every live listener of the current state, then forget
    /// the listeners whose [Callback](crate::Callback) has been
    /// dropped.
    fn notify_listeners(&self) {
        // Listener code may read the store or subscribe, so it must
        // not run while the listener list is borrowed.
        let listeners: Vec<Listener<State>> = self.listeners.borrow().clone();

        for listener in &listeners {
            if let Some(callback) = listener.as_callback() {
                callback.emit(self.state());
            }
        }

        self.listeners
            .borrow_mut()
            .retain(|listener| listener.is_alive());
    }

    fn process_pending_modifications(&self) {
        loop {
            let modification = self.modification_queue.borrow_mut().pop_front();
            match modification {
                Some(StoreModification::AddListener(listener)) => {
                    self.listeners.borrow_mut().push(listener);
                }
                Some(StoreModification::AddMiddleware(middleware)) => {
                    self.middleware.borrow_mut().push(middleware);
                }
                None => break,
            }
        }
    }

    /// Dispatch an `Action` to be passed to the [Reducer] in order to
    /// produce the next `State` in this store, and then notify the
    /// store listeners.
    pub fn dispatch<A: Into<Action>>(&self, action: A) {
        self.dispatch_impl(action.into());
    }

    /// Concrete version of [Store::dispatch()], for code size
    /// reduction purposes, to avoid generating multiple versions of
    /// this function per action type that implements `Into<Action>`.
    fn dispatch_impl(&self, action: Action) {
        self.dispatch_queue.borrow_mut().push_back(action);

        // If the lock fails to acquire, then the dispatch is already
        // in progress. This prevents recursion, when a listener
        // callback also triggers another dispatch.
        if let Ok(_lock) = self.dispatch_lock.try_borrow_mut() {
            loop {
                let dispatch_action = self.dispatch_queue.borrow_mut().pop_front();

                match dispatch_action {
                    Some(action) => {
                        self.process_pending_modifications();

                        if self.middleware.borrow().is_empty() {
                            self.dispatch_reducer(&action);
                            self.notify_listeners();
                        } else {
                            self.middleware_reduce(&action);
                            self.middleware_notify();
                        }
                    }
                    None => {
                        break;
                    }
                }
            }
        }
    }

    /// Subscribe a [Listener] to changes in the store state. This is
    /// the store's change stream: the listener receives the new state
    /// after every [dispatch()](Store::dispatch()), in dispatch
    /// order.
    ///
    /// The listener is a weak reference; when the strong reference
    /// associated with it (usually [Callback](crate::Callback)) is
    /// dropped, the listener stops being notified immediately, and is
    /// removed from this store on the next notification.
    ///
    /// A listener added while a dispatch is in progress is notified
    /// starting with the next dispatched action.
    pub fn subscribe<L: AsListener<State>>(&self, listener: L) {
        self.modification_queue
            .borrow_mut()
            .push_back(StoreModification::AddListener(listener.as_listener()));
    }

    /// The number of listeners currently registered with this store,
    /// including those whose callback has been dropped since the last
    /// notification.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len() + self.modification_queue.borrow().len()
    }

    /// Add [Middleware] to modify the behaviour of this [Store]
    /// during a [dispatch()][Store::dispatch()].
    pub fn add_middleware<M: Middleware<State, Action> + 'static>(&self, middleware: M) {
        self.modification_queue
            .borrow_mut()
            .push_back(StoreModification::AddMiddleware(Rc::new(middleware)));
    }
}
