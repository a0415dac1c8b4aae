//! Logging [Middleware] which reports each dispatched action and the
//! state transition it caused through the [log] facade.

use crate::{
    middleware::{Middleware, NotifyFn, ReduceFn},
    Store,
};
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Trace,
    Debug,
    Warn,
    Info,
}

impl LogLevel {
    fn as_level(self) -> log::Level {
        match self {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
        }
    }

    pub fn log<S: AsRef<str>>(&self, message: S) {
        log::log!(target: "store_connector::store", self.as_level(), "{}", message.as_ref());
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

#[derive(Default)]
pub struct SimpleLoggerMiddleware {
    log_level: LogLevel,
}

impl SimpleLoggerMiddleware {
    pub fn new() -> Self {
        SimpleLoggerMiddleware::default()
    }

    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

impl<State, Action> Middleware<State, Action> for SimpleLoggerMiddleware
where
    State: Debug,
    Action: Debug,
{
    fn on_reduce(
        &self,
        store: &Store<State, Action>,
        action: Option<&Action>,
        reduce: ReduceFn<State, Action>,
    ) {
        match &action {
            Some(action) => {
                self.log_level
                    .log(format!("prev state: {:?}", store.state()));
                self.log_level.log(format!("action: {:?}", action));
            }
            None => {
                self.log_level.log("action: None");
            }
        }

        reduce(store, action);

        if action.is_some() {
            self.log_level
                .log(format!("next state: {:?}", store.state()));
        }
    }

    fn on_notify(&self, store: &Store<State, Action>, notify: NotifyFn<State, Action>) {
        self.log_level.log("notify listeners");
        notify(store)
    }
}

#[cfg(test)]
mod tests {
    use super::{LogLevel, SimpleLoggerMiddleware};
    use crate::{Callback, StoreRef};
    use std::{cell::RefCell, rc::Rc};

    #[test]
    fn logger_passes_actions_through() {
        let store: StoreRef<i32, i32> =
            StoreRef::new(|state: &Rc<i32>, action: &i32| Rc::new(**state + *action), 0);
        store.add_middleware(SimpleLoggerMiddleware::new().log_level(LogLevel::Trace));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_copy = seen.clone();
        let callback: Callback<i32> = Callback::new(move |state: Rc<i32>| {
            seen_copy.borrow_mut().push(*state);
        });
        store.subscribe(&callback);

        store.dispatch(2);
        store.dispatch(3);

        assert_eq!(*seen.borrow(), vec![2, 5]);
        assert_eq!(*store.state(), 5);
    }
}
