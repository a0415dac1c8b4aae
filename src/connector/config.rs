use crate::{error::BoxError, StoreRef};
use std::{error::Error, rc::Rc};

pub(crate) type Converter<State, Action, ViewModel> =
    Rc<dyn Fn(&StoreRef<State, Action>) -> Result<ViewModel, BoxError>>;
pub(crate) type StoreHook<State, Action> = Rc<dyn Fn(&StoreRef<State, Action>)>;
pub(crate) type ChangeHook<ViewModel> = Rc<dyn Fn(Option<&ViewModel>, &ViewModel)>;

/// A view model which can be "absent", and so skipped by connectors
/// configured with `rebuild_on_null(false)`.
pub trait Nullable {
    fn is_null(&self) -> bool;
}

impl<T> Nullable for Option<T> {
    fn is_null(&self) -> bool {
        self.is_none()
    }
}

/// Everything a connector needs to know besides where it lives in the
/// tree and what it renders: how to derive its view model from the
/// store, when to skip a rebuild, and which lifecycle callbacks to
/// run.
///
/// ```
/// use store_connector::{ConnectorConfig, StoreRef};
///
/// let config = ConnectorConfig::new(|store: &StoreRef<i32, i32>| *store.state() * 2)
///     .distinct(true)
///     .ignore_change(|state: &i32| *state < 0)
///     .on_will_change(|previous: Option<&i32>, next: &i32| {
///         println!("{:?} -> {}", previous, next);
///     });
/// assert!(config.is_distinct());
/// ```
pub struct ConnectorConfig<State, Action, ViewModel> {
    pub(crate) converter: Converter<State, Action, ViewModel>,
    pub(crate) distinct: Option<fn(&ViewModel, &ViewModel) -> bool>,
    pub(crate) ignore_change: Option<Rc<dyn Fn(&State) -> bool>>,
    pub(crate) rebuild_on_change: bool,
    pub(crate) is_null: Option<fn(&ViewModel) -> bool>,
    pub(crate) on_init: Option<StoreHook<State, Action>>,
    pub(crate) on_dispose: Option<StoreHook<State, Action>>,
    pub(crate) on_will_change: Option<ChangeHook<ViewModel>>,
    pub(crate) on_did_change: Option<ChangeHook<ViewModel>>,
    pub(crate) on_initial_build: Option<Rc<dyn Fn(&ViewModel)>>,
}

impl<State, Action, ViewModel> Clone for ConnectorConfig<State, Action, ViewModel> {
    fn clone(&self) -> Self {
        Self {
            converter: self.converter.clone(),
            distinct: self.distinct,
            ignore_change: self.ignore_change.clone(),
            rebuild_on_change: self.rebuild_on_change,
            is_null: self.is_null,
            on_init: self.on_init.clone(),
            on_dispose: self.on_dispose.clone(),
            on_will_change: self.on_will_change.clone(),
            on_did_change: self.on_did_change.clone(),
            on_initial_build: self.on_initial_build.clone(),
        }
    }
}

impl<State, Action, ViewModel> ConnectorConfig<State, Action, ViewModel>
where
    State: 'static,
    Action: 'static,
    ViewModel: 'static,
{
    /// Configuration for a connector deriving its view model with
    /// `converter`. The converter should be pure: skipping rebuilds
    /// relies on it giving the same answer for the same state.
    pub fn new<F>(converter: F) -> Self
    where
        F: Fn(&StoreRef<State, Action>) -> ViewModel + 'static,
    {
        Self::from_converter(Rc::new(move |store: &StoreRef<State, Action>| {
            Ok(converter(store))
        }))
    }

    /// Configuration for a connector deriving its view model with a
    /// converter which may fail. A failure is not retried: it is
    /// raised by the next render, and stays there until the store
    /// changes again.
    pub fn try_new<F, E>(converter: F) -> Self
    where
        F: Fn(&StoreRef<State, Action>) -> Result<ViewModel, E> + 'static,
        E: Into<Box<dyn Error>>,
    {
        Self::from_converter(Rc::new(move |store: &StoreRef<State, Action>| {
            converter(store).map_err(Into::into)
        }))
    }

    fn from_converter(converter: Converter<State, Action, ViewModel>) -> Self {
        Self {
            converter,
            distinct: None,
            ignore_change: None,
            rebuild_on_change: true,
            is_null: None,
            on_init: None,
            on_dispose: None,
            on_will_change: None,
            on_did_change: None,
            on_initial_build: None,
        }
    }

    /// Skip derivation and rebuild entirely for states where
    /// `predicate` returns `true`.
    pub fn ignore_change<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&State) -> bool + 'static,
    {
        self.ignore_change = Some(Rc::new(predicate));
        self
    }

    /// When `false`, the view model is derived once and the connector
    /// never rebuilds because of a store change. The store can still
    /// be dispatched to. Defaults to `true`.
    pub fn rebuild_on_change(mut self, rebuild_on_change: bool) -> Self {
        self.rebuild_on_change = rebuild_on_change;
        self
    }

    /// Run once, before the first view model is derived.
    pub fn on_init<F>(mut self, on_init: F) -> Self
    where
        F: Fn(&StoreRef<State, Action>) + 'static,
    {
        self.on_init = Some(Rc::new(on_init));
        self
    }

    /// Run once, when the connector is unmounted.
    pub fn on_dispose<F>(mut self, on_dispose: F) -> Self
    where
        F: Fn(&StoreRef<State, Action>) + 'static,
    {
        self.on_dispose = Some(Rc::new(on_dispose));
        self
    }

    /// Run with the previous and the next view model just before an
    /// accepted change is rendered. The previous view model is `None`
    /// when the connector was showing a derivation error.
    pub fn on_will_change<F>(mut self, on_will_change: F) -> Self
    where
        F: Fn(Option<&ViewModel>, &ViewModel) + 'static,
    {
        self.on_will_change = Some(Rc::new(on_will_change));
        self
    }

    /// Run with the previous and the next view model once the render
    /// of an accepted change has been committed.
    pub fn on_did_change<F>(mut self, on_did_change: F) -> Self
    where
        F: Fn(Option<&ViewModel>, &ViewModel) + 'static,
    {
        self.on_did_change = Some(Rc::new(on_did_change));
        self
    }

    /// Run once, after the first render has been committed, with the
    /// view model it rendered.
    pub fn on_initial_build<F>(mut self, on_initial_build: F) -> Self
    where
        F: Fn(&ViewModel) + 'static,
    {
        self.on_initial_build = Some(Rc::new(on_initial_build));
        self
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct.is_some()
    }

    pub fn rebuilds_on_change(&self) -> bool {
        self.rebuild_on_change
    }

    pub fn rebuilds_on_null(&self) -> bool {
        self.is_null.is_none()
    }
}

impl<State, Action, ViewModel: PartialEq> ConnectorConfig<State, Action, ViewModel> {
    /// When `true`, a change whose view model equals the last one
    /// rendered is skipped. Defaults to `false`: every store change
    /// rebuilds, even one which leaves the state untouched.
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = if distinct {
            Some(<ViewModel as PartialEq>::eq)
        } else {
            None
        };
        self
    }
}

impl<State, Action, ViewModel: Nullable> ConnectorConfig<State, Action, ViewModel> {
    /// When `false`, a change whose view model is null is skipped.
    /// Defaults to `true`.
    pub fn rebuild_on_null(mut self, rebuild_on_null: bool) -> Self {
        self.is_null = if rebuild_on_null {
            None
        } else {
            Some(<ViewModel as Nullable>::is_null)
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectorConfig;
    use crate::StoreRef;

    type CounterStore = StoreRef<i32, i32>;

    #[test]
    fn defaults_rebuild_on_everything() {
        let config: ConnectorConfig<i32, i32, Option<i32>> =
            ConnectorConfig::new(|store: &CounterStore| Some(*store.state()));

        assert!(!config.is_distinct());
        assert!(config.rebuilds_on_change());
        assert!(config.rebuilds_on_null());
    }

    #[test]
    fn setters_are_reflected() {
        let config: ConnectorConfig<i32, i32, Option<i32>> =
            ConnectorConfig::new(|store: &CounterStore| Some(*store.state()))
                .distinct(true)
                .rebuild_on_change(false)
                .rebuild_on_null(false);

        assert!(config.is_distinct());
        assert!(!config.rebuilds_on_change());
        assert!(!config.rebuilds_on_null());

        let config = config.distinct(false).rebuild_on_null(true);
        assert!(!config.is_distinct());
        assert!(config.rebuilds_on_null());
    }
}
