use super::ConnectorConfig;
use crate::{error::DerivationError, StoreRef};
use std::rc::Rc;

/// What a raw store change turns into once it makes it through the
/// pipe.
pub(crate) enum Emission<ViewModel> {
    Accept(ViewModel),
    Fail(Rc<DerivationError>),
}

/// Run the converter against `store`, trapping a failure.
pub(crate) fn derive<State, Action, ViewModel>(
    config: &ConnectorConfig<State, Action, ViewModel>,
    store: &StoreRef<State, Action>,
) -> Result<ViewModel, Rc<DerivationError>> {
    (config.converter)(store).map_err(|error| Rc::new(DerivationError::new(error)))
}

/// Turns the store's stream of states into the stream of view models
/// a connector renders.
///
/// Each state goes through the stages in order, and any stage may
/// drop it: the `ignore_change` predicate, derivation, the null check,
/// then the distinct check against the last *accepted* view model.
/// The baseline is only ever replaced by an accepted value (or
/// cleared by a failed derivation), so a run of dropped duplicates
/// never moves it.
pub(crate) struct ProjectionPipe<ViewModel> {
    last_accepted: Option<ViewModel>,
}

impl<ViewModel: Clone> ProjectionPipe<ViewModel> {
    /// A pipe whose distinct stage starts from `initial`, the value
    /// derived when the connector subscribed.
    pub fn seeded(initial: Option<ViewModel>) -> Self {
        Self {
            last_accepted: initial,
        }
    }

    pub fn reseed(&mut self, initial: Option<ViewModel>) {
        self.last_accepted = initial;
    }

    pub fn process<State, Action>(
        &mut self,
        config: &ConnectorConfig<State, Action, ViewModel>,
        store: &StoreRef<State, Action>,
        state: &State,
    ) -> Option<Emission<ViewModel>> {
        if let Some(ignore_change) = &config.ignore_change {
            if ignore_change(state) {
                return None;
            }
        }

        let view_model = match derive(config, store) {
            Ok(view_model) => view_model,
            Err(error) => {
                self.last_accepted = None;
                return Some(Emission::Fail(error));
            }
        };

        if let Some(is_null) = config.is_null {
            if is_null(&view_model) {
                return None;
            }
        }

        if let (Some(eq), Some(last_accepted)) = (config.distinct, &self.last_accepted) {
            if eq(last_accepted, &view_model) {
                return None;
            }
        }

        self.last_accepted = Some(view_model.clone());
        Some(Emission::Accept(view_model))
    }
}

#[cfg(test)]
mod tests {
    use super::{Emission, ProjectionPipe};
    use crate::{ConnectorConfig, StoreRef};
    use std::rc::Rc;

    type TextStore = StoreRef<String, String>;

    fn text_store(initial: &str) -> TextStore {
        StoreRef::new(
            |_: &Rc<String>, action: &String| Rc::new(action.clone()),
            initial.to_string(),
        )
    }

    fn identity() -> ConnectorConfig<String, String, String> {
        ConnectorConfig::new(|store: &TextStore| (*store.state()).clone())
    }

    /// Dispatch `action` and run the resulting state through `pipe`.
    fn push(
        pipe: &mut ProjectionPipe<String>,
        config: &ConnectorConfig<String, String, String>,
        store: &TextStore,
        action: &str,
    ) -> Option<String> {
        store.dispatch(action.to_string());
        match pipe.process(config, store, &store.state()) {
            Some(Emission::Accept(view_model)) => Some(view_model),
            Some(Emission::Fail(error)) => panic!("unexpected failure: {}", error),
            None => None,
        }
    }

    #[test]
    fn accepts_everything_by_default() {
        let store = text_store("I");
        let config = identity();
        let mut pipe = ProjectionPipe::seeded(Some("I".to_string()));

        assert_eq!(push(&mut pipe, &config, &store, "I"), Some("I".to_string()));
        assert_eq!(push(&mut pipe, &config, &store, "A"), Some("A".to_string()));
    }

    #[test]
    fn distinct_uses_the_seed() {
        let store = text_store("I");
        let config = identity().distinct(true);
        let mut pipe = ProjectionPipe::seeded(Some("I".to_string()));

        assert_eq!(push(&mut pipe, &config, &store, "I"), None);
        assert_eq!(push(&mut pipe, &config, &store, "A"), Some("A".to_string()));
    }

    #[test]
    fn dropped_duplicates_keep_the_baseline() {
        let store = text_store("I");
        let config = identity().distinct(true);
        let mut pipe = ProjectionPipe::seeded(Some("I".to_string()));

        for _ in 0..50 {
            assert_eq!(push(&mut pipe, &config, &store, "I"), None);
        }
        assert_eq!(push(&mut pipe, &config, &store, "B"), Some("B".to_string()));
        assert_eq!(push(&mut pipe, &config, &store, "B"), None);
        assert_eq!(push(&mut pipe, &config, &store, "I"), Some("I".to_string()));
    }

    #[test]
    fn ignored_states_are_never_derived() {
        let store = text_store("I");
        let derived = Rc::new(std::cell::Cell::new(0));
        let derived_copy = derived.clone();
        let config = ConnectorConfig::new(move |store: &TextStore| {
            derived_copy.set(derived_copy.get() + 1);
            (*store.state()).clone()
        })
        .ignore_change(|state: &String| state.starts_with('_'));
        let mut pipe = ProjectionPipe::seeded(None);

        assert_eq!(push(&mut pipe, &config, &store, "_hidden"), None);
        assert_eq!(derived.get(), 0);
        assert_eq!(push(&mut pipe, &config, &store, "shown"), Some("shown".to_string()));
        assert_eq!(derived.get(), 1);
    }

    #[test]
    fn null_view_models_can_be_skipped() {
        let store = text_store("I");
        let config: ConnectorConfig<String, String, Option<usize>> =
            ConnectorConfig::new(|store: &TextStore| store.state().find('x'))
                .rebuild_on_null(false);
        let mut pipe = ProjectionPipe::seeded(None);

        store.dispatch("abc".to_string());
        assert!(pipe.process(&config, &store, &store.state()).is_none());

        store.dispatch("abx".to_string());
        match pipe.process(&config, &store, &store.state()) {
            Some(Emission::Accept(view_model)) => assert_eq!(view_model, Some(2)),
            _ => panic!("expected an accepted view model"),
        }
    }

    #[test]
    fn failures_clear_the_baseline() {
        let store = text_store("1");
        let config: ConnectorConfig<String, String, i32> =
            ConnectorConfig::try_new(|store: &TextStore| store.state().parse::<i32>())
                .distinct(true);
        let mut pipe = ProjectionPipe::seeded(Some(1));

        store.dispatch("one".to_string());
        match pipe.process(&config, &store, &store.state()) {
            Some(Emission::Fail(error)) => {
                assert!(error.to_string().contains("invalid digit"));
            }
            _ => panic!("expected a failure"),
        }

        // Equal to the value before the failure, but it has to replace
        // the error, so it is not a duplicate.
        store.dispatch("1".to_string());
        assert!(matches!(
            pipe.process(&config, &store, &store.state()),
            Some(Emission::Accept(1))
        ));
    }
}
