use std::rc::Rc;

/// Using the [reduce()](Reducer::reduce()) method, implementors of
/// this trait take an `Action` submitted to a store via
/// [Store::dispatch()](crate::Store::dispatch()) and produce the next
/// `State` for the store.
///
/// Returning the `prev_state` unchanged (or an equal state) is
/// perfectly valid, the store still notifies its listeners. Whether
/// such a no-op change re-renders anything is up to the connectors
/// listening (see [ConnectorConfig::distinct()](crate::ConnectorConfig::distinct())).
pub trait Reducer<State, Action> {
    /// Take an `Action` submitted to a store via
    /// [Store::dispatch()](crate::Store::dispatch()) and produce a new
    /// `State` from `prev_state`. The previous state is never mutated.
    fn reduce(&self, prev_state: &Rc<State>, action: &Action) -> Rc<State>;
}

impl<State, Action, F> Reducer<State, Action> for F
where
    F: Fn(&Rc<State>, &Action) -> Rc<State>,
{
    fn reduce(&self, prev_state: &Rc<State>, action: &Action) -> Rc<State> {
        (self)(prev_state, action)
    }
}

/// A [Reducer] composed of multiple reducers, each one receiving the
/// state produced by the one before it.
pub struct CompositeReducer<State, Action> {
    reducers: Vec<Box<dyn Reducer<State, Action>>>,
}

impl<State, Action> CompositeReducer<State, Action> {
    /// Create a new [CompositeReducer].
    pub fn new(reducers: Vec<Box<dyn Reducer<State, Action>>>) -> Self {
        CompositeReducer { reducers }
    }
}

impl<State, Action> Reducer<State, Action> for CompositeReducer<State, Action> {
    fn reduce(&self, prev_state: &Rc<State>, action: &Action) -> Rc<State> {
        self.reducers
            .iter()
            .fold(prev_state.clone(), |state, reducer| {
                reducer.reduce(&state, action)
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::{CompositeReducer, Reducer};
    use std::rc::Rc;

    #[derive(Default)]
    struct TestState {
        applied: Vec<&'static str>,
    }

    struct TestAction;

    struct Reducer1;

    impl Reducer<TestState, TestAction> for Reducer1 {
        fn reduce(&self, prev_state: &Rc<TestState>, _action: &TestAction) -> Rc<TestState> {
            let mut applied = prev_state.applied.clone();
            applied.push("reducer1");
            Rc::new(TestState { applied })
        }
    }

    fn reducer2(prev_state: &Rc<TestState>, _action: &TestAction) -> Rc<TestState> {
        let mut applied = prev_state.applied.clone();
        applied.push("reducer2");
        Rc::new(TestState { applied })
    }

    #[test]
    fn composite_reducer() {
        let reducer: CompositeReducer<TestState, TestAction> =
            CompositeReducer::new(vec![Box::new(Reducer1), Box::new(reducer2)]);

        let state = reducer.reduce(&Rc::new(TestState::default()), &TestAction);
        assert_eq!(state.applied, vec!["reducer1", "reducer2"]);
    }

    #[test]
    fn empty_composite_reducer_keeps_state() {
        let reducer: CompositeReducer<TestState, TestAction> = CompositeReducer::new(Vec::new());
        let prev = Rc::new(TestState::default());

        let state = reducer.reduce(&prev, &TestAction);
        assert!(Rc::ptr_eq(&prev, &state));
    }
}
