//! Makes a single [Store](crate::Store) available to a whole subtree
//! without passing it down by hand.

use crate::{context::Dependent, error::ProviderNotFoundError, BuildContext, StoreRef};
use std::{
    any::type_name,
    cell::RefCell,
    fmt::{self, Debug},
    rc::{Rc, Weak},
};

/// What a [StoreProvider] places into the tree: the store currently
/// bound, plus the nodes which asked to hear about it changing.
struct ProviderBinding<State, Action> {
    store: RefCell<StoreRef<State, Action>>,
    dependents: RefCell<Vec<Weak<dyn Dependent>>>,
}

impl<State, Action> ProviderBinding<State, Action> {
    fn store(&self) -> StoreRef<State, Action> {
        self.store.borrow().clone()
    }

    fn add_dependent(&self, dependent: Weak<dyn Dependent>) {
        let mut dependents = self.dependents.borrow_mut();
        if !dependents.iter().any(|existing| existing.ptr_eq(&dependent)) {
            dependents.push(dependent);
        }
    }

    fn notify_dependents(&self) {
        let dependents: Vec<Weak<dyn Dependent>> = self.dependents.borrow().clone();
        for dependent in &dependents {
            if let Some(dependent) = dependent.upgrade() {
                dependent.dependencies_changed();
            }
        }

        self.dependents
            .borrow_mut()
            .retain(|dependent| dependent.strong_count() > 0);
    }
}

/// Binds a [StoreRef] to the subtree below [StoreProvider::context()].
///
/// Descendants find it again with [StoreProvider::of()] (a one-off
/// read) or [StoreProvider::watch()] (a read which also registers the
/// caller to be told when the provider is rebuilt with a different
/// store). Providers for different `State`/`Action` pairs nest
/// freely; a provider for the same pair shadows the outer one.
pub struct StoreProvider<State, Action> {
    binding: Rc<ProviderBinding<State, Action>>,
    context: BuildContext,
}

impl<State, Action> StoreProvider<State, Action>
where
    State: 'static,
    Action: 'static,
{
    /// Mount a provider for `store` below `parent`.
    pub fn new(parent: &BuildContext, store: StoreRef<State, Action>) -> Self {
        let binding = Rc::new(ProviderBinding {
            store: RefCell::new(store),
            dependents: RefCell::new(Vec::new()),
        });
        let context = parent.provide(binding.clone());

        Self { binding, context }
    }

    /// The context handed to everything in this provider's subtree.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// The store currently bound by this provider.
    pub fn store(&self) -> StoreRef<State, Action> {
        self.binding.store()
    }

    /// Rebuild this provider with `store`.
    ///
    /// Dependents are notified only if `store` is a different store
    /// than the one currently bound, compared by reference. Returns
    /// whether the binding changed.
    pub fn update(&self, store: StoreRef<State, Action>) -> bool {
        if self.binding.store.borrow().ptr_eq(&store) {
            return false;
        }

        log::trace!("StoreProvider<{}> rebound to {:?}", type_name::<State>(), store);
        *self.binding.store.borrow_mut() = store;
        self.binding.notify_dependents();
        true
    }

    /// Number of live nodes watching this provider.
    pub fn dependent_count(&self) -> usize {
        self.binding
            .dependents
            .borrow()
            .iter()
            .filter(|dependent| dependent.strong_count() > 0)
            .count()
    }

    /// Unmount this provider. Dependents are forgotten; the store
    /// itself is left alone.
    pub fn unmount(self) {
        self.binding.dependents.borrow_mut().clear();
    }

    /// Look up the nearest store of this type without registering
    /// for changes. Meant for one-time reads, e.g. during
    /// initialisation.
    pub fn of(context: &BuildContext) -> Result<StoreRef<State, Action>, ProviderNotFoundError> {
        Self::binding(context).map(|binding| binding.store())
    }

    /// Look up the nearest store of this type, and register
    /// `dependent` to be told when the provider is rebuilt with a
    /// different store.
    pub fn watch(
        context: &BuildContext,
        dependent: Weak<dyn Dependent>,
    ) -> Result<StoreRef<State, Action>, ProviderNotFoundError> {
        let binding = Self::binding(context)?;
        binding.add_dependent(dependent);
        Ok(binding.store())
    }

    fn binding(
        context: &BuildContext,
    ) -> Result<Rc<ProviderBinding<State, Action>>, ProviderNotFoundError> {
        context
            .lookup::<ProviderBinding<State, Action>>()
            .ok_or(ProviderNotFoundError {
                type_name: type_name::<(State, Action)>(),
            })
    }
}

impl<State, Action> Debug for StoreProvider<State, Action> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StoreProvider{{store: {:?}, dependents: {}}}",
            self.binding.store.borrow(),
            self.binding.dependents.borrow().len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::StoreProvider;
    use crate::{context::Dependent, BuildContext, Scheduler, StoreRef};
    use std::{
        cell::Cell,
        rc::{Rc, Weak},
    };

    type CounterStore = StoreRef<i32, i32>;

    fn counter_store(initial: i32) -> CounterStore {
        StoreRef::new(|state: &Rc<i32>, action: &i32| Rc::new(**state + *action), initial)
    }

    #[derive(Default)]
    struct CountingDependent {
        notified: Cell<usize>,
    }

    impl Dependent for CountingDependent {
        fn dependencies_changed(&self) {
            self.notified.set(self.notified.get() + 1);
        }
    }

    fn as_dependent(dependent: &Rc<CountingDependent>) -> Weak<dyn Dependent> {
        let dependent: Rc<dyn Dependent> = dependent.clone();
        Rc::downgrade(&dependent)
    }

    #[test]
    fn descendants_find_the_store() {
        let root = BuildContext::root(&Scheduler::new());
        let store = counter_store(0);
        let provider = StoreProvider::new(&root, store.clone());

        let child = provider.context().provide(Rc::new("unrelated"));
        assert_eq!(StoreProvider::<i32, i32>::of(&child), Ok(store));
    }

    #[test]
    fn missing_provider_is_an_error() {
        let root = BuildContext::root(&Scheduler::new());
        let provider = StoreProvider::new(&root, counter_store(0));

        let error = StoreProvider::<i32, i32>::of(&root).unwrap_err();
        assert_eq!(error.type_name, std::any::type_name::<(i32, i32)>());

        // Same state type, different action type.
        assert!(StoreProvider::<i32, u8>::of(provider.context()).is_err());
    }

    #[test]
    fn inner_provider_shadows_outer() {
        let root = BuildContext::root(&Scheduler::new());
        let outer_store = counter_store(1);
        let inner_store = counter_store(2);
        let outer = StoreProvider::new(&root, outer_store.clone());
        let inner = StoreProvider::new(outer.context(), inner_store.clone());

        assert_eq!(StoreProvider::<i32, i32>::of(inner.context()), Ok(inner_store));
        assert_eq!(StoreProvider::<i32, i32>::of(outer.context()), Ok(outer_store));
    }

    #[test]
    fn watchers_hear_about_different_stores_only() {
        let root = BuildContext::root(&Scheduler::new());
        let store = counter_store(0);
        let provider = StoreProvider::new(&root, store.clone());
        let dependent = Rc::new(CountingDependent::default());
        let passive = Rc::new(CountingDependent::default());

        StoreProvider::<i32, i32>::watch(provider.context(), as_dependent(&dependent)).unwrap();
        StoreProvider::<i32, i32>::watch(provider.context(), as_dependent(&dependent)).unwrap();
        StoreProvider::<i32, i32>::of(provider.context()).unwrap();
        assert_eq!(provider.dependent_count(), 1);

        assert!(!provider.update(store.clone()));
        assert_eq!(dependent.notified.get(), 0);

        // Structurally identical, but a different store.
        let twin = counter_store(0);
        assert!(provider.update(twin.clone()));
        assert_eq!(dependent.notified.get(), 1);
        assert_eq!(passive.notified.get(), 0);
        assert_eq!(StoreProvider::<i32, i32>::of(provider.context()), Ok(twin));
    }

    #[test]
    fn dropped_watchers_are_pruned() {
        let root = BuildContext::root(&Scheduler::new());
        let provider = StoreProvider::new(&root, counter_store(0));
        let dependent = Rc::new(CountingDependent::default());

        StoreProvider::<i32, i32>::watch(provider.context(), as_dependent(&dependent)).unwrap();
        drop(dependent);
        assert_eq!(provider.dependent_count(), 0);

        provider.update(counter_store(5));
        provider.unmount();
    }
}
