//! Connectors: nodes which derive a view model from the nearest
//! provided [Store](crate::Store), render it, and rebuild when the
//! store changes in a way that matters to them.

mod config;
mod controller;
mod pipe;

pub use config::{ConnectorConfig, Nullable};
pub use controller::Phase;

pub(crate) use controller::LifecycleController;

use crate::{
    context::Dependent,
    error::ConnectorError,
    provider::StoreProvider,
    scheduler::Rebuild,
    BuildContext, StoreRef,
};
use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

type Builder<State, Action, ViewModel, Output> =
    Box<dyn Fn(&StoreRef<State, Action>, &ViewModel) -> Output>;

/// Renders `Output` from a view model derived from the nearest
/// [StoreProvider]'s store.
///
/// The first view model is derived synchronously at
/// [mount()](StoreConnector::mount()), so the first render never
/// waits for the store to change. After that the connector rebuilds
/// once per change accepted by its [ConnectorConfig], and if the
/// provider is rebuilt with a different store the connector moves its
/// subscription over to it.
///
/// A converter failure is not rendered around: the next render
/// returns the [ConnectorError] in place of output.
pub struct StoreConnector<State, Action, ViewModel, Output> {
    weak_self: Weak<Self>,
    context: BuildContext,
    controller: Rc<LifecycleController<State, Action, ViewModel>>,
    builder: Builder<State, Action, ViewModel, Output>,
    output: RefCell<Option<Result<Output, ConnectorError>>>,
    builds: Cell<usize>,
}

impl<State, Action, ViewModel, Output> StoreConnector<State, Action, ViewModel, Output>
where
    State: 'static,
    Action: 'static,
    ViewModel: Clone + 'static,
    Output: 'static,
{
    /// Mount a connector at `context` and schedule its first build.
    ///
    /// Fails straight away if no provider for `StoreRef<State,
    /// Action>` is visible from `context`.
    pub fn mount<B>(
        context: &BuildContext,
        config: ConnectorConfig<State, Action, ViewModel>,
        builder: B,
    ) -> Result<Rc<Self>, ConnectorError>
    where
        B: Fn(&StoreRef<State, Action>, &ViewModel) -> Output + 'static,
    {
        let store = StoreProvider::<State, Action>::of(context)?;
        let scheduler = context.scheduler().clone();

        let connector = Rc::new_cyclic(|weak_self: &Weak<Self>| {
            let node: Weak<dyn Rebuild> = weak_self.clone();
            let invalidate_scheduler = scheduler.clone();
            let invalidate = Box::new(move || invalidate_scheduler.mark_needs_build(node.clone()));

            Self {
                weak_self: weak_self.clone(),
                context: context.clone(),
                controller: LifecycleController::new(store, config, scheduler.clone(), invalidate),
                builder: Box::new(builder),
                output: RefCell::new(None),
                builds: Cell::new(0),
            }
        });

        let dependent: Weak<dyn Dependent> = connector.weak_self.clone();
        StoreProvider::<State, Action>::watch(context, dependent)?;

        connector.controller.mount();
        connector.mark_needs_build();
        Ok(connector)
    }

    fn mark_needs_build(&self) {
        let node: Weak<dyn Rebuild> = self.weak_self.clone();
        self.context.scheduler().mark_needs_build(node);
    }

    /// Reconfigure this connector in place, like rebuilding it with
    /// new properties. The view model is re-derived with the new
    /// converter and the node rebuilt, but the subscription to the
    /// store is kept.
    pub fn update(&self, config: ConnectorConfig<State, Action, ViewModel>) {
        self.controller.reconfigure(config);
        self.mark_needs_build();
    }

    /// Unmount this connector: runs `on_dispose` and cancels the
    /// subscription. Later store changes and pending post-render
    /// callbacks no longer reach it.
    pub fn unmount(&self) {
        self.controller.unmount();
        self.output.borrow_mut().take();
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// The store this connector is currently subscribed to.
    pub fn store(&self) -> StoreRef<State, Action> {
        self.controller.store()
    }

    /// How many times this connector has been built.
    pub fn build_count(&self) -> usize {
        self.builds.get()
    }

    /// The result of the last committed build, if there has been one.
    pub fn output(&self) -> Option<Result<Output, ConnectorError>>
    where
        Output: Clone,
    {
        self.output.borrow().clone()
    }

    /// Borrow the output of the last committed build.
    pub fn with_output<R>(&self, f: impl FnOnce(Option<&Result<Output, ConnectorError>>) -> R) -> R {
        f(self.output.borrow().as_ref())
    }
}

impl<State, Action, ViewModel, Output> Rebuild for StoreConnector<State, Action, ViewModel, Output>
where
    State: 'static,
    Action: 'static,
    ViewModel: Clone + 'static,
    Output: 'static,
{
    fn rebuild(&self) {
        if self.controller.phase() != Phase::Mounted {
            return;
        }

        let store = self.controller.store();
        let output = self
            .controller
            .render()
            .map(|view_model| (self.builder)(&store, &view_model));

        *self.output.borrow_mut() = Some(output);
        self.builds.set(self.builds.get() + 1);
    }
}

impl<State, Action, ViewModel, Output> Dependent
    for StoreConnector<State, Action, ViewModel, Output>
where
    State: 'static,
    Action: 'static,
    ViewModel: Clone + 'static,
    Output: 'static,
{
    fn dependencies_changed(&self) {
        if let Ok(store) = StoreProvider::<State, Action>::of(&self.context) {
            if self.controller.rebind(store) {
                self.mark_needs_build();
            }
        }
    }
}

/// A [StoreConnector] without a projection: its view model is the
/// store's state itself, and the builder is handed the store.
///
/// [StoreBuilder::mount()] rebuilds on every store change. Start from
/// [StoreBuilder::config()] to add lifecycle callbacks, switch off
/// `rebuild_on_change`, or skip unchanged states with `distinct`.
pub struct StoreBuilder;

impl StoreBuilder {
    /// The identity configuration used by [StoreBuilder::mount()].
    pub fn config<State, Action>() -> ConnectorConfig<State, Action, Rc<State>>
    where
        State: 'static,
        Action: 'static,
    {
        ConnectorConfig::new(|store: &StoreRef<State, Action>| store.state())
    }

    pub fn mount<State, Action, Output, B>(
        context: &BuildContext,
        builder: B,
    ) -> Result<Rc<StoreConnector<State, Action, Rc<State>, Output>>, ConnectorError>
    where
        State: 'static,
        Action: 'static,
        Output: 'static,
        B: Fn(&StoreRef<State, Action>) -> Output + 'static,
    {
        Self::mount_with(context, Self::config(), builder)
    }

    pub fn mount_with<State, Action, Output, B>(
        context: &BuildContext,
        config: ConnectorConfig<State, Action, Rc<State>>,
        builder: B,
    ) -> Result<Rc<StoreConnector<State, Action, Rc<State>, Output>>, ConnectorError>
    where
        State: 'static,
        Action: 'static,
        Output: 'static,
        B: Fn(&StoreRef<State, Action>) -> Output + 'static,
    {
        StoreConnector::mount(
            context,
            config,
            move |store: &StoreRef<State, Action>, _: &Rc<State>| builder(store),
        )
    }
}
