use super::{
    pipe::{derive, Emission, ProjectionPipe},
    ConnectorConfig,
};
use crate::{
    error::{ConnectorError, DerivationError},
    Callback, Scheduler, StoreRef,
};
use std::{
    any::type_name,
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

/// Where a connector is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Mounted,
    Disposed,
}

/// The value a connector renders next.
enum Latest<ViewModel> {
    Value(ViewModel),
    Error(Rc<DerivationError>),
}

impl<ViewModel: Clone> Latest<ViewModel> {
    fn from_result(result: Result<ViewModel, Rc<DerivationError>>) -> Self {
        match result {
            Ok(view_model) => Latest::Value(view_model),
            Err(error) => Latest::Error(error),
        }
    }

    fn value(&self) -> Option<ViewModel> {
        match self {
            Latest::Value(view_model) => Some(view_model.clone()),
            Latest::Error(_) => None,
        }
    }

    fn to_result(&self) -> Result<ViewModel, ConnectorError> {
        match self {
            Latest::Value(view_model) => Ok(view_model.clone()),
            Latest::Error(error) => Err(ConnectorError::Derivation(error.clone())),
        }
    }
}

/// Owns the subscription of one mounted connector (or selector hook)
/// to its store, and sequences the lifecycle callbacks around the
/// renders of its owner.
///
/// The owner is asked to rebuild through `invalidate`. Callbacks that
/// must observe a committed render are queued on the [Scheduler], and
/// do nothing if the controller has been unmounted by the time they
/// run.
pub(crate) struct LifecycleController<State, Action, ViewModel> {
    weak_self: Weak<Self>,
    scheduler: Scheduler,
    invalidate: Box<dyn Fn()>,
    config: RefCell<ConnectorConfig<State, Action, ViewModel>>,
    store: RefCell<StoreRef<State, Action>>,
    phase: Cell<Phase>,
    latest: RefCell<Option<Latest<ViewModel>>>,
    pipe: RefCell<ProjectionPipe<ViewModel>>,
    subscription: RefCell<Option<Callback<State>>>,
    rendered: Cell<bool>,
}

impl<State, Action, ViewModel> LifecycleController<State, Action, ViewModel>
where
    State: 'static,
    Action: 'static,
    ViewModel: Clone + 'static,
{
    pub fn new(
        store: StoreRef<State, Action>,
        config: ConnectorConfig<State, Action, ViewModel>,
        scheduler: Scheduler,
        invalidate: Box<dyn Fn()>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            scheduler,
            invalidate,
            config: RefCell::new(config),
            store: RefCell::new(store),
            phase: Cell::new(Phase::Uninitialized),
            latest: RefCell::new(None),
            pipe: RefCell::new(ProjectionPipe::seeded(None)),
            subscription: RefCell::new(None),
            rendered: Cell::new(false),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn store(&self) -> StoreRef<State, Action> {
        self.store.borrow().clone()
    }

    fn config(&self) -> ConnectorConfig<State, Action, ViewModel> {
        self.config.borrow().clone()
    }

    /// Run `on_init`, derive the first view model, and subscribe.
    pub fn mount(&self) {
        if self.phase.get() != Phase::Uninitialized {
            return;
        }
        log::trace!("mounting connector for {}", type_name::<ViewModel>());

        let on_init = self.config.borrow().on_init.clone();
        if let Some(on_init) = on_init {
            on_init(&self.store());
        }

        self.compute_initial();
        self.subscribe();
        self.phase.set(Phase::Mounted);
    }

    /// Derive the view model straight from the store's current state
    /// and make it the distinct baseline.
    fn compute_initial(&self) {
        let latest = Latest::from_result(derive(&self.config(), &self.store()));
        self.pipe.borrow_mut().reseed(latest.value());
        *self.latest.borrow_mut() = Some(latest);
    }

    fn latest(&self) -> Result<ViewModel, ConnectorError> {
        if let Some(latest) = &*self.latest.borrow() {
            return latest.to_result();
        }
        self.compute_initial();
        self.latest()
    }

    fn subscribe(&self) {
        if !self.config.borrow().rebuild_on_change {
            *self.subscription.borrow_mut() = None;
            return;
        }

        let weak_self = self.weak_self.clone();
        let callback = Callback::new(move |state: Rc<State>| {
            if let Some(controller) = weak_self.upgrade() {
                controller.on_state(&state);
            }
        });
        self.store().subscribe(&callback);
        *self.subscription.borrow_mut() = Some(callback);
    }

    fn on_state(&self, state: &State) {
        let config = self.config();
        if self.phase.get() != Phase::Mounted || !config.rebuild_on_change {
            return;
        }

        let store = self.store();
        let emission = self.pipe.borrow_mut().process(&config, &store, state);
        match emission {
            Some(Emission::Accept(next)) => self.accept(&config, next),
            Some(Emission::Fail(error)) => {
                *self.latest.borrow_mut() = Some(Latest::Error(error));
                (self.invalidate)();
            }
            None => {}
        }
    }

    fn accept(&self, config: &ConnectorConfig<State, Action, ViewModel>, next: ViewModel) {
        let previous = self.latest.borrow().as_ref().and_then(Latest::value);
        if let Some(on_will_change) = &config.on_will_change {
            on_will_change(previous.as_ref(), &next);
        }

        *self.latest.borrow_mut() = Some(Latest::Value(next.clone()));
        (self.invalidate)();

        let weak_self = self.weak_self.clone();
        self.scheduler.schedule_after_render(move || {
            if let Some(controller) = weak_self.upgrade() {
                if controller.phase.get() != Phase::Mounted {
                    return;
                }
                let on_did_change = controller.config.borrow().on_did_change.clone();
                if let Some(on_did_change) = on_did_change {
                    on_did_change(previous.as_ref(), &next);
                }
            }
        });
    }

    /// The value for the render in progress: the latest accepted view
    /// model, or the pending derivation error.
    ///
    /// The first call also queues `on_initial_build` for after the
    /// render has been committed, provided it rendered a view model.
    pub fn render(&self) -> Result<ViewModel, ConnectorError> {
        let result = self.latest();

        if !self.rendered.replace(true) {
            if let Ok(initial) = &result {
                let initial = initial.clone();
                let weak_self = self.weak_self.clone();
                self.scheduler.schedule_after_render(move || {
                    if let Some(controller) = weak_self.upgrade() {
                        if controller.phase.get() != Phase::Mounted {
                            return;
                        }
                        let on_initial_build = controller.config.borrow().on_initial_build.clone();
                        if let Some(on_initial_build) = on_initial_build {
                            on_initial_build(&initial);
                        }
                    }
                });
            }
        }

        result
    }

    /// Swap the subscription over to `store`, if it is a different
    /// store than the one bound now. The old subscription is dropped
    /// before anything else happens, so the old store can no longer
    /// reach this controller. Returns whether anything changed; the
    /// caller is responsible for rebuilding.
    pub fn rebind(&self, store: StoreRef<State, Action>) -> bool {
        if self.phase.get() != Phase::Mounted || self.store.borrow().ptr_eq(&store) {
            return false;
        }
        log::trace!("resubscribing connector for {} to {:?}", type_name::<ViewModel>(), store);

        self.subscription.borrow_mut().take();
        *self.store.borrow_mut() = store;
        self.compute_initial();
        self.subscribe();
        true
    }

    /// Replace the configuration and re-derive the view model with
    /// it, keeping the current subscription. Only a change to
    /// `rebuild_on_change` subscribes or unsubscribes.
    pub fn reconfigure(&self, config: ConnectorConfig<State, Action, ViewModel>) {
        let was_subscribed = self.subscription.borrow().is_some();
        *self.config.borrow_mut() = config;

        if self.phase.get() != Phase::Mounted {
            return;
        }

        self.compute_initial();
        if was_subscribed != self.config.borrow().rebuild_on_change {
            self.subscribe();
        }
    }

    /// Replace the callbacks and converter used from now on, without
    /// re-deriving anything. This is what a hook does on every render.
    pub fn set_config(&self, config: ConnectorConfig<State, Action, ViewModel>) {
        let was_subscribed = self.subscription.borrow().is_some();
        *self.config.borrow_mut() = config;

        if self.phase.get() == Phase::Mounted
            && was_subscribed != self.config.borrow().rebuild_on_change
        {
            self.subscribe();
        }
    }

    /// Run `on_dispose` and cancel the subscription. Terminal.
    pub fn unmount(&self) {
        let phase = self.phase.replace(Phase::Disposed);
        self.subscription.borrow_mut().take();

        if phase == Phase::Mounted {
            log::trace!("disposing connector for {}", type_name::<ViewModel>());
            let on_dispose = self.config.borrow().on_dispose.clone();
            if let Some(on_dispose) = on_dispose {
                on_dispose(&self.store());
            }
        }
    }
}
