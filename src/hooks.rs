//! Hook-style access to the nearest provided [Store](crate::Store).
//!
//! A [FunctionNode] re-runs its render closure on every build, handing
//! it a [Hooks] cursor. Hooks keep their state in slots owned by the
//! node, matched up between renders purely by call order, so a render
//! must call the same hooks in the same order every time.
//!
//! ```
//! use std::rc::Rc;
//! use store_connector::{
//!     hooks::{use_dispatch, use_selector, FunctionNode},
//!     BuildContext, Scheduler, StoreProvider, StoreRef,
//! };
//!
//! let scheduler = Scheduler::new();
//! let store = StoreRef::new(|state: &Rc<i32>, action: &i32| Rc::new(**state + *action), 0);
//! let provider = StoreProvider::new(&BuildContext::root(&scheduler), store.clone());
//!
//! let node = FunctionNode::mount(provider.context(), |hooks| {
//!     let doubled = use_selector::<i32, i32, _, _>(hooks, |count: &i32| count * 2)?;
//!     let _dispatch = use_dispatch::<i32, i32>(hooks)?;
//!     Ok(format!("doubled: {}", doubled))
//! });
//! scheduler.flush();
//! assert_eq!(node.output().unwrap().unwrap(), "doubled: 0");
//!
//! store.dispatch(21);
//! scheduler.flush();
//! assert_eq!(node.output().unwrap().unwrap(), "doubled: 42");
//! ```

use crate::{
    connector::{ConnectorConfig, LifecycleController},
    context::Dependent,
    error::ConnectorError,
    provider::StoreProvider,
    scheduler::Rebuild,
    BuildContext, StoreRef,
};
use std::{
    any::{type_name, Any},
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

type Render<Output> = Box<dyn Fn(&mut Hooks<'_>) -> Result<Output, ConnectorError>>;

/// State kept by one hook call between renders.
struct Slot {
    value: Rc<dyn Any>,
    dispose: Option<Box<dyn Fn()>>,
}

/// The cursor handed to a [FunctionNode]'s render closure.
pub struct Hooks<'a> {
    context: &'a BuildContext,
    node: Weak<dyn Rebuild>,
    dependent: Weak<dyn Dependent>,
    slots: &'a RefCell<Vec<Slot>>,
    cursor: usize,
}

impl<'a> Hooks<'a> {
    /// Where the node being rendered sits in the tree.
    pub fn context(&self) -> &BuildContext {
        self.context
    }

    /// Fetch the state for the next hook call, creating it with
    /// `init` during the first render.
    ///
    /// # Panics
    ///
    /// Panics if the slot at this position was created by a hook
    /// storing a different type, meaning the hooks were called in a
    /// different order than in the previous render.
    fn use_slot<T, F>(&mut self, init: F) -> Rc<T>
    where
        T: 'static,
        F: FnOnce() -> (Rc<T>, Option<Box<dyn Fn()>>),
    {
        let index = self.cursor;
        self.cursor += 1;

        let existing = self
            .slots
            .borrow()
            .get(index)
            .map(|slot| slot.value.clone());

        match existing {
            Some(value) => value.downcast::<T>().unwrap_or_else(|_| {
                panic!(
                    "hook order changed between renders: slot {} does not hold a {}",
                    index,
                    type_name::<T>()
                )
            }),
            None => {
                let (value, dispose) = init();
                self.slots.borrow_mut().push(Slot {
                    value: value.clone(),
                    dispose,
                });
                value
            }
        }
    }
}

/// A headless node rendered by a closure which may call hooks.
///
/// Mounting schedules the first build; after that the node is rebuilt
/// whenever one of its hooks asks for it.
pub struct FunctionNode<Output> {
    weak_self: Weak<Self>,
    context: BuildContext,
    render: Render<Output>,
    slots: RefCell<Vec<Slot>>,
    output: RefCell<Option<Result<Output, ConnectorError>>>,
    builds: Cell<usize>,
    mounted: Cell<bool>,
}

impl<Output: 'static> FunctionNode<Output> {
    pub fn mount<R>(context: &BuildContext, render: R) -> Rc<Self>
    where
        R: Fn(&mut Hooks<'_>) -> Result<Output, ConnectorError> + 'static,
    {
        let node = Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            context: context.clone(),
            render: Box::new(render),
            slots: RefCell::new(Vec::new()),
            output: RefCell::new(None),
            builds: Cell::new(0),
            mounted: Cell::new(true),
        });
        node.mark_needs_build();
        node
    }

    /// Request a rebuild of this node during the next frame.
    pub fn mark_needs_build(&self) {
        let node: Weak<dyn Rebuild> = self.weak_self.clone();
        self.context.scheduler().mark_needs_build(node);
    }

    /// Unmount the node, disposing every hook in call order.
    pub fn unmount(&self) {
        if !self.mounted.replace(false) {
            return;
        }

        let slots: Vec<Slot> = self.slots.borrow_mut().drain(..).collect();
        for slot in &slots {
            if let Some(dispose) = &slot.dispose {
                dispose();
            }
        }
        self.output.borrow_mut().take();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn build_count(&self) -> usize {
        self.builds.get()
    }

    pub fn output(&self) -> Option<Result<Output, ConnectorError>>
    where
        Output: Clone,
    {
        self.output.borrow().clone()
    }
}

impl<Output: 'static> Rebuild for FunctionNode<Output> {
    fn rebuild(&self) {
        if !self.mounted.get() {
            return;
        }

        let mut hooks = Hooks {
            context: &self.context,
            node: self.weak_self.clone(),
            dependent: self.weak_self.clone(),
            slots: &self.slots,
            cursor: 0,
        };
        let output = (self.render)(&mut hooks);

        *self.output.borrow_mut() = Some(output);
        self.builds.set(self.builds.get() + 1);
    }
}

impl<Output: 'static> Dependent for FunctionNode<Output> {
    fn dependencies_changed(&self) {
        if self.mounted.get() {
            self.mark_needs_build();
        }
    }
}

impl<Output> fmt::Debug for FunctionNode<Output> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionNode")
            .field("hooks", &self.slots.borrow().len())
            .field("builds", &self.builds.get())
            .field("mounted", &self.mounted.get())
            .finish()
    }
}

/// The store bound by the nearest [StoreProvider]. The node is
/// rebuilt if the provider is later rebuilt with a different store.
pub fn use_store<State, Action>(
    hooks: &mut Hooks<'_>,
) -> Result<StoreRef<State, Action>, ConnectorError>
where
    State: 'static,
    Action: 'static,
{
    Ok(StoreProvider::<State, Action>::watch(
        hooks.context,
        hooks.dependent.clone(),
    )?)
}

/// A handle for dispatching actions to a store, handed out by
/// [use_dispatch()].
pub struct Dispatch<State, Action> {
    store: StoreRef<State, Action>,
}

impl<State, Action> Dispatch<State, Action> {
    pub fn dispatch<A: Into<Action>>(&self, action: A) {
        self.store.dispatch(action);
    }

    pub fn store(&self) -> &StoreRef<State, Action> {
        &self.store
    }
}

impl<State, Action> Clone for Dispatch<State, Action> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

pub fn use_dispatch<State, Action>(
    hooks: &mut Hooks<'_>,
) -> Result<Dispatch<State, Action>, ConnectorError>
where
    State: 'static,
    Action: 'static,
{
    use_store(hooks).map(|store| Dispatch { store })
}

/// Derive a value from the store's state with `selector`, rebuilding
/// the node every time the store changes.
///
/// For skipping unchanged values, or for lifecycle callbacks, use
/// [use_selector_with()].
pub fn use_selector<State, Action, ViewModel, F>(
    hooks: &mut Hooks<'_>,
    selector: F,
) -> Result<ViewModel, ConnectorError>
where
    State: 'static,
    Action: 'static,
    ViewModel: Clone + 'static,
    F: Fn(&State) -> ViewModel + 'static,
{
    use_selector_with(
        hooks,
        ConnectorConfig::new(move |store: &StoreRef<State, Action>| selector(&store.state())),
    )
}

/// Derive a view model as configured by `config`, with the same
/// semantics as a [StoreConnector](crate::StoreConnector).
///
/// The config passed on later renders replaces the callbacks and the
/// converter, but does not re-derive the view model by itself.
pub fn use_selector_with<State, Action, ViewModel>(
    hooks: &mut Hooks<'_>,
    config: ConnectorConfig<State, Action, ViewModel>,
) -> Result<ViewModel, ConnectorError>
where
    State: 'static,
    Action: 'static,
    ViewModel: Clone + 'static,
{
    let store = use_store::<State, Action>(hooks)?;
    let context = hooks.context.clone();
    let node = hooks.node.clone();

    let mut created = false;
    let slot = hooks.use_slot(|| {
        created = true;
        let scheduler = context.scheduler().clone();
        let invalidate_node = node.clone();
        let invalidate = Box::new(move || scheduler.mark_needs_build(invalidate_node.clone()));
        let controller = LifecycleController::new(
            store.clone(),
            config.clone(),
            context.scheduler().clone(),
            invalidate,
        );
        controller.mount();

        let disposed = controller.clone();
        let dispose: Box<dyn Fn()> = Box::new(move || disposed.unmount());
        let slot = Rc::new(SelectorSlot {
            context: context.clone(),
            node,
            controller,
        });
        (slot, Some(dispose))
    });

    if created {
        let dependent: Weak<dyn Dependent> = Rc::downgrade(&slot) as Weak<SelectorSlot<State, Action, ViewModel>>;
        StoreProvider::<State, Action>::watch(hooks.context, dependent)?;
    } else {
        slot.controller.set_config(config);
        slot.controller.rebind(store);
    }

    slot.controller.render()
}

/// What [use_selector_with()] keeps between renders.
///
/// The slot watches the provider on its own, so a store swap moves
/// the subscription straight away instead of at the next render of
/// the node.
struct SelectorSlot<State, Action, ViewModel> {
    context: BuildContext,
    node: Weak<dyn Rebuild>,
    controller: Rc<LifecycleController<State, Action, ViewModel>>,
}

impl<State, Action, ViewModel> Dependent for SelectorSlot<State, Action, ViewModel>
where
    State: 'static,
    Action: 'static,
    ViewModel: Clone + 'static,
{
    fn dependencies_changed(&self) {
        if let Ok(store) = StoreProvider::<State, Action>::of(&self.context) {
            if self.controller.rebind(store) {
                self.context.scheduler().mark_needs_build(self.node.clone());
            }
        }
    }
}
