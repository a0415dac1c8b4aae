use crate::scheduler::Scheduler;
use std::{
    any::{Any, TypeId},
    fmt,
    rc::Rc,
};

/// A node which read a provided value reactively, and wants to hear
/// about it when that value is replaced.
pub trait Dependent {
    fn dependencies_changed(&self);
}

/// One link of the ancestor chain: a single value provided at some
/// node, keyed by its type.
struct Scope {
    parent: Option<Rc<Scope>>,
    key: TypeId,
    value: Rc<dyn Any>,
}

/// A position in the tree.
///
/// Values provided with [BuildContext::provide()] are visible through
/// the returned context and every context derived from it, never to
/// siblings or ancestors. Lookups are matched on the exact type of
/// the value; the nearest ancestor wins.
#[derive(Clone)]
pub struct BuildContext {
    scope: Option<Rc<Scope>>,
    scheduler: Scheduler,
}

impl BuildContext {
    /// The context at the root of a tree. Nothing is provided yet.
    pub fn root(scheduler: &Scheduler) -> Self {
        Self {
            scope: None,
            scheduler: scheduler.clone(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the context for the subtree below a node providing
    /// `value`.
    pub fn provide<T: 'static>(&self, value: Rc<T>) -> BuildContext {
        BuildContext {
            scope: Some(Rc::new(Scope {
                parent: self.scope.clone(),
                key: TypeId::of::<T>(),
                value,
            })),
            scheduler: self.scheduler.clone(),
        }
    }

    /// Find the nearest value of type `T` provided above this
    /// position.
    pub fn lookup<T: 'static>(&self) -> Option<Rc<T>> {
        let key = TypeId::of::<T>();
        let mut scope = self.scope.as_ref();

        while let Some(current) = scope {
            if current.key == key {
                return current.value.clone().downcast::<T>().ok();
            }
            scope = current.parent.as_ref();
        }

        None
    }

    /// Number of values provided above this position.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.scope.as_ref();
        while let Some(current) = scope {
            depth += 1;
            scope = current.parent.as_ref();
        }
        depth
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::BuildContext;
    use crate::scheduler::Scheduler;
    use std::rc::Rc;

    #[test]
    fn nearest_ancestor_wins() {
        let root = BuildContext::root(&Scheduler::new());
        let outer = root.provide(Rc::new(1u32));
        let middle = outer.provide(Rc::new("label"));
        let inner = middle.provide(Rc::new(2u32));

        assert_eq!(inner.lookup::<u32>().map(|v| *v), Some(2));
        assert_eq!(middle.lookup::<u32>().map(|v| *v), Some(1));
        assert_eq!(inner.lookup::<&str>().map(|v| *v), Some("label"));
        assert_eq!(inner.depth(), 3);
    }

    #[test]
    fn siblings_and_root_do_not_see_values() {
        let root = BuildContext::root(&Scheduler::new());
        let left = root.provide(Rc::new(1u32));
        let right = root.provide(Rc::new(1u64));

        assert!(root.lookup::<u32>().is_none());
        assert!(right.lookup::<u32>().is_none());
        assert!(left.lookup::<u64>().is_none());
    }
}
