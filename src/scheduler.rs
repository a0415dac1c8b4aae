//! A headless frame scheduler standing in for the retained-mode UI
//! framework.
//!
//! A frame has two phases. First every node marked with
//! [Scheduler::mark_needs_build()] is rebuilt, then the tasks queued
//! with [Scheduler::schedule_after_render()] run. A task queued while
//! the tasks of a frame are running waits for the next rebuild pass,
//! so a post-render task always observes the render that was pending
//! when it was queued.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
};

/// A node in the tree which knows how to rebuild its own output.
pub trait Rebuild {
    fn rebuild(&self);
}

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct SchedulerInner {
    dirty: RefCell<Vec<Weak<dyn Rebuild>>>,
    post_render: RefCell<VecDeque<Task>>,
    rendering: Cell<bool>,
}

/// Cheaply clonable handle to the frame scheduler shared by a tree.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that `node` be rebuilt during the next rebuild pass.
    /// Marking a node which is already pending is a no-op.
    pub fn mark_needs_build(&self, node: Weak<dyn Rebuild>) {
        let mut dirty = self.inner.dirty.borrow_mut();
        if !dirty.iter().any(|pending| pending.ptr_eq(&node)) {
            dirty.push(node);
        }
    }

    /// Defer `task` until the render pass which follows has been
    /// committed.
    pub fn schedule_after_render<F: FnOnce() + 'static>(&self, task: F) {
        self.inner.post_render.borrow_mut().push_back(Box::new(task));
    }

    /// `true` while nodes are being rebuilt.
    pub fn is_rendering(&self) -> bool {
        self.inner.rendering.get()
    }

    /// `true` when there is nothing left to rebuild or run.
    pub fn is_idle(&self) -> bool {
        self.inner.dirty.borrow().is_empty() && self.inner.post_render.borrow().is_empty()
    }

    /// Run frames until no node is dirty and no post-render task is
    /// pending.
    pub fn flush(&self) {
        loop {
            self.rebuild_dirty();

            let tasks: Vec<Task> = self.inner.post_render.borrow_mut().drain(..).collect();
            if tasks.is_empty() {
                break;
            }

            for task in tasks {
                task();
            }
        }
    }

    fn rebuild_dirty(&self) {
        self.inner.rendering.set(true);
        loop {
            let dirty: Vec<Weak<dyn Rebuild>> = self.inner.dirty.borrow_mut().drain(..).collect();
            if dirty.is_empty() {
                break;
            }

            log::trace!("rebuilding {} node(s)", dirty.len());
            for node in dirty {
                if let Some(node) = node.upgrade() {
                    node.rebuild();
                }
            }
        }
        self.inner.rendering.set(false);
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("dirty", &self.inner.dirty.borrow().len())
            .field("post_render", &self.inner.post_render.borrow().len())
            .field("rendering", &self.inner.rendering.get())
            .finish()
    }
}
