//! Binds a redux-style [Store] to a retained-mode node tree.
//!
//! A [StoreProvider] makes one store visible to a subtree. Below it,
//! a [StoreConnector] (or a [FunctionNode](hooks::FunctionNode) using
//! the [hooks]) derives a view model from the store's state and is
//! rebuilt by the [Scheduler] only when its [ConnectorConfig] accepts
//! a change.
//!
//! ```
//! use std::rc::Rc;
//! use store_connector::{BuildContext, ConnectorConfig, Scheduler, StoreConnector, StoreProvider, StoreRef};
//!
//! let scheduler = Scheduler::new();
//! let store = StoreRef::new(|state: &Rc<i32>, action: &i32| Rc::new(**state + *action), 0);
//! let provider = StoreProvider::new(&BuildContext::root(&scheduler), store.clone());
//!
//! let counter = StoreConnector::mount(
//!     provider.context(),
//!     ConnectorConfig::new(|store: &StoreRef<i32, i32>| *store.state()).distinct(true),
//!     |_store: &StoreRef<i32, i32>, count: &i32| format!("count: {}", count),
//! )
//! .unwrap();
//! scheduler.flush();
//! assert_eq!(counter.output().unwrap().unwrap(), "count: 0");
//!
//! store.dispatch(1);
//! scheduler.flush();
//! assert_eq!(counter.output().unwrap().unwrap(), "count: 1");
//!
//! store.dispatch(0);
//! scheduler.flush();
//! assert_eq!(counter.build_count(), 2);
//! ```

pub mod connector;
mod context;
pub mod error;
pub mod hooks;
mod listener;
pub mod middleware;
pub mod provider;
mod reducer;
mod scheduler;
mod store;

pub use connector::{ConnectorConfig, Nullable, Phase, StoreBuilder, StoreConnector};
pub use context::{BuildContext, Dependent};
pub use error::{ConnectorError, DerivationError, ProviderNotFoundError};
pub use listener::*;
pub use provider::StoreProvider;
pub use reducer::*;
pub use scheduler::{Rebuild, Scheduler};
pub use store::{Store, StoreRef};
