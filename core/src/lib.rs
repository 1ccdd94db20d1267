//! # RxReactor Core
//!
//! Core traits and stream primitives for the RxReactor architecture.
//!
//! A reactor is a UI-independent state container: collaborators submit
//! **actions**, the reactor derives **mutations** from them, folds the
//! mutations into **state**, and publishes every new state to observers.
//! One-shot notifications that must not live in state (navigation, toasts,
//! errors) travel on a separate **effect** channel.
//!
//! ## Core Concepts
//!
//! - **Action**: external input, strictly ordered within one reactor
//! - **Mutation**: internal intent, zero or more per action, possibly async
//! - **State**: immutable snapshot; the fold of every mutation so far
//! - **Effect**: side notification, never replayed to late observers
//! - **Reactor**: the trait with the hooks that define all of the above
//!
//! ## Modules
//!
//! - [`reactor`]: the [`Reactor`] trait and [`Routed`]
//! - [`mutation`]: [`MutationStream`] and its constructors
//! - [`context`]: [`Context`], handed to `mutate`
//! - [`relay`]: multicast channels with replay depth 0 and 1
//! - [`state`]: the synchronous current-state cell
//! - [`subscription`]: subscription handles and the bag that owns them
//! - [`simple`]: reactors whose mutations are their actions
//!
//! This crate has no runtime of its own; see `rxreactor-runtime` for the
//! `Store` that wires a reactor into a running pipeline.

pub mod context;
pub mod error;
pub mod mutation;
pub mod reactor;
pub mod relay;
pub mod simple;
pub mod state;
pub mod subscription;

pub use context::Context;
pub use error::ReactorError;
pub use mutation::MutationStream;
pub use reactor::{Reactor, Routed};
pub use relay::{PublishRelay, ReplayRelay};
pub use simple::{Simple, SimpleReactor};
pub use state::StateCell;
pub use subscription::{CompositeSubscription, Disposable, DisposedBy, Subscription};

// Re-exported so reactors can name stream types without a direct dependency.
pub use futures::stream::{BoxStream, StreamExt};
