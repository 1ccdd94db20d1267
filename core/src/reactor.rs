//! The `Reactor` trait - the customization point of a pipeline.
//!
//! A reactor describes how a stream of actions becomes a stream of states:
//!
//! ```text
//! actions ─► transform_action ─► mutate (per action, merged) ─► route_mutation
//!         ─► transform_mutation ─► reduce (sequential fold) ─► transform_state
//!         ─► replay(1) multicast
//! ```
//!
//! Every hook has a default, so a reactor only overrides what it needs.
//! The runtime's `Store` owns the wiring; a reactor never touches channels.
//!
//! # Two ways to emit effects
//!
//! - Call [`Context::emit_effect`] from inside [`Reactor::mutate`].
//! - Return a mutation that [`Reactor::route_mutation`] maps to
//!   [`Routed::Effect`]. That mutation never reaches [`Reactor::reduce`].
//!
//! Both can be used in the same reactor. Observers see the same thing: an
//! effect on the effect stream and no state change.

use crate::context::Context;
use crate::error::ReactorError;
use crate::mutation::{self, MutationStream};
use futures::stream::BoxStream;

/// Where a produced mutation goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed<M, E> {
    /// Fold the mutation into state.
    Mutation(M),

    /// Emit the effect and drop the mutation.
    Effect(E),
}

/// Converts actions into mutations and folds mutations into state.
///
/// # Example
///
/// ```
/// use rxreactor_core::{Context, Reactor, ReactorError};
/// use rxreactor_core::mutation::{self, MutationStream};
///
/// struct Counter;
///
/// enum Action { Increment, Reset }
/// enum Mutation { Add(i64), Set(i64) }
///
/// impl Reactor for Counter {
///     type Action = Action;
///     type Mutation = Mutation;
///     type State = i64;
///     type Effect = ();
///
///     fn mutate(&self, action: Action, _ctx: &Context<i64, ()>) -> MutationStream<Mutation> {
///         match action {
///             Action::Increment => mutation::just(Mutation::Add(1)),
///             Action::Reset => mutation::just(Mutation::Set(0)),
///         }
///     }
///
///     fn reduce(&self, state: &i64, mutation: Mutation) -> Result<i64, ReactorError> {
///         match mutation {
///             Mutation::Add(n) => Ok(state + n),
///             Mutation::Set(n) => Ok(n),
///         }
///     }
/// }
/// ```
pub trait Reactor: Send + Sync + 'static {
    /// External input submitted by collaborators.
    type Action: Send + 'static;

    /// Internal intent derived from an action, consumed by [`Reactor::reduce`].
    type Mutation: Send + 'static;

    /// Immutable snapshot folded from mutations.
    type State: Clone + Send + Sync + 'static;

    /// One-shot notification that is not part of state.
    ///
    /// Use [`std::convert::Infallible`] or `()` for reactors without effects.
    type Effect: Clone + Send + 'static;

    /// Derive zero or more mutations from `action`.
    ///
    /// This is where side effects (timers, I/O) start. The returned stream may
    /// be asynchronous; streams of different actions are merged concurrently.
    /// An `Err` item ends this action's contribution without affecting others.
    ///
    /// Mutations of earlier actions that were ready immediately have already
    /// been reduced, so `context.current_state()` reflects them.
    ///
    /// Default: no mutations.
    fn mutate(
        &self,
        _action: Self::Action,
        _context: &Context<Self::State, Self::Effect>,
    ) -> MutationStream<Self::Mutation> {
        mutation::empty()
    }

    /// Fold one mutation into the next state.
    ///
    /// Called exactly once per mutation, sequentially, always with the most
    /// recently reduced state.
    ///
    /// # Errors
    ///
    /// Returning an error (or panicking) turns this mutation into a no-op;
    /// later mutations are still reduced.
    ///
    /// Default: state unchanged.
    fn reduce(
        &self,
        state: &Self::State,
        _mutation: Self::Mutation,
    ) -> Result<Self::State, ReactorError> {
        Ok(state.clone())
    }

    /// Decide whether a mutation carries an effect instead of a state change.
    ///
    /// Default: every mutation is folded.
    fn route_mutation(
        &self,
        mutation: Self::Mutation,
    ) -> Routed<Self::Mutation, Self::Effect> {
        Routed::Mutation(mutation)
    }

    /// Adapt the raw action stream. Default: identity.
    fn transform_action(
        &self,
        actions: BoxStream<'static, Self::Action>,
    ) -> BoxStream<'static, Self::Action> {
        actions
    }

    /// Adapt the merged mutation stream. Default: identity.
    fn transform_mutation(
        &self,
        mutations: BoxStream<'static, Self::Mutation>,
    ) -> BoxStream<'static, Self::Mutation> {
        mutations
    }

    /// Adapt the state stream before it is multicast. Default: identity.
    fn transform_state(
        &self,
        states: BoxStream<'static, Self::State>,
    ) -> BoxStream<'static, Self::State> {
        states
    }

    /// Adapt the effect stream handed to each effect observer. Default: identity.
    fn transform_effect(
        &self,
        effects: BoxStream<'static, Self::Effect>,
    ) -> BoxStream<'static, Self::Effect> {
        effects
    }
}
