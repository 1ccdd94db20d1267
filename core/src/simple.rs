//! Reactors whose mutations are their actions.

use crate::context::Context;
use crate::error::ReactorError;
use crate::mutation::{self, MutationStream};
use crate::reactor::Reactor;
use futures::stream::BoxStream;
use std::convert::Infallible;

/// A reactor without a separate mutation type.
///
/// Every action is folded directly by [`SimpleReactor::reduce`]. Wrap an
/// implementation in [`Simple`] to run it.
pub trait SimpleReactor: Send + Sync + 'static {
    /// Input, also used as the mutation.
    type Action: Send + 'static;

    /// Folded snapshot.
    type State: Clone + Send + Sync + 'static;

    /// Fold one action into the next state.
    ///
    /// # Errors
    ///
    /// An error turns this action into a no-op.
    fn reduce(
        &self,
        state: &Self::State,
        _action: Self::Action,
    ) -> Result<Self::State, ReactorError> {
        Ok(state.clone())
    }

    /// Adapt the raw action stream. Default: identity.
    fn transform_action(
        &self,
        actions: BoxStream<'static, Self::Action>,
    ) -> BoxStream<'static, Self::Action> {
        actions
    }

    /// Adapt the mutation (action) stream before the fold. Default: identity.
    fn transform_mutation(
        &self,
        mutations: BoxStream<'static, Self::Action>,
    ) -> BoxStream<'static, Self::Action> {
        mutations
    }

    /// Adapt the state stream. Default: identity.
    fn transform_state(
        &self,
        states: BoxStream<'static, Self::State>,
    ) -> BoxStream<'static, Self::State> {
        states
    }
}

/// Runs a [`SimpleReactor`] as a [`Reactor`].
#[derive(Debug, Clone, Default)]
pub struct Simple<R>(pub R);

impl<R: SimpleReactor> Reactor for Simple<R> {
    type Action = R::Action;
    type Mutation = R::Action;
    type State = R::State;
    type Effect = Infallible;

    fn mutate(
        &self,
        action: Self::Action,
        _context: &Context<Self::State, Self::Effect>,
    ) -> MutationStream<Self::Mutation> {
        mutation::just(action)
    }

    fn reduce(
        &self,
        state: &Self::State,
        mutation: Self::Mutation,
    ) -> Result<Self::State, ReactorError> {
        self.0.reduce(state, mutation)
    }

    fn transform_action(
        &self,
        actions: BoxStream<'static, Self::Action>,
    ) -> BoxStream<'static, Self::Action> {
        self.0.transform_action(actions)
    }

    fn transform_mutation(
        &self,
        mutations: BoxStream<'static, Self::Mutation>,
    ) -> BoxStream<'static, Self::Mutation> {
        self.0.transform_mutation(mutations)
    }

    fn transform_state(
        &self,
        states: BoxStream<'static, Self::State>,
    ) -> BoxStream<'static, Self::State> {
        self.0.transform_state(states)
    }
}
