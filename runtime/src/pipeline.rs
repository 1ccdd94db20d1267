//! Pipeline construction.
//!
//! Builds the state stream for one reactor:
//!
//! 1. raw actions → `transform_action`
//! 2. `mutate` per action, errors contained per action, merged concurrently;
//!    the next action is only derived once no mutation is ready, so `mutate`
//!    sees the state folded from every earlier synchronous mutation
//! 3. `route_mutation` (effect-carrying mutations leave here) → `transform_mutation`
//! 4. sequential fold with `reduce`, errors and panics contained per mutation
//! 5. seeded with the initial state
//! 6. `transform_state`
//!
//! The caller drives the result and publishes it (step 7).

use crate::metrics::ReactorMetrics;
use futures::future;
use futures::stream::{self, BoxStream, SelectAll, StreamExt};
use rxreactor_core::{Context, MutationStream, Reactor, Routed};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::task::Poll;
use std::time::Instant;
use tokio::sync::mpsc;

pub(crate) fn state_stream<R: Reactor>(
    reactor: &Arc<R>,
    actions: mpsc::UnboundedReceiver<R::Action>,
    initial_state: R::State,
    context: Context<R::State, R::Effect>,
) -> BoxStream<'static, R::State> {
    let actions = stream::unfold(actions, |mut actions| async move {
        actions.recv().await.map(|action| (action, actions))
    })
    .boxed();
    let actions = reactor.transform_action(actions);

    let mutations = derivations(Arc::clone(reactor), actions, context.clone());

    let routing = Arc::clone(reactor);
    let mutations = mutations
        .filter_map(move |mutation| {
            let routed = match routing.route_mutation(mutation) {
                Routed::Mutation(mutation) => Some(mutation),
                Routed::Effect(effect) => {
                    tracing::trace!("Mutation carried an effect, emitting it instead of reducing");
                    context.emit_effect(effect);
                    None
                },
            };
            future::ready(routed)
        })
        .boxed();
    let mutations = reactor.transform_mutation(mutations);

    let folding = Arc::clone(reactor);
    let folded = mutations
        .scan(initial_state.clone(), move |state, mutation| {
            let next = reduce(&*folding, state, mutation);
            if let Some(next) = &next {
                state.clone_from(next);
            }
            future::ready(Some(next))
        })
        .filter_map(future::ready);

    let states = stream::once(future::ready(initial_state))
        .chain(folded)
        .boxed();
    reactor.transform_state(states)
}

/// Merge the mutations of every action, preferring ready mutations over new
/// actions.
///
/// Each poll first drains the in-flight mutation streams. Only when none of
/// them has a mutation ready is the next action pulled and derived. Combined
/// with a downstream that folds and publishes each mutation before polling
/// again, this keeps `Context::current_state` in step with action order.
fn derivations<R: Reactor>(
    reactor: Arc<R>,
    mut actions: BoxStream<'static, R::Action>,
    context: Context<R::State, R::Effect>,
) -> BoxStream<'static, R::Mutation> {
    let mut in_flight: SelectAll<BoxStream<'static, R::Mutation>> = SelectAll::new();
    let mut intake_open = true;

    stream::poll_fn(move |cx| {
        loop {
            if let Poll::Ready(Some(mutation)) = in_flight.poll_next_unpin(cx) {
                return Poll::Ready(Some(mutation));
            }
            if !intake_open {
                return if in_flight.is_empty() {
                    Poll::Ready(None)
                } else {
                    Poll::Pending
                };
            }
            match actions.poll_next_unpin(cx) {
                Poll::Ready(Some(action)) => in_flight.push(derive(&*reactor, action, &context)),
                Poll::Ready(None) => {
                    tracing::debug!("Action intake closed");
                    intake_open = false;
                },
                Poll::Pending => return Poll::Pending,
            }
        }
    })
    .boxed()
}

/// Derive one action's mutations, ending its stream at the first error.
fn derive<R: Reactor>(
    reactor: &R,
    action: R::Action,
    context: &Context<R::State, R::Effect>,
) -> BoxStream<'static, R::Mutation> {
    tracing::trace!("Deriving mutations for action");

    let derived = panic::catch_unwind(AssertUnwindSafe(|| reactor.mutate(action, context)));
    let mutations: MutationStream<R::Mutation> = match derived {
        Ok(mutations) => mutations,
        Err(_) => {
            ReactorMetrics::record_mutation_error();
            tracing::error!("mutate panicked, action produces no mutations");
            return stream::empty().boxed();
        },
    };

    mutations
        .take_while(|item| {
            if let Err(error) = item {
                ReactorMetrics::record_mutation_error();
                tracing::warn!(
                    error = %error,
                    "Mutation stream failed, dropping the rest of this action's mutations"
                );
            }
            future::ready(item.is_ok())
        })
        .filter_map(|item| future::ready(item.ok()))
        .boxed()
}

/// Fold one mutation. `None` means the mutation is a no-op.
fn reduce<R: Reactor>(reactor: &R, state: &R::State, mutation: R::Mutation) -> Option<R::State> {
    let start = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| reactor.reduce(state, mutation)));

    match outcome {
        Ok(Ok(next)) => {
            ReactorMetrics::record_reduce(start.elapsed());
            tracing::trace!("Mutation reduced");
            Some(next)
        },
        Ok(Err(error)) => {
            ReactorMetrics::record_reduce_error();
            tracing::warn!(error = %error, "Reduce failed, mutation ignored");
            None
        },
        Err(_) => {
            ReactorMetrics::record_reduce_error();
            tracing::error!("Reduce panicked, mutation ignored");
            None
        },
    }
}
