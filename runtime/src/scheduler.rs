//! Running pipeline stages on a specific Tokio runtime.
//!
//! Streams are pulled, so "run this stage on scheduler X" means: poll the
//! upstream on X and hand each item to whoever polls downstream. [`run_on`]
//! does exactly that through an unbounded channel, preserving order.
//!
//! [`Scheduled`] applies the hop to a reactor's mutation stage, so every
//! `mutate` stream (timers, I/O) is driven by the given runtime while the fold
//! and publication stay on the store's runtime. To move publication itself,
//! create the store with [`Store::spawn_on`](crate::Store::spawn_on).

use futures::stream::{self, BoxStream, StreamExt};
use rxreactor_core::{Context, MutationStream, Reactor, ReactorError, Routed};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Poll `items` on the runtime behind `handle` and re-deliver them in order.
///
/// The forwarding task stops as soon as the returned stream is dropped or
/// `items` completes.
#[must_use]
pub fn run_on<T: Send + 'static>(
    mut items: BoxStream<'static, T>,
    handle: &Handle,
) -> BoxStream<'static, T> {
    let (tx, rx) = mpsc::unbounded_channel();
    handle.spawn(async move {
        while let Some(item) = items.next().await {
            if tx.send(item).is_err() {
                tracing::trace!("Scheduled stream receiver dropped, stopping");
                break;
            }
        }
    });

    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed()
}

/// Wraps a reactor so its mutation stage runs on another runtime.
///
/// Every other hook is delegated unchanged.
pub struct Scheduled<R> {
    inner: R,
    handle: Handle,
}

impl<R> Scheduled<R> {
    /// Run `inner`'s mutation stage on the runtime behind `handle`.
    #[must_use]
    pub const fn new(inner: R, handle: Handle) -> Self {
        Self { inner, handle }
    }

    /// The wrapped reactor.
    #[must_use]
    pub const fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: std::fmt::Debug> std::fmt::Debug for Scheduled<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduled")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<R: Reactor> Reactor for Scheduled<R> {
    type Action = R::Action;
    type Mutation = R::Mutation;
    type State = R::State;
    type Effect = R::Effect;

    fn mutate(
        &self,
        action: Self::Action,
        context: &Context<Self::State, Self::Effect>,
    ) -> MutationStream<Self::Mutation> {
        self.inner.mutate(action, context)
    }

    fn reduce(
        &self,
        state: &Self::State,
        mutation: Self::Mutation,
    ) -> Result<Self::State, ReactorError> {
        self.inner.reduce(state, mutation)
    }

    fn route_mutation(
        &self,
        mutation: Self::Mutation,
    ) -> Routed<Self::Mutation, Self::Effect> {
        self.inner.route_mutation(mutation)
    }

    fn transform_action(
        &self,
        actions: BoxStream<'static, Self::Action>,
    ) -> BoxStream<'static, Self::Action> {
        self.inner.transform_action(actions)
    }

    fn transform_mutation(
        &self,
        mutations: BoxStream<'static, Self::Mutation>,
    ) -> BoxStream<'static, Self::Mutation> {
        self.inner
            .transform_mutation(run_on(mutations, &self.handle))
    }

    fn transform_state(
        &self,
        states: BoxStream<'static, Self::State>,
    ) -> BoxStream<'static, Self::State> {
        self.inner.transform_state(states)
    }

    fn transform_effect(
        &self,
        effects: BoxStream<'static, Self::Effect>,
    ) -> BoxStream<'static, Self::Effect> {
        self.inner.transform_effect(effects)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_run_on_preserves_order_across_runtimes() {
        let worker = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("reactor-worker")
            .enable_all()
            .build()
            .unwrap();
        let main = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let seen: Vec<(u32, String)> = main.block_on(async {
            let items = stream::iter(0..5)
                .map(|n| {
                    let thread = std::thread::current().name().unwrap_or_default().to_string();
                    (n, thread)
                })
                .boxed();
            run_on(items, worker.handle()).collect().await
        });

        let numbers: Vec<u32> = seen.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![0, 1, 2, 3, 4]);
        assert!(seen.iter().all(|(_, thread)| thread == "reactor-worker"));
    }
}
