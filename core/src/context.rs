//! The handle a reactor receives while deriving mutations.
//!
//! [`Context`] gives [`Reactor::mutate`](crate::reactor::Reactor::mutate)
//! read access to the current state and lets it emit effects directly,
//! either synchronously while computing the mutation stream or later from
//! inside an async stream (it is cheap to clone and `'static`).
//!
//! ```ignore
//! fn mutate(&self, action: Action, ctx: &Context<State, Effect>) -> MutationStream<Mutation> {
//!     match action {
//!         Action::Refresh if ctx.current_state().is_busy => mutation::empty(),
//!         Action::Share(link) => {
//!             ctx.emit_effect(Effect::OpenShareSheet(link));
//!             mutation::empty()
//!         }
//!         // ...
//!     }
//! }
//! ```

use crate::relay::PublishRelay;
use crate::state::StateCell;
use crate::subscription::{CompositeSubscription, Subscription};
use futures::stream::{BoxStream, StreamExt};

/// Access to a running reactor's state and effect channel.
pub struct Context<S, E> {
    state: StateCell<S>,
    effects: PublishRelay<E>,
    subscriptions: CompositeSubscription,
}

impl<S, E> Context<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + 'static,
{
    /// Assemble a context from the parts owned by a running reactor.
    #[must_use]
    pub const fn new(
        state: StateCell<S>,
        effects: PublishRelay<E>,
        subscriptions: CompositeSubscription,
    ) -> Self {
        Self {
            state,
            effects,
            subscriptions,
        }
    }

    /// A context that is not attached to any pipeline.
    ///
    /// Useful for calling `mutate` directly in unit tests.
    #[must_use]
    pub fn detached(state: S) -> Self {
        Self::new(
            StateCell::new(state),
            PublishRelay::new(),
            CompositeSubscription::new(),
        )
    }

    /// The latest folded state. Never blocks on the pipeline.
    #[must_use]
    pub fn current_state(&self) -> S {
        self.state.get()
    }

    /// Observe the effect channel this context emits into.
    #[must_use]
    pub fn effects(&self) -> BoxStream<'static, E> {
        self.effects.observe()
    }

    /// Emit one effect to current effect observers.
    ///
    /// Returns `false` if the reactor is torn down and the effect was dropped.
    pub fn emit_effect(&self, effect: E) -> bool {
        forward(&self.effects, effect)
    }

    /// Emit several effects, in order.
    pub fn emit_effects<I>(&self, effects: I)
    where
        I: IntoIterator<Item = E>,
    {
        for effect in effects {
            self.emit_effect(effect);
        }
    }

    /// Forward every effect produced by `effects` as it arrives.
    ///
    /// The forwarding task is tracked by the reactor's subscriptions and is
    /// aborted on teardown. Does nothing once the reactor is torn down.
    /// Must be called from within a Tokio runtime.
    pub fn emit_effect_stream(&self, mut effects: BoxStream<'static, E>) {
        if self.effects.is_closed() {
            tracing::trace!("Effect stream ignored, reactor is torn down");
            return;
        }

        let relay = self.effects.clone();
        let task = tokio::spawn(async move {
            while let Some(effect) = effects.next().await {
                if !forward(&relay, effect) {
                    break;
                }
            }
        });
        self.subscriptions.add(Subscription::task(task));
    }
}

fn forward<E: Clone + Send + 'static>(relay: &PublishRelay<E>, effect: E) -> bool {
    match relay.try_accept(effect) {
        Some(delivered) => {
            metrics::counter!("reactor_effects_emitted_total").increment(1);
            tracing::trace!(delivered, "Effect emitted");
            true
        },
        None => {
            tracing::trace!("Effect dropped, reactor is torn down");
            false
        },
    }
}

impl<S, E> Clone for Context<S, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            effects: self.effects.clone(),
            subscriptions: self.subscriptions.clone(),
        }
    }
}

impl<S, E> std::fmt::Debug for Context<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("effects", &self.effects)
            .field("subscriptions", &self.subscriptions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_detached_context_reads_state() {
        let ctx = Context::<u32, ()>::detached(7);
        assert_eq!(ctx.current_state(), 7);
    }

    #[tokio::test]
    async fn test_emit_effects_in_order() {
        let ctx = Context::<(), &str>::detached(());
        let mut effects = ctx.effects();

        ctx.emit_effects(["first", "second"]);

        assert_eq!(effects.next().await.unwrap(), "first");
        assert_eq!(effects.next().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_emit_effect_stream_is_forwarded_and_tracked() {
        let subscriptions = CompositeSubscription::new();
        let relay = PublishRelay::new();
        let ctx = Context::new(StateCell::new(()), relay.clone(), subscriptions.clone());
        let mut effects = ctx.effects();

        ctx.emit_effect_stream(stream::iter([1, 2, 3]).boxed());
        assert_eq!(subscriptions.len(), 1);

        assert_eq!(effects.next().await.unwrap(), 1);
        assert_eq!(effects.next().await.unwrap(), 2);
        assert_eq!(effects.next().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delayed_effect_stream_stops_on_clear() {
        let subscriptions = CompositeSubscription::new();
        let ctx = Context::new(StateCell::new(()), PublishRelay::new(), subscriptions.clone());
        let mut effects = ctx.effects();

        ctx.emit_effect_stream(
            async_stream::stream! {
                yield "now";
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                yield "never";
            }
            .boxed(),
        );

        assert_eq!(effects.next().await.unwrap(), "now");
        assert_eq!(subscriptions.clear(), 1);
        let pending = tokio::time::timeout(std::time::Duration::from_millis(20), effects.next()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_emit_after_close_is_ignored() {
        let subscriptions = CompositeSubscription::new();
        let relay = PublishRelay::<u8>::new();
        let ctx = Context::new(StateCell::new(()), relay.clone(), subscriptions.clone());

        assert!(ctx.emit_effect(0));
        relay.close();
        assert!(!ctx.emit_effect(1));
        ctx.emit_effect_stream(futures::stream::iter([2]).boxed());

        assert!(subscriptions.is_empty());
    }
}
