//! Store runtime for wiring a reactor into a running pipeline.

use crate::metrics::ReactorMetrics;
use crate::pipeline;
use crate::{ReactorConfig, StoreError};
use futures::stream::{BoxStream, StreamExt};
use rxreactor_core::{
    CompositeSubscription, Context, PublishRelay, Reactor, ReplayRelay, StateCell, Subscription,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::Instrument;

/// Lifecycle of a store.
///
/// The only transition is `Connected` → `TornDown`, triggered by
/// [`Store::clear_subscriptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Pipeline wired, accepting actions, publishing state
    Connected,

    /// Subscriptions released; actions are accepted and ignored
    TornDown,
}

/// The Store - runtime host for a reactor
///
/// The Store manages:
/// 1. The action intake (unbounded, `submit` never blocks)
/// 2. The pipeline task deriving, folding and publishing state
/// 3. The current state (read synchronously, never stale)
/// 4. The state relay (replay depth 1) and effect relay (replay depth 0)
/// 5. Every subscription created while wiring, released on teardown
///
/// The pipeline is wired eagerly: a store is `Connected` as soon as
/// construction returns, so observers attached before the first action still
/// receive the initial state.
///
/// Clones share the same pipeline.
///
/// # Example
///
/// ```ignore
/// let store = Store::new(LoginReactor::new(contacts), LoginState::default());
///
/// let mut states = store.observe_state();
/// let mut effects = store.observe_effect();
///
/// store.submit(LoginAction::UsernameChanged("joe@example.com".into()));
/// store.submit(LoginAction::Login);
/// ```
pub struct Store<R: Reactor> {
    reactor: Arc<R>,
    name: Arc<str>,
    actions: mpsc::UnboundedSender<R::Action>,
    cell: StateCell<R::State>,
    context: Context<R::State, R::Effect>,
    states: ReplayRelay<R::State>,
    subscriptions: CompositeSubscription,
    torn_down: Arc<AtomicBool>,
}

impl<R: Reactor> Store<R> {
    /// Create a store and connect its pipeline on the current Tokio runtime
    ///
    /// Uses [`ReactorConfig::default`].
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn new(reactor: R, initial_state: R::State) -> Self {
        Self::connect(&Handle::current(), reactor, initial_state, ReactorConfig::default())
    }

    /// Create a store with a custom configuration on the current Tokio runtime
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if `config` does not validate.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn with_config(
        reactor: R,
        initial_state: R::State,
        config: ReactorConfig,
    ) -> Result<Self, StoreError> {
        config.validate()?;
        Ok(Self::connect(&Handle::current(), reactor, initial_state, config))
    }

    /// Create a store whose pipeline runs on the runtime behind `handle`
    ///
    /// Every stage, including publication of each state, executes on that
    /// runtime. Useful when states must be produced on a dedicated (e.g. UI)
    /// runtime while actions are submitted from anywhere.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if `config` does not validate.
    pub fn spawn_on(
        handle: &Handle,
        reactor: R,
        initial_state: R::State,
        config: ReactorConfig,
    ) -> Result<Self, StoreError> {
        config.validate()?;
        Ok(Self::connect(handle, reactor, initial_state, config))
    }

    fn connect(
        handle: &Handle,
        reactor: R,
        initial_state: R::State,
        config: ReactorConfig,
    ) -> Self {
        let reactor = Arc::new(reactor);
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let cell = StateCell::new(initial_state.clone());
        let states = ReplayRelay::new();
        let effects = PublishRelay::new();
        let subscriptions = CompositeSubscription::new();
        let context = Context::new(cell.clone(), effects.clone(), subscriptions.clone());

        let pipeline = pipeline::state_stream(&reactor, action_rx, initial_state, context.clone());
        let span = tracing::debug_span!("reactor", name = %config.name);
        let driver = handle.spawn(publish(pipeline, cell.clone(), states.clone()).instrument(span));

        // Disposed in insertion order: stop the pipeline, then close the outputs.
        subscriptions.add(Subscription::task(driver));
        let (state_out, effect_out) = (states.clone(), effects);
        subscriptions.add(Subscription::from_fn(move || {
            state_out.close();
            effect_out.close();
            Ok(())
        }));

        tracing::debug!(name = %config.name, "Reactor pipeline connected");

        Self {
            reactor,
            name: Arc::from(config.name),
            actions: action_tx,
            cell,
            context,
            states,
            subscriptions,
            torn_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Submit an action for processing
    ///
    /// Never blocks. After teardown the action is silently ignored.
    pub fn submit(&self, action: R::Action) {
        if let Err(error) = self.try_submit(action) {
            tracing::debug!(reactor = %self.name, error = %error, "Action ignored");
        }
    }

    /// Submit an action, reporting whether the pipeline can still process it
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TornDown`] after [`clear_subscriptions`](Self::clear_subscriptions).
    pub fn try_submit(&self, action: R::Action) -> Result<(), StoreError> {
        if self.torn_down.load(Ordering::Acquire) {
            return Err(StoreError::TornDown);
        }
        self.actions.send(action).map_err(|_| StoreError::TornDown)?;
        ReactorMetrics::record_action();
        tracing::trace!(reactor = %self.name, "Action submitted");
        Ok(())
    }

    /// The latest folded state
    ///
    /// Updated before each state is published, so it is never behind what an
    /// observer has just received.
    #[must_use]
    pub fn current_state(&self) -> R::State {
        self.cell.get()
    }

    /// Read the current state via a closure, without cloning it
    ///
    /// ```ignore
    /// let busy = store.state(|s| s.is_busy);
    /// ```
    pub fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&R::State) -> T,
    {
        self.cell.with(f)
    }

    /// Observe states: the latest state first, then every new one
    ///
    /// Completes after teardown (yielding the last state once if observed
    /// after teardown).
    #[must_use]
    pub fn observe_state(&self) -> BoxStream<'static, R::State> {
        self.states.observe()
    }

    /// Observe effects emitted from now on
    ///
    /// Effects emitted before this call are never delivered to this observer.
    /// Passes through the reactor's `transform_effect`.
    #[must_use]
    pub fn observe_effect(&self) -> BoxStream<'static, R::Effect> {
        self.reactor.transform_effect(self.context.effects())
    }

    /// Emit an effect from outside the reactor
    ///
    /// Ignored after teardown.
    pub fn emit_effect(&self, effect: R::Effect) {
        self.context.emit_effect(effect);
    }

    /// Current lifecycle
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        if self.torn_down.load(Ordering::Acquire) {
            Lifecycle::TornDown
        } else {
            Lifecycle::Connected
        }
    }

    /// Number of live internal subscriptions
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Release every internal subscription
    ///
    /// Stops the pipeline and completes every state and effect observer.
    /// Idempotent: later calls do nothing. Never fails; a subscription that
    /// fails to dispose is logged and the others are still released.
    pub fn clear_subscriptions(&self) {
        if !self.torn_down.swap(true, Ordering::AcqRel) {
            tracing::debug!(reactor = %self.name, "Tearing down reactor");
        }
        let released = self.subscriptions.clear();
        tracing::trace!(reactor = %self.name, released, "Subscriptions cleared");
    }
}

impl<R: Reactor> Clone for Store<R> {
    fn clone(&self) -> Self {
        Self {
            reactor: Arc::clone(&self.reactor),
            name: Arc::clone(&self.name),
            actions: self.actions.clone(),
            cell: self.cell.clone(),
            context: self.context.clone(),
            states: self.states.clone(),
            subscriptions: self.subscriptions.clone(),
            torn_down: Arc::clone(&self.torn_down),
        }
    }
}

impl<R: Reactor> std::fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("lifecycle", &self.lifecycle())
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}

/// Drive the state stream, updating the cell before each publication.
async fn publish<S>(mut states: BoxStream<'static, S>, cell: StateCell<S>, relay: ReplayRelay<S>)
where
    S: Clone + Send + Sync + 'static,
{
    while let Some(state) = states.next().await {
        cell.replace(state.clone());
        let delivered = relay.accept(state);
        ReactorMetrics::record_state();
        tracing::trace!(delivered, "State published");
    }
    tracing::debug!("State pipeline completed");
}
