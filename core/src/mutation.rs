//! Mutation streams and constructors for them.
//!
//! [`Reactor::mutate`](crate::reactor::Reactor::mutate) returns a
//! [`MutationStream`]: zero or more mutations, possibly produced
//! asynchronously. An `Err` item ends the stream for that action only.
//!
//! # Example
//!
//! ```
//! use rxreactor_core::mutation::{self, MutationStream};
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! enum Mutation {
//!     SetBusy(bool),
//!     SetResult(u32),
//! }
//!
//! fn load() -> MutationStream<Mutation> {
//!     mutation::concat([
//!         mutation::just(Mutation::SetBusy(true)),
//!         mutation::delayed(Duration::from_millis(10), Mutation::SetResult(42)),
//!         mutation::just(Mutation::SetBusy(false)),
//!     ])
//! }
//! ```

use crate::error::ReactorError;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use std::future::Future;
use std::time::Duration;

/// Stream of mutations derived from a single action.
pub type MutationStream<M> = BoxStream<'static, Result<M, ReactorError>>;

/// A stream that completes without producing any mutation.
#[must_use]
pub fn empty<M: Send + 'static>() -> MutationStream<M> {
    stream::empty().boxed()
}

/// A stream producing exactly one mutation.
#[must_use]
pub fn just<M: Send + 'static>(mutation: M) -> MutationStream<M> {
    stream::once(future::ready(Ok(mutation))).boxed()
}

/// A stream producing every mutation of `mutations`, in order.
#[must_use]
pub fn from_iter<M, I>(mutations: I) -> MutationStream<M>
where
    M: Send + 'static,
    I: IntoIterator<Item = M>,
    I::IntoIter: Send + 'static,
{
    stream::iter(mutations.into_iter().map(Ok)).boxed()
}

/// A stream that fails immediately with `error`.
#[must_use]
pub fn fail<M: Send + 'static>(error: ReactorError) -> MutationStream<M> {
    stream::once(future::ready(Err(error))).boxed()
}

/// A stream producing the single result of an async computation.
#[must_use]
pub fn from_future<M, F>(future: F) -> MutationStream<M>
where
    M: Send + 'static,
    F: Future<Output = Result<M, ReactorError>> + Send + 'static,
{
    stream::once(future).boxed()
}

/// A stream producing `mutation` after `duration` has elapsed.
#[must_use]
pub fn delayed<M: Send + 'static>(duration: Duration, mutation: M) -> MutationStream<M> {
    from_future(async move {
        tokio::time::sleep(duration).await;
        Ok(mutation)
    })
}

/// Runs `streams` one after another.
///
/// An error in one of them ends the whole concatenation once the pipeline
/// sees it, exactly like any other error item.
#[must_use]
pub fn concat<M, I>(streams: I) -> MutationStream<M>
where
    M: Send + 'static,
    I: IntoIterator<Item = MutationStream<M>>,
{
    let streams: Vec<MutationStream<M>> = streams.into_iter().collect();
    stream::iter(streams).flatten().boxed()
}
