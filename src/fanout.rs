// src/fanout.rs
// =============================================================================
// Bounded, order-preserving concurrent map.
//
// `buffer_unordered(limit)` keeps at most `limit` futures in flight and
// yields them as they finish. Each future carries its input index, and the
// result is written into a pre-sized slot at that index, so the output order
// always matches the input order no matter which request finishes first.
//
// Rust concepts:
// - Streams: futures::stream::iter turns an iterator into a Stream
// - Generic async closures: `F: Fn(T) -> Fut` where `Fut: Future`
// =============================================================================

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Maps `items` through `f` with at most `limit` calls in flight.
///
/// Returns one result per input, in input order. A `limit` of zero is
/// treated as one.
pub async fn map_ordered<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let n = items.len();
    let mut slots: Vec<Option<R>> = Vec::with_capacity(n);
    slots.resize_with(n, || None);

    let mut results = stream::iter(items.into_iter().enumerate().map(|(idx, item)| {
        let fut = f(item);
        async move { (idx, fut.await) }
    }))
    .buffer_unordered(limit.max(1));

    while let Some((idx, value)) = results.next().await {
        slots[idx] = Some(value);
    }

    // buffer_unordered drives every future to completion, so every slot is filled
    slots.into_iter().flatten().collect()
}
