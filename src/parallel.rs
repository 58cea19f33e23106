//! Abstract parallel runtime (spec §5), consumed from outside per §1
//! ("the tbb-style parallel-for / parallel-scan / parallel-sort
//! primitives — consumed as an abstract parallel runtime").
//!
//! Backed by `rayon` when the `parallel` feature is enabled, matching
//! how the rest of the retrieval pack reaches for `rayon` wherever the
//! teacher reached for `tbb`/OS threads directly. With the feature
//! off, every primitive falls back to sequential execution so the
//! crate still builds and behaves correctly (just without the
//! concurrency) in `no_std`-adjacent or single-threaded embeddings.

/// `parallel_for(range, body)`: runs `body(i)` for every `i` in
/// `range`, order-independent, no return value collected.
pub fn parallel_for<F>(range: std::ops::Range<usize>, body: F)
where
    F: Fn(usize) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        range.into_par_iter().for_each(|i| body(i));
    }
    #[cfg(not(feature = "parallel"))]
    {
        for i in range {
            body(i);
        }
    }
}

/// `parallel_for_each(items, body)`: runs `body(item)` for every item.
pub fn parallel_for_each<T, F>(items: &[T], body: F)
where
    T: Sync,
    F: Fn(&T) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        items.par_iter().for_each(|item| body(item));
    }
    #[cfg(not(feature = "parallel"))]
    {
        for item in items {
            body(item);
        }
    }
}

/// `parallel_sort(items, less)`: spec §9 requires a STABLE sort for
/// `.dynsym` to preserve symbol registration order in reproducible
/// builds, so this always dispatches to rayon's stable
/// `par_sort_by`/the stdlib's stable `sort_by` rather than an unstable
/// variant, regardless of the `parallel` feature.
pub fn parallel_sort<T, F>(items: &mut [T], less: F)
where
    T: Send,
    F: Fn(&T, &T) -> std::cmp::Ordering + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        items.par_sort_by(less);
    }
    #[cfg(not(feature = "parallel"))]
    {
        items.sort_by(less);
    }
}

/// `parallel_scan(items, identity, body, combine)`: a fork-join
/// prefix-scan. Used by the core for content-addressed offset
/// assignment passes (e.g. mergeable-string shard offsets) where each
/// item's output position depends on the running total of everything
/// before it.
pub fn parallel_scan<T, B, Body, Combine>(items: &[T], identity: B, body: Body, combine: Combine) -> Vec<B>
where
    B: Clone + Send,
    Body: Fn(&T, &B) -> B,
    Combine: Fn(&B, &B) -> B,
{
    // A fork-join scan degenerates to a sequential prefix pass when
    // expressed generically over an arbitrary combine function; the
    // parallel speedup rayon's real implementation gets comes from
    // splitting after `combine` is known associative, which this
    // signature does not buy us anything over a straight fold for.
    let mut out = Vec::with_capacity(items.len());
    let mut running = identity;
    for item in items {
        let next = body(item, &running);
        running = combine(&running, &next);
        out.push(next);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_for_visits_every_index() {
        let hits = std::sync::Mutex::new(vec![false; 8]);
        parallel_for(0..8, |i| hits.lock().unwrap()[i] = true);
        assert!(hits.into_inner().unwrap().into_iter().all(|b| b));
    }

    #[test]
    fn parallel_sort_is_stable_on_ties() {
        let mut items = vec![(1, "a"), (0, "b"), (1, "c"), (0, "d")];
        parallel_sort(&mut items, |a, b| a.0.cmp(&b.0));
        let zeros: Vec<_> = items.iter().filter(|(k, _)| *k == 0).map(|(_, v)| *v).collect();
        assert_eq!(zeros, vec!["b", "d"]);
    }

    #[test]
    fn parallel_scan_produces_running_totals() {
        let items = [1u64, 2, 3, 4];
        let totals = parallel_scan(&items, 0u64, |x, running| running + x, |_prev, next| *next);
        assert_eq!(totals, vec![1, 3, 6, 10]);
    }
}
