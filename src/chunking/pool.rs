//! Bounded-width fan-out that keeps results in input order.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// In-flight analyses per request during chunked analysis.
pub const CHUNK_CONCURRENCY: usize = 5;

/// Run `work(index, item)` for every item with at most `width` running at
/// once, and wait for all of them.
///
/// Slot `i` of the result holds the output for item `i` regardless of
/// completion order. A slot is `None` only when its task panicked.
pub async fn run_bounded<I, T, F, Fut>(items: Vec<I>, width: usize, work: F) -> Vec<Option<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(usize, I) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let total = items.len();
    let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
    let semaphore = Arc::new(Semaphore::new(width.max(1)));
    let mut join_set = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                log::error!("Fan-out semaphore closed: {}", e);
                break;
            }
        };
        let fut = work(index, item);
        join_set.spawn(async move {
            let _permit = permit;
            (index, fut.await)
        });
    }

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, value)) => slots[index] = Some(value),
            Err(e) => log::warn!("Fan-out task failed: {}", e),
        }
    }

    let missing = slots.iter().filter(|s| s.is_none()).count();
    if missing > 0 {
        log::warn!("{} of {} fan-out tasks produced no result", missing, total);
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_follow_input_order() {
        let items: Vec<u64> = vec![30, 5, 20, 1];
        let out = run_bounded(items, 4, |index, delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            index * 10
        })
        .await;
        assert_eq!(out, vec![Some(0), Some(10), Some(20), Some(30)]);
    }

    #[tokio::test]
    async fn test_width_is_respected() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let out = run_bounded((0..12).collect::<Vec<usize>>(), 5, |_, _| {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;
        assert_eq!(out.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test]
    async fn test_panicking_unit_leaves_siblings_intact() {
        let out = run_bounded(vec![1, 2, 3], 2, |_, n| async move {
            if n == 2 {
                panic!("boom");
            }
            n
        })
        .await;
        assert_eq!(out, vec![Some(1), None, Some(3)]);
    }
}
