//! Pool fairness under contention.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use warden_engine::ProcessPool;

#[tokio::test(flavor = "multi_thread")]
async fn two_slots_four_tasks() {
    let pool = ProcessPool::new(2);
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let begun = Instant::now();

    let mut handles = Vec::new();
    for i in 0..4usize {
        let pool = pool.clone();
        let running = running.clone();
        let peak = peak.clone();
        handles.push(tokio::spawn(async move {
            pool.execute(async move {
                let started_at = begun.elapsed();
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                (i, started_at)
            })
            .await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    let elapsed = begun.elapsed();

    // Submission identity survives the queue.
    let mut ids: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2, 3]);

    // Never more than two at once; two waves of ~100 ms each.
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert!(elapsed >= Duration::from_millis(195), "finished too fast: {elapsed:?}");

    // Two tasks started immediately, two only after a slot freed.
    let mut starts: Vec<Duration> = results.iter().map(|(_, at)| *at).collect();
    starts.sort_unstable();
    assert!(starts[1] < Duration::from_millis(50), "second task should start at once");
    assert!(starts[2] >= Duration::from_millis(90), "third task should wait for a slot");
}
