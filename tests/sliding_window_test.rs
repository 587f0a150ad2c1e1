use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{sleep, Instant};

use crpt_client::error::CrptError;
use crpt_client::ratelimit::{SlidingWindowLimiter, TimeUnit, WindowConfig};

/// Largest number of timestamps falling inside any half-open interval of
/// length `window`.
fn max_in_any_window(mut times: Vec<Instant>, window: Duration) -> usize {
    times.sort();
    let mut max = 0;
    let mut start = 0;
    for end in 0..times.len() {
        while times[end].duration_since(times[start]) >= window {
            start += 1;
        }
        max = max.max(end - start + 1);
    }
    max
}

async fn admit_all(limiter: Arc<SlidingWindowLimiter>, callers: usize) -> Vec<Instant> {
    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                limiter.acquire().await.unwrap();
                Instant::now()
            })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .map(|handle| handle.unwrap())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_no_window_ever_exceeds_limit() {
    let window = Duration::from_millis(1000);
    let limiter = Arc::new(SlidingWindowLimiter::from_config(
        WindowConfig::with_duration(window, 4).unwrap(),
    ));

    let times = admit_all(limiter, 25).await;

    assert_eq!(times.len(), 25);
    assert_eq!(max_in_any_window(times, window), 4);
}

#[tokio::test(start_paused = true)]
async fn test_staggered_callers_respect_sliding_window() {
    let window = Duration::from_millis(500);
    let limiter = Arc::new(SlidingWindowLimiter::from_config(
        WindowConfig::with_duration(window, 3).unwrap(),
    ));

    let handles: Vec<_> = (0..12u64)
        .map(|i| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                sleep(Duration::from_millis(i * 70)).await;
                limiter.acquire().await.unwrap();
                Instant::now()
            })
        })
        .collect();

    let times: Vec<Instant> = join_all(handles)
        .await
        .into_iter()
        .map(|handle| handle.unwrap())
        .collect();

    assert!(max_in_any_window(times, window) <= 3);
}

#[tokio::test(start_paused = true)]
async fn test_single_permit_boundary() {
    let limiter = SlidingWindowLimiter::new(TimeUnit::Second, 1).unwrap();

    limiter.acquire().await.unwrap();
    let first = Instant::now();
    limiter.acquire().await.unwrap();

    assert!(Instant::now().duration_since(first) >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_waiter_among_others() {
    let limiter = Arc::new(SlidingWindowLimiter::new(TimeUnit::Second, 1).unwrap());
    limiter.acquire().await.unwrap();

    let patient = {
        let limiter = Arc::clone(&limiter);
        tokio::spawn(async move { limiter.acquire().await })
    };
    let impatient = {
        let limiter = Arc::clone(&limiter);
        tokio::spawn(async move {
            limiter
                .acquire_until(sleep(Duration::from_millis(200)))
                .await
        })
    };

    let impatient = impatient.await.unwrap();
    assert!(matches!(impatient, Err(CrptError::Interrupted)));
    assert_eq!(limiter.permits_in_use(), 1);

    patient.await.unwrap().unwrap();
    assert_eq!(limiter.permits_in_use(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_callers_on_real_clock() {
    let window = Duration::from_millis(200);
    let limiter = Arc::new(SlidingWindowLimiter::from_config(
        WindowConfig::with_duration(window, 5).unwrap(),
    ));
    let start = Instant::now();

    let times = admit_all(Arc::clone(&limiter), 20).await;

    // 20 admissions at 5 per window need at least three full windows.
    assert_eq!(times.len(), 20);
    assert!(start.elapsed() >= window * 3);
    assert!(limiter.permits_in_use() <= 5);

    // Timestamps are taken after acquire returns, so they may trail the
    // admission itself; narrowing the window absorbs that scheduling delay.
    let slack = Duration::from_millis(50);
    assert!(max_in_any_window(times, window - slack) <= 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_one_second_boundary_on_real_clock() {
    let limiter = SlidingWindowLimiter::new(TimeUnit::Second, 1).unwrap();

    let start = Instant::now();
    limiter.acquire().await.unwrap();
    limiter.acquire().await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(1000));
}
