use anyhow::{Result, anyhow};
use error_notifier::{clients::retry::RetryManager, models::retry::RetryConfig};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU32, Ordering},
};
use tokio::time::Instant;

/// Scheduling slack allowed on top of a nominal delay, in milliseconds.
const TOLERANCE_MS: u128 = 5;

fn assert_delays(actual: &[u128], expected: &[u128]) {
    assert_eq!(actual.len(), expected.len(), "unexpected attempt count");
    for (actual, expected) in actual.iter().zip(expected) {
        assert!(
            *actual >= *expected && *actual <= expected + TOLERANCE_MS,
            "Delay {} should be approximately {}",
            actual,
            expected
        );
    }
}

fn config(max_attempts: u32, jitter: bool) -> RetryConfig {
    RetryConfig {
        max_attempts,
        base_delay_ms: 100,
        max_delay_ms: 1000,
        jitter,
    }
}

/// Test: Successful operations complete without retry
#[tokio::test(start_paused = true)]
async fn test_successful_operation_no_retry() -> Result<()> {
    let manager = RetryManager::new("test", config(3, false));

    let attempt_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempt_count);

    let result = manager
        .execute(|| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>("success")
            }
        })
        .await?;

    assert_eq!(result, "success");
    assert_eq!(
        attempt_count.load(Ordering::SeqCst),
        1,
        "Should only attempt once"
    );

    Ok(())
}

/// Test: Two failures then a success stops at the third attempt
#[tokio::test(start_paused = true)]
async fn test_success_short_circuits_retries() -> Result<()> {
    let manager = RetryManager::new("test", config(3, false));

    let attempt_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempt_count);

    let result = manager
        .execute(|| {
            let counter = Arc::clone(&counter);
            async move {
                let attempts = counter.fetch_add(1, Ordering::SeqCst);

                // Fail first 2 attempts, succeed on 3rd
                if attempts < 2 {
                    Err(anyhow!("Transient error"))
                } else {
                    Ok("success")
                }
            }
        })
        .await?;

    assert_eq!(result, "success");
    assert_eq!(
        attempt_count.load(Ordering::SeqCst),
        3,
        "Should retry 2 times then succeed"
    );
    assert_eq!(manager.consecutive_failures(), 0);

    Ok(())
}

/// Test: Permanent failures exhaust retries and surface the last error
#[tokio::test(start_paused = true)]
async fn test_permanent_failure_exhausts_retries() -> Result<()> {
    let manager = RetryManager::new("test", config(3, false));

    let attempt_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempt_count);

    let result = manager
        .execute(|| {
            let counter = Arc::clone(&counter);
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(anyhow!("Permanent failure {}", attempt))
            }
        })
        .await;

    let error = result.expect_err("Should fail after max attempts");
    assert_eq!(error.to_string(), "Permanent failure 2");
    assert_eq!(
        attempt_count.load(Ordering::SeqCst),
        3,
        "Should attempt exactly max_attempts times"
    );

    Ok(())
}

/// Test: on_retry sees every failed attempt with a 1-based index
#[tokio::test(start_paused = true)]
async fn test_on_retry_receives_attempt_numbers() -> Result<()> {
    let manager = RetryManager::new("test", config(4, false));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);

    let _ = manager
        .execute_with_retry(
            || async { Err::<(), _>(anyhow!("nope")) },
            |attempt, e| recorder.lock().unwrap().push((attempt, e.to_string())),
        )
        .await;

    let seen = seen.lock().unwrap();
    let attempts: Vec<u32> = seen.iter().map(|(a, _)| *a).collect();
    assert_eq!(attempts, vec![1, 2, 3, 4]);
    assert!(seen.iter().all(|(_, e)| e == "nope"));

    Ok(())
}

/// Test: Retry delays follow exponential backoff
#[tokio::test(start_paused = true)]
async fn test_exponential_backoff_timing() -> Result<()> {
    let manager = RetryManager::new("test", config(4, false));

    let start = Instant::now();
    let attempt_times = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    let times = Arc::clone(&attempt_times);

    let _ = manager
        .execute(|| {
            let times = Arc::clone(&times);
            async move {
                let elapsed = start.elapsed().as_millis();
                times.lock().await.push(elapsed);
                Err::<String, _>(anyhow!("Fail"))
            }
        })
        .await;

    let times = attempt_times.lock().await;

    assert_eq!(times.len(), 4);
    assert!(times[0] < TOLERANCE_MS, "First attempt should be immediate");

    let delays: Vec<u128> = times.windows(2).map(|w| w[1] - w[0]).collect();
    assert_delays(&delays, &[100, 200, 400]);

    for pair in delays.windows(2) {
        assert!(pair[1] >= pair[0], "Backoff should never shrink");
    }

    Ok(())
}

/// Test: Max delay cap is respected
#[tokio::test(start_paused = true)]
async fn test_max_delay_cap_respected() -> Result<()> {
    let manager = RetryManager::new(
        "test",
        RetryConfig {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 300,
            jitter: false,
        },
    );

    let start = Instant::now();
    let attempt_times = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    let times = Arc::clone(&attempt_times);

    let _ = manager
        .execute(|| {
            let times = Arc::clone(&times);
            async move {
                times.lock().await.push(start.elapsed().as_millis());
                Err::<String, _>(anyhow!("Fail"))
            }
        })
        .await;

    let times = attempt_times.lock().await;
    let delays: Vec<u128> = times.windows(2).map(|w| w[1] - w[0]).collect();

    assert_delays(&delays, &[100, 200, 300, 300]);

    Ok(())
}

/// Test: Jitter keeps delays within 25% of the nominal backoff
#[tokio::test(start_paused = true)]
async fn test_jitter_applied_to_delays() -> Result<()> {
    let mut delays = Vec::new();

    for _ in 0..20 {
        let manager = RetryManager::new(
            "test",
            RetryConfig {
                max_attempts: 2,
                base_delay_ms: 200,
                max_delay_ms: 2000,
                jitter: true,
            },
        );

        let start = Instant::now();
        let attempt_times = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let times = Arc::clone(&attempt_times);

        let _ = manager
            .execute(|| {
                let times = Arc::clone(&times);
                async move {
                    times.lock().await.push(start.elapsed().as_millis());
                    Err::<String, _>(anyhow!("Fail"))
                }
            })
            .await;

        let times = attempt_times.lock().await;
        delays.push(times[1] - times[0]);
    }

    let min_delay = *delays.iter().min().unwrap();
    let max_delay = *delays.iter().max().unwrap();

    assert!(min_delay >= 150, "Delay {} below jitter floor", min_delay);
    assert!(max_delay <= 250 + TOLERANCE_MS, "Delay {} above jitter ceiling", max_delay);
    assert!(
        max_delay > min_delay,
        "Delays should vary due to jitter (min: {}, max: {})",
        min_delay,
        max_delay
    );

    Ok(())
}

/// Test: Retry behavior under concurrent operations
#[tokio::test(start_paused = true)]
async fn test_concurrent_retry_operations() -> Result<()> {
    let total_success = Arc::new(AtomicU32::new(0));
    let mut handles = vec![];

    for i in 0..10 {
        let success_counter = Arc::clone(&total_success);

        let handle = tokio::spawn(async move {
            let manager = RetryManager::new(format!("worker-{}", i), config(3, true));
            let attempt_count = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&attempt_count);

            let result = manager
                .execute(|| {
                    let counter = Arc::clone(&counter);
                    async move {
                        let attempts = counter.fetch_add(1, Ordering::SeqCst);

                        if i < 5 && attempts == 0 {
                            Err(anyhow!("First attempt fails"))
                        } else {
                            Ok("success")
                        }
                    }
                })
                .await;

            if result.is_ok() {
                success_counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        handles.push(handle);
    }

    futures_util::future::join_all(handles).await;

    assert_eq!(
        total_success.load(Ordering::SeqCst),
        10,
        "All concurrent operations should eventually succeed"
    );

    Ok(())
}
