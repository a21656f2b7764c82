//! Polling helper for state that settles on a background task

use std::future::Future;
use std::time::Duration;

/// Poll `check` every 20ms until it holds, panicking after two seconds
pub async fn wait_for<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition never became true");
}
