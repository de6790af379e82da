use std::time::Duration;

/// Fixed delays and the in-layer concurrency limit used to keep the upstream
/// request rate bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub chunk_delay: Duration,
    pub layer_delay: Duration,
    pub max_concurrent_windows: usize,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(1), 1)
    }
}

impl Pacing {
    pub fn new(chunk_delay: Duration, layer_delay: Duration, max_concurrent_windows: usize) -> Self {
        Self {
            chunk_delay,
            layer_delay,
            max_concurrent_windows: max_concurrent_windows.max(1),
        }
    }

    /// No delays at all; for tests and friendly upstreams.
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, 1)
    }

    pub const fn is_sequential(&self) -> bool {
        self.max_concurrent_windows <= 1
    }

    pub async fn pause_after_window(&self) {
        pause(self.chunk_delay).await;
    }

    pub async fn pause_between_layers(&self) {
        pause(self.layer_delay).await;
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
