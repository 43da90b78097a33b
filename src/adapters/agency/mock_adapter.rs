//! Mock agency notifier for development and testing.
//!
//! Logs notifications instead of sending them. Failures are injected explicitly
//! rather than sampled at random, so error paths are reproducible.

use crate::domain::{ContentItem, DomainError, PointOfInterest};
use crate::ports::NotificationGateway;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// What the mock does on the next `notify` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyBehavior {
    Succeed,
    Fail,
    /// Fail this many calls, then succeed.
    FailTimes(u32),
}

/// Mock notifier. Records the content ids it accepted.
pub struct MockNotifier {
    behavior: Mutex<NotifyBehavior>,
    delivered: Mutex<Vec<i64>>,
    /// Simulated network delay in milliseconds.
    delay_ms: u64,
}

impl MockNotifier {
    /// Create a mock that always succeeds, without delay.
    pub fn new() -> Self {
        Self::with_behavior(NotifyBehavior::Succeed)
    }

    pub fn with_behavior(behavior: NotifyBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            delivered: Mutex::new(Vec::new()),
            delay_ms: 0,
        }
    }

    /// Add a simulated network delay.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub async fn set_behavior(&self, behavior: NotifyBehavior) {
        *self.behavior.lock().await = behavior;
    }

    /// Content ids notified successfully, in call order.
    pub async fn delivered(&self) -> Vec<i64> {
        self.delivered.lock().await.clone()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NotificationGateway for MockNotifier {
    async fn notify(&self, item: &ContentItem, poi: &PointOfInterest) -> Result<(), DomainError> {
        info!(
            content_id = item.id,
            poi_id = %poi.id,
            "[MOCK] Simulating agency notification"
        );

        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        let fail = {
            let mut behavior = self.behavior.lock().await;
            match *behavior {
                NotifyBehavior::Succeed => false,
                NotifyBehavior::Fail => true,
                NotifyBehavior::FailTimes(0) => false,
                NotifyBehavior::FailTimes(n) => {
                    *behavior = NotifyBehavior::FailTimes(n - 1);
                    true
                }
            }
        };
        if fail {
            return Err(DomainError::Notify("[MOCK] agency unreachable".into()));
        }

        self.delivered.lock().await.push(item.id);
        Ok(())
    }
}
