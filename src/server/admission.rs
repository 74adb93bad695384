//! Bounded session admission

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Counting slots for concurrently running sessions.
///
/// Cloning shares the same slots.
#[derive(Debug, Clone)]
pub struct Admission {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl Admission {
    /// Create `capacity` slots
    pub fn new(capacity: usize) -> Self {
        Admission {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held by sessions
    pub fn in_use(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.semaphore.clone().acquire_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_admission_counts_slots() {
        let admission = Admission::new(2);
        assert_eq!(admission.capacity(), 2);
        assert_eq!(admission.in_use(), 0);

        let first = admission.acquire().await.unwrap();
        let second = admission.clone().acquire().await.unwrap();
        assert_eq!(admission.in_use(), 2);

        drop(first);
        assert_eq!(admission.in_use(), 1);
        drop(second);
        assert_eq!(admission.in_use(), 0);
    }

    #[tokio::test]
    async fn test_admission_waits_when_full() {
        let admission = Admission::new(1);
        let held = admission.acquire().await.unwrap();

        let waiting = tokio::time::timeout(Duration::from_millis(50), admission.acquire()).await;
        assert!(waiting.is_err());

        drop(held);
        let permit = tokio::time::timeout(Duration::from_millis(50), admission.acquire())
            .await
            .unwrap();
        assert!(permit.is_ok());
    }
}
