use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A small, blocking counting semaphore.
///
/// Bounds how many files are open (and hold a batch in memory) at once.
pub struct Semaphore {
    permits: Mutex<usize>,
    cv: Condvar,
}

impl Semaphore {
    /// `permits` must be > 0; callers validate this before constructing.
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits.max(1)),
            cv: Condvar::new(),
        }
    }

    /// Acquire one permit, blocking until available.
    ///
    /// Returns the time spent waiting (zero if no wait was required).
    pub fn acquire(&self) -> Duration {
        let start = Instant::now();
        let mut waited = false;
        let mut g = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        while *g == 0 {
            waited = true;
            g = self.cv.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
        *g -= 1;
        if waited { start.elapsed() } else { Duration::ZERO }
    }

    /// Release one permit.
    pub fn release(&self) {
        let mut g = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        *g += 1;
        self.cv.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::Semaphore;

    #[test]
    fn uncontended_acquire_does_not_wait() {
        let sem = Semaphore::new(2);
        assert_eq!(sem.acquire(), Duration::ZERO);
        assert_eq!(sem.acquire(), Duration::ZERO);
        sem.release();
        sem.release();
    }

    #[test]
    fn acquire_blocks_until_release() {
        let sem = Arc::new(Semaphore::new(1));
        sem.acquire();

        let releaser = {
            let sem = Arc::clone(&sem);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                sem.release();
            })
        };

        let waited = sem.acquire();
        releaser.join().unwrap();
        assert!(waited > Duration::ZERO);
    }
}
