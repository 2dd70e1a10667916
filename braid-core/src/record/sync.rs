//! Counting semaphore for buffer handoff.

use parking_lot::{Condvar, Mutex};

/// A counting semaphore built on a mutex and condvar.
///
/// Used in binary mode for the two handoffs of the pipeline: a stream's
/// back-buffer availability permit, and the processor/writer exchange of
/// the global back buffer.
pub(crate) struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    pub(crate) fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Block until a permit is available, then take it.
    pub(crate) fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.available.wait(&mut permits);
        }
        *permits -= 1;
    }

    /// Return a permit and wake one waiter.
    pub(crate) fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn acquire_consumes_initial_permit() {
        let sem = Semaphore::new(1);
        sem.acquire();
        sem.release();
        sem.acquire();
    }

    #[test]
    fn acquire_blocks_until_release() {
        let sem = Arc::new(Semaphore::new(0));
        let releaser = Arc::clone(&sem);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            releaser.release();
        });

        sem.acquire();
        handle.join().unwrap();
    }

    #[test]
    fn permits_accumulate() {
        let sem = Semaphore::new(0);
        sem.release();
        sem.release();
        sem.acquire();
        sem.acquire();
    }
}
