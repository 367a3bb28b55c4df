//! Single-flight guard
//!
//! At most one cycle runs at a time per scheduler. The flag is only ever
//! released by dropping the permit, so it is freed on success, failure,
//! unwinding and cancellation alike.

use std::sync::atomic::{AtomicBool, Ordering};

/// Per-scheduler mutual exclusion flag.
#[derive(Debug, Default)]
pub struct SingleFlightGuard {
    busy: AtomicBool,
}

impl SingleFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard if it is free.
    ///
    /// Returns `None` when a cycle is already in flight.
    pub fn try_acquire(&self) -> Option<FlightPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit { guard: self })
    }
}

/// Held for the duration of one cycle.
#[derive(Debug)]
pub struct FlightPermit<'a> {
    guard: &'a SingleFlightGuard,
}

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let guard = SingleFlightGuard::new();

        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let guard = SingleFlightGuard::new();
        let _permit = guard.try_acquire().unwrap();
        assert!(guard.try_acquire().is_none());
        assert!(guard.try_acquire().is_none());
    }

    #[test]
    fn test_released_on_unwind() {
        let guard = SingleFlightGuard::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = guard.try_acquire().unwrap();
            panic!("cycle blew up");
        }));
        assert!(result.is_err());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_contended_acquire_grants_one() {
        use std::sync::Arc;
        use std::sync::atomic::AtomicUsize;

        let guard = Arc::new(SingleFlightGuard::new());
        let granted = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                let granted = granted.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    if let Some(permit) = guard.try_acquire() {
                        granted.fetch_add(1, Ordering::SeqCst);
                        // Hold until everyone has tried
                        std::thread::sleep(std::time::Duration::from_millis(50));
                        drop(permit);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(granted.load(Ordering::SeqCst), 1);
    }
}
