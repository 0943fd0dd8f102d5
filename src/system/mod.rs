//! System services the agent borrows from its host.
//!
//! The agent runs on a single cooperative execution context and only ever
//! yields at three points: between polls, between blocks, and during the
//! grace period before a reboot. Those suspension points, the monotonic time
//! base used for the polling cadence, and the final reset are provided by
//! the board through the traits below.
//!
//! # Usage
//!
//! ```rust
//! use libota::system::{Clock, Delay};
//!
//! struct Ticks(u64);
//!
//! impl Clock for Ticks {
//!     fn now_ms(&self) -> u64 {
//!         self.0
//!     }
//! }
//!
//! impl Delay for Ticks {
//!     fn delay_ms(&mut self, ms: u32) {
//!         self.0 += u64::from(ms);
//!     }
//! }
//!
//! let mut t = Ticks(0);
//! t.delay_ms(250);
//! assert_eq!(t.now_ms(), 250);
//! ```

/// Blocking sleep that yields the execution context.
pub trait Delay {
    /// Suspends the caller for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Monotonic millisecond time base.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary, fixed origin.
    fn now_ms(&self) -> u64;
}

/// Device reset.
pub trait Reset {
    /// Restarts the device. Implementations normally never return.
    fn reset(&mut self);
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Host implementations for Linux-class devices.
#[cfg(feature = "std")]
pub mod host {
    use std::time::{Duration, Instant};

    /// [`Clock`](super::Clock) backed by [`Instant`].
    #[derive(Debug, Clone, Copy)]
    pub struct StdClock {
        origin: Instant,
    }

    impl StdClock {
        /// Starts the time base at zero now.
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
            }
        }
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl super::Clock for StdClock {
        fn now_ms(&self) -> u64 {
            self.origin.elapsed().as_millis() as u64
        }
    }

    /// [`Delay`](super::Delay) backed by [`std::thread::sleep`].
    #[derive(Debug, Default, Clone, Copy)]
    pub struct StdDelay;

    impl super::Delay for StdDelay {
        fn delay_ms(&mut self, ms: u32) {
            std::thread::sleep(Duration::from_millis(u64::from(ms)));
        }
    }
}
