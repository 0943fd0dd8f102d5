//! Storage contract for writing a firmware image.
//!
//! An update session is strictly linear:
//!
//! ```text
//! begin ──▶ write_block* ──▶ end_and_validate ──▶ reboot
//!   │            │
//!   └──── abort ◀┘
//! ```
//!
//! `begin` reports the block size the backend wants to be fed with; the
//! download engine then hands it consecutive blocks of at most that size in
//! ascending offset order. Once a session has been ended or aborted the
//! backend is ready for a new `begin`.

use super::error::Error;

/// Layout information a backend may expose for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionInfo {
    /// Label of the partition the device booted from.
    pub running: &'static str,
    /// Label of the partition the next image will be written to.
    pub next: &'static str,
    /// Largest image the next partition can hold, in bytes.
    pub capacity: usize,
}

#[cfg(feature = "defmt")]
impl defmt::Format for PartitionInfo {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "running={} next={} capacity={}",
            self.running,
            self.next,
            self.capacity
        )
    }
}

/// A destination for firmware images.
///
/// # Examples
///
/// ```rust
/// use libota::storage::error::Error;
/// use libota::storage::ota::OtaStorage;
///
/// /// Counts bytes instead of storing them.
/// #[derive(Default)]
/// struct Sink {
///     open: bool,
///     written: usize,
/// }
///
/// impl OtaStorage for Sink {
///     type Error = Error;
///
///     fn begin(&mut self) -> Result<usize, Error> {
///         self.open = true;
///         self.written = 0;
///         Ok(512)
///     }
///
///     fn write_block(&mut self, data: &[u8]) -> Result<(), Error> {
///         if !self.open {
///             return Err(Error::NotInitialized);
///         }
///         self.written += data.len();
///         Ok(())
///     }
///
///     fn end_and_validate(&mut self) -> Result<(), Error> {
///         self.open = false;
///         Ok(())
///     }
///
///     fn abort(&mut self) {
///         self.open = false;
///     }
///
///     fn reboot(&mut self) {}
/// }
///
/// let mut sink = Sink::default();
/// assert_eq!(sink.begin(), Ok(512));
/// sink.write_block(&[0xAA; 512]).unwrap();
/// sink.end_and_validate().unwrap();
/// assert_eq!(sink.written, 512);
/// ```
pub trait OtaStorage {
    /// Associated error type
    type Error: core::fmt::Debug + Into<Error>;

    /// Opens a new update session and returns the block size in bytes the
    /// backend expects for [`write_block`](Self::write_block).
    fn begin(&mut self) -> Result<usize, Self::Error>;

    /// Appends the next block of the image.
    ///
    /// Blocks arrive in ascending offset order; every block but the last is
    /// exactly the size returned by [`begin`](Self::begin).
    fn write_block(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Closes the session, validates the stored image and marks it as the
    /// next boot image.
    fn end_and_validate(&mut self) -> Result<(), Self::Error>;

    /// Discards the open session. A no-op when no session is open.
    fn abort(&mut self);

    /// Restarts the device into the newly validated image.
    fn reboot(&mut self);

    /// Running/next partition information, if the backend knows it.
    fn partition_info(&self) -> Option<PartitionInfo> {
        None
    }
}

impl<T: OtaStorage + ?Sized> OtaStorage for &mut T {
    type Error = T::Error;

    fn begin(&mut self) -> Result<usize, Self::Error> {
        (**self).begin()
    }

    fn write_block(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write_block(data)
    }

    fn end_and_validate(&mut self) -> Result<(), Self::Error> {
        (**self).end_and_validate()
    }

    fn abort(&mut self) {
        (**self).abort()
    }

    fn reboot(&mut self) {
        (**self).reboot()
    }

    fn partition_info(&self) -> Option<PartitionInfo> {
        (**self).partition_info()
    }
}
