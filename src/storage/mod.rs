//! # Storage abstraction layer for firmware images
//!
//! The update agent writes a new firmware image through the
//! [`OtaStorage`](ota::OtaStorage) contract: begin a session, append blocks,
//! end-and-validate (which also switches the boot image), or abort. A board
//! can implement that contract directly on top of its vendor OTA API, or use
//! the [`PartitionBackend`](partition::PartitionBackend) provided here, which
//! builds it from the generic device traits in this module.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │        Block Download Engine (ota)            │
//! └──────────────────────────────────────────────┘
//!                       │ begin / write_block / end_and_validate / abort
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │   OtaStorage  ◀── PartitionBackend (A/B)     │
//! └──────────────────────────────────────────────┘
//!                       │ read / write / erase
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │ ReadStorage + Storage + BlockingErase device │
//! │        (NOR flash, FRAM, RAM, ...)           │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Core Traits
//!
//! - [`ReadStorage`]: Read data from storage
//! - [`Storage`]: Read and write operations
//! - [`BlockingErase`]: Synchronous erase operations
//! - [`Region`]: Address range of a partition
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use libota::storage::{Storage, BlockingErase};
//!
//! fn rewrite_region<S: BlockingErase>(
//!     storage: &mut S,
//!     start_addr: u32,
//!     end_addr: u32,
//!     new_data: &[u8]
//! ) -> Result<(), S::Error> {
//!     storage.erase(start_addr, end_addr)?;
//!     storage.write(start_addr, new_data)?;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

/// Common error types for storage operations
pub mod error;

/// The storage-backend contract consumed by the download engine.
pub mod ota;

/// A/B partition backend over generic storage devices.
pub mod partition;


/// Re-exports of common traits for convenient importing
pub mod prelude {
    pub use super::ota::OtaStorage;
    pub use super::{BlockingErase, ReadStorage, Region, Storage};
}

/// A contiguous memory region with start and end boundaries.
///
/// # Examples
///
/// ```rust
/// use libota::storage::Region;
///
/// struct FlashRegion {
///     start: u32,
///     size: u32,
/// }
///
/// impl Region for FlashRegion {
///     fn start(&self) -> u32 {
///         self.start
///     }
///
///     fn end(&self) -> u32 {
///         self.start + self.size
///     }
/// }
///
/// let slot_a = FlashRegion { start: 0x1_0000, size: 0x10_0000 };
///
/// assert!(slot_a.contains(0x1_0000));
/// assert!(!slot_a.contains(0x11_0000));
/// assert_eq!(slot_a.len(), 0x10_0000);
/// ```
pub trait Region {
    /// Start address of the region (inclusive).
    fn start(&self) -> u32;

    /// End address of the region (exclusive).
    fn end(&self) -> u32;

    /// Check if an address is contained within this region.
    fn contains(&self, address: u32) -> bool {
        (address >= self.start()) && (address < self.end())
    }

    /// Size of the region in bytes.
    fn len(&self) -> u32 {
        self.end().saturating_sub(self.start())
    }

    /// True if the region spans no addresses.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the two regions share at least one address.
    fn overlaps<R: Region + ?Sized>(&self, other: &R) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }
}

/// Trait for reading data from storage devices.
///
/// # Examples
///
/// ```rust,no_run
/// use libota::storage::ReadStorage;
///
/// fn read_magic<S: ReadStorage>(storage: &mut S) -> Result<u32, S::Error> {
///     let mut magic = [0u8; 4];
///     storage.read(0, &mut magic)?;
///     Ok(u32::from_le_bytes(magic))
/// }
/// ```
pub trait ReadStorage {
    /// Associated error type for read operations
    type Error: core::fmt::Debug + Into<error::Error>;

    /// Read data from the storage device.
    ///
    /// Reads data from the specified offset into the provided buffer.
    /// The entire buffer will be filled unless an error occurs.
    ///
    /// # Errors
    ///
    /// - `OutOfBounds` if offset + buffer length exceeds device capacity
    /// - `ReadError` if hardware read operation fails
    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error>;

    /// Get the total capacity of the storage device in bytes.
    fn capacity(&self) -> usize;
}

/// Trait for storage devices that support both read and write operations.
pub trait Storage: ReadStorage {
    /// Write data to the storage device.
    ///
    /// Whether already-written locations can be overwritten without an
    /// erase depends on the technology; NOR flash cannot.
    ///
    /// # Errors
    ///
    /// - `OutOfBounds` if offset + data length exceeds device capacity
    /// - `WriteError` if hardware write operation fails
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Trait for storage devices that support erase operations.
pub trait BlockingErase: Storage {
    /// Erase a region of storage.
    ///
    /// Erases all data in `from..to`. After erasing, the region reads as
    /// `0xFF` bytes (flash memory convention).
    ///
    /// # Errors
    ///
    /// - `OutOfBounds` if the address range is invalid
    /// - `EraseError` if the hardware erase operation fails
    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error>;
}
