//! A/B partition backend.
//!
//! Two equally sized image slots and a small boot record live on a single
//! storage device. The device boots from the slot named in the boot record
//! (slot 0 when no valid record exists); updates are always written to the
//! other slot. An image is only committed to the boot record after it has
//! been read back and its CRC-32 matched against the bytes that were
//! received, so a power cut or a flash fault mid-update leaves the running
//! image selected.
//!
//! ## Boot record layout
//!
//! Sixteen bytes, little endian:
//!
//! | offset | field                      |
//! |--------|----------------------------|
//! | 0      | magic `0x4F54_4142`        |
//! | 4      | slot index (0 or 1)        |
//! | 8      | image length in bytes      |
//! | 12     | CRC-32 (IEEE) of the image |

use crc32fast::Hasher;

use super::error::Error;
use super::ota::{OtaStorage, PartitionInfo};
use super::{BlockingErase, Region};
use crate::system::Reset;

/// Identifies a valid boot record.
pub const BOOT_RECORD_MAGIC: u32 = 0x4F54_4142;

/// Size of the serialized boot record.
pub const BOOT_RECORD_LEN: usize = 16;

const VERIFY_CHUNK: usize = 64;

/// A labelled address range on the storage device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Human readable name, reported by [`OtaStorage::partition_info`].
    pub label: &'static str,
    /// First address (inclusive).
    pub start: u32,
    /// Last address (exclusive).
    pub end: u32,
}

impl Region for Partition {
    fn start(&self) -> u32 {
        self.start
    }

    fn end(&self) -> u32 {
        self.end
    }
}

/// Where the two slots and the boot record sit on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionLayout {
    /// Image slots 0 and 1.
    pub slots: [Partition; 2],
    /// Address of the boot record.
    pub boot_record: u32,
}

impl PartitionLayout {
    fn boot_record_region(&self) -> Partition {
        Partition {
            label: "boot",
            start: self.boot_record,
            end: self.boot_record.saturating_add(BOOT_RECORD_LEN as u32),
        }
    }

    fn check(&self, capacity: usize) -> Result<(), Error> {
        let [a, b] = &self.slots;
        let boot = self.boot_record_region();

        if a.is_empty() || b.is_empty() || a.overlaps(b) {
            return Err(Error::InvalidLayout);
        }
        if boot.overlaps(a) || boot.overlaps(b) {
            return Err(Error::InvalidLayout);
        }
        for region in [a, b, &boot] {
            if region.end as usize > capacity {
                return Err(Error::InvalidLayout);
            }
        }
        Ok(())
    }
}

/// Decoded boot record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootRecord {
    /// Slot the device boots from.
    pub slot: usize,
    /// Length of the committed image.
    pub len: u32,
    /// CRC-32 of the committed image.
    pub crc: u32,
}

impl BootRecord {
    fn to_bytes(self) -> [u8; BOOT_RECORD_LEN] {
        let mut out = [0u8; BOOT_RECORD_LEN];
        out[0..4].copy_from_slice(&BOOT_RECORD_MAGIC.to_le_bytes());
        out[4..8].copy_from_slice(&(self.slot as u32).to_le_bytes());
        out[8..12].copy_from_slice(&self.len.to_le_bytes());
        out[12..16].copy_from_slice(&self.crc.to_le_bytes());
        out
    }

    fn from_bytes(raw: &[u8; BOOT_RECORD_LEN]) -> Option<Self> {
        let word = |i: usize| u32::from_le_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
        if word(0) != BOOT_RECORD_MAGIC {
            return None;
        }
        let slot = word(4) as usize;
        if slot > 1 {
            return None;
        }
        Some(Self {
            slot,
            len: word(8),
            crc: word(12),
        })
    }
}

struct Session {
    target: usize,
    written: u32,
    hasher: Hasher,
}

/// [`OtaStorage`] implemented over any erasable storage device.
///
/// # Examples
///
/// ```rust,no_run
/// use libota::storage::partition::{Partition, PartitionBackend, PartitionLayout};
/// # use libota::storage::{error::Error, BlockingErase, ReadStorage, Storage};
/// # struct Flash;
/// # impl ReadStorage for Flash {
/// #     type Error = Error;
/// #     fn read(&mut self, _o: u32, _b: &mut [u8]) -> Result<(), Error> { Ok(()) }
/// #     fn capacity(&self) -> usize { 0x20_0000 }
/// # }
/// # impl Storage for Flash {
/// #     fn write(&mut self, _o: u32, _b: &[u8]) -> Result<(), Error> { Ok(()) }
/// # }
/// # impl BlockingErase for Flash {
/// #     fn erase(&mut self, _f: u32, _t: u32) -> Result<(), Error> { Ok(()) }
/// # }
/// # struct Watchdog;
/// # impl libota::system::Reset for Watchdog { fn reset(&mut self) {} }
///
/// let layout = PartitionLayout {
///     slots: [
///         Partition { label: "ota_0", start: 0x01_0000, end: 0x10_0000 },
///         Partition { label: "ota_1", start: 0x10_0000, end: 0x1F_0000 },
///     ],
///     boot_record: 0x1F_0000,
/// };
/// let backend = PartitionBackend::new(Flash, Watchdog, layout, 512).unwrap();
/// ```
pub struct PartitionBackend<S: BlockingErase, R: Reset> {
    storage: S,
    reset: R,
    layout: PartitionLayout,
    block_size: usize,
    running: usize,
    session: Option<Session>,
    committed: Option<usize>,
}

impl<S: BlockingErase, R: Reset> core::fmt::Debug for PartitionBackend<S, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PartitionBackend")
            .field("layout", &self.layout)
            .field("block_size", &self.block_size)
            .field("running", &self.running)
            .field("in_session", &self.session.is_some())
            .field("committed", &self.committed)
            .finish()
    }
}

impl<S: BlockingErase, R: Reset> PartitionBackend<S, R> {
    /// Checks `layout` against the device and reads the boot record to find
    /// the running slot.
    pub fn new(storage: S, reset: R, layout: PartitionLayout, block_size: usize) -> Result<Self, Error> {
        layout.check(storage.capacity())?;
        if block_size == 0 || block_size > layout.slots[0].len().min(layout.slots[1].len()) as usize {
            return Err(Error::InvalidLayout);
        }

        let mut backend = Self {
            storage,
            reset,
            layout,
            block_size,
            running: 0,
            session: None,
            committed: None,
        };
        backend.running = backend.boot_record()?.map_or(0, |record| record.slot);
        debug!(
            "storage: booted from {}",
            backend.layout.slots[backend.running].label
        );
        Ok(backend)
    }

    /// Reads and decodes the boot record; `None` if none has been committed.
    pub fn boot_record(&mut self) -> Result<Option<BootRecord>, Error> {
        let mut raw = [0u8; BOOT_RECORD_LEN];
        self.storage
            .read(self.layout.boot_record, &mut raw)
            .map_err(Into::<Error>::into)?;
        Ok(BootRecord::from_bytes(&raw))
    }

    /// Index of the slot the device is running from.
    pub fn running_slot(&self) -> usize {
        self.running
    }

    /// Whether an update session is open.
    pub fn in_session(&self) -> bool {
        self.session.is_some()
    }

    /// Slot committed by the last successful update, until the device
    /// restarts into it. No new session can begin while this is set.
    pub fn committed_slot(&self) -> Option<usize> {
        self.committed
    }

    /// Shared access to the storage device.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Gives back the storage device and the reset handle.
    pub fn into_parts(self) -> (S, R) {
        (self.storage, self.reset)
    }

    fn target(&self) -> usize {
        1 - self.running
    }

    fn verify(&mut self, slot: Partition, len: u32) -> Result<u32, Error> {
        let mut hasher = Hasher::new();
        let mut chunk = [0u8; VERIFY_CHUNK];
        let mut offset = 0u32;
        while offset < len {
            let n = (len - offset).min(VERIFY_CHUNK as u32) as usize;
            self.storage
                .read(slot.start + offset, &mut chunk[..n])
                .map_err(Into::<Error>::into)?;
            hasher.update(&chunk[..n]);
            offset += n as u32;
        }
        Ok(hasher.finalize())
    }

    fn commit(&mut self, record: BootRecord) -> Result<(), Error> {
        let at = self.layout.boot_record;
        self.storage
            .erase(at, at + BOOT_RECORD_LEN as u32)
            .map_err(Into::<Error>::into)?;
        self.storage
            .write(at, &record.to_bytes())
            .map_err(Into::<Error>::into)?;
        Ok(())
    }
}

impl<S: BlockingErase, R: Reset> OtaStorage for PartitionBackend<S, R> {
    type Error = Error;

    fn begin(&mut self) -> Result<usize, Error> {
        if self.session.is_some() {
            warn!("storage: update session already open");
            return Err(Error::NotReady);
        }
        if let Some(committed) = self.committed {
            warn!(
                "storage: {} selected for next boot, waiting for restart",
                self.layout.slots[committed].label
            );
            return Err(Error::NotReady);
        }

        let target = self.target();
        let slot = self.layout.slots[target];
        info!("storage: erasing {} for new image", slot.label);
        self.storage
            .erase(slot.start, slot.end)
            .map_err(|e| {
                let e: Error = e.into();
                error!("storage: erase of {} failed: {:?}", slot.label, e);
                e
            })?;

        self.session = Some(Session {
            target,
            written: 0,
            hasher: Hasher::new(),
        });
        Ok(self.block_size)
    }

    fn write_block(&mut self, data: &[u8]) -> Result<(), Error> {
        let Some(session) = self.session.as_mut() else {
            return Err(Error::NotInitialized);
        };
        let slot = self.layout.slots[session.target];

        let len = data.len() as u32;
        if len as usize > self.block_size || session.written + len > slot.len() {
            error!(
                "storage: block of {} bytes at {} overflows {}",
                data.len(),
                session.written,
                slot.label
            );
            self.session = None;
            return Err(Error::OutOfBounds);
        }

        if let Err(e) = self.storage.write(slot.start + session.written, data) {
            let e: Error = e.into();
            error!("storage: write to {} failed: {:?}", slot.label, e);
            self.session = None;
            return Err(e);
        }

        session.hasher.update(data);
        session.written += len;
        trace!("storage: {} bytes in {}", session.written, slot.label);
        Ok(())
    }

    fn end_and_validate(&mut self) -> Result<(), Error> {
        let Some(session) = self.session.take() else {
            return Err(Error::NotInitialized);
        };
        let slot = self.layout.slots[session.target];

        if session.written == 0 {
            error!("storage: refusing to commit an empty image");
            return Err(Error::ValidationFailed);
        }

        let expected = session.hasher.finalize();
        let stored = self.verify(slot, session.written)?;
        if stored != expected {
            error!(
                "storage: {} read back crc {} but received {}",
                slot.label, stored, expected
            );
            return Err(Error::ValidationFailed);
        }

        self.commit(BootRecord {
            slot: session.target,
            len: session.written,
            crc: expected,
        })?;
        self.committed = Some(session.target);
        info!(
            "storage: {} validated ({} bytes), selected for next boot",
            slot.label, session.written
        );
        Ok(())
    }

    fn abort(&mut self) {
        if let Some(session) = self.session.take() {
            warn!(
                "storage: update of {} aborted after {} bytes",
                self.layout.slots[session.target].label, session.written
            );
        }
    }

    fn reboot(&mut self) {
        info!("storage: rebooting");
        self.reset.reset();
    }

    fn partition_info(&self) -> Option<PartitionInfo> {
        let next = self.layout.slots[self.target()];
        Some(PartitionInfo {
            running: self.layout.slots[self.running].label,
            next: next.label,
            capacity: next.len() as usize,
        })
    }
}
