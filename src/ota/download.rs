//! Block download engine.
//!
//! ```text
//! begin ─▶ ┌─ request block i ─┬─ 200 ─▶ write ─▶ i += 1 ─┐
//!          │                   └─ fail ─▶ failed += 1 ────┤
//!          └──────────── while i < blocks ◀───────────────┘
//!                              │
//!                              ▼
//!                 end_and_validate ─▶ grace ─▶ reboot
//! ```
//!
//! The failed-attempt counter spans the whole download: a failure on any
//! block consumes the same budget. A storage write failure ends the download
//! at once and does not touch the budget.

use core::fmt;

use heapless::String;
use serde::Serialize;

use super::check::UpdateInfo;
use super::config::Config;
use super::identity::UUID_LEN;
use crate::network::Connect;
use crate::network::application::http::Client;
use crate::storage::error::Error as StorageError;
use crate::storage::ota::OtaStorage;
use crate::system::Delay;

/// Largest block size a storage backend may negotiate.
pub const MAX_BLOCK_SIZE: usize = 4096;

/// Capacity of a block request body.
pub const BLOCK_BODY_LEN: usize = 128;

/// Why a download ended without a committed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadError {
    /// The backend refused to open a session. No request was made.
    NotReady(StorageError),
    /// The backend asked for a block size of zero or above [`MAX_BLOCK_SIZE`].
    BlockSize(usize),
    /// A block request body did not fit.
    RequestBody,
    /// The failed-attempt budget ran out.
    RetriesExhausted {
        /// Block that was being fetched.
        block: usize,
        /// Failed attempts over the whole download.
        failed_attempts: u32,
    },
    /// The backend failed to store a block.
    Storage {
        /// Block that could not be written.
        block: usize,
        /// Backend error.
        error: StorageError,
    },
    /// The complete image did not validate; the running image stays.
    Validation(StorageError),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::NotReady(e) => write!(f, "storage not ready: {}", e),
            DownloadError::BlockSize(size) => write!(f, "unsupported block size {}", size),
            DownloadError::RequestBody => f.write_str("request body overflow"),
            DownloadError::RetriesExhausted {
                block,
                failed_attempts,
            } => write!(f, "gave up at block {} after {} failed attempts", block, failed_attempts),
            DownloadError::Storage { block, error } => {
                write!(f, "storing block {} failed: {}", block, error)
            }
            DownloadError::Validation(e) => write!(f, "image validation failed: {}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DownloadError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DownloadError::NotReady(e) => defmt::write!(f, "NotReady({})", e),
            DownloadError::BlockSize(size) => defmt::write!(f, "BlockSize({})", size),
            DownloadError::RequestBody => defmt::write!(f, "RequestBody"),
            DownloadError::RetriesExhausted {
                block,
                failed_attempts,
            } => defmt::write!(
                f,
                "RetriesExhausted {{ block: {}, failed_attempts: {} }}",
                block,
                failed_attempts
            ),
            DownloadError::Storage { block, error } => {
                defmt::write!(f, "Storage {{ block: {}, error: {} }}", block, error)
            }
            DownloadError::Validation(e) => defmt::write!(f, "Validation({})", e),
        }
    }
}

/// Summary of a completed download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadReport {
    /// Blocks written to storage.
    pub blocks: usize,
    /// Bytes written to storage.
    pub bytes: usize,
    /// Failed attempts absorbed by the budget.
    pub failed_attempts: u32,
}

#[derive(Serialize)]
struct BlockRequest<'a> {
    #[serde(rename = "targetFwUuid")]
    target: &'a str,
    offset: usize,
    #[serde(rename = "maxNumBytes")]
    max_num_bytes: usize,
}

/// Builds a block request body:
/// `{"targetFwUuid":"…","offset":N,"maxNumBytes":M}`.
pub fn build_block_body(
    target_uuid: &str,
    offset: usize,
    max_num_bytes: usize,
) -> Result<String<BLOCK_BODY_LEN>, DownloadError> {
    debug_assert!(target_uuid.len() <= UUID_LEN);
    let request = BlockRequest {
        target: target_uuid,
        offset,
        max_num_bytes,
    };
    serde_json_core::to_string(&request).map_err(|_| DownloadError::RequestBody)
}

/// Downloads images block by block into an [`OtaStorage`] backend.
///
/// Owns the only block buffer, so it is sized for [`MAX_BLOCK_SIZE`] plus
/// the NUL terminator the HTTP layer appends.
pub struct BlockDownloader {
    buffer: [u8; MAX_BLOCK_SIZE + 1],
}

impl fmt::Debug for BlockDownloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockDownloader")
            .field("capacity", &MAX_BLOCK_SIZE)
            .finish()
    }
}

impl Default for BlockDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDownloader {
    /// Creates a downloader with a zeroed buffer.
    pub const fn new() -> Self {
        Self {
            buffer: [0; MAX_BLOCK_SIZE + 1],
        }
    }

    /// Downloads `update` into `storage`, validates it and requests the
    /// reboot after `config.reboot_grace_ms`.
    ///
    /// The storage session is aborted on every failure after a successful
    /// `begin`. Returns only if the reboot request returns.
    pub fn download<N, S, D>(
        &mut self,
        client: &mut Client<N>,
        storage: &mut S,
        delay: &mut D,
        config: &Config<'_>,
        update: &UpdateInfo,
    ) -> Result<DownloadReport, DownloadError>
    where
        N: Connect,
        S: OtaStorage,
        D: Delay,
    {
        let block_size = storage.begin().map_err(|e| {
            let e: StorageError = e.into();
            error!("ota: storage not ready for update ({:?}), aborting", e);
            DownloadError::NotReady(e)
        })?;

        let result = self.fetch_blocks(client, storage, delay, config, update, block_size);
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                storage.abort();
                return Err(e);
            }
        };

        storage.end_and_validate().map_err(|e| {
            let e: StorageError = e.into();
            error!("ota: firmware validation failed: {:?}", e);
            DownloadError::Validation(e)
        })?;

        info!(
            "ota: update complete ({} bytes), rebooting in {} ms",
            report.bytes,
            config.reboot_grace_ms
        );
        delay.delay_ms(config.reboot_grace_ms);
        storage.reboot();
        Ok(report)
    }

    fn fetch_blocks<N, S, D>(
        &mut self,
        client: &mut Client<N>,
        storage: &mut S,
        delay: &mut D,
        config: &Config<'_>,
        update: &UpdateInfo,
        block_size: usize,
    ) -> Result<DownloadReport, DownloadError>
    where
        N: Connect,
        S: OtaStorage,
        D: Delay,
    {
        if block_size == 0 || block_size > MAX_BLOCK_SIZE {
            error!("ota: storage negotiated unsupported block size {}", block_size);
            return Err(DownloadError::BlockSize(block_size));
        }
        let path = config.block_path().map_err(|_| DownloadError::RequestBody)?;

        if let Some(partitions) = storage.partition_info() {
            info!(
                "ota: running from {}, writing to {} ({} bytes free)",
                partitions.running,
                partitions.next,
                partitions.capacity
            );
        }

        let num_blocks = update.firmware_size.div_ceil(block_size);
        info!(
            "ota: starting download of {} bytes ({} blocks)",
            update.firmware_size,
            num_blocks
        );

        let buffer = &mut self.buffer[..=block_size];
        let mut report = DownloadReport::default();

        while report.blocks < num_blocks {
            let block = report.blocks;
            info!("ota: downloading block {} / {}", block + 1, num_blocks);

            let body = build_block_body(&update.target_uuid, block * block_size, block_size)?;

            match client.post_json(&path, &body, buffer) {
                Ok(response) if response.is_ok() => {
                    if let Err(e) = storage.write_block(response.body(buffer)) {
                        let error: StorageError = e.into();
                        error!("ota: storage failed to write block {} ({:?}), aborting", block, error);
                        return Err(DownloadError::Storage { block, error });
                    }
                    report.blocks += 1;
                    report.bytes += response.content_length;
                }
                Ok(response) => {
                    warn!(
                        "ota: block {} returned status {}, will retry",
                        block,
                        response.status_code
                    );
                    report.failed_attempts += 1;
                }
                Err(e) => {
                    warn!("ota: failed to get block {} ({:?}), will retry", block, e);
                    report.failed_attempts += 1;
                }
            }

            if report.failed_attempts >= config.max_failed_attempts {
                error!(
                    "ota: {} failed attempts, aborting download",
                    report.failed_attempts
                );
                return Err(DownloadError::RetriesExhausted {
                    block: report.blocks,
                    failed_attempts: report.failed_attempts,
                });
            }

            if config.interblock_delay_ms > 0 {
                delay.delay_ms(config.interblock_delay_ms);
            }
        }

        Ok(report)
    }
}
