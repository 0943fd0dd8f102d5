//! Update-check protocol.
//!
//! The device posts its identity to the check-in endpoint. The service
//! answers `200` with an empty body when the device is current, or with the
//! target image UUID immediately followed by the image size in decimal:
//!
//! ```text
//! 22222222-2222-2222-2222-222222222222000002048
//! └────────────── uuid (36) ─────────┘└─ size ┘
//! ```

use core::fmt;

use heapless::String;
use serde::Serialize;

use super::config::Config;
use super::identity::{DeviceIdentity, UUID_LEN};
use crate::network::Connect;
use crate::network::application::http::Client;
use crate::network::error::Error;

/// Capacity of the check-in request body.
pub const CHECK_BODY_LEN: usize = 192;

/// Most size digits the service sends.
pub const FW_SIZE_MAX_DIGITS: usize = 9;

/// Response buffer: UUID, separator, size digits and the NUL terminator.
pub const CHECK_RESPONSE_LEN: usize = UUID_LEN + 1 + FW_SIZE_MAX_DIGITS + 1;

/// Shortest body announcing an update: UUID, separator, one digit.
const MIN_AVAILABLE_LEN: usize = UUID_LEN + 2;

/// Why a check did not produce an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckError {
    /// The identity did not fit the request body.
    RequestBody,
    /// The round trip failed before a status code was read.
    Transport(Error),
    /// The service answered with a status other than 200.
    Status(u16),
    /// A 200 answer whose body is neither empty nor `<uuid><size>`.
    Malformed,
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::RequestBody => f.write_str("request body overflow"),
            CheckError::Transport(e) => write!(f, "transport: {}", e),
            CheckError::Status(code) => write!(f, "unexpected status {}", code),
            CheckError::Malformed => f.write_str("malformed response"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CheckError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            CheckError::RequestBody => defmt::write!(f, "RequestBody"),
            CheckError::Transport(e) => defmt::write!(f, "Transport({})", e),
            CheckError::Status(code) => defmt::write!(f, "Status({})", code),
            CheckError::Malformed => defmt::write!(f, "Malformed"),
        }
    }
}

/// An image the service wants the device to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    /// UUID of the new image.
    pub target_uuid: String<UUID_LEN>,
    /// Size of the new image in bytes.
    pub firmware_size: usize,
}

/// Result of one check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The running image is current.
    UpToDate,
    /// A different image is available.
    Available(UpdateInfo),
    /// The check failed; try again next period.
    Error(CheckError),
}

#[derive(Serialize)]
struct CheckRequest<'a> {
    #[serde(rename = "currFwUuid")]
    current_firmware: &'a str,
    #[serde(rename = "procSerialNum")]
    serial_number: &'a str,
    #[serde(rename = "hardwareUuid", skip_serializing_if = "Option::is_none")]
    hardware_uuid: Option<&'a str>,
}

/// Builds the check-in body, e.g.
/// `{"currFwUuid":"…","procSerialNum":"…"}`.
pub fn build_check_body(identity: &DeviceIdentity) -> Result<String<CHECK_BODY_LEN>, CheckError> {
    let request = CheckRequest {
        current_firmware: identity.firmware_uuid(),
        serial_number: identity.serial_number(),
        hardware_uuid: identity.hardware_uuid(),
    };
    serde_json_core::to_string(&request).map_err(|_| CheckError::RequestBody)
}

/// Turns a completed round trip into an outcome. The body is judged by its
/// shape, not only by the status code.
pub fn interpret_response(status_code: u16, body: &[u8]) -> CheckOutcome {
    if status_code != 200 {
        return CheckOutcome::Error(CheckError::Status(status_code));
    }
    if body.is_empty() {
        return CheckOutcome::UpToDate;
    }
    if body.len() < MIN_AVAILABLE_LEN {
        return CheckOutcome::Error(CheckError::Malformed);
    }

    let (uuid, size) = body.split_at(UUID_LEN);
    let Some(target_uuid) = core::str::from_utf8(uuid)
        .ok()
        .filter(|uuid| uuid.is_ascii())
        .and_then(|uuid| String::try_from(uuid).ok())
    else {
        return CheckOutcome::Error(CheckError::Malformed);
    };

    match parse_size(size) {
        Some(firmware_size) => CheckOutcome::Available(UpdateInfo {
            target_uuid,
            firmware_size,
        }),
        None => CheckOutcome::Error(CheckError::Malformed),
    }
}

/// Decimal size after optional leading whitespace. Zero is not a size.
fn parse_size(raw: &[u8]) -> Option<usize> {
    let start = raw.iter().position(|b| !b.is_ascii_whitespace())?;
    let digits = &raw[start..];
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let mut size: usize = 0;
    for d in digits {
        size = size.checked_mul(10)?.checked_add(usize::from(d - b'0'))?;
    }
    (size > 0).then_some(size)
}

/// Asks the service whether an update is available for `identity`.
pub fn check_for_update<N: Connect>(
    client: &mut Client<N>,
    config: &Config<'_>,
    identity: &DeviceIdentity,
) -> CheckOutcome {
    let body = match build_check_body(identity) {
        Ok(body) => body,
        Err(e) => return CheckOutcome::Error(e),
    };
    let path = match config.check_path() {
        Ok(path) => path,
        Err(_) => return CheckOutcome::Error(CheckError::RequestBody),
    };

    let mut response = [0u8; CHECK_RESPONSE_LEN];
    let outcome = match client.post_json(&path, &body, &mut response) {
        Ok(r) => interpret_response(r.status_code, r.body(&response)),
        Err(e) => CheckOutcome::Error(CheckError::Transport(e)),
    };

    match &outcome {
        CheckOutcome::UpToDate => info!("ota: firmware up to date"),
        CheckOutcome::Available(update) => info!(
            "ota: new firmware available: {} ({} bytes)",
            update.target_uuid.as_str(),
            update.firmware_size
        ),
        CheckOutcome::Error(CheckError::Status(code)) => {
            warn!("ota: check returned status {}, will retry later", code)
        }
        CheckOutcome::Error(e) => warn!("ota: update check failed: {:?}, will retry later", e),
    }
    outcome
}
