//! Device identity reported to the update service.

use core::fmt;

use heapless::String;

/// Length of a firmware or hardware UUID.
pub const UUID_LEN: usize = 36;

/// Longest accepted serial number.
pub const SERIAL_NUMBER_MAX_LEN: usize = 48;

/// Which identity field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    /// Firmware UUID missing, not 36 characters, or containing forbidden characters.
    InvalidFirmwareUuid,
    /// Hardware UUID not 36 characters or containing forbidden characters.
    InvalidHardwareUuid,
    /// Serial number empty, longer than 48 characters, or containing forbidden characters.
    InvalidSerialNumber,
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::InvalidFirmwareUuid => f.write_str("invalid firmware uuid"),
            IdentityError::InvalidHardwareUuid => f.write_str("invalid hardware uuid"),
            IdentityError::InvalidSerialNumber => f.write_str("invalid serial number"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IdentityError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            IdentityError::InvalidFirmwareUuid => defmt::write!(f, "InvalidFirmwareUuid"),
            IdentityError::InvalidHardwareUuid => defmt::write!(f, "InvalidHardwareUuid"),
            IdentityError::InvalidSerialNumber => defmt::write!(f, "InvalidSerialNumber"),
        }
    }
}

/// Printable ASCII that can be embedded in a JSON string verbatim.
fn is_plain(value: &str) -> bool {
    value
        .bytes()
        .all(|b| (b' '..=b'~').contains(&b) && b != b'"' && b != b'\\')
}

fn uuid(value: &str) -> Option<String<UUID_LEN>> {
    if value.len() != UUID_LEN || !is_plain(value) {
        return None;
    }
    String::try_from(value).ok()
}

/// Who is asking for updates.
///
/// Built once at start-up and never changed afterwards; the agent only
/// hands out shared references to it.
///
/// ```rust
/// use libota::ota::{DeviceIdentity, IdentityError};
///
/// let identity = DeviceIdentity::new("11111111-1111-1111-1111-111111111111", "SN-0042").unwrap();
/// assert_eq!(identity.serial_number(), "SN-0042");
/// assert_eq!(identity.hardware_uuid(), None);
///
/// assert_eq!(
///     DeviceIdentity::new("not-a-uuid", "SN-0042").unwrap_err(),
///     IdentityError::InvalidFirmwareUuid
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    firmware_uuid: String<UUID_LEN>,
    hardware_uuid: Option<String<UUID_LEN>>,
    serial_number: String<SERIAL_NUMBER_MAX_LEN>,
}

impl DeviceIdentity {
    /// Validates and copies the identity of the running firmware.
    pub fn new(firmware_uuid: &str, serial_number: &str) -> Result<Self, IdentityError> {
        let firmware_uuid = uuid(firmware_uuid).ok_or(IdentityError::InvalidFirmwareUuid)?;

        if serial_number.is_empty() || !is_plain(serial_number) {
            return Err(IdentityError::InvalidSerialNumber);
        }
        let serial_number = String::try_from(serial_number).map_err(|_| IdentityError::InvalidSerialNumber)?;

        Ok(Self {
            firmware_uuid,
            hardware_uuid: None,
            serial_number,
        })
    }

    /// Adds the optional hardware UUID.
    pub fn with_hardware_uuid(mut self, hardware_uuid: &str) -> Result<Self, IdentityError> {
        self.hardware_uuid = Some(uuid(hardware_uuid).ok_or(IdentityError::InvalidHardwareUuid)?);
        Ok(self)
    }

    /// UUID of the running firmware image.
    pub fn firmware_uuid(&self) -> &str {
        &self.firmware_uuid
    }

    /// UUID of the hardware revision, if configured.
    pub fn hardware_uuid(&self) -> Option<&str> {
        self.hardware_uuid.as_deref()
    }

    /// Device serial number.
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FW: &str = "11111111-1111-1111-1111-111111111111";
    const HW: &str = "abcdefab-cdef-abcd-efab-cdefabcdefab";

    #[test]
    fn accepts_full_identity() {
        let id = DeviceIdentity::new(FW, "SN1").unwrap().with_hardware_uuid(HW).unwrap();
        assert_eq!(id.firmware_uuid(), FW);
        assert_eq!(id.hardware_uuid(), Some(HW));
        assert_eq!(id.serial_number(), "SN1");
    }

    #[test]
    fn uuid_must_be_exactly_36_chars() {
        assert_eq!(DeviceIdentity::new(&FW[..35], "SN1"), Err(IdentityError::InvalidFirmwareUuid));
        assert_eq!(DeviceIdentity::new("", "SN1"), Err(IdentityError::InvalidFirmwareUuid));

        let mut long = String::<40>::try_from(FW).unwrap();
        long.push('1').unwrap();
        assert_eq!(DeviceIdentity::new(&long, "SN1"), Err(IdentityError::InvalidFirmwareUuid));

        let id = DeviceIdentity::new(FW, "SN1").unwrap();
        assert_eq!(id.with_hardware_uuid("short"), Err(IdentityError::InvalidHardwareUuid));
    }

    #[test]
    fn serial_number_is_bounded() {
        let max = [b'7'; SERIAL_NUMBER_MAX_LEN];
        let max = core::str::from_utf8(&max).unwrap();
        assert!(DeviceIdentity::new(FW, max).is_ok());

        let over = [b'7'; SERIAL_NUMBER_MAX_LEN + 1];
        let over = core::str::from_utf8(&over).unwrap();
        assert_eq!(DeviceIdentity::new(FW, over), Err(IdentityError::InvalidSerialNumber));
        assert_eq!(DeviceIdentity::new(FW, ""), Err(IdentityError::InvalidSerialNumber));
    }

    #[test]
    fn rejects_characters_that_would_break_the_request() {
        assert_eq!(DeviceIdentity::new(FW, "SN\"1"), Err(IdentityError::InvalidSerialNumber));
        assert_eq!(DeviceIdentity::new(FW, "SN\n1"), Err(IdentityError::InvalidSerialNumber));
        assert_eq!(
            DeviceIdentity::new("11111111-1111-1111-1111-11111111111\\", "SN1"),
            Err(IdentityError::InvalidFirmwareUuid)
        );
    }
}
