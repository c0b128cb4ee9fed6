//! Device identity loaded from the address file.
//!
//! Each locker node learns who it is from a one-line file on local
//! storage, written once when the unit is provisioned. Everything the
//! controller discards as "not for me" is judged against this address, so
//! a node that cannot read it must not join the bus at all.

use std::path::Path;

use hasp_core::LockerAddress;
use tracing::info;

use crate::error::{DeviceError, Result};

/// Read this device's own locker address from `path`.
///
/// The file must contain exactly the address; surrounding whitespace
/// (including the trailing newline most editors add) is ignored.
///
/// # Errors
///
/// Returns [`DeviceError::AddressFile`] when the file cannot be read or
/// its content is not a valid locker address. Both are fatal at startup.
pub fn load_address(path: impl AsRef<Path>) -> Result<LockerAddress> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let raw = std::fs::read_to_string(path)
        .map_err(|e| DeviceError::address_file(&shown, e.to_string()))?;

    let address = LockerAddress::new(raw.trim())
        .map_err(|e| DeviceError::address_file(&shown, e.to_string()))?;

    info!(address = %address, file = %shown, "device identity loaded");
    Ok(address)
}
