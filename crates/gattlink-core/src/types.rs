use crate::{Result, constants::ADDRESS_OCTETS, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// BLE device address (six hex octets, colon-separated).
///
/// Addresses are normalized to uppercase on construction so that registry
/// lookups and equality checks are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Create a new device address with validation.
    ///
    /// The input is trimmed and converted to uppercase before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` if the address is not of the form
    /// `XX:XX:XX:XX:XX:XX` with exactly six two-digit hex octets.
    ///
    /// # Examples
    ///
    /// ```
    /// use gattlink_core::DeviceAddress;
    ///
    /// let addr = DeviceAddress::new("aa:bb:cc:dd:ee:ff").unwrap();
    /// assert_eq!(addr.as_str(), "AA:BB:CC:DD:EE:FF");
    ///
    /// assert!(DeviceAddress::new("not-an-address").is_err());
    /// ```
    pub fn new(address: &str) -> Result<Self> {
        let address = address.trim().to_uppercase();

        let octets: Vec<&str> = address.split(':').collect();
        if octets.len() != ADDRESS_OCTETS {
            return Err(Error::InvalidAddress(format!(
                "expected {ADDRESS_OCTETS} octets, got {}",
                octets.len()
            )));
        }

        for octet in &octets {
            if octet.len() != 2 || !octet.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::InvalidAddress(format!("bad octet {octet:?}")));
            }
        }

        Ok(DeviceAddress(address))
    }

    /// Get the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeviceAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceAddress::new(s)
    }
}

/// A peripheral observed during scanning.
///
/// Immutable once observed; identity (and therefore registry membership)
/// is the address, not the advertised name or signal strength.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralDevice {
    /// Platform device address.
    pub address: DeviceAddress,

    /// Advertised name, if the peripheral resolves one.
    pub name: Option<String>,

    /// Received Signal Strength Indicator (dBm) at observation time.
    pub rssi: Option<i16>,
}

impl PeripheralDevice {
    /// Create a device record with no name or signal metadata.
    pub fn new(address: DeviceAddress) -> Self {
        Self {
            address,
            name: None,
            rssi: None,
        }
    }

    /// Set the advertised name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the observed signal strength.
    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }

    /// Whether the peripheral advertised a resolvable name.
    ///
    /// Unnamed peripherals are filtered out of the device registry.
    #[must_use]
    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }
}

impl fmt::Display for PeripheralDevice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.address, name),
            None => write!(f, "{}", self.address),
        }
    }
}
