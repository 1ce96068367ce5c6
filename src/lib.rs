/// Parse the command-line token grammar into a validated [args::OperationRequest].
pub mod args;

/// Identify compatible devices and normalize their serial descriptors.
pub mod device_ids;

/// Enumerate attached microphones and match them against requested device IDs.
pub mod discovery;

/// Run a parsed request against the attached devices and report per-device outcomes.
pub mod dispatch;

/// Build command packets, exchange them with a device and verify the echoed response.
pub mod protocol;

/// Recording settings sent to the device, with their defaults and wire encoding.
pub mod settings;

/// The HID operations this crate needs, implemented for hidapi.
pub mod transport;
