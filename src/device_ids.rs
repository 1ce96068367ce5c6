use std::fmt::Display;

/// Vendor and product ID shared by every AudioMoth USB Microphone.
pub const AUDIOMOTH_USB_ID: UsbId = UsbId {
    vid: 0x16d0,
    pid: 0x06f3,
};

/// Number of hex digits in a device ID.
pub const SERIAL_NUMBER_LENGTH: usize = 16;

/// Offset of the device ID within the USB serial descriptor, just past the `_` separator.
pub const SERIAL_NUMBER_OFFSET: usize = 5;

const SERIAL_SEPARATOR: char = '_';

/// A USB vendor ID and product ID pair.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UsbId {
    pub vid: u16,
    pub pid: u16,
}

impl Display for UsbId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vid, self.pid)
    }
}

/// A device ID as typed by the user: exactly [SERIAL_NUMBER_LENGTH] hex digits, stored uppercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Accept `text` if it is a device ID in either case. Returns [None] otherwise.
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() == SERIAL_NUMBER_LENGTH && text.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(SerialNumber(text.to_ascii_uppercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SerialNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The parts of a conforming USB serial descriptor, which looks like `0384_24F3190361DA3D1B`: a
/// four-character sample rate in kHz, an underscore, then the 16-character device ID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceSerial {
    prefix: String,
    id: String,
}

impl DeviceSerial {
    /// Split a raw serial descriptor. Returns [None] if the first separator isn't where expected or
    /// the ID after it isn't exactly [SERIAL_NUMBER_LENGTH] characters long.
    pub fn parse(descriptor: &str) -> Option<Self> {
        let narrow = to_narrow(descriptor);

        if narrow.find(SERIAL_SEPARATOR)? != SERIAL_NUMBER_OFFSET - 1 {
            return None;
        }

        let id = &narrow[SERIAL_NUMBER_OFFSET..];
        if id.len() != SERIAL_NUMBER_LENGTH {
            return None;
        }

        Some(DeviceSerial {
            prefix: narrow[..SERIAL_NUMBER_OFFSET - 1].to_owned(),
            id: id.to_owned(),
        })
    }

    /// The device ID, as printed by `LIST` and compared against requested IDs.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The sample rate prefix with its leading zeros dropped, e.g. `384` for `0384`.
    pub fn frequency_label(&self) -> &str {
        self.prefix.trim_start_matches(|c: char| c <= '0')
    }

    pub fn matches(&self, serial: &SerialNumber) -> bool {
        self.id == serial.as_str()
    }
}

impl Display for DeviceSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} - {}kHz AudioMoth USB Microphone",
            self.id,
            self.frequency_label()
        )
    }
}

/// Replace every non-ASCII character with `?` so byte offsets and character offsets agree.
pub fn to_narrow(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}
