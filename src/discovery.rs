use crate::device_ids::{AUDIOMOTH_USB_ID, DeviceSerial, SerialNumber};
use crate::transport::{HidHost, HidLink, RawDevice};
use log::debug;
use std::ffi::CString;
use thiserror::Error;

/// An attached microphone whose serial descriptor is in the expected format.
#[derive(Clone, Debug)]
pub struct Microphone {
    pub path: CString,
    pub serial: DeviceSerial,
}

/// Result of one enumeration pass.
#[derive(Debug, Default)]
pub struct Discovery {
    /// How many devices had the microphone's USB ID, conforming or not.
    pub attached: usize,
    pub microphones: Vec<Microphone>,
}

/// Enumerate attached microphones, dropping any whose serial descriptor can't be normalized.
pub fn discover(host: &impl HidHost) -> Discovery {
    let raw = host.enumerate(AUDIOMOTH_USB_ID);
    debug!("Found {} device(s) with USB ID {}", raw.len(), AUDIOMOTH_USB_ID);

    let microphones = raw
        .iter()
        .filter_map(|device| match identify(host, device) {
            Ok(mic) => Some(mic),
            Err(e) => {
                debug!("Skipping device at {:?}: {e}", device.path);
                None
            }
        })
        .collect();

    Discovery {
        attached: raw.len(),
        microphones,
    }
}

/// Get a device's serial descriptor and split it into its parts.
pub fn identify(host: &impl HidHost, device: &RawDevice) -> Result<Microphone, Error> {
    let descriptor =
        read_descriptor(host, device).ok_or_else(|| Error::NoSerial(device.path.clone()))?;

    match DeviceSerial::parse(&descriptor) {
        Some(serial) => Ok(Microphone {
            path: device.path.clone(),
            serial,
        }),
        None => Err(Error::NonConforming(descriptor)),
    }
}

/// Prefer the descriptor enumeration gave us. Failing that, open the device and ask it.
fn read_descriptor(host: &impl HidHost, device: &RawDevice) -> Option<String> {
    if let Some(ref serial) = device.serial {
        return Some(serial.clone());
    }

    debug!(
        "No serial descriptor for {:?} from enumeration; querying device",
        device.path
    );

    let open = match host.open(&device.path) {
        Ok(open) => open,
        Err(e) => {
            debug!("Couldn't open {:?}: {e}", device.path);
            return None;
        }
    };

    match open.serial_number() {
        Ok(serial) => serial,
        Err(e) => {
            debug!("Couldn't read serial number of {:?}: {e}", device.path);
            None
        }
    }
}

/// Pick the microphones a command should go to. With no requested IDs, that's all of them.
/// Otherwise each requested ID yields every microphone that matches it, or a single
/// [Error::NotFound] if none does.
pub fn select<'a>(
    microphones: &'a [Microphone],
    requested: &[SerialNumber],
) -> Vec<Result<&'a Microphone, Error>> {
    if requested.is_empty() {
        return microphones.iter().map(Ok).collect();
    }

    let mut targets = vec![];
    for serial in requested {
        let before = targets.len();
        targets.extend(
            microphones
                .iter()
                .filter(|mic| mic.serial.matches(serial))
                .map(Ok),
        );
        if targets.len() == before {
            targets.push(Err(Error::NotFound(serial.clone())));
        }
    }

    targets
}

/// Ways a device can fail to be found or recognized.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Could not find device ID {0}")]
    NotFound(SerialNumber),

    #[error("serial descriptor {0:?} is not in the expected format")]
    NonConforming(String),

    #[error("no serial descriptor available for device at {0:?}")]
    NoSerial(CString),
}
