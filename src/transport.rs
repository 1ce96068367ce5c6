use crate::device_ids::UsbId;
use hidapi::{HidApi, HidDevice, HidResult};
use std::ffi::{CStr, CString};

/// A device as reported by enumeration, before anything has been opened.
#[derive(Clone, Debug)]
pub struct RawDevice {
    pub path: CString,
    /// Serial descriptor, if enumeration was able to read one.
    pub serial: Option<String>,
}

/// Everything needed from the HID subsystem as a whole.
pub trait HidHost {
    type Link: HidLink;

    /// List attached devices with the given USB ID.
    fn enumerate(&self, id: UsbId) -> Vec<RawDevice>;

    /// Open a device by its enumeration path. The device is closed when the link is dropped.
    fn open(&self, path: &CStr) -> HidResult<Self::Link>;
}

/// Everything needed from one open device.
pub trait HidLink {
    /// Send an output report. `data[0]` is the report ID.
    fn write(&self, data: &[u8]) -> HidResult<usize>;

    /// Wait up to `timeout_ms` for an input report. Returns 0 on timeout.
    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> HidResult<usize>;

    /// Ask the device for its serial descriptor directly.
    fn serial_number(&self) -> HidResult<Option<String>>;
}

impl HidHost for HidApi {
    type Link = HidDevice;

    fn enumerate(&self, id: UsbId) -> Vec<RawDevice> {
        self.device_list()
            .filter(|d| d.vendor_id() == id.vid && d.product_id() == id.pid)
            .map(|d| RawDevice {
                path: d.path().to_owned(),
                // Some backends report a missing descriptor as an empty string.
                serial: d
                    .serial_number()
                    .filter(|s| !s.is_empty())
                    .map(ToOwned::to_owned),
            })
            .collect()
    }

    fn open(&self, path: &CStr) -> HidResult<HidDevice> {
        self.open_path(path)
    }
}

impl HidLink for HidDevice {
    fn write(&self, data: &[u8]) -> HidResult<usize> {
        HidDevice::write(self, data)
    }

    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> HidResult<usize> {
        HidDevice::read_timeout(self, buf, timeout_ms)
    }

    fn serial_number(&self) -> HidResult<Option<String>> {
        self.get_serial_number_string()
    }
}
