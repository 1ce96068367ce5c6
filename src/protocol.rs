use crate::settings::{self, ConfigSettings};
use crate::transport::{HidHost, HidLink};
use hidapi::HidError;
use log::{debug, trace};
use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::ffi::CStr;
use thiserror::Error;

/// Size of every input and output report, including the report ID byte.
pub const PACKET_SIZE: usize = 64;

/// How long to wait for the device to echo a command.
pub const READ_TIMEOUT_MS: i32 = 100;

// Byte 0 of an output report is the report ID, which the device doesn't see. Its echo therefore
// starts with our byte 1.
const MESSAGE_OFFSET: usize = 1;
const SETTINGS_OFFSET: usize = 2;

/// Commands understood by the microphone firmware, carried in byte 1 of each packet.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromPrimitive)]
pub enum MessageType {
    Configuration = 0x01,
    UpdateGain = 0x02,
    SetLed = 0x03,
    Restore = 0x04,
}

impl MessageType {
    fn carries_settings(self) -> bool {
        self != MessageType::Restore
    }

    /// Number of echoed bytes that must match what was sent.
    fn echo_len(self) -> usize {
        if self.carries_settings() {
            1 + settings::ENCODED_LEN
        } else {
            1
        }
    }
}

/// Assemble the output report for `message`. `settings` is ignored for [MessageType::Restore].
pub fn build_packet(message: MessageType, settings: &ConfigSettings) -> [u8; PACKET_SIZE] {
    let mut packet = [0u8; PACKET_SIZE];

    packet[MESSAGE_OFFSET] = message as u8;
    if message.carries_settings() {
        packet[SETTINGS_OFFSET..SETTINGS_OFFSET + settings::ENCODED_LEN]
            .copy_from_slice(&settings.encode());
    }

    packet
}

/// Send one command to the device at `path` and check that it was echoed back intact. The device
/// is opened for this exchange only and closed before returning.
pub fn send_command(
    host: &impl HidHost,
    path: &CStr,
    message: MessageType,
    settings: &ConfigSettings,
) -> Result<(), Error> {
    let packet = build_packet(message, settings);
    let mut response = [0u8; PACKET_SIZE];

    let received = {
        let device = host.open(path).map_err(|e| Error::DeviceIoError {
            source: e,
            action: "opening device",
        })?;

        let written = device.write(&packet).map_err(|e| Error::DeviceIoError {
            source: e,
            action: "sending command",
        })?;
        trace!("Sent {message:?} packet ({written} bytes): {packet:02x?}");

        device
            .read_timeout(&mut response, READ_TIMEOUT_MS)
            .map_err(|e| Error::DeviceIoError {
                source: e,
                action: "reading response",
            })?
    };

    trace!("Received {received} bytes: {response:02x?}");

    verify_echo(message, &packet, &response[..received]).map_err(Into::into)
}

/// Check a device's response against the packet that provoked it.
pub fn verify_echo(
    message: MessageType,
    sent: &[u8; PACKET_SIZE],
    received: &[u8],
) -> Result<(), ProtocolError> {
    match received.len() {
        0 => return Err(ProtocolError::Timeout(READ_TIMEOUT_MS)),
        PACKET_SIZE => {}
        actual => {
            return Err(ProtocolError::WrongLength {
                expected: PACKET_SIZE,
                actual,
            });
        }
    }

    let echoed = MessageType::try_from(received[0])
        .map_err(|e| ProtocolError::UnknownMessage(e.number))?;
    if echoed != message {
        return Err(ProtocolError::WrongMessage {
            expected: message,
            actual: echoed,
        });
    }

    let sent = &sent[MESSAGE_OFFSET..MESSAGE_OFFSET + message.echo_len()];
    let received = &received[..message.echo_len()];
    if let Some(offset) = sent.iter().zip(received).position(|(s, r)| s != r) {
        return Err(ProtocolError::EchoMismatch {
            offset,
            sent: sent[offset],
            received: received[offset],
        });
    }

    if message.carries_settings() {
        let mut echoed = [0u8; settings::ENCODED_LEN];
        echoed.copy_from_slice(&received[1..]);
        debug!("Device accepted {:?}", ConfigSettings::decode(&echoed));
    }

    Ok(())
}

/// All errors (protocol and I/O) that can happen while sending a command.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("HID protocol error")]
    ProtocolError(#[from] ProtocolError),

    #[error("USB transaction error while {action}")]
    DeviceIoError {
        source: HidError,
        action: &'static str,
    },
}

/// Failure modes that can happen even when all I/O succeeds.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProtocolError {
    #[error("device did not respond within {0} ms")]
    Timeout(i32),

    #[error("response from device was {actual} bytes, expected {expected}")]
    WrongLength { expected: usize, actual: usize },

    #[error("device replied with message type ({0}) that is not a known command")]
    UnknownMessage(u8),

    #[error("device replied to {expected:?} with {actual:?}")]
    WrongMessage {
        expected: MessageType,
        actual: MessageType,
    },

    #[error("echo differs at byte {offset}: sent {sent:#04x}, received {received:#04x}")]
    EchoMismatch { offset: usize, sent: u8, received: u8 },
}
