use crate::args::{Operation, OperationRequest};
use crate::device_ids::DeviceSerial;
use crate::discovery::{self, Microphone};
use crate::protocol::{self, MessageType};
use crate::transport::HidHost;
use log::debug;
use std::fmt::Display;

/// What happened to one device, or to one requested device ID. Printed as it happens.
#[derive(Debug)]
pub enum Outcome {
    /// A conforming device seen by `LIST`.
    Listed(DeviceSerial),
    Sent {
        operation: Operation,
        id: String,
    },
    Failed {
        id: String,
        error: protocol::Error,
    },
    NotFound(discovery::Error),
    /// Nothing with the microphone's USB ID is attached, so there was nobody to send to.
    NoneAttached,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Outcome::Listed(serial) => write!(f, "{serial}"),
            Outcome::Sent { operation, id } => {
                write!(f, "Sent {operation} command to device ID {id}.")
            }
            Outcome::Failed { id, .. } => {
                write!(f, "[ERROR] Problem communicating with device ID {id}.")
            }
            Outcome::NotFound(error) => write!(f, "[ERROR] {error}."),
            Outcome::NoneAttached => write!(f, "[WARNING] No AudioMoth USB Microphones found."),
        }
    }
}

/// Carry out `request` against whatever is attached. Per-device problems are reported in the
/// returned outcomes and never stop the remaining devices from being processed.
pub fn run(host: &impl HidHost, request: &OperationRequest) -> Vec<Outcome> {
    let found = discovery::discover(host);
    let mut outcomes = vec![];

    match request.operation().message_type() {
        None => {
            for mic in found.microphones {
                report(&mut outcomes, Outcome::Listed(mic.serial));
            }
        }
        Some(_) if found.attached == 0 => report(&mut outcomes, Outcome::NoneAttached),
        Some(message) => {
            for target in discovery::select(&found.microphones, request.serials()) {
                let outcome = match target {
                    Ok(mic) => send(host, request, message, mic),
                    Err(error) => Outcome::NotFound(error),
                };
                report(&mut outcomes, outcome);
            }
        }
    }

    outcomes
}

fn send(
    host: &impl HidHost,
    request: &OperationRequest,
    message: MessageType,
    mic: &Microphone,
) -> Outcome {
    let id = mic.serial.id().to_owned();

    match protocol::send_command(host, &mic.path, message, request.settings()) {
        Ok(()) => Outcome::Sent {
            operation: request.operation(),
            id,
        },
        Err(error) => {
            debug!("{message:?} exchange with {id} at {:?} failed: {error:?}", mic.path);
            Outcome::Failed { id, error }
        }
    }
}

fn report(outcomes: &mut Vec<Outcome>, outcome: Outcome) {
    println!("{outcome}");
    outcomes.push(outcome);
}
