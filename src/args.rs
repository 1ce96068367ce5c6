use crate::device_ids::SerialNumber;
use crate::protocol::MessageType;
use crate::settings::{
    self, ConfigSettings, FILTER_FREQ_MULTIPLIER, FILTER_UNBOUNDED, MAX_FILTER_FREQUENCY,
};
use std::collections::HashSet;
use std::fmt::Display;
use thiserror::Error;

const MAX_GAIN: u32 = 4;

/// What the user asked the tool to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Config,
    UpdateGain,
    SetLed,
    Restore,
}

impl Operation {
    fn from_keyword(token: &str) -> Option<Self> {
        use Operation::*;
        [List, Restore, Config, SetLed, UpdateGain]
            .into_iter()
            .find(|op| token.eq_ignore_ascii_case(op.keyword()))
    }

    /// The first token on the command line that selects this operation.
    pub fn keyword(self) -> &'static str {
        match self {
            Operation::List => "LIST",
            Operation::Config => "CONFIG",
            Operation::UpdateGain => "UPDATE",
            Operation::SetLed => "LED",
            Operation::Restore => "RESTORE",
        }
    }

    /// The command sent to each device, or [None] for operations that don't talk to devices.
    pub fn message_type(self) -> Option<MessageType> {
        match self {
            Operation::List => None,
            Operation::Config => Some(MessageType::Configuration),
            Operation::UpdateGain => Some(MessageType::UpdateGain),
            Operation::SetLed => Some(MessageType::SetLed),
            Operation::Restore => Some(MessageType::Restore),
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A fully parsed and validated command line.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationRequest {
    operation: Operation,
    serials: Vec<SerialNumber>,
    settings: ConfigSettings,
}

impl OperationRequest {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Device IDs to target, in the order given. Empty means every attached device.
    pub fn serials(&self) -> &[SerialNumber] {
        &self.serials
    }

    /// Settings to send. Only meaningful for operations that carry them.
    pub fn settings(&self) -> &ConfigSettings {
        &self.settings
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Filter {
    LowPass,
    HighPass,
    BandPass,
}

/// Parse and validate the tokens following the program name. Returns [None] when there are no
/// tokens at all, which is not an error.
pub fn parse<I, S>(tokens: I) -> Result<Option<OperationRequest>, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tokens: Vec<String> = tokens
        .into_iter()
        .map(|token| token.as_ref().to_owned())
        .collect();
    let mut tokens = tokens.iter().map(String::as_str);

    let first = match tokens.next() {
        Some(first) => first,
        None => return Ok(None),
    };

    let operation = Operation::from_keyword(first)
        .ok_or_else(|| ParseError::UnknownOperation(first.to_owned()))?;

    let mut parser = Parser {
        operation,
        settings: ConfigSettings::default(),
        serials: vec![],
        filter: None,
    };

    if operation == Operation::SetLed {
        let state = tokens.next().ok_or(ParseError::MissingValue("LED"))?;
        parser.settings.disable_led = !parse_led_state(state)?;
    }

    while let Some(token) = tokens.next() {
        parser.consume(token, &mut tokens)?;
    }

    parser.validate()?;

    Ok(Some(OperationRequest {
        operation: parser.operation,
        serials: parser.serials,
        settings: parser.settings,
    }))
}

struct Parser {
    operation: Operation,
    settings: ConfigSettings,
    serials: Vec<SerialNumber>,
    filter: Option<Filter>,
}

impl Parser {
    /// Handle one token, pulling any values it needs from `rest`.
    fn consume<'a>(
        &mut self,
        token: &'a str,
        rest: &mut impl Iterator<Item = &'a str>,
    ) -> Result<(), ParseError> {
        use Operation::*;

        let op = self.operation;
        let configuring = op == Config;
        let mut value_for =
            |keyword: &'static str| rest.next().ok_or(ParseError::MissingValue(keyword));

        if op != List {
            if let Some(serial) = SerialNumber::parse(token) {
                self.serials.push(serial);
                return Ok(());
            }
        }

        if configuring {
            if let Some(rate) = parse_number(token).and_then(settings::find_sample_rate) {
                self.settings.sample_rate = rate.sample_rate;
                self.settings.sample_rate_divider = rate.divider;
                return Ok(());
            }
        }

        if is_keyword(token, &["GAIN", "G"]) && (configuring || op == UpdateGain) {
            let value = value_for("GAIN")?;
            self.settings.gain = parse_number(value)
                .filter(|&g| g <= MAX_GAIN)
                .ok_or_else(|| ParseError::InvalidGain(value.to_owned()))? as u8;
        } else if is_keyword(token, &["LOWPASSFILTER", "LPF"]) && configuring {
            self.set_filter(Filter::LowPass)?;
            let higher = parse_filter_frequency(value_for("LOWPASSFILTER")?)?;
            self.settings.lower_filter_freq = FILTER_UNBOUNDED;
            self.settings.higher_filter_freq = higher;
        } else if is_keyword(token, &["HIGHPASSFILTER", "HPF"]) && configuring {
            self.set_filter(Filter::HighPass)?;
            let lower = parse_filter_frequency(value_for("HIGHPASSFILTER")?)?;
            self.settings.lower_filter_freq = lower;
            self.settings.higher_filter_freq = FILTER_UNBOUNDED;
        } else if is_keyword(token, &["BANDPASSFILTER", "BPF"]) && configuring {
            self.set_filter(Filter::BandPass)?;
            let lower = parse_filter_frequency(value_for("BANDPASSFILTER")?)?;
            let higher = parse_filter_frequency(value_for("BANDPASSFILTER")?)?;
            self.settings.lower_filter_freq = lower;
            self.settings.higher_filter_freq = higher;
        } else if is_keyword(token, &["LOWGAINRANGE", "LGR"]) && (configuring || op == UpdateGain) {
            self.settings.low_gain_range = true;
        } else if is_keyword(token, &["ENERGYSAVERMODE", "ESM"]) && configuring {
            self.settings.energy_saver_mode = true;
        } else if is_keyword(token, &["DISABLE48HZ", "D48"]) && configuring {
            self.settings.disable_48hz_dc_blocking_filter = true;
        } else {
            return Err(ParseError::UnexpectedArgument {
                token: token.to_owned(),
                operation: op,
            });
        }

        Ok(())
    }

    fn set_filter(&mut self, filter: Filter) -> Result<(), ParseError> {
        if self.filter.is_some() {
            return Err(ParseError::MultipleFilters);
        }
        self.filter = Some(filter);
        Ok(())
    }

    /// Checks that need the whole command line: filter ordering, filter bounds against the final
    /// sample rate, and repeated device IDs.
    fn validate(&self) -> Result<(), ValidationError> {
        let nyquist = self.settings.nyquist_frequency();
        let lower = self.settings.lower_filter_freq as u32;
        let higher = self.settings.higher_filter_freq as u32;

        let above_nyquist = |freq: u32, filter: &'static str| {
            if freq > nyquist {
                Err(ValidationError::AboveNyquist {
                    filter,
                    frequency: freq * FILTER_FREQ_MULTIPLIER,
                    nyquist: nyquist * FILTER_FREQ_MULTIPLIER,
                })
            } else {
                Ok(())
            }
        };

        match self.filter {
            None => {}
            Some(Filter::LowPass) => above_nyquist(higher, "low-pass")?,
            Some(Filter::HighPass) => above_nyquist(lower, "high-pass")?,
            Some(Filter::BandPass) => {
                if lower >= higher {
                    return Err(ValidationError::BandPassOrder {
                        lower: lower * FILTER_FREQ_MULTIPLIER,
                        higher: higher * FILTER_FREQ_MULTIPLIER,
                    });
                }
                above_nyquist(lower, "band-pass lower")?;
                above_nyquist(higher, "band-pass higher")?;
            }
        }

        let mut seen = HashSet::new();
        for serial in &self.serials {
            if !seen.insert(serial) {
                return Err(ValidationError::RepeatedSerial(serial.clone()));
            }
        }

        Ok(())
    }
}

fn is_keyword(token: &str, names: &[&str]) -> bool {
    names.iter().any(|name| token.eq_ignore_ascii_case(name))
}

/// A non-empty run of ASCII digits that fits in a `u32`.
fn parse_number(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Returns whether the LED should be on.
fn parse_led_state(text: &str) -> Result<bool, ParseError> {
    if is_keyword(text, &["TRUE", "ON", "1"]) {
        Ok(true)
    } else if is_keyword(text, &["FALSE", "OFF", "0"]) {
        Ok(false)
    } else {
        Err(ParseError::InvalidLedState(text.to_owned()))
    }
}

/// Parse a frequency in Hz into the device's units of [FILTER_FREQ_MULTIPLIER] Hz.
fn parse_filter_frequency(text: &str) -> Result<u16, ParseError> {
    parse_number(text)
        .filter(|&hz| hz <= MAX_FILTER_FREQUENCY && hz % FILTER_FREQ_MULTIPLIER == 0)
        .map(|hz| (hz / FILTER_FREQ_MULTIPLIER) as u16)
        .ok_or_else(|| ParseError::InvalidFilterFrequency(text.to_owned()))
}

/// Anything wrong with the command line.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A token that doesn't fit the grammar.
#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("unknown operation {0:?}: expected LIST, RESTORE, CONFIG, LED or UPDATE")]
    UnknownOperation(String),

    #[error("{0} must be followed by a value")]
    MissingValue(&'static str),

    #[error("invalid LED state {0:?}: expected TRUE, FALSE, ON, OFF, 1 or 0")]
    InvalidLedState(String),

    #[error("invalid gain {0:?}: expected 0 to 4")]
    InvalidGain(String),

    #[error("invalid filter frequency {0:?}: expected a multiple of 100 Hz up to 192000 Hz")]
    InvalidFilterFrequency(String),

    #[error("only one of LOWPASSFILTER, HIGHPASSFILTER and BANDPASSFILTER may be given")]
    MultipleFilters,

    #[error("unexpected argument {token:?} for {operation}")]
    UnexpectedArgument { token: String, operation: Operation },
}

/// A command line that parses but asks for something impossible.
#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("band-pass lower frequency ({lower} Hz) is not less than higher frequency ({higher} Hz)")]
    BandPassOrder { lower: u32, higher: u32 },

    #[error(
        "{filter} frequency ({frequency} Hz) is above the Nyquist frequency ({nyquist} Hz) of the sample rate"
    )]
    AboveNyquist {
        filter: &'static str,
        frequency: u32,
        nyquist: u32,
    },

    #[error("repeated device ID {0}")]
    RepeatedSerial(SerialNumber),
}
