use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Filter frequencies are stored on the device in units of this many Hz.
pub const FILTER_FREQ_MULTIPLIER: u32 = 100;

/// Largest filter frequency, in Hz, accepted on the command line.
pub const MAX_FILTER_FREQUENCY: u32 = 192_000;

/// Filter bound meaning "no limit on this side". Used for pure low-pass and high-pass filters.
pub const FILTER_UNBOUNDED: u16 = u16::MAX;

/// Size of [ConfigSettings] once packed for the wire.
pub const ENCODED_LEN: usize = 18;

const FLAG_ENERGY_SAVER_MODE: u8 = 1 << 0;
const FLAG_DISABLE_48HZ_DC_BLOCKING_FILTER: u8 = 1 << 1;
const FLAG_LOW_GAIN_RANGE: u8 = 1 << 2;
const FLAG_DISABLE_LED: u8 = 1 << 3;

/// A sample rate selectable on the command line, and how the device produces it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SampleRate {
    /// Effective rate in Hz, as typed by the user.
    pub requested: u32,
    /// Rate the ADC actually runs at.
    pub sample_rate: u32,
    /// Decimation applied to `sample_rate` to reach `requested`.
    pub divider: u8,
}

const fn rate(requested: u32, sample_rate: u32, divider: u8) -> SampleRate {
    SampleRate {
        requested,
        sample_rate,
        divider,
    }
}

pub const SAMPLE_RATES: &[SampleRate] = &[
    rate(8_000, 384_000, 48),
    rate(16_000, 384_000, 24),
    rate(32_000, 384_000, 12),
    rate(48_000, 384_000, 8),
    rate(96_000, 384_000, 4),
    rate(192_000, 384_000, 2),
    rate(250_000, 250_000, 1),
    rate(384_000, 384_000, 1),
];

/// Look up one of the fixed [SAMPLE_RATES] by its effective rate in Hz.
pub fn find_sample_rate(requested: u32) -> Option<&'static SampleRate> {
    SAMPLE_RATES.iter().find(|r| r.requested == requested)
}

/// Recording settings, laid out the way the device firmware expects them.
///
/// Filter frequencies are in units of [FILTER_FREQ_MULTIPLIER] Hz. A value of 0 in both means no
/// filter; [FILTER_UNBOUNDED] in one of them turns the other into a low-pass or high-pass cutoff.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConfigSettings {
    pub time: u32,
    pub gain: u8,
    pub clock_divider: u8,
    pub acquisition_cycles: u8,
    pub oversample_rate: u8,
    pub sample_rate: u32,
    pub sample_rate_divider: u8,
    pub lower_filter_freq: u16,
    pub higher_filter_freq: u16,
    pub energy_saver_mode: bool,
    pub disable_48hz_dc_blocking_filter: bool,
    pub low_gain_range: bool,
    pub disable_led: bool,
}

impl Default for ConfigSettings {
    fn default() -> Self {
        Self {
            time: 0,
            gain: 2,
            clock_divider: 4,
            acquisition_cycles: 16,
            oversample_rate: 1,
            sample_rate: 384_000,
            sample_rate_divider: 1,
            lower_filter_freq: 0,
            higher_filter_freq: 0,
            energy_saver_mode: false,
            disable_48hz_dc_blocking_filter: false,
            low_gain_range: false,
            disable_led: false,
        }
    }
}

impl ConfigSettings {
    /// Half the effective sample rate, in units of [FILTER_FREQ_MULTIPLIER] Hz. Integer division
    /// at every step, so the result rounds down.
    pub fn nyquist_frequency(&self) -> u32 {
        let effective = self
            .sample_rate
            .checked_div(self.sample_rate_divider as u32)
            .unwrap_or(0);
        effective / FILTER_FREQ_MULTIPLIER / 2
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.energy_saver_mode {
            flags |= FLAG_ENERGY_SAVER_MODE;
        }
        if self.disable_48hz_dc_blocking_filter {
            flags |= FLAG_DISABLE_48HZ_DC_BLOCKING_FILTER;
        }
        if self.low_gain_range {
            flags |= FLAG_LOW_GAIN_RANGE;
        }
        if self.disable_led {
            flags |= FLAG_DISABLE_LED;
        }
        flags
    }

    /// Pack into the little-endian, byte-aligned layout the firmware reads.
    pub fn encode(&self) -> [u8; ENCODED_LEN] {
        let mut buf = [0u8; ENCODED_LEN];

        // Writes into a fixed buffer of exactly the right size can't fail.
        let mut cursor = Cursor::new(&mut buf[..]);
        cursor.write_u32::<LE>(self.time).unwrap();
        cursor.write_u8(self.gain).unwrap();
        cursor.write_u8(self.clock_divider).unwrap();
        cursor.write_u8(self.acquisition_cycles).unwrap();
        cursor.write_u8(self.oversample_rate).unwrap();
        cursor.write_u32::<LE>(self.sample_rate).unwrap();
        cursor.write_u8(self.sample_rate_divider).unwrap();
        cursor.write_u16::<LE>(self.lower_filter_freq).unwrap();
        cursor.write_u16::<LE>(self.higher_filter_freq).unwrap();
        cursor.write_u8(self.flags()).unwrap();
        assert!(cursor.position() == ENCODED_LEN as u64);

        buf
    }

    /// Inverse of [ConfigSettings::encode]. Bits 4-7 of the flag byte are ignored.
    pub fn decode(bytes: &[u8; ENCODED_LEN]) -> Self {
        let mut cursor = Cursor::new(&bytes[..]);

        // Reads from a buffer of exactly the right size can't fail either.
        let time = cursor.read_u32::<LE>().unwrap();
        let gain = cursor.read_u8().unwrap();
        let clock_divider = cursor.read_u8().unwrap();
        let acquisition_cycles = cursor.read_u8().unwrap();
        let oversample_rate = cursor.read_u8().unwrap();
        let sample_rate = cursor.read_u32::<LE>().unwrap();
        let sample_rate_divider = cursor.read_u8().unwrap();
        let lower_filter_freq = cursor.read_u16::<LE>().unwrap();
        let higher_filter_freq = cursor.read_u16::<LE>().unwrap();
        let flags = cursor.read_u8().unwrap();

        Self {
            time,
            gain,
            clock_divider,
            acquisition_cycles,
            oversample_rate,
            sample_rate,
            sample_rate_divider,
            lower_filter_freq,
            higher_filter_freq,
            energy_saver_mode: flags & FLAG_ENERGY_SAVER_MODE != 0,
            disable_48hz_dc_blocking_filter: flags & FLAG_DISABLE_48HZ_DC_BLOCKING_FILTER != 0,
            low_gain_range: flags & FLAG_LOW_GAIN_RANGE != 0,
            disable_led: flags & FLAG_DISABLE_LED != 0,
        }
    }
}
