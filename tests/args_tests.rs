//! Tests for command-line parsing and validation.

use audiomoth_usb_microphone::args::{
    Error, Operation, OperationRequest, ParseError, ValidationError, parse,
};
use audiomoth_usb_microphone::protocol::MessageType;
use audiomoth_usb_microphone::settings::{ConfigSettings, FILTER_UNBOUNDED, SAMPLE_RATES};

const SERIAL_A: &str = "24F3190361DA3D1B";
const SERIAL_B: &str = "0000000000000001";

fn ok(tokens: &[&str]) -> OperationRequest {
    parse(tokens)
        .unwrap_or_else(|e| panic!("{tokens:?} failed: {e}"))
        .unwrap_or_else(|| panic!("{tokens:?} gave no request"))
}

fn parse_error(tokens: &[&str]) -> ParseError {
    match parse(tokens) {
        Err(Error::Parse(e)) => e,
        other => panic!("{tokens:?} gave {other:?}"),
    }
}

fn validation_error(tokens: &[&str]) -> ValidationError {
    match parse(tokens) {
        Err(Error::Validation(e)) => e,
        other => panic!("{tokens:?} gave {other:?}"),
    }
}

// --- Operation selection ---

#[test]
fn test_no_tokens_is_a_no_op() {
    assert_eq!(parse(Vec::<String>::new()).unwrap(), None);
}

#[test]
fn test_operation_keywords() {
    assert_eq!(ok(&["LIST"]).operation(), Operation::List);
    assert_eq!(ok(&["RESTORE"]).operation(), Operation::Restore);
    assert_eq!(ok(&["CONFIG"]).operation(), Operation::Config);
    assert_eq!(ok(&["LED", "ON"]).operation(), Operation::SetLed);
    assert_eq!(ok(&["UPDATE"]).operation(), Operation::UpdateGain);
}

#[test]
fn test_keywords_are_case_insensitive() {
    assert_eq!(ok(&["list"]).operation(), Operation::List);
    assert_eq!(ok(&["Config", "lpf", "1000"]).operation(), Operation::Config);
    assert_eq!(ok(&["led", "Off"]).operation(), Operation::SetLed);
}

#[test]
fn test_unknown_operation() {
    assert_eq!(
        parse_error(&["FLASH"]),
        ParseError::UnknownOperation("FLASH".into())
    );
}

#[test]
fn test_message_types() {
    assert_eq!(Operation::List.message_type(), None);
    assert_eq!(
        Operation::Config.message_type(),
        Some(MessageType::Configuration)
    );
    assert_eq!(
        Operation::UpdateGain.message_type(),
        Some(MessageType::UpdateGain)
    );
    assert_eq!(Operation::SetLed.message_type(), Some(MessageType::SetLed));
    assert_eq!(Operation::Restore.message_type(), Some(MessageType::Restore));
}

// --- LIST ---

#[test]
fn test_list_rejects_serials() {
    assert!(matches!(
        parse_error(&["LIST", SERIAL_A]),
        ParseError::UnexpectedArgument {
            operation: Operation::List,
            ..
        }
    ));
}

#[test]
fn test_list_rejects_settings() {
    parse_error(&["LIST", "GAIN", "1"]);
    parse_error(&["LIST", "384000"]);
}

// --- LED ---

#[test]
fn test_led_states() {
    for on in ["TRUE", "on", "1"] {
        assert!(!ok(&["LED", on]).settings().disable_led, "{on}");
    }
    for off in ["false", "OFF", "0"] {
        assert!(ok(&["LED", off]).settings().disable_led, "{off}");
    }
}

#[test]
fn test_led_unrecognized_state() {
    assert_eq!(
        parse_error(&["LED", "MAYBE"]),
        ParseError::InvalidLedState("MAYBE".into())
    );
}

#[test]
fn test_led_missing_state() {
    assert_eq!(parse_error(&["LED"]), ParseError::MissingValue("LED"));
}

#[test]
fn test_led_state_is_not_a_serial() {
    // The state slot is consumed before serials are looked for.
    assert_eq!(
        parse_error(&["LED", SERIAL_A]),
        ParseError::InvalidLedState(SERIAL_A.into())
    );
}

#[test]
fn test_led_takes_serials_only() {
    let r = ok(&["LED", "1", SERIAL_A]);
    assert_eq!(r.serials().len(), 1);
    parse_error(&["LED", "1", "GAIN", "2"]);
}

// --- Serials ---

#[test]
fn test_serials_are_collected_in_order() {
    let r = ok(&["RESTORE", SERIAL_B, "24f3190361da3d1b"]);
    let serials: Vec<_> = r.serials().iter().map(|s| s.as_str()).collect();
    assert_eq!(serials, [SERIAL_B, SERIAL_A]);
}

#[test]
fn test_malformed_serial() {
    parse_error(&["RESTORE", "24F3190361DA3D1"]);
    parse_error(&["RESTORE", "24F3190361DA3D1BX"]);
    parse_error(&["RESTORE", "24F3190361DA3D1Z"]);
}

#[test]
fn test_repeated_serial_for_every_operation() {
    let cases: [&[&str]; 4] = [
        &["RESTORE", SERIAL_A, SERIAL_A],
        &["CONFIG", SERIAL_A, "GAIN", "1", SERIAL_A],
        &["LED", "ON", SERIAL_A, SERIAL_B, SERIAL_A],
        &["UPDATE", SERIAL_A, "24f3190361da3d1b"],
    ];
    for tokens in cases {
        match validation_error(tokens) {
            ValidationError::RepeatedSerial(s) => assert_eq!(s.as_str(), SERIAL_A),
            other => panic!("{tokens:?} gave {other:?}"),
        }
    }
}

// --- CONFIG settings ---

#[test]
fn test_config_defaults() {
    assert_eq!(*ok(&["CONFIG"]).settings(), ConfigSettings::default());
}

#[test]
fn test_every_sample_rate_selects_its_divider() {
    for rate in SAMPLE_RATES {
        let token = rate.requested.to_string();
        let r = ok(&["CONFIG", &token]);
        assert_eq!(r.settings().sample_rate, rate.sample_rate, "{token}");
        assert_eq!(r.settings().sample_rate_divider, rate.divider, "{token}");
    }
}

#[test]
fn test_last_sample_rate_wins() {
    let r = ok(&["CONFIG", "8000", "250000"]);
    assert_eq!(r.settings().sample_rate, 250_000);
    assert_eq!(r.settings().sample_rate_divider, 1);
}

#[test]
fn test_unsupported_sample_rate() {
    parse_error(&["CONFIG", "44100"]);
}

#[test]
fn test_gain() {
    for gain in 0..=4u8 {
        let token = gain.to_string();
        assert_eq!(ok(&["CONFIG", "GAIN", &token]).settings().gain, gain);
        assert_eq!(ok(&["UPDATE", "g", &token]).settings().gain, gain);
    }
}

#[test]
fn test_gain_out_of_range() {
    assert_eq!(
        parse_error(&["CONFIG", "GAIN", "5"]),
        ParseError::InvalidGain("5".into())
    );
    assert_eq!(
        parse_error(&["UPDATE", "G", "-1"]),
        ParseError::InvalidGain("-1".into())
    );
    assert_eq!(
        parse_error(&["UPDATE", "G", ""]),
        ParseError::InvalidGain("".into())
    );
    assert_eq!(
        parse_error(&["UPDATE", "G", "99999999999999999999"]),
        ParseError::InvalidGain("99999999999999999999".into())
    );
}

#[test]
fn test_gain_missing_value() {
    assert_eq!(
        parse_error(&["CONFIG", "GAIN"]),
        ParseError::MissingValue("GAIN")
    );
}

#[test]
fn test_flags() {
    let r = ok(&["CONFIG", "LGR", "esm", "D48"]);
    assert!(r.settings().low_gain_range);
    assert!(r.settings().energy_saver_mode);
    assert!(r.settings().disable_48hz_dc_blocking_filter);
    assert!(!r.settings().disable_led);

    let r = ok(&["CONFIG", "LOWGAINRANGE", "ENERGYSAVERMODE", "DISABLE48HZ"]);
    assert!(r.settings().low_gain_range);
    assert!(r.settings().energy_saver_mode);
    assert!(r.settings().disable_48hz_dc_blocking_filter);
}

#[test]
fn test_update_accepts_only_gain_settings() {
    let r = ok(&["UPDATE", "LGR", "GAIN", "0"]);
    assert!(r.settings().low_gain_range);
    assert_eq!(r.settings().gain, 0);

    parse_error(&["UPDATE", "ESM"]);
    parse_error(&["UPDATE", "D48"]);
    parse_error(&["UPDATE", "LPF", "1000"]);
    parse_error(&["UPDATE", "48000"]);
}

#[test]
fn test_restore_accepts_only_serials() {
    parse_error(&["RESTORE", "GAIN", "1"]);
    parse_error(&["RESTORE", "LGR"]);
}

// --- Filters ---

#[test]
fn test_low_pass() {
    let r = ok(&["CONFIG", "384000", "LPF", "20000"]);
    assert_eq!(r.settings().lower_filter_freq, FILTER_UNBOUNDED);
    assert_eq!(r.settings().higher_filter_freq, 200);
    assert_eq!(r.settings().nyquist_frequency(), 1920);
}

#[test]
fn test_high_pass() {
    let r = ok(&["CONFIG", "HIGHPASSFILTER", "1500"]);
    assert_eq!(r.settings().lower_filter_freq, 15);
    assert_eq!(r.settings().higher_filter_freq, FILTER_UNBOUNDED);
}

#[test]
fn test_band_pass() {
    let r = ok(&["CONFIG", "bpf", "1000", "20000"]);
    assert_eq!(r.settings().lower_filter_freq, 10);
    assert_eq!(r.settings().higher_filter_freq, 200);
}

#[test]
fn test_band_pass_at_nyquist() {
    let r = ok(&["CONFIG", "BPF", "100", "192000"]);
    assert_eq!(r.settings().higher_filter_freq, 1920);
}

#[test]
fn test_filter_frequency_rules() {
    for bad in ["150", "192100", "abc", "", "1e3"] {
        assert_eq!(
            parse_error(&["CONFIG", "LPF", bad]),
            ParseError::InvalidFilterFrequency(bad.into())
        );
    }
    parse_error(&["CONFIG", "BPF", "1000", "1050"]);
}

#[test]
fn test_filter_missing_values() {
    assert_eq!(
        parse_error(&["CONFIG", "LPF"]),
        ParseError::MissingValue("LOWPASSFILTER")
    );
    assert_eq!(
        parse_error(&["CONFIG", "BPF", "1000"]),
        ParseError::MissingValue("BANDPASSFILTER")
    );
}

#[test]
fn test_only_one_filter() {
    assert_eq!(
        parse_error(&["CONFIG", "LPF", "1000", "HPF", "500"]),
        ParseError::MultipleFilters
    );
    assert_eq!(
        parse_error(&["CONFIG", "LPF", "1000", "LPF", "2000"]),
        ParseError::MultipleFilters
    );
}

#[test]
fn test_low_pass_above_nyquist() {
    assert_eq!(
        validation_error(&["CONFIG", "8000", "LPF", "20000"]),
        ValidationError::AboveNyquist {
            filter: "low-pass",
            frequency: 20_000,
            nyquist: 4_000,
        }
    );
}

#[test]
fn test_nyquist_uses_final_sample_rate() {
    validation_error(&["CONFIG", "LPF", "20000", "8000"]);
    ok(&["CONFIG", "8000", "LPF", "20000", "384000"]);
}

#[test]
fn test_high_pass_above_nyquist() {
    assert!(matches!(
        validation_error(&["CONFIG", "16000", "HPF", "10000"]),
        ValidationError::AboveNyquist {
            filter: "high-pass",
            ..
        }
    ));
}

#[test]
fn test_band_pass_above_nyquist() {
    assert!(matches!(
        validation_error(&["CONFIG", "250000", "BPF", "130000", "140000"]),
        ValidationError::AboveNyquist {
            filter: "band-pass lower",
            ..
        }
    ));
    assert!(matches!(
        validation_error(&["CONFIG", "250000", "BPF", "1000", "140000"]),
        ValidationError::AboveNyquist {
            filter: "band-pass higher",
            ..
        }
    ));
}

#[test]
fn test_band_pass_order() {
    assert_eq!(
        validation_error(&["CONFIG", "BPF", "30000", "20000"]),
        ValidationError::BandPassOrder {
            lower: 30_000,
            higher: 20_000,
        }
    );
    assert!(matches!(
        validation_error(&["CONFIG", "BPF", "20000", "20000"]),
        ValidationError::BandPassOrder { .. }
    ));
}

// --- Messages ---

#[test]
fn test_error_messages() {
    let e = parse(["LED", "MAYBE"]).unwrap_err();
    assert_eq!(
        e.to_string(),
        "invalid LED state \"MAYBE\": expected TRUE, FALSE, ON, OFF, 1 or 0"
    );

    let e = parse(["CONFIG", "BPF", "30000", "20000"]).unwrap_err();
    assert_eq!(
        e.to_string(),
        "band-pass lower frequency (30000 Hz) is not less than higher frequency (20000 Hz)"
    );
}
