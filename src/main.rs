use anyhow::Result;
use audiomoth_usb_microphone::{args, dispatch};
use clap::Parser;
use hidapi::HidApi;
use std::process::ExitCode;

const GRAMMAR: &str = "\
Keywords are case-insensitive. SERIAL is a 16-digit hex device ID; with none, every attached
microphone is targeted.

  LIST
  RESTORE [SERIAL...]
  LED <TRUE|FALSE|ON|OFF|1|0> [SERIAL...]
  UPDATE [GAIN|G <0-4>] [LOWGAINRANGE|LGR] [SERIAL...]
  CONFIG [<SAMPLE RATE>] [GAIN|G <0-4>]
         [LOWPASSFILTER|LPF <HZ>] [HIGHPASSFILTER|HPF <HZ>] [BANDPASSFILTER|BPF <LOW> <HIGH>]
         [LOWGAINRANGE|LGR] [ENERGYSAVERMODE|ESM] [DISABLE48HZ|D48] [SERIAL...]

Sample rates: 8000 16000 32000 48000 96000 192000 250000 384000.
Filter frequencies are in Hz, multiples of 100, at most 192000 and at most half the sample rate.";

/// Configure AudioMoth USB Microphones (USB ID 16d0:06f3)
#[derive(Parser, Debug)]
#[command(name = "audiomoth-usb-microphone", version, after_help = GRAMMAR)]
struct Opt {
    /// Operation keyword followed by its arguments
    #[arg(value_name = "ARGS")]
    args: Vec<String>,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or("AUDIOMOTH_LOG", "info")
            .write_style("AUDIOMOTH_LOG_STYLE"),
    )
    .init();

    let opt = Opt::parse();

    println!("AudioMoth-USB-Microphone {}", env!("CARGO_PKG_VERSION"));

    let request = match args::parse(&opt.args) {
        Ok(Some(request)) => request,
        Ok(None) => return Ok(ExitCode::SUCCESS),
        Err(e) => {
            println!("[ERROR] {e}.");
            return Ok(ExitCode::FAILURE);
        }
    };

    let api = HidApi::new()?;
    dispatch::run(&api, &request);

    Ok(ExitCode::SUCCESS)
}
