//! `ld2451`: replay captures, build command frames, and talk to a radar.
//!
//! Usage:
//!   ld2451 decode capture.bin --chunk 16
//!   ld2451 encode set-sensitivity --snr 5
//!   ld2451 monitor --port /dev/ttyUSB0 --count 20
//!   ld2451 configure --port /dev/ttyUSB0 --baud 256000 --plan plan.yaml

mod error;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use ld2451_protocol::{
    BaudRate, Command, DetectionConfig, DirectionFilter, OutputFormat, SensitivityConfig,
    StreamDecoder, DEFAULT_TRIGGER_COUNT,
};
use ld2451_session::{
    ConfigurationPlan, IoTransport, SessionConfig, SessionController, StepReport,
};
use serialport::SerialPort;
use tracing::{info, warn};

use crate::error::{CliError, CliResult};

/// Factory baud rate of the radar.
const DEFAULT_BAUD: u32 = 115_200;

/// HLK-LD2451 radar tool.
#[derive(Parser)]
#[command(name = "ld2451", version, about = "HLK-LD2451 radar protocol tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a captured byte stream and print each event as JSON.
    Decode {
        /// Capture file.
        file: PathBuf,

        /// The file holds hex text instead of raw bytes.
        #[arg(long)]
        hex: bool,

        /// Feed the decoder this many bytes at a time.
        #[arg(long, default_value_t = 128)]
        chunk: usize,
    },

    /// Print the frame for a command as hex.
    Encode {
        #[command(subcommand)]
        command: EncodeCommand,
    },

    /// Stream target reports from a radar.
    Monitor {
        /// Serial device path.
        #[arg(long)]
        port: PathBuf,

        /// Serial baud rate.
        #[arg(long, default_value_t = DEFAULT_BAUD)]
        baud: u32,

        /// Stop after this many reports.
        #[arg(long)]
        count: Option<usize>,

        /// Session settings (YAML).
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Apply a configuration plan (YAML) to a radar.
    Configure {
        /// Serial device path.
        #[arg(long)]
        port: PathBuf,

        /// Serial baud rate.
        #[arg(long, default_value_t = DEFAULT_BAUD)]
        baud: u32,

        /// Plan file.
        #[arg(long)]
        plan: PathBuf,

        /// Session settings (YAML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum EncodeCommand {
    /// Enter configuration mode.
    EnterConfig,
    /// Leave configuration mode.
    ExitConfig,
    /// Read the firmware version.
    ReadFirmware,
    /// Set the serial baud rate.
    SetBaud {
        /// Bits per second.
        rate: u32,
    },
    /// Restore factory settings.
    FactoryReset,
    /// Restart the radar.
    Restart,
    /// Set detection parameters.
    SetDetection {
        #[arg(long, default_value_t = 20)]
        max_distance: u8,
        #[arg(long, value_enum, default_value = "approaching")]
        direction: DirectionArg,
        #[arg(long, default_value_t = 1)]
        min_speed: u8,
        #[arg(long, default_value_t = 2)]
        delay: u8,
    },
    /// Set sensitivity parameters.
    SetSensitivity {
        /// SNR threshold, 0-9.
        #[arg(long)]
        snr: u8,
        #[arg(long, default_value_t = DEFAULT_TRIGGER_COUNT)]
        trigger_count: u8,
    },
    /// Read detection parameters.
    ReadDetection,
    /// Read sensitivity parameters.
    ReadSensitivity,
    /// Select the output format.
    SetOutput {
        #[arg(long)]
        target_info: bool,
        #[arg(long)]
        engineering: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum DirectionArg {
    Receding,
    Approaching,
    Both,
}

impl From<DirectionArg> for DirectionFilter {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Receding => DirectionFilter::RecedingOnly,
            DirectionArg::Approaching => DirectionFilter::ApproachingOnly,
            DirectionArg::Both => DirectionFilter::Both,
        }
    }
}

impl EncodeCommand {
    fn to_command(&self) -> CliResult<Command> {
        let command = match *self {
            EncodeCommand::EnterConfig => Command::EnableConfiguration,
            EncodeCommand::ExitConfig => Command::EndConfiguration,
            EncodeCommand::ReadFirmware => Command::ReadFirmwareVersion,
            EncodeCommand::SetBaud { rate } => {
                Command::SetBaudRate(BaudRate::from_bits_per_second(rate)?)
            }
            EncodeCommand::FactoryReset => Command::FactoryReset,
            EncodeCommand::Restart => Command::Restart,
            EncodeCommand::SetDetection {
                max_distance,
                direction,
                min_speed,
                delay,
            } => Command::SetDetectionParams(DetectionConfig {
                max_distance_m: max_distance,
                direction_filter: direction.into(),
                min_speed_kmh: min_speed,
                no_target_delay_s: delay,
            }),
            EncodeCommand::SetSensitivity { snr, trigger_count } => {
                Command::SetSensitivityParams(SensitivityConfig {
                    trigger_count,
                    snr_threshold: snr,
                })
            }
            EncodeCommand::ReadDetection => Command::ReadDetectionParams,
            EncodeCommand::ReadSensitivity => Command::ReadSensitivityParams,
            EncodeCommand::SetOutput {
                target_info,
                engineering,
            } => Command::SetOutputFormat(OutputFormat {
                target_info,
                engineering,
            }),
        };
        command.validate()?;
        Ok(command)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Decode { file, hex, chunk } => run_decode(&file, hex, chunk),
        Commands::Encode { command } => run_encode(&command),
        Commands::Monitor {
            port,
            baud,
            count,
            config,
        } => run_monitor(&port, baud, count, config.as_deref()),
        Commands::Configure {
            port,
            baud,
            plan,
            config,
        } => run_configure(&port, baud, &plan, config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_decode(path: &Path, hex_text: bool, chunk: usize) -> CliResult<()> {
    let raw = fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = if hex_text { parse_hex_capture(&raw)? } else { raw };

    let mut decoder = StreamDecoder::new();
    for piece in bytes.chunks(chunk.max(1)) {
        decoder.feed(piece);
        loop {
            match decoder.try_decode() {
                Ok(Some(event)) => println!("{}", serde_json::to_string(&event)?),
                Ok(None) => break,
                Err(e) => warn!("skipping malformed frame: {}", e),
            }
        }
    }

    println!("{}", serde_json::to_string(&decoder.stats())?);
    Ok(())
}

fn run_encode(command: &EncodeCommand) -> CliResult<()> {
    let frame = command.to_command()?.encode();
    println!("{}", format_frame(&frame));
    Ok(())
}

fn run_monitor(
    port: &Path,
    baud: u32,
    count: Option<usize>,
    config: Option<&Path>,
) -> CliResult<()> {
    let mut session = open_session(port, baud, config)?;
    let mut seen = 0;

    while count.map_or(true, |limit| seen < limit) {
        if let Some(event) = session.poll_data(Duration::from_secs(1))? {
            println!("{}", serde_json::to_string(&event)?);
            seen += 1;
        }
    }

    info!("stream stats: {:?}", session.stream_stats());
    Ok(())
}

fn run_configure(
    port: &Path,
    baud: u32,
    plan_path: &Path,
    config: Option<&Path>,
) -> CliResult<()> {
    let text = read_text(plan_path)?;
    let plan = ConfigurationPlan::from_yaml(&text).map_err(|source| CliError::Yaml {
        path: plan_path.to_path_buf(),
        source,
    })?;
    if plan.is_empty() {
        warn!("plan {} writes nothing", plan_path.display());
    }

    let mut session = open_session(port, baud, config)?;
    let report = session.configure(&plan)?;

    for StepReport { command, result } in &report.steps {
        match result {
            Ok(response) => println!(
                "0x{:02X} ok (status 0x{:02X})",
                command.command_id(),
                response.status
            ),
            Err(e) => println!("0x{:02X} failed: {}", command.command_id(), e),
        }
    }

    match &report.exit {
        Ok(_) => println!("0xFE ok (left configuration mode)"),
        Err(e) => println!("0xFE failed: {}", e),
    }

    let failed = report.failures().count();
    // Exit failure first: the radar may still be in configuration mode.
    report.exit?;
    if failed > 0 {
        return Err(CliError::PlanFailed(failed));
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn open_session(
    port: &Path,
    baud: u32,
    config: Option<&Path>,
) -> CliResult<SessionController<IoTransport<Box<dyn SerialPort>>>> {
    let baud = BaudRate::from_bits_per_second(baud)?;
    let config = match config {
        Some(path) => {
            let text = read_text(path)?;
            SessionConfig::from_yaml(&text).map_err(|source| CliError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => SessionConfig {
            name: port.display().to_string(),
            ..SessionConfig::default()
        },
    };

    let serial = serialport::new(port.to_string_lossy(), baud.bits_per_second())
        .timeout(config.poll_interval())
        .open()
        .map_err(|source| CliError::Open {
            path: port.to_path_buf(),
            source,
        })?;
    info!("opened {} at {} baud", port.display(), baud.bits_per_second());
    Ok(SessionController::new(IoTransport::new(serial), config))
}

fn read_text(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Hex text split into tokens by whitespace or commas. Each token may carry
/// a leading `0x`.
fn parse_hex_capture(text: &[u8]) -> CliResult<Vec<u8>> {
    let text = String::from_utf8_lossy(text);
    let mut bytes = Vec::new();
    for token in text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        bytes.extend(hex::decode(digits)?);
    }
    Ok(bytes)
}

fn format_frame(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ld2451_protocol::ProtocolError;

    #[test]
    fn test_parse_hex_capture() {
        let bytes = parse_hex_capture(b"F4 F3 F2 F1\n0x02,0x00 00 00\tF8F7F6F5").unwrap();
        assert_eq!(
            bytes,
            vec![0xF4, 0xF3, 0xF2, 0xF1, 0x02, 0x00, 0x00, 0x00, 0xF8, 0xF7, 0xF6, 0xF5]
        );
        assert!(parse_hex_capture(b"F4 F").is_err());
    }

    #[test]
    fn test_parse_hex_capture_prefix_only_at_token_start() {
        assert_eq!(
            parse_hex_capture(b"F4F3 0xF2,0XF1").unwrap(),
            vec![0xF4, 0xF3, 0xF2, 0xF1]
        );
        assert!(parse_hex_capture(b"F00x12").is_err());
        assert!(parse_hex_capture(b"0x").unwrap().is_empty());
    }

    #[test]
    fn test_encode_enter_config() {
        let frame = EncodeCommand::EnterConfig.to_command().unwrap().encode();
        assert_eq!(format_frame(&frame), "FD FC FB FA 04 00 FF 00 01 00 04 03 02 01");
    }

    #[test]
    fn test_encode_rejects_bad_values() {
        assert!(EncodeCommand::SetBaud { rate: 12345 }.to_command().is_err());
        assert!(EncodeCommand::SetSensitivity {
            snr: 10,
            trigger_count: 2
        }
        .to_command()
        .is_err());
    }

    #[test]
    fn test_cli_parses_encode() {
        let cli = Cli::try_parse_from([
            "ld2451",
            "encode",
            "set-detection",
            "--max-distance",
            "40",
            "--direction",
            "both",
        ])
        .unwrap();
        let Commands::Encode { command } = cli.command else {
            panic!("expected encode");
        };
        let Command::SetDetectionParams(config) = command.to_command().unwrap() else {
            panic!("expected detection params");
        };
        assert_eq!(config.max_distance_m, 40);
        assert_eq!(config.direction_filter, DirectionFilter::Both);
        assert_eq!(config.no_target_delay_s, 2);
    }

    #[test]
    fn test_cli_baud_defaults_to_factory_rate() {
        let cli = Cli::try_parse_from(["ld2451", "monitor", "--port", "/dev/ttyUSB0"]).unwrap();
        let Commands::Monitor { baud, .. } = cli.command else {
            panic!("expected monitor");
        };
        assert_eq!(baud, 115_200);

        let cli = Cli::try_parse_from([
            "ld2451", "configure", "--port", "/dev/ttyUSB0", "--baud", "256000", "--plan", "p.yaml",
        ])
        .unwrap();
        let Commands::Configure { baud, .. } = cli.command else {
            panic!("expected configure");
        };
        assert_eq!(baud, 256_000);
    }

    #[test]
    fn test_open_session_rejects_unsupported_baud() {
        let err = open_session(Path::new("/dev/ttyUSB0"), 12_345, None).unwrap_err();
        assert!(matches!(
            err,
            CliError::Protocol(ProtocolError::UnsupportedBaudRate(12_345))
        ));
    }

    #[test]
    fn test_open_session_reports_missing_port() {
        let port = Path::new("/nonexistent/ld2451-tty");
        let err = open_session(port, DEFAULT_BAUD, None).unwrap_err();
        assert!(matches!(err, CliError::Open { ref path, .. } if path == port));
    }
}
