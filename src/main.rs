use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ttyline::config::{ConfigLoader, LogFormat};
use ttyline::{FlushOutcome, SerialSession};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "ttyline",
    version,
    about = "Talk to a serial device over a line-oriented session.",
    long_about = "Configures a serial device for raw, non-echoing operation via stty, \
opens it as a non-blocking stream, sends newline-terminated commands, and prints the \
framed responses with the device's command echo filtered out."
)]
struct Args {
    /// Serial device node to talk to (e.g. /dev/ttyUSB0)
    device: Option<String>,

    /// Baud rate to set before opening
    #[arg(short, long)]
    baud: Option<u32>,

    /// fopen-style open mode token
    #[arg(short, long)]
    mode: Option<String>,

    /// Command to send; repeat the flag for a scripted exchange
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,

    /// Seconds to wait after each send before reading
    #[arg(short, long)]
    wait: Option<f64>,

    /// Byte-count hint for reads
    #[arg(long)]
    count: Option<usize>,

    /// Keep the echoed command in responses
    #[arg(long)]
    keep_echo: bool,

    /// Print each exchange as a JSON object
    #[arg(long)]
    json: bool,

    /// Explicit configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let config = loader.config().clone();

    init_tracing(&config.logging.level, config.logging.format, args.verbose);

    let device = args
        .device
        .clone()
        .or_else(|| config.device.path.clone())
        .ok_or("no device specified (argument or [device].path in ttyline.toml)")?;

    let mut session = SerialSession::new();
    session.configure(&device)?;

    if let Some(rate) = args.baud.or(config.device.baud) {
        session.set_baud_rate(rate)?;
    }

    let mode = args.mode.as_deref().unwrap_or(&config.device.open_mode);
    session.open(mode)?;

    let wait = args
        .wait
        .map(Duration::from_secs_f64)
        .unwrap_or_else(|| config.io.send_wait());
    let count = args.count.or(config.io.read_count);
    let filter_echo = !args.keep_echo && config.io.filter_echo;

    if args.commands.is_empty() {
        let lines = read_lines(&mut session, count, filter_echo)?;
        print_exchange(args.json, None, &lines);
    }

    for command in &args.commands {
        if session.send_with_wait(command, wait) == FlushOutcome::WriteFailed {
            warn!(%command, "command was not written to the device");
        }
        let lines = read_lines(&mut session, count, filter_echo)?;
        print_exchange(args.json, Some(command), &lines);
    }

    if !session.close() {
        warn!("serial port did not close cleanly");
    }

    Ok(())
}

fn init_tracing(config_level: &str, format: LogFormat, verbose: u8) {
    let level = match verbose {
        0 => config_level.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn read_lines(
    session: &mut SerialSession,
    count: Option<usize>,
    filter_echo: bool,
) -> Result<Vec<String>, ttyline::SessionError> {
    let lines = if filter_echo {
        session.read_without_command(count)?
    } else {
        session.read(count)?
    };
    Ok(lines.unwrap_or_default())
}

fn print_exchange(json: bool, command: Option<&str>, lines: &[String]) {
    if json {
        let record = serde_json::json!({
            "command": command,
            "lines": lines,
        });
        println!("{record}");
    } else {
        for line in lines {
            println!("{line}");
        }
    }
}
