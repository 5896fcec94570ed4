use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use revcar::config::AppConfig;
use revcar::core::bluetooth::constants::DEFAULT_DRIVE_INTENSITY;
use revcar::core::bluetooth::BluestTransport;
use revcar::core::CarManager;

/// Command-line remote for REV BLE battle cars.
#[derive(Parser, Debug)]
#[command(name = "revcar-cli")]
#[command(about = "Scan for, connect to, and drive REV BLE battle cars", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file to use instead of the per-user one.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scan window in seconds, overriding the configured value.
    #[arg(long)]
    scan_timeout: Option<u64>,

    /// Print debug-level detail.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    let mut config = AppConfig::load(cli.config.as_deref()).await?;
    if let Some(scan_timeout) = cli.scan_timeout {
        config.link.scan_timeout_secs = scan_timeout;
    }

    let transport = BluestTransport::new(&config.link)
        .await
        .context("Bluetooth is unavailable")?;
    let mut manager = CarManager::new(Arc::new(transport), &config);

    run_shell(&mut manager).await
}

enum ShellOutcome {
    Continue,
    Quit,
}

async fn run_shell(manager: &mut CarManager) -> Result<()> {
    println!(
        "revcar-cli v{} - type 'help' for commands",
        env!("CARGO_PKG_VERSION")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_prompt();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() {
            match handle_command(line, manager).await {
                Ok(ShellOutcome::Continue) => {}
                Ok(ShellOutcome::Quit) => break,
                Err(e) => eprintln!("Error: {e}"),
            }
        }
        print_prompt();
    }

    if manager.is_connected() {
        let _ = manager.disconnect().await;
    }
    println!("Bye.");
    Ok(())
}

async fn handle_command(line: &str, manager: &mut CarManager) -> Result<ShellOutcome> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    match parts[0] {
        "scan" | "s" => {
            println!("Scanning...");
            if let Err(e) = manager.scan().await {
                eprintln!("Scan failed: {e}");
            }
            print_roster(manager);
        }

        "connect" | "c" => {
            let number: usize = parts
                .get(1)
                .context("Usage: connect <number>")?
                .parse()
                .context("The device number must be an integer")?;
            let index = number.checked_sub(1).context("Device numbers start at 1")?;
            let device = manager.connect(index).await?;
            println!("Connected to {device}");
        }

        "disconnect" | "d" => {
            manager.disconnect().await?;
            println!("Disconnected.");
        }

        "f" | "forward" => {
            manager.drive_forward(parse_intensity(parts.get(1))?).await?;
        }

        "b" | "back" => {
            manager.drive_reverse(parse_intensity(parts.get(1))?).await?;
        }

        "l" | "left" => {
            manager.steer_left(parse_intensity(parts.get(1))?).await?;
        }

        "r" | "right" => {
            manager.steer_right(parse_intensity(parts.get(1))?).await?;
        }

        "fire" => {
            manager.fire().await?;
        }

        "handshake" => {
            manager.send_handshake().await?;
            println!("Handshake sent.");
        }

        "services" => {
            print_services(manager).await?;
        }

        "read" => {
            let raw = parts.get(1).context("Usage: read <handle>, e.g. read 0x0003")?;
            let handle = parse_handle(raw)?;
            let value = manager.read_value(handle).await?;
            println!("Handle 0x{handle:04x}: {}", hex_string(&value));
        }

        "status" => match manager.connected_car() {
            Some(car) => println!("{}: {car}", manager.state()),
            None => println!("{}", manager.state()),
        },

        "help" | "h" | "?" => {
            print_help();
        }

        "quit" | "q" | "exit" => {
            return Ok(ShellOutcome::Quit);
        }

        _ => {
            anyhow::bail!("Unknown command: {} (try 'help')", parts[0]);
        }
    }

    Ok(ShellOutcome::Continue)
}

fn print_roster(manager: &CarManager) {
    if manager.devices().is_empty() {
        println!("No devices found.");
        return;
    }
    for (i, device) in manager.devices().iter().enumerate() {
        println!("> Device #{} {}", i + 1, device);
    }
}

async fn print_services(manager: &CarManager) -> Result<()> {
    let services = manager.services().await?;
    for service in &services {
        match &service.common_name {
            Some(name) => println!("Service {} ({name})", service.uuid),
            None => println!("Service {}", service.uuid),
        }
        for characteristic in &service.characteristics {
            match &characteristic.common_name {
                Some(name) => println!(
                    "  Characteristic {} ({name}) [{}]",
                    characteristic.uuid, characteristic.properties
                ),
                None => println!(
                    "  Characteristic {} [{}]",
                    characteristic.uuid, characteristic.properties
                ),
            }
            for descriptor in &characteristic.descriptors {
                match &descriptor.common_name {
                    Some(name) => println!("    Descriptor {} ({name})", descriptor.uuid),
                    None => println!("    Descriptor {}", descriptor.uuid),
                }
            }
        }
    }
    Ok(())
}

fn parse_intensity(raw: Option<&&str>) -> Result<f64> {
    match raw {
        Some(s) => s
            .parse::<f64>()
            .with_context(|| format!("Not an intensity: {s}")),
        None => Ok(DEFAULT_DRIVE_INTENSITY),
    }
}

fn parse_handle(raw: &str) -> Result<u16> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.with_context(|| format!("Not a handle: {raw}"))
}

fn hex_string(value: &[u8]) -> String {
    value
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_prompt() {
    print!("revcar> ");
    let _ = std::io::stdout().flush();
}

fn print_help() {
    println!("Available commands:");
    println!("  scan                     rebuild the device list");
    println!("  connect <number>         connect to a listed device");
    println!("  disconnect               release the current car");
    println!("  f|b|l|r [intensity]      drive or steer, intensity 0.1-1.0 (default 0.5)");
    println!("  fire                     trigger the cannon");
    println!("  handshake                replay the wake-up sequence");
    println!("  services                 list the GATT tree of the connected car");
    println!("  read <handle>            read a characteristic value, e.g. read 0x0003");
    println!("  status                   show the connection state");
    println!("  help                     show this help");
    println!("  quit                     disconnect and exit");
}
