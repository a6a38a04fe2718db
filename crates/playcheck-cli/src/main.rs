//! playcheck - smoke-test runner for the Playground example app
//!
//! Usage:
//!     playcheck [OPTIONS]
//!
//! Environment Variables:
//!     PLAYCHECK_PACKAGE: Application id of the app under test
//!     PLAYCHECK_ACTIVITY: Activity to launch instead of the launcher intent
//!     PLAYCHECK_DEVICE_ID: ADB device ID for multi-device setups
//!     PLAYCHECK_ADB_PATH: adb binary to use (default: adb)
//!     PLAYCHECK_ARTIFACTS_DIR: directory for failure screenshots

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use ui_harness::{
    list_devices, smoke_cases, ArtifactSaver, CaseStatus, DeviceSession, SessionConfig,
    SuiteReport, PLAYGROUND_PACKAGE,
};

/// Playcheck - device smoke tests for the Playground app
#[derive(Parser, Debug)]
#[command(name = "playcheck")]
#[command(about = "Device smoke tests for the Playground example app")]
#[command(after_help = r#"Examples:
    # Run the smoke suite against the default device
    playcheck

    # Run against a specific device
    playcheck --device-id emulator-5554

    # Connect to a remote device first
    playcheck --connect 192.168.1.100:5555

    # List connected devices
    playcheck --list-devices

    # Keep failure screenshots and a JSON report
    playcheck --artifacts-dir ./artifacts --report report.json
"#)]
struct Cli {
    /// Application id of the app under test
    #[arg(long, env = "PLAYCHECK_PACKAGE", default_value = PLAYGROUND_PACKAGE)]
    package: String,

    /// Activity to launch instead of the default launcher intent
    #[arg(long, env = "PLAYCHECK_ACTIVITY")]
    activity: Option<String>,

    /// ADB device ID
    #[arg(short = 'd', long, env = "PLAYCHECK_DEVICE_ID")]
    device_id: Option<String>,

    /// adb binary to use
    #[arg(long, env = "PLAYCHECK_ADB_PATH", default_value = "adb")]
    adb_path: String,

    /// Connect to a remote device before running (e.g. 192.168.1.100:5555)
    #[arg(short = 'c', long, value_name = "ADDRESS")]
    connect: Option<String>,

    /// List connected devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Write the suite report as JSON to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Directory for failure screenshots
    #[arg(long, env = "PLAYCHECK_ARTIFACTS_DIR", value_name = "DIR")]
    artifacts_dir: Option<PathBuf>,

    /// Suppress the per-case progress output
    #[arg(short = 'q', long)]
    quiet: bool,
}

/// Check system requirements before running the suite
async fn check_system_requirements(cli: &Cli) -> Result<()> {
    if which::which(&cli.adb_path).is_err() {
        return Err(anyhow!(
            "{} is not installed or not in PATH.\n\
             Install platform-tools:\n\
             - macOS: brew install android-platform-tools\n\
             - Linux: sudo apt install android-tools-adb",
            cli.adb_path
        ));
    }

    let devices = list_devices(&cli.adb_path).await?;
    let ready: Vec<_> = devices.iter().filter(|d| d.is_ready()).collect();
    if ready.is_empty() {
        return Err(anyhow!(
            "No devices connected.\n\
             1. Start an emulator, or enable USB debugging on a device\n\
             2. Authorize the connection\n\
             3. Or connect remotely: playcheck --connect <ip>:<port>"
        ));
    }

    if let Some(device_id) = &cli.device_id {
        if !ready.iter().any(|d| &d.device_id == device_id) {
            return Err(anyhow!("Device {} is not connected", device_id));
        }
    }

    Ok(())
}

/// Print the device table for --list-devices
async fn print_devices(adb_path: &str) -> Result<()> {
    let devices = list_devices(adb_path).await?;
    if devices.is_empty() {
        println!("No devices connected.");
        return Ok(());
    }

    println!("Connected devices:");
    println!("{}", "-".repeat(60));
    for device in devices {
        let status_icon = if device.is_ready() {
            "\u{2713}"
        } else {
            "\u{2717}"
        };
        let model_info = device
            .model
            .map(|m| format!(" ({})", m))
            .unwrap_or_default();
        println!(
            "  {} {:<30} [{:?}]{}",
            status_icon, device.device_id, device.connection_type, model_info
        );
    }
    Ok(())
}

/// Print the run header
fn print_header(cli: &Cli) {
    println!("{}", "=".repeat(50));
    println!("Playcheck - Playground smoke tests");
    println!("{}", "=".repeat(50));
    println!("Package: {}", cli.package);
    if let Some(activity) = &cli.activity {
        println!("Activity: {}", activity);
    }
    if let Some(device_id) = &cli.device_id {
        println!("Device: {}", device_id);
    }
    if let Some(dir) = &cli.artifacts_dir {
        println!("Artifacts: {}", dir.display());
    }
    println!("{}", "=".repeat(50));
}

/// Render per-case results and the summary line
fn print_report(report: &SuiteReport) {
    println!();
    for case in &report.cases {
        match &case.status {
            CaseStatus::Passed => {
                println!("  \u{2713} {} ({}ms)", case.name, case.elapsed_ms);
            }
            CaseStatus::Failed { error } => {
                println!("  \u{2717} {} ({}ms)", case.name, case.elapsed_ms);
                println!("      {}", error);
            }
            CaseStatus::ResetFailed { error } => {
                println!("  \u{2717} {} (reset failed)", case.name);
                println!("      {}", error);
            }
        }
    }
    println!();
    println!(
        "{} passed, {} failed ({} cases)",
        report.passed(),
        report.failed(),
        report.cases.len()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    // Handle --list-devices
    if cli.list_devices {
        print_devices(&cli.adb_path).await?;
        return Ok(());
    }

    // Handle --connect
    if let Some(addr) = &cli.connect {
        println!("Connecting to {}...", addr);
        let address = ui_harness::connect(&cli.adb_path, addr).await?;
        println!("\u{2713} Connected to {}", address);
    }

    check_system_requirements(&cli).await?;

    if !cli.quiet {
        print_header(&cli);
    }

    let mut config = SessionConfig::new(&cli.package).with_adb_path(&cli.adb_path);
    if let Some(activity) = &cli.activity {
        config = config.with_activity(activity);
    }
    if let Some(device_id) = &cli.device_id {
        config = config.with_device_id(device_id);
    }

    let artifacts = match &cli.artifacts_dir {
        Some(dir) => Some(ArtifactSaver::new(dir).await?),
        None => None,
    };

    let mut session = DeviceSession::new(config);
    let cases = smoke_cases();
    let report = ui_harness::run_suite(&mut session, &cases, artifacts).await?;

    if !cli.quiet {
        print_report(&report);
    }

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(path, json).await?;
        println!("Report written to {}", path.display());
    }

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
