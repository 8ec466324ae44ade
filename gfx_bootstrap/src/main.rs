//! # Graphics Bootstrap Binary
//!
//! Opens a window, brings up the graphics driver instance (with the
//! diagnostic channel in diagnostics builds), waits for the window to close
//! and tears everything down.
//!
//! # Usage
//!
//! ```bash
//! # Native Vulkan with a window
//! gfx_bootstrap --config config/bootstrap.toml
//!
//! # Headless simulated driver until Ctrl-C
//! gfx_bootstrap -s -v
//!
//! # Simulated driver for five seconds, JSON logs
//! gfx_bootstrap -s --run-for 5 --json
//! ```

#![deny(warnings)]

use clap::Parser;
use gfx::config::BootstrapConfig;
use gfx::consts::DIAGNOSTICS_ENABLED;
use gfx::error::BootstrapError;
use gfx_bootstrap::{DriverRegistry, ExtensionResolver, LifecycleManager};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Graphics driver bootstrap with an optional diagnostic channel
#[derive(Parser, Debug)]
#[command(name = "gfx_bootstrap")]
#[command(version)]
#[command(about = "Bring up a graphics driver instance and its diagnostic channel")]
#[command(long_about = None)]
struct Args {
    /// Path to the TOML configuration file (defaults when omitted)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the simulation driver without a window
    #[arg(short = 's', long)]
    simulate: bool,

    /// Driver to load from the registry (windowed mode only)
    #[arg(short, long, default_value = "vulkan", conflicts_with = "simulate")]
    driver: String,

    /// Stop after this many seconds (headless mode only)
    #[arg(long, value_name = "SECS", requires = "simulate")]
    run_for: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = BootstrapConfig::load_or_default(args.config.as_deref());
    let level = match (&config, args.verbose) {
        (_, true) => "debug",
        (Ok(config), false) => config.shared.log_level.as_str(),
        (Err(_), false) => "info",
    };
    setup_tracing(level, args.json);

    let result = config
        .map_err(BootstrapError::from)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!(stage = e.stage(), "Bootstrap failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args, config: BootstrapConfig) -> Result<(), BootstrapError> {
    config.validate()?;
    info!(
        "{} v{} starting (diagnostics {})",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION"),
        if DIAGNOSTICS_ENABLED { "on" } else { "off" }
    );

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to install signal handler: {}", e);
    }

    if args.simulate {
        run_headless(args, &config, running)
    } else {
        run_windowed(args, &config, running)
    }
}

fn manager(config: &BootstrapConfig) -> LifecycleManager {
    LifecycleManager::from_config(&config.diagnostics, DIAGNOSTICS_ENABLED)
}

fn run_headless(
    args: &Args,
    config: &BootstrapConfig,
    running: Arc<AtomicBool>,
) -> Result<(), BootstrapError> {
    info!("Simulation mode enabled (headless)");
    let driver = DriverRegistry::with_builtin_drivers().load("simulation", config)?;
    let resolver = ExtensionResolver::new(config.simulation.surface_extensions.iter().cloned());

    let mut lifecycle = manager(config);
    lifecycle.start(driver, resolver, &config.application.descriptor())?;

    let deadline = args
        .run_for
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    while running.load(Ordering::SeqCst) && deadline.is_none_or(|d| Instant::now() < d) {
        std::thread::sleep(Duration::from_millis(100));
    }

    lifecycle.stop()?;
    info!("Shutdown complete");
    Ok(())
}

#[cfg(feature = "vulkan")]
fn run_windowed(
    args: &Args,
    config: &BootstrapConfig,
    running: Arc<AtomicBool>,
) -> Result<(), BootstrapError> {
    use gfx_bootstrap::window::WindowHost;

    let host = WindowHost::open(&config.window)?;
    let resolver = ExtensionResolver::new(host.required_extensions()?);
    let driver = DriverRegistry::with_builtin_drivers().load(&args.driver, config)?;

    let mut lifecycle = manager(config);
    lifecycle.start(driver, resolver, &config.application.descriptor())?;

    let window = host.run(running);
    lifecycle.stop()?;
    drop(window?);

    info!("Shutdown complete");
    Ok(())
}

#[cfg(not(feature = "vulkan"))]
fn run_windowed(
    args: &Args,
    _config: &BootstrapConfig,
    _running: Arc<AtomicBool>,
) -> Result<(), BootstrapError> {
    Err(BootstrapError::Window(format!(
        "driver '{}' needs a window, but this build has no `vulkan` feature; use --simulate",
        args.driver
    )))
}

/// Setup tracing subscriber.
fn setup_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
