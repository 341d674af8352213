//! Cairn DNS Server
//!
//! Serves zones from a configuration file over UDP and TCP, streams them
//! to authorized secondaries with AXFR and notifies secondaries when they
//! change.

use anyhow::{Context, Result};
use cairn::{build_store, handler_config, server_config, sync_zones, Store};
use cairn_config::{Config, ConfigHolder};
use cairn_metrics::prometheus::{init_prometheus, PrometheusConfig};
use cairn_metrics::tracing_setup::{init_tracing, LogConfig};
use cairn_proto::Name;
use cairn_server::{notify_zone, AuthoritativeHandler, DnsServer, MeteredHandler, Notifier};
use clap::{Parser, Subcommand};
use console::style;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn, Level};

/// Cairn - authoritative DNS with zone transfers
#[derive(Parser, Debug)]
#[command(name = "cairn")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE", env = "CAIRN_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the DNS server (default)
    Run {
        /// Serve Prometheus metrics on this address
        #[arg(long, value_name = "ADDR", env = "CAIRN_METRICS_LISTEN")]
        metrics_listen: Option<SocketAddr>,
    },

    /// Validate configuration file
    Validate {
        /// Show detailed validation output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show version information
    Version,
}

/// Find the configuration file in standard locations
fn find_config_file(explicit_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path);
    }

    let mut search_paths = vec![
        PathBuf::from("./cairn.yaml"),
        PathBuf::from("./cairn.yml"),
        PathBuf::from("/etc/cairn/cairn.yaml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        search_paths.push(dir.join("cairn/cairn.yaml"));
    }

    search_paths.into_iter().find(|path| path.exists())
}

/// Initialize logging from the config, with CLI overrides
fn init_logging(config: &Config, cli_level: Option<&str>, quiet: bool) -> Result<()> {
    let level = cli_level.unwrap_or(&config.logging.level);
    let mut log_config = LogConfig::parse(level, &config.logging.format)
        .map_err(anyhow::Error::msg)
        .context("invalid logging settings")?;
    if quiet {
        log_config.level = Level::ERROR;
    }

    init_tracing(&log_config).context("failed to install tracing subscriber")
}

fn print_banner(config: &Config, quiet: bool) {
    if quiet {
        return;
    }

    println!();
    println!(
        "  {} {}",
        style("Cairn DNS Server").cyan().bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
    );
    println!();
    println!("  {} {}", style("Server:").green(), config.server.name);
    println!(
        "  {} UDP({}), TCP({})",
        style("Listeners:").green(),
        config.listeners.udp.len(),
        config.listeners.tcp.len()
    );
    println!("  {} {}", style("Zones:").green(), config.zones.len());
    println!();
}

/// Notifies the secondaries of every zone in `zones`.
async fn notify_all(notifier: &Notifier, store: &Store, zones: &[Name]) {
    for zone in zones {
        let report = notify_zone(notifier, store, zone).await;
        if report.failed() > 0 {
            warn!(
                zone = %zone,
                acknowledged = report.acknowledged(),
                failed = report.failed(),
                "some secondaries did not acknowledge NOTIFY"
            );
        }
    }
}

/// Reloads zones on SIGHUP and notifies their secondaries.
#[cfg(unix)]
fn spawn_reload(holder: Arc<ConfigHolder>, store: Arc<Store>) -> Result<()> {
    let mut sighup = signal::unix::signal(signal::unix::SignalKind::hangup())
        .context("failed to install SIGHUP handler")?;

    tokio::spawn(async move {
        while sighup.recv().await.is_some() {
            info!("received SIGHUP, reloading zones");
            if let Err(e) = holder.reload() {
                error!(error = %e, "configuration reload failed, keeping current zones");
                continue;
            }

            let config = holder.get();
            match sync_zones(&store, &config.zones).await {
                Ok(zones) => {
                    let notifier = Notifier::new(config.notify.timeout());
                    notify_all(&notifier, &store, &zones).await;
                }
                Err(e) => error!(error = %e, "zone reload failed"),
            }
        }
    });
    Ok(())
}

async fn run_server(holder: Arc<ConfigHolder>, metrics_listen: Option<SocketAddr>) -> Result<()> {
    let config = holder.get();

    if let Some(listen) = metrics_listen {
        init_prometheus(&PrometheusConfig { listen })?;
    }

    let store = Arc::new(build_store(&config)?);
    let zones = sync_zones(&store, &config.zones)
        .await
        .context("failed to load zones")?;

    if config.notify.on_startup {
        let notifier = Notifier::new(config.notify.timeout());
        notify_all(&notifier, &store, &zones).await;
    }

    let handler = MeteredHandler::new(AuthoritativeHandler::new(
        store.clone(),
        handler_config(&config),
    ));
    let server = DnsServer::new(server_config(&config), Arc::new(handler));

    #[cfg(unix)]
    spawn_reload(holder.clone(), store.clone())?;

    for addr in &config.listeners.udp {
        info!(address = %addr, protocol = "UDP", "Listening");
    }
    for addr in &config.listeners.tcp {
        info!(address = %addr, protocol = "TCP", "Listening");
    }
    info!(zones = zones.len(), "Cairn DNS server started");

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!(error = %e, "Server error");
                return Err(e.into());
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    server.shutdown();
    info!("Cairn DNS server stopped");
    Ok(())
}

/// Validate configuration file
fn validate_config(path: Option<PathBuf>, verbose: bool) -> Result<()> {
    let config_path = find_config_file(path).context("No configuration file found")?;

    println!("Validating configuration: {}", config_path.display());

    let config = Config::from_file(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            config_path.display()
        )
    })?;

    if verbose {
        println!("\n{}", style("Configuration loaded:").green().bold());
        println!("  Server name: {}", config.server.name);
        println!("  UDP listeners: {}", config.listeners.udp.len());
        println!("  TCP listeners: {}", config.listeners.tcp.len());
        println!("  Primary NS: {}", config.store.ns_domain);
        for zone in &config.zones {
            println!(
                "  Zone {}: {} records, {} transfer networks, {} secondaries",
                zone.name,
                zone.records.len(),
                zone.allow_transfer.len(),
                zone.notify.len()
            );
        }
    }

    config.validate().context("Configuration validation failed")?;

    println!("{}", style("Configuration is valid!").green().bold());
    Ok(())
}

fn print_version() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let metrics_listen = match cli.command {
        Some(Commands::Version) => {
            print_version();
            return Ok(());
        }
        Some(Commands::Validate { verbose }) => return validate_config(cli.config, verbose),
        Some(Commands::Run { metrics_listen }) => metrics_listen,
        None => None,
    };

    let holder = match find_config_file(cli.config) {
        Some(path) => ConfigHolder::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            if !cli.quiet {
                eprintln!(
                    "{}",
                    style("No configuration file found, using defaults").yellow()
                );
            }
            ConfigHolder::new(Config::default())
        }
    };

    let config = holder.get();
    config.validate().context("Invalid configuration")?;
    init_logging(&config, cli.log_level.as_deref(), cli.quiet)?;
    print_banner(&config, cli.quiet);

    run_server(Arc::new(holder), metrics_listen).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["cairn"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.quiet);
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["cairn", "-c", "/etc/cairn/cairn.yaml", "-q"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/cairn/cairn.yaml")));
        assert!(cli.quiet);

        let cli = Cli::try_parse_from(["cairn", "validate", "--verbose"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Validate { verbose: true })
        ));

        let cli = Cli::try_parse_from(["cairn", "run", "--metrics-listen", "127.0.0.1:9153"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Run { metrics_listen: Some(addr) }) if addr.port() == 9153
        ));
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = PathBuf::from("/nonexistent/cairn.yaml");
        assert_eq!(find_config_file(Some(path.clone())), Some(path));
    }
}
