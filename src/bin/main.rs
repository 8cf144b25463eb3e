//! mdns-responder binary entry point.

use clap::Parser;
use mdns_responder::{netutil, telemetry, Config, Responder, Service};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::{error, info};

/// Minimal authoritative mDNS responder for A/AAAA records.
#[derive(Parser, Debug)]
#[command(name = "mdns-responder")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Service to advertise, as HOSTNAME=ADDRESS (repeatable).
    #[arg(short, long = "service", value_parser = parse_service)]
    services: Vec<Service>,

    /// Advertise HOSTNAME with this host's outbound IP address.
    #[arg(long, value_name = "HOSTNAME")]
    outbound: Option<String>,
}

fn parse_service(s: &str) -> Result<Service, String> {
    let (hostname, address) = s
        .split_once('=')
        .ok_or_else(|| format!("expected HOSTNAME=ADDRESS, got {s:?}"))?;
    let address: IpAddr = address
        .parse()
        .map_err(|e| format!("invalid address {address:?}: {e}"))?;
    Ok(Service::new(hostname, address))
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path.clone()));
    }
    builder
        .add_source(
            config::Environment::with_prefix("MDNS_RESPONDER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_ref())?;
    if args.debug {
        config.telemetry.log_level = "debug".to_string();
    }

    telemetry::init(&config.telemetry).map_err(|e| e as Box<dyn std::error::Error>)?;

    info!(
        listen_addr = %config.responder.listen_addr,
        group = %config.responder.multicast_group,
        "Starting mdns-responder"
    );

    let responder = Responder::new(config.responder.clone())?;
    responder.start()?;

    let mut services: Vec<Service> = config.services.into_iter().map(Service::from).collect();
    services.extend(args.services);
    if let Some(hostname) = args.outbound {
        match netutil::outbound_ip() {
            Ok(address) => services.push(Service::new(hostname, address)),
            Err(e) => error!("Error getting outbound IP: {}", e),
        }
    }

    for service in services {
        responder.register_service(service)?;
    }

    println!("mDNS responder running. Press Ctrl+C to exit.");
    let result = wait_for_signal().await;

    info!("Shutdown signal received");
    responder.shutdown().await;

    if let Err(e) = result {
        error!("Failed to listen for shutdown signal: {}", e);
        return Err(e.into());
    }

    info!("mdns-responder shutdown complete");
    Ok(())
}
