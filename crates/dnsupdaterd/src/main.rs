// # dnsupdaterd - DNS Updater Daemon
//
// Keeps one Alidns "A" record pointed at this host's public IP.
//
// This daemon is a THIN integration layer:
// - DO NOT add reconciliation, DNS or retry logic here
// - All updater logic lives in dnsupdater-core
//
// The daemon is responsible for:
// 1. Reading configuration (JSON file and/or environment variables)
// 2. Installing logging
// 3. Building the IP source, provider and scheduler
// 4. Running the scheduler until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Record
// - `DNSUPDATER_DOMAIN`: Domain managed in Alidns (e.g. example.com)
// - `DNSUPDATER_HOST_RECORD`: Host record within the domain (e.g. home, or @ for the apex)
//
// ### Provider
// - `DNSUPDATER_ACCESS_KEY_ID`: AccessKey ID
// - `DNSUPDATER_ACCESS_KEY_SECRET`: AccessKey secret
// - `DNSUPDATER_REGION`: Region (default cn-hangzhou)
// - `DNSUPDATER_ENDPOINT`: Endpoint override (default https://alidns.<region>.aliyuncs.com/)
//
// ### IP Source
// - `DNSUPDATER_IP_SOURCE_URL`: Plain-text IP service (default http://ifconfig.me)
// - `DNSUPDATER_REQUIRE_IPV4`: Reject answers that are not IPv4 (default false)
//
// ### Scheduler
// - `DNSUPDATER_POLL_INTERVAL_SECS`: Delay between cycles (default 5)
//
// ### Logging
// - `DNSUPDATER_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `DNSUPDATER_LOG_FORMAT`: text or json (default text)
//
// `DNSUPDATER_CONFIG` may name a JSON file with the same settings
// (`record`, `provider`, `ip_source`, `scheduler` sections); environment
// variables override it.
//
// ## Example
//
// ```bash
// export DNSUPDATER_ACCESS_KEY_ID=LTAI...
// export DNSUPDATER_ACCESS_KEY_SECRET=...
// export DNSUPDATER_DOMAIN=example.com
// export DNSUPDATER_HOST_RECORD=home
//
// dnsupdaterd
// ```

mod settings;

use anyhow::Result;
use dnsupdater_core::Scheduler;
use dnsupdater_ip_http::HttpIpSource;
use dnsupdater_provider_alidns::AlidnsProvider;
use settings::{LogFormat, Settings};
use std::future::Future;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum UpdaterExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<UpdaterExitCode> for ExitCode {
    fn from(code: UpdaterExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return UpdaterExitCode::ConfigError.into();
        }
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return UpdaterExitCode::ConfigError.into();
    }

    info!("Starting dnsupdaterd");

    let scheduler = match build_scheduler(&settings) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return UpdaterExitCode::ConfigError.into();
        }
    };

    let config = &settings.updater;
    info!(
        "Managing {} via {} every {}s",
        scheduler.fqdn(),
        config.provider.endpoint_url(),
        config.scheduler.poll_interval_secs
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UpdaterExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(scheduler).await {
            error!("Daemon error: {:#}", e);
            UpdaterExitCode::RuntimeError
        } else {
            UpdaterExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Install the global fmt subscriber
fn init_logging(settings: &Settings) -> Result<()> {
    let builder = FmtSubscriber::builder().with_max_level(settings.log_level);

    match settings.log_format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }

    Ok(())
}

/// Construct the IP source, provider and scheduler
fn build_scheduler(settings: &Settings) -> Result<Scheduler> {
    let config = &settings.updater;

    let ip_source = HttpIpSource::from_config(&config.ip_source)?;
    let provider = AlidnsProvider::from_config(&config.provider)?;

    // Every outcome is already logged by the scheduler
    let (scheduler, _events) = Scheduler::new(Box::new(ip_source), Box::new(provider), config)?;

    Ok(scheduler)
}

/// Run the scheduler until a shutdown signal arrives
async fn run_daemon(scheduler: Scheduler) -> Result<()> {
    let shutdown = shutdown_signal()?;

    scheduler.run_until(shutdown).await;

    info!("dnsupdaterd stopped");
    Ok(())
}

/// Resolve when SIGTERM or SIGINT is received
///
/// Handlers are installed eagerly so a failure surfaces before the first
/// cycle runs.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Resolve on Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: Ctrl-C"),
            Err(e) => error!("Failed to wait for Ctrl-C: {}", e),
        }
    })
}
