use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use ups_status::{
    settings::DEFAULT_CONFIG_FILE, CheckError, Probe, ProbeError, ProbeReport, ProcessRunner,
    Settings, UpsCheck,
};

/// Prints an HTML status block for an APC UPS.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Cli {
    /// UPS host name or address.
    #[clap(value_parser)]
    host: Option<String>,

    /// SNMP community.
    #[clap(short, long, value_parser)]
    community: Option<String>,

    /// Path to the check plugin.
    #[clap(long, value_parser)]
    command: Option<String>,

    #[clap(long, value_parser, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Fail instead of rendering empty readings when the probe output is unusable.
    #[clap(long, action)]
    strict: bool,

    /// Print every section of the probe output instead of the status block.
    #[clap(long, action)]
    sections: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to read config")]
    Config(#[from] figment::Error),
    #[error("no UPS host given, pass one or set `host` in the config")]
    NoHost,
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Check(#[from] CheckError),
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut settings = Settings::load(&cli.config)?;
    if let Some(host) = cli.host {
        settings.host = Some(host);
    }
    if let Some(community) = cli.community {
        settings.community = community;
    }
    if let Some(command) = cli.command {
        settings.command = command;
    }

    let host = settings.host.ok_or(AppError::NoHost)?;
    let community = settings.community;
    let probe = Probe::with_command(settings.command, ProcessRunner);

    if cli.sections {
        let report = ProbeReport::new(probe.query(&community, &host)?);
        for (section, body) in report.sections() {
            println!("{}: {}", section, body);
        }
        return Ok(());
    }

    let check = if cli.strict {
        UpsCheck::try_new(&host, Some(community.as_str()), &probe)?
    } else {
        UpsCheck::new(&host, Some(community.as_str()), &probe)
    };

    info!(
        %host,
        severity = %check.severity(),
        load = check.load_percent(),
        runtime_minutes = check.runtime_in_minutes(),
        "ups checked"
    );
    println!("{}", check.display_block());

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "ups-status failed");
            ExitCode::FAILURE
        }
    }
}
