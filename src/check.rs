use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    parse::{
        LoadReading, OutputReading, ParseError, ProbeReport, RuntimeReading, RuntimeUnit, Section,
    },
    probe::{Probe, ProbeError, Runner, DEFAULT_COMMUNITY},
    status::Severity,
};

// Thresholds for the two checks, load in percent and runtime in minutes.
const WARNING_LOAD: i64 = 70;
const WARNING_RUNTIME: i64 = 30;
const CRITICAL_LOAD: i64 = 80;
const CRITICAL_RUNTIME: i64 = 20;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// One snapshot of a UPS, taken when the check is built.
#[derive(Debug, Clone)]
pub struct UpsCheck {
    host: String,
    community: String,
    load: LoadReading,
    runtime: RuntimeReading,
    load_line: String,
    runtime_line: String,
}

impl UpsCheck {
    /// Queries the UPS once and parses the load and runtime.
    ///
    /// Never fails: an unreachable probe is treated as empty output and
    /// anything that does not parse falls back to an empty reading, which
    /// renders with zero load and zero runtime. Use [`UpsCheck::try_new`] to
    /// see those failures instead.
    pub fn new<R: Runner>(host: &str, community: Option<&str>, probe: &Probe<R>) -> UpsCheck {
        let community = community.unwrap_or(DEFAULT_COMMUNITY);
        let raw = probe.query(community, host).unwrap_or_else(|e| {
            warn!(%host, error = %e, "ups probe failed, using empty output");
            String::new()
        });
        let report = ProbeReport::new(raw);

        let load = read_load(&report).unwrap_or_else(|e| {
            warn!(%host, error = %e, "could not read ups load");
            LoadReading::default()
        });
        let runtime = read_runtime(&report).unwrap_or_else(|e| {
            warn!(%host, error = %e, "could not read ups runtime");
            RuntimeReading::default()
        });

        UpsCheck::from_readings(host, community, load, runtime)
    }

    /// Like [`UpsCheck::new`], but returns the first probe or parse failure.
    pub fn try_new<R: Runner>(
        host: &str,
        community: Option<&str>,
        probe: &Probe<R>,
    ) -> Result<UpsCheck, CheckError> {
        let community = community.unwrap_or(DEFAULT_COMMUNITY);
        let report = ProbeReport::new(probe.query(community, host)?);
        let load = read_load(&report)?;
        let runtime = read_runtime(&report)?;

        Ok(UpsCheck::from_readings(host, community, load, runtime))
    }

    fn from_readings(
        host: &str,
        community: &str,
        load: LoadReading,
        runtime: RuntimeReading,
    ) -> UpsCheck {
        debug!(
            %host,
            load = load.percent,
            runtime = runtime.value,
            unit = %runtime.unit,
            "read ups status"
        );
        UpsCheck {
            host: host.to_string(),
            community: community.to_string(),
            load_line: load.line(),
            runtime_line: runtime.line(),
            load,
            runtime,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn community(&self) -> &str {
        &self.community
    }

    pub fn load_percent(&self) -> i64 {
        self.load.percent
    }

    pub fn runtime(&self) -> i64 {
        self.runtime.value
    }

    pub fn runtime_unit(&self) -> &RuntimeUnit {
        &self.runtime.unit
    }

    pub fn load_line(&self) -> &str {
        &self.load_line
    }

    pub fn runtime_line(&self) -> &str {
        &self.runtime_line
    }

    pub fn runtime_in_minutes(&self) -> i64 {
        self.runtime.minutes()
    }

    /// Result of the warning check followed by the critical check.
    pub fn observations(&self) -> [Severity; 2] {
        let load = self.load_percent();
        let minutes = self.runtime_in_minutes();

        let warning = if load > WARNING_LOAD || minutes < WARNING_RUNTIME {
            Severity::Warning
        } else {
            Severity::Ok
        };
        let critical = if load > CRITICAL_LOAD || minutes < CRITICAL_RUNTIME {
            Severity::Critical
        } else {
            Severity::Ok
        };

        [warning, critical]
    }

    pub fn severity(&self) -> Severity {
        self.observations()
            .into_iter()
            .max()
            .unwrap_or(Severity::Ok)
    }

    /// Renders the status fragment. The readings are inserted verbatim.
    pub fn display_block(&self) -> String {
        format!(
            "<div class=\"ups {}\">{}<br /><br />{}</div>",
            self.severity().css_class(),
            self.load_line,
            self.runtime_line
        )
    }
}

fn read_load(report: &ProbeReport) -> Result<LoadReading, ParseError> {
    let output = OutputReading::parse(report.require(Section::Output)?)?;
    LoadReading::parse(&output.load)
}

fn read_runtime(report: &ProbeReport) -> Result<RuntimeReading, ParseError> {
    RuntimeReading::parse(report.require(Section::Battery)?)
}
