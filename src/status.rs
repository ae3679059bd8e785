use std::fmt;

use thiserror::Error;

/// Nagios-style state of a UPS, ordered by code.
///
/// `Unknown` carries the highest code but is never produced by the threshold
/// checks; it exists so callers can map every Nagios code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Ok = 0,
    Warning = 1,
    Critical = 2,
    Unknown = 3,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid severity code {0}, expected 0-3")]
pub struct InvalidSeverityCode(pub u8);

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Ok,
        Severity::Warning,
        Severity::Critical,
        Severity::Unknown,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Class name used on the rendered `<div class="ups ...">`.
    pub fn css_class(self) -> &'static str {
        match self {
            Severity::Ok => "ok",
            Severity::Warning => "warning",
            Severity::Critical => "notok",
            Severity::Unknown => "unknown",
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = InvalidSeverityCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Severity::Ok),
            1 => Ok(Severity::Warning),
            2 => Ok(Severity::Critical),
            3 => Ok(Severity::Unknown),
            other => Err(InvalidSeverityCode(other)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}
