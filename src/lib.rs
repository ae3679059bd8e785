//! Status fragments for APC UPS units, built from the output of the
//! `check_snmp_apcups` Nagios plugin.
//!
//! ```no_run
//! use ups_status::{Probe, UpsCheck};
//!
//! let check = UpsCheck::new("ups1.example.local", None, &Probe::system());
//! println!("{}", check.display_block());
//! ```

pub mod check;
pub mod parse;
pub mod probe;
pub mod settings;
pub mod status;

pub use check::{CheckError, UpsCheck};
pub use parse::{ParseError, ProbeReport, RuntimeUnit, Section};
pub use probe::{Probe, ProbeError, ProcessRunner, Runner};
pub use settings::Settings;
pub use status::Severity;
