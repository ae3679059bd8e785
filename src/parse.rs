//! Scraping of the text printed by the SNMP UPS check plugin.
//!
//! The plugin prints bracketed groups such as
//! `BATTERY:(Runtime 2 Hours, 30:00) OUTPUT:(231.1V, 50.0Hz, Load 25%)`. Each
//! group is a comma separated list of free-text fields.

use std::{fmt, sync::OnceLock};

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("probe output has no {0} section")]
    MissingSection(Section),
    #[error("probe output is missing the {0} field")]
    MissingField(&'static str),
    #[error("could not read a number for {field} from {text:?}")]
    InvalidNumber { field: &'static str, text: String },
}

/// Groups the check plugin knows how to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Battery,
    Input,
    Output,
    SelfTest,
    LastEvent,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Battery,
        Section::Input,
        Section::Output,
        Section::SelfTest,
        Section::LastEvent,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Battery => "BATTERY",
            Section::Input => "INPUT",
            Section::Output => "OUTPUT",
            Section::SelfTest => "SELF TEST",
            Section::LastEvent => "LAST EVENT",
        }
    }

    pub fn from_label(label: &str) -> Option<Section> {
        Section::ALL
            .into_iter()
            .find(|section| section.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// Each label is searched for independently of the others.
fn section_pattern(section: Section) -> &'static Regex {
    static PATTERNS: OnceLock<[Regex; 5]> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        Section::ALL.map(|section| {
            Regex::new(&format!(r"(?i){}:\(([^)]*)\)", regex::escape(section.label())))
                .expect("section pattern is valid")
        })
    });
    &patterns[section as usize]
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

fn runtime_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)runtime(.*)").expect("runtime pattern is valid"))
}

/// Strips markup tags and surrounding whitespace from a field.
pub fn tidy(field: &str) -> String {
    tag_pattern().replace_all(field, "").trim().to_string()
}

/// Upper-cases the first ASCII letter of every whitespace separated word,
/// leaving the rest of each word untouched.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        out.push(if at_word_start { c.to_ascii_uppercase() } else { c });
        at_word_start = matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c');
    }
    out
}

/// Reads the integer at the start of `text`, ignoring anything after it.
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let digits_start = usize::from(text.starts_with(['-', '+']));
    let digits_end = text[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |i| i + digits_start);
    if digits_end == digits_start {
        return None;
    }
    text[..digits_end].parse().ok()
}

/// Raw probe text with lookups for its bracketed sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    raw: String,
}

impl ProbeReport {
    pub fn new(raw: impl Into<String>) -> Self {
        ProbeReport { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Body of the first group labelled `section`, without the brackets.
    pub fn section(&self, section: Section) -> Option<&str> {
        section_pattern(section)
            .captures(&self.raw)
            .and_then(|caps| caps.get(1))
            .map(|body| body.as_str())
    }

    /// Every known section present in the report, in [`Section::ALL`] order.
    pub fn sections(&self) -> Vec<(Section, &str)> {
        Section::ALL
            .into_iter()
            .filter_map(|section| self.section(section).map(|body| (section, body)))
            .collect()
    }

    pub fn require(&self, section: Section) -> Result<&str, ParseError> {
        self.section(section)
            .ok_or(ParseError::MissingSection(section))
    }
}

/// The `OUTPUT` group: voltage, frequency and load, in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputReading {
    pub voltage: String,
    pub frequency: String,
    pub load: String,
}

impl OutputReading {
    pub fn parse(body: &str) -> Result<Self, ParseError> {
        let mut fields = body.split(',').map(tidy);
        let voltage = fields.next().ok_or(ParseError::MissingField("voltage"))?;
        let frequency = fields.next().ok_or(ParseError::MissingField("frequency"))?;
        let load = fields.next().ok_or(ParseError::MissingField("load"))?;

        Ok(OutputReading {
            voltage,
            frequency,
            load,
        })
    }
}

/// Load as printed by the plugin, e.g. `Load 25%`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReading {
    pub label: String,
    /// Percentage token as displayed, including the `%`.
    pub percent_text: String,
    pub percent: i64,
}

impl LoadReading {
    /// Only the first two space separated words up to the `%` are looked at,
    /// so a multi-word label such as `Output Load 25%` does not parse.
    pub fn parse(field: &str) -> Result<Self, ParseError> {
        let end = field
            .find('%')
            .ok_or(ParseError::MissingField("load percentage"))?;
        let titled = title_case(&field[..=end]);
        let mut parts = titled.split(' ');

        let label = parts.next().unwrap_or_default().to_string();
        let percent_text = parts
            .next()
            .ok_or(ParseError::MissingField("load percentage"))?
            .to_string();
        let percent = leading_int(percent_text.trim_end_matches('%')).ok_or_else(|| {
            ParseError::InvalidNumber {
                field: "load",
                text: percent_text.clone(),
            }
        })?;

        Ok(LoadReading {
            label,
            percent_text,
            percent,
        })
    }

    pub fn line(&self) -> String {
        format!("{}: {}", self.label, self.percent_text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeUnit {
    Minutes,
    Seconds,
    Hours { plural: bool },
    /// Anything else, title-cased.
    Other(String),
}

impl Default for RuntimeUnit {
    fn default() -> Self {
        RuntimeUnit::Other(String::new())
    }
}

impl RuntimeUnit {
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "minutes" => return RuntimeUnit::Minutes,
            "seconds" => return RuntimeUnit::Seconds,
            _ => {}
        }

        let titled = title_case(raw);
        match titled.as_str() {
            "Mins" => RuntimeUnit::Minutes,
            "Secs" => RuntimeUnit::Seconds,
            "Hour" => RuntimeUnit::Hours { plural: false },
            "Hours" => RuntimeUnit::Hours { plural: true },
            _ => RuntimeUnit::Other(titled),
        }
    }

    /// Converts `value` to minutes. Seconds and unrecognised units count as
    /// zero minutes.
    pub fn to_minutes(&self, value: i64) -> i64 {
        match self {
            RuntimeUnit::Minutes => value,
            RuntimeUnit::Hours { .. } => value.saturating_mul(60),
            RuntimeUnit::Seconds | RuntimeUnit::Other(_) => 0,
        }
    }
}

impl fmt::Display for RuntimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuntimeUnit::Minutes => write!(f, "Mins"),
            RuntimeUnit::Seconds => write!(f, "Secs"),
            RuntimeUnit::Hours { plural: false } => write!(f, "Hour"),
            RuntimeUnit::Hours { plural: true } => write!(f, "Hours"),
            RuntimeUnit::Other(unit) => write!(f, "{}", unit),
        }
    }
}

/// Remaining runtime from the `BATTERY` group, e.g. `Runtime 2 Hours, 30:00`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeReading {
    /// Number as displayed.
    pub value_text: String,
    pub value: i64,
    pub unit: RuntimeUnit,
    /// Minutes part of the `mm:ss` clock after the comma, rounded.
    pub clock_minutes: i64,
}

impl RuntimeReading {
    pub fn parse(battery: &str) -> Result<Self, ParseError> {
        let after = runtime_pattern()
            .captures(battery)
            .and_then(|caps| caps.get(1))
            .ok_or(ParseError::MissingField("runtime"))?
            .as_str();

        let (main, clock) = match after.split_once(',') {
            Some((main, clock)) => (main, Some(clock)),
            None => (after, None),
        };

        let mut parts = main.trim().split(' ');
        let value_text = parts.next().unwrap_or_default().to_string();
        let unit = parts
            .next()
            .map(RuntimeUnit::parse)
            .ok_or(ParseError::MissingField("runtime unit"))?;
        let value = leading_int(&value_text).ok_or_else(|| ParseError::InvalidNumber {
            field: "runtime",
            text: value_text.clone(),
        })?;

        Ok(RuntimeReading {
            value_text,
            value,
            unit,
            clock_minutes: clock.map_or(0, clock_minutes),
        })
    }

    pub fn minutes(&self) -> i64 {
        self.unit.to_minutes(self.value)
    }

    pub fn line(&self) -> String {
        let extra = if self.unit == RuntimeUnit::Minutes {
            String::new()
        } else {
            format!("{} Mins", self.clock_minutes)
        };
        format!(
            "Runtime:<br />{} {} {}",
            self.value_text, self.unit, extra
        )
    }
}

fn clock_minutes(clock: &str) -> i64 {
    let clock = tidy(clock);
    let minutes = clock.split(':').next().unwrap_or_default();
    minutes
        .trim()
        .parse::<f64>()
        .map_or(0, |m| m.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "BATTERY:(Runtime 2 Hours, 30:00) OUTPUT:(231.1V, 50.0Hz, Load 25%)";

    #[test]
    fn finds_sections_in_any_order() {
        let report = ProbeReport::new(FIXTURE);
        assert_eq!(report.section(Section::Battery), Some("Runtime 2 Hours, 30:00"));
        assert_eq!(report.section(Section::Output), Some("231.1V, 50.0Hz, Load 25%"));
        assert_eq!(report.section(Section::Input), None);

        let swapped = ProbeReport::new("OUTPUT:(1V, 2Hz, Load 3%) BATTERY:(Runtime 4 Minutes, 0:00)");
        assert_eq!(swapped.section(Section::Output), Some("1V, 2Hz, Load 3%"));
        assert_eq!(swapped.section(Section::Battery), Some("Runtime 4 Minutes, 0:00"));
    }

    #[test]
    fn section_labels_ignore_case() {
        let report = ProbeReport::new("battery:(Runtime 5 Minutes, 00:00) Self Test:(OK)");
        assert_eq!(report.section(Section::Battery), Some("Runtime 5 Minutes, 00:00"));
        assert_eq!(report.section(Section::SelfTest), Some("OK"));
    }

    #[test]
    fn unclosed_bracket_does_not_hide_later_section() {
        let report =
            ProbeReport::new("BATTERY:(Runtime 2 Hours, 30:00 (est. OUTPUT:(231V, 50Hz, Load 75%)");
        assert_eq!(report.section(Section::Output), Some("231V, 50Hz, Load 75%"));
        assert_eq!(
            report.section(Section::Battery),
            Some("Runtime 2 Hours, 30:00 (est. OUTPUT:(231V, 50Hz, Load 75%")
        );
    }

    #[test]
    fn first_section_wins() {
        let report = ProbeReport::new("OUTPUT:(first) OUTPUT:(second)");
        assert_eq!(report.section(Section::Output), Some("first"));
    }

    #[test]
    fn lists_present_sections() {
        let report = ProbeReport::new(
            "OK - INPUT:(230V, 50Hz) BATTERY:(Capacity 100%, Runtime 1 Hour, 5:00) \
             LAST EVENT:(None) OUTPUT:(230V, 50Hz, Load 10%)",
        );
        let labels: Vec<Section> = report.sections().into_iter().map(|(s, _)| s).collect();
        assert_eq!(
            labels,
            vec![
                Section::Battery,
                Section::Input,
                Section::Output,
                Section::LastEvent
            ]
        );
    }

    #[test]
    fn missing_section_is_reported() {
        let report = ProbeReport::new("");
        assert_eq!(
            report.require(Section::Output),
            Err(ParseError::MissingSection(Section::Output))
        );
    }

    #[test]
    fn tidy_strips_markup() {
        assert_eq!(tidy("  <b>Load 25%</b><br />"), "Load 25%");
    }

    #[test]
    fn title_case_only_touches_first_letters() {
        assert_eq!(title_case("load 25%"), "Load 25%");
        assert_eq!(title_case("hOURS"), "HOURS");
        assert_eq!(title_case("last  event"), "Last  Event");
        assert_eq!(title_case("éclair ßig"), "éclair ßig");
    }

    #[test]
    fn reads_output_fields() {
        let output = OutputReading::parse("231.1V, 50.0Hz, <i>Load 25%</i>").unwrap();
        assert_eq!(output.voltage, "231.1V");
        assert_eq!(output.frequency, "50.0Hz");
        assert_eq!(output.load, "Load 25%");

        assert_eq!(
            OutputReading::parse("231.1V, 50.0Hz"),
            Err(ParseError::MissingField("load"))
        );
    }

    #[test]
    fn reads_load() {
        let load = LoadReading::parse("load 75% of capacity").unwrap();
        assert_eq!(load.label, "Load");
        assert_eq!(load.percent_text, "75%");
        assert_eq!(load.percent, 75);
        assert_eq!(load.line(), "Load: 75%");
    }

    #[test]
    fn load_without_percent_sign_fails() {
        assert_eq!(
            LoadReading::parse("Load 75"),
            Err(ParseError::MissingField("load percentage"))
        );
    }

    #[test]
    fn multi_word_load_label_fails() {
        assert!(matches!(
            LoadReading::parse("Output Load 75%"),
            Err(ParseError::InvalidNumber { field: "load", .. })
        ));
    }

    #[test]
    fn unit_normalisation() {
        assert_eq!(RuntimeUnit::parse("Minutes"), RuntimeUnit::Minutes);
        assert_eq!(RuntimeUnit::parse("MINUTES"), RuntimeUnit::Minutes);
        assert_eq!(RuntimeUnit::parse("Seconds"), RuntimeUnit::Seconds);
        assert_eq!(RuntimeUnit::parse("hours"), RuntimeUnit::Hours { plural: true });
        assert_eq!(RuntimeUnit::parse("Hour"), RuntimeUnit::Hours { plural: false });
        assert_eq!(RuntimeUnit::parse("days"), RuntimeUnit::Other("Days".to_string()));

        assert_eq!(RuntimeUnit::Minutes.to_string(), "Mins");
        assert_eq!(RuntimeUnit::Seconds.to_string(), "Secs");
        assert_eq!(RuntimeUnit::parse("Hours").to_string(), "Hours");
    }

    #[test]
    fn unit_to_minutes() {
        assert_eq!(RuntimeUnit::Minutes.to_minutes(25), 25);
        assert_eq!(RuntimeUnit::Hours { plural: true }.to_minutes(2), 120);
        assert_eq!(RuntimeUnit::Hours { plural: false }.to_minutes(1), 60);
        assert_eq!(RuntimeUnit::Seconds.to_minutes(900), 0);
        assert_eq!(RuntimeUnit::Other("Days".to_string()).to_minutes(3), 0);
        assert_eq!(RuntimeUnit::Hours { plural: true }.to_minutes(i64::MAX), i64::MAX);
    }

    #[test]
    fn reads_runtime_in_hours() {
        let runtime = RuntimeReading::parse("Runtime 2 Hours, 30:00").unwrap();
        assert_eq!(runtime.value, 2);
        assert_eq!(runtime.unit, RuntimeUnit::Hours { plural: true });
        assert_eq!(runtime.clock_minutes, 30);
        assert_eq!(runtime.minutes(), 120);
        assert_eq!(runtime.line(), "Runtime:<br />2 Hours 30 Mins");
    }

    #[test]
    fn reads_runtime_in_minutes() {
        let runtime = RuntimeReading::parse("Capacity 100%, RUNTIME 25 Minutes, 00:00").unwrap();
        assert_eq!(runtime.value, 25);
        assert_eq!(runtime.unit, RuntimeUnit::Minutes);
        assert_eq!(runtime.minutes(), 25);
        assert_eq!(runtime.line(), "Runtime:<br />25 Mins ");
    }

    #[test]
    fn runtime_in_seconds_counts_as_zero_minutes() {
        let runtime = RuntimeReading::parse("Runtime 45 Seconds, 00:45").unwrap();
        assert_eq!(runtime.unit, RuntimeUnit::Seconds);
        assert_eq!(runtime.minutes(), 0);
        assert_eq!(runtime.line(), "Runtime:<br />45 Secs 0 Mins");
    }

    #[test]
    fn runtime_clock_is_optional() {
        let runtime = RuntimeReading::parse("Runtime 1 Hour").unwrap();
        assert_eq!(runtime.clock_minutes, 0);
        assert_eq!(runtime.minutes(), 60);
    }

    #[test]
    fn runtime_errors() {
        assert_eq!(
            RuntimeReading::parse("Capacity 100%"),
            Err(ParseError::MissingField("runtime"))
        );
        assert_eq!(
            RuntimeReading::parse("Runtime 90, 1:30"),
            Err(ParseError::MissingField("runtime unit"))
        );
        assert!(matches!(
            RuntimeReading::parse("Runtime lots Minutes"),
            Err(ParseError::InvalidNumber { field: "runtime", .. })
        ));
    }

    #[test]
    fn leading_int_reads_prefix() {
        assert_eq!(leading_int("25"), Some(25));
        assert_eq!(leading_int(" 25abc"), Some(25));
        assert_eq!(leading_int("-3"), Some(-3));
        assert_eq!(leading_int("abc"), None);
        assert_eq!(leading_int(""), None);
    }
}
