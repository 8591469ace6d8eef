//! Free-text age and date parsing.
//!
//! Curators write ages as `1y9m`, `2 years 3 months`, `5.5`, `P1Y9M` or as a
//! developmental stage (`prenatal`, `at birth`). Anything that does not
//! parse is returned as [`TemporalValue::Unparsed`], never as an error.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use hnf1b_model::{Age, OntologyClass, TimeElement};
use hnf1b_standards::OnsetTable;

/// Values meaning "no information", distinct from "could not parse".
const NOT_REPORTED: &[&str] = &[
    "not reported",
    "nr",
    "n/a",
    "na",
    "unknown",
    "?",
    "not assessed",
    "-",
    "none reported",
];

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^p(?:(\d+)y)?(?:(\d+)m)?(?:(\d+)w)?(?:(\d+)d)?$").expect("Invalid ISO duration regex")
});

static NUMERIC_YEARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("Invalid numeric regex"));

static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+(?:\.\d+)?)\s*(years|year|yrs|yr|y|months|month|mos|mo|m|weeks|week|wks|wk|w|days|day|d)",
    )
    .expect("Invalid age component regex")
});

/// Words allowed between age components.
const FILLER_WORDS: &[&str] = &["and", "old"];

/// A structured age.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgeDuration {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl AgeDuration {
    /// Build a duration, carrying months of 12 or more into years.
    ///
    /// Returns `None` when the carried years do not fit.
    pub fn new(years: u32, months: u32, days: u32) -> Option<Self> {
        Some(Self {
            years: years.checked_add(months / 12)?,
            months: months % 12,
            days,
        })
    }

    /// ISO 8601 form (`P1Y9M`, `P10D`). A zero age renders as `P0Y`.
    pub fn to_iso8601(&self) -> String {
        let mut out = String::from("P");
        if self.years > 0 {
            out.push_str(&format!("{}Y", self.years));
        }
        if self.months > 0 {
            out.push_str(&format!("{}M", self.months));
        }
        if self.days > 0 {
            out.push_str(&format!("{}D", self.days));
        }
        if out.len() == 1 {
            out.push_str("0Y");
        }
        out
    }
}

impl fmt::Display for AgeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Result of parsing a temporal expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemporalValue {
    Age(AgeDuration),
    /// Developmental stage with its onset term.
    Stage(OntologyClass),
    /// Text that is present but not understood.
    Unparsed(String),
}

impl TemporalValue {
    /// Phenopacket time element, if the value is usable.
    pub fn to_time_element(&self) -> Option<TimeElement> {
        match self {
            Self::Age(age) => Some(TimeElement::Age(Age {
                iso8601duration: age.to_iso8601(),
            })),
            Self::Stage(class) => Some(TimeElement::OntologyClass(class.clone())),
            Self::Unparsed(_) => None,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        matches!(self, Self::Unparsed(_))
    }
}

/// True for blank and "not reported" style values.
pub fn is_not_reported(raw: &str) -> bool {
    let value = raw.trim().to_lowercase();
    value.is_empty() || NOT_REPORTED.contains(&value.as_str())
}

/// Parse a free-text age or developmental stage.
///
/// Returns `None` for empty or not-reported input.
pub fn parse_temporal(raw: &str, stages: &OnsetTable) -> Option<TemporalValue> {
    if is_not_reported(raw) {
        return None;
    }
    let trimmed = raw.trim();
    if let Some(stage) = stages.lookup(trimmed) {
        return Some(TemporalValue::Stage(stage.clone()));
    }
    Some(match parse_age(trimmed) {
        Some(age) => TemporalValue::Age(age),
        None => TemporalValue::Unparsed(trimmed.to_string()),
    })
}

/// Parse an age expression without consulting stage terms.
pub fn parse_age(raw: &str) -> Option<AgeDuration> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    if NUMERIC_YEARS.is_match(&value) {
        return fractional_years(&value);
    }
    if let Some(caps) = ISO_DURATION.captures(&value) {
        let field = |idx: usize| -> Option<u32> {
            caps.get(idx).map_or(Some(0), |m| m.as_str().parse().ok())
        };
        if caps.iter().skip(1).all(|m| m.is_none()) {
            return None;
        }
        let days = field(3)?.checked_mul(7)?.checked_add(field(4)?)?;
        return AgeDuration::new(field(1)?, field(2)?, days);
    }
    parse_compound(&value)
}

fn fractional_years(value: &str) -> Option<AgeDuration> {
    let years: f64 = value.parse().ok()?;
    if !years.is_finite() || years < 0.0 {
        return None;
    }
    let whole = years.trunc();
    let months = ((years - whole) * 12.0).round();
    AgeDuration::new(whole_u32(whole)?, whole_u32(months)?, 0)
}

/// Convert a non-negative whole number, rejecting values past `u32::MAX`.
fn whole_u32(value: f64) -> Option<u32> {
    (value.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&value)).then_some(value as u32)
}

/// `1y9m`, `1 y 9 m`, `2 years 3 months`, `10d`, `6w`, `1.5 years`.
fn parse_compound(value: &str) -> Option<AgeDuration> {
    let mut years = 0.0f64;
    let mut months = 0.0f64;
    let mut days = 0.0f64;
    let mut seen = [false; 4];
    let mut leftover = String::new();
    let mut cursor = 0;

    for caps in COMPONENT.captures_iter(value) {
        let whole = caps.get(0)?;
        leftover.push_str(&value[cursor..whole.start()]);
        leftover.push(' ');
        cursor = whole.end();

        let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
        let slot = match caps.get(2)?.as_str().chars().next()? {
            'y' => 0,
            'm' => 1,
            'w' => 2,
            _ => 3,
        };
        if seen[slot] {
            return None;
        }
        seen[slot] = true;
        match slot {
            0 => years = amount,
            1 => months = amount,
            2 => days += amount * 7.0,
            _ => days += amount,
        }
    }
    leftover.push_str(&value[cursor..]);

    if !seen.iter().any(|s| *s) {
        return None;
    }
    let stray = leftover
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|word| !word.is_empty())
        .any(|word| !FILLER_WORDS.contains(&word));
    if stray {
        return None;
    }

    let whole_years = years.trunc();
    months += (years - whole_years) * 12.0;
    let whole_months = months.trunc();
    days += (months - whole_months) * 30.0;
    AgeDuration::new(
        whole_u32(whole_years)?,
        whole_u32(whole_months.round())?,
        whole_u32(days.round())?,
    )
}

/// Parse a curation review date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `DD.MM.YYYY`, `DD/MM/YYYY`,
/// `YYYY-MM` (first of month) and `YYYY` (1 January).
pub fn parse_review_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    // Datetime exports (`2021-03-04 00:00:00`, `2021-03-04T10:00`).
    if let Some(date_part) = value.split(['T', ' ']).next()
        && date_part.len() < value.len()
        && let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
    {
        return Some(date);
    }
    let parts: Vec<&str> = value.split('-').collect();
    match parts.as_slice() {
        [year, month] if year.len() == 4 => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
        }
        [year] if year.len() == 4 => NaiveDate::from_ymd_opt(year.parse().ok()?, 1, 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_carry_into_years() {
        assert_eq!(AgeDuration::new(1, 21, 0).unwrap().to_iso8601(), "P2Y9M");
        assert_eq!(AgeDuration::new(u32::MAX, 24, 0), None);
        assert_eq!(AgeDuration::default().to_iso8601(), "P0Y");
    }

    #[test]
    fn compound_forms() {
        let expect = |raw: &str, iso: &str| {
            assert_eq!(parse_age(raw).map(|a| a.to_iso8601()).as_deref(), Some(iso), "{raw}");
        };
        expect("1y9m", "P1Y9M");
        expect("1 y 9 m", "P1Y9M");
        expect("2 years 3 months", "P2Y3M");
        expect("2 years and 3 months", "P2Y3M");
        expect("10d", "P10D");
        expect("6w", "P42D");
        expect("P1Y9M", "P1Y9M");
        expect("10", "P10Y");
        expect("5.5", "P5Y6M");
        expect("10y", "P10Y");
        expect("18 months", "P1Y6M");
        expect("4 years old", "P4Y");
    }

    fn onsets() -> OnsetTable {
        OnsetTable::parse(
            "term,code,label\nprenatal,HP:0030674,Antenatal onset\nat birth,HP:0003577,Congenital onset\n",
        )
        .unwrap()
    }

    #[test]
    fn stage_words_map_to_onset_terms() {
        let onsets = onsets();
        match parse_temporal("Prenatal", &onsets) {
            Some(TemporalValue::Stage(class)) => assert_eq!(class.id, "HP:0030674"),
            other => panic!("expected prenatal stage, got {other:?}"),
        }
        assert_eq!(
            parse_temporal("1y9m", &onsets),
            Some(TemporalValue::Age(AgeDuration::new(1, 9, 0).unwrap()))
        );
    }

    #[test]
    fn unknown_text_is_kept_as_unparsed() {
        let onsets = onsets();
        assert_eq!(
            parse_temporal(" teenager ", &onsets),
            Some(TemporalValue::Unparsed("teenager".to_string()))
        );
        assert_eq!(parse_temporal("not reported", &onsets), None);
        assert_eq!(parse_temporal("  ", &onsets), None);
    }

    #[test]
    fn oversized_components_do_not_overflow() {
        let onsets = onsets();
        assert_eq!(parse_age("P1000000000W"), None);
        assert_eq!(parse_age("P4294967295Y24M"), None);
        assert_eq!(parse_age("99999999999 years"), None);
        assert_eq!(parse_age("4294967295 years 24 months"), None);
        assert_eq!(parse_age("1e12"), None);
        assert!(
            parse_temporal("P1000000000W", &onsets)
                .as_ref()
                .is_some_and(TemporalValue::is_unparsed)
        );
    }

    #[test]
    fn rejects_noise() {
        assert_eq!(parse_age("teen"), None);
        assert_eq!(parse_age("1y 2y"), None);
        assert_eq!(parse_age("about 3y"), None);
        assert_eq!(parse_age("P"), None);
    }

    #[test]
    fn review_dates() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        assert_eq!(parse_review_date("2021-03-04"), date(2021, 3, 4));
        assert_eq!(parse_review_date("2021/03/04"), date(2021, 3, 4));
        assert_eq!(parse_review_date("04.03.2021"), date(2021, 3, 4));
        assert_eq!(parse_review_date("04/03/2021"), date(2021, 3, 4));
        assert_eq!(parse_review_date("2021-03"), date(2021, 3, 1));
        assert_eq!(parse_review_date("2021"), date(2021, 1, 1));
        assert_eq!(parse_review_date("2021-03-04 00:00:00"), date(2021, 3, 4));
        assert_eq!(parse_review_date("March"), None);
    }
}
