//! Calendar month detection in user questions.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A calendar month, used to route questions to a single monthly statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

fn month_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december)\b",
        )
        .expect("month pattern is valid")
    })
}

impl Month {
    /// All twelve months in calendar order.
    pub fn all() -> &'static [Month; 12] {
        &MONTHS
    }

    /// The capitalized English name, which is also the statement file stem.
    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Parse a month from its full English name, ignoring case.
    pub fn from_name(name: &str) -> Option<Month> {
        MONTHS.iter().copied().find(|m| m.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Find the leftmost whole-word month name in `text`, ignoring case.
    pub fn find_in(text: &str) -> Option<Month> {
        month_regex().find(text).and_then(|m| Month::from_name(m.as_str()))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_month_case_insensitively() {
        assert_eq!(Month::find_in("What did I spend in JANUARY?"), Some(Month::January));
        assert_eq!(Month::find_in("groceries in march and april"), Some(Month::March));
    }

    #[test]
    fn ignores_month_names_inside_words() {
        assert_eq!(Month::find_in("What's my average monthly spend?"), None);
        assert_eq!(Month::find_in("the mayor's office fee"), None);
    }

    #[test]
    fn from_name_round_trips_every_month() {
        for month in Month::all() {
            assert_eq!(Month::from_name(&month.name().to_lowercase()), Some(*month));
        }
        assert_eq!(Month::from_name("Smarch"), None);
    }
}
