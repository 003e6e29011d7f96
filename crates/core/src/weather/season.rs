//! Calendar seasons and climate periods

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Meteorological season by day of year (northern hemisphere equinox/solstice split)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    /// Days 80-171
    Spring,
    /// Days 172-263
    Summer,
    /// Days 264-354
    Autumn,
    /// Days 355-366 and 1-79
    Winter,
}

impl Season {
    /// All seasons in calendar order starting from spring
    pub const ALL: [Season; 4] = [
        Season::Spring,
        Season::Summer,
        Season::Autumn,
        Season::Winter,
    ];

    /// Season containing a 1-based day of year
    pub fn from_day_of_year(day: u32) -> Self {
        match day {
            80..=171 => Season::Spring,
            172..=263 => Season::Summer,
            264..=354 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    /// Lowercase label
    pub const fn label(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

/// Span of the wind climate a statistics set describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClimatePeriod {
    /// Whole year
    Annual,
    /// One season
    Season(Season),
}

impl ClimatePeriod {
    /// Annual first, then the seasons in calendar order
    pub const ALL: [ClimatePeriod; 5] = [
        ClimatePeriod::Annual,
        ClimatePeriod::Season(Season::Spring),
        ClimatePeriod::Season(Season::Summer),
        ClimatePeriod::Season(Season::Autumn),
        ClimatePeriod::Season(Season::Winter),
    ];

    /// Label used in file names (`annual`, `spring`, ...)
    pub const fn label(self) -> &'static str {
        match self {
            ClimatePeriod::Annual => "annual",
            ClimatePeriod::Season(season) => season.label(),
        }
    }

    /// True if a record on this day of year belongs to the period
    pub fn contains_day(self, day: u32) -> bool {
        match self {
            ClimatePeriod::Annual => true,
            ClimatePeriod::Season(season) => Season::from_day_of_year(day) == season,
        }
    }
}

impl fmt::Display for ClimatePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ClimatePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClimatePeriod::ALL
            .into_iter()
            .find(|p| p.label() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown climate period '{s}'"))
    }
}
