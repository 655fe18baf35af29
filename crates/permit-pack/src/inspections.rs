//! Inspection rules and the inspection catalog document.
//!
//! The fee/validation path never evaluates these; the scheduling
//! workflow consumes them when an inspection is requested.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Day of the week an inspection slot may fall on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Whether this day matches a calendar date's weekday.
    pub fn matches(&self, date: NaiveDate) -> bool {
        let calendar = match date.weekday() {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        };
        *self == calendar
    }
}

/// When an inspection may be booked, relative to the request date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingWindow {
    /// Earliest bookable day, in days from today.
    pub min_days_out: u32,
    /// Latest bookable day, in days from today.
    pub max_days_out: u32,
    /// Weekdays with inspector availability; empty means any day.
    #[serde(default)]
    pub available_days: Vec<Weekday>,
}

impl SchedulingWindow {
    /// Whether `date` is bookable when requested on `today`.
    pub fn allows(&self, today: NaiveDate, date: NaiveDate) -> bool {
        let days_out = (date - today).num_days();
        if days_out < i64::from(self.min_days_out) || days_out > i64::from(self.max_days_out) {
            return false;
        }
        self.available_days.is_empty() || self.available_days.iter().any(|day| day.matches(date))
    }
}

/// One inspection type a jurisdiction performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRule {
    /// Type identifier, e.g. "electrical_rough".
    #[serde(rename = "type")]
    pub inspection_type: String,
    pub label: String,
    /// Inspection types that must pass before this one can be booked.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling_window: Option<SchedulingWindow>,
}

/// The `inspections.yaml` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct InspectionDocument {
    #[serde(default)]
    pub inspection_types: Vec<InspectionRule>,
}
