//! Resolution time estimation.
//!
//! This is a heuristic, not a statistical model: a fixed base table per
//! (category, priority) scaled by a time-of-day factor. Nothing here is fitted
//! against historical resolution data.

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::models::{Category, Priority};

/// Base minutes for one (category, priority) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolutionTimeEntry {
    pub category: Category,
    pub priority: Priority,
    pub minutes: u32,
}

impl ResolutionTimeEntry {
    pub fn new(category: Category, priority: Priority, minutes: u32) -> Self {
        Self {
            category,
            priority,
            minutes,
        }
    }

    /// Built-in base table.
    pub fn defaults() -> Vec<ResolutionTimeEntry> {
        use Category::*;
        use Priority::*;

        // (category, [critical, high, medium, low])
        let rows = [
            (Hardware, [120, 180, 240, 480]),
            (Software, [60, 120, 180, 360]),
            (Network, [90, 150, 240, 480]),
            (Access, [30, 45, 60, 120]),
            (Email, [45, 90, 120, 240]),
        ];
        rows.iter()
            .flat_map(|(category, minutes)| {
                [Critical, High, Medium, Low]
                    .into_iter()
                    .zip(minutes.iter())
                    .map(move |(priority, m)| ResolutionTimeEntry::new(*category, priority, *m))
            })
            .collect()
    }
}

/// Knobs for the estimator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_business_hours"))]
pub struct EstimatorSettings {
    /// Used for pairs missing from the table (every OTHER ticket with the defaults).
    pub default_minutes: u32,
    #[validate(range(max = 23))]
    pub business_start_hour: u32,
    #[validate(range(max = 24))]
    pub business_end_hour: u32,
    /// Applied when the local hour is within `[business_start_hour, business_end_hour)`.
    #[validate(range(min = 0.0))]
    pub business_multiplier: f64,
    #[validate(range(min = 0.0))]
    pub after_hours_multiplier: f64,
}

fn validate_business_hours(settings: &EstimatorSettings) -> Result<(), validator::ValidationError> {
    if settings.business_start_hour >= settings.business_end_hour {
        return Err(validator::ValidationError::new("business_hours_empty"));
    }
    Ok(())
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            default_minutes: 180,
            business_start_hour: 9,
            business_end_hour: 17,
            business_multiplier: 1.5,
            after_hours_multiplier: 0.8,
        }
    }
}

pub struct ResolutionTimeEstimator {
    table: HashMap<(Category, Priority), u32>,
    settings: EstimatorSettings,
}

impl Default for ResolutionTimeEstimator {
    fn default() -> Self {
        Self::new(&ResolutionTimeEntry::defaults(), &EstimatorSettings::default())
    }
}

impl ResolutionTimeEstimator {
    pub fn new(entries: &[ResolutionTimeEntry], settings: &EstimatorSettings) -> Self {
        let table = entries
            .iter()
            .map(|e| ((e.category, e.priority), e.minutes))
            .collect();
        Self {
            table,
            settings: settings.clone(),
        }
    }

    pub fn base_minutes(&self, category: Category, priority: Priority) -> u32 {
        self.table
            .get(&(category, priority))
            .copied()
            .unwrap_or(self.settings.default_minutes)
    }

    /// Estimated minutes to resolution for a ticket raised at `now`, in `now`'s own
    /// timezone. Fractions are truncated.
    pub fn estimate<Tz: TimeZone>(
        &self,
        category: Category,
        priority: Priority,
        now: &DateTime<Tz>,
    ) -> u32 {
        let hour = now.hour();
        let in_business_hours =
            hour >= self.settings.business_start_hour && hour < self.settings.business_end_hour;
        let multiplier = if in_business_hours {
            self.settings.business_multiplier
        } else {
            self.settings.after_hours_multiplier
        };
        (f64::from(self.base_minutes(category, priority)) * multiplier) as u32
    }
}
