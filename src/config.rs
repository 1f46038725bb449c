//! Ruleset configuration.
//!
//! A [`Ruleset`] selects which generation of the bucketing and facility rules a
//! run uses. It can be read from a JSON file, overridden by `UNIFY_*`
//! environment variables, and finally by CLI flags:
//!
//! ```json
//! {
//!   "bucket_scheme": "binary",
//!   "short_term_max_hours": 336,
//!   "pedestrian_facility": "intersection",
//!   "eco_layout": "merged"
//! }
//! ```

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::unify::bucket::DEFAULT_SHORT_TERM_MAX_HOURS;
pub use crate::unify::facility::PedestrianFacility;

/// Duration bucket scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BucketScheme {
    /// Seven numeric buckets from `0-15h` to `>6mo`.
    #[default]
    Numeric,
    /// `Short-term` / `Long-term`.
    Binary,
}

/// How the pilot ECO-counter exports are split into tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EcoLayout {
    /// Separate pedestrian, bicycle and combined tables.
    #[default]
    PerMode,
    /// One table holding all ECO counts, treated as combined counts.
    Merged,
}

/// Named rulesets matching past deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Legacy,
    Current,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    pub bucket_scheme: BucketScheme,
    pub short_term_max_hours: f64,
    pub pedestrian_facility: PedestrianFacility,
    pub eco_layout: EcoLayout,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::preset(Preset::Legacy)
    }
}

impl Ruleset {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Legacy => Self {
                bucket_scheme: BucketScheme::Numeric,
                short_term_max_hours: DEFAULT_SHORT_TERM_MAX_HOURS,
                pedestrian_facility: PedestrianFacility::Sidewalk,
                eco_layout: EcoLayout::PerMode,
            },
            Preset::Current => Self {
                bucket_scheme: BucketScheme::Binary,
                short_term_max_hours: DEFAULT_SHORT_TERM_MAX_HOURS,
                pedestrian_facility: PedestrianFacility::Intersection,
                eco_layout: EcoLayout::Merged,
            },
        }
    }

    /// Loads a ruleset from a JSON file at `path`. Missing keys keep their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ruleset file '{path}'"))?;
        serde_json::from_str(&content).with_context(|| format!("invalid ruleset file '{path}'"))
    }

    /// Applies `UNIFY_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `UNIFY_*` overrides from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("UNIFY_BUCKET_SCHEME") {
            self.bucket_scheme = parse_choice("UNIFY_BUCKET_SCHEME", &v)?;
        }
        if let Some(v) = lookup("UNIFY_SHORT_TERM_MAX_HOURS") {
            self.short_term_max_hours = v
                .trim()
                .parse()
                .with_context(|| format!("UNIFY_SHORT_TERM_MAX_HOURS is not a number: '{v}'"))?;
        }
        if let Some(v) = lookup("UNIFY_PEDESTRIAN_FACILITY") {
            self.pedestrian_facility = parse_choice("UNIFY_PEDESTRIAN_FACILITY", &v)?;
        }
        if let Some(v) = lookup("UNIFY_ECO_LAYOUT") {
            self.eco_layout = parse_choice("UNIFY_ECO_LAYOUT", &v)?;
        }
        Ok(self)
    }
}

fn parse_choice<T: ValueEnum>(key: &str, value: &str) -> Result<T> {
    let normalized = value.trim().replace('_', "-");
    T::from_str(&normalized, true).map_err(|e| anyhow!("{key}: {e}"))
}
