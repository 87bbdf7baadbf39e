//! Cardio calorie estimation from MET values.
//!
//! kcal = MET × body weight (kg) × duration (hours), rounded to 0.1.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    Moderate,
    Vigorous,
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intensity::Light => "light",
            Intensity::Moderate => "moderate",
            Intensity::Vigorous => "vigorous",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Intensity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "light" | "low" => Ok(Intensity::Light),
            "moderate" | "medium" => Ok(Intensity::Moderate),
            "vigorous" | "high" => Ok(Intensity::Vigorous),
            other => Err(Error::Calories(format!("Unknown intensity: {}", other))),
        }
    }
}

/// MET values per activity as (light, moderate, vigorous)
static MET_TABLE: Lazy<BTreeMap<&'static str, [f64; 3]>> = Lazy::new(|| {
    BTreeMap::from([
        ("running", [6.0, 9.8, 11.5]),
        ("cycling", [4.0, 8.0, 10.0]),
        ("rowing", [4.8, 7.0, 8.5]),
        ("swimming", [5.8, 8.3, 10.0]),
        ("walking", [2.8, 3.5, 5.0]),
        ("elliptical", [4.6, 5.0, 6.5]),
        ("jump_rope", [8.8, 11.8, 12.3]),
        ("stair_climbing", [4.0, 8.8, 9.0]),
        ("hiit", [6.0, 8.0, 10.0]),
    ])
});

/// Activities known to the estimator, alphabetically
pub fn activities() -> Vec<&'static str> {
    MET_TABLE.keys().copied().collect()
}

pub fn met_value(activity: &str, intensity: Intensity) -> Result<f64> {
    let key = normalize(activity);
    let row = MET_TABLE
        .get(key.as_str())
        .ok_or_else(|| Error::Calories(format!("Unknown activity: {}", activity)))?;

    Ok(match intensity {
        Intensity::Light => row[0],
        Intensity::Moderate => row[1],
        Intensity::Vigorous => row[2],
    })
}

/// Estimated kilocalories burned
pub fn estimate_calories(
    activity: &str,
    intensity: Intensity,
    minutes: f64,
    weight_kg: f64,
) -> Result<f64> {
    if !(minutes > 0.0) || !minutes.is_finite() {
        return Err(Error::Calories(format!(
            "Duration must be positive, got {} minutes",
            minutes
        )));
    }
    if !(weight_kg > 0.0) || !weight_kg.is_finite() {
        return Err(Error::Calories(format!(
            "Body weight must be positive, got {} kg",
            weight_kg
        )));
    }

    let met = met_value(activity, intensity)?;
    let kcal = met * weight_kg * minutes / 60.0;
    tracing::debug!(activity, %intensity, met, minutes, weight_kg, kcal, "Estimated calories");

    Ok((kcal * 10.0).round() / 10.0)
}

/// Accept "Jump Rope", "jump-rope" and "jump_rope" alike
fn normalize(activity: &str) -> String {
    activity
        .trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}
