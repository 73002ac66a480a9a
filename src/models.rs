//! Core data models used throughout gait-rag.
//!
//! An [`Entity`] is a runner or an animal with its gait metrics. A [`Metric`]
//! names one of those metrics and knows how to read and label it, so the
//! retriever and the enrichers never match on field names by hand.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Whether an entity is a human runner or an animal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Human,
    Animal,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Human => "human",
            Kind::Animal => "animal",
        }
    }

    /// Capitalized label used in metric listings (`Human - Usain Bolt: 260`).
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Human => "Human",
            Kind::Animal => "Animal",
        }
    }

    /// Role noun used in entity blocks (`Data for Usain Bolt (runner)`).
    pub fn role(&self) -> &'static str {
        match self {
            Kind::Human => "runner",
            Kind::Animal => "animal",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "human" => Ok(Kind::Human),
            "animal" => Ok(Kind::Animal),
            _ => Err(ValidationError::InvalidKind(s.trim().to_string())),
        }
    }
}

/// How the foot or paw contacts the ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeelStrike {
    None,
    Low,
    Medium,
    High,
}

impl HeelStrike {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeelStrike::None => "none",
            HeelStrike::Low => "low",
            HeelStrike::Medium => "medium",
            HeelStrike::High => "high",
        }
    }
}

impl fmt::Display for HeelStrike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeelStrike {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(HeelStrike::None),
            "low" => Ok(HeelStrike::Low),
            "medium" => Ok(HeelStrike::Medium),
            "high" => Ok(HeelStrike::High),
            _ => Err(ValidationError::InvalidHeelStrike(s.trim().to_string())),
        }
    }
}

/// A runner or animal with its gait metrics.
///
/// Serializes to the same JSON shape as the persisted `runners_data`
/// document: `kind` is written as `"type"`, and derived metrics are omitted
/// until an enricher has set them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: Kind,
    pub cadence: u32,
    pub heel_strike: HeelStrike,
    pub vertical_oscillation: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stride_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency_score: Option<f64>,
}

impl Entity {
    pub fn new(
        kind: Kind,
        cadence: u32,
        heel_strike: HeelStrike,
        vertical_oscillation: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            cadence,
            heel_strike,
            vertical_oscillation,
            description: description.into(),
            stride_length: None,
            efficiency_score: None,
        }
    }

    pub fn set_derived(&mut self, field: DerivedField, value: f64) {
        match field {
            DerivedField::StrideLength => self.stride_length = Some(value),
            DerivedField::EfficiencyScore => self.efficiency_score = Some(value),
        }
    }
}

/// Metrics that extensions add to existing entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedField {
    StrideLength,
    EfficiencyScore,
}

/// Every metric the retriever knows how to match and render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cadence,
    HeelStrike,
    VerticalOscillation,
    StrideLength,
    EfficiencyScore,
}

impl Metric {
    /// Metrics every entity carries.
    pub const BASE: [Metric; 3] = [
        Metric::Cadence,
        Metric::HeelStrike,
        Metric::VerticalOscillation,
    ];

    pub const ALL: [Metric; 5] = [
        Metric::Cadence,
        Metric::HeelStrike,
        Metric::VerticalOscillation,
        Metric::StrideLength,
        Metric::EfficiencyScore,
    ];

    /// Identifier used as the JSON field and the definition key.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Cadence => "cadence",
            Metric::HeelStrike => "heel_strike",
            Metric::VerticalOscillation => "vertical_oscillation",
            Metric::StrideLength => "stride_length",
            Metric::EfficiencyScore => "efficiency_score",
        }
    }

    /// Human-readable label for entity blocks.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Cadence => "Cadence",
            Metric::HeelStrike => "Heel strike",
            Metric::VerticalOscillation => "Vertical oscillation",
            Metric::StrideLength => "Stride length",
            Metric::EfficiencyScore => "Efficiency score",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Cadence => " steps/minute",
            Metric::HeelStrike => "",
            Metric::VerticalOscillation => " cm",
            Metric::StrideLength => " meters",
            Metric::EfficiencyScore => "/100",
        }
    }

    pub fn is_base(&self) -> bool {
        Metric::BASE.contains(self)
    }

    /// Raw value as shown in `name: field=value` listings, if the entity has it.
    pub fn value(&self, entity: &Entity) -> Option<String> {
        match self {
            Metric::Cadence => Some(entity.cadence.to_string()),
            Metric::HeelStrike => Some(entity.heel_strike.to_string()),
            Metric::VerticalOscillation => Some(format_number(entity.vertical_oscillation)),
            Metric::StrideLength => entity.stride_length.map(format_number),
            Metric::EfficiencyScore => entity.efficiency_score.map(format_number),
        }
    }

    /// Value with its unit suffix, for entity blocks.
    pub fn value_with_unit(&self, entity: &Entity) -> Option<String> {
        self.value(entity).map(|v| format!("{}{}", v, self.unit()))
    }
}

/// Format a float the way the persisted documents show it: always with at
/// least one decimal place (`35.0`, `6.2`, `88.8`).
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Round to one decimal place. Exact ties go to the even digit, so 99.25
/// becomes 99.2 and 88.75 becomes 88.8.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_case_insensitive() {
        assert_eq!("Human".parse::<Kind>().unwrap(), Kind::Human);
        assert_eq!(" animal ".parse::<Kind>().unwrap(), Kind::Animal);
        assert!(matches!(
            "robot".parse::<Kind>(),
            Err(ValidationError::InvalidKind(_))
        ));
    }

    #[test]
    fn test_heel_strike_parse() {
        assert_eq!("NONE".parse::<HeelStrike>().unwrap(), HeelStrike::None);
        assert_eq!("high".parse::<HeelStrike>().unwrap(), HeelStrike::High);
        assert!("sideways".parse::<HeelStrike>().is_err());
    }

    #[test]
    fn test_entity_json_shape() {
        let e = Entity::new(Kind::Animal, 70, HeelStrike::None, 35.0, "Hops");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "animal");
        assert_eq!(json["cadence"], 70);
        assert_eq!(json["heel_strike"], "none");
        assert!(json.get("stride_length").is_none());
        assert!(json.get("efficiency_score").is_none());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(35.0), "35.0");
        assert_eq!(format_number(6.2), "6.2");
        assert_eq!(format_number(100.0), "100.0");
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(88.75), 88.8);
        assert_eq!(round1(99.25), 99.2);
        assert_eq!(round1(81.00000000000001), 81.0);
    }

    #[test]
    fn test_metric_values() {
        let mut e = Entity::new(Kind::Human, 260, HeelStrike::Medium, 4.8, "Sprinter");
        assert_eq!(Metric::Cadence.value_with_unit(&e).unwrap(), "260 steps/minute");
        assert_eq!(Metric::StrideLength.value(&e), None);
        e.set_derived(DerivedField::StrideLength, 2.6);
        assert_eq!(Metric::StrideLength.value_with_unit(&e).unwrap(), "2.6 meters");
    }
}
