//! Efficiency score: a 0–100 heuristic computed from the base metrics.
//!
//! ```text
//! score = max(0, 100 - vo_penalty - cadence_penalty - heel_strike_penalty)
//! ```
//!
//! | Penalty | Human | Animal |
//! |---------|-------|--------|
//! | vertical oscillation | `|vo - 6| × 5` | `max(0, vo - 15) × 2` |
//! | cadence (distance runner) | `|cadence - 180| × 0.5` | 0 |
//! | cadence (other) | `max(0, 250 - cadence) × 0.25` | 0 |
//! | heel strike | high 15, medium 5, else 0 | same |
//!
//! A human counts as a distance runner when the description mentions
//! "marathon" or "distance". The result is rounded to one decimal.

use std::fmt::Write;

use tracing::info;

use super::{definition_or_placeholder, ContextEnricher};
use crate::error::StoreError;
use crate::models::{format_number, round1, DerivedField, Entity, HeelStrike, Kind};
use crate::store::{DefinitionStore, EntityStore};

pub const NAME: &str = "efficiency_score";

pub const DEFINITION: &str = "Efficiency score is a calculated metric (0-100) based on optimal biomechanics. It considers vertical oscillation, cadence, and heel strike pattern, with higher scores indicating more efficient running form.";

const TRIGGERS: [&str; 3] = ["efficien", "score", "best form"];

/// Compute the efficiency score for one entity.
pub fn efficiency_score(entity: &Entity) -> f64 {
    let vo = entity.vertical_oscillation;
    let cadence = entity.cadence as f64;

    let vo_penalty = match entity.kind {
        Kind::Human => (vo - 6.0).abs() * 5.0,
        Kind::Animal => (vo - 15.0).max(0.0) * 2.0,
    };

    let cadence_penalty = match entity.kind {
        Kind::Human if is_distance_runner(entity) => (cadence - 180.0).abs() * 0.5,
        Kind::Human => (250.0 - cadence).max(0.0) * 0.25,
        Kind::Animal => 0.0,
    };

    let heel_strike_penalty = match entity.heel_strike {
        HeelStrike::High => 15.0,
        HeelStrike::Medium => 5.0,
        HeelStrike::Low | HeelStrike::None => 0.0,
    };

    round1((100.0 - vo_penalty - cadence_penalty - heel_strike_penalty).max(0.0))
}

fn is_distance_runner(entity: &Entity) -> bool {
    let description = entity.description.to_lowercase();
    description.contains("marathon") || description.contains("distance")
}

/// Adds `efficiency_score` to every entity.
pub struct EfficiencyScoreEnricher;

impl ContextEnricher for EfficiencyScoreEnricher {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Efficiency score (0-100) from vertical oscillation, cadence, and heel strike"
    }

    fn apply(
        &self,
        entities: &mut EntityStore,
        definitions: &mut DefinitionStore,
    ) -> Result<usize, StoreError> {
        let scores: Vec<(String, f64)> = entities
            .iter()
            .map(|(name, entity)| (name.to_string(), efficiency_score(entity)))
            .collect();
        for (name, score) in &scores {
            entities.set_field(name, DerivedField::EfficiencyScore, *score)?;
        }
        definitions.insert(NAME, DEFINITION);
        info!(updated = scores.len(), "applied efficiency score");
        Ok(scores.len())
    }

    fn enrich(
        &self,
        entities: &EntityStore,
        definitions: &DefinitionStore,
        query: &str,
        _base: &str,
    ) -> Option<String> {
        let q = query.to_lowercase();
        if !TRIGGERS.iter().any(|t| q.contains(t)) {
            return None;
        }

        let mut out = String::from("\nEfficiency scores (higher is better):\n");
        for (name, entity, score) in ranked(entities) {
            let _ = writeln!(
                out,
                "- {} - {}: {}/100",
                entity.kind.label(),
                name,
                format_number(score)
            );
        }
        let _ = writeln!(
            out,
            "\nDefinition of efficiency score: {}",
            definition_or_placeholder(definitions, NAME)
        );
        Some(out)
    }
}

/// Scored entities, highest first. Ties keep store order.
pub fn ranked(entities: &EntityStore) -> Vec<(&str, &Entity, f64)> {
    let mut scored: Vec<(&str, &Entity, f64)> = entities
        .iter()
        .filter_map(|(name, entity)| entity.efficiency_score.map(|s| (name, entity, s)))
        .collect();
    scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    scored
}
