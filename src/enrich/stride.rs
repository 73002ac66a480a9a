//! Stride length: a fixed per-entity lookup table.

use std::fmt::Write;

use tracing::info;

use super::{definition_or_placeholder, ContextEnricher};
use crate::error::StoreError;
use crate::models::DerivedField;
use crate::store::{DefinitionStore, EntityStore};

pub const NAME: &str = "stride_length";

pub const DEFINITION: &str = "Stride length is the distance covered in a single stride (two steps), measured in meters. Elite human runners typically have stride lengths between 1.5-2.6 meters, while animals can have much longer strides.";

/// Typical stride lengths in meters for the built-in entities.
pub const STRIDE_LENGTHS: [(&str, f64); 8] = [
    ("Eliud Kipchoge", 1.8),
    ("Usain Bolt", 2.6),
    ("Mo Farah", 1.7),
    ("Allyson Felix", 2.2),
    ("Kenenisa Bekele", 1.8),
    ("Cheetah", 7.5),
    ("Horse", 6.0),
    ("Kangaroo", 9.0),
];

const TRIGGERS: [&str; 2] = ["stride", "length"];

/// Adds `stride_length` from [`STRIDE_LENGTHS`]. Entities outside the
/// table are left without the field.
pub struct StrideLengthEnricher {
    table: Vec<(String, f64)>,
}

impl StrideLengthEnricher {
    pub fn new() -> Self {
        Self {
            table: STRIDE_LENGTHS
                .iter()
                .map(|(name, len)| (name.to_string(), *len))
                .collect(),
        }
    }
}

impl Default for StrideLengthEnricher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextEnricher for StrideLengthEnricher {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Stride length per entity (meters), from a lookup table"
    }

    fn apply(
        &self,
        entities: &mut EntityStore,
        definitions: &mut DefinitionStore,
    ) -> Result<usize, StoreError> {
        let mut updated = 0;
        for (name, length) in &self.table {
            if entities.contains(name) {
                entities.set_field(name, DerivedField::StrideLength, *length)?;
                updated += 1;
            }
        }
        definitions.insert(NAME, DEFINITION);
        info!(updated, "applied stride length");
        Ok(updated)
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

        let mut out = String::from("\nStride length data:\n");
        for (name, entity) in entities.iter() {
            if let Some(length) = entity.stride_length {
                let _ = writeln!(
                    out,
                    "- {} - {}: {} meters",
                    entity.kind.label(),
                    name,
                    crate::models::format_number(length)
                );
            }
        }
        let _ = writeln!(
            out,
            "\nDefinition of stride length: {}",
            definition_or_placeholder(definitions, NAME)
        );
        Some(out)
    }
}
