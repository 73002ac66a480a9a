//! Keyword-based context retrieval.
//!
//! Given a free-text question, selects and formats a subset of the entity
//! and definition stores into one text block. Branches are tried in priority
//! order:
//!
//! 1. **Comparison**: mentions both humans and animals, or "compare" with
//!    either: all humans, then all animals.
//! 2. **Similarity**: "similar" with humans or animals: one flat listing.
//! 3. **Matching**: entity names (full or by word) and metric identifiers
//!    found in the question.
//! 4. **Fallback**: nothing matched: everything, plus all definitions.
//!
//! The first two branches are exclusive. Enrichers from
//! [`crate::enrich`] append to whatever this module returns.
//!
//! Output depends only on the store contents and the query string.

use std::collections::HashSet;
use std::fmt::Write;

use tracing::debug;

use crate::models::{Entity, Kind, Metric};
use crate::store::{DefinitionStore, EntityStore};

/// Which branch produced the context. Exposed for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Comparison,
    Similarity,
    Matched,
    Fallback,
}

/// Build the context for `query`.
pub fn retrieve(entities: &EntityStore, definitions: &DefinitionStore, query: &str) -> String {
    retrieve_with_intent(entities, definitions, query).1
}

/// Build the context for `query` and report which branch produced it.
pub fn retrieve_with_intent(
    entities: &EntityStore,
    definitions: &DefinitionStore,
    query: &str,
) -> (Intent, String) {
    let q = query.to_lowercase();
    let mentions_human = q.contains("human");
    let mentions_animal = q.contains("animal");

    let (intent, context) = if (mentions_human && mentions_animal)
        || (q.contains("compare") && (mentions_human || mentions_animal))
    {
        (Intent::Comparison, comparison_context(entities))
    } else if q.contains("similar") && (mentions_human || mentions_animal) {
        (Intent::Similarity, similarity_context(entities))
    } else {
        match matched_context(entities, definitions, &q) {
            Some(context) => (Intent::Matched, context),
            None => (Intent::Fallback, fallback_context(entities, definitions)),
        }
    };

    debug!(?intent, bytes = context.len(), "retrieved context");
    (intent, context)
}

/// `name: cadence=185, heel_strike=low, vertical_oscillation=6.2[, ...]`
pub fn compact_line(name: &str, entity: &Entity) -> String {
    let fields = Metric::ALL
        .iter()
        .filter_map(|m| m.value(entity).map(|v| format!("{}={}", m.key(), v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}: {}", name, fields)
}

fn comparison_context(entities: &EntityStore) -> String {
    let mut out = String::from("Humans vs Animals Comparison:\n\n");
    out.push_str("Humans:\n");
    for (name, entity) in entities.of_kind(Kind::Human) {
        let _ = writeln!(out, "- {}", compact_line(name, entity));
    }
    out.push_str("\nAnimals:\n");
    for (name, entity) in entities.of_kind(Kind::Animal) {
        let _ = writeln!(out, "- {}", compact_line(name, entity));
    }
    out
}

fn similarity_context(entities: &EntityStore) -> String {
    let mut out = String::from("All runners and animals data for similarity comparison:\n\n");
    for (name, entity) in entities.iter() {
        let label = match entity.kind {
            Kind::Human => "Human runner",
            Kind::Animal => "Animal",
        };
        let _ = writeln!(out, "{} - {}", label, compact_line(name, entity));
    }
    out
}

/// Entity and metric matching. Returns `None` when nothing matched.
fn matched_context(
    entities: &EntityStore,
    definitions: &DefinitionStore,
    query_lower: &str,
) -> Option<String> {
    let mut out = String::new();
    let mut found = false;

    let query_words = query_tokens(query_lower);
    for (name, entity) in entities.iter() {
        if name_matches(name, query_lower, &query_words) {
            debug!(entity = name, "entity matched");
            out.push_str(&entity_block(name, entity));
            found = true;
        }
    }

    let normalized = query_lower.replace(' ', "_");
    for metric in searchable_metrics(definitions) {
        let key = metric.key();
        let spaced = key.replace('_', " ");
        if normalized.contains(key) || query_lower.contains(&spaced) {
            debug!(metric = key, "metric matched");
            out.push_str(&metric_block(entities, definitions, metric));
            found = true;
        }
    }

    found.then_some(out)
}

fn fallback_context(entities: &EntityStore, definitions: &DefinitionStore) -> String {
    let mut out = String::from("Human runners:\n");
    for (name, entity) in entities.of_kind(Kind::Human) {
        let _ = writeln!(out, "- {}", compact_line(name, entity));
    }
    out.push_str("\nAnimals:\n");
    for (name, entity) in entities.of_kind(Kind::Animal) {
        let _ = writeln!(out, "- {}", compact_line(name, entity));
    }
    if !definitions.is_empty() {
        out.push_str("\nMetric definitions:\n");
        for (key, text) in definitions.iter() {
            let _ = writeln!(out, "- {}: {}", key, text);
        }
    }
    out
}

/// Whitespace tokens of the query. Punctuation stays attached, so "bolt?"
/// is not the word "bolt".
fn query_tokens(query_lower: &str) -> HashSet<&str> {
    query_lower.split_whitespace().collect()
}

fn name_matches(name: &str, query_lower: &str, query_words: &HashSet<&str>) -> bool {
    let name_lower = name.to_lowercase();
    (name_lower.contains(char::is_alphanumeric) && query_lower.contains(&name_lower))
        || name_lower
            .split_whitespace()
            .any(|word| query_words.contains(word))
}

/// Base metrics plus every derived metric that has a definition.
fn searchable_metrics(definitions: &DefinitionStore) -> Vec<Metric> {
    Metric::ALL
        .into_iter()
        .filter(|m| m.is_base() || definitions.contains(m.key()))
        .collect()
}

fn entity_block(name: &str, entity: &Entity) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Data for {} ({}):", name, entity.kind.role());
    let _ = writeln!(out, "- Description: {}", entity.description);
    for metric in Metric::ALL {
        if let Some(value) = metric.value_with_unit(entity) {
            let _ = writeln!(out, "- {}: {}", metric.label(), value);
        }
    }
    out.push('\n');
    out
}

fn metric_block(entities: &EntityStore, definitions: &DefinitionStore, metric: Metric) -> String {
    let key = metric.key();
    let definition = definitions.get(key).unwrap_or("No definition available");
    let mut out = String::new();
    let _ = writeln!(out, "Definition of {}: {}\n", key, definition);
    let _ = writeln!(out, "All {} data:", key);
    for (name, entity) in entities.iter() {
        if let Some(value) = metric.value(entity) {
            let _ = writeln!(out, "- {} - {}: {}", entity.kind.label(), name, value);
        }
    }
    out.push('\n');
    out
}
