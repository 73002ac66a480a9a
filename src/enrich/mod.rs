//! Context enrichers: optional metrics layered on top of base retrieval.
//!
//! An enricher does two things:
//!
//! - [`apply`](ContextEnricher::apply) adds its metric to existing entities
//!   and its definition to the definition store.
//! - [`enrich`](ContextEnricher::enrich) looks at a query and, when its
//!   trigger words appear, returns extra context text.
//!
//! The [`EnricherRegistry`] holds enrichers in registration order. The final
//! context is the base retrieval output followed by every enricher's output
//! in that order, so each enricher adds on top of everything before it.
//!
//! ```text
//! query ──▶ retrieve() ──▶ base
//!                            │
//!            ┌───────────────┤
//!            ▼               ▼
//!      StrideLength   EfficiencyScore   ...
//!            │               │
//!            └──────┬────────┘
//!                   ▼
//!         base + stride + efficiency
//! ```

pub mod efficiency;
pub mod stride;

pub use efficiency::EfficiencyScoreEnricher;
pub use stride::StrideLengthEnricher;

use crate::error::StoreError;
use crate::store::{DefinitionStore, EntityStore};

/// A metric extension that augments the stores and the retrieved context.
pub trait ContextEnricher: Send + Sync {
    /// Short identifier (e.g. `"stride_length"`). Registering two enrichers
    /// with the same name keeps only the first.
    fn name(&self) -> &str;

    /// One-line description for `help` output.
    fn description(&self) -> &str;

    /// Add the metric to existing entities and its definition.
    ///
    /// Never creates entities. Safe to call repeatedly: a second call
    /// recomputes the same values. Returns the number of entities updated.
    fn apply(
        &self,
        entities: &mut EntityStore,
        definitions: &mut DefinitionStore,
    ) -> Result<usize, StoreError>;

    /// Extra context for `query`, or `None` when the query does not ask for
    /// this metric. `base` is the context produced so far.
    fn enrich(
        &self,
        entities: &EntityStore,
        definitions: &DefinitionStore,
        query: &str,
        base: &str,
    ) -> Option<String>;
}

/// Ordered list of enabled enrichers.
pub struct EnricherRegistry {
    enrichers: Vec<Box<dyn ContextEnricher>>,
}

impl EnricherRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            enrichers: Vec::new(),
        }
    }

    /// Register an enricher. Returns `false` if one with the same name is
    /// already registered.
    pub fn register(&mut self, enricher: Box<dyn ContextEnricher>) -> bool {
        if self.find(enricher.name()).is_some() {
            return false;
        }
        self.enrichers.push(enricher);
        true
    }

    pub fn enrichers(&self) -> &[Box<dyn ContextEnricher>] {
        &self.enrichers
    }

    pub fn find(&self, name: &str) -> Option<&dyn ContextEnricher> {
        self.enrichers
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.enrichers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.enrichers.len()
    }

    /// Re-apply every enricher, in order, to the stores.
    pub fn apply_all(
        &self,
        entities: &mut EntityStore,
        definitions: &mut DefinitionStore,
    ) -> Result<(), StoreError> {
        for enricher in &self.enrichers {
            enricher.apply(entities, definitions)?;
        }
        Ok(())
    }

    /// Append every enricher's output to `base`, in registration order.
    pub fn enrich(
        &self,
        entities: &EntityStore,
        definitions: &DefinitionStore,
        query: &str,
        base: String,
    ) -> String {
        let mut context = base;
        for enricher in &self.enrichers {
            if let Some(extra) = enricher.enrich(entities, definitions, query, &context) {
                tracing::debug!(enricher = enricher.name(), "enricher appended context");
                context.push_str(&extra);
            }
        }
        context
    }
}

impl Default for EnricherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Names accepted by [`builtin`], in the order `help` lists them.
pub const BUILTIN: [&str; 2] = [stride::NAME, efficiency::NAME];

/// Look up a built-in enricher by name.
pub fn builtin(name: &str) -> Option<Box<dyn ContextEnricher>> {
    match name {
        stride::NAME => Some(Box::new(StrideLengthEnricher::new())),
        efficiency::NAME => Some(Box::new(EfficiencyScoreEnricher)),
        _ => None,
    }
}

pub(crate) fn definition_or_placeholder<'a>(
    definitions: &'a DefinitionStore,
    key: &str,
) -> &'a str {
    definitions.get(key).unwrap_or("No definition available")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieve::retrieve;
    use crate::seed::{default_definitions, default_entities};

    #[test]
    fn test_register_dedups_by_name() {
        let mut registry = EnricherRegistry::new();
        assert!(registry.register(Box::new(StrideLengthEnricher::new())));
        assert!(!registry.register(Box::new(StrideLengthEnricher::new())));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(builtin("stride_length").unwrap().name(), "stride_length");
        assert_eq!(builtin("efficiency_score").unwrap().name(), "efficiency_score");
        assert!(builtin("ground_contact").is_none());
        for name in BUILTIN {
            let enricher = builtin(name).unwrap();
            assert_eq!(enricher.name(), name);
            assert!(!enricher.description().is_empty());
        }
    }

    #[test]
    fn test_enrichers_append_in_registration_order() {
        let mut entities = default_entities();
        let mut definitions = default_definitions();
        let mut registry = EnricherRegistry::new();
        registry.register(Box::new(StrideLengthEnricher::new()));
        registry.register(Box::new(EfficiencyScoreEnricher));
        registry.apply_all(&mut entities, &mut definitions).unwrap();

        let query = "Who has the best stride and efficiency score?";
        let base = retrieve(&entities, &definitions, query);
        let context = registry.enrich(&entities, &definitions, query, base.clone());

        assert!(context.starts_with(&base));
        let stride_at = context.find("Stride length data:").unwrap();
        let efficiency_at = context.find("Efficiency scores (higher is better):").unwrap();
        assert!(stride_at < efficiency_at);
    }

    #[test]
    fn test_no_trigger_leaves_base_unchanged() {
        let mut entities = default_entities();
        let mut definitions = default_definitions();
        let mut registry = EnricherRegistry::new();
        registry.register(Box::new(StrideLengthEnricher::new()));
        registry.register(Box::new(EfficiencyScoreEnricher));
        registry.apply_all(&mut entities, &mut definitions).unwrap();

        let base = retrieve(&entities, &definitions, "Tell me about Bolt");
        let context = registry.enrich(
            &entities,
            &definitions,
            "Tell me about Bolt",
            base.clone(),
        );
        assert_eq!(context, base);
    }
}
