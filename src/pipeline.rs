//! The RAG pipeline: stores, enrichers, and the completion provider in one
//! value that the CLI and REPL drive.
//!
//! All state lives here and is handed to the retriever, the enrichers and
//! the answering facade by reference.

use std::path::Path;

use tracing::{info, warn};

use crate::answer::{self, AnswerSettings};
use crate::completion::CompletionProvider;
use crate::enrich::{ContextEnricher, EnricherRegistry};
use crate::error::{StoreError, ValidationError};
use crate::models::Entity;
use crate::retrieve;
use crate::seed::{default_definitions, default_entities};
use crate::store::{self, DefinitionStore, EntityStore};

pub struct Pipeline {
    entities: EntityStore,
    definitions: DefinitionStore,
    enrichers: EnricherRegistry,
    provider: Box<dyn CompletionProvider>,
    settings: AnswerSettings,
}

impl Pipeline {
    /// A pipeline over the built-in dataset.
    pub fn new(provider: Box<dyn CompletionProvider>, settings: AnswerSettings) -> Self {
        Self::with_stores(default_entities(), default_definitions(), provider, settings)
    }

    pub fn with_stores(
        entities: EntityStore,
        definitions: DefinitionStore,
        provider: Box<dyn CompletionProvider>,
        settings: AnswerSettings,
    ) -> Self {
        Self {
            entities,
            definitions,
            enrichers: EnricherRegistry::new(),
            provider,
            settings,
        }
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn definitions(&self) -> &DefinitionStore {
        &self.definitions
    }

    pub fn enrichers(&self) -> &EnricherRegistry {
        &self.enrichers
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Base retrieval followed by every enabled enricher.
    pub fn retrieve(&self, query: &str) -> String {
        let base = retrieve::retrieve(&self.entities, &self.definitions, query);
        self.enrichers
            .enrich(&self.entities, &self.definitions, query, base)
    }

    /// Retrieve context for `query` and answer it. Never fails.
    pub fn answer(&self, query: &str) -> String {
        let context = self.retrieve(query);
        self.answer_with_context(query, &context)
    }

    /// Answer `query` from an already retrieved context.
    pub fn answer_with_context(&self, query: &str, context: &str) -> String {
        answer::answer(self.provider.as_ref(), &self.settings, context, query)
    }

    /// Apply and register an enricher. Returns `false` if it was already
    /// enabled, in which case nothing changes.
    pub fn enable(&mut self, enricher: Box<dyn ContextEnricher>) -> Result<bool, StoreError> {
        if self.enrichers.find(enricher.name()).is_some() {
            return Ok(false);
        }
        let updated = enricher.apply(&mut self.entities, &mut self.definitions)?;
        info!(enricher = enricher.name(), updated, "enricher enabled");
        self.enrichers.register(enricher);
        Ok(true)
    }

    /// Add a new entity. Duplicate names are rejected and leave the store
    /// unchanged. Enabled enrichers are re-applied so derived metrics stay
    /// complete.
    pub fn add_entity(
        &mut self,
        name: impl Into<String>,
        entity: Entity,
    ) -> Result<(), ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.entities.contains(&name) {
            return Err(ValidationError::DuplicateName(name));
        }
        self.entities.upsert(name.clone(), entity);
        self.refresh_enrichments();
        info!(entity = %name, "entity added");
        Ok(())
    }

    /// Write both stores to `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), StoreError> {
        store::save_all(dir, &self.entities, &self.definitions)
    }

    /// Replace both stores with the documents in `dir`.
    ///
    /// On failure the stores are reset to the built-in dataset and the
    /// error is returned so the caller can warn.
    pub fn load(&mut self, dir: &Path) -> Result<(), StoreError> {
        match store::load_all(dir) {
            Ok((entities, definitions)) => {
                self.entities = entities;
                self.definitions = definitions;
                self.refresh_enrichments();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "load failed, using built-in data");
                self.reset_to_defaults();
                Err(e)
            }
        }
    }

    /// Restore the built-in dataset, keeping enabled enrichers applied.
    pub fn reset_to_defaults(&mut self) {
        self.entities = default_entities();
        self.definitions = default_definitions();
        self.refresh_enrichments();
    }

    fn refresh_enrichments(&mut self) {
        if let Err(e) = self
            .enrichers
            .apply_all(&mut self.entities, &mut self.definitions)
        {
            warn!(error = %e, "failed to re-apply enrichers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::DisabledProvider;
    use crate::enrich::{EfficiencyScoreEnricher, StrideLengthEnricher};
    use crate::models::{HeelStrike, Kind};
    use tempfile::TempDir;

    fn pipeline() -> Pipeline {
        Pipeline::new(
            Box::new(DisabledProvider::new("test")),
            AnswerSettings::default(),
        )
    }

    fn ostrich() -> Entity {
        Entity::new(Kind::Animal, 120, HeelStrike::Low, 9.5, "Fastest bird on land")
    }

    #[test]
    fn test_enable_twice_is_noop() {
        let mut p = pipeline();
        assert!(p.enable(Box::new(StrideLengthEnricher::new())).unwrap());
        assert!(!p.enable(Box::new(StrideLengthEnricher::new())).unwrap());
        assert_eq!(p.enrichers().len(), 1);
    }

    #[test]
    fn test_retrieve_layers_enrichers_on_base() {
        let mut p = pipeline();
        p.enable(Box::new(EfficiencyScoreEnricher)).unwrap();
        let ctx = p.retrieve("Which human has the best form compared to an animal?");
        assert!(ctx.starts_with("Humans vs Animals Comparison:"));
        assert!(ctx.contains("efficiency_score=89.0"));
        assert!(ctx.contains("Efficiency scores (higher is better):"));
    }

    #[test]
    fn test_answer_without_provider_is_error_string() {
        let p = pipeline();
        assert!(p.answer("cadence").starts_with("Error querying LLM:"));
    }

    #[test]
    fn test_add_entity_rejects_duplicate_without_change() {
        let mut p = pipeline();
        let before = p.entities().clone();
        let err = p.add_entity("Horse", ostrich()).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateName("Horse".into()));
        assert_eq!(p.entities(), &before);
    }

    #[test]
    fn test_add_entity_gets_efficiency_score() {
        let mut p = pipeline();
        p.enable(Box::new(EfficiencyScoreEnricher)).unwrap();
        p.add_entity("Ostrich", ostrich()).unwrap();
        assert_eq!(p.entities().get("Ostrich").unwrap().efficiency_score, Some(100.0));
    }

    #[test]
    fn test_load_failure_resets_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let mut p = pipeline();
        p.add_entity("Ostrich", ostrich()).unwrap();
        assert!(p.load(tmp.path()).is_err());
        assert_eq!(p.entities().len(), 8);
        assert!(!p.entities().contains("Ostrich"));
    }

    #[test]
    fn test_save_then_load_reproduces_stores() {
        let tmp = TempDir::new().unwrap();
        let mut p = pipeline();
        p.enable(Box::new(StrideLengthEnricher::new())).unwrap();
        p.add_entity("Ostrich", ostrich()).unwrap();
        p.save(tmp.path()).unwrap();

        let entities = p.entities().clone();
        let definitions = p.definitions().clone();

        let mut fresh = pipeline();
        fresh.load(tmp.path()).unwrap();
        assert_eq!(fresh.entities(), &entities);
        assert_eq!(fresh.definitions(), &definitions);
    }
}
