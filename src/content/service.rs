//! Admin content operations over the document store

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::insights::{self, BulkSaveSummary};
use super::merge::merge_keyed;
use super::models::{Persona, PhaseId};
use crate::store::{Collection, DocumentStore};
use crate::types::{AdminError, Result};

/// Insights document plus its record count
#[derive(Debug, Clone, Serialize)]
pub struct InsightsView {
    pub total: usize,
    pub insights: Value,
}

/// Read-modify-write over whole documents.
///
/// Each collection has its own lock so two saves of the same document
/// inside this process cannot interleave. Reads are not locked; the store
/// replaces files atomically.
pub struct ContentService {
    store: Arc<dyn DocumentStore>,
    locks: [Mutex<()>; 4],
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| AdminError::BadRequest(format!("{what} must be a JSON object")))
}

impl ContentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            locks: Default::default(),
        }
    }

    fn lock(&self, collection: Collection) -> &Mutex<()> {
        &self.locks[collection.index()]
    }

    pub async fn get_insights(&self) -> Result<InsightsView> {
        let document = self.store.load(Collection::Insights).await?;
        let total = insights::count_records(&document);
        debug!(total, "Loaded insights");
        Ok(InsightsView {
            total,
            insights: document,
        })
    }

    /// Merge a batch of edited insights by id. Partial success, no rollback.
    pub async fn save_all_insights(&self, records: &Value, editor: &str) -> Result<BulkSaveSummary> {
        let records = records
            .as_array()
            .ok_or_else(|| AdminError::BadRequest("insights must be an array".into()))?;

        let _guard = self.lock(Collection::Insights).lock().await;
        let mut document = self.store.load(Collection::Insights).await?;
        let summary = insights::apply_bulk(&mut document, records, editor, &timestamp())?;

        if summary.updated > 0 {
            self.store.save(Collection::Insights, &document).await?;
        }

        info!(
            updated = summary.updated,
            total = summary.total,
            not_found = summary.not_found.len(),
            editor = %editor,
            "Insights saved"
        );
        Ok(summary)
    }

    /// Edit one insight's base content, journey and persona variants
    pub async fn save_insight_variants(&self, insight_id: &str, variants: &Value) -> Result<Value> {
        let variants = as_object(variants, "variants")?;

        let _guard = self.lock(Collection::Insights).lock().await;
        let mut document = self.store.load(Collection::Insights).await?;
        let record = insights::apply_variants(&mut document, insight_id, variants, &timestamp())?;
        self.store.save(Collection::Insights, &document).await?;

        info!(insight_id = %insight_id, "Insight variants saved");
        Ok(record)
    }

    pub async fn get_phases(&self) -> Result<Value> {
        self.store.load(Collection::Phases).await
    }

    pub async fn get_closings(&self) -> Result<Value> {
        self.store.load(Collection::Closings).await
    }

    pub async fn get_vignettes(&self) -> Result<Value> {
        self.store.load(Collection::Vignettes).await
    }

    /// Vignettes for one phase and persona; empty when none are stored
    pub async fn get_vignettes_for(&self, phase: &str, persona: &str) -> Result<Value> {
        let phase = PhaseId::parse(phase)
            .ok_or_else(|| AdminError::BadRequest(format!("Unknown phase: {phase}")))?;
        let persona = Persona::parse(persona)
            .ok_or_else(|| AdminError::BadRequest(format!("Unknown persona: {persona}")))?;

        let document = self.store.load(Collection::Vignettes).await?;
        let vignettes = document
            .get(phase.as_str())
            .and_then(|p| p.get(persona.as_str()))
            .filter(|v| v.is_array())
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        Ok(vignettes)
    }

    pub async fn save_phases(&self, payload: &Value) -> Result<Value> {
        self.save_keyed(Collection::Phases, payload).await
    }

    pub async fn save_closings(&self, payload: &Value) -> Result<Value> {
        self.save_keyed(Collection::Closings, payload).await
    }

    pub async fn save_vignettes(&self, payload: &Value) -> Result<Value> {
        self.save_keyed(Collection::Vignettes, payload).await
    }

    async fn save_keyed(&self, collection: Collection, payload: &Value) -> Result<Value> {
        let payload = as_object(payload, &collection.to_string())?;

        let _guard = self.lock(collection).lock().await;
        let mut document = self.store.load(collection).await?;
        let stored = document.as_object_mut().ok_or_else(|| {
            AdminError::Storage(format!("{collection} document is not an object"))
        })?;
        merge_keyed(stored, payload);
        self.store.save(collection, &document).await?;

        info!(collection = %collection, keys = payload.len(), "Document saved");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use serde_json::json;

    fn seeded() -> (Arc<MemoryDocumentStore>, ContentService) {
        let store = Arc::new(MemoryDocumentStore::with_documents([
            (
                Collection::Insights,
                json!({
                    "menstrual": [{"id": "M_01", "baseContent": "old", "personaVariants": {}}],
                    "follicular": [{"id": "F_01", "baseContent": "rise"}]
                }),
            ),
            (
                Collection::Phases,
                json!({
                    "menstrual": {"id": "menstrual", "duration": "3-7 days", "color": "#E53E3E"},
                    "luteal": {"id": "luteal", "duration": "10-14 days"}
                }),
            ),
            (Collection::Closings, json!({"emma": {"encouragement": "Tu vas y arriver"}})),
            (
                Collection::Vignettes,
                json!({"menstrual": {"emma": [{"id": "v1", "title": "Rest"}]}}),
            ),
        ]));
        let service = ContentService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn test_get_insights_total() {
        let (_, service) = seeded();
        let view = service.get_insights().await.unwrap();
        assert_eq!(view.total, 2);
    }

    #[tokio::test]
    async fn test_save_variants_persists() {
        let (store, service) = seeded();
        service
            .save_insight_variants("M_01", &json!({"baseContent": "new", "emma": "emma text"}))
            .await
            .unwrap();

        let doc = store.load(Collection::Insights).await.unwrap();
        let record = &doc["menstrual"][0];
        assert_eq!(record["baseContent"], "new");
        assert_eq!(record["personaVariants"]["emma"], "emma text");
        assert_eq!(record["status"], "enriched");
        assert!(record["lastModified"].as_str().unwrap().ends_with('Z'));
        assert_eq!(doc["follicular"], json!([{"id": "F_01", "baseContent": "rise"}]));
    }

    #[tokio::test]
    async fn test_save_variants_rejects_non_object() {
        let (_, service) = seeded();
        let err = service
            .save_insight_variants("M_01", &json!(["emma"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_bulk_without_matches_does_not_write() {
        let (store, service) = seeded();
        let before = store.save_count();

        let summary = service
            .save_all_insights(&json!([{"id": "X"}, {"baseContent": "no id"}]), "jeza")
            .await
            .unwrap();
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.not_found, vec!["X".to_string()]);
        assert_eq!(store.save_count(), before);

        service
            .save_all_insights(&json!([{"id": "F_01", "jezaApproval": 4}]), "jeza")
            .await
            .unwrap();
        assert_eq!(store.save_count(), before + 1);
    }

    #[tokio::test]
    async fn test_bulk_requires_array() {
        let (_, service) = seeded();
        let err = service
            .save_all_insights(&json!({"id": "M_01"}), "jeza")
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_save_phases_merges() {
        let (_, service) = seeded();
        service
            .save_phases(&json!({"menstrual": {"duration": "X"}}))
            .await
            .unwrap();

        let phases = service.get_phases().await.unwrap();
        assert_eq!(phases["menstrual"]["duration"], "X");
        assert_eq!(phases["menstrual"]["color"], "#E53E3E");
        assert_eq!(phases["menstrual"]["id"], "menstrual");
        assert_eq!(phases["luteal"]["duration"], "10-14 days");
    }

    #[tokio::test]
    async fn test_save_closings_adds_persona() {
        let (_, service) = seeded();
        let merged = service
            .save_closings(&json!({"clara": {"encouragement": "Go"}}))
            .await
            .unwrap();
        assert_eq!(merged["clara"]["encouragement"], "Go");
        assert_eq!(merged["emma"]["encouragement"], "Tu vas y arriver");
    }

    #[tokio::test]
    async fn test_save_keyed_rejects_non_object() {
        let (_, service) = seeded();
        assert!(matches!(
            service.save_phases(&json!("menstrual")).await,
            Err(AdminError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_vignettes_for() {
        let (_, service) = seeded();
        let found = service.get_vignettes_for("menstrual", "emma").await.unwrap();
        assert_eq!(found, json!([{"id": "v1", "title": "Rest"}]));

        let empty = service.get_vignettes_for("luteal", "clara").await.unwrap();
        assert_eq!(empty, json!([]));

        assert!(matches!(
            service.get_vignettes_for("winter", "emma").await,
            Err(AdminError::BadRequest(_))
        ));
        assert!(matches!(
            service.get_vignettes_for("luteal", "jeza").await,
            Err(AdminError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_document_is_storage_error() {
        let service = ContentService::new(Arc::new(MemoryDocumentStore::new()));
        assert!(matches!(
            service.get_closings().await,
            Err(AdminError::Storage(_))
        ));
    }
}
