//! Insights document editing
//!
//! The document is either phase buckets at the top level
//! (`{"menstrual": [...], ...}`) or the export envelope
//! (`{"exportDate", "totalInsights", "insights": {"menstrual": [...]}}`).
//! Buckets are the array-valued entries of whichever object holds them;
//! anything else in the document is left as it was.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

use super::merge::shallow_merge;
use super::models::InsightStatus;
use crate::types::{AdminError, Result};

const ENVELOPE_KEY: &str = "insights";

/// Outcome of a bulk save
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkSaveSummary {
    /// Records merged into the document
    pub updated: usize,
    /// Records received
    pub total: usize,
    /// Ids with no matching record
    pub not_found: Vec<String>,
}

/// The object holding the phase buckets
pub fn buckets(document: &Value) -> Option<&Map<String, Value>> {
    let root = document.as_object()?;
    match root.get(ENVELOPE_KEY) {
        Some(Value::Object(inner)) => Some(inner),
        _ => Some(root),
    }
}

fn buckets_mut(document: &mut Value) -> Result<&mut Map<String, Value>> {
    let root = document
        .as_object_mut()
        .ok_or_else(|| AdminError::Storage("insights document is not an object".into()))?;

    if matches!(root.get(ENVELOPE_KEY), Some(Value::Object(_))) {
        return root
            .get_mut(ENVELOPE_KEY)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| AdminError::Internal("insights envelope vanished".into()));
    }
    Ok(root)
}

/// Number of records across all buckets
pub fn count_records(document: &Value) -> usize {
    buckets(document)
        .map(|b| b.values().filter_map(Value::as_array).map(Vec::len).sum())
        .unwrap_or(0)
}

/// id -> (bucket, position), first occurrence in bucket order wins
fn index_by_id(buckets: &Map<String, Value>) -> HashMap<String, (String, usize)> {
    let mut index = HashMap::new();
    for (bucket, records) in buckets {
        let Some(records) = records.as_array() else {
            continue;
        };
        for (pos, record) in records.iter().enumerate() {
            if let Some(id) = record.get("id").and_then(Value::as_str) {
                index
                    .entry(id.to_string())
                    .or_insert_with(|| (bucket.clone(), pos));
            }
        }
    }
    index
}

fn record_mut<'a>(
    buckets: &'a mut Map<String, Value>,
    location: &(String, usize),
) -> Option<&'a mut Map<String, Value>> {
    buckets
        .get_mut(&location.0)?
        .as_array_mut()?
        .get_mut(location.1)?
        .as_object_mut()
}

/// Merge each incoming record into the stored record with the same id.
///
/// Matched records get `lastModified` and `enrichedBy` stamped after the
/// merge. Unmatched or id-less records are skipped.
pub fn apply_bulk(
    document: &mut Value,
    records: &[Value],
    editor: &str,
    now: &str,
) -> Result<BulkSaveSummary> {
    let buckets = buckets_mut(document)?;
    let index = index_by_id(buckets);

    let mut summary = BulkSaveSummary {
        updated: 0,
        total: records.len(),
        not_found: Vec::new(),
    };

    for incoming in records {
        let Some(fields) = incoming.as_object() else {
            warn!("Skipping insight that is not an object");
            continue;
        };
        let Some(id) = fields.get("id").and_then(Value::as_str) else {
            warn!("Skipping insight without id");
            continue;
        };

        let existing = match index.get(id) {
            Some(location) => record_mut(buckets, location),
            None => None,
        };

        match existing {
            Some(existing) => {
                shallow_merge(existing, fields);
                existing.insert("lastModified".into(), Value::from(now));
                existing.insert("enrichedBy".into(), Value::from(editor));
                summary.updated += 1;
            }
            None => {
                warn!(insight_id = %id, "Insight not found");
                summary.not_found.push(id.to_string());
            }
        }
    }

    Ok(summary)
}

/// Accept `targetJourney` as an array or as a string holding a JSON array
fn parse_target_journey(value: &Value) -> Result<Value> {
    let parsed = match value {
        Value::Array(_) => value.clone(),
        Value::String(raw) => serde_json::from_str(raw)
            .map_err(|_| AdminError::BadRequest("targetJourney is not valid JSON".into()))?,
        _ => Value::Null,
    };

    if parsed.is_array() {
        Ok(parsed)
    } else {
        Err(AdminError::BadRequest(
            "targetJourney must be a JSON array".into(),
        ))
    }
}

/// Apply an edit from the variants editor to one insight.
///
/// `baseContent` and `targetJourney` are lifted out; every other key is a
/// persona variant. Returns the updated record.
pub fn apply_variants(
    document: &mut Value,
    insight_id: &str,
    variants: &Map<String, Value>,
    now: &str,
) -> Result<Value> {
    let mut persona_fields = variants.clone();
    let base_content = persona_fields.remove("baseContent");
    let journey = persona_fields
        .remove("targetJourney")
        .map(|v| parse_target_journey(&v))
        .transpose()?;

    let buckets = buckets_mut(document)?;
    let location = index_by_id(buckets)
        .remove(insight_id)
        .ok_or_else(|| AdminError::NotFound(format!("Insight {insight_id} not found")))?;
    let record = record_mut(buckets, &location)
        .ok_or_else(|| AdminError::NotFound(format!("Insight {insight_id} not found")))?;

    if let Some(content) = base_content {
        record.insert("baseContent".into(), content);
    }

    if let Some(journey) = journey {
        record.insert("targetJourney".into(), journey.clone());
        record.insert("targetPreferences".into(), journey);
    }

    let variants_slot = record
        .entry("personaVariants")
        .or_insert_with(|| Value::Object(Map::new()));
    if !variants_slot.is_object() {
        *variants_slot = Value::Object(Map::new());
    }
    if let Value::Object(existing) = variants_slot {
        shallow_merge(existing, &persona_fields);
    }

    record.insert(
        "status".into(),
        Value::from(InsightStatus::Enriched.as_str()),
    );
    record.insert("lastModified".into(), Value::from(now));

    Ok(Value::Object(record.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: &str = "2026-03-01T10:00:00.000Z";

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn bucketed() -> Value {
        json!({
            "menstrual": [
                {"id": "M_01", "baseContent": "old", "personaVariants": {}},
                {"id": "M_02", "baseContent": "rest", "tone": "friendly"}
            ],
            "luteal": [
                {"id": "L_01", "baseContent": "slow down"}
            ]
        })
    }

    fn envelope() -> Value {
        json!({
            "exportDate": "2025-06-01T00:00:00Z",
            "totalInsights": 3,
            "validatedCount": 1,
            "insights": bucketed()
        })
    }

    #[test]
    fn test_count_both_layouts() {
        assert_eq!(count_records(&bucketed()), 3);
        assert_eq!(count_records(&envelope()), 3);
        assert_eq!(count_records(&json!({})), 0);
        assert_eq!(count_records(&json!([1, 2])), 0);
    }

    #[test]
    fn test_variants_scenario() {
        let mut doc = bucketed();
        let updated = apply_variants(
            &mut doc,
            "M_01",
            &obj(json!({"baseContent": "new", "emma": "emma text"})),
            NOW,
        )
        .unwrap();

        assert_eq!(
            updated,
            json!({
                "id": "M_01",
                "baseContent": "new",
                "personaVariants": {"emma": "emma text"},
                "status": "enriched",
                "lastModified": NOW
            })
        );
        assert_eq!(doc["menstrual"][0], updated);
        assert_eq!(doc["menstrual"][1], bucketed()["menstrual"][1]);
        assert_eq!(doc["luteal"], bucketed()["luteal"]);
    }

    #[test]
    fn test_variants_unknown_id() {
        let mut doc = bucketed();
        let err = apply_variants(&mut doc, "X_99", &obj(json!({"emma": "x"})), NOW).unwrap_err();
        assert!(matches!(err, AdminError::NotFound(_)));
        assert_eq!(doc, bucketed());
    }

    #[test]
    fn test_variants_target_journey_from_string() {
        let mut doc = envelope();
        let updated = apply_variants(
            &mut doc,
            "L_01",
            &obj(json!({"targetJourney": "[\"body\",\"emotions\"]", "clara": "c"})),
            NOW,
        )
        .unwrap();

        assert_eq!(updated["targetJourney"], json!(["body", "emotions"]));
        assert_eq!(updated["targetPreferences"], json!(["body", "emotions"]));
        assert_eq!(updated["personaVariants"], json!({"clara": "c"}));
        assert_eq!(doc["exportDate"], "2025-06-01T00:00:00Z");
    }

    #[test]
    fn test_variants_bad_target_journey() {
        let mut doc = bucketed();
        for bad in [json!("not json"), json!("{\"a\":1}"), json!(42)] {
            let err = apply_variants(&mut doc, "M_01", &obj(json!({"targetJourney": bad})), NOW)
                .unwrap_err();
            assert!(matches!(err, AdminError::BadRequest(_)));
        }
        assert_eq!(doc, bucketed());
    }

    #[test]
    fn test_bulk_partial_success() {
        let mut doc = bucketed();
        let summary = apply_bulk(
            &mut doc,
            &[
                json!({"id": "M_02", "jezaApproval": 4}),
                json!({"id": "NOPE", "baseContent": "?"}),
                json!({"baseContent": "no id"}),
            ],
            "jeza",
            NOW,
        )
        .unwrap();

        assert_eq!(
            summary,
            BulkSaveSummary {
                updated: 1,
                total: 3,
                not_found: vec!["NOPE".into()],
            }
        );
        let m02 = &doc["menstrual"][1];
        assert_eq!(m02["jezaApproval"], 4);
        assert_eq!(m02["tone"], "friendly");
        assert_eq!(m02["enrichedBy"], "jeza");
        assert_eq!(m02["lastModified"], NOW);
        assert_eq!(doc["menstrual"][0], bucketed()["menstrual"][0]);
    }

    #[test]
    fn test_bulk_first_match_wins() {
        let mut doc = json!({
            "menstrual": [{"id": "DUP", "baseContent": "a"}],
            "luteal": [{"id": "DUP", "baseContent": "b"}]
        });
        apply_bulk(&mut doc, &[json!({"id": "DUP", "baseContent": "z"})], "jeza", NOW).unwrap();

        assert_eq!(doc["menstrual"][0]["baseContent"], "z");
        assert_eq!(doc["luteal"][0]["baseContent"], "b");
    }
}
