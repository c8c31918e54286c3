// Wire format of the `/v1/batch/objects` endpoint

use serde_json::{json, Map, Value};

use super::{WeaviateError, WeaviateResult};

pub const BATCH_PATH: &str = "/v1/batch/objects";

pub fn batch_body(collection: &str, tenant: &str, objects: Vec<Map<String, Value>>) -> Value {
    let objects: Vec<Value> = objects
        .into_iter()
        .map(|properties| {
            json!({
                "class": collection,
                "tenant": tenant,
                "properties": properties,
            })
        })
        .collect();
    json!({ "objects": objects })
}

/// Per-object outcome of a batch: stored count and the error messages of the rest
#[derive(Debug, Default, PartialEq)]
pub struct BatchOutcome {
    pub stored: usize,
    pub errors: Vec<String>,
}

pub fn parse_batch(response: &Value) -> WeaviateResult<BatchOutcome> {
    let items = response
        .as_array()
        .ok_or_else(|| WeaviateError::Parse("expected an array of batch results".to_string()))?;

    let mut outcome = BatchOutcome::default();
    for item in items {
        let errors = item
            .get("result")
            .and_then(|r| r.get("errors"))
            .and_then(|e| e.get("error"))
            .and_then(Value::as_array);
        match errors {
            Some(errors) if !errors.is_empty() => {
                for error in errors {
                    let message = error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error");
                    outcome.errors.push(message.to_string());
                }
            }
            _ => outcome.stored += 1,
        }
    }
    Ok(outcome)
}
