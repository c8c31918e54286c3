// Mapping of raw service objects onto DocumentRecord

use crate::models::DocumentRecord;
use crate::weaviate::RawObject;

pub const NO_CONTENT: &str = "No content available";
pub const PLACEHOLDER_DATE: &str = "2024-01-01";
pub const GENERATED_ID: &str = "generated_response";
pub const GENERATED_FILE_NAME: &str = "AI Generated Response";

/// Prefix used when a hit carries no file name of its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePrefix {
    Document,
    SearchResult,
    SourceDocument,
}

impl NamePrefix {
    fn as_str(&self) -> &'static str {
        match self {
            NamePrefix::Document => "Document",
            NamePrefix::SearchResult => "Search_Result",
            NamePrefix::SourceDocument => "Source_Document",
        }
    }

    /// 1-based synthetic name for the hit at `index`
    pub fn name_for(&self, index: usize) -> String {
        format!("{}_{}", self.as_str(), index + 1)
    }
}

pub fn to_record(index: usize, object: &RawObject, prefix: NamePrefix) -> DocumentRecord {
    DocumentRecord {
        id: object
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        content: object
            .property_str("content")
            .unwrap_or(NO_CONTENT)
            .to_string(),
        file_name: object
            .property_str("file_name")
            .map(String::from)
            .unwrap_or_else(|| prefix.name_for(index)),
        chunk_index: index,
        created_date: object
            .property_str("created_date")
            .unwrap_or(PLACEHOLDER_DATE)
            .to_string(),
        score: object.score,
    }
}

pub fn to_records(objects: &[RawObject], prefix: NamePrefix) -> Vec<DocumentRecord> {
    objects
        .iter()
        .enumerate()
        .map(|(i, object)| to_record(i, object, prefix))
        .collect()
}

/// The single record shown for a successful generative search
pub fn generated_record(text: &str, date: chrono::NaiveDate) -> DocumentRecord {
    DocumentRecord {
        id: GENERATED_ID.to_string(),
        content: text.to_string(),
        file_name: GENERATED_FILE_NAME.to_string(),
        chunk_index: 0,
        created_date: date.format("%Y-%m-%d").to_string(),
        score: Some(1.0),
    }
}
