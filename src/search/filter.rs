use crate::models::DocumentRecord;

/// Case-insensitive substring filter over content and file name
pub fn filter_documents_locally(documents: Vec<DocumentRecord>, filter_text: &str) -> Vec<DocumentRecord> {
    if filter_text.is_empty() {
        return documents;
    }

    let needle = filter_text.to_lowercase();
    documents
        .into_iter()
        .filter(|doc| {
            doc.content.to_lowercase().contains(&needle)
                || doc.file_name.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, content: &str) -> DocumentRecord {
        DocumentRecord {
            id: "id".into(),
            content: content.into(),
            file_name: name.into(),
            chunk_index: 0,
            created_date: "2024-01-01".into(),
            score: None,
        }
    }

    #[test]
    fn test_filter_matches_content_or_name() {
        let docs = vec![
            doc("Document_1", "Travel reimbursement"),
            doc("Payroll.md", "Monthly cycle"),
            doc("Document_3", "Unrelated"),
        ];
        let filtered = filter_documents_locally(docs.clone(), "PAYROLL");
        assert_eq!(filtered, vec![docs[1].clone()]);

        let filtered = filter_documents_locally(docs.clone(), "travel");
        assert_eq!(filtered, vec![docs[0].clone()]);
    }

    #[test]
    fn test_empty_filter_returns_everything() {
        let docs = vec![doc("a", "b")];
        assert_eq!(filter_documents_locally(docs.clone(), ""), docs);
    }
}
