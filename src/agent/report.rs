//! Plain-text report for a Query Agent result
//!
//! Pure string templating. Every section is always present, in a fixed order,
//! and any missing field renders as a placeholder, so the same input always
//! produces byte-identical output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{AgentResult, Usage};

pub const PLACEHOLDER: &str = "-";
pub const UNKNOWN_COLLECTION: &str = "N/A";
pub const DEFAULT_FILTER_OPERATOR: &str = "AND";

/// Report strings shipped alongside the structured agent result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormattedReport {
    /// All sections concatenated
    pub pretty_text: String,
    /// Query, answer, searches, aggregations and sources, in that order
    pub pretty_blocks: Vec<String>,
    /// Usage table plus optional elapsed-time footer
    pub usage_block: String,
}

pub fn format_report(result: &AgentResult) -> FormattedReport {
    let blocks = vec![
        query_section(result),
        answer_section(result),
        searches_section(result),
        aggregations_section(result),
        sources_section(result),
    ];
    let usage_block = usage_section(result.usage.as_ref());

    let mut pretty_text = blocks.concat();
    pretty_text.push_str(&usage_block);

    FormattedReport {
        pretty_text,
        pretty_blocks: blocks,
        usage_block,
    }
}

fn query_section(result: &AgentResult) -> String {
    let query = non_empty(result.query.as_deref()).unwrap_or(PLACEHOLDER);
    format!("🔍 Original Query\n{}\n\n", query)
}

fn answer_section(result: &AgentResult) -> String {
    let answer = non_empty(result.answer.as_deref()).unwrap_or(PLACEHOLDER);
    format!("📝 Final Answer\n{}\n\n", answer)
}

fn searches_section(result: &AgentResult) -> String {
    let count = result.searches.len();
    if count == 0 {
        return "🔍 Searches Executed 0/0\n\n".to_string();
    }

    let mut lines = Vec::with_capacity(count * 6);
    for search in &result.searches {
        let operator =
            non_empty(search.filter_operators.as_deref()).unwrap_or(DEFAULT_FILTER_OPERATOR);
        let collection = non_empty(search.collection.as_deref()).unwrap_or(UNKNOWN_COLLECTION);
        lines.push("QueryResultWithCollection(".to_string());
        lines.push(format!("    queries={},", quoted_list(&search.queries)));
        lines.push(format!("    filters={},", filters_list(&search.filters)));
        lines.push(format!("    filter_operators='{}',", operator));
        lines.push(format!("    collection='{}'", collection));
        lines.push(")".to_string());
    }

    format!(
        "🔍 Searches Executed {}/{}\n{}\n\n",
        count,
        count,
        lines.join("\n")
    )
}

fn aggregations_section(result: &AgentResult) -> String {
    if result.aggregations.is_empty() {
        return "📊 No Aggregations Run\n\n".to_string();
    }

    let lines: Vec<String> = result
        .aggregations
        .iter()
        .map(|agg| {
            format!(
                "AggregationResultWithCollection(search_query='{}', collection='{}')",
                non_empty(agg.search_query.as_deref()).unwrap_or(PLACEHOLDER),
                non_empty(agg.collection.as_deref()).unwrap_or(UNKNOWN_COLLECTION),
            )
        })
        .collect();

    format!("📊 Aggregations\n{}\n\n", lines.join("\n"))
}

fn sources_section(result: &AgentResult) -> String {
    if result.source_documents.is_empty() {
        return "🔗 Sources\n - none\n\n".to_string();
    }

    let collection = result
        .collections
        .as_ref()
        .and_then(|names| names.first())
        .map(String::as_str)
        .and_then(|name| non_empty(Some(name)))
        .unwrap_or(UNKNOWN_COLLECTION);

    let lines: Vec<String> = result
        .source_documents
        .iter()
        .map(|doc| format!(" - object_id='{}' collection='{}'", doc.id, collection))
        .collect();

    format!("🔗 Sources\n{}\n\n", lines.join("\n"))
}

fn usage_section(usage: Option<&Usage>) -> String {
    let cell = |value: Option<u64>| {
        value
            .map(|v| v.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    };
    let rows = vec![
        ("LLM Requests:".to_string(), cell(usage.and_then(|u| u.requests))),
        ("Input Tokens:".to_string(), cell(usage.and_then(|u| u.request_tokens))),
        ("Output Tokens:".to_string(), cell(usage.and_then(|u| u.response_tokens))),
        ("Total Tokens:".to_string(), cell(usage.and_then(|u| u.total_tokens))),
    ];

    let mut block = String::from("   📊 Usage Statistics   \n");
    block.push_str(&render_usage_table(&rows).join("\n"));

    match usage.and_then(|u| u.total_time_sec) {
        Some(secs) if secs.is_finite() => {
            block.push_str(&format!("\nTotal Time Taken: {:.2}s", secs));
        }
        Some(secs) => {
            warn!(total_time = %secs, "Skipping non-finite elapsed time in usage report");
        }
        None => {}
    }

    block
}

/// Two-column box table; names left-aligned, values right-aligned
///
/// Column widths are the longest name and the longest value, counted in chars.
/// A separator follows the first row.
pub fn render_usage_table(rows: &[(String, String)]) -> Vec<String> {
    let name_width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, v)| v.chars().count()).max().unwrap_or(0);

    let rule = |left: char, mid: char, right: char| {
        format!(
            "{}{}{}{}{}",
            left,
            "─".repeat(name_width + 2),
            mid,
            "─".repeat(value_width + 2),
            right
        )
    };

    let mut lines = Vec::with_capacity(rows.len() + 3);
    lines.push(rule('┌', '┬', '┐'));
    for (i, (name, value)) in rows.iter().enumerate() {
        lines.push(format!(
            "│ {:<nw$} │ {:>vw$} │",
            name,
            value,
            nw = name_width,
            vw = value_width
        ));
        if i == 0 {
            lines.push(rule('├', '┼', '┤'));
        }
    }
    lines.push(rule('└', '┴', '┘'));
    lines
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| format!("'{}'", item.replace('\'', "\\'")))
        .collect();
    format!("[{}]", quoted.join(", "))
}

fn filters_list(filters: &[Value]) -> String {
    let rendered: Vec<String> = filters.iter().map(Value::to_string).collect();
    format!("[{}]", rendered.join(", "))
}
