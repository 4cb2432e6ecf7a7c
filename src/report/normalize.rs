use chrono::NaiveDate;

use crate::models::diary::DiaryEntry;

/// Diary entry after validation: non-blank content, clean tag set.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub content: String,
    pub tags: Vec<String>,
}

/// Shape raw diary rows into analysis units. Entries whose content is blank
/// after trimming are dropped; tags are trimmed, blanks removed, duplicates
/// collapsed keeping first occurrence. Input order is preserved.
pub fn normalize_entries(rows: Vec<DiaryEntry>) -> Vec<NormalizedEntry> {
    let mut entries = Vec::with_capacity(rows.len());

    for row in rows {
        let content = row.content.trim();
        if content.is_empty() {
            // Log by id and date only; entry content never reaches logs.
            tracing::debug!(
                entry_id = row.id,
                date = %row.entry_date,
                "Dropping diary entry with blank content"
            );
            continue;
        }

        let mut tags: Vec<String> = Vec::new();
        for tag in row.tags.unwrap_or_default() {
            let tag = tag.trim();
            if tag.is_empty() || tags.iter().any(|t| t == tag) {
                continue;
            }
            tags.push(tag.to_string());
        }

        entries.push(NormalizedEntry {
            id: row.id,
            date: row.entry_date,
            content: content.to_string(),
            tags,
        });
    }

    entries
}
