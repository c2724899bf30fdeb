//! Corpus document loading.
//!
//! Two source shapes are understood: a JSONL file of question/answer records,
//! and a directory (or single file) of plain text and markdown documents.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{IndexError, Result};

/// A raw source document before chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Position of the record or file in its source, counted before filtering.
    pub doc_id: u64,
    pub text: String,
}

#[derive(Deserialize)]
struct QaRecord {
    question: String,
    answer: Answer,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Answer {
    Text(String),
    Object { value: String },
}

impl Answer {
    fn into_text(self) -> String {
        match self {
            Self::Text(s) | Self::Object { value: s } => s,
        }
    }
}

fn is_text_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("md"))
}

fn is_jsonl(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jsonl"))
}

/// Load at most `limit` source records from `path`.
///
/// Documents whose trimmed text is shorter than `min_chars` are dropped
/// without consuming a new `doc_id`; ids stay tied to source positions.
///
/// # Errors
///
/// Returns an IO error if the source cannot be read,
/// [`IndexError::Artifact`] for a malformed JSONL record, and
/// [`IndexError::UnsupportedSource`] for an unrecognized file type.
pub fn load_documents(path: &Path, limit: usize, min_chars: usize) -> Result<Vec<Document>> {
    let raw = if path.is_dir() {
        load_directory(path, limit)?
    } else if is_jsonl(path) {
        load_jsonl(path, limit)?
    } else if is_text_document(path) {
        vec![(0, std::fs::read_to_string(path)?)]
    } else {
        return Err(IndexError::UnsupportedSource(path.display().to_string()));
    };

    let total = raw.len();
    let documents: Vec<Document> = raw
        .into_iter()
        .take(limit)
        .filter(|(_, text)| text.trim().chars().count() >= min_chars)
        .map(|(doc_id, text)| Document { doc_id, text })
        .collect();

    tracing::info!(
        source = %path.display(),
        read = total.min(limit),
        kept = documents.len(),
        "loaded corpus documents"
    );
    Ok(documents)
}

fn load_jsonl(path: &Path, limit: usize) -> Result<Vec<(u64, String)>> {
    let content = std::fs::read_to_string(path)?;
    let mut records = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        if records.len() >= limit {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let record: QaRecord = serde_json::from_str(line).map_err(|e| IndexError::Artifact {
            path: path.display().to_string(),
            reason: format!("line {}: {e}", line_no + 1),
        })?;
        let doc_id = records.len() as u64;
        records.push((
            doc_id,
            format!(
                "Question: {} Answer: {}",
                record.question,
                record.answer.into_text()
            ),
        ));
    }

    Ok(records)
}

fn load_directory(dir: &Path, limit: usize) -> Result<Vec<(u64, String)>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_text_document(p))
        .collect();
    files.sort();

    let mut documents = Vec::with_capacity(files.len().min(limit));
    for (doc_id, file) in files.iter().take(limit).enumerate() {
        let text = std::fs::read_to_string(file)?;
        documents.push((doc_id as u64, text));
    }
    Ok(documents)
}
