//! Page extraction
//!
//! Pulls a 1-indexed page selection out of a document by deleting the
//! complement and pruning what is no longer referenced.

use std::collections::BTreeSet;
use std::collections::HashSet;

use lopdf::Document;

use crate::error::PdfEditError;

/// Parse a selection string like "1-3, 5, 8-10" into sorted unique page
/// numbers (1-indexed).
pub fn parse_ranges(input: &str) -> Result<Vec<u32>, PdfEditError> {
    let mut pages = BTreeSet::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        match part.split_once('-') {
            Some((start, end)) => {
                let start: u32 = start.trim().parse().map_err(|_| {
                    PdfEditError::InvalidRange(format!("Invalid start: {}", start))
                })?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| PdfEditError::InvalidRange(format!("Invalid end: {}", end)))?;
                if start > end {
                    return Err(PdfEditError::InvalidRange(format!(
                        "Start {} > end {}",
                        start, end
                    )));
                }
                pages.extend(start..=end);
            }
            None => {
                let page: u32 = part
                    .parse()
                    .map_err(|_| PdfEditError::InvalidRange(format!("Invalid page: {}", part)))?;
                pages.insert(page);
            }
        }
    }

    Ok(pages.into_iter().collect())
}

/// Extract the given pages (1-indexed) into a new document.
pub fn split_document(bytes: &[u8], pages: Vec<u32>) -> Result<Vec<u8>, PdfEditError> {
    if pages.is_empty() {
        return Err(PdfEditError::InvalidRange("No pages specified".to_string()));
    }
    if pages.contains(&0) {
        return Err(PdfEditError::InvalidRange(
            "Page numbers must be >= 1".to_string(),
        ));
    }

    let doc = Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;
    let page_count = doc.get_pages().len() as u32;
    for &page in &pages {
        if page > page_count {
            return Err(PdfEditError::InvalidRange(format!(
                "Page {} does not exist (document has {} pages)",
                page, page_count
            )));
        }
    }

    let keep: HashSet<u32> = pages.iter().copied().collect();
    let mut discard: Vec<u32> = (1..=page_count).filter(|p| !keep.contains(p)).collect();
    // Delete back-to-front so earlier numbers stay valid
    discard.reverse();

    let mut extracted = doc.clone();
    for page_num in discard {
        extracted.delete_pages(&[page_num]);
    }
    extracted.prune_objects();
    extracted.compress();

    let mut out = Vec::new();
    extracted
        .save_to(&mut out)
        .map_err(|e| PdfEditError::OperationError(format!("Save failed: {}", e)))?;
    Ok(out)
}
