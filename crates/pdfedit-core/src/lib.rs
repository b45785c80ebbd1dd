//! Client-side PDF editing engine
//!
//! This crate holds everything below the UI of a browser-resident PDF
//! editor: reconstruction of editable text lines from rasterizer glyph runs,
//! the markup/segment model behind the rich-text surface, the session edit
//! store, and the save pipeline that flattens edits back into the document.
//! The page-level tools (merge, split, watermark, page numbers, crop,
//! compress) live here too.
//!
//! Rendering stays outside: pages are rasterized and their glyph runs
//! extracted by the embedding application (PDF.js in the browser), and the
//! results are handed in as [`extract::RawGlyphRun`] lists.

pub mod compress;
pub(crate) mod content;
pub mod coords;
pub mod crop;
pub mod document;
pub mod error;
pub mod extract;
pub mod fonts;
pub mod lines;
pub mod markup;
pub mod merge;
pub mod save;
pub mod split;
pub mod stamp;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use compress::compress_document;
pub use coords::PageView;
pub use crop::{crop_document, CropRect};
pub use document::{inspect, quick_validate, DocumentInfo, PageGeometry};
pub use error::PdfEditError;
pub use extract::{enrich_runs, NameHeuristics, RawGlyphRun, StyledRun};
pub use lines::reconstruct_lines;
pub use markup::{parse_segments, plain_text, Segment};
pub use merge::merge_documents;
pub use save::{save_document, SaveOutcome};
pub use split::{parse_ranges, split_document};
pub use stamp::{add_page_numbers, add_watermark, PageNumberOptions, WatermarkOptions};
pub use store::{AnnotationKind, EditorStore, ImageAnnotation, ItemId, TextItem};

/// Parse PDF bytes and return the page count.
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfEditError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

/// Derive the output file name: "report.pdf" becomes "report-edited.pdf".
pub fn edited_file_name(input: &str) -> String {
    match input.strip_suffix(".pdf") {
        Some(stem) => format!("{}-edited.pdf", stem),
        None => format!("{}-edited.pdf", input),
    }
}
