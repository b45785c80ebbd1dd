//! Document validation and page geometry
//!
//! Light-weight inspection over the lopdf document model: header/EOF
//! validation, document metadata, and per-page size/rotation with page-tree
//! inheritance. The save engine uses the geometry helpers; the session layer
//! surfaces the info structs to the UI.

use lopdf::{Dictionary, Document, Object};
use serde::Serialize;

use crate::error::PdfEditError;

/// Document-level facts surfaced to the UI after load.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub page_count: u32,
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Size and rotation of one page, in PDF points.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub rotation: i32,
}

/// Cheap structural checks without parsing the body.
pub fn quick_validate(bytes: &[u8]) -> Result<(), PdfEditError> {
    if bytes.len() < 8 {
        return Err(PdfEditError::ParseError(
            "File too small to be a valid PDF".to_string(),
        ));
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err(PdfEditError::ParseError(
            "Not a valid PDF file (missing %PDF- header)".to_string(),
        ));
    }
    let tail = if bytes.len() > 1024 {
        &bytes[bytes.len() - 1024..]
    } else {
        bytes
    };
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err(PdfEditError::ParseError(
            "PDF appears truncated (missing %%EOF marker)".to_string(),
        ));
    }
    Ok(())
}

/// Parse the document and collect its info. Encrypted documents load but are
/// flagged; a zero-page document is rejected.
pub fn inspect(bytes: &[u8]) -> Result<DocumentInfo, PdfEditError> {
    quick_validate(bytes)?;

    let doc = Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;

    let page_count = doc.get_pages().len() as u32;
    if page_count == 0 {
        return Err(PdfEditError::ParseError("PDF has no pages".to_string()));
    }

    let (title, author) = info_strings(&doc);

    Ok(DocumentInfo {
        page_count,
        version: header_version(bytes),
        encrypted: doc.is_encrypted(),
        size_bytes: bytes.len(),
        title,
        author,
    })
}

/// Size and rotation for a 0-indexed page.
pub fn page_geometry(doc: &Document, page_index: usize) -> Result<PageGeometry, PdfEditError> {
    let pages = doc.get_pages();
    let page_id = pages.get(&(page_index as u32 + 1)).ok_or_else(|| {
        PdfEditError::InvalidInput(format!("Page index {} out of bounds", page_index))
    })?;

    let page_dict = doc
        .get_object(*page_id)
        .map_err(|e| PdfEditError::OperationError(e.to_string()))?
        .as_dict()
        .map_err(|_| PdfEditError::OperationError("Page is not a dictionary".to_string()))?;

    let media_box = inherited_media_box(doc, page_dict);
    Ok(PageGeometry {
        width: media_box[2] - media_box[0],
        height: media_box[3] - media_box[1],
        rotation: inherited_rotation(doc, page_dict),
    })
}

fn header_version(bytes: &[u8]) -> String {
    if bytes.len() >= 8 && bytes.starts_with(b"%PDF-") {
        if let Ok(version) = std::str::from_utf8(&bytes[5..8]) {
            return version.trim().to_string();
        }
    }
    "1.4".to_string()
}

fn info_strings(doc: &Document) -> (Option<String>, Option<String>) {
    let info_dict = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| obj.as_reference().ok())
        .and_then(|id| doc.objects.get(&id))
        .and_then(|obj| obj.as_dict().ok());

    let read = |dict: &Dictionary, key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|obj| obj.as_str().ok())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .filter(|s| !s.is_empty())
    };

    match info_dict {
        Some(dict) => (read(dict, b"Title"), read(dict, b"Author")),
        None => (None, None),
    }
}

/// MediaBox from the page, inheriting from the parent tree; defaults to
/// US Letter when absent entirely.
pub fn inherited_media_box(doc: &Document, page_dict: &Dictionary) -> [f64; 4] {
    if let Some(rect) = dict_box(page_dict) {
        return rect;
    }
    if let Some(parent) = parent_dict(doc, page_dict) {
        if let Some(rect) = dict_box(parent) {
            return rect;
        }
    }
    [0.0, 0.0, 612.0, 792.0]
}

/// /Rotate from the page, inheriting from the parent tree; normalised to
/// 0/90/180/270.
pub fn inherited_rotation(doc: &Document, page_dict: &Dictionary) -> i32 {
    let raw = page_dict
        .get(b"Rotate")
        .ok()
        .and_then(|obj| obj.as_i64().ok())
        .or_else(|| {
            parent_dict(doc, page_dict)
                .and_then(|parent| parent.get(b"Rotate").ok())
                .and_then(|obj| obj.as_i64().ok())
        })
        .unwrap_or(0);
    normalize_rotation(raw as i32)
}

fn parent_dict<'a>(doc: &'a Document, page_dict: &Dictionary) -> Option<&'a Dictionary> {
    page_dict
        .get(b"Parent")
        .ok()
        .and_then(|obj| obj.as_reference().ok())
        .and_then(|id| doc.objects.get(&id))
        .and_then(|obj| obj.as_dict().ok())
}

fn dict_box(dict: &Dictionary) -> Option<[f64; 4]> {
    let array = dict.get(b"MediaBox").ok()?.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        rect[i] = match obj {
            Object::Integer(n) => *n as f64,
            Object::Real(n) => *n as f64,
            _ => return None,
        };
    }
    Some(rect)
}

pub fn normalize_rotation(angle: i32) -> i32 {
    let normalized = angle % 360;
    if normalized < 0 {
        normalized + 360
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_test_pdf;

    #[test]
    fn test_quick_validate_rejects_non_pdf() {
        assert!(quick_validate(b"not a pdf file").is_err());
        assert!(quick_validate(b"tiny").is_err());
    }

    #[test]
    fn test_quick_validate_accepts_valid_pdf() {
        let pdf = build_test_pdf(1);
        assert!(quick_validate(&pdf).is_ok());
    }

    #[test]
    fn test_inspect_reports_page_count_and_version() {
        let pdf = build_test_pdf(5);
        let info = inspect(&pdf).unwrap();
        assert_eq!(info.page_count, 5);
        assert_eq!(info.version, "1.7");
        assert!(!info.encrypted);
        assert_eq!(info.size_bytes, pdf.len());
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        assert!(inspect(b"%PDF-1.7 garbage that is long enough %%EOF").is_err());
    }

    #[test]
    fn test_page_geometry() {
        let pdf = build_test_pdf(2);
        let doc = Document::load_mem(&pdf).unwrap();
        let geom = page_geometry(&doc, 0).unwrap();
        assert_eq!(geom.width, 612.0);
        assert_eq!(geom.height, 792.0);
        assert_eq!(geom.rotation, 0);
        assert!(page_geometry(&doc, 5).is_err());
    }

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(0), 0);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(360), 0);
    }
}
