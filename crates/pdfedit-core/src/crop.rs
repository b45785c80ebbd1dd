//! Page cropping
//!
//! Sets MediaBox and CropBox to a PDF-space rectangle, for every page or a
//! 1-indexed selection.

use lopdf::{Document, Object, ObjectId};

use crate::error::PdfEditError;

/// Crop rectangle in PDF user-space points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    fn as_box(&self) -> Object {
        Object::Array(vec![
            Object::Real(self.x as f32),
            Object::Real(self.y as f32),
            Object::Real((self.x + self.width) as f32),
            Object::Real((self.y + self.height) as f32),
        ])
    }
}

/// Crop pages to `rect`. `pages` selects 1-indexed targets; None crops all.
pub fn crop_document(
    bytes: &[u8],
    rect: CropRect,
    pages: Option<&[u32]>,
) -> Result<Vec<u8>, PdfEditError> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return Err(PdfEditError::InvalidInput(format!(
            "Crop rectangle must have positive size, got {}x{}",
            rect.width, rect.height
        )));
    }

    let mut doc =
        Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;
    let page_map = doc.get_pages();

    if let Some(selection) = pages {
        for &page in selection {
            if page == 0 || page > page_map.len() as u32 {
                return Err(PdfEditError::InvalidRange(format!(
                    "Page {} does not exist (document has {} pages)",
                    page,
                    page_map.len()
                )));
            }
        }
    }

    let targets: Vec<ObjectId> = match pages {
        Some(selection) => selection
            .iter()
            .filter_map(|p| page_map.get(p).copied())
            .collect(),
        None => page_map.into_values().collect(),
    };

    for page_id in targets {
        let page = doc
            .get_object_mut(page_id)
            .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
        if let Object::Dictionary(ref mut dict) = page {
            dict.set("MediaBox", rect.as_box());
            dict.set("CropBox", rect.as_box());
        }
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::page_geometry;
    use crate::test_support::build_test_pdf;

    const LETTER_CROP: CropRect = CropRect {
        x: 36.0,
        y: 36.0,
        width: 540.0,
        height: 720.0,
    };

    #[test]
    fn test_crop_all_pages() {
        let pdf = build_test_pdf(3);
        let result = crop_document(&pdf, LETTER_CROP, None).unwrap();
        let doc = Document::load_mem(&result).unwrap();
        for i in 0..3 {
            let geom = page_geometry(&doc, i).unwrap();
            assert_eq!(geom.width, 540.0);
            assert_eq!(geom.height, 720.0);
        }
    }

    #[test]
    fn test_crop_selected_pages_only() {
        let pdf = build_test_pdf(2);
        let result = crop_document(&pdf, LETTER_CROP, Some(&[2])).unwrap();
        let doc = Document::load_mem(&result).unwrap();
        assert_eq!(page_geometry(&doc, 0).unwrap().width, 612.0);
        assert_eq!(page_geometry(&doc, 1).unwrap().width, 540.0);
    }

    #[test]
    fn test_crop_rejects_degenerate_rect() {
        let pdf = build_test_pdf(1);
        let rect = CropRect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 100.0,
        };
        assert!(crop_document(&pdf, rect, None).is_err());
    }

    #[test]
    fn test_crop_rejects_bad_page_selection() {
        let pdf = build_test_pdf(2);
        assert!(crop_document(&pdf, LETTER_CROP, Some(&[5])).is_err());
        assert!(crop_document(&pdf, LETTER_CROP, Some(&[0])).is_err());
    }
}
