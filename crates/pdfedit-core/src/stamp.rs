//! Whole-document stamps: watermarks and page numbers
//!
//! Both stamp every page with measured, centred Helvetica text through the
//! shared content-stream helpers; the watermark additionally runs diagonally
//! at reduced opacity.

use lopdf::{dictionary, Document, ObjectId};

use crate::content::{append_content, merge_resources, num, pdf_literal, push_op};
use crate::document;
use crate::error::PdfEditError;
use crate::fonts::{self, FontEmbedder};

#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    pub text: String,
    pub opacity: f64,
    pub font_size: f64,
}

impl WatermarkOptions {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            opacity: 0.3,
            font_size: 48.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageNumberOptions {
    pub font_size: f64,
    /// Distance of the baseline from the bottom edge, in points.
    pub margin: f64,
    /// Render "3 / 12" instead of "3".
    pub include_total: bool,
}

impl Default for PageNumberOptions {
    fn default() -> Self {
        Self {
            font_size: 11.0,
            margin: 30.0,
            include_total: false,
        }
    }
}

/// Stamp a diagonal translucent watermark across the centre of every page.
pub fn add_watermark(bytes: &[u8], options: &WatermarkOptions) -> Result<Vec<u8>, PdfEditError> {
    if options.text.trim().is_empty() {
        return Err(PdfEditError::InvalidInput(
            "Watermark text is empty".to_string(),
        ));
    }

    let mut doc =
        Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

    let mut embedder = FontEmbedder::new();
    let font_id = embedder.font_id(&mut doc, "Helvetica");
    let gs_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => options.opacity as f32,
    });

    let text = fonts::sanitize_latin1(&options.text);
    let width = fonts::text_width(&text, "Helvetica", options.font_size);
    // 45 degrees counter-clockwise, up the page
    let (cos, sin) = (std::f64::consts::FRAC_1_SQRT_2, -std::f64::consts::FRAC_1_SQRT_2);

    for &page_id in &pages {
        let (cx, cy) = page_center(&doc, page_id)?;
        let mut ops = Vec::new();
        push_op(&mut ops, "/PEGS1 gs");
        ops.extend_from_slice(
            format!(
                "BT /{} {} Tf 0.5 0.5 0.5 rg {} {} {} {} {} {} Tm {} 0 Td ",
                FontEmbedder::resource_name("Helvetica"),
                num(options.font_size),
                num(cos),
                num(sin),
                num(-sin),
                num(cos),
                num(cx),
                num(cy),
                num(-width / 2.0),
            )
            .as_bytes(),
        );
        ops.extend_from_slice(&pdf_literal(&text));
        push_op(&mut ops, " Tj ET");

        append_content(&mut doc, page_id, ops)?;
        merge_resources(
            &mut doc,
            page_id,
            b"Font",
            vec![(FontEmbedder::resource_name("Helvetica"), font_id)],
        )?;
        merge_resources(
            &mut doc,
            page_id,
            b"ExtGState",
            vec![("PEGS1".to_string(), gs_id)],
        )?;
    }

    serialize(doc)
}

/// Stamp a centred page-number footer on every page.
pub fn add_page_numbers(
    bytes: &[u8],
    options: &PageNumberOptions,
) -> Result<Vec<u8>, PdfEditError> {
    let mut doc =
        Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let total = pages.len();

    let mut embedder = FontEmbedder::new();
    let font_id = embedder.font_id(&mut doc, "Helvetica");

    for (index, &page_id) in pages.iter().enumerate() {
        let label = if options.include_total {
            format!("{} / {}", index + 1, total)
        } else {
            format!("{}", index + 1)
        };
        let width = fonts::text_width(&label, "Helvetica", options.font_size);
        let (cx, _) = page_center(&doc, page_id)?;

        let mut ops = Vec::new();
        ops.extend_from_slice(
            format!(
                "BT /{} {} Tf 0 0 0 rg {} {} Td ",
                FontEmbedder::resource_name("Helvetica"),
                num(options.font_size),
                num(cx - width / 2.0),
                num(options.margin),
            )
            .as_bytes(),
        );
        ops.extend_from_slice(&pdf_literal(&label));
        push_op(&mut ops, " Tj ET");

        append_content(&mut doc, page_id, ops)?;
        merge_resources(
            &mut doc,
            page_id,
            b"Font",
            vec![(FontEmbedder::resource_name("Helvetica"), font_id)],
        )?;
    }

    serialize(doc)
}

fn page_center(doc: &Document, page_id: ObjectId) -> Result<(f64, f64), PdfEditError> {
    let dict = doc
        .get_object(page_id)
        .map_err(|e| PdfEditError::OperationError(e.to_string()))?
        .as_dict()
        .map_err(|_| PdfEditError::OperationError("Page is not a dictionary".to_string()))?;
    let rect = document::inherited_media_box(doc, dict);
    Ok(((rect[0] + rect[2]) / 2.0, (rect[1] + rect[3]) / 2.0))
}

fn serialize(mut doc: Document) -> Result<Vec<u8>, PdfEditError> {
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
    Ok(out)
}
