//! Re-serialization
//!
//! Turns the in-memory edit state back into PDF bytes in five strictly
//! sequential passes: cover rectangles over replaced glyphs, replacement
//! text, signature/image annotations, page rotation, and (only when pages
//! were deleted or reordered) a page-tree rebuild. The first four passes
//! mutate the original document's page objects; the rebuild therefore sees
//! already-mutated content.
//!
//! Edits are flattened into page content streams, not added as annotation
//! objects, so the output looks the same in every viewer.

use std::collections::HashMap;
use std::io::Write;

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::content::{append_content, merge_resources, num, num3, parse_hex_color, pdf_literal, push_op};
use crate::coords;
use crate::document;
use crate::error::PdfEditError;
use crate::fonts::{self, FontEmbedder};
use crate::markup;
use crate::store::EditorStore;

/// Horizontal padding applied left of a cover rectangle.
const COVER_PAD_X: f64 = 2.0;
/// Extra cover width absorbing anti-aliasing fringes and italic overhang.
const COVER_PAD_W: f64 = 20.0;
/// Cover descends this fraction of the font size below the baseline.
const COVER_DESCENT: f64 = 0.3;
/// Cover height as a fraction of the font size.
const COVER_HEIGHT: f64 = 1.4;
/// Highlight fill alpha.
const HIGHLIGHT_ALPHA: f32 = 0.45;

/// Result of a save: the serialized bytes plus anything that was skipped.
#[derive(Debug)]
pub struct SaveOutcome {
    pub bytes: Vec<u8>,
    /// One entry per annotation that could not be embedded. The save still
    /// succeeded; these are surfaced so the UI can tell the user.
    pub warnings: Vec<String>,
}

/// Apply every recorded edit to `bytes` and serialize the result.
pub fn save_document(bytes: &[u8], store: &EditorStore) -> Result<SaveOutcome, PdfEditError> {
    let mut doc =
        Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;

    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut warnings = Vec::new();
    let mut embedder = FontEmbedder::new();
    let mut draws: HashMap<usize, PageDraw> = HashMap::new();
    let mut highlight_gs: Option<ObjectId> = None;

    // Pass 1: cover rectangles over the original glyphs of edited items.
    for item in store.items().iter().filter(|t| t.edited && !t.is_new) {
        if item.page_index >= pages.len() {
            continue;
        }
        let draw = draws.entry(item.page_index).or_default();
        let x = item.pdf_x - COVER_PAD_X;
        let y = item.pdf_y - COVER_DESCENT * item.pdf_font_size;
        let w = item.pdf_width + COVER_PAD_W;
        let h = COVER_HEIGHT * item.pdf_font_size;
        push_op(
            &mut draw.ops,
            &format!("1 1 1 rg {} {} {} {} re f", num(x), num(y), num(w), num(h)),
        );
    }

    // Pass 2: replacement text. An edited-to-empty item is a pure deletion.
    for item in store.items().iter().filter(|t| t.edited) {
        if item.page_index >= pages.len() {
            continue;
        }
        if markup::plain_text(&item.markup).trim().is_empty() {
            continue;
        }
        let segments = markup::parse_segments(&item.markup);
        let mut pen_x = item.pdf_x;

        for segment in &segments {
            let text = fonts::sanitize_latin1(&segment.text);
            if text.is_empty() {
                continue;
            }
            let font_name = fonts::resolve_font(
                segment.font_family.as_deref(),
                segment.bold,
                segment.italic,
            );
            // A size override is editor-space; carry the ratio into PDF space
            let size = match segment.font_size {
                Some(px) if item.font_size > 0.0 => item.pdf_font_size * px / item.font_size,
                _ => item.pdf_font_size,
            };
            let width = fonts::text_width(&text, font_name, size);
            let (r, g, b) = parse_hex_color(segment.color.as_deref().unwrap_or("#000000"));

            let font_id = embedder.font_id(&mut doc, font_name);
            let draw = draws.entry(item.page_index).or_default();
            draw.fonts.insert(FontEmbedder::resource_name(font_name), font_id);

            if let Some(bg) = &segment.background {
                let gs_id = *highlight_gs.get_or_insert_with(|| {
                    doc.add_object(dictionary! {
                        "Type" => "ExtGState",
                        "ca" => HIGHLIGHT_ALPHA,
                    })
                });
                draw.gstates.insert("PEGS0".to_string(), gs_id);
                let (hr, hg, hb) = parse_hex_color(bg);
                push_op(
                    &mut draw.ops,
                    &format!(
                        "q /PEGS0 gs {} {} {} rg {} {} {} {} re f Q",
                        num3(hr),
                        num3(hg),
                        num3(hb),
                        num(pen_x),
                        num(item.pdf_y - 0.25 * size),
                        num(width),
                        num(1.25 * size)
                    ),
                );
            }

            draw.ops.extend_from_slice(
                format!(
                    "BT /{} {} Tf {} {} {} rg {} {} Td ",
                    FontEmbedder::resource_name(font_name),
                    num(size),
                    num3(r),
                    num3(g),
                    num3(b),
                    num(pen_x),
                    num(item.pdf_y)
                )
                .as_bytes(),
            );
            draw.ops.extend_from_slice(&pdf_literal(&text));
            push_op(&mut draw.ops, " Tj ET");

            if segment.underline {
                let rule_y = item.pdf_y - 0.12 * size;
                let rule_w = (size * 0.06).max(0.5);
                push_op(
                    &mut draw.ops,
                    &format!(
                        "{} {} {} RG {} w {} {} m {} {} l S",
                        num3(r),
                        num3(g),
                        num3(b),
                        num(rule_w),
                        num(pen_x),
                        num(rule_y),
                        num(pen_x + width),
                        num(rule_y)
                    ),
                );
            }

            pen_x += width;
        }
    }

    // Pass 3: signature and pasted-image annotations. Best-effort: one bad
    // image must not abort the save.
    for annotation in store.annotations() {
        if annotation.page_index >= pages.len() {
            warnings.push(format!(
                "annotation {}: page {} does not exist",
                annotation.id, annotation.page_index
            ));
            continue;
        }
        let view = match store.page_view(annotation.page_index) {
            Some(v) => v,
            None => {
                warnings.push(format!(
                    "annotation {}: no view registered for page {}",
                    annotation.id, annotation.page_index
                ));
                continue;
            }
        };
        match embed_image(&mut doc, &annotation.image_data) {
            Ok(image_id) => {
                let (x, y, w, h) = coords::image_rect_to_pdf(
                    annotation.x,
                    annotation.y,
                    annotation.width,
                    annotation.height,
                    view,
                );
                let draw = draws.entry(annotation.page_index).or_default();
                let name = format!("PEIm{}", annotation.id);
                push_op(
                    &mut draw.ops,
                    &format!(
                        "q {} 0 0 {} {} {} cm /{} Do Q",
                        num(w),
                        num(h),
                        num(x),
                        num(y),
                        name
                    ),
                );
                draw.xobjects.insert(name, image_id);
            }
            Err(e) => {
                warnings.push(format!("annotation {}: {}", annotation.id, e));
            }
        }
    }

    // Attach the accumulated drawing and resources to each touched page.
    for (page_index, draw) in draws {
        let page_id = pages[page_index];
        append_content(&mut doc, page_id, draw.ops)?;
        merge_resources(&mut doc, page_id, b"Font", draw.fonts)?;
        merge_resources(&mut doc, page_id, b"XObject", draw.xobjects)?;
        merge_resources(&mut doc, page_id, b"ExtGState", draw.gstates)?;
    }

    // Pass 4: page rotation.
    for (&page_index, &rotation) in store.rotations() {
        if page_index >= pages.len() {
            continue;
        }
        let page = doc
            .get_object_mut(pages[page_index])
            .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
        if let Object::Dictionary(ref mut dict) = page {
            dict.set("Rotate", Object::Integer(rotation as i64));
        }
    }

    // Pass 5: rebuild the page tree only when the order changed or pages
    // were deleted. Rotations applied above to dropped pages are silently
    // discarded with them.
    if store.pages_restructured() {
        doc = rebuild_document(&doc, &store.surviving_pages())?;
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
    Ok(SaveOutcome {
        bytes: out,
        warnings,
    })
}

/// Per-page drawing accumulator: operators plus the resources they need.
#[derive(Default)]
struct PageDraw {
    ops: Vec<u8>,
    fonts: HashMap<String, ObjectId>,
    xobjects: HashMap<String, ObjectId>,
    gstates: HashMap<String, ObjectId>,
}

// ---- image embedding ----

enum ImagePayload {
    Png(Vec<u8>),
    Jpeg(Vec<u8>),
}

fn decode_data_url(data_url: &str) -> Result<ImagePayload, PdfEditError> {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    let (header, payload) = data_url.split_once(',').ok_or_else(|| {
        PdfEditError::ImageError("not a data URL (missing comma separator)".to_string())
    })?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| PdfEditError::ImageError(format!("bad base64 payload: {}", e)))?;
    if bytes.is_empty() {
        return Err(PdfEditError::ImageError("empty image payload".to_string()));
    }

    if header.contains("image/png") {
        Ok(ImagePayload::Png(bytes))
    } else if header.contains("image/jpeg") || header.contains("image/jpg") {
        Ok(ImagePayload::Jpeg(bytes))
    } else {
        Err(PdfEditError::ImageError(format!(
            "unsupported image type in '{}'",
            header
        )))
    }
}

/// Embed an image payload as an image XObject, returning its object id.
fn embed_image(doc: &mut Document, data_url: &str) -> Result<ObjectId, PdfEditError> {
    match decode_data_url(data_url)? {
        ImagePayload::Png(bytes) => embed_png(doc, &bytes),
        ImagePayload::Jpeg(bytes) => embed_jpg(doc, &bytes),
    }
}

fn embed_png(doc: &mut Document, bytes: &[u8]) -> Result<ObjectId, PdfEditError> {
    let mut decoder = png::Decoder::new(std::io::Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| PdfEditError::ImageError(format!("bad PNG: {}", e)))?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| PdfEditError::ImageError(format!("bad PNG frame: {}", e)))?;
    buf.truncate(info.buffer_size());

    let (color_space, pixels, alpha): (&str, Vec<u8>, Option<Vec<u8>>) = match info.color_type {
        png::ColorType::Rgb => ("DeviceRGB", buf, None),
        png::ColorType::Grayscale => ("DeviceGray", buf, None),
        png::ColorType::Rgba => {
            let mut rgb = Vec::with_capacity(buf.len() / 4 * 3);
            let mut a = Vec::with_capacity(buf.len() / 4);
            for px in buf.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
                a.push(px[3]);
            }
            ("DeviceRGB", rgb, Some(a))
        }
        png::ColorType::GrayscaleAlpha => {
            let mut gray = Vec::with_capacity(buf.len() / 2);
            let mut a = Vec::with_capacity(buf.len() / 2);
            for px in buf.chunks_exact(2) {
                gray.push(px[0]);
                a.push(px[1]);
            }
            ("DeviceGray", gray, Some(a))
        }
        other => {
            return Err(PdfEditError::ImageError(format!(
                "unsupported PNG color type {:?}",
                other
            )))
        }
    };

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => info.width as i64,
        "Height" => info.height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };

    // Transparency rides along as a soft mask; skip it when fully opaque
    if let Some(a) = alpha.filter(|a| a.iter().any(|&v| v != 255)) {
        let mask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => info.width as i64,
                "Height" => info.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            flate_compress(&a)?,
        ));
        image_dict.set("SMask", Object::Reference(mask_id));
    }

    Ok(doc.add_object(Stream::new(image_dict, flate_compress(&pixels)?)))
}

/// JPEG data goes into the PDF untouched, decoded by the viewer.
fn embed_jpg(doc: &mut Document, bytes: &[u8]) -> Result<ObjectId, PdfEditError> {
    let (width, height) = jpeg_dimensions(bytes)
        .ok_or_else(|| PdfEditError::ImageError("could not read JPEG dimensions".to_string()))?;
    Ok(doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        bytes.to_vec(),
    )))
}

/// Pull width/height out of the first SOF marker.
fn jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }
    let mut pos = 2;
    while pos + 9 < bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        match marker {
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                let height = u16::from_be_bytes([bytes[pos + 5], bytes[pos + 6]]);
                let width = u16::from_be_bytes([bytes[pos + 7], bytes[pos + 8]]);
                return Some((width as u32, height as u32));
            }
            0xD8 | 0x01 | 0xD0..=0xD7 => pos += 2,
            _ => {
                let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
                pos += 2 + len;
            }
        }
    }
    None
}

fn flate_compress(data: &[u8]) -> Result<Vec<u8>, PdfEditError> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfEditError::ImageError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| PdfEditError::ImageError(e.to_string()))
}

// ---- restructure ----

/// Carry the surviving pages (0-indexed, already mutated) into a rebuilt
/// page tree in the given order, dropping everything else.
fn rebuild_document(doc: &Document, survivors: &[usize]) -> Result<Document, PdfEditError> {
    if survivors.is_empty() {
        return Err(PdfEditError::InvalidInput(
            "No pages left after deletion".to_string(),
        ));
    }

    let mut rebuilt = doc.clone();
    let pages: Vec<ObjectId> = rebuilt.get_pages().into_values().collect();

    let mut kept = Vec::with_capacity(survivors.len());
    for &index in survivors {
        let page_id = *pages.get(index).ok_or_else(|| {
            PdfEditError::OperationError(format!("Page index {} out of bounds", index))
        })?;
        kept.push(page_id);
    }

    let pages_root = pages_root_id(&rebuilt)?;

    // Flattening the tree loses attributes inherited from intermediate
    // nodes; pin them onto each kept page first.
    for &page_id in &kept {
        let (media_box, rotation, had_box, had_rotate) = {
            let dict = rebuilt
                .get_object(page_id)
                .map_err(|e| PdfEditError::OperationError(e.to_string()))?
                .as_dict()
                .map_err(|_| {
                    PdfEditError::OperationError("Page is not a dictionary".to_string())
                })?;
            (
                document::inherited_media_box(&rebuilt, dict),
                document::inherited_rotation(&rebuilt, dict),
                dict.has(b"MediaBox"),
                dict.has(b"Rotate"),
            )
        };
        let page = rebuilt
            .get_object_mut(page_id)
            .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
        if let Object::Dictionary(ref mut dict) = page {
            if !had_box {
                dict.set(
                    "MediaBox",
                    Object::Array(media_box.iter().map(|&v| Object::Real(v as f32)).collect()),
                );
            }
            if !had_rotate && rotation != 0 {
                dict.set("Rotate", Object::Integer(rotation as i64));
            }
            dict.set("Parent", Object::Reference(pages_root));
        }
    }

    let root = rebuilt
        .objects
        .get_mut(&pages_root)
        .ok_or_else(|| PdfEditError::OperationError("Pages root not found".to_string()))?;
    if let Object::Dictionary(ref mut dict) = root {
        dict.set(
            "Kids",
            Object::Array(kept.iter().map(|&id| Object::Reference(id)).collect()),
        );
        dict.set("Count", Object::Integer(kept.len() as i64));
    }

    rebuilt.prune_objects();
    Ok(rebuilt)
}

fn pages_root_id(doc: &Document) -> Result<ObjectId, PdfEditError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .map_err(|_| PdfEditError::OperationError("No Root in trailer".to_string()))?
        .as_reference()
        .map_err(|_| PdfEditError::OperationError("Root is not a reference".to_string()))?;
    doc.objects
        .get(&catalog_id)
        .ok_or_else(|| PdfEditError::OperationError("Catalog not found".to_string()))?
        .as_dict()
        .map_err(|_| PdfEditError::OperationError("Invalid catalog".to_string()))?
        .get(b"Pages")
        .map_err(|_| PdfEditError::OperationError("No Pages in catalog".to_string()))?
        .as_reference()
        .map_err(|_| PdfEditError::OperationError("Pages is not a reference".to_string()))
}
