//! Content-stream plumbing shared by the drawing passes
//!
//! Helpers for emitting PDF content operators, attaching extra content
//! streams to pages, and registering the resources those operators need.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::PdfEditError;

pub(crate) fn push_op(buf: &mut Vec<u8>, op: &str) {
    buf.extend_from_slice(op.as_bytes());
    buf.push(b'\n');
}

pub(crate) fn num(v: f64) -> String {
    format!("{:.2}", v)
}

pub(crate) fn num3(v: f32) -> String {
    format!("{:.3}", v)
}

/// Encode text as a PDF literal string: escape delimiters, emit Latin-1
/// bytes. Input must already be sanitised to the Latin-1 range.
pub(crate) fn pdf_literal(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for c in text.chars() {
        match c {
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\\' => out.extend_from_slice(b"\\\\"),
            _ => out.push(c as u32 as u8),
        }
    }
    out.push(b')');
    out
}

/// Parse "#RRGGBB" (or "RRGGBB") into 0..1 components; black on bad input.
pub(crate) fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim_start_matches('#');
    if hex.len() >= 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0) as f32 / 255.0;
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0) as f32 / 255.0;
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0) as f32 / 255.0;
        (r, g, b)
    } else {
        (0.0, 0.0, 0.0)
    }
}

/// Append drawing operators to a page as an extra content stream, isolated
/// in its own graphics state.
pub(crate) fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    ops: Vec<u8>,
) -> Result<(), PdfEditError> {
    if ops.is_empty() {
        return Ok(());
    }
    let mut content = Vec::with_capacity(ops.len() + 4);
    content.extend_from_slice(b"q\n");
    content.extend_from_slice(&ops);
    content.extend_from_slice(b"Q\n");
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), content));

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
    let dict = page
        .as_dict_mut()
        .map_err(|_| PdfEditError::OperationError("Page is not a dictionary".to_string()))?;

    let new_contents = match dict.get(b"Contents") {
        Ok(Object::Reference(existing)) => Object::Array(vec![
            Object::Reference(*existing),
            Object::Reference(stream_id),
        ]),
        Ok(Object::Array(arr)) => {
            let mut arr = arr.clone();
            arr.push(Object::Reference(stream_id));
            Object::Array(arr)
        }
        _ => Object::Reference(stream_id),
    };
    dict.set("Contents", new_contents);
    Ok(())
}

/// Merge named entries into one category (Font/XObject/ExtGState) of a
/// page's resource dictionary, following references and creating missing
/// dictionaries along the way.
pub(crate) fn merge_resources(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    entries: impl IntoIterator<Item = (String, ObjectId)>,
) -> Result<(), PdfEditError> {
    let entries: Vec<(String, ObjectId)> = entries.into_iter().collect();
    if entries.is_empty() {
        return Ok(());
    }

    // Locate the resources dictionary: inline on the page, behind a
    // reference, or absent.
    let resources_ref = {
        let page = doc
            .get_object(page_id)
            .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
        let dict = page
            .as_dict()
            .map_err(|_| PdfEditError::OperationError("Page is not a dictionary".to_string()))?;
        match dict.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    let mut resources = match resources_ref {
        Some(id) => doc
            .get_object(id)
            .ok()
            .and_then(|obj| obj.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new),
        None => {
            let page = doc
                .get_object(page_id)
                .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
            page.as_dict()
                .ok()
                .and_then(|dict| dict.get(b"Resources").ok())
                .and_then(|obj| obj.as_dict().ok())
                .cloned()
                .unwrap_or_else(Dictionary::new)
        }
    };

    // The category itself may also sit behind a reference.
    let category_ref = match resources.get(category) {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    let mut sub = match category_ref {
        Some(id) => doc
            .get_object(id)
            .ok()
            .and_then(|obj| obj.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new),
        None => resources
            .get(category)
            .ok()
            .and_then(|obj| obj.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new),
    };

    for (name, id) in entries {
        sub.set(name.into_bytes(), Object::Reference(id));
    }

    match category_ref {
        Some(id) => {
            doc.objects.insert(id, Object::Dictionary(sub));
        }
        None => {
            resources.set(category.to_vec(), Object::Dictionary(sub));
        }
    }

    match resources_ref {
        Some(id) => {
            doc.objects.insert(id, Object::Dictionary(resources));
        }
        None => {
            let page = doc
                .get_object_mut(page_id)
                .map_err(|e| PdfEditError::OperationError(e.to_string()))?;
            if let Object::Dictionary(ref mut dict) = page {
                dict.set("Resources", Object::Dictionary(resources));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_test_pdf;

    #[test]
    fn test_pdf_literal_escapes() {
        assert_eq!(pdf_literal("a(b)c"), b"(a\\(b\\)c)".to_vec());
        assert_eq!(pdf_literal("back\\slash"), b"(back\\\\slash)".to_vec());
        // Latin-1 bytes pass through as single bytes
        assert_eq!(pdf_literal("é"), vec![b'(', 0xE9, b')']);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0000"), (1.0, 0.0, 0.0));
        assert_eq!(parse_hex_color("00FF00"), (0.0, 1.0, 0.0));
        assert_eq!(parse_hex_color("bad"), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_append_content_keeps_existing_stream() {
        let pdf = build_test_pdf(1);
        let mut doc = lopdf::Document::load_mem(&pdf).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();

        append_content(&mut doc, page_id, b"1 1 1 rg 0 0 10 10 re f\n".to_vec()).unwrap();

        let dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
        match dict.get(b"Contents").unwrap() {
            Object::Array(arr) => assert_eq!(arr.len(), 2),
            other => panic!("expected Contents array, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_resources_creates_dictionaries() {
        let pdf = build_test_pdf(1);
        let mut doc = lopdf::Document::load_mem(&pdf).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        merge_resources(&mut doc, page_id, b"Font", vec![("F9".to_string(), font_id)]).unwrap();

        let dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = dict.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(matches!(fonts.get(b"F9"), Ok(Object::Reference(id)) if *id == font_id));
    }
}
