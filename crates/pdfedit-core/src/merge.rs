//! Document merging
//!
//! Combines N documents into one by remapping every object id of each
//! appended document past the destination's current maximum, then splicing
//! its pages into the destination page tree.

use std::collections::BTreeMap;

use lopdf::{Document, Object, ObjectId};

use crate::error::PdfEditError;

/// Merge documents in input order into a single PDF.
///
/// Zero inputs is an error; a single input is returned unchanged.
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfEditError> {
    if documents.is_empty() {
        return Err(PdfEditError::OperationError(
            "No documents to merge".to_string(),
        ));
    }
    if documents.len() == 1 {
        return Ok(documents.into_iter().next().unwrap());
    }

    let mut loaded = Vec::with_capacity(documents.len());
    for (i, bytes) in documents.iter().enumerate() {
        let doc = Document::load_mem(bytes).map_err(|e| {
            PdfEditError::ParseError(format!("Failed to load document {}: {}", i, e))
        })?;
        loaded.push(doc);
    }

    let mut dest = loaded.remove(0);
    let mut max_id = dest.max_id;
    let mut page_refs: Vec<ObjectId> = dest.get_pages().into_values().collect();

    for source in loaded {
        let offset = max_id;
        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        let source_max = source.max_id;

        let mut remapped = BTreeMap::new();
        for (old_id, object) in source.objects {
            remapped.insert((old_id.0 + offset, old_id.1), shift_refs(object, offset));
        }
        dest.objects.extend(remapped);

        page_refs.extend(source_pages.into_iter().map(|id| (id.0 + offset, id.1)));
        max_id = (source_max + offset).max(max_id);
    }

    rewrite_page_tree(&mut dest, &page_refs)?;
    dest.max_id = max_id;
    dest.compress();

    let mut out = Vec::new();
    dest.save_to(&mut out)
        .map_err(|e| PdfEditError::OperationError(format!("Failed to save merged PDF: {}", e)))?;
    Ok(out)
}

/// Shift every object reference inside `obj` by `offset`.
fn shift_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(items) => {
            Object::Array(items.into_iter().map(|o| shift_refs(o, offset)).collect())
        }
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = shift_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = shift_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Point the destination's Pages node at the combined page list, reparenting
/// every page onto it.
fn rewrite_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> Result<(), PdfEditError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .map_err(|_| PdfEditError::OperationError("No Root in trailer".to_string()))?
        .as_reference()
        .map_err(|_| PdfEditError::OperationError("Root is not a reference".to_string()))?;

    let pages_id = doc
        .objects
        .get(&catalog_id)
        .ok_or_else(|| PdfEditError::OperationError("Catalog not found".to_string()))?
        .as_dict()
        .map_err(|_| PdfEditError::OperationError("Invalid catalog".to_string()))?
        .get(b"Pages")
        .map_err(|_| PdfEditError::OperationError("No Pages in catalog".to_string()))?
        .as_reference()
        .map_err(|_| PdfEditError::OperationError("Pages is not a reference".to_string()))?;

    for &page_ref in page_refs {
        if let Some(Object::Dictionary(ref mut page_dict)) = doc.objects.get_mut(&page_ref) {
            page_dict.set("Parent", Object::Reference(pages_id));
        }
    }

    match doc.objects.get_mut(&pages_id) {
        Some(Object::Dictionary(ref mut pages_dict)) => {
            pages_dict.set(
                "Kids",
                Object::Array(page_refs.iter().map(|&id| Object::Reference(id)).collect()),
            );
            pages_dict.set("Count", Object::Integer(page_refs.len() as i64));
            Ok(())
        }
        _ => Err(PdfEditError::OperationError(
            "Invalid pages dictionary".to_string(),
        )),
    }
}
