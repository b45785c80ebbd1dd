//! Stateful editing session exposed to JavaScript
//!
//! Holds the document bytes and the whole edit state in Rust; the page is
//! rasterized by PDF.js on the JavaScript side, which feeds glyph runs in
//! through [`EditorSession::load_text_runs`] and receives reconstructed
//! text items back as JSON.

use pdfedit_core::{
    enrich_runs, reconstruct_lines, save_document, AnnotationKind, DocumentInfo, EditorStore,
    NameHeuristics, PageView, PdfEditError, RawGlyphRun,
};
use wasm_bindgen::prelude::*;

/// One open document plus its edit state.
#[wasm_bindgen]
pub struct EditorSession {
    document_bytes: Vec<u8>,
    document_name: String,
    info: DocumentInfo,
    store: EditorStore,
    last_warnings: Vec<String>,
}

impl EditorSession {
    fn open(name: &str, bytes: &[u8]) -> Result<EditorSession, PdfEditError> {
        let info = pdfedit_core::inspect(bytes)?;
        Ok(EditorSession {
            document_bytes: bytes.to_vec(),
            document_name: name.to_string(),
            store: EditorStore::new(info.page_count as usize),
            info,
            last_warnings: Vec::new(),
        })
    }

    fn load_runs_internal(
        &mut self,
        page_index: usize,
        runs_json: &str,
    ) -> Result<String, PdfEditError> {
        let runs: Vec<RawGlyphRun> = serde_json::from_str(runs_json)
            .map_err(|e| PdfEditError::SerializationError(e.to_string()))?;
        let view = *self.store.page_view(page_index).ok_or_else(|| {
            PdfEditError::InvalidInput(format!("No view registered for page {}", page_index))
        })?;

        let items = reconstruct_lines(page_index, enrich_runs(runs, &NameHeuristics), &view);
        let loaded = self.store.load_page_items(page_index, items);
        serde_json::to_string(loaded).map_err(|e| PdfEditError::SerializationError(e.to_string()))
    }

    fn save_internal(&mut self) -> Result<Vec<u8>, PdfEditError> {
        let outcome = save_document(&self.document_bytes, &self.store)?;
        self.last_warnings = outcome.warnings;
        Ok(outcome.bytes)
    }
}

#[wasm_bindgen]
impl EditorSession {
    /// Open a document for editing. Fails on unparseable bytes.
    #[wasm_bindgen(constructor)]
    pub fn new(name: &str, bytes: &[u8]) -> Result<EditorSession, JsValue> {
        Self::open(name, bytes).map_err(to_js)
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.info.page_count
    }

    #[wasm_bindgen(getter, js_name = documentName)]
    pub fn document_name(&self) -> String {
        self.document_name.clone()
    }

    #[wasm_bindgen(getter, js_name = isEncrypted)]
    pub fn is_encrypted(&self) -> bool {
        self.info.encrypted
    }

    /// Output file name with the "-edited" suffix.
    #[wasm_bindgen(js_name = suggestedFileName)]
    pub fn suggested_file_name(&self) -> String {
        pdfedit_core::edited_file_name(&self.document_name)
    }

    /// Original bytes, for PDF.js rendering.
    #[wasm_bindgen(js_name = getDocumentBytes)]
    pub fn get_document_bytes(&self) -> js_sys::Uint8Array {
        let array = js_sys::Uint8Array::new_with_length(self.document_bytes.len() as u32);
        array.copy_from(&self.document_bytes);
        array
    }

    /// Record how a page is presented in the editor (CSS pixels + scale).
    /// Must be called before text runs are loaded for that page.
    #[wasm_bindgen(js_name = registerPageView)]
    pub fn register_page_view(&mut self, page_index: usize, width: f64, height: f64, scale: f64) {
        self.store.set_page_view(page_index, PageView::new(width, height, scale));
    }

    /// Ingest the PDF.js `getTextContent` items for a page and return the
    /// reconstructed text items as JSON.
    #[wasm_bindgen(js_name = loadTextRuns)]
    pub fn load_text_runs(&mut self, page_index: usize, runs_json: &str) -> Result<String, JsValue> {
        self.load_runs_internal(page_index, runs_json).map_err(to_js)
    }

    /// All current text items for a page, as JSON.
    #[wasm_bindgen(js_name = getItems)]
    pub fn get_items(&self, page_index: usize) -> Result<String, JsValue> {
        let items: Vec<_> = self.store.items_for_page(page_index).collect();
        serde_json::to_string(&items).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Insert an empty text block at an editor-space position.
    #[wasm_bindgen(js_name = addTextItem)]
    pub fn add_text_item(
        &mut self,
        page_index: usize,
        x: f64,
        y: f64,
        font_size: f64,
    ) -> Result<u64, JsValue> {
        self.store.add_text_item(page_index, x, y, font_size).map_err(to_js)
    }

    #[wasm_bindgen(js_name = updateItemText)]
    pub fn update_item_text(&mut self, id: u64, markup: &str) -> bool {
        self.store.update_item_text(id, markup)
    }

    #[wasm_bindgen(js_name = moveItem)]
    pub fn move_item(&mut self, id: u64, x: f64, y: f64, width: f64, font_size: f64) -> bool {
        self.store.update_item_geometry(id, x, y, width, font_size)
    }

    #[wasm_bindgen(js_name = removeItem)]
    pub fn remove_item(&mut self, id: u64) -> bool {
        self.store.remove_text_item(id)
    }

    pub fn undo(&mut self) -> bool {
        self.store.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.store.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    /// Place a drawn signature image (PNG data URL) on a page.
    #[wasm_bindgen(js_name = addSignature)]
    pub fn add_signature(
        &mut self,
        page_index: usize,
        data_url: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<u64, JsValue> {
        self.store
            .add_annotation(
                AnnotationKind::Signature,
                page_index,
                data_url.to_string(),
                x,
                y,
                width,
                height,
            )
            .map_err(to_js)
    }

    /// Place a pasted image (PNG or JPEG data URL) on a page.
    #[wasm_bindgen(js_name = addImage)]
    pub fn add_image(
        &mut self,
        page_index: usize,
        data_url: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<u64, JsValue> {
        self.store
            .add_annotation(
                AnnotationKind::Image,
                page_index,
                data_url.to_string(),
                x,
                y,
                width,
                height,
            )
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = moveAnnotation)]
    pub fn move_annotation(&mut self, id: u64, x: f64, y: f64, width: f64, height: f64) -> bool {
        self.store.update_annotation_rect(id, x, y, width, height)
    }

    #[wasm_bindgen(js_name = removeAnnotation)]
    pub fn remove_annotation(&mut self, id: u64) -> bool {
        self.store.remove_annotation(id)
    }

    /// Rotate a page a further 90 degrees; returns the new rotation value.
    #[wasm_bindgen(js_name = rotatePage)]
    pub fn rotate_page(&mut self, page_index: usize) -> Result<u32, JsValue> {
        self.store.rotate_page(page_index).map_err(to_js)
    }

    #[wasm_bindgen(js_name = deletePage)]
    pub fn delete_page(&mut self, page_index: usize) -> Result<(), JsValue> {
        self.store.mark_page_deleted(page_index).map_err(to_js)
    }

    #[wasm_bindgen(js_name = restorePage)]
    pub fn restore_page(&mut self, page_index: usize) -> Result<(), JsValue> {
        self.store.restore_page(page_index).map_err(to_js)
    }

    /// Replace the page order with a permutation of 0..pageCount.
    #[wasm_bindgen(js_name = reorderPages)]
    pub fn reorder_pages(&mut self, new_order: Vec<u32>) -> Result<(), JsValue> {
        let order: Vec<usize> = new_order.into_iter().map(|p| p as usize).collect();
        self.store.reorder_pages(&order).map_err(to_js)
    }

    /// Apply every edit and return the new document bytes. The session's
    /// edit state is kept, so a failed download can simply be retried.
    pub fn save(&mut self) -> Result<js_sys::Uint8Array, JsValue> {
        let bytes = self.save_internal().map_err(to_js)?;
        let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
        array.copy_from(&bytes);
        Ok(array)
    }

    /// Annotations skipped during the most recent save.
    #[wasm_bindgen(js_name = lastWarnings)]
    pub fn last_warnings(&self) -> Vec<String> {
        self.last_warnings.clone()
    }
}

fn to_js(e: PdfEditError) -> JsValue {
    JsValue::from_str(&e.to_string())
}
