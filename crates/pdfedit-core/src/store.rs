//! Session-scoped edit state
//!
//! The [`EditorStore`] owns every piece of edit state for the active
//! document: text items, signature and pasted-image annotations, per-page
//! rotation, deleted pages, and the page order. It is discarded and rebuilt
//! wholesale when a new document is loaded.
//!
//! Undo/redo covers the text-item collection only, as bounded deep-copy
//! snapshots committed per edit. Annotations, rotation, deletion and
//! ordering are separate non-versioned streams; see DESIGN.md for why this
//! split is preserved.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::coords::{self, PageView};
use crate::error::PdfEditError;

pub type ItemId = u64;

/// Snapshots kept on the undo stack.
pub const HISTORY_CAPACITY: usize = 50;

/// One editable line of text.
///
/// Geometry is carried in both editor-space (`x`, `y`, `width`, `height`,
/// `font_size`) and PDF user-space (`pdf_*`); the PDF fields are refreshed
/// through the page view whenever the editor geometry changes, so the save
/// pass never converts coordinates itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextItem {
    pub id: ItemId,
    /// Markup string; may contain `<b>`/`<i>`/`<u>`/`<span …>` spans.
    #[serde(rename = "str")]
    pub markup: String,
    #[serde(rename = "originalStr")]
    pub original: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub pdf_x: f64,
    pub pdf_y: f64,
    pub pdf_font_size: f64,
    pub pdf_width: f64,
    pub page_index: usize,
    pub edited: bool,
    pub is_new: bool,
}

/// What an image annotation represents. Both kinds draw the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Signature,
    Image,
}

/// A raster annotation (freehand signature or pasted image), positioned in
/// editor-space. PDF-space conversion happens only at save time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnnotation {
    pub id: ItemId,
    pub kind: AnnotationKind,
    /// Raster payload as a data URL (`data:image/png;base64,…`).
    pub image_data: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page_index: usize,
}

#[derive(Debug, Default)]
struct History {
    undo: VecDeque<Vec<TextItem>>,
    redo: Vec<Vec<TextItem>>,
}

impl History {
    fn commit(&mut self, snapshot: Vec<TextItem>) {
        self.undo.push_back(snapshot);
        if self.undo.len() > HISTORY_CAPACITY {
            self.undo.pop_front();
        }
        self.redo.clear();
    }
}

/// In-memory edit state for one document.
#[derive(Debug, Default)]
pub struct EditorStore {
    next_id: ItemId,
    page_count: usize,
    items: Vec<TextItem>,
    annotations: Vec<ImageAnnotation>,
    rotations: HashMap<usize, u32>,
    deleted_pages: HashSet<usize>,
    page_order: Vec<usize>,
    views: HashMap<usize, PageView>,
    history: History,
}

impl EditorStore {
    /// Create a store for a document with `page_count` pages. The page order
    /// starts as the identity permutation.
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            page_order: (0..page_count).collect(),
            ..Self::default()
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Record how a page is currently presented in the editor.
    pub fn set_page_view(&mut self, page_index: usize, view: PageView) {
        self.views.insert(page_index, view);
    }

    pub fn page_view(&self, page_index: usize) -> Option<&PageView> {
        self.views.get(&page_index)
    }

    fn alloc_id(&mut self) -> ItemId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ---- text items ----

    /// Adopt reconstructed lines for a page, assigning ids. Replaces any
    /// items previously loaded for that page (a page is extracted once per
    /// document load).
    pub fn load_page_items(&mut self, page_index: usize, items: Vec<TextItem>) -> &[TextItem] {
        self.items.retain(|t| t.page_index != page_index);
        let start = self.items.len();
        for mut item in items {
            item.id = self.alloc_id();
            self.items.push(item);
        }
        &self.items[start..]
    }

    /// Create a user-inserted text block at an editor-space position.
    pub fn add_text_item(
        &mut self,
        page_index: usize,
        x: f64,
        y: f64,
        font_size: f64,
    ) -> Result<ItemId, PdfEditError> {
        let view = *self.require_view(page_index)?;
        self.commit_snapshot();
        let id = self.alloc_id();
        let mut item = TextItem {
            id,
            markup: String::new(),
            original: String::new(),
            x,
            y,
            width: 0.0,
            height: font_size * 1.2,
            font_size,
            pdf_x: 0.0,
            pdf_y: 0.0,
            pdf_font_size: 0.0,
            pdf_width: 0.0,
            page_index,
            edited: false,
            is_new: true,
        };
        refresh_pdf_geometry(&mut item, &view);
        self.items.push(item);
        Ok(id)
    }

    pub fn items(&self) -> &[TextItem] {
        &self.items
    }

    pub fn items_for_page(&self, page_index: usize) -> impl Iterator<Item = &TextItem> + '_ {
        self.items.iter().filter(move |t| t.page_index == page_index)
    }

    pub fn get_item(&self, id: ItemId) -> Option<&TextItem> {
        self.items.iter().find(|t| t.id == id)
    }

    /// Replace an item's markup. `edited` tracks divergence from the
    /// original extracted text; for new items any non-empty text counts.
    pub fn update_item_text(&mut self, id: ItemId, markup: &str) -> bool {
        self.commit_snapshot();
        match self.items.iter_mut().find(|t| t.id == id) {
            Some(item) => {
                item.markup = markup.to_string();
                item.edited = if item.is_new {
                    !item.markup.is_empty()
                } else {
                    item.markup != item.original
                };
                true
            }
            None => {
                self.rollback_snapshot();
                false
            }
        }
    }

    /// Move/resize an item in editor-space and refresh its PDF geometry.
    pub fn update_item_geometry(
        &mut self,
        id: ItemId,
        x: f64,
        y: f64,
        width: f64,
        font_size: f64,
    ) -> bool {
        self.commit_snapshot();
        let view = match self
            .items
            .iter()
            .find(|t| t.id == id)
            .and_then(|t| self.views.get(&t.page_index))
        {
            Some(v) => *v,
            None => {
                self.rollback_snapshot();
                return false;
            }
        };
        match self.items.iter_mut().find(|t| t.id == id) {
            Some(item) => {
                item.x = x.max(0.0);
                item.y = y.max(0.0);
                item.width = width;
                item.font_size = font_size;
                item.height = font_size * 1.2;
                refresh_pdf_geometry(item, &view);
                true
            }
            None => {
                self.rollback_snapshot();
                false
            }
        }
    }

    pub fn remove_text_item(&mut self, id: ItemId) -> bool {
        self.commit_snapshot();
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        if self.items.len() == before {
            self.rollback_snapshot();
            false
        } else {
            true
        }
    }

    // ---- undo / redo (text items only) ----

    fn commit_snapshot(&mut self) {
        self.history.commit(self.items.clone());
    }

    /// Drop the snapshot committed by an operation that turned out to be a
    /// no-op, so failed lookups don't pollute the history.
    fn rollback_snapshot(&mut self) {
        self.history.undo.pop_back();
    }

    pub fn can_undo(&self) -> bool {
        !self.history.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.history.redo.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo.pop_back() {
            Some(snapshot) => {
                self.history.redo.push(std::mem::replace(&mut self.items, snapshot));
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo.pop() {
            Some(snapshot) => {
                self.history
                    .undo
                    .push_back(std::mem::replace(&mut self.items, snapshot));
                true
            }
            None => false,
        }
    }

    // ---- annotations ----

    pub fn add_annotation(
        &mut self,
        kind: AnnotationKind,
        page_index: usize,
        image_data: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<ItemId, PdfEditError> {
        if width <= 0.0 || height <= 0.0 {
            return Err(PdfEditError::InvalidInput(format!(
                "Annotation size must be positive, got {}x{}",
                width, height
            )));
        }
        let view = *self.require_view(page_index)?;
        // Clamp to page bounds; positions may go negative only mid-drag
        let x = x.max(0.0).min(view.width - width.min(view.width));
        let y = y.max(0.0).min(view.height - height.min(view.height));
        let id = self.alloc_id();
        self.annotations.push(ImageAnnotation {
            id,
            kind,
            image_data,
            x,
            y,
            width,
            height,
            page_index,
        });
        Ok(id)
    }

    pub fn annotations(&self) -> &[ImageAnnotation] {
        &self.annotations
    }

    /// Move/resize an annotation in editor-space, clamped to page bounds.
    pub fn update_annotation_rect(
        &mut self,
        id: ItemId,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> bool {
        if width <= 0.0 || height <= 0.0 {
            return false;
        }
        let view = match self
            .annotations
            .iter()
            .find(|a| a.id == id)
            .and_then(|a| self.views.get(&a.page_index))
        {
            Some(v) => *v,
            None => return false,
        };
        match self.annotations.iter_mut().find(|a| a.id == id) {
            Some(ann) => {
                ann.x = x.max(0.0).min(view.width - width.min(view.width));
                ann.y = y.max(0.0).min(view.height - height.min(view.height));
                ann.width = width;
                ann.height = height;
                true
            }
            None => false,
        }
    }

    pub fn remove_annotation(&mut self, id: ItemId) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.id != id);
        self.annotations.len() != before
    }

    // ---- page-level state ----

    /// Rotate a page a further 90 degrees clockwise.
    pub fn rotate_page(&mut self, page_index: usize) -> Result<u32, PdfEditError> {
        self.check_page(page_index)?;
        let entry = self.rotations.entry(page_index).or_insert(0);
        *entry = (*entry + 90) % 360;
        let value = *entry;
        if value == 0 {
            self.rotations.remove(&page_index);
        }
        Ok(value)
    }

    pub fn rotation(&self, page_index: usize) -> u32 {
        self.rotations.get(&page_index).copied().unwrap_or(0)
    }

    pub fn rotations(&self) -> &HashMap<usize, u32> {
        &self.rotations
    }

    pub fn mark_page_deleted(&mut self, page_index: usize) -> Result<(), PdfEditError> {
        self.check_page(page_index)?;
        self.deleted_pages.insert(page_index);
        Ok(())
    }

    pub fn restore_page(&mut self, page_index: usize) -> Result<(), PdfEditError> {
        self.check_page(page_index)?;
        self.deleted_pages.remove(&page_index);
        Ok(())
    }

    pub fn is_page_deleted(&self, page_index: usize) -> bool {
        self.deleted_pages.contains(&page_index)
    }

    pub fn deleted_pages(&self) -> &HashSet<usize> {
        &self.deleted_pages
    }

    /// Replace the page order. `new_order` must be a permutation of
    /// `0..page_count`.
    pub fn reorder_pages(&mut self, new_order: &[usize]) -> Result<(), PdfEditError> {
        if new_order.len() != self.page_count {
            return Err(PdfEditError::InvalidInput(format!(
                "Order has {} entries for {} pages",
                new_order.len(),
                self.page_count
            )));
        }
        let mut seen = vec![false; self.page_count];
        for &idx in new_order {
            if idx >= self.page_count {
                return Err(PdfEditError::InvalidInput(format!(
                    "Page index {} out of bounds",
                    idx
                )));
            }
            if seen[idx] {
                return Err(PdfEditError::InvalidInput(format!(
                    "Duplicate page index {}",
                    idx
                )));
            }
            seen[idx] = true;
        }
        self.page_order = new_order.to_vec();
        Ok(())
    }

    pub fn page_order(&self) -> &[usize] {
        &self.page_order
    }

    /// Whether saving needs the restructure pass.
    pub fn pages_restructured(&self) -> bool {
        !self.deleted_pages.is_empty()
            || self.page_order.iter().enumerate().any(|(i, &p)| i != p)
    }

    /// Surviving original page indices in output order.
    pub fn surviving_pages(&self) -> Vec<usize> {
        self.page_order
            .iter()
            .copied()
            .filter(|p| !self.deleted_pages.contains(p))
            .collect()
    }

    fn check_page(&self, page_index: usize) -> Result<(), PdfEditError> {
        if page_index >= self.page_count {
            return Err(PdfEditError::InvalidInput(format!(
                "Page index {} out of bounds (document has {} pages)",
                page_index, self.page_count
            )));
        }
        Ok(())
    }

    fn require_view(&self, page_index: usize) -> Result<&PageView, PdfEditError> {
        self.check_page(page_index)?;
        self.views.get(&page_index).ok_or_else(|| {
            PdfEditError::InvalidInput(format!("No view registered for page {}", page_index))
        })
    }
}

/// Recompute an item's PDF-space geometry from its editor-space geometry.
pub fn refresh_pdf_geometry(item: &mut TextItem, view: &PageView) {
    item.pdf_x = coords::to_pdf_x(item.x, view.scale);
    item.pdf_y = coords::to_pdf_y(item.y, item.font_size, view.height, view.scale);
    item.pdf_font_size = coords::to_pdf_len(item.font_size, view.scale);
    item.pdf_width = coords::to_pdf_len(item.width, view.scale);
}
