//! Structural compression
//!
//! Re-saves a document with unreferenced objects pruned and content streams
//! Flate-compressed. Raster downsampling would need the rasterizer and is
//! out of scope.

use lopdf::Document;

use crate::error::PdfEditError;

#[derive(Debug, Clone, Copy)]
pub struct CompressStats {
    pub input_bytes: usize,
    pub output_bytes: usize,
}

impl CompressStats {
    /// Bytes saved relative to the input; negative when the rewrite grew.
    pub fn saved(&self) -> i64 {
        self.input_bytes as i64 - self.output_bytes as i64
    }
}

/// Prune and recompress a document.
pub fn compress_document(bytes: &[u8]) -> Result<(Vec<u8>, CompressStats), PdfEditError> {
    let mut doc =
        Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;

    doc.prune_objects();
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| PdfEditError::OperationError(e.to_string()))?;

    let stats = CompressStats {
        input_bytes: bytes.len(),
        output_bytes: out.len(),
    };
    Ok((out, stats))
}
