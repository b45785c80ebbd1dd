//! Coordinate transformation between editor, render, and PDF coordinate systems
//!
//! Three spaces are in play:
//! - render-space: rasterizer output pixels (editor-space times device pixel ratio)
//! - editor-space: on-screen CSS pixels, top-left origin, y increasing downward
//! - PDF user-space: document points, bottom-left origin, y increasing upward
//!
//! Every conversion in the workspace goes through this module; nothing else
//! is allowed to compute `page_height - y` inline.

/// Fraction of the font size separating the editor box's top edge from the
/// text baseline. HTML text boxes anchor at their top-left corner while PDF
/// text anchors at the baseline.
pub const BASELINE_FACTOR: f64 = 0.9;

/// Per-page view geometry: how the page is currently presented in the editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageView {
    /// Editor pixels per PDF point.
    pub scale: f64,
    /// Page width in editor pixels.
    pub width: f64,
    /// Page height in editor pixels.
    pub height: f64,
}

impl PageView {
    pub fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            scale,
            width,
            height,
        }
    }
}

/// Convert an editor-space x coordinate to PDF user-space.
///
/// Returns NaN when `scale` is not strictly positive.
pub fn to_pdf_x(editor_x: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return f64::NAN;
    }
    editor_x / scale
}

/// Convert an editor-space y coordinate (top of a text box) to the PDF-space
/// baseline y for text of the given editor-space font size.
///
/// Returns NaN when `scale` is not strictly positive.
pub fn to_pdf_y(editor_y: f64, font_size_editor: f64, page_height_editor: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return f64::NAN;
    }
    (page_height_editor - editor_y - font_size_editor * BASELINE_FACTOR) / scale
}

/// Inverse of [`to_pdf_x`].
pub fn to_editor_x(pdf_x: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return f64::NAN;
    }
    pdf_x * scale
}

/// Inverse of [`to_pdf_y`].
pub fn to_editor_y(pdf_y: f64, font_size_editor: f64, page_height_editor: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return f64::NAN;
    }
    page_height_editor - pdf_y * scale - font_size_editor * BASELINE_FACTOR
}

/// Convert a length (width, height, font size) from editor to PDF space.
pub fn to_pdf_len(editor_len: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return f64::NAN;
    }
    editor_len / scale
}

/// Convert a length from PDF to editor space.
pub fn to_editor_len(pdf_len: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return f64::NAN;
    }
    pdf_len * scale
}

/// Convert a render-space pixel coordinate to editor-space.
pub fn render_to_editor(render_px: f64, device_pixel_ratio: f64) -> f64 {
    if device_pixel_ratio <= 0.0 {
        return f64::NAN;
    }
    render_px / device_pixel_ratio
}

/// Convert an editor-space coordinate to render-space.
pub fn editor_to_render(editor_px: f64, device_pixel_ratio: f64) -> f64 {
    if device_pixel_ratio <= 0.0 {
        return f64::NAN;
    }
    editor_px * device_pixel_ratio
}

/// Convert an image rectangle (editor-space, top-left anchored) to its
/// PDF-space rectangle (bottom-left anchored). Images have no baseline, so
/// the box bottom maps directly.
pub fn image_rect_to_pdf(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    view: &PageView,
) -> (f64, f64, f64, f64) {
    let scale = view.scale;
    if scale <= 0.0 {
        return (f64::NAN, f64::NAN, f64::NAN, f64::NAN);
    }
    let pdf_w = width / scale;
    let pdf_h = height / scale;
    let pdf_x = x / scale;
    let pdf_y = (view.height - y - height) / scale;
    (pdf_x, pdf_y, pdf_w, pdf_h)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = f64> {
        1.0f64..2000.0
    }

    fn scale() -> impl Strategy<Value = f64> {
        0.25f64..4.0
    }

    proptest! {
        /// Property: editor -> PDF -> editor roundtrip returns the original
        /// coordinates within floating-point tolerance.
        #[test]
        fn roundtrip_editor_to_pdf_to_editor(
            editor_x in 0.0f64..2000.0,
            editor_y in 0.0f64..2000.0,
            font_size in 6.0f64..72.0,
            page_height in dimension(),
            s in scale(),
        ) {
            let pdf_x = to_pdf_x(editor_x, s);
            let pdf_y = to_pdf_y(editor_y, font_size, page_height, s);

            let back_x = to_editor_x(pdf_x, s);
            let back_y = to_editor_y(pdf_y, font_size, page_height, s);

            prop_assert!((back_x - editor_x).abs() < 1e-6,
                "x roundtrip failed: {} -> {} -> {}", editor_x, pdf_x, back_x);
            prop_assert!((back_y - editor_y).abs() < 1e-6,
                "y roundtrip failed: {} -> {} -> {}", editor_y, pdf_y, back_y);
        }

        /// Property: PDF -> editor -> PDF roundtrip returns the original.
        #[test]
        fn roundtrip_pdf_to_editor_to_pdf(
            pdf_x in 0.0f64..2000.0,
            pdf_y in 0.0f64..2000.0,
            font_size in 6.0f64..72.0,
            page_height in dimension(),
            s in scale(),
        ) {
            let ex = to_editor_x(pdf_x, s);
            let ey = to_editor_y(pdf_y, font_size, page_height, s);

            prop_assert!((to_pdf_x(ex, s) - pdf_x).abs() < 1e-6);
            prop_assert!((to_pdf_y(ey, font_size, page_height, s) - pdf_y).abs() < 1e-6);
        }

        /// Property: moving down in the editor moves down the PDF page.
        #[test]
        fn y_direction_inverted(
            y1 in 0.0f64..900.0,
            delta in 1.0f64..100.0,
            page_height in dimension(),
            s in scale(),
        ) {
            let top = to_pdf_y(y1, 12.0, page_height, s);
            let below = to_pdf_y(y1 + delta, 12.0, page_height, s);
            prop_assert!(below < top);
        }

        /// Property: x conversion is linear in the input.
        #[test]
        fn x_is_linear(base in 1.0f64..500.0, s in scale()) {
            let one = to_pdf_x(base, s);
            let two = to_pdf_x(base * 2.0, s);
            prop_assert!((two - 2.0 * one).abs() < 1e-6);
        }

        /// Property: render/editor DPR scaling roundtrips.
        #[test]
        fn dpr_roundtrip(px in 0.0f64..4000.0, dpr in 1.0f64..3.0) {
            let editor = render_to_editor(px, dpr);
            let back = editor_to_render(editor, dpr);
            prop_assert!((back - px).abs() < 1e-6);
        }
    }
}
