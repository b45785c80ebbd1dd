//! Standard font resolution, metrics, and embedding
//!
//! Edited text is drawn with the standard Type1 programs only: the
//! Helvetica, Times, and Courier families, each in regular/bold/italic/
//! bold-italic. Arbitrary family names from the formatting toolbar (or CSS
//! generic names from the rasterizer) are mapped onto one of those families;
//! unknown names fall back to Helvetica.
//!
//! Width metrics are the standard PostScript values in 1/1000 em, covering
//! the printable ASCII range; characters above that use a per-family
//! default. Italic variants share their upright widths.

use std::collections::HashMap;

use lopdf::{dictionary, Document, ObjectId};

/// The three embeddable font families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Sans,
    Serif,
    Mono,
}

/// Map a font family name (CSS generic, toolbar label, or PDF base font) to
/// one of the standard families. Unknown names resolve to sans.
pub fn resolve_family(name: &str) -> FontFamily {
    let lower = name.to_lowercase();

    match lower.as_str() {
        "serif" => return FontFamily::Serif,
        "sans-serif" | "cursive" | "fantasy" => return FontFamily::Sans,
        "monospace" => return FontFamily::Mono,
        _ => {}
    }

    if lower.contains("times") || lower.contains("georgia") || lower.contains("garamond") {
        return FontFamily::Serif;
    }
    if lower.contains("courier")
        || lower.contains("mono")
        || lower.contains("consolas")
        || lower.contains("monaco")
    {
        return FontFamily::Mono;
    }
    // Helvetica/Arial/Verdana and everything unrecognised
    FontFamily::Sans
}

/// The standard Type1 program for a family and style combination.
pub fn standard_font_name(family: FontFamily, bold: bool, italic: bool) -> &'static str {
    match family {
        FontFamily::Sans => match (bold, italic) {
            (true, true) => "Helvetica-BoldOblique",
            (true, false) => "Helvetica-Bold",
            (false, true) => "Helvetica-Oblique",
            (false, false) => "Helvetica",
        },
        FontFamily::Serif => match (bold, italic) {
            (true, true) => "Times-BoldItalic",
            (true, false) => "Times-Bold",
            (false, true) => "Times-Italic",
            (false, false) => "Times-Roman",
        },
        FontFamily::Mono => match (bold, italic) {
            (true, true) => "Courier-BoldOblique",
            (true, false) => "Courier-Bold",
            (false, true) => "Courier-Oblique",
            (false, false) => "Courier",
        },
    }
}

/// Resolve a segment's requested family name and flags to a font program.
pub fn resolve_font(family_name: Option<&str>, bold: bool, italic: bool) -> &'static str {
    let family = family_name.map(resolve_family).unwrap_or(FontFamily::Sans);
    standard_font_name(family, bold, italic)
}

/// Width of `text` in points at `size`, in the given standard font.
pub fn text_width(text: &str, font_name: &str, size: f64) -> f64 {
    let units: f64 = text.chars().map(|c| char_width_units(font_name, c)).sum();
    units * size / 1000.0
}

/// Per-character advance in 1/1000 em.
fn char_width_units(font_name: &str, ch: char) -> f64 {
    let code = ch as u32;
    if font_name.starts_with("Courier") {
        return 600.0;
    }
    let (table, fallback): (&[u16; 95], f64) = match font_name {
        "Helvetica" | "Helvetica-Oblique" => (&HELVETICA_WIDTHS, 556.0),
        "Helvetica-Bold" | "Helvetica-BoldOblique" => (&HELVETICA_BOLD_WIDTHS, 556.0),
        "Times-Roman" | "Times-Italic" => (&TIMES_ROMAN_WIDTHS, 500.0),
        "Times-Bold" | "Times-BoldItalic" => (&TIMES_BOLD_WIDTHS, 500.0),
        _ => (&HELVETICA_WIDTHS, 556.0),
    };
    if (0x20..=0x7E).contains(&code) {
        table[(code - 0x20) as usize] as f64
    } else {
        fallback
    }
}

/// Strip characters the standard font programs cannot encode. WinAnsi covers
/// ASCII and the Latin-1 block; everything else (including the 0x80..0x9F
/// control range) is dropped. Lossy, not wrong: the stripped characters are
/// simply absent from the output.
pub fn sanitize_latin1(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            let code = c as u32;
            code < 0x80 || (0xA0..=0xFF).contains(&code)
        })
        .collect()
}

/// Embeds standard font dictionaries into a document, one object per font
/// program, cached across calls.
#[derive(Debug, Default)]
pub struct FontEmbedder {
    cache: HashMap<&'static str, ObjectId>,
}

impl FontEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object id of the Type1 font dictionary for `font_name`, embedding it
    /// on first use.
    pub fn font_id(&mut self, doc: &mut Document, font_name: &'static str) -> ObjectId {
        if let Some(&id) = self.cache.get(font_name) {
            return id;
        }
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font_name,
            "Encoding" => "WinAnsiEncoding",
        });
        self.cache.insert(font_name, id);
        id
    }

    /// Resource name under which `font_name` is registered on pages.
    pub fn resource_name(font_name: &str) -> String {
        format!("PEF-{}", font_name)
    }

    pub fn embedded(&self) -> impl Iterator<Item = (&'static str, ObjectId)> + '_ {
        self.cache.iter().map(|(&name, &id)| (name, id))
    }
}

// Standard PostScript advance widths for the printable ASCII range
// (0x20..=0x7E), in 1/1000 em.

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333,
    584, 584, 584, 611, 975, 722, 722, 722, 722, 667, 611, 778, 722, 278,
    556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
    333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278,
    564, 564, 564, 444, 921, 722, 667, 667, 722, 611, 556, 722, 722, 333,
    389, 722, 611, 889, 722, 722, 556, 722, 667, 556, 611, 722, 722, 944,
    722, 722, 611, 333, 278, 333, 469, 500, 333, 444, 500, 444, 500, 444,
    333, 500, 500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333, 389,
    278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333,
    570, 570, 570, 500, 930, 722, 667, 722, 722, 667, 611, 778, 778, 389,
    500, 778, 667, 944, 722, 778, 611, 778, 722, 556, 667, 722, 722, 1000,
    722, 722, 667, 333, 278, 333, 581, 500, 333, 500, 556, 444, 556, 444,
    333, 500, 556, 278, 333, 556, 278, 833, 556, 500, 556, 556, 444, 389,
    333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Object;

    #[test]
    fn test_generic_family_names() {
        assert_eq!(resolve_family("serif"), FontFamily::Serif);
        assert_eq!(resolve_family("sans-serif"), FontFamily::Sans);
        assert_eq!(resolve_family("monospace"), FontFamily::Mono);
        assert_eq!(resolve_family("cursive"), FontFamily::Sans);
    }

    #[test]
    fn test_specific_font_names() {
        assert_eq!(resolve_family("Times New Roman"), FontFamily::Serif);
        assert_eq!(resolve_family("Georgia"), FontFamily::Serif);
        assert_eq!(resolve_family("Arial"), FontFamily::Sans);
        assert_eq!(resolve_family("Verdana"), FontFamily::Sans);
        assert_eq!(resolve_family("Courier New"), FontFamily::Mono);
        assert_eq!(resolve_family("Consolas"), FontFamily::Mono);
    }

    #[test]
    fn test_unknown_family_falls_back_to_sans() {
        assert_eq!(resolve_family("g_d0_f1"), FontFamily::Sans);
        assert_eq!(resolve_family(""), FontFamily::Sans);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(resolve_family("TIMES"), FontFamily::Serif);
        assert_eq!(resolve_family("ARIAL"), FontFamily::Sans);
    }

    #[test]
    fn test_style_variants() {
        assert_eq!(standard_font_name(FontFamily::Sans, false, false), "Helvetica");
        assert_eq!(standard_font_name(FontFamily::Sans, true, false), "Helvetica-Bold");
        assert_eq!(
            standard_font_name(FontFamily::Sans, true, true),
            "Helvetica-BoldOblique"
        );
        assert_eq!(standard_font_name(FontFamily::Serif, false, true), "Times-Italic");
        assert_eq!(
            standard_font_name(FontFamily::Serif, true, true),
            "Times-BoldItalic"
        );
        assert_eq!(standard_font_name(FontFamily::Mono, true, false), "Courier-Bold");
    }

    #[test]
    fn test_resolve_font_default() {
        assert_eq!(resolve_font(None, false, false), "Helvetica");
        assert_eq!(resolve_font(Some("serif"), true, false), "Times-Bold");
    }

    #[test]
    fn test_courier_is_monospace() {
        let narrow = text_width("iii", "Courier", 10.0);
        let wide = text_width("WWW", "Courier", 10.0);
        assert!((narrow - wide).abs() < 1e-9);
        assert!((narrow - 3.0 * 600.0 * 10.0 / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_proportional_widths() {
        // 'i' is narrower than 'W' in proportional faces
        assert!(text_width("i", "Helvetica", 12.0) < text_width("W", "Helvetica", 12.0));
        assert!(text_width("i", "Times-Roman", 12.0) < text_width("W", "Times-Roman", 12.0));
    }

    #[test]
    fn test_known_width_values() {
        // space is 278/1000 em in Helvetica, 250/1000 in Times
        assert!((text_width(" ", "Helvetica", 1000.0) - 278.0).abs() < 1e-9);
        assert!((text_width(" ", "Times-Roman", 1000.0) - 250.0).abs() < 1e-9);
        // Oblique shares upright widths
        assert_eq!(
            text_width("abc", "Helvetica", 12.0),
            text_width("abc", "Helvetica-Oblique", 12.0)
        );
    }

    #[test]
    fn test_width_scales_linearly() {
        let at_10 = text_width("Hello", "Helvetica", 10.0);
        let at_20 = text_width("Hello", "Helvetica", 20.0);
        assert!((at_20 - 2.0 * at_10).abs() < 1e-9);
    }

    #[test]
    fn test_sanitize_keeps_latin1() {
        assert_eq!(sanitize_latin1("Hello"), "Hello");
        assert_eq!(sanitize_latin1("café"), "café");
        assert_eq!(sanitize_latin1("naïve £9"), "naïve £9");
    }

    #[test]
    fn test_sanitize_strips_unsupported() {
        assert_eq!(sanitize_latin1("日本語ab"), "ab");
        assert_eq!(sanitize_latin1("a→b"), "ab");
        assert_eq!(sanitize_latin1("emoji 🙂 here"), "emoji  here");
    }

    #[test]
    fn test_embedder_caches_fonts() {
        let mut doc = Document::with_version("1.7");
        let mut embedder = FontEmbedder::new();
        let a = embedder.font_id(&mut doc, "Helvetica");
        let b = embedder.font_id(&mut doc, "Helvetica");
        let c = embedder.font_id(&mut doc, "Times-Bold");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(embedder.embedded().count(), 2);
    }

    #[test]
    fn test_embedded_dictionary_shape() {
        let mut doc = Document::with_version("1.7");
        let mut embedder = FontEmbedder::new();
        let id = embedder.font_id(&mut doc, "Times-Italic");
        let dict = doc.get_object(id).unwrap().as_dict().unwrap();
        assert!(matches!(dict.get(b"BaseFont"), Ok(Object::Name(n)) if n == b"Times-Italic"));
        assert!(matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Type1"));
    }
}
