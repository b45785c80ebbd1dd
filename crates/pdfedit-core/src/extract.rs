//! Glyph-run extraction
//!
//! Enriches the flat glyph-run list reported by the rasterization
//! collaborator (PDF.js `getTextContent`) with inferred bold/italic flags.
//! Classification is heuristic string matching on the font resource name;
//! fonts with non-descriptive internal names (e.g. "g_d0_f1") come back as
//! regular. The heuristic sits behind [`StyleClassifier`] so it can be
//! replaced with real font-descriptor introspection without touching callers.

use serde::{Deserialize, Serialize};

/// One glyph run as reported by the text-layout collaborator.
///
/// `transform` is the PDF text matrix `[a, b, c, d, e, f]`: `e`/`f` give the
/// anchor position in PDF user-space and `sqrt(a² + b²)` the font size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawGlyphRun {
    #[serde(alias = "str")]
    pub text: String,
    pub transform: [f64; 6],
    pub width: f64,
    #[serde(alias = "fontName", default)]
    pub font_name: String,
}

impl RawGlyphRun {
    /// Anchor x in PDF user-space.
    pub fn x(&self) -> f64 {
        self.transform[4]
    }

    /// Baseline y in PDF user-space.
    pub fn y(&self) -> f64 {
        self.transform[5]
    }

    /// Effective font size in PDF points.
    pub fn font_size(&self) -> f64 {
        let a = self.transform[0];
        let b = self.transform[1];
        (a * a + b * b).sqrt()
    }
}

/// Inferred style flags for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
}

/// Classifies a font resource name into style flags.
pub trait StyleClassifier {
    fn classify(&self, font_name: &str) -> RunStyle;
}

/// Name-substring heuristic: `bold`/`black`/`heavy` mark bold,
/// `italic`/`oblique` mark italic, matched case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameHeuristics;

impl StyleClassifier for NameHeuristics {
    fn classify(&self, font_name: &str) -> RunStyle {
        let lower = font_name.to_lowercase();
        RunStyle {
            bold: lower.contains("bold") || lower.contains("black") || lower.contains("heavy"),
            italic: lower.contains("italic") || lower.contains("oblique"),
        }
    }
}

/// A glyph run with its inferred style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub run: RawGlyphRun,
    pub style: RunStyle,
}

/// Enrich raw runs with style flags. Pure mapping, preserves order.
pub fn enrich_runs<C: StyleClassifier>(runs: Vec<RawGlyphRun>, classifier: &C) -> Vec<StyledRun> {
    runs.into_iter()
        .map(|run| {
            let style = classifier.classify(&run.font_name);
            StyledRun { run, style }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, font_name: &str) -> RawGlyphRun {
        RawGlyphRun {
            text: text.to_string(),
            transform: [12.0, 0.0, 0.0, 12.0, 72.0, 700.0],
            width: 50.0,
            font_name: font_name.to_string(),
        }
    }

    #[test]
    fn test_transform_accessors() {
        let r = run("Hi", "Helvetica");
        assert_eq!(r.x(), 72.0);
        assert_eq!(r.y(), 700.0);
        assert!((r.font_size() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_font_size_with_rotation_components() {
        // A rotated text matrix still reports the right size
        let r = RawGlyphRun {
            text: "x".to_string(),
            transform: [3.0, 4.0, -4.0, 3.0, 0.0, 0.0],
            width: 5.0,
            font_name: String::new(),
        };
        assert!((r.font_size() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_bold_detection() {
        let c = NameHeuristics;
        assert!(c.classify("Helvetica-Bold").bold);
        assert!(c.classify("ARIAL-BLACK").bold);
        assert!(c.classify("SomeHeavyFace").bold);
        assert!(!c.classify("Helvetica").bold);
    }

    #[test]
    fn test_italic_detection() {
        let c = NameHeuristics;
        assert!(c.classify("Times-Italic").italic);
        assert!(c.classify("Helvetica-Oblique").italic);
        assert!(!c.classify("Times-Roman").italic);
    }

    #[test]
    fn test_bold_italic_combined() {
        let c = NameHeuristics;
        let s = c.classify("BCDEEE+Arial-BoldItalicMT");
        assert!(s.bold);
        assert!(s.italic);
    }

    #[test]
    fn test_opaque_names_are_regular() {
        // PDF.js internal resource names carry no style information
        let c = NameHeuristics;
        assert_eq!(c.classify("g_d0_f1"), RunStyle::default());
        assert_eq!(c.classify(""), RunStyle::default());
    }

    #[test]
    fn test_enrich_preserves_order() {
        let runs = vec![run("a", "Helvetica"), run("b", "Helvetica-Bold")];
        let enriched = enrich_runs(runs, &NameHeuristics);
        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].run.text, "a");
        assert!(!enriched[0].style.bold);
        assert!(enriched[1].style.bold);
    }

    #[test]
    fn test_deserializes_pdfjs_shape() {
        let json = r#"{"str":"Hello","transform":[12,0,0,12,100,650],"width":33.4,"fontName":"g_d0_f2"}"#;
        let r: RawGlyphRun = serde_json::from_str(json).unwrap();
        assert_eq!(r.text, "Hello");
        assert_eq!(r.font_name, "g_d0_f2");
        assert_eq!(r.x(), 100.0);
    }
}
