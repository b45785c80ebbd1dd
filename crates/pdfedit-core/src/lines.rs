//! Logical line reconstruction
//!
//! Turns the unordered glyph runs of one page into editable [`TextItem`]s:
//! cluster runs sharing a baseline, order them left-to-right, re-insert the
//! word spaces that PDF content streams routinely omit, and encode bold/
//! italic stretches as lightweight markup so style survives the plain-string
//! editing surface.

use crate::coords::{self, PageView};
use crate::extract::{RunStyle, StyledRun};
use crate::store::TextItem;

/// Two runs within this many PDF units of each other vertically belong to
/// the same line. Larger values merge superscripts into body text; smaller
/// ones split lines on font-hinting jitter.
pub const LINE_TOLERANCE: f64 = 3.0;

/// A horizontal gap wider than this fraction of the font size between two
/// adjacent runs marks a missing word space.
pub const GAP_FACTOR: f64 = 0.25;

struct LineCluster {
    /// Representative baseline: the y of the first run that opened the line.
    y: f64,
    runs: Vec<StyledRun>,
}

/// Reconstruct logical lines for one page.
///
/// A page with no extractable runs yields no items; whitespace-only lines
/// are dropped.
pub fn reconstruct_lines(
    page_index: usize,
    mut runs: Vec<StyledRun>,
    view: &PageView,
) -> Vec<TextItem> {
    // Reading order: top-to-bottom, then left-to-right
    runs.sort_by(|a, b| {
        b.run
            .y()
            .partial_cmp(&a.run.y())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.run
                    .x()
                    .partial_cmp(&b.run.x())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    let mut clusters: Vec<LineCluster> = Vec::new();
    for styled in runs {
        let y = styled.run.y();
        match clusters
            .iter_mut()
            .find(|c| (y - c.y).abs() < LINE_TOLERANCE)
        {
            Some(cluster) => cluster.runs.push(styled),
            None => clusters.push(LineCluster {
                y,
                runs: vec![styled],
            }),
        }
    }

    clusters
        .into_iter()
        .filter_map(|cluster| merge_cluster(page_index, cluster, view))
        .collect()
}

fn merge_cluster(page_index: usize, mut cluster: LineCluster, view: &PageView) -> Option<TextItem> {
    cluster.runs.sort_by(|a, b| {
        a.run
            .x()
            .partial_cmp(&b.run.x())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let markup = join_runs(&cluster.runs);
    if plain_len(&cluster.runs) == 0 {
        return None;
    }

    let first = &cluster.runs[0].run;
    let last = &cluster.runs[cluster.runs.len() - 1].run;

    let pdf_x = first.x();
    let pdf_y = cluster.y;
    let pdf_width = (last.x() + last.width - pdf_x).max(0.0);
    let pdf_font_size = cluster
        .runs
        .iter()
        .map(|r| r.run.font_size())
        .fold(0.0_f64, f64::max);

    let font_size = coords::to_editor_len(pdf_font_size, view.scale);
    let item = TextItem {
        id: 0,
        original: markup.clone(),
        markup,
        x: coords::to_editor_x(pdf_x, view.scale),
        y: coords::to_editor_y(pdf_y, font_size, view.height, view.scale),
        width: coords::to_editor_len(pdf_width, view.scale),
        height: font_size * 1.2,
        font_size,
        pdf_x,
        pdf_y,
        pdf_font_size,
        pdf_width,
        page_index,
        edited: false,
        is_new: false,
    };
    Some(item)
}

fn plain_len(runs: &[StyledRun]) -> usize {
    runs.iter().map(|r| r.run.text.trim().len()).sum()
}

/// Concatenate run text left-to-right, inserting inferred spaces at wide
/// gaps and wrapping styled stretches in `<b>`/`<i>` tags.
fn join_runs(runs: &[StyledRun]) -> String {
    let mut out = String::new();
    let mut stretch = String::new();
    let mut stretch_style = RunStyle::default();
    let mut prev_end: Option<(f64, f64)> = None; // (end x, font size)

    for styled in runs {
        let run = &styled.run;
        if run.text.is_empty() {
            continue;
        }

        let needs_space = match prev_end {
            Some((end_x, font_size)) => {
                let gap = run.x() - end_x;
                gap > GAP_FACTOR * font_size.max(1.0)
            }
            None => false,
        };

        if styled.style != stretch_style {
            if needs_space {
                // The inferred space is style-neutral; emit it between tags
                flush_stretch(&mut out, &mut stretch, stretch_style);
                out.push(' ');
            } else {
                flush_stretch(&mut out, &mut stretch, stretch_style);
            }
            stretch_style = styled.style;
        } else if needs_space {
            stretch.push(' ');
        }

        stretch.push_str(&run.text);
        prev_end = Some((run.x() + run.width, run.font_size()));
    }
    flush_stretch(&mut out, &mut stretch, stretch_style);
    out
}

fn flush_stretch(out: &mut String, stretch: &mut String, style: RunStyle) {
    if stretch.is_empty() {
        return;
    }
    match (style.bold, style.italic) {
        (true, true) => {
            out.push_str("<b><i>");
            out.push_str(stretch);
            out.push_str("</i></b>");
        }
        (true, false) => {
            out.push_str("<b>");
            out.push_str(stretch);
            out.push_str("</b>");
        }
        (false, true) => {
            out.push_str("<i>");
            out.push_str(stretch);
            out.push_str("</i>");
        }
        (false, false) => out.push_str(stretch),
    }
    stretch.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{RawGlyphRun, RunStyle, StyledRun};

    fn styled(text: &str, x: f64, y: f64, width: f64, size: f64, style: RunStyle) -> StyledRun {
        StyledRun {
            run: RawGlyphRun {
                text: text.to_string(),
                transform: [size, 0.0, 0.0, size, x, y],
                width,
                font_name: String::new(),
            },
            style,
        }
    }

    fn plain(text: &str, x: f64, y: f64, width: f64, size: f64) -> StyledRun {
        styled(text, x, y, width, size, RunStyle::default())
    }

    fn view() -> PageView {
        PageView::new(612.0, 792.0, 1.0)
    }

    #[test]
    fn test_empty_page_yields_no_items() {
        let items = reconstruct_lines(0, vec![], &view());
        assert!(items.is_empty());
    }

    #[test]
    fn test_distinct_lines_stay_distinct() {
        // N runs at y coordinates separated by more than the tolerance
        let runs = vec![
            plain("first", 72.0, 700.0, 40.0, 12.0),
            plain("second", 72.0, 680.0, 40.0, 12.0),
            plain("third", 72.0, 660.0, 40.0, 12.0),
        ];
        let items = reconstruct_lines(0, runs, &view());
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].markup, "first");
        assert_eq!(items[1].markup, "second");
        assert_eq!(items[2].markup, "third");
    }

    #[test]
    fn test_jittered_runs_merge_into_one_line() {
        let runs = vec![
            plain("left", 72.0, 700.0, 30.0, 12.0),
            plain("right", 110.0, 701.5, 30.0, 12.0),
        ];
        let items = reconstruct_lines(0, runs, &view());
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_wide_gap_inserts_space() {
        // gap = 80 - 50 = 30, threshold = 0.25 * 40 = 10
        let runs = vec![
            plain("Hello", 0.0, 700.0, 50.0, 40.0),
            plain("World", 80.0, 700.0, 50.0, 40.0),
        ];
        let items = reconstruct_lines(0, runs, &view());
        assert_eq!(items[0].markup, "Hello World");
    }

    #[test]
    fn test_narrow_gap_joins_without_space() {
        // gap = 55 - 50 = 5, threshold = 10
        let runs = vec![
            plain("Hello", 0.0, 700.0, 50.0, 40.0),
            plain("World", 55.0, 700.0, 50.0, 40.0),
        ];
        let items = reconstruct_lines(0, runs, &view());
        assert_eq!(items[0].markup, "HelloWorld");
    }

    #[test]
    fn test_runs_ordered_left_to_right() {
        let runs = vec![
            plain("world", 120.0, 700.0, 40.0, 12.0),
            plain("hello", 72.0, 700.0, 40.0, 12.0),
        ];
        let items = reconstruct_lines(0, runs, &view());
        assert_eq!(items[0].markup, "hello world");
    }

    #[test]
    fn test_lines_emitted_top_to_bottom() {
        let runs = vec![
            plain("bottom", 72.0, 100.0, 40.0, 12.0),
            plain("top", 72.0, 700.0, 40.0, 12.0),
        ];
        let items = reconstruct_lines(0, runs, &view());
        assert_eq!(items[0].markup, "top");
        assert_eq!(items[1].markup, "bottom");
    }

    #[test]
    fn test_bold_stretch_wrapped_in_markup() {
        let bold = RunStyle {
            bold: true,
            italic: false,
        };
        let runs = vec![
            plain("normal ", 0.0, 700.0, 40.0, 12.0),
            styled("strong", 40.0, 700.0, 40.0, 12.0, bold),
        ];
        let items = reconstruct_lines(0, runs, &view());
        assert_eq!(items[0].markup, "normal <b>strong</b>");
    }

    #[test]
    fn test_bold_italic_markup_nests() {
        let both = RunStyle {
            bold: true,
            italic: true,
        };
        let runs = vec![styled("all", 0.0, 700.0, 20.0, 12.0, both)];
        let items = reconstruct_lines(0, runs, &view());
        assert_eq!(items[0].markup, "<b><i>all</i></b>");
    }

    #[test]
    fn test_adjacent_same_style_runs_share_tags() {
        let bold = RunStyle {
            bold: true,
            italic: false,
        };
        let runs = vec![
            styled("Bold", 0.0, 700.0, 30.0, 12.0, bold),
            styled("Pair", 40.0, 700.0, 30.0, 12.0, bold),
        ];
        let items = reconstruct_lines(0, runs, &view());
        assert_eq!(items[0].markup, "<b>Bold Pair</b>");
    }

    #[test]
    fn test_whitespace_only_lines_dropped() {
        let runs = vec![
            plain("   ", 72.0, 700.0, 10.0, 12.0),
            plain("kept", 72.0, 650.0, 30.0, 12.0),
        ];
        let items = reconstruct_lines(0, runs, &view());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].markup, "kept");
    }

    #[test]
    fn test_geometry_spans_first_to_last_run() {
        let runs = vec![
            plain("ab", 100.0, 500.0, 20.0, 10.0),
            plain("cd", 150.0, 500.0, 25.0, 10.0),
        ];
        let items = reconstruct_lines(0, runs, &view());
        let item = &items[0];
        assert_eq!(item.pdf_x, 100.0);
        assert_eq!(item.pdf_y, 500.0);
        assert_eq!(item.pdf_width, 75.0);
        assert_eq!(item.pdf_font_size, 10.0);
        assert!(!item.edited);
        assert_eq!(item.original, item.markup);
    }

    #[test]
    fn test_editor_geometry_roundtrips_through_view() {
        let v = PageView::new(1224.0, 1584.0, 2.0);
        let runs = vec![plain("hi", 100.0, 500.0, 20.0, 10.0)];
        let items = reconstruct_lines(3, runs, &v);
        let item = &items[0];
        assert_eq!(item.page_index, 3);
        assert_eq!(item.x, 200.0);
        assert_eq!(item.font_size, 20.0);
        // Inverting the editor y recovers the baseline
        let back = crate::coords::to_pdf_y(item.y, item.font_size, v.height, v.scale);
        assert!((back - 500.0).abs() < 1e-9);
    }
}
