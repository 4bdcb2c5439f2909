#![forbid(unsafe_code)]

//! Differential diffing between two [`Buffer`]s.
//!
//! [`diff`] walks `current` against `previous` row by row, groups changed
//! columns into spans, merges spans separated by a short gap of unchanged
//! cells, and emits a minimal [`Operation`] stream a [`crate::presenter`] can
//! turn into cursor moves, SGR sequences, and literal text.

use crate::buffer::Buffer;
use crate::cell::{Cell, CellStyle};
use crate::grapheme_pool::GraphemePool;

/// Spans on the same row separated by at most this many unchanged cells are
/// merged into one, since re-emitting the gap is cheaper than a cursor move.
pub const MERGE_GAP_THRESHOLD: usize = 3;

/// One unit of terminal output a [`crate::presenter::Presenter`] applies in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Move the cursor to an absolute, 1-indexed `(row, col)`.
    Move(usize, usize),
    /// Change the active style; dropped if it equals the last emitted style.
    SetStyle(CellStyle),
    /// Literal text to write at the current cursor position.
    Text(String),
    /// Reset all graphic attributes (`ESC[0m`) and forget the active style.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start_col: usize,
    /// Inclusive.
    end_col: usize,
}

/// Diff two equal-dimension buffers into an ordered [`Operation`] list.
///
/// # Panics
///
/// Panics if `current` and `previous` have different dimensions; the diff
/// is only meaningful between two snapshots of the same terminal grid.
#[must_use]
pub fn diff(current: &Buffer, previous: &Buffer) -> Vec<Operation> {
    assert_eq!(current.rows(), previous.rows(), "diff requires equal row counts");
    assert_eq!(current.cols(), previous.cols(), "diff requires equal column counts");

    let mut ops = Vec::new();
    let mut last_style: Option<CellStyle> = None;
    let pool = current.grapheme_pool();

    for row in 1..=current.rows() {
        let cur_row = current.row_cells(row);
        let prev_row = previous.row_cells(row);
        let spans = extract_spans(cur_row, prev_row);
        let spans = merge_gaps(spans);
        let spans = widen_wide_pairs(spans, cur_row);

        for span in spans {
            emit_span(&mut ops, &mut last_style, row, span, cur_row, pool);
        }
    }

    ops
}

/// Step 2: walk columns left to right, tracking an in-progress span. Equal
/// cells always close a span (tie-break rule from the diff algorithm).
fn extract_spans(cur_row: &[Cell], prev_row: &[Cell]) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut open: Option<Span> = None;

    for (i, (c, p)) in cur_row.iter().zip(prev_row.iter()).enumerate() {
        let col = i + 1;
        if c.bits_eq(p) {
            if let Some(span) = open.take() {
                spans.push(span);
            }
        } else {
            match &mut open {
                Some(span) => span.end_col = col,
                None => {
                    open = Some(Span {
                        start_col: col,
                        end_col: col,
                    })
                }
            }
        }
    }
    if let Some(span) = open {
        spans.push(span);
    }
    spans
}

/// Step 3: merge spans on the same row separated by `≤ MERGE_GAP_THRESHOLD`
/// unchanged cells; the merged span re-emits the unchanged cells in between.
fn merge_gaps(spans: Vec<Span>) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(prev) if span.start_col.saturating_sub(prev.end_col).saturating_sub(1) <= MERGE_GAP_THRESHOLD => {
                prev.end_col = span.end_col;
            }
            _ => merged.push(span),
        }
    }
    merged
}

/// Wide-pair span boundary policy: a span never starts or ends mid-pair.
/// Widen the start left over a placeholder (the primary changed with it),
/// and widen the end right over a primary that owns a following
/// placeholder (the placeholder must travel with its primary).
fn widen_wide_pairs(spans: Vec<Span>, cur_row: &[Cell]) -> Vec<Span> {
    let cols = cur_row.len();
    let mut out: Vec<Span> = Vec::with_capacity(spans.len());
    for mut span in spans {
        loop {
            let mut widened = false;
            if span.start_col > 1 && cur_row[span.start_col - 1].is_wide_placeholder() {
                span.start_col -= 1;
                widened = true;
            }
            if span.end_col < cols && cur_row[span.end_col - 1].width() == 2 {
                span.end_col += 1;
                widened = true;
            }
            if !widened {
                break;
            }
        }
        match out.last_mut() {
            Some(prev) if span.start_col <= prev.end_col + 1 => {
                prev.end_col = prev.end_col.max(span.end_col);
            }
            _ => out.push(span),
        }
    }
    out
}

/// Steps 4-6: group a span's cells into style runs and emit
/// `Move, (SetStyle, Text)...`, dropping a `SetStyle` identical to the one
/// already active and merging adjacent `Text` operations.
fn emit_span(
    ops: &mut Vec<Operation>,
    last_style: &mut Option<CellStyle>,
    row: usize,
    span: Span,
    cur_row: &[Cell],
    pool: &GraphemePool,
) {
    ops.push(Operation::Move(row, span.start_col));

    let mut run_style: Option<CellStyle> = None;
    let mut run_text = String::new();

    for col in span.start_col..=span.end_col {
        let cell = cur_row[col - 1];
        if cell.is_wide_placeholder() {
            continue;
        }
        let style = CellStyle::of(cell);
        if run_style != Some(style) {
            flush_run(ops, last_style, &mut run_style, &mut run_text);
            run_style = Some(style);
        }
        run_text.push_str(&cell.glyph(pool));
    }
    flush_run(ops, last_style, &mut run_style, &mut run_text);
}

fn flush_run(
    ops: &mut Vec<Operation>,
    last_style: &mut Option<CellStyle>,
    run_style: &mut Option<CellStyle>,
    run_text: &mut String,
) {
    if run_text.is_empty() {
        *run_style = None;
        return;
    }
    if let Some(style) = *run_style {
        if *last_style != Some(style) {
            ops.push(Operation::SetStyle(style));
            *last_style = Some(style);
        }
    }
    ops.push(Operation::Text(std::mem::take(run_text)));
    *run_style = None;
}
