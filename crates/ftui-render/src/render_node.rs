#![forbid(unsafe_code)]

//! The tree components hand to the Runtime each frame, and the rasterizer
//! that flattens it into a [`Buffer`].
//!
//! `RenderNode` intentionally stays in `ftui-render`'s own `CellStyle`
//! vocabulary (not `ftui_style::Style`) since the render kernel does not
//! depend on `ftui-style`; widget libraries built on top of `ftui-style`
//! convert their richer `Style` down to `CellStyle` before handing a tree to
//! the rasterizer (see `Style::to_cell_style`).

use crate::buffer::Buffer;
use crate::cell::{Cell, CellStyle};

/// Axis a [`RenderNode::Stack`] lays its children out along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Children are placed left to right.
    Horizontal,
    /// Children are placed top to bottom.
    Vertical,
}

/// Sizing and style overrides for a [`RenderNode::Box`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxParams {
    /// Fixed width in columns, or `None` to size to content.
    pub width: Option<usize>,
    /// Fixed height in rows, or `None` to size to content.
    pub height: Option<usize>,
    /// Style applied to this box's children unless overridden.
    pub style: Option<CellStyle>,
}

/// A node in the tree a component's `view` returns each frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    /// Literal text, optionally styled.
    Text(String, Option<CellStyle>),
    /// A container that draws its children on top of one another at the
    /// same origin, clipped to `params`' size when given.
    Box(Vec<RenderNode>, BoxParams),
    /// Children laid out one after another along `axis`.
    Stack(Axis, Vec<RenderNode>),
    /// `inner` with a style applied to any of its `Text` descendants that
    /// don't already carry their own style.
    Styled(Box<RenderNode>, CellStyle),
    /// `inner` offset by `(x, y)` from its parent's origin. `z` breaks ties
    /// between overlapping siblings painted at the same position (higher
    /// wins); within one `Box`/`Stack` children are already painted in
    /// document order, so `z` only matters across `Overlay` boundaries.
    Positioned(Box<RenderNode>, i32, i32, i32),
    /// Raw cells at explicit `(x, y)` offsets from the origin.
    Cells(Vec<(i32, i32, Cell)>),
    /// Draws nothing and occupies no space.
    Empty,
    /// Like `Positioned`, but documents intent to float above sibling
    /// content rather than participate in the enclosing layout.
    Overlay(Box<RenderNode>, i32, i32, i32),
}

/// This frame's content, measured in columns/rows, used to lay out
/// `Stack` children.
fn measure(node: &RenderNode) -> (usize, usize) {
    match node {
        RenderNode::Text(s, _) => (crate::display_width(s), 1),
        RenderNode::Box(children, params) => {
            let (cw, ch) = children
                .iter()
                .map(measure)
                .fold((0, 0), |(mw, mh), (w, h)| (mw.max(w), mh.max(h)));
            (params.width.unwrap_or(cw), params.height.unwrap_or(ch))
        }
        RenderNode::Stack(Axis::Horizontal, children) => children.iter().map(measure).fold((0, 0), |(tw, th), (w, h)| (tw + w, th.max(h))),
        RenderNode::Stack(Axis::Vertical, children) => children.iter().map(measure).fold((0, 0), |(tw, th), (w, h)| (tw.max(w), th + h)),
        RenderNode::Styled(inner, _) => measure(inner),
        RenderNode::Positioned(inner, _, _, _) | RenderNode::Overlay(inner, _, _, _) => measure(inner),
        RenderNode::Cells(cells) => cells.iter().fold((0, 0), |(mw, mh), (x, y, _)| {
            (mw.max((x + 1).max(0) as usize), mh.max((y + 1).max(0) as usize))
        }),
        RenderNode::Empty => (0, 0),
    }
}

/// Rasterize `node` into `buf`, starting at 1-indexed `(row, col)`,
/// inheriting `style` for any `Text` node that doesn't carry its own.
pub fn rasterize(node: &RenderNode, buf: &mut Buffer, row: usize, col: usize, style: CellStyle) {
    match node {
        RenderNode::Empty => {}
        RenderNode::Text(s, own_style) => {
            let style = own_style.unwrap_or(style);
            buf.write_string(row, col, s, style.fg, style.bg, style.flags);
        }
        RenderNode::Box(children, params) => {
            let style = params.style.unwrap_or(style);
            for child in children {
                rasterize(child, buf, row, col, style);
            }
        }
        RenderNode::Stack(axis, children) => {
            let mut r = row;
            let mut c = col;
            for child in children {
                rasterize(child, buf, r, c, style);
                let (w, h) = measure(child);
                match axis {
                    Axis::Horizontal => c += w,
                    Axis::Vertical => r += h,
                }
            }
        }
        RenderNode::Styled(inner, own_style) => rasterize(inner, buf, row, col, *own_style),
        RenderNode::Positioned(inner, x, y, _z) | RenderNode::Overlay(inner, x, y, _z) => {
            if let Some((r, c)) = offset(row, col, *x, *y) {
                rasterize(inner, buf, r, c, style);
            }
        }
        RenderNode::Cells(cells) => {
            for (x, y, cell) in cells {
                if let Some((r, c)) = offset(row, col, *x, *y) {
                    let _ = buf.set(r, c, *cell);
                }
            }
        }
    }
}

fn offset(row: usize, col: usize, dx: i32, dy: i32) -> Option<(usize, usize)> {
    let r = row as i64 + dy as i64;
    let c = col as i64 + dx as i64;
    if r < 1 || c < 1 {
        None
    } else {
        Some((r as usize, c as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellColor;

    fn default_style() -> CellStyle {
        CellStyle::default()
    }

    #[test]
    fn text_node_writes_its_glyphs() {
        let mut buf = Buffer::new(5, 20).unwrap();
        rasterize(&RenderNode::Text("Hi".into(), None), &mut buf, 1, 1, default_style());
        assert_eq!(buf.get(1, 1).content().as_char(), Some('H'));
        assert_eq!(buf.get(1, 2).content().as_char(), Some('i'));
    }

    #[test]
    fn styled_text_overrides_own_style() {
        let mut buf = Buffer::new(5, 20).unwrap();
        let style = CellStyle {
            fg: CellColor::rgb(1, 2, 3),
            ..default_style()
        };
        rasterize(&RenderNode::Text("x".into(), Some(style)), &mut buf, 1, 1, default_style());
        assert_eq!(buf.get(1, 1).fg(), CellColor::rgb(1, 2, 3));
    }

    #[test]
    fn horizontal_stack_advances_by_measured_width() {
        let mut buf = Buffer::new(5, 20).unwrap();
        let tree = RenderNode::Stack(
            Axis::Horizontal,
            vec![RenderNode::Text("AB".into(), None), RenderNode::Text("CD".into(), None)],
        );
        rasterize(&tree, &mut buf, 1, 1, default_style());
        assert_eq!(buf.get(1, 1).content().as_char(), Some('A'));
        assert_eq!(buf.get(1, 3).content().as_char(), Some('C'));
    }

    #[test]
    fn vertical_stack_advances_by_measured_height() {
        let mut buf = Buffer::new(5, 20).unwrap();
        let tree = RenderNode::Stack(
            Axis::Vertical,
            vec![RenderNode::Text("A".into(), None), RenderNode::Text("B".into(), None)],
        );
        rasterize(&tree, &mut buf, 1, 1, default_style());
        assert_eq!(buf.get(1, 1).content().as_char(), Some('A'));
        assert_eq!(buf.get(2, 1).content().as_char(), Some('B'));
    }

    #[test]
    fn positioned_offsets_from_origin() {
        let mut buf = Buffer::new(5, 20).unwrap();
        let tree = RenderNode::Positioned(Box::new(RenderNode::Text("x".into(), None)), 2, 1, 0);
        rasterize(&tree, &mut buf, 1, 1, default_style());
        assert_eq!(buf.get(2, 3).content().as_char(), Some('x'));
    }

    #[test]
    fn positioned_offset_below_origin_is_dropped() {
        let mut buf = Buffer::new(5, 20).unwrap();
        let tree = RenderNode::Positioned(Box::new(RenderNode::Text("x".into(), None)), -5, -5, 0);
        rasterize(&tree, &mut buf, 1, 1, default_style());
        // nothing should have been written anywhere visible; no panic occurred.
        assert_eq!(buf.get(1, 1).content().as_char(), Some(' '));
    }

    #[test]
    fn cells_node_places_raw_cells_at_offsets() {
        let mut buf = Buffer::new(5, 20).unwrap();
        let cell = Cell::new("Z", CellColor::DEFAULT, CellColor::DEFAULT, crate::cell::StyleFlags::empty());
        let tree = RenderNode::Cells(vec![(2, 0, cell)]);
        rasterize(&tree, &mut buf, 1, 1, default_style());
        assert_eq!(buf.get(1, 3).content().as_char(), Some('Z'));
    }

    #[test]
    fn empty_node_writes_nothing() {
        let mut buf = Buffer::new(3, 3).unwrap();
        let before = buf.cells().to_vec();
        rasterize(&RenderNode::Empty, &mut buf, 1, 1, default_style());
        assert_eq!(buf.cells(), before.as_slice());
    }
}
