#![forbid(unsafe_code)]

//! Error types for the render kernel.

/// Errors returned by fallible `ftui-render` entry points.
///
/// Every failure mode here is a typed `Result`, never a panic: dimension
/// checks run before any allocation, and out-of-bounds cell writes are
/// reported to the caller rather than silently clipped (batch writers like
/// `Buffer::set_many` and `Buffer::clear_region` instead drop out-of-bounds
/// entries silently, since they operate over caller-supplied regions that
/// may legitimately extend past the grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// `rows`/`cols` exceeded `MAX_ROWS`/`MAX_COLS`.
    #[error("dimensions {rows}x{cols} exceed the maximum of {max_rows}x{max_cols}")]
    DimensionsTooLarge {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        cols: usize,
        /// `Buffer::MAX_ROWS`.
        max_rows: usize,
        /// `Buffer::MAX_COLS`.
        max_cols: usize,
    },
    /// A single-cell `set` targeted a coordinate outside the grid.
    #[error("cell ({row}, {col}) is out of bounds for a {rows}x{cols} buffer")]
    OutOfBounds {
        /// Row that was targeted.
        row: usize,
        /// Column that was targeted.
        col: usize,
        /// Buffer row count.
        rows: usize,
        /// Buffer column count.
        cols: usize,
    },
}
