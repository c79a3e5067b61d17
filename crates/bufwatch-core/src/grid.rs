#![forbid(unsafe_code)]

//! Grid layout: block index → cell rectangle, and the initial neutral paint.
//!
//! # Addressing
//!
//! With `stride = block_size + block_margin`:
//!
//! ```text
//! blocks_per_row = floor((surface_width - 2 * padding) / stride)
//! row            = block / blocks_per_row
//! col            = block % blocks_per_row
//! origin         = (padding + col * stride, padding + row * stride)
//! surface_height = ceil(total_blocks / blocks_per_row) * stride + padding
//! ```
//!
//! [`GridGeometry::cell_rect`] is the only implementation of this mapping;
//! the initial paint and the decay engine both go through it.
//!
//! # Invariants
//!
//! 1. `blocks_per_row >= 1` for every constructed geometry.
//! 2. Blocks `0..total_blocks` map bijectively onto `(row, col)` positions.
//! 3. Computation is pure: equal inputs give equal geometry.
//!
//! # Failure Modes
//!
//! - Surface narrower than `2 * padding + stride`: [`LayoutError::SurfaceTooNarrow`].
//! - Zero-sized cells: [`LayoutError::EmptyCell`].
//! - Height beyond `u32`: [`LayoutError::SurfaceTooTall`].
//! - Blocks past `total_blocks` (stale listings) still resolve to coordinates;
//!   far-out blocks saturate and are clipped by the surface.

use std::fmt;

use crate::color::Palette;
use crate::surface::{PixelRect, Surface};

/// Cell sizing constants, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Edge length of one square cell.
    pub block_size: u32,
    /// Gap after each cell, horizontally and vertically.
    pub block_margin: u32,
    /// Inset from the surface's left, right, and top edges.
    pub padding: u32,
}

impl GridLayout {
    #[must_use]
    pub const fn new(block_size: u32, block_margin: u32, padding: u32) -> Self {
        Self {
            block_size,
            block_margin,
            padding,
        }
    }

    /// Distance between the origins of neighbouring cells.
    #[must_use]
    pub const fn stride(&self) -> u32 {
        self.block_size.saturating_add(self.block_margin)
    }

    /// Narrowest surface that fits one cell.
    #[must_use]
    pub const fn min_surface_width(&self) -> u32 {
        self.padding
            .saturating_mul(2)
            .saturating_add(self.stride())
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(5, 1, 10)
    }
}

/// Layout failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// Not even one cell fits across the surface.
    SurfaceTooNarrow { width: u32, required: u32 },
    /// `block_size` is zero, so cells would be invisible.
    EmptyCell,
    /// The grid would be taller than any surface can be.
    SurfaceTooTall { height: u64 },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceTooNarrow { width, required } => write!(
                f,
                "surface {width}px wide cannot fit a single cell (need at least {required}px)"
            ),
            Self::EmptyCell => write!(f, "block size must be at least 1px"),
            Self::SurfaceTooTall { height } => {
                write!(f, "grid height {height}px exceeds the surface limit")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// Row/column of a block within its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPosition {
    pub row: u32,
    pub col: u32,
}

/// Layout of one relation's grid on a surface of a given width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    layout: GridLayout,
    total_blocks: u32,
    surface_width: u32,
    blocks_per_row: u32,
    total_rows: u32,
    surface_height: u32,
}

impl GridGeometry {
    /// Compute the grid for `total_blocks` cells on a surface `surface_width` wide.
    pub fn compute(
        layout: GridLayout,
        total_blocks: u32,
        surface_width: u32,
    ) -> Result<Self, LayoutError> {
        if layout.block_size == 0 {
            return Err(LayoutError::EmptyCell);
        }
        let stride = layout.stride();
        let too_narrow = LayoutError::SurfaceTooNarrow {
            width: surface_width,
            required: layout.min_surface_width(),
        };
        let usable = surface_width
            .checked_sub(layout.padding.saturating_mul(2))
            .ok_or(too_narrow)?;
        let blocks_per_row = usable / stride;
        if blocks_per_row == 0 {
            return Err(too_narrow);
        }

        let total_rows = total_blocks.div_ceil(blocks_per_row);
        let height = u64::from(total_rows) * u64::from(stride) + u64::from(layout.padding);
        let surface_height =
            u32::try_from(height).map_err(|_| LayoutError::SurfaceTooTall { height })?;

        Ok(Self {
            layout,
            total_blocks,
            surface_width,
            blocks_per_row,
            total_rows,
            surface_height,
        })
    }

    #[must_use]
    pub const fn layout(&self) -> GridLayout {
        self.layout
    }

    #[must_use]
    pub const fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    #[must_use]
    pub const fn surface_width(&self) -> u32 {
        self.surface_width
    }

    /// Always at least 1.
    #[must_use]
    pub const fn blocks_per_row(&self) -> u32 {
        self.blocks_per_row
    }

    #[must_use]
    pub const fn total_rows(&self) -> u32 {
        self.total_rows
    }

    /// Height the surface must be given before painting.
    #[must_use]
    pub const fn surface_height(&self) -> u32 {
        self.surface_height
    }

    /// Grid position of `block`. Blocks past `total_blocks` are not rejected.
    #[must_use]
    pub const fn cell_position(&self, block: u32) -> CellPosition {
        CellPosition {
            row: block / self.blocks_per_row,
            col: block % self.blocks_per_row,
        }
    }

    /// Inverse of [`cell_position`](Self::cell_position) over `0..total_blocks`.
    #[must_use]
    pub fn block_at(&self, position: CellPosition) -> Option<u32> {
        if position.col >= self.blocks_per_row {
            return None;
        }
        let block = u64::from(position.row) * u64::from(self.blocks_per_row)
            + u64::from(position.col);
        u32::try_from(block)
            .ok()
            .filter(|&block| block < self.total_blocks)
    }

    /// Pixel rectangle of `block`'s cell.
    ///
    /// Coordinates saturate at `u32::MAX` for blocks far beyond the grid.
    #[must_use]
    pub fn cell_rect(&self, block: u32) -> PixelRect {
        let CellPosition { row, col } = self.cell_position(block);
        let stride = u64::from(self.layout.stride());
        let padding = u64::from(self.layout.padding);
        let x = padding + u64::from(col) * stride;
        let y = padding + u64::from(row) * stride;
        PixelRect::new(
            saturate_u32(x),
            saturate_u32(y),
            self.layout.block_size,
            self.layout.block_size,
        )
    }
}

#[inline]
fn saturate_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Size `surface` for `total_blocks` cells and paint the neutral grid.
///
/// The whole surface is filled with the background first, so calling this
/// again on an already painted surface starts from a clean slate. Cells past
/// `total_blocks` in the last row are left as background.
pub fn initialize<S: Surface + ?Sized>(
    surface: &mut S,
    layout: GridLayout,
    palette: &Palette,
    total_blocks: u32,
) -> Result<GridGeometry, LayoutError> {
    let geometry = GridGeometry::compute(layout, total_blocks, surface.width())?;

    surface.set_height(geometry.surface_height());
    surface.fill_rect(
        PixelRect::new(0, 0, geometry.surface_width(), geometry.surface_height()),
        palette.background,
    );
    for block in 0..total_blocks {
        surface.fill_rect(geometry.cell_rect(block), palette.neutral);
    }

    tracing::trace!(
        total_blocks,
        blocks_per_row = geometry.blocks_per_row(),
        height = geometry.surface_height(),
        "grid initialized"
    );
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{PaintOp, PixelSurface};

    #[test]
    fn default_layout_matches_canvas_constants() {
        let layout = GridLayout::default();
        assert_eq!(layout.stride(), 6);
        let geometry = GridGeometry::compute(layout, 1000, 400).unwrap();
        // (400 - 20) / 6 = 63
        assert_eq!(geometry.blocks_per_row(), 63);
        assert_eq!(geometry.total_rows(), 16);
        assert_eq!(geometry.surface_height(), 16 * 6 + 10);
    }

    #[test]
    fn narrow_surface_is_a_layout_error() {
        let layout = GridLayout::new(5, 1, 10);
        assert_eq!(
            GridGeometry::compute(layout, 10, 25),
            Err(LayoutError::SurfaceTooNarrow {
                width: 25,
                required: 26
            })
        );
        // Narrower than the padding alone.
        assert!(matches!(
            GridGeometry::compute(layout, 10, 5),
            Err(LayoutError::SurfaceTooNarrow { .. })
        ));
        assert!(GridGeometry::compute(layout, 10, 26).is_ok());
    }

    #[test]
    fn zero_block_size_rejected() {
        assert_eq!(
            GridGeometry::compute(GridLayout::new(0, 1, 0), 10, 100),
            Err(LayoutError::EmptyCell)
        );
    }

    #[test]
    fn huge_grids_report_too_tall() {
        let layout = GridLayout::new(100, 100, 0);
        let err = GridGeometry::compute(layout, u32::MAX, 200).unwrap_err();
        assert!(matches!(err, LayoutError::SurfaceTooTall { .. }));
    }

    #[test]
    fn empty_relation_has_no_rows() {
        let geometry = GridGeometry::compute(GridLayout::default(), 0, 400).unwrap();
        assert_eq!(geometry.total_rows(), 0);
        assert_eq!(geometry.surface_height(), 10);
    }

    #[test]
    fn stale_blocks_saturate_instead_of_panicking() {
        let geometry = GridGeometry::compute(GridLayout::new(1, 0, 0), 4, 1).unwrap();
        let rect = geometry.cell_rect(u32::MAX);
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, u32::MAX);
    }

    #[test]
    fn initialize_paints_background_then_cells() {
        let layout = GridLayout::new(2, 1, 1);
        let palette = Palette::default();
        let mut surface = PixelSurface::new(8);
        let geometry = initialize(&mut surface, layout, &palette, 5).unwrap();

        // (8 - 2) / 3 = 2 per row, 3 rows.
        assert_eq!(geometry.blocks_per_row(), 2);
        assert_eq!(surface.height(), 3 * 3 + 1);

        let ops = surface.ops();
        assert_eq!(ops[0], PaintOp::Resize { height: 10 });
        assert!(matches!(ops[1], PaintOp::Fill { color, .. } if color == palette.background));
        assert_eq!(surface.fill_count(), 1 + 5);

        // Block 4 is row 2, col 0; block 5 would be row 2, col 1 and stays background.
        assert_eq!(surface.pixel(1, 7), Some(palette.neutral));
        assert_eq!(surface.pixel(4, 7), Some(palette.background));
    }
}
