#![forbid(unsafe_code)]

//! Drawing surface contract.
//!
//! The engine needs very little from its host: a surface of known pixel
//! width, whose height the engine sets, that can fill rectangles with a solid
//! color. [`PixelSurface`] is an in-memory implementation used for headless
//! runs, tests, and benchmarks.

use crate::color::Rgba;

/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge (saturating).
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge (saturating).
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }
}

/// Minimal 2D drawing capability a host provides per mounted relation.
pub trait Surface {
    /// Width in pixels. Fixed by the host.
    fn width(&self) -> u32;

    /// Current height in pixels.
    fn height(&self) -> u32;

    /// Resize vertically. Like an HTML canvas, resizing discards the contents.
    fn set_height(&mut self, height: u32);

    /// Fill `rect` with `color`. Regions outside the surface are clipped.
    fn fill_rect(&mut self, rect: PixelRect, color: Rgba);
}

/// One recorded drawing call on a [`PixelSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOp {
    Resize { height: u32 },
    Fill { rect: PixelRect, color: Rgba },
}

/// In-memory RGBA surface that also records every drawing call.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
    ops: Vec<PaintOp>,
    recording: bool,
}

impl PixelSurface {
    /// Create a zero-height surface of the given width, recording enabled.
    #[must_use]
    pub fn new(width: u32) -> Self {
        Self {
            width,
            height: 0,
            pixels: Vec::new(),
            ops: Vec::new(),
            recording: true,
        }
    }

    /// Enable or disable the paint-call log (benchmarks turn it off).
    #[must_use]
    pub fn with_recording(mut self, recording: bool) -> Self {
        self.recording = recording;
        self
    }

    /// Pixel at `(x, y)`, or `None` outside the surface.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.offset(x, y)).copied()
    }

    /// All recorded calls since creation or the last [`take_ops`](Self::take_ops).
    #[must_use]
    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    /// Drain the recorded calls.
    pub fn take_ops(&mut self) -> Vec<PaintOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of recorded fill calls.
    #[must_use]
    pub fn fill_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PaintOp::Fill { .. }))
            .count()
    }

    /// Raw pixel rows, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_height(&mut self, height: u32) {
        self.height = height;
        self.pixels.clear();
        self.pixels
            .resize((self.width as usize) * (height as usize), Rgba::TRANSPARENT);
        if self.recording {
            self.ops.push(PaintOp::Resize { height });
        }
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        if self.recording {
            self.ops.push(PaintOp::Fill { rect, color });
        }
        let x_end = rect.right().min(self.width);
        let y_end = rect.bottom().min(self.height);
        if rect.x >= x_end || rect.y >= y_end {
            return;
        }
        for y in rect.y..y_end {
            let start = self.offset(rect.x, y);
            let end = self.offset(x_end, y);
            self.pixels[start..end].fill(color);
        }
    }
}
