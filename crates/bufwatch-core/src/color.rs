#![forbid(unsafe_code)]

//! Packed colors and the grid palette.

use crate::trace::Access;

/// A packed RGBA color (R in the high byte, A in the low byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba(pub u32);

impl Rgba {
    /// Fully transparent (alpha = 0). This is what a freshly sized surface holds.
    pub const TRANSPARENT: Self = Self(0);

    /// Create an opaque RGB color (alpha = 255).
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Create an RGBA color with explicit alpha.
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32))
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// Parse a CSS-style hex color: `#rgb`, `#rrggbb`, or `#rrggbbaa`.
    ///
    /// The leading `#` is optional. Returns `None` for anything else.
    #[must_use]
    pub fn parse_hex(text: &str) -> Option<Self> {
        let digits = text.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            3 => {
                let value = u16::from_str_radix(digits, 16).ok()?;
                // Expand each nibble: 0xabc -> aa bb cc.
                let expand = |nibble: u16| -> u8 {
                    let n = (nibble & 0xF) as u8;
                    (n << 4) | n
                };
                Some(Self::rgb(expand(value >> 8), expand(value >> 4), expand(value)))
            }
            6 => {
                let value = u32::from_str_radix(digits, 16).ok()?;
                Some(Self((value << 8) | 0xFF))
            }
            8 => u32::from_str_radix(digits, 16).ok().map(Self),
            _ => None,
        }
    }
}

/// Colors used to paint a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Fill behind the cells (covers padding and unused trailing cells).
    pub background: Rgba,
    /// Resting color of every cell.
    pub neutral: Rgba,
    /// Highlight for events that carry no hit/miss flag.
    pub highlight: Rgba,
    /// Highlight for buffer-cache hits.
    pub hit: Rgba,
    /// Highlight for buffer-cache misses (block read from storage).
    pub miss: Rgba,
}

impl Palette {
    /// The color a cell takes while highlighted by an access of this kind.
    #[must_use]
    pub const fn access_color(&self, access: Access) -> Rgba {
        match access {
            Access::Hit => self.hit,
            Access::Miss => self.miss,
            Access::Unclassified => self.highlight,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgba::rgb(0xF8, 0xF8, 0xF8),
            neutral: Rgba::rgb(0xEE, 0xEE, 0xEE),
            highlight: Rgba::rgb(0x87, 0xCE, 0xEB),
            hit: Rgba::rgb(0x5C, 0xB8, 0x5C),
            miss: Rgba::rgb(0xE5, 0x6B, 0x4B),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_unpack() {
        let c = Rgba::rgba(0x12, 0x34, 0x56, 0x78);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (0x12, 0x34, 0x56, 0x78));
        assert_eq!(Rgba::rgb(1, 2, 3).a(), 255);
    }

    #[test]
    fn parse_hex_forms() {
        assert_eq!(Rgba::parse_hex("#87CEEB"), Some(Rgba::rgb(0x87, 0xCE, 0xEB)));
        assert_eq!(Rgba::parse_hex("eee"), Some(Rgba::rgb(0xEE, 0xEE, 0xEE)));
        assert_eq!(
            Rgba::parse_hex("#11223344"),
            Some(Rgba::rgba(0x11, 0x22, 0x33, 0x44))
        );
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        assert_eq!(Rgba::parse_hex(""), None);
        assert_eq!(Rgba::parse_hex("#12345"), None);
        assert_eq!(Rgba::parse_hex("#zzzzzz"), None);
        assert_eq!(Rgba::parse_hex("#+12345"), None);
    }

    #[test]
    fn palette_maps_access() {
        let palette = Palette::default();
        assert_eq!(palette.access_color(Access::Hit), palette.hit);
        assert_eq!(palette.access_color(Access::Miss), palette.miss);
        assert_eq!(palette.access_color(Access::Unclassified), palette.highlight);
        assert_ne!(palette.neutral, palette.highlight);
    }
}
