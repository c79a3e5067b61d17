#![forbid(unsafe_code)]

//! CSS color strings for `fillStyle`.

use bufwatch_core::Rgba;

/// `#rrggbb` for opaque colors, `rgba(r,g,b,a)` otherwise.
#[must_use]
pub fn css_color(color: Rgba) -> String {
    if color.a() == 0xFF {
        format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
    } else {
        let alpha = f32::from(color.a()) / 255.0;
        format!(
            "rgba({},{},{},{:.3})",
            color.r(),
            color.g(),
            color.b(),
            alpha
        )
    }
}
