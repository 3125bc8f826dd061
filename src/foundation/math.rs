use crate::foundation::core::{Affine, Rect};

/// Maps the position of `inner` within `input` proportionally onto `output`.
///
/// Used to derive the visible sub-rect of a destination or UV rect when a
/// quad's visible rect is a clipped portion of its logical rect.
pub(crate) fn scale_rect_proportional(output: Rect, input: Rect, inner: Rect) -> Rect {
    if input.width() <= 0.0 || input.height() <= 0.0 {
        return output;
    }
    let sx = output.width() / input.width();
    let sy = output.height() / input.height();
    let x0 = output.x0 + (inner.x0 - input.x0) * sx;
    let y0 = output.y0 + (inner.y0 - input.y0) * sy;
    Rect::new(x0, y0, x0 + inner.width() * sx, y0 + inner.height() * sy)
}

pub(crate) fn nearly_zero(v: f64) -> bool {
    v.abs() < 1e-6
}

pub(crate) fn nearly_integer(v: f64) -> bool {
    nearly_zero(v - v.round())
}

/// True when `t` is a pure scale plus integer translation: a transform that
/// keeps quad edges on the pixel grid, where anti-aliasing buys nothing.
pub(crate) fn is_scale_and_integer_translate(t: Affine) -> bool {
    let [a, b, c, d, e, f] = t.as_coeffs();
    nearly_zero(b) && nearly_zero(c) && a > 0.0 && d > 0.0 && nearly_integer(e) && nearly_integer(f)
}

pub(crate) fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
