use crate::foundation::core::{Affine, Point, Rect, Rgba8Premul};
use crate::foundation::math::{mul_div255, nearly_zero};
use crate::frame::quad::BlendMode;

/// A premultiplied RGBA8 pixel buffer.
///
/// All drawing primitives take device-space geometry, an effective opacity
/// and a clip rect, and compose with saturating premultiplied arithmetic.
/// This is the only pixel storage type in the crate: the root target, pass
/// textures and delivered content surfaces are all `Pixmap`s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    /// Transparent pixmap of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Pixmap filled with a uniform color.
    pub fn from_fill(width: u32, height: u32, color: Rgba8Premul) -> Self {
        let mut p = Self::new(width, height);
        p.clear(color);
        p
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The full surface as a device-space rect.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    pub fn clear(&mut self, color: Rgba8Premul) {
        let px = color.to_bytes();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    fn compose_px(&mut self, x: i64, y: i64, src: [u8; 4], coverage: f32, blend: BlendMode) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let coverage = coverage.clamp(0.0, 1.0);
        if coverage <= 0.0 {
            return;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;

        if blend == BlendMode::Replace && coverage >= 1.0 {
            self.data[i..i + 4].copy_from_slice(&src);
            return;
        }

        // Source-over with coverage folded into the source alpha.
        let cov = ((coverage * 255.0).round() as i32).clamp(0, 255) as u16;
        let sa = mul_div255(u16::from(src[3]), cov);
        if sa == 0 {
            return;
        }
        let inv = 255u16 - u16::from(sa);
        for c in 0..3 {
            let sc = mul_div255(u16::from(src[c]), cov);
            let dc = mul_div255(u16::from(self.data[i + c]), inv);
            self.data[i + c] = sc.saturating_add(dc);
        }
        let da = mul_div255(u16::from(self.data[i + 3]), inv);
        self.data[i + 3] = sa.saturating_add(da);
    }

    /// Fills an axis-aligned device-space rect.
    ///
    /// With `anti_alias`, boundary pixels receive fractional coverage equal
    /// to their overlap with the rect; without it the rect is rounded to
    /// whole pixels.
    pub fn fill_rect(
        &mut self,
        rect: Rect,
        color: Rgba8Premul,
        opacity: f32,
        blend: BlendMode,
        clip: Rect,
        anti_alias: bool,
    ) {
        let rect = rect.intersect(clip).intersect(self.bounds());
        if rect.is_zero_area() || opacity <= 0.0 {
            return;
        }
        let src = color.to_bytes();

        if !anti_alias {
            let x0 = rect.x0.round() as i64;
            let y0 = rect.y0.round() as i64;
            let x1 = rect.x1.round() as i64;
            let y1 = rect.y1.round() as i64;
            for y in y0..y1 {
                for x in x0..x1 {
                    self.compose_px(x, y, src, opacity, blend);
                }
            }
            return;
        }

        let x0 = rect.x0.floor() as i64;
        let y0 = rect.y0.floor() as i64;
        let x1 = rect.x1.ceil() as i64;
        let y1 = rect.y1.ceil() as i64;
        for y in y0..y1 {
            let row_cov = axis_coverage(y as f64, rect.y0, rect.y1);
            for x in x0..x1 {
                let cov = row_cov * axis_coverage(x as f64, rect.x0, rect.x1);
                self.compose_px(x, y, src, opacity * cov, blend);
            }
        }
    }

    /// Fills the quad-space rect `dst` mapped through `transform`, for
    /// solid fills under arbitrary affines. Falls back to the axis-aligned
    /// fast path when the transform preserves axes.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_transformed(
        &mut self,
        dst: Rect,
        transform: Affine,
        color: Rgba8Premul,
        opacity: f32,
        blend: BlendMode,
        clip: Rect,
        anti_alias: bool,
    ) {
        let [a, b, c, d, _, _] = transform.as_coeffs();
        if nearly_zero(b) && nearly_zero(c) && a > 0.0 && d > 0.0 {
            self.fill_rect(
                transform.transform_rect_bbox(dst),
                color,
                opacity,
                blend,
                clip,
                anti_alias,
            );
            return;
        }
        if nearly_zero(a * d - b * c) {
            return;
        }
        let inv = transform.inverse();
        let device_bbox = transform
            .transform_rect_bbox(dst)
            .intersect(clip)
            .intersect(self.bounds());
        if device_bbox.is_zero_area() {
            return;
        }
        let src = color.to_bytes();
        let x0 = device_bbox.x0.floor() as i64;
        let y0 = device_bbox.y0.floor() as i64;
        let x1 = device_bbox.x1.ceil() as i64;
        let y1 = device_bbox.y1.ceil() as i64;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = inv * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if p.x < dst.x0 || p.x >= dst.x1 || p.y < dst.y0 || p.y >= dst.y1 {
                    continue;
                }
                self.compose_px(x, y, src, opacity, blend);
            }
        }
    }

    /// Scans the alpha channel; true when every pixel is fully opaque.
    pub fn is_fully_opaque(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 255)
    }

    /// Draws `src` so that its `uv` sub-rect (in source pixels) fills the
    /// quad-space rect `dst` mapped through `transform` to device space.
    ///
    /// Sampling is inverse-mapped per device pixel, so arbitrary affine
    /// transforms work; `nearest` disables bilinear filtering and `flip_y`
    /// mirrors the UV rect vertically.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_pixmap(
        &mut self,
        src: &Pixmap,
        uv: Rect,
        dst: Rect,
        transform: Affine,
        opacity: f32,
        blend: BlendMode,
        clip: Rect,
        nearest: bool,
        anti_alias: bool,
        flip_y: bool,
    ) {
        if dst.is_zero_area() || uv.is_zero_area() || opacity <= 0.0 {
            return;
        }
        if src.width == 0 || src.height == 0 {
            return;
        }
        let det = {
            let [a, b, c, d, _, _] = transform.as_coeffs();
            a * d - b * c
        };
        if nearly_zero(det) {
            return;
        }
        let inv = transform.inverse();

        let device_bbox = transform
            .transform_rect_bbox(dst)
            .intersect(clip)
            .intersect(self.bounds());
        if device_bbox.is_zero_area() {
            return;
        }

        let x0 = device_bbox.x0.floor() as i64;
        let y0 = device_bbox.y0.floor() as i64;
        let x1 = device_bbox.x1.ceil() as i64;
        let y1 = device_bbox.y1.ceil() as i64;

        // Edge coverage is exact only for axis-preserving transforms; for
        // sheared or rotated quads the inside test is binary.
        let [a, b, c, d, _, _] = transform.as_coeffs();
        let axis_preserving = nearly_zero(b) && nearly_zero(c) && a > 0.0 && d > 0.0;
        let device_rect = if axis_preserving {
            transform.transform_rect_bbox(dst)
        } else {
            Rect::ZERO
        };

        for y in y0..y1 {
            for x in x0..x1 {
                let p = inv * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let fx = (p.x - dst.x0) / dst.width();
                let fy = (p.y - dst.y0) / dst.height();
                if !(0.0..1.0).contains(&fx) || !(0.0..1.0).contains(&fy) {
                    continue;
                }

                let cov = if anti_alias && axis_preserving {
                    axis_coverage(x as f64, device_rect.x0, device_rect.x1)
                        * axis_coverage(y as f64, device_rect.y0, device_rect.y1)
                } else {
                    1.0
                };

                let u = uv.x0 + fx * uv.width();
                let v = if flip_y {
                    uv.y1 - fy * uv.height()
                } else {
                    uv.y0 + fy * uv.height()
                };

                let texel = if nearest {
                    src.sample_nearest(u, v)
                } else {
                    src.sample_bilinear(u, v)
                };
                self.compose_px(x, y, texel, opacity * cov, blend);
            }
        }
    }

    fn sample_nearest(&self, u: f64, v: f64) -> [u8; 4] {
        let x = (u.floor() as i64).clamp(0, i64::from(self.width) - 1) as u32;
        let y = (v.floor() as i64).clamp(0, i64::from(self.height) - 1) as u32;
        self.pixel(x, y).unwrap_or([0; 4])
    }

    fn sample_bilinear(&self, u: f64, v: f64) -> [u8; 4] {
        let fu = u - 0.5;
        let fv = v - 0.5;
        let x0 = fu.floor();
        let y0 = fv.floor();
        let tx = (fu - x0) as f32;
        let ty = (fv - y0) as f32;

        let fetch = |x: f64, y: f64| -> [u8; 4] {
            let xi = (x as i64).clamp(0, i64::from(self.width) - 1) as u32;
            let yi = (y as i64).clamp(0, i64::from(self.height) - 1) as u32;
            self.pixel(xi, yi).unwrap_or([0; 4])
        };
        let p00 = fetch(x0, y0);
        let p10 = fetch(x0 + 1.0, y0);
        let p01 = fetch(x0, y0 + 1.0);
        let p11 = fetch(x0 + 1.0, y0 + 1.0);

        let mut out = [0u8; 4];
        for ch in 0..4 {
            let top = f32::from(p00[ch]) * (1.0 - tx) + f32::from(p10[ch]) * tx;
            let bot = f32::from(p01[ch]) * (1.0 - tx) + f32::from(p11[ch]) * tx;
            out[ch] = (top * (1.0 - ty) + bot * ty).round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Strokes a closed polygon given in device-space points, with a stroke
    /// width in device pixels. Used for debug borders, whose width must not
    /// scale with the quad transform.
    pub fn stroke_polygon(
        &mut self,
        points: &[Point],
        width: f64,
        color: Rgba8Premul,
        opacity: f32,
        clip: Rect,
    ) {
        if points.len() < 2 || width <= 0.0 || opacity <= 0.0 {
            return;
        }
        let src = color.to_bytes();
        let half = width / 2.0;
        let n = points.len();
        for i in 0..n {
            let a = points[i];
            let b = points[(i + 1) % n];
            let bbox = Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
                .inflate(half + 1.0, half + 1.0)
                .intersect(clip)
                .intersect(self.bounds());
            if bbox.is_zero_area() {
                continue;
            }
            let x0 = bbox.x0.floor() as i64;
            let y0 = bbox.y0.floor() as i64;
            let x1 = bbox.x1.ceil() as i64;
            let y1 = bbox.y1.ceil() as i64;
            for y in y0..y1 {
                for x in x0..x1 {
                    let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                    let dist = segment_distance(p, a, b);
                    let cov = ((half + 0.5 - dist).clamp(0.0, 1.0)) as f32;
                    self.compose_px(x, y, src, opacity * cov, BlendMode::SrcOver);
                }
            }
        }
    }

    /// Inverts color channels in place, preserving alpha.
    ///
    /// On premultiplied pixels the straight-color inversion `255 - c`
    /// becomes `a - c` per channel.
    pub fn invert_colors(&mut self) {
        for px in self.data.chunks_exact_mut(4) {
            let a = px[3];
            for c in &mut px[..3] {
                *c = a.saturating_sub(*c);
            }
        }
    }

    /// Composites `src` over the whole surface (equal sizes required).
    pub fn composite_over(&mut self, src: &Pixmap, opacity: f32) {
        debug_assert_eq!(
            (self.width, self.height),
            (src.width, src.height),
            "composite_over expects equal-size pixmaps"
        );
        let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
        if op == 0 {
            return;
        }
        for (d, s) in self
            .data
            .chunks_exact_mut(4)
            .zip(src.data.chunks_exact(4))
        {
            let sa = mul_div255(u16::from(s[3]), op);
            if sa == 0 {
                continue;
            }
            let inv = 255u16 - u16::from(sa);
            for c in 0..3 {
                let sc = mul_div255(u16::from(s[c]), op);
                let dc = mul_div255(u16::from(d[c]), inv);
                d[c] = sc.saturating_add(dc);
            }
            let da = mul_div255(u16::from(d[3]), inv);
            d[3] = sa.saturating_add(da);
        }
    }
}

/// Fraction of the unit pixel `[px, px+1]` covered by the span `[lo, hi]`.
fn axis_coverage(px: f64, lo: f64, hi: f64) -> f32 {
    let overlap = (hi.min(px + 1.0) - lo.max(px)).clamp(0.0, 1.0);
    overlap as f32
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.dot(ab);
    if len2 <= f64::EPSILON {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    let proj = a + ab * t;
    (p - proj).hypot()
}

#[cfg(test)]
#[path = "../../tests/unit/raster/pixmap.rs"]
mod tests;
