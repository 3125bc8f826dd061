use std::collections::{BTreeMap, HashMap, HashSet};

use crate::foundation::core::{Affine, PassId, Point, Rect, Rgba8Premul, Vec2, Viewport};
use crate::foundation::error::{QuadrilleError, QuadrilleResult};
use crate::foundation::math::{is_scale_and_integer_translate, scale_rect_proportional};
use crate::frame::pass::{Frame, PassEffect, RenderPass};
use crate::frame::quad::{AaHint, BlendMode, Quad, QuadKind};
use crate::raster::pixmap::Pixmap;
use crate::raster::sink::PresentationSink;
use crate::surface::store::ContentStore;

/// Rasterizer knobs, an explicit per-instance settings object.
#[derive(Clone, Copy, Debug)]
pub struct RasterSettings {
    pub allow_antialiasing: bool,
    pub force_antialiasing: bool,
    /// Present only the damaged sub-rect; when false every present swaps
    /// the full surface.
    pub partial_swap: bool,
    /// Permit presenting an empty damage rect instead of forcing a full
    /// swap.
    pub allow_empty_swap: bool,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            allow_antialiasing: true,
            force_antialiasing: false,
            partial_swap: true,
            allow_empty_swap: false,
        }
    }
}

/// Soft-failure counters surfaced to tests and monitoring.
#[derive(Clone, Debug, Default)]
pub struct RasterDiagnostics {
    /// Quads referencing a stream with no delivered surface (valid, drawn
    /// as nothing).
    pub missing_surface_quads: u64,
    /// Quads of a kind this rasterizer does not handle (drawn as fallback
    /// fill).
    pub unsupported_quads: u64,
    /// Per-kind breakdown of unsupported quads.
    pub unsupported_by_kind: BTreeMap<&'static str, u64>,
    logged_unsupported: HashSet<&'static str>,
}

impl RasterDiagnostics {
    fn note_unsupported(&mut self, kind: &'static str) {
        self.unsupported_quads += 1;
        *self.unsupported_by_kind.entry(kind).or_insert(0) += 1;
        if self.logged_unsupported.insert(kind) {
            tracing::warn!(kind, "quad kind not handled, drawing fallback fill");
        }
    }
}

/// Fallback fill for unsupported quads: high-visibility in debug builds,
/// neutral in release.
fn unsupported_fill_color() -> Rgba8Premul {
    if cfg!(debug_assertions) {
        Rgba8Premul::MAGENTA
    } else {
        Rgba8Premul::WHITE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Root,
    Texture(PassId),
}

/// Destination binding state. One binding at a time; a full frame walks
/// `Unbound → Bound → Drawing → (Unbound per pass) → Flushed → Presented`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RasterState {
    Unbound,
    Bound(Target),
    Drawing(Target),
    Flushed,
    Presented,
}

/// Draws ordered quad lists into pixel buffers and hands finished frames to
/// the presentation sink.
///
/// Consumes the frame produced by scene composition; every referenced
/// surface is already retained by the lifetime tracker, so lookups during
/// the draw cannot race with producer teardown.
#[derive(Debug)]
pub struct QuadRasterizer {
    settings: RasterSettings,
    viewport: Option<Viewport>,
    root: Option<Pixmap>,
    pass_textures: HashMap<PassId, Pixmap>,
    state: RasterState,
    scissor: Rect,
    swap_buffer_rect: Rect,
    diagnostics: RasterDiagnostics,
    visible: bool,
}

impl QuadRasterizer {
    pub fn new(settings: RasterSettings) -> Self {
        Self {
            settings,
            viewport: None,
            root: None,
            pass_textures: HashMap::new(),
            state: RasterState::Unbound,
            scissor: Rect::ZERO,
            swap_buffer_rect: Rect::ZERO,
            diagnostics: RasterDiagnostics::default(),
            visible: true,
        }
    }

    pub fn diagnostics(&self) -> &RasterDiagnostics {
        &self.diagnostics
    }

    /// The root target pixels, once a frame has been drawn.
    pub fn root_pixels(&self) -> Option<&Pixmap> {
        self.root.as_ref()
    }

    /// Prepares the root target for one frame.
    pub fn begin_frame(&mut self, viewport: Viewport) -> QuadrilleResult<()> {
        match self.state {
            RasterState::Unbound | RasterState::Presented => {}
            other => {
                return Err(QuadrilleError::binding(format!(
                    "begin_frame from {other:?}"
                )));
            }
        }
        let resize = self.viewport != Some(viewport);
        if resize || self.root.is_none() {
            self.root = Some(Pixmap::new(viewport.width, viewport.height));
            self.pass_textures.clear();
        }
        self.viewport = Some(viewport);
        self.state = RasterState::Unbound;
        Ok(())
    }

    /// Rasterizes one pass. Passes must arrive in the frame's listed order;
    /// the frame's last pass draws to the root target, earlier ones to
    /// intermediate textures later passes may read.
    #[tracing::instrument(skip(self, pass, frame, store), fields(pass_id = pass.id.0, quads = pass.quads.len()))]
    pub fn draw_pass(
        &mut self,
        pass: &RenderPass,
        frame: &Frame,
        store: &ContentStore,
    ) -> QuadrilleResult<()> {
        if self.state != RasterState::Unbound {
            return Err(QuadrilleError::binding(format!(
                "draw_pass from {:?}",
                self.state
            )));
        }
        let is_root = frame.root_pass().is_some_and(|p| p.id == pass.id);
        let target = if is_root {
            Target::Root
        } else {
            Target::Texture(pass.id)
        };
        let mut pixmap = self.take_target(target, pass.output_rect)?;
        self.state = RasterState::Bound(target);
        // Texture pixmaps are origin-based regardless of where the pass's
        // output rect sits, so quad geometry is normalized by the origin.
        let origin = if is_root {
            Vec2::ZERO
        } else {
            pass.output_rect.origin().to_vec2()
        };
        self.scissor = pass.output_rect - origin;

        // The root and the frame's base pass start opaque, so a post-effect
        // reading the base pass sees the frame background, not transparency.
        // Other intermediate textures start transparent.
        let is_base = frame.passes.first().is_some_and(|p| p.id == pass.id);
        if is_root || is_base {
            pixmap.clear(Rgba8Premul::from_straight_rgba(0, 0, 0, 255));
        } else {
            pixmap.clear(Rgba8Premul::TRANSPARENT);
        }
        self.state = RasterState::Drawing(target);

        if let Some(effect) = pass.effect
            && let Err(err) = self.apply_pass_effect(&mut pixmap, pass, effect)
        {
            // Put the target back so the binding state stays consistent.
            self.put_target(target, pixmap);
            self.state = RasterState::Unbound;
            return Err(err);
        }

        for quad in &pass.quads {
            draw_quad(
                &self.settings,
                &mut self.diagnostics,
                &mut pixmap,
                self.scissor,
                origin,
                quad,
                store,
            );
        }

        self.put_target(target, pixmap);
        self.state = RasterState::Unbound;
        Ok(())
    }

    fn apply_pass_effect(
        &mut self,
        target: &mut Pixmap,
        pass: &RenderPass,
        effect: PassEffect,
    ) -> QuadrilleResult<()> {
        let input_id = pass.input.ok_or_else(|| {
            QuadrilleError::validation(format!("pass {:?} has an effect but no input", pass.id))
        })?;
        let input = self.pass_textures.get(&input_id).ok_or_else(|| {
            QuadrilleError::validation(format!(
                "pass {input_id:?} output is not available as an input texture"
            ))
        })?;
        match effect {
            PassEffect::Invert => {
                let mut inverted = input.clone();
                inverted.invert_colors();
                target.composite_over(&inverted, 1.0);
            }
        }
        Ok(())
    }

    fn take_target(&mut self, target: Target, output_rect: Rect) -> QuadrilleResult<Pixmap> {
        match target {
            Target::Root => self
                .root
                .take()
                .ok_or_else(|| QuadrilleError::binding("root target missing; call begin_frame")),
            Target::Texture(id) => {
                let w = output_rect.width().ceil().max(1.0) as u32;
                let h = output_rect.height().ceil().max(1.0) as u32;
                match self.pass_textures.remove(&id) {
                    Some(p) if p.width() == w && p.height() == h => Ok(p),
                    _ => Ok(Pixmap::new(w, h)),
                }
            }
        }
    }

    fn put_target(&mut self, target: Target, pixmap: Pixmap) {
        match target {
            Target::Root => self.root = Some(pixmap),
            Target::Texture(id) => {
                self.pass_textures.insert(id, pixmap);
            }
        }
    }

    /// Flushes the frame: records the root damage for presentation.
    pub fn end_frame(&mut self, frame: &Frame) -> QuadrilleResult<()> {
        if self.state != RasterState::Unbound {
            return Err(QuadrilleError::binding(format!(
                "end_frame from {:?}",
                self.state
            )));
        }
        self.swap_buffer_rect = frame.root_pass().map(|p| p.damage_rect).unwrap_or(Rect::ZERO);
        self.state = RasterState::Flushed;
        Ok(())
    }

    /// Hands the finished buffer to the sink, intersecting accumulated
    /// damage with the viewport unless full-surface swap is forced, then
    /// resets the damage accumulator.
    pub fn present(&mut self, sink: &mut dyn PresentationSink) -> QuadrilleResult<()> {
        if self.state != RasterState::Flushed {
            return Err(QuadrilleError::binding(format!(
                "present from {:?}",
                self.state
            )));
        }
        let viewport_rect = self
            .viewport
            .ok_or_else(|| QuadrilleError::binding("present without begin_frame"))?
            .to_rect();

        let mut swap_rect = self.swap_buffer_rect;
        if self.settings.partial_swap {
            swap_rect = swap_rect.intersect(viewport_rect);
        } else if !swap_rect.is_zero_area() || !self.settings.allow_empty_swap {
            swap_rect = viewport_rect;
        }

        let pixels = self
            .root
            .as_ref()
            .ok_or_else(|| QuadrilleError::binding("present without a drawn root target"))?;
        // Sink failure leaves the frame flushed so the caller can recover
        // the backbuffer and retry.
        sink.present(pixels, swap_rect)?;

        self.swap_buffer_rect = Rect::ZERO;
        self.state = RasterState::Presented;
        Ok(())
    }

    /// Abandons the current frame without presenting it, returning the
    /// rasterizer to a state where `begin_frame` is valid again. Used by
    /// drivers that drop a frame instead of retrying a failed present.
    pub fn discard_frame(&mut self) {
        self.swap_buffer_rect = Rect::ZERO;
        self.state = RasterState::Unbound;
    }

    /// Visibility change hook: the sink keeps a backbuffer only while
    /// visible.
    pub fn set_visible(&mut self, visible: bool, sink: &mut dyn PresentationSink) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible {
            sink.ensure_backbuffer();
        } else {
            sink.discard_backbuffer();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Per-quad AA policy: a pure integer-translating scale needs no AA; other
/// transforms get it only when all four edges are exterior, to avoid seams
/// on shared edges.
fn decide_anti_alias(settings: &RasterSettings, quad: &Quad, transform: Affine) -> bool {
    match quad.anti_alias {
        AaHint::Force => true,
        AaHint::Disable => false,
        AaHint::Auto => {
            if !settings.force_antialiasing && is_scale_and_integer_translate(transform) {
                return false;
            }
            settings.allow_antialiasing && (settings.force_antialiasing || quad.exterior_edges)
        }
    }
}

fn draw_quad(
    settings: &RasterSettings,
    diagnostics: &mut RasterDiagnostics,
    target: &mut Pixmap,
    scissor: Rect,
    pass_origin: Vec2,
    quad: &Quad,
    store: &ContentStore,
) {
    let visible = quad.visible_rect.intersect(quad.rect);
    if visible.is_zero_area() || quad.opacity <= 0.0 {
        return;
    }

    // Device transform: quad-to-pass transform shifted into the target
    // pixmap's own space.
    let transform = Affine::translate(-pass_origin) * quad.transform;

    let clip = transform
        .transform_rect_bbox(quad.visible_rect)
        .intersect(scissor);
    if clip.is_zero_area() {
        return;
    }

    let anti_alias = decide_anti_alias(settings, quad, transform);
    let alpha = quad.opacity.clamp(0.0, 1.0);

    // Replace is an upgrade the rasterizer applies when the quad is known
    // fully opaque and needs no blending; the composer always requests
    // source-over.
    let known_opaque = match &quad.kind {
        QuadKind::SolidColor { color } => color.is_opaque(),
        QuadKind::Texture { stream, .. }
        | QuadKind::Tiled { stream, .. }
        | QuadKind::NestedSurface { stream } => {
            store.current(*stream).is_some_and(|s| s.opaque)
        }
        _ => false,
    };
    let blend = if quad.blend == BlendMode::SrcOver && alpha >= 1.0 && known_opaque && !anti_alias
    {
        BlendMode::Replace
    } else {
        BlendMode::SrcOver
    };

    match &quad.kind {
        QuadKind::SolidColor { color } => {
            target.fill_transformed(visible, transform, *color, alpha, blend, clip, anti_alias);
        }
        QuadKind::Texture {
            stream,
            uv,
            y_flipped,
            background,
        } => {
            let Some(surface) = store.current(*stream) else {
                diagnostics.missing_surface_quads += 1;
                tracing::debug!(?stream, "texture quad references an undelivered stream");
                return;
            };
            let visible_uv = scale_rect_proportional(*uv, quad.rect, visible);
            let blend_background = background.a != 0 && !surface.opaque;

            if blend_background && alpha < 1.0 {
                // Compositing alpha-under-alpha double-darkens the
                // background, so draw background and image at full alpha
                // into a transparency layer and composite the layer once.
                let bbox = transform.transform_rect_bbox(visible);
                let w = bbox.width().ceil().max(1.0) as u32;
                let h = bbox.height().ceil().max(1.0) as u32;
                let mut layer = Pixmap::new(w, h);
                let local = transform
                    .then_translate((-bbox.x0, -bbox.y0).into());
                layer.fill_transformed(
                    visible,
                    local,
                    *background,
                    1.0,
                    BlendMode::SrcOver,
                    layer.bounds(),
                    anti_alias,
                );
                layer.draw_pixmap(
                    &surface.pixels,
                    visible_uv,
                    visible,
                    local,
                    1.0,
                    BlendMode::SrcOver,
                    layer.bounds(),
                    false,
                    anti_alias,
                    *y_flipped,
                );
                let layer_bounds = layer.bounds();
                target.draw_pixmap(
                    &layer,
                    layer_bounds,
                    layer_bounds,
                    Affine::translate((bbox.x0, bbox.y0)),
                    alpha,
                    BlendMode::SrcOver,
                    clip,
                    true,
                    false,
                    false,
                );
                return;
            }

            if blend_background {
                target.fill_transformed(
                    visible,
                    transform,
                    *background,
                    alpha,
                    BlendMode::SrcOver,
                    clip,
                    anti_alias,
                );
            }
            target.draw_pixmap(
                &surface.pixels,
                visible_uv,
                visible,
                transform,
                alpha,
                blend,
                clip,
                false,
                anti_alias,
                *y_flipped,
            );
        }
        QuadKind::Tiled { stream, tile_uv } => {
            let Some(surface) = store.current(*stream) else {
                diagnostics.missing_surface_quads += 1;
                tracing::debug!(?stream, "tile quad references an undelivered stream");
                return;
            };
            // UV is relative to the tile's own coordinate space.
            let visible_uv = scale_rect_proportional(*tile_uv, quad.rect, visible);
            target.draw_pixmap(
                &surface.pixels,
                visible_uv,
                visible,
                transform,
                alpha,
                blend,
                clip,
                false,
                anti_alias,
                false,
            );
        }
        QuadKind::Picture {
            recording,
            content_rect,
            contents_scale,
            nearest_neighbor,
        } => {
            let w = (content_rect.width() * contents_scale).ceil().max(1.0) as u32;
            let h = (content_rect.height() * contents_scale).ceil().max(1.0) as u32;
            let mut playback = Pixmap::new(w, h);
            recording.playback(&mut playback, *content_rect, *contents_scale);

            // Fractional opacity and forced nearest-neighbor both route
            // through the same filtered blit, so no per-recording persistent
            // intermediate is needed.
            let visible_uv = scale_rect_proportional(playback.bounds(), quad.rect, visible);
            target.draw_pixmap(
                &playback,
                visible_uv,
                visible,
                transform,
                alpha,
                BlendMode::SrcOver,
                clip,
                *nearest_neighbor,
                anti_alias,
                false,
            );
        }
        QuadKind::NestedSurface { stream } => {
            let Some(surface) = store.current(*stream) else {
                // A not-yet-delivered child frame is valid; it simply leaves
                // a gap until the next redraw.
                diagnostics.missing_surface_quads += 1;
                tracing::debug!(?stream, "nested surface has no delivered content yet");
                return;
            };
            let visible_uv =
                scale_rect_proportional(surface.pixels.bounds(), quad.rect, visible);
            target.draw_pixmap(
                &surface.pixels,
                visible_uv,
                visible,
                transform,
                alpha,
                blend,
                clip,
                false,
                anti_alias,
                false,
            );
        }
        QuadKind::DebugBorder { color, width } => {
            // Corner points go through the transform manually so the stroke
            // width stays a constant number of device pixels.
            let r = quad.rect;
            let corners = [
                transform * Point::new(r.x0, r.y0),
                transform * Point::new(r.x1, r.y0),
                transform * Point::new(r.x1, r.y1),
                transform * Point::new(r.x0, r.y1),
            ];
            target.stroke_polygon(&corners, *width, *color, alpha, clip);
        }
        QuadKind::Unsupported { kind } => {
            diagnostics.note_unsupported(kind);
            target.fill_transformed(
                visible,
                transform,
                unsupported_fill_color(),
                alpha,
                BlendMode::SrcOver,
                clip,
                false,
            );
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/rasterizer.rs"]
mod tests;
