use crate::foundation::core::{union_damage, PassId, Rect, Rgba8Premul, Vec2, Viewport};
use crate::foundation::error::{QuadrilleError, QuadrilleResult};
use crate::frame::pass::{Frame, PassEffect, RenderPass};
use crate::frame::quad::{Quad, QuadKind};
use crate::scene::window::WindowNode;
use crate::surface::store::ContentStore;
use crate::surface::tracker::SurfaceLifetimeTracker;

const BASE_PASS: PassId = PassId(1);
const POST_EFFECT_PASS: PassId = PassId(2);

const DEBUG_BORDER_COLOR: Rgba8Premul = Rgba8Premul {
    r: 255,
    g: 0,
    b: 0,
    a: 255,
};
const DEBUG_BORDER_WIDTH: f64 = 2.0;

/// Scene composition knobs. An explicit settings object, not process-wide
/// state; lifecycle is tied to the composer instance.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComposerSettings {
    /// Append a full-screen invert pass reading the base pass (high-contrast
    /// mode).
    pub high_contrast: bool,
    /// Outline every emitted content quad with a debug border quad.
    pub debug_borders: bool,
}

/// Flattens the window tree into one ordered frame of quads and schedules
/// damage-driven redraws.
///
/// Draw scheduling is coalesced: `request_redraw` never draws synchronously,
/// it arms a single pending draw unless one is already armed or a
/// presentation is in flight. Damage arriving while a frame is in flight is
/// unioned and triggers exactly one more draw once the in-flight
/// presentation acks.
#[derive(Debug)]
pub struct SceneComposer {
    settings: ComposerSettings,
    tracker: SurfaceLifetimeTracker,
    damage: Rect,
    draw_armed: bool,
    frame_pending: bool,
}

impl SceneComposer {
    pub fn new(settings: ComposerSettings) -> Self {
        Self {
            settings,
            tracker: SurfaceLifetimeTracker::new(),
            damage: Rect::ZERO,
            draw_armed: false,
            frame_pending: false,
        }
    }

    pub fn tracker(&self) -> &SurfaceLifetimeTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut SurfaceLifetimeTracker {
        &mut self.tracker
    }

    /// Merges `region` into the pending damage rect and arms a draw unless
    /// one is already armed or in flight.
    pub fn request_redraw(&mut self, region: Rect) {
        self.damage = union_damage(self.damage, region);
        if self.draw_armed || self.frame_pending {
            return;
        }
        self.draw_armed = true;
    }

    /// True when a coalesced draw is armed and should be executed.
    pub fn draw_scheduled(&self) -> bool {
        self.draw_armed
    }

    /// Consumes the armed-draw flag; the caller then runs one
    /// compose + submit cycle.
    pub fn begin_draw(&mut self) -> bool {
        let armed = self.draw_armed;
        self.draw_armed = false;
        armed
    }

    /// Marks the composed frame as submitted: one presentation is now in
    /// flight and the submitted damage is consumed.
    pub fn frame_submitted(&mut self) {
        self.frame_pending = true;
        self.damage = Rect::ZERO;
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Presentation-complete ack from the sink. Re-arms exactly one draw if
    /// damage accrued while the frame was in flight.
    pub fn on_presentation_complete(&mut self) {
        self.frame_pending = false;
        if !self.damage.is_zero_area() && !self.draw_armed {
            self.draw_armed = true;
        }
    }

    /// Pending damage, for tests and drivers.
    pub fn pending_damage(&self) -> Rect {
        self.damage
    }

    /// Produces one frame from the window tree, synchronously.
    ///
    /// Walks `root` back-to-front accumulating effective opacity, emitting
    /// underlay quads before each window's children and the window's own
    /// content after them, and referencing every cited stream in the
    /// lifetime tracker before rasterization begins.
    #[tracing::instrument(skip(self, root, store), fields(root_id = root.id.0))]
    pub fn compose(
        &mut self,
        root: &WindowNode,
        viewport: Viewport,
        store: &ContentStore,
    ) -> QuadrilleResult<Frame> {
        if !root.visible {
            return Err(QuadrilleError::no_root_window(format!(
                "window {:?} is not visible",
                root.id
            )));
        }

        let output_rect = viewport.to_rect();
        self.damage = self.damage.intersect(output_rect);

        let mut pass = RenderPass::new(BASE_PASS, output_rect, self.damage);
        let mut may_contain_video = false;
        self.draw_window_tree(&mut pass, root, Vec2::ZERO, 1.0, &mut may_contain_video, store);

        let mut passes = vec![pass];
        if self.settings.high_contrast {
            let mut invert = RenderPass::new(POST_EFFECT_PASS, output_rect, self.damage);
            invert.input = Some(BASE_PASS);
            invert.effect = Some(PassEffect::Invert);
            passes.push(invert);
        }

        Ok(Frame {
            passes,
            may_contain_video,
        })
    }

    fn draw_window_tree(
        &mut self,
        pass: &mut RenderPass,
        window: &WindowNode,
        parent_offset: Vec2,
        opacity: f32,
        may_contain_video: &mut bool,
        store: &ContentStore,
    ) {
        if !window.visible || window.opacity <= 0.0 {
            return;
        }

        let absolute_bounds = window.bounds + parent_offset;
        let combined_opacity = opacity * window.opacity;

        // Underlay first: it must sit beneath this window's descendants. It
        // is sized to the underlay's last-delivered surface, not the window
        // bounds.
        if let Some(stream) = window.underlay_stream
            && let Some((w, h)) = store.size(stream)
        {
            let origin = (
                absolute_bounds.x0 - window.underlay_offset.x,
                absolute_bounds.y0 - window.underlay_offset.y,
            );
            let rect = Rect::from_origin_size(origin, (f64::from(w), f64::from(h)));
            self.tracker.reference(store, window.id, stream);
            pass.quads.push(Quad::new(
                rect,
                combined_opacity,
                QuadKind::NestedSurface { stream },
            ));
        }

        let child_offset = absolute_bounds.origin().to_vec2();
        for child in &window.children {
            self.draw_window_tree(
                pass,
                child,
                child_offset,
                combined_opacity,
                may_contain_video,
                store,
            );
        }

        // The window's own content goes on top of its descendants.
        if let Some(stream) = window.default_stream {
            self.tracker.reference(store, window.id, stream);
            if store.may_contain_video(stream) {
                *may_contain_video = true;
            }
            pass.quads.push(Quad::new(
                absolute_bounds,
                combined_opacity,
                QuadKind::NestedSurface { stream },
            ));
            if self.settings.debug_borders {
                pass.quads.push(Quad::new(
                    absolute_bounds,
                    1.0,
                    QuadKind::DebugBorder {
                        color: DEBUG_BORDER_COLOR,
                        width: DEBUG_BORDER_WIDTH,
                    },
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/composer.rs"]
mod tests;
