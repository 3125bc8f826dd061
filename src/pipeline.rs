use crate::foundation::core::{Rect, Viewport, WindowId};
use crate::foundation::error::{QuadrilleError, QuadrilleResult};
use crate::raster::rasterizer::{QuadRasterizer, RasterSettings};
use crate::raster::sink::PresentationSink;
use crate::scene::composer::{ComposerSettings, SceneComposer};
use crate::scene::window::WindowNode;
use crate::surface::store::ContentStore;

/// End-to-end driver wiring the scene composer, the quad rasterizer and a
/// presentation sink together.
///
/// The owner of the window tree and the content store calls [`pump`] from
/// its event loop whenever a draw may be due; `pump` runs at most one
/// compose + rasterize + present cycle per call and reports whether it did.
///
/// [`pump`]: Compositor::pump
pub struct Compositor<S: PresentationSink> {
    composer: SceneComposer,
    rasterizer: QuadRasterizer,
    sink: S,
    last_frame_may_contain_video: bool,
}

impl<S: PresentationSink> Compositor<S> {
    pub fn new(composer: ComposerSettings, raster: RasterSettings, sink: S) -> Self {
        Self {
            composer: SceneComposer::new(composer),
            rasterizer: QuadRasterizer::new(raster),
            sink,
            last_frame_may_contain_video: false,
        }
    }

    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut SceneComposer {
        &mut self.composer
    }

    pub fn rasterizer(&self) -> &QuadRasterizer {
        &self.rasterizer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Whether the most recently presented frame referenced video content.
    pub fn last_frame_may_contain_video(&self) -> bool {
        self.last_frame_may_contain_video
    }

    /// Marks `region` of the output as damaged and arms a coalesced draw.
    pub fn request_redraw(&mut self, region: Rect) {
        self.composer.request_redraw(region);
    }

    /// Runs one draw cycle if one is due.
    ///
    /// First drains producer-side stream removals so the lifetime tracker
    /// forgets torn-down streams before composition cites them. Returns
    /// `Ok(false)` when no draw was armed or the root window is not
    /// drawable; hard rasterizer and sink failures propagate.
    #[tracing::instrument(skip(self, root, store), fields(root_id = root.id.0))]
    pub fn pump(
        &mut self,
        root: &WindowNode,
        viewport: Viewport,
        store: &mut ContentStore,
    ) -> QuadrilleResult<bool> {
        let events = store.take_events();
        self.composer.tracker_mut().process_events(&events);

        if !self.composer.begin_draw() {
            return Ok(false);
        }

        let frame = match self.composer.compose(root, viewport, store) {
            Ok(frame) => frame,
            Err(QuadrilleError::NoRootWindow(why)) => {
                // Not drawable right now; the armed draw is consumed and a
                // later redraw request re-arms it.
                tracing::debug!(why = %why, "skipping draw");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        self.rasterizer.begin_frame(viewport)?;
        for pass in &frame.passes {
            self.rasterizer.draw_pass(pass, &frame, store)?;
        }
        self.rasterizer.end_frame(&frame)?;
        if let Err(err) = self.rasterizer.present(&mut self.sink) {
            // Drop the frame rather than wedging the binding state; the
            // caller decides whether to request another redraw.
            self.rasterizer.discard_frame();
            return Err(err);
        }

        self.composer.frame_submitted();
        self.last_frame_may_contain_video = frame.may_contain_video;
        Ok(true)
    }

    /// Presentation-complete ack from the display; may re-arm a draw if
    /// damage accrued while the frame was in flight.
    pub fn on_presentation_complete(&mut self) {
        self.composer.on_presentation_complete();
    }

    /// Releases every surface reference held on behalf of `window`.
    pub fn on_window_destroyed(&mut self, window: WindowId) {
        self.composer.tracker_mut().on_window_destroyed(window);
    }

    /// Output visibility change; the sink drops its backbuffer while hidden.
    pub fn set_visible(&mut self, visible: bool) {
        self.rasterizer.set_visible(visible, &mut self.sink);
    }
}
