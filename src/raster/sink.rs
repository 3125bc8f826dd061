use crate::foundation::core::Rect;
use crate::foundation::error::{QuadrilleError, QuadrilleResult};
use crate::raster::pixmap::Pixmap;

/// Destination for finished frames.
///
/// `present` must return promptly; the sink signals completion later by
/// whatever mechanism the embedder wires to
/// [`Compositor::on_presentation_complete`](crate::pipeline::Compositor::on_presentation_complete).
/// The compositor keeps at most one presentation in flight.
pub trait PresentationSink {
    fn present(&mut self, pixels: &Pixmap, damage: Rect) -> QuadrilleResult<()>;

    /// Called when the compositor becomes visible.
    fn ensure_backbuffer(&mut self) {}

    /// Called when the compositor is hidden; the sink may drop its buffer.
    fn discard_backbuffer(&mut self) {}
}

/// One frame captured by [`MemorySink`].
#[derive(Clone, Debug)]
pub struct PresentedFrame {
    pub pixels: Pixmap,
    pub damage: Rect,
}

/// In-memory sink retaining every presented frame. Used by tests and by
/// embedders that read back pixels directly.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<PresentedFrame>,
    /// When set, the next `present` fails once (sink-unavailable testing).
    pub fail_next: bool,
    has_backbuffer: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            fail_next: false,
            has_backbuffer: true,
        }
    }

    pub fn last(&self) -> Option<&PresentedFrame> {
        self.frames.last()
    }

    pub fn has_backbuffer(&self) -> bool {
        self.has_backbuffer
    }
}

impl PresentationSink for MemorySink {
    fn present(&mut self, pixels: &Pixmap, damage: Rect) -> QuadrilleResult<()> {
        if self.fail_next {
            self.fail_next = false;
            return Err(QuadrilleError::presentation("sink unavailable"));
        }
        if !self.has_backbuffer {
            return Err(QuadrilleError::presentation("backbuffer discarded"));
        }
        self.frames.push(PresentedFrame {
            pixels: pixels.clone(),
            damage,
        });
        Ok(())
    }

    fn ensure_backbuffer(&mut self) {
        self.has_backbuffer = true;
    }

    fn discard_backbuffer(&mut self) {
        self.has_backbuffer = false;
    }
}
