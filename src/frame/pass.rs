use crate::foundation::core::{PassId, Rect};
use crate::frame::quad::Quad;

/// Full-screen effect applied by a pass that reads an earlier pass's output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassEffect {
    /// Color inversion (high-contrast mode).
    Invert,
}

/// An ordered list of quads rendered into one destination.
///
/// Quads are rasterized strictly in emission order (back-to-front). A pass
/// with an `input` reads that earlier pass's output as a texture, applying
/// `effect` before its own quads are drawn.
#[derive(Clone, Debug)]
pub struct RenderPass {
    pub id: PassId,
    pub output_rect: Rect,
    /// Sub-region known to have changed since the last presented frame.
    pub damage_rect: Rect,
    pub quads: Vec<Quad>,
    pub input: Option<PassId>,
    pub effect: Option<PassEffect>,
}

impl RenderPass {
    pub fn new(id: PassId, output_rect: Rect, damage_rect: Rect) -> Self {
        Self {
            id,
            output_rect,
            damage_rect,
            quads: Vec::new(),
            input: None,
            effect: None,
        }
    }
}

/// One composed frame: passes in draw order plus downstream metadata.
///
/// Created by the scene composer, consumed exactly once by the rasterizer,
/// then discarded. The last pass draws to the root target; earlier passes
/// draw to intermediate textures.
#[derive(Clone, Debug)]
pub struct Frame {
    pub passes: Vec<RenderPass>,
    /// Monotonic OR across the traversal; feeds power/latency heuristics
    /// downstream.
    pub may_contain_video: bool,
}

impl Frame {
    /// The pass that draws into the root target.
    pub fn root_pass(&self) -> Option<&RenderPass> {
        self.passes.last()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/pass.rs"]
mod tests;
