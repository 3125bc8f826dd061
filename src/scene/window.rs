use crate::foundation::core::{Rect, StreamId, Vec2, WindowId};

/// One node of the externally-owned window tree.
///
/// The windowing system owns the hierarchy, visibility, opacity, bounds and
/// z-order; the composer only reads it. Children are z-ordered: the last
/// child is drawn last and therefore on top.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct WindowNode {
    pub id: WindowId,
    /// Bounds in parent coordinates.
    pub bounds: Rect,
    /// Opacity in `[0, 1]`, multiplied down the ancestor chain.
    pub opacity: f32,
    pub visible: bool,
    /// The window's own content channel, if it produces content.
    pub default_stream: Option<StreamId>,
    /// Optional content drawn beneath this window's descendants, positioned
    /// at `bounds.origin - underlay_offset` and sized to the underlay's
    /// last-delivered surface (which may differ from the window bounds).
    pub underlay_stream: Option<StreamId>,
    pub underlay_offset: Vec2,
    pub children: Vec<WindowNode>,
}

impl WindowNode {
    /// A visible, fully opaque window with no content streams.
    pub fn new(id: WindowId, bounds: Rect) -> Self {
        Self {
            id,
            bounds,
            opacity: 1.0,
            visible: true,
            default_stream: None,
            underlay_stream: None,
            underlay_offset: Vec2::ZERO,
            children: Vec::new(),
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_default_stream(mut self, stream: StreamId) -> Self {
        self.default_stream = Some(stream);
        self
    }

    pub fn with_underlay(mut self, stream: StreamId, offset: Vec2) -> Self {
        self.underlay_stream = Some(stream);
        self.underlay_offset = offset;
        self
    }

    pub fn with_child(mut self, child: WindowNode) -> Self {
        self.children.push(child);
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/window.rs"]
mod tests;
