use std::fmt;
use std::sync::Arc;

use crate::foundation::core::{Affine, Rect, Rgba8Premul, StreamId};
use crate::raster::pixmap::Pixmap;

/// Blend mode for composing a quad into its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Standard source-over alpha compositing.
    #[default]
    SrcOver,
    /// Overwrite destination pixels. Chosen by the rasterizer when a quad is
    /// known fully opaque, never requested by the composer directly.
    Replace,
}

/// Per-quad anti-aliasing hint consumed by the rasterizer's AA policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AaHint {
    /// Decide from the device transform and edge interiority.
    #[default]
    Auto,
    Force,
    Disable,
}

/// Replayable recorded drawing content, supplied by a content producer.
///
/// The rasterizer treats this as a pluggable strategy: playback draws the
/// recording's `content_rect` (scaled by `contents_scale`) into the target
/// pixmap, whose origin coincides with the content rect origin.
pub trait Recording: Send + Sync {
    fn playback(&self, target: &mut Pixmap, content_rect: Rect, contents_scale: f64);
}

/// One drawable primitive emitted by scene composition.
///
/// Quads are immutable once appended to a pass and live only for the frame
/// that owns them.
#[derive(Clone, Debug)]
pub struct Quad {
    /// Destination rect in target space.
    pub rect: Rect,
    /// Visible (clipped) portion of `rect`.
    pub visible_rect: Rect,
    /// Quad-to-target transform.
    pub transform: Affine,
    /// Effective opacity, ancestor opacities already folded in.
    pub opacity: f32,
    /// Requested blend mode.
    pub blend: BlendMode,
    /// Anti-aliasing hint.
    pub anti_alias: AaHint,
    /// True when all four edges are exterior (not shared with a visible
    /// neighbor); interior edges suppress AA to avoid seams.
    pub exterior_edges: bool,
    pub kind: QuadKind,
}

impl Quad {
    /// A quad with identity transform, full visibility and default hints.
    pub fn new(rect: Rect, opacity: f32, kind: QuadKind) -> Self {
        Self {
            rect,
            visible_rect: rect,
            transform: Affine::IDENTITY,
            opacity,
            blend: BlendMode::SrcOver,
            anti_alias: AaHint::Auto,
            exterior_edges: true,
            kind,
        }
    }
}

/// Kind-specific quad payload.
#[derive(Clone)]
pub enum QuadKind {
    SolidColor {
        color: Rgba8Premul,
    },
    /// Image blit from a stream's delivered surface.
    Texture {
        stream: StreamId,
        /// UV sub-rect in source pixels.
        uv: Rect,
        y_flipped: bool,
        /// Blended behind the image when the image itself is not opaque.
        background: Rgba8Premul,
    },
    /// Same blit path as `Texture`, but the stream addresses one tile of a
    /// larger logical surface; `tile_uv` is in the tile's own pixel space.
    Tiled {
        stream: StreamId,
        tile_uv: Rect,
    },
    /// Cached-recording playback.
    Picture {
        recording: Arc<dyn Recording>,
        /// Recorded content rect (recording space).
        content_rect: Rect,
        contents_scale: f64,
        nearest_neighbor: bool,
    },
    /// Composite of another window's independently produced content. The
    /// rasterizer does not recurse: the referenced surface is treated as an
    /// opaque bitmap.
    NestedSurface {
        stream: StreamId,
    },
    DebugBorder {
        color: Rgba8Premul,
        /// Stroke width in device pixels, unaffected by the quad transform.
        width: f64,
    },
    /// Emitted when an upstream producer hands over a quad kind this
    /// rasterizer version does not recognize.
    Unsupported {
        kind: &'static str,
    },
}

impl QuadKind {
    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SolidColor { .. } => "solid_color",
            Self::Texture { .. } => "texture",
            Self::Tiled { .. } => "tiled",
            Self::Picture { .. } => "picture",
            Self::NestedSurface { .. } => "nested_surface",
            Self::DebugBorder { .. } => "debug_border",
            Self::Unsupported { kind } => kind,
        }
    }
}

impl fmt::Debug for QuadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Picture {
                content_rect,
                contents_scale,
                nearest_neighbor,
                ..
            } => f
                .debug_struct("Picture")
                .field("content_rect", content_rect)
                .field("contents_scale", contents_scale)
                .field("nearest_neighbor", nearest_neighbor)
                .finish_non_exhaustive(),
            Self::SolidColor { color } => {
                f.debug_struct("SolidColor").field("color", color).finish()
            }
            Self::Texture {
                stream,
                uv,
                y_flipped,
                background,
            } => f
                .debug_struct("Texture")
                .field("stream", stream)
                .field("uv", uv)
                .field("y_flipped", y_flipped)
                .field("background", background)
                .finish(),
            Self::Tiled { stream, tile_uv } => f
                .debug_struct("Tiled")
                .field("stream", stream)
                .field("tile_uv", tile_uv)
                .finish(),
            Self::NestedSurface { stream } => f
                .debug_struct("NestedSurface")
                .field("stream", stream)
                .finish(),
            Self::DebugBorder { color, width } => f
                .debug_struct("DebugBorder")
                .field("color", color)
                .field("width", width)
                .finish(),
            Self::Unsupported { kind } => {
                f.debug_struct("Unsupported").field("kind", kind).finish()
            }
        }
    }
}
