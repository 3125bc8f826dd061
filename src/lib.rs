//! Quadrille is a software window compositor pipeline.
//!
//! It turns an externally-owned window tree plus independently delivered
//! content surfaces into presented pixels via an explicit quad-based
//! render IR.
//!
//! # Pipeline overview
//!
//! 1. **Compose**: `WindowNode tree + ContentStore -> Frame` (ordered quads
//!    per render pass, back-to-front)
//! 2. **Track**: every stream a frame cites is pinned by the
//!    [`SurfaceLifetimeTracker`] so producer teardown cannot invalidate an
//!    in-flight frame
//! 3. **Rasterize**: `Frame -> Pixmap` (CPU backend, premultiplied RGBA8)
//! 4. **Present**: the finished buffer and its damage rect go to a
//!    [`PresentationSink`]
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Coalesced scheduling**: redraw requests never draw synchronously;
//!   damage is unioned into at most one armed draw per presentation cycle.
//! - **Soft per-quad failure**: an undelivered surface or an unrecognized
//!   quad kind degrades to a skip or a fallback fill plus a diagnostic,
//!   never an error.
//! - **Premultiplied RGBA8** end-to-end.
#![forbid(unsafe_code)]

mod foundation;
mod frame;
mod pipeline;
mod raster;
mod scene;
mod surface;

pub use foundation::core::{
    Affine, PassId, Point, Rect, Rgba8Premul, StreamId, SurfaceGeneration, Vec2, Viewport,
    WindowId, union_damage,
};
pub use foundation::error::{QuadrilleError, QuadrilleResult};
pub use frame::pass::{Frame, PassEffect, RenderPass};
pub use frame::quad::{AaHint, BlendMode, Quad, QuadKind, Recording};
pub use pipeline::Compositor;
pub use raster::pixmap::Pixmap;
pub use raster::rasterizer::{QuadRasterizer, RasterDiagnostics, RasterSettings};
pub use raster::sink::{MemorySink, PresentationSink, PresentedFrame};
pub use scene::composer::{ComposerSettings, SceneComposer};
pub use scene::window::WindowNode;
pub use surface::store::{ContentStore, DeliveredSurface, StreamEvent};
pub use surface::tracker::{LifetimeToken, SurfaceLifetimeTracker};
