use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::{StreamId, SurfaceGeneration};
use crate::raster::pixmap::Pixmap;

/// One delivery on a content stream: the pixels plus the generation marker
/// that identifies exactly this delivery.
///
/// Stored behind `Arc` so a lifetime token pins the generation it was bound
/// to: delivering a newer surface supersedes this one for future frames but
/// cannot free it while a token still holds the `Arc`.
#[derive(Clone, Debug)]
pub struct DeliveredSurface {
    pub pixels: Pixmap,
    pub generation: SurfaceGeneration,
    pub may_contain_video: bool,
    /// Computed once at delivery; lets the rasterizer pick its blend path
    /// without rescanning the alpha channel per quad.
    pub opaque: bool,
}

/// Stream teardown notifications handed from the store to the lifetime
/// tracker. Producer delivery may run on a different thread than
/// composition; the event queue is the hand-off point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// The producer tore the stream down directly (e.g. its process died).
    Removed(StreamId),
}

#[derive(Debug)]
struct StreamSlot {
    current: Option<Arc<DeliveredSurface>>,
    next_generation: u64,
}

/// In-process registry of content streams and their current delivered
/// surfaces, keyed by stream id.
///
/// The store owns only the *current* surface per stream; superseded
/// generations survive exactly as long as some `LifetimeToken` (or
/// rasterizing frame) still holds their `Arc`.
#[derive(Debug, Default)]
pub struct ContentStore {
    streams: HashMap<StreamId, StreamSlot>,
    events: Vec<StreamEvent>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a new surface on `stream`, superseding the prior one, and
    /// returns the new generation marker.
    pub fn deliver(
        &mut self,
        stream: StreamId,
        pixels: Pixmap,
        may_contain_video: bool,
    ) -> SurfaceGeneration {
        let slot = self.streams.entry(stream).or_insert(StreamSlot {
            current: None,
            next_generation: 1,
        });
        let generation = SurfaceGeneration(slot.next_generation);
        slot.next_generation += 1;
        let opaque = pixels.is_fully_opaque();
        slot.current = Some(Arc::new(DeliveredSurface {
            pixels,
            generation,
            may_contain_video,
            opaque,
        }));
        generation
    }

    /// Tears down a stream (producer death). Queues a [`StreamEvent`] so the
    /// lifetime tracker can invalidate its token without a matching release.
    pub fn remove_stream(&mut self, stream: StreamId) -> bool {
        let removed = self.streams.remove(&stream).is_some();
        if removed {
            self.events.push(StreamEvent::Removed(stream));
        }
        removed
    }

    pub fn has_delivered_surface(&self, stream: StreamId) -> bool {
        self.current(stream).is_some()
    }

    /// The stream's current delivered surface, if any.
    pub fn current(&self, stream: StreamId) -> Option<&Arc<DeliveredSurface>> {
        self.streams.get(&stream)?.current.as_ref()
    }

    pub fn generation(&self, stream: StreamId) -> Option<SurfaceGeneration> {
        self.current(stream).map(|s| s.generation)
    }

    /// Size in pixels of the last-delivered surface.
    pub fn size(&self, stream: StreamId) -> Option<(u32, u32)> {
        self.current(stream)
            .map(|s| (s.pixels.width(), s.pixels.height()))
    }

    pub fn may_contain_video(&self, stream: StreamId) -> bool {
        self.current(stream).is_some_and(|s| s.may_contain_video)
    }

    /// Drains queued teardown events.
    pub fn take_events(&mut self) -> Vec<StreamEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/store.rs"]
mod tests;
