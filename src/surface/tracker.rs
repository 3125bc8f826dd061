use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::{StreamId, SurfaceGeneration, WindowId};
use crate::surface::store::{ContentStore, DeliveredSurface, StreamEvent};

/// Pins one delivered surface generation until released.
///
/// Owned exclusively by the tracker; the held `Arc` is what actually keeps
/// the superseded surface's pixels alive after a newer delivery.
#[derive(Clone, Debug)]
pub struct LifetimeToken {
    pub stream: StreamId,
    pub generation: SurfaceGeneration,
    /// Tracker-local monotonic allocation number; a re-reference after a
    /// release always yields a new, distinct token.
    pub sequence: u64,
    surface: Arc<DeliveredSurface>,
}

impl LifetimeToken {
    pub fn surface(&self) -> &Arc<DeliveredSurface> {
        &self.surface
    }
}

/// Tracks one lifetime token per referenced content stream, releasing them
/// when windows stop referencing producers or are destroyed.
///
/// Owned by the composition thread; cross-thread producer teardown arrives
/// through the content store's event queue (see [`Self::process_events`]).
#[derive(Debug, Default)]
pub struct SurfaceLifetimeTracker {
    tokens: HashMap<StreamId, LifetimeToken>,
    /// Streams referenced on behalf of each watched window, so window
    /// destruction can auto-release them. Non-owning observation, not a
    /// parent pointer.
    watched: HashMap<WindowId, Vec<StreamId>>,
    next_sequence: u64,
}

impl SurfaceLifetimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// References `stream` on behalf of `window`.
    ///
    /// Idempotent against the currently-tracked generation: if a token for
    /// this stream already exists and the stream has not advanced, this is a
    /// no-op. If the stream advanced, the stale token is released and a
    /// fresh one is allocated against the current generation — an explicit
    /// two-step, so no re-entrant lookup is needed. A stream with nothing
    /// delivered yet is not referenced at all.
    pub fn reference(&mut self, store: &ContentStore, window: WindowId, stream: StreamId) {
        let Some(current) = store.current(stream) else {
            return;
        };

        if let Some(token) = self.tokens.get(&stream) {
            if token.generation == current.generation {
                return;
            }
            // Stale: the stream advanced since the token was created.
            self.release(stream);
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.tokens.insert(
            stream,
            LifetimeToken {
                stream,
                generation: current.generation,
                sequence,
                surface: Arc::clone(current),
            },
        );

        let streams = self.watched.entry(window).or_default();
        if !streams.contains(&stream) {
            streams.push(stream);
        }
    }

    /// Drops the token for `stream` if present; no-op otherwise.
    pub fn release(&mut self, stream: StreamId) -> bool {
        let released = self.tokens.remove(&stream).is_some();
        if released {
            tracing::trace!(?stream, "released surface lifetime token");
        }
        released
    }

    /// Drops every outstanding token. Used at teardown.
    pub fn release_all(&mut self) {
        self.tokens.clear();
        self.watched.clear();
    }

    /// Auto-release hook for window teardown: every stream referenced on
    /// behalf of `window` is released, so destroyed windows cannot pin a
    /// content stream forever.
    pub fn on_window_destroyed(&mut self, window: WindowId) {
        let Some(streams) = self.watched.remove(&window) else {
            return;
        };
        for stream in streams {
            self.release(stream);
        }
    }

    /// Applies stream teardown events: a removed stream's token is
    /// invalidated silently, with no matching release required.
    pub fn process_events(&mut self, events: &[StreamEvent]) {
        for event in events {
            match *event {
                StreamEvent::Removed(stream) => {
                    if self.tokens.remove(&stream).is_some() {
                        tracing::debug!(?stream, "token invalidated by external stream teardown");
                    }
                }
            }
        }
    }

    pub fn token(&self, stream: StreamId) -> Option<&LifetimeToken> {
        self.tokens.get(&stream)
    }

    pub fn has_token(&self, stream: StreamId) -> bool {
        self.tokens.contains_key(&stream)
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/tracker.rs"]
mod tests;
