use super::*;
use crate::foundation::core::Rgba8Premul;

fn opaque_pixmap(w: u32, h: u32) -> Pixmap {
    Pixmap::from_fill(w, h, Rgba8Premul::WHITE)
}

#[test]
fn deliver_assigns_monotonic_generations_per_stream() {
    let mut store = ContentStore::new();
    let a = StreamId(1);
    let b = StreamId(2);

    assert_eq!(store.deliver(a, opaque_pixmap(2, 2), false), SurfaceGeneration(1));
    assert_eq!(store.deliver(a, opaque_pixmap(2, 2), false), SurfaceGeneration(2));
    // Generations are per stream, not global.
    assert_eq!(store.deliver(b, opaque_pixmap(2, 2), false), SurfaceGeneration(1));

    assert_eq!(store.generation(a), Some(SurfaceGeneration(2)));
    assert_eq!(store.generation(b), Some(SurfaceGeneration(1)));
}

#[test]
fn opaque_flag_is_computed_at_delivery() {
    let mut store = ContentStore::new();
    let s = StreamId(1);

    store.deliver(s, opaque_pixmap(2, 2), false);
    assert!(store.current(s).unwrap().opaque);

    store.deliver(s, Pixmap::new(2, 2), false);
    assert!(!store.current(s).unwrap().opaque);
}

#[test]
fn size_and_video_flag_track_the_current_surface() {
    let mut store = ContentStore::new();
    let s = StreamId(1);
    assert_eq!(store.size(s), None);
    assert!(!store.may_contain_video(s));

    store.deliver(s, opaque_pixmap(8, 4), true);
    assert_eq!(store.size(s), Some((8, 4)));
    assert!(store.may_contain_video(s));
    assert!(store.has_delivered_surface(s));
}

#[test]
fn remove_stream_queues_one_event_and_take_drains() {
    let mut store = ContentStore::new();
    let s = StreamId(1);
    store.deliver(s, opaque_pixmap(1, 1), false);

    assert!(store.remove_stream(s));
    assert!(!store.has_delivered_surface(s));
    // Removing an unknown stream queues nothing.
    assert!(!store.remove_stream(StreamId(99)));

    assert_eq!(store.take_events(), vec![StreamEvent::Removed(s)]);
    assert!(store.take_events().is_empty());
}

#[test]
fn superseded_surface_survives_while_its_arc_is_held() {
    let mut store = ContentStore::new();
    let s = StreamId(1);
    store.deliver(s, opaque_pixmap(1, 1), false);
    let pinned = Arc::clone(store.current(s).unwrap());

    store.deliver(s, Pixmap::new(3, 3), false);
    assert_eq!(store.size(s), Some((3, 3)));
    // The pinned generation still holds its own pixels.
    assert_eq!(pinned.generation, SurfaceGeneration(1));
    assert_eq!(pinned.pixels.width(), 1);
}
