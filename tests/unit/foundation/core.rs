use super::*;

#[test]
fn viewport_rejects_zero_dimensions() {
    assert!(Viewport::new(0, 10).is_err());
    assert!(Viewport::new(10, 0).is_err());
    let v = Viewport::new(640, 480).unwrap();
    assert_eq!(v.to_rect(), Rect::new(0.0, 0.0, 640.0, 480.0));
}

#[test]
fn from_straight_rgba_premultiplies() {
    let c = Rgba8Premul::from_straight_rgba(255, 0, 0, 128);
    assert_eq!(c.r, 128);
    assert_eq!(c.g, 0);
    assert_eq!(c.b, 0);
    assert_eq!(c.a, 128);
    assert!(!c.is_opaque());

    let opaque = Rgba8Premul::from_straight_rgba(10, 20, 30, 255);
    assert_eq!(opaque.to_bytes(), [10, 20, 30, 255]);
    assert!(opaque.is_opaque());
}

#[test]
fn union_damage_treats_zero_area_as_empty() {
    let r = Rect::new(10.0, 10.0, 20.0, 20.0);
    assert_eq!(union_damage(Rect::ZERO, r), r);
    assert_eq!(union_damage(r, Rect::ZERO), r);

    let s = Rect::new(0.0, 0.0, 5.0, 5.0);
    assert_eq!(union_damage(r, s), Rect::new(0.0, 0.0, 20.0, 20.0));
}

#[test]
fn ids_order_and_hash() {
    assert!(StreamId(1) < StreamId(2));
    assert!(SurfaceGeneration(3) > SurfaceGeneration(2));
    assert_eq!(WindowId(7), WindowId(7));
    assert_ne!(PassId(1), PassId(2));
}
