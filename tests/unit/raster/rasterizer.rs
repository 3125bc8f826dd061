use super::*;
use std::sync::Arc;

use crate::frame::quad::Recording;
use crate::foundation::core::StreamId;
use crate::raster::sink::MemorySink;

const RED: Rgba8Premul = Rgba8Premul {
    r: 255,
    g: 0,
    b: 0,
    a: 255,
};
const BLUE: Rgba8Premul = Rgba8Premul {
    r: 0,
    g: 0,
    b: 255,
    a: 255,
};
const BLACK: [u8; 4] = [0, 0, 0, 255];

fn viewport() -> Viewport {
    Viewport::new(4, 4).unwrap()
}

fn single_pass_frame(quads: Vec<Quad>) -> Frame {
    let output = viewport().to_rect();
    let mut pass = RenderPass::new(PassId(1), output, output);
    pass.quads = quads;
    Frame {
        passes: vec![pass],
        may_contain_video: false,
    }
}

fn draw(frame: &Frame, store: &ContentStore) -> QuadRasterizer {
    let mut raster = QuadRasterizer::new(RasterSettings::default());
    raster.begin_frame(viewport()).unwrap();
    for pass in &frame.passes {
        raster.draw_pass(pass, frame, store).unwrap();
    }
    raster.end_frame(frame).unwrap();
    raster
}

fn root_pixel(raster: &QuadRasterizer, x: u32, y: u32) -> [u8; 4] {
    raster.root_pixels().unwrap().pixel(x, y).unwrap()
}

#[test]
fn binding_state_machine_rejects_out_of_order_calls() {
    let store = ContentStore::new();
    let frame = single_pass_frame(Vec::new());
    let mut raster = QuadRasterizer::new(RasterSettings::default());
    let mut sink = MemorySink::new();

    // Draw before begin: the root target does not exist yet.
    assert!(matches!(
        raster.draw_pass(&frame.passes[0], &frame, &store),
        Err(QuadrilleError::Binding(_))
    ));

    raster.begin_frame(viewport()).unwrap();
    // Present before flush.
    assert!(matches!(
        raster.present(&mut sink),
        Err(QuadrilleError::Binding(_))
    ));

    raster.draw_pass(&frame.passes[0], &frame, &store).unwrap();
    raster.end_frame(&frame).unwrap();
    // A second begin_frame mid-flush is a violation.
    assert!(matches!(
        raster.begin_frame(viewport()),
        Err(QuadrilleError::Binding(_))
    ));

    raster.present(&mut sink).unwrap();
    // Presented is a valid start for the next frame.
    raster.begin_frame(viewport()).unwrap();
}

#[test]
fn root_pass_starts_opaque_black() {
    let store = ContentStore::new();
    let frame = single_pass_frame(Vec::new());
    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 0, 0), BLACK);
}

#[test]
fn solid_color_quad_fills_its_rect() {
    let store = ContentStore::new();
    let frame = single_pass_frame(vec![Quad::new(
        Rect::new(0.0, 0.0, 2.0, 2.0),
        1.0,
        QuadKind::SolidColor { color: RED },
    )]);
    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 1, 1), [255, 0, 0, 255]);
    assert_eq!(root_pixel(&raster, 3, 3), BLACK);
}

#[test]
fn quads_draw_in_emission_order() {
    let store = ContentStore::new();
    let frame = single_pass_frame(vec![
        Quad::new(
            viewport().to_rect(),
            1.0,
            QuadKind::SolidColor { color: RED },
        ),
        Quad::new(
            Rect::new(0.0, 0.0, 2.0, 2.0),
            1.0,
            QuadKind::SolidColor { color: BLUE },
        ),
    ]);
    let raster = draw(&frame, &store);
    // The later quad wins where they overlap.
    assert_eq!(root_pixel(&raster, 0, 0), [0, 0, 255, 255]);
    assert_eq!(root_pixel(&raster, 3, 3), [255, 0, 0, 255]);
}

#[test]
fn visible_rect_limits_the_drawn_area() {
    let store = ContentStore::new();
    let mut quad = Quad::new(
        viewport().to_rect(),
        1.0,
        QuadKind::SolidColor { color: RED },
    );
    quad.visible_rect = Rect::new(0.0, 0.0, 2.0, 4.0);
    let frame = single_pass_frame(vec![quad]);
    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 1, 1), [255, 0, 0, 255]);
    assert_eq!(root_pixel(&raster, 3, 1), BLACK);
}

#[test]
fn half_opacity_solid_blends_over_the_root() {
    let store = ContentStore::new();
    let frame = single_pass_frame(vec![Quad::new(
        viewport().to_rect(),
        0.5,
        QuadKind::SolidColor {
            color: Rgba8Premul::WHITE,
        },
    )]);
    let raster = draw(&frame, &store);
    let [r, g, b, a] = root_pixel(&raster, 1, 1);
    assert_eq!(a, 255);
    assert!((120..=135).contains(&r));
    assert_eq!((r, g), (g, b));
}

#[test]
fn nested_surface_quad_blits_the_delivered_pixels() {
    let mut store = ContentStore::new();
    let s = StreamId(1);
    store.deliver(s, Pixmap::from_fill(4, 4, BLUE), false);

    let frame = single_pass_frame(vec![Quad::new(
        viewport().to_rect(),
        1.0,
        QuadKind::NestedSurface { stream: s },
    )]);
    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 2, 2), [0, 0, 255, 255]);
    assert_eq!(raster.diagnostics().missing_surface_quads, 0);
}

#[test]
fn missing_surface_is_a_soft_skip_with_a_diagnostic() {
    let store = ContentStore::new();
    let frame = single_pass_frame(vec![Quad::new(
        viewport().to_rect(),
        1.0,
        QuadKind::NestedSurface { stream: StreamId(9) },
    )]);
    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 0, 0), BLACK);
    assert_eq!(raster.diagnostics().missing_surface_quads, 1);
}

#[test]
fn texture_quad_blits_its_uv_subrect() {
    let mut store = ContentStore::new();
    let s = StreamId(1);
    let mut src = Pixmap::from_fill(4, 4, RED);
    src.fill_rect(
        Rect::new(2.0, 0.0, 4.0, 4.0),
        BLUE,
        1.0,
        BlendMode::SrcOver,
        src.bounds(),
        false,
    );
    store.deliver(s, src, false);

    let frame = single_pass_frame(vec![Quad::new(
        viewport().to_rect(),
        1.0,
        QuadKind::Texture {
            stream: s,
            uv: Rect::new(2.0, 0.0, 4.0, 4.0),
            y_flipped: false,
            background: Rgba8Premul::TRANSPARENT,
        },
    )]);
    let raster = draw(&frame, &store);
    // Interior pixels: bilinear filtering bleeds across the UV boundary at
    // the very edge, so sample away from it.
    assert_eq!(root_pixel(&raster, 1, 1), [0, 0, 255, 255]);
    assert_eq!(root_pixel(&raster, 3, 3), [0, 0, 255, 255]);
}

#[test]
fn texture_background_shows_through_translucent_content() {
    let mut store = ContentStore::new();
    let s = StreamId(1);
    // Fully transparent content over an opaque red background.
    store.deliver(s, Pixmap::new(4, 4), false);

    let frame = single_pass_frame(vec![Quad::new(
        viewport().to_rect(),
        1.0,
        QuadKind::Texture {
            stream: s,
            uv: Rect::new(0.0, 0.0, 4.0, 4.0),
            y_flipped: false,
            background: RED,
        },
    )]);
    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 1, 1), [255, 0, 0, 255]);
}

#[test]
fn tiled_quad_samples_the_tile_uv() {
    let mut store = ContentStore::new();
    let s = StreamId(1);
    store.deliver(s, Pixmap::from_fill(2, 2, BLUE), false);

    let frame = single_pass_frame(vec![Quad::new(
        viewport().to_rect(),
        1.0,
        QuadKind::Tiled {
            stream: s,
            tile_uv: Rect::new(0.0, 0.0, 2.0, 2.0),
        },
    )]);
    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 3, 3), [0, 0, 255, 255]);
}

struct FillRecording(Rgba8Premul);

impl Recording for FillRecording {
    fn playback(&self, target: &mut Pixmap, _content_rect: Rect, _contents_scale: f64) {
        let bounds = target.bounds();
        target.fill_rect(bounds, self.0, 1.0, BlendMode::SrcOver, bounds, false);
    }
}

#[test]
fn picture_quad_plays_back_the_recording() {
    let store = ContentStore::new();
    let green = Rgba8Premul {
        r: 0,
        g: 255,
        b: 0,
        a: 255,
    };
    let frame = single_pass_frame(vec![Quad::new(
        viewport().to_rect(),
        1.0,
        QuadKind::Picture {
            recording: Arc::new(FillRecording(green)),
            content_rect: Rect::new(0.0, 0.0, 4.0, 4.0),
            contents_scale: 1.0,
            nearest_neighbor: true,
        },
    )]);
    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 2, 2), [0, 255, 0, 255]);
}

#[test]
fn debug_border_strokes_the_quad_outline() {
    let store = ContentStore::new();
    let frame = single_pass_frame(vec![Quad::new(
        Rect::new(0.0, 0.0, 4.0, 4.0),
        1.0,
        QuadKind::DebugBorder {
            color: RED,
            width: 1.0,
        },
    )]);
    let raster = draw(&frame, &store);
    let [r, _, _, _] = root_pixel(&raster, 2, 0);
    assert!(r > 0);
    assert_eq!(root_pixel(&raster, 2, 2), BLACK);
}

#[test]
fn unsupported_quads_fall_back_and_count_per_kind() {
    let store = ContentStore::new();
    let frame = single_pass_frame(vec![
        Quad::new(
            Rect::new(0.0, 0.0, 2.0, 2.0),
            1.0,
            QuadKind::Unsupported { kind: "yuv_video" },
        ),
        Quad::new(
            Rect::new(2.0, 2.0, 4.0, 4.0),
            1.0,
            QuadKind::Unsupported { kind: "yuv_video" },
        ),
    ]);
    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 0, 0), unsupported_fill_color().to_bytes());
    assert_eq!(raster.diagnostics().unsupported_quads, 2);
    assert_eq!(raster.diagnostics().unsupported_by_kind.get("yuv_video"), Some(&2));
}

#[test]
fn invert_effect_reads_the_earlier_pass() {
    let store = ContentStore::new();
    let output = viewport().to_rect();

    let mut base = RenderPass::new(PassId(1), output, output);
    base.quads.push(Quad::new(
        output,
        1.0,
        QuadKind::SolidColor { color: RED },
    ));
    let mut post = RenderPass::new(PassId(2), output, output);
    post.input = Some(PassId(1));
    post.effect = Some(PassEffect::Invert);
    let frame = Frame {
        passes: vec![base, post],
        may_contain_video: false,
    };

    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 1, 1), [0, 255, 255, 255]);
}

#[test]
fn present_swaps_the_damage_rect_when_partial_swap_is_on() {
    let store = ContentStore::new();
    let output = viewport().to_rect();
    let mut pass = RenderPass::new(PassId(1), output, Rect::new(0.0, 0.0, 2.0, 2.0));
    pass.quads.push(Quad::new(
        Rect::new(0.0, 0.0, 2.0, 2.0),
        1.0,
        QuadKind::SolidColor { color: RED },
    ));
    let frame = Frame {
        passes: vec![pass],
        may_contain_video: false,
    };

    let mut raster = draw(&frame, &store);
    let mut sink = MemorySink::new();
    raster.present(&mut sink).unwrap();
    assert_eq!(sink.last().unwrap().damage, Rect::new(0.0, 0.0, 2.0, 2.0));
}

#[test]
fn present_without_partial_swap_covers_the_viewport() {
    let store = ContentStore::new();
    let output = viewport().to_rect();
    let pass = RenderPass::new(PassId(1), output, Rect::new(0.0, 0.0, 1.0, 1.0));
    let frame = Frame {
        passes: vec![pass],
        may_contain_video: false,
    };

    let mut raster = QuadRasterizer::new(RasterSettings {
        partial_swap: false,
        ..RasterSettings::default()
    });
    raster.begin_frame(viewport()).unwrap();
    raster.draw_pass(&frame.passes[0], &frame, &store).unwrap();
    raster.end_frame(&frame).unwrap();

    let mut sink = MemorySink::new();
    raster.present(&mut sink).unwrap();
    assert_eq!(sink.last().unwrap().damage, output);
}

#[test]
fn present_failure_keeps_the_frame_flushed_for_retry() {
    let store = ContentStore::new();
    let frame = single_pass_frame(Vec::new());
    let mut raster = draw(&frame, &store);
    let mut sink = MemorySink::new();

    sink.fail_next = true;
    assert!(matches!(
        raster.present(&mut sink),
        Err(QuadrilleError::Presentation(_))
    ));
    // Still flushed: a retry succeeds.
    raster.present(&mut sink).unwrap();
    assert_eq!(sink.frames.len(), 1);
}

#[test]
fn fractional_translate_feathers_the_edge_integer_translate_snaps() {
    let store = ContentStore::new();
    let mut quad = Quad::new(
        Rect::new(0.0, 0.0, 2.0, 2.0),
        1.0,
        QuadKind::SolidColor { color: RED },
    );
    quad.transform = Affine::translate((0.5, 0.0));
    let raster = draw(&single_pass_frame(vec![quad.clone()]), &store);
    // Half-covered boundary pixel gets fractional coverage.
    let [r, _, _, _] = root_pixel(&raster, 2, 0);
    assert!(r > 0 && r < 255, "expected feathered edge, got r={r}");

    quad.transform = Affine::translate((1.0, 0.0));
    let raster = draw(&single_pass_frame(vec![quad]), &store);
    // Pixel-aligned: hard edge, no feathering on either side.
    assert_eq!(root_pixel(&raster, 2, 0), [255, 0, 0, 255]);
    assert_eq!(root_pixel(&raster, 3, 0), BLACK);
    assert_eq!(root_pixel(&raster, 0, 0), BLACK);
}

#[test]
fn interior_edges_suppress_feathering() {
    let store = ContentStore::new();
    let mut quad = Quad::new(
        Rect::new(0.0, 0.0, 2.0, 2.0),
        1.0,
        QuadKind::SolidColor { color: RED },
    );
    quad.transform = Affine::translate((0.5, 0.0));
    quad.exterior_edges = false;
    let raster = draw(&single_pass_frame(vec![quad]), &store);
    // Shared-edge quads snap to whole pixels instead of feathering, so
    // abutting neighbors cannot produce seams.
    assert_eq!(root_pixel(&raster, 2, 0), [255, 0, 0, 255]);
    assert_eq!(root_pixel(&raster, 0, 0), BLACK);
}

#[test]
fn aa_hints_override_the_automatic_policy() {
    let store = ContentStore::new();

    // Auto on a pixel-aligned transform snaps the fractional rect edge.
    let quad = Quad::new(
        Rect::new(0.0, 0.0, 1.5, 1.0),
        1.0,
        QuadKind::SolidColor { color: RED },
    );
    let raster = draw(&single_pass_frame(vec![quad.clone()]), &store);
    assert_eq!(root_pixel(&raster, 1, 0), [255, 0, 0, 255]);

    // Force feathers it even though the transform is pixel-aligned.
    let mut forced = quad;
    forced.anti_alias = AaHint::Force;
    let raster = draw(&single_pass_frame(vec![forced]), &store);
    let [r, _, _, _] = root_pixel(&raster, 1, 0);
    assert!(r > 0 && r < 255, "expected feathered edge, got r={r}");

    // Disable wins over a transform that would otherwise feather.
    let mut disabled = Quad::new(
        Rect::new(0.0, 0.0, 2.0, 2.0),
        1.0,
        QuadKind::SolidColor { color: RED },
    );
    disabled.transform = Affine::translate((0.5, 0.0));
    disabled.anti_alias = AaHint::Disable;
    let raster = draw(&single_pass_frame(vec![disabled]), &store);
    assert_eq!(root_pixel(&raster, 2, 0), [255, 0, 0, 255]);
}

#[test]
fn texture_background_layers_once_at_fractional_alpha() {
    let mut store = ContentStore::new();
    let s = StreamId(1);
    // Half-transparent blue content over an opaque red background.
    store.deliver(
        s,
        Pixmap::from_fill(4, 4, Rgba8Premul::from_straight_rgba(0, 0, 255, 128)),
        false,
    );

    let frame = single_pass_frame(vec![Quad::new(
        viewport().to_rect(),
        0.5,
        QuadKind::Texture {
            stream: s,
            uv: Rect::new(0.0, 0.0, 4.0, 4.0),
            y_flipped: false,
            background: RED,
        },
    )]);
    let raster = draw(&frame, &store);
    // Background and image blend at full alpha in one layer first; the
    // layer then composites once at the quad alpha. Naive alpha-under-alpha
    // would darken the background twice and land well below this.
    let [r, g, b, a] = root_pixel(&raster, 2, 2);
    assert_eq!(a, 255);
    assert_eq!(g, 0);
    assert!((60..=68).contains(&r), "r={r}");
    assert!((60..=68).contains(&b), "b={b}");
}

#[test]
fn invert_pass_turns_uncovered_background_white() {
    let store = ContentStore::new();
    let output = viewport().to_rect();

    let base = RenderPass::new(PassId(1), output, output);
    let mut post = RenderPass::new(PassId(2), output, output);
    post.input = Some(PassId(1));
    post.effect = Some(PassEffect::Invert);
    let frame = Frame {
        passes: vec![base, post],
        may_contain_video: false,
    };

    // The base pass starts opaque like the root, so inverting an empty
    // frame yields white, not a black hole.
    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 1, 1), [255, 255, 255, 255]);
}

#[test]
fn offset_texture_pass_draws_in_its_own_space() {
    let store = ContentStore::new();
    let texture_rect = Rect::new(10.0, 10.0, 14.0, 14.0);

    let mut base = RenderPass::new(PassId(1), texture_rect, texture_rect);
    base.quads.push(Quad::new(
        texture_rect,
        1.0,
        QuadKind::SolidColor { color: RED },
    ));
    let output = viewport().to_rect();
    let mut post = RenderPass::new(PassId(2), output, output);
    post.input = Some(PassId(1));
    post.effect = Some(PassEffect::Invert);
    let frame = Frame {
        passes: vec![base, post],
        may_contain_video: false,
    };

    // Quad geometry is normalized by the pass origin, so the quad lands in
    // the texture's own space rather than offset out of the buffer.
    let raster = draw(&frame, &store);
    assert_eq!(root_pixel(&raster, 1, 1), [0, 255, 255, 255]);
}

#[test]
fn visibility_toggles_the_sink_backbuffer() {
    let mut raster = QuadRasterizer::new(RasterSettings::default());
    let mut sink = MemorySink::new();
    assert!(raster.is_visible());

    raster.set_visible(false, &mut sink);
    assert!(!sink.has_backbuffer());
    // Idempotent.
    raster.set_visible(false, &mut sink);
    assert!(!sink.has_backbuffer());

    raster.set_visible(true, &mut sink);
    assert!(sink.has_backbuffer());
}
