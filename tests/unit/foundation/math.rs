use super::*;

#[test]
fn scale_rect_proportional_identity_and_half() {
    let output = Rect::new(0.0, 0.0, 100.0, 100.0);
    let input = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(scale_rect_proportional(output, input, input), output);

    let inner = Rect::new(5.0, 5.0, 10.0, 10.0);
    assert_eq!(
        scale_rect_proportional(output, input, inner),
        Rect::new(50.0, 50.0, 100.0, 100.0)
    );
}

#[test]
fn scale_rect_proportional_degenerate_input_passes_output_through() {
    let output = Rect::new(0.0, 0.0, 64.0, 64.0);
    let input = Rect::new(3.0, 3.0, 3.0, 9.0);
    let inner = Rect::new(3.0, 4.0, 3.0, 5.0);
    assert_eq!(scale_rect_proportional(output, input, inner), output);
}

#[test]
fn scale_and_integer_translate_detection() {
    assert!(is_scale_and_integer_translate(Affine::IDENTITY));
    assert!(is_scale_and_integer_translate(Affine::translate((2.0, -3.0))));
    assert!(is_scale_and_integer_translate(
        Affine::scale(2.0).then_translate((4.0, 8.0).into())
    ));

    assert!(!is_scale_and_integer_translate(Affine::translate((1.5, 0.0))));
    assert!(!is_scale_and_integer_translate(Affine::rotate(0.3)));
    assert!(!is_scale_and_integer_translate(Affine::scale_non_uniform(
        -1.0, 1.0
    )));
}

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255(255, 255), 255);
    assert_eq!(mul_div255(0, 200), 0);
    assert_eq!(mul_div255(128, 128), 64);
    assert_eq!(mul_div255(255, 128), 128);
}

#[test]
fn nearly_integer_tolerance() {
    assert!(nearly_integer(4.0));
    assert!(nearly_integer(4.0 + 1e-9));
    assert!(!nearly_integer(4.4));
}
