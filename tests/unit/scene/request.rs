use serde_json::json;

use super::*;

fn src() -> ImageSource {
    ImageSource::bytes(vec![0u8; 4])
}

#[test]
fn transform_parse_accepts_none_and_six_numbers() {
    assert_eq!(Transform::parse("none").unwrap(), Transform::Identity);
    assert_eq!(Transform::parse("  ").unwrap(), Transform::Identity);
    assert_eq!(
        Transform::parse("1 0 0 1 10 -5").unwrap(),
        Transform::Matrix([1.0, 0.0, 0.0, 1.0, 10.0, -5.0])
    );
    assert_eq!(
        Transform::parse("0.5, 0, 0, 0.5,0,0").unwrap(),
        Transform::Matrix([0.5, 0.0, 0.0, 0.5, 0.0, 0.0])
    );
}

#[test]
fn transform_parse_rejects_wrong_arity_and_junk() {
    for bad in ["1 0 0 1 0", "1 0 0 1 0 0 0", "1 0 0 1 0 x", "inf 0 0 1 0 0", "1 0 0 NaN 0 0"] {
        let err = Transform::parse(bad).unwrap_err();
        assert!(matches!(err, MemeError::InvalidTransform(_)), "{bad}: {err}");
    }
}

#[test]
fn transform_serde_accepts_string_or_array() {
    let t: Transform = serde_json::from_value(json!("2 0 0 2 0 0")).unwrap();
    assert_eq!(t, Transform::Matrix([2.0, 0.0, 0.0, 2.0, 0.0, 0.0]));

    let t: Transform = serde_json::from_value(json!([1, 0, 0, 1, 3, 4])).unwrap();
    assert_eq!(t, Transform::Matrix([1.0, 0.0, 0.0, 1.0, 3.0, 4.0]));

    assert!(serde_json::from_value::<Transform>(json!([1, 0, 0])).is_err());
    assert_eq!(serde_json::to_value(Transform::Identity).unwrap(), json!("none"));
}

#[test]
fn transform_to_affine_keeps_coefficient_order() {
    let t = Transform::Matrix([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(t.to_affine().as_coeffs(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(Transform::Identity.to_affine(), Affine::IDENTITY);
    assert!(Transform::Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]).is_identity());
    assert!(!t.is_identity());
}

#[test]
fn band_validation_checks_size_and_position() {
    assert!(TextBand::new("A", 30.0, 0.0).validate().is_ok());
    assert!(TextBand::new("A", 30.0, 100.0).validate().is_ok());

    for band in [
        TextBand::new("A", 0.0, 10.0),
        TextBand::new("A", -4.0, 10.0),
        TextBand::new("A", f32::INFINITY, 10.0),
        TextBand::new("A", 30.0, -0.5),
        TextBand::new("A", 30.0, 100.5),
        TextBand::new("A", 30.0, f32::NAN),
    ] {
        assert!(matches!(band.validate(), Err(MemeError::Validation(_))));
    }
}

#[test]
fn stroke_width_is_one_twentieth_of_font_size() {
    assert_eq!(TextBand::new("A", 40.0, 10.0).stroke_width_px(), 2.0);
    assert_eq!(TextBand::new("A", 50.0, 10.0).stroke_width_px(), 2.5);
}

#[test]
fn empty_bands_are_skipped_and_not_validated() {
    let req = RenderRequest::new(src())
        .with_top(TextBand::new("", -1.0, 500.0))
        .with_bottom(TextBand::new("BOTTOM", 20.0, 10.0));

    let drawn: Vec<_> = req.drawable_bands().map(|(edge, _)| edge).collect();
    assert_eq!(drawn, vec![BandEdge::Bottom]);
    assert!(req.validate().is_ok());
}

#[test]
fn request_validation_names_the_failing_band() {
    let req = RenderRequest::new(src()).with_bottom(
        TextBand::new("X", 20.0, 10.0)
            .with_transform(Transform::Matrix([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0])),
    );
    let err = req.validate().unwrap_err();
    assert!(matches!(err, MemeError::InvalidTransform(ref m) if m.starts_with("bottom band")));
}

#[test]
fn request_json_defaults_colors_transform_and_filter() {
    let req: RenderRequest = serde_json::from_value(json!({
        "image_source": {"url": "https://example.com/cat.png"},
        "top_band": {"text": "TOP", "font_size_px": 40, "position_percent": 10},
        "bottom_band": {
            "text": "BOTTOM",
            "font_size_px": 40,
            "position_percent": 10,
            "fill_color": "yellow",
            "stroke_color": "#000",
            "transform": "1 0 0 1 0 -8"
        },
        "filter": "grayscale(50%)"
    }))
    .unwrap();

    let top = req.top_band.as_ref().unwrap();
    assert_eq!(top.fill_color, Color::WHITE);
    assert_eq!(top.stroke_color, Color::BLACK);
    assert_eq!(top.transform, Transform::Identity);

    let bottom = req.bottom_band.as_ref().unwrap();
    assert_eq!(bottom.fill_color, Color::rgb(255, 255, 0));
    assert_eq!(
        bottom.transform,
        Transform::Matrix([1.0, 0.0, 0.0, 1.0, 0.0, -8.0])
    );
    assert!(!req.filter.is_none());
    assert!(req.validate().is_ok());
}

#[test]
fn request_json_rejects_malformed_transform_and_unknown_filter() {
    let bad_transform = json!({
        "image_source": {"bytes": "AQID"},
        "top_band": {"text": "T", "font_size_px": 10, "position_percent": 5, "transform": "1 2 3"}
    });
    assert!(serde_json::from_value::<RenderRequest>(bad_transform).is_err());

    let bad_filter = json!({
        "image_source": {"bytes": "AQID"},
        "filter": "vaporwave"
    });
    assert!(serde_json::from_value::<RenderRequest>(bad_filter).is_err());
}
