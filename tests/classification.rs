mod common;

use common::{FRAME, GREY, LEAF, frame_with_marked_pixels, solid, solid_frame, split_scene};
use green_view::core_modules::channel::ChannelArray;
use green_view::core_modules::pixel::pixel::Pixel;
use green_view::{
    ClassifierConfig, ColorImage, GreenViewError, GreenViewPipeline, PipelineConfig, Segmentation,
    Segmenter, VegetationClassifier, classify_vegetation, select_threshold,
};
use std::sync::Arc;

#[test]
fn black_and_white_arrays_use_fallback() {
    let black = ChannelArray::from_fn(FRAME, FRAME, |_, _| 0.0);
    let white = ChannelArray::from_fn(FRAME, FRAME, |_, _| 1.0);
    assert_eq!(select_threshold(&black, 0.1).unwrap(), 0.1);
    assert_eq!(select_threshold(&white, 0.1).unwrap(), 0.1);
    assert_eq!(select_threshold(&white, 0.37).unwrap(), 0.37);
}

#[test]
fn bimodal_threshold_separates_populations() {
    let array = ChannelArray::from_fn(FRAME, FRAME, |x, _| if x < FRAME / 2 { 0.1 } else { 0.9 });
    let threshold = select_threshold(&array, 0.5).unwrap();
    assert!(threshold > 0.1 && threshold < 0.9, "threshold {}", threshold);
}

#[test]
fn classifier_threshold_is_always_clamped() {
    let images = [
        solid_frame(LEAF),
        solid_frame(GREY),
        frame_with_marked_pixels(5000, LEAF),
        split_scene(FRAME, FRAME, GREY, Pixel::new(0.3, 0.7, 0.3)),
    ];
    let classifier = VegetationClassifier::default();
    let mut saw_raw_above = false;
    let mut saw_raw_below = false;
    for image in &images {
        let report = classifier.classify(image).unwrap();
        assert!((0.05..=0.10).contains(&report.threshold), "threshold {}", report.threshold);
        saw_raw_above |= report.raw_threshold > 0.10;
        saw_raw_below |= report.raw_threshold < 0.05;
    }
    assert!(saw_raw_above);
    assert!(saw_raw_below);
}

#[test]
fn classification_is_idempotent() {
    let image = frame_with_marked_pixels(12_345, LEAF);
    let before = image.clone();
    let first = classify_vegetation(&image).unwrap();
    let second = classify_vegetation(&image).unwrap();
    assert_eq!(first, second);
    assert_eq!(image, before);
}

#[test]
fn saturated_green_frame_is_all_vegetation() {
    let report = VegetationClassifier::default().classify(&solid_frame(LEAF)).unwrap();
    assert_eq!(report.plausible_pixels, FRAME * FRAME);
    assert_eq!(report.percentage, 100.0);
}

#[test]
fn near_white_frame_has_no_vegetation() {
    let report = VegetationClassifier::default()
        .classify(&solid_frame(Pixel::new(0.9, 0.9, 0.9)))
        .unwrap();
    assert_eq!(report.plausible_pixels, 0);
    assert_eq!(report.shadow_pixels, 0);
    assert_eq!(report.percentage, 0.0);
}

#[test]
fn black_frame_is_shadow_without_vegetation() {
    let report = VegetationClassifier::default()
        .classify(&solid_frame(Pixel::new(0.0, 0.0, 0.0)))
        .unwrap();
    assert_eq!(report.shadow_pixels, FRAME * FRAME);
    assert_eq!(report.percentage, 0.0);
}

#[test]
fn red_limit_is_strict() {
    let percentage = |red: f64| classify_vegetation(&solid_frame(Pixel::new(red, 0.8, 0.1))).unwrap();
    assert_eq!(percentage(0.6), 0.0);
    assert_eq!(percentage(0.599999), 100.0);
    assert_eq!(percentage(0.600001), 0.0);
}

#[test]
fn percentage_follows_mask_count() {
    let marked = 1234;
    let report = VegetationClassifier::default()
        .classify(&frame_with_marked_pixels(marked, LEAF))
        .unwrap();
    assert_eq!(report.vegetation_pixels, marked);
    assert_eq!(report.mask.count(), marked);
    assert_eq!(report.percentage, 100.0 * marked as f64 / (FRAME * FRAME) as f64);
}

#[test]
fn pipeline_segments_then_classifies() {
    let config = PipelineConfig {
        classifier: ClassifierConfig {
            expected_pixel_count: 40 * 40,
            ..ClassifierConfig::default()
        },
        ..PipelineConfig::default()
    };
    let pipeline = GreenViewPipeline::new(&config).unwrap();
    let scene = split_scene(40, 40, Pixel::new(0.15, 0.55, 0.1), Pixel::new(0.6, 0.6, 0.65));

    let analysis = pipeline.analyze(&scene).unwrap();

    assert_eq!(pipeline.segmenter_name(), "mean_shift");
    assert_eq!(analysis.segmentation.region_count, 2);
    assert_eq!(analysis.percentage(), 50.0);
}

/// Claims two regions but labels every pixel with the first.
struct EmptyRegionSegmenter;

impl Segmenter for EmptyRegionSegmenter {
    fn name(&self) -> &'static str {
        "empty_region"
    }

    fn segment(&self, image: &ColorImage) -> green_view::Result<Segmentation> {
        Ok(Segmentation {
            segmented: image.clone(),
            labels: vec![0; image.pixel_count()],
            region_count: 2,
        })
    }
}

#[test]
fn segmenter_contract_violation_is_fatal() {
    let pipeline = GreenViewPipeline::with_segmenter(
        Arc::new(EmptyRegionSegmenter),
        VegetationClassifier::default(),
    );
    let result = pipeline.analyze(&solid(8, 8, LEAF));
    assert!(matches!(result, Err(GreenViewError::SegmenterContract(_))));
}

#[test]
fn non_normalized_input_is_rejected() {
    assert!(matches!(
        ColorImage::filled(4, 4, Pixel::new(f64::NAN, 0.5, 0.5)),
        Err(GreenViewError::InvalidInput(_))
    ));
}
