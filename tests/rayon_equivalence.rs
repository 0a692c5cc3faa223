#![cfg(feature = "rayon")]

use autotrack::geometry::{Point, SearchWindow};
use autotrack::lowlevel::{Kernel, ScanParams, ZnccMaskedRayon, ZnccMaskedScalar};
use autotrack::{
    MaskGeometry, MaskShape, MaskedTemplatePlan, MatcherConfig, OwnedImage, Template,
    TemplateMatcher,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn make_image(width: usize, height: usize) -> OwnedImage {
    let mut rng = StdRng::seed_from_u64(42);
    let data = (0..width * height).map(|_| rng.random_range(0..=255)).collect();
    OwnedImage::new(data, width, height).unwrap()
}

#[test]
fn parallel_scan_matches_sequential() {
    let image = make_image(160, 120);
    let geometry = MaskGeometry::area(MaskShape::Ellipse, 24, 20).unwrap();
    let tpl = Template::capture(image.view(), Point::new(70.0, 55.0), &geometry).unwrap();
    let plan = MaskedTemplatePlan::from_template(&tpl).unwrap();
    let params = ScanParams {
        topk: 5,
        ..ScanParams::default()
    };

    let seq = ZnccMaskedScalar::scan_roi(image.view(), &plan, 10, 5, 130, 95, params).unwrap();
    let par = ZnccMaskedRayon::scan_roi(image.view(), &plan, 10, 5, 130, 95, params).unwrap();
    assert_eq!(seq, par);
}

#[test]
fn parallel_matcher_matches_sequential() {
    let image = make_image(160, 120);
    let geometry = MaskGeometry::area(MaskShape::Rectangle, 16, 16).unwrap();
    let tpl = Template::capture(image.view(), Point::new(90.0, 40.0), &geometry).unwrap();
    let plan = MaskedTemplatePlan::from_template(&tpl).unwrap();
    let window = SearchWindow::new(40, 10, 100, 80);

    let seq = TemplateMatcher::new()
        .match_area(image.view(), &plan, window)
        .unwrap();
    let par = TemplateMatcher::new()
        .with_config(MatcherConfig {
            parallel: true,
            ..MatcherConfig::default()
        })
        .match_area(image.view(), &plan, window)
        .unwrap();
    assert_eq!(seq, par);
    assert_eq!(seq.map(|m| (m.x, m.y)), Some((82, 32)));
}
