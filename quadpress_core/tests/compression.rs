//! End-to-end compression runs over real files on disk.

use quadpress_core::{
    find_target_threshold, CompressionSession, ErrorMetric, MetricKind, Quadtree, Raster,
    RasterFormat, Stage,
};
use std::path::{Path, PathBuf};

fn write_png(path: &Path, raster: &Raster) {
    raster.save(path).unwrap();
}

fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Raster {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for _ in 0..width * height {
        data.extend_from_slice(&rgb);
    }
    Raster::from_raw(width, height, 3, data)
}

fn gradient(width: u32, height: u32) -> Raster {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x + y) * 255 / (width + height).max(1)) as u8,
            ]);
        }
    }
    Raster::from_raw(width, height, 3, data)
}

fn configured_session(
    input: &Path,
    output: &Path,
    metric: MetricKind,
    threshold: f64,
) -> CompressionSession {
    let mut session = CompressionSession::new();
    session.set_input_path(input).unwrap();
    session.set_metric(metric);
    session.set_threshold(threshold).unwrap();
    session.set_min_block_size(1).unwrap();
    session.set_output_path(output).unwrap();
    session
}

#[test]
fn solid_image_survives_compression_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("solid.png");
    let output = dir.path().join("solid_out.png");
    write_png(&input, &solid(32, 32, [80, 120, 200]));

    let session = configured_session(&input, &output, MetricKind::Variance, 0.0);
    let report = session.run(|_| {}).unwrap();

    // One uniform block: the tree never subdivides.
    assert_eq!(report.quadtree_node_count, 1);
    assert_eq!(report.quadtree_depth, 0);

    let result = Raster::load(&output).unwrap();
    let original = Raster::load(&input).unwrap();
    assert_eq!(result.data(), original.data());
}

#[test]
fn loose_threshold_produces_smaller_file_than_tight() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("grad.png");
    write_png(&input, &gradient(64, 64));

    let tight_out = dir.path().join("tight.png");
    let tight = configured_session(&input, &tight_out, MetricKind::MeanAbsoluteDeviation, 0.0)
        .run(|_| {})
        .unwrap();

    let loose_out = dir.path().join("loose.png");
    let loose = configured_session(&input, &loose_out, MetricKind::MeanAbsoluteDeviation, 127.5)
        .run(|_| {})
        .unwrap();

    assert!(loose.compressed_size < tight.compressed_size);
    assert!(loose.quadtree_node_count < tight.quadtree_node_count);
}

#[test]
fn every_metric_completes_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("grad.png");
    write_png(&input, &gradient(24, 24));

    for (i, kind) in MetricKind::ALL.into_iter().enumerate() {
        let metric = kind.create();
        // A mid-range threshold for each metric's own scale.
        let threshold = (metric.lower_bound() + metric.upper_bound()) / 2.0;
        let output = dir.path().join(format!("out_{}.png", i));
        let report = configured_session(&input, &output, kind, threshold)
            .run(|_| {})
            .unwrap();
        assert!(output.exists(), "{} produced no output", kind);
        assert_eq!(report.metric, kind.identifier());
    }
}

#[test]
fn target_compression_drives_output_size_down() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("grad.png");
    write_png(&input, &gradient(64, 64));
    let output = dir.path().join("out.png");

    let mut session = CompressionSession::new();
    session.set_input_path(&input).unwrap();
    session.set_metric(MetricKind::Variance);
    session.set_target_compression(0.5).unwrap();
    session.set_min_block_size(1).unwrap();
    session.set_output_path(&output).unwrap();

    let mut stages = Vec::new();
    let report = session.run(|s| stages.push(s)).unwrap();

    assert!(stages.contains(&Stage::FindingTarget));
    assert!(report.tuner_iterations.is_some());
    assert!(output.exists());
    // The search may clamp on small inputs, but never leaves the range.
    let metric = MetricKind::Variance.create();
    assert!(metric.is_in_error_bound(report.threshold));
}

#[test]
fn gif_animation_written_alongside_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("grad.png");
    write_png(&input, &gradient(32, 32));
    let output = dir.path().join("out.png");
    let gif = dir.path().join("anim.gif");

    let mut session = configured_session(&input, &output, MetricKind::MaximumPixelDifference, 30.0);
    session.set_gif_output_path(Some(&gif)).unwrap();
    session.run(|_| {}).unwrap();

    let bytes = std::fs::read(&gif).unwrap();
    assert_eq!(&bytes[0..3], b"GIF");
}

#[test]
fn tuner_standalone_respects_metric_range() {
    let mut raster = gradient(48, 48);
    raster.compute_summed_area_table();
    raster.compute_summed_square_table();

    for kind in [MetricKind::Variance, MetricKind::StructuralSimilarity] {
        let metric = kind.create();
        let outcome =
            find_target_threshold(&raster, metric.as_ref(), 1, 2000, RasterFormat::Png).unwrap();
        assert!(
            metric.is_in_error_bound(outcome.threshold),
            "{} returned {}",
            kind,
            outcome.threshold
        );
    }
}

#[test]
fn quadtree_flatten_matches_session_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("grad.png");
    write_png(&input, &gradient(20, 20));
    let output = dir.path().join("out.png");

    configured_session(&input, &output, MetricKind::Variance, 300.0)
        .run(|_| {})
        .unwrap();

    // Rebuild the same tree by hand and compare pixels.
    let mut raster = Raster::load(&input).unwrap();
    raster.compute_summed_area_table();
    raster.compute_summed_square_table();
    let metric = MetricKind::Variance.create();
    let tree = Quadtree::build(&raster, metric.as_ref(), 300.0, 1);
    let expected = tree.apply(&raster);

    let saved = Raster::load(&output).unwrap();
    assert_eq!(saved.data(), expected.data());
}

#[test]
fn rejected_configuration_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("grad.png");
    write_png(&input, &gradient(8, 8));
    let output = dir.path().join("out.png");

    let mut session = CompressionSession::new();
    session.set_input_path(&input).unwrap();
    session.set_metric(MetricKind::Variance);
    session.set_output_path(&output).unwrap();
    session.set_min_block_size(1).unwrap();
    // No threshold and no target: the run must refuse to start.
    assert!(session.run(|_| {}).is_err());
    assert!(!output.exists());
}

#[test]
fn output_path_keeps_input_family_across_formats() {
    let dir = tempfile::tempdir().unwrap();
    let input: PathBuf = dir.path().join("img.bmp");
    gradient(8, 8).save(&input).unwrap();

    let mut session = CompressionSession::new();
    session.set_input_path(&input).unwrap();
    assert!(session.set_output_path(&dir.path().join("out.bmp")).is_ok());
    assert!(session
        .set_output_path(&dir.path().join("out.png"))
        .is_err());
}
