//! End-to-end tests driving report construction through the frame store.

use chronostat::prelude::*;

fn config() -> ReportConfig {
    ReportConfig::default()
        .with_bitrate(4)
        .with_histogram(HistogramSpec {
            range: (-2.0, 2.0),
            num_bins: 8,
        })
}

fn nominal_block() -> SampleBlock {
    SampleBlock::from_rows(vec![
        vec![0.1, 0.2, -0.1, 0.0],
        vec![0.1, 0.3, -0.2, 0.1],
        vec![0.0, 0.2, -0.1, 0.0],
    ])
    .unwrap()
}

fn spiky_block() -> SampleBlock {
    SampleBlock::from_rows(vec![vec![0.1, 1.9, -0.1, 0.0]]).unwrap()
}

fn window(start: f64) -> IntervalSet {
    IntervalSet::from_range(start, start + 64.0).unwrap()
}

fn store_with(frames: &[(f64, SampleBlock)]) -> InMemoryFrameStore {
    let mut store = InMemoryFrameStore::new(FrameSpec::default());
    for (start, block) in frames {
        store.insert("X1:SYS-TIMING", *start as i64, block.clone());
    }
    store
}

#[test]
fn loaded_window_goes_into_the_nominal_partition() {
    let store = store_with(&[(0.0, nominal_block())]);
    let set = ReportSet::from_channel_and_window(
        ReportKind::IrigB,
        "X1:SYS-TIMING",
        &window(0.0),
        &store,
        &NeverAnomalous,
        &config(),
    )
    .unwrap();

    set.self_consistent().unwrap();
    assert_eq!(set.time_intervals(), &window(0.0));
    assert!(set.missing_times().is_empty());
    assert_eq!(set.report_sans_anomalies(), set.report());
    assert!(set.report_anomalies_only().time_intervals().is_empty());
    assert_eq!(set.report().histogram().total_count(), 12);
}

#[test]
fn flagged_window_goes_into_the_anomalous_partition() {
    let store = store_with(&[(0.0, spiky_block())]);
    let predicate = ThresholdPredicate::new(1.0);
    let set = ReportSet::from_channel_and_window(
        ReportKind::DuoTone,
        "X1:SYS-TIMING",
        &window(0.0),
        &store,
        &predicate,
        &config(),
    )
    .unwrap();

    assert_eq!(set.report_anomalies_only(), set.report());
    assert!(set.report_sans_anomalies().time_intervals().is_empty());
}

#[test]
fn missing_window_is_recorded_not_fatal() {
    let store = store_with(&[]);
    let set = ReportSet::from_channel_and_window(
        ReportKind::IrigB,
        "X1:SYS-TIMING",
        &window(0.0),
        &store,
        &NeverAnomalous,
        &config(),
    )
    .unwrap();

    set.self_consistent().unwrap();
    assert_eq!(set.missing_times(), &window(0.0));
    assert_eq!(set.time_intervals(), &window(0.0));
    assert!(set.report().time_intervals().is_empty());
    assert_eq!(set.report().statistics().count(), 0);
}

#[test]
fn misaligned_window_is_a_caller_error() {
    let store = store_with(&[(0.0, nominal_block())]);
    let bad = IntervalSet::from_range(1.0, 65.0).unwrap();
    let err = ReportSet::from_channel_and_window(
        ReportKind::IrigB,
        "X1:SYS-TIMING",
        &bad,
        &store,
        &NeverAnomalous,
        &config(),
    )
    .unwrap_err();
    assert!(matches!(err, ChronostatError::NotFrameAligned(_)));
}

#[test]
fn disjoint_report_sets_union_and_keep_the_partition() {
    let store = store_with(&[(0.0, nominal_block()), (64.0, spiky_block())]);
    let predicate = ThresholdPredicate::new(1.0);
    let first = ReportSet::from_channel_and_window(
        ReportKind::IrigB,
        "X1:SYS-TIMING",
        &window(0.0),
        &store,
        &predicate,
        &config(),
    )
    .unwrap();
    let second = ReportSet::from_channel_and_window(
        ReportKind::IrigB,
        "X1:SYS-TIMING",
        &window(64.0),
        &store,
        &predicate,
        &config(),
    )
    .unwrap();

    let merged = first.union(&second).unwrap();
    merged.self_consistent().unwrap();
    assert_eq!(
        merged.time_intervals(),
        &IntervalSet::from_range(0.0, 128.0).unwrap()
    );
    assert_eq!(merged.report_sans_anomalies().time_intervals(), &window(0.0));
    assert_eq!(
        merged.report_anomalies_only().time_intervals(),
        &window(64.0)
    );
    assert_eq!(
        merged.report().statistics().count(),
        first.report().statistics().count() + second.report().statistics().count()
    );
}

#[test]
fn merging_a_set_with_itself_is_double_counting() {
    let store = store_with(&[(0.0, nominal_block())]);
    let set = ReportSet::from_channel_and_window(
        ReportKind::IrigB,
        "X1:SYS-TIMING",
        &window(0.0),
        &store,
        &NeverAnomalous,
        &config(),
    )
    .unwrap();
    let err = set.union(&set).unwrap_err();
    assert!(matches!(err, ChronostatError::OverlappingCoverage(_)));
}

#[test]
fn sets_from_different_channels_do_not_union() {
    let mut store = InMemoryFrameStore::new(FrameSpec::default());
    store.insert("X1:SYS-TIMING", 0, nominal_block());
    store.insert("Y1:SYS-TIMING", 64, nominal_block());
    let a = ReportSet::from_channel_and_window(
        ReportKind::IrigB,
        "X1:SYS-TIMING",
        &window(0.0),
        &store,
        &NeverAnomalous,
        &config(),
    )
    .unwrap();
    let b = ReportSet::from_channel_and_window(
        ReportKind::IrigB,
        "Y1:SYS-TIMING",
        &window(64.0),
        &store,
        &NeverAnomalous,
        &config(),
    )
    .unwrap();
    let err = a.union(&b).unwrap_err();
    assert!(matches!(err, ChronostatError::IncompatibleUnion(_)));
}

#[test]
fn report_folds_in_later_frames() {
    let report = Report::from_samples(
        ReportKind::IrigB,
        &nominal_block(),
        &window(0.0),
        &config(),
    )
    .unwrap();
    let grown = report.fold_in(&spiky_block(), &window(64.0)).unwrap();
    assert_eq!(
        grown.time_intervals(),
        &IntervalSet::from_range(0.0, 128.0).unwrap()
    );
    assert_eq!(grown.statistics().count(), 4);

    let err = grown.fold_in(&nominal_block(), &window(64.0)).unwrap_err();
    assert!(matches!(err, ChronostatError::OverlappingCoverage(_)));
}

#[test]
fn report_dict_round_trip_is_exact() {
    let report = Report::from_samples(
        ReportKind::DuoTone,
        &nominal_block(),
        &window(0.0),
        &config(),
    )
    .unwrap();
    let back = Report::from_dict(&report.to_dict()).unwrap();
    assert_eq!(back, report);
}

#[test]
fn report_set_dict_round_trip_is_exact() {
    let store = store_with(&[(0.0, nominal_block())]);
    let set = ReportSet::from_channel_and_window(
        ReportKind::IrigB,
        "X1:SYS-TIMING",
        &window(0.0),
        &store,
        &NeverAnomalous,
        &config(),
    )
    .unwrap();
    let back = ReportSet::from_dict(&set.to_dict()).unwrap();
    assert_eq!(back, set);
}

#[test]
fn report_set_persists_through_the_file_store() {
    let store = store_with(&[(0.0, nominal_block())]);
    let set = ReportSet::from_channel_and_window(
        ReportKind::IrigB,
        "X1:SYS-TIMING",
        &window(0.0),
        &store,
        &NeverAnomalous,
        &config(),
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let reports = FileSystemReportStore::new(dir.path()).unwrap();
    reports.save("X1_SYS-TIMING_000", &set.to_dict()).unwrap();

    match reports.load("X1_SYS-TIMING_000").unwrap() {
        AggregateValue::ReportSet(loaded) => assert_eq!(loaded, set),
        other => panic!("expected a report set, got {}", other.class_tag()),
    }

    let err = reports
        .save("X1_SYS-TIMING_000", &set.to_dict())
        .unwrap_err();
    assert!(matches!(err, ChronostatError::DestinationExists(_)));
}
