use serde_json::json;

use crate::aggregates::contract::{DictSerializable, Unionable};
use crate::aggregates::{Histogram, Statistics};
use crate::config::HistogramSpec;
use crate::errors::ChronostatError;
use crate::samples::SampleBlock;

fn spec() -> HistogramSpec {
    HistogramSpec {
        range: (-2.0, 2.0),
        num_bins: 4,
    }
}

fn block(rows: Vec<Vec<f64>>) -> SampleBlock {
    SampleBlock::from_rows(rows).unwrap()
}

#[test]
fn histogram_bins_per_offset() {
    let b = block(vec![vec![-1.5, 1.5], vec![-1.5, 0.5]]);
    let hist = Histogram::from_samples(&b, &spec(), 2).unwrap();
    assert_eq!(hist.count(0, 0), 2);
    assert_eq!(hist.count(3, 1), 1);
    assert_eq!(hist.count(2, 1), 1);
    assert_eq!(hist.total_count(), 4);
}

#[test]
fn histogram_upper_bound_lands_in_last_bin() {
    let b = block(vec![vec![2.0]]);
    let hist = Histogram::from_samples(&b, &spec(), 1).unwrap();
    assert_eq!(hist.count(3, 0), 1);
}

#[test]
fn histogram_drops_out_of_range_samples() {
    let b = block(vec![vec![5.0], vec![-0.5]]);
    let hist = Histogram::from_samples(&b, &spec(), 1).unwrap();
    assert_eq!(hist.total_count(), 1);
}

#[test]
fn histogram_union_adds_counts() {
    let a = Histogram::from_samples(&block(vec![vec![0.5]]), &spec(), 1).unwrap();
    let b = Histogram::from_samples(&block(vec![vec![0.5], vec![-0.5]]), &spec(), 1).unwrap();
    let merged = a.union(&b).unwrap();
    assert_eq!(merged.count(2, 0), 2);
    assert_eq!(merged.count(1, 0), 1);
    assert_eq!(merged.total_count(), 3);
}

#[test]
fn histogram_union_is_commutative() {
    let a = Histogram::from_samples(&block(vec![vec![0.5]]), &spec(), 1).unwrap();
    let b = Histogram::from_samples(&block(vec![vec![-1.5]]), &spec(), 1).unwrap();
    assert_eq!(a.union(&b).unwrap(), b.union(&a).unwrap());
}

#[test]
fn histogram_rejects_mismatched_bin_edges() {
    let a = Histogram::new(&spec(), 1).unwrap();
    let other = HistogramSpec {
        range: (-2.0, 2.0),
        num_bins: 8,
    };
    let b = Histogram::new(&other, 1).unwrap();
    let err = a.union(&b).unwrap_err();
    assert!(matches!(err, ChronostatError::IncompatibleUnion(_)));
}

#[test]
fn histogram_rejects_mismatched_bitrates() {
    let a = Histogram::new(&spec(), 1).unwrap();
    let b = Histogram::new(&spec(), 2).unwrap();
    assert!(a.union(&b).is_err());
}

#[test]
fn histogram_round_trips_through_dict() {
    let hist = Histogram::from_samples(&block(vec![vec![0.5, -0.5]]), &spec(), 2).unwrap();
    let back = Histogram::from_dict(&hist.to_dict()).unwrap();
    assert_eq!(back, hist);
}

#[test]
fn histogram_decode_rejects_foreign_versions() {
    let hist = Histogram::new(&spec(), 1).unwrap();
    let mut d = hist.to_dict();
    d["version"] = json!("9.9.9");
    let err = Histogram::from_dict(&d).unwrap_err();
    assert!(matches!(err, ChronostatError::VersionMismatch { .. }));
}

#[test]
fn histogram_decode_rejects_wrong_count_shape() {
    let hist = Histogram::new(&spec(), 2).unwrap();
    let mut d = hist.to_dict();
    d["counts"] = json!([0, 0, 0]);
    assert!(Histogram::from_dict(&d).is_err());
}

#[test]
fn statistics_accumulate_per_offset() {
    let b = block(vec![vec![1.0, -2.0], vec![3.0, 4.0]]);
    let stats = Statistics::from_samples(&b, 2).unwrap();
    assert_eq!(stats.count(), 2);
    assert_eq!(stats.sum(), &[4.0, 2.0]);
    assert_eq!(stats.sum_sq(), &[10.0, 20.0]);
    assert_eq!(stats.max(), &[3.0, 4.0]);
    assert_eq!(stats.min(), &[1.0, -2.0]);
    assert_eq!(stats.mean(0), Some(2.0));
}

#[test]
fn statistics_reject_non_finite_samples() {
    let b = block(vec![vec![f64::NAN]]);
    let err = Statistics::from_samples(&b, 1).unwrap_err();
    assert!(matches!(err, ChronostatError::InvalidData(_)));
}

#[test]
fn statistics_union_selects_extrema() {
    let a = Statistics::from_samples(&block(vec![vec![1.0]]), 1).unwrap();
    let b = Statistics::from_samples(&block(vec![vec![-3.0]]), 1).unwrap();
    let merged = a.union(&b).unwrap();
    assert_eq!(merged.max(), &[1.0]);
    assert_eq!(merged.min(), &[-3.0]);
    assert_eq!(merged.sum(), &[-2.0]);
    assert_eq!(merged.count(), 2);
}

#[test]
fn statistics_empty_union_is_identity() {
    let a = Statistics::from_samples(&block(vec![vec![1.0, 2.0]]), 2).unwrap();
    let empty = Statistics::new(2).unwrap();
    assert_eq!(a.union(&empty).unwrap(), a);
    assert_eq!(empty.union(&a).unwrap(), a);
}

#[test]
fn statistics_round_trip_through_dict() {
    let stats = Statistics::from_samples(&block(vec![vec![1.5, -0.25]]), 2).unwrap();
    let back = Statistics::from_dict(&stats.to_dict()).unwrap();
    assert_eq!(back, stats);
}

#[test]
fn statistics_decode_rejects_mismatched_lengths() {
    let stats = Statistics::new(2).unwrap();
    let mut d = stats.to_dict();
    d["sum"] = json!([0.0]);
    let err = Statistics::from_dict(&d).unwrap_err();
    assert!(matches!(err, ChronostatError::Inconsistent(_)));
}

#[test]
fn checked_clone_shares_no_storage() {
    let stats = Statistics::from_samples(&block(vec![vec![1.0]]), 1).unwrap();
    let copy = stats.checked_clone().unwrap();
    assert_eq!(copy, stats);
    let merged = copy.union(&stats).unwrap();
    assert_eq!(stats.count(), 1);
    assert_eq!(merged.count(), 2);
}
