mod common;

use common::*;

use camino::Utf8PathBuf;

use refind::constants::ObjectId;
use refind::params::FollowUpParams;
use refind::results::{NightSummary, ResultStore};
use refind::tracklets::PriorDetections;
use refind::variant_orbits::SwarmGrid;

fn params() -> FollowUpParams {
    FollowUpParams::builder()
        .grid(SwarmGrid::new(vec![1.0], vec![0.0]).unwrap())
        .night_zero(NIGHT_ZERO)
        .min_nights(2)
        .detection_window(15)
        .build()
        .unwrap()
}

#[test]
fn night_run_persists_and_reloads_through_the_store() {
    let engine = engine(params());
    let schedule = tracking_schedule(&[5, 6], 100.0, 26.0);
    let tracklets = tracklet_set([(1, tracklet(100.0)), (2, tracklet(200.0))]);

    let results = engine
        .compute_detection_probabilities(3, &tracklets, &schedule, &PriorDetections::new())
        .unwrap();
    let summary = NightSummary::from_results(3, &results);
    assert_eq!(summary.probabilities.len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().join("results")).unwrap();
    let store = ResultStore::new(root);

    assert!(!store.is_computed(3));
    let path = store.save(&summary).unwrap();
    assert!(path.as_str().ends_with("night3_probs.json"));
    assert!(store.is_computed(3));

    let reloaded = store.load(3).unwrap().unwrap();
    assert_eq!(reloaded, summary);
    assert_eq!(reloaded.probability_of(&ObjectId::Int(1)), Some(1.0));
    assert_eq!(reloaded.probability_of(&ObjectId::Int(2)), Some(0.0));
}

#[test]
fn failed_objects_are_not_persisted() {
    let engine = engine_with_rejections(params());
    let schedule = tracking_schedule(&[5, 6], 100.0, 26.0);
    let tracklets = tracklet_set([(1, tracklet(100.0)), (2, tracklet(REJECTED_RA))]);

    let results = engine
        .compute_detection_probabilities(3, &tracklets, &schedule, &PriorDetections::new())
        .unwrap();
    let summary = NightSummary::from_results(3, &results);

    assert_eq!(results.len(), 2);
    assert_eq!(summary.probabilities.len(), 1);
    assert_eq!(summary.probabilities[0].0, ObjectId::Int(1));
}
