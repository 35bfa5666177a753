//! # Night result artifacts
//!
//! One JSON artifact per processed night, holding the (object id,
//! probability) pairs of that night's run. The store doubles as the
//! memoization layer of a nightly driver: `is_computed` checks artifact
//! existence so an already-processed night is never recomputed.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use tracing::info;

use crate::constants::{Night, ObjectId};
use crate::refind::NightProbabilities;
use crate::refind_errors::RefindError;

/// Serialized outcome of one night's detectability run.
///
/// Holds successful probabilities only; per-object failures stay with the
/// in-memory [`NightProbabilities`] map and are not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightSummary {
    pub night: Night,
    /// (object, probability) pairs, sorted by object id
    pub probabilities: Vec<(ObjectId, f64)>,
}

impl NightSummary {
    /// Collect the successful entries of a night's result map.
    pub fn from_results(night: Night, results: &NightProbabilities) -> Self {
        let mut probabilities: Vec<(ObjectId, f64)> = results
            .iter()
            .filter_map(|(id, result)| result.as_ref().ok().map(|p| (id.clone(), *p)))
            .collect();
        probabilities.sort_by(|a, b| a.0.cmp(&b.0));
        NightSummary {
            night,
            probabilities,
        }
    }

    /// Probability for one object, if it was computed.
    pub fn probability_of(&self, id: &ObjectId) -> Option<f64> {
        self.probabilities
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, p)| *p)
    }
}

/// File-backed store of per-night result artifacts.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: Utf8PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        ResultStore { root: root.into() }
    }

    /// Artifact path for one night.
    pub fn path_for(&self, night: Night) -> Utf8PathBuf {
        self.root.join(format!("night{night}_probs.json"))
    }

    /// Whether a night's artifact already exists.
    pub fn is_computed(&self, night: Night) -> bool {
        self.path_for(night).exists()
    }

    /// Persist a night summary, creating the store directory if needed.
    pub fn save(&self, summary: &NightSummary) -> Result<Utf8PathBuf, RefindError> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.path_for(summary.night);
        let file = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(file, summary)?;
        info!(night = summary.night, objects = summary.probabilities.len(), %path, "night summary saved");
        Ok(path)
    }

    /// Load a night summary. `Ok(None)` when the night was never computed.
    pub fn load(&self, night: Night) -> Result<Option<NightSummary>, RefindError> {
        let path = self.path_for(night);
        if !path.exists() {
            return Ok(None);
        }
        let file = BufReader::new(File::open(path.as_std_path())?);
        Ok(Some(serde_json::from_reader(file)?))
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

#[cfg(test)]
mod test_results {
    use super::*;
    use ahash::RandomState;
    use std::collections::HashMap;

    fn store() -> (tempfile::TempDir, ResultStore) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, ResultStore::new(root))
    }

    #[test]
    fn save_load_round_trip_and_memoization() {
        let (_dir, store) = store();
        assert!(!store.is_computed(4));
        assert!(store.load(4).unwrap().is_none());

        let mut results: NightProbabilities = HashMap::default();
        results.insert(ObjectId::Int(7), Ok(0.25));
        results.insert(ObjectId::from("2026 QA1"), Ok(1.0));
        results.insert(
            ObjectId::Int(9),
            Err(RefindError::PropagationFailed("boom".into())),
        );

        let summary = NightSummary::from_results(4, &results);
        assert_eq!(summary.probabilities.len(), 2);

        store.save(&summary).unwrap();
        assert!(store.is_computed(4));

        let loaded = store.load(4).unwrap().unwrap();
        assert_eq!(loaded, summary);
        assert_eq!(loaded.probability_of(&ObjectId::Int(7)), Some(0.25));
        assert_eq!(loaded.probability_of(&ObjectId::Int(9)), None);
    }

    #[test]
    fn summaries_are_sorted_by_object_id() {
        let mut results: NightProbabilities = HashMap::default();
        for id in [30u32, 5, 12] {
            results.insert(ObjectId::Int(id), Ok(0.5));
        }
        let summary = NightSummary::from_results(0, &results);
        let ids: Vec<&ObjectId> = summary.probabilities.iter().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec![&ObjectId::Int(5), &ObjectId::Int(12), &ObjectId::Int(30)]
        );
    }

    #[test]
    fn empty_results_give_an_empty_summary() {
        let results: NightProbabilities = HashMap::with_hasher(RandomState::new());
        let summary = NightSummary::from_results(2, &results);
        assert!(summary.probabilities.is_empty());
    }
}
