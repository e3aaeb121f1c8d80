use serde::Deserialize;

use super::{MoodClass, ValenceLevel, LOUDNESS_CEIL_DB, LOUDNESS_FLOOR_DB};

/// Bounds on the requested result count, kept small so downstream
/// consumers (LLM re-rankers, UI lists) receive compact payloads
pub const MIN_RESULTS: i64 = 1;
pub const MAX_RESULTS: i64 = 10;

const DEFAULT_RESULTS: i64 = 6;

/// Structured mood preferences driving one catalog search.
///
/// Every field is optional; out-of-range values are clamped to their valid
/// domain rather than rejected, so a degraded upstream parser can never
/// make a search fail.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchPreferences {
    /// Number of results to return, clamped to 1..=10
    pub k: Option<i64>,
    /// Requested tempo band in BPM
    pub bpm_range: Option<(f64, f64)>,
    /// Requested energy band in [0, 1]
    pub energy_range: Option<(f64, f64)>,
    /// Requested loudness band in dB
    pub loudness_db_range: Option<(f64, f64)>,
    /// Coarse valence preference
    pub valence_label: Option<ValenceLevel>,
    /// Mood class matched against the dataset's `labels` column
    pub mood_class: Option<MoodClass>,
    /// Point preferences, each in [0, 1]
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub danceability: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub speechiness: Option<f64>,
    /// Point preference for loudness, in dB
    pub loudness_db: Option<f64>,
}

impl SearchPreferences {
    /// Requested result count clamped to the supported bounds
    pub fn result_count(&self) -> usize {
        self.k
            .unwrap_or(DEFAULT_RESULTS)
            .clamp(MIN_RESULTS, MAX_RESULTS) as usize
    }

    /// Tempo band with ordered endpoints, floored at 0 BPM
    pub fn tempo_band(&self) -> Option<(f64, f64)> {
        self.bpm_range.map(|range| {
            let (lo, hi) = ordered(range);
            (lo.max(0.0), hi.max(0.0))
        })
    }

    /// Energy band with ordered endpoints, clamped to [0, 1]
    pub fn energy_band(&self) -> Option<(f64, f64)> {
        self.energy_range.map(|range| {
            let (lo, hi) = ordered(range);
            (lo.clamp(0.0, 1.0), hi.clamp(0.0, 1.0))
        })
    }

    /// Loudness band with ordered endpoints, clamped to [-60, 0] dB
    pub fn loudness_band(&self) -> Option<(f64, f64)> {
        self.loudness_db_range.map(|range| {
            let (lo, hi) = ordered(range);
            (
                lo.clamp(LOUDNESS_FLOOR_DB, LOUDNESS_CEIL_DB),
                hi.clamp(LOUDNESS_FLOOR_DB, LOUDNESS_CEIL_DB),
            )
        })
    }
}

fn ordered((lo, hi): (f64, f64)) -> (f64, f64) {
    if lo > hi {
        (hi, lo)
    } else {
        (lo, hi)
    }
}
