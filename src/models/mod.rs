use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod preferences;

pub use preferences::SearchPreferences;

/// Loudness domain carried by the dataset, in decibels
pub const LOUDNESS_FLOOR_DB: f64 = -60.0;
pub const LOUDNESS_CEIL_DB: f64 = 0.0;

/// Coarse valence preference extracted from a mood description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValenceLevel {
    Low,
    Neutral,
    Medium,
    High,
}

impl ValenceLevel {
    /// Scalar valence target used by the alignment kernel
    pub fn target(self) -> f64 {
        match self {
            ValenceLevel::Low => 0.25,
            ValenceLevel::Neutral | ValenceLevel::Medium => 0.5,
            ValenceLevel::High => 0.75,
        }
    }
}

/// Mood classes encoded by the dataset's `labels` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodClass {
    Sad,
    Happy,
    Energetic,
    Calm,
}

impl MoodClass {
    /// Integer class id as stored in the `labels` column
    pub fn label_id(self) -> i32 {
        match self {
            MoodClass::Sad => 0,
            MoodClass::Happy => 1,
            MoodClass::Energetic => 2,
            MoodClass::Calm => 3,
        }
    }
}

/// One catalog row, normalized at load time and immutable afterwards.
///
/// Defaulting rules applied by the loader:
/// - `tempo`: missing cells filled with the dataset median (fixed fallback
///   when the whole column is empty)
/// - bounded features: missing cells and absent columns filled with 0.5,
///   then clipped to [0, 1]
/// - `loudness`: missing cells filled with -10.0 dB, clipped to [-60, 0]
/// - `label`: `None` when the cell is absent or unparseable
/// - `tempo_norm` / `loudness_norm`: derived once from the snapshot's
///   global bounds
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub uri: String,
    pub duration_ms: Option<f64>,
    pub tempo: f64,
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
    pub loudness: f64,
    pub label: Option<i32>,
    pub tempo_norm: f64,
    pub loudness_norm: f64,
}

/// A scored search result returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct TrackMatch {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    pub tempo: f64,
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
    pub loudness: f64,
    pub label: Option<i32>,
    pub score: f64,
    pub links: HashMap<String, String>,
}

impl TrackMatch {
    /// Annotates a catalog row with its computed score and derived links
    pub fn from_track(track: &Track, score: f64, links: HashMap<String, String>) -> Self {
        Self {
            uri: track.uri.clone(),
            duration_ms: track.duration_ms,
            tempo: track.tempo,
            energy: track.energy,
            valence: track.valence,
            danceability: track.danceability,
            acousticness: track.acousticness,
            instrumentalness: track.instrumentalness,
            liveness: track.liveness,
            speechiness: track.speechiness,
            loudness: track.loudness,
            label: track.label,
            score,
            links,
        }
    }
}
