use std::cmp::Ordering;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{SearchPreferences, Track, TrackMatch, LOUDNESS_CEIL_DB, LOUDNESS_FLOOR_DB},
    services::{
        links,
        ranking::{self, RankingConfig},
    },
};

/// Tempo fill when the whole column is missing or empty
const FALLBACK_TEMPO_BPM: f64 = 120.0;
/// Neutral default for the [0, 1] bounded features
const NEUTRAL_FEATURE: f64 = 0.5;
/// Fill for missing loudness cells, in dB
const DEFAULT_LOUDNESS_DB: f64 = -10.0;
/// Keeps tempo normalization defined when every row shares one tempo
pub(crate) const NORM_EPSILON: f64 = 1e-6;

/// Bounded feature columns, in `Track` field order
const BOUNDED_COLUMNS: [&str; 7] = [
    "energy",
    "valence",
    "danceability",
    "acousticness",
    "instrumentalness",
    "liveness",
    "speechiness",
];

/// Maps dB in [-60, 0] onto [0, 1]
pub(crate) fn loudness_norm(db: f64) -> f64 {
    (db - LOUDNESS_FLOOR_DB) / (LOUDNESS_CEIL_DB - LOUDNESS_FLOOR_DB)
}

/// Load-time aggregates: normalization bounds and the per-feature medians
/// used as last-resort targets
#[derive(Debug, Clone)]
pub(crate) struct FeatureStats {
    pub tempo_lo: f64,
    pub tempo_hi: f64,
    pub tempo_median: f64,
    pub energy_median: f64,
    pub valence_median: f64,
    pub danceability_median: f64,
    pub acousticness_median: f64,
    pub instrumentalness_median: f64,
    pub liveness_median: f64,
    pub speechiness_median: f64,
    pub loudness_norm_median: f64,
}

impl FeatureStats {
    fn from_tracks(tracks: &[Track], tempo_lo: f64, tempo_hi: f64) -> Self {
        let med = |values: Vec<f64>, default: f64| median(values).unwrap_or(default);
        Self {
            tempo_lo,
            tempo_hi,
            tempo_median: med(
                tracks.iter().map(|t| t.tempo).collect(),
                FALLBACK_TEMPO_BPM,
            ),
            energy_median: med(tracks.iter().map(|t| t.energy).collect(), NEUTRAL_FEATURE),
            valence_median: med(tracks.iter().map(|t| t.valence).collect(), NEUTRAL_FEATURE),
            danceability_median: med(
                tracks.iter().map(|t| t.danceability).collect(),
                NEUTRAL_FEATURE,
            ),
            acousticness_median: med(
                tracks.iter().map(|t| t.acousticness).collect(),
                NEUTRAL_FEATURE,
            ),
            instrumentalness_median: med(
                tracks.iter().map(|t| t.instrumentalness).collect(),
                NEUTRAL_FEATURE,
            ),
            liveness_median: med(tracks.iter().map(|t| t.liveness).collect(), NEUTRAL_FEATURE),
            speechiness_median: med(
                tracks.iter().map(|t| t.speechiness).collect(),
                NEUTRAL_FEATURE,
            ),
            loudness_norm_median: med(
                tracks.iter().map(|t| t.loudness_norm).collect(),
                loudness_norm(DEFAULT_LOUDNESS_DB),
            ),
        }
    }
}

/// One parsed CSV row before defaulting and normalization
struct RawRow {
    uri: String,
    duration_ms: Option<f64>,
    tempo: Option<f64>,
    bounded: [Option<f64>; 7],
    loudness: Option<f64>,
    label: Option<i32>,
}

/// Immutable in-memory snapshot of the seed dataset.
///
/// Constructed once per process before the server accepts traffic; safe to
/// share across concurrent `search` calls since nothing mutates it.
pub struct Catalog {
    tracks: Vec<Track>,
    stats: FeatureStats,
}

impl Catalog {
    /// Loads and normalizes the dataset at `path`
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let file = File::open(path.as_ref())?;
        let catalog = Self::from_csv_reader(file)?;
        tracing::info!(
            path = %path.as_ref().display(),
            tracks = catalog.len(),
            "Seed catalog loaded"
        );
        Ok(catalog)
    }

    /// Builds a snapshot from CSV data.
    ///
    /// The only fatal condition is a missing `uri` column: identity cannot
    /// be synthesized. Every other column degrades to neutral defaults.
    pub fn from_csv_reader<R: Read>(reader: R) -> AppResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|header| header == name);

        let uri_col = column("uri").ok_or_else(|| {
            AppError::Catalog("dataset is missing the required `uri` column".to_string())
        })?;

        // Either header spelling is accepted; `duration_ms` is canonical
        let duration_col = column("duration_ms").or_else(|| column("duration (ms)"));
        let tempo_col = column("tempo");
        let loudness_col = column("loudness");
        let labels_col = column("labels");
        let bounded_cols = BOUNDED_COLUMNS.map(|name| column(name));

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in csv_reader.records() {
            let record = record?;
            let cell = |col: Option<usize>| col.and_then(|index| record.get(index));

            let uri = cell(Some(uri_col)).unwrap_or_default();
            if uri.is_empty() {
                skipped += 1;
                continue;
            }

            rows.push(RawRow {
                uri: uri.to_string(),
                duration_ms: parse_numeric(cell(duration_col)),
                tempo: parse_numeric(cell(tempo_col)),
                bounded: bounded_cols.map(|col| parse_numeric(cell(col))),
                loudness: parse_numeric(cell(loudness_col)),
                label: cell(labels_col).and_then(|value| value.parse::<i32>().ok()),
            });
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Dropped dataset rows without a uri");
        }

        Ok(Self::from_rows(rows))
    }

    fn from_rows(rows: Vec<RawRow>) -> Self {
        let tempo_fill = median(rows.iter().filter_map(|row| row.tempo).collect())
            .unwrap_or(FALLBACK_TEMPO_BPM);
        let tempos: Vec<f64> = rows
            .iter()
            .map(|row| row.tempo.unwrap_or(tempo_fill))
            .collect();

        let tempo_lo = tempos.iter().copied().fold(f64::INFINITY, f64::min);
        let tempo_hi = tempos.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (tempo_lo, tempo_hi) = if tempos.is_empty() {
            (tempo_fill, tempo_fill + NORM_EPSILON)
        } else if tempo_hi <= tempo_lo {
            (tempo_lo, tempo_lo + NORM_EPSILON)
        } else {
            (tempo_lo, tempo_hi)
        };

        let tracks: Vec<Track> = rows
            .into_iter()
            .zip(tempos)
            .map(|(row, tempo)| {
                let [energy, valence, danceability, acousticness, instrumentalness, liveness, speechiness] =
                    row.bounded
                        .map(|value| value.unwrap_or(NEUTRAL_FEATURE).clamp(0.0, 1.0));
                let loudness = row
                    .loudness
                    .unwrap_or(DEFAULT_LOUDNESS_DB)
                    .clamp(LOUDNESS_FLOOR_DB, LOUDNESS_CEIL_DB);

                Track {
                    uri: row.uri,
                    duration_ms: row.duration_ms,
                    tempo,
                    energy,
                    valence,
                    danceability,
                    acousticness,
                    instrumentalness,
                    liveness,
                    speechiness,
                    loudness,
                    label: row.label,
                    tempo_norm: (tempo - tempo_lo) / (tempo_hi - tempo_lo),
                    loudness_norm: loudness_norm(loudness),
                }
            })
            .collect();

        let stats = FeatureStats::from_tracks(&tracks, tempo_lo, tempo_hi);
        Self { tracks, stats }
    }

    /// Returns the K best-aligned tracks for the given preferences.
    ///
    /// Pure function of (snapshot, preferences, config): ranges bias the
    /// ranking through the soft penalty but never filter, a matching mood
    /// class adds the configured bonus, and ties keep original row order so
    /// identical inputs always produce identical output.
    pub fn search(&self, prefs: &SearchPreferences, config: &RankingConfig) -> Vec<TrackMatch> {
        let k = prefs.result_count();
        if self.tracks.is_empty() {
            return Vec::new();
        }

        tracing::debug!(k, candidates = self.tracks.len(), "Scoring catalog");

        let targets = ranking::resolve_targets(&self.stats, prefs);
        let weights = &config.weights;
        let bandwidths = &config.bandwidths;
        let tempo_band = prefs.tempo_band();
        let energy_band = prefs.energy_band();
        let class_id = prefs.mood_class.map(|class| class.label_id());

        let mut scored: Vec<(f64, &Track)> = self
            .tracks
            .iter()
            .map(|track| {
                let mut score = weights.tempo
                    * ranking::align(track.tempo_norm, targets.tempo, bandwidths.tempo)
                    + weights.energy * ranking::align(track.energy, targets.energy, bandwidths.energy)
                    + weights.valence
                        * ranking::align(track.valence, targets.valence, bandwidths.valence)
                    + weights.danceability
                        * ranking::align(
                            track.danceability,
                            targets.danceability,
                            bandwidths.danceability,
                        )
                    + weights.acousticness
                        * ranking::align(
                            track.acousticness,
                            targets.acousticness,
                            bandwidths.acousticness,
                        )
                    + weights.instrumentalness
                        * ranking::align(
                            track.instrumentalness,
                            targets.instrumentalness,
                            bandwidths.instrumentalness,
                        )
                    + weights.liveness
                        * ranking::align(track.liveness, targets.liveness, bandwidths.liveness)
                    + weights.speechiness
                        * ranking::align(
                            track.speechiness,
                            targets.speechiness,
                            bandwidths.speechiness,
                        )
                    + weights.loudness
                        * ranking::align(track.loudness_norm, targets.loudness, bandwidths.loudness);

                if let Some((lo, hi)) = tempo_band {
                    if track.tempo < lo || track.tempo > hi {
                        score *= config.range_penalty;
                    }
                }
                if let Some((lo, hi)) = energy_band {
                    if track.energy < lo || track.energy > hi {
                        score *= config.range_penalty;
                    }
                }
                if let Some(id) = class_id {
                    if track.label == Some(id) {
                        score += config.class_bonus;
                    }
                }

                (score, track)
            })
            .collect();

        // Stable sort: equal scores keep original row order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(score, track)| {
                TrackMatch::from_track(track, score, links::track_links(&track.uri))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

fn parse_numeric(cell: Option<&str>) -> Option<f64> {
    cell.and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}
