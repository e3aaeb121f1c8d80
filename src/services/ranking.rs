use crate::{
    error::{AppError, AppResult},
    models::{SearchPreferences, LOUDNESS_CEIL_DB, LOUDNESS_FLOOR_DB},
    services::catalog::{loudness_norm, FeatureStats, NORM_EPSILON},
};

/// How far the weight sum may drift from 1.0 before validation fails
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-feature weights for the combined score.
///
/// The weights form a convex combination: each must be non-negative and
/// together they must sum to ~1.0. They are process-wide configuration
/// injected into `Catalog::search`, not per-call state.
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub tempo: f64,
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
    pub loudness: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            tempo: 0.20,
            energy: 0.18,
            valence: 0.18,
            danceability: 0.10,
            acousticness: 0.08,
            instrumentalness: 0.08,
            liveness: 0.04,
            speechiness: 0.06,
            loudness: 0.08,
        }
    }
}

impl ScoringWeights {
    fn as_array(&self) -> [f64; 9] {
        [
            self.tempo,
            self.energy,
            self.valence,
            self.danceability,
            self.acousticness,
            self.instrumentalness,
            self.liveness,
            self.speechiness,
            self.loudness,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

/// Kernel bandwidth per feature, each in the 0.20..=0.35 range by default.
/// Smaller values prefer exact matches, larger values tolerate spread.
#[derive(Debug, Clone)]
pub struct Bandwidths {
    pub tempo: f64,
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
    pub loudness: f64,
}

impl Default for Bandwidths {
    fn default() -> Self {
        Self {
            tempo: 0.20,
            energy: 0.20,
            valence: 0.25,
            danceability: 0.30,
            acousticness: 0.30,
            instrumentalness: 0.30,
            liveness: 0.30,
            speechiness: 0.30,
            loudness: 0.25,
        }
    }
}

impl Bandwidths {
    fn as_array(&self) -> [f64; 9] {
        [
            self.tempo,
            self.energy,
            self.valence,
            self.danceability,
            self.acousticness,
            self.instrumentalness,
            self.liveness,
            self.speechiness,
            self.loudness,
        ]
    }
}

/// Tunables for the ranking pass.
///
/// The penalty and bonus are deliberate softeners: ranges bias the ranking
/// without filtering the candidate set, and the class bonus is an additive
/// nudge that cannot zero out or dominate the base score.
#[derive(Debug, Clone)]
pub struct RankingConfig {
    pub weights: ScoringWeights,
    pub bandwidths: Bandwidths,
    /// Multiplicative discount for rows outside a requested band
    pub range_penalty: f64,
    /// Additive bonus for rows whose label matches the requested mood class
    pub class_bonus: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            bandwidths: Bandwidths::default(),
            range_penalty: 0.85,
            class_bonus: 0.05,
        }
    }
}

impl RankingConfig {
    /// Rejects configurations the scoring model cannot interpret
    pub fn validate(&self) -> AppResult<()> {
        if self.weights.as_array().iter().any(|w| *w < 0.0) {
            return Err(AppError::InvalidInput(
                "scoring weights must be non-negative".to_string(),
            ));
        }
        if (self.weights.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AppError::InvalidInput(format!(
                "scoring weights must sum to 1.0, got {}",
                self.weights.sum()
            )));
        }
        if self.bandwidths.as_array().iter().any(|b| *b <= 0.0) {
            return Err(AppError::InvalidInput(
                "bandwidths must be positive".to_string(),
            ));
        }
        if self.range_penalty <= 0.0 || self.range_penalty > 1.0 {
            return Err(AppError::InvalidInput(
                "range penalty must lie in (0, 1]".to_string(),
            ));
        }
        if self.class_bonus < 0.0 {
            return Err(AppError::InvalidInput(
                "class bonus must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Gaussian-shaped proximity of `value` to `target`.
///
/// Returns 1.0 exactly at the target and decays smoothly toward 0 as the
/// deviation approaches 1. The deviation is clipped to [0, 1] so values
/// from wider domains cannot push the kernel past its tail.
pub fn align(value: f64, target: f64, bandwidth: f64) -> f64 {
    let deviation = (value - target).abs().clamp(0.0, 1.0);
    (-(deviation / bandwidth).powi(2)).exp()
}

/// Scalar targets resolved per feature, all in the normalized [0, 1] domain
#[derive(Debug, Clone, Copy)]
pub(crate) struct Targets {
    pub tempo: f64,
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
    pub loudness: f64,
}

/// Resolves one scalar target per feature.
///
/// Priority per feature: explicit point preference, then range midpoint,
/// then categorical label, then the dataset median. Tempo and loudness
/// resolve in their native BPM/dB domains and are mapped onto [0, 1]
/// through the snapshot's load-time bounds.
pub(crate) fn resolve_targets(stats: &FeatureStats, prefs: &SearchPreferences) -> Targets {
    let tempo_bpm = prefs
        .tempo_band()
        .map(midpoint)
        .unwrap_or(stats.tempo_median);
    let tempo = ((tempo_bpm - stats.tempo_lo) / (stats.tempo_hi - stats.tempo_lo + NORM_EPSILON))
        .clamp(0.0, 1.0);

    let energy = prefs
        .energy
        .map(clamp_unit)
        .or_else(|| prefs.energy_band().map(midpoint))
        .unwrap_or(stats.energy_median);

    let valence = prefs
        .valence
        .map(clamp_unit)
        .or_else(|| prefs.valence_label.map(|level| level.target()))
        .unwrap_or(stats.valence_median);

    let loudness = prefs
        .loudness_db
        .map(|db| db.clamp(LOUDNESS_FLOOR_DB, LOUDNESS_CEIL_DB))
        .or_else(|| prefs.loudness_band().map(midpoint))
        .map(loudness_norm)
        .unwrap_or(stats.loudness_norm_median);

    Targets {
        tempo,
        energy,
        valence,
        danceability: prefs
            .danceability
            .map(clamp_unit)
            .unwrap_or(stats.danceability_median),
        acousticness: prefs
            .acousticness
            .map(clamp_unit)
            .unwrap_or(stats.acousticness_median),
        instrumentalness: prefs
            .instrumentalness
            .map(clamp_unit)
            .unwrap_or(stats.instrumentalness_median),
        liveness: prefs
            .liveness
            .map(clamp_unit)
            .unwrap_or(stats.liveness_median),
        speechiness: prefs
            .speechiness
            .map(clamp_unit)
            .unwrap_or(stats.speechiness_median),
        loudness,
    }
}

fn midpoint((lo, hi): (f64, f64)) -> f64 {
    (lo + hi) / 2.0
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValenceLevel;

    fn test_stats() -> FeatureStats {
        FeatureStats {
            tempo_lo: 60.0,
            tempo_hi: 180.0,
            tempo_median: 120.0,
            energy_median: 0.55,
            valence_median: 0.45,
            danceability_median: 0.6,
            acousticness_median: 0.3,
            instrumentalness_median: 0.1,
            liveness_median: 0.2,
            speechiness_median: 0.05,
            loudness_norm_median: 0.8,
        }
    }

    #[test]
    fn test_align_is_one_at_target() {
        for target in [0.0, 0.3, 0.5, 1.0] {
            for bandwidth in [0.2, 0.25, 0.35] {
                assert_eq!(align(target, target, bandwidth), 1.0);
            }
        }
    }

    #[test]
    fn test_align_non_increasing_in_deviation() {
        let target = 0.5;
        let mut previous = f64::INFINITY;
        for step in 0..=10 {
            let value = target + step as f64 * 0.05;
            let score = align(value, target, 0.25);
            assert!(score <= previous);
            previous = score;
        }
    }

    #[test]
    fn test_align_symmetric_around_target() {
        let target = 0.5;
        for deviation in [0.1, 0.25, 0.4] {
            let above = align(target + deviation, target, 0.2);
            let below = align(target - deviation, target, 0.2);
            assert!((above - below).abs() < 1e-12);
        }
    }

    #[test]
    fn test_align_clips_deviation_at_one() {
        // Values from wider domains saturate instead of vanishing entirely
        assert_eq!(align(5.0, 0.0, 0.2), align(1.0, 0.0, 0.2));
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((ScoringWeights::default().sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RankingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let mut config = RankingConfig::default();
        config.weights.tempo = -0.1;
        config.weights.energy = 0.48;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_weight_sum() {
        let mut config = RankingConfig::default();
        config.weights.tempo = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_bandwidth() {
        let mut config = RankingConfig::default();
        config.bandwidths.valence = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_penalty() {
        let mut config = RankingConfig::default();
        config.range_penalty = 0.0;
        assert!(config.validate().is_err());
        config.range_penalty = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_point_preference_beats_range_midpoint() {
        let prefs = SearchPreferences {
            energy: Some(0.9),
            energy_range: Some((0.0, 0.2)),
            ..Default::default()
        };
        let targets = resolve_targets(&test_stats(), &prefs);
        assert_eq!(targets.energy, 0.9);
    }

    #[test]
    fn test_range_midpoint_when_no_point_preference() {
        let prefs = SearchPreferences {
            energy_range: Some((0.0, 0.2)),
            ..Default::default()
        };
        let targets = resolve_targets(&test_stats(), &prefs);
        assert!((targets.energy - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_valence_label_beats_median() {
        let prefs = SearchPreferences {
            valence_label: Some(ValenceLevel::High),
            ..Default::default()
        };
        let targets = resolve_targets(&test_stats(), &prefs);
        assert_eq!(targets.valence, 0.75);
    }

    #[test]
    fn test_median_is_last_resort() {
        let stats = test_stats();
        let targets = resolve_targets(&stats, &SearchPreferences::default());
        assert_eq!(targets.energy, stats.energy_median);
        assert_eq!(targets.valence, stats.valence_median);
        assert_eq!(targets.danceability, stats.danceability_median);
        assert_eq!(targets.loudness, stats.loudness_norm_median);
    }

    #[test]
    fn test_point_preferences_are_clamped() {
        let prefs = SearchPreferences {
            energy: Some(1.7),
            speechiness: Some(-0.4),
            ..Default::default()
        };
        let targets = resolve_targets(&test_stats(), &prefs);
        assert_eq!(targets.energy, 1.0);
        assert_eq!(targets.speechiness, 0.0);
    }

    #[test]
    fn test_tempo_target_normalized_through_snapshot_bounds() {
        let prefs = SearchPreferences {
            bpm_range: Some((100.0, 140.0)),
            ..Default::default()
        };
        let targets = resolve_targets(&test_stats(), &prefs);
        // midpoint 120 BPM maps to the middle of the 60..180 snapshot range
        assert!((targets.tempo - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_tempo_target_clipped_when_band_outside_snapshot() {
        let prefs = SearchPreferences {
            bpm_range: Some((300.0, 400.0)),
            ..Default::default()
        };
        let targets = resolve_targets(&test_stats(), &prefs);
        assert_eq!(targets.tempo, 1.0);
    }

    #[test]
    fn test_loudness_point_preference_resolves_in_db() {
        let prefs = SearchPreferences {
            loudness_db: Some(-30.0),
            ..Default::default()
        };
        let targets = resolve_targets(&test_stats(), &prefs);
        assert!((targets.loudness - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_loudness_range_midpoint_resolves_in_db() {
        let prefs = SearchPreferences {
            loudness_db_range: Some((-40.0, -20.0)),
            ..Default::default()
        };
        let targets = resolve_targets(&test_stats(), &prefs);
        assert!((targets.loudness - 0.5).abs() < 1e-12);
    }
}
