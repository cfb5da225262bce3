use crate::filter::filter_players;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Recommendation emitted when the segment has no players at all
pub const EMPTY_SEGMENT_ADVICE: &str = "Broaden filters to rebuild a playable cohort";

const ADVICE_SHARD_REGIONS: &str = "Shard lobbies by region to contain latency variance";
const ADVICE_EDGE_RELAYS: &str = "Route matches through edge relays closer to the cohort";
const ADVICE_TIGHTEN_MMR: &str = "Tighten MMR bands to protect match quality";
const ADVICE_COMEBACK: &str = "Add comeback rewards to soften win-rate swings";
const ADVICE_WIDEN: &str = "Widen the cohort before launch: population is below queue-health minimum";
const ADVICE_LITE_BUNDLE: &str = "Ship a lightweight asset bundle for low-tier devices";
const ADVICE_READY: &str = "Segment is launch-ready: keep the current matchmaking envelope";

/// Population moments shared by the calculators. Only exists for a non-empty segment.
struct SegmentStats {
    count: usize,
    mmr_mean: f64,
    mmr_std: f64,
    latency_mean: f64,
    latency_std: f64,
    win_rate_mean: f64,
    win_rate_std: f64,
    low_device_share: f64,
}

impl SegmentStats {
    fn from_segment(segment: &[PlayerProfile]) -> Option<Self> {
        if segment.is_empty() {
            return None;
        }

        let (mmr_mean, mmr_std) = mean_and_std(segment.iter().map(|p| p.mmr as f64));
        let (latency_mean, latency_std) = mean_and_std(segment.iter().map(|p| p.latency as f64));
        let (win_rate_mean, win_rate_std) = mean_and_std(segment.iter().map(|p| p.win_rate));
        let low_devices = segment.iter().filter(|p| p.device_tier == DeviceTier::Low).count();

        Some(Self {
            count: segment.len(),
            mmr_mean,
            mmr_std,
            latency_mean,
            latency_std,
            win_rate_mean,
            win_rate_std,
            low_device_share: low_devices as f64 / segment.len() as f64,
        })
    }

    fn mmr_cohesion(&self, config: &AnalyticsConfig) -> f64 {
        clamp01(1.0 - self.mmr_std / config.mmr_spread_ceiling)
    }

    fn health_score(&self, config: &AnalyticsConfig) -> u8 {
        let latency_span = config.latency_ceiling_ms - config.latency_floor_ms;
        let latency_score = clamp01(1.0 - (self.latency_mean - config.latency_floor_ms) / latency_span);
        let win_balance = clamp01(1.0 - self.win_rate_std / config.win_rate_spread_ceiling);

        let blended = config.health_weight_mmr * self.mmr_cohesion(config)
            + config.health_weight_latency * latency_score
            + config.health_weight_win_rate * win_balance;
        to_percent(blended)
    }

    fn match_confidence(&self, config: &AnalyticsConfig) -> u8 {
        let latency_stability = clamp01(1.0 - self.latency_std / config.latency_jitter_ceiling);
        to_percent(
            config.confidence_weight_mmr * self.mmr_cohesion(config)
                + config.confidence_weight_latency * latency_stability,
        )
    }
}

/// Population mean and standard deviation; callers guarantee at least one value
fn mean_and_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count() as f64;
    let mean = values.clone().sum::<f64>() / n;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Scale a [0, 1] fraction to a rounded 0-100 percentage
fn to_percent(fraction: f64) -> u8 {
    (clamp01(fraction) * 100.0).round() as u8
}

/// Headline KPIs: size, average MMR, average win rate, average latency
pub fn get_segment_insights(segment: &[PlayerProfile]) -> Vec<SegmentInsight> {
    get_segment_insights_with(segment, &AnalyticsConfig::default())
}

pub fn get_segment_insights_with(segment: &[PlayerProfile], config: &AnalyticsConfig) -> Vec<SegmentInsight> {
    let insight = |label: &str, value: i64, unit: &str, positive: bool| SegmentInsight {
        label: label.to_string(),
        value,
        unit: unit.to_string(),
        positive,
    };

    let Some(stats) = SegmentStats::from_segment(segment) else {
        return vec![
            insight("Segment Size", 0, "players", false),
            insight("Avg MMR", 0, "MMR", false),
            insight("Avg Win Rate", 0, "%", false),
            insight("Avg Latency", 0, "ms", false),
        ];
    };

    vec![
        insight(
            "Segment Size",
            stats.count as i64,
            "players",
            stats.count >= config.min_viable_population,
        ),
        insight(
            "Avg MMR",
            stats.mmr_mean.round() as i64,
            "MMR",
            stats.mmr_mean >= config.mmr_positive_floor,
        ),
        insight(
            "Avg Win Rate",
            stats.win_rate_mean.round() as i64,
            "%",
            stats.win_rate_mean >= config.win_rate_positive_floor,
        ),
        // Lower latency reads as favorable
        insight(
            "Avg Latency",
            stats.latency_mean.round() as i64,
            "ms",
            stats.latency_mean <= config.latency_positive_ceiling,
        ),
    ]
}

/// Health, stress, match confidence and live-ops recommendations
pub fn get_segment_diagnostics(segment: &[PlayerProfile]) -> SegmentDiagnostics {
    get_segment_diagnostics_with(segment, &AnalyticsConfig::default())
}

pub fn get_segment_diagnostics_with(segment: &[PlayerProfile], config: &AnalyticsConfig) -> SegmentDiagnostics {
    let Some(stats) = SegmentStats::from_segment(segment) else {
        return SegmentDiagnostics {
            health_score: 0,
            stress_level: StressLevel::Critical,
            match_confidence: 0,
            recommendations: vec![EMPTY_SEGMENT_ADVICE.to_string()],
        };
    };

    let health_score = stats.health_score(config);

    SegmentDiagnostics {
        health_score,
        stress_level: StressLevel::from_health(health_score, config),
        match_confidence: stats.match_confidence(config),
        recommendations: recommendations(&stats, config),
    }
}

fn recommendations(stats: &SegmentStats, config: &AnalyticsConfig) -> Vec<String> {
    // Priority order
    let rules = [
        (stats.latency_std > config.latency_variance_alert_ms, ADVICE_SHARD_REGIONS),
        (stats.latency_mean > config.latency_mean_alert_ms, ADVICE_EDGE_RELAYS),
        (stats.mmr_std > config.mmr_spread_alert, ADVICE_TIGHTEN_MMR),
        (stats.win_rate_std > config.win_rate_spread_alert, ADVICE_COMEBACK),
        (stats.count < config.min_viable_population, ADVICE_WIDEN),
        (stats.low_device_share > config.low_device_share_alert, ADVICE_LITE_BUNDLE),
    ];

    let mut advice: Vec<String> = Vec::new();
    for (fired, text) in rules {
        if fired && !advice.iter().any(|a| a == text) {
            advice.push(text.to_string());
        }
    }

    if advice.is_empty() {
        advice.push(ADVICE_READY.to_string());
    }
    advice
}

/// Share of the segment per playstyle.
///
/// Entries follow `Playstyle::ALL` order and skip archetypes with no members.
/// Every entry but the last is floored; the last takes the remainder, so the
/// percentages add up to exactly 100 (or there are none for an empty segment).
pub fn get_persona_distribution(segment: &[PlayerProfile]) -> Vec<PersonaBreakdown> {
    if segment.is_empty() {
        return Vec::new();
    }

    let total = segment.len();
    let counts: Vec<(Playstyle, usize)> = Playstyle::ALL
        .iter()
        .map(|&style| (style, segment.iter().filter(|p| p.playstyle == style).count()))
        .filter(|&(_, count)| count > 0)
        .collect();

    let mut assigned = 0usize;
    let last = counts.len() - 1;
    counts
        .into_iter()
        .enumerate()
        .map(|(i, (archetype, count))| {
            let percentage = if i == last {
                100 - assigned
            } else {
                count * 100 / total
            };
            assigned += percentage;
            PersonaBreakdown {
                archetype,
                percentage: percentage as u8,
            }
        })
        .collect()
}

/// Score each live-ops archetype by how well the segment's behavioral mix fits it
pub fn infer_launch_moments(segment: &[PlayerProfile]) -> Vec<LaunchSignal> {
    infer_launch_moments_with(segment, &AnalyticsConfig::default())
}

pub fn infer_launch_moments_with(segment: &[PlayerProfile], config: &AnalyticsConfig) -> Vec<LaunchSignal> {
    let share = |behavior: &BehaviorTrait| -> f64 {
        if segment.is_empty() {
            return 0.0;
        }
        segment.iter().filter(|p| behavior.matches(p)).count() as f64 / segment.len() as f64
    };

    let mut signals: Vec<LaunchSignal> = config
        .launch_catalog
        .iter()
        .map(|archetype| {
            let alignment: f64 = archetype
                .weights
                .iter()
                .map(|w| w.weight * share(&w.behavior))
                .sum();
            LaunchSignal {
                label: archetype.label.clone(),
                impact: to_percent(alignment),
            }
        })
        .collect();

    // Stable sort keeps catalog order for ties
    signals.sort_by(|a, b| b.impact.cmp(&a.impact));
    signals
}

/// Single desirability number in [0, 100]; 0 for an empty segment
pub fn compute_segment_score(segment: &[PlayerProfile]) -> u32 {
    compute_segment_score_with(segment, &AnalyticsConfig::default())
}

pub fn compute_segment_score_with(segment: &[PlayerProfile], config: &AnalyticsConfig) -> u32 {
    let Some(stats) = SegmentStats::from_segment(segment) else {
        return 0;
    };

    let population = if config.population_target == 0 {
        1.0
    } else {
        (stats.count as f64 / config.population_target as f64).min(1.0)
    };
    let health = stats.health_score(config) as f64 / 100.0;
    let diversity = persona_diversity(segment);

    let blended = config.score_weight_population * population
        + config.score_weight_health * health
        + config.score_weight_diversity * diversity;
    (clamp01(blended) * 100.0).round() as u32
}

/// Shannon entropy of the playstyle mix, normalized to [0, 1]
fn persona_diversity(segment: &[PlayerProfile]) -> f64 {
    let total = segment.len() as f64;
    let entropy: f64 = Playstyle::ALL
        .iter()
        .map(|&style| segment.iter().filter(|p| p.playstyle == style).count())
        .filter(|&count| count > 0)
        .map(|count| {
            let p = count as f64 / total;
            -p * p.ln()
        })
        .sum();
    clamp01(entropy / (Playstyle::ALL.len() as f64).ln())
}

/// Everything the lab renders for one filter selection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentReport {
    pub filters: SegmentFilters,
    pub segment: Vec<PlayerProfile>,
    pub segment_size: usize,
    pub insights: Vec<SegmentInsight>,
    pub diagnostics: SegmentDiagnostics,
    pub persona_distribution: Vec<PersonaBreakdown>,
    pub launch_signals: Vec<LaunchSignal>,
    pub segment_score: u32,
}

impl SegmentReport {
    pub fn build(roster: &[PlayerProfile], filters: &SegmentFilters, config: &AnalyticsConfig) -> Self {
        let segment = filter_players(roster, filters);
        let (insights, diagnostics, persona_distribution, launch_signals, segment_score) =
            Self::compute_views(&segment, config);

        log::debug!(
            "segment report: {} players, health {}, score {}",
            segment.len(),
            diagnostics.health_score,
            segment_score
        );

        Self {
            filters: filters.clone(),
            segment_size: segment.len(),
            segment,
            insights,
            diagnostics,
            persona_distribution,
            launch_signals,
            segment_score,
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn compute_views(
        segment: &[PlayerProfile],
        config: &AnalyticsConfig,
    ) -> (Vec<SegmentInsight>, SegmentDiagnostics, Vec<PersonaBreakdown>, Vec<LaunchSignal>, u32) {
        (
            get_segment_insights_with(segment, config),
            get_segment_diagnostics_with(segment, config),
            get_persona_distribution(segment),
            infer_launch_moments_with(segment, config),
            compute_segment_score_with(segment, config),
        )
    }

    #[cfg(feature = "parallel")]
    fn compute_views(
        segment: &[PlayerProfile],
        config: &AnalyticsConfig,
    ) -> (Vec<SegmentInsight>, SegmentDiagnostics, Vec<PersonaBreakdown>, Vec<LaunchSignal>, u32) {
        let ((insights, diagnostics), ((persona_distribution, launch_signals), segment_score)) = rayon::join(
            || {
                rayon::join(
                    || get_segment_insights_with(segment, config),
                    || get_segment_diagnostics_with(segment, config),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || get_persona_distribution(segment),
                            || infer_launch_moments_with(segment, config),
                        )
                    },
                    || compute_segment_score_with(segment, config),
                )
            },
        );
        (insights, diagnostics, persona_distribution, launch_signals, segment_score)
    }
}
