use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic regions a player can be homed in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    NA,
    EU,
    APAC,
    LATAM,
    MEA,
}

impl Region {
    pub const ALL: [Region; 5] = [Region::NA, Region::EU, Region::APAC, Region::LATAM, Region::MEA];

    pub fn label(&self) -> &'static str {
        match self {
            Region::NA => "NA",
            Region::EU => "EU",
            Region::APAC => "APAC",
            Region::LATAM => "LATAM",
            Region::MEA => "MEA",
        }
    }
}

/// Declared playstyle, used as the persona archetype
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Playstyle {
    Aggressor,
    Strategist,
    Support,
    Wildcard,
    Rookie,
    Veteran,
}

impl Playstyle {
    pub const ALL: [Playstyle; 6] = [
        Playstyle::Aggressor,
        Playstyle::Strategist,
        Playstyle::Support,
        Playstyle::Wildcard,
        Playstyle::Rookie,
        Playstyle::Veteran,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Playstyle::Aggressor => "Aggressor",
            Playstyle::Strategist => "Strategist",
            Playstyle::Support => "Support",
            Playstyle::Wildcard => "Wildcard",
            Playstyle::Rookie => "Rookie",
            Playstyle::Veteran => "Veteran",
        }
    }
}

/// Handset performance bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceTier {
    High,
    Mid,
    Low,
}

impl DeviceTier {
    pub const ALL: [DeviceTier; 3] = [DeviceTier::High, DeviceTier::Mid, DeviceTier::Low];

    pub fn label(&self) -> &'static str {
        match self {
            DeviceTier::High => "High",
            DeviceTier::Mid => "Mid",
            DeviceTier::Low => "Low",
        }
    }
}

/// How often a player opens a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionFrequency {
    Daily,
    Weekly,
    Weekend,
}

impl SessionFrequency {
    pub const ALL: [SessionFrequency; 3] = [
        SessionFrequency::Daily,
        SessionFrequency::Weekly,
        SessionFrequency::Weekend,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SessionFrequency::Daily => "Daily",
            SessionFrequency::Weekly => "Weekly",
            SessionFrequency::Weekend => "Weekend",
        }
    }
}

/// Game mode a player queues for most
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PreferredMode {
    Ranked,
    Arcade,
    #[serde(rename = "Co-op")]
    Coop,
    Events,
}

impl PreferredMode {
    pub const ALL: [PreferredMode; 4] = [
        PreferredMode::Ranked,
        PreferredMode::Arcade,
        PreferredMode::Coop,
        PreferredMode::Events,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PreferredMode::Ranked => "Ranked",
            PreferredMode::Arcade => "Arcade",
            PreferredMode::Coop => "Co-op",
            PreferredMode::Events => "Events",
        }
    }
}

/// Highest spend tier a player has reached
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MonetizationTier {
    None,
    Cosmetics,
    BattlePass,
    Premium,
}

impl MonetizationTier {
    pub const ALL: [MonetizationTier; 4] = [
        MonetizationTier::None,
        MonetizationTier::Cosmetics,
        MonetizationTier::BattlePass,
        MonetizationTier::Premium,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MonetizationTier::None => "None",
            MonetizationTier::Cosmetics => "Cosmetics",
            MonetizationTier::BattlePass => "BattlePass",
            MonetizationTier::Premium => "Premium",
        }
    }
}

macro_rules! impl_display_via_label {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )*
    };
}

impl_display_via_label!(
    Region,
    Playstyle,
    DeviceTier,
    SessionFrequency,
    PreferredMode,
    MonetizationTier,
);

/// Lowest matchmaking rating a profile may carry
pub const MMR_MIN: u32 = 600;
/// Highest matchmaking rating a profile may carry
pub const MMR_MAX: u32 = 2400;

/// A player profile as loaded into the repository
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: String,
    pub gamer_tag: String,
    pub region: Region,
    pub playstyle: Playstyle,
    pub device_tier: DeviceTier,
    pub session_frequency: SessionFrequency,
    pub preferred_mode: PreferredMode,
    pub monetization: MonetizationTier,
    /// Matchmaking rating in [600, 2400]
    pub mmr: u32,
    /// Win rate percentage in [0, 100]
    pub win_rate: f64,
    /// Round-trip latency to the nearest edge (ms)
    pub latency: u32,
}

/// Filter criteria selected in the targeting lab.
///
/// Every field is optional. `None` leaves the dimension unconstrained, while
/// `Some(vec![])` is an allow-list that admits nothing. The two states
/// survive a JSON round trip: a missing key decodes to `None`, `[]` to an
/// empty list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<Region>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playstyles: Option<Vec<Playstyle>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monetization: Option<Vec<MonetizationTier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_tier: Option<Vec<DeviceTier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_frequency: Option<Vec<SessionFrequency>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_mode: Option<Vec<PreferredMode>>,
    /// Inclusive `[min, max]` MMR envelope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mmr_range: Option<(u32, u32)>,
    /// Inclusive latency ceiling (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_max: Option<u32>,
}

/// A labeled KPI with a polarity flag
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentInsight {
    pub label: String,
    pub value: i64,
    pub unit: String,
    /// Whether the value reads as favorable
    pub positive: bool,
}

/// Categorical bucket derived from the health score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StressLevel {
    Stable,
    Elevated,
    Critical,
}

impl StressLevel {
    pub fn from_health(health_score: u8, config: &AnalyticsConfig) -> Self {
        if health_score >= config.stable_threshold {
            StressLevel::Stable
        } else if health_score >= config.elevated_threshold {
            StressLevel::Elevated
        } else {
            StressLevel::Critical
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDiagnostics {
    /// Composite stability metric in [0, 100]
    pub health_score: u8,
    pub stress_level: StressLevel,
    /// Matchmaking reliability percentage in [0, 100]
    pub match_confidence: u8,
    /// Live-ops recommendations, highest priority first
    pub recommendations: Vec<String>,
}

/// Share of the segment held by one archetype
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaBreakdown {
    pub archetype: Playstyle,
    pub percentage: u8,
}

/// Projected interest of the segment in one live-ops event archetype
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSignal {
    pub label: String,
    pub impact: u8,
}

/// Behavioral attribute a launch archetype targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum BehaviorTrait {
    SessionFrequency(SessionFrequency),
    PreferredMode(PreferredMode),
    Monetization(MonetizationTier),
}

impl BehaviorTrait {
    pub fn matches(&self, profile: &PlayerProfile) -> bool {
        match self {
            BehaviorTrait::SessionFrequency(f) => profile.session_frequency == *f,
            BehaviorTrait::PreferredMode(m) => profile.preferred_mode == *m,
            BehaviorTrait::Monetization(t) => profile.monetization == *t,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraitWeight {
    #[serde(rename = "trait")]
    pub behavior: BehaviorTrait,
    pub weight: f64,
}

/// A live-ops event and the behavioral mix it appeals to
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaunchArchetype {
    pub label: String,
    /// Weights should sum to 1 so impact stays within [0, 100]
    pub weights: Vec<TraitWeight>,
}

impl LaunchArchetype {
    fn new(label: &str, weights: &[(BehaviorTrait, f64)]) -> Self {
        Self {
            label: label.to_string(),
            weights: weights
                .iter()
                .map(|&(behavior, weight)| TraitWeight { behavior, weight })
                .collect(),
        }
    }
}

/// Tunable coefficients for the insight calculators.
///
/// The numbers are illustrative heuristics. Any subset may be overridden from
/// JSON; missing fields keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// KPI polarity thresholds
    pub min_viable_population: usize,
    pub mmr_positive_floor: f64,
    pub win_rate_positive_floor: f64,
    pub latency_positive_ceiling: f64,

    /// Health score components
    pub mmr_spread_ceiling: f64,
    pub latency_floor_ms: f64,
    pub latency_ceiling_ms: f64,
    pub win_rate_spread_ceiling: f64,
    pub health_weight_mmr: f64,
    pub health_weight_latency: f64,
    pub health_weight_win_rate: f64,

    /// Stress level cutoffs on the health score
    pub stable_threshold: u8,
    pub elevated_threshold: u8,

    /// Match confidence components
    pub latency_jitter_ceiling: f64,
    pub confidence_weight_mmr: f64,
    pub confidence_weight_latency: f64,

    /// Recommendation triggers
    pub latency_variance_alert_ms: f64,
    pub latency_mean_alert_ms: f64,
    pub mmr_spread_alert: f64,
    pub win_rate_spread_alert: f64,
    pub low_device_share_alert: f64,

    /// Segment score
    pub population_target: usize,
    pub score_weight_population: f64,
    pub score_weight_health: f64,
    pub score_weight_diversity: f64,

    /// Live-ops event catalog
    pub launch_catalog: Vec<LaunchArchetype>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        use BehaviorTrait::{Monetization as Mon, PreferredMode as Mode, SessionFrequency as Freq};

        Self {
            min_viable_population: 10,
            mmr_positive_floor: 1400.0,
            win_rate_positive_floor: 50.0,
            latency_positive_ceiling: 80.0,
            mmr_spread_ceiling: 600.0,
            latency_floor_ms: 40.0,
            latency_ceiling_ms: 160.0,
            win_rate_spread_ceiling: 25.0,
            health_weight_mmr: 0.40,
            health_weight_latency: 0.35,
            health_weight_win_rate: 0.25,
            stable_threshold: 75,
            elevated_threshold: 50,
            latency_jitter_ceiling: 60.0,
            confidence_weight_mmr: 0.55,
            confidence_weight_latency: 0.45,
            latency_variance_alert_ms: 35.0,
            latency_mean_alert_ms: 100.0,
            mmr_spread_alert: 300.0,
            win_rate_spread_alert: 12.0,
            low_device_share_alert: 0.40,
            population_target: 25,
            score_weight_population: 0.30,
            score_weight_health: 0.50,
            score_weight_diversity: 0.20,
            launch_catalog: vec![
                LaunchArchetype::new(
                    "Ranked Season Kickoff",
                    &[
                        (Mode(PreferredMode::Ranked), 0.50),
                        (Freq(SessionFrequency::Daily), 0.30),
                        (Mon(MonetizationTier::BattlePass), 0.20),
                    ],
                ),
                LaunchArchetype::new(
                    "Weekend Arcade Blitz",
                    &[
                        (Mode(PreferredMode::Arcade), 0.45),
                        (Freq(SessionFrequency::Weekend), 0.40),
                        (Mon(MonetizationTier::Cosmetics), 0.15),
                    ],
                ),
                LaunchArchetype::new(
                    "Co-op Raid Week",
                    &[
                        (Mode(PreferredMode::Coop), 0.50),
                        (Freq(SessionFrequency::Weekly), 0.30),
                        (Mon(MonetizationTier::None), 0.20),
                    ],
                ),
                LaunchArchetype::new(
                    "Limited-Time Event Drop",
                    &[
                        (Mode(PreferredMode::Events), 0.45),
                        (Mon(MonetizationTier::Premium), 0.35),
                        (Freq(SessionFrequency::Daily), 0.20),
                    ],
                ),
                LaunchArchetype::new(
                    "Battle Pass Relaunch",
                    &[
                        (Mon(MonetizationTier::BattlePass), 0.50),
                        (Freq(SessionFrequency::Daily), 0.25),
                        (Freq(SessionFrequency::Weekly), 0.25),
                    ],
                ),
                LaunchArchetype::new(
                    "Cosmetic Flash Sale",
                    &[
                        (Mon(MonetizationTier::Cosmetics), 0.50),
                        (Freq(SessionFrequency::Weekend), 0.30),
                        (Mon(MonetizationTier::Premium), 0.20),
                    ],
                ),
            ],
        }
    }
}
