use crate::error::{LabError, RosterError};
use crate::types::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

const TAG_PREFIXES: [&str; 12] = [
    "Nova", "Hex", "Rift", "Volt", "Ember", "Shade", "Pulse", "Frost", "Echo", "Blitz", "Onyx", "Drift",
];
const TAG_SUFFIXES: [&str; 10] = [
    "Fang", "Runner", "Core", "Wing", "Byte", "Storm", "Warden", "Spark", "Jolt", "Viper",
];

const MMR_MIDPOINT: f64 = (MMR_MIN + MMR_MAX) as f64 / 2.0;
const MMR_PER_SIGMA: f64 = (MMR_MAX - MMR_MIN) as f64 / (2.0 * SKILL_Z_LIMIT);
const SKILL_Z_LIMIT: f64 = 3.0;
const WIN_RATE_PER_SIGMA: f64 = 4.0;

/// Read-only roster of player profiles, validated on construction
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerRepository {
    players: Vec<PlayerProfile>,
}

impl PlayerRepository {
    /// Wrap a roster, rejecting duplicate ids and out-of-domain attributes
    pub fn new(players: Vec<PlayerProfile>) -> Result<Self, RosterError> {
        validate_roster(&players)?;
        log::info!("loaded roster with {} players", players.len());
        Ok(Self { players })
    }

    /// Parse a JSON array of profiles
    pub fn from_json(json: &str) -> Result<Self, LabError> {
        let players: Vec<PlayerProfile> = serde_json::from_str(json).map_err(LabError::json("Roster"))?;
        Ok(Self::new(players)?)
    }

    pub fn players(&self) -> &[PlayerProfile] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PlayerProfile> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Generate a synthetic roster. The same seed always yields the same roster.
    pub fn generate_demo(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        // (region, share of the player base, base latency in ms)
        let regions: [(Region, f64, f64); 5] = [
            (Region::NA, 0.30, 45.0),
            (Region::EU, 0.28, 50.0),
            (Region::APAC, 0.22, 60.0),
            (Region::LATAM, 0.12, 80.0),
            (Region::MEA, 0.08, 95.0),
        ];

        let mut players = Vec::with_capacity(count);
        for i in 0..count {
            // Select region based on weights
            let r: f64 = rng.gen();
            let mut cumulative = 0.0;
            let (mut region, mut base_latency) = (regions[0].0, regions[0].2);
            for &(candidate, weight, latency) in &regions {
                cumulative += weight;
                if r < cumulative {
                    region = candidate;
                    base_latency = latency;
                    break;
                }
            }

            let skill = skill_z_score(&mut rng);
            let mmr = mmr_for_skill(skill);
            let win_rate = ((50.0 + skill * WIN_RATE_PER_SIGMA + rng.gen_range(-8.0..8.0)) * 10.0).round() / 10.0;

            let device_tier = match rng.gen_range(0..10) {
                0..=3 => DeviceTier::High,
                4..=7 => DeviceTier::Mid,
                _ => DeviceTier::Low,
            };

            // Weaker handsets add render and network overhead
            let device_penalty: f64 = match device_tier {
                DeviceTier::High => 0.0,
                DeviceTier::Mid => 10.0,
                DeviceTier::Low => 25.0,
            };
            let latency = (base_latency + device_penalty + rng.gen_range(-15.0..40.0)).max(15.0).round() as u32;

            let playstyle = if mmr < 1000 {
                Playstyle::Rookie
            } else if mmr > 1900 && rng.gen_bool(0.5) {
                Playstyle::Veteran
            } else {
                match rng.gen_range(0..4) {
                    0 => Playstyle::Aggressor,
                    1 => Playstyle::Strategist,
                    2 => Playstyle::Support,
                    _ => Playstyle::Wildcard,
                }
            };

            let session_frequency = match rng.gen_range(0..10) {
                0..=4 => SessionFrequency::Daily,
                5..=7 => SessionFrequency::Weekly,
                _ => SessionFrequency::Weekend,
            };

            // Competitive players lean ranked
            let preferred_mode = if mmr > 1700 && rng.gen_bool(0.6) {
                PreferredMode::Ranked
            } else {
                PreferredMode::ALL[rng.gen_range(0..PreferredMode::ALL.len())]
            };

            let monetization = match rng.gen_range(0..20) {
                0..=7 => MonetizationTier::None,
                8..=12 => MonetizationTier::Cosmetics,
                13..=17 => MonetizationTier::BattlePass,
                _ => MonetizationTier::Premium,
            };

            let gamer_tag = format!(
                "{}{}{}",
                TAG_PREFIXES[rng.gen_range(0..TAG_PREFIXES.len())],
                TAG_SUFFIXES[rng.gen_range(0..TAG_SUFFIXES.len())],
                rng.gen_range(1..100)
            );

            players.push(PlayerProfile {
                id: format!("p-{:04}", i + 1),
                gamer_tag,
                region,
                playstyle,
                device_tier,
                session_frequency,
                preferred_mode,
                monetization,
                mmr,
                win_rate: win_rate.clamp(0.0, 100.0),
                latency,
            });
        }

        log::debug!("generated demo roster of {} players (seed {})", count, seed);
        Self { players }
    }
}

fn validate_roster(players: &[PlayerProfile]) -> Result<(), RosterError> {
    let mut seen = HashSet::with_capacity(players.len());
    for player in players {
        if !seen.insert(player.id.as_str()) {
            return Err(RosterError::DuplicateId(player.id.clone()));
        }
        validate_profile(player)?;
    }
    Ok(())
}

fn validate_profile(player: &PlayerProfile) -> Result<(), RosterError> {
    if !(MMR_MIN..=MMR_MAX).contains(&player.mmr) {
        return Err(RosterError::MmrOutOfDomain {
            id: player.id.clone(),
            mmr: player.mmr,
            min: MMR_MIN,
            max: MMR_MAX,
        });
    }
    if !player.win_rate.is_finite() || !(0.0..=100.0).contains(&player.win_rate) {
        return Err(RosterError::WinRateOutOfDomain {
            id: player.id.clone(),
            win_rate: player.win_rate,
        });
    }
    if player.latency == 0 {
        return Err(RosterError::ZeroLatency { id: player.id.clone() });
    }
    Ok(())
}

/// Standard score of a demo player's skill. Twelve unit uniforms sum to
/// mean 6 and variance 1, close enough to a normal draw for a demo.
fn skill_z_score(rng: &mut impl Rng) -> f64 {
    let sum: f64 = (0..12).map(|_| rng.gen::<f64>()).sum();
    (sum - 6.0).clamp(-SKILL_Z_LIMIT, SKILL_Z_LIMIT)
}

/// Place a skill score on the rating ladder. The ladder midpoint is the
/// average player and three sigma reach either end of the domain.
fn mmr_for_skill(z: f64) -> u32 {
    let rating = MMR_MIDPOINT + z * MMR_PER_SIGMA;
    rating.round().clamp(MMR_MIN as f64, MMR_MAX as f64) as u32
}
