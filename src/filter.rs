use crate::error::LabError;
use crate::types::*;
use serde::de::DeserializeOwned;

/// Lower bound of the MMR envelope slider; an envelope reaching it is unconstrained
pub const MMR_ENVELOPE_FLOOR: u32 = 800;
/// Upper bound of the MMR envelope slider
pub const MMR_ENVELOPE_CEILING: u32 = 2100;
/// Latency ceilings at or above this value remove the latency constraint
pub const LATENCY_CEILING_MAX: u32 = 150;

/// Check whether a profile satisfies every active filter dimension.
///
/// Dimensions are ANDed and a set admits any of its members. A missing
/// dimension always passes; a present but empty set never does.
pub fn passes(profile: &PlayerProfile, filters: &SegmentFilters) -> bool {
    allows(&filters.regions, &profile.region)
        && allows(&filters.playstyles, &profile.playstyle)
        && allows(&filters.monetization, &profile.monetization)
        && allows(&filters.device_tier, &profile.device_tier)
        && allows(&filters.session_frequency, &profile.session_frequency)
        && allows(&filters.preferred_mode, &profile.preferred_mode)
        && filters
            .mmr_range
            .map_or(true, |(min, max)| profile.mmr >= min && profile.mmr <= max)
        && filters
            .latency_max
            .map_or(true, |ceiling| profile.latency <= ceiling)
}

fn allows<T: PartialEq>(allowed: &Option<Vec<T>>, value: &T) -> bool {
    match allowed {
        None => true,
        Some(values) => values.contains(value),
    }
}

/// Build the segment: every roster member that passes, in roster order
pub fn filter_players(roster: &[PlayerProfile], filters: &SegmentFilters) -> Vec<PlayerProfile> {
    if let Some(dimension) = filters.empty_allow_list() {
        log::warn!("filter dimension {} has an empty allow-list; segment will be empty", dimension);
    }

    let segment: Vec<PlayerProfile> = roster
        .iter()
        .filter(|profile| passes(profile, filters))
        .cloned()
        .collect();

    log::debug!("segment filter kept {} of {} players", segment.len(), roster.len());
    segment
}

/// A categorical attribute that can be constrained by an allow-list
pub trait FilterDimension: Copy + PartialEq + Sized {
    /// JSON key of the dimension in `SegmentFilters`
    const KEY: &'static str;

    fn slot(filters: &mut SegmentFilters) -> &mut Option<Vec<Self>>;
}

macro_rules! filter_dimension {
    ($ty:ty, $key:literal, $field:ident) => {
        impl FilterDimension for $ty {
            const KEY: &'static str = $key;

            fn slot(filters: &mut SegmentFilters) -> &mut Option<Vec<Self>> {
                &mut filters.$field
            }
        }
    };
}

filter_dimension!(Region, "regions", regions);
filter_dimension!(Playstyle, "playstyles", playstyles);
filter_dimension!(MonetizationTier, "monetization", monetization);
filter_dimension!(DeviceTier, "deviceTier", device_tier);
filter_dimension!(SessionFrequency, "sessionFrequency", session_frequency);
filter_dimension!(PreferredMode, "preferredMode", preferred_mode);

impl SegmentFilters {
    /// Filters the lab opens with
    pub fn lab_defaults() -> Self {
        Self {
            regions: Some(vec![Region::NA, Region::EU, Region::APAC]),
            session_frequency: Some(vec![SessionFrequency::Daily, SessionFrequency::Weekly]),
            mmr_range: Some((1100, 2000)),
            latency_max: Some(120),
            ..Default::default()
        }
    }

    /// True when no dimension is constrained
    pub fn is_unconstrained(&self) -> bool {
        *self == SegmentFilters::default()
    }

    /// Add `value` to its dimension, or remove it if already selected.
    ///
    /// Removing the last value drops the dimension entirely so the
    /// segment widens back out instead of collapsing to nothing.
    pub fn toggle<T: FilterDimension>(&mut self, value: T) {
        let slot = T::slot(self);
        let mut values = slot.take().unwrap_or_default();

        if let Some(pos) = values.iter().position(|v| *v == value) {
            values.remove(pos);
        } else {
            values.push(value);
        }

        if !values.is_empty() {
            *slot = Some(values);
        }
    }

    /// Toggle a value addressed by its JSON dimension key and label
    pub fn toggle_named(&mut self, dimension: &str, value: &str) -> Result<(), LabError> {
        match dimension {
            Region::KEY => self.toggle_parsed::<Region>(dimension, value),
            Playstyle::KEY => self.toggle_parsed::<Playstyle>(dimension, value),
            MonetizationTier::KEY => self.toggle_parsed::<MonetizationTier>(dimension, value),
            DeviceTier::KEY => self.toggle_parsed::<DeviceTier>(dimension, value),
            SessionFrequency::KEY => self.toggle_parsed::<SessionFrequency>(dimension, value),
            PreferredMode::KEY => self.toggle_parsed::<PreferredMode>(dimension, value),
            _ => Err(LabError::UnknownDimension(dimension.to_string())),
        }
    }

    fn toggle_parsed<T>(&mut self, dimension: &str, value: &str) -> Result<(), LabError>
    where
        T: FilterDimension + DeserializeOwned,
    {
        let parsed: T = serde_json::from_value(serde_json::Value::String(value.to_string()))
            .map_err(|_| LabError::UnknownValue {
                dimension: dimension.to_string(),
                value: value.to_string(),
            })?;
        self.toggle(parsed);
        Ok(())
    }

    /// Set the MMR envelope from the slider's lower and upper handle.
    ///
    /// Handles resting at the slider ends clear the constraint. Crossed
    /// handles never clear it and are stored in ascending order.
    pub fn set_mmr_range(&mut self, lower: u32, upper: u32) {
        if lower <= MMR_ENVELOPE_FLOOR && upper >= MMR_ENVELOPE_CEILING {
            self.mmr_range = None;
        } else {
            self.mmr_range = Some((lower.min(upper), lower.max(upper)));
        }
    }

    pub fn set_latency_max(&mut self, ceiling: u32) {
        if ceiling >= LATENCY_CEILING_MAX {
            self.latency_max = None;
        } else {
            self.latency_max = Some(ceiling);
        }
    }

    /// First set dimension that is present but empty, if any
    pub fn empty_allow_list(&self) -> Option<&'static str> {
        fn empty<T>(values: &Option<Vec<T>>) -> bool {
            values.as_ref().map_or(false, |v| v.is_empty())
        }

        if empty(&self.regions) {
            Some(Region::KEY)
        } else if empty(&self.playstyles) {
            Some(Playstyle::KEY)
        } else if empty(&self.monetization) {
            Some(MonetizationTier::KEY)
        } else if empty(&self.device_tier) {
            Some(DeviceTier::KEY)
        } else if empty(&self.session_frequency) {
            Some(SessionFrequency::KEY)
        } else if empty(&self.preferred_mode) {
            Some(PreferredMode::KEY)
        } else {
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn profile(id: &str, region: Region, mmr: u32, latency: u32, playstyle: Playstyle) -> PlayerProfile {
        PlayerProfile {
            id: id.to_string(),
            gamer_tag: format!("tag-{}", id),
            region,
            playstyle,
            device_tier: DeviceTier::Mid,
            session_frequency: SessionFrequency::Daily,
            preferred_mode: PreferredMode::Ranked,
            monetization: MonetizationTier::None,
            mmr,
            win_rate: 50.0,
            latency,
        }
    }

    /// A(NA, 1500, 40ms, Aggressor), B(EU, 1800, 90ms, Strategist), C(NA, 1200, 150ms, Aggressor)
    pub(crate) fn abc_roster() -> Vec<PlayerProfile> {
        vec![
            profile("A", Region::NA, 1500, 40, Playstyle::Aggressor),
            profile("B", Region::EU, 1800, 90, Playstyle::Strategist),
            profile("C", Region::NA, 1200, 150, Playstyle::Aggressor),
        ]
    }

    fn ids(segment: &[PlayerProfile]) -> Vec<&str> {
        segment.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_region_filter_keeps_roster_order() {
        let filters = SegmentFilters {
            regions: Some(vec![Region::NA]),
            ..Default::default()
        };
        let segment = filter_players(&abc_roster(), &filters);
        assert_eq!(ids(&segment), vec!["A", "C"]);
    }

    #[test]
    fn test_mmr_range_is_inclusive() {
        let filters = SegmentFilters {
            mmr_range: Some((1600, 2000)),
            ..Default::default()
        };
        assert_eq!(ids(&filter_players(&abc_roster(), &filters)), vec!["B"]);

        let edges = SegmentFilters {
            mmr_range: Some((1200, 1500)),
            ..Default::default()
        };
        assert_eq!(ids(&filter_players(&abc_roster(), &edges)), vec!["A", "C"]);
    }

    #[test]
    fn test_latency_ceiling_is_inclusive() {
        let filters = SegmentFilters {
            latency_max: Some(90),
            ..Default::default()
        };
        assert_eq!(ids(&filter_players(&abc_roster(), &filters)), vec!["A", "B"]);
    }

    #[test]
    fn test_empty_filters_return_full_roster() {
        let roster = abc_roster();
        let segment = filter_players(&roster, &SegmentFilters::default());
        assert_eq!(segment, roster);
    }

    #[test]
    fn test_empty_allow_list_fails_closed() {
        let cases: [(SegmentFilters, &str); 6] = [
            (SegmentFilters { regions: Some(vec![]), ..Default::default() }, Region::KEY),
            (SegmentFilters { playstyles: Some(vec![]), ..Default::default() }, Playstyle::KEY),
            (SegmentFilters { monetization: Some(vec![]), ..Default::default() }, MonetizationTier::KEY),
            (SegmentFilters { device_tier: Some(vec![]), ..Default::default() }, DeviceTier::KEY),
            (SegmentFilters { session_frequency: Some(vec![]), ..Default::default() }, SessionFrequency::KEY),
            (SegmentFilters { preferred_mode: Some(vec![]), ..Default::default() }, PreferredMode::KEY),
        ];
        for (filters, key) in cases {
            assert_eq!(filters.empty_allow_list(), Some(key));
            assert!(!filters.is_unconstrained(), "{} should constrain", key);
            assert!(filter_players(&abc_roster(), &filters).is_empty(), "{} admitted players", key);
        }
    }

    #[test]
    fn test_inverted_mmr_range_admits_nothing() {
        let filters = SegmentFilters {
            mmr_range: Some((2000, 1000)),
            ..Default::default()
        };
        assert!(filter_players(&abc_roster(), &filters).is_empty());
    }

    #[test]
    fn test_dimensions_are_anded() {
        let filters = SegmentFilters {
            regions: Some(vec![Region::NA]),
            latency_max: Some(100),
            ..Default::default()
        };
        assert_eq!(ids(&filter_players(&abc_roster(), &filters)), vec!["A"]);
    }

    #[test]
    fn test_toggle_removes_dimension_when_emptied() {
        let mut filters = SegmentFilters::default();
        filters.toggle(Region::EU);
        filters.toggle(Region::NA);
        assert_eq!(filters.regions, Some(vec![Region::EU, Region::NA]));

        filters.toggle(Region::EU);
        assert_eq!(filters.regions, Some(vec![Region::NA]));

        filters.toggle(Region::NA);
        assert_eq!(filters.regions, None);
        assert!(filters.is_unconstrained());
    }

    #[test]
    fn test_toggle_named_parses_labels() {
        let mut filters = SegmentFilters::default();
        filters.toggle_named("preferredMode", "Co-op").unwrap();
        filters.toggle_named("deviceTier", "Low").unwrap();
        assert_eq!(filters.preferred_mode, Some(vec![PreferredMode::Coop]));
        assert_eq!(filters.device_tier, Some(vec![DeviceTier::Low]));

        assert!(matches!(
            filters.toggle_named("platform", "PC"),
            Err(LabError::UnknownDimension(_))
        ));
        assert!(matches!(
            filters.toggle_named("regions", "Antarctica"),
            Err(LabError::UnknownValue { .. })
        ));
    }

    #[test]
    fn test_mmr_envelope_normalization() {
        let mut filters = SegmentFilters::default();
        filters.set_mmr_range(1900, 1200);
        assert_eq!(filters.mmr_range, Some((1200, 1900)));

        filters.set_mmr_range(800, 2100);
        assert_eq!(filters.mmr_range, None);

        filters.set_mmr_range(700, 2400);
        assert_eq!(filters.mmr_range, None);

        filters.set_mmr_range(850, 2100);
        assert_eq!(filters.mmr_range, Some((850, 2100)));

        // Crossed handles past both ends still constrain
        filters.set_mmr_range(2150, 800);
        assert_eq!(filters.mmr_range, Some((800, 2150)));
    }

    #[test]
    fn test_latency_ceiling_clears_at_slider_max() {
        let mut filters = SegmentFilters::default();
        filters.set_latency_max(95);
        assert_eq!(filters.latency_max, Some(95));
        filters.set_latency_max(150);
        assert_eq!(filters.latency_max, None);
    }

    #[test]
    fn test_lab_defaults() {
        let filters = SegmentFilters::lab_defaults();
        assert_eq!(filters.latency_max, Some(120));
        assert_eq!(filters.mmr_range, Some((1100, 2000)));
        assert_eq!(filters.playstyles, None);
        // C sits above the 120ms ceiling
        let segment = filter_players(&abc_roster(), &filters);
        assert_eq!(ids(&segment), vec!["A", "B"]);
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;
        use proptest::sample::{select, subsequence};

        fn profile_strategy() -> impl Strategy<Value = PlayerProfile> {
            (
                select(Region::ALL.to_vec()),
                select(Playstyle::ALL.to_vec()),
                select(DeviceTier::ALL.to_vec()),
                select(SessionFrequency::ALL.to_vec()),
                select(PreferredMode::ALL.to_vec()),
                select(MonetizationTier::ALL.to_vec()),
                MMR_MIN..=MMR_MAX,
                0.0f64..=100.0,
                10u32..250,
            )
                .prop_map(
                    |(region, playstyle, device_tier, session_frequency, preferred_mode, monetization, mmr, win_rate, latency)| {
                        PlayerProfile {
                            id: String::new(),
                            gamer_tag: String::new(),
                            region,
                            playstyle,
                            device_tier,
                            session_frequency,
                            preferred_mode,
                            monetization,
                            mmr,
                            win_rate,
                            latency,
                        }
                    },
                )
        }

        fn roster_strategy() -> impl Strategy<Value = Vec<PlayerProfile>> {
            prop::collection::vec(profile_strategy(), 0..40).prop_map(|mut roster| {
                for (i, p) in roster.iter_mut().enumerate() {
                    p.id = format!("p{}", i);
                    p.gamer_tag = format!("Player{}", i);
                }
                roster
            })
        }

        fn filters_strategy() -> impl Strategy<Value = SegmentFilters> {
            (
                prop::option::of(subsequence(Region::ALL.to_vec(), 0..=5)),
                prop::option::of(subsequence(Playstyle::ALL.to_vec(), 0..=6)),
                prop::option::of(subsequence(MonetizationTier::ALL.to_vec(), 0..=4)),
                prop::option::of(subsequence(DeviceTier::ALL.to_vec(), 0..=3)),
                prop::option::of(subsequence(SessionFrequency::ALL.to_vec(), 0..=3)),
                prop::option::of(subsequence(PreferredMode::ALL.to_vec(), 0..=4)),
                prop::option::of((MMR_MIN..=MMR_MAX, MMR_MIN..=MMR_MAX)),
                prop::option::of(10u32..250),
            )
                .prop_map(
                    |(regions, playstyles, monetization, device_tier, session_frequency, preferred_mode, mmr_range, latency_max)| {
                        SegmentFilters {
                            regions,
                            playstyles,
                            monetization,
                            device_tier,
                            session_frequency,
                            preferred_mode,
                            mmr_range,
                            latency_max,
                        }
                    },
                )
        }

        fn is_subsequence(segment: &[PlayerProfile], roster: &[PlayerProfile]) -> bool {
            let mut rest = roster.iter();
            segment.iter().all(|member| rest.any(|p| p == member))
        }

        proptest! {
            #[test]
            fn prop_segment_is_ordered_subsequence(roster in roster_strategy(), filters in filters_strategy()) {
                let segment = filter_players(&roster, &filters);
                prop_assert!(is_subsequence(&segment, &roster));
                prop_assert!(segment.iter().all(|p| passes(p, &filters)));
            }

            #[test]
            fn prop_filtering_is_idempotent(roster in roster_strategy(), filters in filters_strategy()) {
                let once = filter_players(&roster, &filters);
                let twice = filter_players(&once, &filters);
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn prop_narrowing_never_grows_segment(
                roster in roster_strategy(),
                filters in filters_strategy(),
                ceiling in 10u32..250,
                drop_region in any::<bool>(),
                drop_playstyle in any::<bool>(),
                envelope in prop::option::of((MMR_MIN..=MMR_MAX, MMR_MIN..=MMR_MAX)),
            ) {
                let mut narrowed = filters.clone();
                narrowed.latency_max = Some(filters.latency_max.map_or(ceiling, |c| c.min(ceiling)));
                if drop_region {
                    narrowed.regions = Some(match &filters.regions {
                        Some(regions) => regions.iter().skip(1).copied().collect(),
                        None => vec![Region::NA],
                    });
                }
                if drop_playstyle {
                    narrowed.playstyles = Some(match &filters.playstyles {
                        Some(playstyles) => playstyles.iter().skip(1).copied().collect(),
                        None => vec![Playstyle::Support],
                    });
                }
                // Intersect the MMR band with a second band
                if let Some((lo, hi)) = envelope {
                    narrowed.mmr_range = Some(match filters.mmr_range {
                        Some((min, max)) => (min.max(lo), max.min(hi)),
                        None => (lo, hi),
                    });
                }

                let wide = filter_players(&roster, &filters);
                let narrow = filter_players(&roster, &narrowed);
                prop_assert!(narrow.len() <= wide.len());
                prop_assert!(is_subsequence(&narrow, &wide));
            }

            #[test]
            fn prop_unconstrained_filters_keep_everything(roster in roster_strategy()) {
                prop_assert_eq!(filter_players(&roster, &SegmentFilters::default()), roster);
            }
        }
    }
}
