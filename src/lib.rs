pub mod error;
pub mod filter;
pub mod insights;
pub mod roster;
pub mod types;

pub use error::{LabError, RosterError};
pub use filter::{filter_players, passes, FilterDimension};
pub use insights::{
    compute_segment_score, get_persona_distribution, get_segment_diagnostics, get_segment_insights,
    infer_launch_moments, SegmentReport,
};
pub use roster::PlayerRepository;
pub use types::*;

use wasm_bindgen::prelude::*;

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // A second init keeps the logger that is already installed
    if log::set_logger(&CONSOLE_LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

/// Forwards `log` records to the browser console
struct ConsoleLogger;

static CONSOLE_LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}: {}", record.level(), record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

impl From<LabError> for JsValue {
    fn from(err: LabError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// WASM-exposed targeting lab: a roster, the current filters and the analytics config
#[wasm_bindgen]
pub struct TargetingLab {
    repository: PlayerRepository,
    filters: SegmentFilters,
    config: AnalyticsConfig,
}

#[wasm_bindgen]
impl TargetingLab {
    /// Create a lab over a seeded demo roster, starting from the default filters
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, player_count: usize) -> TargetingLab {
        TargetingLab {
            repository: PlayerRepository::generate_demo(player_count, seed),
            filters: SegmentFilters::lab_defaults(),
            config: AnalyticsConfig::default(),
        }
    }

    /// Create a lab over a roster supplied as a JSON array of profiles
    pub fn from_roster_json(roster_json: &str) -> Result<TargetingLab, JsValue> {
        Ok(TargetingLab {
            repository: PlayerRepository::from_json(roster_json)?,
            filters: SegmentFilters::lab_defaults(),
            config: AnalyticsConfig::default(),
        })
    }

    /// Get total players in the roster
    pub fn get_total_players(&self) -> usize {
        self.repository.len()
    }

    /// Replace the current filters
    pub fn set_filters(&mut self, filters_json: &str) -> Result<(), JsValue> {
        self.filters = parse_filters(filters_json)?;
        Ok(())
    }

    /// Get the current filters as JSON
    pub fn get_filters(&self) -> String {
        serde_json::to_string(&self.filters).unwrap_or_default()
    }

    /// Select or deselect one value, e.g. `toggle_filter("regions", "EU")`
    pub fn toggle_filter(&mut self, dimension: &str, value: &str) -> Result<(), JsValue> {
        self.filters.toggle_named(dimension, value)?;
        Ok(())
    }

    pub fn set_mmr_range(&mut self, lower: u32, upper: u32) {
        self.filters.set_mmr_range(lower, upper);
    }

    pub fn set_latency_max(&mut self, latency_max: u32) {
        self.filters.set_latency_max(latency_max);
    }

    /// Drop every constraint
    pub fn clear_filters(&mut self) {
        self.filters = SegmentFilters::default();
    }

    /// Go back to the filters the lab opens with
    pub fn reset_filters(&mut self) {
        self.filters = SegmentFilters::lab_defaults();
    }

    /// Get the current segment as JSON
    pub fn get_segment(&self) -> String {
        serde_json::to_string(&self.segment()).unwrap_or_default()
    }

    pub fn get_segment_size(&self) -> usize {
        self.segment().len()
    }

    pub fn get_insights(&self) -> String {
        let insights = insights::get_segment_insights_with(&self.segment(), &self.config);
        serde_json::to_string(&insights).unwrap_or_default()
    }

    pub fn get_diagnostics(&self) -> String {
        let diagnostics = insights::get_segment_diagnostics_with(&self.segment(), &self.config);
        serde_json::to_string(&diagnostics).unwrap_or_default()
    }

    pub fn get_persona_distribution(&self) -> String {
        serde_json::to_string(&get_persona_distribution(&self.segment())).unwrap_or_default()
    }

    pub fn get_launch_signals(&self) -> String {
        let signals = insights::infer_launch_moments_with(&self.segment(), &self.config);
        serde_json::to_string(&signals).unwrap_or_default()
    }

    pub fn get_segment_score(&self) -> u32 {
        insights::compute_segment_score_with(&self.segment(), &self.config)
    }

    /// Get the full report (segment plus every derived view) as JSON
    pub fn get_report(&self) -> String {
        serde_json::to_string(&self.report()).unwrap_or_default()
    }

    /// Update analytics config; omitted fields keep their defaults
    pub fn update_config(&mut self, config_json: &str) -> Result<(), JsValue> {
        self.config = parse_config(config_json)?;
        Ok(())
    }

    pub fn get_config(&self) -> String {
        serde_json::to_string(&self.config).unwrap_or_default()
    }
}

impl TargetingLab {
    pub fn with_repository(repository: PlayerRepository, filters: SegmentFilters, config: AnalyticsConfig) -> Self {
        Self {
            repository,
            filters,
            config,
        }
    }

    pub fn filters(&self) -> &SegmentFilters {
        &self.filters
    }

    pub fn segment(&self) -> Vec<PlayerProfile> {
        filter_players(self.repository.players(), &self.filters)
    }

    pub fn report(&self) -> SegmentReport {
        SegmentReport::build(self.repository.players(), &self.filters, &self.config)
    }
}

fn parse_filters(filters_json: &str) -> Result<SegmentFilters, LabError> {
    serde_json::from_str(filters_json).map_err(LabError::json("Filters"))
}

fn parse_config(config_json: &str) -> Result<AnalyticsConfig, LabError> {
    serde_json::from_str(config_json).map_err(LabError::json("Config"))
}

/// Filter a roster and build every derived view in one call
pub fn analyze(
    roster_json: &str,
    filters_json: &str,
    config_json: Option<&str>,
) -> Result<SegmentReport, LabError> {
    let repository = PlayerRepository::from_json(roster_json)?;
    let filters = parse_filters(filters_json)?;
    let config = match config_json {
        Some(json) => parse_config(json)?,
        None => AnalyticsConfig::default(),
    };
    Ok(SegmentReport::build(repository.players(), &filters, &config))
}

/// One-shot analysis: roster JSON + filters JSON (+ optional config JSON) to report JSON
#[wasm_bindgen]
pub fn analyze_segment(
    roster_json: &str,
    filters_json: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let report = analyze(roster_json, filters_json, config_json.as_deref())?;
    serde_json::to_string(&report).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Get default config as JSON
#[wasm_bindgen]
pub fn get_default_config() -> String {
    serde_json::to_string(&AnalyticsConfig::default()).unwrap_or_default()
}

/// Selectable values per set dimension, keyed like `SegmentFilters`
#[wasm_bindgen]
pub fn get_filter_options() -> String {
    filter_options().to_string()
}

/// Keys of the set dimensions, in panel order
#[wasm_bindgen]
pub fn filter_dimensions() -> js_sys::Array {
    [
        Region::KEY,
        Playstyle::KEY,
        MonetizationTier::KEY,
        DeviceTier::KEY,
        SessionFrequency::KEY,
        PreferredMode::KEY,
    ]
    .iter()
    .map(|key| JsValue::from_str(key))
    .collect()
}

fn filter_options() -> serde_json::Value {
    fn labels<T: std::fmt::Display>(values: &[T]) -> serde_json::Value {
        values.iter().map(|v| v.to_string()).collect::<Vec<_>>().into()
    }

    let mut options = serde_json::Map::new();
    options.insert(Region::KEY.to_string(), labels(&Region::ALL));
    options.insert(Playstyle::KEY.to_string(), labels(&Playstyle::ALL));
    options.insert(MonetizationTier::KEY.to_string(), labels(&MonetizationTier::ALL));
    options.insert(DeviceTier::KEY.to_string(), labels(&DeviceTier::ALL));
    options.insert(SessionFrequency::KEY.to_string(), labels(&SessionFrequency::ALL));
    options.insert(PreferredMode::KEY.to_string(), labels(&PreferredMode::ALL));
    serde_json::Value::Object(options)
}
