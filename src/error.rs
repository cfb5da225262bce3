use thiserror::Error;

/// A roster that breaks a profile invariant
#[derive(Debug, Error, PartialEq)]
pub enum RosterError {
    #[error("duplicate player id {0}")]
    DuplicateId(String),
    #[error("player {id} has MMR {mmr} outside {min}..={max}")]
    MmrOutOfDomain { id: String, mmr: u32, min: u32, max: u32 },
    #[error("player {id} has win rate {win_rate} outside 0..=100")]
    WinRateOutOfDomain { id: String, win_rate: f64 },
    #[error("player {id} reports zero latency")]
    ZeroLatency { id: String },
}

/// Errors surfaced at the lab's JSON boundary
#[derive(Debug, Error)]
pub enum LabError {
    #[error("invalid roster: {0}")]
    Roster(#[from] RosterError),
    #[error("{context} parse error: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown filter dimension: {0}")]
    UnknownDimension(String),
    #[error("unknown value {value:?} for filter dimension {dimension}")]
    UnknownValue { dimension: String, value: String },
}

impl LabError {
    pub fn json(context: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| LabError::Json { context, source }
    }
}
