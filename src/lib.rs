//! # MOI - Market Overheat Index
//!
//! A bounded, time-decaying "overheat" score for a market signal, persisted
//! between batch invocations, plus a publisher that promotes rendered chart
//! and stats artifacts into a publicly served directory.
//!
//! ## Scoring
//!
//! Each run (typically every few minutes) does:
//!
//! ```text
//! prev    = state.load()                          // 50.0 if missing/corrupt
//! cooled  = prev * (1 - rate) + 50 * rate         // rate from the calendar
//! z       = (cooled - 50) / 15 + contribution     // pluggable signal source
//! value   = clamp(50 + 15 * z, 0, 100)
//! label   = classify(value)
//! state.save(value)
//! ```
//!
//! | Label | Range |
//! |-------|-------|
//! | calm | < 20 |
//! | somewhat-calm | 20 - 40 |
//! | normal | 40 - 60 |
//! | somewhat-overheated | 60 - 75 |
//! | overheated | 75 - 90 |
//! | extreme-overheated | >= 90 |
//!
//! Quiet calendar days (weekends) decay faster (0.08) than trading days
//! (0.05). Snapshot mode additionally freezes the reading into a daily file.
//!
//! ## Publishing
//!
//! [`SnapshotPublisher::publish`] copies `<key>_intraday.png` and
//! `<key>_stats.json` from the staging directory into the public directory and
//! writes a `_cards_<key>.json` sidecar. Either all three land or none do.
//!
//! ## Example
//!
//! ```rust,no_run
//! use moi::{MoiConfig, PublishConfig, ScoringPipeline, SnapshotPublisher};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let mut pipeline = ScoringPipeline::new(MoiConfig::default().with_output_dir("data"))?;
//! let outcome = pipeline.run()?;
//! println!("{} ({})", outcome.reading().value, outcome.reading().label);
//!
//! let publisher = SnapshotPublisher::new(&PublishConfig::default())?;
//! publisher.publish("R_BANK9", "R-BANK9")?;
//! # Ok(())
//! # }
//! ```

pub mod atomic_file;
pub mod config;
pub mod decay;
pub mod error;
pub mod label;
pub mod normalize;
pub mod pipeline;
pub mod publish;
pub mod reading;
pub mod signal;
pub mod state;

// Re-exports
pub use crate::config::{DecayConfig, MoiConfig, PublishConfig};
pub use crate::decay::{CalendarPolicy, DecayModel, FixedRate, HolidayCalendar, WeekendPolicy, BASELINE};
pub use crate::error::{Error, Result};
pub use crate::label::Label;
pub use crate::normalize::Normalizer;
pub use crate::pipeline::{ScoreBreakdown, ScoringOutcome, ScoringPipeline};
pub use crate::publish::{ArtifactNames, SnapshotMetadata, SnapshotPublisher, StatsDocument};
pub use crate::reading::IndexReading;
pub use crate::signal::{FixedContributor, SignalContext, SignalContributor, StubContributor};
pub use crate::state::{IndexState, JsonStateStore, MemoryStateStore, StateStore, DEFAULT_STATE_VALUE};
