//! Scoring Pipeline - one invocation of the batch job
//!
//! ```text
//! load prev → decay(rate_for(today)) → + contribution → normalize → label
//!           → write reading (+ daily snapshot) → save state
//! ```
//!
//! State is saved last. A run that fails anywhere before that leaves the
//! persisted value untouched, so the next run starts from the same place.

use crate::atomic_file;
use crate::config::MoiConfig;
use crate::decay::{CalendarPolicy, DecayModel};
use crate::error::Result;
use crate::normalize::Normalizer;
use crate::reading::{now_in, IndexReading};
use crate::signal::{SignalContext, SignalContributor, StubContributor};
use crate::state::{JsonStateStore, StateStore};
use chrono::{DateTime, FixedOffset};
use std::path::{Path, PathBuf};
use tracing::info;

/// Intermediate values of one scoring computation
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    /// Persisted value before this run
    pub prev: f64,
    /// Decay rate chosen by the calendar policy
    pub rate: f64,
    /// Value after decay
    pub cooled: f64,
    /// Contributor output
    pub contribution: f64,
    /// Combined deviation fed to the normalizer
    pub z: f64,
    /// Unrounded bounded score, persisted as the next state
    pub value: f64,
    pub reading: IndexReading,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOutcome {
    pub score: ScoreBreakdown,
    pub reading_path: PathBuf,
    pub snapshot_path: Option<PathBuf>,
}

impl ScoringOutcome {
    pub fn reading(&self) -> &IndexReading {
        &self.score.reading
    }
}

/// Composes state, decay, contribution, normalization and labeling
pub struct ScoringPipeline {
    config: MoiConfig,
    offset: FixedOffset,
    store: Box<dyn StateStore + Send>,
    policy: Box<dyn CalendarPolicy + Send>,
    contributor: Box<dyn SignalContributor + Send>,
    decay: DecayModel,
    normalizer: Normalizer,
}

impl ScoringPipeline {
    /// Pipeline backed by `<output_dir>/<key>_state.json`, the weekday/weekend
    /// calendar and the stub contributor
    pub fn new(config: MoiConfig) -> Result<Self> {
        config.validate()?;
        let offset = config.offset()?;

        Ok(Self {
            offset,
            store: Box::new(JsonStateStore::new(config.state_path())),
            policy: Box::new(config.decay.policy()),
            contributor: Box::new(StubContributor::default()),
            decay: config.decay.model(),
            normalizer: config.normalizer,
            config,
        })
    }

    pub fn with_store(mut self, store: impl StateStore + Send + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_policy(mut self, policy: impl CalendarPolicy + Send + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_contributor(mut self, contributor: impl SignalContributor + Send + 'static) -> Self {
        self.contributor = Box::new(contributor);
        self
    }

    pub fn config(&self) -> &MoiConfig {
        &self.config
    }

    /// Compute a score from `prev` without touching any file
    pub fn score(&self, prev: f64, now: DateTime<FixedOffset>) -> ScoreBreakdown {
        let rate = self.policy.rate_for(now.date_naive());
        let cooled = self.decay.apply(prev, rate);

        let ctx = SignalContext {
            now,
            prev,
            light_mode: self.config.light_mode,
        };
        let contribution = self.contributor.contribute(&ctx);
        let z = self.normalizer.deviation(cooled) + contribution;
        let value = self.normalizer.normalize(z);

        let reading = IndexReading::new(prev, value, self.contributor.factors(&ctx), now);

        ScoreBreakdown {
            prev,
            rate,
            cooled,
            contribution,
            z,
            value,
            reading,
        }
    }

    /// Run once at the current time
    pub fn run(&mut self) -> Result<ScoringOutcome> {
        let now = now_in(self.offset);
        self.run_at(now)
    }

    /// Run once as if invoked at `now`
    pub fn run_at(&mut self, now: DateTime<FixedOffset>) -> Result<ScoringOutcome> {
        let prev = self.store.load();
        let score = self.score(prev, now);

        let reading_path = self.config.reading_path();
        write_reading(&reading_path, &score.reading)?;
        info!(
            path = %reading_path.display(),
            value = score.reading.value,
            delta = score.reading.delta,
            label = %score.reading.label,
            "reading written"
        );

        let snapshot_path = if self.config.snapshot {
            let path = self.config.snapshot_path();
            write_reading(&path, &score.reading)?;
            info!(path = %path.display(), value = score.reading.value, "daily snapshot written");
            Some(path)
        } else {
            None
        };

        self.store.save(score.value)?;

        Ok(ScoringOutcome {
            score,
            reading_path,
            snapshot_path,
        })
    }
}

fn write_reading(path: &Path, reading: &IndexReading) -> Result<()> {
    let json = serde_json::to_string_pretty(reading)?;
    atomic_file::write_atomic(path, json.as_bytes())?;
    Ok(())
}
