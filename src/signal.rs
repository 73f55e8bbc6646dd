//! Signal Contribution - pluggable market surprise source
//!
//! A contributor returns a dimensionless deviation (z-score-like) that is
//! added to the decayed score before normalization. The pipeline only sees
//! this trait, so a real surprise/reaction aggregator can replace the stub
//! without touching anything else.

use crate::decay::is_weekend;
use chrono::{DateTime, FixedOffset};

/// Factor reported when nothing notable moved the index
pub const QUIET_FACTOR: &str = "No notable economic events";

/// Factor reported when an event surprise contributed
pub const EVENT_FACTOR: &str = "Economic event surprise";

/// Below this magnitude an event contribution counts as "none"
pub const EVENT_EPSILON: f64 = 0.01;

/// Inputs available to a contributor for one invocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalContext {
    /// Invocation time in the index's local offset
    pub now: DateTime<FixedOffset>,

    /// Value persisted by the previous invocation
    pub prev: f64,

    /// Reduced-magnitude mode
    pub light_mode: bool,
}

/// Source of accumulated surprise since the last invocation
pub trait SignalContributor {
    /// Dimensionless deviation added before normalization
    fn contribute(&self, ctx: &SignalContext) -> f64;

    /// Human-readable main factors behind the contribution, most important first
    fn factors(&self, _ctx: &SignalContext) -> Vec<String> {
        vec![QUIET_FACTOR.to_string()]
    }
}

impl<C: SignalContributor + ?Sized> SignalContributor for Box<C> {
    fn contribute(&self, ctx: &SignalContext) -> f64 {
        (**self).contribute(ctx)
    }

    fn factors(&self, ctx: &SignalContext) -> Vec<String> {
        (**self).factors(ctx)
    }
}

/// Constant contribution
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixedContributor(pub f64);

impl SignalContributor for FixedContributor {
    fn contribute(&self, _ctx: &SignalContext) -> f64 {
        self.0
    }
}

/// Placeholder until real event/reaction signals are wired in
///
/// Contributes `event_z` plus a small warming nudge on trading days. Light
/// mode scales the whole contribution by `light_scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StubContributor {
    pub event_z: f64,
    pub weekday_nudge: f64,
    pub light_scale: f64,
}

impl Default for StubContributor {
    fn default() -> Self {
        Self {
            event_z: 0.0,
            weekday_nudge: 0.2,
            light_scale: 0.5,
        }
    }
}

impl StubContributor {
    /// Stub that never moves the index
    pub fn silent() -> Self {
        Self {
            event_z: 0.0,
            weekday_nudge: 0.0,
            light_scale: 1.0,
        }
    }

    pub fn with_event(mut self, event_z: f64) -> Self {
        self.event_z = event_z;
        self
    }
}

impl SignalContributor for StubContributor {
    fn contribute(&self, ctx: &SignalContext) -> f64 {
        let nudge = if is_weekend(ctx.now.date_naive()) {
            0.0
        } else {
            self.weekday_nudge
        };
        let z = self.event_z + nudge;
        if ctx.light_mode {
            z * self.light_scale
        } else {
            z
        }
    }

    fn factors(&self, _ctx: &SignalContext) -> Vec<String> {
        if self.event_z.abs() < EVENT_EPSILON {
            vec![QUIET_FACTOR.to_string()]
        } else {
            vec![EVENT_FACTOR.to_string()]
        }
    }
}
