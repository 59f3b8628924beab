//! Probe delay store
//!
//! Holds the startup, readiness, and liveness delays shared by every request
//! handler. Values are whole seconds parsed from text, either from the
//! environment at startup or from `POST /config` at runtime.
//!
//! Writes are lenient: text that does not parse as a second count resets
//! that probe to zero and is logged, it never fails the caller.

use std::fmt;
use std::num::ParseIntError;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable for the startup probe delay (seconds)
pub const STARTUP_PROBE_DELAY_ENV: &str = "STARTUP_PROBE_DELAY";

/// Environment variable for the readiness probe delay (seconds)
pub const READINESS_PROBE_DELAY_ENV: &str = "READINESS_PROBE_DELAY";

/// Environment variable for the liveness probe delay (seconds)
pub const LIVENESS_PROBE_DELAY_ENV: &str = "LIVENESS_PROBE_DELAY";

/// The three simulated Kubernetes probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Startup,
    Readiness,
    Liveness,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 3] = [
        ProbeKind::Startup,
        ProbeKind::Readiness,
        ProbeKind::Liveness,
    ];

    /// Lowercase name, also used as the probe's response message
    pub fn as_str(self) -> &'static str {
        match self {
            ProbeKind::Startup => "startup",
            ProbeKind::Readiness => "readiness",
            ProbeKind::Liveness => "liveness",
        }
    }

    /// Environment variable that seeds this probe's delay
    pub fn env_var(self) -> &'static str {
        match self {
            ProbeKind::Startup => STARTUP_PROBE_DELAY_ENV,
            ProbeKind::Readiness => READINESS_PROBE_DELAY_ENV,
            ProbeKind::Liveness => LIVENESS_PROBE_DELAY_ENV,
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delay value that could not be parsed as a whole number of seconds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid delay value {raw:?} for {kind} probe: {source}")]
pub struct DelayParseError {
    pub kind: ProbeKind,
    pub raw: String,
    #[source]
    pub source: ParseIntError,
}

/// Parse a base-10 count of seconds
///
/// Negative numbers and values wider than `u64` are rejected.
pub fn parse_delay(kind: ProbeKind, raw: &str) -> Result<Duration, DelayParseError> {
    raw.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|source| DelayParseError {
            kind,
            raw: raw.to_string(),
            source,
        })
}

/// Result of writing one probe delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// The text parsed and is now the probe's delay
    Applied(Duration),
    /// The text was rejected; the probe's delay is now zero
    Defaulted(DelayParseError),
}

impl SetOutcome {
    /// The delay the probe ended up with
    pub fn delay(&self) -> Duration {
        match self {
            SetOutcome::Applied(delay) => *delay,
            SetOutcome::Defaulted(_) => Duration::ZERO,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, SetOutcome::Applied(_))
    }
}

/// Stored value for one probe: the text last written and what it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeDelay {
    pub raw: String,
    pub delay: Duration,
}

impl Default for ProbeDelay {
    fn default() -> Self {
        Self {
            raw: "0".to_string(),
            delay: Duration::ZERO,
        }
    }
}

/// Point-in-time copy of all three probe delays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelaySnapshot {
    pub startup: ProbeDelay,
    pub readiness: ProbeDelay,
    pub liveness: ProbeDelay,
}

#[derive(Debug, Default)]
struct DelaySlots {
    startup: RwLock<ProbeDelay>,
    readiness: RwLock<ProbeDelay>,
    liveness: RwLock<ProbeDelay>,
}

impl DelaySlots {
    fn slot(&self, kind: ProbeKind) -> &RwLock<ProbeDelay> {
        match kind {
            ProbeKind::Startup => &self.startup,
            ProbeKind::Readiness => &self.readiness,
            ProbeKind::Liveness => &self.liveness,
        }
    }
}

// A writer never panics while holding a slot, but recover the value anyway
// rather than propagating poison into request handlers.
fn read_slot(slot: &RwLock<ProbeDelay>) -> RwLockReadGuard<'_, ProbeDelay> {
    slot.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_slot(slot: &RwLock<ProbeDelay>) -> RwLockWriteGuard<'_, ProbeDelay> {
    slot.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared, thread-safe probe delay store
///
/// Cloning is cheap and every clone sees the same values. Each probe's
/// delay is replaced atomically; updating all three is not a single
/// atomic step, so concurrent writers may interleave field by field.
#[derive(Debug, Clone, Default)]
pub struct DelayConfig {
    slots: Arc<DelaySlots>,
}

impl DelayConfig {
    /// Create a store with every delay at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from `STARTUP_PROBE_DELAY`, `READINESS_PROBE_DELAY`,
    /// and `LIVENESS_PROBE_DELAY`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Seed the store from an arbitrary variable lookup
    ///
    /// Missing variables are treated as `"0"`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::new();
        for kind in ProbeKind::ALL {
            let raw = lookup(kind.env_var()).unwrap_or_else(|| "0".to_string());
            config.set(kind, &raw);
        }
        config
    }

    /// Current delay for a probe
    pub fn get(&self, kind: ProbeKind) -> Duration {
        read_slot(self.slots.slot(kind)).delay
    }

    /// Replace a probe's delay with the value parsed from `raw`
    ///
    /// Unparsable text stores zero and is logged at warn level.
    pub fn set(&self, kind: ProbeKind, raw: &str) -> SetOutcome {
        let outcome = match parse_delay(kind, raw) {
            Ok(delay) => {
                debug!(probe = %kind, delay_secs = delay.as_secs(), "Probe delay applied");
                SetOutcome::Applied(delay)
            }
            Err(e) => {
                warn!(env = kind.env_var(), error = %e, "Invalid probe delay, using zero");
                SetOutcome::Defaulted(e)
            }
        };

        *write_slot(self.slots.slot(kind)) = ProbeDelay {
            raw: raw.to_string(),
            delay: outcome.delay(),
        };
        outcome
    }

    /// Copy out the raw text and resolved delay of every probe
    pub fn snapshot(&self) -> DelaySnapshot {
        let load = |kind| read_slot(self.slots.slot(kind)).clone();
        DelaySnapshot {
            startup: load(ProbeKind::Startup),
            readiness: load(ProbeKind::Readiness),
            liveness: load(ProbeKind::Liveness),
        }
    }
}

#[cfg(test)]
#[path = "delays_test.rs"]
mod tests;
