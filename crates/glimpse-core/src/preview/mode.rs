//! Isolated vs inline delivery decision.

use glimpse_config::{PreviewConfig, PreviewMode};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;

/// Controller state. Failures only grow until [`PreviewModeController::reset_failures`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewModeState {
    pub mode: PreviewMode,
    pub worker_available: bool,
    pub worker_ready: bool,
    pub prefer_isolated: bool,
    pub failure_count: u32,
    pub max_failures: u32,
}

/// Why the controller decided the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "reason", content = "mode")]
pub enum DecisionReason {
    WorkerUnavailable,
    WorkerNotReady,
    ExplicitMode(PreviewMode),
    TooManyFailures,
    PreferenceDisabled,
    Eligible,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionReason::WorkerUnavailable => f.write_str("isolated worker unavailable"),
            DecisionReason::WorkerNotReady => f.write_str("isolated worker not ready"),
            DecisionReason::ExplicitMode(mode) => write!(f, "mode forced to {mode}"),
            DecisionReason::TooManyFailures => f.write_str("too many isolated delivery failures"),
            DecisionReason::PreferenceDisabled => f.write_str("isolated delivery not preferred"),
            DecisionReason::Eligible => f.write_str("isolated delivery eligible"),
        }
    }
}

/// Decides per preview whether isolated delivery should be attempted.
///
/// Automatic mode defaults to inline; it only tries isolated delivery when
/// the worker is available and ready, failures are below the limit, and
/// isolated delivery is explicitly preferred.
#[derive(Debug)]
pub struct PreviewModeController {
    state: RwLock<PreviewModeState>,
}

impl PreviewModeController {
    pub fn new(config: &PreviewConfig) -> Self {
        Self {
            state: RwLock::new(PreviewModeState {
                mode: config.mode,
                worker_available: false,
                worker_ready: false,
                prefer_isolated: config.prefer_isolated,
                failure_count: 0,
                max_failures: config.max_failures,
            }),
        }
    }

    pub fn snapshot(&self) -> PreviewModeState {
        self.state.read().clone()
    }

    pub fn set_mode(&self, mode: PreviewMode) {
        self.state.write().mode = mode;
    }

    pub fn set_worker_available(&self, available: bool) {
        self.state.write().worker_available = available;
    }

    pub fn set_worker_ready(&self, ready: bool) {
        self.state.write().worker_ready = ready;
    }

    pub fn set_prefer_isolated(&self, prefer: bool) {
        self.state.write().prefer_isolated = prefer;
    }

    pub fn should_attempt_isolated(&self) -> bool {
        matches!(
            self.decision_reason(),
            DecisionReason::Eligible | DecisionReason::ExplicitMode(PreviewMode::Isolated)
        )
    }

    pub fn decision_reason(&self) -> DecisionReason {
        let state = self.state.read();
        match state.mode {
            PreviewMode::Inline => DecisionReason::ExplicitMode(PreviewMode::Inline),
            PreviewMode::Isolated => {
                if !state.worker_available {
                    DecisionReason::WorkerUnavailable
                } else if !state.worker_ready {
                    DecisionReason::WorkerNotReady
                } else {
                    DecisionReason::ExplicitMode(PreviewMode::Isolated)
                }
            }
            PreviewMode::Auto => {
                if !state.worker_available {
                    DecisionReason::WorkerUnavailable
                } else if !state.worker_ready {
                    DecisionReason::WorkerNotReady
                } else if state.failure_count >= state.max_failures {
                    DecisionReason::TooManyFailures
                } else if !state.prefer_isolated {
                    DecisionReason::PreferenceDisabled
                } else {
                    DecisionReason::Eligible
                }
            }
        }
    }

    /// Record a verified failed isolated attempt. Returns the new count.
    pub fn record_failure(&self) -> u32 {
        let mut state = self.state.write();
        state.failure_count = state.failure_count.saturating_add(1);
        if state.failure_count == state.max_failures {
            tracing::warn!(
                failures = state.failure_count,
                "isolated delivery disabled for this session"
            );
        }
        state.failure_count
    }

    pub fn reset_failures(&self) {
        let mut state = self.state.write();
        if state.failure_count > 0 {
            tracing::info!(previous = state.failure_count, "isolated delivery failures reset");
        }
        state.failure_count = 0;
    }

    pub fn failure_count(&self) -> u32 {
        self.state.read().failure_count
    }

    pub fn is_isolated_disabled(&self) -> bool {
        let state = self.state.read();
        state.failure_count >= state.max_failures
    }
}
