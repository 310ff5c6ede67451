//! Submit -> poll -> retrieve state machine for a single video generation.
//!
//! ```text
//! Idle -> Submitting -> Polling -> Ready
//!              |           |
//!              +-----------+-----> Failed
//! ```
//!
//! A failed poll is terminal: there is no retry on transient errors. Polling
//! is bounded by [`PollPolicy::max_attempts`] and can be cancelled through
//! the [`CancellationToken`] handed to [`VideoWorkflow::run`] or through
//! [`WorkflowHandle::cancel`]. `Failed` cannot be resumed; start a new run instead.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::operation::VideoOperation;
use crate::provider::{ProviderError, VideoJob, VideoProvider};

/// Same-origin path of the media proxy route.
pub const DEFAULT_PROXY_PATH: &str = "/api/proxy-video";

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Observable state of a workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Submitting,
    /// Waiting on the provider. `polls` counts status checks made so far.
    Polling { operation: String, polls: u32 },
    Ready(ReadyVideo),
    Failed { reason: String },
}

/// Coarse state tag, used for transition histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Idle,
    Submitting,
    Polling,
    Ready,
    Failed,
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            Self::Idle => WorkflowPhase::Idle,
            Self::Submitting => WorkflowPhase::Submitting,
            Self::Polling { .. } => WorkflowPhase::Polling,
            Self::Ready(_) => WorkflowPhase::Ready,
            Self::Failed { .. } => WorkflowPhase::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed { .. })
    }
}

/// A finished video, addressed through the media proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyVideo {
    /// Provider location of the generated file (credential not included).
    pub video_uri: String,
    /// Same-origin playable source: `{proxy}?uri={percent-encoded video_uri}`.
    pub proxy_path: String,
}

/// Why a run ended in `Failed`.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Failed to start video generation: {}", .0.reason())]
    Start(#[source] ProviderError),

    #[error("Failed to check status: {}", .0.reason())]
    Poll(#[source] ProviderError),

    /// The provider finished the operation with an error.
    #[error("Video generation failed: {0}")]
    Generation(String),

    #[error("No video URI returned from generation.")]
    NoResult,

    #[error("Video generation timed out after {polls} status checks")]
    TimedOut { polls: u32 },

    #[error("Video generation cancelled")]
    Cancelled,
}

// ---------------------------------------------------------------------------
// Poll policy
// ---------------------------------------------------------------------------

/// Spacing and bound for status checks.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Wait before the first status check.
    pub interval: Duration,
    /// Upper bound on the wait between checks.
    pub max_interval: Duration,
    /// Growth factor per check; `1.0` keeps a fixed interval.
    pub multiplier: f64,
    /// Give up after this many status checks. `None` polls until done.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(30),
            multiplier: 1.0,
            max_attempts: Some(120),
        }
    }
}

/// Calculate the next wait from the current one, clamped to
/// [`PollPolicy::max_interval`].
pub fn next_interval(current: Duration, policy: &PollPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.max_interval)
}

/// Build the same-origin proxy path for a provider video location.
pub fn proxy_path_for(proxy_base: &str, video_uri: &str) -> String {
    format!("{proxy_base}?uri={}", urlencoding::encode(video_uri))
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Result of one run, including the ordered phases it passed through.
#[derive(Debug)]
pub struct WorkflowReport {
    pub outcome: Result<ReadyVideo, WorkflowError>,
    /// Distinct consecutive phases, starting with `Idle`.
    pub phases: Vec<WorkflowPhase>,
    /// Number of status checks made.
    pub polls: u32,
}

/// Drives a [`VideoProvider`] through one generation.
///
/// Cheap to clone; every run is independent.
#[derive(Clone)]
pub struct VideoWorkflow {
    provider: Arc<dyn VideoProvider>,
    policy: PollPolicy,
    proxy_base: String,
}

/// Handle to a workflow running on its own task.
pub struct WorkflowHandle {
    state: watch::Receiver<WorkflowState>,
    cancel: CancellationToken,
    task: JoinHandle<WorkflowReport>,
}

/// Publishes state changes and records the phase history.
struct Tracker {
    tx: watch::Sender<WorkflowState>,
    phases: Vec<WorkflowPhase>,
}

impl Tracker {
    fn new(tx: watch::Sender<WorkflowState>) -> Self {
        tx.send_replace(WorkflowState::Idle);
        Self {
            tx,
            phases: vec![WorkflowPhase::Idle],
        }
    }

    fn set(&mut self, state: WorkflowState) {
        let phase = state.phase();
        if self.phases.last() != Some(&phase) {
            tracing::debug!(?phase, "Video workflow transition");
            self.phases.push(phase);
        }
        self.tx.send_replace(state);
    }
}

impl VideoWorkflow {
    pub fn new(provider: Arc<dyn VideoProvider>) -> Self {
        Self {
            provider,
            policy: PollPolicy::default(),
            proxy_base: DEFAULT_PROXY_PATH.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the proxy route used to build [`ReadyVideo::proxy_path`].
    pub fn with_proxy_base(mut self, proxy_base: impl Into<String>) -> Self {
        self.proxy_base = proxy_base.into();
        self
    }

    /// Run to completion on the current task with no external observer.
    pub async fn run_to_completion(&self, job: VideoJob) -> WorkflowReport {
        let (tx, _rx) = watch::channel(WorkflowState::Idle);
        self.run(job, &CancellationToken::new(), tx).await
    }

    /// Spawn the run on its own task and return a handle for observing
    /// progress and cancelling.
    pub fn spawn(&self, job: VideoJob) -> WorkflowHandle {
        let (tx, rx) = watch::channel(WorkflowState::Idle);
        let cancel = CancellationToken::new();
        let workflow = self.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move { workflow.run(job, &task_cancel, tx).await });
        WorkflowHandle {
            state: rx,
            cancel,
            task,
        }
    }

    /// Execute one generation, publishing every state change on `state_tx`.
    pub async fn run(
        &self,
        job: VideoJob,
        cancel: &CancellationToken,
        state_tx: watch::Sender<WorkflowState>,
    ) -> WorkflowReport {
        let mut tracker = Tracker::new(state_tx);
        let mut polls = 0u32;
        let outcome = self.drive(&job, cancel, &mut tracker, &mut polls).await;

        match &outcome {
            Ok(video) => {
                tracing::info!(video_uri = %video.video_uri, polls, "Video generation ready");
                tracker.set(WorkflowState::Ready(video.clone()));
            }
            Err(e) => {
                tracing::warn!(error = %e, polls, "Video generation failed");
                tracker.set(WorkflowState::Failed {
                    reason: e.to_string(),
                });
            }
        }

        WorkflowReport {
            outcome,
            phases: tracker.phases,
            polls,
        }
    }

    async fn drive(
        &self,
        job: &VideoJob,
        cancel: &CancellationToken,
        tracker: &mut Tracker,
        polls: &mut u32,
    ) -> Result<ReadyVideo, WorkflowError> {
        tracker.set(WorkflowState::Submitting);

        let mut operation = tokio::select! {
            _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
            result = self.provider.start(job) => result.map_err(WorkflowError::Start)?,
        };

        tracker.set(WorkflowState::Polling {
            operation: operation.name.clone(),
            polls: 0,
        });

        let mut delay = self.policy.interval;
        while !operation.done {
            if self.policy.max_attempts.is_some_and(|max| *polls >= max) {
                return Err(WorkflowError::TimedOut { polls: *polls });
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            *polls += 1;
            operation = tokio::select! {
                _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
                result = self.provider.status(&operation) => result.map_err(WorkflowError::Poll)?,
            };

            tracker.set(WorkflowState::Polling {
                operation: operation.name.clone(),
                polls: *polls,
            });
            delay = next_interval(delay, &self.policy);
        }

        self.retrieve(&operation)
    }

    /// Inspect a finished operation for its first video.
    fn retrieve(&self, operation: &VideoOperation) -> Result<ReadyVideo, WorkflowError> {
        if let Some(error) = &operation.error {
            return Err(WorkflowError::Generation(error.message.clone()));
        }
        let video_uri = operation.first_video_uri().ok_or(WorkflowError::NoResult)?;
        Ok(ReadyVideo {
            video_uri: video_uri.to_string(),
            proxy_path: proxy_path_for(&self.proxy_base, video_uri),
        })
    }
}

impl WorkflowHandle {
    /// Latest published state.
    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.clone()
    }

    /// Request cancellation. The run ends in `Failed` at its next await point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run to finish.
    pub async fn join(self) -> Result<WorkflowReport, tokio::task::JoinError> {
        self.task.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_interval_by_default() {
        let policy = PollPolicy::default();
        assert_eq!(next_interval(policy.interval, &policy), Duration::from_secs(5));
    }

    #[test]
    fn exponential_backoff_clamps_at_max() {
        let policy = PollPolicy {
            multiplier: 2.0,
            ..Default::default()
        };
        let mut delay = policy.interval;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(delay.as_secs());
            delay = next_interval(delay, &policy);
        }
        assert_eq!(seen, [5, 10, 20, 30]);
    }

    #[test]
    fn proxy_path_percent_encodes_the_location() {
        let path = proxy_path_for(
            DEFAULT_PROXY_PATH,
            "https://host/v1beta/files/a:download?alt=media",
        );
        assert_eq!(
            path,
            "/api/proxy-video?uri=https%3A%2F%2Fhost%2Fv1beta%2Ffiles%2Fa%3Adownload%3Falt%3Dmedia"
        );
    }

    #[test]
    fn terminal_states() {
        assert!(!WorkflowState::Idle.is_terminal());
        assert!(WorkflowState::Failed { reason: "x".into() }.is_terminal());
        assert_eq!(
            WorkflowState::Polling {
                operation: "op".into(),
                polls: 3
            }
            .phase(),
            WorkflowPhase::Polling
        );
    }
}
