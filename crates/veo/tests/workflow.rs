//! State-machine tests for the video generation workflow against a
//! scripted in-process provider.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use tokio::time::Instant;
use wishwall_veo::operation::{
    GenerateVideosResponse, GeneratedVideo, OperationError, VideoFile, VideoOperation,
};
use wishwall_veo::provider::{AspectRatio, ProviderError, VideoJob, VideoProvider};
use wishwall_veo::workflow::{
    PollPolicy, VideoWorkflow, WorkflowError, WorkflowPhase, WorkflowState,
};

const VIDEO_URI: &str = "https://generativelanguage.googleapis.com/v1beta/files/v1:download?alt=media";

// ---------------------------------------------------------------------------
// Scripted provider
// ---------------------------------------------------------------------------

type Scripted = Result<VideoOperation, ProviderError>;

struct ScriptedProvider {
    start: Mutex<Option<Scripted>>,
    statuses: Mutex<VecDeque<Scripted>>,
    status_calls: AtomicU32,
    created: Instant,
    status_at: Mutex<Vec<Duration>>,
}

impl ScriptedProvider {
    fn new(start: Scripted, statuses: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            start: Mutex::new(Some(start)),
            statuses: Mutex::new(statuses.into()),
            status_calls: AtomicU32::new(0),
            created: Instant::now(),
            status_at: Mutex::new(Vec::new()),
        })
    }

    fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoProvider for ScriptedProvider {
    async fn start(&self, _job: &VideoJob) -> Result<VideoOperation, ProviderError> {
        self.start
            .lock()
            .unwrap()
            .take()
            .expect("start called more than once")
    }

    async fn status(&self, operation: &VideoOperation) -> Result<VideoOperation, ProviderError> {
        assert_eq!(operation.name, "operations/op-1", "status must carry the handle");
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_at.lock().unwrap().push(self.created.elapsed());
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(pending()))
    }
}

fn pending() -> VideoOperation {
    VideoOperation {
        name: "operations/op-1".into(),
        done: false,
        response: None,
        error: None,
    }
}

fn finished(uri: Option<&str>) -> VideoOperation {
    VideoOperation {
        done: true,
        response: Some(GenerateVideosResponse {
            generated_videos: uri
                .map(|u| {
                    vec![GeneratedVideo {
                        video: Some(VideoFile {
                            uri: Some(u.to_string()),
                            mime_type: None,
                        }),
                    }]
                })
                .unwrap_or_default(),
        }),
        ..pending()
    }
}

fn api_error(status: u16, message: &str) -> ProviderError {
    ProviderError::Api {
        status,
        message: message.to_string(),
    }
}

fn job() -> VideoJob {
    VideoJob {
        image_base64: "aGVsbG8=".into(),
        mime_type: "image/jpeg".into(),
        prompt: "dance".into(),
        aspect_ratio: AspectRatio::Portrait,
    }
}

fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(5),
        multiplier: 1.0,
        max_attempts: Some(50),
    }
}

fn workflow(provider: Arc<ScriptedProvider>) -> VideoWorkflow {
    VideoWorkflow::new(provider).with_policy(fast_policy())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pending_then_done_reaches_ready_with_proxy_path() {
    let provider = ScriptedProvider::new(Ok(pending()), vec![Ok(pending()), Ok(finished(Some(VIDEO_URI)))]);

    let report = workflow(provider.clone()).run_to_completion(job()).await;

    assert_eq!(
        report.phases,
        [
            WorkflowPhase::Idle,
            WorkflowPhase::Submitting,
            WorkflowPhase::Polling,
            WorkflowPhase::Ready
        ]
    );
    let video = report.outcome.unwrap();
    assert_eq!(video.video_uri, VIDEO_URI);
    assert!(video.proxy_path.starts_with("/api/proxy-video?uri="));
    assert!(video.proxy_path.contains(&urlencoding::encode(VIDEO_URI).into_owned()));
    assert_eq!(report.polls, 2);
    assert_eq!(provider.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn default_policy_waits_five_seconds_before_each_status_check() {
    let provider = ScriptedProvider::new(Ok(pending()), vec![Ok(pending()), Ok(finished(Some(VIDEO_URI)))]);

    let report = VideoWorkflow::new(provider.clone())
        .run_to_completion(job())
        .await;

    assert!(report.outcome.is_ok());
    let status_at = provider.status_at.lock().unwrap().clone();
    assert_eq!(status_at.len(), 2);
    assert!(status_at[0] >= Duration::from_secs(5), "first check at {:?}", status_at[0]);
    assert!(status_at[0] < Duration::from_secs(6), "first check at {:?}", status_at[0]);
    assert!(status_at[1] - status_at[0] >= Duration::from_secs(5));
}

#[tokio::test]
async fn custom_proxy_base_prefixes_the_playable_path() {
    let provider = ScriptedProvider::new(Ok(finished(Some(VIDEO_URI))), vec![]);

    let report = workflow(provider)
        .with_proxy_base("http://localhost:3000/api/proxy-video")
        .run_to_completion(job())
        .await;

    let video = report.outcome.unwrap();
    assert_eq!(
        video.proxy_path,
        format!(
            "http://localhost:3000/api/proxy-video?uri={}",
            urlencoding::encode(VIDEO_URI)
        )
    );
}

#[tokio::test]
async fn operation_done_at_start_still_passes_through_polling() {
    let provider = ScriptedProvider::new(Ok(finished(Some(VIDEO_URI))), vec![]);

    let report = workflow(provider.clone()).run_to_completion(job()).await;

    assert_eq!(report.phases.last(), Some(&WorkflowPhase::Ready));
    assert!(report.phases.contains(&WorkflowPhase::Polling));
    assert_eq!(provider.status_calls(), 0);
}

#[tokio::test]
async fn failed_poll_is_terminal_and_not_retried() {
    let provider = ScriptedProvider::new(
        Ok(pending()),
        vec![Err(api_error(503, "backend overloaded")), Ok(finished(Some(VIDEO_URI)))],
    );

    let report = workflow(provider.clone()).run_to_completion(job()).await;

    assert_eq!(report.phases.last(), Some(&WorkflowPhase::Failed));
    assert_matches!(report.outcome, Err(WorkflowError::Poll(ProviderError::Api { status: 503, .. })));
    assert_eq!(provider.status_calls(), 1);
}

#[tokio::test]
async fn start_failure_never_polls() {
    let provider = ScriptedProvider::new(Err(ProviderError::MissingCredential), vec![]);

    let report = workflow(provider.clone()).run_to_completion(job()).await;

    assert_eq!(
        report.phases,
        [WorkflowPhase::Idle, WorkflowPhase::Submitting, WorkflowPhase::Failed]
    );
    let err = report.outcome.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to start video generation: Server configuration error: Missing API Key"
    );
    assert_eq!(provider.status_calls(), 0);
}

#[tokio::test]
async fn done_without_video_fails_with_no_result() {
    let provider = ScriptedProvider::new(Ok(pending()), vec![Ok(finished(None))]);

    let report = workflow(provider).run_to_completion(job()).await;

    assert_matches!(report.outcome, Err(WorkflowError::NoResult));
}

#[tokio::test]
async fn provider_reported_error_fails_with_its_message() {
    let mut failed = finished(None);
    failed.error = Some(OperationError {
        code: Some(3),
        message: "image rejected".into(),
    });
    let provider = ScriptedProvider::new(Ok(pending()), vec![Ok(failed)]);

    let report = workflow(provider).run_to_completion(job()).await;

    assert_matches!(report.outcome, Err(WorkflowError::Generation(msg)) if msg == "image rejected");
}

#[tokio::test]
async fn max_attempts_bounds_the_loop() {
    let provider = ScriptedProvider::new(Ok(pending()), vec![]);
    let policy = PollPolicy {
        max_attempts: Some(3),
        ..fast_policy()
    };

    let report = VideoWorkflow::new(provider.clone())
        .with_policy(policy)
        .run_to_completion(job())
        .await;

    assert_matches!(report.outcome, Err(WorkflowError::TimedOut { polls: 3 }));
    assert_eq!(provider.status_calls(), 3);
}

#[tokio::test]
async fn cancellation_stops_a_spawned_run() {
    let provider = ScriptedProvider::new(Ok(pending()), vec![]);
    let policy = PollPolicy {
        interval: Duration::from_secs(60),
        max_attempts: None,
        ..fast_policy()
    };
    let handle = VideoWorkflow::new(provider.clone())
        .with_policy(policy)
        .spawn(job());

    let mut states = handle.subscribe();
    states
        .wait_for(|s| matches!(s, WorkflowState::Polling { .. }))
        .await
        .unwrap();

    handle.cancel();
    let report = handle.join().await.unwrap();

    assert_matches!(report.outcome, Err(WorkflowError::Cancelled));
    assert_eq!(report.phases.last(), Some(&WorkflowPhase::Failed));
    assert_eq!(provider.status_calls(), 0);
}

#[tokio::test]
async fn spawned_run_publishes_final_state() {
    let provider = ScriptedProvider::new(Ok(pending()), vec![Ok(finished(Some(VIDEO_URI)))]);
    let handle = workflow(provider).spawn(job());

    let mut states = handle.subscribe();
    let final_state = states.wait_for(|s| s.is_terminal()).await.unwrap().clone();

    assert_matches!(final_state, WorkflowState::Ready(video) if video.video_uri == VIDEO_URI);
}
