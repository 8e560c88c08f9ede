//! Prompt-plus-image to stored video, end to end
//!
//! [`GenerationFlow`] holds the form state of the Get Started page and runs
//! one generation at a time: prepare, submit, poll, save.

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::client::VideoJobApi;
use crate::error::{StudioError, StudioResult};
use crate::image_prep::prepare_reference_image_async;
use crate::job::VideoResult;
use crate::poller::{CompletionPoller, PollConfig};
use crate::upload::UploadedImage;

/// Notice shown after a generation finishes
pub const SUCCESS_NOTICE: &str = "Video generated successfully!";

/// Where the current generation stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowStatus {
    #[default]
    Idle,
    Preparing,
    Submitting,
    Generating {
        progress: Option<u8>,
    },
    Saving,
    Ready {
        video_url: String,
    },
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Form state and orchestration of a single video generation
#[derive(Debug, Default)]
pub struct GenerationFlow {
    prompt: String,
    upload: Option<UploadedImage>,
    status: FlowStatus,
    notice: Option<Notice>,
    generating: bool,
    poller: CompletionPoller,
}

impl GenerationFlow {
    /// Create a flow that polls with `poll`
    pub fn new(poll: PollConfig) -> Self {
        Self {
            poller: CompletionPoller::new(poll),
            ..Self::default()
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn upload(&self) -> Option<&UploadedImage> {
        self.upload.as_ref()
    }

    /// Select a new image, returning the one it replaces
    pub fn select_image(&mut self, image: UploadedImage) -> Option<UploadedImage> {
        self.upload.replace(image)
    }

    pub fn remove_image(&mut self) -> Option<UploadedImage> {
        self.upload.take()
    }

    pub fn status(&self) -> &FlowStatus {
        &self.status
    }

    /// Whether a generation is in flight
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Consume the pending notice
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Run a generation with the current prompt and image
    pub async fn run<A>(&mut self, api: &A, cancel: &CancellationToken) -> StudioResult<VideoResult>
    where
        A: VideoJobApi + ?Sized,
    {
        if self.generating {
            return Err(StudioError::validation("A video is already being generated"));
        }

        self.generating = true;
        let outcome = self.generate(api, cancel).await;
        self.generating = false;

        match &outcome {
            Ok(result) => {
                self.status = FlowStatus::Ready {
                    video_url: result.public_url.clone(),
                };
                self.notice = Some(Notice::Success(SUCCESS_NOTICE.to_string()));
            }
            Err(e) => {
                error!("Video generation flow failed: {}", e);
                self.status = FlowStatus::Idle;
                self.notice = Some(Notice::Error(e.to_string()));
            }
        }

        outcome
    }

    async fn generate<A>(&mut self, api: &A, cancel: &CancellationToken) -> StudioResult<VideoResult>
    where
        A: VideoJobApi + ?Sized,
    {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(StudioError::validation("Please enter a prompt"));
        }
        let Some(upload) = self.upload.as_ref() else {
            return Err(StudioError::validation("Please upload an image"));
        };
        let source = upload.bytes().clone();

        self.status = FlowStatus::Preparing;
        let prepared = prepare_reference_image_async(source).await?;

        self.status = FlowStatus::Submitting;
        let job = api.create_video_job(&prompt, Some(&prepared)).await?;
        info!("Generation submitted as job {}", job.id);

        self.status = FlowStatus::Generating {
            progress: job.progress,
        };
        let status = &mut self.status;
        self.poller
            .wait_for_completion(api, &job.id, cancel, |snapshot| {
                *status = FlowStatus::Generating {
                    progress: snapshot.progress,
                };
            })
            .await?;

        self.status = FlowStatus::Saving;
        api.download_and_store_video(&job.id, Some(&prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_prep::{PreparedImage, REFERENCE_RESOLUTION, reference_dimensions};
    use crate::job::{JobStatus, VideoJob};
    use crate::poller::JobStatusSource;
    use async_trait::async_trait;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct StubApi {
        statuses: Mutex<Vec<JobStatus>>,
        submitted: Mutex<Vec<(String, usize, usize)>>,
        downloads: Mutex<Vec<(String, Option<String>)>>,
    }

    impl StubApi {
        fn with_statuses(mut statuses: Vec<JobStatus>) -> Self {
            statuses.reverse();
            Self {
                statuses: Mutex::new(statuses),
                ..Self::default()
            }
        }
    }

    fn job(status: JobStatus, progress: u8) -> VideoJob {
        VideoJob {
            id: "video_abc".to_string(),
            status,
            progress: Some(progress),
            model: Some("sora-2".to_string()),
            size: Some("1280x720".to_string()),
            seconds: Some("12".to_string()),
            created_at: None,
            error: None,
        }
    }

    #[async_trait]
    impl JobStatusSource for StubApi {
        async fn check_video_status(&self, _job_id: &str) -> StudioResult<VideoJob> {
            let status = self
                .statuses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(JobStatus::Completed);
            Ok(job(status, 50))
        }
    }

    #[async_trait]
    impl VideoJobApi for StubApi {
        async fn create_video_job(
            &self,
            prompt: &str,
            image: Option<&PreparedImage>,
        ) -> StudioResult<VideoJob> {
            let image = image.expect("flow always sends an image");
            let size = reference_dimensions(image.bytes()).unwrap();
            self.submitted.lock().unwrap().push((
                prompt.to_string(),
                size.width as usize,
                size.height as usize,
            ));
            Ok(job(JobStatus::Queued, 0))
        }

        async fn download_and_store_video(
            &self,
            job_id: &str,
            prompt: Option<&str>,
        ) -> StudioResult<VideoResult> {
            self.downloads
                .lock()
                .unwrap()
                .push((job_id.to_string(), prompt.map(str::to_string)));
            Ok(VideoResult {
                success: true,
                file_path: format!("{}-1.mp4", job_id),
                public_url: format!("https://cdn.example.com/videos/{}-1.mp4", job_id),
                video_id: job_id.to_string(),
            })
        }
    }

    fn fast_flow() -> GenerationFlow {
        GenerationFlow::new(PollConfig {
            interval: Duration::from_millis(1),
            max_attempts: Some(10),
            deadline: None,
        })
    }

    fn jpeg(width: u32, height: u32) -> UploadedImage {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
        UploadedImage::new("product.jpg", out.into_inner()).unwrap()
    }

    #[tokio::test]
    async fn test_runs_prepare_submit_poll_save() {
        let api = StubApi::with_statuses(vec![JobStatus::InProgress, JobStatus::Completed]);
        let mut flow = fast_flow();
        flow.set_prompt("  rotate slowly ");
        flow.select_image(jpeg(3000, 2000));

        let result = flow.run(&api, &CancellationToken::new()).await.unwrap();

        assert_eq!(
            flow.status(),
            &FlowStatus::Ready {
                video_url: result.public_url.clone()
            }
        );
        assert!(!flow.is_generating());
        assert_eq!(
            flow.take_notice(),
            Some(Notice::Success(SUCCESS_NOTICE.to_string()))
        );
        assert!(flow.notice().is_none());

        let submitted = api.submitted.lock().unwrap();
        assert_eq!(
            submitted.as_slice(),
            [(
                "rotate slowly".to_string(),
                REFERENCE_RESOLUTION.width as usize,
                REFERENCE_RESOLUTION.height as usize
            )]
        );
        let downloads = api.downloads.lock().unwrap();
        assert_eq!(
            downloads.as_slice(),
            [("video_abc".to_string(), Some("rotate slowly".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_missing_inputs_are_rejected_before_any_call() {
        let api = StubApi::default();
        let mut flow = fast_flow();
        flow.select_image(jpeg(64, 64));

        let err = flow.run(&api, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a prompt");

        flow.set_prompt("spin");
        flow.remove_image();
        let err = flow.run(&api, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Please upload an image");

        assert!(api.submitted.lock().unwrap().is_empty());
        assert_eq!(flow.status(), &FlowStatus::Idle);
        assert_eq!(
            flow.take_notice(),
            Some(Notice::Error("Please upload an image".to_string()))
        );
    }

    #[tokio::test]
    async fn test_failed_job_resets_to_idle() {
        let api = StubApi::with_statuses(vec![JobStatus::InProgress, JobStatus::Failed]);
        let mut flow = fast_flow();
        flow.set_prompt("rotate slowly");
        flow.select_image(jpeg(640, 480));

        let err = flow.run(&api, &CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, StudioError::JobFailed { .. }));
        assert_eq!(flow.status(), &FlowStatus::Idle);
        assert!(!flow.is_generating());
        assert!(matches!(flow.notice(), Some(Notice::Error(_))));
        assert!(api.downloads.lock().unwrap().is_empty());
    }

    #[test]
    fn test_selecting_returns_the_replaced_image() {
        let mut flow = GenerationFlow::default();
        assert!(flow.select_image(jpeg(8, 8)).is_none());
        let first_ref = flow.upload().unwrap().url().clone();
        let replaced = flow.select_image(jpeg(8, 8)).unwrap();
        assert_eq!(replaced.url(), &first_ref);
    }
}
