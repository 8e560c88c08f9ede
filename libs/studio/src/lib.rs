//! FrameLab studio core
//!
//! Everything the studio needs on the user's side of the proxy: reference
//! image preparation, the video job client and its completion poller, and
//! the editable models behind the builder and storyboard pages.
//!
//! # Example
//!
//! ```rust,no_run
//! use studio::{GenerationFlow, StudioConfig, UploadedImage, VideoJobClient};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn generate(photo: Vec<u8>) -> studio::StudioResult<String> {
//!     let config = StudioConfig::from_env()?;
//!     let client = VideoJobClient::from_config(&config)?;
//!
//!     let mut flow = GenerationFlow::new(config.poll.clone());
//!     flow.set_prompt("rotate slowly");
//!     flow.select_image(UploadedImage::new("product.jpg", photo)?);
//!
//!     let result = flow.run(&client, &CancellationToken::new()).await?;
//!     Ok(result.public_url)
//! }
//! ```

pub mod brief;
pub mod client;
pub mod config;
pub mod data_url;
pub mod error;
pub mod flow;
pub mod image_prep;
pub mod job;
pub mod poller;
pub mod scenes;
pub mod storyboard;
pub mod upload;
pub mod wire;

pub use client::{SceneImageApi, VideoJobApi, VideoJobClient};
pub use config::StudioConfig;
pub use error::{StudioError, StudioResult};
pub use flow::{FlowStatus, GenerationFlow, Notice};
pub use image_prep::{PreparedImage, REFERENCE_RESOLUTION, Resolution, prepare_reference_image};
pub use job::{JobStatus, VideoJob, VideoResult};
pub use poller::{CompletionPoller, JobStatusSource, PollConfig};
pub use upload::UploadedImage;
