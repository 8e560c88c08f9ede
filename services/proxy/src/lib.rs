//! FrameLab proxy service
//!
//! The only component holding engine and storage credentials. Browsers and
//! the studio client talk to these routes; the proxy talks to the video,
//! image and speech engines and to object storage.

pub mod config;
pub mod engine;
pub mod error;
pub mod image_edit;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod speech;
pub mod state;
pub mod storage;

pub use routes::create_router;
pub use state::AppState;
