//! Capture, submit and render workflow for an external object-detection service,
//! plus the gateway that serves the front end and proxies to the backends.
//!
//! The workflow side is UI-agnostic: the embedding front end implements
//! [`DetectView`] for its display surfaces and [`CameraDevice`] for video
//! capture, then drives a [`DetectController`] from its event handlers.
//!
//! ```no_run
//! # use detect_gateway::*;
//! # async fn run<V: DetectView>(
//! #     device: Box<dyn CameraDevice>,
//! #     view: V,
//! # ) -> Result<(), DetectError> {
//! let state = UiSessionState::new(CameraSession::new(device));
//! let controller = DetectController::new(DetectClient::new("http://localhost:3000"), state, view);
//!
//! controller.start_camera()?;
//! let result = controller.capture().await?;
//! println!("{:?}", result.display_lines());
//! # Ok(())
//! # }
//! ```
//!
//! The gateway side is a plain [`axum::Router`] built by [`gateway::router`].

pub mod camera;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod messages;
pub mod render;
pub mod source;

pub use camera::{CameraDevice, CameraSession, CameraState, LiveFeed, VideoStream};
pub use client::DetectClient;
pub use config::GatewayConfig;
pub use controller::{DetectController, SubmitState, UiSessionState};
pub use error::{DetectError, GatewayError};
pub use messages::{Detection, DetectionResult};
pub use render::DetectView;
pub use source::{ImageSource, Preview};
