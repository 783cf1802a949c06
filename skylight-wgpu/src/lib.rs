//! Skylight: screen-space lighting features on wgpu.
//!
//! The centerpiece is [`ssgi::ScreenSpaceGi`], a five-stage compute pipeline
//! producing ambient occlusion and indirect illumination at a configurable
//! internal resolution with temporal accumulation. Sibling features (wetness,
//! water, volumetric lighting) and the upscaler share the same [`feature`]
//! contract and one JSON settings document.
//!
//! The host renderer owns the device and frame loop; everything here hangs
//! off an explicitly threaded [`context::RenderContext`].

pub mod config;
pub mod context;
pub mod error;
pub mod feature;
pub mod features;
pub mod ssgi;
pub mod targets;
pub mod upscaling;

pub use context::RenderContext;
pub use error::FeatureError;
pub use feature::{Feature, FeatureSet};
pub use ssgi::{CameraState, EyeCamera, ScreenSpaceGi, SsgiFrameInputs};
