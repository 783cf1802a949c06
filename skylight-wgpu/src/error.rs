use std::path::PathBuf;
use thiserror::Error;

/// Failures a feature can surface to the host.
///
/// Every variant is local to the feature that raised it: the caller's frame
/// loop keeps running and the feature degrades to its disabled state.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("shader validation failed for {stage}: {message}")]
    ShaderValidation { stage: &'static str, message: String },

    #[error("resource allocation failed: {0}")]
    ResourceAllocation(String),

    #[error("texture decode failed for {path}: {source}")]
    TextureDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
