//! Render context shared by all features.
//!
//! The host renderer owns the device, queue, and frame loop; features only
//! borrow them through this context. The headless constructor exists for
//! offline tools and the integration tests.

use crate::error::FeatureError;

/// Everything a feature needs from the host renderer.
pub struct RenderContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Full output resolution in pixels.
    pub screen_size: [u32; 2],
    /// 1 for mono rendering, 2 for stereo.
    pub eye_count: u32,
}

impl RenderContext {
    /// Wrap a device/queue pair owned by the host.
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue, width: u32, height: u32) -> Self {
        Self {
            device,
            queue,
            screen_size: [width, height],
            eye_count: 1,
        }
    }

    /// Bring up a device without a surface.
    pub fn new_headless(width: u32, height: u32) -> Result<Self, FeatureError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(FeatureError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Skylight Headless Device"),
                // History textures are R32Float/Rg32Float and the denoiser
                // samples them bilinearly.
                required_features: wgpu::Features::FLOAT32_FILTERABLE,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))?;

        log::info!(
            "Skylight headless device: {} ({})",
            adapter.get_info().name,
            adapter.get_info().backend.to_str()
        );

        Ok(Self::from_parts(device, queue, width, height))
    }

    /// Update the tracked output resolution. Features re-check it in their
    /// next `setup_resources` call.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.screen_size = [width, height];
        }
    }
}
