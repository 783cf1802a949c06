//! GPU resource ownership for the GI pipeline.
//!
//! Allocation is keyed on `(resolution mode, screen size)`; calling
//! [`SsgiResources::setup`] again with the same key is a no-op.

use wgpu::util::DeviceExt;

use crate::error::FeatureError;
use crate::targets::{
    create_mip_chain_texture, create_noise_texture, create_storage_texture, MipChainTexture,
    PingPong, StorageTexture, ACCUM_FORMAT, COCG_FORMAT, HDR_FORMAT, WORK_FORMAT,
};

use super::settings::ResolutionMode;
use bytemuck::Zeroable;
use skylight_gpu_shared::uniforms::SsgiConstants;

/// Working resolution for a given screen size and mode. Never collapses to
/// zero on tiny surfaces.
pub fn working_dims(screen: [u32; 2], mode: ResolutionMode) -> [u32; 2] {
    let d = mode.divisor();
    [(screen[0] / d).max(1), (screen[1] / d).max(1)]
}

pub struct SsgiResources {
    pub noise: wgpu::Texture,
    pub noise_view: wgpu::TextureView,

    /// Linearized scene depth with a 5-level min-reduced mip chain,
    /// working resolution.
    pub working_depth: MipChainTexture,
    /// Last frame's packed normal + linear depth, full resolution.
    pub prev_geo: StorageTexture,
    /// Sampled ambient radiance for this frame, working resolution.
    pub radiance: StorageTexture,
    /// Temporal accumulation counters, working resolution.
    pub accum: PingPong<StorageTexture>,

    // Working-resolution intermediates of the GI estimator and blur.
    pub raw_ao: StorageTexture,
    pub raw_il_y: StorageTexture,
    pub raw_il_cocg: StorageTexture,
    pub blur_ao: StorageTexture,
    pub blur_il_y: StorageTexture,
    pub blur_il_cocg: StorageTexture,

    // Full-resolution outputs, double-buffered so last frame's result stays
    // readable while this frame writes.
    pub out_ao: PingPong<StorageTexture>,
    pub out_il_y: PingPong<StorageTexture>,
    pub out_il_cocg: PingPong<StorageTexture>,

    pub samp_linear: wgpu::Sampler,
    pub samp_point: wgpu::Sampler,
    pub uniform_buffer: wgpu::Buffer,

    mode: ResolutionMode,
    screen: [u32; 2],
    generation: u64,
}

impl SsgiResources {
    /// Allocate the full target set. Device OOM is caught by an error scope
    /// and surfaced instead of reaching the uncaptured-error handler.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mode: ResolutionMode,
        screen: [u32; 2],
    ) -> Result<Self, FeatureError> {
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let resources = Self::allocate(device, queue, mode, screen);
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(FeatureError::ResourceAllocation(err.to_string()));
        }
        Ok(resources)
    }

    fn allocate(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mode: ResolutionMode,
        screen: [u32; 2],
    ) -> Self {
        let [ww, wh] = working_dims(screen, mode);
        let [fw, fh] = screen;

        let (noise, noise_view) = create_noise_texture(device, queue);

        let samp_linear = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("SSGI Linear Clamp Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let samp_point = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("SSGI Point Clamp Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("SSGI Constants"),
            contents: bytemuck::bytes_of(&SsgiConstants::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let work = |label: &str, format| create_storage_texture(device, label, ww, wh, format);
        let full = |label: &str, format| create_storage_texture(device, label, fw, fh, format);

        Self {
            noise,
            noise_view,
            working_depth: create_mip_chain_texture(device, "SSGI Working Depth", ww, wh),
            prev_geo: full("SSGI Prev Geometry", HDR_FORMAT),
            radiance: work("SSGI Radiance", HDR_FORMAT),
            accum: PingPong::new(
                work("SSGI Accum Frames 0", ACCUM_FORMAT),
                work("SSGI Accum Frames 1", ACCUM_FORMAT),
            ),
            raw_ao: work("SSGI Raw AO", WORK_FORMAT),
            raw_il_y: work("SSGI Raw IL Y", WORK_FORMAT),
            raw_il_cocg: work("SSGI Raw IL CoCg", COCG_FORMAT),
            blur_ao: work("SSGI Blur AO", WORK_FORMAT),
            blur_il_y: work("SSGI Blur IL Y", WORK_FORMAT),
            blur_il_cocg: work("SSGI Blur IL CoCg", COCG_FORMAT),
            out_ao: PingPong::new(
                full("SSGI AO 0", WORK_FORMAT),
                full("SSGI AO 1", WORK_FORMAT),
            ),
            out_il_y: PingPong::new(
                full("SSGI IL Y 0", WORK_FORMAT),
                full("SSGI IL Y 1", WORK_FORMAT),
            ),
            out_il_cocg: PingPong::new(
                full("SSGI IL CoCg 0", COCG_FORMAT),
                full("SSGI IL CoCg 1", COCG_FORMAT),
            ),
            samp_linear,
            samp_point,
            uniform_buffer,
            mode,
            screen,
            generation: 0,
        }
    }

    /// Reallocate if the key changed. Returns true when textures were
    /// recreated, meaning bind groups must be rebuilt.
    pub fn setup(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mode: ResolutionMode,
        screen: [u32; 2],
    ) -> Result<bool, FeatureError> {
        if self.mode == mode && self.screen == screen {
            return Ok(false);
        }
        log::info!(
            "reallocating SSGI targets: {:?} {}x{}",
            mode,
            screen[0],
            screen[1]
        );
        let generation = self.generation + 1;
        *self = Self::new(device, queue, mode, screen)?;
        self.generation = generation;
        Ok(true)
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    pub fn screen(&self) -> [u32; 2] {
        self.screen
    }

    pub fn working(&self) -> [u32; 2] {
        working_dims(self.screen, self.mode)
    }

    /// Bumped on every reallocation; lets callers detect stale bind groups.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advance the double buffers. Exactly once per executed frame.
    pub fn flip(&mut self) {
        self.accum.flip();
        self.out_ao.flip();
        self.out_il_y.flip();
        self.out_il_cocg.flip();
    }
}
