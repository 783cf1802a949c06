//! Texture creation helpers for the compute pipelines.
//! Working-depth mip chain, storage targets, noise texture, ping-pong pairs.

/// Linearized depth and AO (single channel, storage-capable).
pub const WORK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
/// Radiance and packed geometry (normal + depth).
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Illumination chroma (CoCg).
pub const COCG_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg32Float;
/// Temporal accumulation counters.
pub const ACCUM_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;

/// A two-element double buffer with a single read index, flipped atomically
/// at the end of a successful frame so external readers never observe a
/// half-written slot.
pub struct PingPong<T> {
    pair: [T; 2],
    read: usize,
}

impl<T> PingPong<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { pair: [a, b], read: 0 }
    }

    /// Index of the slot currently exposed to readers.
    pub fn read_index(&self) -> usize {
        self.read
    }

    /// Slot currently exposed to readers (last frame's output).
    pub fn read(&self) -> &T {
        &self.pair[self.read]
    }

    /// Slot being written this frame.
    pub fn write(&self) -> &T {
        &self.pair[1 - self.read]
    }

    /// Expose the freshly written slot. Called exactly once per frame.
    pub fn flip(&mut self) {
        self.read = 1 - self.read;
    }
}

/// A texture with its default full view.
pub struct StorageTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

/// Create a storage-capable texture usable as both a sampled input and a
/// compute output.
pub fn create_storage_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> StorageTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    StorageTexture {
        texture,
        view,
        width,
        height,
    }
}

/// The prefiltered working-depth chain: one texture, five mips, plus a
/// write view per mip for the prefilter stage.
pub struct MipChainTexture {
    pub texture: wgpu::Texture,
    /// Full view over all mips, for sampling in later stages.
    pub full_view: wgpu::TextureView,
    pub mip_views: Vec<wgpu::TextureView>,
    pub width: u32,
    pub height: u32,
}

pub const WORKING_DEPTH_MIPS: u32 = 5;

pub fn create_mip_chain_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
) -> MipChainTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: WORKING_DEPTH_MIPS,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: WORK_FORMAT,
        usage: wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });

    let full_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let mip_views = (0..WORKING_DEPTH_MIPS)
        .map(|mip| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(&format!("{label} Mip {mip}")),
                base_mip_level: mip,
                mip_level_count: Some(1),
                ..Default::default()
            })
        })
        .collect();

    MipChainTexture {
        texture,
        full_view,
        mip_views,
        width,
        height,
    }
}

/// Generate the 64x64 spatio-temporal noise texture used to rotate the GI
/// slice directions per pixel. Deterministic hash for reproducibility.
pub fn create_noise_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> (wgpu::Texture, wgpu::TextureView) {
    const SIZE: u32 = 64;

    let mut data = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for i in 0..(SIZE * SIZE) {
        // Weyl-sequence hash, uniform enough to decorrelate neighbor slices.
        let h = i.wrapping_mul(0x9E37_79B9);
        let a = (h >> 8) & 0xFF;
        let b = (h >> 20) & 0xFF;
        data.push(a as u8);
        data.push(b as u8);
        data.push(0u8);
        data.push(255u8);
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("SSGI Noise"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * SIZE),
            rows_per_image: Some(SIZE),
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_pong_alternates_read_index() {
        let mut pp = PingPong::new("a", "b");
        assert_eq!(pp.read_index(), 0);
        assert_eq!(*pp.read(), "a");
        assert_eq!(*pp.write(), "b");

        for n in 1..=10 {
            pp.flip();
            assert_eq!(pp.read_index(), n % 2);
        }
    }

    #[test]
    fn ping_pong_read_write_never_alias() {
        let mut pp = PingPong::new(0u32, 1u32);
        for _ in 0..4 {
            assert_ne!(*pp.read(), *pp.write());
            pp.flip();
        }
    }
}
