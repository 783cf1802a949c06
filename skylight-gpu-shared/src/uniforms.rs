use bytemuck::{Pod, Zeroable};

/// Frame-flag bits for [`SsgiConstants::frame_flags`].
pub const SSGI_FLAG_GI: u32 = 1 << 0;
pub const SSGI_FLAG_BOUNCE: u32 = 1 << 1;
pub const SSGI_FLAG_TEMPORAL: u32 = 1 << 2;

/// Per-frame SSGI constant block, matching `SsgiConstants` in the WGSL kernels
/// (group 0, binding 0 of every stage).
///
/// Uniform-address-space rules force 16-byte array strides, so the per-view
/// NDC↔view pairs are packed as one `vec4` per view (xy = mul, zw = add) and
/// dimensions carry their reciprocals in zw.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Debug, Pod, Zeroable)]
pub struct SsgiConstants {
    /// Current-view → previous-view transform, one per stereo eye.
    pub prev_inv_view_mat: [[[f32; 4]; 4]; 2],
    /// xy = NDC→view multiply, zw = NDC→view add, one per stereo eye.
    pub ndc_to_view: [[f32; 4]; 2],
    /// xy = working-resolution texture dimensions, zw = reciprocals.
    pub tex_dim: [f32; 4],
    /// xy = full-frame dimensions, zw = reciprocals.
    pub frame_dim: [f32; 4],
    /// x = near plane, y = far plane, zw unused.
    pub camera_data: [f32; 4],

    pub frame_index: u32,
    pub num_slices: u32,
    pub num_steps: u32,
    pub max_accum_frames: u32,

    pub min_screen_radius: f32,
    pub ao_radius: f32,
    pub gi_radius: f32,
    pub effect_radius: f32,

    pub thickness: f32,
    pub depth_fade_start: f32,
    pub depth_fade_end: f32,
    pub depth_fade_scale_const: f32,

    pub gi_saturation: f32,
    pub gi_bounce_fade: f32,
    pub gi_distance_compensation: f32,
    pub gi_compensation_max_dist: f32,

    pub ao_power: f32,
    pub gi_strength: f32,
    pub depth_disocclusion: f32,
    pub normal_disocclusion: f32,

    pub blur_radius: f32,
    pub distance_normalisation: f32,
    /// `SSGI_FLAG_*` bits.
    pub frame_flags: u32,
    pub _pad: u32,
}

/// Per-frame wetness data, matching the wetness shader block bound by the host.
/// Raindrop parameters arrive pre-divided so the shader never divides per pixel.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Debug, Pod, Zeroable)]
pub struct WetnessPerFrame {
    /// Precipitation-occlusion projection of the active rain emitter.
    pub occlusion_view_proj: [[f32; 4]; 4],

    pub raining: f32,
    pub wetness: f32,
    pub puddle_wetness: f32,
    pub time: f32,

    pub max_rain_wetness: f32,
    pub max_puddle_wetness: f32,
    pub max_shore_wetness: f32,
    pub min_rain_wetness: f32,

    pub skin_wetness: f32,
    pub shore_range: f32,
    pub puddle_radius: f32,
    pub puddle_max_angle: f32,

    pub puddle_min_wetness: f32,
    /// Chance already scaled by raining².
    pub raindrop_chance: f32,
    pub rcp_raindrop_grid_size: f32,
    pub rcp_raindrop_interval: f32,

    pub splashes_strength: f32,
    pub ripple_strength: f32,
    /// Raindrop interval / ripple lifetime.
    pub ripple_lifetime_ratio: f32,
    /// Bit 0 splashes, bit 1 ripples.
    pub raindrop_flags: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssgi_constants_size_is_uniform_aligned() {
        // Must match the WGSL struct size; uniform blocks round to 16 bytes.
        assert_eq!(std::mem::size_of::<SsgiConstants>(), 304);
        assert_eq!(std::mem::size_of::<SsgiConstants>() % 16, 0);
    }

    #[test]
    fn wetness_per_frame_size_is_uniform_aligned() {
        assert_eq!(std::mem::size_of::<WetnessPerFrame>() % 16, 0);
    }
}
