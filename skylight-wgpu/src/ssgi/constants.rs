//! Per-frame uniform construction for the GI kernels.
//!
//! [`build_constants`] is a pure function of settings + camera + dims, so the
//! exact bytes that reach the GPU can be asserted in tests.

use glam::Mat4;
use skylight_gpu_shared::uniforms::{
    SsgiConstants, SSGI_FLAG_BOUNCE, SSGI_FLAG_GI, SSGI_FLAG_TEMPORAL,
};

use super::settings::Settings;

/// Projection and previous-frame view state for one eye.
#[derive(Clone, Copy, Debug)]
pub struct EyeCamera {
    /// Projection matrix element [0][0].
    pub proj_00: f32,
    /// Projection matrix element [1][1].
    pub proj_11: f32,
    /// Inverse view matrix of the previous frame, for reprojection.
    pub prev_inv_view: Mat4,
}

impl Default for EyeCamera {
    fn default() -> Self {
        Self {
            proj_00: 1.0,
            proj_11: 1.0,
            prev_inv_view: Mat4::IDENTITY,
        }
    }
}

/// Camera state sampled once per frame by the host renderer.
#[derive(Clone, Copy, Debug)]
pub struct CameraState {
    pub eyes: [EyeCamera; 2],
    pub near: f32,
    pub far: f32,
}

impl CameraState {
    /// Mono rendering: the second view mirrors the first.
    pub fn mono(eye: EyeCamera, near: f32, far: f32) -> Self {
        Self {
            eyes: [eye, eye],
            near,
            far,
        }
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::mono(EyeCamera::default(), 0.1, 1e5)
    }
}

fn ndc_to_view(eye: &EyeCamera) -> [f32; 4] {
    // uv-space position to view-space ray: scale in xy, offset in zw.
    [
        2.0 / eye.proj_00,
        -2.0 / eye.proj_11,
        -1.0 / eye.proj_00,
        1.0 / eye.proj_11,
    ]
}

/// Derive the uniform block for one frame. Deterministic: identical inputs
/// yield byte-identical output.
pub fn build_constants(
    settings: &Settings,
    camera: &CameraState,
    frame_index: u32,
    tex_dim: [u32; 2],
    frame_dim: [u32; 2],
) -> SsgiConstants {
    let divisor = settings.resolution_mode.divisor() as f32;
    let effect_radius = settings.ao_radius.max(settings.gi_radius) / divisor;

    let [fade_start, fade_end] = settings.depth_fade_range;
    let depth_fade_scale_const = 1.0 / (fade_end - fade_start);

    // Compensation ramps IL up to max strength over a fraction of the radius.
    let gi_compensation_max_dist = if settings.gi_distance_compensation > 0.0 {
        settings.gi_radius
    } else {
        0.0
    };

    let mut frame_flags = 0u32;
    if settings.enable_gi {
        frame_flags |= SSGI_FLAG_GI;
    }
    if settings.enable_gi && settings.enable_gi_bounce {
        frame_flags |= SSGI_FLAG_BOUNCE;
    }
    if settings.enable_temporal_denoiser {
        frame_flags |= SSGI_FLAG_TEMPORAL;
    }

    SsgiConstants {
        prev_inv_view_mat: [
            camera.eyes[0].prev_inv_view.to_cols_array_2d(),
            camera.eyes[1].prev_inv_view.to_cols_array_2d(),
        ],
        ndc_to_view: [ndc_to_view(&camera.eyes[0]), ndc_to_view(&camera.eyes[1])],
        tex_dim: [
            tex_dim[0] as f32,
            tex_dim[1] as f32,
            1.0 / tex_dim[0] as f32,
            1.0 / tex_dim[1] as f32,
        ],
        frame_dim: [
            frame_dim[0] as f32,
            frame_dim[1] as f32,
            1.0 / frame_dim[0] as f32,
            1.0 / frame_dim[1] as f32,
        ],
        camera_data: [camera.near, camera.far, 0.0, 0.0],
        frame_index,
        num_slices: settings.num_slices,
        num_steps: settings.num_steps,
        max_accum_frames: settings.max_accum_frames,
        min_screen_radius: settings.min_screen_radius,
        ao_radius: settings.ao_radius,
        gi_radius: settings.gi_radius,
        effect_radius,
        thickness: settings.thickness,
        depth_fade_start: fade_start,
        depth_fade_end: fade_end,
        depth_fade_scale_const,
        gi_saturation: settings.gi_saturation,
        gi_bounce_fade: settings.gi_bounce_fade,
        gi_distance_compensation: settings.gi_distance_compensation,
        gi_compensation_max_dist,
        ao_power: settings.ao_power,
        gi_strength: settings.gi_strength,
        depth_disocclusion: settings.depth_disocclusion,
        normal_disocclusion: settings.normal_disocclusion,
        blur_radius: settings.blur_radius,
        distance_normalisation: settings.distance_normalisation,
        frame_flags,
        _pad: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssgi::settings::ResolutionMode;

    fn camera() -> CameraState {
        CameraState::mono(
            EyeCamera {
                proj_00: 1.2,
                proj_11: 2.1,
                prev_inv_view: Mat4::IDENTITY,
            },
            16.0,
            2e5,
        )
    }

    #[test]
    fn build_is_deterministic() {
        let s = Settings::default();
        let a = build_constants(&s, &camera(), 7, [960, 540], [1920, 1080]);
        let b = build_constants(&s, &camera(), 7, [960, 540], [1920, 1080]);
        assert_eq!(bytemuck::bytes_of(&a), bytemuck::bytes_of(&b));
    }

    #[test]
    fn effect_radius_scales_with_resolution_mode() {
        let mut s = Settings::default();
        s.ao_radius = 100.0;
        s.gi_radius = 400.0;

        s.resolution_mode = ResolutionMode::Full;
        let full = build_constants(&s, &camera(), 0, [1920, 1080], [1920, 1080]);
        assert_eq!(full.effect_radius, 400.0);

        s.resolution_mode = ResolutionMode::Quarter;
        let quarter = build_constants(&s, &camera(), 0, [480, 270], [1920, 1080]);
        assert_eq!(quarter.effect_radius, 100.0);
    }

    #[test]
    fn frame_flags_reflect_toggles() {
        let mut s = Settings::default();
        let c = build_constants(&s, &camera(), 0, [960, 540], [1920, 1080]);
        assert_eq!(
            c.frame_flags,
            SSGI_FLAG_GI | SSGI_FLAG_BOUNCE | SSGI_FLAG_TEMPORAL
        );

        // Bounce is meaningless without GI.
        s.enable_gi = false;
        let c = build_constants(&s, &camera(), 0, [960, 540], [1920, 1080]);
        assert_eq!(c.frame_flags, SSGI_FLAG_TEMPORAL);

        s.enable_temporal_denoiser = false;
        let c = build_constants(&s, &camera(), 0, [960, 540], [1920, 1080]);
        assert_eq!(c.frame_flags, 0);
    }

    #[test]
    fn depth_fade_scale_matches_range() {
        let mut s = Settings::default();
        s.depth_fade_range = [100.0, 300.0];
        let c = build_constants(&s, &camera(), 0, [960, 540], [1920, 1080]);
        assert_eq!(c.depth_fade_start, 100.0);
        assert_eq!(c.depth_fade_end, 300.0);
        assert!((c.depth_fade_scale_const - 0.005).abs() < 1e-9);
    }

    #[test]
    fn dims_carry_reciprocals() {
        let s = Settings::default();
        let c = build_constants(&s, &camera(), 0, [960, 540], [1920, 1080]);
        assert_eq!(c.tex_dim[0], 960.0);
        assert!((c.tex_dim[2] * 960.0 - 1.0).abs() < 1e-6);
        assert_eq!(c.frame_dim[1], 1080.0);
    }
}
