//! User-facing SSGI tunables.
//!
//! Plain data; the pipeline never mutates it. Loaded values are clamped by
//! [`Settings::sanitize`] so a hand-edited config cannot push invalid state
//! at the GPU.

use serde::{Deserialize, Serialize};

/// Internal rendering resolution of the GI pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResolutionMode {
    Full,
    #[default]
    Half,
    Quarter,
}

impl ResolutionMode {
    /// Screen dimensions are divided by this before allocating working
    /// textures.
    pub fn divisor(self) -> u32 {
        match self {
            ResolutionMode::Full => 1,
            ResolutionMode::Half => 2,
            ResolutionMode::Quarter => 4,
        }
    }

    pub fn from_index(idx: u32) -> Self {
        match idx {
            0 => ResolutionMode::Full,
            2 => ResolutionMode::Quarter,
            _ => ResolutionMode::Half,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            ResolutionMode::Full => 0,
            ResolutionMode::Half => 1,
            ResolutionMode::Quarter => 2,
        }
    }
}

// Persisted as the bare mode index, like the original settings files.
impl Serialize for ResolutionMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.index())
    }
}

impl<'de> Deserialize<'de> for ResolutionMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let idx = u32::deserialize(deserializer)?;
        Ok(ResolutionMode::from_index(idx))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Settings {
    pub enabled: bool,
    #[serde(rename = "EnableGI")]
    pub enable_gi: bool,
    // performance/quality
    pub num_slices: u32,
    pub num_steps: u32,
    pub resolution_mode: ResolutionMode,
    // visual
    pub min_screen_radius: f32,
    #[serde(rename = "AORadius")]
    pub ao_radius: f32,
    #[serde(rename = "GIRadius")]
    pub gi_radius: f32,
    pub thickness: f32,
    pub depth_fade_range: [f32; 2],
    // gi
    #[serde(rename = "GISaturation")]
    pub gi_saturation: f32,
    #[serde(rename = "EnableGIBounce")]
    pub enable_gi_bounce: bool,
    #[serde(rename = "GIBounceFade")]
    pub gi_bounce_fade: f32,
    #[serde(rename = "GIDistanceCompensation")]
    pub gi_distance_compensation: f32,
    // mix
    #[serde(rename = "AOPower")]
    pub ao_power: f32,
    #[serde(rename = "GIStrength")]
    pub gi_strength: f32,
    // denoise
    pub enable_temporal_denoiser: bool,
    pub enable_blur: bool,
    pub depth_disocclusion: f32,
    pub normal_disocclusion: f32,
    pub max_accum_frames: u32,
    pub blur_radius: f32,
    pub distance_normalisation: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_gi: true,
            num_slices: 5,
            num_steps: 8,
            resolution_mode: ResolutionMode::Half,
            min_screen_radius: 0.01,
            ao_radius: 100.0,
            gi_radius: 400.0,
            thickness: 75.0,
            depth_fade_range: [4e4, 5e4],
            gi_saturation: 0.9,
            enable_gi_bounce: true,
            gi_bounce_fade: 0.3,
            gi_distance_compensation: 0.0,
            ao_power: 2.0,
            gi_strength: 1.5,
            enable_temporal_denoiser: true,
            enable_blur: true,
            depth_disocclusion: 0.1,
            normal_disocclusion: 0.1,
            max_accum_frames: 16,
            blur_radius: 5.0,
            distance_normalisation: 2.0,
        }
    }
}

impl Settings {
    /// Clamp everything into the ranges the UI widgets enforce. Applied after
    /// every load so malformed persisted files degrade instead of producing
    /// invalid GPU state.
    pub fn sanitize(&mut self) {
        self.num_slices = self.num_slices.clamp(1, 10);
        self.num_steps = self.num_steps.clamp(1, 32);
        self.min_screen_radius = self.min_screen_radius.clamp(0.0, 0.5);
        self.ao_radius = self.ao_radius.clamp(0.0, 2000.0);
        self.gi_radius = self.gi_radius.clamp(0.0, 2000.0);
        self.thickness = self.thickness.clamp(0.0, 500.0);
        self.depth_fade_range[0] = self.depth_fade_range[0].clamp(0.0, 1e7);
        self.depth_fade_range[1] = self.depth_fade_range[1].clamp(0.0, 1e7);
        if self.depth_fade_range[1] <= self.depth_fade_range[0] {
            self.depth_fade_range[1] = self.depth_fade_range[0] + 1.0;
        }
        self.gi_saturation = self.gi_saturation.clamp(0.0, 1.0);
        self.gi_bounce_fade = self.gi_bounce_fade.clamp(0.0, 1.0);
        self.gi_distance_compensation = self.gi_distance_compensation.clamp(0.0, 9.0);
        self.ao_power = self.ao_power.clamp(0.0, 8.0);
        self.gi_strength = self.gi_strength.clamp(0.0, 10.0);
        self.depth_disocclusion = self.depth_disocclusion.clamp(0.0, 1.0);
        self.normal_disocclusion = self.normal_disocclusion.clamp(0.0, 1.0);
        self.max_accum_frames = self.max_accum_frames.clamp(1, 64);
        self.blur_radius = self.blur_radius.clamp(0.0, 15.0);
        self.distance_normalisation = self.distance_normalisation.clamp(0.0, 10.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_shipped_values() {
        let s = Settings::default();
        assert_eq!(s.num_slices, 5);
        assert_eq!(s.num_steps, 8);
        assert_eq!(s.resolution_mode, ResolutionMode::Half);
        assert_eq!(s.max_accum_frames, 16);
        assert_eq!(s.depth_fade_range, [4e4, 5e4]);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let s: Settings = serde_json::from_value(json!({ "NumSlices": 7 })).unwrap();
        assert_eq!(s.num_slices, 7);
        assert_eq!(s.num_steps, Settings::default().num_steps);
        assert!(s.enabled);
    }

    #[test]
    fn round_trip_preserves_settings() {
        let mut s = Settings::default();
        s.enable_gi = false;
        s.resolution_mode = ResolutionMode::Quarter;
        s.gi_strength = 0.25;

        let doc = serde_json::to_value(&s).unwrap();
        assert_eq!(doc["ResolutionMode"], 2);
        let back: Settings = serde_json::from_value(doc).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut s: Settings = serde_json::from_value(json!({
            "NumSlices": 0,
            "NumSteps": 9999,
            "AORadius": -5.0,
            "MaxAccumFrames": 0,
            "GISaturation": 3.0,
            "DepthFadeRange": [100.0, 50.0],
        }))
        .unwrap();
        s.sanitize();

        assert_eq!(s.num_slices, 1);
        assert_eq!(s.num_steps, 32);
        assert_eq!(s.ao_radius, 0.0);
        assert_eq!(s.max_accum_frames, 1);
        assert_eq!(s.gi_saturation, 1.0);
        assert!(s.depth_fade_range[1] > s.depth_fade_range[0]);
    }

    #[test]
    fn unknown_resolution_mode_degrades_to_half() {
        let s: Settings = serde_json::from_value(json!({ "ResolutionMode": 42 })).unwrap();
        assert_eq!(s.resolution_mode, ResolutionMode::Half);
    }
}
