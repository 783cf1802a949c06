//! Surface wetness and raindrop effects.
//!
//! The weather math runs on the CPU once per frame; the shader block receives
//! pre-divided raindrop parameters and final wetness levels.

use glam::Mat4;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use skylight_gpu_shared::uniforms::WetnessPerFrame;

use crate::context::RenderContext;
use crate::feature::Feature;

pub const RAINDROP_FLAG_SPLASHES: u32 = 1 << 0;
pub const RAINDROP_FLAG_RIPPLES: u32 = 1 << 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Settings {
    pub enable_wetness_effects: bool,
    pub max_rain_wetness: f32,
    pub max_puddle_wetness: f32,
    pub max_shore_wetness: f32,
    pub shore_range: u32,
    pub puddle_radius: f32,
    pub puddle_max_angle: f32,
    pub puddle_min_wetness: f32,
    pub min_rain_wetness: f32,
    pub skin_wetness: f32,
    pub weather_transition_speed: f32,

    pub enable_raindrop_fx: bool,
    pub enable_splashes: bool,
    pub enable_ripples: bool,
    pub raindrop_grid_size: f32,
    pub raindrop_interval: f32,
    pub raindrop_chance: f32,
    pub splashes_strength: f32,
    pub ripple_strength: f32,
    pub ripple_lifetime: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_wetness_effects: true,
            max_rain_wetness: 1.0,
            max_puddle_wetness: 2.5,
            max_shore_wetness: 0.5,
            shore_range: 32,
            puddle_radius: 1.0,
            puddle_max_angle: 0.95,
            puddle_min_wetness: 0.85,
            min_rain_wetness: 0.65,
            skin_wetness: 0.95,
            weather_transition_speed: 3.0,
            enable_raindrop_fx: true,
            enable_splashes: true,
            enable_ripples: true,
            raindrop_grid_size: 4.0,
            raindrop_interval: 0.5,
            raindrop_chance: 0.3,
            splashes_strength: 1.05,
            ripple_strength: 1.0,
            ripple_lifetime: 0.15,
        }
    }
}

impl Settings {
    pub fn sanitize(&mut self) {
        self.shore_range = self.shore_range.clamp(1, 64);
        self.puddle_radius = self.puddle_radius.clamp(0.3, 3.0);
        self.puddle_max_angle = self.puddle_max_angle.clamp(0.6, 1.0);
        self.puddle_min_wetness = self.puddle_min_wetness.clamp(0.0, 1.0);
        self.min_rain_wetness = self.min_rain_wetness.clamp(0.0, 1.0);
        self.skin_wetness = self.skin_wetness.clamp(0.0, 1.0);
        self.weather_transition_speed = self.weather_transition_speed.clamp(0.5, 5.0);
        self.raindrop_grid_size = self.raindrop_grid_size.max(0.1);
        self.raindrop_interval = self.raindrop_interval.max(0.01);
        self.raindrop_chance = self.raindrop_chance.clamp(0.0, 1.0);
        self.ripple_lifetime = self.ripple_lifetime.max(0.01);
    }
}

/// Weather state sampled by the host once per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeatherSample {
    /// Rain emitter density ratio of the incoming weather, 0..1.
    pub current_raining: f32,
    /// Same for the outgoing weather.
    pub last_raining: f32,
    pub current_is_rainy: bool,
    pub last_is_rainy: bool,
    /// Transition progress from last weather to current, 0..1.
    pub transition_pct: f32,
    /// Transition point where the incoming rain starts fading in, 0..255
    /// offset below full transition.
    pub precip_begin_fade_in: f32,
    /// Transition point where the outgoing rain finishes fading out, 0..255.
    pub precip_end_fade_out: f32,
    pub occlusion_view_proj: Mat4,
    pub paused: bool,
}

fn linearstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0)
}

pub struct WetnessEffects {
    pub settings: Settings,
    /// Milliseconds, integer so long sessions never lose sub-frame steps.
    rain_timer_ms: u64,
}

impl Default for WetnessEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl WetnessEffects {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            rain_timer_ms: 0,
        }
    }

    /// Advance the rain timer and bake this frame's shader block.
    pub fn per_frame_data(&mut self, weather: &WeatherSample, dt_seconds: f32) -> WetnessPerFrame {
        let s = &self.settings;

        let mut raining = 0.0;
        let mut wetness = 0.0;
        let mut puddle_wetness = 0.0;

        if s.enable_wetness_effects {
            raining = (weather.current_raining + weather.last_raining).min(1.0);

            let pct255 = weather.transition_pct * 255.0;

            let mut wetness_current = 0.0;
            let mut puddle_current = 0.0;
            if weather.current_is_rainy {
                wetness_current = linearstep(255.0 + weather.precip_begin_fade_in, 255.0, pct255);
                puddle_current = wetness_current * wetness_current;
            }

            let mut wetness_last = 0.0;
            let mut puddle_last = 0.0;
            if weather.last_is_rainy {
                wetness_last = 1.0 - linearstep(weather.precip_end_fade_out, 255.0, pct255);
                puddle_last = wetness_last.max(1.0 - weather.transition_pct).powf(0.25);
            }

            wetness = (wetness_current + wetness_last).min(1.0);
            puddle_wetness = (puddle_current + puddle_last).min(1.0);
        }

        // The timer freezes with the game so drops do not pile up over a
        // pause.
        if !weather.paused {
            self.rain_timer_ms += (dt_seconds * 1000.0) as u64;
        }

        let mut raindrop_flags = 0;
        if s.enable_raindrop_fx && s.enable_splashes {
            raindrop_flags |= RAINDROP_FLAG_SPLASHES;
        }
        if s.enable_raindrop_fx && s.enable_ripples {
            raindrop_flags |= RAINDROP_FLAG_RIPPLES;
        }

        WetnessPerFrame {
            occlusion_view_proj: weather.occlusion_view_proj.to_cols_array_2d(),
            raining,
            wetness,
            puddle_wetness,
            time: self.rain_timer_ms as f32 / 1000.0,
            max_rain_wetness: s.max_rain_wetness,
            max_puddle_wetness: s.max_puddle_wetness,
            max_shore_wetness: if s.enable_wetness_effects {
                s.max_shore_wetness
            } else {
                0.0
            },
            min_rain_wetness: s.min_rain_wetness,
            skin_wetness: s.skin_wetness,
            shore_range: s.shore_range as f32,
            puddle_radius: s.puddle_radius,
            puddle_max_angle: s.puddle_max_angle,
            puddle_min_wetness: s.puddle_min_wetness,
            raindrop_chance: s.raindrop_chance * raining * raining,
            rcp_raindrop_grid_size: 1.0 / s.raindrop_grid_size,
            rcp_raindrop_interval: 1.0 / s.raindrop_interval,
            splashes_strength: s.splashes_strength,
            ripple_strength: s.ripple_strength,
            ripple_lifetime_ratio: s.raindrop_interval / s.ripple_lifetime,
            raindrop_flags,
        }
    }
}

impl Feature for WetnessEffects {
    fn name(&self) -> &'static str {
        "Wetness Effects"
    }

    fn short_name(&self) -> &'static str {
        "WetnessEffects"
    }

    fn load_settings(&mut self, value: &Value) {
        if let Some(section) = value.get(self.short_name()) {
            match serde_json::from_value::<Settings>(section.clone()) {
                Ok(mut settings) => {
                    settings.sanitize();
                    self.settings = settings;
                }
                Err(err) => log::warn!("ignoring malformed {} settings: {err}", self.short_name()),
            }
        }
    }

    fn save_settings(&self, value: &mut Value) {
        if let (Value::Object(doc), Ok(section)) =
            (value, serde_json::to_value(&self.settings))
        {
            doc.insert(self.short_name().to_owned(), section);
        }
    }

    fn restore_default_settings(&mut self) {
        self.settings = Settings::default();
    }

    fn draw_settings(&mut self, ui: &mut egui::Ui) {
        let s = &mut self.settings;
        ui.checkbox(&mut s.enable_wetness_effects, "Enabled");
        ui.add(egui::Slider::new(&mut s.max_rain_wetness, 0.0..=2.0).text("Max Rain Wetness"));
        ui.add(egui::Slider::new(&mut s.max_puddle_wetness, 0.0..=4.0).text("Max Puddle Wetness"));
        ui.add(egui::Slider::new(&mut s.max_shore_wetness, 0.0..=2.0).text("Max Shore Wetness"));
        ui.add(egui::Slider::new(&mut s.min_rain_wetness, 0.0..=1.0).text("Min Rain Wetness"));
        ui.add(egui::Slider::new(&mut s.skin_wetness, 0.0..=1.0).text("Skin Wetness"));
        ui.add(
            egui::Slider::new(&mut s.weather_transition_speed, 0.5..=5.0)
                .text("Weather Transition Speed"),
        );
        ui.add(egui::Slider::new(&mut s.shore_range, 1..=64).text("Shore Range"));
        ui.add(egui::Slider::new(&mut s.puddle_radius, 0.3..=3.0).text("Puddle Radius"));
        ui.add(egui::Slider::new(&mut s.puddle_max_angle, 0.6..=1.0).text("Puddle Max Angle"));
        ui.add(egui::Slider::new(&mut s.puddle_min_wetness, 0.0..=1.0).text("Puddle Min Wetness"));

        ui.separator();
        ui.checkbox(&mut s.enable_raindrop_fx, "Raindrop Effects");
        ui.checkbox(&mut s.enable_splashes, "Splashes");
        ui.checkbox(&mut s.enable_ripples, "Ripples");
        ui.add(egui::Slider::new(&mut s.raindrop_grid_size, 0.1..=10.0).text("Raindrop Grid Size"));
        ui.add(egui::Slider::new(&mut s.raindrop_interval, 0.01..=2.0).text("Raindrop Interval"));
        ui.add(egui::Slider::new(&mut s.raindrop_chance, 0.0..=1.0).text("Raindrop Chance"));
        ui.add(egui::Slider::new(&mut s.splashes_strength, 0.0..=2.0).text("Splashes Strength"));
        ui.add(egui::Slider::new(&mut s.ripple_strength, 0.0..=2.0).text("Ripple Strength"));
        ui.add(egui::Slider::new(&mut s.ripple_lifetime, 0.01..=1.0).text("Ripple Lifetime"));
    }

    fn setup_resources(&mut self, _ctx: &RenderContext) {}

    fn reset(&mut self) {
        self.rain_timer_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rainy_sample(pct: f32) -> WeatherSample {
        WeatherSample {
            current_raining: 0.8,
            last_raining: 0.0,
            current_is_rainy: true,
            last_is_rainy: false,
            transition_pct: pct,
            precip_begin_fade_in: -128.0,
            precip_end_fade_out: 128.0,
            ..Default::default()
        }
    }

    #[test]
    fn dry_weather_produces_no_wetness() {
        let mut fx = WetnessEffects::new();
        let data = fx.per_frame_data(&WeatherSample::default(), 0.016);
        assert_eq!(data.raining, 0.0);
        assert_eq!(data.wetness, 0.0);
        assert_eq!(data.puddle_wetness, 0.0);
        assert_eq!(data.raindrop_chance, 0.0);
    }

    #[test]
    fn wetness_fades_in_with_the_transition() {
        let mut fx = WetnessEffects::new();
        let early = fx.per_frame_data(&rainy_sample(0.5), 0.016);
        let late = fx.per_frame_data(&rainy_sample(0.9), 0.016);
        assert!(early.wetness < late.wetness);
        assert!(late.wetness <= 1.0);
        // Puddles lag the surface film.
        assert!(late.puddle_wetness <= late.wetness * late.wetness + 1e-6);
    }

    #[test]
    fn outgoing_weather_keeps_puddles_for_a_while() {
        let mut fx = WetnessEffects::new();
        let sample = WeatherSample {
            last_raining: 0.5,
            last_is_rainy: true,
            transition_pct: 0.6,
            precip_end_fade_out: 128.0,
            ..Default::default()
        };
        let data = fx.per_frame_data(&sample, 0.016);
        assert!(data.puddle_wetness > data.wetness);
    }

    #[test]
    fn raindrop_parameters_arrive_precomputed() {
        let mut fx = WetnessEffects::new();
        fx.settings.raindrop_grid_size = 4.0;
        fx.settings.raindrop_interval = 0.5;
        fx.settings.ripple_lifetime = 0.25;

        let sample = WeatherSample {
            current_raining: 1.0,
            current_is_rainy: true,
            transition_pct: 1.0,
            ..Default::default()
        };
        let data = fx.per_frame_data(&sample, 0.016);

        assert_eq!(data.rcp_raindrop_grid_size, 0.25);
        assert_eq!(data.rcp_raindrop_interval, 2.0);
        assert_eq!(data.ripple_lifetime_ratio, 2.0);
        // chance scales with raining^2
        assert!((data.raindrop_chance - fx.settings.raindrop_chance).abs() < 1e-6);
        assert_eq!(
            data.raindrop_flags,
            RAINDROP_FLAG_SPLASHES | RAINDROP_FLAG_RIPPLES
        );
    }

    #[test]
    fn rain_timer_freezes_while_paused() {
        let mut fx = WetnessEffects::new();
        let sample = WeatherSample::default();
        fx.per_frame_data(&sample, 1.0);
        let paused = WeatherSample {
            paused: true,
            ..Default::default()
        };
        let data = fx.per_frame_data(&paused, 1.0);
        assert_eq!(data.time, 1.0);
    }

    #[test]
    fn disabling_the_feature_zeroes_shore_wetness() {
        let mut fx = WetnessEffects::new();
        fx.settings.enable_wetness_effects = false;
        let data = fx.per_frame_data(&rainy_sample(1.0), 0.016);
        assert_eq!(data.max_shore_wetness, 0.0);
        assert_eq!(data.wetness, 0.0);
    }
}
