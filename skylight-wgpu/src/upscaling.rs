//! Temporal upscaler selection and camera jitter.
//!
//! Settings sit behind a mutex: the host render thread and the settings UI
//! both touch them, the render thread only briefly per frame.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpscaleMethod {
    None,
    #[default]
    Taa,
    Fsr,
    Dlss,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct UpscalingSettings {
    pub method: UpscaleMethod,
    pub sharpness: f32,
}

impl Default for UpscalingSettings {
    fn default() -> Self {
        Self {
            method: UpscaleMethod::Taa,
            sharpness: 0.5,
        }
    }
}

impl UpscalingSettings {
    pub fn sanitize(&mut self) {
        self.sharpness = self.sharpness.clamp(0.0, 1.0);
    }
}

/// Which upscaler backends the platform actually offers.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpscalerAvailability {
    pub fsr: bool,
    pub dlss: bool,
}

/// Low-discrepancy Halton sequence, 1-based index.
fn halton(mut index: u32, base: u32) -> f32 {
    let rcp = 1.0 / base as f32;
    let mut fraction = 1.0;
    let mut result = 0.0;
    while index > 0 {
        fraction *= rcp;
        result += fraction * (index % base) as f32;
        index /= base;
    }
    result
}

const JITTER_PHASES: u32 = 32;

pub struct Upscaling {
    pub settings: Mutex<UpscalingSettings>,
    availability: UpscalerAvailability,
    jitter_index: u32,
    reset: bool,
}

impl Upscaling {
    pub fn new(availability: UpscalerAvailability) -> Self {
        Self {
            settings: Mutex::new(UpscalingSettings::default()),
            availability,
            jitter_index: 0,
            reset: true,
        }
    }

    /// The method that will actually run: unavailable backends fall back,
    /// Dlss through Fsr to Taa.
    pub fn effective_method(&self) -> UpscaleMethod {
        let requested = self
            .settings
            .lock()
            .expect("upscaling settings lock poisoned")
            .method;
        match requested {
            UpscaleMethod::Dlss if !self.availability.dlss => {
                if self.availability.fsr {
                    UpscaleMethod::Fsr
                } else {
                    UpscaleMethod::Taa
                }
            }
            UpscaleMethod::Fsr if !self.availability.fsr => UpscaleMethod::Taa,
            other => other,
        }
    }

    /// Sub-pixel projection offset for this frame, in [-0.5, 0.5), and
    /// advance the phase. Halton(2,3), the sequence temporal upscalers
    /// converge well under.
    pub fn next_jitter(&mut self) -> [f32; 2] {
        if self.effective_method() == UpscaleMethod::None {
            return [0.0, 0.0];
        }
        let phase = self.jitter_index % JITTER_PHASES + 1;
        self.jitter_index = self.jitter_index.wrapping_add(1);
        [halton(phase, 2) - 0.5, halton(phase, 3) - 0.5]
    }

    /// Flag the next frame as a history cut (scene load, teleport).
    pub fn request_reset(&mut self) {
        self.reset = true;
        self.jitter_index = 0;
    }

    /// Consume the pending reset flag.
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset)
    }

    pub fn load_settings(&self, value: &serde_json::Value) {
        if let Some(section) = value.get("Upscaling") {
            match serde_json::from_value::<UpscalingSettings>(section.clone()) {
                Ok(mut settings) => {
                    settings.sanitize();
                    *self
                        .settings
                        .lock()
                        .expect("upscaling settings lock poisoned") = settings;
                }
                Err(err) => log::warn!("ignoring malformed Upscaling settings: {err}"),
            }
        }
    }

    pub fn save_settings(&self, value: &mut serde_json::Value) {
        let settings = self
            .settings
            .lock()
            .expect("upscaling settings lock poisoned")
            .clone();
        if let (serde_json::Value::Object(doc), Ok(section)) =
            (value, serde_json::to_value(settings))
        {
            doc.insert("Upscaling".to_owned(), section);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halton_is_low_discrepancy_in_unit_interval() {
        for i in 1..=64 {
            let h2 = halton(i, 2);
            let h3 = halton(i, 3);
            assert!((0.0..1.0).contains(&h2));
            assert!((0.0..1.0).contains(&h3));
        }
        assert_eq!(halton(1, 2), 0.5);
        assert_eq!(halton(2, 2), 0.25);
        assert_eq!(halton(3, 2), 0.75);
    }

    #[test]
    fn jitter_sequence_repeats_after_reset() {
        let mut up = Upscaling::new(UpscalerAvailability::default());
        let first: Vec<_> = (0..4).map(|_| up.next_jitter()).collect();
        up.request_reset();
        let second: Vec<_> = (0..4).map(|_| up.next_jitter()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn no_jitter_when_upscaling_disabled() {
        let up = Upscaling::new(UpscalerAvailability::default());
        up.settings.lock().unwrap().method = UpscaleMethod::None;
        let mut up = up;
        assert_eq!(up.next_jitter(), [0.0, 0.0]);
    }

    #[test]
    fn unavailable_backends_fall_back() {
        let up = Upscaling::new(UpscalerAvailability::default());
        up.settings.lock().unwrap().method = UpscaleMethod::Dlss;
        assert_eq!(up.effective_method(), UpscaleMethod::Taa);

        let up = Upscaling::new(UpscalerAvailability {
            fsr: true,
            dlss: false,
        });
        up.settings.lock().unwrap().method = UpscaleMethod::Dlss;
        assert_eq!(up.effective_method(), UpscaleMethod::Fsr);

        let up = Upscaling::new(UpscalerAvailability {
            fsr: true,
            dlss: true,
        });
        up.settings.lock().unwrap().method = UpscaleMethod::Dlss;
        assert_eq!(up.effective_method(), UpscaleMethod::Dlss);
    }

    #[test]
    fn reset_flag_is_consumed_once() {
        let mut up = Upscaling::new(UpscalerAvailability::default());
        assert!(up.take_reset());
        assert!(!up.take_reset());
        up.request_reset();
        assert!(up.take_reset());
    }

    #[test]
    fn settings_document_round_trip() {
        let up = Upscaling::new(UpscalerAvailability::default());
        up.settings.lock().unwrap().method = UpscaleMethod::Fsr;
        up.settings.lock().unwrap().sharpness = 0.8;

        let mut doc = serde_json::json!({});
        up.save_settings(&mut doc);

        let other = Upscaling::new(UpscalerAvailability::default());
        other.load_settings(&doc);
        assert_eq!(*other.settings.lock().unwrap(), *up.settings.lock().unwrap());
    }
}
