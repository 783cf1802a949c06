//! Volumetric lighting toggle and quality level.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RenderContext;
use crate::feature::Feature;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Settings {
    #[serde(rename = "EnabledVL")]
    pub enabled: bool,
    /// -1 = off, 0..2 = low/mid/high.
    pub quality: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            quality: 1,
        }
    }
}

impl Settings {
    pub fn sanitize(&mut self) {
        self.quality = self.quality.clamp(-1, 2);
    }
}

#[derive(Default)]
pub struct VolumetricLighting {
    pub settings: Settings,
}

impl VolumetricLighting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.settings.enabled && self.settings.quality >= 0
    }
}

impl Feature for VolumetricLighting {
    fn name(&self) -> &'static str {
        "Volumetric Lighting"
    }

    fn short_name(&self) -> &'static str {
        "VolumetricLighting"
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
        ui.checkbox(&mut self.settings.enabled, "Enabled");
        ui.add(
            egui::Slider::new(&mut self.settings.quality, -1..=2)
                .text("Quality (-1 off, 0..2 low to high)"),
        );
    }

    fn setup_resources(&mut self, _ctx: &RenderContext) {}

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_round_trips_and_clamps() {
        let mut vl = VolumetricLighting::new();
        let doc = serde_json::json!({
            "VolumetricLighting": { "EnabledVL": true, "Quality": 7 }
        });
        vl.load_settings(&doc);
        assert_eq!(vl.settings.quality, 2);
        assert!(vl.is_active());

        vl.settings.quality = -1;
        assert!(!vl.is_active());
    }
}
