//! The contract every render feature implements, and the set that owns them.
//!
//! Features never reach for global state; the host threads one
//! [`RenderContext`] through the calls that need the GPU.

use serde_json::Value;

use crate::context::RenderContext;

pub trait Feature {
    /// Human-readable name for the settings panel.
    fn name(&self) -> &'static str;
    /// Key of this feature's object in the settings document.
    fn short_name(&self) -> &'static str;

    /// Read this feature's settings out of the whole document. Missing or
    /// malformed fields fall back to defaults.
    fn load_settings(&mut self, value: &Value);
    /// Write this feature's settings into the whole document.
    fn save_settings(&self, value: &mut Value);
    fn restore_default_settings(&mut self);

    /// Immediate-mode panel over the live settings.
    fn draw_settings(&mut self, ui: &mut egui::Ui);

    /// (Re)allocate GPU state for the current output size. Must be
    /// idempotent for unchanged parameters.
    fn setup_resources(&mut self, ctx: &RenderContext);

    /// Drop per-frame history (scene load, resolution change).
    fn reset(&mut self);
}

/// Owns every registered feature and fans host events out to them.
#[derive(Default)]
pub struct FeatureSet {
    features: Vec<Box<dyn Feature>>,
}

impl FeatureSet {
    pub fn register(&mut self, feature: Box<dyn Feature>) {
        log::debug!("registered feature {}", feature.short_name());
        self.features.push(feature);
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Feature> {
        self.features.iter().map(Box::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Feature>> {
        self.features.iter_mut()
    }

    pub fn get_mut(&mut self, short_name: &str) -> Option<&mut Box<dyn Feature>> {
        self.features
            .iter_mut()
            .find(|f| f.short_name() == short_name)
    }

    /// Distribute a loaded settings document to every feature.
    pub fn load_document(&mut self, doc: &Value) {
        for feature in &mut self.features {
            feature.load_settings(doc);
        }
    }

    /// Collect every feature's settings into one document.
    pub fn save_document(&self) -> Value {
        let mut doc = Value::Object(Default::default());
        for feature in &self.features {
            feature.save_settings(&mut doc);
        }
        doc
    }

    pub fn setup_resources(&mut self, ctx: &RenderContext) {
        for feature in &mut self.features {
            feature.setup_resources(ctx);
        }
    }

    pub fn reset(&mut self) {
        for feature in &mut self.features {
            feature.reset();
        }
    }

    /// One collapsible section per feature.
    pub fn draw_settings(&mut self, ui: &mut egui::Ui) {
        for feature in &mut self.features {
            egui::CollapsingHeader::new(feature.name())
                .default_open(false)
                .show(ui, |ui| feature.draw_settings(ui));
        }
    }
}
