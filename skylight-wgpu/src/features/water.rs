//! Water caustics.
//!
//! The caustics pattern is a static texture decoded once from disk; the host
//! binds the view in its water shading pass.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RenderContext;
use crate::error::FeatureError;
use crate::feature::Feature;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Settings {
    pub enable_water_caustics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_water_caustics: true,
        }
    }
}

pub struct WaterEffects {
    pub settings: Settings,
    caustics_path: PathBuf,
    caustics: Option<(wgpu::Texture, wgpu::TextureView)>,
}

impl WaterEffects {
    pub fn new(caustics_path: impl Into<PathBuf>) -> Self {
        Self {
            settings: Settings::default(),
            caustics_path: caustics_path.into(),
            caustics: None,
        }
    }

    pub fn caustics_view(&self) -> Option<&wgpu::TextureView> {
        if !self.settings.enable_water_caustics {
            return None;
        }
        self.caustics.as_ref().map(|(_, view)| view)
    }

    fn load_caustics(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
    ) -> Result<(wgpu::Texture, wgpu::TextureView), FeatureError> {
        let img = image::open(path)
            .map_err(|source| FeatureError::TextureDecode {
                path: path.to_owned(),
                source,
            })?
            .to_rgba8();
        let (width, height) = img.dimensions();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Water Caustics"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
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
            &img,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok((texture, view))
    }
}

impl Feature for WaterEffects {
    fn name(&self) -> &'static str {
        "Water Effects"
    }

    fn short_name(&self) -> &'static str {
        "WaterEffects"
    }

    fn load_settings(&mut self, value: &Value) {
        if let Some(section) = value.get(self.short_name()) {
            match serde_json::from_value(section.clone()) {
                Ok(settings) => self.settings = settings,
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
        ui.checkbox(&mut self.settings.enable_water_caustics, "Water Caustics");
    }

    fn setup_resources(&mut self, ctx: &RenderContext) {
        if self.caustics.is_some() {
            return;
        }
        match Self::load_caustics(&ctx.device, &ctx.queue, &self.caustics_path) {
            Ok(caustics) => self.caustics = Some(caustics),
            Err(err) => {
                log::error!("water caustics unavailable: {err}");
                self.settings.enable_water_caustics = false;
            }
        }
    }

    fn reset(&mut self) {}
}
