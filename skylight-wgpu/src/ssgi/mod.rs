//! Screen-space global illumination.
//!
//! A five-stage compute pipeline: depth prefilter, radiance + disocclusion,
//! horizon-based GI estimation, edge-aware blur, upsample/composite. Outputs
//! are double-buffered; the host reads last frame's result while the current
//! frame is in flight.

pub mod constants;
pub mod passes;
pub mod resources;
pub mod settings;

use serde_json::Value;

use crate::context::RenderContext;
use crate::feature::Feature;

pub use constants::{build_constants, CameraState, EyeCamera};
pub use settings::{ResolutionMode, Settings};

use passes::SsgiPrograms;
use resources::SsgiResources;

/// Host-owned views consumed by one GI frame.
pub struct SsgiFrameInputs<'a> {
    /// Scene depth buffer (depth format).
    pub depth: &'a wgpu::TextureView,
    /// World-space normals.
    pub normals: &'a wgpu::TextureView,
    /// Last frame's lit ambient color, for radiance sampling and bounce.
    pub prev_ambient: &'a wgpu::TextureView,
    pub camera: CameraState,
}

pub struct ScreenSpaceGi {
    pub settings: Settings,
    programs: Option<SsgiPrograms>,
    resources: Option<SsgiResources>,
    recompile_flag: bool,
    frame_index: u32,
}

impl Default for ScreenSpaceGi {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenSpaceGi {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            programs: None,
            resources: None,
            recompile_flag: true,
            frame_index: 0,
        }
    }

    /// Compile the five kernels. No-op while a valid set exists; a failed
    /// compile logs and leaves the feature inert until the next
    /// [`Self::clear_shader_cache`].
    pub fn compile_compute_shaders(&mut self, device: &wgpu::Device) {
        if self.programs.is_some() && !self.recompile_flag {
            return;
        }
        self.recompile_flag = false;
        match SsgiPrograms::compile(device) {
            Ok(programs) => self.programs = Some(programs),
            Err(err) => {
                log::error!("SSGI shader compile failed: {err}");
                self.programs = None;
            }
        }
    }

    /// Drop compiled programs and force a rebuild on the next compile call.
    /// Textures are untouched.
    pub fn clear_shader_cache(&mut self) {
        self.programs = None;
        self.recompile_flag = true;
    }

    pub fn shaders_ok(&self) -> bool {
        self.programs.is_some()
    }

    /// Parity of the exposed output slot; advances by one per executed frame.
    pub fn output_read_index(&self) -> Option<usize> {
        self.resources.as_ref().map(|r| r.out_ao.read_index())
    }

    /// Allocation generation of the current targets.
    pub fn resource_generation(&self) -> Option<u64> {
        self.resources.as_ref().map(|r| r.generation())
    }

    /// Current target set, for hosts that capture or inspect intermediates.
    pub fn resources(&self) -> Option<&SsgiResources> {
        self.resources.as_ref()
    }

    /// Last frame's (AO, IL luma, IL chroma) views, full resolution.
    /// `None` while disabled or before resources exist.
    pub fn get_output_textures(
        &self,
    ) -> Option<(&wgpu::TextureView, &wgpu::TextureView, &wgpu::TextureView)> {
        if !self.settings.enabled || !self.shaders_ok() {
            return None;
        }
        let res = self.resources.as_ref()?;
        Some((
            &res.out_ao.read().view,
            &res.out_il_y.read().view,
            &res.out_il_cocg.read().view,
        ))
    }

    /// Record one GI frame. A no-op (indices untouched) while disabled,
    /// uncompiled, or unallocated.
    pub fn draw_ssgi(
        &mut self,
        ctx: &RenderContext,
        encoder: &mut wgpu::CommandEncoder,
        inputs: &SsgiFrameInputs<'_>,
    ) {
        if !self.settings.enabled {
            return;
        }
        let (Some(programs), Some(res)) = (self.programs.as_ref(), self.resources.as_mut()) else {
            return;
        };

        let consts = build_constants(
            &self.settings,
            &inputs.camera,
            self.frame_index,
            res.working(),
            res.screen(),
        );
        ctx.queue
            .write_buffer(&res.uniform_buffer, 0, bytemuck::bytes_of(&consts));

        let stages = passes::build_stages(
            &ctx.device,
            programs,
            res,
            inputs,
            self.settings.enable_blur,
        );
        passes::run_stages(encoder, &stages);

        res.flip();
        self.frame_index = self.frame_index.wrapping_add(1);
    }
}

impl Feature for ScreenSpaceGi {
    fn name(&self) -> &'static str {
        "Screen Space Global Illumination"
    }

    fn short_name(&self) -> &'static str {
        "ScreenSpaceGI"
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
        ui.checkbox(&mut s.enabled, "Enabled");
        ui.checkbox(&mut s.enable_gi, "Enable GI");

        egui::ComboBox::from_label("Resolution")
            .selected_text(format!("{:?}", s.resolution_mode))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut s.resolution_mode, ResolutionMode::Full, "Full");
                ui.selectable_value(&mut s.resolution_mode, ResolutionMode::Half, "Half");
                ui.selectable_value(&mut s.resolution_mode, ResolutionMode::Quarter, "Quarter");
            });

        ui.add(egui::Slider::new(&mut s.num_slices, 1..=10).text("Slices"));
        ui.add(egui::Slider::new(&mut s.num_steps, 1..=32).text("Steps Per Slice"));
        ui.add(egui::Slider::new(&mut s.ao_radius, 0.0..=2000.0).text("AO Radius"));
        ui.add(egui::Slider::new(&mut s.gi_radius, 0.0..=2000.0).text("GI Radius"));
        ui.add(egui::Slider::new(&mut s.thickness, 0.0..=500.0).text("Thickness"));
        ui.add(egui::Slider::new(&mut s.min_screen_radius, 0.0..=0.5).text("Min Screen Radius"));
        ui.horizontal(|ui| {
            ui.label("Depth Fade Range");
            ui.add(
                egui::DragValue::new(&mut s.depth_fade_range[0])
                    .speed(100.0)
                    .range(0.0..=1e7),
            );
            ui.add(
                egui::DragValue::new(&mut s.depth_fade_range[1])
                    .speed(100.0)
                    .range(0.0..=1e7),
            );
        });
        if s.depth_fade_range[1] <= s.depth_fade_range[0] {
            s.depth_fade_range[1] = s.depth_fade_range[0] + 1.0;
        }
        ui.add(
            egui::Slider::new(&mut s.gi_distance_compensation, 0.0..=9.0)
                .text("GI Distance Compensation"),
        );
        ui.add(egui::Slider::new(&mut s.ao_power, 0.0..=8.0).text("AO Power"));
        ui.add(egui::Slider::new(&mut s.gi_strength, 0.0..=10.0).text("GI Strength"));
        ui.add(egui::Slider::new(&mut s.gi_saturation, 0.0..=1.0).text("GI Saturation"));

        ui.checkbox(&mut s.enable_gi_bounce, "GI Bounce");
        ui.add(egui::Slider::new(&mut s.gi_bounce_fade, 0.0..=1.0).text("Bounce Fade"));

        ui.separator();
        ui.checkbox(&mut s.enable_temporal_denoiser, "Temporal Denoiser");
        ui.add(egui::Slider::new(&mut s.max_accum_frames, 1..=64).text("Max Frame Accumulation"));
        ui.add(egui::Slider::new(&mut s.depth_disocclusion, 0.0..=1.0).text("Depth Disocclusion"));
        ui.add(
            egui::Slider::new(&mut s.normal_disocclusion, 0.0..=1.0).text("Normal Disocclusion"),
        );
        ui.checkbox(&mut s.enable_blur, "Blur");
        ui.add(egui::Slider::new(&mut s.blur_radius, 0.0..=15.0).text("Blur Radius"));
        ui.add(
            egui::Slider::new(&mut s.distance_normalisation, 0.0..=10.0)
                .text("Blur Depth Sensitivity"),
        );
    }

    fn setup_resources(&mut self, ctx: &RenderContext) {
        self.compile_compute_shaders(&ctx.device);

        let mode = self.settings.resolution_mode;
        let screen = ctx.screen_size;
        let result = match self.resources.as_mut() {
            Some(res) => res.setup(&ctx.device, &ctx.queue, mode, screen).map(|_| ()),
            None => SsgiResources::new(&ctx.device, &ctx.queue, mode, screen)
                .map(|res| self.resources = Some(res)),
        };
        if let Err(err) = result {
            log::error!("SSGI target allocation failed, feature disabled: {err}");
            self.resources = None;
        }
    }

    fn reset(&mut self) {
        // Dropping the targets also drops their history; the next setup
        // reallocates them zero-initialized.
        self.resources = None;
        self.frame_index = 0;
    }
}
