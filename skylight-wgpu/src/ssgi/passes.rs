//! Compute pipeline construction and stage sequencing.
//!
//! Each frame is an ordered list of [`Stage`] descriptors executed by one
//! loop; adding a pass means adding a descriptor, not another copy of the
//! encoder boilerplate.

use skylight_gpu_shared::shaders;

use crate::error::FeatureError;
use crate::ssgi::resources::SsgiResources;
use crate::ssgi::SsgiFrameInputs;

const WORKGROUP: u32 = 8;

pub fn dispatch_dim(pixels: u32) -> u32 {
    pixels.div_ceil(WORKGROUP)
}

fn uniform(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn tex_float(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn tex_depth(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn tex_uint(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Uint,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn storage(binding: u32, format: wgpu::TextureFormat) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

fn tex(binding: u32, view: &wgpu::TextureView) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::TextureView(view),
    }
}

fn samp(binding: u32, sampler: &wgpu::Sampler) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::Sampler(sampler),
    }
}

fn sampler(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

struct Program {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

fn compile_program(
    device: &wgpu::Device,
    stage: &'static str,
    source: &str,
    entries: &[wgpu::BindGroupLayoutEntry],
) -> Result<Program, FeatureError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(stage),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(stage),
        entries,
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(stage),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(stage),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    });

    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(FeatureError::ShaderValidation {
            stage,
            message: err.to_string(),
        });
    }
    Ok(Program { pipeline, layout })
}

/// The five compiled GI kernels and their bind group layouts.
pub struct SsgiPrograms {
    prefilter: Program,
    radiance_disocc: Program,
    gi: Program,
    blur: Program,
    upsample: Program,
}

impl SsgiPrograms {
    pub fn compile(device: &wgpu::Device) -> Result<Self, FeatureError> {
        use wgpu::TextureFormat::{R32Float, R32Uint, Rg32Float, Rgba16Float};

        let prefilter = compile_program(
            device,
            "SSGI Prefilter Depths",
            shaders::SSGI_PREFILTER_DEPTHS,
            &[
                uniform(0),
                tex_depth(1),
                storage(2, R32Float),
                storage(3, R32Float),
                storage(4, R32Float),
                storage(5, R32Float),
                storage(6, R32Float),
            ],
        )?;

        let radiance_disocc = compile_program(
            device,
            "SSGI Radiance Disocclusion",
            shaders::SSGI_RADIANCE_DISOCC,
            &[
                uniform(0),
                tex_float(1),
                tex_float(2),
                tex_float(3),
                tex_float(4),
                tex_uint(5),
                storage(6, Rgba16Float),
                storage(7, R32Uint),
                sampler(8),
            ],
        )?;

        let gi = compile_program(
            device,
            "SSGI GI Estimation",
            shaders::SSGI_GI,
            &[
                uniform(0),
                tex_float(1),
                tex_float(2),
                tex_float(3),
                tex_float(4),
                tex_uint(5),
                tex_float(6),
                tex_float(7),
                tex_float(8),
                storage(9, R32Float),
                storage(10, R32Float),
                storage(11, Rg32Float),
                sampler(12),
            ],
        )?;

        let blur = compile_program(
            device,
            "SSGI Blur",
            shaders::SSGI_BLUR,
            &[
                uniform(0),
                tex_float(1),
                tex_float(2),
                tex_float(3),
                tex_float(4),
                tex_uint(5),
                storage(6, R32Float),
                storage(7, R32Float),
                storage(8, Rg32Float),
            ],
        )?;

        let upsample = compile_program(
            device,
            "SSGI Upsample",
            shaders::SSGI_UPSAMPLE,
            &[
                uniform(0),
                tex_depth(1),
                tex_float(2),
                tex_float(3),
                tex_float(4),
                tex_float(5),
                tex_float(6),
                storage(7, R32Float),
                storage(8, R32Float),
                storage(9, Rg32Float),
                storage(10, Rgba16Float),
            ],
        )?;

        Ok(Self {
            prefilter,
            radiance_disocc,
            gi,
            blur,
            upsample,
        })
    }
}

/// One recorded dispatch.
pub struct Stage<'a> {
    pub label: &'static str,
    pub pipeline: &'a wgpu::ComputePipeline,
    pub bind_group: wgpu::BindGroup,
    pub workgroups: [u32; 2],
}

/// Assemble this frame's stage list in execution order.
pub fn build_stages<'a>(
    device: &wgpu::Device,
    programs: &'a SsgiPrograms,
    res: &SsgiResources,
    inputs: &SsgiFrameInputs<'_>,
    blur_enabled: bool,
) -> Vec<Stage<'a>> {
    let [ww, wh] = res.working();
    let [fw, fh] = res.screen();
    // The prefilter covers four mip0 texels per thread.
    let [mw, mh] = [ww.div_ceil(2), wh.div_ceil(2)];

    let uniform_res = res.uniform_buffer.as_entire_binding();
    let bind = |layout: &wgpu::BindGroupLayout,
                label: &str,
                entries: &[wgpu::BindGroupEntry<'_>]| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries,
        })
    };

    let mut stages = Vec::with_capacity(5);

    stages.push(Stage {
        label: "SSGI Prefilter Depths",
        pipeline: &programs.prefilter.pipeline,
        bind_group: bind(
            &programs.prefilter.layout,
            "SSGI Prefilter Depths",
            &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_res.clone(),
                },
                tex(1, inputs.depth),
                tex(2, &res.working_depth.mip_views[0]),
                tex(3, &res.working_depth.mip_views[1]),
                tex(4, &res.working_depth.mip_views[2]),
                tex(5, &res.working_depth.mip_views[3]),
                tex(6, &res.working_depth.mip_views[4]),
            ],
        ),
        workgroups: [dispatch_dim(mw), dispatch_dim(mh)],
    });

    stages.push(Stage {
        label: "SSGI Radiance Disocclusion",
        pipeline: &programs.radiance_disocc.pipeline,
        bind_group: bind(
            &programs.radiance_disocc.layout,
            "SSGI Radiance Disocclusion",
            &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_res.clone(),
                },
                tex(1, &res.working_depth.full_view),
                tex(2, inputs.prev_ambient),
                tex(3, inputs.normals),
                tex(4, &res.prev_geo.view),
                tex(5, &res.accum.read().view),
                tex(6, &res.radiance.view),
                tex(7, &res.accum.write().view),
                samp(8, &res.samp_linear),
            ],
        ),
        workgroups: [dispatch_dim(ww), dispatch_dim(wh)],
    });

    stages.push(Stage {
        label: "SSGI GI Estimation",
        pipeline: &programs.gi.pipeline,
        bind_group: bind(
            &programs.gi.layout,
            "SSGI GI Estimation",
            &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_res.clone(),
                },
                tex(1, &res.working_depth.full_view),
                tex(2, &res.radiance.view),
                tex(3, &res.noise_view),
                tex(4, inputs.normals),
                tex(5, &res.accum.write().view),
                tex(6, &res.out_ao.read().view),
                tex(7, &res.out_il_y.read().view),
                tex(8, &res.out_il_cocg.read().view),
                tex(9, &res.raw_ao.view),
                tex(10, &res.raw_il_y.view),
                tex(11, &res.raw_il_cocg.view),
                samp(12, &res.samp_linear),
            ],
        ),
        workgroups: [dispatch_dim(ww), dispatch_dim(wh)],
    });

    if blur_enabled {
        stages.push(Stage {
            label: "SSGI Blur",
            pipeline: &programs.blur.pipeline,
            bind_group: bind(
                &programs.blur.layout,
                "SSGI Blur",
                &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_res.clone(),
                    },
                    tex(1, &res.working_depth.full_view),
                    tex(2, &res.raw_ao.view),
                    tex(3, &res.raw_il_y.view),
                    tex(4, &res.raw_il_cocg.view),
                    tex(5, &res.accum.write().view),
                    tex(6, &res.blur_ao.view),
                    tex(7, &res.blur_il_y.view),
                    tex(8, &res.blur_il_cocg.view),
                ],
            ),
            workgroups: [dispatch_dim(ww), dispatch_dim(wh)],
        });
    }

    let (src_ao, src_il_y, src_il_cocg) = if blur_enabled {
        (&res.blur_ao, &res.blur_il_y, &res.blur_il_cocg)
    } else {
        (&res.raw_ao, &res.raw_il_y, &res.raw_il_cocg)
    };

    stages.push(Stage {
        label: "SSGI Upsample",
        pipeline: &programs.upsample.pipeline,
        bind_group: bind(
            &programs.upsample.layout,
            "SSGI Upsample",
            &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_res,
                },
                tex(1, inputs.depth),
                tex(2, inputs.normals),
                tex(3, &res.working_depth.full_view),
                tex(4, &src_ao.view),
                tex(5, &src_il_y.view),
                tex(6, &src_il_cocg.view),
                tex(7, &res.out_ao.write().view),
                tex(8, &res.out_il_y.write().view),
                tex(9, &res.out_il_cocg.write().view),
                tex(10, &res.prev_geo.view),
            ],
        ),
        workgroups: [dispatch_dim(fw), dispatch_dim(fh)],
    });

    stages
}

/// Record every stage into the frame's encoder, one labelled compute pass
/// per stage.
pub fn run_stages(encoder: &mut wgpu::CommandEncoder, stages: &[Stage<'_>]) {
    for stage in stages {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(stage.label),
            timestamp_writes: None,
        });
        pass.set_pipeline(stage.pipeline);
        pass.set_bind_group(0, &stage.bind_group, &[]);
        pass.dispatch_workgroups(stage.workgroups[0], stage.workgroups[1], 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_covers_every_pixel() {
        assert_eq!(dispatch_dim(1), 1);
        assert_eq!(dispatch_dim(8), 1);
        assert_eq!(dispatch_dim(9), 2);
        assert_eq!(dispatch_dim(960), 120);
        assert_eq!(dispatch_dim(1081), 136);
    }
}
