//! Embedded WGSL compute kernel sources for the SSGI stage pipeline.
//! One kernel per stage, dispatched in this order every frame.

pub const SSGI_PREFILTER_DEPTHS: &str = include_str!("../shaders/ssgi_prefilter_depths.wgsl");
pub const SSGI_RADIANCE_DISOCC: &str = include_str!("../shaders/ssgi_radiance_disocc.wgsl");
pub const SSGI_GI: &str = include_str!("../shaders/ssgi_gi.wgsl");
pub const SSGI_BLUR: &str = include_str!("../shaders/ssgi_blur.wgsl");
pub const SSGI_UPSAMPLE: &str = include_str!("../shaders/ssgi_upsample.wgsl");
