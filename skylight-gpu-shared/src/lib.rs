//! GPU-facing data for the Skylight render features.
//!
//! Everything here is shared between the CPU side (`skylight-wgpu`) and the
//! WGSL compute kernels: `#[repr(C)]` uniform structs whose layout mirrors the
//! shader-side declarations, and the embedded kernel sources themselves.

pub mod shaders;
pub mod uniforms;
