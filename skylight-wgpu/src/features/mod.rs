//! Render features besides the GI pipeline.

pub mod volumetric;
pub mod water;
pub mod wetness;
