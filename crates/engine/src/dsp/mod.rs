/// Buffer transforms
///
/// - Mixer: sample-wise mixing and mono blending
/// - Envelope: attack/hold/release state for ducking
/// - Ducking: voice-driven attenuation of a primary buffer
pub mod ducking;
pub mod envelope;
pub mod mixer;

pub use ducking::{duck, DuckReport, DuckingEngine};
pub use envelope::{Envelope, Transition};
pub use mixer::{blend_mono, mix};
