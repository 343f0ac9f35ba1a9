pub mod dsp;
pub mod gain;

pub use dsp::*;
pub use gain::*;
