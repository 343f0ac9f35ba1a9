pub mod duck_settings;
pub mod error;
pub mod models;
pub mod sample;

pub use duck_settings::*;
pub use error::*;
pub use models::*;
pub use sample::*;
