use crate::models::BitDepth;
use thiserror::Error;

/// Failures reported by buffer construction and the transforms
///
/// Every validation failure is detected before any sample is written, so a
/// returned error always means the buffers are unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    #[error("buffers have different channel counts ({primary} vs {other})")]
    ChannelCountMismatch { primary: usize, other: usize },

    #[error("buffers have different bit depths ({primary} vs {other})")]
    BitDepthMismatch { primary: BitDepth, other: BitDepth },

    #[error("source must be mono, found {channels} channels")]
    NotMono { channels: usize },

    #[error("buffer has no channels")]
    NoChannels,

    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),

    #[error("sample rate must be positive")]
    InvalidSampleRate,

    #[error("channel {channel} has {found} samples, expected {expected}")]
    RaggedChannels {
        channel: usize,
        expected: usize,
        found: usize,
    },

    #[error("buffer holds {found} samples, requested {expected}")]
    WrongSampleType { expected: BitDepth, found: BitDepth },

    #[error("invalid gain literal: {0:?}")]
    InvalidGainLiteral(String),

    #[error("failed to allocate {samples} samples")]
    Allocation { samples: usize },
}

pub type Result<T, E = AudioError> = std::result::Result<T, E>;
