use crate::error::{AudioError, Result};
use crate::sample::{PcmSample, I24};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bit width of the samples in a buffer
///
/// 32-bit buffers hold IEEE floats; the narrower depths are signed integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    Eight,
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl BitDepth {
    /// Get the number of bits per sample
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
            BitDepth::ThirtyTwo => 32,
        }
    }

    /// Get the size in bytes per sample
    pub fn bytes_per_sample(&self) -> usize {
        self.bits() as usize / 8
    }

    /// Largest positive sample value, the 0 dB reference point
    pub fn full_scale(&self) -> f64 {
        match self {
            BitDepth::Eight => 127.0,
            BitDepth::Sixteen => 32767.0,
            BitDepth::TwentyFour => 8_388_607.0,
            BitDepth::ThirtyTwo => 1.0,
        }
    }

    /// Check if this is a floating-point depth
    pub fn is_float(&self) -> bool {
        matches!(self, BitDepth::ThirtyTwo)
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = AudioError;

    fn try_from(bits: u16) -> Result<Self> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            24 => Ok(BitDepth::TwentyFour),
            32 => Ok(BitDepth::ThirtyTwo),
            other => Err(AudioError::UnsupportedBitDepth(other)),
        }
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> Self {
        depth.bits()
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Header metadata handed over by the container decoder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSpec {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Bit width of each sample
    pub bit_depth: BitDepth,
}

impl BufferSpec {
    pub fn new(sample_rate: u32, channels: u16, bit_depth: BitDepth) -> Self {
        Self {
            sample_rate,
            channels,
            bit_depth,
        }
    }

    /// Size of one frame (one sample per channel) in bytes
    pub fn block_align(&self) -> usize {
        self.channels as usize * self.bit_depth.bytes_per_sample()
    }
}

/// Planar channels of equal length
///
/// Samples can be rewritten in place but channels cannot grow or shrink, so
/// every channel keeps the same length for the lifetime of the value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Channels<T> {
    data: Vec<Vec<T>>,
}

impl<T: PcmSample> Channels<T> {
    /// Take ownership of planar sample data, rejecting ragged input
    pub fn new(data: Vec<Vec<T>>) -> Result<Self> {
        if let Some(first) = data.first() {
            let expected = first.len();
            if let Some((channel, found)) = data
                .iter()
                .map(Vec::len)
                .enumerate()
                .find(|&(_, len)| len != expected)
            {
                return Err(AudioError::RaggedChannels {
                    channel,
                    expected,
                    found,
                });
            }
        }

        Ok(Self { data })
    }

    /// Allocate `channels` channels of `frames` zero samples
    pub fn silent(channels: usize, frames: usize) -> Result<Self> {
        let exhausted = || AudioError::Allocation {
            samples: channels.saturating_mul(frames),
        };

        let mut data = Vec::new();
        data.try_reserve_exact(channels).map_err(|_| exhausted())?;
        for _ in 0..channels {
            let mut channel = Vec::new();
            channel.try_reserve_exact(frames).map_err(|_| exhausted())?;
            channel.resize(frames, T::ZERO);
            data.push(channel);
        }

        Ok(Self { data })
    }

    pub fn num_channels(&self) -> usize {
        self.data.len()
    }

    /// Number of samples in each channel (0 when there are no channels)
    pub fn num_frames(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    pub fn channel(&self, index: usize) -> Option<&[T]> {
        self.data.get(index).map(Vec::as_slice)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [T]> {
        self.data.get_mut(index).map(Vec::as_mut_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[T]> {
        self.data.iter().map(Vec::as_slice)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut [T]> {
        self.data.iter_mut().map(Vec::as_mut_slice)
    }

    /// Sample at `frame` in `channel`
    pub fn get(&self, channel: usize, frame: usize) -> Option<T> {
        self.data.get(channel)?.get(frame).copied()
    }

    pub fn into_inner(self) -> Vec<Vec<T>> {
        self.data
    }
}

/// Sample storage, tagged by bit depth once at construction
#[derive(Clone, Debug, PartialEq)]
pub enum SampleData {
    Int8(Channels<i8>),
    Int16(Channels<i16>),
    Int24(Channels<I24>),
    Float32(Channels<f32>),
}

macro_rules! with_channels {
    ($data:expr, $channels:ident => $body:expr) => {
        match $data {
            SampleData::Int8($channels) => $body,
            SampleData::Int16($channels) => $body,
            SampleData::Int24($channels) => $body,
            SampleData::Float32($channels) => $body,
        }
    };
}

impl SampleData {
    pub fn bit_depth(&self) -> BitDepth {
        match self {
            SampleData::Int8(_) => BitDepth::Eight,
            SampleData::Int16(_) => BitDepth::Sixteen,
            SampleData::Int24(_) => BitDepth::TwentyFour,
            SampleData::Float32(_) => BitDepth::ThirtyTwo,
        }
    }

    pub fn num_channels(&self) -> usize {
        with_channels!(self, channels => channels.num_channels())
    }

    pub fn num_frames(&self) -> usize {
        with_channels!(self, channels => channels.num_frames())
    }
}

/// Decoded multichannel PCM audio
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    data: SampleData,
}

impl SampleBuffer {
    /// Create a buffer from already-tagged sample data
    pub fn new(sample_rate: u32, data: SampleData) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate);
        }
        Ok(Self { sample_rate, data })
    }

    /// Create a buffer from planar samples of any supported type
    pub fn from_channels<T: PcmSample>(sample_rate: u32, channels: Vec<Vec<T>>) -> Result<Self> {
        Self::new(sample_rate, T::into_data(Channels::new(channels)?))
    }

    /// Allocate a zero-filled buffer matching decoder header metadata
    pub fn silent(spec: BufferSpec, frames: usize) -> Result<Self> {
        let channels = spec.channels as usize;
        let data = match spec.bit_depth {
            BitDepth::Eight => SampleData::Int8(Channels::silent(channels, frames)?),
            BitDepth::Sixteen => SampleData::Int16(Channels::silent(channels, frames)?),
            BitDepth::TwentyFour => SampleData::Int24(Channels::silent(channels, frames)?),
            BitDepth::ThirtyTwo => SampleData::Float32(Channels::silent(channels, frames)?),
        };
        Self::new(spec.sample_rate, data)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.data.bit_depth()
    }

    pub fn num_channels(&self) -> usize {
        self.data.num_channels()
    }

    /// Number of samples per channel
    pub fn num_frames(&self) -> usize {
        self.data.num_frames()
    }

    /// Header metadata describing this buffer
    ///
    /// The header field is 16 bits wide; larger channel counts saturate at
    /// `u16::MAX`.
    pub fn spec(&self) -> BufferSpec {
        BufferSpec {
            sample_rate: self.sample_rate,
            channels: u16::try_from(self.num_channels()).unwrap_or(u16::MAX),
            bit_depth: self.bit_depth(),
        }
    }

    pub fn data(&self) -> &SampleData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut SampleData {
        &mut self.data
    }

    pub fn into_data(self) -> SampleData {
        self.data
    }

    /// Borrow the samples as type `T`, failing if the buffer holds another depth
    pub fn channels<T: PcmSample>(&self) -> Result<&Channels<T>> {
        let found = self.bit_depth();
        T::from_data(&self.data).ok_or(AudioError::WrongSampleType {
            expected: T::BIT_DEPTH,
            found,
        })
    }

    /// Mutably borrow the samples as type `T`
    pub fn channels_mut<T: PcmSample>(&mut self) -> Result<&mut Channels<T>> {
        let found = self.bit_depth();
        T::from_data_mut(&mut self.data).ok_or(AudioError::WrongSampleType {
            expected: T::BIT_DEPTH,
            found,
        })
    }
}
