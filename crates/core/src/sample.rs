use crate::models::{BitDepth, Channels, SampleData};
use std::fmt;

/// Signed 24-bit PCM sample stored in the low 24 bits of an `i32`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct I24(i32);

impl I24 {
    pub const MIN: I24 = I24(-8_388_608);
    pub const MAX: I24 = I24(8_388_607);

    /// Create a sample, returning `None` if the value does not fit in 24 bits
    pub const fn new(value: i32) -> Option<Self> {
        if value < Self::MIN.0 || value > Self::MAX.0 {
            None
        } else {
            Some(I24(value))
        }
    }

    /// Create a sample from the low 24 bits of `value`, sign-extending bit 23
    pub const fn wrapping_new(value: i32) -> Self {
        I24((value << 8) >> 8)
    }

    /// Get the sample as a plain integer
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<I24> for i32 {
    fn from(sample: I24) -> Self {
        sample.0
    }
}

impl fmt::Display for I24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw PCM sample of one of the supported bit depths
///
/// Values stay in their native integer (or float) domain; nothing here
/// normalizes to [-1.0, 1.0]. Conversions from `f64` truncate toward zero and
/// saturate at the type's range, the same way an `as` cast does.
pub trait PcmSample:
    Copy + Default + PartialEq + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    /// Bit depth this sample type is stored at
    const BIT_DEPTH: BitDepth;

    /// Digital silence
    const ZERO: Self;

    /// Widen to `f64` without loss
    fn to_f64(self) -> f64;

    /// Narrow from `f64`, truncating toward zero and saturating
    fn from_f64(value: f64) -> Self;

    /// Native-width addition; integers wrap on overflow
    fn wrapping_add(self, other: Self) -> Self;

    /// Divide by a non-zero channel count, truncating toward zero
    fn div_channels(self, channels: usize) -> Self;

    /// Wrap typed channels into the tagged buffer representation
    fn into_data(channels: Channels<Self>) -> SampleData;

    /// Borrow typed channels out of the tagged representation
    fn from_data(data: &SampleData) -> Option<&Channels<Self>>;

    /// Mutably borrow typed channels out of the tagged representation
    fn from_data_mut(data: &mut SampleData) -> Option<&mut Channels<Self>>;
}

macro_rules! impl_data_plumbing {
    ($variant:ident) => {
        fn into_data(channels: Channels<Self>) -> SampleData {
            SampleData::$variant(channels)
        }

        fn from_data(data: &SampleData) -> Option<&Channels<Self>> {
            match data {
                SampleData::$variant(channels) => Some(channels),
                _ => None,
            }
        }

        fn from_data_mut(data: &mut SampleData) -> Option<&mut Channels<Self>> {
            match data {
                SampleData::$variant(channels) => Some(channels),
                _ => None,
            }
        }
    };
}

macro_rules! impl_int_sample {
    ($t:ty, $depth:expr, $variant:ident) => {
        impl PcmSample for $t {
            const BIT_DEPTH: BitDepth = $depth;
            const ZERO: Self = 0;

            #[inline]
            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $t
            }

            #[inline]
            fn wrapping_add(self, other: Self) -> Self {
                <$t>::wrapping_add(self, other)
            }

            #[inline]
            fn div_channels(self, channels: usize) -> Self {
                // |self / n| <= |self|, so narrowing back cannot overflow
                (i64::from(self) / channels as i64) as $t
            }

            impl_data_plumbing!($variant);
        }
    };
}

impl_int_sample!(i8, BitDepth::Eight, Int8);
impl_int_sample!(i16, BitDepth::Sixteen, Int16);

impl PcmSample for I24 {
    const BIT_DEPTH: BitDepth = BitDepth::TwentyFour;
    const ZERO: Self = I24(0);

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self.0)
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        I24((value as i32).clamp(Self::MIN.0, Self::MAX.0))
    }

    #[inline]
    fn wrapping_add(self, other: Self) -> Self {
        I24::wrapping_new(self.0.wrapping_add(other.0))
    }

    #[inline]
    fn div_channels(self, channels: usize) -> Self {
        I24((i64::from(self.0) / channels as i64) as i32)
    }

    impl_data_plumbing!(Int24);
}

impl PcmSample for f32 {
    const BIT_DEPTH: BitDepth = BitDepth::ThirtyTwo;
    const ZERO: Self = 0.0;

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn wrapping_add(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn div_channels(self, channels: usize) -> Self {
        self / channels as f32
    }

    impl_data_plumbing!(Float32);
}
