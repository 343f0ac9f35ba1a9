/// Sample-wise buffer mixing
///
/// Both operations add at native width. Integer depths wrap on overflow
/// instead of clipping; float buffers use plain IEEE addition.
use overvoice_core::{AudioError, Channels, PcmSample, Result, SampleBuffer, SampleData};
use tracing::{debug, warn};

/// Add `other` into `primary`, channel by channel
///
/// Only the overlapping frames are touched; when `other` is shorter the tail
/// of `primary` keeps its original samples.
pub fn mix(primary: &mut SampleBuffer, other: &SampleBuffer) -> Result<()> {
    if primary.num_channels() != other.num_channels() {
        warn!(
            "Refusing to mix {} channels with {} channels",
            primary.num_channels(),
            other.num_channels()
        );
        return Err(AudioError::ChannelCountMismatch {
            primary: primary.num_channels(),
            other: other.num_channels(),
        });
    }

    debug!(
        "Mixing {} frames into {} frames ({} channels, {})",
        other.num_frames(),
        primary.num_frames(),
        primary.num_channels(),
        primary.bit_depth()
    );

    match (primary.data_mut(), other.data()) {
        (SampleData::Int8(dst), SampleData::Int8(src)) => mix_channels(dst, src),
        (SampleData::Int16(dst), SampleData::Int16(src)) => mix_channels(dst, src),
        (SampleData::Int24(dst), SampleData::Int24(src)) => mix_channels(dst, src),
        (SampleData::Float32(dst), SampleData::Float32(src)) => mix_channels(dst, src),
        (dst, src) => {
            warn!(
                "Refusing to mix {} samples with {} samples",
                dst.bit_depth(),
                src.bit_depth()
            );
            return Err(AudioError::BitDepthMismatch {
                primary: dst.bit_depth(),
                other: src.bit_depth(),
            });
        }
    }

    Ok(())
}

/// Add a mono source into every channel of `destination`
///
/// Each destination channel receives `source / num_channels`, truncated
/// toward zero for integer depths, so the mono signal is spread evenly.
pub fn blend_mono(destination: &mut SampleBuffer, mono: &SampleBuffer) -> Result<()> {
    if mono.num_channels() != 1 {
        warn!(
            "Refusing to blend a {}-channel source as mono",
            mono.num_channels()
        );
        return Err(AudioError::NotMono {
            channels: mono.num_channels(),
        });
    }

    debug!(
        "Blending {} mono frames into {} channels",
        mono.num_frames(),
        destination.num_channels()
    );

    match (destination.data_mut(), mono.data()) {
        (SampleData::Int8(dst), SampleData::Int8(src)) => blend_channels(dst, src),
        (SampleData::Int16(dst), SampleData::Int16(src)) => blend_channels(dst, src),
        (SampleData::Int24(dst), SampleData::Int24(src)) => blend_channels(dst, src),
        (SampleData::Float32(dst), SampleData::Float32(src)) => blend_channels(dst, src),
        (dst, src) => {
            warn!(
                "Refusing to blend {} mono source into {} buffer",
                src.bit_depth(),
                dst.bit_depth()
            );
            return Err(AudioError::BitDepthMismatch {
                primary: dst.bit_depth(),
                other: src.bit_depth(),
            });
        }
    }

    Ok(())
}

fn mix_channels<T: PcmSample>(dst: &mut Channels<T>, src: &Channels<T>) {
    for (out, input) in dst.iter_mut().zip(src.iter()) {
        for (o, &i) in out.iter_mut().zip(input) {
            *o = o.wrapping_add(i);
        }
    }
}

fn blend_channels<T: PcmSample>(dst: &mut Channels<T>, src: &Channels<T>) {
    let num_channels = dst.num_channels();
    let Some(source) = src.channel(0) else {
        return;
    };

    for out in dst.iter_mut() {
        for (o, &s) in out.iter_mut().zip(source) {
            *o = o.wrapping_add(s.div_channels(num_channels));
        }
    }
}
