/// Voice-driven ducking
///
/// Lowers the primary buffer while a voice buffer is loud. The voice is read
/// `attack` seconds ahead of the primary (after a silent pre-roll) so the
/// envelope is already at depth when speech starts. When the voice has been
/// quiet for the whole hold window, the primary samples covering that window
/// get an extra trim gain so the release does not start with an audible step.
use super::envelope::{Envelope, Transition};
use crate::gain::{gain_factor, scale, Decibel, GainSign};
use overvoice_core::{
    AudioError, Channels, DuckSettings, PcmSample, Result, SampleBuffer, SampleData,
};
use tracing::{debug, trace, warn};

/// Summary of a finished ducking pass
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DuckReport {
    /// Primary frames the envelope was applied to
    pub frames_processed: usize,
    /// Silence episodes that triggered a trim
    ///
    /// A hold window shorter than one sample (`silence_secs * rate < 1`)
    /// rewinds over nothing, so those steps are not counted.
    pub trims: usize,
    /// Deepest attenuation reached, in dB
    pub max_envelope_db: f64,
}

/// Applies a ducking envelope with fixed, validated settings
#[derive(Clone, Debug)]
pub struct DuckingEngine {
    settings: DuckSettings,
}

impl DuckingEngine {
    /// Create an engine, rejecting non-positive timings up front
    pub fn new(settings: DuckSettings) -> Result<Self> {
        if let Err(err) = settings.validate() {
            warn!("Rejecting duck settings: {}", err);
            return Err(err);
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &DuckSettings {
        &self.settings
    }

    /// Duck `primary` in place, driven by the loudness of `voice`
    ///
    /// Processing stops at whichever buffer runs out first; a partially
    /// ducked primary is a normal result. On error nothing is modified.
    pub fn duck(&self, primary: &mut SampleBuffer, voice: &SampleBuffer) -> Result<DuckReport> {
        if primary.num_channels() == 0 || voice.num_channels() == 0 {
            warn!(
                "Cannot duck with {} primary and {} voice channels",
                primary.num_channels(),
                voice.num_channels()
            );
            return Err(AudioError::NoChannels);
        }

        let sample_rate = primary.sample_rate();
        if voice.sample_rate() != sample_rate {
            warn!(
                "Voice sample rate {} differs from primary {}; timings follow the primary",
                voice.sample_rate(),
                sample_rate
            );
        }

        debug!(
            "Ducking {} frames ({} channels, {}) under {} voice frames ({} channels, {})",
            primary.num_frames(),
            primary.num_channels(),
            primary.bit_depth(),
            voice.num_frames(),
            voice.num_channels(),
            voice.bit_depth()
        );

        let pre_roll = self.settings.pre_roll_samples;
        let levels = match voice.data() {
            SampleData::Int8(channels) => voice_levels(channels, pre_roll)?,
            SampleData::Int16(channels) => voice_levels(channels, pre_roll)?,
            SampleData::Int24(channels) => voice_levels(channels, pre_roll)?,
            SampleData::Float32(channels) => voice_levels(channels, pre_roll)?,
        };

        let offset = (self.settings.attack_secs * f64::from(sample_rate)) as usize;
        let levels = levels.get(offset..).unwrap_or(&[]);
        let mut envelope = Envelope::new(&self.settings, sample_rate);
        let trim_factor = gain_factor(self.settings.trim_gain_db, GainSign::Boost);

        let report = match primary.data_mut() {
            SampleData::Int8(channels) => apply(channels, levels, &mut envelope, trim_factor),
            SampleData::Int16(channels) => apply(channels, levels, &mut envelope, trim_factor),
            SampleData::Int24(channels) => apply(channels, levels, &mut envelope, trim_factor),
            SampleData::Float32(channels) => apply(channels, levels, &mut envelope, trim_factor),
        };

        debug!(
            "Ducked {} frames, {} trims, max envelope {:.2} dB",
            report.frames_processed, report.trims, report.max_envelope_db
        );

        Ok(report)
    }
}

/// Duck `primary` with the given timings and levels, using default pre-roll and trim
pub fn duck(
    primary: &mut SampleBuffer,
    voice: &SampleBuffer,
    attack_secs: f64,
    release_secs: f64,
    silence_secs: f64,
    threshold_db: f64,
    ratio_db: f64,
) -> Result<DuckReport> {
    let settings =
        DuckSettings::new(attack_secs, release_secs, silence_secs, threshold_db, ratio_db);
    DuckingEngine::new(settings)?.duck(primary, voice)
}

/// Per-frame voice level, preceded by `pre_roll` frames of silence
///
/// The level of a frame is the largest sample across channels (never below
/// zero), divided by the channel count, measured against full scale.
fn voice_levels<T: PcmSample>(voice: &Channels<T>, pre_roll: usize) -> Result<Vec<f64>> {
    let frames = voice.num_frames();
    let total = pre_roll.saturating_add(frames);

    let mut levels = Vec::new();
    levels
        .try_reserve_exact(total)
        .map_err(|_| AudioError::Allocation { samples: total })?;
    levels.resize(pre_roll, Decibel::from_full_scale(T::ZERO).value());

    let num_channels = voice.num_channels();
    for frame in 0..frames {
        let peak = voice
            .iter()
            .map(|channel| channel[frame])
            .fold(T::ZERO, |peak, sample| if sample > peak { sample } else { peak });
        levels.push(Decibel::from_full_scale(peak.div_channels(num_channels)).value());
    }

    Ok(levels)
}

fn apply<T: PcmSample>(
    primary: &mut Channels<T>,
    levels: &[f64],
    envelope: &mut Envelope,
    trim_factor: f64,
) -> DuckReport {
    let frames = primary.num_frames().min(levels.len());
    let hold = usize::try_from(envelope.hold_samples()).unwrap_or(usize::MAX);
    let mut report = DuckReport {
        frames_processed: frames,
        ..Default::default()
    };

    for (frame, &peak_db) in levels.iter().take(frames).enumerate() {
        if envelope.advance(peak_db) == Transition::Trim {
            // Rewind over the hold window and trim it; the cursors end up
            // back at `frame`, so only the samples change
            let start = frame.saturating_sub(hold);
            if start < frame {
                trace!("Trimming frames {}..{}", start, frame);
                for channel in primary.iter_mut() {
                    for sample in &mut channel[start..frame] {
                        *sample = scale(*sample, trim_factor);
                    }
                }
                report.trims += 1;
            }
        }

        let level = envelope.level();
        report.max_envelope_db = report.max_envelope_db.max(level);

        let factor = gain_factor(level, GainSign::Cut);
        for channel in primary.iter_mut() {
            channel[frame] = scale(channel[frame], factor);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer<T: PcmSample>(sample_rate: u32, channels: Vec<Vec<T>>) -> SampleBuffer {
        SampleBuffer::from_channels(sample_rate, channels).unwrap()
    }

    fn settings(attack: f64, release: f64, silence: f64, ratio: f64) -> DuckSettings {
        DuckSettings {
            pre_roll_samples: 0,
            ..DuckSettings::new(attack, release, silence, -20.0, ratio)
        }
    }

    #[test]
    fn test_silent_voice_leaves_primary_unchanged() {
        let samples: Vec<i16> = (0..500).map(|i| (i * 37 % 2000 - 1000) as i16).collect();
        let mut primary = buffer(100, vec![samples.clone(), samples]);
        let before = primary.clone();
        let voice = buffer(100, vec![vec![0i16; 2000]]);

        let engine = DuckingEngine::new(settings(1.0, 1.0, 1.0, 20.0)).unwrap();
        let report = engine.duck(&mut primary, &voice).unwrap();

        assert_eq!(primary, before);
        assert_eq!(report.frames_processed, 500);
        assert_eq!(report.max_envelope_db, 0.0);
        assert_eq!(report.trims, 0);
    }

    #[test]
    fn test_attack_ramp_on_primary() {
        // attack 1 s at 100 Hz: voice is read 100 frames ahead, 0.2 dB per frame
        let mut primary = buffer(100, vec![vec![10000i16; 100]]);
        let mut voice = vec![0i16; 100];
        voice.extend(std::iter::repeat(32767i16).take(100));
        let voice = buffer(100, vec![voice]);

        let engine = DuckingEngine::new(settings(1.0, 1.0, 1.0, 20.0)).unwrap();
        let report = engine.duck(&mut primary, &voice).unwrap();

        let channel = primary.channels::<i16>().unwrap().channel(0).unwrap();
        for (frame, &sample) in channel.iter().enumerate() {
            let envelope = (0.2 * (frame + 1) as f64).min(20.0);
            let expected = 10000.0 * gain_factor(envelope, GainSign::Cut);
            assert!(
                (f64::from(sample) - expected).abs() <= 1.0,
                "frame {frame}: {sample} vs {expected}"
            );
        }
        assert!((report.max_envelope_db - 20.0).abs() < 1e-9);
        // 10 dB after 50 frames is a factor of ten under the power-ratio convention
        assert!((channel[49] - 1000).abs() <= 1);
    }

    #[test]
    fn test_pre_roll_delays_voice() {
        let mut primary = buffer(100, vec![vec![10000i16; 150]]);
        let voice = buffer(100, vec![vec![32767i16; 300]]);

        let mut config = settings(1.0, 1.0, 1.0, 20.0);
        config.pre_roll_samples = 200;
        let engine = DuckingEngine::new(config).unwrap();
        engine.duck(&mut primary, &voice).unwrap();

        // Reading starts 100 frames into a 200 frame pre-roll
        let channel = primary.channels::<i16>().unwrap().channel(0).unwrap();
        assert!(channel[..100].iter().all(|&s| s == 10000));
        assert!(channel[100] < 10000);
        assert!(channel[149] < channel[100]);
    }

    #[test]
    fn test_trim_after_confirmed_silence() {
        // attack 0.5 s, hold 0.5 s at 100 Hz: offset 50, hold window 50 frames
        let mut primary = buffer(100, vec![vec![10000i16; 200]]);
        let mut voice = vec![0i16; 50];
        voice.extend(std::iter::repeat(32767i16).take(60));
        voice.extend(std::iter::repeat(0i16).take(100));
        let voice = buffer(100, vec![voice]);

        let engine = DuckingEngine::new(settings(0.5, 1.0, 0.5, 10.0)).unwrap();
        let report = engine.duck(&mut primary, &voice).unwrap();

        assert_eq!(report.trims, 1);
        assert_eq!(report.frames_processed, 160);

        let channel = primary.channels::<i16>().unwrap().channel(0).unwrap();
        // Full depth just before the hold window
        assert!((channel[59] - 1000).abs() <= 1);
        // Hold window: full depth, then trimmed by a further -15 dB
        for &sample in &channel[60..110] {
            assert_eq!(sample, 31);
        }
        // Release starts one step below full depth
        let expected = 10000.0 * gain_factor(9.9, GainSign::Cut);
        assert!((f64::from(channel[110]) - expected).abs() <= 1.0);
        assert!(channel[111] > channel[110]);
        // Past the end of the voice the primary is untouched
        assert!(channel[160..].iter().all(|&s| s == 10000));
    }

    #[test]
    fn test_one_envelope_for_all_channels() {
        let mut primary = buffer(100, vec![vec![0.5f32; 40]; 3]);
        // Only the second voice channel is loud; the peak is shared by all
        let voice = buffer(100, vec![vec![0i8; 200], vec![127i8; 200]]);

        let engine = DuckingEngine::new(settings(1.0, 1.0, 1.0, 20.0)).unwrap();
        engine.duck(&mut primary, &voice).unwrap();

        let channels = primary.channels::<f32>().unwrap();
        assert!(channels.channel(0).unwrap()[39] < 0.5);
        for frame in 0..40 {
            let first = channels.get(0, frame);
            assert_eq!(channels.get(1, frame), first);
            assert_eq!(channels.get(2, frame), first);
        }
    }

    #[test]
    fn test_negative_voice_is_silent() {
        let mut primary = buffer(100, vec![vec![1000i16; 50]]);
        let before = primary.clone();
        let voice = buffer(100, vec![vec![-30000i16; 300]]);

        duck(&mut primary, &voice, 1.0, 1.0, 1.0, -20.0, 20.0).unwrap();

        assert_eq!(primary, before);
    }

    #[test]
    fn test_rejects_zero_attack() {
        let mut primary = buffer(100, vec![vec![1234i16; 50]]);
        let before = primary.clone();
        let voice = buffer(100, vec![vec![32767i16; 50]]);

        let err = duck(&mut primary, &voice, 0.0, 1.0, 1.0, -20.0, 15.0).unwrap_err();

        assert_eq!(
            err,
            AudioError::InvalidParameter {
                name: "attack",
                value: 0.0,
            }
        );
        assert_eq!(primary, before);
    }

    #[test]
    fn test_rejects_empty_voice() {
        let mut primary = buffer(100, vec![vec![1234i16; 50]]);
        let before = primary.clone();
        let voice = buffer::<i16>(100, Vec::new());

        let err = duck(&mut primary, &voice, 1.0, 1.0, 1.0, -20.0, 15.0).unwrap_err();

        assert_eq!(err, AudioError::NoChannels);
        assert_eq!(primary, before);
    }

    #[test]
    fn test_rejects_primary_without_channels() {
        let mut primary = buffer::<i16>(100, Vec::new());
        let before = primary.clone();
        let voice = buffer(100, vec![vec![32767i16; 50]]);

        let err = duck(&mut primary, &voice, 1.0, 1.0, 1.0, -20.0, 15.0).unwrap_err();

        assert_eq!(err, AudioError::NoChannels);
        assert_eq!(primary, before);
    }

    #[test]
    fn test_allocation_failure_leaves_primary_unchanged() {
        let mut primary = buffer(100, vec![vec![1234i16; 50]; 2]);
        let before = primary.clone();
        let voice = buffer(100, vec![vec![32767i16; 50]]);

        let mut config = settings(1.0, 1.0, 1.0, 20.0);
        config.pre_roll_samples = usize::MAX;
        let engine = DuckingEngine::new(config).unwrap();

        let err = engine.duck(&mut primary, &voice).unwrap_err();

        assert_eq!(err, AudioError::Allocation { samples: usize::MAX });
        assert_eq!(primary, before);
    }

    #[test]
    fn test_empty_hold_window_is_not_a_trim() {
        // 0.005 s at 100 Hz truncates to a zero-sample hold window
        let mut primary = buffer(100, vec![vec![1234i16; 50]]);
        let before = primary.clone();
        let voice = buffer(100, vec![vec![0i16; 200]]);

        let engine = DuckingEngine::new(settings(1.0, 1.0, 0.005, 20.0)).unwrap();
        let report = engine.duck(&mut primary, &voice).unwrap();

        assert_eq!(report.frames_processed, 50);
        assert_eq!(report.trims, 0);
        assert_eq!(primary, before);
    }

    #[test]
    fn test_offset_past_voice_end_is_noop() {
        let mut primary = buffer(100, vec![vec![1234i16; 50]]);
        let before = primary.clone();
        let voice = buffer(100, vec![vec![32767i16; 20]]);

        let report = duck(&mut primary, &voice, 1.0, 1.0, 1.0, -20.0, 15.0).unwrap();

        assert_eq!(report.frames_processed, 0);
        assert_eq!(primary, before);
    }
}
