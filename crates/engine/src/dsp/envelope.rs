/// Ducking envelope state machine
///
/// Tracks the attenuation level (dB, kept within `[0, ratio]`) and the
/// number of quiet samples seen since the voice was last loud.
use overvoice_core::DuckSettings;

/// What a single `advance` step did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Voice above threshold: hold counter reset, envelope ramps up
    Attack,
    /// Voice quiet but within the hold window: envelope keeps ramping up
    Hold,
    /// Hold window just expired: rewind and trim, then ramp down
    Trim,
    /// Confirmed silence: envelope ramps down
    Release,
}

#[derive(Clone, Debug)]
pub struct Envelope {
    ratio_db: f64,
    threshold_db: f64,
    attack_step: f64,
    release_step: f64,
    hold_samples: u64,
    level: f64,
    silence_counter: u64,
}

impl Envelope {
    /// Create an envelope at rest for audio at `sample_rate`
    pub fn new(settings: &DuckSettings, sample_rate: u32) -> Self {
        let rate = f64::from(sample_rate);
        Self {
            ratio_db: settings.ratio_db,
            threshold_db: settings.threshold_db,
            attack_step: settings.ratio_db / (settings.attack_secs * rate),
            release_step: settings.ratio_db / (settings.release_secs * rate),
            hold_samples: (settings.silence_secs * rate) as u64,
            level: 0.0,
            silence_counter: 0,
        }
    }

    /// Current attenuation in dB
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn silence_counter(&self) -> u64 {
        self.silence_counter
    }

    /// Length of the hold window (and of each trim) in samples
    pub fn hold_samples(&self) -> u64 {
        self.hold_samples
    }

    /// Feed one voice level and update the attenuation
    pub fn advance(&mut self, peak_db: f64) -> Transition {
        if peak_db > self.threshold_db {
            self.silence_counter = 0;
            self.ramp_up();
            Transition::Attack
        } else if self.silence_counter < self.hold_samples && self.level != 0.0 {
            self.ramp_up();
            self.silence_counter += 1;
            Transition::Hold
        } else {
            // Counter moves past the window so a trim fires once per episode
            let trim = self.silence_counter == self.hold_samples;
            if trim {
                self.silence_counter += 1;
            }
            self.ramp_down();

            if trim {
                Transition::Trim
            } else {
                Transition::Release
            }
        }
    }

    fn ramp_up(&mut self) {
        self.level = (self.level + self.attack_step).min(self.ratio_db);
    }

    fn ramp_down(&mut self) {
        self.level = (self.level - self.release_step).max(0.0);
    }
}
