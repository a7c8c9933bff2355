//! Timer chimes using the Web Audio API
//!
//! Procedurally generated tones - no external files needed! Each chime is a
//! plain list of tones so the patterns can be checked without a browser.

/// Chime types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chime {
    /// Countdown reached zero
    TimeUp,
    /// Logo hit its first scripted corner
    Impact,
    /// Logo landed on its final corner
    FinalImpact,
}

/// Waveform of a single tone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Triangle,
}

/// One oscillator burst within a chime
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Start time relative to the chime (s)
    pub offset: f64,
    /// Length including the decay (s)
    pub duration: f64,
    pub freq: f32,
    /// Gain reached after the attack, before volume scaling
    pub peak_gain: f32,
    pub wave: Wave,
}

/// Gain floor; exponential ramps cannot reach zero
pub const SILENT_GAIN: f32 = 0.0001;
/// Attack length of every tone (s)
pub const ATTACK_SECONDS: f64 = 0.01;

const TIME_UP_BEEPS: usize = 4;
const TIME_UP_SPACING: f64 = 0.35;
const TIME_UP_LENGTH: f64 = 0.2;

impl Chime {
    pub fn tones(self) -> Vec<Tone> {
        match self {
            Chime::TimeUp => (0..TIME_UP_BEEPS)
                .map(|i| Tone {
                    offset: i as f64 * TIME_UP_SPACING,
                    duration: TIME_UP_LENGTH,
                    freq: if i % 2 == 0 { 920.0 } else { 740.0 },
                    peak_gain: 0.22,
                    wave: Wave::Sine,
                })
                .collect(),
            // Bright two-note ping
            Chime::Impact => vec![
                Tone {
                    offset: 0.0,
                    duration: 0.12,
                    freq: 1320.0,
                    peak_gain: 0.16,
                    wave: Wave::Triangle,
                },
                Tone {
                    offset: 0.08,
                    duration: 0.18,
                    freq: 1760.0,
                    peak_gain: 0.12,
                    wave: Wave::Triangle,
                },
            ],
            // Lower, longer landing tone
            Chime::FinalImpact => vec![
                Tone {
                    offset: 0.0,
                    duration: 0.6,
                    freq: 440.0,
                    peak_gain: 0.2,
                    wave: Wave::Sine,
                },
                Tone {
                    offset: 0.0,
                    duration: 0.45,
                    freq: 660.0,
                    peak_gain: 0.1,
                    wave: Wave::Sine,
                },
            ],
        }
    }

    /// Time from the first attack until the last tone has decayed
    pub fn length(self) -> f64 {
        self.tones()
            .iter()
            .map(|t| t.offset + t.duration)
            .fold(0.0, f64::max)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

    use super::{ATTACK_SECONDS, Chime, SILENT_GAIN, Tone, Wave};
    use crate::platform::{Capability, CapabilityUnavailable, Detected};

    /// Audio manager for the timer page
    ///
    /// The context is created lazily on the first user gesture, since
    /// browsers refuse to start audio before one.
    pub struct AudioManager {
        ctx: Detected<AudioContext>,
        volume: f32,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            Self {
                ctx: Detected::Untried,
                volume: 0.8,
            }
        }

        /// Set volume (0.0 - 1.0); 0 silences everything
        pub fn set_volume(&mut self, vol: f32) {
            self.volume = vol.clamp(0.0, 1.0);
        }

        /// Create or resume the context (call from a user gesture).
        ///
        /// Only the first failed attempt to create a context is reported.
        pub fn unlock(&mut self) -> Result<(), CapabilityUnavailable> {
            let ctx = self.ctx.get_or_detect(|| {
                AudioContext::new()
                    .map_err(|e| CapabilityUnavailable::new(Capability::Audio, format!("{:?}", e)))
            })?;
            let Some(ctx) = ctx else { return Ok(()) };
            if ctx.state() == AudioContextState::Suspended {
                if let Ok(promise) = ctx.resume() {
                    wasm_bindgen_futures::spawn_local(async move {
                        // Refused outside a gesture; the next click tries again
                        if let Err(e) = JsFuture::from(promise).await {
                            log::debug!("Audio resume refused: {:?}", e);
                        }
                    });
                }
            }
            Ok(())
        }

        /// Play a chime
        pub fn play(&self, chime: Chime) {
            if self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = self.ctx.ready() else { return };

            let now = ctx.current_time();
            for tone in chime.tones() {
                self.play_tone(ctx, now, &tone);
            }
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn play_tone(&self, ctx: &AudioContext, now: f64, tone: &Tone) {
            let osc_type = match tone.wave {
                Wave::Sine => OscillatorType::Sine,
                Wave::Triangle => OscillatorType::Triangle,
            };
            let Some((osc, gain)) = self.create_osc(ctx, tone.freq, osc_type) else {
                return;
            };
            let start = now + tone.offset;
            let end = start + tone.duration;
            let peak = (tone.peak_gain * self.volume).max(SILENT_GAIN * 2.0);

            osc.frequency().set_value_at_time(tone.freq, start).ok();
            gain.gain().set_value_at_time(SILENT_GAIN, start).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(peak, start + ATTACK_SECONDS)
                .ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(SILENT_GAIN, end)
                .ok();

            osc.start_with_when(start).ok();
            osc.stop_with_when(end).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_up_is_four_alternating_beeps() {
        let tones = Chime::TimeUp.tones();
        assert_eq!(tones.len(), 4);
        let freqs: Vec<f32> = tones.iter().map(|t| t.freq).collect();
        assert_eq!(freqs, vec![920.0, 740.0, 920.0, 740.0]);
        for (i, tone) in tones.iter().enumerate() {
            assert!((tone.offset - i as f64 * 0.35).abs() < 1e-12);
            assert_eq!(tone.duration, 0.2);
            assert_eq!(tone.peak_gain, 0.22);
            assert_eq!(tone.wave, Wave::Sine);
        }
        assert!((Chime::TimeUp.length() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_final_impact_is_lower_and_longer() {
        let ping = Chime::Impact.tones();
        let landing = Chime::FinalImpact.tones();
        let lowest = |tones: &[Tone]| tones.iter().map(|t| t.freq).fold(f32::MAX, f32::min);
        assert!(lowest(&landing) < lowest(&ping));
        assert!(Chime::FinalImpact.length() > Chime::Impact.length());
    }

    #[test]
    fn test_tones_outlast_their_attack() {
        for chime in [Chime::TimeUp, Chime::Impact, Chime::FinalImpact] {
            for tone in chime.tones() {
                assert!(tone.duration > ATTACK_SECONDS);
                assert!(tone.peak_gain > SILENT_GAIN);
            }
        }
    }
}
