//! Sound, vibration and voice cues.
//!
//! The [`Notifier`] sits between the session and the platform backends.
//! Every trigger is fire-and-forget: it checks the matching toggle, hands the
//! cue to the backend, and logs (never returns) backend failures. Backends
//! that cannot work on this machine report so once through `is_supported`,
//! and their triggers become no-ops.

use crate::config::NotificationSettings;
use crate::Result;

/// A single tone of a sound cue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

const fn tone(frequency_hz: u32, duration_ms: u32) -> Tone {
    Tone {
        frequency_hz,
        duration_ms,
    }
}

/// Named sound cues
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundCue {
    Beep,
    SetComplete,
    ExerciseComplete,
    WorkoutComplete,
    Pr,
    Countdown,
}

impl SoundCue {
    /// Tone sequence for the cue, for backends that synthesize sound
    pub fn tones(self) -> &'static [Tone] {
        const BEEP: &[Tone] = &[tone(880, 150)];
        const SET_COMPLETE: &[Tone] = &[tone(660, 120), tone(880, 160)];
        const EXERCISE_COMPLETE: &[Tone] = &[tone(523, 120), tone(659, 120), tone(784, 200)];
        const WORKOUT_COMPLETE: &[Tone] = &[
            tone(523, 150),
            tone(659, 150),
            tone(784, 150),
            tone(1047, 400),
        ];
        const PR: &[Tone] = &[tone(784, 100), tone(988, 100), tone(1175, 100), tone(1568, 300)];
        const COUNTDOWN: &[Tone] = &[tone(440, 100)];

        match self {
            SoundCue::Beep => BEEP,
            SoundCue::SetComplete => SET_COMPLETE,
            SoundCue::ExerciseComplete => EXERCISE_COMPLETE,
            SoundCue::WorkoutComplete => WORKOUT_COMPLETE,
            SoundCue::Pr => PR,
            SoundCue::Countdown => COUNTDOWN,
        }
    }
}

/// Vibration patterns, alternating on/off durations in milliseconds
pub mod patterns {
    pub const SHORT: &[u32] = &[50];
    pub const DOUBLE: &[u32] = &[50, 50, 50];
    pub const CELEBRATION: &[u32] = &[100, 50, 100, 50, 200];
    pub const TIMER_COMPLETE: &[u32] = &[200, 100, 200];
}

const MOTIVATION: &[&str] = &[
    "Keep pushing, you've got this!",
    "Strong work. Stay focused.",
    "One more set closer to your goal.",
    "Great form, keep it up!",
    "Breathe, reset, and go again.",
];

/// Audio playback backend
pub trait SoundOutput: Send {
    /// `volume` is already clamped to 0.0..=1.0
    fn play(&mut self, cue: SoundCue, volume: f32) -> Result<()>;
}

/// Vibration backend
pub trait HapticOutput: Send {
    fn is_supported(&self) -> bool;
    fn vibrate(&mut self, pattern_ms: &[u32]) -> Result<()>;
}

/// Speech synthesis backend
pub trait SpeechOutput: Send {
    fn is_supported(&self) -> bool;
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// Backend for a capability this machine does not have
#[derive(Clone, Copy, Debug, Default)]
pub struct Unsupported;

impl SoundOutput for Unsupported {
    fn play(&mut self, _cue: SoundCue, _volume: f32) -> Result<()> {
        Ok(())
    }
}

impl HapticOutput for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    fn vibrate(&mut self, _pattern_ms: &[u32]) -> Result<()> {
        Ok(())
    }
}

impl SpeechOutput for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    fn speak(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }
}

pub struct Notifier {
    settings: NotificationSettings,
    sound: Box<dyn SoundOutput>,
    haptics: Box<dyn HapticOutput>,
    speech: Box<dyn SpeechOutput>,
    speech_supported: bool,
    vibration_supported: bool,
    motivation_index: usize,
}

impl Notifier {
    pub fn new(
        settings: NotificationSettings,
        sound: Box<dyn SoundOutput>,
        haptics: Box<dyn HapticOutput>,
        speech: Box<dyn SpeechOutput>,
    ) -> Self {
        let speech_supported = speech.is_supported();
        let vibration_supported = haptics.is_supported();
        tracing::debug!(
            speech_supported,
            vibration_supported,
            "Notifier capabilities detected"
        );

        Self {
            settings,
            sound,
            haptics,
            speech,
            speech_supported,
            vibration_supported,
            motivation_index: 0,
        }
    }

    /// A notifier with every cue switched off
    pub fn silent() -> Self {
        Self::new(
            NotificationSettings {
                sound_enabled: false,
                vibration_enabled: false,
                voice_enabled: false,
                volume: 0.0,
            },
            Box::new(Unsupported),
            Box::new(Unsupported),
            Box::new(Unsupported),
        )
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: NotificationSettings) {
        self.settings = settings;
    }

    pub fn is_speech_supported(&self) -> bool {
        self.speech_supported
    }

    pub fn is_vibration_supported(&self) -> bool {
        self.vibration_supported
    }

    // ------------------------------------------------------------------
    // Sound
    // ------------------------------------------------------------------

    pub fn play_beep(&mut self) {
        self.play(SoundCue::Beep);
    }

    pub fn play_set_complete(&mut self) {
        self.play(SoundCue::SetComplete);
    }

    pub fn play_exercise_complete(&mut self) {
        self.play(SoundCue::ExerciseComplete);
    }

    pub fn play_workout_complete(&mut self) {
        self.play(SoundCue::WorkoutComplete);
    }

    pub fn play_pr(&mut self) {
        self.play(SoundCue::Pr);
    }

    pub fn play_countdown(&mut self) {
        self.play(SoundCue::Countdown);
    }

    fn play(&mut self, cue: SoundCue) {
        if !self.settings.sound_enabled {
            return;
        }
        let volume = self.settings.volume.clamp(0.0, 1.0);
        if let Err(e) = self.sound.play(cue, volume) {
            tracing::debug!("Sound cue {:?} failed: {}", cue, e);
        }
    }

    // ------------------------------------------------------------------
    // Haptics
    // ------------------------------------------------------------------

    pub fn vibrate_short(&mut self) {
        self.vibrate(patterns::SHORT);
    }

    pub fn vibrate_double(&mut self) {
        self.vibrate(patterns::DOUBLE);
    }

    pub fn vibrate_celebration(&mut self) {
        self.vibrate(patterns::CELEBRATION);
    }

    pub fn vibrate_timer_complete(&mut self) {
        self.vibrate(patterns::TIMER_COMPLETE);
    }

    fn vibrate(&mut self, pattern: &[u32]) {
        if !self.settings.vibration_enabled || !self.vibration_supported {
            return;
        }
        if let Err(e) = self.haptics.vibrate(pattern) {
            tracing::debug!("Vibration failed: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Voice
    // ------------------------------------------------------------------

    pub fn speak_text(&mut self, text: &str) {
        if !self.settings.voice_enabled || !self.speech_supported {
            return;
        }
        if let Err(e) = self.speech.speak(text) {
            tracing::debug!("Speech failed: {}", e);
        }
    }

    /// Speak the next phrase from the motivation rotation
    pub fn speak_motivation(&mut self) {
        let phrase = MOTIVATION[self.motivation_index % MOTIVATION.len()];
        self.motivation_index = self.motivation_index.wrapping_add(1);
        self.speak_text(phrase);
    }
}
