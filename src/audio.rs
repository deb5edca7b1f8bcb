//! Sound effects
//!
//! Fire-and-forget: the simulation never waits on audio and never sees its
//! failures. Without a backend every call is a silent no-op.
//!
//! Each effect is a short synthesized tone: one oscillator swept between two
//! pitches under an exponential fade.

use std::fmt;
use std::io::{Write, stdout};

use fundsp::prelude32::*;

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Output rate for synthesized tones
pub const SAMPLE_RATE: u32 = 44_100;

/// Level the fade reaches at the end of a tone
const FADE_FLOOR: f32 = 0.01;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Positive block caught
    Catch,
    /// Negative block caught
    Damage,
    /// Power-up collected
    PowerUp,
    /// New level reached
    LevelUp,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 4] = [
        SoundEffect::Catch,
        SoundEffect::Damage,
        SoundEffect::PowerUp,
        SoundEffect::LevelUp,
    ];

    /// Sound for a simulation event, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::BlockCaught { points, .. } if *points > 0 => Some(SoundEffect::Catch),
            GameEvent::BlockCaught { .. } => Some(SoundEffect::Damage),
            GameEvent::PowerUpCollected { .. } => Some(SoundEffect::PowerUp),
            GameEvent::LevelUp { .. } => Some(SoundEffect::LevelUp),
            _ => None,
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            // Short bright blip
            SoundEffect::Catch => Tone {
                wave: Waveform::Triangle,
                start_hz: 520.0,
                end_hz: 780.0,
                seconds: 0.08,
                gain: 0.35,
            },
            // Falling buzz
            SoundEffect::Damage => Tone {
                wave: Waveform::Saw,
                start_hz: 220.0,
                end_hz: 70.0,
                seconds: 0.25,
                gain: 0.25,
            },
            SoundEffect::PowerUp => Tone {
                wave: Waveform::Square,
                start_hz: 440.0,
                end_hz: 1320.0,
                seconds: 0.18,
                gain: 0.15,
            },
            SoundEffect::LevelUp => Tone {
                wave: Waveform::Sine,
                start_hz: 523.0,
                end_hz: 1046.0,
                seconds: 0.45,
                gain: 0.4,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Saw,
    Square,
}

/// One swept, fading oscillator note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Waveform,
    pub start_hz: f32,
    pub end_hz: f32,
    pub seconds: f32,
    /// Peak amplitude before volume
    pub gain: f32,
}

/// Render a tone to mono samples at [`SAMPLE_RATE`]
///
/// Pitch and amplitude both move exponentially, the way a web audio ramp
/// does, so a sweep sounds even across octaves.
pub fn synthesize(tone: &Tone, volume: f32) -> Vec<f32> {
    let mut osc: Box<dyn AudioUnit> = match tone.wave {
        Waveform::Sine => Box::new(sine()),
        Waveform::Triangle => Box::new(triangle()),
        Waveform::Saw => Box::new(saw()),
        Waveform::Square => Box::new(square()),
    };
    osc.set_sample_rate(SAMPLE_RATE as f64);

    let len = (tone.seconds * SAMPLE_RATE as f32) as usize;
    let sweep = tone.end_hz / tone.start_hz;
    let peak = tone.gain * volume.clamp(0.0, 1.0);
    let mut out = [0.0f32];
    (0..len)
        .map(|i| {
            let t = i as f32 / len as f32;
            osc.tick(&[tone.start_hz * sweep.powf(t)], &mut out);
            out[0] * peak * FADE_FLOOR.powf(t)
        })
        .collect()
}

/// Something that can make noise
pub trait AudioBackend {
    fn play(&mut self, effect: SoundEffect, volume: f32) -> Result<(), AudioError>;
}

#[derive(Debug)]
pub enum AudioError {
    /// Output device write failed.
    Io(std::io::Error),
    /// No sound device could be opened or driven.
    Device(String),
    /// Backend refused the effect.
    Unavailable(&'static str),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Io(e) => write!(f, "IO error: {e}"),
            AudioError::Device(e) => write!(f, "audio device error: {e}"),
            AudioError::Unavailable(why) => write!(f, "audio unavailable: {why}"),
        }
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(e: std::io::Error) -> Self {
        AudioError::Io(e)
    }
}

/// Plays synthesized tones on the default output device
#[cfg(feature = "sound")]
pub struct Speaker {
    _stream: rodio::OutputStream,
    handle: rodio::OutputStreamHandle,
    /// Unit-volume renders, indexed like `SoundEffect::ALL`
    tones: Vec<Vec<f32>>,
}

#[cfg(feature = "sound")]
impl Speaker {
    pub fn open() -> Result<Self, AudioError> {
        let (stream, handle) =
            rodio::OutputStream::try_default().map_err(|e| AudioError::Device(e.to_string()))?;
        let tones = SoundEffect::ALL
            .iter()
            .map(|effect| synthesize(&effect.tone(), 1.0))
            .collect();
        Ok(Self {
            _stream: stream,
            handle,
            tones,
        })
    }
}

#[cfg(feature = "sound")]
impl AudioBackend for Speaker {
    fn play(&mut self, effect: SoundEffect, volume: f32) -> Result<(), AudioError> {
        let sink =
            rodio::Sink::try_new(&self.handle).map_err(|e| AudioError::Device(e.to_string()))?;
        sink.set_volume(volume);
        let samples = self.tones[effect as usize].clone();
        sink.append(rodio::buffer::SamplesBuffer::new(1, SAMPLE_RATE, samples));
        sink.detach();
        Ok(())
    }
}

/// Rings the terminal bell for the effects that matter
///
/// Fallback for machines without a sound device. Catches happen several
/// times a second, so they stay quiet.
pub struct TerminalBell<W: Write> {
    out: W,
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> AudioBackend for TerminalBell<W> {
    fn play(&mut self, effect: SoundEffect, _volume: f32) -> Result<(), AudioError> {
        if effect == SoundEffect::Catch {
            return Ok(());
        }
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Option<Box<dyn AudioBackend>>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    failures: u64,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::silent()
    }
}

impl AudioManager {
    /// No backend: every call is a no-op
    pub fn silent() -> Self {
        Self {
            backend: None,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            failures: 0,
        }
    }

    /// Speaker output when a device opens, else the opt-in bell, else silence
    pub fn for_terminal(settings: &Settings) -> Self {
        if settings.muted {
            return Self::silent();
        }

        #[cfg(feature = "sound")]
        match Speaker::open() {
            Ok(speaker) => {
                log::info!("Audio output opened");
                return Self::with_backend(Box::new(speaker), settings);
            }
            Err(e) => log::warn!("Sound disabled: {}", e),
        }

        if settings.terminal_bell {
            Self::with_backend(Box::new(TerminalBell::new(stdout())), settings)
        } else {
            Self::silent()
        }
    }

    pub fn with_backend(backend: Box<dyn AudioBackend>, settings: &Settings) -> Self {
        let mut manager = Self::silent();
        manager.backend = Some(backend);
        manager.set_master_volume(settings.master_volume);
        manager.set_sfx_volume(settings.sfx_volume);
        manager.set_muted(settings.muted);
        manager
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Backend errors seen so far
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(backend) = self.backend.as_mut() else {
            return;
        };

        if let Err(e) = backend.play(effect, vol) {
            self.failures += 1;
            // First failure and then occasionally, not every frame
            if self.failures == 1 || self.failures.is_multiple_of(100) {
                log::warn!("Audio playback failed ({} so far): {}", self.failures, e);
            }
        }
    }

    /// Play whatever the tick's events call for
    pub fn play_events(&mut self, events: &[GameEvent]) {
        for effect in events.iter().filter_map(SoundEffect::for_event) {
            self.play(effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{BlockGrade, PowerUpKind};
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<SoundEffect>>>);

    impl AudioBackend for Recorder {
        fn play(&mut self, effect: SoundEffect, _volume: f32) -> Result<(), AudioError> {
            self.0.borrow_mut().push(effect);
            Ok(())
        }
    }

    struct Broken;

    impl AudioBackend for Broken {
        fn play(&mut self, _effect: SoundEffect, _volume: f32) -> Result<(), AudioError> {
            Err(AudioError::Unavailable("no device"))
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn caught(points: i64) -> GameEvent {
        GameEvent::BlockCaught {
            grade: BlockGrade::Good,
            points,
            at: Vec2::ZERO,
        }
    }

    #[test]
    fn test_event_mapping() {
        assert_eq!(SoundEffect::for_event(&caught(10)), Some(SoundEffect::Catch));
        assert_eq!(SoundEffect::for_event(&caught(-10)), Some(SoundEffect::Damage));
        assert_eq!(
            SoundEffect::for_event(&GameEvent::PowerUpCollected {
                kind: PowerUpKind::Shield,
                at: Vec2::ZERO
            }),
            Some(SoundEffect::PowerUp)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::LevelUp { level: 2 }),
            Some(SoundEffect::LevelUp)
        );
        assert_eq!(SoundEffect::for_event(&GameEvent::Paused), None);
    }

    #[test]
    fn test_play_events_reaches_backend() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut audio =
            AudioManager::with_backend(Box::new(Recorder(log.clone())), &Settings::default());
        audio.play_events(&[caught(10), GameEvent::Restarted, GameEvent::LevelUp { level: 3 }]);
        assert_eq!(*log.borrow(), vec![SoundEffect::Catch, SoundEffect::LevelUp]);
    }

    #[test]
    fn test_muted_skips_backend() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let settings = Settings {
            muted: true,
            ..Default::default()
        };
        let mut audio = AudioManager::with_backend(Box::new(Recorder(log.clone())), &settings);
        audio.play(SoundEffect::Damage);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_failures_are_swallowed() {
        let mut audio = AudioManager::with_backend(Box::new(Broken), &Settings::default());
        audio.play(SoundEffect::Damage);
        audio.play(SoundEffect::LevelUp);
        assert_eq!(audio.failures(), 2);

        let mut bell = AudioManager::with_backend(
            Box::new(TerminalBell::new(FailingWriter)),
            &Settings::default(),
        );
        bell.play(SoundEffect::Catch);
        assert_eq!(bell.failures(), 0);
        bell.play(SoundEffect::Damage);
        assert_eq!(bell.failures(), 1);
    }

    #[test]
    fn test_silent_is_noop() {
        let mut audio = AudioManager::silent();
        audio.play(SoundEffect::PowerUp);
        assert_eq!(audio.failures(), 0);
    }

    #[test]
    fn test_tones_are_distinct_and_audible() {
        let renders: Vec<Vec<f32>> = SoundEffect::ALL
            .iter()
            .map(|e| synthesize(&e.tone(), 1.0))
            .collect();
        for (effect, samples) in SoundEffect::ALL.iter().zip(&renders) {
            let tone = effect.tone();
            assert_eq!(samples.len(), (tone.seconds * SAMPLE_RATE as f32) as usize);
            let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            assert!(peak > 0.05, "{effect:?} is silent");
            // Band-limited edges may ring slightly past the nominal gain
            assert!(peak <= tone.gain * 1.2, "{effect:?} peak {peak}");
        }
        for i in 0..renders.len() {
            for j in i + 1..renders.len() {
                assert_ne!(renders[i], renders[j]);
            }
        }
    }

    #[test]
    fn test_tone_scales_with_volume_and_fades() {
        let tone = SoundEffect::LevelUp.tone();
        let full = synthesize(&tone, 1.0);
        let half = synthesize(&tone, 0.5);
        for (a, b) in full.iter().zip(&half) {
            assert!((a * 0.5 - b).abs() < 1e-5);
        }
        assert!(synthesize(&tone, 0.0).iter().all(|&s| s == 0.0));

        // The tail is quieter than the attack
        let quarter = full.len() / 4;
        let energy = |s: &[f32]| s.iter().map(|x| x * x).sum::<f32>();
        assert!(energy(&full[full.len() - quarter..]) < energy(&full[..quarter]) * 0.1);
    }

    #[test]
    fn test_muted_settings_stay_silent() {
        let settings = Settings {
            muted: true,
            ..Default::default()
        };
        let mut audio = AudioManager::for_terminal(&settings);
        audio.play(SoundEffect::LevelUp);
        assert_eq!(audio.failures(), 0);
    }

    #[test]
    fn test_bell_writes_bel() {
        let mut buf = Vec::new();
        TerminalBell::new(&mut buf).play(SoundEffect::LevelUp, 1.0).unwrap();
        assert_eq!(buf, b"\x07");
    }
}
