use log::debug;
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

use quirk8_core::Speaker;

const SAMPLE_RATE: i32 = 44_100;
const TONE_FREQUENCY: u32 = 440;
const MAX_VOLUME: u8 = 100;

/// A square wave generator, fed to SDL2 on its audio thread
pub struct SquareWave {
    half_period: u32,
    amplitude: i16,
    sample: u32,
}

impl SquareWave {
    /// # Arguments
    /// * `sample_rate` samples per second of the output device
    /// * `volume` 0..=100
    pub fn new(sample_rate: u32, volume: u8) -> Self {
        SquareWave {
            half_period: (sample_rate / TONE_FREQUENCY / 2).max(1),
            amplitude: i16::from(volume.min(MAX_VOLUME)) * 30,
            sample: 0,
        }
    }
}

impl AudioCallback for SquareWave {
    type Channel = i16;

    fn callback(&mut self, out: &mut [i16]) {
        for x in out.iter_mut() {
            *x = if (self.sample / self.half_period) % 2 == 1 {
                self.amplitude
            } else {
                -self.amplitude
            };
            self.sample = self.sample.wrapping_add(1);
        }
    }
}

/// # Beeper
/// A 440Hz tone that plays while the Chip-8 sound timer is running.
/// The audio device is closed when the Beeper is dropped.
pub struct Beeper {
    device: AudioDevice<SquareWave>,
    playing: bool,
}

impl Beeper {
    /// Opens the default playback device.
    ///
    /// # Arguments
    /// * `audio` an sdl2 audio subsystem
    /// * `volume` 0..=100
    pub fn new(audio: &sdl2::AudioSubsystem, volume: u8) -> Result<Self, String> {
        let desired = AudioSpecDesired {
            freq: Some(SAMPLE_RATE),
            channels: Some(1),
            samples: Some(512),
        };
        let device = audio.open_playback(None, &desired, |spec| {
            debug!("opened audio device at {} Hz with {} samples", spec.freq, spec.samples);
            SquareWave::new(spec.freq as u32, volume)
        })?;
        if device.spec().channels != 1 {
            return Err(format!(
                "could not get a mono audio device, got {} channels",
                device.spec().channels
            ));
        }
        Ok(Beeper {
            device,
            playing: false,
        })
    }
}

impl Speaker for Beeper {
    fn set_playing(&mut self, playing: bool) {
        if playing == self.playing {
            return;
        }
        if playing {
            self.device.resume();
        } else {
            self.device.pause();
        }
        self.playing = playing;
    }
}
