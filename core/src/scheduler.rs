use std::time::{Duration, Instant};

use log::trace;

use crate::chip8::Chip8;
use crate::config::Config;
use crate::error::ExecError;
use crate::state::FrameBuffer;

/// Something that can show a frame, e.g. a window.
pub trait Screen {
    fn present(&mut self, frame: &FrameBuffer);
}

/// Something that can beep while the sound timer is running.
pub trait Speaker {
    fn set_playing(&mut self, playing: bool);
}

/// What happened during a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// Cycles spent, including those spent retrying an instruction
    pub cycles: u32,
    /// Cycles that ended in a retry rather than a completed instruction
    pub retries: u32,
    /// Wall-clock time spent on the frame
    pub elapsed: Duration,
}

/// # Frame Scheduler
/// Runs the machine one 60Hz frame at a time:
/// - executes a fixed budget of instructions (unless paused)
/// - decrements the timers
/// - hands the frame buffer and the sound state to whoever presents them
///
/// Sleeping until the next frame is up to the caller.
pub struct Scheduler {
    budget: u32,
    paused: bool,
}

impl Scheduler {
    pub fn new(config: &Config) -> Self {
        Scheduler {
            budget: config.instructions_per_frame(),
            paused: false,
        }
    }

    /// Instructions executed per frame
    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Executes one frame's worth of instructions and then advances the timers.
    ///
    /// A paused scheduler leaves the machine untouched. Execution stops at the first error,
    /// in which case the timers are not advanced.
    pub fn run_frame(&self, chip8: &mut Chip8) -> Result<FrameReport, ExecError> {
        let mut report = FrameReport::default();
        if self.paused {
            return Ok(report);
        }

        let start = Instant::now();
        for cycle in 0..self.budget {
            if chip8.advance_cpu(cycle)? {
                report.retries += 1;
            }
            report.cycles += 1;
        }
        report.elapsed = start.elapsed();
        chip8.advance_timers();
        trace!("frame: {:?}", report);
        Ok(report)
    }

    /// Runs a frame and presents its result.
    ///
    /// The reported elapsed time includes presenting, so callers can sleep for the rest of the frame.
    pub fn tick(
        &self,
        chip8: &mut Chip8,
        screen: &mut dyn Screen,
        speaker: &mut dyn Speaker,
    ) -> Result<FrameReport, ExecError> {
        let start = Instant::now();
        let mut report = self.run_frame(chip8)?;
        screen.present(chip8.frame_buffer());
        speaker.set_playing(!self.paused && chip8.sound_active());
        report.elapsed = start.elapsed();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Quirks;

    #[derive(Default)]
    struct Recorder {
        frames: usize,
        lit: usize,
        playing: Vec<bool>,
    }

    impl Screen for Recorder {
        fn present(&mut self, frame: &FrameBuffer) {
            self.frames += 1;
            self.lit = frame.iter().flat_map(|row| row.iter()).filter(|&&p| p).count();
        }
    }

    impl Speaker for Recorder {
        fn set_playing(&mut self, playing: bool) {
            self.playing.push(playing);
        }
    }

    fn machine(program: &[u8], config: Config) -> Chip8 {
        let mut chip8 = Chip8::new(config);
        chip8.load(program, config).unwrap();
        chip8
    }

    /// 1200: jump to self
    const SPIN: [u8; 2] = [0x12, 0x00];

    #[test]
    fn test_budget_is_ips_over_sixty() {
        let config = Config {
            ips: 700,
            ..Config::default()
        };
        assert_eq!(Scheduler::new(&config).budget(), 11);
    }

    #[test]
    fn test_run_frame_executes_budget() {
        let config = Config {
            ips: 600,
            ..Config::default()
        };
        let mut chip8 = machine(&SPIN, config);
        let report = Scheduler::new(&config).run_frame(&mut chip8).unwrap();
        assert_eq!(report.cycles, 10);
        assert_eq!(report.retries, 0);
    }

    #[test]
    fn test_paused_frame_does_nothing() {
        // 6005: V0 = 5
        let mut chip8 = machine(&[0x60, 0x05], Config::default());
        let mut scheduler = Scheduler::new(&Config::default());
        assert!(scheduler.toggle_pause());
        let report = scheduler.run_frame(&mut chip8).unwrap();
        assert_eq!(report.cycles, 0);
        assert_eq!(chip8.state().pc, 0x200);
    }

    #[test]
    fn test_tick_decrements_timers_and_reports_sound() {
        // V0 = 2; ST = V0; DT = V0; spin
        let program = [0x60, 0x02, 0xF0, 0x18, 0xF0, 0x15, 0x12, 0x06];
        let mut chip8 = machine(&program, Config::default());
        let scheduler = Scheduler::new(&Config::default());
        let mut recorder = Recorder::default();

        scheduler.tick(&mut chip8, &mut recorder, &mut Recorder::default()).unwrap();
        assert_eq!(chip8.state().sound_timer, 1);
        assert_eq!(chip8.state().delay_timer, 1);

        let mut speaker = Recorder::default();
        scheduler.tick(&mut chip8, &mut recorder, &mut speaker).unwrap();
        scheduler.tick(&mut chip8, &mut recorder, &mut speaker).unwrap();
        assert_eq!(speaker.playing, vec![false, false]);
        assert_eq!(chip8.state().sound_timer, 0);
        assert_eq!(chip8.state().delay_timer, 0);
        assert_eq!(recorder.frames, 3);
    }

    #[test]
    fn test_sound_plays_while_timer_is_running() {
        // V0 = 3; ST = V0; spin
        let program = [0x60, 0x03, 0xF0, 0x18, 0x12, 0x04];
        let mut chip8 = machine(&program, Config::default());
        let scheduler = Scheduler::new(&Config::default());
        let mut screen = Recorder::default();
        let mut speaker = Recorder::default();
        for _ in 0..4 {
            scheduler.tick(&mut chip8, &mut screen, &mut speaker).unwrap();
        }
        assert_eq!(speaker.playing, vec![true, true, false, false]);
    }

    #[test]
    fn test_display_wait_limits_draws_to_one_per_frame() {
        let config = Config {
            quirks: Quirks {
                display_wait: true,
                ..Quirks::default()
            },
            ..Config::default()
        };
        // I = glyph 0; draw at (V0, V0) twice; spin
        let program = [0xA0, 0x50, 0xD0, 0x05, 0xD0, 0x05, 0x12, 0x06];
        let mut chip8 = machine(&program, config);
        let scheduler = Scheduler::new(&config);
        let mut screen = Recorder::default();
        let mut speaker = Recorder::default();

        // The first draw is not the first instruction of the frame, so the frame idles on it
        let report = scheduler.tick(&mut chip8, &mut screen, &mut speaker).unwrap();
        assert_eq!(report.retries, 10);
        assert_eq!(chip8.state().pc, 0x202);
        assert_eq!(screen.lit, 0);

        // Next frame starts with the draw; the second draw has to wait again
        scheduler.tick(&mut chip8, &mut screen, &mut speaker).unwrap();
        assert_eq!(chip8.state().pc, 0x204);
        assert_eq!(screen.lit, 14);

        scheduler.tick(&mut chip8, &mut screen, &mut speaker).unwrap();
        assert_eq!(chip8.state().pc, 0x206);
        assert_eq!(screen.lit, 0);
    }

    #[test]
    fn test_fatal_error_stops_the_frame() {
        // jump to the last byte of memory
        let mut chip8 = machine(&[0x1F, 0xFF], Config::default());
        let scheduler = Scheduler::new(&Config::default());
        let result = scheduler.run_frame(&mut chip8);
        assert_eq!(result, Err(ExecError::FetchOutOfBounds { pc: 0xFFF }));
    }
}
