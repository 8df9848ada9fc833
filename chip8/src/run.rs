use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Error, Result};
use log::{info, warn};
use sdl2::event::Event;

use quirk8_core::constants::FRAMES_PER_SECOND;
use quirk8_core::{Chip8, Config, Scheduler};
use quirk8_display::{Beeper, Display, Palette};

use crate::keymap::{keymap, Input};

/// Everything needed to start a game
pub struct Options {
    pub rom: PathBuf,
    pub config: Config,
    pub palette: Palette,
    pub volume: u8,
    pub fullscreen: bool,
}

fn read_rom(rom: &Path) -> Result<Vec<u8>> {
    fs::read(rom).with_context(|| format!("unable to read ROM {}", rom.display()))
}

fn window_title(rom: &Path) -> String {
    rom.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("quirk8"))
}

pub fn run(options: Options) -> Result<()> {
    // Load ROM
    let mut chip8 = Chip8::default();
    let file = File::open(&options.rom)
        .with_context(|| format!("unable to open ROM {}", options.rom.display()))?;
    let mut reader = BufReader::new(file);
    chip8
        .load_rom(&mut reader, options.config)
        .with_context(|| format!("unable to load ROM {}", options.rom.display()))?;

    // Get SDL2 context
    let sdl = sdl2::init().map_err(Error::msg)?;
    let video = sdl.video().map_err(Error::msg)?;
    let audio = sdl.audio().map_err(Error::msg)?;
    let mut display = Display::new(
        &video,
        &window_title(&options.rom),
        options.palette,
        options.fullscreen,
    )
    .map_err(Error::msg)
    .context("unable to open window")?;
    let mut beeper = Beeper::new(&audio, options.volume)
        .map_err(Error::msg)
        .context("unable to open audio device")?;
    let mut events = sdl.event_pump().map_err(Error::msg)?;

    let mut scheduler = Scheduler::new(chip8.config());
    let frame_time = Duration::from_secs(1) / FRAMES_PER_SECOND;
    info!(
        "running {} at {} instructions per frame",
        options.rom.display(),
        scheduler.budget()
    );

    'event: loop {
        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'event,
                Event::KeyDown {
                    keycode: Some(key),
                    repeat,
                    ..
                } => match keymap(key) {
                    Some(Input::Keypad(k)) => chip8.key_press(k),
                    Some(Input::Quit) => break 'event,
                    Some(_) if repeat => continue,
                    Some(Input::Pause) => {
                        let paused = scheduler.toggle_pause();
                        info!("{}", if paused { "paused" } else { "resumed" });
                    }
                    Some(Input::Restart) => {
                        if let Err(e) = read_rom(&options.rom)
                            .and_then(|program| chip8.reset(&program).map_err(Error::from))
                        {
                            warn!("unable to restart: {:#}", e);
                        }
                    }
                    Some(Input::Fullscreen) => {
                        if let Err(e) = display.toggle_fullscreen() {
                            warn!("unable to toggle fullscreen: {}", e);
                        }
                    }
                    None => continue,
                },
                Event::KeyUp {
                    keycode: Some(key), ..
                } => {
                    if let Some(Input::Keypad(k)) = keymap(key) {
                        chip8.key_release(k);
                    }
                }
                _ => continue,
            };
        }

        // Update state
        let report = scheduler
            .tick(&mut chip8, &mut display, &mut beeper)
            .with_context(|| format!("execution halted at pc {:#05X}", chip8.state().pc))?;

        // Handle timing
        if report.elapsed < frame_time {
            std::thread::sleep(frame_time - report.elapsed);
        }
    }

    info!("quitting");
    Ok(())
}
