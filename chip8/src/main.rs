use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use quirk8_core::StackPolicy;

mod config;
mod keymap;
mod run;

use config::Settings;
use run::Options;

/// A CHIP-8 interpreter with configurable quirks.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Path to the ROM to run
    rom: PathBuf,

    /// Settings file, created with default values if it doesn't exist
    #[arg(long, value_name = "PATH", default_value = "config.json")]
    config: PathBuf,

    /// Instructions per second, overriding the settings file
    #[arg(long, value_parser = clap::value_parser!(u32).range(60..))]
    ips: Option<u32>,

    /// Draw at most once per frame, as the first instruction of the frame
    #[arg(long)]
    display_wait: bool,

    /// Wrap sprites around the screen edges instead of clipping them
    #[arg(long)]
    wrapping: bool,

    /// Leave VF untouched in 8XY1, 8XY2 and 8XY3
    #[arg(long)]
    no_logic: bool,

    /// Stop on stack overflow or underflow instead of ignoring the instruction
    #[arg(long)]
    strict_stack: bool,
}

impl Args {
    fn into_options(self, mut settings: Settings) -> Options {
        if let Some(ips) = self.ips {
            settings.ips = ips;
        }
        settings.quirks.display_wait |= self.display_wait;
        settings.quirks.wrapping |= self.wrapping;
        settings.quirks.logic &= !self.no_logic;
        if self.strict_stack {
            settings.stack_policy = StackPolicy::Strict;
        }

        Options {
            rom: self.rom,
            config: settings.machine_config(),
            palette: settings.palette(),
            volume: settings.volume,
            fullscreen: settings.start_games_fullscreen,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Settings::load_or_create(&args.config)?;
    run::run(args.into_options(settings))
}
