pub use audio::Beeper;
pub use display::{Display, Palette, Rgb};

mod audio;
mod display;
