use log::warn;
use sdl2::pixels::PixelFormatEnum;
use sdl2::video::FullscreenType;

use quirk8_core::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use quirk8_core::state::FrameBuffer;
use quirk8_core::Screen;

const SCALE: usize = 10;

/// An RGB color
pub type Rgb = (u8, u8, u8);

/// Colors of lit and unlit pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub on: Rgb,
    pub off: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            on: (255, 204, 1),
            off: (153, 102, 1),
        }
    }
}

/// # Display
/// The Chip-8 display is composed of 64x32 monochrome pixels.
/// The window starts at 10x scale and can be resized; the frame is always stretched to fit it.
pub struct Display {
    canvas: sdl2::render::WindowCanvas,
    palette: Palette,
}

impl Display {
    /// Creates a new window bound to an sdl2 video subsystem.
    ///
    /// # Arguments
    /// * `video` an sdl2 video subsystem with which to draw
    /// * `title` the window title, usually the name of the ROM
    /// * `palette` the colors of lit and unlit pixels
    /// * `fullscreen` whether to start in desktop fullscreen mode
    pub fn new(
        video: &sdl2::VideoSubsystem,
        title: &str,
        palette: Palette,
        fullscreen: bool,
    ) -> Result<Self, String> {
        let window = video
            .window(
                title,
                (DISPLAY_WIDTH * SCALE) as u32,
                (DISPLAY_HEIGHT * SCALE) as u32,
            )
            .position_centered()
            .resizable()
            .allow_highdpi()
            .build()
            .map_err(|e| e.to_string())?;
        let mut canvas = window
            .into_canvas()
            .accelerated()
            .build()
            .map_err(|e| e.to_string())?;
        canvas
            .set_logical_size(DISPLAY_WIDTH as u32, DISPLAY_HEIGHT as u32)
            .map_err(|e| e.to_string())?;

        let mut display = Display { canvas, palette };
        if fullscreen {
            display.set_fullscreen(true)?;
        }
        Ok(display)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.canvas.window().fullscreen_state() != FullscreenType::Off
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), String> {
        let mode = if fullscreen {
            FullscreenType::Desktop
        } else {
            FullscreenType::Off
        };
        self.canvas.window_mut().set_fullscreen(mode)
    }

    /// Switches between windowed and fullscreen mode, returning the new mode.
    pub fn toggle_fullscreen(&mut self) -> Result<bool, String> {
        let fullscreen = !self.is_fullscreen();
        self.set_fullscreen(fullscreen)?;
        Ok(fullscreen)
    }

    /// Formats a Chip-8 FrameBuffer for rendering as an SDL2 texture.
    ///
    /// An SDL2 RGB24 texture is a 1D array of bytes that represent concatenated rows of RGB pixels.
    /// Each pixel is replaced by the palette color for its state.
    ///
    /// # Arguments
    /// * `frame` a Chip-8 FrameBuffer
    /// * `palette` colors for lit and unlit pixels
    fn frame_to_sdl_texture(frame: &FrameBuffer, palette: &Palette) -> Vec<u8> {
        frame
            .iter()
            .flat_map(|row| row.iter())
            .flat_map(|&lit| {
                let (r, g, b) = if lit { palette.on } else { palette.off };
                vec![r, g, b]
            })
            .collect()
    }

    /// Formats the Chip-8 FrameBuffer as an SDL2 RGB24 texture and renders it.
    ///
    /// # Arguments
    /// * `frame` a Chip-8 FrameBuffer
    pub fn render(&mut self, frame: &FrameBuffer) -> Result<(), String> {
        let texture_creator = self.canvas.texture_creator();

        let mut texture = texture_creator
            .create_texture_streaming(
                PixelFormatEnum::RGB24,
                DISPLAY_WIDTH as u32,
                DISPLAY_HEIGHT as u32,
            )
            .map_err(|e| e.to_string())?;

        let pixels = Display::frame_to_sdl_texture(frame, &self.palette);
        texture.with_lock(None, |buffer: &mut [u8], pitch: usize| {
            for (y, row) in pixels.chunks(DISPLAY_WIDTH * 3).enumerate() {
                buffer[y * pitch..y * pitch + row.len()].copy_from_slice(row);
            }
        })?;

        self.canvas.copy(&texture, None, None)?;
        self.canvas.present();
        Ok(())
    }
}

impl Screen for Display {
    fn present(&mut self, frame: &FrameBuffer) {
        if let Err(e) = self.render(frame) {
            warn!("failed to render frame: {}", e);
        }
    }
}
