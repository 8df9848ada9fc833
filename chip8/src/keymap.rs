use sdl2::keyboard::Keycode;

/// What a key on the host keyboard does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// One of the 16 Chip-8 keys
    Keypad(u8),
    Quit,
    Pause,
    Restart,
    Fullscreen,
}

/// # Keymap
/// Chip-8 input is generated with a hexadecimal keypad.
///
/// This original layout is mapped to the left 4 alphanumeric columns.
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
/// Escape quits, F5 pauses, T restarts the ROM and F11 toggles fullscreen.
pub fn keymap(key: Keycode) -> Option<Input> {
    let keypad = match key {
        Keycode::Num1 => 0x1,
        Keycode::Num2 => 0x2,
        Keycode::Num3 => 0x3,
        Keycode::Num4 => 0xC,
        Keycode::Q => 0x4,
        Keycode::W => 0x5,
        Keycode::E => 0x6,
        Keycode::R => 0xD,
        Keycode::A => 0x7,
        Keycode::S => 0x8,
        Keycode::D => 0x9,
        Keycode::F => 0xE,
        Keycode::Z => 0xA,
        Keycode::X => 0x0,
        Keycode::C => 0xB,
        Keycode::V => 0xF,
        Keycode::Escape => return Some(Input::Quit),
        Keycode::F5 => return Some(Input::Pause),
        Keycode::T => return Some(Input::Restart),
        Keycode::F11 => return Some(Input::Fullscreen),
        _ => return None,
    };
    Some(Input::Keypad(keypad))
}
