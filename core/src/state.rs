use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_START, KEY_COUNT, MAX_PROGRAM_SIZE, MEMORY_SIZE,
    PROGRAM_START, SPRITE_SHEET, STACK_DEPTH,
};
use crate::error::{ExecError, LoadError};

/// The FrameBuffer is indexed as [y][x]
pub type FrameBuffer = [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// The pressed status of keys 0..F
pub type Keypad = [bool; KEY_COUNT];

/// # Call Stack
/// Return addresses of the subroutines currently being executed.
/// Holds at most `STACK_DEPTH` addresses; `push` and `pop` report the boundary
/// instead of growing or panicking.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallStack {
    frames: [u16; STACK_DEPTH],
    len: usize,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            frames: [0; STACK_DEPTH],
            len: 0,
        }
    }

    /// Pushes a return address; returns false if the stack is already full.
    pub fn push(&mut self, address: u16) -> bool {
        if self.is_full() {
            return false;
        }
        self.frames[self.len] = address;
        self.len += 1;
        true
    }

    /// Pops the most recent return address, if any.
    pub fn pop(&mut self) -> Option<u16> {
        if self.is_empty() {
            return None;
        }
        self.len -= 1;
        Some(self.frames[self.len])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == STACK_DEPTH
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of the Chip-8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - VF doubles as the carry, borrow and collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter, starting at `PROGRAM_START`
///
/// Stack
/// - (stack) up to 16 return addresses
///
/// Timers
/// - 2 8-bit timers (delay & sound), decremented once per frame
///
/// ## Memory
/// - 4096 bytes of addressable memory
///     - 0x050..0x0A0 holds the font sprite sheet
///     - 0x200.. holds the program
/// - 64x32 frame buffer
///
/// ## Input
/// - (keypad) pressed status of keys 0..F, written between instructions
/// - (pending_key) key latched by FX0A that has to be released before it is stored
#[derive(Copy, Clone)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub stack: CallStack,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub keypad: Keypad,
    pub pending_key: Option<u8>,
}

impl State {
    /// An empty machine with the sprite sheet installed and no program.
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        let font = FONT_START as usize;
        memory[font..font + SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            stack: CallStack::new(),
            delay_timer: 0,
            sound_timer: 0,
            memory,
            frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            keypad: [false; KEY_COUNT],
            pending_key: None,
        }
    }

    /// A fresh machine with `program` copied to `PROGRAM_START`.
    pub fn with_program(program: &[u8]) -> Result<Self, LoadError> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(LoadError::ProgramTooLarge {
                size: program.len(),
                max_size: MAX_PROGRAM_SIZE,
            });
        }
        let mut state = State::new();
        let start = PROGRAM_START as usize;
        state.memory[start..start + program.len()].copy_from_slice(program);
        Ok(state)
    }

    /// Reads `len` bytes of memory starting at `address`.
    pub fn read(&self, address: usize, len: usize) -> Result<&[u8], ExecError> {
        let end = address + len;
        if end > MEMORY_SIZE {
            return Err(ExecError::MemoryOutOfBounds {
                address: end - 1,
            });
        }
        Ok(&self.memory[address..end])
    }

    /// Borrows `len` bytes of memory starting at `address` for writing.
    pub fn write(&mut self, address: usize, len: usize) -> Result<&mut [u8], ExecError> {
        let end = address + len;
        if end > MEMORY_SIZE {
            return Err(ExecError::MemoryOutOfBounds {
                address: end - 1,
            });
        }
        Ok(&mut self.memory[address..end])
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_font_and_pc() {
        let state = State::new();
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.memory[0x50..0x55], [0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(state.memory[0x9B..0xA0], [0xF0, 0x80, 0xF0, 0x80, 0x80]);
        assert!(state.memory[..0x50].iter().all(|&b| b == 0));
        assert!(state.memory[0xA0..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_with_program_copies_to_0x200() {
        let state = State::with_program(&[0x60, 0x05, 0x70, 0x03]).unwrap();
        assert_eq!(state.memory[0x200..0x204], [0x60, 0x05, 0x70, 0x03]);
        assert_eq!(state.memory[0x204], 0);
    }

    #[test]
    fn test_with_program_accepts_exact_capacity() {
        let program = vec![0xAA; MAX_PROGRAM_SIZE];
        let state = State::with_program(&program).unwrap();
        assert_eq!(state.memory[MEMORY_SIZE - 1], 0xAA);
    }

    #[test]
    fn test_with_program_rejects_oversized_image() {
        let program = vec![0; MAX_PROGRAM_SIZE + 1];
        match State::with_program(&program) {
            Err(LoadError::ProgramTooLarge { size, max_size }) => {
                assert_eq!(size, 3585);
                assert_eq!(max_size, 3584);
            }
            _ => panic!("expected ProgramTooLarge"),
        }
    }

    #[test]
    fn test_read_past_end_of_memory() {
        let state = State::new();
        assert!(state.read(0xFFE, 2).is_ok());
        assert_eq!(
            state.read(0xFFE, 3),
            Err(ExecError::MemoryOutOfBounds { address: 0x1000 })
        );
    }

    #[test]
    fn test_stack_is_bounded() {
        let mut stack = CallStack::new();
        for address in 0..STACK_DEPTH as u16 {
            assert!(stack.push(address));
        }
        assert!(stack.is_full());
        assert!(!stack.push(0xABC));
        assert_eq!(stack.len(), STACK_DEPTH);
        assert_eq!(stack.pop(), Some(15));
    }

    #[test]
    fn test_stack_pops_in_reverse_order() {
        let mut stack = CallStack::new();
        stack.push(0x202);
        stack.push(0x304);
        assert_eq!(stack.pop(), Some(0x304));
        assert_eq!(stack.pop(), Some(0x202));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }
}
