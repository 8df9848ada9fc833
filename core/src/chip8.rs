use std::io::Read;

use log::{debug, info, warn};

use crate::config::Config;
use crate::constants::{KEY_COUNT, MEMORY_SIZE};
use crate::error::{ExecError, LoadError};
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::operations::{execute, Context};
use crate::state::{FrameBuffer, State};

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - the `config` (speed, quirks and stack policy) it was loaded with
///
/// Supplies interfaces for:
/// - loading and restarting programs
/// - pressing and releasing keys
/// - advancing the CPU by a single instruction
/// - advancing its timers
/// - inspecting its frame buffer and sound timer for some display and speaker
pub struct Chip8 {
    state: State,
    config: Config,
}

impl Chip8 {
    /// A machine with no program loaded.
    pub fn new(config: Config) -> Self {
        Chip8 {
            state: State::new(),
            config,
        }
    }

    /// Replaces the program and configuration, resetting all state.
    ///
    /// On error the machine is left exactly as it was.
    pub fn load(&mut self, program: &[u8], config: Config) -> Result<(), LoadError> {
        config.validate()?;
        self.state = State::with_program(program)?;
        self.config = config;
        info!(
            "loaded {} byte program at {} instructions per second with {:?}",
            program.len(),
            config.ips,
            config.quirks
        );
        Ok(())
    }

    /// Load a program from some source of bytes
    ///
    /// # Arguments
    /// * `reader` a reader that yields a raw program image, e.g. a ROM file
    /// * `config` how the program should be run
    pub fn load_rom(&mut self, reader: &mut dyn Read, config: Config) -> Result<(), LoadError> {
        let mut program = Vec::new();
        reader.read_to_end(&mut program)?;
        self.load(&program, config)
    }

    /// Restarts the machine with `program`, keeping the current configuration.
    pub fn reset(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.state = State::with_program(program)?;
        info!("reset with {} byte program", program.len());
        Ok(())
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Whether the speaker should currently be sounding
    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was pressed
    pub fn key_press(&mut self, key: u8) {
        self.set_key(key, true);
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was released
    pub fn key_release(&mut self, key: u8) {
        self.set_key(key, false);
    }

    fn set_key(&mut self, key: u8, down: bool) {
        match self.state.keypad.get_mut(key as usize) {
            Some(slot) => *slot = down,
            None => warn!("ignoring key {:#X}, the keypad has {} keys", key, KEY_COUNT),
        }
    }

    /// Gets the opcode currently pointed at by the pc.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    pub fn fetch(&self) -> Result<Opcode, ExecError> {
        let pc = self.state.pc;
        let address = pc as usize;
        if address + 1 >= MEMORY_SIZE {
            return Err(ExecError::FetchOutOfBounds { pc });
        }
        Ok(Opcode::from_bytes(
            self.state.memory[address],
            self.state.memory[address + 1],
        ))
    }

    /// Advances the CPU by a single instruction
    /// - fetches the opcode at the pc and moves the pc past it
    /// - decodes and executes it
    /// - moves the pc back if the instruction asked to be retried
    ///
    /// `cycle` is the number of instructions already executed in the current frame.
    /// Returns whether the instruction was retried. On error the state is unchanged.
    pub fn advance_cpu(&mut self, cycle: u32) -> Result<bool, ExecError> {
        let op = self.fetch()?;
        let pc = self.state.pc;
        let instruction = Instruction::decode(op);
        debug!("{:04X} {} v{:02X?} i{:04X}", pc, instruction, self.state.v, self.state.i);

        let mut fetched = self.state;
        fetched.pc = pc.wrapping_add(0x2);
        let context = Context {
            quirks: self.config.quirks,
            stack_policy: self.config.stack_policy,
            cycle,
        };
        let step = execute(instruction, &fetched, &context)?;
        let retry = step.is_retry();
        self.state = step.into_state();
        if retry {
            self.state.pc = pc;
        }
        Ok(retry)
    }

    /// Decrements both timers by one, stopping at zero
    pub fn advance_timers(&mut self) {
        self.state.delay_timer = self.state.delay_timer.saturating_sub(1);
        self.state.sound_timer = self.state.sound_timer.saturating_sub(1);
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Quirks;

    fn loaded(program: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::default();
        chip8.load(program, Config::default()).unwrap();
        chip8
    }

    #[test]
    fn test_chip8_fetches_big_endian() {
        let chip8 = loaded(&[0xAA, 0xBB]);
        assert_eq!(chip8.fetch(), Ok(Opcode(0xAABB)));
    }

    #[test]
    fn test_fetch_past_end_of_memory_is_an_error() {
        let mut chip8 = loaded(&[0x1F, 0xFF]);
        chip8.advance_cpu(0).unwrap();
        assert_eq!(chip8.state().pc, 0xFFF);
        assert_eq!(
            chip8.advance_cpu(1),
            Err(ExecError::FetchOutOfBounds { pc: 0xFFF })
        );
        assert_eq!(chip8.state().pc, 0xFFF);
    }

    #[test]
    fn test_store_past_end_of_memory_leaves_state_untouched() {
        // V3 = 7; I = FFE; store V0..=V3
        let mut chip8 = loaded(&[0x63, 0x07, 0xAF, 0xFE, 0xF3, 0x55]);
        chip8.advance_cpu(0).unwrap();
        chip8.advance_cpu(1).unwrap();
        assert_eq!(
            chip8.advance_cpu(2),
            Err(ExecError::MemoryOutOfBounds { address: 0x1001 })
        );
        assert_eq!(chip8.state().i, 0xFFE);
        assert_eq!(chip8.state().pc, 0x204);
        assert_eq!(chip8.state().memory[0xFFE..], [0x0, 0x0]);
    }

    #[test]
    fn test_advance_moves_pc_past_instruction() {
        // insert a cls opcode so we execute something meaningful
        let mut chip8 = loaded(&[0x00, 0xE0]);
        assert_eq!(chip8.advance_cpu(0), Ok(false));
        assert_eq!(chip8.state().pc, 0x202);
    }

    #[test]
    fn test_retry_rewinds_pc() {
        let mut chip8 = loaded(&[0xF1, 0x0A]);
        assert_eq!(chip8.advance_cpu(0), Ok(true));
        assert_eq!(chip8.state().pc, 0x200);
    }

    #[test]
    fn test_key_wait_commits_after_release() {
        let mut chip8 = loaded(&[0xF1, 0x0A]);
        chip8.key_press(0xE);
        assert_eq!(chip8.advance_cpu(0), Ok(true));
        assert_eq!(chip8.advance_cpu(1), Ok(true));
        chip8.key_release(0xE);
        assert_eq!(chip8.advance_cpu(2), Ok(false));
        assert_eq!(chip8.state().v[0x1], 0xE);
        assert_eq!(chip8.state().pc, 0x202);
    }

    #[test]
    fn test_out_of_range_keys_are_ignored() {
        let mut chip8 = Chip8::default();
        chip8.key_press(0x10);
        assert!(chip8.state().keypad.iter().all(|&down| !down));
    }

    #[test]
    fn test_timers_stop_at_zero() {
        let mut chip8 = loaded(&[0x60, 0x02, 0xF0, 0x15, 0xF0, 0x18]);
        for cycle in 0..3 {
            chip8.advance_cpu(cycle).unwrap();
        }
        assert!(chip8.sound_active());
        chip8.advance_timers();
        assert_eq!(chip8.state().delay_timer, 1);
        chip8.advance_timers();
        chip8.advance_timers();
        assert_eq!(chip8.state().delay_timer, 0);
        assert_eq!(chip8.state().sound_timer, 0);
        assert!(!chip8.sound_active());
    }

    #[test]
    fn test_load_too_large_leaves_machine_untouched() {
        let mut chip8 = loaded(&[0x60, 0x05]);
        chip8.advance_cpu(0).unwrap();
        let result = chip8.load(&[0; 3585], Config::default());
        assert!(matches!(result, Err(LoadError::ProgramTooLarge { .. })));
        assert_eq!(chip8.state().v[0x0], 0x05);
        assert_eq!(chip8.state().pc, 0x202);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let mut chip8 = Chip8::default();
        let config = Config {
            ips: 10,
            ..Config::default()
        };
        let result = chip8.load(&[0x00, 0xE0], config);
        assert!(matches!(result, Err(LoadError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_rom_reads_whole_source() {
        let mut chip8 = Chip8::default();
        let mut rom: &[u8] = &[0x12, 0x00];
        chip8.load_rom(&mut rom, Config::default()).unwrap();
        assert_eq!(chip8.fetch(), Ok(Opcode(0x1200)));
    }

    #[test]
    fn test_reset_keeps_config_and_clears_state() {
        let config = Config {
            quirks: Quirks {
                wrapping: true,
                ..Quirks::default()
            },
            ..Config::default()
        };
        let mut chip8 = Chip8::default();
        chip8.load(&[0x60, 0x05, 0x22, 0x00], config).unwrap();
        chip8.key_press(0x1);
        chip8.advance_cpu(0).unwrap();
        chip8.advance_cpu(1).unwrap();

        chip8.reset(&[0x00, 0xE0]).unwrap();
        assert_eq!(chip8.state().pc, 0x200);
        assert_eq!(chip8.state().v, [0; 16]);
        assert!(chip8.state().stack.is_empty());
        assert!(!chip8.state().keypad[0x1]);
        assert_eq!(chip8.state().memory[0x202], 0x00);
        assert!(chip8.config().quirks.wrapping);
    }
}
