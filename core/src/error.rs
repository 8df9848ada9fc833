use thiserror::Error;

use crate::constants::FRAMES_PER_SECOND;

/// Errors surfaced while loading a program image. The machine is left untouched.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("program is too large ({size} bytes), at most {max_size} bytes fit in memory")]
    ProgramTooLarge { size: usize, max_size: usize },

    #[error("unable to read program: {0}")]
    RomUnreadable(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Fatal errors raised while executing instructions.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ExecError {
    #[error("instruction fetch out of bounds at pc {pc:#06X}")]
    FetchOutOfBounds { pc: u16 },

    #[error("memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("stack overflow: call to {target:#05X} with a full call stack")]
    StackOverflow { target: u16 },

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,
}

/// Errors surfaced while validating a configuration.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ConfigError {
    #[error("instructions per second must be at least {}, got {0}", FRAMES_PER_SECOND)]
    IpsTooLow(u32),
}
