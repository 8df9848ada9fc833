pub use chip8::Chip8;
pub use config::{Config, Quirks, StackPolicy};
pub use error::{ConfigError, ExecError, LoadError};
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use operations::{execute, Context, Step};
pub use scheduler::{FrameReport, Scheduler, Screen, Speaker};

mod chip8;
mod config;
pub mod constants;
mod error;
mod instruction;
mod opcode;
mod operations;
mod scheduler;
pub mod state;
