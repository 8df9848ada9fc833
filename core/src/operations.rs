use log::{debug, warn};

use crate::config::{Quirks, StackPolicy};
use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_GLYPH_HEIGHT, FONT_START};
use crate::error::ExecError;
use crate::instruction::Instruction;
use crate::state::State;

/// Everything besides the machine state that an instruction may depend on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    pub quirks: Quirks,
    pub stack_policy: StackPolicy,
    /// Number of instructions already executed in the current frame
    pub cycle: u32,
}

/// The result of executing a single instruction.
///
/// Instructions are executed after the program counter has been advanced past them.
/// `Retry` asks the caller to rewind the program counter so the same instruction
/// runs again on the next cycle; it is how DXYN waits for vblank and FX0A waits for a key.
pub enum Step {
    Completed(State),
    Retry(State),
}

impl Step {
    pub fn into_state(self) -> State {
        match self {
            Step::Completed(state) | Step::Retry(state) => state,
        }
    }

    pub fn is_retry(&self) -> bool {
        matches!(self, Step::Retry(_))
    }
}

/// Executes `instruction` against `state`, returning the next state.
pub fn execute(
    instruction: Instruction,
    state: &State,
    context: &Context,
) -> Result<Step, ExecError> {
    use Instruction::*;

    let quirks = &context.quirks;
    let next = match instruction {
        Clear => cls(state),
        Return => return rts(state, context.stack_policy),
        Jump(nnn) => jump(nnn, state),
        Call(nnn) => return call(nnn, state, context.stack_policy),
        SkipEqImm { x, nn } => skip_if(state, state.v[x] == nn),
        SkipNeImm { x, nn } => skip_if(state, state.v[x] != nn),
        SkipEqReg { x, y } => skip_if(state, state.v[x] == state.v[y]),
        SkipNeReg { x, y } => skip_if(state, state.v[x] != state.v[y]),
        LoadImm { x, nn } => with_register(state, x, nn),
        AddImm { x, nn } => with_register(state, x, state.v[x].wrapping_add(nn)),
        Move { x, y } => with_register(state, x, state.v[y]),
        Or { x, y } => logic(x, y, state, quirks, |a, b| a | b),
        And { x, y } => logic(x, y, state, quirks, |a, b| a & b),
        Xor { x, y } => logic(x, y, state, quirks, |a, b| a ^ b),
        AddReg { x, y } => add(x, y, state),
        Sub { x, y } => sub(x, x, y, state),
        SubReverse { x, y } => sub(x, y, x, state),
        ShiftRight { x, y } => shr(x, y, state),
        ShiftLeft { x, y } => shl(x, y, state),
        LoadIndex(nnn) => State {
            i: nnn,
            ..*state
        },
        JumpOffset(nnn) => jump(nnn + u16::from(state.v[0x0]), state),
        Random { x, nn } => with_register(state, x, rand::random::<u8>() & nn),
        Draw { x, y, n } => return draw(x, y, n, state, context),
        SkipKeyDown { x } => skip_if(state, state.keypad[key_index(state.v[x])]),
        SkipKeyUp { x } => skip_if(state, !state.keypad[key_index(state.v[x])]),
        ReadDelay { x } => with_register(state, x, state.delay_timer),
        WaitKey { x } => return Ok(wait_key(x, state)),
        SetDelay { x } => State {
            delay_timer: state.v[x],
            ..*state
        },
        SetSound { x } => State {
            sound_timer: state.v[x],
            ..*state
        },
        AddIndex { x } => add_index(x, state),
        LoadFont { x } => State {
            i: FONT_START + FONT_GLYPH_HEIGHT * u16::from(state.v[x] & 0xF),
            ..*state
        },
        Bcd { x } => bcd(x, state)?,
        Store { x } => store(x, state)?,
        Load { x } => load(x, state)?,
        Unknown(op) => {
            debug!("ignoring unknown opcode {} at {:#05X}", op, state.pc.wrapping_sub(2));
            *state
        }
    };
    Ok(Step::Completed(next))
}

/// Maps the value of a register onto the keypad.
fn key_index(value: u8) -> usize {
    usize::from(value & 0xF)
}

fn with_register(state: &State, x: usize, value: u8) -> State {
    let mut v = state.v;
    v[x] = value;
    State { v, ..*state }
}

/// Skips the next instruction when `condition` holds
fn skip_if(state: &State, condition: bool) -> State {
    if condition {
        State {
            pc: state.pc.wrapping_add(0x2),
            ..*state
        }
    } else {
        *state
    }
}

/// clear
fn cls(state: &State) -> State {
    State {
        frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        ..*state
    }
}

/// PC = STACK.pop()
fn rts(state: &State, policy: StackPolicy) -> Result<Step, ExecError> {
    let mut stack = state.stack;
    match stack.pop() {
        Some(pc) => Ok(Step::Completed(State { pc, stack, ..*state })),
        None => match policy {
            StackPolicy::Strict => Err(ExecError::StackUnderflow),
            StackPolicy::Lenient => {
                warn!("return with an empty call stack at {:#05X}", state.pc.wrapping_sub(2));
                Ok(Step::Completed(*state))
            }
        },
    }
}

/// PC = nnn
fn jump(nnn: u16, state: &State) -> State {
    State { pc: nnn, ..*state }
}

/// STACK.push(PC); PC = nnn
fn call(nnn: u16, state: &State, policy: StackPolicy) -> Result<Step, ExecError> {
    let mut stack = state.stack;
    if stack.push(state.pc) {
        return Ok(Step::Completed(State {
            pc: nnn,
            stack,
            ..*state
        }));
    }
    match policy {
        StackPolicy::Strict => Err(ExecError::StackOverflow { target: nnn }),
        StackPolicy::Lenient => {
            warn!("call to {:#05X} with a full call stack", nnn);
            Ok(Step::Completed(*state))
        }
    }
}

/// Vx = Vx op Vy; VF = 0 under the logic quirk
fn logic(x: usize, y: usize, state: &State, quirks: &Quirks, op: fn(u8, u8) -> u8) -> State {
    let mut v = state.v;
    v[x] = op(v[x], v[y]);
    if quirks.logic {
        v[0xF] = 0x0;
    }
    State { v, ..*state }
}

/// Vx += Vy; VF = overflow
fn add(x: usize, y: usize, state: &State) -> State {
    let (res, over) = state.v[x].overflowing_add(state.v[y]);
    let mut v = state.v;
    v[x] = res;
    v[0xF] = over as u8;
    State { v, ..*state }
}

/// Vx = Va - Vb; VF = !borrow
fn sub(x: usize, a: usize, b: usize, state: &State) -> State {
    let (res, borrow) = state.v[a].overflowing_sub(state.v[b]);
    let mut v = state.v;
    v[x] = res;
    v[0xF] = !borrow as u8;
    State { v, ..*state }
}

/// Vx = Vy >> 1; VF = shifted out bit
fn shr(x: usize, y: usize, state: &State) -> State {
    let mut v = state.v;
    v[x] = v[y];
    let bit = v[x] & 0x1;
    v[x] >>= 1;
    v[0xF] = bit;
    State { v, ..*state }
}

/// Vx = Vy << 1; VF = shifted out bit
fn shl(x: usize, y: usize, state: &State) -> State {
    let mut v = state.v;
    v[x] = v[y];
    let bit = (v[x] & 0x80) >> 7;
    v[x] <<= 1;
    v[0xF] = bit;
    State { v, ..*state }
}

/// I += Vx; VF = 1 if I leaves the address space
fn add_index(x: usize, state: &State) -> State {
    let i = state.i.wrapping_add(u16::from(state.v[x]));
    let mut v = state.v;
    if i >= 0x1000 {
        v[0xF] = 0x1;
    }
    State { i, v, ..*state }
}

/// mem[I..I+3] = bcd(Vx)
fn bcd(x: usize, state: &State) -> Result<State, ExecError> {
    let value = state.v[x];
    let mut next = *state;
    let digits = next.write(state.i as usize, 3)?;
    digits.copy_from_slice(&[value / 100, value / 10 % 10, value % 10]);
    Ok(next)
}

/// mem[I..=I+x] = V0..=Vx; I += x + 1
fn store(x: usize, state: &State) -> Result<State, ExecError> {
    let mut next = *state;
    let window = next.write(state.i as usize, x + 1)?;
    window.copy_from_slice(&state.v[..=x]);
    next.i = state.i.wrapping_add(x as u16 + 1);
    Ok(next)
}

/// V0..=Vx = mem[I..=I+x]; I += x + 1
fn load(x: usize, state: &State) -> Result<State, ExecError> {
    let mut v = state.v;
    v[..=x].copy_from_slice(state.read(state.i as usize, x + 1)?);
    Ok(State {
        v,
        i: state.i.wrapping_add(x as u16 + 1),
        ..*state
    })
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs an n-row sprite from memory at I onto the FrameBuffer at (Vx, Vy).
/// Sets VF if any pixel is erased.
///
/// Pixels past the right or bottom edge wrap around under the wrapping quirk and are
/// clipped otherwise. Under the display wait quirk a sprite is only drawn as the first
/// instruction of a frame.
fn draw(x: usize, y: usize, n: u8, state: &State, context: &Context) -> Result<Step, ExecError> {
    if context.quirks.display_wait && context.cycle != 0 {
        return Ok(Step::Retry(*state));
    }
    let wrapping = context.quirks.wrapping;
    let sprite = state.read(state.i as usize, usize::from(n))?;

    let origin_x = usize::from(state.v[x]) % DISPLAY_WIDTH;
    let mut py = usize::from(state.v[y]) % DISPLAY_HEIGHT;
    let mut v = state.v;
    let mut frame_buffer = state.frame_buffer;
    v[0xF] = 0x0;

    for &row in sprite {
        let mut px = origin_x;
        for bit in 0..8 {
            if (row >> (7 - bit)) & 0x1 == 0x1 {
                if !wrapping && px >= DISPLAY_WIDTH {
                    break;
                }
                if frame_buffer[py][px] {
                    v[0xF] = 0x1;
                }
                frame_buffer[py][px] ^= true;
            }
            px += 1;
            if wrapping {
                px %= DISPLAY_WIDTH;
            }
        }
        py += 1;
        if wrapping {
            py %= DISPLAY_HEIGHT;
        } else if py >= DISPLAY_HEIGHT {
            break;
        }
    }

    Ok(Step::Completed(State {
        v,
        frame_buffer,
        ..*state
    }))
}

/// Vx = K
/// Completes only once a key that was seen held down has been released.
fn wait_key(x: usize, state: &State) -> Step {
    let held = state.keypad.iter().position(|&down| down);
    let mut next = *state;
    let released = match state.pending_key {
        Some(key) if !state.keypad[key_index(key)] => Some(key),
        _ => None,
    };
    if let Some(key) = released {
        next.v[x] = key;
        next.pending_key = None;
    }
    if let Some(key) = held {
        next.pending_key = Some(key as u8);
    }

    match released {
        Some(_) => Step::Completed(next),
        None => Step::Retry(next),
    }
}
