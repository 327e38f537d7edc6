//! Yeller bytecode opcodes and delay encoding
//!
//! Every opcode is even; an odd byte is a delay marker holding
//! `frames * 2 + 1`, so the player can tell the two apart from the low
//! bit alone.

/// Instruction opcodes.
pub mod op {
    /// Relative branch; i16 LE offset and a delay operand follow.
    pub const JUMP: u8 = 0x04;
    pub const NOTE_PULSE1: u8 = 0x08;
    pub const NOTE_PULSE2: u8 = 0x0A;
    pub const NOTE_WAVE: u8 = 0x0C;
    pub const NOTE_NOISE: u8 = 0x0E;
    pub const CUT_PULSE1: u8 = 0x10;
    pub const CUT_PULSE2: u8 = 0x12;
    pub const CUT_WAVE: u8 = 0x14;
    pub const CUT_NOISE: u8 = 0x16;
}

/// Total byte length of a jump instruction.
pub const JUMP_SIZE: usize = 4;

/// Longest delay a single marker byte can carry.
pub const MAX_DELAY_FRAMES: u32 = 127;

/// Encode a frame delay as one or more chained odd marker bytes.
pub fn encode_delay(mut frames: u32) -> Vec<u8> {
    let mut out = Vec::new();
    while frames > 0 {
        let chunk = frames.min(MAX_DELAY_FRAMES);
        out.push((chunk * 2 + 1) as u8);
        frames -= chunk;
    }
    out
}
