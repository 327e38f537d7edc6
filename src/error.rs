use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not a Trackerboy module: bad signature")]
    BadSignature,

    #[error("Malformed module footer")]
    BadFooter,

    #[error("Unexpected chunk tag: {}", format_tag(.0))]
    UnknownChunk([u8; 4]),

    #[error("Unknown effect code {code:#04x} in pattern {slot} of channel {channel}")]
    UnknownEffect { code: u8, channel: usize, slot: u8 },

    #[error("Pattern declares channel {0}")]
    BadChannel(u8),

    #[error("Waveform declares slot {0}")]
    BadWaveSlot(u8),

    #[error("Unexpected end of data while reading {0}")]
    Truncated(&'static str),

    #[error("Pattern slot {slot} of channel {channel} registered twice")]
    DuplicatePattern { channel: usize, slot: u8 },

    #[error("Module has no song {0}")]
    NoSuchSong(usize),

    #[error("Wave slot {0} referenced but never defined")]
    UnassignedWaveform(u8),

    #[error("Jump targets section {section}, which is never emitted")]
    BadJumpTarget { section: usize },

    #[error("Jump offset {0} does not fit in 16 bits")]
    JumpTooFar(i64),

    #[error("Channel {channel} event emitted {actual} bytes, declared {expected}")]
    SizeMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown bytecode opcode {0:#04x}")]
    BadOpcode(u8),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn format_tag(tag: &[u8; 4]) -> String {
    let hex: Vec<String> = tag.iter().map(|b| format!("{:02x}", b)).collect();
    hex.join(" ")
}

pub type Result<T> = std::result::Result<T, Error>;
