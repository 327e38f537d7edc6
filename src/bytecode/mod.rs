pub mod emitter;
pub mod opcode;
pub mod reader;

pub use emitter::compile_song;
pub use reader::{Instruction, StreamReader};
