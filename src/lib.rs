pub mod bytecode;
pub mod compiler;
pub mod error;
pub mod module;

pub use compiler::Compiler;
pub use error::Error;
