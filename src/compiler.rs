//! Compilation entry points

use crate::bytecode::compile_song;
use crate::error::Result;
use crate::module::Module;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Drives module decoding and song compilation, keeping the decoded
/// wavetable around for its separate output artifact.
#[derive(Debug, Default)]
pub struct Compiler {
    wavetable: Vec<u8>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile song `song_index` of the module read from `input`,
    /// writing the bytecode stream to `output`.
    pub fn compile<R: Read>(&mut self, mut input: R, output: &Path, song_index: usize) -> Result<()> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;

        let module = Module::parse(&data)?;
        let stream = compile_song(&module, song_index)?;
        self.wavetable = module.wavetable;

        let mut file = File::create(output)?;
        file.write_all(&stream)?;
        Ok(())
    }

    /// `compile` reading the module from a file.
    pub fn compile_file(&mut self, input: &Path, output: &Path, song_index: usize) -> Result<()> {
        let file = File::open(input)?;
        self.compile(file, output, song_index)
    }

    /// Write the wavetable blob gathered by the last compilation.
    pub fn write_wavetable(&self, output: &Path) -> Result<()> {
        let mut file = File::create(output)?;
        file.write_all(&self.wavetable)?;
        Ok(())
    }

    /// Wavetable gathered by the last compilation, 16 bytes per entry.
    pub fn wavetable(&self) -> &[u8] {
        &self.wavetable
    }
}
