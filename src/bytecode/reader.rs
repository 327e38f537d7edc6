//! Compiled stream parser
//!
//! Decodes a Yeller bytecode stream back into instructions, for
//! diagnostics and for verifying emitter output in tests.

use super::opcode::op;
use crate::error::{Error, Result};
use serde::Serialize;

/// A decoded Yeller instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Wait before fetching the next instruction.
    Delay { frames: u8 },
    /// Relative branch over the compiled stream.
    Jump { offset: i16, delay: u8 },
    Pulse1Note { duty: u8, period: u16, envelope: u8 },
    Pulse2Note { duty: u8, period: u16, envelope: u8 },
    /// `waveform` is the sequential wavetable index, undone from the
    /// nibble-swapped register form.
    WaveNote { waveform: u8, period: u16, volume: u8 },
    NoiseNote { envelope: u8, control: u8 },
    Pulse1Cut,
    Pulse2Cut,
    WaveCut,
    NoiseCut,
}

/// Bytecode stream reader.
pub struct StreamReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StreamReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(Error::Truncated("bytecode stream"));
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_i16_le(&mut self) -> Result<i16> {
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(i16::from_le_bytes([lo, hi]))
    }

    /// Decode the instruction at the current position.
    pub fn read_instruction(&mut self) -> Result<Instruction> {
        let byte = self.read_u8()?;
        if byte & 1 != 0 {
            return Ok(Instruction::Delay { frames: byte >> 1 });
        }

        match byte {
            op::JUMP => {
                let offset = self.read_i16_le()?;
                let delay = self.read_u8()?;
                Ok(Instruction::Jump { offset, delay })
            }
            op::NOTE_PULSE1 | op::NOTE_PULSE2 => {
                let duty_period = self.read_u8()?;
                let envelope = self.read_u8()?;
                let low = self.read_u8()?;
                let duty = duty_period >> 6;
                let period = (u16::from(duty_period & 0x07) << 8) | u16::from(low);
                if byte == op::NOTE_PULSE1 {
                    Ok(Instruction::Pulse1Note {
                        duty,
                        period,
                        envelope,
                    })
                } else {
                    Ok(Instruction::Pulse2Note {
                        duty,
                        period,
                        envelope,
                    })
                }
            }
            op::NOTE_WAVE => {
                let waveform = self.read_u8()?;
                let low = self.read_u8()?;
                let volume_period = self.read_u8()?;
                Ok(Instruction::WaveNote {
                    waveform: waveform.rotate_left(4),
                    period: (u16::from(volume_period & 0x07) << 8) | u16::from(low),
                    volume: (volume_period >> 5) & 0x03,
                })
            }
            op::NOTE_NOISE => {
                let envelope = self.read_u8()?;
                let control = self.read_u8()?;
                Ok(Instruction::NoiseNote { envelope, control })
            }
            op::CUT_PULSE1 => Ok(Instruction::Pulse1Cut),
            op::CUT_PULSE2 => Ok(Instruction::Pulse2Cut),
            op::CUT_WAVE => Ok(Instruction::WaveCut),
            op::CUT_NOISE => Ok(Instruction::NoiseCut),
            _ => Err(Error::BadOpcode(byte)),
        }
    }

    /// Decode an entire stream.
    pub fn parse(data: &[u8]) -> Result<Vec<Instruction>> {
        let mut reader = StreamReader::new(data);
        let mut instructions = Vec::new();
        while !reader.is_eof() {
            instructions.push(reader.read_instruction()?);
        }
        Ok(instructions)
    }
}
