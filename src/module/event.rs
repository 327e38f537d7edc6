//! Timed channel events and their emission contracts

use super::WAVE_SLOTS;
use crate::bytecode::opcode::{op, JUMP_SIZE};
use crate::error::{Error, Result};

/// Note value that cuts the current note instead of retriggering.
pub const NOTE_CUT: u8 = 0x55;

/// Persistent per-channel state consumed by note emission.
///
/// `envelope` doubles as the wave slot id on the wave channel, and
/// `duty` as its volume level.
#[derive(Debug, Clone, Copy)]
pub struct EffectState {
    pub envelope: u8,
    pub duty: u8,
}

impl Default for EffectState {
    fn default() -> Self {
        Self {
            envelope: 0xF0,
            duty: 0x01,
        }
    }
}

/// Which `EffectState` field a parameter event updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTarget {
    Envelope,
    Duty,
}

/// A single timed action on one channel.
///
/// `time` is a row index; jump events sit one row past the row that
/// carried the effect, so it can reach 256.
#[derive(Debug, Clone)]
pub enum Event {
    /// Trigger a note, or cut the current one for `NOTE_CUT`.
    Note { time: u16, note: u8 },
    /// Branch to the start of a section.
    Jump { time: u16, section: u8 },
    /// Update persistent effect state; emits no bytes itself.
    Parameter {
        time: u16,
        target: EffectTarget,
        value: u8,
    },
}

/// A jump emitted before its target section start was known; the
/// emitter patches the offset operand at `position + 1` once the
/// section table is complete.
#[derive(Debug, Clone, Copy)]
pub struct JumpFixup {
    /// Offset of the jump opcode in the output buffer.
    pub position: usize,
    pub section: usize,
}

/// Everything emission needs besides the event itself.
pub struct EmitContext<'a> {
    pub channel: usize,
    pub state: &'a mut EffectState,
    pub waveforms: &'a [Option<u8>; WAVE_SLOTS],
    /// Output length before this event's bytes.
    pub position: usize,
    /// Output offsets of the sections emitted so far.
    pub section_starts: &'a [usize],
    pub fixups: &'a mut Vec<JumpFixup>,
}

impl Event {
    pub fn time(&self) -> u16 {
        match self {
            Event::Note { time, .. } | Event::Jump { time, .. } | Event::Parameter { time, .. } => {
                *time
            }
        }
    }

    /// Exact number of bytes `emit` produces on `channel`.
    pub fn size(&self, channel: usize) -> usize {
        match self {
            Event::Note { note, .. } if *note == NOTE_CUT => 1,
            Event::Note { .. } => {
                if channel == 3 {
                    3
                } else {
                    4
                }
            }
            Event::Jump { .. } => JUMP_SIZE,
            Event::Parameter { .. } => 0,
        }
    }

    pub fn emit(&self, ctx: &mut EmitContext) -> Result<Vec<u8>> {
        match self {
            Event::Note { note, .. } => emit_note(*note, ctx),
            Event::Jump { section, .. } => emit_jump(*section as usize, ctx),
            Event::Parameter { target, value, .. } => {
                match target {
                    EffectTarget::Envelope => ctx.state.envelope = *value,
                    EffectTarget::Duty => ctx.state.duty = *value,
                }
                Ok(Vec::new())
            }
        }
    }
}

/// Hardware period for a semitone on the pulse and wave channels.
fn tone_period(note: u8) -> u16 {
    let freq = 440.0 * f64::powf(2.0, (f64::from(note) - 34.0) / 12.0);
    (2048 - (131072.0 / freq).floor() as i32) as u16
}

fn emit_note(note: u8, ctx: &mut EmitContext) -> Result<Vec<u8>> {
    if note == NOTE_CUT {
        let opcode = match ctx.channel {
            0 => op::CUT_PULSE1,
            1 => op::CUT_PULSE2,
            2 => op::CUT_WAVE,
            _ => op::CUT_NOISE,
        };
        return Ok(vec![opcode]);
    }

    match ctx.channel {
        0 | 1 => {
            let period = tone_period(note);
            let duty_period = (ctx.state.duty << 6) | (period >> 8) as u8;
            let opcode = if ctx.channel == 0 {
                op::NOTE_PULSE1
            } else {
                op::NOTE_PULSE2
            };
            Ok(vec![
                opcode,
                duty_period,
                ctx.state.envelope,
                (period & 0xFF) as u8,
            ])
        }
        2 => {
            let period = tone_period(note);
            // The envelope field names a wave slot here.
            let index = ctx
                .waveforms
                .get(ctx.state.envelope as usize)
                .copied()
                .flatten()
                .ok_or(Error::UnassignedWaveform(ctx.state.envelope))?;
            let volume = if ctx.state.duty == 0 {
                0
            } else {
                4u8.wrapping_sub(ctx.state.duty)
            };
            let volume_period = 0x80 | (volume << 5) | (period >> 8) as u8;
            Ok(vec![
                op::NOTE_WAVE,
                index.rotate_left(4),
                (period & 0xFF) as u8,
                volume_period,
            ])
        }
        _ => {
            // Noise notes address the polynomial counter, not a period.
            let n = i32::from(note);
            let mut exponent = 14 - (n + 3) / 4;
            let mut divisor = 7 - (n + 3) % 4;
            if n >= 61 {
                exponent = 0;
                divisor = 0;
            } else if n >= 57 {
                exponent = 0;
                divisor -= 4;
            }
            let control = ((exponent << 4) + (i32::from(ctx.state.duty) << 3) + divisor) as u8;
            Ok(vec![op::NOTE_NOISE, ctx.state.envelope, control])
        }
    }
}

fn emit_jump(section: usize, ctx: &mut EmitContext) -> Result<Vec<u8>> {
    let offset = match ctx.section_starts.get(section) {
        Some(&start) => relative_offset(start, ctx.position)?,
        None => {
            // Target section not emitted yet; leave a placeholder for
            // the emitter to patch once its start offset is known.
            ctx.fixups.push(JumpFixup {
                position: ctx.position,
                section,
            });
            0
        }
    };
    let mut bytes = vec![op::JUMP];
    bytes.extend_from_slice(&offset.to_le_bytes());
    // TODO: derive the jump delay operand from the target section's first event.
    bytes.push(0);
    Ok(bytes)
}

/// Branch displacement from the byte after a jump at `position` to `target`.
pub(crate) fn relative_offset(target: usize, position: usize) -> Result<i16> {
    let offset = target as i64 - (position as i64 + JUMP_SIZE as i64);
    i16::try_from(offset).map_err(|_| Error::JumpTooFar(offset))
}
