//! Chunked module container decoder

use super::event::{EffectTarget, Event};
use super::{Module, Pattern, Song, NUM_CHANNELS, WAVEFORM_SIZE, WAVE_SLOTS};
use crate::error::{Error, Result};

/// Container signature at offset 0.
const SIGNATURE: &[u8; 12] = b"\0TRACKERBOY\0";

/// Chunk tag that introduces the footer instead of a payload.
const FOOTER_TAG: &[u8; 4] = b"\0YOB";

/// Trailer that must follow the footer tag.
const FOOTER_TRAILER: &[u8; 8] = b"REKCART\0";

/// Upper bound on top-level chunks scanned.
const MAX_CHUNKS: usize = 100;

/// Cursor over raw module bytes.
pub struct ModuleReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ModuleReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(Error::Truncated("module"));
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        let lo = self.read_u8()? as u16;
        let hi = self.read_u8()? as u16;
        Ok(lo | (hi << 8))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        let lo = self.read_u16_le()? as u32;
        let hi = self.read_u16_le()? as u32;
        Ok(lo | (hi << 16))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(Error::Truncated("module"));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Read a fixed-width text field, trimming trailing NUL padding.
    pub fn read_text(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        let end = bytes
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    fn read_tag(&mut self) -> Result<[u8; 4]> {
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// Decode a full module container.
pub fn parse_module(data: &[u8]) -> Result<Module> {
    let mut r = ModuleReader::new(data);

    if r.read_bytes(SIGNATURE.len())? != &SIGNATURE[..] {
        return Err(Error::BadSignature);
    }
    r.skip(16)?; // reserved

    let title = r.read_text(32)?;
    let author = r.read_text(32)?;
    let copyright = r.read_text(32)?;
    r.skip(36)?; // reserved

    let mut module = Module::new(title, author, copyright);
    let mut next_waveform_index: u8 = 0;

    for _ in 0..MAX_CHUNKS {
        let tag = r.read_tag()?;
        if &tag == FOOTER_TAG {
            if r.read_bytes(FOOTER_TRAILER.len())? != &FOOTER_TRAILER[..] {
                return Err(Error::BadFooter);
            }
            break;
        }

        let length = r.read_u32_le()? as usize;
        match &tag {
            b"COMM" | b"INST" => r.skip(length)?,
            b"SONG" => {
                let song = parse_song(&mut r)?;
                module.songs.push(song);
            }
            b"WAVE" => parse_wave(&mut r, &mut module, &mut next_waveform_index)?,
            _ => return Err(Error::UnknownChunk(tag)),
        }
    }

    Ok(module)
}

fn parse_song(r: &mut ModuleReader) -> Result<Song> {
    let title_len = r.read_u16_le()? as usize;
    let title = r.read_text(title_len)?;

    let rows_per_beat = r.read_u8()?;
    let rows_per_measure = r.read_u8()?;
    let speed = r.read_u8()?;
    let num_segments = r.read_u8()? as usize + 1;
    let rows_per_segment = r.read_u8()? as u16 + 1;
    let num_patterns = r.read_u8()? as usize;
    r.skip(2)?; // reserved

    let mut song = Song::new(title, rows_per_beat, rows_per_measure, speed, rows_per_segment);

    for _ in 0..num_segments {
        let mut section = [0u8; NUM_CHANNELS];
        for slot in &mut section {
            *slot = r.read_u8()?;
        }
        song.add_section(section);
    }

    for _ in 0..num_patterns {
        let channel = r.read_u8()?;
        if channel as usize >= NUM_CHANNELS {
            return Err(Error::BadChannel(channel));
        }
        let channel = channel as usize;
        let slot = r.read_u8()?;
        let pattern = parse_pattern(r, channel, slot)?;
        song.add_pattern(channel, slot, pattern)?;
    }

    Ok(song)
}

fn parse_pattern(r: &mut ModuleReader, channel: usize, slot: u8) -> Result<Pattern> {
    let mut pattern = Pattern::default();
    let num_rows = r.read_u8()? as usize + 1;

    for _ in 0..num_rows {
        let time = r.read_u8()? as u16;
        let note = r.read_u8()?;
        r.skip(1)?; // reserved

        for _ in 0..3 {
            let code = r.read_u8()?;
            let param = r.read_u8()?;
            match code {
                0 => {}
                // A jump takes effect on the row after its own.
                1 => pattern.add_event(Event::Jump {
                    time: time + 1,
                    section: param,
                }),
                6 => pattern.add_event(Event::Parameter {
                    time,
                    target: EffectTarget::Envelope,
                    value: param,
                }),
                7 => pattern.add_event(Event::Parameter {
                    time,
                    target: EffectTarget::Duty,
                    value: param,
                }),
                _ => return Err(Error::UnknownEffect { code, channel, slot }),
            }
        }

        // The note goes in after its row's effects so effect state is
        // current when it is emitted.
        if note != 0 {
            pattern.add_event(Event::Note { time, note });
        }
    }

    Ok(pattern)
}

fn parse_wave(r: &mut ModuleReader, module: &mut Module, next_index: &mut u8) -> Result<()> {
    let wave_id = r.read_u8()?;
    if wave_id as usize >= WAVE_SLOTS {
        return Err(Error::BadWaveSlot(wave_id));
    }

    let name_len = r.read_u16_le()? as usize;
    r.skip(name_len)?;

    let shape = r.read_bytes(WAVEFORM_SIZE)?;
    module.wavetable.extend_from_slice(shape);
    module.waveforms[wave_id as usize] = Some(*next_index);
    *next_index += 1;

    Ok(())
}
