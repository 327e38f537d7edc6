//! Song compilation: temporal merge and bytecode emission

use super::opcode::encode_delay;
use crate::error::{Error, Result};
use crate::module::event::{relative_offset, EffectState, EmitContext, Event, JumpFixup};
use crate::module::{Module, Pattern, Song, NUM_CHANNELS};

/// Compile one song of a module into a Yeller bytecode stream.
pub fn compile_song(module: &Module, song_index: usize) -> Result<Vec<u8>> {
    let song = module
        .songs
        .get(song_index)
        .ok_or(Error::NoSuchSong(song_index))?;
    SongEmitter::new(module, song).emit()
}

/// Scratch state for one song compilation.
struct SongEmitter<'a> {
    module: &'a Module,
    song: &'a Song,
    out: Vec<u8>,
    effect_state: [EffectState; NUM_CHANNELS],
    /// Output offset where each emitted section began.
    section_starts: Vec<usize>,
    /// Jumps waiting on a section start that was unknown at emit time.
    fixups: Vec<JumpFixup>,
    last_event_frame: u32,
}

impl<'a> SongEmitter<'a> {
    fn new(module: &'a Module, song: &'a Song) -> Self {
        Self {
            module,
            song,
            out: Vec::new(),
            effect_state: [EffectState::default(); NUM_CHANNELS],
            section_starts: Vec::new(),
            fixups: Vec::new(),
            last_event_frame: 0,
        }
    }

    /// Absolute row to playback frame; `speed` is frames per row in
    /// 4.4 fixed point, truncating.
    fn frame_at(&self, row: u32) -> u32 {
        u32::from(self.song.speed) * row / 16
    }

    fn emit(mut self) -> Result<Vec<u8>> {
        let song = self.song;
        let rows_per_segment = u32::from(song.rows_per_segment);

        for (section_i, section) in song.sections.iter().enumerate() {
            let row_offset = section_i as u32 * rows_per_segment;
            self.section_starts.push(self.out.len());

            let patterns: [Option<&'a Pattern>; NUM_CHANNELS] =
                std::array::from_fn(|ch| song.pattern(ch, section[ch]));
            let mut cursors = [0usize; NUM_CHANNELS];
            let mut left_early = false;

            while let Some((channel, event)) = next_event(&patterns, &cursors) {
                cursors[channel] += 1;
                self.emit_event(channel, event, row_offset)?;

                if let Event::Jump { section, .. } = event {
                    if (*section as usize) < self.section_starts.len() {
                        // Backward jump closes the playback loop; the
                        // rest of the song is unreachable.
                        return self.finish();
                    }
                    // Forward jump: control resumes at a later section,
                    // so keep emitting from the next one.
                    left_early = true;
                    break;
                }
            }

            // Sections occupy a fixed playback duration regardless of
            // event density.
            let end_frame = self.frame_at(row_offset + rows_per_segment);
            if end_frame > self.last_event_frame {
                if !left_early {
                    self.out
                        .extend_from_slice(&encode_delay(end_frame - self.last_event_frame));
                }
                self.last_event_frame = end_frame;
            }
        }

        if self.section_starts.is_empty() {
            return self.finish();
        }

        // No explicit jump ended the song; loop back to the top.
        self.emit_event(0, &Event::Jump { time: 0, section: 0 }, 0)?;
        self.finish()
    }

    fn emit_event(&mut self, channel: usize, event: &Event, row_offset: u32) -> Result<()> {
        let size = event.size(channel);
        if size != 0 {
            let frame = self.frame_at(row_offset + u32::from(event.time()));
            let delay = frame.saturating_sub(self.last_event_frame);
            if delay != 0 {
                self.out.extend_from_slice(&encode_delay(delay));
            }
            self.last_event_frame = self.last_event_frame.max(frame);
        }

        let mut ctx = EmitContext {
            channel,
            state: &mut self.effect_state[channel],
            waveforms: &self.module.waveforms,
            position: self.out.len(),
            section_starts: &self.section_starts,
            fixups: &mut self.fixups,
        };
        let bytes = event.emit(&mut ctx)?;
        if bytes.len() != size {
            return Err(Error::SizeMismatch {
                channel,
                expected: size,
                actual: bytes.len(),
            });
        }
        self.out.extend_from_slice(&bytes);
        Ok(())
    }

    /// Patch forward jumps against the completed section table.
    fn finish(mut self) -> Result<Vec<u8>> {
        for fixup in std::mem::take(&mut self.fixups) {
            let start = *self
                .section_starts
                .get(fixup.section)
                .ok_or(Error::BadJumpTarget {
                    section: fixup.section,
                })?;
            let offset = relative_offset(start, fixup.position)?;
            self.out[fixup.position + 1..fixup.position + 3]
                .copy_from_slice(&offset.to_le_bytes());
        }
        Ok(self.out)
    }
}

/// Pick the channel whose next unconsumed event is chronologically
/// earliest; ties go to the lowest channel index.
fn next_event<'a>(
    patterns: &[Option<&'a Pattern>; NUM_CHANNELS],
    cursors: &[usize; NUM_CHANNELS],
) -> Option<(usize, &'a Event)> {
    let mut best: Option<(usize, &'a Event)> = None;
    for channel in 0..NUM_CHANNELS {
        let Some(pattern) = patterns[channel] else {
            continue;
        };
        let Some(event) = pattern.events.get(cursors[channel]) else {
            continue;
        };
        match best {
            Some((_, current)) if event.time() >= current.time() => {}
            _ => best = Some((channel, event)),
        }
    }
    best
}
