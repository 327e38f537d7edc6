//! In-memory model of a Trackerboy module

pub mod event;
pub mod reader;

pub use event::{EffectState, EffectTarget, Event};
pub use reader::ModuleReader;

use crate::error::{Error, Result};

/// Hardware channels, in section order: pulse 1, pulse 2, wave, noise.
pub const NUM_CHANNELS: usize = 4;

/// Pattern slots addressable per channel.
pub const PATTERN_SLOTS: usize = 256;

/// Wave slots addressable by the tracker.
pub const WAVE_SLOTS: usize = 64;

/// Bytes in one waveform payload.
pub const WAVEFORM_SIZE: usize = 16;

/// A decoded module: metadata, songs and the shared waveform table.
#[derive(Debug)]
pub struct Module {
    pub title: String,
    pub author: String,
    pub copyright: String,
    pub songs: Vec<Song>,
    /// Wave slot id -> sequential index into `wavetable`.
    pub waveforms: [Option<u8>; WAVE_SLOTS],
    /// Concatenated 16-byte waveform payloads, in definition order.
    pub wavetable: Vec<u8>,
}

impl Module {
    /// Decode a module from its raw container bytes.
    pub fn parse(data: &[u8]) -> Result<Module> {
        reader::parse_module(data)
    }

    pub(crate) fn new(title: String, author: String, copyright: String) -> Self {
        Self {
            title,
            author,
            copyright,
            songs: Vec::new(),
            waveforms: [None; WAVE_SLOTS],
            wavetable: Vec::new(),
        }
    }
}

/// Which pattern slot each channel plays during one segment of a song.
pub type Section = [u8; NUM_CHANNELS];

/// One song: timing parameters, per-channel pattern slots and the
/// ordered section list.
#[derive(Debug)]
pub struct Song {
    pub title: String,
    pub rows_per_beat: u8,
    pub rows_per_measure: u8,
    /// Frames per row in 4.4 fixed point.
    pub speed: u8,
    /// Rows in every section (1-256).
    pub rows_per_segment: u16,
    patterns: [Vec<Option<Pattern>>; NUM_CHANNELS],
    pub sections: Vec<Section>,
}

impl Song {
    pub fn new(
        title: String,
        rows_per_beat: u8,
        rows_per_measure: u8,
        speed: u8,
        rows_per_segment: u16,
    ) -> Self {
        Self {
            title,
            rows_per_beat,
            rows_per_measure,
            speed,
            rows_per_segment,
            patterns: std::array::from_fn(|_| {
                let mut slots = Vec::new();
                slots.resize_with(PATTERN_SLOTS, || None);
                slots
            }),
            sections: Vec::new(),
        }
    }

    /// Register a pattern into a slot. A slot may only be filled once.
    pub fn add_pattern(&mut self, channel: usize, slot: u8, pattern: Pattern) -> Result<()> {
        let entry = &mut self.patterns[channel][slot as usize];
        if entry.is_some() {
            return Err(Error::DuplicatePattern { channel, slot });
        }
        *entry = Some(pattern);
        Ok(())
    }

    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Pattern playing on `channel` for a given slot; an unfilled slot
    /// means the channel is silent.
    pub fn pattern(&self, channel: usize, slot: u8) -> Option<&Pattern> {
        self.patterns[channel][slot as usize].as_ref()
    }
}

/// An insertion-ordered list of events on one channel.
///
/// Events are not sorted by time here; effects for a row are inserted
/// ahead of the row's note so effect state is current when the note is
/// emitted.
#[derive(Debug, Default)]
pub struct Pattern {
    pub events: Vec<Event>,
}

impl Pattern {
    pub fn add_event(&mut self, event: Event) {
        self.events.push(event);
    }
}
