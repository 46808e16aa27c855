use rtrb::Consumer;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoteEventKind {
    NoteOn,
    NoteOff,
    AllNotesOff,
}

/// A note event scheduled at a frame offset inside the block being rendered.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NoteEvent {
    pub frame: usize,
    pub note: u8,
    /// Normalised velocity, 0.0 to 1.0.
    pub velocity: f32,
    pub kind: NoteEventKind,
}

impl NoteEvent {
    pub fn note_on(frame: usize, note: u8, velocity: f32) -> Self {
        Self {
            frame,
            note,
            velocity,
            kind: NoteEventKind::NoteOn,
        }
    }

    pub fn note_off(frame: usize, note: u8) -> Self {
        Self {
            frame,
            note,
            velocity: 0.0,
            kind: NoteEventKind::NoteOff,
        }
    }

    pub fn all_notes_off(frame: usize) -> Self {
        Self {
            frame,
            note: 0,
            velocity: 0.0,
            kind: NoteEventKind::AllNotesOff,
        }
    }
}

/// Source of note events for [`Engine::render_queued`](crate::Engine::render_queued).
pub trait MessageReceiver {
    fn pop(&mut self) -> Option<NoteEvent>;
}

impl MessageReceiver for Consumer<NoteEvent> {
    fn pop(&mut self) -> Option<NoteEvent> {
        Consumer::pop(self).ok()
    }
}
