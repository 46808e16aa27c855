use crate::{
    io::midi::MidiEvent,
    synth::message::NoteEvent,
};

/// MIDI controller number for "all notes off".
pub const ALL_NOTES_OFF: u8 = 123;

/// Map a MIDI message on `channel_filter` to a note event at `frame`.
pub fn midi_to_note_event(frame: usize, midi: MidiEvent, channel_filter: u8) -> Option<NoteEvent> {
    if midi.channel() != channel_filter {
        return None;
    }

    match midi {
        MidiEvent::NoteOn { key, velocity, .. } => {
            Some(NoteEvent::note_on(frame, key, velocity as f32 / 127.0))
        }
        MidiEvent::NoteOff { key, .. } => Some(NoteEvent::note_off(frame, key)),
        MidiEvent::ControlChange { controller, .. } if controller == ALL_NOTES_OFF => {
            Some(NoteEvent::all_notes_off(frame))
        }
        _ => None,
    }
}

pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::message::NoteEventKind;

    #[test]
    fn note_on_velocity_is_normalised() {
        let event = midi_to_note_event(
            12,
            MidiEvent::NoteOn {
                channel: 0,
                key: 60,
                velocity: 127,
            },
            0,
        )
        .unwrap();
        assert_eq!(event.frame, 12);
        assert_eq!(event.kind, NoteEventKind::NoteOn);
        assert_eq!(event.velocity, 1.0);
    }

    #[test]
    fn other_channels_are_ignored() {
        let midi = MidiEvent::NoteOn {
            channel: 3,
            key: 60,
            velocity: 90,
        };
        assert!(midi_to_note_event(0, midi, 0).is_none());
        assert!(midi_to_note_event(0, midi, 3).is_some());
    }

    #[test]
    fn controller_123_releases_everything() {
        let midi = MidiEvent::ControlChange {
            channel: 0,
            controller: ALL_NOTES_OFF,
            value: 0,
        };
        let event = midi_to_note_event(0, midi, 0).unwrap();
        assert_eq!(event.kind, NoteEventKind::AllNotesOff);

        let modwheel = MidiEvent::ControlChange {
            channel: 0,
            controller: 1,
            value: 64,
        };
        assert!(midi_to_note_event(0, modwheel, 0).is_none());
    }

    #[test]
    fn a440_is_note_69() {
        assert!((midi_note_to_freq(69) - 440.0).abs() < 1e-3);
        assert!((midi_note_to_freq(81) - 880.0).abs() < 1e-2);
    }
}
