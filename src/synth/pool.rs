use crate::synth::{params::ParamSnapshot, voice::Voice};

/// Active voices, unordered, with a fixed capacity.
///
/// The backing `Vec` is allocated once at construction and never grows, so
/// spawning and retiring voices on the render thread does not allocate.
pub struct VoicePool {
    voices: Vec<Voice>,
    capacity: usize,
}

impl VoicePool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            voices: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    /// Add a voice, stealing one first if the pool is full. The stolen voice is
    /// handed back so the caller can dispose of its waveform.
    pub fn insert(&mut self, voice: Voice) -> Option<Voice> {
        let stolen = if self.voices.len() >= self.capacity {
            self.steal_index().map(|index| self.voices.swap_remove(index))
        } else {
            None
        };

        self.voices.push(voice);
        stolen
    }

    /// Oldest released voice, or the oldest voice if all are held.
    fn steal_index(&self) -> Option<usize> {
        let oldest = |held: bool| {
            self.voices
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_held() == held)
                .min_by_key(|(_, v)| v.id())
                .map(|(index, _)| index)
        };

        oldest(false).or_else(|| oldest(true))
    }

    /// Release every held voice playing `note`.
    pub fn release_note(&mut self, note: u8) {
        for voice in self.voices.iter_mut() {
            if voice.is_held() && voice.note() == note {
                voice.note_off();
            }
        }
    }

    pub fn release_all(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.note_off();
        }
    }

    pub fn produce(&mut self, params: &ParamSnapshot, left: &mut [f32], right: &mut [f32]) {
        for voice in self.voices.iter_mut() {
            voice.produce(params, left, right);
        }
    }

    /// Remove every terminated voice, passing each one to `retire`.
    pub fn retire_terminated(&mut self, mut retire: impl FnMut(Voice)) {
        let mut index = 0;
        while index < self.voices.len() {
            if self.voices[index].terminated() {
                retire(self.voices.swap_remove(index));
            } else {
                index += 1;
            }
        }
    }
}
