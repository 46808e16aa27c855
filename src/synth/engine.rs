use std::{mem, sync::Arc};

use rand_pcg::Pcg32;
use rtrb::{Consumer, Producer};

use crate::{
    config::EngineConfig,
    dsp::{downsample::Downsampler, rng::create_rng, spectrum::Waveform},
    synth::{
        message::{MessageReceiver, NoteEvent, NoteEventKind},
        params::{ParamSnapshot, SharedParams},
        pool::VoicePool,
        voice::{Voice, VoiceContext, VoiceSpawn},
    },
    MAX_BLOCK_SIZE,
};

/// Most events [`Engine::render_queued`] takes from its receiver per call.
pub const MAX_QUEUED_EVENTS: usize = 64;

/// Render-thread half of an instrument.
///
/// Nothing in here blocks or allocates once constructed. Waveforms published by
/// the [`Controller`](crate::Controller) are adopted at the start of each
/// render call; any waveform the render thread would free is sent back to the
/// controller instead.
pub struct Engine {
    ctx: VoiceContext,
    oversampling: usize,
    params: SharedParams,

    waveform: Arc<Waveform>,
    incoming: Consumer<Arc<Waveform>>,
    retired: Producer<Arc<Waveform>>,

    pool: VoicePool,
    mix: [Vec<f32>; 2],
    downsamplers: [Downsampler; 2],
    rng: Pcg32,
    next_id: u64,
}

impl Engine {
    pub(crate) fn new(
        config: &EngineConfig,
        params: SharedParams,
        waveform: Arc<Waveform>,
        incoming: Consumer<Arc<Waveform>>,
        retired: Producer<Arc<Waveform>>,
    ) -> Self {
        let oversampling = config.oversampling();
        let mix_len = MAX_BLOCK_SIZE * oversampling;

        Self {
            ctx: VoiceContext::from_config(config),
            oversampling,
            params,

            waveform,
            incoming,
            retired,

            pool: VoicePool::with_capacity(config.max_voices),
            mix: [vec![0.0; mix_len], vec![0.0; mix_len]],
            downsamplers: [Downsampler::new(), Downsampler::new()],
            rng: create_rng(config.seed),
            next_id: 0,
        }
    }

    /// Render one block, applying `events` at their frame offsets.
    ///
    /// Events must be in non-decreasing frame order; an event earlier than the
    /// previous one is applied at the current position. Events at or past the
    /// end of the block, notes above 127 and non-finite velocities are
    /// ignored. If the channel slices differ in length the shorter one is
    /// rendered.
    pub fn render(&mut self, events: &[NoteEvent], left: &mut [f32], right: &mut [f32]) {
        self.adopt_waveform();

        let frames = left.len().min(right.len());
        let params = self.params.snapshot();
        let mut position = 0;

        for event in events {
            if event.frame >= frames || !is_valid(event) {
                continue;
            }
            if event.frame > position {
                self.render_span(
                    &params,
                    &mut left[position..event.frame],
                    &mut right[position..event.frame],
                );
                position = event.frame;
            }
            self.apply(event, &params);
        }

        self.render_span(
            &params,
            &mut left[position..frames],
            &mut right[position..frames],
        );

        self.retire_terminated();
    }

    /// Drain up to [`MAX_QUEUED_EVENTS`] events from `receiver` and render them
    /// at the start of the block.
    pub fn render_queued<R: MessageReceiver>(
        &mut self,
        receiver: &mut R,
        left: &mut [f32],
        right: &mut [f32],
    ) {
        let mut events = [NoteEvent::all_notes_off(0); MAX_QUEUED_EVENTS];
        let mut count = 0;
        while count < MAX_QUEUED_EVENTS {
            let Some(event) = receiver.pop() else {
                break;
            };
            events[count] = NoteEvent { frame: 0, ..event };
            count += 1;
        }

        self.render(&events[..count], left, right);
    }

    /// Release every sounding voice.
    pub fn all_notes_off(&mut self) {
        self.pool.release_all();
    }

    pub fn active_voices(&self) -> usize {
        self.pool.len()
    }

    pub fn max_voices(&self) -> usize {
        self.pool.capacity()
    }

    /// The waveform new voices will read.
    pub fn waveform(&self) -> &Arc<Waveform> {
        &self.waveform
    }

    fn apply(&mut self, event: &NoteEvent, params: &ParamSnapshot) {
        match event.kind {
            NoteEventKind::NoteOn => self.spawn(event.note, event.velocity.clamp(0.0, 1.0), params),
            NoteEventKind::NoteOff => self.pool.release_note(event.note),
            NoteEventKind::AllNotesOff => self.pool.release_all(),
        }
    }

    fn spawn(&mut self, note: u8, velocity: f32, params: &ParamSnapshot) {
        let unison = params.unison();

        for member in 0..unison.voices.max(1) {
            let (detune, left_gain, right_gain) = unison.member(member);
            let spawn = VoiceSpawn {
                id: self.next_id,
                note,
                velocity,
                detune,
                left_gain,
                right_gain,
            };
            self.next_id += 1;

            let voice = Voice::new(
                spawn,
                Arc::clone(&self.waveform),
                params,
                &self.ctx,
                &mut self.rng,
            );
            if let Some(stolen) = self.pool.insert(voice) {
                self.retire(stolen.into_waveform());
            }
        }
    }

    fn render_span(&mut self, params: &ParamSnapshot, left: &mut [f32], right: &mut [f32]) {
        let mut start = 0;
        while start < left.len() {
            let end = (start + MAX_BLOCK_SIZE).min(left.len());
            self.render_chunk(params, &mut left[start..end], &mut right[start..end]);
            start = end;
        }
    }

    fn render_chunk(&mut self, params: &ParamSnapshot, left: &mut [f32], right: &mut [f32]) {
        let internal = left.len() * self.oversampling;
        let [mix_left, mix_right] = &mut self.mix;
        let mix_left = &mut mix_left[..internal];
        let mix_right = &mut mix_right[..internal];

        mix_left.fill(0.0);
        mix_right.fill(0.0);
        self.pool.produce(params, mix_left, mix_right);

        if self.oversampling == 2 {
            let [down_left, down_right] = &mut self.downsamplers;
            down_left.process(mix_left, left);
            down_right.process(mix_right, right);
        } else {
            left.copy_from_slice(mix_left);
            right.copy_from_slice(mix_right);
        }
    }

    /// Take the newest published waveform, if any.
    fn adopt_waveform(&mut self) {
        while let Ok(waveform) = self.incoming.pop() {
            let previous = mem::replace(&mut self.waveform, waveform);
            self.retire(previous);
        }
    }

    fn retire_terminated(&mut self) {
        let Self { pool, retired, .. } = self;
        pool.retire_terminated(|voice| send_back(retired, voice.into_waveform()));
    }

    fn retire(&mut self, waveform: Arc<Waveform>) {
        send_back(&mut self.retired, waveform);
    }
}

fn is_valid(event: &NoteEvent) -> bool {
    match event.kind {
        NoteEventKind::NoteOn => event.note <= 127 && event.velocity.is_finite(),
        NoteEventKind::NoteOff => event.note <= 127,
        NoteEventKind::AllNotesOff => true,
    }
}

/// Hand the last reference to a waveform back to the controller so it is freed
/// off the render thread. Shared references are just dropped. When the queue
/// is full the waveform is freed here.
fn send_back(retired: &mut Producer<Arc<Waveform>>, waveform: Arc<Waveform>) {
    if Arc::strong_count(&waveform) == 1 {
        let _ = retired.push(waveform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::params::ParamId;
    use rtrb::RingBuffer;

    struct Harness {
        engine: Engine,
        publish: Producer<Arc<Waveform>>,
        reclaimed: Consumer<Arc<Waveform>>,
        params: SharedParams,
    }

    fn table(value: f32) -> Arc<Waveform> {
        let samples = (0..1024)
            .map(|n| value * (std::f32::consts::TAU * n as f32 / 64.0).sin())
            .collect();
        Arc::new(Waveform::from_samples(samples, 64))
    }

    fn harness(config: EngineConfig) -> Harness {
        let params = SharedParams::new();
        let (publish, incoming) = RingBuffer::new(4);
        let (retired, reclaimed) = RingBuffer::new(16);
        let engine = Engine::new(&config, params.clone(), table(0.5), incoming, retired);
        Harness {
            engine,
            publish,
            reclaimed,
            params,
        }
    }

    fn render(engine: &mut Engine, events: &[NoteEvent], frames: usize) -> (Vec<f32>, Vec<f32>) {
        let (mut l, mut r) = (vec![0.0; frames], vec![0.0; frames]);
        engine.render(events, &mut l, &mut r);
        (l, r)
    }

    #[test]
    fn silent_without_notes() {
        let mut h = harness(EngineConfig::default());
        let (l, r) = render(&mut h.engine, &[], 256);
        assert!(l.iter().chain(&r).all(|&x| x == 0.0));
    }

    #[test]
    fn note_starts_at_its_frame_offset() {
        let mut h = harness(EngineConfig {
            oversample: false,
            ..EngineConfig::default()
        });
        let (l, _) = render(&mut h.engine, &[NoteEvent::note_on(100, 60, 1.0)], 256);

        assert!(l[..100].iter().all(|&x| x == 0.0));
        assert!(l[100..].iter().any(|&x| x != 0.0));
        assert_eq!(h.engine.active_voices(), 1);
    }

    #[test]
    fn malformed_events_are_ignored() {
        let mut h = harness(EngineConfig::default());
        render(
            &mut h.engine,
            &[
                NoteEvent::note_on(0, 200, 1.0),
                NoteEvent::note_on(0, 60, f32::NAN),
                NoteEvent::note_on(64, 60, 1.0),
            ],
            64,
        );
        assert_eq!(h.engine.active_voices(), 0);
    }

    #[test]
    fn unison_spawns_one_voice_per_member() {
        let mut h = harness(EngineConfig::default());
        h.params.set(ParamId::UnisonVoices, 5.0);
        render(&mut h.engine, &[NoteEvent::note_on(0, 60, 1.0)], 64);
        assert_eq!(h.engine.active_voices(), 5);
    }

    #[test]
    fn pool_never_exceeds_max_voices() {
        let mut h = harness(EngineConfig {
            max_voices: 4,
            ..EngineConfig::default()
        });
        let events: Vec<NoteEvent> = (0..10).map(|i| NoteEvent::note_on(i, 50 + i as u8, 1.0)).collect();
        render(&mut h.engine, &events, 64);
        assert_eq!(h.engine.active_voices(), 4);
    }

    #[test]
    fn blocks_longer_than_the_maximum_are_chunked() {
        let mut a = harness(EngineConfig::default());
        let mut b = harness(EngineConfig::default());
        let on = [NoteEvent::note_on(0, 57, 0.8)];

        let (long_l, _) = render(&mut a.engine, &on, 3 * MAX_BLOCK_SIZE + 17);

        let (mut first, _) = render(&mut b.engine, &on, MAX_BLOCK_SIZE);
        let (rest, _) = render(&mut b.engine, &[], 2 * MAX_BLOCK_SIZE + 17);
        first.extend(rest);

        assert_eq!(long_l, first);
    }

    #[test]
    fn adopts_published_waveform_and_returns_the_old_one() {
        let mut h = harness(EngineConfig::default());
        let replacement = table(0.25);
        let marker = Arc::as_ptr(&replacement);
        h.publish.push(replacement).unwrap();

        render(&mut h.engine, &[], 64);

        assert_eq!(Arc::as_ptr(h.engine.waveform()), marker);
        assert!(h.reclaimed.pop().is_ok(), "old waveform should come back");
    }

    #[test]
    fn waveform_held_by_a_voice_is_not_returned() {
        let mut h = harness(EngineConfig::default());
        render(&mut h.engine, &[NoteEvent::note_on(0, 60, 1.0)], 64);

        h.publish.push(table(0.25)).unwrap();
        render(&mut h.engine, &[], 64);
        assert!(h.reclaimed.pop().is_err(), "voice still reads the old table");

        h.engine.all_notes_off();
        for _ in 0..200 {
            render(&mut h.engine, &[], 2048);
            if h.engine.active_voices() == 0 {
                break;
            }
        }
        assert_eq!(h.engine.active_voices(), 0);
        assert!(h.reclaimed.pop().is_ok(), "last voice hands the table back");
    }

    #[test]
    fn render_queued_drains_the_receiver() {
        let mut h = harness(EngineConfig::default());
        let (mut tx, mut rx) = RingBuffer::<NoteEvent>::new(8);
        tx.push(NoteEvent::note_on(40, 60, 1.0)).unwrap();
        tx.push(NoteEvent::note_on(0, 64, 1.0)).unwrap();

        let (mut l, mut r) = (vec![0.0; 32], vec![0.0; 32]);
        h.engine.render_queued(&mut rx, &mut l, &mut r);

        assert_eq!(h.engine.active_voices(), 2, "queued events play at frame 0");
        assert!(rx.is_empty());
    }
}
