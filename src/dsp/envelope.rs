use crate::MIN_TIME_MS;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Energy Envelope
===============

A plucked or struck instrument does not ramp linearly to a target. The
excitation dumps energy into the resonator, the resonator soaks it up over a
short while, and the sound then bleeds that energy away at some rate. This
envelope models exactly that, with a handful of one-pole leaks evaluated at
control rate (a few thousand ticks per second).

Vocabulary
----------

  energy          Current output level. Multiplies the voice signal.

  latent energy   Energy injected by the note-on but not yet absorbed. The
                  attack leaks it into `energy`.

  sustain energy  Running total of everything absorbed so far. While the key
                  is held, a fraction of it is fed back in, so the level
                  settles on sustain * (burst * velocity) instead of decaying
                  to zero.

  alive           Key is still held.


Time to Rate
------------

A one-pole leak of `rate` per tick reaches 1/e after `1/rate` ticks. For a
time constant of `ms` milliseconds at `control_rate` ticks per second:

    rate = 1 - exp(-1000 / (ms * control_rate))

`expm1` keeps this accurate for very long times, where the exponent is tiny.


One Tick
--------

    energy         -= energy * (alive ? decay : release)
    u               = latent * attack
    latent         -= u
    energy         += u
    sustain_energy += u
    energy         += sustain_energy * decay * sustain

The last line is the trick that gives a sustain level without a state
machine: at equilibrium `energy * decay == sustain_energy * decay * sustain`.

The sustain feed starts while the attack is still absorbing, so with a short
attack and sustain close to 1 the level briefly overshoots `burst * velocity`
by about one percent before it settles. It stays below 1.02 times the burst.


Key Follow
----------

Higher notes die faster on real instruments. With key follow the control rate
used for the time conversion is scaled by 2^(key_follow * (60 - note) / 12),
so every octave above middle C shortens all times by up to a factor of two.


Release
-------

`note_off` clears the latent and sustain energy and switches the leak to the
release rate. From there on the level only falls. Once it is below 1e-6 the
voice is finished and can be removed.
*/

/// Energy below which a released envelope counts as finished.
pub const TERMINATION_ENERGY: f32 = 1e-6;

/// Shape of one envelope, in milliseconds and unit levels.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeSettings {
    pub attack_ms: f32,
    pub decay_ms: f32,
    pub sustain: f32,
    pub release_ms: f32,
    /// Energy injected at note-on, scaled by velocity.
    pub burst: f32,
    /// 0 disables key follow, 1 halves all times per octave above middle C.
    pub key_follow: f32,
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            attack_ms: 10.0,
            decay_ms: 1000.0,
            sustain: 0.5,
            release_ms: 200.0,
            burst: 1.0,
            key_follow: 0.0,
        }
    }
}

/// Per-tick leak for a time constant in milliseconds.
#[inline]
pub fn time_to_rate(ms: f32, control_rate: f32) -> f32 {
    -(-1000.0 / (ms.max(MIN_TIME_MS) * control_rate)).exp_m1()
}

#[derive(Debug, Clone)]
pub struct ControlRateEnvelope {
    energy: f32,
    latent_energy: f32,
    sustain_energy: f32,

    attack_rate: f32,
    decay_rate: f32,
    release_rate: f32,
    sustain_rate: f32,

    alive: bool,
}

impl ControlRateEnvelope {
    /// Start an envelope for `note` struck at `velocity` (0..=1).
    pub fn new(settings: &EnvelopeSettings, control_rate: f32, note: u8, velocity: f32) -> Self {
        let follow = settings.key_follow.clamp(0.0, 1.0) * (60.0 - note as f32) / 12.0;
        let rate = control_rate * follow.exp2();

        let decay_rate = time_to_rate(settings.decay_ms, rate);

        Self {
            energy: 0.0,
            latent_energy: settings.burst.clamp(0.0, 1.0) * velocity.clamp(0.0, 1.0),
            sustain_energy: 0.0,

            attack_rate: time_to_rate(settings.attack_ms, rate),
            decay_rate,
            release_rate: time_to_rate(settings.release_ms, rate),
            sustain_rate: decay_rate * settings.sustain.clamp(0.0, 1.0),

            alive: true,
        }
    }

    /// Advance one control tick and return the new level.
    #[inline]
    pub fn tick(&mut self) -> f32 {
        let leak = if self.alive {
            self.decay_rate
        } else {
            self.release_rate
        };
        self.energy -= self.energy * leak;

        let absorbed = self.latent_energy * self.attack_rate;
        self.latent_energy -= absorbed;
        self.energy += absorbed;
        self.sustain_energy += absorbed;

        self.energy += self.sustain_energy * self.sustain_rate;
        self.energy
    }

    /// Fill a control-rate buffer, one tick per slot.
    pub fn render(&mut self, out: &mut [f32]) {
        for value in out.iter_mut() {
            *value = self.tick();
        }
    }

    /// Key released: stop feeding energy and start the release leak.
    pub fn note_off(&mut self) {
        self.alive = false;
        self.latent_energy = 0.0;
        self.sustain_energy = 0.0;
    }

    pub fn terminated(&self) -> bool {
        !self.alive && self.energy < TERMINATION_ENERGY
    }

    /// Key still held.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }
}
