/// Sound engine: procedural chiptune effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

/// One effect to play.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Eat,
    Die,
    SpeedUp,
    MatchOver,
}

/// Cues for one frame: at most one of each, in a fixed order so a
/// crowded frame doesn't stack the same effect.
pub fn cues_for(events: &[GameEvent], sped_up: bool, match_over: bool) -> Vec<Cue> {
    let mut cues = Vec::with_capacity(3);
    if events.iter().any(|e| matches!(e, GameEvent::FoodConsumed { .. })) {
        cues.push(Cue::Eat);
    }
    if events.iter().any(|e| matches!(e, GameEvent::SnakeDied { .. })) {
        cues.push(Cue::Die);
    }
    if sped_up {
        cues.push(Cue::SpeedUp);
    }
    if match_over {
        cues.push(Cue::MatchOver);
    }
    cues
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Cue;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    /// Pre-generated WAV buffers for each effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_eat: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_speed: Arc<Vec<u8>>,
        sfx_over: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("audio output unavailable: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_eat: Arc::new(make_wav(&gen_eat())),
                sfx_die: Arc::new(make_wav(&gen_die())),
                sfx_speed: Arc::new(make_wav(&gen_speed_up())),
                sfx_over: Arc::new(make_wav(&gen_match_over())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_cue(&self, cue: Cue) {
            match cue {
                Cue::Eat => self.play(&self.sfx_eat),
                Cue::Die => self.play(&self.sfx_die),
                Cue::SpeedUp => self.play(&self.sfx_speed),
                Cue::MatchOver => self.play(&self.sfx_over),
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Note sequence. `harmonics` are (multiple, weight) pairs mixed onto
    /// the fundamental; `decay` is how far each note fades (0 = flat).
    fn gen_notes(notes: &[(f32, f32)], harmonics: &[(f32, f32)], decay: f32, volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * decay;
                let wave: f32 = harmonics.iter()
                    .map(|&(mult, weight)| (t * freq * mult * TAU).sin() * weight)
                    .sum();
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Food: quick rising chirp E6→A6
    fn gen_eat() -> Vec<f32> {
        gen_notes(&[(1319.0, 0.035), (1760.0, 0.05)], &[(1.0, 0.7), (3.0, 0.3)], 0.9, 0.22)
    }

    /// Death: falling sweep with a noise crunch on top
    fn gen_die() -> Vec<f32> {
        let duration = 0.35;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut lcg: u32 = 0x5eed;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = 520.0 - p * 380.0; // 520Hz → 140Hz
                let t = i as f32 / SAMPLE_RATE as f32;
                let tone = (t * freq * TAU).sin();
                lcg = lcg.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (lcg as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let crunch = if p < 0.25 { 0.35 } else { 0.0 };
                (tone * (1.0 - crunch) + noise * crunch) * (1.0 - p).powf(0.7) * 0.3
            })
            .collect()
    }

    /// Speed-up: two short identical pips
    fn gen_speed_up() -> Vec<f32> {
        let pip = [(988.0, 0.04), (0.0, 0.03), (988.0, 0.04)]; // 0 Hz = rest
        gen_notes(&pip, &[(1.0, 1.0)], 0.5, 0.18)
    }

    /// Match over: C5→E5→G5→C6 fanfare with a held final note
    fn gen_match_over() -> Vec<f32> {
        let mut samples = gen_notes(
            &[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1)],
            &[(1.0, 0.6), (2.0, 0.3), (3.0, 0.1)],
            0.3,
            0.3,
        );
        samples.extend(gen_notes(&[(1047.0, 0.3)], &[(1.0, 0.8), (2.0, 0.2)], 1.0, 0.3));
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_cue(&self, _cue: Cue) {}
}
