/// Sound engine: three synthesized effects played through rodio.
///
///   jump: square wave, 150 → 300 Hz over 0.1 s
///   death: sawtooth, 100 → 50 Hz over 0.3 s
///   win: triangle arpeggio 400 / 600 / 1000 Hz over 0.6 s
///
/// Buffers are rendered to in-memory WAV once at init; playback is
/// fire-and-forget. Without the "sound" feature the stub does nothing.

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_jump: Arc<Vec<u8>>,
        sfx_death: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_jump: Arc::new(make_wav(&gen_sweep(Wave::Square, 150.0, 300.0, 0.1, 0.1))),
                sfx_death: Arc::new(make_wav(&gen_sweep(Wave::Saw, 100.0, 50.0, 0.3, 0.2))),
                sfx_win: Arc::new(make_wav(&gen_win())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            let cursor = Cursor::new(buf.as_ref().clone());
            if let Ok(src) = rodio::Decoder::new(cursor) {
                sink.append(src);
                sink.detach();
            }
        }

        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_death(&self) { self.play(&self.sfx_death); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators (mono f32 samples)
    // ════════════════════════════════════════════════════════════

    #[derive(Clone, Copy)]
    enum Wave {
        Square,
        Saw,
        Triangle,
    }

    /// One oscillator sample for `phase` in cycles.
    fn osc(wave: Wave, phase: f32) -> f32 {
        let p = phase.fract();
        match wave {
            Wave::Square => if p < 0.5 { 1.0 } else { -1.0 },
            Wave::Saw => 2.0 * p - 1.0,
            Wave::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
        }
    }

    /// Exponential pitch ramp from `f0` to `f1` with an exponential
    /// fade to silence.
    fn gen_sweep(wave: Wave, f0: f32, f1: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = f0 * (f1 / f0).powf(t);
                phase += freq / SAMPLE_RATE as f32;
                let env = volume * (0.01f32 / volume).powf(t);
                osc(wave, phase) * env
            })
            .collect()
    }

    /// Three triangle notes, each held 0.2 s.
    fn gen_win() -> Vec<f32> {
        let mut samples = Vec::new();
        for freq in [400.0f32, 600.0, 1000.0] {
            samples.extend(gen_sweep(Wave::Triangle, freq, freq, 0.2, 0.2));
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let block_align: u16 = bits_per_sample / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
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

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn sweep_length_and_range() {
            let s = gen_sweep(Wave::Saw, 100.0, 50.0, 0.3, 0.2);
            assert_eq!(s.len(), (SAMPLE_RATE as f32 * 0.3) as usize);
            assert!(s.iter().all(|v| v.abs() <= 0.2 + 1e-6));
        }

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&[0.0, 1.0, -1.0]);
            assert_eq!(wav.len(), 44 + 6);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[40..44], &6u32.to_le_bytes());
            assert_eq!(&wav[46..48], &32767i16.to_le_bytes());
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API (no-ops when the sound feature is off)
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_jump(&self) {}
    pub fn play_death(&self) {}
    pub fn play_win(&self) {}
}
