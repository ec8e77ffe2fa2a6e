//! Audio file loading
//!
//! Supports multiple audio formats via symphonia:
//! - WAV (PCM, float)
//! - MP3
//! - FLAC
//! - OGG/Vorbis

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::ArtifactFormat;

/// Decoded mono audio, normalized to [-1, 1]
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Audio loader that supports various formats via symphonia
pub struct AudioLoader;

impl AudioLoader {
    /// Identify the container of a byte payload from its magic bytes.
    ///
    /// Returns None when the payload does not start like any container
    /// the pipeline can decode. Used to reject unreadable uploads at
    /// validation time without paying for a full decode.
    pub fn sniff_container(bytes: &[u8]) -> Option<ArtifactFormat> {
        if bytes.len() < 12 {
            return None;
        }
        if &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            return Some(ArtifactFormat::Wav);
        }
        if &bytes[0..4] == b"fLaC" {
            return Some(ArtifactFormat::Flac);
        }
        if &bytes[0..4] == b"OggS" {
            return Some(ArtifactFormat::Ogg);
        }
        if &bytes[0..3] == b"ID3" {
            return Some(ArtifactFormat::Mp3);
        }
        // Bare MPEG frame sync (11 set bits)
        if bytes[0] == 0xFF && (bytes[1] & 0xE0) == 0xE0 {
            return Some(ArtifactFormat::Mp3);
        }
        None
    }

    /// Load audio from a file as mono f32 at its native sample rate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DecodedAudio> {
        let path = path.as_ref();

        // Use hound for WAV files (faster and simpler)
        if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("wav")) {
            return Self::load_wav(path);
        }

        Self::load_with_symphonia(path)
    }

    /// Load and resample to the given rate in one step
    pub fn load_resampled<P: AsRef<Path>>(path: P, target_sr: u32) -> Result<DecodedAudio> {
        let decoded = Self::load(path)?;
        if decoded.sample_rate == target_sr {
            return Ok(decoded);
        }
        let samples = super::Resampler::resample(&decoded.samples, decoded.sample_rate, target_sr)?;
        Ok(DecodedAudio {
            samples,
            sample_rate: target_sr,
        })
    }

    /// Load audio using symphonia (supports MP3, FLAC, OGG, etc.)
    fn load_with_symphonia(path: &Path) -> Result<DecodedAudio> {
        let src = File::open(path)
            .with_context(|| format!("Failed to open audio file: {:?}", path))?;

        let mss = MediaSourceStream::new(Box::new(src), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .with_context(|| format!("Unsupported audio format: {:?}", path))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| anyhow::anyhow!("No supported audio tracks found in {:?}", path))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| anyhow::anyhow!("Unknown sample rate"))?;
        let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);

        let dec_opts: DecoderOptions = Default::default();
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &dec_opts)
            .with_context(|| "Unsupported codec")?;

        let track_id = track.id;

        let mut all_samples: Vec<f32> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break; // End of stream
                }
                Err(SymphoniaError::ResetRequired) => {
                    break;
                }
                Err(e) => {
                    return Err(anyhow::anyhow!("Error reading packet: {}", e));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    if sample_buf.is_none() {
                        let spec = *decoded.spec();
                        let duration = decoded.capacity() as u64;
                        sample_buf = Some(SampleBuffer::new(duration, spec));
                    }

                    if let Some(ref mut buf) = sample_buf {
                        buf.copy_interleaved_ref(decoded);
                        all_samples.extend_from_slice(buf.samples());
                    }
                }
                Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => {
                    // Skip corrupted packets
                    continue;
                }
                Err(e) => {
                    return Err(anyhow::anyhow!("Decode error: {}", e));
                }
            }
        }

        if all_samples.is_empty() {
            return Err(anyhow::anyhow!("No audio frames decoded from {:?}", path));
        }

        Ok(DecodedAudio {
            samples: downmix_to_mono(all_samples, channels),
            sample_rate,
        })
    }

    /// Load WAV files using hound (optimized for WAV)
    fn load_wav(path: &Path) -> Result<DecodedAudio> {
        let reader = hound::WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let sample_rate = spec.sample_rate;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .filter_map(std::result::Result::ok)
                .collect(),
            hound::SampleFormat::Int => {
                let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .filter_map(std::result::Result::ok)
                    .map(|s| s as f32 / max_value)
                    .collect()
            }
        };

        if samples.is_empty() {
            return Err(anyhow::anyhow!("WAV file contains no samples: {:?}", path));
        }

        Ok(DecodedAudio {
            samples: downmix_to_mono(samples, spec.channels as usize),
            sample_rate,
        })
    }

    /// Read only the WAV header spec, without decoding samples
    pub fn wav_spec<P: AsRef<Path>>(path: P) -> Result<hound::WavSpec> {
        let reader = hound::WavReader::open(path.as_ref()).context("Failed to open WAV file")?;
        Ok(reader.spec())
    }
}

/// Average interleaved channels down to mono
fn downmix_to_mono(samples: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples;
    }
    samples
        .chunks(channels)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect()
}
