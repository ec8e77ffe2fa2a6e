//! Audio resampling using rubato
//!
//! Provides high-quality sample rate conversion for audio processing.
//! Uses sinc interpolation for best quality.

use anyhow::{Context, Result};
use rubato::{
    calculate_cutoff, Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

/// Default chunk size for processing
const CHUNK_SIZE: usize = 1024;

/// Audio resampler using sinc interpolation
pub struct Resampler;

impl Resampler {
    /// Resample audio from one sample rate to another
    ///
    /// # Arguments
    /// * `samples` - Input audio samples (mono, f32)
    /// * `from_sr` - Source sample rate
    /// * `to_sr` - Target sample rate
    pub fn resample(samples: &[f32], from_sr: u32, to_sr: u32) -> Result<Vec<f32>> {
        if from_sr == to_sr {
            return Ok(samples.to_vec());
        }

        if samples.is_empty() {
            return Ok(vec![]);
        }

        // For short audio, use simple single-pass resampling
        if samples.len() <= CHUNK_SIZE * 2 {
            return Self::resample_simple(samples, from_sr, to_sr);
        }

        Self::resample_chunked(samples, from_sr, to_sr)
    }

    /// Simple single-pass resampling for short audio
    fn resample_simple(samples: &[f32], from_sr: u32, to_sr: u32) -> Result<Vec<f32>> {
        let sinc_len = 256;
        let window = WindowFunction::BlackmanHarris2;
        let f_cutoff = calculate_cutoff(sinc_len, window);

        let params = SincInterpolationParameters {
            sinc_len,
            f_cutoff,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window,
        };

        let mut resampler = SincFixedIn::<f32>::new(
            to_sr as f64 / from_sr as f64,
            2.0,
            params,
            samples.len(),
            1, // mono
        )
        .context("Failed to create resampler")?;

        let input = vec![samples.to_vec()];
        let output = resampler.process(&input, None).context("Resampling failed")?;

        Ok(output.into_iter().next().unwrap_or_default())
    }

    /// Chunked resampling for longer audio (more memory efficient)
    fn resample_chunked(samples: &[f32], from_sr: u32, to_sr: u32) -> Result<Vec<f32>> {
        let sinc_len = 128; // Slightly smaller for chunked processing
        let window = WindowFunction::Blackman2;
        let f_cutoff = calculate_cutoff(sinc_len, window);

        let params = SincInterpolationParameters {
            sinc_len,
            f_cutoff,
            interpolation: SincInterpolationType::Quadratic,
            oversampling_factor: 256,
            window,
        };

        let mut resampler = SincFixedIn::<f32>::new(
            to_sr as f64 / from_sr as f64,
            1.1, // Small headroom for ratio adjustments
            params,
            CHUNK_SIZE,
            1, // mono
        )
        .context("Failed to create chunked resampler")?;

        let ratio = to_sr as f64 / from_sr as f64;
        let estimated_output_len = (samples.len() as f64 * ratio * 1.1) as usize;
        let mut output_samples = Vec::with_capacity(estimated_output_len);

        let mut pos = 0;
        while pos + CHUNK_SIZE <= samples.len() {
            let chunk = &samples[pos..pos + CHUNK_SIZE];
            let input = vec![chunk.to_vec()];
            let output = resampler.process(&input, None)?;

            if let Some(out_chunk) = output.into_iter().next() {
                output_samples.extend(out_chunk);
            }

            pos += CHUNK_SIZE;
        }

        // Process remaining samples
        if pos < samples.len() {
            let remaining = &samples[pos..];
            let input = [remaining.to_vec()];
            let output = resampler.process_partial(
                Some(&input.iter().map(|v| v.as_slice()).collect::<Vec<_>>()),
                None,
            )?;

            if let Some(out_chunk) = output.into_iter().next() {
                output_samples.extend(out_chunk);
            }
        }

        Ok(output_samples)
    }
}
