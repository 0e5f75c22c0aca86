use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::IntoSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::debug;

use crate::audio::types::{AudioData, AudioFormat, AudioSource};
use crate::error::{AudioError, Result};

/// Audio decoder supporting multiple formats
pub struct AudioLoader;

impl AudioLoader {
    /// Read and decode an audio file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        Self::decode(&AudioSource::from_path(path)?)
    }

    /// Decode an in-memory audio source
    ///
    /// The source name's extension picks the decoder; a name without one is
    /// sniffed for a RIFF header and otherwise probed by symphonia.
    pub fn decode(source: &AudioSource) -> Result<AudioData> {
        if source.bytes.is_empty() {
            return Err(AudioError::Empty { source_name: source.name.clone() }.into());
        }

        let extension = Self::detect_format(&source.name).unwrap_or_default();
        let data = match extension.as_str() {
            "wav" => Self::decode_wav(source)?,
            "" if source.bytes.starts_with(b"RIFF") => Self::decode_wav(source)?,
            "" => Self::decode_with_symphonia(source, None)?,
            ext if Self::is_format_supported(ext) => Self::decode_with_symphonia(source, Some(ext))?,
            _ => {
                return Err(AudioError::UnsupportedFormat { format: extension }.into());
            }
        };

        if data.frame_count() == 0 {
            return Err(AudioError::Empty { source_name: source.name.clone() }.into());
        }

        debug!(
            "Decoded '{}': {:.2}s, {} Hz, {} channel(s)",
            data.source_name, data.duration, data.sample_rate, data.channels
        );
        Ok(data)
    }

    /// Decode WAV with hound (most reliable for WAV)
    fn decode_wav(source: &AudioSource) -> Result<AudioData> {
        let load_failed = || AudioError::LoadFailed { source_name: source.name.clone() };

        let reader = hound::WavReader::new(Cursor::new(source.bytes.as_slice()))
            .map_err(|_| load_failed())?;

        let spec = reader.spec();
        let sample_rate = spec.sample_rate;
        let channels = spec.channels;
        if sample_rate == 0 || channels == 0 {
            return Err(AudioError::InvalidParameters {
                details: format!("{} Hz, {} channels", sample_rate, channels),
            }.into());
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| load_failed())?,
            hound::SampleFormat::Int => {
                let bit_depth = spec.bits_per_sample;
                reader
                    .into_samples::<i32>()
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| load_failed())?
                    .into_iter()
                    .map(|sample| Self::int_to_float(sample, bit_depth))
                    .collect()
            }
        };

        let duration = samples.len() as f64 / (sample_rate as f64 * channels as f64);

        Ok(AudioData {
            samples,
            sample_rate,
            channels,
            duration,
            source_name: source.name.clone(),
            format: AudioFormat {
                extension: "wav".to_string(),
                bit_depth: Some(spec.bits_per_sample),
                compression: None,
            },
        })
    }

    /// Decode compressed formats with Symphonia
    fn decode_with_symphonia(source: &AudioSource, extension: Option<&str>) -> Result<AudioData> {
        let load_failed = || AudioError::LoadFailed { source_name: source.name.clone() };

        let mss = MediaSourceStream::new(Box::new(Cursor::new(source.bytes.clone())), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = extension {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|_| load_failed())?;

        let mut format = probed.format;

        // First audio track with a decodable codec
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(load_failed)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params.sample_rate.ok_or_else(|| AudioError::InvalidParameters {
            details: "No sample rate found".to_string(),
        })?;
        let channels = codec_params
            .channels
            .ok_or_else(|| AudioError::InvalidParameters {
                details: "No channel information found".to_string(),
            })?
            .count() as u16;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|_| load_failed())?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                // End of stream
                Err(_) => break,
            };

            while !format.metadata().is_latest() {
                format.metadata().pop();
            }

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => Self::convert_audio_buffer_to_f32(&decoded, &mut samples),
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(_) => break,
            }
        }

        let duration = samples.len() as f64 / (sample_rate as f64 * channels.max(1) as f64);

        Ok(AudioData {
            samples,
            sample_rate,
            channels,
            duration,
            source_name: source.name.clone(),
            format: AudioFormat {
                extension: extension.unwrap_or("unknown").to_string(),
                bit_depth: codec_params.bits_per_sample.map(|b| b as u16),
                compression: Some(format!("{:?}", codec_params.codec)),
            },
        })
    }

    /// Convert integer sample to float (-1.0 to 1.0). hound hands 8-bit
    /// samples over already shifted to signed.
    fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
        match bit_depth {
            8 => sample as f32 / 128.0,
            16 => sample as f32 / 32768.0,
            24 => sample as f32 / 8388608.0,
            32 => sample as f32 / 2147483648.0,
            _ => sample as f32 / 32768.0, // Default to 16-bit
        }
    }

    /// Append a decoded Symphonia buffer as interleaved f32
    fn convert_audio_buffer_to_f32(buffer: &AudioBufferRef, output: &mut Vec<f32>) {
        match buffer {
            AudioBufferRef::U8(buf) => interleave(&**buf, output),
            AudioBufferRef::U16(buf) => interleave(&**buf, output),
            AudioBufferRef::U24(buf) => interleave(&**buf, output),
            AudioBufferRef::U32(buf) => interleave(&**buf, output),
            AudioBufferRef::S8(buf) => interleave(&**buf, output),
            AudioBufferRef::S16(buf) => interleave(&**buf, output),
            AudioBufferRef::S24(buf) => interleave(&**buf, output),
            AudioBufferRef::S32(buf) => interleave(&**buf, output),
            AudioBufferRef::F32(buf) => interleave(&**buf, output),
            AudioBufferRef::F64(buf) => interleave(&**buf, output),
        }
    }

    /// Detect audio format from a file name's extension
    pub fn detect_format<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        matches!(
            extension.to_lowercase().as_str(),
            "wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac"
        )
    }
}

fn interleave<S>(buffer: &AudioBuffer<S>, output: &mut Vec<f32>)
where
    S: Sample + IntoSample<f32>,
{
    let channels = buffer.spec().channels.count();
    output.reserve(buffer.frames() * channels);
    for frame in 0..buffer.frames() {
        for ch in 0..channels {
            output.push(buffer.chan(ch)[frame].into_sample());
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A 16-bit mono WAV holding a 440 Hz tone
    pub(crate) fn wav_bytes(seconds: f64, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            let frames = (seconds * sample_rate as f64).round() as usize;
            for i in 0..frames {
                let t = i as f64 / sample_rate as f64;
                let value = (t * 440.0 * std::f64::consts::TAU).sin() * 0.5;
                writer.write_sample((value * i16::MAX as f64) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(AudioLoader::detect_format("test.wav"), Some("wav".to_string()));
        assert_eq!(AudioLoader::detect_format("test.MP3"), Some("mp3".to_string()));
        assert_eq!(AudioLoader::detect_format("test"), None);
    }

    #[test]
    fn test_format_support() {
        assert!(AudioLoader::is_format_supported("wav"));
        assert!(AudioLoader::is_format_supported("mp3"));
        assert!(AudioLoader::is_format_supported("FLAC"));
        assert!(!AudioLoader::is_format_supported("xyz"));
    }

    #[test]
    fn test_int_to_float_conversion() {
        assert_eq!(AudioLoader::int_to_float(0, 16), 0.0);
        assert_eq!(AudioLoader::int_to_float(32767, 16), 32767.0 / 32768.0);
        assert_eq!(AudioLoader::int_to_float(-32768, 16), -1.0);

        assert_eq!(AudioLoader::int_to_float(0, 8), 0.0);
        assert_eq!(AudioLoader::int_to_float(127, 8), 127.0 / 128.0);
        assert_eq!(AudioLoader::int_to_float(-128, 8), -1.0);
    }

    #[test]
    fn test_decode_wav_bytes() {
        let source = AudioSource::new("tone.wav", wav_bytes(2.0, 8000));
        let data = AudioLoader::decode(&source).unwrap();
        assert_eq!(data.sample_rate, 8000);
        assert_eq!(data.channels, 1);
        assert_eq!(data.frame_count(), 16000);
        assert!((data.duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unnamed_wav_is_sniffed() {
        let source = AudioSource::new("upload", wav_bytes(0.5, 8000));
        assert!(AudioLoader::decode(&source).is_ok());
    }

    #[test]
    fn test_empty_audio_is_rejected() {
        let result = AudioLoader::decode(&AudioSource::new("silence.wav", Vec::new()));
        assert!(matches!(
            result,
            Err(crate::error::CompositorError::Audio(AudioError::Empty { .. }))
        ));

        // A valid header with no samples is just as empty
        let result = AudioLoader::decode(&AudioSource::new("silence.wav", wav_bytes(0.0, 8000)));
        assert!(matches!(
            result,
            Err(crate::error::CompositorError::Audio(AudioError::Empty { .. }))
        ));
    }

    #[test]
    fn test_unsupported_format() {
        let result = AudioLoader::decode(&AudioSource::new("test.xyz", b"dummy content".to_vec()));
        if let Err(crate::error::CompositorError::Audio(AudioError::UnsupportedFormat { format })) = result {
            assert_eq!(format, "xyz");
        } else {
            panic!("Expected UnsupportedFormat error");
        }
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.wav");
        std::fs::write(&path, wav_bytes(1.0, 8000)).unwrap();

        let data = AudioLoader::load(&path).unwrap();
        assert_eq!(data.source_name, "song.wav");
        assert_eq!(data.frame_count(), 8000);
    }
}
