use tracing::{debug, info};

use crate::audio::types::{AlignedAudio, AlignmentPolicy, AudioTrack};
use crate::error::{AudioError, Result};
use crate::resources::{ResourceKind, ResourceTracker};

/// Number of sample frames covering `duration` seconds at `sample_rate`
pub fn target_frames(duration: f64, sample_rate: u32) -> usize {
    (duration * sample_rate as f64).round().max(0.0) as usize
}

/// Fits an audio track to the timeline duration
///
/// Shorter tracks repeat from their first sample until covered; longer ones
/// are cut from the start. Either way the result holds exactly
/// `round(duration * sample_rate)` frames.
pub struct AudioAligner {
    tracker: ResourceTracker,
}

impl AudioAligner {
    pub fn new(tracker: ResourceTracker) -> Self {
        Self { tracker }
    }

    pub fn align(&self, track: &AudioTrack) -> Result<AlignedAudio> {
        let data = track.data();
        let channels = data.channels as usize;
        let source_frames = data.frame_count();

        if source_frames == 0 || channels == 0 {
            return Err(AudioError::Empty { source_name: data.source_name.clone() }.into());
        }

        let frames = target_frames(track.target_duration(), data.sample_rate);
        // Past the source's end this wraps to its start; a trim never gets there
        let mut samples = Vec::with_capacity(frames * channels);
        for frame in 0..frames {
            let start = (frame % source_frames) * channels;
            samples.extend_from_slice(&data.samples[start..start + channels]);
        }

        if track.policy() == AlignmentPolicy::Loop {
            debug!(
                "Looping '{}' {:.2} times",
                data.source_name,
                frames as f64 / source_frames as f64
            );
        }
        info!(
            "Aligned audio '{}' {:.2}s -> {:.2}s ({})",
            data.source_name,
            track.source_duration(),
            track.target_duration(),
            track.policy()
        );

        Ok(AlignedAudio {
            samples,
            sample_rate: data.sample_rate,
            channels: data.channels,
            duration: track.target_duration(),
            policy: track.policy(),
            _handle: self.tracker.acquire(ResourceKind::AudioTrack),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::types::{AudioData, AudioFormat};

    const RATE: u32 = 100;

    /// Mono ramp so every sample is distinguishable
    fn ramp(seconds: f64) -> AudioData {
        let frames = target_frames(seconds, RATE);
        AudioData {
            samples: (0..frames).map(|i| i as f32).collect(),
            sample_rate: RATE,
            channels: 1,
            duration: seconds,
            source_name: "ramp".to_string(),
            format: AudioFormat { extension: "wav".to_string(), bit_depth: Some(32), compression: None },
        }
    }

    fn align(data: AudioData, target: f64) -> AlignedAudio {
        let tracker = ResourceTracker::new();
        let track = AudioTrack::new(data, target, &tracker);
        AudioAligner::new(tracker.clone()).align(&track).unwrap()
    }

    #[test]
    fn test_long_audio_is_trimmed_from_start() {
        let aligned = align(ramp(10.0), 9.0);
        assert_eq!(aligned.policy, AlignmentPolicy::Trim);
        assert_eq!(aligned.duration, 9.0);
        assert_eq!(aligned.frame_count(), 900);
        assert_eq!(aligned.samples[0], 0.0);
        assert_eq!(aligned.samples[899], 899.0);
    }

    #[test]
    fn test_short_audio_loops_without_gap() {
        let aligned = align(ramp(2.0), 3.0);
        assert_eq!(aligned.policy, AlignmentPolicy::Loop);
        assert_eq!(aligned.duration, 3.0);
        assert_eq!(aligned.frame_count(), 300);
        // The final second repeats the first
        assert_eq!(&aligned.samples[200..300], &aligned.samples[0..100]);
        assert!(aligned.samples[200..].iter().zip(0..).all(|(s, i)| *s == i as f32));
    }

    #[test]
    fn test_equal_length_is_trim() {
        let aligned = align(ramp(3.0), 3.0);
        assert_eq!(aligned.policy, AlignmentPolicy::Trim);
        assert_eq!(aligned.frame_count(), 300);
    }

    #[test]
    fn test_stereo_frames_stay_paired() {
        let mut data = ramp(1.0);
        data.samples = (0..100).flat_map(|i| [i as f32, -(i as f32)]).collect();
        data.channels = 2;

        let aligned = align(data, 1.5);
        assert_eq!(aligned.frame_count(), 150);
        assert_eq!(&aligned.samples[200..202], &[0.0, -0.0]);
        assert_eq!(&aligned.samples[298..300], &[49.0, -49.0]);
    }

    #[test]
    fn test_many_loops_cover_exactly() {
        let aligned = align(ramp(0.3), 7.0);
        assert_eq!(aligned.frame_count(), 700);
        assert_eq!(aligned.samples[699], (699 % 30) as f32);
    }

    #[test]
    fn test_empty_track_fails() {
        let tracker = ResourceTracker::new();
        let mut data = ramp(1.0);
        data.samples.clear();
        let track = AudioTrack::new(data, 3.0, &tracker);
        assert!(AudioAligner::new(tracker.clone()).align(&track).is_err());
    }

    #[test]
    fn test_handles_released() {
        let tracker = ResourceTracker::new();
        {
            let track = AudioTrack::new(ramp(1.0), 2.0, &tracker);
            let _aligned = AudioAligner::new(tracker.clone()).align(&track).unwrap();
            assert_eq!(tracker.live(), 2);
        }
        assert_eq!(tracker.live(), 0);
    }
}
