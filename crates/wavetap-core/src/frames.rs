//! Interleave/deinterleave and sample-format normalization helpers.

/// Split interleaved frames into per-channel scratch buffers.
///
/// `scratch` must hold one `Vec` per channel; each is cleared and refilled.
/// With pre-reserved capacity this does not allocate, which keeps it safe to
/// call from realtime capture paths. Trailing partial frames are dropped.
pub fn deinterleave_into(interleaved: &[f32], channels: usize, scratch: &mut [Vec<f32>]) {
    debug_assert_eq!(scratch.len(), channels);
    let frames = interleaved.len() / channels.max(1);
    for (ch, out) in scratch.iter_mut().enumerate() {
        out.clear();
        out.extend(
            interleaved[ch..]
                .iter()
                .step_by(channels)
                .take(frames)
                .copied(),
        );
    }
}

/// Allocating convenience wrapper around [`deinterleave_into`].
pub fn deinterleave(interleaved: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = interleaved.len() / channels.max(1);
    let mut out = vec![Vec::with_capacity(frames); channels];
    deinterleave_into(interleaved, channels, &mut out);
    out
}

/// Normalize a 16-bit integer sample to [-1, 1).
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

/// Normalize a slice of 16-bit samples into `out`, clearing it first.
pub fn i16_slice_to_f32(samples: &[i16], out: &mut Vec<f32>) {
    out.clear();
    out.extend(samples.iter().map(|&s| i16_to_f32(s)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave_constant_channels() {
        // 4 frames x 3 channels with per-channel constants.
        let interleaved: Vec<f32> = (0..4).flat_map(|_| [0.1, 0.2, 0.3]).collect();
        let channels = deinterleave(&interleaved, 3);
        assert_eq!(channels.len(), 3);
        assert_eq!(channels[0], vec![0.1; 4]);
        assert_eq!(channels[1], vec![0.2; 4]);
        assert_eq!(channels[2], vec![0.3; 4]);
    }

    #[test]
    fn test_deinterleave_preserves_frame_order() {
        let interleaved = [1.0, -1.0, 2.0, -2.0, 3.0, -3.0];
        let channels = deinterleave(&interleaved, 2);
        assert_eq!(channels[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(channels[1], vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_deinterleave_drops_trailing_partial_frame() {
        let interleaved = [1.0, 2.0, 3.0, 4.0, 5.0];
        let channels = deinterleave(&interleaved, 2);
        assert_eq!(channels[0], vec![1.0, 3.0]);
        assert_eq!(channels[1], vec![2.0, 4.0]);
    }

    #[test]
    fn test_deinterleave_into_reuses_scratch_without_allocation() {
        let interleaved = [0.5f32; 8];
        let mut scratch = vec![Vec::with_capacity(4), Vec::with_capacity(4)];
        deinterleave_into(&interleaved, 2, &mut scratch);
        let cap_before = scratch[0].capacity();
        deinterleave_into(&interleaved, 2, &mut scratch);
        assert_eq!(scratch[0].capacity(), cap_before);
        assert_eq!(scratch[0], vec![0.5; 4]);
    }

    #[test]
    fn test_i16_normalization() {
        assert_eq!(i16_to_f32(0), 0.0);
        assert_eq!(i16_to_f32(i16::MIN), -1.0);
        assert!(i16_to_f32(i16::MAX) < 1.0);
        assert!(i16_to_f32(i16::MAX) > 0.999);
    }
}
