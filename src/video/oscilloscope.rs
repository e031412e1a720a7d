/// Screen rectangle an oscilloscope trace is fitted into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScopeRect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

/// Walk from `position` to the nearest zero crossing so the trace holds still between frames.
///
/// Positive samples search backward, negative samples search forward, a zero
/// sample is already a crossing. At most `max_lookback` steps are taken.
pub fn find_anchor(wav: &[i16], position: usize, max_lookback: usize) -> usize {
    if wav.is_empty() {
        return 0;
    }

    let last = wav.len() - 1;
    let mut pos = position.min(last);
    let orig = wav[pos];

    for _ in 0..max_lookback {
        if orig > 0 {
            if pos == 0 {
                break;
            }
            pos -= 1;
            if wav[pos] < 0 {
                break;
            }
        } else if orig < 0 {
            if pos == last {
                break;
            }
            pos += 1;
            if wav[pos] > 0 {
                break;
            }
        } else {
            break;
        }
    }

    pos
}

/// Fill `points` with a polyline of the waveform around `position`.
///
/// Samples are taken over `window_size` samples centred on the anchor, scaled
/// by `scale_y` and clamped to the 16-bit range. Higher amplitudes map to
/// smaller Y.
pub fn generate_oscilloscope(
    wav: &[i16],
    position: usize,
    window_size: usize,
    max_lookback: usize,
    scale_y: f32,
    rect: ScopeRect,
    points: &mut [[f32; 2]],
) {
    let num_points = points.len();
    if num_points == 0 {
        return;
    }

    let anchor = find_anchor(wav, position, max_lookback) as i64;
    let window = window_size as i64;
    let last = wav.len() as i64 - 1;

    let center_y = (rect.min_y + rect.max_y) * 0.5;
    let half_height = (rect.max_y - rect.min_y) * 0.5;

    for (i, point) in points.iter_mut().enumerate() {
        let sample = if wav.is_empty() {
            0
        } else {
            let idx = (anchor - window / 2 + i as i64 * window / num_points as i64).clamp(0, last);
            ((wav[idx as usize] as f32 * scale_y) as i32).clamp(i16::MIN as i32, i16::MAX as i32)
        };

        let t = if num_points > 1 {
            i as f32 / (num_points - 1) as f32
        } else {
            0.0
        };

        point[0] = rect.min_x + (rect.max_x - rect.min_x) * t;
        point[1] = center_y - sample as f32 / 32768.0 * half_height;
    }
}
