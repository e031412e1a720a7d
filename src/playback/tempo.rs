use super::metadata::FrameMetadata;

/// Spread each run of frames sharing one `(pattern, row)` evenly across that row.
///
/// Frame `i` of a run of length `n` gets `row + i/n`. Must run once, on
/// unsmoothed rows, after scroll segmentation.
pub fn smooth_variable_tempo(frames: &mut [FrameMetadata]) {
    let num_frames = frames.len();
    let mut f = 0;

    while f < num_frames {
        let pattern = frames[f].pattern_index;
        let row = frames[f].row_position;

        let run_end = frames[f + 1..]
            .iter()
            .position(|next| next.pattern_index != pattern || next.row_position != row)
            .map_or(num_frames, |offset| f + 1 + offset);

        let run_len = run_end - f;
        for (i, frame) in frames[f..run_end].iter_mut().enumerate() {
            frame.row_position += i as f32 / run_len as f32;
        }

        f = run_end;
    }
}
