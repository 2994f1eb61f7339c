// Bands Module - Reduces frequency snapshots to per-bar energies and loudness

/// Reduce a frequency snapshot into `band_count` energy values in 0.0..=1.0.
///
/// When `bin_width` (Hz per sample) is known, the snapshot is first
/// restricted to the index range covering `[lo_pass_hz, hi_pass_hz]`;
/// without it the full snapshot is used. The restricted range is split into
/// `band_count` equal buckets (integer division, minimum bucket size 1), each
/// bucket's mean is normalized by 255 and raised to `curve`. Curve below 1
/// boosts quiet signal, above 1 suppresses it.
///
/// Returns all zeros for an absent or empty snapshot. `band_count` must be
/// at least 1 and `curve` positive; both are caller-controlled constants,
/// not user input.
pub fn band_values(
    data: Option<&[u8]>,
    bin_width: Option<f32>,
    band_count: usize,
    lo_pass_hz: f32,
    hi_pass_hz: Option<f32>,
    curve: f32,
) -> Vec<f32> {
    assert!(band_count >= 1, "band_count must be at least 1");
    assert!(curve > 0.0, "curve must be positive");

    let mut values = vec![0.0_f32; band_count];
    let Some(data) = data else {
        return values;
    };
    if data.is_empty() {
        return values;
    }

    let mut start_index = 0_usize;
    let mut end_index = data.len();

    if let Some(bin_width) = bin_width.filter(|&w| w > 0.0) {
        let lo = lo_pass_hz.max(0.0);
        let hi = hi_pass_hz.unwrap_or(bin_width * data.len() as f32);
        start_index = ((lo / bin_width).floor() as usize).min(data.len());
        end_index = ((hi / bin_width).ceil() as usize).min(data.len());
        if end_index <= start_index {
            // Degenerate pass-band: force a minimum range of band_count samples
            end_index = (start_index + band_count).min(data.len());
        }
    }

    let range = (end_index - start_index).max(1);
    let bucket_size = (range / band_count).max(1);

    for (band, value) in values.iter_mut().enumerate() {
        let bucket_start = start_index + band * bucket_size;
        let mut accumulator = 0.0_f32;
        let mut samples = 0_u32;

        for offset in 0..bucket_size {
            let index = bucket_start + offset;
            if index >= end_index {
                break;
            }
            accumulator += data[index] as f32;
            samples += 1;
        }

        let average = if samples > 0 {
            accumulator / samples as f32
        } else {
            0.0
        };
        *value = (average / 255.0).powf(curve);
    }

    values
}

/// Estimate overall loudness of a snapshot as RMS over all samples,
/// normalized by 255, clamped to 1 and rounded to 3 decimal places.
/// Absent or empty snapshot yields 0.
pub fn loudness(data: Option<&[u8]>) -> f32 {
    let Some(data) = data else {
        return 0.0;
    };
    if data.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = data.iter().map(|&v| (v as f64) * (v as f64)).sum();
    let rms = (sum_sq / data.len() as f64).sqrt() / 255.0;
    ((rms.min(1.0) * 1000.0).round() / 1000.0) as f32
}
