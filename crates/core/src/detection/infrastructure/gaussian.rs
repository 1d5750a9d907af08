/// Normalized 1D Gaussian weights for an odd `kernel_size`.
///
/// `kernel_size` must be odd and >= 1. Sigma is derived from the size as
/// `0.3 * ((kernel_size - 1) * 0.5 - 1) + 0.8`, the usual automatic sigma
/// for a blur requested by kernel size alone.
pub fn gaussian_kernel_1d(kernel_size: usize) -> Vec<f32> {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    let sigma = 0.3 * ((kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (kernel_size / 2) as f64;
    let mut kernel_f64: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel_f64.iter().sum();
    for v in &mut kernel_f64 {
        *v /= sum;
    }
    kernel_f64.iter().map(|&v| v as f32).collect()
}

/// Mirror an out-of-range index back into `0..len` without repeating the
/// edge pixel (`gfedcb|abcdefgh|gfedcba`).
fn reflect_101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = i;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

/// Blurs interleaved 8-bit pixels in place with a `kernel_size` Gaussian,
/// horizontal pass first, borders mirrored by [`reflect_101`].
pub fn separable_gaussian_blur(
    data: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    kernel_size: usize,
) {
    if kernel_size <= 1 || width == 0 || height == 0 {
        return;
    }
    let kernel = gaussian_kernel_1d(kernel_size);
    let half = kernel_size as isize / 2;
    let at = |x: usize, y: usize, c: usize| (y * width + x) * channels + c;

    let mut rows = vec![0.0f32; width * height * channels];
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                rows[at(x, y, c)] = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| {
                        let sx = reflect_101(x as isize + k as isize - half, width);
                        data[at(sx, y, c)] as f32 * w
                    })
                    .sum();
            }
        }
    }

    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let sum: f32 = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| {
                        let sy = reflect_101(y as isize + k as isize - half, height);
                        rows[at(x, sy, c)] * w
                    })
                    .sum();
                data[at(x, y, c)] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Shrinks interleaved pixels by an integer factor, each output pixel being
/// the rounded mean of its `scale`×`scale` block.
///
/// Output dimensions are `width / scale` × `height / scale` (floored). At a
/// factor of 2 this equals bilinear sampling at half resolution.
pub fn downscale(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    scale: usize,
) -> (Vec<u8>, usize, usize) {
    let new_w = width / scale;
    let new_h = height / scale;
    let mut out = vec![0u8; new_w * new_h * channels];
    let count = (scale * scale) as u32;

    for y in 0..new_h {
        for x in 0..new_w {
            for c in 0..channels {
                let mut sum = 0u32;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let sy = y * scale + dy;
                        let sx = x * scale + dx;
                        sum += data[(sy * width + sx) * channels + c] as u32;
                    }
                }
                out[(y * new_w + x) * channels + c] = ((sum + count / 2) / count) as u8;
            }
        }
    }

    (out, new_w, new_h)
}
