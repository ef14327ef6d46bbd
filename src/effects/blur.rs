use crate::foundation::core::Canvas;
use crate::foundation::error::{MemeError, MemeResult};

/// Separable Gaussian blur over premultiplied RGBA8 with clamp-to-edge sampling.
///
/// `sigma` follows CSS `blur(<length>)`: the standard deviation in pixels. The kernel
/// radius is `ceil(3 * sigma)`, capped at the longer image side; `sigma == 0` is the identity.
/// Taps that fall outside the image are folded onto the edge pixel, so each pass costs at most
/// one tap per pixel of the row or column.
pub(crate) fn gaussian_blur_premul(
    src: &[u8],
    canvas: Canvas,
    sigma: f32,
) -> MemeResult<Vec<u8>> {
    let expected_len = canvas.rgba8_len()?;
    if src.len() != expected_len {
        return Err(MemeError::render(
            "blur expects a buffer matching width*height*4",
        ));
    }
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(MemeError::invalid_filter("blur radius must be finite and >= 0"));
    }
    let radius = kernel_radius(sigma, canvas);
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    blur_pass(src, &mut tmp, canvas, &kernel, Axis::Horizontal);
    blur_pass(&tmp, &mut out, canvas, &kernel, Axis::Vertical);
    Ok(out)
}

fn kernel_radius(sigma: f32, canvas: Canvas) -> u32 {
    let cap = canvas.width.max(canvas.height);
    let wanted = (f64::from(sigma) * 3.0).ceil();
    if wanted >= f64::from(cap) {
        cap
    } else {
        wanted as u32
    }
}

/// Normalized kernel in Q16 fixed point; weights sum to exactly 65536.
fn kernel_q16(radius: u32, sigma: f32) -> MemeResult<Vec<u32>> {
    let r = i64::from(radius);
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(MemeError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn blur_pass(src: &[u8], dst: &mut [u8], canvas: Canvas, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i64;
    // prefix[i] = k[0] + .. + k[i - 1]
    let mut prefix = Vec::with_capacity(k.len() + 1);
    prefix.push(0u64);
    for &kw in k {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + u64::from(kw));
    }
    let total = prefix[k.len()];

    let w = i64::from(canvas.width);
    let h = i64::from(canvas.height);
    let n = match axis {
        Axis::Horizontal => w,
        Axis::Vertical => h,
    };
    for y in 0..h {
        for x in 0..w {
            let p = match axis {
                Axis::Horizontal => x,
                Axis::Vertical => y,
            };
            let lo = (p - radius).max(0);
            let hi = (p + radius).min(n - 1);

            let mut acc = [0u64; 4];
            for s in lo..=hi {
                let ki = (s - p + radius) as usize;
                // Taps past either edge clamp onto the edge pixel.
                let weight = match (s == lo, s == hi) {
                    (true, true) => total,
                    (true, false) => prefix[ki + 1],
                    (false, true) => total - prefix[ki],
                    (false, false) => u64::from(k[ki]),
                };
                let (sx, sy) = match axis {
                    Axis::Horizontal => (s, y),
                    Axis::Vertical => (x, s),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += weight * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for (c, a) in acc.iter().enumerate() {
                dst[out_idx + c] = (((a + 32768) >> 16).min(255)) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
