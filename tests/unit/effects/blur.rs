use super::*;

fn canvas(width: u32, height: u32) -> Canvas {
    Canvas { width, height }
}

#[test]
fn blur_sigma_0_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    let out = gaussian_blur_premul(&src, canvas(1, 2), 0.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn blur_constant_image_is_identity() {
    let (w, h) = (4u32, 3u32);
    let px = [10u8, 20u8, 30u8, 40u8];
    let src = px.repeat((w * h) as usize);
    let out = gaussian_blur_premul(&src, canvas(w, h), 1.5).unwrap();
    assert_eq!(out, src);
}

#[test]
fn blur_spreads_energy_from_single_pixel() {
    let (w, h) = (7u32, 7u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((3 * w + 3) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = gaussian_blur_premul(&src, canvas(w, h), 0.8).unwrap();

    let nonzero = out.chunks_exact(4).filter(|px| px[3] != 0).count();
    assert!(nonzero > 1);

    let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
    assert!((sum_a as i32 - 255).abs() <= 8);
}

#[test]
fn blur_rejects_bad_inputs() {
    assert!(matches!(
        gaussian_blur_premul(&[0u8; 4], canvas(1, 1), f32::NAN),
        Err(MemeError::InvalidFilter(_))
    ));
    assert!(matches!(
        gaussian_blur_premul(&[0u8; 3], canvas(1, 1), 1.0),
        Err(MemeError::Render(_))
    ));
}

#[test]
fn kernel_weights_sum_to_one_in_q16() {
    let k = kernel_q16(6, 2.0).unwrap();
    assert_eq!(k.len(), 13);
    assert_eq!(k.iter().sum::<u32>(), 65536);
}

/// Direct clamp-to-edge convolution, one tap per kernel weight.
fn reference_blur(src: &[u8], w: i64, h: i64, k: &[u32]) -> Vec<u8> {
    let r = (k.len() / 2) as i64;
    let pass = |input: &[u8], horizontal: bool| {
        let mut out = vec![0u8; input.len()];
        for y in 0..h {
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let d = ki as i64 - r;
                    let (sx, sy) = if horizontal {
                        ((x + d).clamp(0, w - 1), y)
                    } else {
                        (x, (y + d).clamp(0, h - 1))
                    };
                    let idx = ((sy * w + sx) * 4) as usize;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(input[idx + c]);
                    }
                }
                let o = ((y * w + x) * 4) as usize;
                for c in 0..4 {
                    out[o + c] = ((acc[c] + 32768) >> 16).min(255) as u8;
                }
            }
        }
        out
    };
    pass(&pass(src, true), false)
}

#[test]
fn folded_edges_match_direct_convolution() {
    let (w, h) = (7u32, 5u32);
    let src: Vec<u8> = (0..w * h * 4).map(|i| ((i * 37 + 11) % 256) as u8).collect();
    // radius 8 reaches past every edge of a 7x5 image
    let sigma = 2.5;
    let k = kernel_q16(kernel_radius(sigma, canvas(w, h)), sigma).unwrap();

    let out = gaussian_blur_premul(&src, canvas(w, h), sigma).unwrap();
    assert_eq!(out, reference_blur(&src, i64::from(w), i64::from(h), &k));
}

#[test]
fn radius_is_capped_by_the_longer_side() {
    assert_eq!(kernel_radius(1.0, canvas(10, 4)), 3);
    assert_eq!(kernel_radius(50.0, canvas(10, 4)), 10);
    assert_eq!(kernel_radius(3.0e8, canvas(2, 2)), 2);
    assert_eq!(kernel_radius(f32::MAX, canvas(3, 1)), 3);
}

#[test]
fn huge_sigma_blurs_without_blowing_up() {
    let src = [0u8, 0, 0, 255, 255, 255, 255, 255, 0, 0, 0, 255, 255, 255, 255, 255];
    let out = gaussian_blur_premul(&src, canvas(2, 2), 3.0e8).unwrap();
    assert_eq!(out.len(), src.len());
    for px in out.chunks_exact(4) {
        assert!(px[0] > 0 && px[0] < 255, "{px:?}");
        assert_eq!(px[3], 255);
    }

    let flat = [90u8, 60, 30, 255].repeat(4);
    assert_eq!(
        gaussian_blur_premul(&flat, canvas(2, 2), f32::MAX).unwrap(),
        flat
    );
}
