//! Grid resampling with pixel-centre alignment.
//!
//! - `bilinear`: smooth interpolation for scalar fields.
//! - `nearest`: label-preserving sampling for category maps and masks; never
//!   produces a value that is not present in the source.
//!
//! Both functions expect a non-empty source grid in row-major layout.

/// Map destination index `d` to a (fractional) source coordinate.
#[inline]
fn source_coord(d: usize, src: usize, dst: usize) -> f32 {
    let scale = src as f32 / dst as f32;
    ((d as f32 + 0.5) * scale - 0.5).clamp(0.0, (src - 1) as f32)
}

#[inline]
fn nearest_index(d: usize, src: usize, dst: usize) -> usize {
    let s = ((d as f64 + 0.5) * src as f64 / dst as f64).floor() as usize;
    s.min(src - 1)
}

/// Resize a `src_w × src_h` f32 grid to `dst_w × dst_h` with bilinear interpolation.
pub fn bilinear(src: &[f32], src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Vec<f32> {
    debug_assert_eq!(src.len(), src_w * src_h);
    if src_w == dst_w && src_h == dst_h {
        return src.to_vec();
    }
    if dst_w == 0 || dst_h == 0 {
        return Vec::new();
    }

    let xs: Vec<(usize, usize, f32)> = (0..dst_w)
        .map(|x| {
            let sx = source_coord(x, src_w, dst_w);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            (x0, x1, sx - x0 as f32)
        })
        .collect();

    let mut out = Vec::with_capacity(dst_w * dst_h);
    for y in 0..dst_h {
        let sy = source_coord(y, src_h, dst_h);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(src_h - 1);
        let ty = sy - y0 as f32;
        let row0 = &src[y0 * src_w..(y0 + 1) * src_w];
        let row1 = &src[y1 * src_w..(y1 + 1) * src_w];
        for &(x0, x1, tx) in &xs {
            let top = row0[x0] + (row0[x1] - row0[x0]) * tx;
            let bottom = row1[x0] + (row1[x1] - row1[x0]) * tx;
            out.push(top + (bottom - top) * ty);
        }
    }
    out
}

/// Resize a `src_w × src_h` grid to `dst_w × dst_h` by nearest-neighbour sampling.
pub fn nearest<T: Copy>(
    src: &[T],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
) -> Vec<T> {
    debug_assert_eq!(src.len(), src_w * src_h);
    if src_w == dst_w && src_h == dst_h {
        return src.to_vec();
    }

    let xs: Vec<usize> = (0..dst_w).map(|x| nearest_index(x, src_w, dst_w)).collect();
    let mut out = Vec::with_capacity(dst_w * dst_h);
    for y in 0..dst_h {
        let row = nearest_index(y, src_h, dst_h) * src_w;
        out.extend(xs.iter().map(|&sx| src[row + sx]));
    }
    out
}
