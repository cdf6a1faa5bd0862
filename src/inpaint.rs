//! Diffusion fill for masked pixels.
//!
//! Runs in discrete passes. Each pass scans every still-masked pixel,
//! averages its currently-unmasked 8-neighbors per channel, and defers
//! the writes; after the scan, all fills are applied and those pixels
//! unmasked. Batching makes a pass independent of traversal order: a
//! pixel resolved in pass `k` only feeds neighbors from pass `k+1` on.
//! The fill front advances at least one pixel per pass, so the region
//! resolves in at most `width + height` passes; if a pass produces no
//! candidates (no masked pixel has an unmasked neighbor), the remaining
//! pixels are left as they are.

use image::{Rgba, RgbaImage};

use crate::mask::Mask;

/// Fill every masked pixel of `region` from its unmasked neighbors.
///
/// Mutates `region` and `mask` in place; filled pixels are cleared from
/// the mask. Returns the number of masked pixels left unresolved (zero in
/// practice; non-zero only when the mask has no unmasked seed at all or
/// the pass bound is exhausted). Never fails.
///
/// # Panics
///
/// Panics in debug builds if `mask` dimensions differ from `region`.
pub fn diffuse_fill(region: &mut RgbaImage, mask: &mut Mask) -> usize {
    debug_assert_eq!(region.width(), mask.width());
    debug_assert_eq!(region.height(), mask.height());

    let width = mask.width();
    let height = mask.height();
    let mut remaining = mask.count_set();
    if remaining == 0 {
        return 0;
    }

    let max_passes = (width as usize) + (height as usize);
    let mut fills: Vec<(u32, u32, Rgba<u8>)> = Vec::new();

    for pass in 0..max_passes {
        fills.clear();

        for y in 0..height {
            for x in 0..width {
                if !mask.is_set(x, y) {
                    continue;
                }
                if let Some(avg) = neighbor_average(region, mask, x, y) {
                    fills.push((x, y, avg));
                }
            }
        }

        if fills.is_empty() {
            log::trace!("inpaint: pass {pass} found no fill candidates, {remaining} left");
            break;
        }

        for &(x, y, px) in &fills {
            region.put_pixel(x, y, px);
            mask.clear(x, y);
        }
        remaining -= fills.len();
        log::trace!("inpaint: pass {pass} filled {} pixels, {remaining} left", fills.len());

        if remaining == 0 {
            break;
        }
    }

    remaining
}

/// Average of all currently-unmasked 8-neighbors of `(x, y)`, rounded to
/// nearest per channel. `None` when every in-bounds neighbor is masked.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn neighbor_average(region: &RgbaImage, mask: &Mask, x: u32, y: u32) -> Option<Rgba<u8>> {
    let mut sum = [0_u32; 4];
    let mut count = 0_u32;

    for dy in -1_i64..=1 {
        for dx in -1_i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || ny < 0 || nx >= i64::from(mask.width()) || ny >= i64::from(mask.height())
            {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if mask.is_set(nx, ny) {
                continue;
            }
            let px = region.get_pixel(nx, ny);
            for ch in 0..4 {
                sum[ch] += u32::from(px[ch]);
            }
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    // integer round-half-up matches rounding the per-channel mean
    let avg = sum.map(|s| ((s + count / 2) / count) as u8);
    Some(Rgba(avg))
}
