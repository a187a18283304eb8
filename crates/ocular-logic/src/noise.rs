//! Seeded 1-D gradient noise.
//!
//! Each integer lattice point gets a pseudo-random gradient from a hash of
//! (seed, index); values between lattice points blend the two neighbouring
//! ramps with a quintic fade. Output is remapped to [0, 1].

/// Deterministic hash of a lattice index to a gradient in [-1, 1].
fn gradient(seed: u32, index: i32) -> f32 {
    let mut h = (seed as u64)
        .wrapping_mul(6364136223846793005)
        .wrapping_add(index as u32 as u64);
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51afd7ed558ccd);
    h ^= h >> 33;
    (h % 2001) as f32 / 1000.0 - 1.0
}

fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Gradient noise at `x`, in [0, 1]. Integer `x` always lands on 0.5.
pub fn gradient_noise(seed: u32, x: f32) -> f32 {
    let cell = x.floor();
    let i = cell as i32;
    let f = x - cell;

    let a = gradient(seed, i) * f;
    let b = gradient(seed, i.wrapping_add(1)) * (f - 1.0);
    let n = a + (b - a) * fade(f);

    // 1-D gradient noise stays within ±0.5
    (n + 0.5).clamp(0.0, 1.0)
}
