/// SplitMix64 finalizer: a bijection on `u64` with strong avalanche.
///
/// Unlike the standard hashers, the output is fixed across processes and releases,
/// which partitioning and seed derivation rely upon.
#[must_use]
#[inline]
pub const fn mix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
