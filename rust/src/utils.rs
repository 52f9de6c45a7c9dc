use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Random value suitable as an SSRC (or as the base of consecutive SSRCs).
///
/// Collisions with SSRCs generated elsewhere are not checked.
pub(crate) fn generate_ssrc() -> u32 {
    SmallRng::from_entropy().gen_range(100_000_000..999_999_999)
}
