//! Display-only identifiers used before the store assigns authoritative ones.
//!
//! Plot ids are cosmetic defaults the user may overwrite; duplicates are
//! possible and tolerated downstream. The display batch number only previews
//! bag ids and is discarded once the store assigns the real batch number.

use rand::Rng;

const PLOT_LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// One uppercase letter followed by a number in `1000..=9999`, e.g. `K4821`
pub fn generate_plot_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let letter = char::from(PLOT_LETTERS[rng.random_range(0..PLOT_LETTERS.len())]);
    let number: u16 = rng.random_range(1000..=9999);
    format!("{letter}{number}")
}

/// Preview batch number in `10000..=99999`
pub fn generate_display_batch_number<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(10_000..=99_999)
}

/// Pre-submission bag id, `{batchNumber}-{index+1}`
pub fn display_bag_id(batch_number: u32, index: usize) -> String {
    format!("{batch_number}-{}", index + 1)
}

/// Persisted bag id as the store writes it, zero-padded to five digits
pub fn persisted_bag_id(batch_number: u32, sequence: u32) -> String {
    format!("{batch_number:05}-{sequence}")
}
