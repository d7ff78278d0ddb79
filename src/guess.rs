// The plaintext byte values worth submitting as a guess.
//
// A guess is either a PKCS#7 pad value or printable ASCII below '{'. Skipping
// everything else keeps the search short and stops control bytes from
// matching valid padding by coincidence.
use crate::BLOCK_SIZE;

/// Exclusive upper bound of the guess space.
pub const GUESS_LIMIT: u8 = 0x7B;

pub fn is_plausible(byte: u8) -> bool {
    (0x01..=BLOCK_SIZE as u8).contains(&byte) || byte >= 0x20
}

/// The next plausible guess strictly greater than `current`.
pub fn next_guess(current: u8) -> Option<u8> {
    (current.checked_add(1)?..GUESS_LIMIT).find(|&byte| is_plausible(byte))
}

/// Every plausible guess from `start` (inclusive) upwards, in order.
pub fn guesses_from(start: u8) -> impl Iterator<Item = u8> {
    (start..GUESS_LIMIT).filter(|&byte| is_plausible(byte))
}
