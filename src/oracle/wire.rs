// Framing for the oracle protocol.
//
// A request is
//
//     < num_blocks(1) || ciphertext(16 * num_blocks) || terminator(1) >
//
// and the reply is at most two bytes, the first being an ASCII '1' for good
// padding or '0' for bad padding. Anything else is a malformed reply.
use crate::{Error, Result, Verdict, BLOCK_SIZE};

pub const REQUEST_TERMINATOR: u8 = 0x00;
pub const REPLY_LEN: usize = 2;

const MAX_BLOCKS: usize = u8::MAX as usize;

pub fn encode_request(ciphertext: &[u8]) -> Result<Vec<u8>> {
    let n_blocks = ciphertext.len() / BLOCK_SIZE;
    if ciphertext.len() % BLOCK_SIZE != 0 || n_blocks == 0 || n_blocks > MAX_BLOCKS {
        return Err(Error::InvalidCiphertextLength {
            len: ciphertext.len(),
        });
    }
    let mut request = Vec::with_capacity(ciphertext.len() + 2);
    request.push(n_blocks as u8);
    request.extend_from_slice(ciphertext);
    request.push(REQUEST_TERMINATOR);
    Ok(request)
}

pub fn encode_reply(verdict: Verdict) -> [u8; REPLY_LEN] {
    match verdict {
        Verdict::Valid => *b"1\0",
        Verdict::Invalid => *b"0\0",
        Verdict::Malformed => *b"-1",
    }
}

pub fn parse_verdict(reply: &[u8]) -> Verdict {
    match reply.first() {
        Some(b'1') => Verdict::Valid,
        Some(b'0') => Verdict::Invalid,
        _ => Verdict::Malformed,
    }
}
