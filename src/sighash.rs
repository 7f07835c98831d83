//! Legacy transaction signature hashing.
//!
//! Builds the 32-byte digest a signature commits to: the spending
//! transaction with all signature scripts blanked, the subscript
//! spliced into the input being signed, the hash-type modifiers
//! applied, then the wire serialization double-SHA256'd with the
//! 4-byte hash type appended. Every quirk of the historical algorithm
//! is preserved, most notably the `SIGHASH_SINGLE` out-of-range case.

use bitcoin::{
    consensus,
    hashes::{sha256d, Hash},
    Amount, ScriptBuf, Sequence, Transaction, Witness,
};

/// Sign all outputs (also the fallback for unrecognized low bits).
pub const SIG_HASH_ALL: u8 = 0x01;
/// Sign no outputs.
pub const SIG_HASH_NONE: u8 = 0x02;
/// Sign only the output paired with the signed input.
pub const SIG_HASH_SINGLE: u8 = 0x03;
/// Commit to this input alone, letting others be added later.
pub const SIG_HASH_ANYONE_CAN_PAY: u8 = 0x80;
/// Low bits that select the output-handling mode.
pub const SIG_HASH_MASK: u8 = 0x1f;

/// Computes the digest committed to by a signature with the given
/// hash type over `subscript` (the already-filtered script code).
pub fn signature_hash(
    subscript: &[u8],
    hash_type: u8,
    tx: &Transaction,
    input_idx: usize,
) -> [u8; 32] {
    // Historical wart: signing a non-existent paired output yields the
    // constant digest 1 instead of an error. Consensus-critical.
    if hash_type & SIG_HASH_MASK == SIG_HASH_SINGLE && input_idx >= tx.output.len() {
        let mut one = [0u8; 32];
        one[0] = 1;
        return one;
    }

    let mut tx_copy = tx.clone();
    for input in &mut tx_copy.input {
        input.script_sig = ScriptBuf::new();
        input.witness = Witness::new();
    }
    tx_copy.input[input_idx].script_sig = ScriptBuf::from_bytes(subscript.to_vec());

    match hash_type & SIG_HASH_MASK {
        SIG_HASH_NONE => {
            tx_copy.output.clear();
            zero_other_sequences(&mut tx_copy, input_idx);
        }
        SIG_HASH_SINGLE => {
            tx_copy.output.truncate(input_idx + 1);
            for output in &mut tx_copy.output[..input_idx] {
                // u64::MAX serializes as the -1 value sentinel.
                output.value = Amount::from_sat(u64::MAX);
                output.script_pubkey = ScriptBuf::new();
            }
            zero_other_sequences(&mut tx_copy, input_idx);
        }
        _ => {}
    }

    if hash_type & SIG_HASH_ANYONE_CAN_PAY != 0 {
        let own = tx_copy.input.swap_remove(input_idx);
        tx_copy.input = vec![own];
    }

    let mut preimage = consensus::serialize(&tx_copy);
    preimage.extend_from_slice(&u32::from(hash_type).to_le_bytes());
    sha256d::Hash::hash(&preimage).to_byte_array()
}

fn zero_other_sequences(tx: &mut Transaction, input_idx: usize) {
    for (idx, input) in tx.input.iter_mut().enumerate() {
        if idx != input_idx {
            input.sequence = Sequence::ZERO;
        }
    }
}
