//! Seeded content generator.
//!
//! Every name and every byte of book content in the library comes from
//! [`generate`]. The seed string is hashed with BLAKE3 and the extendable
//! output of that hash is the symbol stream: four stream bytes per symbol,
//! scaled onto [`ALPHABET`]. Output depends only on the seed and position,
//! so it is identical across calls, processes and machines.
//!
//! Because symbol `i` always lives at stream offset `4 * i`, any window of a
//! generated text can be produced directly with [`generate_range`] without
//! materialising the prefix.

/// Symbols that generated text is drawn from.
pub const ALPHABET: &[u8; 28] = b"abcdefghijklmnopqrstuvwxyz.,";

const BYTES_PER_SYMBOL: usize = 4;

/// Symbols produced per XOF read.
const BLOCK_SYMBOLS: usize = 4096;

/// Generates `len` symbols from `seed`.
///
/// # Example
/// ```
/// use babylon_core::generate;
///
/// let a = generate("shelf", 16);
/// assert_eq!(a.len(), 16);
/// assert_eq!(a, generate("shelf", 16));
/// ```
pub fn generate(seed: &str, len: usize) -> String {
    generate_range(seed, 0, len)
        .into_iter()
        .map(char::from)
        .collect()
}

/// Generates the symbols at positions `offset..offset + len` of the text
/// seeded by `seed`.
///
/// `generate_range(seed, 0, n)` equals the bytes of `generate(seed, n)`, and
/// any window of it equals the matching ranged call.
pub fn generate_range(seed: &str, offset: u64, len: usize) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(seed.as_bytes());
    let mut reader = hasher.finalize_xof();
    reader.set_position(offset.saturating_mul(BYTES_PER_SYMBOL as u64));

    let mut out = Vec::with_capacity(len);
    let mut block = vec![0u8; BLOCK_SYMBOLS * BYTES_PER_SYMBOL];
    let mut remaining = len;

    while remaining > 0 {
        let symbols = remaining.min(BLOCK_SYMBOLS);
        let bytes = &mut block[..symbols * BYTES_PER_SYMBOL];
        reader.fill(bytes);
        out.extend(bytes.chunks_exact(BYTES_PER_SYMBOL).map(symbol));
        remaining -= symbols;
    }

    out
}

/// Maps four stream bytes onto the alphabet with a multiply-shift reduction.
fn symbol(word: &[u8]) -> u8 {
    let word = u32::from_le_bytes([word[0], word[1], word[2], word[3]]) as u64;
    let index = (word * ALPHABET.len() as u64) >> 32;
    ALPHABET[index as usize]
}
