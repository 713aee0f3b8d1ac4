// Nucleotide codes: A=0, C=1, G=2, T=3; everything else is the wildcard
pub const NUCLEOTIDE_ALPHABET_SIZE: usize = 4;

/// Code given to every byte that is not A, C, G or T.
pub const WILDCARD_CODE: u8 = 4;

// Function to convert a base character to its 0-3 encoding
// A=0, C=1, G=2, T=3, N=4
#[inline(always)]
pub fn base_to_code(base: u8) -> u8 {
    match base {
        b'A' | b'a' => 0,
        b'C' | b'c' => 1,
        b'G' | b'g' => 2,
        b'T' | b't' => 3,
        _ => WILDCARD_CODE, // N or any other character
    }
}

// Inverse of base_to_code, uppercase. Codes >= 4 print as N.
#[inline(always)]
pub fn code_to_base(code: u8) -> u8 {
    match code {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        3 => b'T',
        _ => b'N',
    }
}

/// Encode a DNA sequence to numeric codes in bulk
/// Converts ASCII bases (ACGTN) to numeric codes (01234)
/// Case-insensitive: A/a -> 0, C/c -> 1, G/g -> 2, T/t -> 3, other -> 4
///
/// # Example
/// ```
/// use ferrous_dband::alignment::utils::encode_sequence;
///
/// let seq = b"ACGTN";
/// let encoded = encode_sequence(seq);
/// assert_eq!(encoded, vec![0, 1, 2, 3, 4]);
/// ```
#[inline]
pub fn encode_sequence(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| base_to_code(b)).collect()
}

/// Decode numeric codes back to uppercase ASCII bases.
///
/// # Example
/// ```
/// use ferrous_dband::alignment::utils::{decode_sequence, encode_sequence};
///
/// let encoded = encode_sequence(b"acgtx");
/// assert_eq!(decode_sequence(&encoded), b"ACGTN".to_vec());
/// ```
#[inline]
pub fn decode_sequence(codes: &[u8]) -> Vec<u8> {
    codes.iter().map(|&c| code_to_base(c)).collect()
}
