//! Text armor: packs bytes into printable 6-bit symbols and back.
//!
//! This is not base64. The alphabet differs and bits are packed
//! low-bit-first across byte boundaries:
//!
//! ```text
//! bytes    b0                b1                b2
//! symbol0  b0[0..6]
//! symbol1  b0[6..8] | b1[0..4] << 2
//! symbol2  b1[4..8] | b2[0..2] << 4
//! symbol3  b2[2..8]
//! ```
//!
//! No padding is emitted; a trailing group of one or two bytes becomes two
//! or three symbols, so the output length modulo 4 is never 1.

use crate::config::ArmorMode;
use crate::error::CodecError;

/// Symbol alphabet, indexed by 6-bit code.
pub const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789*+";

const INVALID: u8 = 0xFF;

static DECODE_TABLE: [u8; 256] = build_decode_table();

const fn build_decode_table() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Number of symbols produced for `n` input bytes.
pub fn packed_len(n: usize) -> usize {
    n / 3 * 4
        + match n % 3 {
            0 => 0,
            1 => 2,
            _ => 3,
        }
}

/// Packs bytes into armored text.
pub fn pack(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(packed_len(bytes.len()));
    let mut push = |code: u8| out.push(char::from(ALPHABET[usize::from(code & 0x3f)]));

    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        push(b0);
        match *chunk {
            [_] => push(b0 >> 6),
            [_, b1] => {
                push((b1 & 0x0f) << 2 | b0 >> 6);
                push(b1 >> 4);
            }
            [_, b1, b2] => {
                push((b1 & 0x0f) << 2 | b0 >> 6);
                push((b2 & 0x03) << 4 | b1 >> 4);
                push(b2 >> 2);
            }
            _ => unreachable!("chunks(3) yields 1 to 3 bytes"),
        }
    }
    out
}

/// Unpacks armored text, mapping unknown symbols to code 0.
pub fn unpack(text: &str) -> Vec<u8> {
    let codes: Vec<u8> = text
        .chars()
        .map(|c| lookup(c).unwrap_or(0))
        .collect();
    unpack_codes(&codes)
}

/// Unpacks armored text, rejecting unknown symbols and a lone trailing
/// symbol.
pub fn unpack_strict(text: &str) -> Result<Vec<u8>, CodecError> {
    let codes = text
        .chars()
        .enumerate()
        .map(|(index, symbol)| lookup(symbol).ok_or(CodecError::InvalidSymbol { symbol, index }))
        .collect::<Result<Vec<u8>, _>>()?;
    if codes.len() % 4 == 1 {
        return Err(CodecError::TruncatedArmor {
            length: codes.len(),
        });
    }
    Ok(unpack_codes(&codes))
}

/// Unpacks armored text under the given mode.
pub fn unpack_with(text: &str, mode: ArmorMode) -> Result<Vec<u8>, CodecError> {
    match mode {
        ArmorMode::Lenient => Ok(unpack(text)),
        ArmorMode::Strict => unpack_strict(text),
    }
}

fn lookup(symbol: char) -> Option<u8> {
    let code = u8::try_from(symbol)
        .map(|b| DECODE_TABLE[usize::from(b)])
        .unwrap_or(INVALID);
    (code != INVALID).then_some(code)
}

fn unpack_codes(codes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(codes.len() / 4 * 3 + 2);

    for group in codes.chunks(4) {
        match *group {
            // A lone symbol carries only 6 bits, not a whole byte.
            [_] => {}
            [c0, c1] => out.push(c0 | (c1 & 0x03) << 6),
            [c0, c1, c2] => {
                out.push(c0 | (c1 & 0x03) << 6);
                out.push(c1 >> 2 | (c2 & 0x0f) << 4);
            }
            [c0, c1, c2, c3] => {
                out.push(c0 | (c1 & 0x03) << 6);
                out.push(c1 >> 2 | (c2 & 0x0f) << 4);
                out.push(c2 >> 4 | c3 << 2);
            }
            _ => unreachable!("chunks(4) yields 1 to 4 codes"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty() {
        assert_eq!(pack(&[]), "");
        assert!(unpack("").is_empty());
    }

    #[test]
    fn test_single_byte() {
        let text = pack(&[0]);
        assert_eq!(text, "AA");
        assert_eq!(unpack(&text), vec![0]);

        // 0xC1: low 6 bits 1 -> 'B', top 2 bits 3 -> 'D'
        assert_eq!(pack(&[0xC1]), "BD");
    }

    #[test]
    fn test_full_group() {
        let text = pack(&[255, 255, 255]);
        assert_eq!(text, "++++");
        assert_eq!(unpack(&text), vec![255, 255, 255]);
    }

    #[test]
    fn test_low_bit_first_packing() {
        // b0=0x01 b1=0x02 b2=0x03
        // s0 = 1, s1 = (2 & 0xf) << 2 | 0 = 8, s2 = (3 & 3) << 4 | 0 = 48, s3 = 0
        assert_eq!(pack(&[1, 2, 3]), "BIwA");
        assert_eq!(unpack("BIwA"), vec![1, 2, 3]);
    }

    #[test]
    fn test_trailing_lengths() {
        assert_eq!(pack(&[33]).len(), 2);
        assert_eq!(pack(&[33, 44]).len(), 3);
        assert_eq!(pack(&[33, 44, 55]).len(), 4);
        assert_eq!(pack(&[33, 44, 55, 66]).len(), 6);
        for n in 0..32 {
            assert_eq!(pack(&vec![0xAA; n]).len(), packed_len(n));
            assert_ne!(packed_len(n) % 4, 1);
        }
    }

    #[test]
    fn test_alphabet() {
        assert_eq!(ALPHABET.len(), 64);
        assert_eq!(ALPHABET[0], b'A');
        assert_eq!(ALPHABET[26], b'a');
        assert_eq!(ALPHABET[52], b'0');
        assert_eq!(ALPHABET[62], b'*');
        assert_eq!(ALPHABET[63], b'+');
        for (code, &symbol) in ALPHABET.iter().enumerate() {
            assert_eq!(lookup(char::from(symbol)), Some(code as u8));
        }
        assert_eq!(lookup('/'), None);
        assert_eq!(lookup('='), None);
        assert_eq!(lookup('\u{e9}'), None);
    }

    #[test]
    fn test_reference_cases() {
        let cases: [&[u8]; 10] = [
            &[1, 3, 32, 11, 13, 123],
            &[],
            &[33],
            &[33, 44],
            &[33, 44, 55],
            &[33, 44, 55, 66],
            &[33, 44, 55, 66, 77],
            &[33, 44, 55, 66, 77, 88],
            &[0xFF, 0xFE, 0xFD, 0xFC, 0xFB],
            &[0xFF, 0xFE, 0xFD, 0xFC],
        ];
        for input in cases {
            assert_eq!(unpack(&pack(input)), input);
            assert_eq!(unpack_strict(&pack(input)).unwrap(), input);
        }
    }

    #[test]
    fn test_lenient_unknown_symbols() {
        // '=' and '/' are not in the alphabet and read as 'A'
        assert_eq!(unpack("=A"), unpack("AA"));
        assert_eq!(unpack("B/"), vec![1]);
        // A lone trailing symbol is dropped
        assert_eq!(unpack("++++B"), vec![255, 255, 255]);
    }

    #[test]
    fn test_strict_rejects() {
        assert_eq!(
            unpack_strict("AB=A"),
            Err(CodecError::InvalidSymbol {
                symbol: '=',
                index: 2
            })
        );
        assert_eq!(
            unpack_strict("++++B"),
            Err(CodecError::TruncatedArmor { length: 5 })
        );
        assert!(unpack_with("AB=A", ArmorMode::Lenient).is_ok());
        assert!(unpack_with("AB=A", ArmorMode::Strict).is_err());
    }

    proptest! {
        #[test]
        fn prop_pack_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
            let text = pack(&data);
            prop_assert_eq!(text.len(), packed_len(data.len()));
            prop_assert!(text.bytes().all(|b| ALPHABET.contains(&b)));
            prop_assert_eq!(unpack(&text), data.clone());
            prop_assert_eq!(unpack_strict(&text).unwrap(), data);
        }
    }
}
