//! Row/column bit packing for `/grid/led/map`, `/grid/led/row` and
//! `/grid/led/col`.
//!
//! The binary LED messages carry eight LEDs per integer argument: bit 0 is
//! the leftmost (or topmost) LED of the chunk and bit 7 the rightmost, i.e.
//! `byte = Σ bit[i] << i`.

/// Number of LEDs carried by one packed byte.
pub const CHUNK: usize = 8;

/// Packs up to eight LED values into one byte.
///
/// Any non-zero value counts as "on".  Missing trailing values count as
/// "off", and values past the eighth are ignored.
pub fn pack_row(values: &[u8]) -> u8 {
    values
        .iter()
        .take(CHUNK)
        .enumerate()
        .fold(0u8, |acc, (i, &v)| if v != 0 { acc | (1 << i) } else { acc })
}

/// Expands a packed byte back into eight `0`/`1` values.
pub fn unpack_row(byte: u8) -> [u8; CHUNK] {
    let mut out = [0u8; CHUNK];
    for (i, cell) in out.iter_mut().enumerate() {
        *cell = (byte >> i) & 1;
    }
    out
}

/// Packs a sequence of any length into one byte per 8-value chunk.
///
/// A trailing partial chunk is padded with "off".
pub fn pack_chunks(values: &[u8]) -> Vec<u8> {
    values.chunks(CHUNK).map(pack_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_row_bit_zero_is_leftmost() {
        assert_eq!(pack_row(&[1, 0, 0, 0, 0, 0, 0, 0]), 0b0000_0001);
        assert_eq!(pack_row(&[0, 0, 0, 0, 0, 0, 0, 1]), 0b1000_0000);
        assert_eq!(pack_row(&[1, 1, 0, 1, 0, 0, 0, 0]), 0b0000_1011);
    }

    #[test]
    fn test_unpack_of_pack_is_identity_for_every_binary_row() {
        // All 256 rows: small enough to enumerate exhaustively.
        for byte in 0..=u8::MAX {
            let row = unpack_row(byte);
            assert_eq!(pack_row(&row), byte);
            assert_eq!(unpack_row(pack_row(&row)), row);
        }
    }

    #[test]
    fn test_pack_row_treats_levels_as_on() {
        assert_eq!(pack_row(&[15, 0, 7]), 0b101);
    }

    #[test]
    fn test_pack_row_short_input_is_zero_padded() {
        assert_eq!(pack_row(&[1, 1]), 0b11);
        assert_eq!(pack_row(&[]), 0);
    }

    #[test]
    fn test_pack_chunks_splits_into_bytes() {
        // Arrange
        let mut values = vec![0u8; 16];
        values[0] = 1;
        values[9] = 1;

        // Act
        let packed = pack_chunks(&values);

        // Assert
        assert_eq!(packed, vec![0b0000_0001, 0b0000_0010]);
    }

    #[test]
    fn test_pack_chunks_pads_trailing_partial_chunk() {
        assert_eq!(pack_chunks(&[1; 12]), vec![0xFF, 0x0F]);
        assert!(pack_chunks(&[]).is_empty());
    }
}
