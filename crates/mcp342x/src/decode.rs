//! Turns the bytes read back from the device into a signed count.

use crate::Resolution;

/// Bytes returned by a read: data bytes followed by the configuration echo.
///
/// At 18 bits this is `[upper, middle, lower, config]`. At lower resolutions
/// it is `[upper, lower, config, config]`.
pub type RawResponse = [u8; 4];

/// A decoded conversion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedSample {
    /// Signed count after sign adjustment.
    pub counts: i32,
    pub resolution: Resolution,
    /// Working bytes, low byte of `counts` and the resolution in bits.
    pub snapshot: [u8; 6],
}

impl DecodedSample {
    /// The configuration byte the device echoed alongside the data.
    pub fn echo(&self) -> u8 {
        self.snapshot[3]
    }
}

/// Decode `raw` as read back at `resolution`.
///
/// The device repeats the sign bit above the most significant data bit, so
/// those repeats are masked off before the bytes are assembled. A negative
/// reading (sign set on the first raw byte) then has `2^(bits - 1) - 1`
/// subtracted from the assembled magnitude.
pub fn decode(raw: &RawResponse, resolution: Resolution) -> DecodedSample {
    let mut working = [0u8; 4];

    if resolution.data_bytes() == 3 {
        working.copy_from_slice(raw);
        working[0] &= 0b0000_0001;
    } else {
        working[1..].copy_from_slice(&raw[..3]);
        match resolution {
            Resolution::Bits14 => working[1] &= 0b0001_1111,
            Resolution::Bits12 => working[1] &= 0b0000_0111,
            _ => {}
        }
    }

    let assembled =
        (i32::from(working[0]) << 16) | (i32::from(working[1]) << 8) | i32::from(working[2]);

    let negative = (raw[0] as i8) < 0;

    // Kept exactly as the fielded firmware computes it: this is not a
    // two's complement reconstruction.
    let counts = if negative {
        let largest = (1i32 << (resolution.bits() - 1)) - 1;
        assembled - largest
    } else {
        assembled
    };

    let [w0, w1, w2, w3] = working;

    DecodedSample {
        counts,
        resolution,
        snapshot: [w0, w1, w2, w3, counts as u8, resolution.bits()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_16_bit() {
        let sample = decode(&[0x12, 0x34, 0xC1, 0xC1], Resolution::Bits16);
        assert_eq!(sample.counts, 0x1234);
        assert_eq!(sample.counts, 4660);
        assert_eq!(sample.snapshot, [0x00, 0x12, 0x34, 0xC1, 0x34, 16]);
        assert_eq!(sample.echo(), 0xC1);
    }

    #[test]
    fn two_byte_mode_reads_data_from_the_front() {
        // A leading zero is a zero upper data byte, not padding.
        let sample = decode(&[0x00, 0x12, 0x34, 0xC1], Resolution::Bits16);
        assert_eq!(sample.counts, 0x12);
        assert_eq!(sample.echo(), 0x34);
    }

    #[test]
    fn positive_18_bit_keeps_bit_16() {
        let sample = decode(&[0x01, 0x00, 0x00, 0x0C], Resolution::Bits18);
        assert_eq!(sample.counts, 0x1_0000);
        assert_eq!(sample.snapshot, [0x01, 0x00, 0x00, 0x0C, 0x00, 18]);
        assert_eq!(sample.echo(), 0x0C);

        let sample = decode(&[0x00, 0x01, 0x02, 0x0F], Resolution::Bits18);
        assert_eq!(sample.counts, 258);
    }

    #[test]
    fn negative_subtracts_largest_count() {
        // 16 bit: 0xFFFE - (2^15 - 1)
        let sample = decode(&[0xFF, 0xFE, 0x88, 0x88], Resolution::Bits16);
        assert_eq!(sample.counts, 0xFFFE - 32_767);
        assert_eq!(sample.counts, 32_767);
        assert_eq!(sample.snapshot, [0x00, 0xFF, 0xFE, 0x88, 0xFF, 16]);

        // 12 bit: middle byte masked to 0x07, 0x7FF - (2^11 - 1)
        let sample = decode(&[0xFF, 0xFF, 0x80, 0x80], Resolution::Bits12);
        assert_eq!(sample.snapshot[1], 0x07);
        assert_eq!(sample.counts, 0);

        // 14 bit: middle byte masked to 0x1F, 0x0010 - (2^13 - 1)
        let sample = decode(&[0xE0, 0x10, 0x84, 0x84], Resolution::Bits14);
        assert_eq!(sample.snapshot[1], 0x00);
        assert_eq!(sample.counts, 16 - 8_191);
        assert_eq!(sample.snapshot[4], (16i32 - 8_191) as u8);

        // 18 bit: upper byte masked to bit 0, 0x1FFFF - (2^17 - 1)
        let sample = decode(&[0xFF, 0xFF, 0xFF, 0x0F], Resolution::Bits18);
        assert_eq!(sample.snapshot[0], 0x01);
        assert_eq!(sample.counts, 0);
    }

    #[test]
    fn negative_is_not_twos_complement() {
        // -2 in 16 bit two's complement is 0xFFFE.
        let sample = decode(&[0xFF, 0xFE, 0x00, 0x00], Resolution::Bits16);
        assert_ne!(sample.counts, -2);
    }

    #[test]
    fn positive_bytes_skip_masking_at_16_bit() {
        let sample = decode(&[0x7F, 0xFF, 0x98, 0x98], Resolution::Bits16);
        assert_eq!(sample.counts, 0x7FFF);
    }
}
