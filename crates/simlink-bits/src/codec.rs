use crate::error::{BitsError, Result};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// How the top bit of a value is interpreted when it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    Unsigned,
    Signed,
}

impl Signedness {
    /// Parse the `s`/`u` flag of a `GET_BITS` command.
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            b's' => Some(Self::Signed),
            b'u' => Some(Self::Unsigned),
            _ => None,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Self::Signed)
    }
}

/// Number of bytes needed to hold a `width`-bit value.
pub fn byte_count(width: u32) -> usize {
    width.div_ceil(8) as usize
}

/// Mask of the bits in the top byte that lie above a `bits`-wide value.
///
/// ```text
/// bits % 8   mask
///    0       00000000
///    1       11111110
///    2       11111100
///    3       11111000
///    4       11110000
///    5       11100000
///    6       11000000
///    7       10000000
/// ```
pub fn inapplicable_mask(bits: u32) -> u8 {
    match bits % 8 {
        0 => 0,
        rem => 0xFF << rem,
    }
}

/// A fixed-width value held as little-endian two's-complement bytes.
///
/// The buffer is always exactly [`byte_count`]`(width)` bytes long. Bits above
/// `width` in the top byte carry no meaning: rendering and comparison ignore
/// them, and decoding a negative value leaves them set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bits {
    width: u32,
    bytes: Vec<u8>,
}

impl Bits {
    /// An all-zero value, ready to be filled by a port getter.
    pub fn zeroed(width: u32) -> Result<Self> {
        if width == 0 {
            return Err(BitsError::ZeroWidth);
        }
        Ok(Self {
            width,
            bytes: vec![0; byte_count(width)],
        })
    }

    /// Wrap an existing little-endian buffer.
    pub fn from_le_bytes(width: u32, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        if width == 0 {
            return Err(BitsError::ZeroWidth);
        }
        let bytes = bytes.into();
        let expected = byte_count(width);
        if bytes.len() != expected {
            return Err(BitsError::LengthMismatch {
                width,
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self { width, bytes })
    }

    /// A 64-bit unsigned value, as used for `TICK` cycle counts.
    pub fn from_u64(value: u64) -> Self {
        Self {
            width: 64,
            bytes: value.to_le_bytes().to_vec(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Decode wire text (`ABC`, `-10`, ...) into a `width`-bit value.
    ///
    /// A leading `-` makes the value negative; anything else is an unsigned
    /// magnitude. The value must fit `width` bits after sign interpretation:
    /// `0 <= v < 2^width`, or `-2^(width-1) <= v < 0` for negative values.
    pub fn parse(text: &[u8], width: u32) -> Result<Self> {
        if text.is_empty() {
            return Err(BitsError::Empty);
        }
        if width == 0 {
            return Err(BitsError::ZeroWidth);
        }

        let (negative, digits) = match text.split_first() {
            Some((b'-', rest)) => {
                if rest.is_empty() {
                    return Err(BitsError::EmptyNegative);
                }
                if width <= 1 {
                    return Err(BitsError::SignedTooNarrow);
                }
                (true, rest)
            }
            _ => (false, text),
        };

        let len = byte_count(width);
        let mut bytes = vec![0u8; len];
        for (index, &digit) in digits.iter().rev().enumerate() {
            let nibble = hex_value(digit)?;
            let Some(byte) = bytes.get_mut(index / 2) else {
                if let Some(&bad) = digits.iter().find(|c| !c.is_ascii_hexdigit()) {
                    return Err(BitsError::InvalidDigit(bad as char));
                }
                return Err(BitsError::TooManyBytes { bytes: len });
            };
            *byte |= nibble << (4 * (index % 2));
        }

        let top = len - 1;
        if negative {
            // Negating zero carries out of the top byte: `-0` is rejected.
            if negate(&mut bytes) {
                return Err(BitsError::NegativeOverflow { width });
            }
            // Bit `width - 1` and everything above it must be ones.
            let sign_mask = 0xFFu8 << ((width - 1) % 8);
            if bytes[top] & sign_mask != sign_mask {
                return Err(BitsError::NegativeOverflow { width });
            }
        } else if bytes[top] & inapplicable_mask(width) != 0 {
            return Err(BitsError::Overflow { width });
        }

        Ok(Self { width, bytes })
    }

    /// Render the value as wire text.
    ///
    /// Uppercase hex of the absolute magnitude, most significant digit first,
    /// without leading zeros; zero is `0`. Signed values with the sign bit set
    /// are prefixed with `-`.
    pub fn to_hex(&self, signedness: Signedness) -> Result<String> {
        if self.width == 0 {
            return Err(BitsError::ZeroWidth);
        }
        if signedness.is_signed() && self.width <= 1 {
            return Err(BitsError::SignedTooNarrow);
        }

        let keep = !inapplicable_mask(self.width);
        let top = self.bytes.len() - 1;
        let mut magnitude = self.bytes.clone();
        magnitude[top] &= keep;

        let mut out = String::with_capacity(magnitude.len() * 2 + 1);
        if signedness.is_signed() && self.sign_bit() {
            out.push('-');
            negate(&mut magnitude);
            magnitude[top] &= keep;
        }

        let mut significant = magnitude.iter().rev().skip_while(|&&byte| byte == 0);
        match significant.next() {
            None => out.push('0'),
            Some(&first) => {
                push_hex_byte(&mut out, first, false);
                for &byte in significant {
                    push_hex_byte(&mut out, byte, true);
                }
            }
        }
        Ok(out)
    }

    /// Compare two values of the same width, ignoring bits above the width.
    pub fn same_value(&self, other: &Bits) -> bool {
        if self.width != other.width {
            return false;
        }
        let top = self.bytes.len() - 1;
        let keep = !inapplicable_mask(self.width);
        self.bytes[..top] == other.bytes[..top]
            && self.bytes[top] & keep == other.bytes[top] & keep
    }

    fn sign_bit(&self) -> bool {
        let bit = self.width - 1;
        (self.bytes[(bit / 8) as usize] >> (bit % 8)) & 1 == 1
    }
}

fn hex_value(digit: u8) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        other => Err(BitsError::InvalidDigit(other as char)),
    }
}

/// Two's-complement negation in place. Returns the carry out of the top byte.
fn negate(bytes: &mut [u8]) -> bool {
    let mut carry = true;
    for byte in bytes.iter_mut() {
        let (sum, overflow) = (!*byte).overflowing_add(u8::from(carry));
        *byte = sum;
        carry = overflow;
    }
    carry
}

fn push_hex_byte(out: &mut String, byte: u8, pad: bool) {
    if pad || byte >= 0x10 {
        out.push(HEX_DIGITS[usize::from(byte >> 4)] as char);
    }
    out.push(HEX_DIGITS[usize::from(byte & 0x0F)] as char);
}
