/// Errors produced while encoding or decoding bit-vector values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitsError {
    /// The value text contained no digits.
    #[error("scanned value is empty")]
    Empty,

    /// A `-` sign with nothing after it.
    #[error("unexpected end of negative value")]
    EmptyNegative,

    /// Values must be at least one bit wide.
    #[error("cannot represent 0-bit-wide value")]
    ZeroWidth,

    /// A signed value needs a sign bit and at least one magnitude bit.
    #[error("cannot represent 1-bit-wide signed value")]
    SignedTooNarrow,

    /// A character outside `0-9`, `a-f`, `A-F`.
    #[error("encountered unexpected character {0:?}")]
    InvalidDigit(char),

    /// More digits than fit in the value's byte buffer.
    #[error("scanned value exceeded {bytes} bytes")]
    TooManyBytes { bytes: usize },

    /// The magnitude does not fit the declared width.
    #[error("scanned value exceeded {width} bits")]
    Overflow { width: u32 },

    /// The magnitude of a negative value does not fit the declared width.
    #[error("scanned negative value exceeded {width} bits")]
    NegativeOverflow { width: u32 },

    /// A raw buffer whose length disagrees with the declared width.
    #[error("buffer of {actual} bytes cannot hold a {width}-bit value ({expected} bytes expected)")]
    LengthMismatch {
        width: u32,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, BitsError>;
