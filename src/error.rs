use thiserror::Error;

/// Errors arising from frame capture and burst decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("bad frame length ({got} bytes, expected 17)")]
    FrameLength { got: usize },

    #[error("read out of bounds (offset {offset}, data length {len})")]
    ReadOutOfBounds { offset: usize, len: usize },

    #[error("list checksum mismatch (expected 0x{expected:02X}, computed 0x{computed:02X})")]
    ChecksumMismatch { expected: u8, computed: u8 },

    #[error("burst reached the end sentinel without frame 0x{tag:02X}")]
    MissingFrame { tag: u8 },

    #[error("shot-list counter {n} outside 1..=50")]
    ShotIndexOutOfRange { n: u8 },

    #[error("no validated burst to analyze")]
    NotFinished,
}

pub type Result<T> = std::result::Result<T, DecodeError>;
