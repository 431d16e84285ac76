//! Error types for picture decoding and encoding.

use thiserror::Error;

/// Failures while replaying a picture stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The stream does not start with the `0x81 0x00` header.
    #[error("not an SCI0 picture resource")]
    InvalidResource,

    /// A top-level byte outside the opcode range where an opcode was
    /// expected, or an opcode this interpreter does not know.
    #[error("unhandled command {opcode:#04x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    /// An extended (`0xFE`) sub-opcode beyond the known set.
    #[error("unhandled extended command {opcode:#04x} at offset {offset}")]
    UnknownExtended { opcode: u8, offset: usize },

    /// `setEntirePalette` addressed a bank other than 0..=3.
    #[error("invalid palette bank {bank}")]
    InvalidPaletteBank { bank: u8 },

    /// A palette slot index of 160 or above.
    #[error("invalid palette entry index {index}")]
    InvalidPaletteEntry { index: u8 },

    /// The stream ended in the middle of an opcode payload.
    #[error("unexpected end of picture data at offset {offset}")]
    UnexpectedEnd { offset: usize },
}

/// Failures while emitting a picture stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// A polyline or pattern step whose first payload byte would land in
    /// the opcode range and be mis-parsed as a command.
    #[error("step ({dx}, {dy}) cannot be encoded without forging an opcode byte")]
    UnencodableStep { dx: i32, dy: i32 },

    /// A coordinate outside the 12-bit absolute addressing range.
    #[error("coordinate ({x}, {y}) is outside the addressable range")]
    CoordinateOutOfRange { x: i32, y: i32 },
}
