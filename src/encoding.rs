//! Decoders that turn raw bytes into the codepoints a [`Scanner`] consumes.
//!
//! A [`Decoder`] reads one codepoint at a time from the front of a byte
//! slice and reports how many bytes it occupied, which is exactly the
//! `(codepoint, length)` pair [`Scanner::next`] expects. [`DefaultDecoder`]
//! additionally auto-detects UTF-16 byte order marks, so it is the right
//! choice when the document encoding is unknown up front.
//!
//! After the XML declaration is parsed, the declared encoding name should
//! be handed to [`Decoder::adapt_to`]; a decoder accepts its own canonical
//! name(s) case-insensitively and rejects everything else.
//!
//! [`Scanner`]: crate::Scanner
//! [`Scanner::next`]: crate::Scanner::next

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

use crate::errors::DecodeError;

/// Unicode "byte order mark" encoded as UTF-16 with big-endian byte order
const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];
/// Unicode "byte order mark" encoded as UTF-16 with little-endian byte order
const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];

/// Outcome of a single [`Decoder::decode`] call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Decoded {
    /// The slice does not hold a complete codepoint; feed more bytes.
    NeedData,
    /// One codepoint and the number of bytes it occupied at the front of
    /// the slice.
    Codepoint {
        /// The decoded codepoint.
        c: char,
        /// How many bytes it occupied.
        len: usize,
    },
}

/// Decoder of raw bytes into codepoints.
pub trait Decoder {
    /// Upper bound on the number of bytes a single codepoint may occupy.
    ///
    /// A caller that keeps at least this many bytes buffered (or has
    /// reached the true end of input) will never be starved by
    /// [`NeedData`].
    ///
    /// [`NeedData`]: Decoded::NeedData
    fn max_encoded_len(&self) -> usize;

    /// Decodes the codepoint at the front of `bytes`.
    fn decode(&mut self, bytes: &[u8]) -> Result<Decoded, DecodeError>;

    /// Accepts or rejects an encoding label declared in an XML prologue.
    ///
    /// Labels are resolved through [`encoding_rs`], so aliases and casing
    /// are handled (`utf-8`, `UTF8`, `utf-16be`, ...). A label naming any
    /// other encoding fails with [`DecodeError::InvalidEncoding`].
    fn adapt_to(&mut self, label: &str) -> Result<(), DecodeError>;
}

/// A strict UTF-8 decoder.
///
/// Overlong forms, surrogate codepoints, codepoints above `U+10FFFF` and
/// stray continuation bytes are all rejected.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Utf8Decoder;

impl Decoder for Utf8Decoder {
    fn max_encoded_len(&self) -> usize {
        4
    }

    fn decode(&mut self, bytes: &[u8]) -> Result<Decoded, DecodeError> {
        let b0 = match bytes.first() {
            Some(&b) => b,
            None => return Ok(Decoded::NeedData),
        };
        let len = match b0 {
            0x00..=0x7F => {
                return Ok(Decoded::Codepoint {
                    c: b0 as char,
                    len: 1,
                })
            }
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            // continuation bytes, overlong leads C0/C1, out of range F5..
            _ => return Err(DecodeError::NonDecodable),
        };
        if bytes.len() < len {
            // a malformed continuation should not hide behind NeedData
            if bytes[1..].iter().any(|b| !(0x80..=0xBF).contains(b)) {
                return Err(DecodeError::NonDecodable);
            }
            return Ok(Decoded::NeedData);
        }
        let tail = &bytes[1..len];
        if tail.iter().any(|b| !(0x80..=0xBF).contains(b)) {
            return Err(DecodeError::NonDecodable);
        }
        // reject overlong three/four byte forms and surrogates by lead pair
        match (b0, tail[0]) {
            (0xE0, 0x80..=0x9F) => return Err(DecodeError::NonDecodable),
            (0xED, 0xA0..=0xBF) => return Err(DecodeError::NonDecodable),
            (0xF0, 0x80..=0x8F) => return Err(DecodeError::NonDecodable),
            (0xF4, 0x90..=0xBF) => return Err(DecodeError::NonDecodable),
            _ => {}
        }
        let mut value = u32::from(b0 & (0x7F >> len));
        for &b in tail {
            value = value << 6 | u32::from(b & 0x3F);
        }
        let c = char::from_u32(value).ok_or(DecodeError::NonDecodable)?;
        Ok(Decoded::Codepoint { c, len })
    }

    fn adapt_to(&mut self, label: &str) -> Result<(), DecodeError> {
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) if encoding == UTF_8 => Ok(()),
            _ => Err(DecodeError::InvalidEncoding),
        }
    }
}

/// Byte order of a [`Utf16Decoder`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Endian {
    Big,
    Little,
}

/// A UTF-16 decoder parameterized by endianness.
///
/// Surrogate pairs decode to a single codepoint over four bytes; unpaired
/// surrogates are rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Utf16Decoder {
    endian: Endian,
}

impl Utf16Decoder {
    /// Creates a big-endian UTF-16 decoder.
    pub fn big_endian() -> Self {
        Self { endian: Endian::Big }
    }

    /// Creates a little-endian UTF-16 decoder.
    pub fn little_endian() -> Self {
        Self {
            endian: Endian::Little,
        }
    }

    fn unit(&self, bytes: &[u8]) -> u16 {
        match self.endian {
            Endian::Big => u16::from_be_bytes([bytes[0], bytes[1]]),
            Endian::Little => u16::from_le_bytes([bytes[0], bytes[1]]),
        }
    }
}

impl Decoder for Utf16Decoder {
    fn max_encoded_len(&self) -> usize {
        4
    }

    fn decode(&mut self, bytes: &[u8]) -> Result<Decoded, DecodeError> {
        if bytes.len() < 2 {
            return Ok(Decoded::NeedData);
        }
        let high = self.unit(bytes);
        match high {
            0xD800..=0xDBFF => {
                if bytes.len() < 4 {
                    return Ok(Decoded::NeedData);
                }
                let low = self.unit(&bytes[2..]);
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(DecodeError::NonDecodable);
                }
                let value = 0x10000
                    + (u32::from(high - 0xD800) << 10 | u32::from(low - 0xDC00));
                let c = char::from_u32(value).ok_or(DecodeError::NonDecodable)?;
                Ok(Decoded::Codepoint { c, len: 4 })
            }
            0xDC00..=0xDFFF => Err(DecodeError::NonDecodable),
            _ => {
                let c = char::from_u32(u32::from(high)).ok_or(DecodeError::NonDecodable)?;
                Ok(Decoded::Codepoint { c, len: 2 })
            }
        }
    }

    fn adapt_to(&mut self, label: &str) -> Result<(), DecodeError> {
        let expected = match self.endian {
            Endian::Big => UTF_16BE,
            Endian::Little => UTF_16LE,
        };
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) if encoding == expected => Ok(()),
            _ => Err(DecodeError::InvalidEncoding),
        }
    }
}

/// A decoder that detects the document encoding from its first bytes.
///
/// A leading `FE FF` or `FF FE` locks the decoder to UTF-16 of the matching
/// byte order and surfaces the mark itself as `U+FEFF` over two bytes; any
/// other start locks it to UTF-8 and replays the bytes (a UTF-8 encoded
/// byte order mark then decodes naturally as `U+FEFF` over three bytes).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DefaultDecoder {
    /// No bytes seen yet; the encoding is still undetermined.
    Detect,
    /// Locked to UTF-8.
    Utf8(Utf8Decoder),
    /// Locked to UTF-16.
    Utf16(Utf16Decoder),
}

impl Default for DefaultDecoder {
    fn default() -> Self {
        Self::Detect
    }
}

impl DefaultDecoder {
    /// Creates a decoder in its detecting state.
    pub fn new() -> Self {
        Self::Detect
    }
}

impl Decoder for DefaultDecoder {
    fn max_encoded_len(&self) -> usize {
        4
    }

    fn decode(&mut self, bytes: &[u8]) -> Result<Decoded, DecodeError> {
        if let Self::Detect = self {
            match bytes.first().copied() {
                None => return Ok(Decoded::NeedData),
                Some(0xFE) | Some(0xFF) => {
                    if bytes.len() < 2 {
                        return Ok(Decoded::NeedData);
                    }
                    if bytes[..2] == UTF16_BE_BOM {
                        *self = Self::Utf16(Utf16Decoder::big_endian());
                    } else if bytes[..2] == UTF16_LE_BOM {
                        *self = Self::Utf16(Utf16Decoder::little_endian());
                    } else {
                        return Err(DecodeError::NonDecodable);
                    }
                    return Ok(Decoded::Codepoint {
                        c: '\u{FEFF}',
                        len: 2,
                    });
                }
                Some(_) => *self = Self::Utf8(Utf8Decoder),
            }
        }
        match self {
            Self::Detect => unreachable!("encoding was just determined"),
            Self::Utf8(decoder) => decoder.decode(bytes),
            Self::Utf16(decoder) => decoder.decode(bytes),
        }
    }

    fn adapt_to(&mut self, label: &str) -> Result<(), DecodeError> {
        match self {
            // nothing was read; any supported unicode encoding may be chosen
            Self::Detect => match Encoding::for_label(label.as_bytes()) {
                Some(encoding) if encoding == UTF_8 => {
                    *self = Self::Utf8(Utf8Decoder);
                    Ok(())
                }
                Some(encoding) if encoding == UTF_16BE => {
                    *self = Self::Utf16(Utf16Decoder::big_endian());
                    Ok(())
                }
                Some(encoding) if encoding == UTF_16LE => {
                    *self = Self::Utf16(Utf16Decoder::little_endian());
                    Ok(())
                }
                _ => Err(DecodeError::InvalidEncoding),
            },
            Self::Utf8(decoder) => decoder.adapt_to(label),
            Self::Utf16(decoder) => decoder.adapt_to(label),
        }
    }
}
