//! Error management module

use std::fmt;
use std::io;

/// An error raised by the [`Scanner`] while tokenizing a document.
///
/// All variants except [`CannotReset`] are fatal for the parse: the scanner
/// latches into a terminal error state and every following call to
/// [`Scanner::next`] reports [`Syntax`].
///
/// [`Scanner`]: crate::Scanner
/// [`Scanner::next`]: crate::Scanner::next
/// [`CannotReset`]: ScanError::CannotReset
/// [`Syntax`]: ScanError::Syntax
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScanError {
    /// The document violates the XML grammar at the current position.
    Syntax,
    /// A `<!DOCTYPE` was recognized. Document type declarations are not
    /// processed; any document containing one is rejected.
    DoctypeNotSupported,
    /// A numeric character reference overflowed or resolved to a codepoint
    /// that is not an XML `Char`.
    InvalidCharacterReference,
    /// [`Scanner::end_input`] was called before the root element was closed.
    ///
    /// [`Scanner::end_input`]: crate::Scanner::end_input
    UnexpectedEndOfInput,
    /// [`Scanner::reset_position`] was called in a state that holds
    /// positional information which cannot be truthfully split.
    ///
    /// [`Scanner::reset_position`]: crate::Scanner::reset_position
    CannotReset,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanError::Syntax => write!(f, "syntax error"),
            ScanError::DoctypeNotSupported => write!(f, "DOCTYPE is not supported"),
            ScanError::InvalidCharacterReference => {
                write!(f, "character reference does not name an XML character")
            }
            ScanError::UnexpectedEndOfInput => write!(f, "unexpected end of input"),
            ScanError::CannotReset => write!(f, "position cannot be reset in this state"),
        }
    }
}

impl std::error::Error for ScanError {}

/// An error raised by a [`Decoder`] implementation.
///
/// [`Decoder`]: crate::encoding::Decoder
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// The input bytes do not form a valid codepoint in this encoding.
    NonDecodable,
    /// The encoding label passed to [`adapt_to`] does not name an encoding
    /// this decoder can continue with.
    ///
    /// [`adapt_to`]: crate::encoding::Decoder::adapt_to
    InvalidEncoding,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::NonDecodable => write!(f, "malformed byte sequence"),
            DecodeError::InvalidEncoding => write!(f, "unsupported encoding declared"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// The error type used by this crate.
#[derive(Debug)]
pub enum Error {
    /// An error from writing to the underlying sink.
    Io(io::Error),
    /// A fatal error from the scanner.
    Scan(ScanError),
    /// A malformed byte sequence or a rejected encoding label.
    Decode(DecodeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Scan(e) => write!(f, "{}", e),
            Error::Decode(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Scan(e) => Some(e),
            Error::Decode(e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    /// Creates a new `Error::Io` from the given error
    #[inline]
    fn from(error: io::Error) -> Error {
        Error::Io(error)
    }
}

impl From<ScanError> for Error {
    /// Creates a new `Error::Scan` from the given error
    #[inline]
    fn from(error: ScanError) -> Error {
        Error::Scan(error)
    }
}

impl From<DecodeError> for Error {
    /// Creates a new `Error::Decode` from the given error
    #[inline]
    fn from(error: DecodeError) -> Error {
        Error::Decode(error)
    }
}

/// A specialized `Result` type where the error is hard-wired to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
