//! Tokens emitted by the [`Scanner`].
//!
//! Tokens never carry document text by value. Wherever a token refers to a
//! piece of the input it does so through a half-open `Range<usize>` into the
//! caller's own coordinate space: the scanner only ever adds up the `length`
//! values the caller passes to [`Scanner::next`], so positions may be byte
//! offsets, codepoint indexes, or any other monotonically advancing measure.
//! The caller must consume a token's ranges before it mutates or discards
//! the underlying buffer.
//!
//! [`Scanner`]: crate::Scanner
//! [`Scanner::next`]: crate::Scanner::next

use std::ops::Range;

/// A fragment of element text or attribute value.
///
/// Content is delivered in pieces: literal text is split around references,
/// and references surface unresolved ([`Entity`]) or resolved to a codepoint
/// ([`Codepoint`]) without any replacement-text lookup. Resolving named
/// entities is the caller's job.
///
/// [`Entity`]: Content::Entity
/// [`Codepoint`]: Content::Codepoint
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Content {
    /// A raw, entity-free run of document text.
    Text(Range<usize>),
    /// The codepoint named by a numeric character reference, already
    /// validated to be an XML `Char`.
    Codepoint(char),
    /// The name of an entity reference (the range excludes `&` and `;`).
    Entity(Range<usize>),
}

/// A lexical token of an XML document.
///
/// [`Scanner::next`] yields at most one token per codepoint; `None` means
/// the machine advanced without completing a construct.
///
/// [`Scanner::next`]: crate::Scanner::next
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    /// The `<?xml ...?>` prologue was parsed.
    ///
    /// The token is emitted as soon as the declaration is fully known, at
    /// the first `?` of the closing `?>`.
    XmlDeclaration {
        /// Range of the version text, e.g. `1.0`, without quotes.
        version: Range<usize>,
        /// Range of the declared encoding name, if one was present.
        encoding: Option<Range<usize>>,
        /// The `standalone` value, if one was present.
        standalone: Option<bool>,
    },
    /// A `<Name` was parsed; attributes and body may follow.
    ElementStart {
        /// Range of the element name.
        name: Range<usize>,
    },
    /// An attribute name was parsed; content tokens follow.
    AttributeStart {
        /// Range of the attribute name.
        name: Range<usize>,
    },
    /// A fragment of an attribute value.
    AttributeContent {
        /// The fragment.
        content: Content,
        /// `true` for the last fragment before the closing quote. Exactly
        /// one fragment per attribute value carries this flag.
        last: bool,
    },
    /// A fragment of element text, CDATA, or reference content.
    ElementContent {
        /// The fragment.
        content: Content,
    },
    /// A `</Name>` was parsed.
    ElementEnd {
        /// Range of the element name.
        name: Range<usize>,
    },
    /// A `/>` closed the current element.
    ElementEndEmpty,
    /// A `<!--` was seen.
    CommentStart,
    /// A fragment of comment text.
    CommentContent {
        /// Range of the fragment.
        content: Range<usize>,
        /// `true` for the fragment ended by `-->`.
        last: bool,
    },
    /// A `<?target` was parsed.
    PiStart {
        /// Range of the processing instruction target.
        target: Range<usize>,
    },
    /// A fragment of processing instruction data.
    PiContent {
        /// Range of the fragment. Empty when the instruction carries no
        /// data after its target.
        content: Range<usize>,
        /// `true` for the fragment ended by `?>`.
        last: bool,
    },
}
