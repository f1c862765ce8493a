//! A low-level XML pull scanner. For advanced use. It is very low-level:
//! one codepoint goes in, at most one token comes out.
//!
//! To use a scanner create an instance of [`Scanner`] and feed codepoints
//! into it with [`next`]. Each call either produces a [`Token`], produces
//! `None` (the machine advanced without completing a construct), or fails.
//! Tokens carry ranges into the caller's own coordinate space: the scanner
//! adds up the `length` values passed to [`next`], so the caller decides
//! whether positions mean bytes, codepoints, or anything else that grows
//! monotonically.
//!
//! ```
//! use stream_xml::{Scanner, Token};
//!
//! let xml = "<greeting/>";
//! let mut scanner = Scanner::new();
//! let mut tokens = Vec::new();
//! for c in xml.chars() {
//!     if let Some(token) = scanner.next(c, c.len_utf8()).unwrap() {
//!         tokens.push(token);
//!     }
//! }
//! scanner.end_input().unwrap();
//!
//! assert_eq!(
//!     tokens,
//!     [Token::ElementStart { name: 1..9 }, Token::ElementEndEmpty]
//! );
//! assert_eq!(&xml[1..9], "greeting");
//! ```
//!
//! The scanner performs no allocation after construction and never looks at
//! the document bytes themselves. It does not validate that close tags match
//! open tags, does not detect duplicate attributes, and does not resolve
//! entities; DOCTYPE is rejected outright.
//!
//! [`next`]: Scanner::next

use std::ops::Range;

use crate::chars::{
    digit_value, hex_digit_value, is_char, is_encoding_char, is_encoding_start_char, is_name_char,
    is_name_start_char, is_space,
};
use crate::errors::ScanError;
use crate::tokens::{Content, Token};

/// Largest value that fits the 21 bits a Unicode codepoint may occupy.
/// Character reference accumulation is capped here; the XML `Char` check
/// happens once the reference is complete.
const CODEPOINT_MAX: u32 = 0x1F_FFFF;

/// An internal state of the scanner. Used to decide how the next codepoint
/// is interpreted between calls to [`Scanner::next`].
///
/// States carry no payload of their own; the fields they use live in the
/// [`Scanner`] itself and their meaning is per-state (see the field docs).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum State {
    /// Initial state, nothing was seen yet.
    Start,
    /// A byte order mark was seen, but nothing else.
    StartAfterBom,
    /// A `<` was seen as the very first content. An XML declaration is
    /// still possible.
    StartMarkup,
    /// Document level before the root element; an XML declaration is no
    /// longer possible.
    AfterXmlDecl,
    /// Document level after the root element was closed. The only state in
    /// which input may truthfully end.
    DocumentContent,
    /// A `<` was seen at document level, but nothing else.
    Markup,
    /// A `<!` was seen at document level. It is unable to understand right
    /// now what data follow.
    MarkupBang,
    /// A `<!D` was seen; `left` holds the unmatched rest of `OCTYPE`. Once
    /// the keyword is complete any codepoint reports the rejection.
    Doctype,

    /// A `<!-` was seen, but nothing else.
    CommentBeforeStart,
    /// Inside a comment; `start` is where its text began.
    Comment,
    /// A `-` inside a comment; `end` is its position.
    CommentMaybeBeforeEnd,
    /// A `--` inside a comment, looking for `>`.
    CommentMaybeEnd,

    /// A `<?` was seen at the very start of the document; `left` holds the
    /// unmatched rest of `xml`. Decides between an XML declaration and an
    /// ordinary processing instruction.
    PiOrXmlDecl,
    /// A `<?` was seen elsewhere; the target's first codepoint follows.
    PiTargetStart,
    /// Inside a processing instruction target; `start` is where it began.
    PiTarget,
    /// After the target, skipping the whitespace that precedes data.
    PiAfterTarget,
    /// Inside processing instruction data; `start` is where it began.
    PiContent,
    /// A `?` inside processing instruction data; `start`/`end` delimit the
    /// data seen so far.
    PiMaybeEnd,

    /// After `<?xml` and whitespace, expecting the `version` keyword.
    XmlDecl,
    /// Matching the rest of the `version` keyword through `left`.
    XmlDeclVersionName,
    /// After the `version` keyword, expecting `=`.
    XmlDeclAfterVersionName,
    /// After `version =`, expecting the opening quote.
    XmlDeclAfterVersionEquals,
    /// Inside the version value, expecting `1`.
    XmlDeclVersionValueStart,
    /// Inside the version value, expecting `.`.
    XmlDeclVersionValueDot,
    /// Inside the version value, expecting the first minor digit.
    XmlDeclVersionValueDigit,
    /// Inside the version value, more minor digits or the closing quote.
    XmlDeclVersionValue,
    /// Just after the version value's closing quote.
    XmlDeclAfterVersion,
    /// After the version value and whitespace; `encoding`, `standalone` or
    /// the end of the declaration may follow.
    XmlDeclAfterVersionSpace,
    /// Matching the rest of the `encoding` keyword through `left`.
    XmlDeclEncodingName,
    /// After the `encoding` keyword, expecting `=`.
    XmlDeclAfterEncodingName,
    /// After `encoding =`, expecting the opening quote.
    XmlDeclAfterEncodingEquals,
    /// Inside the encoding value, expecting its first letter.
    XmlDeclEncodingValueStart,
    /// Inside the encoding value, more name codepoints or the closing quote.
    XmlDeclEncodingValue,
    /// Just after the encoding value's closing quote.
    XmlDeclAfterEncoding,
    /// After the encoding value and whitespace; `standalone` or the end of
    /// the declaration may follow.
    XmlDeclAfterEncodingSpace,
    /// Matching the rest of the `standalone` keyword through `left`.
    XmlDeclStandaloneName,
    /// After the `standalone` keyword, expecting `=`.
    XmlDeclAfterStandaloneName,
    /// After `standalone =`, expecting the opening quote.
    XmlDeclAfterStandaloneEquals,
    /// Inside the standalone value, expecting `y` or `n`.
    XmlDeclStandaloneValueStart,
    /// Matching the rest of `yes` or `no` through `left`.
    XmlDeclStandaloneValue,
    /// After the standalone literal, expecting the closing quote.
    XmlDeclStandaloneValueEnd,
    /// After the standalone value, expecting `?` or whitespace.
    XmlDeclAfterStandalone,
    /// The declaration token was emitted at `?`; expecting the final `>`.
    XmlDeclEnd,

    /// Inside an element name; `start` is where it began.
    ElementStartName,
    /// Inside an open tag after its name; attributes, `/` or `>` follow.
    ElementStartAfterName,
    /// A `/` inside an open tag, expecting `>`.
    ElementStartEmpty,
    /// Inside an attribute name; `start` is where it began.
    AttributeName,
    /// After an attribute name, expecting `=`.
    AttributeAfterName,
    /// After `=`, expecting the opening quote.
    AttributeAfterEquals,
    /// Inside an attribute value bounded by `quote`; `start` is where the
    /// current text fragment began.
    AttributeContent,
    /// A `&` inside an attribute value, but nothing else.
    AttributeContentRefStart,
    /// Inside an entity reference name in an attribute value.
    AttributeContentEntityRefName,
    /// A `&#` inside an attribute value; `x` may still switch to hex.
    AttributeContentCharRefStart,
    /// Accumulating a numeric character reference in an attribute value
    /// into `value`, according to `hex`.
    AttributeContentCharRef,
    /// A `</` was seen, but nothing else.
    ElementEnd,
    /// Inside a close tag name; `start` is where it began.
    ElementEndName,
    /// After a close tag name; `start`/`end` delimit it until `>` arrives.
    ElementEndAfterName,

    /// Inside element text; `start` is where the current fragment began.
    Content,
    /// A `]` inside element text.
    ContentMaybeBeforeEnd,
    /// A `]]` inside element text; a `>` now would form the forbidden
    /// `]]>` sequence.
    ContentMaybeEnd,
    /// A `<` inside element content, but nothing else.
    ContentMarkup,
    /// A `<!` inside element content. It is unable to understand right now
    /// what data follow.
    ContentMarkupBang,
    /// Matching the rest of `<![CDATA[` through `left`.
    CdataPrefix,
    /// Inside a CDATA section; `start` is where its text began.
    Cdata,
    /// A `]` inside a CDATA section; `end` is its position.
    CdataMaybeBeforeEnd,
    /// A `]]` inside a CDATA section, looking for `>`.
    CdataMaybeEnd,
    /// A `&` inside element text, but nothing else.
    ContentRefStart,
    /// Inside an entity reference name in element text.
    ContentEntityRefName,
    /// A `&#` inside element text; `x` may still switch to hex.
    ContentCharRefStart,
    /// Accumulating a numeric character reference in element text into
    /// `value`, according to `hex`.
    ContentCharRef,

    /// Terminal state after any fatal error.
    Error,
}

impl Default for State {
    fn default() -> Self {
        Self::Start
    }
}

/// A streaming XML tokenizer driven one codepoint at a time.
///
/// See the [module documentation](self) for the contract and an example.
#[derive(Clone, Debug)]
pub struct Scanner {
    state: State,
    /// Position in the caller's coordinate space; grows by the `length` of
    /// every successfully consumed codepoint.
    position: usize,
    /// Number of currently open elements.
    depth: usize,
    /// Latches once the root element closes; a second root is rejected.
    seen_root: bool,

    // Shared state payload. Which fields are live depends on `state`;
    // keeping them here instead of inside the state avoids moving them on
    // every transition.
    /// First position of the range being accumulated.
    start: usize,
    /// One past the last position of a range whose continuation is still
    /// ambiguous (maybe-end lookbehinds, deferred close tag names).
    end: usize,
    /// Unmatched suffix of the literal currently being recognized.
    left: &'static [u8],
    /// Quote codepoint bounding the current attribute or declaration value.
    quote: char,
    /// Accumulated numeric character reference value.
    value: u32,
    /// Whether the current character reference is hexadecimal.
    hex: bool,
    /// Version range of the XML declaration being parsed.
    version: Range<usize>,
    /// Encoding range of the XML declaration being parsed.
    encoding: Option<Range<usize>>,
    /// Standalone value of the XML declaration being parsed.
    standalone: Option<bool>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    /// Creates a scanner in its initial state, positioned at zero.
    pub fn new() -> Self {
        Self {
            state: State::Start,
            position: 0,
            depth: 0,
            seen_root: false,
            start: 0,
            end: 0,
            left: b"",
            quote: '"',
            value: 0,
            hex: false,
            version: 0..0,
            encoding: None,
            standalone: None,
        }
    }

    /// Current position in the caller's coordinate space.
    ///
    /// Monotonically non-decreasing except across [`reset_position`], which
    /// rebases it to zero. When [`next`] fails, the position still points at
    /// the codepoint that caused the error.
    ///
    /// [`next`]: Scanner::next
    /// [`reset_position`]: Scanner::reset_position
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of elements currently open.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Advances the machine by one codepoint.
    ///
    /// `length` is the width of `c` in the caller's coordinate space and is
    /// added to the position only on success. On any error the scanner
    /// latches into a terminal state and every subsequent call reports
    /// [`ScanError::Syntax`].
    pub fn next(&mut self, c: char, length: usize) -> Result<Option<Token>, ScanError> {
        match self.step(c, length) {
            Ok(token) => {
                self.position += length;
                Ok(token)
            }
            Err(e) => {
                self.state = State::Error;
                Err(e)
            }
        }
    }

    /// Declares the end of input.
    ///
    /// Succeeds only at document level with the root element closed; in any
    /// other state the document is incomplete.
    pub fn end_input(&self) -> Result<(), ScanError> {
        if self.state == State::DocumentContent && self.seen_root {
            Ok(())
        } else {
            Err(ScanError::UnexpectedEndOfInput)
        }
    }

    /// Rebases the position counter to zero so the caller may reuse its
    /// input buffer.
    ///
    /// If the current state is mid-accumulation of splittable content
    /// (element text, attribute text, CDATA, comment or processing
    /// instruction data), the accumulated fragment is flushed as a
    /// non-final token first and `Ok(Some(..))` is returned. States that
    /// hold no live range reset silently with `Ok(None)`. States whose
    /// positional information cannot be truthfully split (names,
    /// references, maybe-end lookbehinds, the XML declaration past the
    /// `version` keyword) fail with [`ScanError::CannotReset`] and leave
    /// the scanner untouched.
    pub fn reset_position(&mut self) -> Result<Option<Token>, ScanError> {
        let token = match self.state {
            // Between constructs; nothing references the buffer.
            State::Start
            | State::StartAfterBom
            | State::StartMarkup
            | State::AfterXmlDecl
            | State::DocumentContent
            | State::Markup
            | State::MarkupBang
            | State::Doctype
            | State::CommentBeforeStart
            | State::PiTargetStart
            | State::PiAfterTarget
            | State::XmlDecl
            | State::XmlDeclVersionName
            | State::ElementStartAfterName
            | State::ElementStartEmpty
            | State::AttributeAfterName
            | State::AttributeAfterEquals
            | State::ElementEnd
            | State::ContentMarkup
            | State::ContentMarkupBang
            | State::CdataPrefix => None,

            // Mid-accumulation of splittable content.
            State::Comment => self.take_range().map(|content| Token::CommentContent {
                content,
                last: false,
            }),
            State::PiContent => self.take_range().map(|content| Token::PiContent {
                content,
                last: false,
            }),
            State::Content | State::Cdata => {
                self.take_range().map(|text| Token::ElementContent {
                    content: Content::Text(text),
                })
            }
            State::AttributeContent => {
                self.take_range().map(|text| Token::AttributeContent {
                    content: Content::Text(text),
                    last: false,
                })
            }

            _ => return Err(ScanError::CannotReset),
        };
        self.start = 0;
        self.position = 0;
        Ok(token)
    }

    /// Range accumulated so far in a content state, if any.
    fn take_range(&self) -> Option<Range<usize>> {
        if self.start < self.position {
            Some(self.start..self.position)
        } else {
            None
        }
    }

    /// State to resume in once a comment or processing instruction closes.
    fn resume(&mut self, length: usize) -> State {
        if self.depth > 0 {
            self.start = self.position + length;
            State::Content
        } else if self.seen_root {
            State::DocumentContent
        } else {
            State::AfterXmlDecl
        }
    }

    /// Emits an `ElementEnd` and settles depth bookkeeping for `>`.
    fn close_element(&mut self, name: Range<usize>, length: usize) -> Token {
        self.depth -= 1;
        if self.depth == 0 {
            self.seen_root = true;
            self.state = State::DocumentContent;
        } else {
            self.start = self.position + length;
            self.state = State::Content;
        }
        Token::ElementEnd { name }
    }

    /// Digit value of `c` in the base selected by `hex`.
    fn ref_digit(&self, c: char) -> Option<u32> {
        if self.hex {
            hex_digit_value(c)
        } else {
            digit_value(c)
        }
    }

    /// Adds one digit to the accumulated character reference value.
    fn ref_accumulate(&mut self, digit: u32) -> Result<(), ScanError> {
        let base = if self.hex { 16 } else { 10 };
        self.value = self.value * base + digit;
        if self.value > CODEPOINT_MAX {
            return Err(ScanError::InvalidCharacterReference);
        }
        Ok(())
    }

    /// Resolves the accumulated character reference at its `;`.
    fn ref_resolve(&self) -> Result<char, ScanError> {
        match char::from_u32(self.value) {
            Some(c) if is_char(c) => Ok(c),
            _ => Err(ScanError::InvalidCharacterReference),
        }
    }

    /// The `XmlDeclaration` token from the accumulated declaration fields.
    fn xml_declaration(&self) -> Token {
        Token::XmlDeclaration {
            version: self.version.clone(),
            encoding: self.encoding.clone(),
            standalone: self.standalone,
        }
    }

    fn step(&mut self, c: char, length: usize) -> Result<Option<Token>, ScanError> {
        let pos = self.position;
        let mut token = None;
        self.state = match self.state {
            State::Start => match c {
                '\u{FEFF}' => State::StartAfterBom,
                '<' => State::StartMarkup,
                c if is_space(c) => State::AfterXmlDecl,
                _ => return Err(ScanError::Syntax),
            },
            State::StartAfterBom => match c {
                '<' => State::StartMarkup,
                c if is_space(c) => State::AfterXmlDecl,
                _ => return Err(ScanError::Syntax),
            },
            State::StartMarkup => match c {
                '?' => {
                    self.left = b"xml";
                    State::PiOrXmlDecl
                }
                '!' => State::MarkupBang,
                c if is_name_start_char(c) => {
                    self.start = pos;
                    State::ElementStartName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::AfterXmlDecl => match c {
                '<' => State::Markup,
                c if is_space(c) => State::AfterXmlDecl,
                _ => return Err(ScanError::Syntax),
            },
            State::DocumentContent => match c {
                '<' => State::Markup,
                c if is_space(c) => State::DocumentContent,
                _ => return Err(ScanError::Syntax),
            },
            State::Markup => match c {
                '?' => State::PiTargetStart,
                '!' => State::MarkupBang,
                c if is_name_start_char(c) && !self.seen_root => {
                    self.start = pos;
                    State::ElementStartName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::MarkupBang => match c {
                '-' => State::CommentBeforeStart,
                'D' => {
                    self.left = b"OCTYPE";
                    State::Doctype
                }
                _ => return Err(ScanError::Syntax),
            },
            State::Doctype => {
                if self.left.is_empty() {
                    return Err(ScanError::DoctypeNotSupported);
                } else if c == self.left[0] as char {
                    self.left = &self.left[1..];
                    State::Doctype
                } else {
                    return Err(ScanError::Syntax);
                }
            }

            State::CommentBeforeStart => match c {
                '-' => {
                    token = Some(Token::CommentStart);
                    self.start = pos + length;
                    State::Comment
                }
                _ => return Err(ScanError::Syntax),
            },
            State::Comment => match c {
                '-' => {
                    self.end = pos;
                    State::CommentMaybeBeforeEnd
                }
                c if is_char(c) => State::Comment,
                _ => return Err(ScanError::Syntax),
            },
            State::CommentMaybeBeforeEnd => match c {
                '-' => State::CommentMaybeEnd,
                c if is_char(c) => State::Comment,
                _ => return Err(ScanError::Syntax),
            },
            State::CommentMaybeEnd => match c {
                '>' => {
                    token = Some(Token::CommentContent {
                        content: self.start..self.end,
                        last: true,
                    });
                    self.resume(length)
                }
                // ---> closes with the last two dashes; earlier ones are text
                '-' => {
                    self.end += length;
                    State::CommentMaybeEnd
                }
                c if is_char(c) => State::Comment,
                _ => return Err(ScanError::Syntax),
            },

            State::PiOrXmlDecl => {
                if !self.left.is_empty() && c == self.left[0] as char {
                    if self.left.len() == 3 {
                        self.start = pos;
                    }
                    self.left = &self.left[1..];
                    State::PiOrXmlDecl
                } else if self.left.is_empty() {
                    // the full `xml` target was matched
                    match c {
                        c if is_space(c) => State::XmlDecl,
                        '?' => {
                            token = Some(Token::PiStart {
                                target: self.start..pos,
                            });
                            self.start = pos;
                            self.end = pos;
                            State::PiMaybeEnd
                        }
                        c if is_name_char(c) => State::PiTarget,
                        _ => return Err(ScanError::Syntax),
                    }
                } else if self.left.len() == 3 {
                    // first codepoint of an ordinary target
                    if is_name_start_char(c) {
                        self.start = pos;
                        State::PiTarget
                    } else {
                        return Err(ScanError::Syntax);
                    }
                } else {
                    // `x` or `xm` turned out to be an ordinary target prefix
                    match c {
                        c if is_name_char(c) => State::PiTarget,
                        c if is_space(c) => {
                            token = Some(Token::PiStart {
                                target: self.start..pos,
                            });
                            State::PiAfterTarget
                        }
                        '?' => {
                            token = Some(Token::PiStart {
                                target: self.start..pos,
                            });
                            self.start = pos;
                            self.end = pos;
                            State::PiMaybeEnd
                        }
                        _ => return Err(ScanError::Syntax),
                    }
                }
            }
            State::PiTargetStart => match c {
                c if is_name_start_char(c) => {
                    self.start = pos;
                    State::PiTarget
                }
                _ => return Err(ScanError::Syntax),
            },
            State::PiTarget => match c {
                c if is_name_char(c) => State::PiTarget,
                c if is_space(c) => {
                    token = Some(Token::PiStart {
                        target: self.start..pos,
                    });
                    State::PiAfterTarget
                }
                '?' => {
                    token = Some(Token::PiStart {
                        target: self.start..pos,
                    });
                    self.start = pos;
                    self.end = pos;
                    State::PiMaybeEnd
                }
                _ => return Err(ScanError::Syntax),
            },
            State::PiAfterTarget => match c {
                c if is_space(c) => State::PiAfterTarget,
                '?' => {
                    self.start = pos;
                    self.end = pos;
                    State::PiMaybeEnd
                }
                c if is_char(c) => {
                    self.start = pos;
                    State::PiContent
                }
                _ => return Err(ScanError::Syntax),
            },
            State::PiContent => match c {
                '?' => {
                    self.end = pos;
                    State::PiMaybeEnd
                }
                c if is_char(c) => State::PiContent,
                _ => return Err(ScanError::Syntax),
            },
            State::PiMaybeEnd => match c {
                '>' => {
                    token = Some(Token::PiContent {
                        content: self.start..self.end,
                        last: true,
                    });
                    self.resume(length)
                }
                // ??> closes with the last question mark; earlier ones are data
                '?' => {
                    self.end += length;
                    State::PiMaybeEnd
                }
                c if is_char(c) => State::PiContent,
                _ => return Err(ScanError::Syntax),
            },

            State::XmlDecl => match c {
                c if is_space(c) => State::XmlDecl,
                'v' => {
                    self.left = b"ersion";
                    State::XmlDeclVersionName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclVersionName => {
                if c == self.left[0] as char {
                    self.left = &self.left[1..];
                    if self.left.is_empty() {
                        State::XmlDeclAfterVersionName
                    } else {
                        State::XmlDeclVersionName
                    }
                } else {
                    return Err(ScanError::Syntax);
                }
            }
            State::XmlDeclAfterVersionName => match c {
                c if is_space(c) => State::XmlDeclAfterVersionName,
                '=' => State::XmlDeclAfterVersionEquals,
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclAfterVersionEquals => match c {
                c if is_space(c) => State::XmlDeclAfterVersionEquals,
                '"' | '\'' => {
                    self.quote = c;
                    State::XmlDeclVersionValueStart
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclVersionValueStart => match c {
                '1' => {
                    self.start = pos;
                    State::XmlDeclVersionValueDot
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclVersionValueDot => match c {
                '.' => State::XmlDeclVersionValueDigit,
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclVersionValueDigit => match c {
                '0'..='9' => State::XmlDeclVersionValue,
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclVersionValue => match c {
                '0'..='9' => State::XmlDeclVersionValue,
                c if c == self.quote => {
                    self.version = self.start..pos;
                    State::XmlDeclAfterVersion
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclAfterVersion => match c {
                c if is_space(c) => State::XmlDeclAfterVersionSpace,
                '?' => {
                    token = Some(self.xml_declaration());
                    State::XmlDeclEnd
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclAfterVersionSpace => match c {
                c if is_space(c) => State::XmlDeclAfterVersionSpace,
                '?' => {
                    token = Some(self.xml_declaration());
                    State::XmlDeclEnd
                }
                'e' => {
                    self.left = b"ncoding";
                    State::XmlDeclEncodingName
                }
                's' => {
                    self.left = b"tandalone";
                    State::XmlDeclStandaloneName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclEncodingName => {
                if c == self.left[0] as char {
                    self.left = &self.left[1..];
                    if self.left.is_empty() {
                        State::XmlDeclAfterEncodingName
                    } else {
                        State::XmlDeclEncodingName
                    }
                } else {
                    return Err(ScanError::Syntax);
                }
            }
            State::XmlDeclAfterEncodingName => match c {
                c if is_space(c) => State::XmlDeclAfterEncodingName,
                '=' => State::XmlDeclAfterEncodingEquals,
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclAfterEncodingEquals => match c {
                c if is_space(c) => State::XmlDeclAfterEncodingEquals,
                '"' | '\'' => {
                    self.quote = c;
                    State::XmlDeclEncodingValueStart
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclEncodingValueStart => match c {
                c if is_encoding_start_char(c) => {
                    self.start = pos;
                    State::XmlDeclEncodingValue
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclEncodingValue => match c {
                c if c == self.quote => {
                    self.encoding = Some(self.start..pos);
                    State::XmlDeclAfterEncoding
                }
                c if is_encoding_char(c) => State::XmlDeclEncodingValue,
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclAfterEncoding => match c {
                c if is_space(c) => State::XmlDeclAfterEncodingSpace,
                '?' => {
                    token = Some(self.xml_declaration());
                    State::XmlDeclEnd
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclAfterEncodingSpace => match c {
                c if is_space(c) => State::XmlDeclAfterEncodingSpace,
                '?' => {
                    token = Some(self.xml_declaration());
                    State::XmlDeclEnd
                }
                's' => {
                    self.left = b"tandalone";
                    State::XmlDeclStandaloneName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclStandaloneName => {
                if c == self.left[0] as char {
                    self.left = &self.left[1..];
                    if self.left.is_empty() {
                        State::XmlDeclAfterStandaloneName
                    } else {
                        State::XmlDeclStandaloneName
                    }
                } else {
                    return Err(ScanError::Syntax);
                }
            }
            State::XmlDeclAfterStandaloneName => match c {
                c if is_space(c) => State::XmlDeclAfterStandaloneName,
                '=' => State::XmlDeclAfterStandaloneEquals,
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclAfterStandaloneEquals => match c {
                c if is_space(c) => State::XmlDeclAfterStandaloneEquals,
                '"' | '\'' => {
                    self.quote = c;
                    State::XmlDeclStandaloneValueStart
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclStandaloneValueStart => match c {
                'y' => {
                    self.standalone = Some(true);
                    self.left = b"es";
                    State::XmlDeclStandaloneValue
                }
                'n' => {
                    self.standalone = Some(false);
                    self.left = b"o";
                    State::XmlDeclStandaloneValue
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclStandaloneValue => {
                if c == self.left[0] as char {
                    self.left = &self.left[1..];
                    if self.left.is_empty() {
                        State::XmlDeclStandaloneValueEnd
                    } else {
                        State::XmlDeclStandaloneValue
                    }
                } else {
                    return Err(ScanError::Syntax);
                }
            }
            State::XmlDeclStandaloneValueEnd => match c {
                c if c == self.quote => State::XmlDeclAfterStandalone,
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclAfterStandalone => match c {
                c if is_space(c) => State::XmlDeclAfterStandalone,
                '?' => {
                    token = Some(self.xml_declaration());
                    State::XmlDeclEnd
                }
                _ => return Err(ScanError::Syntax),
            },
            State::XmlDeclEnd => match c {
                '>' => State::AfterXmlDecl,
                _ => return Err(ScanError::Syntax),
            },

            State::ElementStartName => match c {
                c if is_name_char(c) => State::ElementStartName,
                c if is_space(c) => {
                    self.depth += 1;
                    token = Some(Token::ElementStart {
                        name: self.start..pos,
                    });
                    State::ElementStartAfterName
                }
                '>' => {
                    self.depth += 1;
                    token = Some(Token::ElementStart {
                        name: self.start..pos,
                    });
                    self.start = pos + length;
                    State::Content
                }
                '/' => {
                    self.depth += 1;
                    token = Some(Token::ElementStart {
                        name: self.start..pos,
                    });
                    State::ElementStartEmpty
                }
                _ => return Err(ScanError::Syntax),
            },
            State::ElementStartAfterName => match c {
                c if is_space(c) => State::ElementStartAfterName,
                '>' => {
                    self.start = pos + length;
                    State::Content
                }
                '/' => State::ElementStartEmpty,
                c if is_name_start_char(c) => {
                    self.start = pos;
                    State::AttributeName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::ElementStartEmpty => match c {
                '>' => {
                    token = Some(Token::ElementEndEmpty);
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.seen_root = true;
                        State::DocumentContent
                    } else {
                        self.start = pos + length;
                        State::Content
                    }
                }
                _ => return Err(ScanError::Syntax),
            },
            State::AttributeName => match c {
                c if is_name_char(c) => State::AttributeName,
                '=' => {
                    token = Some(Token::AttributeStart {
                        name: self.start..pos,
                    });
                    State::AttributeAfterEquals
                }
                c if is_space(c) => {
                    token = Some(Token::AttributeStart {
                        name: self.start..pos,
                    });
                    State::AttributeAfterName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::AttributeAfterName => match c {
                c if is_space(c) => State::AttributeAfterName,
                '=' => State::AttributeAfterEquals,
                _ => return Err(ScanError::Syntax),
            },
            State::AttributeAfterEquals => match c {
                c if is_space(c) => State::AttributeAfterEquals,
                '"' | '\'' => {
                    self.quote = c;
                    self.start = pos + length;
                    State::AttributeContent
                }
                _ => return Err(ScanError::Syntax),
            },
            State::AttributeContent => match c {
                c if c == self.quote => {
                    token = Some(Token::AttributeContent {
                        content: Content::Text(self.start..pos),
                        last: true,
                    });
                    State::ElementStartAfterName
                }
                '&' => {
                    if self.start < pos {
                        token = Some(Token::AttributeContent {
                            content: Content::Text(self.start..pos),
                            last: false,
                        });
                    }
                    State::AttributeContentRefStart
                }
                '<' => return Err(ScanError::Syntax),
                c if is_char(c) => State::AttributeContent,
                _ => return Err(ScanError::Syntax),
            },
            State::AttributeContentRefStart => match c {
                '#' => {
                    self.value = 0;
                    self.hex = false;
                    State::AttributeContentCharRefStart
                }
                c if is_name_start_char(c) => {
                    self.start = pos;
                    State::AttributeContentEntityRefName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::AttributeContentEntityRefName => match c {
                ';' => {
                    token = Some(Token::AttributeContent {
                        content: Content::Entity(self.start..pos),
                        last: false,
                    });
                    self.start = pos + length;
                    State::AttributeContent
                }
                c if is_name_char(c) => State::AttributeContentEntityRefName,
                _ => return Err(ScanError::Syntax),
            },
            State::AttributeContentCharRefStart => {
                if c == 'x' && !self.hex {
                    self.hex = true;
                    State::AttributeContentCharRefStart
                } else if let Some(digit) = self.ref_digit(c) {
                    self.value = digit;
                    State::AttributeContentCharRef
                } else {
                    return Err(ScanError::Syntax);
                }
            }
            State::AttributeContentCharRef => {
                if let Some(digit) = self.ref_digit(c) {
                    self.ref_accumulate(digit)?;
                    State::AttributeContentCharRef
                } else if c == ';' {
                    token = Some(Token::AttributeContent {
                        content: Content::Codepoint(self.ref_resolve()?),
                        last: false,
                    });
                    self.start = pos + length;
                    State::AttributeContent
                } else {
                    return Err(ScanError::Syntax);
                }
            }
            State::ElementEnd => match c {
                c if is_name_start_char(c) => {
                    self.start = pos;
                    State::ElementEndName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::ElementEndName => match c {
                c if is_name_char(c) => State::ElementEndName,
                '>' => {
                    token = Some(self.close_element(self.start..pos, length));
                    self.state
                }
                c if is_space(c) => {
                    self.end = pos;
                    State::ElementEndAfterName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::ElementEndAfterName => match c {
                c if is_space(c) => State::ElementEndAfterName,
                '>' => {
                    token = Some(self.close_element(self.start..self.end, length));
                    self.state
                }
                _ => return Err(ScanError::Syntax),
            },

            State::Content => match c {
                '<' => {
                    token = self.take_range().map(|text| Token::ElementContent {
                        content: Content::Text(text),
                    });
                    State::ContentMarkup
                }
                '&' => {
                    token = self.take_range().map(|text| Token::ElementContent {
                        content: Content::Text(text),
                    });
                    State::ContentRefStart
                }
                ']' => State::ContentMaybeBeforeEnd,
                c if is_char(c) => State::Content,
                _ => return Err(ScanError::Syntax),
            },
            State::ContentMaybeBeforeEnd => match c {
                ']' => State::ContentMaybeEnd,
                '<' => {
                    token = self.take_range().map(|text| Token::ElementContent {
                        content: Content::Text(text),
                    });
                    State::ContentMarkup
                }
                '&' => {
                    token = self.take_range().map(|text| Token::ElementContent {
                        content: Content::Text(text),
                    });
                    State::ContentRefStart
                }
                c if is_char(c) => State::Content,
                _ => return Err(ScanError::Syntax),
            },
            State::ContentMaybeEnd => match c {
                // the `]]>` sequence may not appear in element text
                '>' => return Err(ScanError::Syntax),
                ']' => State::ContentMaybeEnd,
                '<' => {
                    token = self.take_range().map(|text| Token::ElementContent {
                        content: Content::Text(text),
                    });
                    State::ContentMarkup
                }
                '&' => {
                    token = self.take_range().map(|text| Token::ElementContent {
                        content: Content::Text(text),
                    });
                    State::ContentRefStart
                }
                c if is_char(c) => State::Content,
                _ => return Err(ScanError::Syntax),
            },
            State::ContentMarkup => match c {
                '/' => State::ElementEnd,
                '?' => State::PiTargetStart,
                '!' => State::ContentMarkupBang,
                c if is_name_start_char(c) => {
                    self.start = pos;
                    State::ElementStartName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::ContentMarkupBang => match c {
                '-' => State::CommentBeforeStart,
                '[' => {
                    self.left = b"CDATA[";
                    State::CdataPrefix
                }
                _ => return Err(ScanError::Syntax),
            },
            State::CdataPrefix => {
                if c == self.left[0] as char {
                    self.left = &self.left[1..];
                    if self.left.is_empty() {
                        self.start = pos + length;
                        State::Cdata
                    } else {
                        State::CdataPrefix
                    }
                } else {
                    return Err(ScanError::Syntax);
                }
            }
            State::Cdata => match c {
                ']' => {
                    self.end = pos;
                    State::CdataMaybeBeforeEnd
                }
                c if is_char(c) => State::Cdata,
                _ => return Err(ScanError::Syntax),
            },
            State::CdataMaybeBeforeEnd => match c {
                ']' => State::CdataMaybeEnd,
                c if is_char(c) => State::Cdata,
                _ => return Err(ScanError::Syntax),
            },
            State::CdataMaybeEnd => match c {
                '>' => {
                    if self.start < self.end {
                        token = Some(Token::ElementContent {
                            content: Content::Text(self.start..self.end),
                        });
                    }
                    self.start = pos + length;
                    State::Content
                }
                // ]]]> closes with the last two brackets; earlier ones are text
                ']' => {
                    self.end += length;
                    State::CdataMaybeEnd
                }
                c if is_char(c) => State::Cdata,
                _ => return Err(ScanError::Syntax),
            },
            State::ContentRefStart => match c {
                '#' => {
                    self.value = 0;
                    self.hex = false;
                    State::ContentCharRefStart
                }
                c if is_name_start_char(c) => {
                    self.start = pos;
                    State::ContentEntityRefName
                }
                _ => return Err(ScanError::Syntax),
            },
            State::ContentEntityRefName => match c {
                ';' => {
                    token = Some(Token::ElementContent {
                        content: Content::Entity(self.start..pos),
                    });
                    self.start = pos + length;
                    State::Content
                }
                c if is_name_char(c) => State::ContentEntityRefName,
                _ => return Err(ScanError::Syntax),
            },
            State::ContentCharRefStart => {
                if c == 'x' && !self.hex {
                    self.hex = true;
                    State::ContentCharRefStart
                } else if let Some(digit) = self.ref_digit(c) {
                    self.value = digit;
                    State::ContentCharRef
                } else {
                    return Err(ScanError::Syntax);
                }
            }
            State::ContentCharRef => {
                if let Some(digit) = self.ref_digit(c) {
                    self.ref_accumulate(digit)?;
                    State::ContentCharRef
                } else if c == ';' {
                    token = Some(Token::ElementContent {
                        content: Content::Codepoint(self.ref_resolve()?),
                    });
                    self.start = pos + length;
                    State::Content
                } else {
                    return Err(ScanError::Syntax);
                }
            }

            State::Error => return Err(ScanError::Syntax),
        };
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feed(scanner: &mut Scanner, input: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for c in input.chars() {
            if let Some(token) = scanner.next(c, c.len_utf8()).expect("scan failed") {
                tokens.push(token);
            }
        }
        tokens
    }

    #[test]
    fn reset_between_constructs_is_silent() {
        let mut scanner = Scanner::new();
        feed(&mut scanner, "<root   ");
        assert_eq!(scanner.reset_position(), Ok(None));
        assert_eq!(scanner.position(), 0);

        let tokens = feed(&mut scanner, "attr='v'></root>");
        assert_eq!(
            tokens,
            [
                Token::AttributeStart { name: 0..4 },
                Token::AttributeContent {
                    content: Content::Text(6..7),
                    last: true,
                },
                Token::ElementEnd { name: 11..15 },
            ]
        );
        scanner.end_input().expect("document is complete");
    }

    #[test]
    fn reset_flushes_element_text() {
        let mut scanner = Scanner::new();
        feed(&mut scanner, "<element>Hello,");
        assert_eq!(
            scanner.reset_position(),
            Ok(Some(Token::ElementContent {
                content: Content::Text(9..15),
            }))
        );
        assert_eq!(scanner.position(), 0);

        let tokens = feed(&mut scanner, " world!</element>");
        assert_eq!(
            tokens,
            [
                Token::ElementContent {
                    content: Content::Text(0..7),
                },
                Token::ElementEnd { name: 9..16 },
            ]
        );
    }

    #[test]
    fn reset_flushes_comment_text() {
        let mut scanner = Scanner::new();
        let mut tokens = feed(&mut scanner, "<!--abc");
        assert_eq!(
            scanner.reset_position(),
            Ok(Some(Token::CommentContent {
                content: 4..7,
                last: false,
            }))
        );
        tokens.extend(feed(&mut scanner, "def--><r/>"));
        assert_eq!(
            tokens,
            [
                Token::CommentStart,
                Token::CommentContent {
                    content: 0..3,
                    last: true,
                },
                Token::ElementStart { name: 7..8 },
                Token::ElementEndEmpty,
            ]
        );
    }

    #[test]
    fn reset_refused_inside_name() {
        let mut scanner = Scanner::new();
        feed(&mut scanner, "<elem");
        assert_eq!(scanner.reset_position(), Err(ScanError::CannotReset));
        // the refusal must leave the scanner untouched
        let tokens = feed(&mut scanner, "ent/>");
        assert_eq!(
            tokens,
            [Token::ElementStart { name: 1..8 }, Token::ElementEndEmpty]
        );
    }

    #[test]
    fn reset_refused_inside_reference() {
        let mut scanner = Scanner::new();
        feed(&mut scanner, "<e>&am");
        assert_eq!(scanner.reset_position(), Err(ScanError::CannotReset));
    }

    #[test]
    fn reset_refused_inside_maybe_end() {
        let mut scanner = Scanner::new();
        feed(&mut scanner, "<e><!--text-");
        assert_eq!(scanner.reset_position(), Err(ScanError::CannotReset));

        let mut scanner = Scanner::new();
        feed(&mut scanner, "<e>text]");
        assert_eq!(scanner.reset_position(), Err(ScanError::CannotReset));
    }

    #[test]
    fn reset_refused_inside_xml_declaration_value() {
        let mut scanner = Scanner::new();
        feed(&mut scanner, "<?xml version=\"1.0");
        assert_eq!(scanner.reset_position(), Err(ScanError::CannotReset));
    }

    #[test]
    fn error_state_is_terminal() {
        let mut scanner = Scanner::new();
        feed(&mut scanner, "<!DOCTYPE");
        assert_eq!(scanner.next(' ', 1), Err(ScanError::DoctypeNotSupported));
        // latched: the original error kind is not reported again
        assert_eq!(scanner.next('r', 1), Err(ScanError::Syntax));
        assert_eq!(scanner.next('>', 1), Err(ScanError::Syntax));
    }

    #[test]
    fn position_is_not_advanced_by_failures() {
        let mut scanner = Scanner::new();
        feed(&mut scanner, "<e>");
        assert_eq!(scanner.position(), 3);
        assert_eq!(scanner.next('\u{0}', 1), Err(ScanError::Syntax));
        assert_eq!(scanner.position(), 3);
    }
}
