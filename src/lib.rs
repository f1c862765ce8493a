//! Low-level streaming XML scanner and writer.
//!
//! ## Description
//!
//! - [`Scanner`]: an allocation-free pull tokenizer driven one codepoint at
//!   a time; tokens reference the input through position ranges instead of
//!   carrying text
//! - [`Writer`]: a namespace-aware XML emitter with optional pretty-printing
//! - [`encoding`]: decoders turning raw bytes into the codepoints the
//!   scanner consumes, with UTF-16 byte-order-mark autodetection
//!
//! The scanner deliberately stops below well-formedness checking: it does
//! not match close tags against open tags, detect duplicate attributes, or
//! resolve entities, and it rejects any DOCTYPE. Those policies belong to
//! the layer above; this crate supplies exact tokens, exact error
//! positions, and a way to keep the input buffer small
//! ([`Scanner::reset_position`]).
//!
//! ## Examples
//!
//! ### Scanner
//!
//! ```
//! use stream_xml::{Content, Scanner, Token};
//!
//! let xml = r#"<hello lang="en">Hi &amp; bye</hello>"#;
//! let mut scanner = Scanner::new();
//! let mut tokens = Vec::new();
//! for c in xml.chars() {
//!     if let Some(token) = scanner.next(c, c.len_utf8()).unwrap() {
//!         tokens.push(token);
//!     }
//! }
//! scanner.end_input().unwrap();
//!
//! // ranges index the caller's input
//! match &tokens[0] {
//!     Token::ElementStart { name } => assert_eq!(&xml[name.clone()], "hello"),
//!     token => panic!("unexpected {:?}", token),
//! }
//! // the &amp; reference is reported by name, unresolved
//! assert!(tokens.contains(&Token::ElementContent {
//!     content: Content::Entity(21..24),
//! }));
//! assert_eq!(&xml[21..24], "amp");
//! ```
//!
//! ### Writer
//!
//! ```
//! use stream_xml::Writer;
//!
//! let mut writer = Writer::new_with_indent(Vec::new(), "  ");
//! writer.xml_declaration(Some("UTF-8"), None).unwrap();
//! writer.element_start("test").unwrap();
//! writer.element_start("inner").unwrap();
//! writer.text("Hello, world!").unwrap();
//! writer.element_end().unwrap();
//! writer.element_end().unwrap();
//! writer.eof().unwrap();
//!
//! assert_eq!(
//!     String::from_utf8(writer.into_inner()).unwrap(),
//!     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
//!      <test>\n  <inner>Hello, world!</inner>\n</test>\n"
//! );
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chars;
mod errors;
mod namespace;
mod scanner;
mod tokens;
mod writer;

pub mod encoding;
pub mod escape;

// reexports
pub use errors::{DecodeError, Error, Result, ScanError};
pub use namespace::{XML_NAMESPACE, XMLNS_NAMESPACE};
pub use scanner::Scanner;
pub use tokens::{Content, Token};
pub use writer::{WriteOptions, Writer};
