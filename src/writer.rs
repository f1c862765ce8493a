//! A module to handle `Writer`

use std::io::Write;
use std::ops::Range;

use crate::errors::{Error, Result};
use crate::escape::{attribute_replacement, escape_attribute, escape_text};
use crate::namespace::{NamespaceStack, XML_NAMESPACE, XMLNS_NAMESPACE};

/// Unicode "byte order mark" encoded as UTF-8
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Configuration of a [`Writer`].
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// One level of indentation, e.g. `"  "`. The default empty string
    /// produces compact output; anything else turns on pretty-printing,
    /// which inserts newlines and indentation between structural siblings.
    /// Those become part of the document, so only use it where whitespace
    /// between elements is insignificant.
    pub indent: String,
    /// Whether the writer tracks namespace scopes and may resolve and
    /// generate prefixes. When `false`, the `_ns` methods are disallowed
    /// and element and attribute names are written opaquely. Default `true`.
    pub namespace_aware: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: String::new(),
            namespace_aware: true,
        }
    }
}

/// The writer's position in the document structure.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum WriteState {
    /// Nothing was written yet.
    Start,
    /// A byte order mark was written; an XML declaration is still legal.
    AfterBom,
    /// At document level before the root element.
    AfterXmlDecl,
    /// Inside a start tag whose `>` was not written yet; attributes and
    /// namespace declarations may still be added.
    ElementStart,
    /// Inside an element, directly after a structural child.
    AfterStructureEnd,
    /// Inside an element, directly after character content. Suppresses
    /// indentation so the content keeps its exact value.
    Text,
    /// The root element was closed; only misc content and `eof` are legal.
    End,
    /// Terminal state; any further call is a contract violation.
    Eof,
}

/// Per-open-element record of the writer.
#[derive(Debug, Clone)]
struct ElementFrame {
    /// Arena length when the element was opened. Closing the element
    /// truncates the arena back here, releasing the name and every
    /// namespace string staged for it.
    watermark: usize,
    /// Arena range of the qualified name, kept for the end tag.
    name: Range<usize>,
}

/// XML writer.
///
/// Serializes structured calls into well-formed XML on a [`Write`]
/// implementor, keeping track of element nesting and, unless disabled in
/// [`WriteOptions`], of namespace scopes: [`element_start_ns`] and
/// [`attribute_ns`] look prefixes up in the active declarations and
/// generate `ns0`, `ns1`, ... declarations for namespaces that have none.
///
/// Recoverable errors come only from the sink. Calls that violate the
/// document structure (content outside an element, `eof` before the root
/// is closed, anything after `eof`) are caller bugs and panic.
///
/// # Examples
///
/// ```
/// use stream_xml::Writer;
///
/// let mut writer = Writer::new(Vec::new());
/// writer.element_start("greeting").unwrap();
/// writer.attribute("lang", "en").unwrap();
/// writer.text("hello, world").unwrap();
/// writer.element_end().unwrap();
/// writer.eof().unwrap();
///
/// assert_eq!(
///     writer.into_inner(),
///     br#"<greeting lang="en">hello, world</greeting>"#
/// );
/// ```
///
/// [`element_start_ns`]: Writer::element_start_ns
/// [`attribute_ns`]: Writer::attribute_ns
pub struct Writer<W: Write> {
    /// underlying writer
    writer: W,
    options: WriteOptions,
    state: WriteState,
    /// Currently open elements, outermost first.
    elements: Vec<ElementFrame>,
    /// Element names and namespace text, truncated LIFO on element close.
    strings: Vec<u8>,
    namespaces: NamespaceStack,
}

impl<W: Write> Writer<W> {
    /// Creates a `Writer` with default options from a generic `Write`.
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, WriteOptions::default())
    }

    /// Creates a `Writer` with the given options from a generic `Write`.
    pub fn with_options(inner: W, options: WriteOptions) -> Self {
        Self {
            writer: inner,
            options,
            state: WriteState::Start,
            elements: Vec::new(),
            strings: Vec::new(),
            namespaces: NamespaceStack::new(),
        }
    }

    /// Creates a `Writer` with configured whitespace indents from a
    /// generic `Write`.
    pub fn new_with_indent(inner: W, indent: &str) -> Self {
        Self::with_options(
            inner,
            WriteOptions {
                indent: indent.to_string(),
                ..WriteOptions::default()
            },
        )
    }

    /// Consumes this `Writer`, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Get inner writer, keeping ownership
    pub fn inner(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Writes a UTF-8 byte order mark. Legal only as the very first call.
    pub fn bom(&mut self) -> Result<()> {
        assert!(
            self.state == WriteState::Start,
            "a byte order mark must be the first thing written"
        );
        self.write(UTF8_BOM)?;
        self.state = WriteState::AfterBom;
        Ok(())
    }

    /// Writes the `<?xml version="1.0" ...?>` declaration.
    ///
    /// Legal only before any other content (a byte order mark excepted).
    pub fn xml_declaration(
        &mut self,
        encoding: Option<&str>,
        standalone: Option<bool>,
    ) -> Result<()> {
        assert!(
            matches!(self.state, WriteState::Start | WriteState::AfterBom),
            "an XML declaration must precede all content"
        );
        self.write(b"<?xml version=\"1.0\"")?;
        if let Some(encoding) = encoding {
            self.write(b" encoding=\"")?;
            self.write(encoding.as_bytes())?;
            self.write(b"\"")?;
        }
        match standalone {
            Some(true) => self.write(b" standalone=\"yes\"")?,
            Some(false) => self.write(b" standalone=\"no\"")?,
            None => {}
        }
        self.write(b"?>")?;
        self.state = WriteState::AfterXmlDecl;
        Ok(())
    }

    /// Opens an element with an opaque name.
    ///
    /// An already open start tag is closed with `>` first. The tag stays
    /// open for [`attribute`] calls until the next structural call.
    ///
    /// [`attribute`]: Writer::attribute
    pub fn element_start(&mut self, name: &str) -> Result<()> {
        assert!(
            self.state != WriteState::End,
            "the document already has a root element"
        );
        self.before_structural()?;
        let watermark = self.strings.len();
        self.strings.extend_from_slice(name.as_bytes());
        self.elements.push(ElementFrame {
            watermark,
            name: watermark..watermark + name.len(),
        });
        self.write(b"<")?;
        self.write(name.as_bytes())?;
        if self.options.namespace_aware {
            self.flush_pending()?;
        }
        self.state = WriteState::ElementStart;
        Ok(())
    }

    /// Opens an element named `local` in namespace `ns`.
    ///
    /// The prefix is looked up among the predefined `xml` binding, the
    /// staged declarations and the active scopes, innermost first; if none
    /// binds `ns`, a fresh `nsN` prefix is generated and declared on this
    /// element. An element may use the default namespace when one is
    /// declared for `ns`.
    pub fn element_start_ns(&mut self, ns: &str, local: &str) -> Result<()> {
        assert!(
            self.options.namespace_aware,
            "namespace support is disabled for this writer"
        );
        assert!(
            !ns.is_empty(),
            "XML 1.0 cannot undeclare prefixes: the namespace must be non-empty"
        );
        assert!(
            self.state != WriteState::End,
            "the document already has a root element"
        );
        self.before_structural()?;
        let watermark = self.strings.len();
        let prefix = self.prefix_for(ns, true);

        let name_start = self.strings.len();
        if !prefix.is_empty() {
            self.strings.extend_from_slice(&prefix);
            self.strings.push(b':');
        }
        self.strings.extend_from_slice(local.as_bytes());
        let name = name_start..self.strings.len();

        self.write(b"<")?;
        self.writer
            .write_all(&self.strings[name.clone()])
            .map_err(Error::Io)?;
        self.elements.push(ElementFrame { watermark, name });
        self.flush_pending()?;
        self.state = WriteState::ElementStart;
        Ok(())
    }

    /// Writes an attribute into the currently open start tag.
    ///
    /// On a namespace-aware writer, `xmlns` and `xmlns:prefix` attributes
    /// additionally declare the corresponding binding in the current
    /// element's scope.
    pub fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        assert!(
            self.state == WriteState::ElementStart,
            "attributes are only legal inside a start tag"
        );
        self.write(b" ")?;
        self.write(name.as_bytes())?;
        self.write(b"=\"")?;
        self.write(escape_attribute(value).as_bytes())?;
        self.write(b"\"")?;
        if self.options.namespace_aware {
            if name == "xmlns" {
                let level = self.elements.len();
                self.namespaces
                    .bind(&mut self.strings, b"", value.as_bytes(), level);
            } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                let level = self.elements.len();
                self.namespaces.bind(
                    &mut self.strings,
                    prefix.as_bytes(),
                    value.as_bytes(),
                    level,
                );
            }
        }
        Ok(())
    }

    /// Writes an attribute named `local` in namespace `ns` into the
    /// currently open start tag.
    ///
    /// Unprefixed attributes are in no namespace, so the default namespace
    /// never applies; when no prefix binds `ns`, one is generated and
    /// declared on this element. Passing [`XMLNS_NAMESPACE`] declares the
    /// prefix `local` instead, exactly like an `xmlns:local` attribute.
    pub fn attribute_ns(&mut self, ns: &str, local: &str, value: &str) -> Result<()> {
        assert!(
            self.options.namespace_aware,
            "namespace support is disabled for this writer"
        );
        assert!(
            self.state == WriteState::ElementStart,
            "attributes are only legal inside a start tag"
        );
        assert!(
            !ns.is_empty(),
            "XML 1.0 cannot undeclare prefixes: the namespace must be non-empty"
        );
        if ns == XMLNS_NAMESPACE {
            assert!(local != "xmlns", "the xmlns prefix is reserved");
            self.write(b" xmlns:")?;
            self.write(local.as_bytes())?;
            self.write(b"=\"")?;
            self.write(escape_attribute(value).as_bytes())?;
            self.write(b"\"")?;
            let level = self.elements.len();
            self.namespaces
                .bind(&mut self.strings, local.as_bytes(), value.as_bytes(), level);
            return Ok(());
        }
        let prefix = match self.lookup_prefix(ns, false) {
            Some(prefix) => prefix,
            None => {
                let generated = self.namespaces.generate(&self.strings);
                self.declare(generated.as_bytes(), ns.as_bytes())?;
                generated.into_bytes()
            }
        };
        self.write(b" ")?;
        self.write(&prefix)?;
        self.write(b":")?;
        self.write(local.as_bytes())?;
        self.write(b"=\"")?;
        self.write(escape_attribute(value).as_bytes())?;
        self.write(b"\"")?;
        Ok(())
    }

    /// Closes the innermost open element with an end tag.
    pub fn element_end(&mut self) -> Result<()> {
        let frame = match self.elements.pop() {
            Some(frame) => frame,
            None => panic!("no element is open"),
        };
        match self.state {
            WriteState::ElementStart => {
                self.write(b">")?;
                self.indent()?;
            }
            WriteState::Text => {}
            WriteState::AfterStructureEnd => self.indent()?,
            _ => panic!("no element is open"),
        }
        self.write(b"</")?;
        self.writer
            .write_all(&self.strings[frame.name.clone()])
            .map_err(Error::Io)?;
        self.write(b">")?;
        self.close_frame(frame);
        Ok(())
    }

    /// Closes the currently open start tag as an empty element with `/>`.
    pub fn element_end_empty(&mut self) -> Result<()> {
        assert!(
            self.state == WriteState::ElementStart,
            "no start tag is open"
        );
        let frame = match self.elements.pop() {
            Some(frame) => frame,
            None => panic!("no element is open"),
        };
        self.write(b"/>")?;
        self.close_frame(frame);
        Ok(())
    }

    /// Writes character content, escaping `&`, `<` and `\r`.
    pub fn text(&mut self, text: &str) -> Result<()> {
        self.before_content()?;
        self.write(escape_text(text).as_bytes())?;
        self.state = WriteState::Text;
        Ok(())
    }

    /// Writes a `<![CDATA[...]]>` section.
    ///
    /// The content is written raw; the caller guarantees it contains no
    /// `]]>`.
    pub fn cdata(&mut self, text: &str) -> Result<()> {
        self.before_content()?;
        self.write(b"<![CDATA[")?;
        self.write(text.as_bytes())?;
        self.write(b"]]>")?;
        self.state = WriteState::Text;
        Ok(())
    }

    /// Writes a `<!--...-->` comment.
    ///
    /// The content is written raw; the caller guarantees it contains no
    /// `-->`.
    pub fn comment(&mut self, text: &str) -> Result<()> {
        let at_document_end = self.state == WriteState::End;
        self.before_structural()?;
        self.write(b"<!--")?;
        self.write(text.as_bytes())?;
        self.write(b"-->")?;
        self.state = self.after_misc(at_document_end);
        Ok(())
    }

    /// Writes a `<?target data?>` processing instruction.
    ///
    /// The data is written raw; the caller guarantees it contains no `?>`.
    pub fn pi(&mut self, target: &str, data: &str) -> Result<()> {
        let at_document_end = self.state == WriteState::End;
        self.before_structural()?;
        self.write(b"<?")?;
        self.write(target.as_bytes())?;
        if !data.is_empty() {
            self.write(b" ")?;
            self.write(data.as_bytes())?;
        }
        self.write(b"?>")?;
        self.state = self.after_misc(at_document_end);
        Ok(())
    }

    /// Writes a numeric character reference, always as uppercase hex.
    pub fn character_reference(&mut self, c: char) -> Result<()> {
        self.before_content()?;
        write!(self.writer, "&#x{:X};", u32::from(c)).map_err(Error::Io)?;
        self.state = WriteState::Text;
        Ok(())
    }

    /// Writes a named entity reference `&name;` without resolving it.
    pub fn entity_reference(&mut self, name: &str) -> Result<()> {
        self.before_content()?;
        self.write(b"&")?;
        self.write(name.as_bytes())?;
        self.write(b";")?;
        self.state = WriteState::Text;
        Ok(())
    }

    /// Splices a pre-serialized XML fragment into the output, raw.
    ///
    /// The state advances as if the fragment were well-formed structural
    /// content: at document level the fragment counts as the root.
    pub fn embed(&mut self, raw: &str) -> Result<()> {
        self.before_structural()?;
        self.write(raw.as_bytes())?;
        self.state = if self.elements.is_empty() {
            WriteState::End
        } else {
            WriteState::AfterStructureEnd
        };
        Ok(())
    }

    /// Declares the namespace binding `prefix` -> `ns`.
    ///
    /// Inside an open start tag the `xmlns[:prefix]` attribute is written
    /// immediately and scoped to the current element; anywhere else the
    /// binding is staged and committed by the next [`element_start`] /
    /// [`element_start_ns`].
    ///
    /// [`element_start`]: Writer::element_start
    /// [`element_start_ns`]: Writer::element_start_ns
    pub fn bind_ns(&mut self, prefix: &str, ns: &str) -> Result<()> {
        assert!(
            self.options.namespace_aware,
            "namespace support is disabled for this writer"
        );
        assert!(prefix != "xmlns", "the xmlns prefix is reserved");
        assert!(self.state != WriteState::Eof, "write after eof");
        if self.state == WriteState::ElementStart {
            self.declare(prefix.as_bytes(), ns.as_bytes())?;
        } else {
            self.namespaces
                .stage(&mut self.strings, prefix.as_bytes(), ns.as_bytes());
        }
        Ok(())
    }

    /// Finishes the document. Legal only once the root element is closed;
    /// appends a trailing newline when pretty-printing.
    pub fn eof(&mut self) -> Result<()> {
        assert!(
            self.state == WriteState::End,
            "eof is only legal after the root element was closed"
        );
        if !self.options.indent.is_empty() {
            self.write(b"\n")?;
        }
        self.state = WriteState::Eof;
        Ok(())
    }

    /// Writes bytes
    #[inline]
    fn write(&mut self, value: &[u8]) -> Result<()> {
        self.writer.write_all(value).map_err(Error::Io)
    }

    /// Newline plus one indent per open element, when pretty-printing.
    fn indent(&mut self) -> Result<()> {
        if self.options.indent.is_empty() {
            return Ok(());
        }
        self.writer.write_all(b"\n").map_err(Error::Io)?;
        for _ in 0..self.elements.len() {
            self.writer
                .write_all(self.options.indent.as_bytes())
                .map_err(Error::Io)?;
        }
        Ok(())
    }

    /// Prepares for a structural event: closes an open start tag and
    /// settles indentation.
    fn before_structural(&mut self) -> Result<()> {
        match self.state {
            WriteState::Start | WriteState::AfterBom | WriteState::Text => Ok(()),
            WriteState::AfterXmlDecl | WriteState::AfterStructureEnd | WriteState::End => {
                self.indent()
            }
            WriteState::ElementStart => {
                self.write(b">")?;
                self.indent()
            }
            WriteState::Eof => panic!("write after eof"),
        }
    }

    /// Prepares for character content, which is only legal inside an
    /// element and never indented.
    fn before_content(&mut self) -> Result<()> {
        match self.state {
            WriteState::ElementStart => self.write(b">"),
            WriteState::AfterStructureEnd | WriteState::Text => Ok(()),
            WriteState::Eof => panic!("write after eof"),
            _ => panic!("content is only legal inside an element"),
        }
    }

    /// State after a comment or processing instruction.
    fn after_misc(&self, at_document_end: bool) -> WriteState {
        if !self.elements.is_empty() {
            WriteState::AfterStructureEnd
        } else if at_document_end {
            WriteState::End
        } else {
            WriteState::AfterXmlDecl
        }
    }

    /// Releases an element's frame: namespace scope, pending declarations
    /// and arena strings.
    fn close_frame(&mut self, frame: ElementFrame) {
        self.strings.truncate(frame.watermark);
        if self.options.namespace_aware {
            self.namespaces.pop_level(self.elements.len());
            self.namespaces.clear_pending();
        }
        self.state = if self.elements.is_empty() {
            WriteState::End
        } else {
            WriteState::AfterStructureEnd
        };
    }

    /// Prefix for `ns`, staging a generated declaration when nothing in
    /// scope binds it.
    fn prefix_for(&mut self, ns: &str, allow_default: bool) -> Vec<u8> {
        if let Some(prefix) = self.lookup_prefix(ns, allow_default) {
            return prefix;
        }
        let generated = self.namespaces.generate(&self.strings);
        self.namespaces
            .stage(&mut self.strings, generated.as_bytes(), ns.as_bytes());
        generated.into_bytes()
    }

    /// Prefix already bound to `ns`, if any: predefined bindings first,
    /// then staged declarations, then the active scopes innermost first.
    fn lookup_prefix(&self, ns: &str, allow_default: bool) -> Option<Vec<u8>> {
        if ns == XML_NAMESPACE {
            return Some(b"xml".to_vec());
        }
        self.namespaces
            .resolve(&self.strings, ns.as_bytes(), allow_default)
            .map(|prefix| prefix.to_vec())
    }

    /// Writes and scopes an `xmlns[:prefix]` declaration inside the
    /// currently open start tag.
    fn declare(&mut self, prefix: &[u8], value: &[u8]) -> Result<()> {
        debug_assert!(self.state == WriteState::ElementStart);
        self.write(b" xmlns")?;
        if !prefix.is_empty() {
            self.write(b":")?;
            self.write(prefix)?;
        }
        self.write(b"=\"")?;
        self.write(escape_attribute_bytes(value).as_slice())?;
        self.write(b"\"")?;
        let level = self.elements.len();
        self.namespaces.bind(&mut self.strings, prefix, value, level);
        Ok(())
    }

    /// Writes the staged declarations into the just-opened start tag and
    /// commits them to the new element's scope.
    fn flush_pending(&mut self) -> Result<()> {
        for index in 0..self.namespaces.pending_count() {
            let (prefix, value) = self.namespaces.pending_entry(index);
            self.writer.write_all(b" xmlns").map_err(Error::Io)?;
            if !prefix.is_empty() {
                self.writer.write_all(b":").map_err(Error::Io)?;
                self.writer
                    .write_all(&self.strings[prefix])
                    .map_err(Error::Io)?;
            }
            self.writer.write_all(b"=\"").map_err(Error::Io)?;
            let escaped = escape_attribute_bytes(&self.strings[value]);
            self.writer.write_all(&escaped).map_err(Error::Io)?;
            self.writer.write_all(b"\"").map_err(Error::Io)?;
        }
        self.namespaces.commit_pending(self.elements.len());
        Ok(())
    }
}

/// Attribute-value escaping over raw UTF-8 bytes. Used for namespace text
/// held in the arena; every replaced byte is ASCII, so codepoint
/// boundaries are preserved.
fn escape_attribute_bytes(raw: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(raw.len());
    for &b in raw {
        match attribute_replacement(b) {
            Some(replacement) => escaped.extend_from_slice(replacement.as_bytes()),
            None => escaped.push(b),
        }
    }
    escaped
}
