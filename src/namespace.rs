//! Namespace bookkeeping for the [`Writer`], according to the W3C
//! [Namespaces in XML 1.0 (Third Edition)][spec] specification.
//!
//! [`Writer`]: crate::Writer
//! [spec]: https://www.w3.org/TR/xml-names

use std::ops::Range;

/// Namespace name the `xml` prefix is bound to in every document.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace name of the `xmlns` declaration machinery itself. Reserved;
/// it is never bound to a prefix and never re-bound.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// An entry that contains indexes into the writer's string arena with one
/// namespace binding.
///
/// Defines a mapping from *prefix* to *namespace name*. A zero `prefix_len`
/// defines the default namespace that applies to unprefixed element names
/// (unprefixed attribute names never bind to any namespace).
#[derive(Debug, Clone)]
struct NsBinding {
    /// Index of the binding's text in the arena: the prefix immediately
    /// followed by the namespace name.
    start: usize,
    /// Length of the prefix part.
    prefix_len: usize,
    /// Length of the namespace name part.
    value_len: usize,
    /// Number of open elements when this binding was declared, the
    /// declaring element included. Used to pop the binding when that
    /// element gets closed.
    level: usize,
}

impl NsBinding {
    #[inline]
    fn prefix<'b>(&self, buffer: &'b [u8]) -> &'b [u8] {
        &buffer[self.start..self.start + self.prefix_len]
    }

    #[inline]
    fn value<'b>(&self, buffer: &'b [u8]) -> &'b [u8] {
        let start = self.start + self.prefix_len;
        &buffer[start..start + self.value_len]
    }
}

/// A namespace management stack for the writer.
///
/// Holds all internal logic to declare, stage and resolve prefixes with
/// their levels. The binding text itself lives in the writer's string
/// arena, which is passed into every operation, so closing an element can
/// release names and namespace text together.
#[derive(Debug, Default)]
pub(crate) struct NamespaceStack {
    /// Bindings currently in scope, outermost first.
    bindings: Vec<NsBinding>,
    /// Bindings staged for the next element's start tag.
    pending: Vec<NsBinding>,
    /// Rising counter for generated `ns0`, `ns1`, ... prefixes.
    generated: usize,
}

impl NamespaceStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Declares `prefix` -> `value` at `level`, storing the text in `buffer`.
    pub(crate) fn bind(&mut self, buffer: &mut Vec<u8>, prefix: &[u8], value: &[u8], level: usize) {
        let start = buffer.len();
        buffer.extend_from_slice(prefix);
        buffer.extend_from_slice(value);
        self.bindings.push(NsBinding {
            start,
            prefix_len: prefix.len(),
            value_len: value.len(),
            level,
        });
    }

    /// Stages `prefix` -> `value` for the next element's start tag. A
    /// pending entry for the same prefix is replaced.
    pub(crate) fn stage(&mut self, buffer: &mut Vec<u8>, prefix: &[u8], value: &[u8]) {
        self.pending
            .retain(|binding| binding.prefix(buffer) != prefix);
        let start = buffer.len();
        buffer.extend_from_slice(prefix);
        buffer.extend_from_slice(value);
        self.pending.push(NsBinding {
            start,
            prefix_len: prefix.len(),
            value_len: value.len(),
            level: 0,
        });
    }

    /// Number of staged bindings.
    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Arena ranges of the `index`th staged binding's prefix and value.
    pub(crate) fn pending_entry(&self, index: usize) -> (Range<usize>, Range<usize>) {
        let binding = &self.pending[index];
        let split = binding.start + binding.prefix_len;
        (binding.start..split, split..split + binding.value_len)
    }

    /// Moves all staged bindings into scope at `level`.
    pub(crate) fn commit_pending(&mut self, level: usize) {
        for mut binding in self.pending.drain(..) {
            binding.level = level;
            self.bindings.push(binding);
        }
    }

    /// Drops all staged bindings. Their text is released when the
    /// enclosing element truncates the arena.
    pub(crate) fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Drops every binding declared deeper than `level`.
    pub(crate) fn pop_level(&mut self, level: usize) {
        self.bindings.retain(|binding| binding.level <= level);
    }

    /// Looks up a prefix bound to namespace name `value`, innermost scope
    /// first, skipping bindings whose prefix is shadowed further in.
    ///
    /// The default namespace takes part only when `allow_default` is set:
    /// element names may use it, attribute names may not.
    pub(crate) fn resolve<'b>(
        &self,
        buffer: &'b [u8],
        value: &[u8],
        allow_default: bool,
    ) -> Option<&'b [u8]> {
        for (index, binding) in self.pending.iter().enumerate().rev() {
            if binding.value(buffer) != value {
                continue;
            }
            if !allow_default && binding.prefix_len == 0 {
                continue;
            }
            let prefix = binding.prefix(buffer);
            if self.pending[index + 1..]
                .iter()
                .all(|inner| inner.prefix(buffer) != prefix)
            {
                return Some(prefix);
            }
        }
        for (index, binding) in self.bindings.iter().enumerate().rev() {
            if binding.value(buffer) != value {
                continue;
            }
            if !allow_default && binding.prefix_len == 0 {
                continue;
            }
            let prefix = binding.prefix(buffer);
            let shadowed = self.bindings[index + 1..]
                .iter()
                .chain(self.pending.iter())
                .any(|inner| inner.prefix(buffer) == prefix);
            if !shadowed {
                return Some(prefix);
            }
        }
        None
    }

    /// Checks whether `prefix` is bound or staged anywhere in the stack.
    pub(crate) fn is_prefix_taken(&self, buffer: &[u8], prefix: &[u8]) -> bool {
        self.bindings
            .iter()
            .chain(self.pending.iter())
            .any(|binding| binding.prefix(buffer) == prefix)
    }

    /// Allocates a fresh `nsN` prefix, skipping collisions with prefixes
    /// bound anywhere in the stack. The counter keeps rising for the
    /// lifetime of the writer.
    pub(crate) fn generate(&mut self, buffer: &[u8]) -> String {
        loop {
            let candidate = format!("ns{}", self.generated);
            self.generated += 1;
            if !self.is_prefix_taken(buffer, candidate.as_bytes()) {
                return candidate;
            }
        }
    }
}
