//! Character classes of the XML 1.0 grammar.

/// Checks whether `c` is an XML `Char`: tab, LF, CR, or any codepoint in
/// `U+0020..=U+D7FF`, `U+E000..=U+FFFD`, `U+10000..=U+10FFFF`.
#[inline]
pub(crate) fn is_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Checks whether `c` is an XML whitespace character.
#[inline]
pub(crate) fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Checks whether `c` may start a `Name`.
#[inline]
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// Checks whether `c` may continue a `Name`.
#[inline]
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9'
            | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

/// Value of `c` as an ASCII decimal digit, if it is one.
#[inline]
pub(crate) fn digit_value(c: char) -> Option<u32> {
    c.to_digit(10)
}

/// Value of `c` as an ASCII hexadecimal digit, if it is one.
#[inline]
pub(crate) fn hex_digit_value(c: char) -> Option<u32> {
    c.to_digit(16)
}

/// Checks whether `c` may start an `EncName` in an XML declaration.
#[inline]
pub(crate) fn is_encoding_start_char(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Checks whether `c` may continue an `EncName`.
#[inline]
pub(crate) fn is_encoding_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}
