use pretty_assertions::assert_eq;
use stream_xml::{Content, ScanError, Scanner, Token};

/// Scans a complete document and returns its tokens.
fn scan(xml: &str) -> Vec<Token> {
    let mut scanner = Scanner::new();
    let mut tokens = Vec::new();
    for (i, c) in xml.char_indices() {
        match scanner.next(c, c.len_utf8()) {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => {}
            Err(e) => panic!("error {:?} at byte {} of {:?}", e, i, xml),
        }
    }
    scanner.end_input().expect("document is complete");
    tokens
}

/// Scans until the first error and returns it with the scanner's position.
fn scan_err(xml: &str) -> (ScanError, usize) {
    let mut scanner = Scanner::new();
    for c in xml.chars() {
        if let Err(e) = scanner.next(c, c.len_utf8()) {
            return (e, scanner.position());
        }
    }
    panic!("expected an error scanning {:?}", xml);
}

fn text(range: std::ops::Range<usize>) -> Token {
    Token::ElementContent {
        content: Content::Text(range),
    }
}

#[test]
fn empty_element() {
    assert_eq!(
        scan("<element/>"),
        [Token::ElementStart { name: 1..8 }, Token::ElementEndEmpty]
    );
}

#[test]
fn nested_elements_with_whitespace() {
    assert_eq!(
        scan("<root   ><sub\t><inner\n/></sub ></root\r  >"),
        [
            Token::ElementStart { name: 1..5 },
            Token::ElementStart { name: 10..13 },
            Token::ElementStart { name: 16..21 },
            Token::ElementEndEmpty,
            Token::ElementEnd { name: 26..29 },
            Token::ElementEnd { name: 33..37 },
        ]
    );
}

#[test]
fn doctype_is_rejected() {
    let (error, position) = scan_err("<!DOCTYPE root><root/>");
    assert_eq!(error, ScanError::DoctypeNotSupported);
    assert_eq!(position, 9);
}

#[test]
fn xml_declaration_version_only() {
    let xml = "<?xml version=\"1.0\"?><r/>";
    assert_eq!(
        scan(xml),
        [
            Token::XmlDeclaration {
                version: 15..18,
                encoding: None,
                standalone: None,
            },
            Token::ElementStart { name: 22..23 },
            Token::ElementEndEmpty,
        ]
    );
    assert_eq!(&xml[15..18], "1.0");
}

#[test]
fn xml_declaration_full() {
    let xml = "<?xml version=\"1.1\" encoding=\"UTF-8\" standalone=\"yes\"?><r/>";
    let tokens = scan(xml);
    assert_eq!(
        tokens[0],
        Token::XmlDeclaration {
            version: 15..18,
            encoding: Some(30..35),
            standalone: Some(true),
        }
    );
    assert_eq!(&xml[15..18], "1.1");
    assert_eq!(&xml[30..35], "UTF-8");
}

#[test]
fn xml_declaration_single_quotes() {
    let tokens = scan("<?xml version='1.0' standalone='no'?><r/>");
    assert_eq!(
        tokens[0],
        Token::XmlDeclaration {
            version: 15..18,
            encoding: None,
            standalone: Some(false),
        }
    );
}

#[test]
fn xml_declaration_requires_version_first() {
    let (error, _) = scan_err("<?xml encoding=\"UTF-8\"?><r/>");
    assert_eq!(error, ScanError::Syntax);
}

#[test]
fn xml_declaration_field_order_is_strict() {
    // standalone before encoding
    let (error, _) = scan_err("<?xml version=\"1.0\" standalone=\"yes\" encoding=\"UTF-8\"?>");
    assert_eq!(error, ScanError::Syntax);
}

#[test]
fn xml_declaration_version_must_be_one_dot() {
    assert_eq!(scan_err("<?xml version=\"2.0\"?><r/>").0, ScanError::Syntax);
    assert_eq!(scan_err("<?xml version=\"1\"?><r/>").0, ScanError::Syntax);
    assert_eq!(scan_err("<?xml version=\"1.\"?><r/>").0, ScanError::Syntax);
}

#[test]
fn bom_is_consumed() {
    let xml = "\u{FEFF}<e/>";
    assert_eq!(
        scan(xml),
        [Token::ElementStart { name: 4..5 }, Token::ElementEndEmpty]
    );
    // a second mark is not content
    let mut scanner = Scanner::new();
    scanner.next('\u{FEFF}', 3).expect("first mark is fine");
    assert_eq!(scanner.next('\u{FEFF}', 3), Err(ScanError::Syntax));
}

#[test]
fn processing_instruction_without_data() {
    assert_eq!(
        scan("<?pi?><r/>"),
        [
            Token::PiStart { target: 2..4 },
            Token::PiContent {
                content: 4..4,
                last: true,
            },
            Token::ElementStart { name: 7..8 },
            Token::ElementEndEmpty,
        ]
    );
}

#[test]
fn processing_instruction_with_data() {
    let xml = "<?pi some data??><r/>";
    let tokens = scan(xml);
    assert_eq!(
        &tokens[..2],
        [
            Token::PiStart { target: 2..4 },
            Token::PiContent {
                content: 5..15,
                last: true,
            },
        ]
    );
    // the first of the two question marks belongs to the data
    assert_eq!(&xml[5..15], "some data?");
}

#[test]
fn processing_instruction_inside_element() {
    assert_eq!(
        scan("<r><?go now?></r>"),
        [
            Token::ElementStart { name: 1..2 },
            Token::PiStart { target: 5..7 },
            Token::PiContent {
                content: 8..11,
                last: true,
            },
            Token::ElementEnd { name: 15..16 },
        ]
    );
}

#[test]
fn pi_target_starting_with_x_is_ordinary() {
    let xml = "<?xslt run?><r/>";
    let tokens = scan(xml);
    assert_eq!(tokens[0], Token::PiStart { target: 2..6 });
    assert_eq!(&xml[2..6], "xslt");
}

#[test]
fn comment_with_inner_dashes() {
    let xml = "<!--a-b--><r/>";
    assert_eq!(
        scan(xml),
        [
            Token::CommentStart,
            Token::CommentContent {
                content: 4..7,
                last: true,
            },
            Token::ElementStart { name: 11..12 },
            Token::ElementEndEmpty,
        ]
    );
    assert_eq!(&xml[4..7], "a-b");
}

#[test]
fn comment_with_trailing_dash() {
    let xml = "<r><!--x---></r>";
    let tokens = scan(xml);
    assert_eq!(
        tokens[1..3],
        [
            Token::CommentStart,
            Token::CommentContent {
                content: 7..9,
                last: true,
            },
        ]
    );
    assert_eq!(&xml[7..9], "x-");
}

#[test]
fn empty_comment() {
    assert_eq!(
        scan("<!----><r/>"),
        [
            Token::CommentStart,
            Token::CommentContent {
                content: 4..4,
                last: true,
            },
            Token::ElementStart { name: 8..9 },
            Token::ElementEndEmpty,
        ]
    );
}

#[test]
fn cdata_with_brackets() {
    let xml = "<r><![CDATA[a]]b]]></r>";
    let tokens = scan(xml);
    assert_eq!(tokens[1], text(12..16));
    assert_eq!(&xml[12..16], "a]]b");
}

#[test]
fn cdata_with_bracket_run() {
    // three brackets before the closing `>`: the first stays content
    let xml = "<r><![CDATA[a]]]></r>";
    let tokens = scan(xml);
    assert_eq!(tokens[1], text(12..14));
    assert_eq!(&xml[12..14], "a]");
}

#[test]
fn empty_cdata_produces_no_content() {
    assert_eq!(
        scan("<r><![CDATA[]]></r>"),
        [
            Token::ElementStart { name: 1..2 },
            Token::ElementEnd { name: 17..18 },
        ]
    );
}

#[test]
fn cdata_end_in_text_is_rejected() {
    let (error, position) = scan_err("<r>]]></r>");
    assert_eq!(error, ScanError::Syntax);
    assert_eq!(position, 5);
    // a lone bracket pair without `>` is fine
    let xml = "<r>a]]a</r>";
    assert_eq!(scan(xml)[1], text(3..7));
}

#[test]
fn only_one_root_element() {
    let (error, position) = scan_err("<a/><b/>");
    assert_eq!(error, ScanError::Syntax);
    assert_eq!(position, 5);
}

#[test]
fn text_outside_root_is_rejected() {
    assert_eq!(scan_err("<a/>x").0, ScanError::Syntax);
    assert_eq!(scan_err("x<a/>").0, ScanError::Syntax);
}

#[test]
fn misc_after_root_is_allowed() {
    let tokens = scan("<a/> <!--done--> <?fin?> ");
    assert_eq!(
        tokens,
        [
            Token::ElementStart { name: 1..2 },
            Token::ElementEndEmpty,
            Token::CommentStart,
            Token::CommentContent {
                content: 9..13,
                last: true,
            },
            Token::PiStart { target: 19..22 },
            Token::PiContent {
                content: 22..22,
                last: true,
            },
        ]
    );
}

#[test]
fn attribute_value_rejects_raw_lt() {
    let (error, position) = scan_err("<a b=\"<\">");
    assert_eq!(error, ScanError::Syntax);
    assert_eq!(position, 6);
}

#[test]
fn attribute_value_must_be_quoted() {
    let (error, position) = scan_err("<a b=c>");
    assert_eq!(error, ScanError::Syntax);
    assert_eq!(position, 5);
}

#[test]
fn attribute_with_spaced_equals() {
    let xml = "<a b = 'c'/>";
    assert_eq!(
        scan(xml),
        [
            Token::ElementStart { name: 1..2 },
            Token::AttributeStart { name: 3..4 },
            Token::AttributeContent {
                content: Content::Text(8..9),
                last: true,
            },
            Token::ElementEndEmpty,
        ]
    );
}

#[test]
fn empty_attribute_value_is_final() {
    assert_eq!(
        scan("<a b=\"\"/>"),
        [
            Token::ElementStart { name: 1..2 },
            Token::AttributeStart { name: 3..4 },
            Token::AttributeContent {
                content: Content::Text(6..6),
                last: true,
            },
            Token::ElementEndEmpty,
        ]
    );
}

#[test]
fn end_input_requires_closed_root() {
    let mut scanner = Scanner::new();
    assert_eq!(scanner.end_input(), Err(ScanError::UnexpectedEndOfInput));

    for c in "<a>".chars() {
        scanner.next(c, 1).expect("valid prefix");
    }
    assert_eq!(scanner.end_input(), Err(ScanError::UnexpectedEndOfInput));

    for c in "</a>".chars() {
        scanner.next(c, 1).expect("valid document");
    }
    assert_eq!(scanner.end_input(), Ok(()));
}

#[test]
fn multibyte_lengths_advance_position() {
    // positions are byte offsets because we feed len_utf8
    let xml = "<héllo>déjà</héllo>";
    let tokens = scan(xml);
    let name = match &tokens[0] {
        Token::ElementStart { name } => name.clone(),
        token => panic!("unexpected {:?}", token),
    };
    assert_eq!(&xml[name], "héllo");
    let content = match &tokens[1] {
        Token::ElementContent {
            content: Content::Text(range),
        } => range.clone(),
        token => panic!("unexpected {:?}", token),
    };
    assert_eq!(&xml[content], "déjà");
}

#[test]
fn depth_tracks_open_elements() {
    let mut scanner = Scanner::new();
    let mut starts = 0usize;
    let mut ends = 0usize;
    for c in "<a><b/><c>x</c></a>".chars() {
        match scanner.next(c, 1).expect("valid document") {
            Some(Token::ElementStart { .. }) => starts += 1,
            Some(Token::ElementEnd { .. }) | Some(Token::ElementEndEmpty) => ends += 1,
            _ => {}
        }
        assert_eq!(scanner.depth(), starts - ends);
    }
    assert_eq!(starts, 3);
    assert_eq!(ends, 3);
}
