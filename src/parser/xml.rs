// Mon Oct 19 2026 - Alex

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlErrorKind {
    UnexpectedEof,
    NoRootElement,
    InvalidName,
    InvalidToken(char),
    MismatchedTag { expected: String, found: String },
    DuplicateAttribute(String),
    InvalidEntity(String),
    JunkAfterRoot,
}

impl fmt::Display for XmlErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlErrorKind::UnexpectedEof => write!(f, "unclosed token"),
            XmlErrorKind::NoRootElement => write!(f, "no element found"),
            XmlErrorKind::InvalidName => write!(f, "not well-formed (invalid name)"),
            XmlErrorKind::InvalidToken(c) => write!(f, "not well-formed (invalid token {:?})", c),
            XmlErrorKind::MismatchedTag { expected, found } => {
                write!(f, "mismatched tag: expected </{}>, found </{}>", expected, found)
            }
            XmlErrorKind::DuplicateAttribute(name) => write!(f, "duplicate attribute {}", name),
            XmlErrorKind::InvalidEntity(name) => write!(f, "undefined entity &{};", name),
            XmlErrorKind::JunkAfterRoot => write!(f, "junk after document element"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: line {line}, column {column}")]
pub struct XmlError {
    pub kind: XmlErrorKind,
    /// 1-based.
    pub line: usize,
    /// 1-based.
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Text nodes directly under this element, concatenated.
    pub fn direct_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// All descendant elements called `name`, in document order. Does not include `self`.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.name == name {
                found.push(child);
            }
            child.collect_named(name, found);
        }
    }

    pub fn first_descendant(&self, name: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.first_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Direct text of every descendant called `name`, joined. Empty if there is none.
    pub fn text_of(&self, name: &str) -> String {
        self.descendants_named(name)
            .into_iter()
            .map(|e| e.direct_text())
            .collect()
    }
}

pub fn parse_document(source: &str) -> Result<Element, XmlError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut reader = XmlReader::new(source);

    reader.skip_misc()?;
    if reader.is_at_end() {
        return Err(reader.error(XmlErrorKind::NoRootElement));
    }
    if reader.starts_with("<!DOCTYPE") {
        reader.skip_doctype()?;
        reader.skip_misc()?;
    }
    if !reader.starts_with("<") {
        return Err(reader.error_here());
    }

    let root = reader.parse_element()?;

    reader.skip_misc()?;
    if !reader.is_at_end() {
        return Err(reader.error(XmlErrorKind::JunkAfterRoot));
    }

    Ok(root)
}

struct XmlReader<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> XmlReader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn advance(&mut self, bytes: usize) {
        let consumed = &self.input[self.pos..self.pos + bytes];
        for c in consumed.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += bytes;
    }

    fn advance_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.advance(c.len_utf8());
        Some(c)
    }

    fn error(&self, kind: XmlErrorKind) -> XmlError {
        XmlError {
            kind,
            line: self.line,
            column: self.column,
        }
    }

    fn error_here(&self) -> XmlError {
        match self.peek() {
            Some(c) => self.error(XmlErrorKind::InvalidToken(c)),
            None => self.error(XmlErrorKind::UnexpectedEof),
        }
    }

    fn expect(&mut self, s: &str) -> Result<(), XmlError> {
        if self.starts_with(s) {
            self.advance(s.len());
            Ok(())
        } else {
            Err(self.error_here())
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.advance(1);
            } else {
                break;
            }
        }
    }

    fn skip_until(&mut self, terminator: &str) -> Result<&'a str, XmlError> {
        match self.rest().find(terminator) {
            Some(offset) => {
                let skipped = &self.rest()[..offset];
                self.advance(offset + terminator.len());
                Ok(skipped)
            }
            None => {
                self.advance(self.input.len() - self.pos);
                Err(self.error(XmlErrorKind::UnexpectedEof))
            }
        }
    }

    /// Whitespace, comments and processing instructions outside the root element.
    fn skip_misc(&mut self) -> Result<(), XmlError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<?") {
                self.skip_until("?>")?;
            } else if self.starts_with("<!--") {
                self.advance(4);
                self.skip_until("-->")?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_doctype(&mut self) -> Result<(), XmlError> {
        let mut depth = 0usize;
        while let Some(c) = self.advance_char() {
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.error(XmlErrorKind::UnexpectedEof))
    }

    fn parse_name(&mut self) -> Result<String, XmlError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
            Some(_) => return Err(self.error(XmlErrorKind::InvalidName)),
            None => return Err(self.error(XmlErrorKind::UnexpectedEof)),
        }

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.') {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }

        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_element(&mut self) -> Result<Element, XmlError> {
        self.expect("<")?;
        let mut element = Element::new(&self.parse_name()?);

        loop {
            let had_space = self.peek().map_or(false, |c| c.is_ascii_whitespace());
            self.skip_whitespace();

            if self.starts_with("/>") {
                self.advance(2);
                return Ok(element);
            }
            if self.starts_with(">") {
                self.advance(1);
                break;
            }
            if self.is_at_end() {
                return Err(self.error(XmlErrorKind::UnexpectedEof));
            }
            if !had_space {
                return Err(self.error_here());
            }

            let (name, value) = self.parse_attribute()?;
            if element.attribute(&name).is_some() {
                return Err(self.error(XmlErrorKind::DuplicateAttribute(name)));
            }
            element.attributes.push((name, value));
        }

        self.parse_content(&mut element)?;
        Ok(element)
    }

    fn parse_attribute(&mut self) -> Result<(String, String), XmlError> {
        let name = self.parse_name()?;
        self.skip_whitespace();
        self.expect("=")?;
        self.skip_whitespace();

        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error_here()),
        };
        self.advance(1);

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error(XmlErrorKind::UnexpectedEof)),
                Some(c) if c == quote => {
                    self.advance(1);
                    break;
                }
                Some('<') => return Err(self.error_here()),
                Some('&') => value.push(self.parse_reference()?),
                Some(c) => {
                    self.advance(c.len_utf8());
                    value.push(c);
                }
            }
        }

        Ok((name, value))
    }

    fn parse_content(&mut self, element: &mut Element) -> Result<(), XmlError> {
        loop {
            if self.is_at_end() {
                return Err(self.error(XmlErrorKind::UnexpectedEof));
            }

            if self.starts_with("</") {
                let (line, column) = (self.line, self.column);
                self.advance(2);
                let name = self.parse_name()?;
                self.skip_whitespace();
                self.expect(">")?;
                if name != element.name {
                    return Err(XmlError {
                        kind: XmlErrorKind::MismatchedTag {
                            expected: element.name.clone(),
                            found: name,
                        },
                        line,
                        column,
                    });
                }
                return Ok(());
            } else if self.starts_with("<!--") {
                self.advance(4);
                self.skip_until("-->")?;
            } else if self.starts_with("<![CDATA[") {
                self.advance(9);
                let data = self.skip_until("]]>")?;
                push_text(element, data);
            } else if self.starts_with("<?") {
                self.skip_until("?>")?;
            } else if self.starts_with("<") {
                let child = self.parse_element()?;
                element.children.push(Node::Element(child));
            } else {
                let text = self.parse_text()?;
                push_text(element, &text);
            }
        }
    }

    fn parse_text(&mut self) -> Result<String, XmlError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            match c {
                '<' => break,
                '&' => text.push(self.parse_reference()?),
                _ => {
                    self.advance(c.len_utf8());
                    text.push(c);
                }
            }
        }
        Ok(text)
    }

    fn parse_reference(&mut self) -> Result<char, XmlError> {
        let (line, column) = (self.line, self.column);
        self.expect("&")?;

        let body = match self.rest().find(';') {
            Some(end) if end <= 10 => &self.rest()[..end],
            _ => {
                return Err(XmlError {
                    kind: XmlErrorKind::InvalidEntity(String::new()),
                    line,
                    column,
                })
            }
        };

        let decoded = match body {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => {
                let code = if let Some(hex) = body.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = body.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
            }
        };

        match decoded {
            Some(c) => {
                self.advance(body.len() + 1);
                Ok(c)
            }
            None => Err(XmlError {
                kind: XmlErrorKind::InvalidEntity(body.to_string()),
                line,
                column,
            }),
        }
    }
}

fn push_text(element: &mut Element, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(last)) = element.children.last_mut() {
        last.push_str(text);
    } else {
        element.children.push(Node::Text(text.to_string()));
    }
}
