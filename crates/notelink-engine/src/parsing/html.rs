//! Forgiving parser for the HTML subset documents are stored in.
//!
//! Never fails: a `<` that does not open a well-formed tag is text,
//! unmatched closing tags are ignored and unclosed elements are closed at
//! the end of input. Entities are decoded in text and attribute values.

use std::borrow::Cow;

use super::cursor::Cursor;

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta", "wbr"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    Text(String),
    Element(HtmlElement),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HtmlElement {
    /// Lower-cased tag name.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<HtmlNode>,
}

impl HtmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push_str(text),
            HtmlNode::Element(element) => collect_text(&element.children, out),
        }
    }
}

/// Parses a fragment into a node list.
pub fn parse_fragment(input: &str) -> Vec<HtmlNode> {
    let mut cur = Cursor::new(input);
    // stack[0] collects top-level nodes
    let mut stack: Vec<HtmlElement> = vec![HtmlElement::default()];

    while !cur.eof() {
        if cur.eat(b"<!--") {
            cur.skip_past(b"-->");
            continue;
        }
        if cur.starts_with(b"</") {
            if let Some(name) = try_parse_close_tag(&mut cur) {
                close_element(&mut stack, &name);
                continue;
            }
        } else if cur.peek() == Some(b'<') {
            if let Some((element, self_closing)) = try_parse_open_tag(&mut cur) {
                if self_closing || VOID_ELEMENTS.contains(&element.name.as_str()) {
                    push_node(&mut stack, HtmlNode::Element(element));
                } else {
                    stack.push(element);
                }
                continue;
            }
        }

        // Plain text up to the next `<`; a `<` that failed to parse as a tag
        // is kept as text.
        let start = cur.offset();
        cur.bump_char();
        cur.take_until(b"<");
        push_text(&mut stack, decode(&input[start..cur.offset()]));
    }

    while stack.len() > 1 {
        if let Some(element) = stack.pop() {
            push_node(&mut stack, HtmlNode::Element(element));
        }
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

/// Attempts to parse `</name>`. On failure, cursor position is restored.
fn try_parse_close_tag(cur: &mut Cursor<'_>) -> Option<String> {
    let saved = cur.clone();
    cur.eat(b"</");
    let name = cur.take_while(is_name_byte);
    cur.skip_whitespace();
    if name.is_empty() || cur.peek() != Some(b'>') {
        *cur = saved;
        return None;
    }
    cur.bump();
    Some(name.to_ascii_lowercase())
}

/// Attempts to parse `<name attr="value" ...>` or `<name ... />`.
/// On failure, cursor position is restored.
fn try_parse_open_tag(cur: &mut Cursor<'_>) -> Option<(HtmlElement, bool)> {
    let saved = cur.clone();
    cur.bump(); // <
    if !cur.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
        *cur = saved;
        return None;
    }
    let mut element = HtmlElement::new(cur.take_while(is_name_byte).to_ascii_lowercase());

    loop {
        cur.skip_whitespace();
        match cur.peek() {
            None => {
                *cur = saved;
                return None;
            }
            Some(b'>') => {
                cur.bump();
                return Some((element, false));
            }
            Some(b'/') if cur.eat(b"/>") => return Some((element, true)),
            Some(_) => {
                let Some(attribute) = try_parse_attribute(cur) else {
                    *cur = saved;
                    return None;
                };
                element.attributes.push(attribute);
            }
        }
    }
}

fn try_parse_attribute(cur: &mut Cursor<'_>) -> Option<(String, String)> {
    let name = cur.take_while(|b| !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'"' | b'\''));
    if name.is_empty() {
        return None;
    }
    let name = name.to_ascii_lowercase();
    cur.skip_whitespace();
    if cur.peek() != Some(b'=') {
        return Some((name, String::new()));
    }
    cur.bump();
    cur.skip_whitespace();

    let raw = match cur.peek() {
        Some(quote @ (b'"' | b'\'')) => {
            cur.bump();
            let value = cur.take_until(&[quote]);
            cur.bump()?; // closing quote, or None at eof
            value
        }
        Some(_) => cur.take_while(|b| !b.is_ascii_whitespace() && b != b'>'),
        None => return None,
    };
    Some((name, decode(raw).into_owned()))
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn decode(raw: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(raw)
}

fn push_node(stack: &mut [HtmlElement], node: HtmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn push_text(stack: &mut [HtmlElement], text: Cow<'_, str>) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(HtmlNode::Text(previous)) = parent.children.last_mut() {
        previous.push_str(&text);
    } else {
        parent.children.push(HtmlNode::Text(text.into_owned()));
    }
}

/// Pops up to and including the innermost open `name`; ignores stray tags.
fn close_element(stack: &mut Vec<HtmlElement>, name: &str) {
    let Some(depth) = stack.iter().skip(1).rposition(|e| e.name == name) else {
        log::trace!("ignoring unmatched closing tag </{name}>");
        return;
    };
    let target = depth + 1;
    while stack.len() > target {
        if let Some(element) = stack.pop() {
            push_node(stack, HtmlNode::Element(element));
        }
    }
}
