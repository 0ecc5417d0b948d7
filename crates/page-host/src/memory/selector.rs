//! CSS selector subset: compound `tag#id.class[attr op value]` with descendant
//! and child combinators, comma-separated lists.

use soulreplay_core_types::NodeId;

use super::tree::Tree;
use crate::errors::HostError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Includes,
    Prefix,
    Substring,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AttrSel {
    name: String,
    test: Option<(AttrOp, String)>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSel>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One complex selector, stored right-to-left.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Complex {
    subject: Compound,
    ancestors: Vec<(Combinator, Compound)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CssSelector {
    alternatives: Vec<Complex>,
}

impl CssSelector {
    pub fn parse(input: &str) -> Result<Self, HostError> {
        let mut alternatives = Vec::new();
        for part in split_top_level(input) {
            alternatives.push(parse_complex(part.trim(), input)?);
        }
        if alternatives.is_empty() {
            return Err(invalid(input));
        }
        Ok(Self { alternatives })
    }

    pub fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| match_complex(tree, node, &complex.subject, &complex.ancestors))
    }
}

fn invalid(input: &str) -> HostError {
    HostError::InvalidSelector(input.to_string())
}

fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

struct Cursor<'a> {
    chars: Vec<char>,
    pos: usize,
    source: &'a str,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().map(char::is_whitespace).unwrap_or(false) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn ident(&mut self) -> Result<String, HostError> {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' {
                out.push(ch);
                self.pos += 1;
            } else if ch == '\\' {
                self.pos += 1;
                out.push(self.bump().ok_or_else(|| invalid(self.source))?);
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(invalid(self.source));
        }
        Ok(out)
    }

    fn quoted(&mut self, quote: char) -> Result<String, HostError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(invalid(self.source)),
                Some('\\') => out.push(self.bump().ok_or_else(|| invalid(self.source))?),
                Some(ch) if ch == quote => return Ok(out),
                Some(ch) => out.push(ch),
            }
        }
    }
}

fn parse_complex(part: &str, source: &str) -> Result<Complex, HostError> {
    if part.is_empty() {
        return Err(invalid(source));
    }
    let mut cursor = Cursor {
        chars: part.chars().collect(),
        pos: 0,
        source,
    };
    let mut compounds = vec![parse_compound(&mut cursor)?];
    let mut combinators = Vec::new();
    loop {
        let had_ws = cursor.skip_ws();
        match cursor.peek() {
            None => break,
            Some('>') => {
                cursor.pos += 1;
                cursor.skip_ws();
                combinators.push(Combinator::Child);
            }
            Some(_) if had_ws => combinators.push(Combinator::Descendant),
            Some(_) => return Err(invalid(source)),
        }
        compounds.push(parse_compound(&mut cursor)?);
    }

    let subject = compounds.pop().ok_or_else(|| invalid(source))?;
    let mut ancestors = Vec::new();
    while let (Some(combinator), Some(compound)) = (combinators.pop(), compounds.pop()) {
        ancestors.push((combinator, compound));
    }
    Ok(Complex { subject, ancestors })
}

fn parse_compound(cursor: &mut Cursor<'_>) -> Result<Compound, HostError> {
    let mut compound = Compound::default();
    let mut touched = false;
    match cursor.peek() {
        Some('*') => {
            cursor.pos += 1;
            touched = true;
        }
        Some(ch) if ch.is_alphabetic() => {
            compound.tag = Some(cursor.ident()?.to_ascii_lowercase());
            touched = true;
        }
        _ => {}
    }
    loop {
        match cursor.peek() {
            Some('#') => {
                cursor.pos += 1;
                compound.id = Some(cursor.ident()?);
            }
            Some('.') => {
                cursor.pos += 1;
                compound.classes.push(cursor.ident()?);
            }
            Some('[') => {
                cursor.pos += 1;
                compound.attrs.push(parse_attr(cursor)?);
            }
            _ => break,
        }
        touched = true;
    }
    if !touched {
        return Err(invalid(cursor.source));
    }
    Ok(compound)
}

fn parse_attr(cursor: &mut Cursor<'_>) -> Result<AttrSel, HostError> {
    cursor.skip_ws();
    let name = cursor.ident()?.to_ascii_lowercase();
    cursor.skip_ws();
    let op = match cursor.bump() {
        Some(']') => return Ok(AttrSel { name, test: None }),
        Some('=') => AttrOp::Equals,
        Some(prefix @ ('~' | '^' | '*')) => {
            if cursor.bump() != Some('=') {
                return Err(invalid(cursor.source));
            }
            match prefix {
                '~' => AttrOp::Includes,
                '^' => AttrOp::Prefix,
                _ => AttrOp::Substring,
            }
        }
        _ => return Err(invalid(cursor.source)),
    };
    cursor.skip_ws();
    let value = match cursor.peek() {
        Some(q @ ('"' | '\'')) => {
            cursor.pos += 1;
            cursor.quoted(q)?
        }
        _ => cursor.ident()?,
    };
    cursor.skip_ws();
    if cursor.bump() != Some(']') {
        return Err(invalid(cursor.source));
    }
    Ok(AttrSel {
        name,
        test: Some((op, value)),
    })
}

fn match_compound(tree: &Tree, node: NodeId, compound: &Compound) -> bool {
    let Some(data) = tree.element(node) else {
        return false;
    };
    if let Some(tag) = &compound.tag {
        if &data.tag != tag {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if data.attrs.get("id") != Some(id) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let class_attr = data.attrs.get("class").map(String::as_str).unwrap_or("");
        let present: Vec<&str> = class_attr.split_whitespace().collect();
        if !compound.classes.iter().all(|c| present.contains(&c.as_str())) {
            return false;
        }
    }
    compound.attrs.iter().all(|sel| {
        let Some(actual) = data.attrs.get(&sel.name) else {
            return false;
        };
        match &sel.test {
            None => true,
            Some((AttrOp::Equals, expected)) => actual == expected,
            Some((AttrOp::Includes, expected)) => {
                actual.split_whitespace().any(|word| word == expected)
            }
            Some((AttrOp::Prefix, expected)) => {
                !expected.is_empty() && actual.starts_with(expected.as_str())
            }
            Some((AttrOp::Substring, expected)) => {
                !expected.is_empty() && actual.contains(expected.as_str())
            }
        }
    })
}

fn match_complex(
    tree: &Tree,
    node: NodeId,
    subject: &Compound,
    ancestors: &[(Combinator, Compound)],
) -> bool {
    if !match_compound(tree, node, subject) {
        return false;
    }
    let Some(((combinator, next), rest)) = ancestors.split_first() else {
        return true;
    };
    match combinator {
        Combinator::Child => tree
            .element_parent(node)
            .map(|parent| match_complex(tree, parent, next, rest))
            .unwrap_or(false),
        Combinator::Descendant => {
            let mut current = tree.element_parent(node);
            while let Some(ancestor) = current {
                if match_complex(tree, ancestor, next, rest) {
                    return true;
                }
                current = tree.element_parent(ancestor);
            }
            false
        }
    }
}
