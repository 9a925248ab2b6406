//! Placeholder tokenizer
//!
//! Scans template text for `{{...}}` markers and yields typed tokens:
//!
//! - `{{NAME}}` → [`PlaceholderKind::StaticRef`]
//! - `{{IA:NAME}}` → [`PlaceholderKind::AiDirective`]
//! - `{{IMG:NAME}}` → [`PlaceholderKind::ImageDirective`] (recognized, never resolved)
//!
//! Names may contain anything except `}`. Matching is leftmost-first and
//! non-overlapping, so `{{{A}}` yields the static name `{A`.

use std::iter::FusedIterator;
use std::ops::Range;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const AI_PREFIX: &str = "IA:";
const IMAGE_PREFIX: &str = "IMG:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    StaticRef,
    AiDirective,
    ImageDirective,
}

/// One marker found in a text node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub kind: PlaceholderKind,
    /// Field name without braces or kind prefix
    pub name: &'a str,
    /// The full marker, braces included
    pub raw: &'a str,
    /// Byte range of `raw` inside the scanned text
    pub span: Range<usize>,
}

/// Lazy scan over the placeholders of `text`
pub fn scan(text: &str) -> Placeholders<'_> {
    Placeholders { text, pos: 0 }
}

/// Iterator returned by [`scan`]
pub struct Placeholders<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.text.len() {
            let start = self.pos + self.text[self.pos..].find(OPEN)?;
            let body_start = start + OPEN.len();
            let body = &self.text[body_start..];

            let Some(close) = body.find('}') else {
                self.pos = self.text.len();
                return None;
            };

            if close == 0 || !body[close..].starts_with(CLOSE) {
                // '{' is one byte, so start + 1 stays on a char boundary
                self.pos = start + 1;
                continue;
            }

            let end = body_start + close + CLOSE.len();
            self.pos = end;

            let inner = &body[..close];
            let (kind, name) = if let Some(rest) = inner.strip_prefix(AI_PREFIX) {
                (PlaceholderKind::AiDirective, rest)
            } else if let Some(rest) = inner.strip_prefix(IMAGE_PREFIX) {
                (PlaceholderKind::ImageDirective, rest)
            } else {
                (PlaceholderKind::StaticRef, inner)
            };

            // "{{IA:}}" and "{{IMG:}}" name nothing
            if name.is_empty() {
                continue;
            }

            return Some(Placeholder {
                kind,
                name,
                raw: &self.text[start..end],
                span: start..end,
            });
        }

        None
    }
}

impl FusedIterator for Placeholders<'_> {}

/// Rebuild `text`, replacing each placeholder for which `replace` returns a
/// value. Returns `None` when nothing was replaced.
///
/// Replacement values are inserted as-is and never rescanned in the same
/// pass.
pub fn rewrite<F>(text: &str, mut replace: F) -> Option<String>
where
    F: FnMut(&Placeholder<'_>) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut replaced = false;

    for placeholder in scan(text) {
        if let Some(value) = replace(&placeholder) {
            out.push_str(&text[last..placeholder.span.start]);
            out.push_str(&value);
            last = placeholder.span.end;
            replaced = true;
        }
    }

    if !replaced {
        return None;
    }

    out.push_str(&text[last..]);
    Some(out)
}
