//! Path grammar for addressing tree nodes and their members.
//!
//! ```text
//! [marker] segment ('/' segment)* ('.' member)*
//! marker  := '*' (Always) | '!' (Never)
//! segment := ''  (root) | '.' (current) | '..' (parent) | name
//! ```
//!
//! The member chain only applies to the last segment: `/A/B.Color.Name`
//! navigates to `/A/B` and reads `Color`, then `Name`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::obtain::ObtainMode;

static MEMBER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid member regex"));

/// One navigation step of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Root,
    Current,
    Parent,
    Child(&'a str),
}

impl<'a> Segment<'a> {
    pub fn parse(part: &'a str) -> Self {
        match part {
            "" => Segment::Root,
            "." => Segment::Current,
            ".." => Segment::Parent,
            name => Segment::Child(name),
        }
    }
}

/// Tokenize one path string on `/`. Blank input yields no steps.
pub fn segments(path: &str) -> impl Iterator<Item = Segment<'_>> {
    let blank = path.trim().is_empty();
    path.split('/')
        .filter(move |_| !blank)
        .map(Segment::parse)
}

/// Strip a leading freshness marker from path text.
pub fn prepare_path_text(text: &str) -> (&str, ObtainMode) {
    let trimmed = text.trim_start();
    match trimmed.chars().next().and_then(ObtainMode::from_marker) {
        Some(mode) => (trimmed[1..].trim_start(), mode),
        None => (trimmed, ObtainMode::Auto),
    }
}

/// Parsed path text: navigation path, freshness directive and member chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    path: String,
    members: Vec<String>,
    mode: ObtainMode,
}

impl PathExpression {
    /// Parse path text. Blank text is a caller error.
    pub fn parse(text: &str) -> DomainResult<Self> {
        let (rest, mode) = prepare_path_text(text);
        let rest = rest.trim_end();
        if rest.is_empty() {
            return Err(DomainError::InvalidPath(text.to_string()));
        }

        let (head, tail) = match rest.rfind('/') {
            Some(i) => rest.split_at(i + 1),
            None => ("", rest),
        };

        let (node, member_text) = match tail {
            "" | "." | ".." => (tail, None),
            t if t.starts_with('.') => (".", Some(&t[1..])),
            t => match t.find('.') {
                Some(i) => (&t[..i], Some(&t[i + 1..])),
                None => (t, None),
            },
        };

        let members = match member_text {
            Some(chain) => chain
                .split('.')
                .map(|m| {
                    if MEMBER_NAME.is_match(m) {
                        Ok(m.to_string())
                    } else {
                        Err(DomainError::InvalidPath(text.to_string()))
                    }
                })
                .collect::<DomainResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            path: format!("{head}{node}"),
            members,
            mode,
        })
    }

    /// Navigation part, without marker and member chain.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment<'_>> {
        segments(&self.path)
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn mode(&self) -> ObtainMode {
        self.mode
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(marker) = self.mode.marker() {
            write!(f, "{marker}")?;
        }
        write!(f, "{}", self.path)?;
        for member in &self.members {
            write!(f, ".{member}")?;
        }
        Ok(())
    }
}
