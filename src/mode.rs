//! Open-mode grammar for the device stream.
//!
//! The stream is opened with a C-style `fopen` mode token: a base of `r`,
//! `w`, or `a`, an optional `+` for read-and-write, and an optional trailing
//! `b` for binary. Anything else is rejected before the device is touched.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::OpenOptions;

static MODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[raw]\+?b?$").expect("mode grammar regex is valid")
});

/// Base access of an open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeBase {
    Read,
    Write,
    Append,
}

/// A validated `fopen`-style open mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMode {
    token: String,
    base: ModeBase,
    update: bool,
    binary: bool,
}

impl OpenMode {
    /// Parse a mode token, returning `None` if it does not match the
    /// `[raw]+?b?` grammar.
    pub fn parse(token: &str) -> Option<Self> {
        if !MODE_RE.is_match(token) {
            return None;
        }
        let base = match token.as_bytes().first() {
            Some(b'r') => ModeBase::Read,
            Some(b'w') => ModeBase::Write,
            Some(b'a') => ModeBase::Append,
            _ => return None,
        };
        Some(Self {
            token: token.to_string(),
            base,
            update: token.contains('+'),
            binary: token.ends_with('b'),
        })
    }

    /// The original mode token.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn base(&self) -> ModeBase {
        self.base
    }

    /// Whether the `+` (read-and-write) flag is present.
    pub fn update(&self) -> bool {
        self.update
    }

    /// Whether the `b` suffix is present. Binary mode has no effect on the
    /// streams this crate opens; the flag is retained for grammar fidelity.
    pub fn binary(&self) -> bool {
        self.binary
    }

    /// Translate the mode into `OpenOptions` for the device node.
    ///
    /// Device nodes are never truncated or created; `w` and `a` reduce to
    /// plain write access against an existing node.
    pub fn open_options(&self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        match (self.base, self.update) {
            (ModeBase::Read, false) => {
                opts.read(true);
            }
            (ModeBase::Read, true) => {
                opts.read(true).write(true);
            }
            (ModeBase::Write, false) => {
                opts.write(true);
            }
            (ModeBase::Write, true) => {
                opts.read(true).write(true);
            }
            (ModeBase::Append, false) => {
                opts.append(true);
            }
            (ModeBase::Append, true) => {
                opts.read(true).append(true);
            }
        }
        opts
    }
}

impl std::fmt::Display for OpenMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_grammar() {
        for token in ["r", "w", "a", "r+", "w+", "a+", "rb", "wb", "ab", "r+b", "w+b", "a+b"] {
            let mode = OpenMode::parse(token);
            assert!(mode.is_some(), "token {:?} should parse", token);
            assert_eq!(mode.unwrap().token(), token);
        }
    }

    #[test]
    fn test_rejects_invalid_tokens() {
        for token in ["", "x", "rw", "br", "r++", "rbb", "b", "+", "r+bb", "R", "r "] {
            assert!(OpenMode::parse(token).is_none(), "token {:?} should fail", token);
        }
    }

    #[test]
    fn test_flags() {
        let mode = OpenMode::parse("r+b").unwrap();
        assert_eq!(mode.base(), ModeBase::Read);
        assert!(mode.update());
        assert!(mode.binary());

        let mode = OpenMode::parse("a").unwrap();
        assert_eq!(mode.base(), ModeBase::Append);
        assert!(!mode.update());
        assert!(!mode.binary());
    }

    #[test]
    fn test_display_round_trip() {
        let mode = OpenMode::parse("w+").unwrap();
        assert_eq!(mode.to_string(), "w+");
    }
}
