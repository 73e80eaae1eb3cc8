//! Command templates with `#{name}` placeholders.
//!
//! `##` is an escaped `#`. A template is parsed once when the configuration is
//! loaded, so syntax errors surface before any process is spawned.

use std::{borrow::Borrow, collections::HashMap, fmt, hash::Hash, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Undefined variable '{0}' at {1}")]
    UndefinedVar(String, usize),

    #[error("Unclosed brace (found open brace at {})", .0+1)]
    UnclosedBrace(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Var { name: String, pos: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(fmt: &str) -> Result<Self, TemplateError> {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum State {
            Normal,
            HashMark,
            InsideBrace,
        }
        use State::*;

        let mut state = Normal;
        let mut pos_open_brace = 0;
        let mut segments = Vec::new();
        let mut text = String::with_capacity(fmt.len());
        let mut var_name = String::with_capacity(32);

        for (i, c) in fmt.chars().enumerate() {
            match (c, state) {
                ('#', Normal) => {
                    state = HashMark;
                    text.push(c);
                }
                ('#', HashMark) => {
                    state = Normal;
                }
                ('{', HashMark) => {
                    state = InsideBrace;
                    pos_open_brace = i;
                    var_name.clear();
                    text.pop(); // remove '#'
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                }
                ('}', InsideBrace) => {
                    state = Normal;
                    segments.push(Segment::Var {
                        name: var_name.clone(),
                        pos: pos_open_brace,
                    });
                }
                (_, InsideBrace) => {
                    var_name.push(c);
                }
                _ => {
                    state = Normal;
                    text.push(c);
                }
            }
        }

        if state == InsideBrace {
            return Err(TemplateError::UnclosedBrace(pos_open_brace));
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Ok(Self {
            source: fmt.to_owned(),
            segments,
        })
    }

    pub fn render<K, V>(&self, variables: &HashMap<K, V>) -> Result<String, TemplateError>
    where
        K: Borrow<str> + Hash + Eq,
        V: AsRef<str>,
    {
        let mut res = String::with_capacity(self.source.len() * 2);
        for seg in &self.segments {
            match seg {
                Segment::Text(s) => res += s,
                Segment::Var { name, pos } => {
                    let Some(value) = variables.get(name.as_str()) else {
                        return Err(TemplateError::UndefinedVar(name.clone(), pos + 1));
                    };
                    res += value.as_ref();
                }
            }
        }
        Ok(res)
    }

    /// Names of all placeholders, in order of appearance.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match seg {
            Segment::Var { name, .. } => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Fails with the first placeholder not contained in `allowed`.
    pub fn check_variables(&self, allowed: &[&str]) -> Result<(), TemplateError> {
        for seg in &self.segments {
            if let Segment::Var { name, pos } = seg {
                if !allowed.contains(&name.as_str()) {
                    return Err(TemplateError::UndefinedVar(name.clone(), pos + 1));
                }
            }
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.source)
    }
}
