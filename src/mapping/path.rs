//! Field-path mini-language: `ident ('[]')* ('.' ident ('[]')*)*`.
//!
//! Each `[]` is a placeholder consumed, left to right, from the index arguments a
//! mapping is evaluated with. `length` applied to an array yields its length.

use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;

/// One `field[]...` segment of a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathStep {
    pub field: String,
    /// Number of `[]` placeholders following the field name.
    pub array_slots: usize,
}

/// Parsed field path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath {
    source: String,
    steps: Vec<PathStep>,
}

impl FieldPath {
    pub fn parse(source: &str) -> ApertureResult<Self> {
        let steps = Parser::new(source).parse()?;
        Ok(Self {
            source: source.to_owned(),
            steps,
        })
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Total number of index arguments the path consumes.
    pub fn index_count(&self) -> usize {
        self.steps.iter().map(|s| s.array_slots).sum()
    }

    /// Walk `data`, consuming `indices` for each placeholder.
    ///
    /// A missing terminal field or out-of-bounds terminal index is `Undefined`;
    /// dereferencing through a null or missing intermediate is an evaluation error.
    pub fn resolve(&self, data: &serde_json::Value, indices: &[usize]) -> ApertureResult<Value> {
        if indices.len() < self.index_count() {
            return Err(ApertureError::evaluation(format!(
                "field path '{}' expects {} index arguments, got {}",
                self.source,
                self.index_count(),
                indices.len()
            )));
        }

        let mut cur = data;
        let mut next_index = 0usize;
        let last_step = self.steps.len() - 1;

        for (si, step) in self.steps.iter().enumerate() {
            let terminal_field = si == last_step && step.array_slots == 0;

            let found = match cur {
                serde_json::Value::Object(map) => map.get(&step.field),
                serde_json::Value::Array(items) if step.field == "length" => {
                    if terminal_field {
                        return Ok(Value::Number(items.len() as f64));
                    }
                    return Err(self.dead_end(&step.field));
                }
                serde_json::Value::Null => return Err(self.dead_end(&step.field)),
                _ => None,
            };
            let Some(mut v) = found else {
                if terminal_field {
                    return Ok(Value::Undefined);
                }
                return Err(self.dead_end(&step.field));
            };

            for slot in 0..step.array_slots {
                let idx = indices[next_index];
                next_index += 1;
                let terminal_slot = si == last_step && slot + 1 == step.array_slots;

                let item = match v {
                    serde_json::Value::Array(items) => items.get(idx),
                    serde_json::Value::Object(map) => map.get(&idx.to_string()),
                    serde_json::Value::Null => return Err(self.dead_end(&step.field)),
                    _ => None,
                };
                match item {
                    Some(x) => v = x,
                    None if terminal_slot => return Ok(Value::Undefined),
                    None => return Err(self.dead_end(&format!("{}[{idx}]", step.field))),
                }
            }

            cur = v;
        }

        Ok(Value::from_json(cur))
    }

    fn dead_end(&self, at: &str) -> ApertureError {
        ApertureError::evaluation(format!(
            "field path '{}' dereferences a null or undefined value at '{at}'",
            self.source
        ))
    }
}

impl FromStr for FieldPath {
    type Err = ApertureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn parse(mut self) -> ApertureResult<Vec<PathStep>> {
        let mut steps = Vec::new();
        loop {
            let field = self.ident()?;
            let mut array_slots = 0usize;
            while self.eat('[') {
                if !self.eat(']') {
                    return Err(self.error("expected ']'"));
                }
                array_slots += 1;
            }
            steps.push(PathStep { field, array_slots });

            match self.chars.next() {
                None => return Ok(steps),
                Some((_, '.')) => continue,
                Some((pos, c)) => {
                    return Err(self.error_at(pos, &format!("unexpected '{c}'")));
                }
            }
        }
    }

    fn ident(&mut self) -> ApertureResult<String> {
        let mut out = String::new();
        let starts_ident = matches!(
            self.chars.peek(),
            Some(&(_, c)) if c.is_ascii_alphabetic() || c == '_' || c == '$'
        );
        if !starts_ident {
            return Err(self.error("expected identifier"));
        }
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        Ok(out)
    }

    fn eat(&mut self, want: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == want) {
            self.chars.next();
            return true;
        }
        false
    }

    fn error(&mut self, msg: &str) -> ApertureError {
        let pos = self
            .chars
            .peek()
            .map_or(self.source.len(), |&(pos, _)| pos);
        self.error_at(pos, msg)
    }

    fn error_at(&self, pos: usize, msg: &str) -> ApertureError {
        ApertureError::configuration(format!(
            "invalid field path '{}': {msg} at {pos}",
            self.source
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mapping/path.rs"]
mod tests;
