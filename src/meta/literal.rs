//! Restricted literal grammar for header values.
//!
//! Header assignments carry numbers, booleans, quoted strings and
//! (possibly nested) sequences. This parser accepts exactly those and
//! nothing that would need evaluation:
//!
//! ```text
//! value    := sequence | string | scalar
//! sequence := '[' items? ']' | '(' items? ')'
//! items    := value (',' value)* ','?
//! string   := '\'' chars '\'' | '"' chars '"'      (backslash escapes)
//! scalar   := integer | float | True | False | true | false | None | null
//! ```
//!
//! A parenthesized single item without a trailing comma is the item itself,
//! as in `(5)`.

use std::fmt;

use serde::Serialize;

/// A typed header value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Not recorded in the file, or recorded as `None`/`null`
    Unset,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Seq(Vec<ParamValue>),
}

impl ParamValue {
    pub fn is_unset(&self) -> bool {
        matches!(self, ParamValue::Unset)
    }

    /// Numeric view of an Int or Float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Unset => "unset",
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "string",
            ParamValue::Seq(_) => "sequence",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Unset => f.write_str("None"),
            ParamValue::Bool(true) => f.write_str("True"),
            ParamValue::Bool(false) => f.write_str("False"),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{:?}", v),
            ParamValue::Text(s) => write!(f, "{:?}", s),
            ParamValue::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Parse one literal. The whole input must be consumed.
pub fn parse_literal(input: &str) -> Result<ParamValue, String> {
    let mut parser = LiteralParser {
        chars: input.chars().collect(),
        pos: 0,
    };
    let value = parser.value()?;
    parser.skip_whitespace();
    if let Some(c) = parser.peek() {
        return Err(format!(
            "unexpected {:?} at position {} after literal",
            c, parser.pos
        ));
    }
    Ok(value)
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn value(&mut self) -> Result<ParamValue, String> {
        self.skip_whitespace();
        match self.peek() {
            None => Err("empty literal".to_string()),
            Some('[') => self.sequence(']'),
            Some('(') => self.sequence(')'),
            Some(quote @ ('\'' | '"')) => self.string(quote),
            Some(_) => self.scalar(),
        }
    }

    fn sequence(&mut self, close: char) -> Result<ParamValue, String> {
        self.pos += 1;
        let mut items = Vec::new();
        let mut saw_comma = false;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(format!("unterminated sequence, expected {:?}", close)),
                Some(c) if c == close => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {}
            }

            items.push(self.value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    saw_comma = true;
                }
                Some(c) if c == close => {}
                Some(c) => return Err(format!("unexpected {:?} in sequence", c)),
                None => return Err(format!("unterminated sequence, expected {:?}", close)),
            }
        }

        if close == ')' && items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(ParamValue::Seq(items))
    }

    fn string(&mut self, quote: char) -> Result<ParamValue, String> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err("unterminated string".to_string()),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(ParamValue::Text(out));
                }
                Some('\\') => {
                    self.pos += 1;
                    let escaped = self.peek().ok_or("unterminated escape")?;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                    self.pos += 1;
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn scalar(&mut self) -> Result<ParamValue, String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !matches!(c, ',' | ']' | ')' | '[' | '(') && !c.is_whitespace())
        {
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().collect();

        match token.as_str() {
            "" => Err(format!("unexpected {:?}", self.peek().unwrap_or(' '))),
            "True" | "true" => Ok(ParamValue::Bool(true)),
            "False" | "false" => Ok(ParamValue::Bool(false)),
            "None" | "null" => Ok(ParamValue::Unset),
            _ => parse_number(&token),
        }
    }
}

fn parse_number(token: &str) -> Result<ParamValue, String> {
    if let Ok(v) = token.parse::<i64>() {
        return Ok(ParamValue::Int(v));
    }
    let looks_numeric = token
        .trim_start_matches(['+', '-'])
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.');
    let named = matches!(
        token.trim_start_matches(['+', '-']),
        "inf" | "Inf" | "nan" | "NaN"
    );
    if looks_numeric || named {
        if let Ok(v) = token.parse::<f64>() {
            return Ok(ParamValue::Float(v));
        }
    }
    Err(format!("{:?} is not a literal", token))
}
