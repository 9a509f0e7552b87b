//! Lexer/parser for Bliks source
//!
//! Source text is a sequence of instruction lines separated by newlines,
//! `;`, or `:` (all equivalent). Within a line, tokens are separated by
//! spaces and tabs; `#` starts a comment running to end of line. The token
//! forms:
//!
//! ```text
//! name        starts with a non-reserved character, [A-Za-z0-9_.!&%>=]*
//! "string"    $-escapes: $$ $n $t $q, and $XX for a two-hex-digit byte
//! -12.5e3     numbers: optional sign, digits, fraction, exponent
//! @@tok       retrieval: one register hop per @, around a name or literal
//! <           back retrieval (must stand alone)
//! ```
//!
//! Every token records the 1-based byte offset where it begins. The first
//! error aborts the parse.

use bliks_core::{Error, Token, TokenPayload, Value};
use tracing::debug;

/// One instruction line: a non-empty token sequence.
pub type Line = Vec<Token>;

/// Parse source text into instruction lines.
pub fn parse(source: &str) -> Result<Vec<Line>, Error> {
    let lines = Lexer::new(source).run()?;
    debug!(lines = lines.len(), "parsed source");
    Ok(lines)
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    /// 0-based byte offset; reported positions are `pos + 1`.
    pos: usize,
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r')
}

fn is_separator(b: u8) -> bool {
    matches!(b, b'\n' | b';' | b':')
}

/// Does a byte end the current token?
fn is_break(b: u8) -> bool {
    is_space(b) || is_separator(b) || b == b'#'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'!' | b'&' | b'%' | b'>' | b'=')
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            src: source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn run(&mut self) -> Result<Vec<Line>, Error> {
        let mut lines = Vec::new();
        let mut current = Line::new();
        while let Some(b) = self.peek() {
            if is_space(b) {
                self.pos += 1;
            } else if b == b'#' {
                while !matches!(self.peek(), None | Some(b'\n')) {
                    self.pos += 1;
                }
            } else if is_separator(b) {
                self.pos += 1;
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            } else {
                current.push(self.token()?);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        Ok(lines)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn char_at(&self, i: usize) -> Option<char> {
        self.src.get(i..).and_then(|s| s.chars().next())
    }

    fn token(&mut self) -> Result<Token, Error> {
        match self.bytes[self.pos] {
            b'"' => self.string_literal(),
            b'@' => self.retrieval(),
            b'<' => self.back_retrieval(),
            b'+' | b'-' | b'0'..=b'9' => self.number(),
            _ => self.name(),
        }
    }

    fn string_literal(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return Err(Error::new("unterminated string literal", self.pos + 1));
                }
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'$') => {
                    self.pos += 1;
                    text.push(self.escape()?);
                }
                Some(_) => {
                    // copy one whole character; positions stay on byte
                    // boundaries because only ASCII is special-cased
                    match self.char_at(self.pos) {
                        Some(c) => {
                            text.push(c);
                            self.pos += c.len_utf8();
                        }
                        None => return Err(Error::new("unterminated string literal", self.pos + 1)),
                    }
                }
            }
        }
        if let Some(b) = self.peek()
            && !is_break(b)
        {
            return Err(Error::new(
                "expected a space after the closing quote",
                self.pos + 1,
            ));
        }
        Ok(Token::new(TokenPayload::Literal(Value::Str(text)), start + 1))
    }

    /// One `$` escape, positioned just past the `$`.
    fn escape(&mut self) -> Result<char, Error> {
        let pos = self.pos;
        let Some(c) = self.char_at(pos) else {
            return Err(Error::new("unterminated string literal", pos + 1));
        };
        match c {
            '$' | 'n' | 't' | 'q' => {
                self.pos += 1;
                Ok(match c {
                    '$' => '$',
                    'n' => '\n',
                    't' => '\t',
                    _ => '"',
                })
            }
            c if c.is_ascii_hexdigit() => match self.char_at(pos + 1) {
                Some(c2) if c2.is_ascii_hexdigit() => {
                    self.pos += 2;
                    let hi = c.to_digit(16).unwrap_or(0);
                    let lo = c2.to_digit(16).unwrap_or(0);
                    Ok(char::from((hi * 16 + lo) as u8))
                }
                Some(c2) => Err(Error::new(
                    format!("invalid escape character '{c2}'"),
                    pos + 2,
                )),
                None => Err(Error::new("unterminated string literal", pos + 2)),
            },
            other => Err(Error::new(
                format!("invalid escape character '{other}'"),
                pos + 1,
            )),
        }
    }

    fn retrieval(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        let mut depth: u32 = 0;
        while self.peek() == Some(b'@') {
            depth += 1;
            self.pos += 1;
        }
        let inner = match self.peek() {
            None => return Err(Error::new("empty retrieval", start + 1)),
            Some(b) if is_break(b) => return Err(Error::new("empty retrieval", start + 1)),
            Some(b'<') => {
                return Err(Error::new(
                    "a back retrieval cannot appear inside a retrieval",
                    self.pos + 1,
                ));
            }
            Some(b'"') => self.string_literal()?,
            Some(b'+' | b'-' | b'0'..=b'9') => self.number()?,
            Some(_) => self.name()?,
        };
        Ok(Token::new(
            TokenPayload::Retrieval {
                depth,
                inner: Box::new(inner),
            },
            start + 1,
        ))
    }

    fn back_retrieval(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        self.pos += 1;
        if let Some(b) = self.peek()
            && !is_break(b)
        {
            let c = self.char_at(self.pos).unwrap_or('?');
            return Err(Error::new(
                format!("malformed back retrieval: unexpected '{c}'"),
                self.pos + 1,
            ));
        }
        Ok(Token::new(TokenPayload::Back, start + 1))
    }

    fn number(&mut self) -> Result<Token, Error> {
        let byte = |i: usize| self.bytes.get(i).copied();
        let start = self.pos;
        let mut i = self.pos;
        if matches!(byte(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let int_start = i;
        while matches!(byte(i), Some(b'0'..=b'9')) {
            i += 1;
        }
        let mut ok = i > int_start;
        if ok && byte(i) == Some(b'.') {
            i += 1;
            let frac_start = i;
            while matches!(byte(i), Some(b'0'..=b'9')) {
                i += 1;
            }
            ok = i > frac_start;
        }
        if ok && matches!(byte(i), Some(b'e' | b'E')) {
            i += 1;
            if matches!(byte(i), Some(b'+' | b'-')) {
                i += 1;
            }
            let exp_start = i;
            while matches!(byte(i), Some(b'0'..=b'9')) {
                i += 1;
            }
            ok = i > exp_start;
        }

        let terminated = match byte(i) {
            None => true,
            Some(b) => is_break(b),
        };
        if !ok || !terminated {
            return Err(self.bad_blob(start, "malformed number"));
        }
        self.pos = i;
        match self.src[start..i].parse::<f64>() {
            Ok(n) => Ok(Token::new(TokenPayload::Literal(Value::Num(n)), start + 1)),
            Err(_) => Err(Error::new(
                format!("malformed number '{}'", &self.src[start..i]),
                start + 1,
            )),
        }
    }

    fn name(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        let mut i = start;
        loop {
            match self.bytes.get(i) {
                None => break,
                Some(&b) if is_break(b) => break,
                Some(&b) if is_name_char(b) => i += 1,
                Some(&b'"') => {
                    return Err(Error::new(
                        "a string literal cannot start inside another token",
                        i + 1,
                    ));
                }
                Some(_) => {
                    let c = self.char_at(i).unwrap_or('?');
                    let end = self.blob_end(start);
                    return Err(Error::new(
                        format!("illegal character '{c}' in name '{}'", &self.src[start..end]),
                        i + 1,
                    ));
                }
            }
        }
        self.pos = i;
        Ok(Token::new(
            TokenPayload::Name(self.src[start..i].to_string()),
            start + 1,
        ))
    }

    /// Error over a blob that failed to lex, quoting it up to the next
    /// break. A quote inside the blob is its own error: strings may not
    /// start mid-token.
    fn bad_blob(&self, start: usize, what: &str) -> Error {
        let mut i = start;
        while let Some(&b) = self.bytes.get(i) {
            if is_break(b) {
                break;
            }
            if b == b'"' {
                return Error::new("a string literal cannot start inside another token", i + 1);
            }
            i += 1;
        }
        Error::new(format!("{what} '{}'", &self.src[start..i]), start + 1)
    }

    /// End of the current non-string blob, for quoting in messages.
    fn blob_end(&self, start: usize) -> usize {
        let mut i = start;
        while let Some(&b) = self.bytes.get(i) {
            if is_break(b) {
                break;
            }
            i += 1;
        }
        i
    }
}
