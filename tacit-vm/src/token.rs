//! The tokenizer the parser drives: a minimal lexer that turns source text
//! into a stream of numbers, strings, symbols, and word tokens.

use core::fmt;

/// One lexical token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token's kind and payload.
    pub kind: TokenKind,
    /// Byte offset into the source at which this token started.
    pub position: usize,
}

/// The four token kinds the parser consumes, plus the payload each one
/// carries.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A numeric literal, already parsed to its float value.
    Number(f32),
    /// A quoted string literal, with escapes already resolved.
    String(String),
    /// A symbol literal (`` `name ``), interned the same way as a string.
    Symbol(String),
    /// An ordinary whitespace-delimited word.
    Word(String),
    /// One of `: ; ( ) [ ]`.
    Special(char),
    /// End of input.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::String(s) => write!(f, "{s:?}"),
            TokenKind::Symbol(s) => write!(f, "`{s}"),
            TokenKind::Word(w) => write!(f, "{w}"),
            TokenKind::Special(c) => write!(f, "{c}"),
            TokenKind::Eof => write!(f, "<eof>"),
        }
    }
}

/// A minimal lexer over a source string: whitespace-separated words,
/// `#`-to-end-of-line comments, `"..."` string literals with `\n \t \r \\ \"`
/// escapes, `` `name `` symbol literals, decimal/float numeric literals, and
/// `: ; ( ) [ ]` as standalone special characters.
pub struct Tokenizer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

const SPECIALS: &[char] = &[':', ';', '(', ')', '[', ']'];

impl<'a> Tokenizer<'a> {
    /// Build a tokenizer over `source`.
    pub fn new(source: &'a str) -> Self {
        Tokenizer {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
                self.chars.next();
            }
            if matches!(self.chars.peek(), Some((_, '#'))) {
                while !matches!(self.chars.peek(), Some((_, '\n')) | None) {
                    self.chars.next();
                }
                continue;
            }
            break;
        }
    }

    fn read_string_literal(&mut self, start: usize) -> Result<Token, String> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, '"')) => {
                    return Ok(Token {
                        kind: TokenKind::String(value),
                        position: start,
                    })
                }
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, '"')) => value.push('"'),
                    Some((_, other)) => value.push(other),
                    None => return Err("unterminated string literal".to_string()),
                },
                Some((_, c)) => value.push(c),
                None => return Err("unterminated string literal".to_string()),
            }
        }
    }

    fn read_bare(&mut self, start: usize) -> Token {
        let mut end = start;
        while let Some((i, c)) = self.chars.peek().copied() {
            if c.is_whitespace() || SPECIALS.contains(&c) || c == '#' {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        let text = &self.source[start..end];
        let kind = if let Ok(n) = text.parse::<f32>() {
            TokenKind::Number(n)
        } else {
            TokenKind::Word(text.to_string())
        };
        Token {
            kind,
            position: start,
        }
    }

    /// Produce the next token, or `Err` with a description on malformed
    /// input (only unterminated string literals can fail at this layer).
    pub fn next_token(&mut self) -> Result<Token, String> {
        self.skip_whitespace_and_comments();
        let Some(&(start, c)) = self.chars.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position: self.source.len(),
            });
        };
        if SPECIALS.contains(&c) {
            self.chars.next();
            return Ok(Token {
                kind: TokenKind::Special(c),
                position: start,
            });
        }
        if c == '"' {
            self.chars.next();
            return self.read_string_literal(start);
        }
        if c == '`' {
            self.chars.next();
            let name_start = start + 1;
            let mut end = name_start;
            while let Some((i, ch)) = self.chars.peek().copied() {
                if ch.is_whitespace() || SPECIALS.contains(&ch) {
                    break;
                }
                end = i + ch.len_utf8();
                self.chars.next();
            }
            return Ok(Token {
                kind: TokenKind::Symbol(self.source[name_start..end].to_string()),
                position: start,
            });
        }
        Ok(self.read_bare(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(src: &str) -> Vec<TokenKind> {
        let mut tok = Tokenizer::new(src);
        let mut out = Vec::new();
        loop {
            let t = tok.next_token().unwrap();
            let done = matches!(t.kind, TokenKind::Eof);
            out.push(t.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn numbers_words_and_specials() {
        assert_eq!(
            tokenize("5 3 + dup"),
            vec![
                TokenKind::Number(5.0),
                TokenKind::Number(3.0),
                TokenKind::Word("+".to_string()),
                TokenKind::Word("dup".to_string()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            tokenize(": square dup * ;"),
            vec![
                TokenKind::Special(':'),
                TokenKind::Word("square".to_string()),
                TokenKind::Word("dup".to_string()),
                TokenKind::Word("*".to_string()),
                TokenKind::Special(';'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn brackets_are_distinct_specials() {
        assert_eq!(
            tokenize("[ 1 2 3 ]"),
            vec![
                TokenKind::Special('['),
                TokenKind::Number(1.0),
                TokenKind::Number(2.0),
                TokenKind::Number(3.0),
                TokenKind::Special(']'),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            tokenize("(30 20 *) eval"),
            vec![
                TokenKind::Special('('),
                TokenKind::Number(30.0),
                TokenKind::Number(20.0),
                TokenKind::Word("*".to_string()),
                TokenKind::Special(')'),
                TokenKind::Word("eval".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_literal_with_escapes() {
        assert_eq!(
            tokenize(r#""hi\nthere""#),
            vec![TokenKind::String("hi\nthere".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn symbol_literal() {
        assert_eq!(
            tokenize("`square"),
            vec![TokenKind::Symbol("square".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn comments_are_skipped_to_end_of_line() {
        assert_eq!(
            tokenize("1 # a comment\n2"),
            vec![TokenKind::Number(1.0), TokenKind::Number(2.0), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut tok = Tokenizer::new("\"oops");
        assert!(tok.next_token().is_err());
    }
}
