//! Tokenizer for dotted key paths.
//!
//! Splits input like `server."display name".port` into a stream of
//! [`Token`]s: segment strings (bare identifiers or quoted literals),
//! `.` separators, a trailing end-of-input marker, and illegal input.

use std::iter::Peekable;
use std::str::CharIndices;


/// What kind of lexeme a [`Token`] carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A decoded segment: identifier run or quoted literal.
    Str(String),
    /// The `.` separator.
    Separator,
    /// End of input.
    Eof,
    /// A character that cannot start any token.
    Illegal(char),
    /// A quoted literal with no closing quote.
    Unterminated,
}

/// A lexeme together with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, position: usize) -> Self {
        Token { kind, position }
    }
}


/// Scanner over a path string. Yields tokens until (and including) `Eof`.
pub struct Scanner<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Scanner {
            input,
            chars: input.char_indices().peekable(),
            done: false,
        }
    }

    /// Produce the next token. After input is exhausted every call
    /// returns `Eof`.
    pub fn next_token(&mut self) -> Token {
        let Some(&(pos, ch)) = self.chars.peek() else {
            return Token::new(TokenKind::Eof, self.input.len());
        };

        if is_letter(ch) || is_digit(ch) {
            return self.scan_ident(pos);
        }
        if ch == '"' {
            return self.scan_quoted(pos);
        }

        self.chars.next();
        match ch {
            '.' => Token::new(TokenKind::Separator, pos),
            other => Token::new(TokenKind::Illegal(other), pos),
        }
    }

    /// Identifier: maximal run of letters, ASCII digits and `_`.
    fn scan_ident(&mut self, start: usize) -> Token {
        let mut end = start;
        while let Some(&(pos, ch)) = self.chars.peek() {
            if !is_letter(ch) && !is_digit(ch) && ch != '_' {
                break;
            }
            end = pos + ch.len_utf8();
            self.chars.next();
        }
        Token::new(TokenKind::Str(self.input[start..end].to_string()), start)
    }

    /// Quoted literal. Ends at the first `"` not directly preceded by a
    /// backslash; each `\"` decodes to `"`, other backslashes are kept.
    fn scan_quoted(&mut self, start: usize) -> Token {
        // Opening quote.
        self.chars.next();

        let mut buf = String::new();
        let mut prev: Option<char> = None;

        loop {
            let Some((_, ch)) = self.chars.next() else {
                return Token::new(TokenKind::Unterminated, start);
            };
            if ch == '"' {
                if prev != Some('\\') {
                    return Token::new(TokenKind::Str(buf), start);
                }
                buf.pop();
            }
            buf.push(ch);
            prev = Some(ch);
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    /// Iterates tokens, stopping after `Eof` has been yielded once.
    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let tok = self.next_token();
        self.done = tok.kind == TokenKind::Eof;
        Some(tok)
    }
}


/// Letters in the Unicode sense.
fn is_letter(ch: char) -> bool {
    ch.is_alphabetic()
}

/// Decimal digits, ASCII only. `char::is_numeric` would admit superscripts,
/// fractions and other numeric code points that have no place in a key.
fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(input);
        let mut out = Vec::new();
        loop {
            let tok = scanner.next_token();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                return out;
            }
        }
    }

    fn s(v: &str) -> TokenKind {
        TokenKind::Str(v.to_string())
    }

    // --- Identifiers ---

    #[test]
    fn scans_single_identifier() {
        assert_eq!(kinds("server"), vec![s("server"), TokenKind::Eof]);
    }

    #[test]
    fn identifier_allows_digits_and_underscore() {
        assert_eq!(kinds("port_8080"), vec![s("port_8080"), TokenKind::Eof]);
        assert_eq!(kinds("9lives"), vec![s("9lives"), TokenKind::Eof]);
    }

    #[test]
    fn identifier_cannot_start_with_underscore() {
        assert_eq!(
            kinds("_x"),
            vec![TokenKind::Illegal('_'), s("x"), TokenKind::Eof]
        );
    }

    #[test]
    fn identifier_accepts_unicode_letters() {
        assert_eq!(kinds("größe"), vec![s("größe"), TokenKind::Eof]);
    }

    #[test]
    fn non_ascii_digits_are_illegal() {
        // Superscript two is numeric but not an ASCII digit.
        assert_eq!(
            kinds("a\u{00B2}"),
            vec![s("a"), TokenKind::Illegal('\u{00B2}'), TokenKind::Eof]
        );
    }

    // --- Separators and illegal input ---

    #[test]
    fn scans_separators() {
        assert_eq!(
            kinds("a.b"),
            vec![s("a"), TokenKind::Separator, s("b"), TokenKind::Eof]
        );
    }

    #[test]
    fn whitespace_is_illegal() {
        assert_eq!(
            kinds("a b"),
            vec![s("a"), TokenKind::Illegal(' '), s("b"), TokenKind::Eof]
        );
    }

    #[test]
    fn empty_input_is_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    // --- Quoted literals ---

    #[test]
    fn quoted_literal_keeps_dots_and_spaces() {
        assert_eq!(kinds("\"b.c d\""), vec![s("b.c d"), TokenKind::Eof]);
    }

    #[test]
    fn escaped_quote_decodes() {
        assert_eq!(
            kinds(r#""say \"hi\"""#),
            vec![s("say \"hi\""), TokenKind::Eof]
        );
    }

    #[test]
    fn lone_backslash_is_kept() {
        assert_eq!(kinds(r#""a\b""#), vec![s("a\\b"), TokenKind::Eof]);
    }

    #[test]
    fn empty_quoted_literal() {
        assert_eq!(kinds("\"\""), vec![s(""), TokenKind::Eof]);
    }

    #[test]
    fn unterminated_quote() {
        assert_eq!(
            kinds("a.\"open"),
            vec![s("a"), TokenKind::Separator, TokenKind::Unterminated, TokenKind::Eof]
        );
    }

    #[test]
    fn escaped_closing_quote_is_unterminated() {
        assert_eq!(kinds(r#""abc\""#), vec![TokenKind::Unterminated, TokenKind::Eof]);
    }

    // --- Positions ---

    #[test]
    fn token_positions_are_byte_offsets() {
        let mut scanner = Scanner::new("ab.\"c\"");
        assert_eq!(scanner.next_token().position, 0);
        assert_eq!(scanner.next_token().position, 2);
        assert_eq!(scanner.next_token().position, 3);
        assert_eq!(scanner.next_token().position, 6);
    }

    #[test]
    fn iterator_ends_after_eof() {
        let toks: Vec<Token> = Scanner::new("a.b").collect();
        assert_eq!(toks.len(), 4);
        assert_eq!(toks.last().map(|t| &t.kind), Some(&TokenKind::Eof));
    }

    #[test]
    fn next_token_keeps_returning_eof() {
        let mut scanner = Scanner::new("a");
        assert_eq!(scanner.next_token().kind, s("a"));
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
        assert_eq!(scanner.next_token(), Token::new(TokenKind::Eof, 1));
    }
}
