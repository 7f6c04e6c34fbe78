use crate::{
    ast::Literal,
    error::{ErrorMsg, Reporter},
    token::{TextRange, Token, TokenKind},
};
use log::trace;
use rust_decimal::Decimal;
use std::{iter::Peekable, str::Chars, str::FromStr};

pub struct Lexer<'a> {
    source: &'a str,
    stream: Peekable<Chars<'a>>,
    reporter: &'a mut dyn Reporter,
    line: usize,
    // Byte offsets into `source`
    start: usize,
    current: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, reporter: &'a mut dyn Reporter) -> Self {
        Self {
            source,
            stream: source.chars().peekable(),
            reporter,
            line: 1,
            start: 0,
            current: 0,
        }
    }

    /// Lex the whole source. Errors go to the reporter and lexing carries
    /// on, so the returned tokens always end with exactly one `EOF`.
    pub fn lex_all(mut self) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::default();
        while self.stream.peek().is_some() {
            if let Some(t) = self.lex() {
                tokens.push(t);
            }
        }
        tokens.push(Token::eof(self.line, self.current));
        trace!("Lexed {} tokens", tokens.len());
        tokens
    }

    /// Lex the next lexeme. Returns `None` for whitespace, comments
    /// and lexemes that were reported as errors.
    pub fn lex(&mut self) -> Option<Token> {
        self.start = self.current;
        let c = self.advance()?;
        match c {
            '!' => Some(self.lookahead_for_token('=', TokenKind::BANG_EQUAL, TokenKind::BANG)),
            '=' => Some(self.lookahead_for_token(
                '=',
                TokenKind::EQUAL_EQUAL,
                TokenKind::EQUAL,
            )),
            '>' => Some(self.lookahead_for_token(
                '=',
                TokenKind::GREATER_EQUAL,
                TokenKind::GREATER,
            )),
            '<' => Some(self.lookahead_for_token('=', TokenKind::LESS_EQUAL, TokenKind::LESS)),
            '"' => self.lex_string(),
            '/' => self.lex_slash_or_comment(),
            // `advance` already counted the newline
            ' ' | '\t' | '\r' | '\n' => None,
            _ => {
                if let Some(t) = TokenKind::from_char(c) {
                    Some(self.make_token(t, None))
                } else if c.is_ascii_digit() {
                    self.lex_number()
                } else if c.is_alphabetic() || c == '_' {
                    Some(self.lex_ident())
                } else {
                    self.error(ErrorMsg::UnexpectedChar, "");
                    None
                }
            }
        }
    }

    fn lex_ident(&mut self) -> Token {
        self.advance_while(|c| c.is_alphanumeric() || c == '_');
        let kind = TokenKind::from_keyword(self.lexeme_from_range()).unwrap_or(TokenKind::IDENT);
        self.make_token(kind, None)
    }

    fn lex_number(&mut self) -> Option<Token> {
        self.advance_while(|c| c.is_ascii_digit());
        // A dot only belongs to the number if a digit follows it
        if self.stream.peek() == Some(&'.') && self.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
        }
        let text = self.lexeme_from_range();
        match Decimal::from_str(text) {
            Ok(n) => Some(self.make_token(TokenKind::NUMBER, Some(Literal::Number(n)))),
            Err(_) => {
                let context = format!(" at {text}");
                self.error(ErrorMsg::UnrepresentableNumber, &context);
                None
            }
        }
    }

    fn lex_string(&mut self) -> Option<Token> {
        self.advance_while(|c| c != '"');
        if self.advance().is_none() {
            self.error(ErrorMsg::UnterminatedString, "");
            return None;
        }
        // Strip the surrounding quotes for the literal value
        let value = self.source[self.start + 1..self.current - 1].to_string();
        Some(self.make_token(TokenKind::STRING, Some(Literal::Str(value))))
    }

    fn lex_slash_or_comment(&mut self) -> Option<Token> {
        if self.advance_if(|c| c == '/').is_some() {
            self.advance_while(|c| c != '\n');
            None
        } else if self.advance_if(|c| c == '*').is_some() {
            self.lex_block_comment();
            None
        } else {
            Some(self.make_token(TokenKind::SLASH, None))
        }
    }

    /// Block comments do not nest, the first `*/` closes the comment.
    fn lex_block_comment(&mut self) {
        loop {
            match self.advance() {
                Some('*') => {
                    if self.advance_if(|c| c == '/').is_some() {
                        return;
                    }
                }
                Some(_) => (),
                None => {
                    self.error(ErrorMsg::UnterminatedComment, "");
                    return;
                }
            }
        }
    }

    fn make_token(&self, kind: TokenKind, literal: Option<Literal>) -> Token {
        Token::new(
            kind,
            self.lexeme_from_range().to_string(),
            literal,
            self.line,
            self.text_range(),
        )
    }

    fn lexeme_from_range(&self) -> &'a str {
        &self.source[self.start..self.current]
    }

    fn text_range(&self) -> TextRange {
        TextRange {
            start: self.start,
            end: self.current,
        }
    }

    fn peek_next(&self) -> Option<char> {
        self.source[self.current..].chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.stream.next()?;
        self.current += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn advance_if<F>(&mut self, cond: F) -> Option<char>
    where
        F: FnOnce(char) -> bool,
    {
        if self.stream.peek().filter(|&&c| cond(c)).is_some() {
            self.advance()
        } else {
            None
        }
    }

    fn advance_while<F>(&mut self, cond: F) -> Option<usize>
    where
        F: Fn(char) -> bool,
    {
        let mut count: usize = 0;
        while self.stream.peek().filter(|&&c| cond(c)).is_some() {
            count += 1;
            self.advance();
        }
        count.ne(&0).then_some(count)
    }

    fn lookahead_for_token(
        &mut self,
        match_char: char,
        if_match: TokenKind,
        no_match: TokenKind,
    ) -> Token {
        if self.advance_if(|c| c == match_char).is_some() {
            self.make_token(if_match, None)
        } else {
            self.make_token(no_match, None)
        }
    }

    fn error(&mut self, msg: ErrorMsg, context: &str) {
        self.reporter.report(self.line, &msg.to_string(), context);
    }
}
