//! One-token-lookahead driver over the `Lexer`.

use crate::error::{CompileError, Result};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

pub struct LexState<'a> {
    lexer: Lexer<'a>,
    /// Current token, always valid after `new`.
    pub current: Token,
    lookahead: Option<Token>,
    /// Line of the token most recently consumed by `advance`.
    pub last_line: u32,
}

impl<'a> LexState<'a> {
    pub fn new(source: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.lex()?;
        Ok(LexState {
            lexer,
            current,
            lookahead: None,
            last_line: 1,
        })
    }

    pub fn line(&self) -> u32 {
        self.current.line
    }

    /// Consume the current token, promoting a stashed lookahead if present.
    pub fn advance(&mut self) -> Result<()> {
        self.last_line = self.current.line;
        self.current = match self.lookahead.take() {
            Some(t) => t,
            None => self.lexer.lex()?,
        };
        Ok(())
    }

    /// Fetch one token past current without consuming it. Fails if a
    /// lookahead is already stashed rather than silently overwriting it:
    /// only one slot of look-ahead is ever supported.
    pub fn peek_next(&mut self) -> Result<&Token> {
        if self.lookahead.is_some() {
            return Err(CompileError::new(
                "double look-ahead requested",
                self.current.line,
            ));
        }
        let t = self.lexer.lex()?;
        self.lookahead = Some(t);
        Ok(self.lookahead.as_ref().unwrap())
    }

    /// If current token matches `kind`, consume it and return true.
    pub fn accept(&mut self, kind: TokenKind) -> Result<bool> {
        if self.current.kind == kind {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Require current token to be `kind`, else raise "<kind> expected".
    pub fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.current.kind != kind {
            return Err(self.error_expected(kind));
        }
        self.advance()
    }

    /// Like `expect`, but on mismatch reports the opening construct's line
    /// when it differs from the current line.
    pub fn expect_match(&mut self, close: TokenKind, open: TokenKind, open_line: u32) -> Result<()> {
        if self.current.kind != close {
            if open_line == self.current.line {
                return Err(self.error_expected(close));
            } else {
                return Err(CompileError::new(
                    format!(
                        "{} expected (to close {} at line {})",
                        close.describe(),
                        open.describe(),
                        open_line
                    ),
                    self.current.line,
                ));
            }
        }
        self.advance()
    }

    pub fn error_expected(&self, kind: TokenKind) -> CompileError {
        CompileError::new(format!("{} expected", kind.describe()), self.current.line)
    }

    pub fn error_here(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(message, self.current.line)
    }
}
