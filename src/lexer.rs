//! Character-level tokenizer: a single forward scanner over the source text
//! producing one `Token` per `lex()` call, tracking line numbers as it goes.

use crate::error::{CompileError, Result};
use crate::number::parse_number;
use crate::token::{Token, TokenKind, TokenValue};
use smol_str::SmolStr;

pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            source,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    self.bump();
                    self.bump();
                    if self.peek() == Some('[') && self.long_bracket_level().is_some() {
                        self.read_long_bracket()?;
                    } else {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Returns `Some(level)` if positioned at `[=*[`, without consuming.
    fn long_bracket_level(&self) -> Option<usize> {
        if self.peek() != Some('[') {
            return None;
        }
        let mut i = 1;
        while self.peek_at(i) == Some('=') {
            i += 1;
        }
        if self.peek_at(i) == Some('[') {
            Some(i - 1)
        } else {
            None
        }
    }

    fn read_long_bracket(&mut self) -> Result<String> {
        let level = self.long_bracket_level().unwrap();
        self.bump(); // '['
        for _ in 0..level {
            self.bump(); // '='
        }
        self.bump(); // '['
        if self.peek() == Some('\n') {
            self.bump();
        }
        let mut out = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(CompileError::new("unfinished long string/comment", self.line));
                }
                Some(']') => {
                    let save = self.pos;
                    self.bump();
                    let mut eq = 0;
                    while self.peek() == Some('=') {
                        self.bump();
                        eq += 1;
                    }
                    if eq == level && self.peek() == Some(']') {
                        self.bump();
                        return Ok(out);
                    } else {
                        self.pos = save;
                        out.push(self.bump().unwrap());
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.bump();
                }
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<String> {
        let start_line = self.line;
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(CompileError::new("unfinished string", start_line));
                }
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(out);
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some('r') => out.push('\r'),
                        Some('a') => out.push('\u{07}'),
                        Some('b') => out.push('\u{08}'),
                        Some('f') => out.push('\u{0C}'),
                        Some('v') => out.push('\u{0B}'),
                        Some('\\') => out.push('\\'),
                        Some('"') => out.push('"'),
                        Some('\'') => out.push('\''),
                        Some('\n') => out.push('\n'),
                        Some(other) if other.is_ascii_digit() => {
                            let mut val = other.to_digit(10).unwrap();
                            for _ in 0..2 {
                                if let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
                                    val = val * 10 + d;
                                    self.bump();
                                } else {
                                    break;
                                }
                            }
                            out.push(val as u8 as char);
                        }
                        Some(other) => out.push(other),
                        None => {
                            return Err(CompileError::new("unfinished string", start_line));
                        }
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.bump();
                }
            }
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        let line = self.line;
        let start = self.pos;
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.bump();
            self.bump();
            while self
                .peek()
                .map(|c| c.is_ascii_hexdigit())
                .unwrap_or(false)
            {
                self.bump();
            }
        } else {
            while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.bump();
            }
            if self.peek() == Some('.') {
                self.bump();
                while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                    self.bump();
                }
            }
            if matches!(self.peek(), Some('e') | Some('E')) {
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.bump();
                }
                while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                    self.bump();
                }
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let value = parse_number(&text)
            .ok_or_else(|| CompileError::new(format!("malformed number near '{text}'"), line))?;
        Ok(Token::new(TokenKind::TkNumber, TokenValue::Number(value), line))
    }

    fn read_name_or_keyword(&mut self) -> Token {
        let line = self.line;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let kind = keyword_kind(&text);
        match kind {
            Some(k) => Token::new(k, TokenValue::None, line),
            None => Token::new(TokenKind::TkName, TokenValue::Str(SmolStr::new(text)), line),
        }
    }

    /// Returns the next token from the character stream.
    pub fn lex(&mut self) -> Result<Token> {
        self.skip_trivia()?;
        let line = self.line;
        let c = match self.peek() {
            None => return Ok(Token::new(TokenKind::TkEos, TokenValue::None, line)),
            Some(c) => c,
        };

        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).map(|n| n.is_ascii_digit()).unwrap_or(false)) {
            return self.read_number();
        }
        if c.is_alphabetic() || c == '_' {
            return Ok(self.read_name_or_keyword());
        }
        if c == '"' || c == '\'' {
            let s = self.read_string(c)?;
            return Ok(Token::new(TokenKind::TkString, TokenValue::Str(SmolStr::new(s)), line));
        }
        if c == '[' && self.long_bracket_level().is_some() {
            let s = self.read_long_bracket()?;
            return Ok(Token::new(TokenKind::TkString, TokenValue::Str(SmolStr::new(s)), line));
        }

        macro_rules! single {
            ($kind:expr) => {{
                self.bump();
                Ok(Token::new($kind, TokenValue::None, line))
            }};
        }

        use TokenKind::*;
        match c {
            '+' => single!(TkPlus),
            '-' => single!(TkMinus),
            '*' => single!(TkStar),
            '/' => single!(TkSlash),
            '^' => single!(TkCaret),
            '%' => single!(TkPercent),
            '(' => single!(TkLParen),
            ')' => single!(TkRParen),
            '{' => single!(TkLBrace),
            '}' => single!(TkRBrace),
            '[' => single!(TkLBracket),
            ']' => single!(TkRBracket),
            ';' => single!(TkSemi),
            ',' => single!(TkComma),
            ':' => single!(TkColon),
            '=' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token::new(TkEq, TokenValue::None, line))
                } else {
                    Ok(Token::new(TkAssign, TokenValue::None, line))
                }
            }
            '~' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token::new(TkNe, TokenValue::None, line))
                } else {
                    Err(CompileError::new("unexpected symbol near '~'", line))
                }
            }
            '<' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token::new(TkLe, TokenValue::None, line))
                } else {
                    Ok(Token::new(TkLt, TokenValue::None, line))
                }
            }
            '>' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token::new(TkGe, TokenValue::None, line))
                } else {
                    Ok(Token::new(TkGt, TokenValue::None, line))
                }
            }
            '.' => {
                self.bump();
                if self.peek() == Some('.') {
                    self.bump();
                    if self.peek() == Some('.') {
                        self.bump();
                        Ok(Token::new(TkDots, TokenValue::None, line))
                    } else {
                        Ok(Token::new(TkConcat, TokenValue::None, line))
                    }
                } else {
                    Ok(Token::new(TkDot, TokenValue::None, line))
                }
            }
            other => Err(CompileError::new(
                format!("unexpected symbol near '{other}'"),
                line,
            )),
        }
    }

    #[allow(dead_code)]
    pub fn source(&self) -> &'a str {
        self.source
    }
}

fn keyword_kind(text: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match text {
        "and" => TkAnd,
        "break" => TkBreak,
        "do" => TkDo,
        "else" => TkElse,
        "elseif" => TkElseIf,
        "end" => TkEnd,
        "false" => TkFalse,
        "for" => TkFor,
        "function" => TkFunction,
        "if" => TkIf,
        "in" => TkIn,
        "local" => TkLocal,
        "nil" => TkNil,
        "not" => TkNot,
        "or" => TkOr,
        "repeat" => TkRepeat,
        "return" => TkReturn,
        "then" => TkThen,
        "true" => TkTrue,
        "until" => TkUntil,
        "while" => TkWhile,
        _ => return None,
    })
}
