use gml_core::GmlError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),

    If,
    Else,
    Repeat,
    While,
    Do,
    Until,
    For,
    Switch,
    Case,
    Default,
    With,
    Exit,
    Return,
    Break,
    Continue,
    Var,
    GlobalVar,
    Begin,
    End,
    And,
    Or,
    Xor,
    Not,
    Div,
    Mod,

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,

    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Shl,
    Shr,
    Plus,
    Minus,
    Star,
    Slash,
    Amp,
    Pipe,
    Caret,
    AmpAmp,
    PipePipe,
    CaretCaret,
    Bang,
    Tilde,

    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            Self::Number(value) => format!("number {}", value),
            Self::Str(_) => "string literal".to_string(),
            Self::Ident(name) => format!("\"{}\"", name),
            Self::Eof => "end of code".to_string(),
            other => format!("\"{}\"", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Else => "else",
            Self::Repeat => "repeat",
            Self::While => "while",
            Self::Do => "do",
            Self::Until => "until",
            Self::For => "for",
            Self::Switch => "switch",
            Self::Case => "case",
            Self::Default => "default",
            Self::With => "with",
            Self::Exit => "exit",
            Self::Return => "return",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Var => "var",
            Self::GlobalVar => "globalvar",
            Self::Begin => "begin",
            Self::End => "end",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Not => "not",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::StarAssign => "*=",
            Self::SlashAssign => "/=",
            Self::EqEq => "==",
            Self::BangEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::AmpAmp => "&&",
            Self::PipePipe => "||",
            Self::CaretCaret => "^^",
            Self::Bang => "!",
            Self::Tilde => "~",
            Self::Number(_) | Self::Str(_) | Self::Ident(_) | Self::Eof => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "repeat" => TokenKind::Repeat,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "until" => TokenKind::Until,
        "for" => TokenKind::For,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "with" => TokenKind::With,
        "exit" => TokenKind::Exit,
        "return" => TokenKind::Return,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "var" => TokenKind::Var,
        "globalvar" => TokenKind::GlobalVar,
        "begin" => TokenKind::Begin,
        "end" => TokenKind::End,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "xor" => TokenKind::Xor,
        "not" => TokenKind::Not,
        "div" => TokenKind::Div,
        "mod" => TokenKind::Mod,
        _ => return None,
    };
    Some(kind)
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.advance();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> GmlError {
        GmlError::syntax(message).located(self.source, offset)
    }

    fn skip_trivia(&mut self) -> Result<(), GmlError> {
        loop {
            self.eat_while(char::is_whitespace);
            match (self.peek(), self.peek_next()) {
                (Some('/'), Some('/')) => {
                    self.eat_while(|ch| ch != '\n' && ch != '\r');
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    match self.source[self.pos..].find("*/") {
                        Some(end) => self.pos += end + 2,
                        None => return Err(self.error(start, "Unterminated comment.")),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_number(&mut self, start: usize) -> Result<TokenKind, GmlError> {
        self.eat_while(|ch| ch.is_ascii_digit());
        if self.eat('.') {
            self.eat_while(|ch| ch.is_ascii_digit());
        }
        let text = &self.source[start..self.pos];
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(start, format!("Malformed number \"{}\".", text)))
    }

    fn lex_string(&mut self, start: usize, quote: char) -> Result<TokenKind, GmlError> {
        let body_start = self.pos;
        match self.source[body_start..].find(quote) {
            Some(length) => {
                self.pos = body_start + length + quote.len_utf8();
                Ok(TokenKind::Str(self.source[body_start..body_start + length].to_string()))
            }
            None => Err(self.error(start, "Unterminated string.")),
        }
    }

    fn next_token(&mut self) -> Result<Token, GmlError> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(ch) = self.advance() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                offset: start,
            });
        };

        let kind = match ch {
            '0'..='9' => self.lex_number(start)?,
            '"' | '\'' => self.lex_string(start, ch)?,
            ch if ch.is_alphabetic() || ch == '_' => {
                self.eat_while(|ch| ch.is_alphanumeric() || ch == '_');
                let word = &self.source[start..self.pos];
                keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()))
            }
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '~' => TokenKind::Tilde,
            '=' => {
                if self.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::LtEq
                } else if self.eat('<') {
                    TokenKind::Shl
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::GtEq
                } else if self.eat('>') {
                    TokenKind::Shr
                } else {
                    TokenKind::Gt
                }
            }
            '+' => {
                if self.eat('=') {
                    TokenKind::PlusAssign
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('=') {
                    TokenKind::MinusAssign
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    TokenKind::StarAssign
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashAssign
                } else {
                    TokenKind::Slash
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AmpAmp
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::PipePipe
                } else {
                    TokenKind::Pipe
                }
            }
            '^' => {
                if self.eat('^') {
                    TokenKind::CaretCaret
                } else {
                    TokenKind::Caret
                }
            }
            other => {
                return Err(self.error(start, format!("Unexpected symbol \"{}\".", other)));
            }
        };

        Ok(Token {
            kind,
            offset: start,
        })
    }
}

/// Splits source text into tokens, always terminated by `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, GmlError> {
    let mut lexer = Lexer { source, pos: 0 };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
