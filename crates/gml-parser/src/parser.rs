use std::sync::Arc;

use gml_core::GmlError;

use crate::ast::*;
use crate::lexer::{tokenize, Token, TokenKind};

/// Grammar entry point used by [`compile_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartRule {
    #[default]
    Code,
    Expression,
}

pub fn compile(source: &str) -> Result<SyntaxTree, GmlError> {
    compile_with(source, StartRule::Code)
}

pub fn compile_with(source: &str, rule: StartRule) -> Result<SyntaxTree, GmlError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let root = match rule {
        StartRule::Code => Root::Code(parser.parse_program()?),
        StartRule::Expression => {
            let expr = parser.parse_expr()?;
            if !parser.at(&TokenKind::Eof) {
                return Err(parser.unexpected("end of expression"));
            }
            Root::Expression(expr)
        }
    };
    Ok(SyntaxTree {
        source: Arc::from(source),
        root,
    })
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .or_else(|| self.tokens.last())
            .map_or(&TokenKind::Eof, |token| &token.kind)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(self.source.len(), |token| token.offset)
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn advance(&mut self) -> usize {
        let offset = self.offset();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        offset
    }

    fn expect(&mut self, kind: TokenKind) -> Result<usize, GmlError> {
        if self.at(&kind) {
            return Ok(self.advance());
        }
        Err(self.unexpected(&kind.describe()))
    }

    fn expect_ident(&mut self) -> Result<String, GmlError> {
        match self.peek() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("a variable name")),
        }
    }

    fn unexpected(&self, expected: &str) -> GmlError {
        GmlError::syntax(format!(
            "Unexpected {}, expected {}.",
            self.peek().describe(),
            expected
        ))
        .located(self.source, self.offset())
    }

    fn error_at(&self, offset: usize, message: &str) -> GmlError {
        GmlError::syntax(message).located(self.source, offset)
    }

    fn skip_semicolons(&mut self) {
        while self.at(&TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn at_block_open(&self) -> bool {
        matches!(self.peek(), TokenKind::LBrace | TokenKind::Begin)
    }

    fn at_block_close(&self) -> bool {
        matches!(self.peek(), TokenKind::RBrace | TokenKind::End)
    }

    fn parse_program(&mut self) -> Result<Vec<Stmt>, GmlError> {
        let mut body = Vec::new();
        loop {
            self.skip_semicolons();
            if self.at(&TokenKind::Eof) {
                return Ok(body);
            }
            body.push(self.parse_statement()?);
        }
    }

    fn parse_block(&mut self) -> Result<Stmt, GmlError> {
        let offset = self.offset();
        if !self.at_block_open() {
            return Err(self.unexpected("\"{\" or \"begin\""));
        }
        self.advance();
        let mut body = Vec::new();
        loop {
            self.skip_semicolons();
            if self.at_block_close() {
                self.advance();
                break;
            }
            if self.at(&TokenKind::Eof) {
                return Err(self.unexpected("\"}\" or \"end\""));
            }
            body.push(self.parse_statement()?);
        }
        self.skip_semicolons();
        Ok(Stmt {
            kind: StmtKind::Block(body),
            offset,
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt, GmlError> {
        if self.at_block_open() {
            return self.parse_block();
        }

        let offset = self.offset();
        let kind = match self.peek() {
            TokenKind::If => self.parse_if()?,
            TokenKind::Repeat => {
                self.advance();
                let count = self.parse_expr()?;
                let body = Box::new(self.parse_statement()?);
                StmtKind::Repeat { count, body }
            }
            TokenKind::While => {
                self.advance();
                let condition = self.parse_expr()?;
                let body = Box::new(self.parse_statement()?);
                StmtKind::While { condition, body }
            }
            TokenKind::Do => {
                self.advance();
                let body = Box::new(self.parse_statement()?);
                self.expect(TokenKind::Until)?;
                let condition = self.parse_expr()?;
                StmtKind::DoUntil { body, condition }
            }
            TokenKind::For => self.parse_for()?,
            TokenKind::Switch => {
                self.advance();
                let value = self.parse_expr()?;
                let body = self.parse_switch_body()?;
                StmtKind::Switch { value, body }
            }
            TokenKind::Case => {
                return Err(
                    self.error_at(offset, "Case statement only allowed inside switch statement.")
                );
            }
            TokenKind::Default => {
                return Err(self.error_at(
                    offset,
                    "Default statement only allowed inside switch statement.",
                ));
            }
            TokenKind::With => {
                self.advance();
                let target = self.parse_expr()?;
                let body = Box::new(self.parse_statement()?);
                StmtKind::With { target, body }
            }
            TokenKind::Exit => {
                self.advance();
                StmtKind::Exit
            }
            TokenKind::Return => {
                self.advance();
                StmtKind::Return(self.parse_expr()?)
            }
            TokenKind::Break => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue
            }
            TokenKind::Var => {
                self.advance();
                StmtKind::VarDecl(self.parse_name_list()?)
            }
            TokenKind::GlobalVar => {
                self.advance();
                StmtKind::GlobalVarDecl(self.parse_name_list()?)
            }
            TokenKind::Ident(_) if self.peek_at(1) == &TokenKind::LParen => {
                StmtKind::Call(self.parse_call()?)
            }
            TokenKind::Ident(_) | TokenKind::LParen => self.parse_assignment()?,
            _ => return Err(self.unexpected("a statement")),
        };
        self.skip_semicolons();
        Ok(Stmt { kind, offset })
    }

    fn parse_if(&mut self) -> Result<StmtKind, GmlError> {
        self.advance();
        let condition = self.parse_expr()?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.at(&TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_for(&mut self) -> Result<StmtKind, GmlError> {
        self.advance();
        self.expect(TokenKind::LParen)?;
        let init = Box::new(self.parse_statement()?);
        let condition = self.parse_expr()?;
        self.skip_semicolons();
        let step = Box::new(self.parse_statement()?);
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(StmtKind::For {
            init,
            condition,
            step,
            body,
        })
    }

    fn parse_switch_body(&mut self) -> Result<Vec<SwitchItem>, GmlError> {
        if !self.at_block_open() {
            return Err(self.unexpected("\"{\" or \"begin\""));
        }
        self.advance();
        let mut items = Vec::new();
        loop {
            self.skip_semicolons();
            match self.peek() {
                TokenKind::RBrace | TokenKind::End => {
                    self.advance();
                    self.skip_semicolons();
                    return Ok(items);
                }
                TokenKind::Eof => return Err(self.unexpected("\"}\" or \"end\"")),
                TokenKind::Case => {
                    self.advance();
                    let value = self.parse_expr()?;
                    self.expect(TokenKind::Colon)?;
                    items.push(SwitchItem::Case(value));
                }
                TokenKind::Default => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    items.push(SwitchItem::Default);
                }
                _ => items.push(SwitchItem::Stmt(self.parse_statement()?)),
            }
        }
    }

    fn parse_name_list(&mut self) -> Result<Vec<String>, GmlError> {
        let mut names = vec![self.expect_ident()?];
        while self.at(&TokenKind::Comma) {
            self.advance();
            names.push(self.expect_ident()?);
        }
        Ok(names)
    }

    fn parse_assignment(&mut self) -> Result<StmtKind, GmlError> {
        let starts_with_paren = self.at(&TokenKind::LParen);
        let start = self.offset();
        let target = match self.parse_primary()? {
            Expr {
                kind: ExprKind::Var(var),
                ..
            } if !starts_with_paren || var.object.is_some() => var,
            _ => return Err(self.error_at(start, "Variable name expected.")),
        };
        let op = match self.peek() {
            TokenKind::Assign => AssignOp::Set,
            TokenKind::PlusAssign => AssignOp::Add,
            TokenKind::MinusAssign => AssignOp::Subtract,
            TokenKind::StarAssign => AssignOp::Multiply,
            TokenKind::SlashAssign => AssignOp::Divide,
            _ => return Err(self.unexpected("an assignment operator")),
        };
        self.advance();
        let value = self.parse_expr()?;
        Ok(StmtKind::Assign { target, op, value })
    }

    fn parse_call(&mut self) -> Result<Call, GmlError> {
        let offset = self.offset();
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.at(&TokenKind::RParen) {
            args.push(self.parse_expr()?);
            while self.at(&TokenKind::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Call { name, args, offset })
    }

    fn parse_expr(&mut self) -> Result<Expr, GmlError> {
        self.parse_binary_level(0)
    }

    fn binary_op_at(&self, level: usize) -> Option<BinaryOp> {
        let op = match (level, self.peek()) {
            (0, TokenKind::AmpAmp | TokenKind::And) => BinaryOp::And,
            (0, TokenKind::PipePipe | TokenKind::Or) => BinaryOp::Or,
            (0, TokenKind::CaretCaret | TokenKind::Xor) => BinaryOp::Xor,
            (1, TokenKind::Lt) => BinaryOp::Less,
            (1, TokenKind::LtEq) => BinaryOp::LessEq,
            (1, TokenKind::EqEq | TokenKind::Assign) => BinaryOp::Equal,
            (1, TokenKind::BangEq) => BinaryOp::NotEqual,
            (1, TokenKind::Gt) => BinaryOp::Greater,
            (1, TokenKind::GtEq) => BinaryOp::GreaterEq,
            (2, TokenKind::Amp) => BinaryOp::BitAnd,
            (2, TokenKind::Pipe) => BinaryOp::BitOr,
            (2, TokenKind::Caret) => BinaryOp::BitXor,
            (3, TokenKind::Shl) => BinaryOp::Shl,
            (3, TokenKind::Shr) => BinaryOp::Shr,
            (4, TokenKind::Plus) => BinaryOp::Add,
            (4, TokenKind::Minus) => BinaryOp::Sub,
            (5, TokenKind::Star) => BinaryOp::Mul,
            (5, TokenKind::Slash) => BinaryOp::Div,
            (5, TokenKind::Div) => BinaryOp::IntDiv,
            (5, TokenKind::Mod) => BinaryOp::Mod,
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary_level(&mut self, level: usize) -> Result<Expr, GmlError> {
        const LEVELS: usize = 6;
        if level == LEVELS {
            return self.parse_unary();
        }
        let mut lhs = self.parse_binary_level(level + 1)?;
        while let Some(op) = self.binary_op_at(level) {
            let op_offset = self.advance();
            let rhs = self.parse_binary_level(level + 1)?;
            let offset = lhs.offset;
            lhs = Expr {
                kind: ExprKind::Binary {
                    op,
                    op_offset,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                offset,
            };
        }
        Ok(lhs)
    }

    /// A unary operator applies to a primary only; `--x` does not parse.
    fn parse_unary(&mut self) -> Result<Expr, GmlError> {
        let op = match self.peek() {
            TokenKind::Bang | TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Tilde => UnaryOp::BitNot,
            _ => return self.parse_primary(),
        };
        let offset = self.advance();
        let operand = Box::new(self.parse_primary()?);
        Ok(Expr {
            kind: ExprKind::Unary { op, operand },
            offset,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, GmlError> {
        let offset = self.offset();
        match self.peek() {
            TokenKind::Number(value) => {
                let value = *value;
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Number(value),
                    offset,
                })
            }
            TokenKind::Str(text) => {
                let text = text.clone();
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Str(text),
                    offset,
                })
            }
            TokenKind::Ident(_) if self.peek_at(1) == &TokenKind::LParen => Ok(Expr {
                kind: ExprKind::Call(self.parse_call()?),
                offset,
            }),
            TokenKind::Ident(_) => {
                let var = self.parse_var_tail(None, offset)?;
                let expr = Expr {
                    kind: ExprKind::Var(var),
                    offset,
                };
                self.parse_qualifiers(expr, offset)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                if self.at(&TokenKind::Dot) {
                    self.parse_qualifiers(inner, offset)
                } else {
                    Ok(inner)
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_var_tail(
        &mut self,
        object: Option<Box<Expr>>,
        offset: usize,
    ) -> Result<VarRef, GmlError> {
        let name = self.expect_ident()?;
        let mut indexes = Vec::new();
        if self.at(&TokenKind::LBracket) {
            self.advance();
            indexes.push(self.parse_expr()?);
            if self.at(&TokenKind::Comma) {
                self.advance();
                indexes.push(self.parse_expr()?);
            }
            self.expect(TokenKind::RBracket)?;
        }
        Ok(VarRef {
            object,
            name,
            indexes,
            offset,
        })
    }

    fn parse_qualifiers(&mut self, mut current: Expr, offset: usize) -> Result<Expr, GmlError> {
        while self.at(&TokenKind::Dot) {
            self.advance();
            let var = self.parse_var_tail(Some(Box::new(current)), offset)?;
            current = Expr {
                kind: ExprKind::Var(var),
                offset,
            };
        }
        Ok(current)
    }
}
