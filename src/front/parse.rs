//! The parser: hand-written recursive descent, one function per grammar
//! non-terminal, producing the typed AST in [`super::ast`]. No emission
//! happens here — see [`crate::middle::emit`] for the syntax-directed
//! lowering pass that walks the tree this module returns.

use std::fmt::Debug;

use derive_more::derive::Display;

use super::ast::*;
use super::lex::{intern, number_value, LexWarning, Lexer, Token, TokenKind};

#[derive(Display)]
#[display("Parse error: {}", self.0)]
pub struct ParseError(String);

impl Debug for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl ParseError {
    fn unexpected(found: Option<&Token>) -> Self {
        match found {
            Some(t) => ParseError(format!(
                "unexpected token {:?} (text {:?}) at line {}",
                t.kind, t.text, t.line
            )),
            None => ParseError("syntax error at EOF".to_string()),
        }
    }
}

struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<Token<'src>> {
        let t = self.tokens.get(self.pos).copied();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        if self.check(kind) {
            Ok(self.advance().unwrap())
        } else {
            Err(ParseError::unexpected(self.peek()))
        }
    }

    fn expect_ident(&mut self) -> Result<(crate::common::Id, u32), ParseError> {
        let tok = self.expect(TokenKind::Ident)?;
        Ok((intern(tok.text), tok.line))
    }

    fn expect_number(&mut self) -> Result<i32, ParseError> {
        let tok = self.expect(TokenKind::Number)?;
        Ok(number_value(tok.text))
    }

    // program := 'program' IDENT ';' outblock '.'
    fn parse_program(&mut self) -> Result<Program, ParseError> {
        self.expect(TokenKind::Program)?;
        self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::Semicolon)?;
        let globals = self.parse_var_decl_part()?;
        let subprogs = self.parse_subprog_decl_part()?;
        let body = self.parse_statement()?;
        self.expect(TokenKind::Dot)?;
        Ok(Program {
            globals,
            subprogs,
            body,
        })
    }

    // var_decl_part := (var_decl_list ';')?
    // var_decl_list := var_decl (';' var_decl)*
    // var_decl      := 'var' id_list
    fn parse_var_decl_part(&mut self) -> Result<Vec<IdItem>, ParseError> {
        // Every var_decl in the grammar's right-recursive var_decl_list is
        // followed by a ';' — either a list separator or var_decl_part's
        // own trailing ';' — so a flat "('var' id_list ';')*" loop accepts
        // exactly the same language as the nested productions.
        let mut items = Vec::new();
        while self.check(TokenKind::Var) {
            self.advance();
            items.extend(self.parse_id_list()?);
            self.expect(TokenKind::Semicolon)?;
        }
        Ok(items)
    }

    // id_list  := id_item (',' id_item)*
    // id_item  := IDENT | IDENT '[' NUMBER '..' NUMBER ']'
    fn parse_id_list(&mut self) -> Result<Vec<IdItem>, ParseError> {
        let mut items = vec![self.parse_id_item()?];
        while self.eat(TokenKind::Comma) {
            items.push(self.parse_id_item()?);
        }
        Ok(items)
    }

    fn parse_id_item(&mut self) -> Result<IdItem, ParseError> {
        let (name, _line) = self.expect_ident()?;
        if self.eat(TokenKind::LBracket) {
            let lo = self.expect_number()?;
            self.expect(TokenKind::DotDot)?;
            let hi = self.expect_number()?;
            self.expect(TokenKind::RBracket)?;
            Ok(IdItem::Array(name, (lo, hi)))
        } else {
            Ok(IdItem::Scalar(name))
        }
    }

    // subprog_decl_part := (subprog_decl_list ';')?
    fn parse_subprog_decl_part(&mut self) -> Result<Vec<SubprogDecl>, ParseError> {
        let mut subprogs = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::Procedure) | Some(TokenKind::Function) => {
                    subprogs.push(self.parse_subprog_decl()?);
                    self.expect(TokenKind::Semicolon)?;
                }
                _ => break,
            }
        }
        Ok(subprogs)
    }

    fn parse_subprog_decl(&mut self) -> Result<SubprogDecl, ParseError> {
        let kind = match self.peek_kind() {
            Some(TokenKind::Procedure) => SubprogKind::Proc,
            Some(TokenKind::Function) => SubprogKind::Func,
            _ => return Err(ParseError::unexpected(self.peek())),
        };
        self.advance();
        let (name, line) = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let params = if self.check(TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_id_list()?
        };
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;
        let locals = self.parse_var_decl_part()?;
        let body = self.parse_statement()?;
        Ok(SubprogDecl {
            kind,
            name,
            params,
            locals,
            body,
            line,
        })
    }

    // statement := assignment | if_stmt | while_stmt | for_stmt
    //            | proc_call | func_call | null | block | read | write
    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::If) => self.parse_if(),
            Some(TokenKind::While) => self.parse_while(),
            Some(TokenKind::For) => self.parse_for(),
            Some(TokenKind::Begin) => self.parse_block(),
            Some(TokenKind::Read) => self.parse_read(),
            Some(TokenKind::Write) => self.parse_write(),
            Some(TokenKind::Ident) => self.parse_assign_or_call(),
            // An empty statement: appears as the body of `else`, or as a
            // blank entry in a `;`-separated statement list.
            _ => Ok(Stmt::Null),
        }
    }

    fn parse_assign_or_call(&mut self) -> Result<Stmt, ParseError> {
        let (name, line) = self.expect_ident()?;
        if self.check(TokenKind::LParen) {
            let args = self.parse_call_args()?;
            return Ok(Stmt::Call { name, args, line });
        }
        if self.eat(TokenKind::LBracket) {
            let index = self.parse_expression()?;
            self.expect(TokenKind::RBracket)?;
            self.expect(TokenKind::Assign)?;
            let value = self.parse_expression()?;
            return Ok(Stmt::Assign {
                name,
                index: Some(index),
                value,
                line,
            });
        }
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        Ok(Stmt::Assign {
            name,
            index: None,
            value,
            line,
        })
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            args.push(self.parse_expression()?);
            while self.eat(TokenKind::Comma) {
                args.push(self.parse_expression()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    // if_stmt := 'if' condition 'then' statement ('else' statement)?
    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let cond = self.parse_condition()?;
        self.expect(TokenKind::Then)?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    // while_stmt := 'while' condition 'do' statement
    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let cond = self.parse_condition()?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While { cond, body })
    }

    // for_stmt := 'for' IDENT ':=' expression 'to' expression 'do' statement
    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let (var, line) = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let from = self.parse_expression()?;
        self.expect(TokenKind::To)?;
        let to = self.parse_expression()?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For {
            var,
            from,
            to,
            body,
            line,
        })
    }

    // block := 'begin' statement (';' statement)* 'end'
    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let mut stmts = vec![self.parse_statement()?];
        while self.eat(TokenKind::Semicolon) {
            stmts.push(self.parse_statement()?);
        }
        self.expect(TokenKind::End)?;
        Ok(Stmt::Block(stmts))
    }

    // read := 'read' '(' IDENT ('[' expression ']')? ')'
    fn parse_read(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(TokenKind::LParen)?;
        let (name, line) = self.expect_ident()?;
        let index = if self.eat(TokenKind::LBracket) {
            let e = self.parse_expression()?;
            self.expect(TokenKind::RBracket)?;
            Some(e)
        } else {
            None
        };
        self.expect(TokenKind::RParen)?;
        Ok(Stmt::Read { name, index, line })
    }

    // write := 'write' '(' expression ')'
    fn parse_write(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(TokenKind::LParen)?;
        let e = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        Ok(Stmt::Write(e))
    }

    // condition := expression relop expression
    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        let lhs = self.parse_expression()?;
        let op = match self.peek_kind() {
            Some(TokenKind::Eq) => RelOp::Eq,
            Some(TokenKind::Neq) => RelOp::Ne,
            Some(TokenKind::Lt) => RelOp::Lt,
            Some(TokenKind::Le) => RelOp::Le,
            Some(TokenKind::Gt) => RelOp::Gt,
            Some(TokenKind::Ge) => RelOp::Ge,
            _ => return Err(ParseError::unexpected(self.peek())),
        };
        self.advance();
        let rhs = self.parse_expression()?;
        Ok(Condition { lhs, op, rhs })
    }

    // expression := ['-'] term (('+'|'-') term)*
    // (the grammar's alternative `func_call` here is folded into
    // term/factor — see the Open Question resolution in DESIGN.md)
    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = if self.eat(TokenKind::Minus) {
            let operand = Box::new(self.parse_term()?);
            Expr::Unary {
                op: UnOp::Neg,
                operand,
            }
        } else {
            self.parse_term()?
        };
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // term := factor (('*'|'div') factor)*
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Mul) => BinOp::Mul,
                Some(TokenKind::Div) => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // factor := IDENT ('[' expression ']')? | NUMBER | '(' expression ')'
    //         | IDENT '(' arglist? ')'
    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Number) => {
                let v = self.expect_number()?;
                Ok(Expr::Const(v))
            }
            Some(TokenKind::LParen) => {
                self.advance();
                let e = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            Some(TokenKind::Ident) => {
                let (name, line) = self.expect_ident()?;
                if self.check(TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    Ok(Expr::Call { name, args, line })
                } else if self.eat(TokenKind::LBracket) {
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    Ok(Expr::Index {
                        name,
                        index: Box::new(index),
                        line,
                    })
                } else {
                    Ok(Expr::Var { name, line })
                }
            }
            _ => Err(ParseError::unexpected(self.peek())),
        }
    }
}

/// Parse a complete program from source text.
///
/// Lexical warnings encountered along the way are pushed onto `warnings`.
pub fn parse(input: &str, warnings: &mut Vec<LexWarning>) -> Result<Program, ParseError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next() {
        tokens.push(tok);
    }
    warnings.extend(lexer.warnings().iter().cloned());

    let mut parser = Parser { tokens, pos: 0 };
    let program = parser.parse_program()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::unexpected(parser.peek()));
    }
    Ok(program)
}
