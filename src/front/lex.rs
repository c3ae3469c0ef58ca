//! The lexer.
//!
//! Tokenizes the whole input up front using a table of regexes tried in
//! order (so two-character operators are listed ahead of their one-character
//! prefixes, giving maximal munch for free). Illegal characters and integer
//! overflow are non-fatal: they are recorded as [`LexWarning`]s and lexing
//! continues, per the language's error-recovery rules.

use derive_more::Display;
use regex::Regex;
use std::sync::LazyLock;

use crate::common::Id;

/// Tokens in the program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("kind: '{kind}', part of input: '{text}'")]
pub struct Token<'src> {
    /// What token class this token belongs to.
    pub kind: TokenKind,
    /// What part of the input this token carries.
    pub text: &'src str,
    /// 1-indexed source line the token starts on.
    pub line: u32,
}

/// Token classes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Display, Debug)]
pub enum TokenKind {
    #[display("identifier")]
    Ident,
    #[display("number")]
    Number,

    #[display("begin")]
    Begin,
    #[display("div")]
    Div,
    #[display("do")]
    Do,
    #[display("else")]
    Else,
    #[display("end")]
    End,
    #[display("for")]
    For,
    #[display("function")]
    Function,
    #[display("if")]
    If,
    #[display("procedure")]
    Procedure,
    #[display("program")]
    Program,
    #[display("read")]
    Read,
    #[display("then")]
    Then,
    #[display("to")]
    To,
    #[display("var")]
    Var,
    #[display("while")]
    While,
    #[display("write")]
    Write,

    #[display("+")]
    Plus,
    #[display("-")]
    Minus,
    #[display("*")]
    Mul,
    #[display("=")]
    Eq,
    #[display("<>")]
    Neq,
    #[display("<=")]
    Le,
    #[display("<")]
    Lt,
    #[display(">=")]
    Ge,
    #[display(">")]
    Gt,
    #[display("(")]
    LParen,
    #[display(")")]
    RParen,
    #[display("[")]
    LBracket,
    #[display("]")]
    RBracket,
    #[display(",")]
    Comma,
    #[display(";")]
    Semicolon,
    #[display("..")]
    DotDot,
    #[display(".")]
    Dot,
    #[display(":=")]
    Assign,
}

fn reserved_word(text: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match text {
        "begin" => Begin,
        "div" => Div,
        "do" => Do,
        "else" => Else,
        "end" => End,
        "for" => For,
        "function" => Function,
        "if" => If,
        "procedure" => Procedure,
        "program" => Program,
        "read" => Read,
        "then" => Then,
        "to" => To,
        "var" => Var,
        "while" => While,
        "write" => Write,
        _ => return None,
    })
}

/// A non-fatal lexical issue. Compilation continues past these.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum LexWarning {
    #[display("Line {line}: unexpected character {ch:?}")]
    IllegalChar { line: u32, ch: char },
    #[display("Line {line}: integer value {text} is too large, substituting 0")]
    IntegerOverflow { line: u32, text: String },
}

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A(?:[ \t]+|\n|#[^\n]*)").unwrap());
static IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A[A-Za-z][A-Za-z0-9]*").unwrap());
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A(?:0|[1-9][0-9]*)").unwrap());

/// Operators and punctuation, longest-match first so that maximal munch
/// falls out of trying the list in order (`..` before `.`, `<=`/`<>` before
/// `<`).
static OPERATORS: LazyLock<Vec<(&'static str, TokenKind)>> = LazyLock::new(|| {
    use TokenKind::*;
    vec![
        (":=", Assign),
        ("..", DotDot),
        ("<=", Le),
        ("<>", Neq),
        (">=", Ge),
        ("+", Plus),
        ("-", Minus),
        ("*", Mul),
        ("=", Eq),
        ("<", Lt),
        (">", Gt),
        ("(", LParen),
        (")", RParen),
        ("[", LBracket),
        ("]", RBracket),
        (",", Comma),
        (";", Semicolon),
        (".", Dot),
    ]
});

pub struct Lexer<'input> {
    input: &'input str,
    pos: usize,
    line: u32,
    warnings: Vec<LexWarning>,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        Lexer {
            input,
            pos: 0,
            line: 1,
            warnings: Vec::new(),
        }
    }

    /// Has the lexer reached the end of input?
    pub fn end_of_input(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Warnings recorded so far (illegal characters, integer overflow).
    pub fn warnings(&self) -> &[LexWarning] {
        &self.warnings
    }

    // Skip comments and whitespace, tracking line numbers as we go.
    fn skip_whitespace(&mut self) {
        loop {
            match WHITESPACE.find(&self.input[self.pos..]) {
                Some(m) if !m.as_str().is_empty() => {
                    self.line += m.as_str().matches('\n').count() as u32;
                    self.pos += m.end();
                }
                _ => break,
            }
        }
    }

    /// Get the next token, skipping illegal characters (recorded as
    /// warnings) until a real token or end of input is found.
    pub fn next(&mut self) -> Option<Token<'input>> {
        loop {
            self.skip_whitespace();
            if self.end_of_input() {
                return None;
            }

            let rest = &self.input[self.pos..];
            let line = self.line;

            if let Some(m) = IDENT.find(rest) {
                let text = m.as_str();
                let kind = reserved_word(text).unwrap_or(TokenKind::Ident);
                self.pos += m.end();
                return Some(Token { kind, text, line });
            }

            if let Some(m) = NUMBER.find(rest) {
                let text = m.as_str();
                if text.parse::<i32>().is_err() {
                    self.warnings.push(LexWarning::IntegerOverflow {
                        line,
                        text: text.to_string(),
                    });
                }
                self.pos += m.end();
                return Some(Token {
                    kind: TokenKind::Number,
                    text,
                    line,
                });
            }

            if let Some(&(op, kind)) = OPERATORS.iter().find(|(op, _)| rest.starts_with(op)) {
                self.pos += op.len();
                return Some(Token {
                    kind,
                    text: op,
                    line,
                });
            }

            let ch = rest.chars().next().expect("not at end of input");
            self.warnings.push(LexWarning::IllegalChar { line, ch });
            self.pos += ch.len_utf8();
        }
    }
}

/// Parse the text of a `Number` token into its value, with overflow
/// recorded by the lexer already accounted for (substitutes 0).
pub fn number_value(text: &str) -> i32 {
    text.parse().unwrap_or(0)
}

/// Intern an identifier's text.
pub fn intern(text: &str) -> Id {
    Id::new(text.to_string())
}
