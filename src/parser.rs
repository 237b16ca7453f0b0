//! Parser for the textual surface syntax
//!
//! Statements are terminated by `.` (facts and rules), `?` (queries) or `~`
//! (deletions):
//!
//! ```text
//! parent(alice, bob).
//! ancestor(X, Y) :- parent(X, Y).
//! ancestor(alice, Who)?
//! parent(alice, X) ~
//! ```
//!
//! The tokenizer recognizes barewords, single- or double-quoted strings,
//! numbers, `%` line comments, and the operator characters of the built-in
//! predicates. All parse failures report the line they occurred on.

use std::str::Chars;

use crate::error::{DatalogError, Result};
use crate::statement::Statement;
use crate::term::{format_number, parse_number, Literal, Term};

/// Parse a whole program into its statements.
pub fn parse_program(source: &str) -> Result<Vec<Statement>> {
    let mut parser = Parser::new(source)?;
    let mut statements = Vec::new();
    while let Some(statement) = parser.parse_statement()? {
        statements.push(statement);
    }
    Ok(statements)
}

/// Parse exactly one statement.
pub fn parse_statement(source: &str) -> Result<Statement> {
    let mut parser = Parser::new(source)?;
    let statement = parser
        .parse_statement()?
        .ok_or_else(|| parser.error("expected a statement"))?;
    if parser.current.is_some() {
        return Err(parser.error("unexpected input after statement"));
    }
    Ok(statement)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Bareword identifier, `not` included
    Ident(String),
    /// Quoted string, stored with the internal `"` marker
    Quoted(String),
    /// Number, already normalized to its printed form
    Number(String),
    /// One of `( ) , . ? ~`
    Punct(char),
    /// The rule separator `:-`
    Arrow,
    /// A built-in operator: `= != <> < <= > >=`
    Operator(String),
}

/// Character source with two-character lookahead and line tracking.
struct Scanner<'a> {
    chars: Chars<'a>,
    buf0: Option<char>,
    buf1: Option<char>,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Scanner {
            chars: input.chars(),
            buf0: None,
            buf1: None,
            line: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        if self.buf0.is_none() {
            self.buf0 = self.chars.next();
        }
        self.buf0
    }

    fn peek2(&mut self) -> Option<char> {
        self.peek();
        if self.buf0.is_some() && self.buf1.is_none() {
            self.buf1 = self.chars.next();
        }
        self.buf1
    }

    fn advance(&mut self) -> Option<char> {
        self.peek();
        let out = self.buf0.take();
        self.buf0 = self.buf1.take();
        if out == Some('\n') {
            self.line += 1;
        }
        out
    }
}

struct Tokenizer<'a> {
    scanner: Scanner<'a>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
        }
    }

    fn error(&self, message: impl Into<String>) -> DatalogError {
        DatalogError::Parse {
            line: self.scanner.line,
            message: message.into(),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.scanner.peek().is_some_and(char::is_whitespace) {
                self.scanner.advance();
            }
            if self.scanner.peek() == Some('%') {
                while let Some(c) = self.scanner.advance() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }
            break;
        }
    }

    /// Produce the next token and the line it starts on.
    fn next_token(&mut self) -> Result<Option<(Token, usize)>> {
        self.skip_whitespace_and_comments();
        let line = self.scanner.line;
        let Some(c) = self.scanner.advance() else {
            return Ok(None);
        };

        let token = match c {
            '(' | ')' | ',' | '.' | '?' | '~' => Token::Punct(c),
            ':' => {
                if self.scanner.peek() == Some('-') {
                    self.scanner.advance();
                    Token::Arrow
                } else {
                    return Err(self.error("expected '-' after ':'"));
                }
            }
            '=' => Token::Operator("=".to_string()),
            '!' => {
                if self.scanner.peek() == Some('=') {
                    self.scanner.advance();
                    Token::Operator("!=".to_string())
                } else {
                    return Err(self.error("expected '=' after '!'"));
                }
            }
            '<' => match self.scanner.peek() {
                Some('>') => {
                    self.scanner.advance();
                    Token::Operator("<>".to_string())
                }
                Some('=') => {
                    self.scanner.advance();
                    Token::Operator("<=".to_string())
                }
                _ => Token::Operator("<".to_string()),
            },
            '>' => {
                if self.scanner.peek() == Some('=') {
                    self.scanner.advance();
                    Token::Operator(">=".to_string())
                } else {
                    Token::Operator(">".to_string())
                }
            }
            '"' | '\'' => self.quoted_string(c)?,
            '+' | '-' => {
                if self.scanner.peek().is_some_and(|n| n.is_ascii_digit()) {
                    self.number(c)?
                } else {
                    return Err(self.error(format!("unexpected character '{c}'")));
                }
            }
            d if d.is_ascii_digit() => self.number(d)?,
            w if w.is_alphabetic() || w == '_' => {
                let mut word = String::from(w);
                while self
                    .scanner
                    .peek()
                    .is_some_and(|n| n.is_alphanumeric() || n == '_')
                {
                    word.push(self.scanner.advance().unwrap());
                }
                Token::Ident(word)
            }
            other => return Err(self.error(format!("unexpected character '{other}'"))),
        };
        Ok(Some((token, line)))
    }

    fn quoted_string(&mut self, quote: char) -> Result<Token> {
        let mut content = String::from('"');
        loop {
            match self.scanner.advance() {
                Some(c) if c == quote => break,
                Some(c) => content.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
        Ok(Token::Quoted(content))
    }

    fn number(&mut self, first: char) -> Result<Token> {
        let mut text = String::from(first);
        while self.scanner.peek().is_some_and(|n| n.is_ascii_digit()) {
            text.push(self.scanner.advance().unwrap());
        }
        // A '.' is only a fraction when a digit follows; otherwise it
        // terminates the statement.
        if self.scanner.peek() == Some('.') && self.scanner.peek2().is_some_and(|n| n.is_ascii_digit()) {
            text.push(self.scanner.advance().unwrap());
            while self.scanner.peek().is_some_and(|n| n.is_ascii_digit()) {
                text.push(self.scanner.advance().unwrap());
            }
        }
        if matches!(self.scanner.peek(), Some('e' | 'E')) {
            let exponent_follows = match self.scanner.peek2() {
                Some(n) if n.is_ascii_digit() => true,
                Some('+' | '-') => true,
                _ => false,
            };
            if exponent_follows {
                text.push(self.scanner.advance().unwrap());
                if matches!(self.scanner.peek(), Some('+' | '-')) {
                    text.push(self.scanner.advance().unwrap());
                }
                if !self.scanner.peek().is_some_and(|n| n.is_ascii_digit()) {
                    return Err(self.error("malformed number exponent"));
                }
                while self.scanner.peek().is_some_and(|n| n.is_ascii_digit()) {
                    text.push(self.scanner.advance().unwrap());
                }
            }
        }
        let value = parse_number(&text)
            .ok_or_else(|| self.error(format!("malformed number '{text}'")))?;
        Ok(Token::Number(format_number(value)))
    }
}

/// Recursive-descent parser with one token of lookahead.
struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    current: Option<Token>,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self> {
        let mut parser = Parser {
            tokenizer: Tokenizer::new(input),
            current: None,
            line: 1,
        };
        parser.advance()?;
        Ok(parser)
    }

    fn advance(&mut self) -> Result<()> {
        match self.tokenizer.next_token()? {
            Some((token, line)) => {
                self.current = Some(token);
                self.line = line;
            }
            None => {
                self.current = None;
                self.line = self.tokenizer.scanner.line;
            }
        }
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> DatalogError {
        DatalogError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<()> {
        if self.current == Some(Token::Punct(c)) {
            self.advance()
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    /// Parse one statement, or `None` at end of input.
    fn parse_statement(&mut self) -> Result<Option<Statement>> {
        if self.current.is_none() {
            return Ok(None);
        }
        let head = self.literal()?;
        let statement = match self.current {
            Some(Token::Arrow) => {
                self.advance()?;
                let mut body = vec![self.literal()?];
                while self.current == Some(Token::Punct(',')) {
                    self.advance()?;
                    body.push(self.literal()?);
                }
                self.expect_punct('.')?;
                Statement::InsertRule(crate::term::Rule::new(head, body))
            }
            Some(Token::Punct('.')) => {
                self.advance()?;
                Statement::InsertFact(head)
            }
            Some(Token::Punct('?')) => {
                self.advance()?;
                Statement::Query(vec![head])
            }
            Some(Token::Punct('~')) => {
                self.advance()?;
                Statement::Delete(vec![head])
            }
            Some(Token::Punct(',')) => {
                let mut goals = vec![head];
                while self.current == Some(Token::Punct(',')) {
                    self.advance()?;
                    goals.push(self.literal()?);
                }
                match self.current {
                    Some(Token::Punct('?')) => {
                        self.advance()?;
                        Statement::Query(goals)
                    }
                    Some(Token::Punct('~')) => {
                        self.advance()?;
                        Statement::Delete(goals)
                    }
                    _ => return Err(self.error("expected '?' or '~' after goals")),
                }
            }
            _ => return Err(self.error("expected ':-', '.', ',', '?' or '~'")),
        };
        Ok(Some(statement))
    }

    /// `[not] base ( "(" term ("," term)* ")" | operator term | ε )`
    fn literal(&mut self) -> Result<Literal> {
        let negated = if self.current == Some(Token::Ident("not".to_string())) {
            self.advance()?;
            true
        } else {
            false
        };

        let base = match self.current.take() {
            Some(token @ (Token::Ident(_) | Token::Quoted(_) | Token::Number(_))) => token,
            other => {
                self.current = other;
                return Err(self.error("expected a predicate or term"));
            }
        };
        self.advance()?;

        match self.current.clone() {
            Some(Token::Punct('(')) => {
                let predicate = match base {
                    Token::Ident(name) | Token::Quoted(name) | Token::Number(name) => name,
                    _ => unreachable!(),
                };
                self.advance()?;
                let mut terms = vec![self.term()?];
                while self.current == Some(Token::Punct(',')) {
                    self.advance()?;
                    terms.push(self.term()?);
                }
                self.expect_punct(')')?;
                Ok(Literal::from_terms(predicate, terms, negated))
            }
            Some(Token::Operator(op)) => {
                self.advance()?;
                let left = base_term(base);
                let right = self.term()?;
                Ok(Literal::from_terms(op, vec![left, right], negated))
            }
            _ => {
                let predicate = match base {
                    Token::Ident(name) | Token::Quoted(name) | Token::Number(name) => name,
                    _ => unreachable!(),
                };
                Ok(Literal::from_terms(predicate, Vec::new(), negated))
            }
        }
    }

    fn term(&mut self) -> Result<Term> {
        let term = match self.current.take() {
            Some(token @ (Token::Ident(_) | Token::Quoted(_) | Token::Number(_))) => {
                base_term(token)
            }
            other => {
                self.current = other;
                return Err(self.error("expected a term"));
            }
        };
        self.advance()?;
        Ok(term)
    }
}

fn base_term(token: Token) -> Term {
    match token {
        Token::Ident(name) => Term::from_text(&name),
        // Quoted strings already carry the marker; numbers are plain symbols
        Token::Quoted(text) | Token::Number(text) => Term::Symbol(text),
        _ => unreachable!("base tokens are filtered by the caller"),
    }
}
