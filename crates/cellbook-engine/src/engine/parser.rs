//! Formula tokenizer and parser.
//!
//! Turns a formula body (the text after `=`) into an [`Expr`] tree. The
//! grammar is deliberately small: numbers, cell references, ranges, function
//! calls, unary `+`/`-`, binary `+ - * / ^` and parentheses. Reference-shaped
//! words that do not resolve inside the sheet, and bare words that are not
//! function calls, become [`Expr::Literal`] text.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary ('^' unary)?
//! primary := NUMBER | REF | RANGE | LITERAL | NAME '(' args ')' | '(' expr ')'
//! args    := (expr (',' expr)*)?
//! ```

use thiserror::Error;

/// Deepest nesting of parentheses and prefix operators a formula may use.
pub const MAX_NESTING: usize = 100;
/// Most tokens a formula may contain.
pub const MAX_TOKENS: usize = 2048;

use super::cell_ref::{CellRange, CellRef, GridBounds};
use super::deps::{Reference, parse_reference};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Ref(CellRef),
    Range(CellRange),
    /// Unresolved reference or bare word, carried as text.
    Literal(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("empty formula")]
    Empty,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("formula nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("formula has more than {0} tokens")]
    TooLong(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ref(CellRef),
    Range(CellRange),
    Literal(String),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

/// Parse a formula body against the bounds of the sheet it lives on.
pub fn parse_formula(body: &str, bounds: GridBounds) -> Result<Expr, FormulaError> {
    let tokens = tokenize(body, bounds)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    if tokens.len() > MAX_TOKENS {
        return Err(FormulaError::TooLong(MAX_TOKENS));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(FormulaError::UnexpectedToken(format!("{:?}", token))),
    }
}

fn tokenize(input: &str, bounds: GridBounds) -> Result<Vec<Token>, FormulaError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => push(&mut tokens, &mut i, Token::Plus),
            '-' => push(&mut tokens, &mut i, Token::Minus),
            '*' => push(&mut tokens, &mut i, Token::Star),
            '/' => push(&mut tokens, &mut i, Token::Slash),
            '^' => push(&mut tokens, &mut i, Token::Caret),
            '(' => push(&mut tokens, &mut i, Token::LParen),
            ')' => push(&mut tokens, &mut i, Token::RParen),
            ',' => push(&mut tokens, &mut i, Token::Comma),
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent: e7, e+7, e-7
                if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| FormulaError::InvalidNumber(text.clone()))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = read_word(&chars, &mut i);
                // A1:B2 is one token.
                if i + 1 < chars.len() && chars[i] == ':' && chars[i + 1].is_ascii_alphabetic() {
                    i += 1;
                    let end = read_word(&chars, &mut i);
                    word = format!("{}:{}", word, end);
                }
                tokens.push(classify_word(word, next_non_space(&chars, i), bounds));
            }
            other => return Err(FormulaError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

fn push(tokens: &mut Vec<Token>, i: &mut usize, token: Token) {
    tokens.push(token);
    *i += 1;
}

fn read_word(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    while *i < chars.len() && chars[*i].is_ascii_alphanumeric() {
        *i += 1;
    }
    chars[start..*i].iter().collect()
}

fn next_non_space(chars: &[char], mut i: usize) -> Option<char> {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    chars.get(i).copied()
}

fn classify_word(word: String, next: Option<char>, bounds: GridBounds) -> Token {
    match parse_reference(&word, bounds) {
        Some(Reference::Cell(cell)) => Token::Ref(cell),
        Some(Reference::Range(range)) => Token::Range(range),
        None if next == Some('(') && word.chars().all(|c| c.is_ascii_alphabetic()) => {
            Token::Name(word.to_ascii_uppercase())
        }
        None => Token::Literal(word),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(FormulaError::UnexpectedToken(format!("{:?}", token))),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    /// Every level of nesting passes through here, so this is where depth
    /// is bounded.
    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if self.depth >= MAX_NESTING {
            return Err(FormulaError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = self.unary_inner();
        self.depth -= 1;
        result
    }

    fn unary_inner(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ref(cell)) => Ok(Expr::Ref(cell)),
            Some(Token::Range(range)) => Ok(Expr::Range(range)),
            Some(Token::Literal(text)) => Ok(Expr::Literal(text)),
            Some(Token::Name(name)) => {
                self.expect(Token::LParen)?;
                let mut args = Vec::new();
                if self.peek() == Some(&Token::RParen) {
                    self.pos += 1;
                    return Ok(Expr::Call { name, args });
                }
                loop {
                    args.push(self.expr()?);
                    match self.next() {
                        Some(Token::Comma) => continue,
                        Some(Token::RParen) => break,
                        Some(token) => {
                            return Err(FormulaError::UnexpectedToken(format!("{:?}", token)));
                        }
                        None => return Err(FormulaError::UnexpectedEnd),
                    }
                }
                Ok(Expr::Call { name, args })
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(token) => Err(FormulaError::UnexpectedToken(format!("{:?}", token))),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Expr, FormulaError> {
        parse_formula(body, GridBounds::new(10, 40))
    }

    fn cell(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            binary(
                BinaryOp::Add,
                Expr::Number(1.0),
                binary(BinaryOp::Mul, Expr::Number(2.0), Expr::Number(3.0))
            )
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse("2^3^2").unwrap();
        assert_eq!(
            expr,
            binary(
                BinaryOp::Pow,
                Expr::Number(2.0),
                binary(BinaryOp::Pow, Expr::Number(3.0), Expr::Number(2.0))
            )
        );
    }

    #[test]
    fn test_function_call_with_range_and_refs() {
        let expr = parse("sum(A1:A3, B2, 4)").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                name: "SUM".into(),
                args: vec![
                    Expr::Range(CellRange::from_corners(cell("A1"), cell("A3"))),
                    Expr::Ref(cell("B2")),
                    Expr::Number(4.0),
                ],
            }
        );
    }

    #[test]
    fn test_unresolved_references_are_literals() {
        assert_eq!(parse("Z9").unwrap(), Expr::Literal("Z9".into()));
        assert_eq!(parse("A1:Z9").unwrap(), Expr::Literal("A1:Z9".into()));
        assert_eq!(parse("total").unwrap(), Expr::Literal("total".into()));
    }

    #[test]
    fn test_exponent_numbers() {
        assert_eq!(parse("1.5e2").unwrap(), Expr::Number(150.0));
        assert_eq!(parse("2E-1").unwrap(), Expr::Number(0.2));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse(""), Err(FormulaError::Empty));
        assert_eq!(parse("   "), Err(FormulaError::Empty));
        assert_eq!(parse("1 +"), Err(FormulaError::UnexpectedEnd));
        assert_eq!(parse("(1"), Err(FormulaError::UnexpectedEnd));
        assert!(matches!(parse("1 2"), Err(FormulaError::UnexpectedToken(_))));
        assert_eq!(parse("1 % 2"), Err(FormulaError::UnexpectedChar('%')));
        assert!(matches!(parse("1..2"), Err(FormulaError::InvalidNumber(_))));
    }

    #[test]
    fn test_empty_call() {
        assert_eq!(
            parse("SUM()").unwrap(),
            Expr::Call {
                name: "SUM".into(),
                args: vec![]
            }
        );
    }

    #[test]
    fn test_nesting_limit() {
        let ok = format!("{}1{}", "(".repeat(MAX_NESTING - 1), ")".repeat(MAX_NESTING - 1));
        assert_eq!(parse(&ok), Ok(Expr::Number(1.0)));

        let deep = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(parse(&deep), Err(FormulaError::TooDeep(MAX_NESTING)));
        assert_eq!(
            parse(&format!("{}1", "-".repeat(5000))),
            Err(FormulaError::TooLong(MAX_TOKENS))
        );
        assert_eq!(
            parse(&format!("{}1", "-".repeat(MAX_NESTING))),
            Err(FormulaError::TooDeep(MAX_NESTING))
        );
    }

    #[test]
    fn test_token_limit() {
        let long = vec!["1"; MAX_TOKENS / 2 + 1].join("+");
        assert_eq!(parse(&long), Err(FormulaError::TooLong(MAX_TOKENS)));
        let fits = vec!["1"; MAX_TOKENS / 2].join("+");
        assert!(parse(&fits).is_ok());
    }
}
