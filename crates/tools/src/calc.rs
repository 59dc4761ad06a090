//! Restricted arithmetic evaluator
//!
//! Accepts digits, `+ - * / ( ) . %` and spaces. `//` is floor division,
//! `%` is modulo and `**` is exponentiation. No names, no calls.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

const ALLOWED_CHARS: &str = "0123456789+-*/()%. ";

/// Deepest nesting of parentheses, signs and exponents the evaluator accepts
pub const MAX_DEPTH: usize = 100;

fn percent_of_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(\d+(?:\.\d+)?)\s*%\s*of\s*(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)",
        )
        .expect("percentage pattern is valid")
    })
}

/// Evaluation failures, rendered to text by [`calculate`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("invalid syntax")]
    Syntax,

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric result out of range")]
    Overflow,

    #[error("math domain error")]
    Domain,

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
}

/// Integer or float result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

/// Floats always show a fractional part (`20.0`), otherwise shortest form
fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

/// `4410.0` -> `4,410.00`
fn format_grouped(x: f64) -> String {
    let fixed = format!("{:.2}", x.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if x < 0.0 && fixed.trim_matches(|c| c == '0' || c == '.') != "" {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Evaluate `expression` and describe the result or the problem
pub fn calculate(expression: &str) -> String {
    if expression.trim().is_empty() {
        return "Error: Empty expression provided. Please provide a mathematical expression to calculate."
            .to_string();
    }

    if let Some(text) = percent_of(expression) {
        return text;
    }

    if !expression.chars().all(|c| ALLOWED_CHARS.contains(c)) {
        return format!(
            "Error: Invalid characters in expression. Only numbers and operators (+, -, *, /, %) are allowed.\n\n\
             You provided: '{}'\nTry something like: '2 + 2' or '10 * 5'",
            expression
        );
    }

    if expression.matches('(').count() != expression.matches(')').count() {
        return "Error: Unmatched parentheses in expression. Please check your brackets."
            .to_string();
    }

    match evaluate(expression) {
        Ok(result) => format!("Calculation: {} = {}", expression, result),
        Err(CalcError::DivisionByZero) => format!(
            "Error: Division by zero is not allowed.\n\n\
             You tried to calculate: '{}'\n\
             Division by zero is mathematically undefined. Please use a non-zero divisor.",
            expression
        ),
        Err(CalcError::Syntax) => format!(
            "Error: Invalid mathematical expression syntax.\n\n\
             You provided: '{}'\n\
             This doesn't follow proper math syntax. Try examples like:\n  \
             - '2 + 2'\n  - '10 * 5'\n  - '18% of 24500'\n  - '(5 + 3) * 2'",
            expression
        ),
        Err(CalcError::TooDeep(limit)) => format!(
            "Error: Expression is nested too deeply (more than {} levels).\n\n\
             Please simplify the expression and try again.",
            limit
        ),
        Err(err) => format!(
            "Error calculating '{}': {}\n\nPlease check the expression format and try again.",
            expression, err
        ),
    }
}

/// Handle the "N% of M" phrasing
fn percent_of(expression: &str) -> Option<String> {
    let lowered = expression.to_lowercase();
    let caps = percent_of_pattern().captures(&lowered)?;
    let percentage: f64 = caps[1].parse().ok()?;
    let number: f64 = caps[2].replace(',', "").parse().ok()?;

    let rate = percentage / 100.0;
    let result = rate * number;

    Some(format!(
        "Calculation: {p}% of {n} = {r}\n\nSteps:\n\
         1. Convert {p}% to decimal: {p}/100 = {rate}\n\
         2. Multiply: {rate} × {n} = {r}",
        p = format_float(percentage),
        n = format_float(number),
        r = format_grouped(result),
        rate = format_float(rate),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
}

impl Token {
    fn is_sign(&self) -> bool {
        matches!(self, Token::Plus | Token::Minus)
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' => {
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_number(&literal)?));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::DoubleStar);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            _ => return Err(CalcError::Syntax),
        }
    }

    // "2++3", "5 - -1": stacked signs are treated as a typo
    if tokens.windows(2).any(|w| w[0].is_sign() && w[1].is_sign()) {
        return Err(CalcError::Syntax);
    }

    Ok(tokens)
}

fn parse_number(literal: &str) -> Result<Number, CalcError> {
    if literal == "." || literal.matches('.').count() > 1 {
        return Err(CalcError::Syntax);
    }
    if literal.contains('.') {
        literal
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| CalcError::Syntax)
    } else {
        literal
            .parse::<i64>()
            .map(Number::Int)
            .map_err(|_| CalcError::Overflow)
    }
}

/// Evaluate a restricted arithmetic expression
pub fn evaluate(expression: &str) -> Result<Number, CalcError> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(CalcError::Syntax);
    }
    Ok(value)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Number, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = apply(op, value, rhs)?;
        }
        Ok(value)
    }

    // term := factor (('*' | '/' | '//' | '%') factor)*
    fn term(&mut self) -> Result<Number, CalcError> {
        let mut value = self.factor()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::DoubleSlash | Token::Percent)) =
            self.peek()
        {
            self.pos += 1;
            let rhs = self.factor()?;
            value = apply(op, value, rhs)?;
        }
        Ok(value)
    }

    // Every nesting path (parens, signs, exponents) passes through here
    fn factor(&mut self) -> Result<Number, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    // factor := ('+' | '-') factor | power
    fn signed(&mut self) -> Result<Number, CalcError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.factor()
            }
            Some(Token::Minus) => {
                self.pos += 1;
                negate(self.factor()?)
            }
            _ => self.power(),
        }
    }

    // power := atom ('**' factor)?
    fn power(&mut self) -> Result<Number, CalcError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::DoubleStar) {
            self.pos += 1;
            let exponent = self.factor()?;
            return apply(Token::DoubleStar, base, exponent);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number, CalcError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(CalcError::Syntax),
                }
            }
            _ => Err(CalcError::Syntax),
        }
    }
}

fn negate(n: Number) -> Result<Number, CalcError> {
    match n {
        Number::Int(i) => i.checked_neg().map(Number::Int).ok_or(CalcError::Overflow),
        Number::Float(f) => Ok(Number::Float(-f)),
    }
}

fn checked_float(x: f64) -> Result<Number, CalcError> {
    if x.is_nan() {
        Err(CalcError::Domain)
    } else if x.is_infinite() {
        Err(CalcError::Overflow)
    } else {
        Ok(Number::Float(x))
    }
}

fn apply(op: Token, lhs: Number, rhs: Number) -> Result<Number, CalcError> {
    use Number::Int;

    match op {
        Token::Plus | Token::Minus | Token::Star => {
            if let (Int(a), Int(b)) = (lhs, rhs) {
                let result = match op {
                    Token::Plus => a.checked_add(b),
                    Token::Minus => a.checked_sub(b),
                    _ => a.checked_mul(b),
                };
                return result.map(Int).ok_or(CalcError::Overflow);
            }
            let (a, b) = (lhs.as_f64(), rhs.as_f64());
            checked_float(match op {
                Token::Plus => a + b,
                Token::Minus => a - b,
                _ => a * b,
            })
        }
        Token::Slash => {
            if rhs.is_zero() {
                return Err(CalcError::DivisionByZero);
            }
            checked_float(lhs.as_f64() / rhs.as_f64())
        }
        Token::DoubleSlash => {
            if rhs.is_zero() {
                return Err(CalcError::DivisionByZero);
            }
            match (lhs, rhs) {
                (Int(a), Int(b)) => {
                    let q = a.checked_div(b).ok_or(CalcError::Overflow)?;
                    if a % b != 0 && ((a < 0) != (b < 0)) {
                        Ok(Int(q - 1))
                    } else {
                        Ok(Int(q))
                    }
                }
                _ => checked_float((lhs.as_f64() / rhs.as_f64()).floor()),
            }
        }
        Token::Percent => {
            if rhs.is_zero() {
                return Err(CalcError::DivisionByZero);
            }
            // Result takes the sign of the divisor
            match (lhs, rhs) {
                (Int(a), Int(b)) => {
                    let r = a.checked_rem(b).ok_or(CalcError::Overflow)?;
                    if r != 0 && ((r < 0) != (b < 0)) {
                        Ok(Int(r + b))
                    } else {
                        Ok(Int(r))
                    }
                }
                _ => {
                    let (a, b) = (lhs.as_f64(), rhs.as_f64());
                    let r = a % b;
                    if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                        checked_float(r + b)
                    } else {
                        checked_float(r)
                    }
                }
            }
        }
        Token::DoubleStar => match (lhs, rhs) {
            (Int(a), Int(b)) if b >= 0 => {
                let exp = u32::try_from(b).map_err(|_| CalcError::Overflow)?;
                a.checked_pow(exp).map(Int).ok_or(CalcError::Overflow)
            }
            _ => {
                if lhs.is_zero() && rhs.as_f64() < 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                checked_float(lhs.as_f64().powf(rhs.as_f64()))
            }
        },
        _ => Err(CalcError::Syntax),
    }
}
