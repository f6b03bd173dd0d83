use std::fmt;

/// Binary arithmetic operators understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            '%' => Some(Operator::Rem),
            '^' => Some(Operator::Pow),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
            Operator::Rem => '%',
            Operator::Pow => '^',
        }
    }

    /// `*`, `/` and `%`.
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Operator::Mul | Operator::Div | Operator::Rem)
    }

    /// `+` and `-`.
    pub fn is_additive(self) -> bool {
        matches!(self, Operator::Add | Operator::Sub)
    }

    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Sub => left - right,
            Operator::Mul => left * right,
            Operator::Div => left / right,
            Operator::Rem => left % right,
            Operator::Pow => left.powf(right),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Identifier(String),
    Operator(Operator),
    LeftParen,
    RightParen,
    Assign,
}

impl Token {
    /// True for tokens that can stand as an operand: numbers and identifiers.
    pub fn is_operand(&self) -> bool {
        matches!(self, Token::Number(_) | Token::Identifier(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Operator(op) => write!(f, "{op}"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Assign => write!(f, "="),
        }
    }
}

/// Raised when a line cannot be split into tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedInputError {
    /// A character that starts no token kind.
    UnexpectedCharacter {
        character: char,
        /// Zero-based character offset in the line.
        column: usize,
    },
    /// A numeric literal that does not parse, such as a lone `.`.
    InvalidNumber { literal: String, column: usize },
}

impl fmt::Display for MalformedInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter { character, column } => {
                write!(f, "Unknown character '{character}' at column {}", column + 1)
            }
            Self::InvalidNumber { literal, column } => {
                write!(f, "Invalid number '{literal}' at column {}", column + 1)
            }
        }
    }
}

impl std::error::Error for MalformedInputError {}

pub fn tokenize(input: &str) -> Result<Vec<Token>, MalformedInputError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().enumerate().peekable();

    while let Some(&(column, c)) = chars.peek() {
        match c {
            _ if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LeftParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RightParen);
                chars.next();
            }
            '=' => {
                tokens.push(Token::Assign);
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                let mut has_dot = false;

                while let Some(&(_, ch)) = chars.peek() {
                    match ch {
                        '.' if has_dot => break,
                        '.' => {
                            has_dot = true;
                            literal.push(ch);
                            chars.next();
                        }
                        '0'..='9' => {
                            literal.push(ch);
                            chars.next();
                        }
                        _ => break,
                    }
                }

                let value = literal
                    .parse::<f64>()
                    .map_err(|_| MalformedInputError::InvalidNumber { literal, column })?;
                tokens.push(Token::Number(value));
            }
            _ if c.is_alphabetic() => {
                let mut name = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_alphanumeric() {
                        name.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Identifier(name));
            }
            _ => match Operator::from_char(c) {
                Some(op) => {
                    tokens.push(Token::Operator(op));
                    chars.next();
                }
                None => {
                    return Err(MalformedInputError::UnexpectedCharacter { character: c, column });
                }
            },
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Token {
        Token::Identifier(name.to_string())
    }

    #[test]
    fn splits_on_operator_boundaries_without_spaces() {
        let tokens = tokenize("2*(x1+3.5)^2").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number(2.0),
                Token::Operator(Operator::Mul),
                Token::LeftParen,
                ident("x1"),
                Token::Operator(Operator::Add),
                Token::Number(3.5),
                Token::RightParen,
                Token::Operator(Operator::Pow),
                Token::Number(2.0),
            ]
        );
    }

    #[test]
    fn recognizes_assignment() {
        let tokens = tokenize("rate = 7 % 3").unwrap();
        assert_eq!(
            tokens,
            vec![
                ident("rate"),
                Token::Assign,
                Token::Number(7.0),
                Token::Operator(Operator::Rem),
                Token::Number(3.0),
            ]
        );
    }

    #[test]
    fn decimal_forms() {
        assert_eq!(tokenize(".5").unwrap(), vec![Token::Number(0.5)]);
        assert_eq!(tokenize("5.").unwrap(), vec![Token::Number(5.0)]);
        assert_eq!(
            tokenize("1.2.3").unwrap(),
            vec![Token::Number(1.2), Token::Number(0.3)]
        );
    }

    #[test]
    fn whitespace_only_line_is_empty() {
        assert!(tokenize(" \t ").unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_character_with_column() {
        assert_eq!(
            tokenize("2 $ 3"),
            Err(MalformedInputError::UnexpectedCharacter { character: '$', column: 2 })
        );
    }

    #[test]
    fn rejects_lone_dot() {
        assert!(matches!(
            tokenize("1 + ."),
            Err(MalformedInputError::InvalidNumber { column: 4, .. })
        ));
    }

    #[test]
    fn operator_dispatch_covers_every_symbol() {
        for symbol in ['+', '-', '*', '/', '%', '^'] {
            let op = Operator::from_char(symbol).unwrap();
            assert_eq!(op.symbol(), symbol);
        }
        assert_eq!(Operator::from_char('='), None);
        assert_eq!(Operator::Rem.apply(7.0, 3.0), 1.0);
        assert_eq!(Operator::Pow.apply(2.0, 10.0), 1024.0);
    }
}
