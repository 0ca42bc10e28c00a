//! Tokenizer for formula expressions.

use super::error::FormulaError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AndAnd,
    OrOr,
    Bang,
}

/// A token and the character offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub position: usize,
}

fn syntax(position: usize, message: impl Into<String>) -> FormulaError {
    FormulaError::Syntax {
        position,
        message: message.into(),
    }
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, FormulaError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        // Formulas live on a single binding line; tab is the only control
        // character accepted.
        if c.is_control() && c != '\t' {
            return Err(syntax(start, format!("control character {:?}", c)));
        }
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()))
        {
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
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
            let value = text
                .parse::<f64>()
                .map_err(|_| syntax(start, format!("invalid number '{}'", text)))?;
            tokens.push(Spanned {
                token: Token::Number(value),
                position: start,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Spanned {
                token: Token::Ident(chars[start..i].iter().collect()),
                position: start,
            });
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (token, width) = match (c, next) {
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('<', Some('=')) => (Token::LessEq, 2),
            ('>', Some('=')) => (Token::GreaterEq, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('^', _) => (Token::Caret, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (',', _) => (Token::Comma, 1),
            ('<', _) => (Token::Less, 1),
            ('>', _) => (Token::Greater, 1),
            ('!', _) => (Token::Bang, 1),
            _ => return Err(syntax(start, format!("unexpected character '{}'", c))),
        };
        tokens.push(Spanned {
            token,
            position: start,
        });
        i += width;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_tokenize_arithmetic() {
        assert_eq!(
            kinds("(AAP_EGIPWR+1)/2"),
            vec![
                Token::LParen,
                Token::Ident("AAP_EGIPWR".to_string()),
                Token::Plus,
                Token::Number(1.0),
                Token::RParen,
                Token::Slash,
                Token::Number(2.0),
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(kinds("3.25"), vec![Token::Number(3.25)]);
        assert_eq!(kinds(".5"), vec![Token::Number(0.5)]);
        assert_eq!(kinds("1e3"), vec![Token::Number(1000.0)]);
        assert_eq!(kinds("2E-1"), vec![Token::Number(0.2)]);
    }

    #[test]
    fn test_tokenize_two_char_operators() {
        assert_eq!(
            kinds("a<=b != c && d || !e"),
            vec![
                Token::Ident("a".into()),
                Token::LessEq,
                Token::Ident("b".into()),
                Token::NotEq,
                Token::Ident("c".into()),
                Token::AndAnd,
                Token::Ident("d".into()),
                Token::OrOr,
                Token::Bang,
                Token::Ident("e".into()),
            ]
        );
    }

    #[test]
    fn test_invalid_number() {
        assert!(matches!(
            tokenize("1.2.3"),
            Err(FormulaError::Syntax { position: 0, .. })
        ));
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(
            tokenize("A $ 2").unwrap_err(),
            FormulaError::Syntax {
                position: 2,
                message: "unexpected character '$'".to_string()
            }
        );
    }

    #[test]
    fn test_line_breaks_rejected() {
        assert_eq!(
            tokenize("HSI_HDG\n+ 1").unwrap_err(),
            FormulaError::Syntax {
                position: 7,
                message: "control character '\\n'".to_string()
            }
        );
        assert!(tokenize("A\r+1").is_err());
        assert!(tokenize("A\t+ 1").is_ok());
    }
}
