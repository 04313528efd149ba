use super::*;
use super::scanner::{bump, peek_second, skip_whitespace_and_comments};

pub(super) fn next_token(lexer: &mut Lexer) -> Result<Token, ConfigError> {
    skip_whitespace_and_comments(lexer)?;

    lexer.token_line = lexer.line;
    lexer.token_column = lexer.column + 1;

    match lexer.peek {
        Some('\n') => tokenize_symbol(lexer, Token::Newline),
        Some('{') => tokenize_symbol(lexer, Token::LBrace),
        Some('}') => tokenize_symbol(lexer, Token::RBrace),
        Some('[') => tokenize_symbol(lexer, Token::LBracket),
        Some(']') => tokenize_symbol(lexer, Token::RBracket),
        Some('(') => tokenize_symbol(lexer, Token::LParen),
        Some(')') => tokenize_symbol(lexer, Token::RParen),
        Some('=') => tokenize_symbol(lexer, Token::Equals),
        Some(':') => tokenize_symbol(lexer, Token::Colon),
        Some(',') => tokenize_symbol(lexer, Token::Comma),
        Some('.') => tokenize_symbol(lexer, Token::Dot),
        Some('"') => tokenize_string(lexer),
        Some('-') if peek_second(lexer).is_some_and(|c| c.is_ascii_digit()) => tokenize_number(lexer),
        Some(c) if c.is_ascii_digit() => tokenize_number(lexer),
        Some(c) if c.is_alphabetic() || c == '_' => tokenize_identifier_or_keyword(lexer),
        Some(ch) => tokenize_unexpected_char(lexer, ch),
        None => Ok(Token::Eof),
    }
}

fn tokenize_symbol(lexer: &mut Lexer, token: Token) -> Result<Token, ConfigError> {
    bump(lexer);
    Ok(token)
}

fn unclosed(lexer: &Lexer, hint: &str) -> ConfigError {
    ConfigError::UnclosedString {
        quote: '"',
        file: lexer.file.clone(),
        line: lexer.token_line,
        column: lexer.token_column,
        hint: Some(hint.into()),
        code: Some(103),
    }
}

fn tokenize_string(lexer: &mut Lexer) -> Result<Token, ConfigError> {
    bump(lexer); // opening quote
    let mut content = String::new();

    loop {
        match lexer.peek {
            None | Some('\n') => return Err(unclosed(lexer, "String literal not closed")),
            Some('"') => {
                bump(lexer);
                break;
            }
            Some('\\') => {
                bump(lexer);
                let Some(next_ch) = bump(lexer) else {
                    return Err(unclosed(lexer, "Trailing backslash in string"));
                };
                let escaped = match next_ch {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '\\' => '\\',
                    '"' => '"',
                    other => other,
                };
                content.push(escaped);
            }
            Some(ch) => {
                content.push(ch);
                bump(lexer);
            }
        }
    }

    Ok(Token::String(content))
}

fn tokenize_number(lexer: &mut Lexer) -> Result<Token, ConfigError> {
    let mut num = String::new();
    if lexer.peek == Some('-') {
        num.push('-');
        bump(lexer);
    }

    while let Some(ch) = lexer.peek {
        let fraction = ch == '.' && peek_second(lexer).is_some_and(|c| c.is_ascii_digit());
        if ch.is_ascii_digit() || fraction {
            num.push(ch);
            bump(lexer);
        } else {
            break;
        }
    }

    num.parse::<f64>()
        .map(Token::Number)
        .map_err(|_| ConfigError::SyntaxError {
            message: format!("Invalid number '{}'", num),
            file: lexer.file.clone(),
            line: lexer.token_line,
            column: lexer.token_column,
            hint: None,
            code: Some(102),
        })
}

fn tokenize_identifier_or_keyword(lexer: &mut Lexer) -> Result<Token, ConfigError> {
    let mut ident = String::new();

    while let Some(ch) = lexer.peek {
        if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            ident.push(ch);
            bump(lexer);
        } else {
            break;
        }
    }

    let token = match ident.as_str() {
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        "null" => Token::Null,
        _ => Token::Ident(ident),
    };

    Ok(token)
}

fn tokenize_unexpected_char(lexer: &mut Lexer, ch: char) -> Result<Token, ConfigError> {
    bump(lexer);
    Err(ConfigError::UnexpectedCharacter {
        character: ch,
        file: lexer.file.clone(),
        line: lexer.token_line,
        column: lexer.token_column,
        hint: Some("Unexpected character in input".into()),
        code: Some(104),
    })
}
