use super::*;
use crate::ast::Expr;
use crate::value::Value;

pub(super) fn parse_expr(parser: &mut Parser) -> Result<Expr, ConfigError> {
    let pos = parser.pos();
    match parser.peek() {
        Some(Token::String(_) | Token::Number(_) | Token::Bool(_) | Token::Null) => {
            parse_literal(parser, pos)
        }
        Some(Token::LBracket) => parse_tuple(parser, pos),
        Some(Token::LBrace) => parse_object(parser, pos),
        Some(Token::LParen) => {
            parser.bump()?;
            parser.skip_newlines()?;
            let inner = parse_expr(parser)?;
            parser.skip_newlines()?;
            parser.expect(Token::RParen)?;
            Ok(inner)
        }
        Some(Token::Ident(_)) => parse_traversal_or_call(parser, pos),
        _ => Err(parser.invalid_token("Unexpected token in value position", 210)),
    }
}

fn parse_literal(parser: &mut Parser, pos: Pos) -> Result<Expr, ConfigError> {
    let value = match parser.bump()? {
        Token::String(s) => Value::String(s),
        Token::Number(n) => Value::Number(n),
        Token::Bool(b) => Value::Bool(b),
        _ => Value::Null,
    };
    Ok(Expr::Literal { value, pos })
}

/// Items up to `close`, separated by commas. A trailing comma is allowed and
/// newlines carry no meaning in between.
fn parse_list(parser: &mut Parser, close: Token) -> Result<Vec<Expr>, ConfigError> {
    let mut items = Vec::new();
    loop {
        parser.skip_newlines()?;
        if parser.peek() == Some(&close) {
            break;
        }
        items.push(parse_expr(parser)?);
        parser.skip_newlines()?;
        match parser.peek() {
            Some(Token::Comma) => {
                parser.bump()?;
            }
            Some(tok) if *tok == close => break,
            _ => return Err(parser.invalid_token("Expected ',' or a closing bracket", 211)),
        }
    }
    parser.expect(close)?;
    Ok(items)
}

fn parse_tuple(parser: &mut Parser, pos: Pos) -> Result<Expr, ConfigError> {
    parser.bump()?; // consume [
    let items = parse_list(parser, Token::RBracket)?;
    Ok(Expr::Tuple { items, pos })
}

fn parse_object(parser: &mut Parser, pos: Pos) -> Result<Expr, ConfigError> {
    parser.bump()?; // consume {
    let mut items: Vec<(String, Expr)> = Vec::new();

    loop {
        while let Some(Token::Newline | Token::Comma) = parser.peek() {
            parser.bump()?;
        }
        if let Some(Token::RBrace) = parser.peek() {
            parser.bump()?;
            break;
        }

        let key = match parser.peek() {
            Some(Token::Ident(k) | Token::String(k)) => k.clone(),
            _ => return Err(parser.invalid_token("Expected an object key", 212)),
        };
        parser.bump()?;
        if items.iter().any(|(k, _)| *k == key) {
            return Err(parser.syntax_error(
                format!("Duplicate object key '{}'", key),
                Some("Each key may appear once per object"),
                216,
            ));
        }

        match parser.peek() {
            Some(Token::Equals | Token::Colon) => {
                parser.bump()?;
            }
            _ => return Err(parser.invalid_token("Expected '=' or ':' after object key", 213)),
        }

        let value = parse_expr(parser)?;
        items.push((key, value));

        match parser.peek() {
            Some(Token::Newline | Token::Comma | Token::RBrace) => {}
            _ => return Err(parser.invalid_token("Expected ',' or a newline between object items", 211)),
        }
    }

    Ok(Expr::Object { items, pos })
}

fn parse_traversal_or_call(parser: &mut Parser, pos: Pos) -> Result<Expr, ConfigError> {
    let root = match parser.bump()? {
        Token::Ident(name) => name,
        _ => return Err(parser.syntax_error("Expected identifier", None, 208)),
    };

    if let Some(Token::LParen) = parser.peek() {
        parser.bump()?;
        let args = parse_list(parser, Token::RParen)?;
        return Ok(Expr::Call { name: root, args, pos });
    }

    let mut attrs = Vec::new();
    while let Some(Token::Dot) = parser.peek() {
        parser.bump()?; // consume dot
        match parser.bump()? {
            Token::Ident(name) => attrs.push(name),
            _ => {
                return Err(parser.syntax_error("Expected identifier after '.'", None, 210));
            }
        }
    }

    Ok(Expr::Traversal { root, attrs, pos })
}
