use super::*;
use crate::ast::{Attribute, Block};

pub(super) fn parse_file(parser: &mut Parser) -> Result<Body, ConfigError> {
    let pos = parser.pos();
    let body = parse_body_until(parser, &Token::Eof, pos)?;
    parser.expect(Token::Eof)?;
    Ok(body)
}

/// Attributes and blocks up to (not including) `end`.
fn parse_body_until(parser: &mut Parser, end: &Token, pos: Pos) -> Result<Body, ConfigError> {
    let mut body = Body { pos, ..Body::default() };

    loop {
        parser.skip_newlines()?;
        match parser.peek() {
            Some(tok) if tok == end => break,
            Some(Token::Ident(_)) => parse_item(parser, end, &mut body)?,
            Some(Token::Eof) => {
                return Err(ConfigError::UnexpectedEof {
                    message: "Block body is not closed".into(),
                    file: body.pos.file.clone(),
                    line: body.pos.line,
                    column: body.pos.column,
                    hint: Some("Add the missing '}'".into()),
                    code: Some(206),
                });
            }
            _ => return Err(parser.invalid_token("Expected an attribute or block", 205)),
        }
    }

    Ok(body)
}

fn parse_item(parser: &mut Parser, end: &Token, body: &mut Body) -> Result<(), ConfigError> {
    let pos = parser.pos();
    let Token::Ident(name) = parser.bump()? else {
        return Err(parser.syntax_error("Expected identifier", None, 208));
    };

    match parser.peek() {
        Some(Token::Equals) => {
            parser.bump()?;
            let expr = super::expression::parse_expr(parser)?;
            if let Some(existing) = body.attributes.get(&name) {
                return Err(ConfigError::SyntaxError {
                    message: format!("Attribute '{}' redefined", name),
                    file: pos.file.clone(),
                    line: pos.line,
                    column: pos.column,
                    hint: Some(format!("First defined at {}", existing.pos)),
                    code: Some(215),
                });
            }
            body.attributes.insert(name.clone(), Attribute { name, expr, pos });
        }
        Some(Token::String(_) | Token::Ident(_) | Token::LBrace) => {
            let block = parse_block(parser, name, pos)?;
            body.blocks.push(block);
        }
        _ => return Err(parser.invalid_token("Expected '=' or a block", 207)),
    }

    end_of_item(parser, end)
}

fn parse_block(parser: &mut Parser, kind: String, pos: Pos) -> Result<Block, ConfigError> {
    let mut labels = Vec::new();
    while let Some(Token::String(_) | Token::Ident(_)) = parser.peek() {
        if let Token::String(label) | Token::Ident(label) = parser.bump()? {
            labels.push(label);
        }
    }

    let body_pos = parser.pos();
    parser.expect(Token::LBrace)?;
    let body = parse_body_until(parser, &Token::RBrace, body_pos)?;
    parser.expect(Token::RBrace)?;

    Ok(Block { kind, labels, body, pos })
}

// An item ends at a newline, or directly before the closing token of a one-line block.
fn end_of_item(parser: &mut Parser, end: &Token) -> Result<(), ConfigError> {
    match parser.peek() {
        Some(Token::Newline) => {
            parser.bump()?;
            Ok(())
        }
        Some(tok) if tok == end || *tok == Token::Eof => Ok(()),
        _ => Err(parser.invalid_token("Expected a newline after the attribute or block", 209)),
    }
}
