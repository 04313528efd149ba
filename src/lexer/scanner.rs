use super::*;

/// Advance the character iterator and update line/column tracking
pub(super) fn bump(lexer: &mut Lexer) -> Option<char> {
    let curr = lexer.peek;
    if let Some(c) = curr {
        if c == '\n' {
            lexer.line += 1;
            lexer.column = 0;
        } else {
            lexer.column += 1;
        }
    }
    lexer.peek = lexer.input.next();
    curr
}

/// Character after the current one, without consuming anything
pub(super) fn peek_second(lexer: &Lexer) -> Option<char> {
    lexer.input.clone().next()
}

/// Skip blanks and comments. Newlines are left for the tokenizer, except the
/// ones inside `/* */` comments.
pub(super) fn skip_whitespace_and_comments(lexer: &mut Lexer) -> Result<(), ConfigError> {
    while let Some(c) = lexer.peek {
        match c {
            ' ' | '\t' | '\r' => {
                bump(lexer);
            }
            '#' => skip_line_comment(lexer),
            '/' if peek_second(lexer) == Some('/') => skip_line_comment(lexer),
            '/' if peek_second(lexer) == Some('*') => skip_block_comment(lexer)?,
            _ => break,
        }
    }
    Ok(())
}

// Stops before the newline so it still terminates the attribute.
fn skip_line_comment(lexer: &mut Lexer) {
    while let Some(ch) = lexer.peek {
        if ch == '\n' {
            break;
        }
        bump(lexer);
    }
}

fn skip_block_comment(lexer: &mut Lexer) -> Result<(), ConfigError> {
    let (line, column) = (lexer.line, lexer.column + 1);
    bump(lexer); // '/'
    bump(lexer); // '*'
    while let Some(ch) = bump(lexer) {
        if ch == '*' && lexer.peek == Some('/') {
            bump(lexer);
            return Ok(());
        }
    }
    Err(ConfigError::UnexpectedEof {
        message: "Unterminated block comment".into(),
        file: lexer.file.clone(),
        line,
        column,
        hint: Some("Close the comment with */".into()),
        code: Some(105),
    })
}
