//! Front-end checks for programs submitted to the host runtime
//!
//! The host runtime cannot execute kernels, but it accepts programs so that
//! code built against matrixcl can be exercised without a driver. Sources go
//! through a delimiter check and options through a flag check; failures
//! produce a compiler-style log.

/// Check that every `(`, `[` and `{` is closed, ignoring comments.
///
/// Returns the build log on failure.
pub(crate) fn check_source(source: &str) -> Result<(), String> {
    let mut stack: Vec<(char, usize, usize)> = Vec::new();
    let mut in_block_comment = false;

    for (line_no, line) in source.lines().enumerate() {
        let line_no = line_no + 1;
        let mut chars = line.char_indices().peekable();

        while let Some((col, ch)) = chars.next() {
            let col = col + 1;
            if in_block_comment {
                if ch == '*' && matches!(chars.peek(), Some((_, '/'))) {
                    chars.next();
                    in_block_comment = false;
                }
                continue;
            }
            match ch {
                '/' if matches!(chars.peek(), Some((_, '/'))) => break,
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    chars.next();
                    in_block_comment = true;
                }
                '(' | '[' | '{' => stack.push((ch, line_no, col)),
                ')' | ']' | '}' => {
                    let expected = match ch {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some((open, _, _)) if open == expected => {}
                        Some((open, open_line, open_col)) => {
                            return Err(format!(
                                "<source>:{line_no}:{col}: error: '{ch}' does not match '{open}' opened at {open_line}:{open_col}"
                            ));
                        }
                        None => {
                            return Err(format!("<source>:{line_no}:{col}: error: unexpected '{ch}'"));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if in_block_comment {
        return Err("<source>: error: unterminated comment".to_string());
    }
    if let Some((open, line_no, col)) = stack.pop() {
        return Err(format!("<source>:{line_no}:{col}: error: '{open}' is never closed"));
    }
    Ok(())
}

/// Every whitespace-separated build option must be a flag.
pub(crate) fn check_options(options: &str) -> bool {
    options.split_whitespace().all(|token| token.starts_with('-'))
}
