//! Pattern compiler.

use super::{CompiledTemplate, Segment};
use crate::error::CompileError;

/// Count the variable references in a pattern.
///
/// Every `$` counts, including malformed ones, so a pattern with a stray
/// `$` is still routed through [`compile`] and rejected there.
pub fn variables_count(pattern: &str) -> usize {
    pattern.bytes().filter(|&b| b == b'$').count()
}

/// Compile a pattern into a template.
///
/// # Syntax
/// - `$name`: name is the longest run of `[A-Za-z0-9_]`
/// - `${name}`: bracketed form, lets a name abut literal name characters
///
/// Names are stored lowercase. Everything else is literal. Digits are
/// ordinary name characters, so `$1abc` names the variable `1abc` rather
/// than a regex capture.
pub fn compile(pattern: &str) -> Result<CompiledTemplate, CompileError> {
    let src = pattern.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < src.len() {
        if src[i] != b'$' {
            i += 1;
            continue;
        }

        if i > literal_start {
            segments.push(Segment::Literal(src[literal_start..i].into()));
        }

        i += 1;
        if i == src.len() {
            return Err(invalid_name(pattern));
        }

        let bracket = src[i] == b'{';
        if bracket {
            i += 1;
            if i == src.len() {
                return Err(invalid_name(pattern));
            }
        }

        let name_start = i;
        while i < src.len() && is_name_byte(src[i]) {
            i += 1;
        }
        let name_end = i;

        if bracket {
            if i < src.len() && src[i] == b'}' {
                i += 1;
            } else {
                return Err(CompileError::MissingClosingBracket {
                    name: pattern[name_start..name_end].to_string(),
                });
            }
        }

        if name_end == name_start {
            return Err(invalid_name(pattern));
        }

        segments.push(Segment::Variable(
            pattern[name_start..name_end].to_ascii_lowercase(),
        ));
        literal_start = i;
    }

    if literal_start < src.len() {
        segments.push(Segment::Literal(src[literal_start..].into()));
    }

    log::debug!(
        "Compiled key pattern {:?} into {} segments",
        pattern,
        segments.len()
    );

    Ok(CompiledTemplate::new(segments))
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn invalid_name(pattern: &str) -> CompileError {
    CompileError::InvalidVariableName {
        pattern: pattern.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Segment {
        Segment::Literal(s.as_bytes().into())
    }

    fn var(s: &str) -> Segment {
        Segment::Variable(s.to_string())
    }

    #[test]
    fn test_variables_count() {
        assert_eq!(variables_count("static-key"), 0);
        assert_eq!(variables_count("prefix-$ua-suffix"), 1);
        assert_eq!(variables_count("$a$b${c}"), 3);
        assert_eq!(variables_count("broken$"), 1);
    }

    #[test]
    fn test_compile_mixed() {
        let template = compile("prefix-$ua-suffix").unwrap();
        assert_eq!(
            template.segments(),
            &[lit("prefix-"), var("ua"), lit("-suffix")]
        );
    }

    #[test]
    fn test_compile_adjacent_variables() {
        let template = compile("$a$b").unwrap();
        assert_eq!(template.segments(), &[var("a"), var("b")]);
    }

    #[test]
    fn test_compile_bracketed() {
        let template = compile("${host}name").unwrap();
        assert_eq!(template.segments(), &[var("host"), lit("name")]);

        // Without brackets the name swallows the trailing word
        let template = compile("$hostname").unwrap();
        assert_eq!(template.segments(), &[var("hostname")]);
    }

    #[test]
    fn test_compile_name_stops_at_punctuation() {
        let template = compile("$remote_addr:$http_user_agent.").unwrap();
        assert_eq!(
            template.segments(),
            &[
                var("remote_addr"),
                lit(":"),
                var("http_user_agent"),
                lit(".")
            ]
        );
    }

    #[test]
    fn test_compile_lowercases_names() {
        let template = compile("$HTTP_User_Agent").unwrap();
        assert_eq!(template.segments(), &[var("http_user_agent")]);
    }

    #[test]
    fn test_compile_without_variables() {
        let template = compile("static").unwrap();
        assert_eq!(template.segments(), &[lit("static")]);
    }

    #[test]
    fn test_compile_utf8_literals() {
        let template = compile("ключ-$ua").unwrap();
        assert_eq!(template.segments(), &[lit("ключ-"), var("ua")]);
    }

    #[test]
    fn test_invalid_variable_names() {
        assert!(matches!(
            compile("trailing$"),
            Err(CompileError::InvalidVariableName { .. })
        ));
        assert!(matches!(
            compile("a$-b"),
            Err(CompileError::InvalidVariableName { .. })
        ));
        assert!(matches!(
            compile("${}"),
            Err(CompileError::InvalidVariableName { .. })
        ));
        assert!(matches!(
            compile("${"),
            Err(CompileError::InvalidVariableName { .. })
        ));
    }

    #[test]
    fn test_missing_closing_bracket() {
        assert_eq!(
            compile("${host"),
            Err(CompileError::MissingClosingBracket {
                name: "host".to_string()
            })
        );
        assert_eq!(
            compile("${host-x}"),
            Err(CompileError::MissingClosingBracket {
                name: "host".to_string()
            })
        );
    }

    #[test]
    fn test_digit_names_are_plain_variables() {
        let template = compile("id:$1abc-$2").unwrap();
        assert_eq!(
            template.segments(),
            &[lit("id:"), var("1abc"), lit("-"), var("2")]
        );
    }
}
