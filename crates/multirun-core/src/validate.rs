//! Command validation

/// Shell control operators that would let one command string run as
/// several statements
pub const CONTROL_OPERATORS: [char; 3] = [';', '|', '&'];

/// Check whether a command string contains an unquoted shell control operator
///
/// This is a lexical scan, not a shell parser. It tracks the open quote
/// character and whether the next character is escaped:
/// - a backslash escapes the next character outside quotes and inside
///   double quotes; inside single quotes it is literal, as in `sh`
/// - inside quotes only the matching quote character closes the quote
/// - `;`, `|` or `&` outside quotes and not escaped means chained
pub fn is_chained(command: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in command.chars() {
        if escaped {
            escaped = false;
            continue;
        }

        match quote {
            Some('\'') => {
                if c == '\'' {
                    quote = None;
                }
            }
            Some(open) => match c {
                '\\' => escaped = true,
                c if c == open => quote = None,
                _ => {}
            },
            None => match c {
                '\\' => escaped = true,
                '\'' | '"' => quote = Some(c),
                c if CONTROL_OPERATORS.contains(&c) => return true,
                _ => {}
            },
        }
    }

    false
}

/// First chained command in the batch, if any
pub fn find_chained<S: AsRef<str>>(commands: &[S]) -> Option<&str> {
    commands
        .iter()
        .map(AsRef::as_ref)
        .find(|command| is_chained(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_commands_are_not_chained() {
        assert!(!is_chained("sleep 5"));
        assert!(!is_chained("nginx -g 'daemon off;'"));
        assert!(!is_chained(""));
        assert!(!is_chained("echo > /tmp/out 2>/dev/null"));
    }

    #[test]
    fn unquoted_operators_are_chained() {
        assert!(is_chained("echo hello && echo world"));
        assert!(is_chained("echo hello; echo world"));
        assert!(is_chained("echo hello | grep hello"));
        assert!(is_chained("sleep 1 &"));
        assert!(is_chained("a||b"));
        assert!(is_chained(";"));
    }

    #[test]
    fn quoted_operators_are_inert() {
        assert!(!is_chained(r#"echo "hello&world""#));
        assert!(!is_chained("echo 'hello|world'"));
        assert!(!is_chained(r#"echo "hello;world""#));
        assert!(!is_chained(r#"echo "a'b&c'd""#));
        assert!(!is_chained(r#"echo 'a"b;c"d'"#));
    }

    #[test]
    fn escapes() {
        assert!(!is_chained(r"echo hello\;world"));
        assert!(!is_chained(r"echo a\&b"));
        assert!(!is_chained(r#"echo "a\"b&c\"d""#));
        assert!(!is_chained(r#"echo "a\\&b""#));

        // Escaped backslash does not escape the operator after it
        assert!(is_chained(r"echo a\\;b"));
        // Escaped quote does not open a quote
        assert!(is_chained(r#"echo \"a;b"#));
    }

    #[test]
    fn backslash_is_literal_in_single_quotes() {
        // sh closes the quote at the second ', leaving `; rm x` outside
        assert!(is_chained(r"echo 'a\'; rm x"));
        assert!(!is_chained(r"echo 'a\;b'"));
    }

    #[test]
    fn operator_after_closed_quote() {
        assert!(is_chained(r#"echo "a" && echo b"#));
        assert!(is_chained("echo 'a'|cat"));
    }

    #[test]
    fn unterminated_quote_swallows_rest() {
        assert!(!is_chained(r#"echo "a; b"#));
    }

    #[test]
    fn find_first_chained() {
        let commands = ["echo hello", "sleep 1 && sleep 1", "a | b"];
        assert_eq!(find_chained(&commands[..]), Some("sleep 1 && sleep 1"));

        let clean = vec!["sleep 5".to_string(), "echo 'x;y'".to_string()];
        assert_eq!(find_chained(&clean[..]), None);
    }
}
