//! Command-line splitting.
//!
//! Splits on spaces outside double quotes, strips the quotes afterwards,
//! and optionally drops the first argument (the executable name).

/// Split `command_line` into arguments.
///
/// Double quotes group words into one argument and are removed from the
/// result. With `skip_first` the first argument is dropped, matching the
/// convention of a command line that starts with the executable path. An
/// unterminated quote extends the final argument to the end of the line.
pub fn parse_arguments(command_line: &str, skip_first: bool) -> Vec<String> {
    let mut arguments: Vec<String> = Vec::new();
    let chars: Vec<char> = command_line.chars().collect();

    let mut arg_start = 0;
    let mut in_arg = false;
    let mut in_quote = false;
    let mut skip = skip_first;

    for (i, &c) in chars.iter().enumerate() {
        if c == '"' {
            in_quote = !in_quote;
        }
        if c == ' ' && !in_quote {
            if in_arg {
                in_arg = false;
                if !skip {
                    arguments.push(chars[arg_start..i].iter().collect());
                }
                skip = false;
            }
        } else if !in_arg {
            in_arg = true;
            arg_start = i;
        }
    }
    if in_arg && !skip {
        arguments.push(chars[arg_start..].iter().collect());
    }

    for argument in &mut arguments {
        argument.retain(|c| c != '"');
    }
    arguments
}

/// The running process's arguments, executable name already dropped.
pub fn arguments_from_env() -> Vec<String> {
    std::env::args().skip(1).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_spaces() {
        assert_eq!(
            parse_arguments("-x 5 --verbose", false),
            vec!["-x", "5", "--verbose"]
        );
    }

    #[test]
    fn quotes_group_and_are_stripped() {
        assert_eq!(
            parse_arguments(r#"--path "C:\Program Files\App" -q"#, false),
            vec!["--path", r"C:\Program Files\App", "-q"]
        );
    }

    #[test]
    fn skip_first_drops_executable_name() {
        assert_eq!(
            parse_arguments(r#""/usr/bin/tool" run --fast"#, true),
            vec!["run", "--fast"]
        );
    }

    #[test]
    fn repeated_spaces_produce_no_empty_arguments() {
        assert_eq!(parse_arguments("a   b    c", false), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_line_yields_nothing() {
        assert!(parse_arguments("", false).is_empty());
        assert!(parse_arguments("    ", false).is_empty());
    }

    #[test]
    fn skip_first_on_single_argument_yields_nothing() {
        assert!(parse_arguments("tool", true).is_empty());
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_line() {
        assert_eq!(
            parse_arguments(r#"--msg "hello world"#, false),
            vec!["--msg", "hello world"]
        );
    }

    #[test]
    fn quoted_empty_argument_survives_as_empty_string() {
        // A pair of quotes around nothing leaves an empty string argument.
        assert_eq!(parse_arguments(r#"a "" b"#, false), vec!["a", "", "b"]);
    }
}
