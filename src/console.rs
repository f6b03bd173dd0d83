use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::calc_engine::Calculator;
use crate::format::{format_evaluation, format_variable};

pub const HELP_LINES: &[&str] = &[
    "Help:",
    "  h    - this message",
    "  q    - quit",
    "  vars - list variables",
    "",
    "Expressions can contain:",
    "  integers or decimal numbers",
    "  arithmetic operators +, -, *, /, %, ^",
    "  parentheses '(' and ')'",
    "  variables, assigned with name = expression",
    "  constants pi and e (read-only)",
];

/// What a front end should do with a line before evaluating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Variables,
    Blank,
    Expression,
}

pub fn classify(line: &str) -> Command {
    match line.trim() {
        "" => Command::Blank,
        "h" | "help" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        "vars" => Command::Variables,
        _ => Command::Expression,
    }
}

/// Strips a `details` prefix or suffix, which asks for a step-by-step trace.
pub fn split_details(input: &str) -> (bool, &str) {
    const KEYWORD: &str = "details";
    let n = KEYWORD.len();

    if input.len() > n
        && input.get(..n).is_some_and(|p| p.eq_ignore_ascii_case(KEYWORD))
        && input[n..].starts_with(char::is_whitespace)
    {
        (true, input[n..].trim())
    } else if input.len() > n
        && input.get(input.len() - n..).is_some_and(|s| s.eq_ignore_ascii_case(KEYWORD))
        && input[..input.len() - n].ends_with(char::is_whitespace)
    {
        (true, input[..input.len() - n].trim())
    } else if input.eq_ignore_ascii_case(KEYWORD) {
        (true, "")
    } else {
        (false, input)
    }
}

/// Prompts with a single space, evaluates each line and prints the result,
/// until `q` or end of input.
pub fn run_console<R: BufRead, W: Write>(
    calc: &mut Calculator,
    mut input: R,
    output: &mut W,
) -> Result<()> {
    writeln!(output, "\nWelcome to SimpleCalc!!!")?;

    let mut line = String::new();
    loop {
        write!(output, " ")?;
        output.flush()?;

        line.clear();
        let read = input.read_line(&mut line).context("failed to read input line")?;
        if read == 0 {
            debug!("input closed");
            break;
        }

        match classify(&line) {
            Command::Blank => continue,
            Command::Quit => break,
            Command::Help => {
                for help in HELP_LINES {
                    writeln!(output, "{help}")?;
                }
                writeln!(output)?;
            }
            Command::Variables => {
                for variable in calc.variables().iter() {
                    writeln!(output, "{}", format_variable(variable))?;
                }
            }
            Command::Expression => match calc.calculate(line.trim()) {
                Ok(evaluation) => writeln!(output, "{}", format_evaluation(&evaluation))?,
                Err(e) => {
                    info!(input = line.trim(), error = %e, "evaluation failed");
                    writeln!(output, "Error: {e}")?;
                }
            },
        }
    }

    writeln!(output, "\nThanks for using SimpleCalc! Goodbye.\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_commands() {
        assert_eq!(classify(" h \n"), Command::Help);
        assert_eq!(classify("q"), Command::Quit);
        assert_eq!(classify("vars"), Command::Variables);
        assert_eq!(classify("   "), Command::Blank);
        assert_eq!(classify("h + 1"), Command::Expression);
    }

    #[test]
    fn details_prefix_and_suffix() {
        assert_eq!(split_details("details 2 + 3"), (true, "2 + 3"));
        assert_eq!(split_details("2 + 3 DETAILS"), (true, "2 + 3"));
        assert_eq!(split_details("details"), (true, ""));
        assert_eq!(split_details("detailsx + 1"), (false, "detailsx + 1"));
        assert_eq!(split_details("x = 1"), (false, "x = 1"));
    }

    #[test]
    fn session_prints_results_and_errors() {
        let mut calc = Calculator::new();
        let input = "x = 5\nx + 1\n* 3\nq\n2 + 2\n";
        let mut output = Vec::new();
        run_console(&mut calc, input.as_bytes(), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("x = 5\n"));
        assert!(text.contains("6\n"));
        assert!(text.contains("Error: "));
        assert!(!text.contains("4\n"), "input after q must be ignored");
        assert!(text.ends_with("Goodbye.\n\n"));
    }
}
