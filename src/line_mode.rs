use std::io::{stdin, stdout, Stdin, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use simplecalc::{
    calc_engine::{Calculator, EvaluationTrace},
    console::{classify, split_details, Command, HELP_LINES},
    format::{format_evaluation, format_number, format_variable, format_with_spaces},
    line_buffer::LineBuffer,
};
use termion::{
    clear::CurrentLine as ClearLine,
    cursor::{DetectCursorPos, Goto},
    event::Key,
    input::{Keys, TermRead},
    raw::{IntoRawMode, RawTerminal},
};
use tracing::{debug, info};

const PROMPT: &str = "Expression: ";

type Terminal = RawTerminal<std::io::Stdout>;

/// Raw mode needs explicit carriage returns.
fn emit(out: &mut Terminal, text: &str) -> Result<()> {
    for line in text.split('\n') {
        write!(out, "{line}\r\n")?;
    }
    out.flush()?;
    Ok(())
}

struct History {
    entries: Vec<String>,
    index: usize,
}

impl History {
    fn recall(&mut self, older: bool, buffer: &mut LineBuffer) {
        if older {
            if self.index > 0 {
                self.index -= 1;
                buffer.set(&self.entries[self.index]);
            }
        } else if self.index + 1 < self.entries.len() {
            self.index += 1;
            buffer.set(&self.entries[self.index]);
        } else {
            self.index = self.entries.len();
            buffer.clear();
        }
    }

    fn push(&mut self, line: &str) {
        self.entries.push(line.to_string());
        self.index = self.entries.len();
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
    }
}

/// Reads one line with editing keys. `None` means Ctrl+D or closed input.
fn read_line(
    out: &mut Terminal,
    keys: &mut Keys<Stdin>,
    history: &mut History,
) -> Result<Option<String>> {
    let mut buffer = LineBuffer::new();
    let (_, row) = out.cursor_pos().context("cannot read cursor position")?;

    loop {
        write!(out, "{}{}{}{}", Goto(1, row), ClearLine, PROMPT, buffer.text())?;
        let column = 1 + PROMPT.len() + buffer.width_before_cursor();
        write!(out, "{}", Goto(column as u16, row))?;
        out.flush()?;

        let Some(key) = keys.next() else {
            return Ok(None);
        };
        match key? {
            Key::Char('\n') => {
                write!(out, "\r\n")?;
                return Ok(Some(buffer.take()));
            }
            Key::Ctrl('d') if buffer.is_empty() => return Ok(None),
            Key::Ctrl('u') => buffer.clear(),
            Key::Char(c) => buffer.insert(c),
            Key::Backspace => buffer.backspace(),
            Key::Delete => buffer.delete(),
            Key::Left => buffer.move_left(),
            Key::Right => buffer.move_right(),
            Key::Home => buffer.move_home(),
            Key::End => buffer.move_end(),
            Key::Up => history.recall(true, &mut buffer),
            Key::Down => history.recall(false, &mut buffer),
            _ => {}
        }
    }
}

pub fn run_line(mut calc: Calculator) -> Result<()> {
    let mut out = stdout().into_raw_mode().context("cannot enter raw mode")?;
    emit(
        &mut out,
        "SimpleCalc line mode\n\
         Operators: + - * / % ^ and parentheses; assign with name = expr\n\
         Constants: pi, e\n\
         Commands: h (help), q (quit), vars, clear, details <expr>\n\
         Keys: Left/Right, Home/End, Backspace/Delete, Up/Down for history, Ctrl+U clears\n",
    )?;

    let mut keys = stdin().keys();
    let mut history = History {
        entries: Vec::new(),
        index: 0,
    };

    while let Some(line) = read_line(&mut out, &mut keys, &mut history)? {
        let input = line.trim();

        match classify(input) {
            Command::Blank => continue,
            Command::Quit => break,
            Command::Help => {
                emit(&mut out, &HELP_LINES.join("\n"))?;
                continue;
            }
            Command::Variables => {
                for variable in calc.variables().iter() {
                    emit(&mut out, &format!("  {}", format_variable(variable)))?;
                }
                continue;
            }
            Command::Expression => {}
        }

        if input.eq_ignore_ascii_case("clear") || input.eq_ignore_ascii_case("reset") {
            history.clear();
            emit(&mut out, "History cleared\n")?;
            continue;
        }

        history.push(input);

        let (detailed_mode, expression) = split_details(input);
        if expression.is_empty() {
            emit(&mut out, "Please enter a valid expression after 'details'\n")?;
            continue;
        }

        let start = Instant::now();
        let mut trace = EvaluationTrace::new(detailed_mode);
        let result = calc.calculate_traced(expression, &mut trace);
        let elapsed = start.elapsed();

        let shown = format_with_spaces(expression);
        match result {
            Ok(evaluation) => {
                debug!(input = expression, value = evaluation.value, "evaluated");
                match &evaluation.assigned {
                    Some(_) => emit(&mut out, &format!("  {}", format_evaluation(&evaluation)))?,
                    None => emit(&mut out, &format!("  {} = {}", shown, format_evaluation(&evaluation)))?,
                }
            }
            Err(e) => {
                info!(input = expression, error = %e, "evaluation failed");
                emit(&mut out, &format!("  {shown} = Error: {e}"))?;
            }
        }

        if detailed_mode {
            for (i, step) in trace.steps.iter().enumerate() {
                emit(
                    &mut out,
                    &format!("    Step {}: {} = {}", i + 1, step.operation, format_number(step.result)),
                )?;
            }
            emit(&mut out, &format!("    Time: {:.6} ms", elapsed.as_secs_f64() * 1000.0))?;
        }
        emit(&mut out, "")?;
    }

    emit(&mut out, "Goodbye!")?;
    Ok(())
}
