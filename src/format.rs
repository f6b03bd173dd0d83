use crate::calc_engine::{Evaluation, Variable};

pub fn format_number(x: f64) -> String {
    if x.is_nan() || x.is_infinite() {
        return x.to_string();
    }
    if x.abs() > 1e10 || (x.abs() < 1e-5 && x != 0.0) {
        format!("{:.6e}", x)
    } else {
        let s = format!("{:.6}", x);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s == "-0" {
            "0".to_string()
        } else {
            s.to_string()
        }
    }
}

/// `value`, or `name = value` for an assignment.
pub fn format_evaluation(evaluation: &Evaluation) -> String {
    let value = format_number(evaluation.value);
    match &evaluation.assigned {
        Some(name) => format!("{name} = {value}"),
        None => value,
    }
}

pub fn format_variable(variable: &Variable) -> String {
    let line = format!("{} = {}", variable.name, format_number(variable.value));
    if variable.mutable {
        line
    } else {
        format!("{line} (constant)")
    }
}

/// Normalizes spacing: one space around operators and `=`, none inside
/// parentheses.
pub fn format_with_spaces(expr: &str) -> String {
    let mut result = String::new();

    for c in expr.chars() {
        match c {
            '+' | '-' | '*' | '/' | '^' | '%' | '=' => {
                if !result.is_empty() && !result.ends_with(' ') && !result.ends_with('(') {
                    result.push(' ');
                }
                result.push(c);
                result.push(' ');
            }
            '(' => {
                if !result.is_empty() && !result.ends_with(' ') && !result.ends_with('(') {
                    result.push(' ');
                }
                result.push(c);
            }
            ')' => {
                while result.ends_with(' ') {
                    result.pop();
                }
                result.push(c);
            }
            _ if c.is_whitespace() => {
                if !result.is_empty() && !result.ends_with(' ') && !result.ends_with('(') {
                    result.push(' ');
                }
            }
            _ => {
                if result.ends_with(')') {
                    result.push(' ');
                }
                result.push(c);
            }
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_trim_trailing_zeros() {
        assert_eq!(format_number(6.0), "6");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
        assert_eq!(format_number(2e12), "2.000000e12");
        assert_eq!(format_number(f64::INFINITY), "inf");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn assignment_shows_name() {
        let evaluation = Evaluation {
            value: 5.0,
            assigned: Some("x".to_string()),
        };
        assert_eq!(format_evaluation(&evaluation), "x = 5");
    }

    #[test]
    fn constants_are_marked() {
        let pi = Variable {
            name: "pi".to_string(),
            value: std::f64::consts::PI,
            mutable: false,
        };
        assert_eq!(format_variable(&pi), "pi = 3.141593 (constant)");
    }

    #[test]
    fn spacing_is_normalized() {
        assert_eq!(format_with_spaces("x=2*(3+4)^2"), "x = 2 * (3 + 4) ^ 2");
        assert_eq!(format_with_spaces("  1   +2 "), "1 + 2");
    }
}
