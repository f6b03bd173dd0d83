use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use simplecalc::calc_engine::VariableStore;

#[derive(Clone, Copy, PartialEq)]
enum Class {
    Word,
    Number,
    Other,
}

fn class_of(c: char, previous: Class) -> Class {
    if c.is_alphabetic() || (previous == Class::Word && c.is_alphanumeric()) {
        Class::Word
    } else if c.is_ascii_digit() || c == '.' {
        Class::Number
    } else {
        Class::Other
    }
}

fn word_style(word: &str, variables: &VariableStore, base_style: Style) -> Style {
    match variables.get(word) {
        Some(var) if !var.mutable => Style::default()
            .fg(Color::LightBlue)
            .add_modifier(Modifier::BOLD),
        Some(_) => Style::default().fg(Color::LightCyan),
        None => base_style.add_modifier(Modifier::ITALIC),
    }
}

fn symbol_style(c: char, base_style: Style) -> Style {
    match c {
        '+' | '-' | '*' | '/' | '^' | '%' => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        '=' => Style::default().fg(Color::Gray),
        _ => base_style,
    }
}

/// Colors constants, known variables, numbers and operators. Names not yet
/// bound are shown in italics.
pub fn highlight_expression(
    expr: &str,
    variables: &VariableStore,
    base_style: Style,
) -> Vec<Span<'static>> {
    let number_style = Style::default().fg(Color::LightGreen);
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut current_class = Class::Other;

    let flush = |current: &mut String, class: Class, spans: &mut Vec<Span<'static>>| {
        if current.is_empty() {
            return;
        }
        let style = match class {
            Class::Word => word_style(current.as_str(), variables, base_style),
            Class::Number => number_style,
            Class::Other => base_style,
        };
        spans.push(Span::styled(std::mem::take(current), style));
    };

    for c in expr.chars() {
        let class = class_of(c, current_class);
        if class != current_class {
            flush(&mut current, current_class, &mut spans);
            current_class = class;
        }

        if class == Class::Other {
            flush(&mut current, current_class, &mut spans);
            spans.push(Span::styled(c.to_string(), symbol_style(c, base_style)));
        } else {
            current.push(c);
        }
    }
    flush(&mut current, current_class, &mut spans);

    spans
}
