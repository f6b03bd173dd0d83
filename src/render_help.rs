use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn heading(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
    ))
}

pub fn render_help(frame: &mut Frame, scroll: usize) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" SimpleCalc Help ")
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));

    let help_text = vec![
        Line::from(Span::styled(
            "SimpleCalc - arithmetic with variables",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Operators:"),
        Line::from("  + : Addition        (5 + 3 = 8)"),
        Line::from("  - : Subtraction     (10 - 4 = 6)"),
        Line::from("  * : Multiplication  (6 * 7 = 42)"),
        Line::from("  / : Division        (15 / 3 = 5, 1 / 0 = inf)"),
        Line::from("  % : Remainder       (7 % 3 = 1)"),
        Line::from("  ^ : Power, right-associative (2 ^ 3 ^ 2 = 512)"),
        Line::from("  ( ) : Grouping      ((2 + 3) * 4 = 20)"),
        Line::from("  There is no unary minus: write 0 - 3"),
        Line::from(""),
        heading("Variables:"),
        Line::from("  name = expression   binds a value (x = 5)"),
        Line::from("  Names start with a letter and may contain digits"),
        Line::from("  An unassigned name reads as 0 unless started with --strict"),
        Line::from("  pi and e are constants; assigning to them has no effect"),
        Line::from(""),
        heading("Commands:"),
        Line::from("  details <expression> : Show each step and the time taken"),
        Line::from("  vars  : Toggle the variables panel (also F2)"),
        Line::from("  clear : Clear calculation history"),
        Line::from("  help  : Show this screen (also F1, h)"),
        Line::from("  quit  : Exit (also q, Ctrl+C)"),
        Line::from(""),
        heading("Editing:"),
        Line::from("  Left/Right, Ctrl+Left/Right : Move by character or word"),
        Line::from("  Home/End : Start or end of line"),
        Line::from("  Up/Down, PgUp/PgDn : Recall history"),
        Line::from("  Ctrl+U : Clear input"),
        Line::from("  Mouse wheel : Scroll history"),
        Line::from(""),
        heading("Examples:"),
        Line::from("  r = 2"),
        Line::from("  area = pi * r ^ 2"),
        Line::from("  details (1 + 2) * 3 % 4"),
        Line::from(""),
        Line::from(Span::styled("Esc closes this screen", Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
        .scroll((scroll as u16, 0));

    frame.render_widget(Clear, frame.size());
    frame.render_widget(paragraph, frame.size());
}
