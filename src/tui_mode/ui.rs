use super::app::App;
use super::helpers::highlight_expression;
use crate::render_help::render_help;
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use simplecalc::format::{format_number, format_variable, format_with_spaces};
use std::time::Duration;

const MIN_TERMINAL_WIDTH: u16 = 50;
const MIN_TERMINAL_HEIGHT: u16 = 10;
const VARIABLES_PANEL_WIDTH: u16 = 30;

pub fn run_ui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| {
            if app.show_help {
                render_help(f, app.help_scroll);
            } else {
                ui(f, app);
            }
        })?;

        if app.should_quit {
            break;
        }

        if crossterm::event::poll(Duration::from_millis(50))? {
            match crossterm::event::read()? {
                Event::Key(KeyEvent { code, modifiers, kind, .. }) if kind == KeyEventKind::Press => {
                    handle_key_event(app, code, modifiers);
                }
                Event::Mouse(event) => handle_mouse_event(app, event),
                _ => {}
            }
        }
    }
    Ok(())
}

fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if app.show_help {
        match code {
            KeyCode::Down => app.help_scroll = app.help_scroll.saturating_add(1),
            KeyCode::Up => app.help_scroll = app.help_scroll.saturating_sub(1),
            KeyCode::PageDown => app.help_scroll = app.help_scroll.saturating_add(10),
            KeyCode::PageUp => app.help_scroll = app.help_scroll.saturating_sub(10),
            KeyCode::Esc | KeyCode::F(1) => {
                app.show_help = false;
                app.help_scroll = 0;
            }
            _ => {}
        }
        return;
    }

    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match code {
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => app.should_quit = true,
        KeyCode::Char('u') | KeyCode::Char('U') if ctrl => {
            app.input.clear();
            app.input_scroll = 0;
        }
        KeyCode::Char(c) if !ctrl => app.input.insert(c),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left if ctrl => app.input.move_word(false),
        KeyCode::Right if ctrl => app.input.move_word(true),
        KeyCode::Left => app.input.move_left(),
        KeyCode::Right => app.input.move_right(),
        KeyCode::Home => {
            app.input.move_home();
            app.input_scroll = 0;
        }
        KeyCode::End => app.input.move_end(),
        KeyCode::Up => app.navigate_history(-1),
        KeyCode::Down => app.navigate_history(1),
        KeyCode::PageUp => app.scroll_history(-1),
        KeyCode::PageDown => app.scroll_history(1),
        KeyCode::Enter => app.submit(),
        KeyCode::F(1) => {
            app.show_help = true;
            app.help_scroll = 0;
        }
        KeyCode::F(2) => app.show_variables = !app.show_variables,
        _ => {}
    }
}

fn handle_mouse_event(app: &mut App, event: MouseEvent) {
    let scroll = if app.show_help {
        &mut app.help_scroll
    } else {
        &mut app.history_scroll
    };
    match event.kind {
        MouseEventKind::ScrollDown => *scroll = scroll.saturating_add(3),
        MouseEventKind::ScrollUp => *scroll = scroll.saturating_sub(3),
        _ => {}
    }
}

fn ui(frame: &mut Frame, app: &mut App) {
    let area = frame.size();
    app.terminal_too_small = area.width < MIN_TERMINAL_WIDTH || area.height < MIN_TERMINAL_HEIGHT;
    if app.terminal_too_small {
        render_resize_message(frame, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    let body = if app.show_variables {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(VARIABLES_PANEL_WIDTH)])
            .split(rows[2])
    } else {
        Layout::default()
            .constraints([Constraint::Min(0)])
            .split(rows[2])
    };

    render_input(frame, app, rows[0]);
    render_status(frame, rows[1]);
    render_history(frame, app, body[0]);
    if app.show_variables {
        render_variables(frame, app, body[1]);
    }
    app.list_height = body[0].height as usize;
}

fn render_resize_message(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            format!(
                "Terminal too small: need {MIN_TERMINAL_WIDTH}x{MIN_TERMINAL_HEIGHT}, have {}x{}",
                area.width, area.height
            ),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Please resize the window", Style::default().fg(Color::Yellow))),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Resize Required ")
                .title_alignment(Alignment::Center),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn detail_line(text: String, color: Color) -> ListItem<'static> {
    ListItem::new(Line::from(Span::styled(text, Style::default().fg(color))))
}

fn render_history(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" History ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.history.is_empty() {
        let empty = Paragraph::new("No calculations yet. Try: r = 2, then pi * r ^ 2")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(empty, inner);
        return;
    }

    let mut items = Vec::new();
    app.item_start_indices.clear();

    for (i, entry) in app.history.iter().enumerate() {
        app.item_start_indices.push(items.len());

        let base_style = Style::default().fg(if i == app.cursor_history {
            Color::Yellow
        } else {
            Color::Cyan
        });

        let mut spans = vec![Span::styled("> ", Style::default().fg(Color::Green))];
        spans.extend(highlight_expression(
            &format_with_spaces(&entry.input),
            app.calc.variables(),
            base_style,
        ));
        spans.push(Span::styled(" = ", Style::default().fg(Color::Gray)));
        spans.push(match &entry.result {
            Ok(evaluation) => Span::styled(
                format_number(evaluation.value),
                Style::default().fg(Color::LightMagenta).add_modifier(Modifier::BOLD),
            ),
            Err(e) => Span::styled(
                format!("Error: {e}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        });
        items.push(ListItem::new(Line::from(spans)));

        if entry.detailed_mode {
            for (j, step) in entry.detailed_steps.iter().enumerate() {
                items.push(detail_line(
                    format!("    Step {}: {} = {}", j + 1, step.operation, format_number(step.result)),
                    Color::DarkGray,
                ));
            }
            items.push(detail_line(
                format!("    Time: {:.6} ms", entry.duration.as_secs_f64() * 1000.0),
                Color::Magenta,
            ));
        }
    }

    if app.scroll_to_bottom {
        app.history_scroll = items.len().saturating_sub(inner.height as usize);
        app.scroll_to_bottom = false;
    }
    app.history_scroll = app.history_scroll.min(items.len().saturating_sub(1));

    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    let mut state = ListState::default()
        .with_selected(app.item_start_indices.get(app.cursor_history).copied())
        .with_offset(app.history_scroll);

    frame.render_stateful_widget(list, inner, &mut state);
}

fn render_variables(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .calc
        .variables()
        .iter()
        .map(|var| {
            let color = if var.mutable { Color::LightCyan } else { Color::LightBlue };
            ListItem::new(Line::from(Span::styled(format_variable(var), Style::default().fg(color))))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Variables ")
            .title_alignment(Alignment::Center),
    );
    frame.render_widget(list, area);
}

fn render_status(frame: &mut Frame, area: Rect) {
    let keys = [
        ("Enter", "Calculate"),
        ("Up/Down", "History"),
        ("F1", "Help"),
        ("F2", "Variables"),
        ("Ctrl+U", "Clear"),
        ("Ctrl+C", "Quit"),
    ];

    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(*key, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {desc}  "), Style::default().fg(Color::DarkGray)),
            ]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Expression ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible_width = inner.width.saturating_sub(3) as usize;
    app.adjust_input_scroll(visible_width);

    let visible = app.input.window(app.input_scroll, visible_width);
    let mut spans = vec![Span::styled("> ", Style::default().fg(Color::Green))];
    spans.extend(highlight_expression(&visible, app.calc.variables(), Style::default()));
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);

    let prefix = app
        .input
        .window(app.input_scroll, app.input.cursor().saturating_sub(app.input_scroll));
    let cursor_x = inner.x + 2 + unicode_width::UnicodeWidthStr::width(prefix.as_str()) as u16;
    frame.set_cursor(cursor_x, inner.y);

    let indicator = Style::default().fg(Color::DarkGray);
    if app.input_scroll > 0 {
        frame.render_widget(Paragraph::new("<").style(indicator), Rect::new(inner.x, inner.y, 1, 1));
    }
    if app.input.len() > app.input_scroll + visible_width {
        frame.render_widget(
            Paragraph::new(">").style(indicator),
            Rect::new(inner.x + inner.width - 1, inner.y, 1, 1),
        );
    }
}
