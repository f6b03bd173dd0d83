use std::time::{Duration, Instant};

use simplecalc::{
    calc_engine::{Calculator, Evaluation, EvaluationTrace, Step},
    console::{classify, split_details, Command},
    line_buffer::LineBuffer,
};
use tracing::{debug, info};

pub struct HistoryEntry {
    pub input: String,
    pub result: Result<Evaluation, String>,
    pub detailed_steps: Vec<Step>,
    pub detailed_mode: bool,
    pub duration: Duration,
}

pub struct App {
    pub calc: Calculator,
    pub input: LineBuffer,
    pub input_scroll: usize,
    pub history: Vec<HistoryEntry>,
    pub cursor_history: usize,
    pub should_quit: bool,
    pub show_help: bool,
    pub show_variables: bool,
    pub help_scroll: usize,
    pub list_height: usize,
    pub item_start_indices: Vec<usize>,
    pub history_scroll: usize,
    pub scroll_to_bottom: bool,
    pub terminal_too_small: bool,
}

impl App {
    pub fn new(calc: Calculator) -> Self {
        App {
            calc,
            input: LineBuffer::new(),
            input_scroll: 0,
            history: Vec::new(),
            cursor_history: 0,
            should_quit: false,
            show_help: false,
            show_variables: true,
            help_scroll: 0,
            list_height: 5,
            item_start_indices: Vec::new(),
            history_scroll: 0,
            scroll_to_bottom: false,
            terminal_too_small: false,
        }
    }

    /// Keeps the cursor inside a window of `visible_width` graphemes.
    pub fn adjust_input_scroll(&mut self, visible_width: usize) {
        let total = self.input.len();
        let cursor = self.input.cursor();

        if cursor < self.input_scroll {
            self.input_scroll = cursor;
        } else if cursor >= self.input_scroll + visible_width {
            self.input_scroll = cursor + 1 - visible_width;
        }
        self.input_scroll = self.input_scroll.min(total.saturating_sub(visible_width));
    }

    fn reset_input(&mut self) {
        self.input.clear();
        self.input_scroll = 0;
    }

    pub fn submit(&mut self) {
        let line = self.input.text().trim().to_string();

        match classify(&line) {
            Command::Blank => return,
            Command::Quit => {
                self.should_quit = true;
                return;
            }
            Command::Help => {
                self.show_help = true;
                self.help_scroll = 0;
                self.reset_input();
                return;
            }
            Command::Variables => {
                self.show_variables = !self.show_variables;
                self.reset_input();
                return;
            }
            Command::Expression => {}
        }

        if line.eq_ignore_ascii_case("clear") || line.eq_ignore_ascii_case("reset") {
            self.history.clear();
            self.cursor_history = 0;
            self.history_scroll = 0;
            self.reset_input();
            return;
        }

        let (detailed_mode, expression) = split_details(&line);
        if expression.is_empty() {
            self.push_entry(HistoryEntry {
                input: line.clone(),
                result: Err("Please enter a valid expression after 'details'".to_string()),
                detailed_steps: Vec::new(),
                detailed_mode: false,
                duration: Duration::ZERO,
            });
            return;
        }

        let start_time = Instant::now();
        let mut trace = EvaluationTrace::new(detailed_mode);
        let result = self
            .calc
            .calculate_traced(expression, &mut trace)
            .map_err(|e| e.to_string());
        let duration = start_time.elapsed();

        match &result {
            Ok(evaluation) => debug!(input = expression, value = evaluation.value, "evaluated"),
            Err(e) => info!(input = expression, error = e.as_str(), "evaluation failed"),
        }

        self.push_entry(HistoryEntry {
            input: expression.to_string(),
            result,
            detailed_steps: trace.steps,
            detailed_mode,
            duration,
        });
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
        self.cursor_history = self.history.len() - 1;
        self.reset_input();
        self.scroll_to_bottom = true;
    }

    pub fn navigate_history(&mut self, direction: i32) {
        if direction < 0 && self.cursor_history > 0 {
            self.cursor_history -= 1;
        } else if direction > 0 && self.cursor_history + 1 < self.history.len() {
            self.cursor_history += 1;
        }
        self.recall_selected();
    }

    pub fn scroll_history(&mut self, direction: i32) {
        let step = self.list_height.saturating_sub(1).max(1);
        if direction < 0 {
            self.cursor_history = self.cursor_history.saturating_sub(step);
        } else {
            self.cursor_history = (self.cursor_history + step).min(self.history.len().saturating_sub(1));
        }
        self.recall_selected();
    }

    fn recall_selected(&mut self) {
        if let Some(entry) = self.history.get(self.cursor_history) {
            let input = entry.input.clone();
            self.input.set(&input);
        }
        self.input_scroll = 0;
        self.scroll_to_bottom = false;
    }
}
