use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Editable input line with a cursor counted in grapheme clusters, shared by
/// the line editor and the TUI.
#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    text: String,
    cursor: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.graphemes(true).count()
    }

    fn byte_index(&self, grapheme: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .nth(grapheme)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        // A combining mark joins the previous cluster instead of adding one.
        self.cursor = self.text[..at + c.len_utf8()].graphemes(true).count();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.remove_at_cursor();
        }
    }

    pub fn delete(&mut self) {
        self.remove_at_cursor();
    }

    fn remove_at_cursor(&mut self) {
        let start = self.byte_index(self.cursor);
        let end = self.byte_index(self.cursor + 1);
        self.text.drain(start..end);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    /// Jumps to the previous word start, or past the next word.
    pub fn move_word(&mut self, forward: bool) {
        let graphemes: Vec<&str> = self.text.graphemes(true).collect();
        let is_space = |g: &str| g.chars().all(char::is_whitespace);
        let mut pos = self.cursor;

        if forward {
            while pos < graphemes.len() && !is_space(graphemes[pos]) {
                pos += 1;
            }
            while pos < graphemes.len() && is_space(graphemes[pos]) {
                pos += 1;
            }
        } else {
            while pos > 0 && is_space(graphemes[pos - 1]) {
                pos -= 1;
            }
            while pos > 0 && !is_space(graphemes[pos - 1]) {
                pos -= 1;
            }
        }
        self.cursor = pos;
    }

    /// Replaces the text and puts the cursor at the end.
    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Empties the buffer and returns what it held.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Terminal columns occupied by the text left of the cursor.
    pub fn width_before_cursor(&self) -> usize {
        self.text[..self.byte_index(self.cursor)].width()
    }

    /// `count` graphemes starting at grapheme `skip`.
    pub fn window(&self, skip: usize, count: usize) -> String {
        self.text.graphemes(true).skip(skip).take(count).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> LineBuffer {
        let mut buf = LineBuffer::new();
        text.chars().for_each(|c| buf.insert(c));
        buf
    }

    #[test]
    fn edits_at_cursor() {
        let mut buf = typed("2+3");
        buf.move_left();
        buf.insert('0');
        assert_eq!(buf.text(), "2+03");
        buf.backspace();
        buf.backspace();
        assert_eq!(buf.text(), "23");
        buf.move_home();
        buf.delete();
        assert_eq!(buf.text(), "3");
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn cursor_counts_graphemes() {
        let mut buf = typed("πe\u{301}");
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.cursor(), 2);
        buf.backspace();
        assert_eq!(buf.text(), "π");
        assert_eq!(buf.width_before_cursor(), 1);
    }

    #[test]
    fn word_jumps() {
        let mut buf = typed("x = 12 + y");
        buf.move_word(false);
        assert_eq!(buf.cursor(), 9);
        buf.move_word(false);
        assert_eq!(buf.cursor(), 7);
        buf.move_home();
        buf.move_word(true);
        assert_eq!(buf.cursor(), 2);
    }

    #[test]
    fn take_resets() {
        let mut buf = typed("1 + 1");
        assert_eq!(buf.take(), "1 + 1");
        assert!(buf.is_empty());
        assert_eq!(buf.cursor(), 0);
        assert_eq!(typed("abcdef").window(2, 3), "cde");
    }
}
