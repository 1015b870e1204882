//! Named viewports and the registry that owns them.
//!
//! The registry is the only mutable UI state. It is owned by the render loop;
//! pump tasks never reach it directly.

use anyhow::{Context, Result};
use ratatui::style::Color;

use super::layout::ViewRect;

/// A named rectangular viewport with its own content buffer.
#[derive(Debug, Clone)]
pub struct View {
    name: String,
    pub rect: ViewRect,
    pub title: String,
    lines: Vec<String>,
    cursor_row: usize,
    scroll_offset: usize,
    pub highlight: bool,
    pub autoscroll: bool,
    pub wrap: bool,
    pub sel_fg: Color,
    pub sel_bg: Color,
}

impl View {
    /// New empty view, titled with its name.
    pub fn new(name: &str, rect: ViewRect) -> Self {
        Self {
            name: name.to_string(),
            rect,
            title: name.to_string(),
            lines: Vec::new(),
            cursor_row: 0,
            scroll_offset: 0,
            highlight: false,
            autoscroll: false,
            wrap: false,
            sel_fg: Color::Reset,
            sel_bg: Color::Reset,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Rows available for content inside the border.
    pub fn inner_height(&self) -> usize {
        usize::try_from(self.rect.height() - 2).unwrap_or(0)
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }

    /// The line under the cursor.
    pub fn current_line(&self) -> Option<&str> {
        self.line(self.cursor_row)
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Replace the content with `text`, one entry per line.
    pub fn set_content(&mut self, text: &str) {
        self.lines = text.lines().map(str::to_string).collect();
        self.clamp_cursor();
    }

    /// Drop all content and reset cursor and scroll.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.cursor_row = 0;
        self.scroll_offset = 0;
    }

    /// Move the cursor by `delta` rows, clamped to the content.
    pub fn move_cursor(&mut self, delta: isize) {
        let last = self.lines.len().saturating_sub(1);
        self.cursor_row = self.cursor_row.saturating_add_signed(delta).min(last);
        self.scroll_to_cursor();
    }

    /// Resize in place; content, cursor and scroll position are kept unless
    /// the cursor would fall out of view.
    pub fn set_rect(&mut self, rect: ViewRect) {
        self.rect = rect;
        self.scroll_to_cursor();
    }

    /// Index of the first content row to paint for `rows` visible rows.
    pub fn first_visible_row(&self, rows: usize) -> usize {
        if self.autoscroll {
            self.lines.len().saturating_sub(rows)
        } else {
            self.scroll_offset
        }
    }

    fn clamp_cursor(&mut self) {
        self.cursor_row = self.cursor_row.min(self.lines.len().saturating_sub(1));
        self.scroll_to_cursor();
    }

    fn scroll_to_cursor(&mut self) {
        let rows = self.inner_height().max(1);
        if self.cursor_row < self.scroll_offset {
            self.scroll_offset = self.cursor_row;
        } else if self.cursor_row >= self.scroll_offset + rows {
            self.scroll_offset = self.cursor_row + 1 - rows;
        }
    }
}

/// Views addressed by name, in registration (paint) order, plus focus.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: Vec<View>,
    focus: Option<String>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or resize the view called `name`. Returns `true` if the view
    /// was created by this call.
    pub fn set_view(&mut self, name: &str, rect: ViewRect) -> bool {
        match self.get_mut(name) {
            Some(view) => {
                view.set_rect(rect);
                false
            }
            None => {
                self.views.push(View::new(name, rect));
                true
            }
        }
    }

    /// Apply a computed layout; returns the names of newly created views.
    pub fn apply_layout(&mut self, layout: &[(&'static str, ViewRect)]) -> Vec<&'static str> {
        layout
            .iter()
            .filter_map(|(name, rect)| self.set_view(name, *rect).then_some(*name))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut View> {
        self.views.iter_mut().find(|v| v.name == name)
    }

    /// Like [`get`](Self::get) but unknown names are an error.
    pub fn view(&self, name: &str) -> Result<&View> {
        self.get(name)
            .with_context(|| format!("Unknown view: {name}"))
    }

    pub fn view_mut(&mut self, name: &str) -> Result<&mut View> {
        self.get_mut(name)
            .with_context(|| format!("Unknown view: {name}"))
    }

    pub fn set_focus(&mut self, name: &str) -> Result<()> {
        self.view(name)?;
        self.focus = Some(name.to_string());
        Ok(())
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn is_focused(&self, name: &str) -> bool {
        self.focus.as_deref() == Some(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &View> {
        self.views.iter()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(height: i32) -> ViewRect {
        ViewRect {
            x0: 0,
            y0: 0,
            x1: 19,
            y1: height - 1,
        }
    }

    fn view_with_lines(n: usize, height: i32) -> View {
        let mut view = View::new("list", rect(height));
        for i in 0..n {
            view.push_line(format!("line {i}"));
        }
        view
    }

    #[test]
    fn test_new_view_is_titled_with_name() {
        let view = View::new("output", rect(10));
        assert_eq!(view.title, "output");
        assert!(view.lines().is_empty());
        assert_eq!(view.cursor_row(), 0);
    }

    #[test]
    fn test_move_cursor_clamps() {
        let mut view = view_with_lines(3, 10);
        view.move_cursor(-1);
        assert_eq!(view.cursor_row(), 0);
        view.move_cursor(1);
        view.move_cursor(1);
        view.move_cursor(1);
        assert_eq!(view.cursor_row(), 2);
        assert_eq!(view.current_line(), Some("line 2"));
    }

    #[test]
    fn test_move_cursor_on_empty_view() {
        let mut view = View::new("empty", rect(10));
        view.move_cursor(1);
        assert_eq!(view.cursor_row(), 0);
        assert_eq!(view.current_line(), None);
    }

    #[test]
    fn test_scroll_follows_cursor() {
        // Height 5 leaves 3 content rows inside the border.
        let mut view = view_with_lines(10, 5);
        for _ in 0..5 {
            view.move_cursor(1);
        }
        assert_eq!(view.cursor_row(), 5);
        assert_eq!(view.scroll_offset(), 3);
        for _ in 0..5 {
            view.move_cursor(-1);
        }
        assert_eq!(view.scroll_offset(), 0);
    }

    #[test]
    fn test_autoscroll_shows_tail() {
        let mut view = view_with_lines(10, 5);
        view.autoscroll = true;
        assert_eq!(view.first_visible_row(3), 7);
        view.autoscroll = false;
        assert_eq!(view.first_visible_row(3), 0);
    }

    #[test]
    fn test_set_content_and_clear() {
        let mut view = view_with_lines(2, 10);
        view.set_content("first\nsecond\nthird");
        assert_eq!(view.lines(), &["first", "second", "third"]);
        view.clear();
        assert!(view.lines().is_empty());
        assert_eq!(view.scroll_offset(), 0);
    }

    #[test]
    fn test_registry_set_view_preserves_state() {
        let mut registry = ViewRegistry::new();
        assert!(registry.set_view("list", rect(10)));
        {
            let view = registry.view_mut("list").expect("view");
            view.push_line("a");
            view.push_line("b");
            view.move_cursor(1);
        }
        assert!(!registry.set_view("list", rect(12)));

        let view = registry.view("list").expect("view");
        assert_eq!(view.lines(), &["a", "b"]);
        assert_eq!(view.cursor_row(), 1);
        assert_eq!(view.rect, rect(12));
    }

    #[test]
    fn test_registry_unknown_view() {
        let mut registry = ViewRegistry::new();
        assert!(registry.view("nope").is_err());
        assert!(registry.set_focus("nope").is_err());
        assert_eq!(registry.focus(), None);
    }

    #[test]
    fn test_registry_focus() {
        let mut registry = ViewRegistry::new();
        registry.set_view("a", rect(5));
        registry.set_view("b", rect(5));
        registry.set_focus("b").expect("focus");
        assert!(registry.is_focused("b"));
        assert!(!registry.is_focused("a"));
    }
}
