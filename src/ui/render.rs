use crate::ui::app::App;
use crate::ui::view::View;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Paint every view in registration order.
pub fn render(frame: &mut Frame, app: &App) {
    let bounds = frame.area();
    let views = app.views();
    for view in views.iter() {
        render_view(frame, view, views.is_focused(view.name()), bounds);
    }
}

fn render_view(frame: &mut Frame, view: &View, focused: bool, bounds: Rect) {
    let area = view.rect.to_area().intersection(bounds);
    if area.is_empty() {
        return;
    }

    let border_color = if focused { Color::Cyan } else { Color::Gray };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(view.title.as_str())
        .border_style(Style::default().fg(border_color));

    let rows = usize::from(area.height.saturating_sub(2));
    let first = view.first_visible_row(rows);
    let text: Vec<Line> = view
        .lines()
        .iter()
        .enumerate()
        .skip(first)
        .take(if view.wrap { usize::MAX } else { rows })
        .map(|(row, line)| {
            if view.highlight && row == view.cursor_row() {
                Line::styled(
                    line.as_str(),
                    Style::default().fg(view.sel_fg).bg(view.sel_bg),
                )
            } else {
                Line::from(line.as_str())
            }
        })
        .collect();

    let mut paragraph = Paragraph::new(text).block(block);
    if view.wrap {
        paragraph = paragraph.wrap(Wrap { trim: false });
    }

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::runner::CommandRunner;
    use crate::ui::layout::TARGETS_VIEW;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn buffer_text(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut out = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn draw(app: &App, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal.draw(|f| render(f, app)).expect("draw");
        terminal.backend().buffer().clone()
    }

    #[test]
    fn test_render_titles_and_targets() {
        let catalog = Catalog::parse("build: compile\ntest: run unit tests\n").expect("parse");
        let mut app = App::new(catalog, CommandRunner::new("make", Vec::new()));
        app.layout(120, 48);
        app.setup().expect("setup");
        app.update().expect("update");

        let text = buffer_text(&draw(&app, 120, 48));
        assert!(text.contains("Makefile Targets"));
        assert!(text.contains("Command Output"));
        assert!(text.contains("build"));
        assert!(text.contains("test"));
        assert!(text.contains("compile"));
    }

    #[test]
    fn test_render_highlights_cursor_row() {
        let catalog = Catalog::parse("build: compile\ntest: run unit tests\n").expect("parse");
        let mut app = App::new(catalog, CommandRunner::new("make", Vec::new()));
        app.layout(120, 48);
        app.setup().expect("setup");

        let buffer = draw(&app, 120, 48);
        let list = app.views().view(TARGETS_VIEW).expect("targets");
        // First content cell sits just inside the border.
        let x = u16::try_from(list.rect.x0 + 1).expect("x");
        let y = u16::try_from(list.rect.y0 + 1).expect("y");
        assert_eq!(buffer[(x, y)].symbol(), "b");
        assert_eq!(buffer[(x, y)].bg, Color::Blue);
        assert_eq!(buffer[(x, y + 1)].bg, Color::Reset);
    }

    #[test]
    fn test_render_tiny_terminal_does_not_panic() {
        let catalog = Catalog::parse("build: compile\n").expect("parse");
        let mut app = App::new(catalog, CommandRunner::new("make", Vec::new()));
        app.layout(3, 2);
        app.setup().expect("setup");
        let _ = draw(&app, 3, 2);
    }
}
