use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget, Wrap},
};
use rand::Rng;

use crate::app::App;
use crate::desktop::{KeyInjector, WindowFocuser, WindowLister};
use crate::engine::Status;

const HORIZONTAL_MARGIN: u16 = 2;
const WINDOW_LIST_HEIGHT: u16 = 7;

impl<R, D> Widget for &App<R, D>
where
    R: Rng,
    D: WindowLister + WindowFocuser + KeyInjector,
{
    fn render(self, area: Rect, buf: &mut Buffer) {
        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);

        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let yellow_bold_style = Style::default().patch(bold_style).fg(Color::Yellow);

        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);

        let underlined_dim_bold_style = Style::default()
            .patch(dim_bold_style)
            .add_modifier(Modifier::UNDERLINED);

        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1),                  // settings
                Constraint::Percentage(40),             // source text
                Constraint::Min(3),                     // output
                Constraint::Length(WINDOW_LIST_HEIGHT), // window picker
                Constraint::Length(1),                  // status
                Constraint::Length(1),                  // help
            ])
            .split(area);

        // settings
        let target = self
            .target()
            .map(|w| w.display_title())
            .unwrap_or_else(|| "preview only".to_string());
        Paragraph::new(Line::from(vec![
            Span::styled(format!("{:.0} wpm", self.wpm), bold_style),
            Span::raw("  ·  "),
            Span::styled(format!("{:.0}% accuracy", self.accuracy), bold_style),
            Span::raw("  ·  "),
            Span::styled(target, italic_style),
        ]))
        .render(chunks[0], buf);

        // source text, progress shown against the running session
        let cursor = if self.is_running() {
            Some(self.engine.cursor())
        } else {
            None
        };
        let follow = cursor.or(self.editing.then(|| self.text.chars().count()));
        let source_scroll = follow.map_or(0, |pos| {
            let upto: String = self.text.chars().take(pos + 1).collect();
            // one spare row for a word that wraps once it is complete
            scroll_to_show(wrapped_rows(&upto, chunks[1]) + 1, chunks[1])
        });
        let source_title = if self.editing {
            "Text (editing, esc when done)"
        } else {
            "Text"
        };
        Paragraph::new(source_text(
            &self.text,
            cursor,
            green_bold_style,
            underlined_dim_bold_style,
            dim_bold_style,
        ))
        .block(Block::default().borders(Borders::ALL).title(source_title))
        .wrap(Wrap { trim: false })
        .scroll((source_scroll, 0))
        .render(chunks[1], buf);

        // output, scrolled so the newest row stays visible
        let output = self.engine.output();
        let output_scroll = scroll_to_show(wrapped_rows(output, chunks[2]), chunks[2]);
        let title = match self.output_label() {
            Some(label) => format!("Output ({label})"),
            None => "Output".to_string(),
        };
        Paragraph::new(output)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false })
            .scroll((output_scroll, 0))
            .render(chunks[2], buf);

        // window picker
        let mut items = vec![ListItem::new("— type in the output area only —")];
        items.extend(self.windows.iter().map(|w| ListItem::new(w.display_title())));
        let mut state =
            ListState::default().with_selected(Some(self.selected.map_or(0, |i| i + 1)));
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Windows: {}", self.window_hint)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        StatefulWidget::render(list, chunks[3], buf, &mut state);

        // status
        let status = self.engine.status();
        let status_style = match status {
            Status::FocusFailed(_) => red_bold_style,
            Status::Countdown(_) => yellow_bold_style,
            Status::Typing => green_bold_style,
            _ => bold_style,
        };
        let mut spans = vec![Span::styled(status.to_string(), status_style)];
        if let Some(message) = &self.message {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(message.clone(), red_bold_style));
        }
        let session = self.engine.state();
        if self.engine.config().is_some() {
            spans.push(Span::styled(
                format!(
                    "  {} typos corrected{}",
                    session.mistakes,
                    match session.injection_failures {
                        0 => String::new(),
                        n => format!(", {n} keystrokes failed"),
                    }
                ),
                dim_bold_style,
            ));
        }
        Paragraph::new(Line::from(spans)).render(chunks[4], buf);

        // help
        let help = if self.is_running() {
            "(esc/s) stop  (c) clear  (ctrl-c) quit"
        } else if self.editing {
            "type or paste the text  (ctrl-u) erase all  (esc) done  (f5) start  (ctrl-c) quit"
        } else {
            "(enter) start  (e) edit  (tab/↑↓) window  (r) refresh  (+/-) wpm  ([/]) accuracy  (c) clear  (esc) quit"
        };
        Paragraph::new(Span::styled(help, italic_style)).render(chunks[5], buf);
    }
}

/// Rows `text` takes once wrapped inside a bordered `area`.
fn wrapped_rows(text: &str, area: Rect) -> usize {
    Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .line_count(area.width.saturating_sub(2))
}

/// Scroll offset that brings the last of `rows` into a bordered `area`.
fn scroll_to_show(rows: usize, area: Rect) -> u16 {
    let visible = area.height.saturating_sub(2) as usize;
    u16::try_from(rows.saturating_sub(visible)).unwrap_or(u16::MAX)
}

/// The source text split into lines, with the typed part highlighted and the
/// next character underlined.
fn source_text(
    text: &str,
    cursor: Option<usize>,
    typed: Style,
    next: Style,
    pending: Style,
) -> Text<'static> {
    let mut lines = Vec::new();
    let mut spans = Vec::new();

    for (idx, c) in text.chars().enumerate() {
        let style = match cursor {
            Some(pos) if idx < pos => typed,
            Some(pos) if idx == pos => next,
            _ => pending,
        };
        if c == '\n' {
            lines.push(Line::from(std::mem::take(&mut spans)));
            continue;
        }
        spans.push(Span::styled(c.to_string(), style));
    }
    lines.push(Line::from(spans));

    Text::from(lines)
}
