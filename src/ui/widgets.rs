//! Custom TUI widgets

use super::app::display_key;
use crate::capture::{PageEvent, WireEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::collections::VecDeque;

/// Status of a summary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Ok,
    Warning,
    Info,
}

/// A single label/value line in the summary panel
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    pub label: String,
    pub value: String,
    pub status: EntryStatus,
}

impl SummaryEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>, status: EntryStatus) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            status,
        }
    }

    pub fn info(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, EntryStatus::Info)
    }
}

/// Widget for the session summary
pub struct SummaryPanel<'a> {
    entries: &'a [SummaryEntry],
}

impl<'a> SummaryPanel<'a> {
    pub fn new(entries: &'a [SummaryEntry]) -> Self {
        Self { entries }
    }

    fn status_color(status: EntryStatus) -> Color {
        match status {
            EntryStatus::Ok => Color::Green,
            EntryStatus::Warning => Color::Yellow,
            EntryStatus::Info => Color::Cyan,
        }
    }

    fn status_symbol(status: EntryStatus) -> &'static str {
        match status {
            EntryStatus::Ok => "[OK]",
            EntryStatus::Warning => "[!!]",
            EntryStatus::Info => "[--]",
        }
    }
}

impl<'a> Widget for SummaryPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Session ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        let inner = block.inner(area);
        block.render(area, buf);

        for (i, entry) in self.entries.iter().enumerate() {
            if i as u16 >= inner.height {
                break;
            }
            let color = Self::status_color(entry.status);

            let line = Line::from(vec![
                Span::styled(
                    format!("{} ", Self::status_symbol(entry.status)),
                    Style::default().fg(color),
                ),
                Span::styled(
                    format!("{}: ", entry.label),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(entry.value.as_str(), Style::default().fg(color)),
            ]);

            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }
    }
}

/// Widget listing the most recent events sent to the server
pub struct RecordsPanel<'a> {
    records: &'a VecDeque<WireEvent>,
}

impl<'a> RecordsPanel<'a> {
    pub fn new(records: &'a VecDeque<WireEvent>) -> Self {
        Self { records }
    }

    fn format_line(event: &WireEvent) -> Line<'static> {
        match event {
            WireEvent::Keystroke(record) => Line::from(vec![
                Span::styled(
                    format!(" {:<12}", display_key(&record.key)),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("press {:>10.1}  ", record.press_time),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!("hold {:>7.1}  ", record.hold_time),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(
                    format!("flight {:>9.1}", record.flight_time),
                    Style::default().fg(Color::Cyan),
                ),
            ]),
            WireEvent::Visibility(record) => {
                let color = match record.event {
                    PageEvent::PageHidden => Color::Yellow,
                    PageEvent::PageVisible => Color::Green,
                };
                Line::from(Span::styled(
                    format!(" {:<12}at    {:>10.1}", record.event.as_str(), record.timestamp),
                    Style::default().fg(color),
                ))
            }
        }
    }
}

impl<'a> Widget for RecordsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Sent (ms) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        let inner = block.inner(area);
        block.render(area, buf);

        if self.records.is_empty() {
            buf.set_string(
                inner.x,
                inner.y,
                " Type to start capturing",
                Style::default().fg(Color::DarkGray),
            );
            return;
        }

        for (i, event) in self.records.iter().enumerate() {
            if i as u16 >= inner.height {
                break;
            }
            buf.set_line(inner.x, inner.y + i as u16, &Self::format_line(event), inner.width);
        }
    }
}

/// Widget for the help screen
pub struct HelpPanel;

impl Widget for HelpPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Help - Keystroke Stream")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);
        block.render(area, buf);

        let help_text = [
            "",
            " CONTROLS",
            " -----------",
            " q / Esc / Ctrl+C : Quit",
            " ?                : Toggle this help",
            " e                : Export session report to JSON",
            " r                : Reset statistics",
            "",
            " CAPTURE",
            " -----------",
            " Every key press and release is timed and sent to the server",
            " once the key is released: press, hold, release and flight time.",
            " Capture pauses while this terminal window is not focused.",
            "",
            " Control keys above are captured too.",
        ];

        for (i, line) in help_text.iter().enumerate() {
            if i as u16 >= inner.height {
                break;
            }
            let style = if line.contains("---") {
                Style::default().fg(Color::DarkGray)
            } else if line.len() > 1 && line[1..].chars().all(|c| c.is_uppercase()) {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            buf.set_string(inner.x, inner.y + i as u16, line, style);
        }
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    state: &'a str,
    view: &'a str,
    elapsed: &'a str,
    keystrokes: u64,
    message: Option<&'a str>,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a str, view: &'a str, elapsed: &'a str, keystrokes: u64) -> Self {
        Self {
            state,
            view,
            elapsed,
            keystrokes,
            message: None,
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg_style = Style::default().bg(Color::DarkGray).fg(Color::White);
        for x in area.x..area.x + area.width {
            buf.set_string(x, area.y, " ", bg_style);
        }

        let left = format!(" {} | {} ", self.state, self.view);
        buf.set_string(area.x, area.y, &left, bg_style.add_modifier(Modifier::BOLD));

        if let Some(msg) = self.message {
            let msg_style = Style::default().bg(Color::DarkGray).fg(Color::Yellow);
            let msg_x = area.x + (area.width / 2).saturating_sub(msg.len() as u16 / 2);
            buf.set_string(msg_x, area.y, msg, msg_style);
        }

        let right = format!(" {} | Sent: {} ", self.elapsed, self.keystrokes);
        let right_x = area.x + area.width.saturating_sub(right.len() as u16);
        buf.set_string(right_x, area.y, &right, bg_style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{KeystrokeRecord, VisibilityRecord};

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn records_panel_shows_placeholder_when_empty() {
        let records = VecDeque::new();
        let area = Rect::new(0, 0, 60, 5);
        let mut buf = Buffer::empty(area);
        RecordsPanel::new(&records).render(area, &mut buf);
        assert!(buffer_text(&buf).contains("Type to start capturing"));
    }

    #[test]
    fn records_panel_lists_keystrokes_and_visibility() {
        let mut records = VecDeque::new();
        records.push_back(WireEvent::Keystroke(KeystrokeRecord {
            key: " ".to_string(),
            press_time: 100.0,
            hold_time: 50.0,
            release_time: 150.0,
            flight_time: 100.0,
        }));
        records.push_back(WireEvent::Visibility(VisibilityRecord {
            event: PageEvent::PageHidden,
            timestamp: 500.0,
        }));

        let area = Rect::new(0, 0, 70, 5);
        let mut buf = Buffer::empty(area);
        RecordsPanel::new(&records).render(area, &mut buf);
        let text = buffer_text(&buf);

        assert!(text.contains("Space"));
        assert!(text.contains("50.0"));
        assert!(text.contains("page_hidden"));
    }

    #[test]
    fn status_bar_renders_message() {
        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new("RUNNING", "Capture", "00:05", 3)
            .message(Some("Connected to server"))
            .render(area, &mut buf);
        let text = buffer_text(&buf);

        assert!(text.contains("RUNNING"));
        assert!(text.contains("Connected to server"));
        assert!(text.contains("Sent: 3"));
    }

    #[test]
    fn summary_panel_renders_entries() {
        let entries = vec![SummaryEntry::new("Server", "open", EntryStatus::Ok)];
        let area = Rect::new(0, 0, 40, 4);
        let mut buf = Buffer::empty(area);
        SummaryPanel::new(&entries).render(area, &mut buf);
        let text = buffer_text(&buf);

        assert!(text.contains("[OK]"));
        assert!(text.contains("Server: open"));
    }
}
