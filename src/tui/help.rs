use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn keybind(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        keybind("↑/↓ tab", 5, "Move between fields"),
        keybind("←/→ space", 3, "Switch payment mode (on Payment Mode)"),
        keybind("enter", 7, "Submit registration"),
        keybind("backspace", 3, "Delete last character"),
        keybind("Ctrl-U", 6, "Clear field"),
        keybind("esc", 9, "Dismiss banner / close help"),
        keybind("Ctrl-Y", 6, "Copy last document id to clipboard"),
        keybind("F1", 10, "Toggle this help"),
        keybind("Ctrl-C", 6, "Quit"),
        Line::from(""),
        Line::from("Fields marked * are required. Transaction Hash is required"),
        Line::from("only when Online Mode is selected."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
