use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub fn render_help(frame: &mut Frame, area: Rect) {
    let dialog_width = 60.min(area.width.saturating_sub(4));
    let dialog_height = 30.min(area.height.saturating_sub(4));

    let x = (area.width - dialog_width) / 2;
    let y = (area.height - dialog_height) / 2;

    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let heading = Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan);
    let help_text = vec![
        Line::from(Span::styled("Gallery", heading)),
        Line::from(""),
        Line::from("  j / ↓      Move down"),
        Line::from("  k / ↑      Move up"),
        Line::from("  g / G      Go to top / bottom"),
        Line::from("  Ctrl+d/u   Page down / up"),
        Line::from("  l / ↵      Open in lightbox"),
        Line::from("  r          Reload album"),
        Line::from("  a          Choose album"),
        Line::from(""),
        Line::from(Span::styled("Lightbox", heading)),
        Line::from(""),
        Line::from("  h / ←      Previous item"),
        Line::from("  l / →      Next item"),
        Line::from("  e / ↑      Edit alt text and caption"),
        Line::from("  d / ↓      Download"),
        Line::from("  Del / x    Delete item"),
        Line::from("  Esc / q    Close"),
        Line::from(""),
        Line::from(Span::styled("Edit panel", heading)),
        Line::from(""),
        Line::from("  Enter      Save and close"),
        Line::from("  Tab        Switch field"),
        Line::from("  Ctrl+E     Cancel editing"),
        Line::from(""),
        Line::from("  ?          Show this help"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, dialog_area);
}
