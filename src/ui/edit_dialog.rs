//! Edit panel for a content item's alt text and caption.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Which field of the panel has the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditField {
    #[default]
    Alt,
    Caption,
}

/// Single-line text buffer with a cursor counted in chars.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    pub text: String,
    pub cursor: usize,
}

impl TextField {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_offset(&self, cursor: usize) -> usize {
        self.text
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn char_at(&self, cursor: usize) -> Option<char> {
        self.text.chars().nth(cursor)
    }

    pub fn handle_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_offset(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_offset(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn move_cursor_word_left(&mut self) {
        while self.cursor > 0 && self.char_at(self.cursor - 1) == Some(' ') {
            self.cursor -= 1;
        }
        while self.cursor > 0 && self.char_at(self.cursor - 1) != Some(' ') {
            self.cursor -= 1;
        }
    }

    pub fn move_cursor_word_right(&mut self) {
        let len = self.len();
        while self.cursor < len && self.char_at(self.cursor) != Some(' ') {
            self.cursor += 1;
        }
        while self.cursor < len && self.char_at(self.cursor) == Some(' ') {
            self.cursor += 1;
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

/// Panel state, populated from the item when the panel is shown.
pub struct EditPropertiesDialog {
    pub alt: TextField,
    pub caption: TextField,
    pub focus: EditField,
    original_alt: String,
    original_caption: String,
}

impl EditPropertiesDialog {
    pub fn new(alt: &str, caption: &str) -> Self {
        Self {
            alt: TextField::new(alt),
            caption: TextField::new(caption),
            focus: EditField::default(),
            original_alt: alt.to_string(),
            original_caption: caption.to_string(),
        }
    }

    pub fn focused_mut(&mut self) -> &mut TextField {
        match self.focus {
            EditField::Alt => &mut self.alt,
            EditField::Caption => &mut self.caption,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            EditField::Alt => EditField::Caption,
            EditField::Caption => EditField::Alt,
        };
    }

    pub fn revert(&mut self) {
        self.alt = TextField::new(&self.original_alt);
        self.caption = TextField::new(&self.original_caption);
    }

    pub fn is_modified(&self) -> bool {
        self.alt.text != self.original_alt || self.caption.text != self.original_caption
    }
}

pub fn render(frame: &mut Frame, dialog: &EditPropertiesDialog, area: Rect) {
    let dialog_width = 70.min(area.width.saturating_sub(4));
    let dialog_height = 14.min(area.height.saturating_sub(4));

    let x = area.x + (area.width.saturating_sub(dialog_width)) / 2;
    let y = area.y + (area.height.saturating_sub(dialog_height)) / 2;

    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Alt text
            Constraint::Min(3),    // Caption
            Constraint::Length(3), // Help
        ])
        .margin(1)
        .split(dialog_area);

    let title = if dialog.is_modified() {
        " Edit Properties [modified] "
    } else {
        " Edit Properties "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);
    frame.render_widget(block, dialog_area);

    render_field(frame, &dialog.alt, " Alt text ", dialog.focus == EditField::Alt, chunks[0]);
    render_field(frame, &dialog.caption, " Caption ", dialog.focus == EditField::Caption, chunks[1]);

    let help_text = vec![
        Line::from("Enter=save | Tab=switch field | Esc=close"),
        Line::from("Ctrl+E=cancel edit | Ctrl+U=clear | Ctrl+R=revert"),
    ];
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[2]);
}

fn render_field(frame: &mut Frame, field: &TextField, title: &str, focused: bool, area: Rect) {
    let line = if focused {
        let split = field
            .text
            .char_indices()
            .nth(field.cursor)
            .map(|(i, _)| i)
            .unwrap_or(field.text.len());
        let (before, after) = field.text.split_at(split);
        match after.chars().next() {
            Some(cursor_char) => Line::from(vec![
                Span::raw(before),
                Span::styled(
                    cursor_char.to_string(),
                    Style::default().bg(Color::White).fg(Color::Black),
                ),
                Span::raw(&after[cursor_char.len_utf8()..]),
            ]),
            None => Line::from(vec![
                Span::raw(before),
                Span::styled(" ", Style::default().bg(Color::White)),
            ]),
        }
    } else {
        Line::from(field.text.as_str())
    };

    let border = if focused { Color::Green } else { Color::DarkGray };
    let widget = Paragraph::new(vec![line])
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(title),
        );
    frame.render_widget(widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_handles_multibyte_text() {
        let mut field = TextField::new("café");
        assert_eq!(field.cursor, 4);
        field.backspace();
        assert_eq!(field.text, "caf");
        field.handle_char('é');
        field.move_cursor_home();
        field.handle_char('¡');
        assert_eq!(field.text, "¡café");
        field.delete();
        assert_eq!(field.text, "¡afé");
    }

    #[test]
    fn test_word_movement() {
        let mut field = TextField::new("sunset over the bay");
        field.move_cursor_word_left();
        assert_eq!(field.cursor, 16);
        field.move_cursor_word_left();
        assert_eq!(field.cursor, 12);
        field.move_cursor_word_right();
        assert_eq!(field.cursor, 16);
    }

    #[test]
    fn test_dialog_tracks_modification_and_reverts() {
        let mut dialog = EditPropertiesDialog::new("Beach", "");
        assert!(!dialog.is_modified());

        dialog.toggle_focus();
        dialog.focused_mut().handle_char('!');
        assert_eq!(dialog.caption.text, "!");
        assert!(dialog.is_modified());

        dialog.revert();
        assert!(!dialog.is_modified());
        assert_eq!(dialog.focus, EditField::Caption);
    }
}
