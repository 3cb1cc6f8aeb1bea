use crate::error::SubmitError;
use crate::model::{FieldId, SubmitStatus};
use crate::orchestrator::{FormController, PendingSubmission};
use crate::schema::{self, FieldKind, FieldSpec};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

pub struct UiState {
    pub form: FormController,
    /// Index into the currently visible fields.
    pub focus: usize,
    pub info: String,
    pub show_help: bool,
    pub event_name: String,
    pub payment_reference: String,
}

/// What the event loop should do after a key press.
#[derive(Debug)]
pub enum KeyAction {
    Nothing,
    Quit,
    Write(PendingSubmission),
    Copy(String),
}

impl UiState {
    pub fn new(form: FormController, event_name: String, payment_reference: String) -> Self {
        Self {
            form,
            focus: 0,
            info: String::new(),
            show_help: false,
            event_name,
            payment_reference,
        }
    }

    pub fn visible_fields(&self) -> Vec<&'static FieldSpec> {
        schema::visible_fields(self.form.record().payment_method)
    }

    pub fn focused_field(&self) -> FieldId {
        let fields = self.visible_fields();
        fields[self.focus.min(fields.len() - 1)].id
    }

    fn clamp_focus(&mut self) {
        let n = self.visible_fields().len();
        if self.focus >= n {
            self.focus = n - 1;
        }
    }

    fn move_focus(&mut self, forward: bool) {
        let n = self.visible_fields().len();
        self.focus = if forward {
            (self.focus + 1) % n
        } else {
            (self.focus + n - 1) % n
        };
    }

    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) {
        let field = self.focused_field();
        let mut value = self.form.record().get(field).to_string();
        edit(&mut value);
        if let Err(e) = self.form.update_field(field, &value) {
            self.info = e;
        }
    }

    fn toggle_payment(&mut self) {
        let next = self.form.record().payment_method.toggled();
        if let Err(e) = self.form.update_field(FieldId::PaymentMethod, next.as_str()) {
            self.info = e;
        }
        self.clamp_focus();
    }

    /// Shown after leaving the alternate screen when a write is still running.
    pub fn exit_notice(&self) -> Option<&'static str> {
        self.form
            .is_submitting()
            .then_some("Waiting for the pending registration to finish before exiting...")
    }

    fn submit(&mut self) -> KeyAction {
        if self.form.is_submitting() {
            self.info = "Transmitting... please wait".into();
            return KeyAction::Nothing;
        }
        match self.form.begin_submit() {
            Ok(pending) => {
                self.info = "Transmitting...".into();
                KeyAction::Write(pending)
            }
            Err(SubmitError::InProgress) => KeyAction::Nothing,
            Err(_) => {
                // Banner already carries the message.
                self.info.clear();
                KeyAction::Nothing
            }
        }
    }

    /// Apply one key press to the form.
    pub fn handle_key(&mut self, k: KeyEvent) -> KeyAction {
        let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
        match (ctrl, k.code) {
            (true, KeyCode::Char('c')) | (true, KeyCode::Char('q')) => return KeyAction::Quit,
            (true, KeyCode::Char('y')) => {
                return match self.form.last_document() {
                    Some(doc) => KeyAction::Copy(doc.id().to_string()),
                    None => {
                        self.info = "No registration submitted yet.".into();
                        KeyAction::Nothing
                    }
                };
            }
            (true, KeyCode::Char('u')) => {
                if self.focused_field() != FieldId::PaymentMethod {
                    self.edit_focused(|v| v.clear());
                }
                return KeyAction::Nothing;
            }
            (true, _) => return KeyAction::Nothing,
            _ => {}
        }

        if self.show_help {
            if matches!(k.code, KeyCode::Esc | KeyCode::F(1)) {
                self.show_help = false;
            }
            return KeyAction::Nothing;
        }

        let on_payment = self.focused_field() == FieldId::PaymentMethod;
        match k.code {
            KeyCode::F(1) => self.show_help = true,
            KeyCode::Esc => {
                if self.form.status() != SubmitStatus::Idle {
                    self.form.dismiss_status();
                }
            }
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            KeyCode::Enter => return self.submit(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if on_payment => {
                self.toggle_payment()
            }
            KeyCode::Backspace if !on_payment => self.edit_focused(|v| {
                v.pop();
            }),
            KeyCode::Char(c) if !on_payment => self.edit_focused(|v| v.push(c)),
            _ => {}
        }
        KeyAction::Nothing
    }
}

pub fn field_line(spec: &FieldSpec, value: &str, focused: bool, width: u16) -> Line<'static> {
    let marker = if focused { "▶ " } else { "  " };
    let label_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let mut spans = vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(format!("{:<17}", spec.label), label_style),
        Span::styled(
            if spec.requirement == schema::Requirement::Optional {
                "  "
            } else {
                "* "
            },
            Style::default().fg(Color::Red),
        ),
    ];

    if spec.kind == FieldKind::Choice {
        let method = match value.parse::<crate::model::PaymentMethod>() {
            Ok(m) => m,
            Err(_) => crate::model::PaymentMethod::Offline,
        };
        spans.push(Span::raw("◀ "));
        spans.push(Span::styled(
            method.label(),
            Style::default().fg(Color::Magenta),
        ));
        spans.push(Span::raw(" ▶"));
        return Line::from(spans);
    }

    // Keep the tail of long values visible while typing.
    let avail = width.saturating_sub(24).max(8) as usize;
    if value.is_empty() {
        spans.push(Span::styled(
            spec.placeholder,
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        let chars: Vec<char> = value.chars().collect();
        let shown: String = if chars.len() > avail {
            chars[chars.len() - avail..].iter().collect()
        } else {
            value.to_string()
        };
        spans.push(Span::raw(shown));
    }
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}

/// Append `label: value` to a bordered panel, wrapping the value onto
/// indented continuation lines. Long payment references (URLs, UPI ids)
/// have no spaces to break on, so the split is per character.
pub fn push_wrapped_kv(out: &mut Vec<Line<'static>>, label: &str, value: &str, panel_width: u16) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Two border columns plus one column of padding on each side.
    let inner = panel_width.saturating_sub(4).max(1) as usize;
    let head = format!("{label}:");
    let first_room = inner.saturating_sub(head.chars().count() + 1).max(1);
    let rest_room = inner.saturating_sub(2).max(1);

    let chars: Vec<char> = value.chars().collect();
    let (first, mut rest) = chars.split_at(first_room.min(chars.len()));
    out.push(Line::from(vec![
        Span::styled(head, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::raw(first.iter().collect::<String>()),
    ]));
    while !rest.is_empty() {
        let (chunk, tail) = rest.split_at(rest_room.min(rest.len()));
        out.push(Line::from(vec![
            Span::raw("  "),
            Span::raw(chunk.iter().collect::<String>()),
        ]));
        rest = tail;
    }
}
