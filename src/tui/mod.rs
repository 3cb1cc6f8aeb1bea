mod clipboard;
mod help;
mod state;

use crate::cli::Cli;
use crate::clock::SystemClock;
use crate::model::{FieldId, PaymentMethod, SubmitStatus};
use crate::orchestrator::{self, FormController, FormEvent, UiCommand};
use crate::store::{DocumentStore, MemoryStore};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use state::{KeyAction, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    // Store errors (bad config) surface before the terminal is taken over.
    let dry_run_store = args.dry_run.then(|| Arc::new(MemoryStore::new()));
    let store: Arc<dyn DocumentStore> = match &dry_run_store {
        Some(kept) => kept.clone(),
        None => crate::cli::build_store(&args)?,
    };
    let form = FormController::new(store, Arc::new(SystemClock));

    let (event_tx, event_rx) = mpsc::unbounded_channel::<FormEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, form, event_rx, cmd_tx));

    let res = orchestrator::run_controller(event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    if let Some(kept) = dry_run_store {
        eprintln!("{}", dry_run_summary(&kept));
    }

    res
}

fn dry_run_summary(kept: &MemoryStore) -> String {
    if kept.is_empty() {
        "Dry run: no registrations were accepted".into()
    } else {
        format!(
            "Dry run: {} registration(s) accepted and kept in memory, none sent",
            kept.len()
        )
    }
}

/// Run the TUI loop on a dedicated thread. The form controller lives here.
fn run_threaded(
    args: Cli,
    form: FormController,
    mut event_rx: UnboundedReceiver<FormEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::new(form, args.event_name.clone(), args.payment_reference.clone());
    if args.dry_run {
        state.info = "Dry run: submissions are not sent to Firestore".into();
    }

    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    // Ok(Some(notice)) when leaving with a write still in flight.
    let res: Result<Option<&'static str>> = loop {
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match state.handle_key(k) {
                    KeyAction::Nothing => {}
                    KeyAction::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(state.exit_notice());
                    }
                    KeyAction::Write(pending) => {
                        if cmd_tx.send(UiCommand::Write(pending)).is_err() {
                            // Writer gone: settle the form instead of leaving it busy.
                            state.form.finish_submit(Err(crate::error::StoreError::Transport(
                                "submission service stopped".into(),
                            )));
                        }
                    }
                    KeyAction::Copy(id) => match clipboard::copy_document_id(&id) {
                        Ok(()) => state.info = format!("✓ Copied to clipboard: {id}"),
                        Err(e) => state.info = format!("Clipboard copy failed: {e:#}"),
                    },
                }
                // Redraw promptly after input.
                terminal.draw(|f| draw(f.area(), f, &state)).ok();
                last_tick = Instant::now();
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();

    // The write loop finishes the write before exiting; say so on the plain terminal.
    if let Some(notice) = res? {
        eprintln!("{notice}");
    }
    Ok(())
}

fn apply_event(state: &mut UiState, ev: FormEvent) {
    match ev {
        FormEvent::Info(msg) => state.info = msg,
        FormEvent::WriteFinished(outcome) => {
            state.info = match &outcome {
                Ok(doc) => {
                    // The form is back to its defaults; start again at the top.
                    state.focus = 0;
                    format!("Stored as {} (Ctrl-Y to copy id)", doc.id())
                }
                Err(_) => String::new(),
            };
            state.form.finish_submit(outcome);
        }
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let online = state.form.record().payment_method == PaymentMethod::Online;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),                             // Header
                Constraint::Length(if online { 6 } else { 0 }),    // Payment panel
                Constraint::Min(0),                                // Fields
                Constraint::Length(3),                             // Submit + banner
                Constraint::Length(3),                             // Status
            ]
            .as_ref(),
        )
        .split(area);

    let header = Paragraph::new(Line::from(vec![Span::styled(
        format!("{}: Register here", state.event_name),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .block(Block::default().borders(Borders::ALL).title("team-register"));
    f.render_widget(header, chunks[0]);

    if state.show_help {
        let rest = Rect {
            y: chunks[1].y,
            height: area.height.saturating_sub(chunks[0].height),
            ..chunks[1]
        };
        help::draw_help(rest, f);
        return;
    }

    if online {
        draw_payment_panel(chunks[1], f, state);
    }
    draw_fields(chunks[2], f, state);
    draw_submit(chunks[3], f, state);
    draw_status(chunks[4], f, state);
}

fn draw_payment_panel(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines = vec![Line::from(Span::styled(
        "Quantum Payment Interface",
        Style::default().fg(Color::Magenta),
    ))];
    state::push_wrapped_kv(&mut lines, "Pay via", &state.payment_reference, area.width);
    lines.push(Line::from(Span::styled(
        "Input Transaction Hash below",
        Style::default().fg(Color::Gray),
    )));
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Payment"));
    f.render_widget(p, area);
}

fn draw_fields(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let focused = state.focused_field();
    let lines: Vec<Line> = state
        .visible_fields()
        .into_iter()
        .map(|spec| {
            state::field_line(
                spec,
                state.form.record().get(spec.id),
                spec.id == focused,
                area.width,
            )
        })
        .collect();

    let title = if focused == FieldId::PaymentMethod {
        "Registration (←/→ to change payment mode)"
    } else {
        "Registration"
    };
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_submit(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(0)].as_ref())
        .split(area);

    let (label, style) = if state.form.is_submitting() {
        ("Transmitting...", Style::default().fg(Color::DarkGray))
    } else {
        (
            "Engage Registry",
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )
    };
    let button = Paragraph::new(Line::from(Span::styled(format!(" {label} "), style)))
        .block(Block::default().borders(Borders::ALL).title("Enter"));
    f.render_widget(button, row[0]);

    let banner = match state.form.status() {
        SubmitStatus::Success => Some(Paragraph::new(Line::from(Span::styled(
            "✓ Registry Confirmed: Access Granted!",
            Style::default().fg(Color::Cyan),
        )))),
        SubmitStatus::Error => Some(Paragraph::new(Line::from(Span::styled(
            format!("✗ Error: {}", state.form.error_message()),
            Style::default().fg(Color::Red),
        )))),
        SubmitStatus::Idle => None,
    };
    if let Some(b) = banner {
        f.render_widget(
            b.block(Block::default().borders(Borders::ALL).title("Esc to dismiss")),
            row[1],
        );
    }
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let lines = vec![
        Line::from(vec![
            Span::styled("Info: ", Style::default().fg(Color::Gray)),
            Span::raw(state.info.clone()),
        ]),
    ];
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Keys: enter submit | tab move | esc dismiss | F1 help | Ctrl-C quit"),
    );
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StoredRegistration;

    #[tokio::test]
    async fn dry_run_summary_counts_kept_registrations() {
        let kept = MemoryStore::new();
        assert_eq!(
            dry_run_summary(&kept),
            "Dry run: no registrations were accepted"
        );

        let doc = StoredRegistration {
            record: Default::default(),
            timestamp: "2025-02-01T10:00:00.000Z".into(),
        };
        kept.create_document("registrations", &doc).await.unwrap();
        kept.create_document("registrations", &doc).await.unwrap();
        assert_eq!(
            dry_run_summary(&kept),
            "Dry run: 2 registration(s) accepted and kept in memory, none sent"
        );
    }
}
