//! Clipboard access for copying the stored document id.

use anyhow::{anyhow, Result};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

// Linux clipboard managers read the selection lazily, so each copy keeps
// its arboard handle alive for a short while on a background thread.
const HOLD_FOR: Duration = Duration::from_secs(2);

static COPY_QUEUE: OnceLock<Mutex<Sender<String>>> = OnceLock::new();

fn copy_queue() -> &'static Mutex<Sender<String>> {
    COPY_QUEUE.get_or_init(|| {
        let (tx, rx) = channel::<String>();
        std::thread::spawn(move || {
            for text in rx {
                let Ok(mut board) = arboard::Clipboard::new() else {
                    tracing::warn!("clipboard unavailable");
                    continue;
                };
                match board.set_text(text) {
                    Ok(()) => std::thread::sleep(HOLD_FOR),
                    Err(e) => tracing::warn!(error = %e, "clipboard write failed"),
                }
            }
        });
        Mutex::new(tx)
    })
}

/// Queue a document id for the clipboard without blocking the UI thread.
pub fn copy_document_id(id: &str) -> Result<()> {
    copy_queue()
        .lock()
        .map_err(|_| anyhow!("clipboard queue poisoned"))?
        .send(id.to_owned())
        .map_err(|_| anyhow!("clipboard thread stopped"))
}
