//! Write loop.
//!
//! Receives validated submissions from the UI thread, runs the store write on
//! the runtime, and reports the outcome back as events.

use super::form::PendingSubmission;
use crate::error::StoreError;
use crate::model::DocumentRef;
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Duration;

/// Commands emitted by UI layers.
#[derive(Debug)]
pub(crate) enum UiCommand {
    Write(PendingSubmission),
    Quit,
}

/// Events sent back to UI layers.
#[derive(Debug, Clone)]
pub(crate) enum FormEvent {
    Info(String),
    WriteFinished(Result<DocumentRef, StoreError>),
}

type WriteHandle = tokio::task::JoinHandle<Result<DocumentRef, StoreError>>;

/// Serve write requests until the UI quits.
pub(crate) async fn run_controller(
    event_tx: UnboundedSender<FormEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut in_flight: Option<WriteHandle> = None;
    let mut quit_pending = false;
    // Keep the user informed if a write is slow to return.
    let mut slow_deadline: Option<tokio::time::Instant> = None;
    let mut watchdog = tokio::time::interval(Duration::from_millis(500));

    loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if !quit_pending => {
                match cmd {
                    Some(UiCommand::Write(pending)) => {
                        if in_flight.is_some() {
                            // The form guards against this; drop rather than overlap writes.
                            tracing::warn!("write requested while another is in flight; dropped");
                            continue;
                        }
                        in_flight = Some(tokio::spawn(pending.write()));
                        slow_deadline = Some(tokio::time::Instant::now() + Duration::from_secs(5));
                    }
                    Some(UiCommand::Quit) | None => {
                        quit_pending = true;
                        if in_flight.is_none() {
                            break;
                        }
                        tracing::info!("waiting for in-flight write before exit");
                        let _ = event_tx.send(FormEvent::Info(
                            "Waiting for submission to finish…".into(),
                        ));
                    }
                }
            }
            // The handle stays in place until this branch wins, so a losing
            // branch never drops it.
            join_res = async {
                match in_flight.as_mut() {
                    Some(h) => h.await,
                    None => futures::future::pending().await,
                }
            } => {
                in_flight = None;
                slow_deadline = None;
                let outcome = match join_res {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(error = %e, "write task failed");
                        Err(StoreError::Transport(format!("write task failed: {e}")))
                    }
                };
                let _ = event_tx.send(FormEvent::WriteFinished(outcome));
                if quit_pending {
                    break;
                }
            }
            _ = watchdog.tick() => {
                if let Some(deadline) = slow_deadline {
                    if tokio::time::Instant::now() >= deadline && in_flight.is_some() {
                        let _ = event_tx.send(FormEvent::Info("Still transmitting…".into()));
                        slow_deadline = None;
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::orchestrator::FormController;
    use crate::store::MemoryStore;
    use crate::validate::filled_record;
    use std::sync::Arc;
    use time::macros::datetime;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn writes_and_reports_then_quits() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock(datetime!(2025-02-01 10:00:00 UTC)));
        let mut form = FormController::new(store.clone(), clock).with_record(filled_record());

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let loop_handle = tokio::spawn(run_controller(event_tx, cmd_rx));

        cmd_tx
            .send(UiCommand::Write(form.begin_submit().unwrap()))
            .unwrap();

        let outcome = loop {
            match event_rx.recv().await {
                Some(FormEvent::WriteFinished(outcome)) => break outcome,
                Some(FormEvent::Info(_)) => continue,
                None => panic!("controller exited early"),
            }
        };
        form.finish_submit(outcome);
        assert_eq!(form.status(), crate::model::SubmitStatus::Success);
        assert_eq!(store.len(), 1);

        cmd_tx.send(UiCommand::Quit).unwrap();
        loop_handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn quit_waits_for_in_flight_write() {
        let store = Arc::new(MemoryStore::failing("quota exceeded"));
        let clock = Arc::new(FixedClock(datetime!(2025-02-01 10:00:00 UTC)));
        let mut form = FormController::new(store, clock).with_record(filled_record());

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        cmd_tx
            .send(UiCommand::Write(form.begin_submit().unwrap()))
            .unwrap();
        cmd_tx.send(UiCommand::Quit).unwrap();
        drop(cmd_tx);

        run_controller(event_tx, cmd_rx).await.unwrap();

        let mut finished = None;
        while let Ok(ev) = event_rx.try_recv() {
            if let FormEvent::WriteFinished(outcome) = ev {
                finished = Some(outcome);
            }
        }
        assert_eq!(
            finished,
            Some(Err(StoreError::rejected("quota exceeded")))
        );
    }

    /// Takes a full minute (of paused test time) to accept any write.
    struct SlowStore;

    #[async_trait::async_trait]
    impl crate::store::DocumentStore for SlowStore {
        async fn create_document(
            &self,
            collection: &str,
            _doc: &crate::model::StoredRegistration,
        ) -> Result<DocumentRef, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(DocumentRef::new(format!("slow/{collection}/1")))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_write_reports_progress_and_quit_waits() {
        let clock = Arc::new(FixedClock(datetime!(2025-02-01 10:00:00 UTC)));
        let mut form = FormController::new(Arc::new(SlowStore), clock).with_record(filled_record());

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let loop_handle = tokio::spawn(run_controller(event_tx, cmd_rx));

        let started = tokio::time::Instant::now();
        cmd_tx
            .send(UiCommand::Write(form.begin_submit().unwrap()))
            .unwrap();

        match event_rx.recv().await {
            Some(FormEvent::Info(msg)) => assert_eq!(msg, "Still transmitting…"),
            other => panic!("expected a progress notice, got {other:?}"),
        }
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(5) && waited < Duration::from_secs(6));

        cmd_tx.send(UiCommand::Quit).unwrap();
        match event_rx.recv().await {
            Some(FormEvent::Info(msg)) => assert_eq!(msg, "Waiting for submission to finish…"),
            other => panic!("expected a wait notice, got {other:?}"),
        }
        match event_rx.recv().await {
            Some(FormEvent::WriteFinished(outcome)) => form.finish_submit(outcome),
            other => panic!("expected the write outcome, got {other:?}"),
        }
        assert!(started.elapsed() >= Duration::from_secs(60));
        assert_eq!(form.last_document().map(|d| d.id()), Some("1"));
        loop_handle.await.unwrap().unwrap();
    }
}
