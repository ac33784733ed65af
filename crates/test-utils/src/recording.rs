use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use freshen::errors::Result;
use freshen::types::ChangeKind;
use freshen::watch::{RawEvent, SettledChangeHandler};

/// A settled-change handler that:
/// - records every `(kind, rel_path)` it is called with
/// - optionally re-injects one raw event from inside its first call, to
///   exercise events that arrive while the handler is running
/// - optionally stays busy for a fixed time on every call.
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<(ChangeKind, String)>>>,
    reinject: Option<(mpsc::UnboundedSender<RawEvent>, RawEvent)>,
    busy_for: Option<Duration>,
}

impl RecordingHandler {
    pub fn new(calls: Arc<Mutex<Vec<(ChangeKind, String)>>>) -> Self {
        Self {
            calls,
            reinject: None,
            busy_for: None,
        }
    }

    pub fn reinject_once(mut self, tx: mpsc::UnboundedSender<RawEvent>, event: RawEvent) -> Self {
        self.reinject = Some((tx, event));
        self
    }

    pub fn busy_for(mut self, duration: Duration) -> Self {
        self.busy_for = Some(duration);
        self
    }
}

impl SettledChangeHandler for RecordingHandler {
    fn on_settled_change<'a>(
        &'a mut self,
        kind: ChangeKind,
        rel_path: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            {
                let mut guard = self.calls.lock().unwrap();
                guard.push((kind, rel_path.to_string()));
            }
            if let Some((tx, event)) = self.reinject.take() {
                let _ = tx.send(event);
            }
            if let Some(duration) = self.busy_for {
                tokio::time::sleep(duration).await;
            }
            Ok(())
        })
    }
}
