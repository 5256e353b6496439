use std::sync::Arc;

use parking_lot::Mutex;
use tale_audio_core::Gate;

/// Stand-in for the story log pane. Its contents belong to the execution
/// context, so clearing blocks until the context has actually cleared it;
/// a line written right after `clear` can never be wiped by it.
pub struct Transcript {
    gate: Gate,
    lines: Arc<Mutex<Vec<String>>>,
}

impl Transcript {
    pub fn new(gate: Gate) -> Self {
        Self {
            gate,
            lines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn write(&self, line: impl Into<String>) {
        let line = line.into();
        println!("{line}");
        let lines = Arc::clone(&self.lines);
        if let Err(err) = self.gate.run(move || lines.lock().push(line)) {
            tracing::warn!(%err, "transcript write dropped");
        }
    }

    pub fn clear(&self) {
        let lines = Arc::clone(&self.lines);
        if let Err(err) = self.gate.run_and_wait(move || lines.lock().clear()) {
            tracing::warn!(%err, "transcript clear failed");
        }
    }

    #[cfg(test)]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}
