//! In-memory engine for driver tests.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::engine::Engine;

/// Ports share one value table: writing a settable id is visible when the
/// same id is read back as gettable.
#[derive(Debug, Default)]
pub(crate) struct MockEngine {
    pub settable: HashMap<u32, i32>,
    pub gettable: HashMap<u32, i32>,
    pub values: HashMap<u32, Vec<u8>>,
    pub writes: Vec<(u32, Vec<u8>)>,
    pub advances: Vec<i32>,
    pub reads: usize,
    pub time: i64,
    /// `(id, time, value)`: store `value` once simulated time reaches `time`.
    pub scheduled: Vec<(u32, i64, Vec<u8>)>,
    /// Printed one entry per advance, then held until `flush_output`
    /// appends it to `log_path`.
    pub log_output: Vec<Vec<u8>>,
    pub log_path: Option<PathBuf>,
    pub unflushed: Vec<u8>,
    pub events: Vec<String>,
}

impl MockEngine {
    pub fn with_settable(mut self, id: u32, width: i32) -> Self {
        self.settable.insert(id, width);
        self
    }

    pub fn with_gettable(mut self, id: u32, width: i32) -> Self {
        self.gettable.insert(id, width);
        self
    }

    pub fn with_value(mut self, id: u32, value: Vec<u8>) -> Self {
        self.values.insert(id, value);
        self
    }

    pub fn schedule(mut self, id: u32, time: i64, value: Vec<u8>) -> Self {
        self.scheduled.push((id, time, value));
        self
    }

    pub fn logging(mut self, path: &Path, output: &[&[u8]]) -> Self {
        self.log_path = Some(path.to_path_buf());
        self.log_output = output.iter().rev().map(|chunk| chunk.to_vec()).collect();
        self
    }
}

impl Engine for MockEngine {
    fn settable_width(&self, id: u32) -> Option<i32> {
        self.settable.get(&id).copied()
    }

    fn gettable_width(&self, id: u32) -> Option<i32> {
        self.gettable.get(&id).copied()
    }

    fn write_port(&mut self, id: u32, value: &[u8]) {
        self.writes.push((id, value.to_vec()));
        self.values.insert(id, value.to_vec());
    }

    fn read_port(&mut self, id: u32, value: &mut [u8]) {
        self.reads += 1;
        if let Some(stored) = self.values.get(&id) {
            let len = stored.len().min(value.len());
            value[..len].copy_from_slice(&stored[..len]);
        }
    }

    fn advance(&mut self, timesteps: i32) {
        self.advances.push(timesteps);
        self.time += i64::from(timesteps);
        let now = self.time;
        let (due, pending): (Vec<_>, Vec<_>) = self
            .scheduled
            .drain(..)
            .partition(|(_, time, _)| *time <= now);
        self.scheduled = pending;
        for (id, _, value) in due {
            self.values.insert(id, value);
        }

        if let Some(chunk) = self.log_output.pop() {
            self.unflushed.extend_from_slice(&chunk);
        }
    }

    fn flush_output(&mut self) {
        let Some(path) = self.log_path.as_ref() else {
            return;
        };
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .and_then(|mut file| file.write_all(&self.unflushed))
            .unwrap();
        self.unflushed.clear();
    }

    fn trace_init(&mut self, path: &Path) {
        self.events.push(format!("init {}", path.display()));
    }

    fn trace_enable(&mut self) {
        self.events.push("enable".to_string());
    }

    fn trace_disable(&mut self) {
        self.events.push("disable".to_string());
    }

    fn finish(&mut self) {
        self.events.push("finish".to_string());
    }
}
