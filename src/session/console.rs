//! Timestamped trace buffer.
//!
//! Every session operation narrates what it did here, one human-readable
//! line at a time. Lines are also mirrored to the `log` facade at debug
//! level.

use chrono::Local;
use log::debug;

pub const WELCOME_BANNER: &str = "[NetSim] Console initialised. Welcome to the network simulator.";
pub const CLEARED_BANNER: &str = "[NetSim] Console cleared.";
pub const RESET_BANNER: &str = "[NetSim] Topology reset.";

#[derive(Debug, Clone)]
pub struct Console {
    lines: Vec<String>,
    max_lines: Option<usize>,
}

impl Console {
    /// New console holding only the welcome banner.
    ///
    /// With `max_lines` set, the oldest lines are dropped once the buffer
    /// grows past it.
    pub fn new(max_lines: Option<usize>) -> Self {
        Console {
            lines: vec![WELCOME_BANNER.to_string()],
            max_lines,
        }
    }

    /// Append `message` prefixed with the local wall-clock time
    pub fn log(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        debug!("{}", message);
        let timestamp = Local::now().format("%H:%M:%S");
        self.lines.push(format!("[{}] {}", timestamp, message));
        self.enforce_cap();
    }

    /// Replace the whole buffer with a single banner line
    pub fn reset(&mut self, banner: &str) {
        self.lines.clear();
        self.lines.push(banner.to_string());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    fn enforce_cap(&mut self) {
        if let Some(max) = self.max_lines {
            if self.lines.len() > max {
                let excess = self.lines.len() - max;
                self.lines.drain(..excess);
            }
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(None)
    }
}
