use std::collections::VecDeque;

use partview_vr::Notice;

/// One status-bar message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub timeout_ms: u32,
}

/// Collects status messages for the shell to display.
///
/// Keeps the last [`StatusBar::HISTORY`] messages; older ones are dropped
/// whether or not anyone took them.
#[derive(Debug, Default)]
pub struct StatusBar {
    messages: VecDeque<StatusMessage>,
}

impl StatusBar {
    pub const DEFAULT_TIMEOUT_MS: u32 = 2000;
    pub const HISTORY: usize = 32;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, text: impl Into<String>, timeout_ms: u32) {
        let text = text.into();
        log::info!("status: {text}");
        if self.messages.len() == Self::HISTORY {
            self.messages.pop_front();
        }
        self.messages.push_back(StatusMessage { text, timeout_ms });
    }

    pub fn notice(&mut self, notice: &Notice) {
        self.show(notice.to_string(), notice.timeout_ms());
    }

    /// The message currently on display.
    pub fn latest(&self) -> Option<&StatusMessage> {
        self.messages.back()
    }

    /// Number of messages kept.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn take(&mut self) -> Vec<StatusMessage> {
        self.messages.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_bounded() {
        let mut bar = StatusBar::new();
        for i in 0..100 {
            bar.show(format!("message {i}"), StatusBar::DEFAULT_TIMEOUT_MS);
        }

        assert_eq!(bar.len(), StatusBar::HISTORY);
        assert_eq!(bar.latest().map(|m| m.text.as_str()), Some("message 99"));

        let kept = bar.take();
        assert_eq!(kept[0].text, format!("message {}", 100 - StatusBar::HISTORY));
        assert!(bar.is_empty());
    }
}
