use std::time::{Duration, Instant};

/// How long a notice stays up before it expires on its own
pub const NOTICE_TTL: Duration = Duration::from_secs(2);

/// Title of the configuration picker
pub const PROMPT_TITLE: &str = "Run configuration";

/// A short-lived notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub shown_at: Instant,
}

/// A pending choice between run configurations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPrompt {
    pub names: Vec<String>,
    pub selected: usize,
}

impl SelectionPrompt {
    pub fn new(names: Vec<String>) -> Self {
        Self { names, selected: 0 }
    }

    pub fn next(&mut self) {
        if self.names.is_empty() {
            return;
        }
        self.selected = if self.selected >= self.names.len() - 1 {
            0
        } else {
            self.selected + 1
        };
    }

    pub fn previous(&mut self) {
        if self.names.is_empty() {
            return;
        }
        self.selected = if self.selected == 0 {
            self.names.len() - 1
        } else {
            self.selected - 1
        };
    }
}

/// Everything the UI shows for a session
#[derive(Debug, Clone)]
pub struct Screen {
    /// Text typed but not yet sent
    pub input: String,
    /// Output of the running process, append-only
    pub output: String,
    pub title: String,
    default_title: String,
    notice: Option<Notice>,
    prompt: Option<SelectionPrompt>,
}

impl Screen {
    pub fn new(default_title: impl Into<String>) -> Self {
        let default_title = default_title.into();
        Self {
            input: String::new(),
            output: String::new(),
            title: default_title.clone(),
            default_title,
            notice: None,
            prompt: None,
        }
    }

    #[cfg(test)]
    pub fn default_title(&self) -> &str {
        &self.default_title
    }

    pub fn reset_title(&mut self) {
        self.title = self.default_title.clone();
    }

    /// Clear input and output views
    pub fn clear_views(&mut self) {
        self.input.clear();
        self.output.clear();
    }

    pub fn append_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Show a notice, replacing any current one
    pub fn show_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    pub fn cancel_notice(&mut self) {
        self.notice = None;
    }

    /// Drop the notice once it has been up for `ttl`
    pub fn expire_notice(&mut self, now: Instant, ttl: Duration) {
        if let Some(notice) = &self.notice {
            if now.saturating_duration_since(notice.shown_at) >= ttl {
                self.notice = None;
            }
        }
    }

    pub fn prompt(&self) -> Option<&SelectionPrompt> {
        self.prompt.as_ref()
    }

    pub fn prompt_mut(&mut self) -> Option<&mut SelectionPrompt> {
        self.prompt.as_mut()
    }

    pub fn open_prompt(&mut self, names: Vec<String>) {
        self.prompt = Some(SelectionPrompt::new(names));
    }

    pub fn close_prompt(&mut self) -> Option<SelectionPrompt> {
        self.prompt.take()
    }
}
