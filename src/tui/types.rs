// TUI state, the effects handlers ask for, and the messages background
// tasks send back.

use std::time::Instant;

use ratatui::widgets::ListState;

use crate::api::ApiResponse;
use crate::errors::CliError;
use crate::illustration::{IllustrationPoll, PollOutcome};
use crate::poem::{ArchivedPoem, GeneratedPoem, PoemMode, PoemView};

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Write,
    Archive,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Write, Tab::Archive];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Write => "Write",
            Tab::Archive => "Archive",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Write => 0,
            Tab::Archive => 1,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Write => Tab::Archive,
            Tab::Archive => Tab::Write,
        }
    }
}

/// Overlay currently on top of the tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Main,
    ArchiveModal,
    Help,
}

// ============================================================================
// Poem, archive and illustration state
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Illustration {
    None,
    Pending { poem_id: String },
    Ready { url: Option<String> },
    Unavailable,
}

#[derive(Debug, Default)]
pub struct ArchiveState {
    pub items: Vec<ArchivedPoem>,
    pub list_state: ListState,
    pub loading: bool,
    pub loaded: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiHealth {
    Unknown,
    Online,
    Offline,
}

// ============================================================================
// Main App state
// ============================================================================

#[derive(Debug)]
pub struct App {
    pub tab: Tab,
    pub mode: Mode,
    pub should_quit: bool,

    pub api_url: String,
    pub api_health: ApiHealth,
    pub poem_mode: PoemMode,

    pub input: Vec<char>,
    pub cursor: usize,

    pub poem: Option<PoemView>,
    pub loading: bool,
    pub error: Option<String>,
    /// Bumped whenever an in-flight generation stops mattering; results
    /// carrying an older value are dropped.
    pub request_seq: u64,

    pub archive: ArchiveState,
    pub selected_archive_id: Option<String>,

    pub illustration: Illustration,
    pub illustration_poll: Option<IllustrationPoll>,

    pub show_similar: bool,
    pub scroll: u16,
    pub status: String,
    pub spinner_step: u64,
    pub spinner_last: Instant,
}

impl App {
    pub fn new(api_url: String, poem_mode: PoemMode) -> Self {
        Self {
            tab: Tab::Write,
            mode: Mode::Main,
            should_quit: false,
            api_url,
            api_health: ApiHealth::Unknown,
            poem_mode,
            input: Vec::new(),
            cursor: 0,
            poem: None,
            loading: false,
            error: None,
            request_seq: 0,
            archive: ArchiveState::default(),
            selected_archive_id: None,
            illustration: Illustration::None,
            illustration_poll: None,
            show_similar: false,
            scroll: 0,
            status: "Ready. Enter writes, Tab switches view, F1 help.".to_string(),
            spinner_step: 0,
            spinner_last: Instant::now(),
        }
    }

    pub fn prompt(&self) -> String {
        self.input.iter().collect()
    }

    /// Stops the poll timer and forgets the illustration.
    pub fn stop_illustration(&mut self) {
        if let Some(poll) = self.illustration_poll.take() {
            poll.stop();
        }
        self.illustration = Illustration::None;
    }

    pub fn selected_archive_item(&self) -> Option<&ArchivedPoem> {
        self.archive
            .list_state
            .selected()
            .and_then(|idx| self.archive.items.get(idx))
    }

    pub fn illustration_url(&self) -> Option<&str> {
        match &self.illustration {
            Illustration::Ready { url } => url.as_deref(),
            _ => None,
        }
    }
}

// ============================================================================
// Effects and async messages
// ============================================================================

/// Work a handler wants done outside the state update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Generate {
        seq: u64,
        prompt: String,
        mode: PoemMode,
    },
    LoadArchive,
    PollIllustration {
        seq: u64,
        poem_id: String,
    },
    OpenUrl(String),
}

#[derive(Debug)]
pub enum TuiMsg {
    Generated {
        seq: u64,
        result: Result<GeneratedPoem, CliError>,
    },
    Archive(Result<Vec<ArchivedPoem>, CliError>),
    Illustration {
        seq: u64,
        outcome: PollOutcome,
    },
    Health(Result<ApiResponse, CliError>),
}
