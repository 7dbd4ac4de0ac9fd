//! Application state and logic

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use ninja_core::{LoadState, Ninja, SaveEvent, SyncEngine, SyncError, SyncResult};

/// Amount a row starts with, and falls back to after every list change
const DEFAULT_AMOUNT: i64 = 1;

/// Shown when an edit is refused because the roster may not match the bin
const RELOAD_FIRST: &str = "Reload (r) before editing";

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Typing the name of a new ninja
    NewName,
    /// Typing the starting bucks of a new ninja
    NewBucks,
}

/// Save indicator shown in the top-right corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIndicator {
    /// Nothing written this session and nothing pending
    Idle,
    /// Write in progress
    Saving,
    /// Latest changes are in the bin
    Saved,
    /// Latest changes are not in the bin
    Unsaved,
}

/// Per-row amount being typed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAmount {
    pub value: i64,
    /// False until the user types into this row; the first digit then
    /// replaces the default instead of appending to it
    touched: bool,
}

impl Default for PendingAmount {
    fn default() -> Self {
        Self {
            value: DEFAULT_AMOUNT,
            touched: false,
        }
    }
}

impl PendingAmount {
    fn push_digit(&mut self, digit: u32) {
        let digit = i64::from(digit);
        if !self.touched {
            self.value = digit;
            self.touched = true;
        } else if let Some(value) = self.value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
            self.value = value;
        }
    }

    fn pop_digit(&mut self) {
        self.value /= 10;
        self.touched = true;
    }
}

/// Application state
pub struct App {
    /// Owner of the roster and its write-back
    pub engine: SyncEngine,
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Currently selected row
    pub selected: usize,
    /// One pending amount per row
    pub amounts: Vec<PendingAmount>,
    /// Name typed into the new-ninja form
    pub new_name: String,
    /// Starting bucks typed into the new-ninja form
    pub new_bucks: String,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<Instant>,
    /// Whether help overlay is visible
    pub show_help: bool,
    /// Whether a blocking reload is running
    pub is_loading: bool,
    /// When the last write landed
    pub last_saved_at: Option<DateTime<Local>>,
    /// Message of the last failed write, cleared by the next success
    pub last_save_error: Option<String>,
}

impl App {
    pub fn new(engine: SyncEngine) -> Self {
        let amounts = vec![PendingAmount::default(); engine.ninjas().len()];
        Self {
            engine,
            should_quit: false,
            input_mode: InputMode::Normal,
            selected: 0,
            amounts,
            new_name: String::new(),
            new_bucks: String::new(),
            status_message: None,
            status_message_time: None,
            show_help: false,
            is_loading: false,
            last_saved_at: None,
            last_save_error: None,
        }
    }

    pub fn ninjas(&self) -> &[Ninja] {
        self.engine.ninjas()
    }

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Check and clear expired status message
    pub fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > Duration::from_secs(3) {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Load failure message, if the last load failed
    pub fn load_error(&self) -> Option<&str> {
        match self.engine.load_state() {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn save_indicator(&self) -> SaveIndicator {
        if self.engine.is_saving() {
            SaveIndicator::Saving
        } else if self.engine.has_unsaved_changes() {
            SaveIndicator::Unsaved
        } else if self.last_saved_at.is_some() {
            SaveIndicator::Saved
        } else {
            SaveIndicator::Idle
        }
    }

    /// Pending amount of the selected row
    pub fn current_amount(&self) -> i64 {
        self.amounts
            .get(self.selected)
            .map(|a| a.value)
            .unwrap_or(DEFAULT_AMOUNT)
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.ninjas().len() {
            self.selected += 1;
        }
    }

    pub fn push_amount_digit(&mut self, digit: u32) {
        if let Some(amount) = self.amounts.get_mut(self.selected) {
            amount.push_digit(digit);
        }
    }

    pub fn pop_amount_digit(&mut self) {
        if let Some(amount) = self.amounts.get_mut(self.selected) {
            amount.pop_digit();
        }
    }

    /// Refuse edits while the last load failed
    ///
    /// The roster may be empty or stale then, and writing it back would
    /// replace whatever the bin holds.
    fn edits_blocked(&mut self) -> bool {
        if self.load_error().is_some() {
            self.set_status(RELOAD_FIRST);
            true
        } else {
            false
        }
    }

    /// Give the pending amount to the selected ninja
    pub fn submit_add(&mut self) {
        if self.edits_blocked() {
            return;
        }
        let amount = self.current_amount();
        let result = self.engine.add_bucks(self.selected, amount);
        self.after_balance_change(result, |name, bucks| {
            format!("+{} for {} (now {})", amount, name, bucks)
        });
    }

    /// Spend the pending amount of the selected ninja
    pub fn submit_spend(&mut self) {
        if self.edits_blocked() {
            return;
        }
        let amount = self.current_amount();
        let result = self.engine.spend_bucks(self.selected, amount);
        self.after_balance_change(result, |name, bucks| {
            format!("-{} for {} (now {})", amount, name, bucks)
        });
    }

    fn after_balance_change(
        &mut self,
        result: SyncResult<i64>,
        describe: impl FnOnce(&str, i64) -> String,
    ) {
        match result {
            Ok(bucks) => {
                let name = self
                    .ninjas()
                    .get(self.selected)
                    .map(|n| n.name.clone())
                    .unwrap_or_default();
                self.reset_amounts();
                self.set_status(describe(&name, bucks));
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    /// Open the new-ninja form
    pub fn start_new_ninja(&mut self) {
        if self.edits_blocked() {
            return;
        }
        self.new_name.clear();
        self.new_bucks = "0".to_string();
        self.input_mode = InputMode::NewName;
    }

    /// Close the form without adding anything
    pub fn cancel_new_ninja(&mut self) {
        self.new_name.clear();
        self.new_bucks.clear();
        self.input_mode = InputMode::Normal;
    }

    pub fn insert_char(&mut self, c: char) {
        match self.input_mode {
            InputMode::NewName => self.new_name.push(c),
            InputMode::NewBucks => {
                if c.is_ascii_digit() || (c == '-' && self.new_bucks.is_empty()) {
                    if self.new_bucks == "0" && c != '0' {
                        self.new_bucks.clear();
                    }
                    self.new_bucks.push(c);
                }
            }
            InputMode::Normal => {}
        }
    }

    pub fn delete_char(&mut self) {
        match self.input_mode {
            InputMode::NewName => {
                self.new_name.pop();
            }
            InputMode::NewBucks => {
                self.new_bucks.pop();
            }
            InputMode::Normal => {}
        }
    }

    /// Move from the name field to the bucks field
    pub fn confirm_new_name(&mut self) {
        if self.new_name.trim().is_empty() {
            self.set_status(ninja_core::ValidationError::EmptyName.to_string());
            return;
        }
        self.input_mode = InputMode::NewBucks;
    }

    /// Append the ninja described by the form
    pub fn submit_new_ninja(&mut self) {
        if self.edits_blocked() {
            self.cancel_new_ninja();
            return;
        }
        let bucks = match self.new_bucks.trim() {
            "" => 0,
            text => match text.parse::<i64>() {
                Ok(bucks) => bucks,
                Err(_) => {
                    self.set_status("Please enter a whole number of ninja bucks");
                    return;
                }
            },
        };

        match self.engine.append_entity(&self.new_name, bucks) {
            Ok(index) => {
                let name = self.ninjas()[index].name.clone();
                self.selected = index;
                self.reset_amounts();
                self.cancel_new_ninja();
                self.set_status(format!("Added {}", name));
            }
            Err(SyncError::Validation(e)) => {
                // Stay in the form so the value can be fixed
                self.set_status(e.to_string());
            }
            Err(e) => {
                self.cancel_new_ninja();
                self.set_status(e.to_string());
            }
        }
    }

    /// Read the bin again (pending writes land first)
    pub async fn reload(&mut self) {
        let result = self.engine.load().await;
        self.after_load(result);
    }

    /// Refresh view state once a load has finished
    pub fn after_load(&mut self, result: SyncResult<usize>) {
        match result {
            Ok(count) => {
                self.selected = self.selected.min(count.saturating_sub(1));
                self.reset_amounts();
                self.set_status(format!("Loaded {} ninjas", count));
            }
            Err(e) => {
                // Roster is unchanged; the status bar keeps showing the failure
                let hint = e.remote().and_then(|r| r.recovery_suggestion());
                match hint {
                    Some(hint) => self.set_status(format!("{} ({})", e, hint)),
                    None => self.set_status(e.to_string()),
                }
            }
        }
    }

    pub fn handle_save_event(&mut self, event: SaveEvent) {
        match event {
            SaveEvent::Saved { at, .. } => {
                self.last_saved_at = Some(at.with_timezone(&Local));
                self.last_save_error = None;
            }
            SaveEvent::Failed { error, .. } => {
                let message = match error.recovery_suggestion() {
                    Some(hint) => format!("Save failed: {} ({})", error, hint),
                    None => format!("Save failed: {}", error),
                };
                self.last_save_error = Some(error.to_string());
                self.set_status(message);
            }
        }
    }

    /// Every row goes back to the default amount
    fn reset_amounts(&mut self) {
        self.amounts = vec![PendingAmount::default(); self.ninjas().len()];
    }
}
