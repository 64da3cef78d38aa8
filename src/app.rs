use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::store::registry::Registry;
use crate::store::{Friend, COORD_MAX, COORD_MIN, COORD_STEP};

/// How long a status message stays on screen
const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Map,
    Friends,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    AddForm,
    ConfirmDelete,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    X,
    Y,
}

/// Input state for the add-friend form. Coordinates move in steps of 10 and
/// are clamped to the map bounds on every adjustment.
#[derive(Debug, Clone)]
pub struct AddForm {
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub field: FormField,
}

impl Default for AddForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            x: (COORD_MAX - COORD_MIN) / 2,
            y: (COORD_MAX - COORD_MIN) / 2,
            field: FormField::Name,
        }
    }
}

impl AddForm {
    pub fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Name => FormField::X,
            FormField::X => FormField::Y,
            FormField::Y => FormField::Name,
        };
    }

    pub fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Name => FormField::Y,
            FormField::X => FormField::Name,
            FormField::Y => FormField::X,
        };
    }
}

/// Move a coordinate by `delta` steps, clamped to the map bounds
pub fn step_coord(value: i64, delta: i64) -> i64 {
    (value + delta * COORD_STEP).clamp(COORD_MIN, COORD_MAX)
}

/// Flatten the store mapping into rows sorted by name (then id, so
/// duplicate names keep a stable order)
pub fn sorted_entries(friends: BTreeMap<String, Friend>) -> Vec<(String, Friend)> {
    let mut entries: Vec<(String, Friend)> = friends.into_iter().collect();
    entries.sort_by(|(a_id, a), (b_id, b)| a.name.cmp(&b.name).then(a_id.cmp(b_id)));
    entries
}

pub struct App {
    pub registry: Registry,

    // Current view of the store, re-queried after every successful mutation
    pub friends: Vec<(String, Friend)>,
    pub selected: usize,

    pub section: Section,
    pub popup: Popup,
    pub form: AddForm,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    refresh_interval: Duration,
    last_refresh: Instant,
}

impl App {
    pub async fn new(registry: Registry, refresh_secs: u64) -> Self {
        let mut app = Self {
            registry,
            friends: Vec::new(),
            selected: 0,
            section: Section::Friends,
            popup: Popup::None,
            form: AddForm::default(),
            status_message: None,
            status_message_time: None,
            refresh_interval: Duration::from_secs(refresh_secs.max(1)),
            last_refresh: Instant::now(),
        };
        app.refresh().await;
        app
    }

    /// Set a status message (auto-clears after a few seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Re-query the store and rebuild the rows. Failures become a status
    /// message and leave an empty list.
    pub async fn refresh(&mut self) {
        let friends = self.registry.list().await;
        if let Some(e) = self.registry.take_error() {
            self.set_status(format!("Failed to load friends: {e}"));
        }
        self.friends = sorted_entries(friends);
        if self.selected >= self.friends.len() {
            self.selected = self.friends.len().saturating_sub(1);
        }
        self.last_refresh = Instant::now();
    }

    pub fn selected_friend(&self) -> Option<&(String, Friend)> {
        self.friends.get(self.selected)
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup != Popup::None {
            return self.handle_popup_key(key).await;
        }
        self.handle_normal_key(key).await
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            // Switch between map and list
            KeyCode::Tab | KeyCode::BackTab => {
                self.section = match self.section {
                    Section::Map => Section::Friends,
                    Section::Friends => Section::Map,
                };
            }

            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),

            // Open the add form
            KeyCode::Char('a') => {
                self.form = AddForm::default();
                self.popup = Popup::AddForm;
            }

            // Delete selected row (with confirmation)
            KeyCode::Char('d') | KeyCode::Delete => {
                if self.selected_friend().is_some() {
                    self.popup = Popup::ConfirmDelete;
                }
            }

            // Refresh
            KeyCode::Char('R') => {
                self.refresh().await;
                self.set_status("Refreshed");
            }

            // Help (? or h)
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    async fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::AddForm => self.handle_form_key(key).await,
            Popup::ConfirmDelete => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => {
                        self.popup = Popup::None;
                        self.delete_selected().await;
                    }
                    KeyCode::Char('n') | KeyCode::Esc => {
                        self.popup = Popup::None;
                    }
                    _ => {}
                }
                Ok(())
            }
            Popup::Help => {
                if matches!(
                    key.code,
                    KeyCode::Esc
                        | KeyCode::Char('?')
                        | KeyCode::Char('h')
                        | KeyCode::Enter
                        | KeyCode::Char('q')
                ) {
                    self.popup = Popup::None;
                }
                Ok(())
            }
            Popup::None => Ok(()),
        }
    }

    async fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.popup = Popup::None;
            }
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
            KeyCode::Enter => self.submit_add().await,

            KeyCode::Left => self.adjust_coord(-1),
            KeyCode::Right => self.adjust_coord(1),

            KeyCode::Char(c) => match self.form.field {
                FormField::Name => self.form.name.push(c),
                // +/- also work on the coordinate fields
                _ if c == '+' || c == '=' => self.adjust_coord(1),
                _ if c == '-' => self.adjust_coord(-1),
                _ => {}
            },
            KeyCode::Backspace => {
                if self.form.field == FormField::Name {
                    self.form.name.pop();
                }
            }

            _ => {}
        }
        Ok(())
    }

    fn adjust_coord(&mut self, delta: i64) {
        match self.form.field {
            FormField::X => self.form.x = step_coord(self.form.x, delta),
            FormField::Y => self.form.y = step_coord(self.form.y, delta),
            FormField::Name => {}
        }
    }

    /// Submit the add form. On success the form closes and the list is
    /// re-queried; a validation error keeps the form open for correction.
    async fn submit_add(&mut self) {
        let (name, x, y) = (self.form.name.clone(), self.form.x, self.form.y);
        match self.registry.add(&name, x, y).await {
            Ok(_) => {
                self.popup = Popup::None;
                self.set_status(format!("Added {} at ({}, {})", name.trim(), x, y));
                self.refresh().await;
            }
            Err(e) => self.set_status(format!("Add failed: {e}")),
        }
    }

    async fn delete_selected(&mut self) {
        let Some((id, friend)) = self.selected_friend().cloned() else {
            return;
        };
        match self.registry.remove(&id).await {
            Ok(()) => {
                self.set_status(format!("Removed {}", friend.name));
                self.refresh().await;
            }
            Err(e) => self.set_status(format!("Delete failed: {e}")),
        }
    }

    fn move_down(&mut self) {
        if !self.friends.is_empty() && self.selected + 1 < self.friends.len() {
            self.selected += 1;
        }
    }

    fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Periodic work: expire the status message, refresh on the configured
    /// cadence (only while no popup captures the screen).
    pub async fn tick(&mut self) {
        if let Some(t) = self.status_message_time {
            if t.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        if self.popup == Popup::None && self.last_refresh.elapsed() > self.refresh_interval {
            self.refresh().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_coord_clamps_to_bounds() {
        assert_eq!(step_coord(0, -1), 0);
        assert_eq!(step_coord(5, -1), 0);
        assert_eq!(step_coord(500, 1), 500);
        assert_eq!(step_coord(495, 1), 500);
        assert_eq!(step_coord(100, 1), 110);
        assert_eq!(step_coord(100, -1), 90);
    }

    #[test]
    fn test_form_field_cycle() {
        let mut form = AddForm::default();
        assert_eq!(form.field, FormField::Name);
        form.next_field();
        assert_eq!(form.field, FormField::X);
        form.next_field();
        assert_eq!(form.field, FormField::Y);
        form.next_field();
        assert_eq!(form.field, FormField::Name);
        form.prev_field();
        assert_eq!(form.field, FormField::Y);
    }

    #[test]
    fn test_sorted_entries_orders_by_name_then_id() {
        let mut friends = BTreeMap::new();
        friends.insert(
            "-Nc".to_string(),
            Friend {
                name: "Bob".to_string(),
                x: 0,
                y: 0,
            },
        );
        friends.insert(
            "-Na".to_string(),
            Friend {
                name: "Alice".to_string(),
                x: 100,
                y: 200,
            },
        );
        friends.insert(
            "-Nb".to_string(),
            Friend {
                name: "Alice".to_string(),
                x: 300,
                y: 400,
            },
        );

        let entries = sorted_entries(friends);
        let ids: Vec<&str> = entries.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["-Na", "-Nb", "-Nc"]);
    }
}
