// Keyboard handling. Handlers only touch `App` and return the effect, if
// any, that the event loop should run.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::poem::PoemView;
use crate::tui::types::{App, Effect, Mode, Tab};

pub fn handle_event(app: &mut App, event: Event) -> Option<Effect> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        _ => None,
    }
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> Option<Effect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && key.code == KeyCode::Char('c') {
        quit(app);
        return None;
    }

    match app.mode {
        Mode::Help => {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::F(1) | KeyCode::Char('q')
            ) {
                app.mode = Mode::Main;
            }
            None
        }
        Mode::ArchiveModal => {
            match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => app.mode = Mode::Main,
                KeyCode::Tab => {
                    app.mode = Mode::Main;
                    app.tab = Tab::Write;
                }
                KeyCode::Up | KeyCode::Char('k') => scroll_up(app, 1),
                KeyCode::Down | KeyCode::Char('j') => scroll_down(app, 1),
                KeyCode::PageUp => scroll_up(app, 10),
                KeyCode::PageDown => scroll_down(app, 10),
                _ => {}
            }
            None
        }
        Mode::Main => handle_main_key(app, key, ctrl),
    }
}

fn handle_main_key(app: &mut App, key: KeyEvent, ctrl: bool) -> Option<Effect> {
    match key.code {
        KeyCode::F(1) => {
            app.mode = Mode::Help;
            return None;
        }
        KeyCode::Esc => {
            quit(app);
            return None;
        }
        KeyCode::Tab | KeyCode::BackTab => return switch_tab(app, app.tab.next()),
        KeyCode::F(2) => {
            toggle_mode(app);
            return None;
        }
        KeyCode::Char('e') if ctrl => {
            toggle_mode(app);
            return None;
        }
        KeyCode::Char('o') if ctrl => return open_illustration(app),
        KeyCode::Char('s') if ctrl => {
            app.show_similar = !app.show_similar;
            return None;
        }
        KeyCode::PageUp => {
            scroll_up(app, 10);
            return None;
        }
        KeyCode::PageDown => {
            scroll_down(app, 10);
            return None;
        }
        _ => {}
    }

    match app.tab {
        Tab::Write => handle_write_key(app, key, ctrl),
        Tab::Archive => handle_archive_key(app, key),
    }
}

fn handle_write_key(app: &mut App, key: KeyEvent, ctrl: bool) -> Option<Effect> {
    match key.code {
        KeyCode::Enter => return submit_prompt(app),
        KeyCode::Char('u') if ctrl => {
            app.input.clear();
            app.cursor = 0;
        }
        KeyCode::Char(c) if !ctrl => {
            app.input.insert(app.cursor, c);
            app.cursor += 1;
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                app.input.remove(app.cursor);
            }
        }
        KeyCode::Delete => {
            if app.cursor < app.input.len() {
                app.input.remove(app.cursor);
            }
        }
        KeyCode::Left => app.cursor = app.cursor.saturating_sub(1),
        KeyCode::Right => app.cursor = (app.cursor + 1).min(app.input.len()),
        KeyCode::Home => app.cursor = 0,
        KeyCode::End => app.cursor = app.input.len(),
        _ => {}
    }
    None
}

fn handle_archive_key(app: &mut App, key: KeyEvent) -> Option<Effect> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => move_archive_selection(app, -1),
        KeyCode::Down | KeyCode::Char('j') => move_archive_selection(app, 1),
        KeyCode::Home => {
            if !app.archive.items.is_empty() {
                app.archive.list_state.select(Some(0));
            }
        }
        KeyCode::End => {
            if let Some(last) = app.archive.items.len().checked_sub(1) {
                app.archive.list_state.select(Some(last));
            }
        }
        KeyCode::Enter => select_archive_entry(app),
        KeyCode::Char('r') => return request_archive(app),
        KeyCode::Char('q') => quit(app),
        _ => {}
    }
    None
}

/// Starts a generation for the trimmed prompt. Blank prompts and submits
/// while a generation is running do nothing.
pub fn submit_prompt(app: &mut App) -> Option<Effect> {
    if app.loading {
        return None;
    }
    let prompt = app.prompt().trim().to_string();
    if prompt.is_empty() {
        return None;
    }

    app.stop_illustration();
    app.loading = true;
    app.error = None;
    app.poem = None;
    app.selected_archive_id = None;
    app.scroll = 0;
    app.request_seq += 1;
    app.status = "Generating your poem...".to_string();

    Some(Effect::Generate {
        seq: app.request_seq,
        prompt,
        mode: app.poem_mode,
    })
}

pub fn switch_tab(app: &mut App, tab: Tab) -> Option<Effect> {
    app.tab = tab;
    if tab == Tab::Archive && !app.archive.loaded {
        return request_archive(app);
    }
    None
}

pub fn request_archive(app: &mut App) -> Option<Effect> {
    if app.archive.loading {
        return None;
    }
    app.archive.loading = true;
    app.archive.error = None;
    app.status = "Loading archive...".to_string();
    Some(Effect::LoadArchive)
}

/// Shows the highlighted archive entry and drops any generation or
/// illustration still in flight.
pub fn select_archive_entry(app: &mut App) {
    let Some(entry) = app.selected_archive_item().cloned() else {
        return;
    };

    app.request_seq += 1;
    app.loading = false;
    app.error = None;
    app.stop_illustration();

    app.poem = Some(PoemView::from(&entry));
    app.selected_archive_id = Some(entry.id.clone());
    app.scroll = 0;
    app.mode = Mode::ArchiveModal;
    app.status = format!("Reading archived poem {}", entry.id);
}

pub fn toggle_mode(app: &mut App) {
    app.poem_mode = app.poem_mode.toggled();
    app.status = format!("Mode: {}", app.poem_mode.as_str());
}

fn open_illustration(app: &mut App) -> Option<Effect> {
    match app.illustration_url() {
        Some(url) => Some(Effect::OpenUrl(url.to_string())),
        None => {
            app.status = "No illustration to open yet.".to_string();
            None
        }
    }
}

fn move_archive_selection(app: &mut App, delta: isize) {
    let len = app.archive.items.len();
    if len == 0 {
        return;
    }
    let current = app.archive.list_state.selected().unwrap_or(0);
    let next = current.saturating_add_signed(delta).min(len - 1);
    app.archive.list_state.select(Some(next));
}

fn scroll_up(app: &mut App, lines: u16) {
    app.scroll = app.scroll.saturating_sub(lines);
}

fn scroll_down(app: &mut App, lines: u16) {
    app.scroll = app.scroll.saturating_add(lines);
}

fn quit(app: &mut App) {
    app.stop_illustration();
    app.should_quit = true;
}
