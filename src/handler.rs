use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, FocusField, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_settings {
        handle_settings_key(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_key(app, key),
        InputMode::Editing => handle_editing_key(app, key),
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to the inputs
        KeyCode::Char('e') | KeyCode::Char('i') | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
        }

        // Persona editor
        KeyCode::Char('s') => app.open_settings(),

        // Results navigation
        KeyCode::Char('j') | KeyCode::Down => app.select_next_option(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev_option(),

        // Copy the selected reply
        KeyCode::Char('c') | KeyCode::Char('y') => {
            if let Some(option) = app.selected_option() {
                copy_to_clipboard(&option.content);
                app.copied_index = app.options_state.selected();
            }
        }

        // Re-run generation with the current inputs
        KeyCode::Enter => app.submit(),

        KeyCode::Char('r') => app.reset(),

        _ => {}
    }
}

fn handle_editing_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit();
            if app.lifecycle.is_loading() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusField::Message => FocusField::Intent,
                FocusField::Intent => FocusField::Message,
            };
        }
        _ => {
            let (input, cursor) = match app.focus {
                FocusField::Message => (&mut app.message_input, &mut app.message_cursor),
                FocusField::Intent => (&mut app.intent_input, &mut app.intent_cursor),
            };
            edit_input(input, cursor, key.code);
        }
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_settings(),
        KeyCode::Enter => app.save_settings(),
        KeyCode::Tab | KeyCode::Down => app.settings_next_field(),
        _ => {
            let mut cursor = app.settings_cursor;
            edit_input(app.settings_active_field_mut(), &mut cursor, key.code);
            app.settings_cursor = cursor;
        }
    }
}

/// Cursor-aware editing shared by the message, intent, and persona fields.
/// Cursor is a char index; all mutation goes through byte offsets derived
/// from it so multi-byte input (Chinese text, emoji) stays intact.
fn edit_input(input: &mut String, cursor: &mut usize, code: KeyCode) {
    match code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = input.chars().count();
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = input.chars().count();
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(input, *cursor);
            input.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

fn copy_to_clipboard(text: &str) {
    use std::io::Write;
    use std::process::{Command, Stdio};

    // First available clipboard tool wins: macOS, X11, Wayland.
    for tool in ["pbcopy", "xclip", "wl-copy"] {
        let mut command = Command::new(tool);
        if tool == "xclip" {
            command.args(["-selection", "clipboard"]);
        }
        if let Ok(mut child) = command.stdin(Stdio::piped()).spawn() {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(text.as_bytes());
            }
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "哈a呢";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 1), 3);
        assert_eq!(char_to_byte_index(s, 2), 4);
        assert_eq!(char_to_byte_index(s, 3), s.len());
        assert_eq!(char_to_byte_index(s, 99), s.len());
    }

    #[test]
    fn test_edit_input_insert_and_delete_chinese() {
        let mut input = "在吗".to_string();
        let mut cursor = 2;
        edit_input(&mut input, &mut cursor, KeyCode::Char('？'));
        assert_eq!(input, "在吗？");
        assert_eq!(cursor, 3);

        edit_input(&mut input, &mut cursor, KeyCode::Backspace);
        edit_input(&mut input, &mut cursor, KeyCode::Backspace);
        assert_eq!(input, "在");
        assert_eq!(cursor, 1);
    }

    #[test]
    fn test_edit_input_mid_string() {
        let mut input = "老板好".to_string();
        let mut cursor = 1;
        edit_input(&mut input, &mut cursor, KeyCode::Char('板'));
        assert_eq!(input, "老板板好");

        edit_input(&mut input, &mut cursor, KeyCode::Delete);
        assert_eq!(input, "老板好");
        assert_eq!(cursor, 2);
    }

    #[test]
    fn test_edit_input_cursor_bounds() {
        let mut input = "ab".to_string();
        let mut cursor = 0;
        edit_input(&mut input, &mut cursor, KeyCode::Left);
        assert_eq!(cursor, 0);
        edit_input(&mut input, &mut cursor, KeyCode::End);
        assert_eq!(cursor, 2);
        edit_input(&mut input, &mut cursor, KeyCode::Right);
        assert_eq!(cursor, 2);
        edit_input(&mut input, &mut cursor, KeyCode::Home);
        assert_eq!(cursor, 0);
    }
}
