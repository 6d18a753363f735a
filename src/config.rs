//! User configuration, read from `~/.config/probot/config.json`.
//!
//! Every field has a default, so a partial file only overrides what it names.

use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default)]
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    // Program editor
    pub insert_advance: String,
    pub insert_turn_left: String,
    pub insert_turn_right: String,
    pub insert_u_turn: String,
    pub insert_jump: String,
    pub insert_loop: String,
    pub insert_loop_end: String,
    pub delete: String,
    pub clear: String,
    pub move_up: String,
    pub move_down: String,
    pub run: String,
    pub save: String,
    pub quit: String,
    pub confirm: String,
    pub cancel: String,
    // Player
    pub stop: String,
    pub replay: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            insert_advance: "f".into(),
            insert_turn_left: "l".into(),
            insert_turn_right: "r".into(),
            insert_u_turn: "u".into(),
            insert_jump: "j".into(),
            insert_loop: "[".into(),
            insert_loop_end: "]".into(),
            delete: "d".into(),
            clear: "Ctrl-x".into(),
            move_up: "Up".into(),
            move_down: "Down".into(),
            run: "F5".into(),
            save: "Ctrl-s".into(),
            quit: "q".into(),
            confirm: "Enter".into(),
            cancel: "Esc".into(),
            stop: "Esc".into(),
            replay: "r".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Pause after each rendered event.
    pub step_delay_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig { step_delay_ms: 250 }
    }
}

impl PlayerConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(json) => Self::parse(&json).unwrap_or_else(|e| {
                warn!(path = %config_path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("probot");
        path.push("config.json");
        path
    }
}

/// Check whether a crossterm `KeyEvent` matches a binding string from config.
pub fn matches_binding(binding: &str, event: &KeyEvent) -> bool {
    let (required, key) = if let Some(rest) = binding.strip_prefix("Ctrl-") {
        (KeyModifiers::CONTROL, rest)
    } else if let Some(rest) = binding.strip_prefix("Alt-") {
        (KeyModifiers::ALT, rest)
    } else {
        (KeyModifiers::NONE, binding)
    };

    // Plain bindings like "d" must not fire on Ctrl-d or Alt-d.
    let held = event.modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT);
    if held != required {
        return false;
    }

    match key {
        "Right" => event.code == KeyCode::Right,
        "Left" => event.code == KeyCode::Left,
        "Up" => event.code == KeyCode::Up,
        "Down" => event.code == KeyCode::Down,
        "Enter" => event.code == KeyCode::Enter,
        "Esc" => event.code == KeyCode::Esc,
        "Space" => event.code == KeyCode::Char(' '),
        "Tab" => event.code == KeyCode::Tab,
        "Backspace" => event.code == KeyCode::Backspace,
        "Delete" => event.code == KeyCode::Delete,
        "Home" => event.code == KeyCode::Home,
        "End" => event.code == KeyCode::End,
        s => {
            if let Some(n) = s.strip_prefix('F').and_then(|rest| rest.parse::<u8>().ok()) {
                return event.code == KeyCode::F(n);
            }
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => event.code == KeyCode::Char(c),
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn plain_bindings_ignore_modified_keys() {
        assert!(matches_binding("d", &key(KeyCode::Char('d'), KeyModifiers::NONE)));
        assert!(!matches_binding("d", &key(KeyCode::Char('d'), KeyModifiers::CONTROL)));
        // Shift is part of the character, not a modifier we filter on.
        assert!(matches_binding("[", &key(KeyCode::Char('['), KeyModifiers::SHIFT)));
    }

    #[test]
    fn prefixed_and_named_bindings() {
        assert!(matches_binding("Ctrl-s", &key(KeyCode::Char('s'), KeyModifiers::CONTROL)));
        assert!(!matches_binding("Ctrl-s", &key(KeyCode::Char('s'), KeyModifiers::NONE)));
        assert!(matches_binding("Alt-x", &key(KeyCode::Char('x'), KeyModifiers::ALT)));
        assert!(matches_binding("F5", &key(KeyCode::F(5), KeyModifiers::NONE)));
        assert!(matches_binding("Esc", &key(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(!matches_binding("Foo", &key(KeyCode::Char('F'), KeyModifiers::NONE)));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = Config::parse(r#"{"key_bindings": {"insert_jump": "J"}}"#).unwrap();
        assert_eq!(config.key_bindings.insert_jump, "J");
        assert_eq!(config.key_bindings.insert_advance, "f");
        assert_eq!(config.player.step_delay_ms, 250);
    }
}
