//! Maps raw key identifiers to race intents.

use crate::common::Intent;
use crate::config::KeyMapConfig;

/// One intent and the keys that trigger it, with its help text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub intent: Intent,
    pub keys: Vec<String>,
    /// Short label for the help line, e.g. `(g)`.
    pub help_key: String,
    pub help_desc: String,
}

impl KeyBinding {
    fn new(intent: Intent, keys: &[String]) -> Self {
        let help_key = format!("({})", keys.join("/"));
        Self {
            intent,
            keys: keys.to_vec(),
            help_key,
            help_desc: intent.to_string(),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// A static table from key identifiers to intents.
///
/// Keys are single characters (`g`, `?`) or lowercase names (`esc`, `space`,
/// `ctrl+c`). Anything not in the table maps to nothing.
#[derive(Debug, Clone)]
pub struct InputMapper {
    action: KeyBinding,
    reset: KeyBinding,
    help: KeyBinding,
    quit: KeyBinding,
}

impl InputMapper {
    pub fn new(keys: &KeyMapConfig) -> Self {
        Self {
            action: KeyBinding::new(Intent::Action, &keys.action),
            reset: KeyBinding::new(Intent::Reset, &keys.reset),
            help: KeyBinding::new(Intent::ToggleHelp, &keys.help),
            quit: KeyBinding::new(Intent::Quit, &keys.quit),
        }
    }

    /// The intent bound to `key`, if any.
    pub fn map(&self, key: &str) -> Option<Intent> {
        self.bindings()
            .into_iter()
            .find(|binding| binding.matches(key))
            .map(|binding| binding.intent)
    }

    pub fn bindings(&self) -> [&KeyBinding; 4] {
        [&self.action, &self.reset, &self.help, &self.quit]
    }

    /// The one-line help: how to open the full help, and how to leave.
    pub fn short_help(&self) -> Vec<&KeyBinding> {
        vec![&self.help, &self.quit]
    }

    /// The full help, as columns.
    pub fn full_help(&self) -> Vec<Vec<&KeyBinding>> {
        vec![
            vec![&self.action, &self.quit],
            vec![&self.help, &self.reset],
        ]
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new(&KeyMapConfig::default())
    }
}
