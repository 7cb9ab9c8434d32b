//! Defines all configuration structures for the Dragtree engine.
//!
//! These structs are deserialized with `serde`, so the tree's timing, the
//! pump cadence and the key bindings can live in a TOML file next to the
//! binary instead of in code. Every field has a default matching a standard
//! "full" tree, so an empty or missing file is a valid configuration.

use crate::common::Stage;
use anyhow::{bail, Context};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// The tree has three amber rows; more yellow stages than that cannot be drawn.
pub const MAX_YELLOW_STAGES: usize = 3;

/// Prefix for environment overrides, e.g. `DRAGTREE__TIMING__GREEN_MS=500`.
pub const ENV_PREFIX: &str = "DRAGTREE";

/// Fields that take a comma-separated list when set from the environment,
/// e.g. `DRAGTREE__KEYS__QUIT=q,ctrl+c`.
const ENV_LIST_KEYS: [&str; 5] = [
    "timing.yellow_ms",
    "keys.action",
    "keys.reset",
    "keys.help",
    "keys.quit",
];

/// The top-level configuration for the `TreeEngine`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// How long each light holds before the next one comes on.
    pub timing: StageTiming,
    /// Cadence of the activity pump.
    pub pump: PumpConfig,
    /// Key bindings for the four intents.
    pub keys: KeyMapConfig,
    /// Session statistics.
    pub scoreboard: ScoreboardConfig,
}

/// Stage durations, in milliseconds.
///
/// The sequence is PreStage, FullStage, one stage per entry in `yellow_ms`,
/// then Green. When Green's hold elapses the green light comes on and the
/// reaction window opens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StageTiming {
    pub pre_stage_ms: u64,
    pub full_stage_ms: u64,
    /// One hold per yellow stage. A single entry lights all three ambers at
    /// once; three entries light them one row at a time.
    #[serde(deserialize_with = "one_or_many_ms")]
    pub yellow_ms: Vec<u64>,
    pub green_ms: u64,
    /// How long a finished run stays on display before the tree goes idle.
    pub finish_hold_ms: u64,
    /// How long a false start stays on display before the tree goes idle.
    pub cooldown_ms: u64,
}

/// Cadence of the `ActivityPump`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// Pause between ticks. `0` ticks as fast as the loop drains them.
    pub interval_ms: u64,
}

/// Key identifiers bound to each intent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeyMapConfig {
    #[serde(deserialize_with = "one_or_many_keys")]
    pub action: Vec<String>,
    #[serde(deserialize_with = "one_or_many_keys")]
    pub reset: Vec<String>,
    #[serde(deserialize_with = "one_or_many_keys")]
    pub help: Vec<String>,
    #[serde(deserialize_with = "one_or_many_keys")]
    pub quit: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoreboardConfig {
    /// Number of recent runs kept in the history.
    pub history_len: usize,
}

impl TreeConfig {
    /// Loads a configuration from an optional file plus environment overrides.
    ///
    /// A missing file is not an error; the defaults apply. Environment
    /// variables use the `DRAGTREE__<SECTION>__<FIELD>` form.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load_with(path.as_ref(), Self::environment())
    }

    /// The environment source `load` layers over the file.
    fn environment() -> config::Environment {
        ENV_LIST_KEYS.iter().fold(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .try_parsing(true),
            |env, key| env.with_list_parse_key(key),
        )
    }

    fn load_with(path: &Path, environment: config::Environment) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;
        let config: TreeConfig = settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the tree cannot run or draw.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timing.yellow_ms.len() > MAX_YELLOW_STAGES {
            bail!(
                "timing.yellow_ms has {} entries; the tree has only {} amber rows",
                self.timing.yellow_ms.len(),
                MAX_YELLOW_STAGES
            );
        }
        let keys = &self.keys;
        if keys.action.is_empty() || keys.reset.is_empty() || keys.quit.is_empty() {
            bail!("keys.action, keys.reset and keys.quit each need at least one key");
        }
        let mut seen: Vec<&str> = Vec::new();
        for key in keys
            .action
            .iter()
            .chain(&keys.reset)
            .chain(&keys.help)
            .chain(&keys.quit)
        {
            if seen.contains(&key.as_str()) {
                bail!("key '{}' is bound to more than one intent", key);
            }
            seen.push(key);
        }
        Ok(())
    }
}

impl StageTiming {
    /// Number of yellow stages in the sequence.
    pub fn yellow_count(&self) -> u8 {
        self.yellow_ms.len().min(MAX_YELLOW_STAGES) as u8
    }

    /// How long `stage` holds before something happens on its own.
    ///
    /// Timed stages advance to the next light; `Finished` drops back to idle.
    /// Every other stage waits for the driver or a cool-down and has no hold.
    pub fn hold(&self, stage: Stage) -> Option<Duration> {
        let ms = match stage {
            Stage::PreStage => self.pre_stage_ms,
            Stage::FullStage => self.full_stage_ms,
            Stage::Yellow(n) => *self.yellow_ms.get(n as usize)?,
            Stage::Green => self.green_ms,
            Stage::Finished => self.finish_hold_ms,
            Stage::Idle | Stage::Launch | Stage::FalseStart => return None,
        };
        Some(Duration::from_millis(ms))
    }

    /// The stage that follows a timed stage.
    pub fn next_after(&self, stage: Stage) -> Option<Stage> {
        let first_after_staging = if self.yellow_count() > 0 {
            Stage::Yellow(0)
        } else {
            Stage::Green
        };
        match stage {
            Stage::PreStage => Some(Stage::FullStage),
            Stage::FullStage => Some(first_after_staging),
            Stage::Yellow(n) if n + 1 < self.yellow_count() => Some(Stage::Yellow(n + 1)),
            Stage::Yellow(_) => Some(Stage::Green),
            Stage::Green => Some(Stage::Launch),
            _ => None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Total time from arming until the green light comes on.
    pub fn time_to_green(&self) -> Duration {
        let yellows: u64 = self.yellow_ms.iter().take(MAX_YELLOW_STAGES).sum();
        Duration::from_millis(self.pre_stage_ms + self.full_stage_ms + yellows + self.green_ms)
    }
}

impl PumpConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

// --- Default values ---

impl Default for StageTiming {
    fn default() -> Self {
        Self {
            pre_stage_ms: 2_000,
            full_stage_ms: 2_000,
            yellow_ms: vec![1_200],
            green_ms: 400,
            finish_hold_ms: 5_000,
            cooldown_ms: 5_000,
        }
    }
}

impl Default for KeyMapConfig {
    fn default() -> Self {
        Self {
            action: vec!["g".to_string()],
            reset: vec!["r".to_string()],
            help: vec!["?".to_string()],
            quit: vec!["q".to_string(), "ctrl+c".to_string()],
        }
    }
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self { history_len: 10 }
    }
}

/// A list field also accepts a lone value: an environment variable holding
/// `500` or `space` arrives as a scalar, not a one-element list.
struct OneOrMany<T>(std::marker::PhantomData<T>);

impl<'de> Visitor<'de> for OneOrMany<u64> {
    type Value = Vec<u64>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a duration in milliseconds or a list of them")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(vec![v])
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(|ms| vec![ms])
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.trim()
            .parse()
            .map(|ms| vec![ms])
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut values = Vec::new();
        while let Some(ms) = seq.next_element()? {
            values.push(ms);
        }
        Ok(values)
    }
}

impl<'de> Visitor<'de> for OneOrMany<String> {
    type Value = Vec<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a key or a list of keys")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(vec![v.to_string()])
    }

    // Digit keys set from the environment parse as numbers.
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(vec![v.to_string()])
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(vec![v.to_string()])
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut keys = Vec::new();
        while let Some(key) = seq.next_element()? {
            keys.push(key);
        }
        Ok(keys)
    }
}

fn one_or_many_ms<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
    deserializer.deserialize_any(OneOrMany::<u64>(std::marker::PhantomData))
}

fn one_or_many_keys<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    deserializer.deserialize_any(OneOrMany::<String>(std::marker::PhantomData))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "dragtree-{}-{}.toml",
            name,
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn default_sequence_has_one_yellow() {
        let timing = StageTiming::default();
        assert_eq!(timing.next_after(Stage::PreStage), Some(Stage::FullStage));
        assert_eq!(timing.next_after(Stage::FullStage), Some(Stage::Yellow(0)));
        assert_eq!(timing.next_after(Stage::Yellow(0)), Some(Stage::Green));
        assert_eq!(timing.next_after(Stage::Green), Some(Stage::Launch));
        assert_eq!(timing.next_after(Stage::Launch), None);
        assert_eq!(timing.time_to_green(), Duration::from_millis(5_600));
    }

    #[test]
    fn three_yellows_advance_one_row_at_a_time() {
        let timing = StageTiming {
            yellow_ms: vec![500, 500, 500],
            ..StageTiming::default()
        };
        assert_eq!(timing.next_after(Stage::Yellow(0)), Some(Stage::Yellow(1)));
        assert_eq!(timing.next_after(Stage::Yellow(1)), Some(Stage::Yellow(2)));
        assert_eq!(timing.next_after(Stage::Yellow(2)), Some(Stage::Green));
        assert_eq!(timing.hold(Stage::Yellow(2)), Some(Duration::from_millis(500)));
    }

    #[test]
    fn no_yellows_goes_straight_to_green() {
        let timing = StageTiming {
            yellow_ms: Vec::new(),
            ..StageTiming::default()
        };
        assert_eq!(timing.next_after(Stage::FullStage), Some(Stage::Green));
    }

    #[test]
    fn only_timed_stages_and_finished_hold() {
        let timing = StageTiming::default();
        assert_eq!(timing.hold(Stage::PreStage), Some(Duration::from_secs(2)));
        assert_eq!(timing.hold(Stage::Green), Some(Duration::from_millis(400)));
        assert_eq!(timing.hold(Stage::Finished), Some(Duration::from_secs(5)));
        assert_eq!(timing.hold(Stage::Idle), None);
        assert_eq!(timing.hold(Stage::Launch), None);
        assert_eq!(timing.hold(Stage::FalseStart), None);
    }

    #[test]
    fn validate_rejects_four_yellows() {
        let mut config = TreeConfig::default();
        config.timing.yellow_ms = vec![100; 4];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_shared_keys() {
        let mut config = TreeConfig::default();
        config.keys.reset = vec!["g".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_partial_toml_over_defaults() {
        let path = temp_config(
            "partial",
            "[timing]\nyellow_ms = [500, 500, 500]\ngreen_ms = 0\n\n[keys]\naction = [\"space\"]\n",
        );
        let config = TreeConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.timing.yellow_ms, vec![500, 500, 500]);
        assert_eq!(config.timing.green_ms, 0);
        assert_eq!(config.timing.pre_stage_ms, 2_000);
        assert_eq!(config.keys.action, vec!["space".to_string()]);
        assert_eq!(config.keys.quit, KeyMapConfig::default().quit);
    }

    #[test]
    fn load_without_file_gives_defaults() {
        let path = std::env::temp_dir().join("dragtree-does-not-exist.toml");
        let config = TreeConfig::load(&path).unwrap();
        assert_eq!(config.timing, StageTiming::default());
        assert_eq!(config.scoreboard.history_len, 10);
    }

    #[test]
    fn load_surfaces_validation_errors() {
        let path = temp_config("invalid", "[timing]\nyellow_ms = [1, 2, 3, 4]\n");
        let result = TreeConfig::load(&path);
        fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    fn load_with_env(vars: &[(&str, &str)]) -> anyhow::Result<TreeConfig> {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        let path = std::env::temp_dir().join("dragtree-env-only.toml");
        TreeConfig::load_with(&path, TreeConfig::environment().source(Some(vars)))
    }

    #[test]
    fn environment_overrides_list_fields() {
        let config = load_with_env(&[
            ("DRAGTREE__TIMING__YELLOW_MS", "500,600,700"),
            ("DRAGTREE__KEYS__ACTION", "space"),
            ("DRAGTREE__KEYS__QUIT", "esc,ctrl+c"),
            ("DRAGTREE__TIMING__GREEN_MS", "450"),
        ])
        .unwrap();

        assert_eq!(config.timing.yellow_ms, vec![500, 600, 700]);
        assert_eq!(config.timing.green_ms, 450);
        assert_eq!(config.keys.action, vec!["space".to_string()]);
        assert_eq!(
            config.keys.quit,
            vec!["esc".to_string(), "ctrl+c".to_string()]
        );
        assert_eq!(config.keys.reset, KeyMapConfig::default().reset);
    }

    #[test]
    fn environment_accepts_a_single_yellow_or_digit_key() {
        let config = load_with_env(&[
            ("DRAGTREE__TIMING__YELLOW_MS", "500"),
            ("DRAGTREE__KEYS__ACTION", "1"),
        ])
        .unwrap();

        assert_eq!(config.timing.yellow_ms, vec![500]);
        assert_eq!(config.timing.time_to_green(), Duration::from_millis(4_900));
        assert_eq!(config.keys.action, vec!["1".to_string()]);
    }

    #[test]
    fn environment_overrides_are_validated() {
        let result = load_with_env(&[("DRAGTREE__TIMING__YELLOW_MS", "1,2,3,4")]);
        assert!(result.is_err());
    }
}
