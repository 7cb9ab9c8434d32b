//! Draws a `Frame` as an ASCII Christmas tree.

use colored::{ColoredString, Colorize};
use dragtree::components::input::KeyBinding;
use dragtree::prelude::*;
use std::time::Duration;

const AMBER_ROWS: usize = 3;
const HELP_COLUMN_WIDTH: usize = 26;

/// Which bulbs are on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lights {
    pub pre_stage: bool,
    pub full_stage: bool,
    pub ambers: [bool; AMBER_ROWS],
    pub green: bool,
}

impl Lights {
    /// A stage's bulbs light once the tree has moved past that stage.
    pub fn for_stage(stage: Stage, yellow_count: u8) -> Self {
        let mut ambers = [false; AMBER_ROWS];
        for (row, lit) in ambers.iter_mut().enumerate() {
            *lit = amber_lit(stage, row, yellow_count);
        }
        Self {
            pre_stage: stage > Stage::PreStage,
            full_stage: stage > Stage::FullStage,
            ambers,
            green: matches!(stage, Stage::Launch | Stage::Finished),
        }
    }
}

fn amber_lit(stage: Stage, row: usize, yellow_count: u8) -> bool {
    if yellow_count == 0 {
        return stage >= Stage::Green;
    }
    // Spread the yellow stages over the three rows; one stage lights them all.
    let gate = (row * yellow_count as usize / AMBER_ROWS) as u8;
    stage > Stage::Yellow(gate)
}

/// Renders the whole screen: status, tree, times and help.
pub fn render(frame: &Frame, mapper: &InputMapper, yellow_count: u8) -> String {
    let race = &frame.race;
    let lights = Lights::for_stage(race.stage, yellow_count);
    let jumped = race.false_started;

    let staging = |lit: bool| bulb("oo", lit, jumped, |s| s.cyan());
    let amber = |lit: bool| bulb("0", lit, jumped, |s| s.yellow());
    let green = bulb("0", lights.green, jumped, |s| s.green());

    let mut lines = Vec::new();
    lines.push(String::new());
    lines.push(match race.message {
        Some(RaceMessage::FalseStart) => format!("  --{}--", RaceMessage::FalseStart)
            .red()
            .bold()
            .to_string(),
        Some(message) => format!("  --{}--", message).bold().to_string(),
        None => String::new(),
    });
    lines.push("______________".to_string());
    for lit in [lights.pre_stage, lights.full_stage] {
        let bulb = staging(lit);
        lines.push(format!("|({})=||=({})|", bulb, bulb));
    }
    lines.push("  ==========".to_string());
    for lit in lights.ambers {
        let bulb = amber(lit);
        lines.push(format!(" |({})=||=({})|", bulb, bulb));
    }
    lines.push(" |====||====|".to_string());
    lines.push(format!(" |({})=||=({})|", green, green));
    lines.push("  ==========".to_string());
    for _ in 0..6 {
        lines.push("     ||||".to_string());
    }
    lines.push("--------------".to_string());
    lines.push(String::new());

    if let Some(reaction) = race.reaction_time {
        lines.push(format!("Elapsed Time: {}", format_time(reaction)).bold().to_string());
    } else {
        lines.push(String::new());
    }
    lines.push(
        format!(
            "Best: {}   Runs: {}   False starts: {}",
            frame.best.map(format_time).unwrap_or_else(|| "-".to_string()),
            frame.runs,
            frame.false_starts
        )
        .dimmed()
        .to_string(),
    );
    lines.push(String::new());

    if race.help_visible {
        lines.extend(full_help(mapper));
    } else {
        lines.push(short_help(mapper));
    }
    lines.join("\n")
}

fn bulb(
    glyph: &str,
    lit: bool,
    jumped: bool,
    color: impl Fn(&str) -> ColoredString,
) -> ColoredString {
    if jumped {
        glyph.red()
    } else if lit {
        color(glyph)
    } else {
        glyph.bright_black()
    }
}

/// Reaction times the way timing slips print them: seconds to the thousandth.
pub fn format_time(time: Duration) -> String {
    format!("{:.3}s", time.as_secs_f64())
}

fn help_entry(binding: &KeyBinding) -> String {
    format!("{} {}", binding.help_key, binding.help_desc)
}

pub fn short_help(mapper: &InputMapper) -> String {
    mapper
        .short_help()
        .into_iter()
        .map(help_entry)
        .collect::<Vec<_>>()
        .join(" • ")
        .dimmed()
        .to_string()
}

pub fn full_help(mapper: &InputMapper) -> Vec<String> {
    let columns = mapper.full_help();
    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
    (0..rows)
        .map(|row| {
            columns
                .iter()
                .map(|column| {
                    let entry = column.get(row).map(|b| help_entry(b)).unwrap_or_default();
                    format!("{:<width$}", entry, width = HELP_COLUMN_WIDTH)
                })
                .collect::<String>()
                .trim_end()
                .dimmed()
                .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(stage: Stage) -> Frame {
        Frame {
            race: Snapshot {
                stage,
                active: true,
                false_started: false,
                reaction_time: None,
                message: None,
                help_visible: false,
            },
            best: None,
            runs: 0,
            false_starts: 0,
        }
    }

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn nothing_is_lit_while_staging_starts() {
        let lights = Lights::for_stage(Stage::PreStage, 1);
        assert_eq!(
            lights,
            Lights {
                pre_stage: false,
                full_stage: false,
                ambers: [false; 3],
                green: false,
            }
        );
        assert_eq!(Lights::for_stage(Stage::Idle, 1), lights);
    }

    #[test]
    fn bulbs_light_behind_the_sequence() {
        let lights = Lights::for_stage(Stage::Yellow(0), 1);
        assert!(lights.pre_stage && lights.full_stage);
        assert_eq!(lights.ambers, [false; 3]);

        let lights = Lights::for_stage(Stage::Green, 1);
        assert_eq!(lights.ambers, [true; 3]);
        assert!(!lights.green);

        assert!(Lights::for_stage(Stage::Launch, 1).green);
        assert!(Lights::for_stage(Stage::Finished, 1).green);
    }

    #[test]
    fn three_yellow_stages_light_one_row_each() {
        assert_eq!(Lights::for_stage(Stage::Yellow(1), 3).ambers, [true, false, false]);
        assert_eq!(Lights::for_stage(Stage::Yellow(2), 3).ambers, [true, true, false]);
        assert_eq!(Lights::for_stage(Stage::Green, 3).ambers, [true; 3]);
    }

    #[test]
    fn no_yellow_stages_flash_ambers_with_green_countdown() {
        assert_eq!(Lights::for_stage(Stage::FullStage, 0).ambers, [false; 3]);
        assert_eq!(Lights::for_stage(Stage::Green, 0).ambers, [true; 3]);
    }

    #[test]
    fn render_shows_result_and_status() {
        plain();
        let mut f = frame(Stage::Finished);
        f.race.reaction_time = Some(Duration::from_millis(50));
        f.race.message = Some(RaceMessage::Finished);
        f.best = Some(Duration::from_millis(42));
        f.runs = 3;
        f.false_starts = 1;

        let screen = render(&f, &InputMapper::default(), 1);
        assert!(screen.contains("--FINISHED--"));
        assert!(screen.contains("Elapsed Time: 0.050s"));
        assert!(screen.contains("Best: 0.042s   Runs: 3   False starts: 1"));
        assert!(screen.contains("(?) toggle help • (q/ctrl+c) Quit"));
        assert_eq!(screen.matches("|(oo)=||=(oo)|").count(), 2);
        assert_eq!(screen.matches(" |(0)=||=(0)|").count(), 4);
    }

    #[test]
    fn render_full_help_when_toggled() {
        plain();
        let mut f = frame(Stage::PreStage);
        f.race.help_visible = true;
        let screen = render(&f, &InputMapper::default(), 1);
        assert!(screen.contains("(g) Action"));
        assert!(screen.contains("(r) Reset"));
        assert!(screen.contains("(?) toggle help"));
        assert!(screen.contains("(q/ctrl+c) Quit"));
        assert!(!screen.contains("Elapsed Time"));
        assert!(screen.contains("Best: -"));
    }

    #[test]
    fn format_time_prints_thousandths() {
        assert_eq!(format_time(Duration::from_millis(1_234)), "1.234s");
        assert_eq!(format_time(Duration::from_micros(50_400)), "0.050s");
    }
}
