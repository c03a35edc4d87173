use crate::loader::{LoadEvent, LoadPhase};
use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Terminal feedback for a taxdump load.
///
/// Reading and verifying show a spinner; writing switches to a bar once
/// the row total is known. Hidden when stdout is not a terminal.
pub struct LoadProgress {
    pb: ProgressBar,
}

impl LoadProgress {
    pub fn new() -> Self {
        let pb = if console::Term::stdout().is_term() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        Self { pb }
    }

    pub fn handle(&self, event: &LoadEvent) {
        match event {
            LoadEvent::Started(phase) => {
                self.pb.set_message(phase.describe());
                self.pb.enable_steady_tick(Duration::from_millis(100));
            }
            LoadEvent::Written { rows, total } => {
                if self.pb.length() != Some(*total as u64) {
                    self.pb.set_length(*total as u64);
                    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len}") {
                        self.pb.set_style(style.progress_chars("=> "));
                    }
                }
                self.pb.set_position(*rows as u64);
            }
            LoadEvent::Finished(LoadPhase::Writing) => {
                self.pb.finish_and_clear();
            }
            LoadEvent::Finished(phase) => {
                self.pb.println(format!("  {} {}", Icons::CHECK, phase.describe()));
            }
        }
    }

    pub fn finish_with_summary(&self, duration: Duration, taxa: usize, named: usize) {
        self.pb.finish_and_clear();
        println!();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().success.clone()),
            format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!(
            "  {} {} taxa  {} {} named",
            Icons::TREE.style(theme().info.clone()),
            taxa,
            Icons::LEAF.style(theme().info.clone()),
            named
        );
    }
}

impl Default for LoadProgress {
    fn default() -> Self {
        Self::new()
    }
}
