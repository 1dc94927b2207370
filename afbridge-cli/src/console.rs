//! Console engine
//!
//! Stands in for the work-graph engine when cooking from the command line:
//! prints every lifecycle event and tracks when all items are done.

use std::collections::BTreeMap;

use afbridge_core::domain::attribute::AttrValue;
use afbridge_scheduler::EnginePort;
use colored::*;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Cook state of one item as seen by the console
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Pending,
    Running,
    /// Nothing to run remotely
    Cooked,
    Succeeded(f64),
    Failed,
    Cancelled,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending | Outcome::Running)
    }
}

/// Engine printing events to the terminal
pub struct ConsoleEngine {
    outcomes: Mutex<BTreeMap<String, Outcome>>,
    done: Notify,
}

impl ConsoleEngine {
    pub fn new<I>(item_names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            outcomes: Mutex::new(
                item_names
                    .into_iter()
                    .map(|name| (name, Outcome::Pending))
                    .collect(),
            ),
            done: Notify::new(),
        }
    }

    /// Records an outcome; the first terminal outcome of an item sticks
    pub fn record(&self, item_name: &str, outcome: Outcome) {
        let all_done = {
            let mut outcomes = self.outcomes.lock();
            let current = outcomes
                .entry(item_name.to_string())
                .or_insert(Outcome::Pending);
            if current.is_terminal() {
                return;
            }
            *current = outcome;
            outcomes.values().all(Outcome::is_terminal)
        };
        if all_done {
            self.done.notify_waiters();
        }
    }

    pub fn all_done(&self) -> bool {
        self.outcomes.lock().values().all(Outcome::is_terminal)
    }

    /// Resolves once every item reached a terminal outcome
    pub async fn wait_all(&self) {
        loop {
            let notified = self.done.notified();
            if self.all_done() {
                return;
            }
            notified.await;
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, Outcome> {
        self.outcomes.lock().clone()
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .lock()
            .values()
            .filter(|o| matches!(o, Outcome::Failed | Outcome::Cancelled | Outcome::Pending))
            .count()
    }

    /// Prints one line per item
    pub fn print_summary(&self) {
        let outcomes = self.snapshot();
        println!();
        println!("{}", format!("Cook summary ({} item(s)):", outcomes.len()).bold());
        for (name, outcome) in outcomes {
            let status = match outcome {
                Outcome::Pending | Outcome::Running => "INCOMPLETE".yellow(),
                Outcome::Cooked => "COOKED".green(),
                Outcome::Succeeded(_) => "SUCCEEDED".green(),
                Outcome::Failed => "FAILED".red(),
                Outcome::Cancelled => "CANCELLED".yellow(),
            };
            match outcome {
                Outcome::Succeeded(duration) => {
                    println!("  {} {} {}", status, name, format!("({:.1}s)", duration).dimmed())
                }
                _ => println!("  {} {}", status, name),
            }
        }
    }
}

fn label(item_name: &str, subindex: i32) -> String {
    if subindex >= 0 {
        format!("{}[{}]", item_name, subindex)
    } else {
        item_name.to_string()
    }
}

impl EnginePort for ConsoleEngine {
    fn work_item_started(&self, item_name: &str, subindex: i32) {
        let first = subindex < 0
            && self
                .outcomes
                .lock()
                .get(item_name)
                .is_none_or(|o| *o == Outcome::Pending);
        if first {
            println!("{} {}", "▶ started".cyan(), label(item_name, subindex));
        }
        if subindex < 0 {
            self.record(item_name, Outcome::Running);
        }
    }

    fn work_item_succeeded(&self, item_name: &str, subindex: i32, duration: f64) {
        println!(
            "{} {} {}",
            "✓ succeeded".green(),
            label(item_name, subindex),
            format!("({:.1}s)", duration).dimmed()
        );
        if subindex < 0 {
            self.record(item_name, Outcome::Succeeded(duration));
        }
    }

    fn work_item_failed(&self, item_name: &str, subindex: i32) {
        println!("{} {}", "✗ failed".red(), label(item_name, subindex));
        if subindex < 0 {
            self.record(item_name, Outcome::Failed);
        }
    }

    fn work_item_cancelled(&self, item_name: &str, subindex: i32) {
        println!("{} {}", "⚠ cancelled".yellow(), label(item_name, subindex));
        if subindex < 0 {
            self.record(item_name, Outcome::Cancelled);
        }
    }

    fn work_item_file_result(
        &self,
        item_name: &str,
        subindex: i32,
        result: &[u8],
        tag: &str,
        _hash: i64,
    ) {
        println!(
            "  {} {} [{}] {}",
            "result".dimmed(),
            label(item_name, subindex),
            tag,
            String::from_utf8_lossy(result)
        );
    }

    fn work_item_set_attribute(
        &self,
        item_name: &str,
        subindex: i32,
        attr_name: &str,
        values: &[AttrValue],
    ) {
        let values: Vec<String> = values.iter().map(ToString::to_string).collect();
        println!(
            "  {} {} {} = [{}]",
            "attr".dimmed(),
            label(item_name, subindex),
            attr_name,
            values.join(", ")
        );
    }
}
