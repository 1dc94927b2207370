//! Command materializer
//!
//! Turns a work item's command template into the command line a farm task
//! runs: `__PDG_*__` tokens are substituted, then the result is normalized
//! with POSIX shell word rules.

use afbridge_core::tokens;
use tracing::error;

/// Values substituted into a command template
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub item_name: String,
    pub item_index: i64,
    pub temp_dir: String,
    pub work_dir: String,
    pub script_dir: String,
    pub result_server: String,
    pub python_bin: String,
    pub hython_bin: String,
}

/// Outcome of materializing a command template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// Normalized command line ready for submission
    Command(String),
    /// Nothing worth submitting; the item is treated as already cooked
    NoOp,
}

/// Substitutes tokens in `template` and normalizes the result
///
/// Tokens are replaced literally, in a fixed order; unknown tokens are left
/// untouched. The result is split into shell words and re-joined with single
/// spaces. Unbalanced quotes or fewer than two words yield
/// [`Materialized::NoOp`].
pub fn materialize(template: &str, ctx: &CommandContext) -> Materialized {
    let index = ctx.item_index.to_string();
    let substitutions: [(&str, &str); 9] = [
        (tokens::ITEM_NAME, &ctx.item_name),
        (tokens::INDEX, &index),
        (tokens::SHARED_TEMP, &ctx.temp_dir),
        (tokens::TEMP, &ctx.temp_dir),
        (tokens::DIR, &ctx.work_dir),
        (tokens::SCRIPT_DIR, &ctx.script_dir),
        (tokens::RESULT_SERVER, &ctx.result_server),
        (tokens::PYTHON, &ctx.python_bin),
        (tokens::HYTHON, &ctx.hython_bin),
    ];

    let command = substitutions
        .iter()
        .fold(template.to_string(), |command, (token, value)| {
            command.replace(token, value)
        });

    let Some(words) = shlex::split(&command) else {
        error!(item = %ctx.item_name, "Could not split command: {}", command);
        return Materialized::NoOp;
    };

    if words.len() < 2 {
        error!(
            item = %ctx.item_name,
            "Command has fewer than two words, nothing to submit: {}", command
        );
        return Materialized::NoOp;
    }

    match shlex::try_join(words.iter().map(String::as_str)) {
        Ok(joined) => Materialized::Command(joined),
        Err(e) => {
            error!(item = %ctx.item_name, "Could not join command words: {}", e);
            Materialized::NoOp
        }
    }
}
