//! Path localization
//!
//! Result paths travel between the submitting host and farm hosts with the
//! working directory replaced by the `__PDG_DIR__` token. Each side localizes
//! them against its own environment.

use crate::tokens;

/// Rewrites `local_path` so that it is rooted at `__PDG_DIR__`
///
/// `lookup` resolves environment variables; without `PDG_DIR` the path is
/// returned with only its separators normalized.
pub fn delocalize_path_with<F>(local_path: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let normalized = local_path.replace('\\', "/");
    let Some(pdg_dir) = lookup(tokens::env::DIR) else {
        return normalized;
    };

    // PDG_DIR may itself be expressed in terms of other variables
    let pdg_dir = expand(&pdg_dir, &lookup).replace('\\', "/");
    if pdg_dir.is_empty() {
        return normalized;
    }
    normalized.replacen(&pdg_dir, tokens::DIR, 1)
}

/// [`delocalize_path_with`] against the process environment
pub fn delocalize_path(local_path: &str) -> String {
    delocalize_path_with(local_path, |var| std::env::var(var).ok())
}

/// Replaces `__PDG_*__` tokens and expands environment variables
pub fn localize_path_with<F>(delocalized: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut path = delocalized.to_string();
    for (token, var) in [
        (tokens::DIR, tokens::env::DIR),
        (tokens::ITEM_NAME, tokens::env::ITEM_NAME),
        (tokens::TEMP, tokens::env::TEMP),
        (tokens::RESULT_SERVER, tokens::env::RESULT_SERVER),
        (tokens::INDEX, tokens::env::INDEX),
    ] {
        if path.contains(token) {
            if let Some(value) = lookup(var) {
                path = path.replace(token, &value);
            }
        }
    }

    // Twice, for variables defined in terms of other variables
    let path = expand(&path, &lookup);
    let path = expand(&path, &lookup);
    path.replace('\\', "/")
}

/// [`localize_path_with`] against the process environment
pub fn localize_path(delocalized: &str) -> String {
    localize_path_with(delocalized, |var| std::env::var(var).ok())
}

fn expand<F>(input: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    shellexpand::env_with_context_no_errors(input, |var: &str| lookup(var)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_delocalize_replaces_working_dir_prefix() {
        let vars = env(&[("PDG_DIR", "/mnt/farm/pdg")]);
        let out = delocalize_path_with("/mnt/farm/pdg/geo/out.bgeo", |k| vars.get(k).cloned());
        assert_eq!(out, "__PDG_DIR__/geo/out.bgeo");
    }

    #[test]
    fn test_delocalize_expands_nested_variables() {
        let vars = env(&[("PDG_DIR", "$ROOT/pdg"), ("ROOT", "C:\\farm")]);
        let out = delocalize_path_with("C:\\farm\\pdg\\a.txt", |k| vars.get(k).cloned());
        assert_eq!(out, "__PDG_DIR__/a.txt");
    }

    #[test]
    fn test_delocalize_without_pdg_dir() {
        let out = delocalize_path_with("/tmp/a.txt", |_| None);
        assert_eq!(out, "/tmp/a.txt");
    }

    #[test]
    fn test_localize_round_trip() {
        let vars = env(&[("PDG_DIR", "/mnt/farm/pdg"), ("PDG_ITEM_NAME", "workitem_a")]);
        let out = localize_path_with("__PDG_DIR__/__PDG_ITEM_NAME__.log", |k| vars.get(k).cloned());
        assert_eq!(out, "/mnt/farm/pdg/workitem_a.log");
    }

    #[test]
    fn test_localize_expands_variables_twice() {
        let vars = env(&[("JOB", "$HIP/job"), ("HIP", "/show")]);
        let out = localize_path_with("$JOB/render", |k| vars.get(k).cloned());
        assert_eq!(out, "/show/job/render");
    }

    #[test]
    fn test_localize_leaves_unknown_tokens() {
        let out = localize_path_with("__PDG_TEMP__/x", |_| None);
        assert_eq!(out, "__PDG_TEMP__/x");
    }
}
