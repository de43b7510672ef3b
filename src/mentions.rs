//! `@name` mention parsing and resolution.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::models::Agent;

/// `@` followed by ASCII word characters.
static HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("mention pattern is valid"));

/// Extract `@handle` tokens from a comment, in order of appearance.
///
/// A bare `@` yields nothing.
pub fn parse_handles(content: &str) -> Vec<&str> {
    HANDLE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Resolve handles against the roster by case-insensitive exact name match.
///
/// Unknown handles are skipped and duplicates collapse to the first hit.
pub fn resolve<'a, I>(handles: I, agents: &[Agent]) -> Vec<Uuid>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ids = Vec::new();
    for handle in handles {
        let found = agents
            .iter()
            .find(|agent| agent.name.eq_ignore_ascii_case(handle));
        if let Some(agent) = found {
            if !ids.contains(&agent.id) {
                ids.push(agent.id);
            }
        }
    }
    ids
}

/// Parse and resolve in one step.
pub fn resolve_content(content: &str, agents: &[Agent]) -> Vec<Uuid> {
    resolve(parse_handles(content), agents)
}
