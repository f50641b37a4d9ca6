use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::models::{Task, TaskFilter};

/// Applies the list filter, then ranks by fuzzy match against title and
/// description. An empty query keeps snapshot order.
pub fn filter_tasks<'a>(tasks: &'a [Task], filter: TaskFilter, query: &str) -> Vec<&'a Task> {
    let query = query.trim();
    let filtered = tasks.iter().filter(|t| filter.matches(t));

    if query.is_empty() {
        return filtered.collect();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored: Vec<(i64, &Task)> = filtered
        .filter_map(|task| score(&matcher, task, query).map(|s| (s, task)))
        .collect();

    // Stable sort keeps newest-first among equal scores
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, task)| task).collect()
}

fn score(matcher: &SkimMatcherV2, task: &Task, query: &str) -> Option<i64> {
    let title = matcher.fuzzy_match(&task.title, query);
    // Title hits rank above description-only hits
    let description = matcher
        .fuzzy_match(&task.description, query)
        .map(|s| s / 2);

    match (title, description) {
        (Some(t), Some(d)) => Some(t.max(d)),
        (t, d) => t.or(d),
    }
}
