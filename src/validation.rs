//! Task-set validation.
//!
//! Runs once over the fully assembled task set, before serialization.
//! Per task it corrects what can be corrected safely and flags the rest:
//! - Dependencies on tasks outside the set, and self-dependencies, are
//!   removed
//! - Effort below the minimum is raised (opt-in) or warned about
//! - Placeholder tasks are flagged
//! - Duplicate identifiers, identifier collisions and circular
//!   dependencies are reported without touching the tree
//!
//! Validation never aborts and is idempotent: a second pass over its own
//! output makes no further corrections.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::ident;
use crate::models::{keyword, Depends, Effort, Node, Property};

/// Strictness knobs for a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Raise efforts below `minimum_effort` instead of only warning.
    pub correct_minimum_effort: bool,
    /// Smallest acceptable effort, in the task's own unit.
    pub minimum_effort: u32,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            correct_minimum_effort: false,
            minimum_effort: 1,
        }
    }
}

impl ValidationRules {
    pub fn with_effort_correction(mut self, enabled: bool) -> Self {
        self.correct_minimum_effort = enabled;
        self
    }
}

/// One finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Issue category.
    pub kind: IssueKind,
    /// Task the issue was found on.
    pub task: String,
    /// Human-readable description.
    pub message: String,
    /// Whether the tree was changed to resolve it.
    pub corrected: bool,
}

/// Categories of validation findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// A dependency names a task outside the set.
    DanglingDependency,
    /// A task depends on itself.
    SelfDependency,
    /// Effort below the configured minimum.
    EffortTooLow,
    /// Effort of zero, which the scheduler rejects.
    ZeroEffort,
    /// A task still carries the uninitialized placeholder identifier.
    UninitializedTask,
    /// Two tasks share the same identifier.
    DuplicateId,
    /// Two distinct keys encode to the same identifier.
    IdentifierCollision,
    /// The dependency graph contains a cycle.
    CyclicDependency,
}

impl IssueKind {
    /// Whether the issue is reported at error level.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            Self::ZeroEffort
                | Self::UninitializedTask
                | Self::DuplicateId
                | Self::IdentifierCollision
                | Self::CyclicDependency
        )
    }
}

impl ValidationIssue {
    fn new(kind: IssueKind, task: &str, message: impl Into<String>, corrected: bool) -> Self {
        Self {
            kind,
            task: task.to_string(),
            message: message.into(),
            corrected,
        }
    }
}

/// All findings of one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.kind.is_error())
    }

    pub fn corrections(&self) -> usize {
        self.issues.iter().filter(|i| i.corrected).count()
    }

    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }

    fn push(&mut self, issue: ValidationIssue) {
        if issue.kind.is_error() {
            error!(task = %issue.task, kind = ?issue.kind, "{}", issue.message);
        } else {
            warn!(task = %issue.task, kind = ?issue.kind, corrected = issue.corrected, "{}", issue.message);
        }
        self.issues.push(issue);
    }
}

/// Validates (and where allowed corrects) a task set.
pub fn validate_tasks(tasks: &mut [Node], rules: &ValidationRules) -> ValidationReport {
    let mut report = ValidationReport::default();
    let known: HashSet<String> = tasks.iter().map(|t| t.id().to_string()).collect();

    for task in tasks.iter_mut() {
        prune_depends(task, &known, &mut report);
        check_effort(task, rules, &mut report);
        if task.is_placeholder() {
            report.push(ValidationIssue::new(
                IssueKind::UninitializedTask,
                task.id(),
                "task was never initialized from a record",
                false,
            ));
        }
    }

    check_identifiers(tasks, &mut report);
    if let Some(issue) = detect_cycles(tasks) {
        report.push(issue);
    }

    report
}

fn prune_depends(task: &mut Node, known: &HashSet<String>, report: &mut ValidationReport) {
    let id = task.id().to_string();
    let depends = task.depends();
    if depends.is_empty() {
        return;
    }

    let mut kept = Vec::with_capacity(depends.len());
    let mut removed = Vec::new();
    for dep in depends {
        if *dep == id {
            removed.push(ValidationIssue::new(
                IssueKind::SelfDependency,
                &id,
                format!("removing dependency of '{id}' on itself"),
                true,
            ));
        } else if !known.contains(dep) {
            removed.push(ValidationIssue::new(
                IssueKind::DanglingDependency,
                &id,
                format!("removing link to '{dep}' for '{id}', as not within scope"),
                true,
            ));
        } else {
            kept.push(dep.clone());
        }
    }

    if removed.is_empty() {
        return;
    }
    for issue in removed {
        report.push(issue);
    }
    if kept.is_empty() {
        task.remove_property(keyword::DEPENDS);
    } else {
        task.set_property(Depends { tasks: kept });
    }
}

fn check_effort(task: &mut Node, rules: &ValidationRules, report: &mut ValidationReport) {
    let Some(effort) = task.effort() else {
        return;
    };
    if effort.amount >= rules.minimum_effort && effort.amount > 0 {
        return;
    }

    let id = task.id().to_string();
    let suffix = effort.unit.suffix();
    let minimum = rules.minimum_effort;
    if rules.correct_minimum_effort && minimum > 0 {
        task.set_property(Property::Effort(Effort {
            amount: minimum,
            unit: effort.unit,
        }));
        report.push(ValidationIssue::new(
            IssueKind::EffortTooLow,
            &id,
            format!(
                "estimate {}{suffix} too low for '{id}', assuming {minimum}{suffix}",
                effort.amount
            ),
            true,
        ));
    } else if effort.amount == 0 {
        report.push(ValidationIssue::new(
            IssueKind::ZeroEffort,
            &id,
            format!("effort of '{id}' is 0{suffix}, the scheduler will reject it"),
            false,
        ));
    } else {
        report.push(ValidationIssue::new(
            IssueKind::EffortTooLow,
            &id,
            format!(
                "estimate {}{suffix} for '{id}' is below the minimum of {minimum}{suffix}",
                effort.amount
            ),
            false,
        ));
    }
}

fn check_identifiers(tasks: &[Node], report: &mut ValidationReport) {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut encoded: HashMap<String, &str> = HashMap::new();

    for task in tasks {
        let id = task.id();
        if !seen.insert(id) {
            report.push(ValidationIssue::new(
                IssueKind::DuplicateId,
                id,
                format!("duplicate task id: {id}"),
                false,
            ));
            continue;
        }
        let identifier = ident::encode(id);
        if let Some(existing) = encoded.get(&identifier) {
            report.push(ValidationIssue::new(
                IssueKind::IdentifierCollision,
                id,
                format!("'{existing}' and '{id}' both encode to '{identifier}'"),
                false,
            ));
        } else {
            encoded.insert(identifier, id);
        }
    }
}

/// Detects cycles in the dependency graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently on the DFS stack), a cycle exists. The stack is explicit, one
/// `(node, next neighbor index)` frame per level, so chain length is bounded
/// by memory rather than by the thread stack.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(tasks: &[Node]) -> Option<ValidationIssue> {
    // Build adjacency list: prerequisite → dependents
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut all_ids: Vec<&str> = Vec::new();

    for task in tasks {
        all_ids.push(task.id());
        for dep in task.depends() {
            adj.entry(dep.as_str()).or_default().push(task.id());
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for &node in &all_ids {
        if !visited.contains(node) && has_cycle_from(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationIssue::new(
                IssueKind::CyclicDependency,
                node,
                format!("circular dependency detected involving task '{node}'"),
                false,
            ));
        }
    }

    None
}

fn has_cycle_from<'a>(
    root: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];
    visited.insert(root);
    in_stack.insert(root);

    while let Some(frame) = stack.last_mut() {
        let (node, next) = *frame;
        let neighbors = adj.get(node).map(Vec::as_slice).unwrap_or_default();
        match neighbors.get(next) {
            Some(&neighbor) => {
                frame.1 += 1;
                if in_stack.contains(neighbor) {
                    return true; // Back edge → cycle
                }
                if visited.insert(neighbor) {
                    in_stack.insert(neighbor);
                    stack.push((neighbor, 0));
                }
            }
            None => {
                in_stack.remove(node);
                stack.pop();
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Effort;

    fn task(id: &str) -> Node {
        Node::task(id).with_effort(Effort::hours(2)).with_allocation("me")
    }

    #[test]
    fn test_valid_tasks() {
        let mut tasks = vec![task("A"), task("B").with_depends(["A"])];
        let report = validate_tasks(&mut tasks, &ValidationRules::default());
        assert!(report.is_clean());
    }

    #[test]
    fn test_dangling_dependency_removed() {
        let mut tasks = vec![task("A").with_depends(["C"]), task("B")];
        let report = validate_tasks(&mut tasks, &ValidationRules::default());

        assert!(tasks[0].depends().is_empty());
        assert!(tasks[0].property(keyword::DEPENDS).is_none());
        assert!(report.has(IssueKind::DanglingDependency));
        assert_eq!(report.corrections(), 1);
    }

    #[test]
    fn test_partial_prune_keeps_order() {
        let mut tasks = vec![
            task("A").with_depends(["B", "X", "C"]),
            task("B"),
            task("C"),
        ];
        validate_tasks(&mut tasks, &ValidationRules::default());
        assert_eq!(tasks[0].depends(), ["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_self_dependency_removed() {
        let mut tasks = vec![task("A").with_depends(["A"])];
        let report = validate_tasks(&mut tasks, &ValidationRules::default());
        assert!(tasks[0].depends().is_empty());
        assert!(report.has(IssueKind::SelfDependency));
    }

    #[test]
    fn test_low_effort_warned_by_default() {
        let mut tasks = vec![Node::task("A").with_effort(Effort::hours(2))];
        let rules = ValidationRules {
            minimum_effort: 4,
            ..ValidationRules::default()
        };
        let report = validate_tasks(&mut tasks, &rules);
        assert_eq!(tasks[0].effort(), Some(Effort::hours(2)));
        assert!(report.has(IssueKind::EffortTooLow));
        assert_eq!(report.corrections(), 0);
        assert_eq!(report.errors().count(), 0);
    }

    #[test]
    fn test_zero_effort_is_error_without_correction() {
        let mut tasks = vec![Node::task("A").with_effort(Effort::hours(0))];
        let report = validate_tasks(&mut tasks, &ValidationRules::default());
        assert_eq!(tasks[0].effort(), Some(Effort::hours(0)));
        assert!(report.has(IssueKind::ZeroEffort));
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.corrections(), 0);
    }

    #[test]
    fn test_zero_effort_with_zero_minimum_still_reported() {
        let mut tasks = vec![Node::task("A").with_effort(Effort::hours(0))];
        let rules = ValidationRules {
            correct_minimum_effort: true,
            minimum_effort: 0,
        };
        let report = validate_tasks(&mut tasks, &rules);
        assert!(report.has(IssueKind::ZeroEffort));
        assert_eq!(report.corrections(), 0);
    }

    #[test]
    fn test_low_effort_corrected_when_enabled() {
        let mut tasks = vec![Node::task("A").with_effort(Effort::days(0))];
        let rules = ValidationRules::default().with_effort_correction(true);
        let report = validate_tasks(&mut tasks, &rules);
        assert_eq!(tasks[0].effort(), Some(Effort::days(1)));
        assert_eq!(report.corrections(), 1);
    }

    #[test]
    fn test_placeholder_flagged() {
        let mut tasks = vec![Node::placeholder_task(), task("A")];
        let report = validate_tasks(&mut tasks, &ValidationRules::default());
        assert_eq!(report.errors().count(), 1);
        assert!(report.has(IssueKind::UninitializedTask));
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn test_duplicate_id() {
        let mut tasks = vec![task("J1"), task("J1")];
        let report = validate_tasks(&mut tasks, &ValidationRules::default());
        assert!(report.has(IssueKind::DuplicateId));
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn test_identifier_collision() {
        let mut tasks = vec![task("a-b"), task("a_d_b")];
        let report = validate_tasks(&mut tasks, &ValidationRules::default());
        let issue = report
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::IdentifierCollision)
            .unwrap();
        assert_eq!(issue.task, "a_d_b");
    }

    #[test]
    fn test_cyclic_dependency() {
        // A → B → C → A (cycle)
        let mut tasks = vec![
            task("A").with_depends(["C"]),
            task("B").with_depends(["A"]),
            task("C").with_depends(["B"]),
        ];
        let report = validate_tasks(&mut tasks, &ValidationRules::default());
        assert!(report.has(IssueKind::CyclicDependency));
        assert_eq!(tasks[0].depends(), ["C".to_string()]);
    }

    #[test]
    fn test_no_cycle_in_chain() {
        let mut tasks = vec![
            task("A"),
            task("B").with_depends(["A"]),
            task("C").with_depends(["B"]),
        ];
        let report = validate_tasks(&mut tasks, &ValidationRules::default());
        assert!(!report.has(IssueKind::CyclicDependency));
    }

    #[test]
    fn test_idempotent() {
        let mut tasks = vec![
            task("A").with_depends(["C", "A"]),
            Node::task("B").with_effort(Effort::hours(0)),
        ];
        let rules = ValidationRules::default().with_effort_correction(true);
        let first = validate_tasks(&mut tasks, &rules);
        assert_eq!(first.corrections(), 3);
        let snapshot = tasks.clone();

        let second = validate_tasks(&mut tasks, &rules);
        assert_eq!(second.corrections(), 0);
        assert!(second.is_clean());
        assert_eq!(tasks, snapshot);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let n = 100_000;
        let mut tasks: Vec<Node> = (0..n)
            .map(|i| {
                let t = task(&format!("T{i}"));
                if i == 0 {
                    t
                } else {
                    t.with_depends([format!("T{}", i - 1)])
                }
            })
            .collect();
        let report = validate_tasks(&mut tasks, &ValidationRules::default());
        assert!(report.is_clean());
    }

    #[test]
    fn test_cycle_found_at_end_of_long_chain() {
        let n = 100_000;
        let mut tasks: Vec<Node> = (0..n)
            .map(|i| task(&format!("T{i}")).with_depends([format!("T{}", (i + n - 1) % n)]))
            .collect();
        let report = validate_tasks(&mut tasks, &ValidationRules::default());
        assert!(report.has(IssueKind::CyclicDependency));
    }
}
