//! End-to-end pipeline.
//!
//! records → tasks → validation → source tree → `.tjp` → scheduler →
//! bookings → write-back.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::JugglerConfig;
use crate::error::Result;
use crate::loader::{load_tasks, RejectedRecord, SourceProfile};
use crate::models::{keyword, Node};
use crate::render::render;
use crate::scheduler::{MergeReport, SchedulerRunner};
use crate::validation::{validate_tasks, ValidationReport};

/// A source tree built from records, with what was dropped or flagged on
/// the way.
#[derive(Debug, Clone)]
pub struct Plan {
    pub tree: Node,
    pub rejected: Vec<RejectedRecord>,
    pub validation: ValidationReport,
}

impl Plan {
    /// Tasks in the tree.
    pub fn tasks(&self) -> Vec<&Node> {
        self.tree.walk_nodes(keyword::TASK)
    }
}

/// Pipeline driver holding one run's configuration.
#[derive(Debug, Clone, Default)]
pub struct Juggler {
    config: JugglerConfig,
    profile: SourceProfile,
}

impl Juggler {
    /// Creates a juggler; the configuration's profile (if any) is used,
    /// otherwise the flat `records` profile.
    pub fn new(config: JugglerConfig) -> Self {
        let profile = config.profile.clone().unwrap_or_default();
        Self { config, profile }
    }

    /// Replaces the source profile.
    pub fn with_profile(mut self, profile: SourceProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn config(&self) -> &JugglerConfig {
        &self.config
    }

    pub fn profile(&self) -> &SourceProfile {
        &self.profile
    }

    /// Loads, validates and assembles the source tree.
    ///
    /// # Errors
    /// [`crate::error::ModelError::IdentifierCollision`] when two tasks or
    /// resources encode to the same identifier.
    pub fn plan<'a, I>(&self, records: I) -> Result<Plan>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut loaded = load_tasks(&self.profile, records);
        let validation = validate_tasks(&mut loaded.tasks, &self.config.validation);

        let mut tree = Node::source(&self.config.project);
        let mut resources: Vec<&str> = Vec::new();
        for resource in loaded.tasks.iter().flat_map(|t| t.allocations()) {
            if resource != &self.config.project.default_resource && !resources.contains(&resource.as_str()) {
                resources.push(resource);
            }
        }
        for resource in resources {
            tree.attach(Node::resource(resource, resource))?;
        }

        let count = loaded.tasks.len();
        for task in loaded.tasks {
            if let Some(previous) = tree.attach(task)? {
                warn!(task = %previous.as_node().map(Node::id).unwrap_or_default(), "duplicate task replaced");
            }
        }

        info!(
            tasks = count,
            rejected = loaded.rejected.len(),
            issues = validation.issues.len(),
            "planned source"
        );
        Ok(Plan {
            tree,
            rejected: loaded.rejected,
            validation,
        })
    }

    /// Writes the rendered tree to `path`.
    pub fn write_file(&self, tree: &Node, path: &Path) -> Result<()> {
        fs::write(path, render(tree))?;
        info!(path = %path.display(), "wrote source");
        Ok(())
    }

    /// Runs the external scheduler and merges its bookings into `tree`.
    pub fn run(&self, tree: &mut Node) -> Result<MergeReport> {
        SchedulerRunner::new(self.config.run.clone()).run(tree)
    }

    /// Plans and schedules in one go.
    pub fn juggle<'a, I>(&self, records: I) -> Result<(Plan, MergeReport)>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut plan = self.plan(records)?;
        let merged = self.run(&mut plan.tree)?;
        Ok((plan, merged))
    }
}
