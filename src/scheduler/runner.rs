//! External scheduler invocation.
//!
//! The runner renders the tree into a scoped temporary `.tjp` file, points
//! the tree's `outputdir` at a scoped temporary directory, runs the
//! scheduler binary as a blocking subprocess and merges the calendar report
//! it leaves behind. The temporaries are RAII guards, so they are removed on
//! every exit path unless retention is requested. The tree's own output
//! declarations are restored before `run` returns, whatever the outcome.
//!
//! There is no timeout: a scheduler that never exits blocks the caller.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, error, info, warn};

use super::config::RunConfig;
use super::merge::{merge, MergeReport};
use crate::error::{Result, SchedulerError};
use crate::models::{keyword, Node, Property};
use crate::render::render;

const TEMP_PREFIX: &str = "juggler-";
const DEFAULT_REPORT: &str = "calendar";

/// Runs the external scheduler over a node tree.
#[derive(Debug, Clone, Default)]
pub struct SchedulerRunner {
    config: RunConfig,
}

/// Output declarations as they were before the run.
struct SavedDeclarations {
    outputdir: Option<String>,
    icalreport: Option<String>,
}

impl SchedulerRunner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Schedules `tree` and merges the resulting bookings into it.
    ///
    /// # Errors
    /// - [`SchedulerError::NotFound`] / [`SchedulerError::Spawn`] when the
    ///   binary cannot be started
    /// - [`SchedulerError::Failed`] on a nonzero exit
    /// - [`SchedulerError::MissingResult`] when no calendar report was written
    /// - [`crate::error::ParseError`] for a malformed report
    pub fn run(&self, tree: &mut Node) -> Result<MergeReport> {
        let outdir = self.temp_dir()?;
        let input = self.temp_input()?;

        let report = tree
            .declaration(keyword::ICALREPORT)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REPORT)
            .to_string();
        let saved = override_declarations(tree, outdir.path(), &report);

        let result = self.schedule(tree, &input, outdir.path(), &report);

        restore_declarations(tree, saved);
        if let Err(error) = self.finish(input, outdir) {
            warn!(%error, "could not clean up scheduler files");
        }
        result
    }

    fn schedule(
        &self,
        tree: &mut Node,
        input: &NamedTempFile,
        outdir: &Path,
        report: &str,
    ) -> Result<MergeReport> {
        let mut file = input.as_file();
        file.write_all(render(tree).as_bytes())
            .map_err(SchedulerError::from)?;
        file.flush().map_err(SchedulerError::from)?;

        let binary = &self.config.binary;
        info!(binary = %binary.display(), input = %input.path().display(), "running scheduler");

        let output = Command::new(binary)
            .arg(input.path())
            .current_dir(outdir)
            .output()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => SchedulerError::NotFound {
                    binary: binary.clone(),
                },
                _ => SchedulerError::Spawn {
                    binary: binary.clone(),
                    source,
                },
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(code = ?output.status.code(), %stderr, "scheduler failed");
            return Err(SchedulerError::Failed {
                code: output.status.code(),
                stderr,
            }
            .into());
        }
        debug!(stdout = %String::from_utf8_lossy(&output.stdout), "scheduler finished");

        let path = outdir.join(format!("{report}.ics"));
        if !path.is_file() {
            return Err(SchedulerError::MissingResult { path }.into());
        }
        merge(tree, &path)
    }

    fn temp_dir(&self) -> std::result::Result<TempDir, SchedulerError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX);
        let dir = match &self.config.work_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn temp_input(&self) -> std::result::Result<NamedTempFile, SchedulerError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(".tjp");
        let file = match &self.config.work_root {
            Some(root) => builder.tempfile_in(root)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }

    /// Releases or keeps the temporaries.
    fn finish(&self, input: NamedTempFile, outdir: TempDir) -> std::result::Result<(), SchedulerError> {
        if !self.config.retain_temp_files {
            input.close()?;
            outdir.close()?;
            return Ok(());
        }
        let input: PathBuf = input
            .into_temp_path()
            .keep()
            .map_err(|e| SchedulerError::Io(e.error))?;
        let outdir: PathBuf = outdir.keep();
        info!(input = %input.display(), outdir = %outdir.display(), "retained scheduler files");
        Ok(())
    }
}

fn override_declarations(tree: &mut Node, outdir: &Path, report: &str) -> SavedDeclarations {
    let outdir = outdir.display().to_string();
    let outputdir = tree.replace_declaration(keyword::OUTPUTDIR, &outdir);
    if outputdir.is_none() {
        let declaration = Property::declaration(keyword::OUTPUTDIR, outdir);
        match tree.first_node_mut(keyword::PROJECT) {
            Some(project) => project.set_property(declaration),
            None => tree.set_property(declaration),
        };
    }
    let icalreport = tree.replace_declaration(keyword::ICALREPORT, report);
    if icalreport.is_none() {
        tree.set_property(Property::declaration(keyword::ICALREPORT, report));
    }
    SavedDeclarations {
        outputdir,
        icalreport,
    }
}

fn restore_declarations(tree: &mut Node, saved: SavedDeclarations) {
    for (keyword, value) in [
        (keyword::OUTPUTDIR, saved.outputdir),
        (keyword::ICALREPORT, saved.icalreport),
    ] {
        match value {
            Some(value) => {
                tree.replace_declaration(keyword, &value);
            }
            None => {
                tree.remove_declaration(keyword);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{Effort, ProjectSettings};
    use std::fs;
    use std::sync::Mutex;

    // Writing a script while another test thread forks can leave the script
    // busy for exec, so process-spawning tests run one at a time.
    static SPAWN_LOCK: Mutex<()> = Mutex::new(());

    fn tree() -> Node {
        let mut root = Node::source(&ProjectSettings::default());
        root.set_property(Node::task("1").with_effort(Effort::hours(3)).with_allocation("me"));
        root
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-tj3");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    const WRITES_CALENDAR: &str = r#"grep -q "task _n_1" "$1" || exit 3
cat > calendar.ics <<'EOF'
BEGIN:VCALENDAR
BEGIN:VEVENT
UID:default-_n_1
DTSTART:20171010T090000Z
DTEND:20171010T120000Z
END:VEVENT
END:VCALENDAR
EOF"#;

    #[cfg(unix)]
    #[test]
    fn test_run_merges_bookings() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let runner = SchedulerRunner::new(
            RunConfig::default()
                .with_binary(script(bin.path(), WRITES_CALENDAR))
                .with_work_root(work.path()),
        );

        let mut root = tree();
        let report = runner.run(&mut root).unwrap();
        assert_eq!(report.attached, 1);
        assert_eq!(root.walk_nodes(keyword::BOOKING).len(), 1);

        assert_eq!(root.declaration(keyword::OUTPUTDIR), Some("REPORT"));
        assert_eq!(root.declaration(keyword::ICALREPORT), Some("calendar"));
        assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_cleans_up_and_restores() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let runner = SchedulerRunner::new(
            RunConfig::default()
                .with_binary(script(bin.path(), "echo boom >&2\nexit 2"))
                .with_work_root(work.path()),
        );

        let mut root = tree();
        let before = root.clone();
        let err = runner.run(&mut root).unwrap_err();
        match err {
            Error::Scheduler(SchedulerError::Failed { code, stderr }) => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(root, before);
        assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_result() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let runner = SchedulerRunner::new(
            RunConfig::default()
                .with_binary(script(bin.path(), "exit 0"))
                .with_work_root(work.path()),
        );

        let err = runner.run(&mut tree()).unwrap_err();
        assert!(matches!(
            err,
            Error::Scheduler(SchedulerError::MissingResult { .. })
        ));
        assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_malformed_result_cleans_up_and_restores() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let body = "printf 'BEGIN:VCALENDAR\\nBEGIN:VEVENT\\nUID:default-_n_1\\n' > calendar.ics";
        let runner = SchedulerRunner::new(
            RunConfig::default()
                .with_binary(script(bin.path(), body))
                .with_work_root(work.path()),
        );

        let mut root = tree();
        let before = root.clone();
        let err = runner.run(&mut root).unwrap_err();
        match err {
            Error::Parse(parse) => assert_eq!(parse.message, "unterminated VEVENT"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(root, before);
        assert_eq!(root.declaration(keyword::OUTPUTDIR), Some("REPORT"));
        assert_eq!(root.declaration(keyword::ICALREPORT), Some("calendar"));
        assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_cleanup_failure_keeps_scheduler_error() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        // The output directory is gone before cleanup runs.
        let body = "rm -rf \"$PWD\"\necho boom >&2\nexit 2";
        let runner = SchedulerRunner::new(
            RunConfig::default()
                .with_binary(script(bin.path(), body))
                .with_work_root(work.path()),
        );

        let mut root = tree();
        let err = runner.run(&mut root).unwrap_err();
        assert!(matches!(
            err,
            Error::Scheduler(SchedulerError::Failed { code: Some(2), .. })
        ));
        assert_eq!(root.declaration(keyword::OUTPUTDIR), Some("REPORT"));
    }

    #[cfg(unix)]
    #[test]
    fn test_retain_keeps_files() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let runner = SchedulerRunner::new(
            RunConfig::default()
                .with_binary(script(bin.path(), WRITES_CALENDAR))
                .with_work_root(work.path())
                .retain_temp_files(true),
        );

        runner.run(&mut tree()).unwrap();
        let kept: Vec<PathBuf> = fs::read_dir(work.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().any(|p| p.join("calendar.ics").is_file()));
        assert!(kept
            .iter()
            .any(|p| p.extension().is_some_and(|ext| ext == "tjp")));
    }

    #[test]
    fn test_missing_binary() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let work = TempDir::new().unwrap();
        let runner = SchedulerRunner::new(
            RunConfig::default()
                .with_binary("/nonexistent/bin/tj3")
                .with_work_root(work.path()),
        );

        let mut root = tree();
        let err = runner.run(&mut root).unwrap_err();
        assert!(matches!(
            err,
            Error::Scheduler(SchedulerError::NotFound { .. })
        ));
        assert_eq!(root.declaration(keyword::OUTPUTDIR), Some("REPORT"));
        assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_override_adds_missing_declarations() {
        let mut root = Node::container().with_property(Node::new(keyword::PROJECT, "p").singleton());
        let saved = override_declarations(&mut root, Path::new("/tmp/out"), "calendar");
        assert_eq!(root.declaration(keyword::OUTPUTDIR), Some("/tmp/out"));
        assert_eq!(root.declaration(keyword::ICALREPORT), Some("calendar"));

        restore_declarations(&mut root, saved);
        assert!(root.declaration(keyword::OUTPUTDIR).is_none());
        assert!(root.declaration(keyword::ICALREPORT).is_none());
    }
}
