//! Git operations for the release pipeline.
//!
//! Everything goes through the `git` CLI as a subprocess. Each invocation
//! has a hard timeout so a hung credential helper or network cannot wedge
//! a release forever; on expiry the child is killed and the operation
//! reported as failed.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use wait_timeout::ChildExt;

/// Hard timeout for a single git invocation.
const GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from driving the `git` CLI.
#[derive(Error, Debug)]
pub enum GitError {
    /// The starting directory is not inside a git work tree.
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    /// The `git` binary could not be spawned.
    #[error("failed to run git {operation}: {source}")]
    Spawn {
        /// The git subcommand that was attempted.
        operation: &'static str,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Git ran and exited non-zero.
    #[error("git {operation} failed: {message}")]
    Failed {
        /// The git subcommand that failed.
        operation: &'static str,
        /// Trimmed stderr from git.
        message: String,
    },

    /// Git did not finish within the timeout.
    #[error("git {operation} timed out after {seconds} seconds")]
    TimedOut {
        /// The git subcommand that hung.
        operation: &'static str,
        /// The timeout that expired.
        seconds: u64,
    },
}

/// A handle to the repository being released.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// Discover the repository containing `start` (via `rev-parse
    /// --show-toplevel`).
    pub fn discover(start: &Path) -> Result<Self, GitError> {
        let output = run_git(&["rev-parse", "--show-toplevel"], start, "rev-parse")?;
        if !output.status.success() {
            return Err(GitError::NotARepository(start.to_path_buf()));
        }
        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self {
            root: PathBuf::from(root),
        })
    }

    /// Open a repository rooted exactly at `root` (used by tests).
    pub fn open(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Repository root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True when `git status --porcelain` reports nothing.
    pub fn is_clean(&self) -> Result<bool, GitError> {
        Ok(self.dirty_paths()?.is_empty())
    }

    /// Paths reported by `git status --porcelain` (staged, modified or
    /// untracked), relative to the repository root.
    pub fn dirty_paths(&self) -> Result<Vec<PathBuf>, GitError> {
        let output = self.run_checked(&["status", "--porcelain"], "status")?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .filter(|line| line.len() > 3)
            .map(|line| {
                // Two status columns, a space, then the path; renames
                // show as "old -> new".
                let path = &line[3..];
                let path = path.rsplit(" -> ").next().unwrap_or(path);
                PathBuf::from(path.trim_matches('"'))
            })
            .collect())
    }

    /// Name of the currently checked-out branch.
    pub fn current_branch(&self) -> Result<String, GitError> {
        let output = self.run_checked(&["rev-parse", "--abbrev-ref", "HEAD"], "rev-parse")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Full SHA of `HEAD`.
    pub fn head_sha(&self) -> Result<String, GitError> {
        let output = self.run_checked(&["rev-parse", "HEAD"], "rev-parse")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Stage the given paths.
    pub fn add(&self, paths: &[PathBuf]) -> Result<(), GitError> {
        let mut args: Vec<&str> = vec!["add", "--"];
        let rendered: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        args.extend(rendered.iter().map(String::as_str));
        self.run_checked(&args, "add")?;
        Ok(())
    }

    /// Create a commit with the given message.
    pub fn commit(&self, message: &str) -> Result<(), GitError> {
        self.run_checked(&["commit", "-m", message], "commit")?;
        Ok(())
    }

    /// True when a tag with this name already exists.
    pub fn tag_exists(&self, name: &str) -> Result<bool, GitError> {
        let refname = format!("refs/tags/{name}");
        let output = self.run(&["rev-parse", "--quiet", "--verify", &refname], "rev-parse")?;
        Ok(output.status.success())
    }

    /// Create an annotated tag. The caller checks [`tag_exists`](Self::tag_exists)
    /// first; git itself also refuses to overwrite.
    pub fn tag(&self, name: &str, message: &str) -> Result<(), GitError> {
        self.run_checked(&["tag", "-a", name, "-m", message], "tag")?;
        Ok(())
    }

    /// Push the given branch to `remote`.
    pub fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run_checked(&["push", remote, branch], "push")?;
        Ok(())
    }

    /// Push all tags to `remote`.
    pub fn push_tags(&self, remote: &str) -> Result<(), GitError> {
        self.run_checked(&["push", remote, "--tags"], "push")?;
        Ok(())
    }

    /// All tracked files, relative to the repository root.
    pub fn tracked_files(&self) -> Result<Vec<PathBuf>, GitError> {
        let output = self.run_checked(&["ls-files", "-z"], "ls-files")?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .split('\0')
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    /// Run git in the repository root, succeeding regardless of exit code.
    fn run(&self, args: &[&str], operation: &'static str) -> Result<Output, GitError> {
        run_git(args, &self.root, operation)
    }

    /// Run git in the repository root, mapping non-zero exit to an error.
    fn run_checked(&self, args: &[&str], operation: &'static str) -> Result<Output, GitError> {
        let output = self.run(args, operation)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::Failed {
                operation,
                message: stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

/// Run a git command in `dir` with the hard timeout.
fn run_git(args: &[&str], dir: &Path, operation: &'static str) -> Result<Output, GitError> {
    tracing::debug!(?args, dir = %dir.display(), "running git");

    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| GitError::Spawn {
        operation,
        source,
    })?;

    let waited = child
        .wait_timeout(GIT_TIMEOUT)
        .map_err(|source| GitError::Spawn { operation, source })?;

    match waited {
        Some(status) => {
            let stdout = child
                .stdout
                .take()
                .map(std::io::read_to_string)
                .transpose()
                .map_err(|source| GitError::Spawn { operation, source })?
                .unwrap_or_default();
            let stderr = child
                .stderr
                .take()
                .map(std::io::read_to_string)
                .transpose()
                .map_err(|source| GitError::Spawn { operation, source })?
                .unwrap_or_default();

            Ok(Output {
                status,
                stdout: stdout.into_bytes(),
                stderr: stderr.into_bytes(),
            })
        }
        None => {
            let _ = child.kill();
            let _ = child.wait();
            Err(GitError::TimedOut {
                operation,
                seconds: GIT_TIMEOUT.as_secs(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Initialize a scratch repository with one committed file.
    fn scratch_repo() -> (tempfile::TempDir, GitRepo) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let git = |args: &[&str]| {
            let status = Command::new("git")
                .args(args)
                .current_dir(root)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .unwrap();
            assert!(status.success(), "git {args:?} failed");
        };

        git(&["init", "--initial-branch=main"]);
        git(&["config", "user.email", "test@example.org"]);
        git(&["config", "user.name", "Test"]);
        std::fs::write(root.join("README"), "demo\n").unwrap();
        git(&["add", "README"]);
        git(&["commit", "-m", "initial"]);

        let repo = GitRepo::open(root);
        (dir, repo)
    }

    #[test]
    fn test_discover_rejects_non_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            GitRepo::discover(dir.path()),
            Err(GitError::NotARepository(_))
        ));
    }

    #[test]
    fn test_clean_and_dirty() {
        let (_dir, repo) = scratch_repo();
        assert!(repo.is_clean().unwrap());

        std::fs::write(repo.root().join("new-file"), "x").unwrap();
        assert!(!repo.is_clean().unwrap());
        assert_eq!(repo.dirty_paths().unwrap(), vec![PathBuf::from("new-file")]);
    }

    #[test]
    fn test_commit_and_tag() {
        let (_dir, repo) = scratch_repo();

        std::fs::write(repo.root().join("VERSION"), "1.0.0\n").unwrap();
        repo.add(&[PathBuf::from("VERSION")]).unwrap();
        repo.commit("release 1.0.0").unwrap();
        assert!(repo.is_clean().unwrap());

        assert!(!repo.tag_exists("v1.0.0").unwrap());
        repo.tag("v1.0.0", "release 1.0.0").unwrap();
        assert!(repo.tag_exists("v1.0.0").unwrap());

        // Creating the same tag again must fail.
        assert!(matches!(
            repo.tag("v1.0.0", "again"),
            Err(GitError::Failed { operation: "tag", .. })
        ));
    }

    #[test]
    fn test_tracked_files() {
        let (_dir, repo) = scratch_repo();
        std::fs::write(repo.root().join("untracked"), "x").unwrap();

        let files = repo.tracked_files().unwrap();
        assert_eq!(files, vec![PathBuf::from("README")]);
    }

    #[test]
    fn test_branch_and_head() {
        let (_dir, repo) = scratch_repo();
        assert_eq!(repo.current_branch().unwrap(), "main");
        assert_eq!(repo.head_sha().unwrap().len(), 40);
    }
}
