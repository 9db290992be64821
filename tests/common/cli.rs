use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

#[derive(Debug)]
pub struct BagzRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

pub struct BagzWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub log_dir: PathBuf,
}

impl BagzWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let log_dir = root.join("logs");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            log_dir,
        }
    }

    /// Write `.bagz/config.yaml` in the workspace root.
    pub fn write_project_config(&self, contents: &str) -> PathBuf {
        let dir = self.root.join(".bagz");
        fs::create_dir_all(&dir).expect("project dir");
        let path = dir.join("config.yaml");
        fs::write(&path, contents).expect("write project config");
        path
    }

    /// Write `~/.config/bagz/config.yaml` (HOME is the workspace root).
    pub fn write_user_config(&self, contents: &str) -> PathBuf {
        let dir = self.root.join(".config").join("bagz");
        fs::create_dir_all(&dir).expect("user config dir");
        let path = dir.join("config.yaml");
        fs::write(&path, contents).expect("write user config");
        path
    }
}

pub fn run_bagz<I, S>(workspace: &BagzWorkspace, args: I, label: &str) -> BagzRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_bagz_full(
        workspace,
        &workspace.root,
        args,
        std::iter::empty::<(String, String)>(),
        None,
        label,
    )
}

/// Run from a directory other than the workspace root.
pub fn run_bagz_in_dir<I, S>(workspace: &BagzWorkspace, cwd: &Path, args: I, label: &str) -> BagzRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_bagz_full(
        workspace,
        cwd,
        args,
        std::iter::empty::<(String, String)>(),
        None,
        label,
    )
}

pub fn run_bagz_with_env<I, S, E, K, V>(
    workspace: &BagzWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> BagzRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    run_bagz_full(workspace, &workspace.root, args, env_vars, None, label)
}

pub fn run_bagz_with_stdin<I, S>(
    workspace: &BagzWorkspace,
    args: I,
    stdin: impl Into<Vec<u8>>,
    label: &str,
) -> BagzRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_bagz_full(
        workspace,
        &workspace.root,
        args,
        std::iter::empty::<(String, String)>(),
        Some(stdin.into()),
        label,
    )
}

fn run_bagz_full<I, S, E, K, V>(
    workspace: &BagzWorkspace,
    cwd: &Path,
    args: I,
    env_vars: E,
    stdin: Option<Vec<u8>>,
    label: &str,
) -> BagzRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bagz"));
    cmd.current_dir(cwd);
    cmd.args(args);
    cmd.env_remove("BAGZ_URL");
    cmd.env_remove("BAGZ_DIR");
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "bagzulla=debug");
    cmd.env("RUST_BACKTRACE", "1");
    cmd.env("HOME", &workspace.root);
    // Always feed stdin so a command waiting on it cannot hang the suite.
    cmd.write_stdin(stdin.unwrap_or_default());

    let start = Instant::now();
    let output = cmd.output().expect("run bagz");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let timestamp = SystemTime::now();
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        timestamp,
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        cwd.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    BagzRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// Parse the JSON error document printed on stderr.
pub fn parse_error_json(stderr: &str) -> serde_json::Value {
    let start = stderr
        .find("{\n  \"error\"")
        .expect("error JSON on stderr");
    let end = stderr.rfind('}').expect("error JSON end");
    serde_json::from_str(&stderr[start..=end]).expect("valid error JSON")
}
