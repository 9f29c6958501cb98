//! Command scripts
//!
//! Drives a [`FileSystem`] from a small line-oriented script, one operation
//! per line with the acting user as a positional argument:
//!
//! ```text
//! mkdir /docs root
//! touch /docs/plan root
//! write /docs/plan root first draft
//! append /docs/plan root , revised
//! read /docs/plan alice
//! ls -r / root
//! cp -r /docs /backup root
//! mv /backup /archive root
//! chmod /docs/plan root alice rw-
//! rm -r /archive root
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::fs::{CpOptions, DirentEntry, ErrorKind, FileSystem, FsError, LsOptions, Offset, RmOptions};

const READ_CHUNK: usize = 4096;

/// Result of running a script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub errors: Vec<ScriptFailure>,
}

/// One failed line, as reported in `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptFailure {
    /// 1-based line number in the script
    pub line: usize,
    /// Set when the file system rejected the operation
    pub kind: Option<ErrorKind>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptOptions {
    /// Stop at the first failing line
    pub stop_on_error: bool,
}

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error(transparent)]
    Fs(#[from] FsError),
}

impl ScriptError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ScriptError::Fs(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Split off the first `n` whitespace-separated words, returning the rest of
/// the line with leading whitespace removed.
fn split_words(line: &str, n: usize) -> (Vec<&str>, &str) {
    let mut words = Vec::with_capacity(n);
    let mut rest = line.trim_start();
    while words.len() < n && !rest.is_empty() {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        words.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    (words, rest)
}

/// Strip a leading `-r`/`-R` flag.
fn take_recursive<'a>(args: &[&'a str]) -> (bool, Vec<&'a str>) {
    match args.first() {
        Some(&"-r") | Some(&"-R") => (true, args[1..].to_vec()),
        _ => (false, args.to_vec()),
    }
}

fn parse_number(s: &str) -> Result<usize, ScriptError> {
    s.parse().map_err(|_| ScriptError::InvalidNumber(s.to_string()))
}

fn format_entries(entries: &[DirentEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.path);
        if entry.is_directory {
            out.push('/');
        }
        out.push('\n');
    }
    out
}

/// Run a single script line, returning what it prints on stdout.
pub async fn run_line(fs: &dyn FileSystem, line: &str) -> Result<String, ScriptError> {
    let (head, rest) = split_words(line, 1);
    let Some(&command) = head.first() else {
        return Ok(String::new());
    };
    match command {
        "mkdir" | "touch" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            let [path, user] = args.as_slice() else {
                return Err(ScriptError::Usage("mkdir|touch PATH USER"));
            };
            if command == "mkdir" {
                fs.mkdir(path, user).await?;
            } else {
                fs.touch(path, user).await?;
            }
            Ok(String::new())
        }
        "rm" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            let (recursive, args) = take_recursive(&args);
            let [path, user] = args.as_slice() else {
                return Err(ScriptError::Usage("rm [-r] PATH USER"));
            };
            fs.rm(path, user, &RmOptions { recursive }).await?;
            Ok(String::new())
        }
        "write" | "append" => {
            let (args, content) = split_words(rest, 2);
            let [path, user] = args.as_slice() else {
                return Err(ScriptError::Usage("write|append PATH USER [CONTENT]"));
            };
            fs.write(path, user, command == "append", content.as_bytes()).await?;
            Ok(String::new())
        }
        "read" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            let (path, user, start, limit) = match args.as_slice() {
                [path, user] => (*path, *user, 0, None),
                [path, user, start] => (*path, *user, parse_number(start)?, None),
                [path, user, start, len] => (*path, *user, parse_number(start)?, Some(parse_number(len)?)),
                _ => return Err(ScriptError::Usage("read PATH USER [OFFSET [LENGTH]]")),
            };
            let mut offset = Offset::new(start);
            let mut data = Vec::new();
            let mut chunk = vec![0u8; limit.unwrap_or(READ_CHUNK).min(READ_CHUNK)];
            loop {
                let want = match limit {
                    Some(limit) => (limit - data.len()).min(chunk.len()),
                    None => chunk.len(),
                };
                if want == 0 {
                    break;
                }
                let n = fs.read(path, user, &mut chunk[..want], &mut offset).await?;
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&chunk[..n]);
            }
            let mut out = String::from_utf8_lossy(&data).into_owned();
            out.push('\n');
            Ok(out)
        }
        "mv" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            let [from, to, user] = args.as_slice() else {
                return Err(ScriptError::Usage("mv OLD NEW USER"));
            };
            fs.mv(from, to, user).await?;
            Ok(String::new())
        }
        "cp" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            let (recursive, args) = take_recursive(&args);
            let [from, to, user] = args.as_slice() else {
                return Err(ScriptError::Usage("cp [-r] SRC DEST USER"));
            };
            fs.cp(from, to, user, &CpOptions { recursive }).await?;
            Ok(String::new())
        }
        "ls" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            let (recursive, args) = take_recursive(&args);
            let [path, user] = args.as_slice() else {
                return Err(ScriptError::Usage("ls [-r] PATH USER"));
            };
            let entries = fs.ls(path, user, &LsOptions { recursive }).await?;
            Ok(format_entries(&entries))
        }
        "chmod" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            let [path, user, target, permission] = args.as_slice() else {
                return Err(ScriptError::Usage("chmod PATH USER TARGET_USER PERMISSION"));
            };
            fs.chmod(path, user, target, permission).await?;
            Ok(String::new())
        }
        other => Err(ScriptError::UnknownCommand(other.to_string())),
    }
}

/// Run every line of `script`. Blank lines and `#` comments are skipped.
pub async fn run_script(fs: &dyn FileSystem, script: &str, options: &ScriptOptions) -> ScriptResult {
    let mut result = ScriptResult::default();
    for (idx, raw) in script.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match run_line(fs, line).await {
            Ok(out) => result.stdout.push_str(&out),
            Err(e) => {
                let failure = ScriptFailure {
                    line: idx + 1,
                    kind: e.kind(),
                    message: e.to_string(),
                };
                result.stderr.push_str(&format!("permfs: line {}: {}\n", failure.line, failure.message));
                result.errors.push(failure);
                result.exit_code = 1;
                if options.stop_on_error {
                    break;
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use crate::users::parse_users;

    fn new_fs() -> InMemoryFs {
        InMemoryFs::new(parse_users("root rwx\nalice /docs/** rwx\n").unwrap())
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("write /a root hello  world", 3), (vec!["write", "/a", "root"], "hello  world"));
        assert_eq!(split_words("  ls", 3), (vec!["ls"], ""));
    }

    #[tokio::test]
    async fn test_run_script_end_to_end() {
        let fs = new_fs();
        let result = run_script(
            &fs,
            "# setup\n\
             mkdir /docs root\n\
             mkdir /docs/reports alice\n\
             touch /docs/reports/q1 alice\n\
             write /docs/reports/q1 alice revenue up\n\
             append /docs/reports/q1 alice  and costs down\n\
             read /docs/reports/q1 alice\n\
             read /docs/reports/q1 alice 8 3\n\
             cp -r /docs /backup root\n\
             ls -r / root\n",
            &ScriptOptions::default(),
        )
        .await;
        assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
        assert_eq!(
            result.stdout,
            "revenue upand costs down\n\
             upa\n\
             /docs/\n/docs/reports/\n/docs/reports/q1\n\
             /backup/\n/backup/reports/\n/backup/reports/q1\n"
        );
    }

    #[tokio::test]
    async fn test_errors_continue_unless_stopped() {
        let fs = new_fs();
        let script = "mkdir /docs alice\nfrobnicate\nmkdir /ok root\n";

        let result = run_script(&fs, script, &ScriptOptions::default()).await;
        assert_eq!(result.exit_code, 1);
        assert_eq!(
            result.stderr,
            "permfs: line 1: EACCES: permission denied, mkdir '/docs' (alice lacks write)\n\
             permfs: line 2: unknown command 'frobnicate'\n"
        );
        assert!(fs.exists("/ok").await);

        let fs = new_fs();
        let result = run_script(&fs, script, &ScriptOptions { stop_on_error: true }).await;
        assert_eq!(result.exit_code, 1);
        assert!(!result.stderr.contains("frobnicate"));
        assert!(!fs.exists("/ok").await);
    }

    #[tokio::test]
    async fn test_usage_errors() {
        let fs = new_fs();
        assert!(matches!(run_line(&fs, "rm /a").await, Err(ScriptError::Usage(_))));
        assert!(matches!(run_line(&fs, "read /a root x").await, Err(ScriptError::InvalidNumber(_))));
        assert!(matches!(run_line(&fs, "ls /nope root").await, Err(ScriptError::Fs(_))));
    }

    #[tokio::test]
    async fn test_failures_serialize_with_kind() {
        let fs = new_fs();
        let script = "mkdir /docs alice\n\nls /nope root\nfrobnicate\n";
        let result = run_script(&fs, script, &ScriptOptions::default()).await;
        let errors = serde_json::to_value(&result.errors).unwrap();
        assert_eq!(
            errors,
            serde_json::json!([
                {
                    "line": 1,
                    "kind": "permission_denied",
                    "message": "EACCES: permission denied, mkdir '/docs' (alice lacks write)"
                },
                {
                    "line": 3,
                    "kind": "path_not_found",
                    "message": "ENOENT: no such file or directory, ls '/nope'"
                },
                { "line": 4, "kind": null, "message": "unknown command 'frobnicate'" }
            ])
        );
    }
}
