//! Input context acquisition.
//!
//! The context comes from an external fetcher command that prints one JSON
//! object on stdout and keeps its diagnostics on stderr, or from a JSON file
//! prepared earlier.

use crate::error::ContextError;
use crate::models::InputContext;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// How to invoke the context fetcher.
#[derive(Debug, Clone)]
pub struct FetchCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl FetchCommand {
    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run the fetcher for `entity` and decode its stdout.
pub async fn fetch_context(
    command: &FetchCommand,
    entity: &str,
) -> Result<InputContext, ContextError> {
    info!("Fetching context for {} via `{}`", entity, command.display());

    let child = Command::new(&command.program)
        .args(&command.args)
        .arg(entity)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ContextError::Spawn {
            command: command.display(),
            source,
        })?;

    let output = tokio::time::timeout(command.timeout, child.wait_with_output())
        .await
        .map_err(|_| ContextError::TimedOut(command.timeout))??;

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        debug!("[context] {}", line);
    }

    if !output.status.success() {
        return Err(ContextError::Failed {
            status: output.status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    decode_context(&String::from_utf8_lossy(&output.stdout))
}

/// Read a context from a JSON file.
pub fn load_context_file(path: &Path) -> Result<InputContext, ContextError> {
    info!("Loading context from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    decode_context(&content)
}

/// Decode fetcher output. Empty output is an error of its own.
pub fn decode_context(text: &str) -> Result<InputContext, ContextError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ContextError::Empty);
    }
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sh(script: &str) -> FetchCommand {
        FetchCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "fetcher".to_string()],
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_decode_context() {
        let ctx = decode_context(include_str!("../../fixtures/context_btc.json")).unwrap();
        assert_eq!(ctx.name, "Bitcoin");
        assert_eq!(ctx.symbol.as_deref(), Some("btc"));
        assert!(ctx.category_data(Category::DevVelocity).is_some());
    }

    #[test]
    fn test_decode_rejects_empty_and_garbage() {
        assert!(matches!(decode_context("  \n"), Err(ContextError::Empty)));
        assert!(matches!(
            decode_context("Fetching btc..."),
            Err(ContextError::Decode(_))
        ));
        assert!(matches!(
            decode_context(r#"{"symbol": "btc"}"#),
            Err(ContextError::Decode(_))
        ));
    }

    #[test]
    fn test_load_context_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"name": "Ether", "age_days": 3000}"#)
            .unwrap();

        let ctx = load_context_file(file.path()).unwrap();
        assert_eq!(ctx.name, "Ether");
        assert_eq!(ctx.age_days, Some(3000));
    }

    #[tokio::test]
    async fn test_fetch_passes_entity_and_ignores_stderr() {
        // $1 is the entity appended after the script's $0.
        let cmd = sh(r#"echo "looking up $1" >&2; printf '{"name": "%s"}' "$1""#);
        let ctx = fetch_context(&cmd, "eth").await.unwrap();
        assert_eq!(ctx.name, "eth");
    }

    #[tokio::test]
    async fn test_fetch_failures() {
        let err = fetch_context(&sh("echo boom >&2; exit 2"), "btc")
            .await
            .unwrap_err();
        match err {
            ContextError::Failed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }

        let err = fetch_context(&sh("true"), "btc").await.unwrap_err();
        assert!(matches!(err, ContextError::Empty));

        let err = fetch_context(&sh("echo not json"), "btc").await.unwrap_err();
        assert!(matches!(err, ContextError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_missing_program() {
        let cmd = FetchCommand {
            program: "bigscore-no-such-fetcher".to_string(),
            args: vec![],
            timeout: Duration::from_secs(1),
        };
        let err = fetch_context(&cmd, "btc").await.unwrap_err();
        assert!(matches!(err, ContextError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let mut cmd = sh("sleep 5");
        cmd.timeout = Duration::from_millis(50);
        let err = fetch_context(&cmd, "btc").await.unwrap_err();
        assert!(matches!(err, ContextError::TimedOut(_)));
    }
}
