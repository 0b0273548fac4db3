use super::{Engine, Event, EventStreams};
use anyhow::{bail, Context};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

#[derive(Serialize)]
struct RunRequest<'a> {
    statements: &'a [String],
    events: &'a EventStreams,
}

#[derive(Deserialize)]
struct RunResponse {
    #[serde(default)]
    output: Vec<Event>,
}

/// Engine backed by an external runner process.
///
/// The runner receives `{"statements": [...], "events": {...}}` on stdin and
/// answers with `{"output": [...]}` on stdout.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Engine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&self, statements: &[String], inputs: &EventStreams) -> anyhow::Result<Vec<Event>> {
        let request = serde_json::to_vec(&RunRequest {
            statements,
            events: inputs,
        })
        .context("Failed to encode engine request")?;

        debug!(
            "Running `{}` with {} statements over {} input streams",
            self.command_line(),
            statements.len(),
            inputs.len()
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start `{}`", self.command_line()))?;

        // Write the request while stdout and stderr are being drained.
        let stdin = child.stdin.take();
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(|| match stdin {
                Some(mut stdin) => stdin.write_all(&request),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output =
            output.with_context(|| format!("Failed to wait for `{}`", self.command_line()))?;

        if !output.status.success() {
            bail!(
                "`{}` exited with {}: {}",
                self.command_line(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        match written {
            Ok(Ok(())) => {}
            // The runner is done with its input; its exit status decides.
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("`{}` closed stdin before reading the whole request", self.command_line());
            }
            Ok(Err(e)) => {
                return Err(e).with_context(|| {
                    format!("Failed to write request to `{}`", self.command_line())
                });
            }
            Err(_) => bail!("Request writer for `{}` panicked", self.command_line()),
        }

        let response: RunResponse = serde_json::from_slice(&output.stdout)
            .with_context(|| format!("Invalid response from `{}`", self.command_line()))?;
        debug!("`{}` produced {} events", self.command_line(), response.output.len());
        Ok(response.output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::engines::Value;

    #[test]
    fn test_reads_output_events() {
        let engine = CommandEngine::new("sh").with_args([
            "-c",
            r#"cat > /dev/null; echo '{"output": [{"camera": "c1", "ts": 1}]}'"#,
        ]);
        let out = engine.run(&["SELECT 1".to_string()], &EventStreams::new()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("camera"), Some(&Value::Text("c1".to_string())));
        assert_eq!(out[0].get("ts"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_missing_output_is_empty() {
        let engine = CommandEngine::new("sh").with_args(["-c", "cat > /dev/null; echo '{}'"]);
        let out = engine.run(&[], &EventStreams::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_request_reaches_stdin() {
        // Report the request size back as the single output event.
        let engine = CommandEngine::new("sh").with_args([
            "-c",
            r#"printf '{"output": [{"request": %s}]}' "$(cat | wc -c | tr -d ' ')""#,
        ]);
        let statements = vec!["SELECT a\nFROM S;".to_string()];
        let out = engine.run(&statements, &EventStreams::new()).unwrap();

        let expected = serde_json::to_vec(&RunRequest {
            statements: &statements,
            events: &EventStreams::new(),
        })
        .unwrap()
        .len() as i64;
        assert_eq!(out[0].get("request"), Some(&Value::Integer(expected)));
    }

    #[test]
    fn test_failure_carries_stderr() {
        let engine = CommandEngine::new("sh").with_args(["-c", "cat > /dev/null; echo boom >&2; exit 3"]);
        let err = engine.run(&[], &EventStreams::new()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("boom"));
        assert!(message.contains("sh -c"));
    }

    fn bulk_events(count: i64) -> EventStreams {
        let events = (0..count)
            .map(|i| crate::engines::event([("camera", Value::from("R1")), ("ts", Value::from(i))]))
            .collect();
        EventStreams::from([("DetectMov".to_string(), events)])
    }

    fn run_with_deadline(
        engine: CommandEngine,
        inputs: EventStreams,
    ) -> anyhow::Result<Vec<Event>> {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(engine.run(&["SELECT *\nFROM DetectMov;".to_string()], &inputs));
        });
        rx.recv_timeout(std::time::Duration::from_secs(30))
            .expect("runner did not finish within 30 seconds")
    }

    #[test]
    fn test_noisy_runner_with_large_request_completes() {
        let engine = CommandEngine::new("sh").with_args([
            "-c",
            r#"head -c 200000 /dev/zero | tr '\0' x >&2; cat > /dev/null; echo '{"output": []}'"#,
        ]);
        let out = run_with_deadline(engine, bulk_events(5000)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_runner_exiting_early_reports_status_and_stderr() {
        let engine = CommandEngine::new("sh")
            .with_args(["-c", "echo 'bad statement at line 1' >&2; exit 2"]);
        let err = run_with_deadline(engine, bulk_events(5000)).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("bad statement at line 1"), "{message}");
        assert!(message.contains("exited with"), "{message}");
        assert!(!message.contains("Broken pipe"), "{message}");
    }
}
