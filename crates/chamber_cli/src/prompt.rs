//! Interactive operator prompt.
//!
//! Reads one command per line while the run is in progress. `start`,
//! `pause`, `exit` and `kill` drive the run; anything else is handed to
//! every stage's control hook.

use chamber_plan::split_words;
use chamber_runtime::RunHandle;
use std::io::{self, BufRead, Write};

/// One parsed prompt line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Directive {
    Start,
    Pause,
    Exit,
    Kill,
    Forward(Vec<String>),
}

impl Directive {
    /// Classify a split line; `None` for a blank one
    pub(crate) fn from_words(words: Vec<String>) -> Option<Self> {
        let directive = match words.first()?.as_str() {
            "start" => Self::Start,
            "pause" => Self::Pause,
            "exit" => Self::Exit,
            "kill" => Self::Kill,
            _ => Self::Forward(words),
        };
        Some(directive)
    }
}

/// Run the prompt on stdin until `exit`, `kill`, a kill from elsewhere, or
/// end of input
pub(crate) fn run(handle: &RunHandle) -> io::Result<()> {
    let stdin = io::stdin();
    run_with(handle, stdin.lock(), &mut io::stdout())
}

fn run_with(handle: &RunHandle, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
    let mut lines = input.lines();
    let mut line_no = 0;
    loop {
        write!(out, ">>> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            tracing::debug!("prompt input closed");
            return Ok(());
        };
        let line = line?;
        if handle.is_killed() {
            return Ok(());
        }

        line_no += 1;
        let words = match split_words(&line, line_no) {
            Ok(words) => words,
            Err(err) => {
                eprintln!("{}", err);
                continue;
            }
        };
        let Some(directive) = Directive::from_words(words) else {
            continue;
        };

        match directive {
            Directive::Start => {
                if handle.resume() {
                    writeln!(out, "Restarting processes...")?;
                } else {
                    writeln!(out, "Status is already set to running")?;
                }
            }
            Directive::Pause => {
                if handle.pause() {
                    writeln!(out, "Pausing processes...")?;
                } else {
                    writeln!(out, "Status is already set to pausing")?;
                }
            }
            Directive::Exit => {
                if !handle.is_working() {
                    return Ok(());
                }
                tracing::warn!("exit refused while workers are running");
                writeln!(out, "Some processes are working")?;
            }
            Directive::Kill => {
                writeln!(out, "Killing processes...")?;
                handle.kill();
                return Ok(());
            }
            Directive::Forward(words) => handle.control(&words),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chamber_command::CommandRegistry;
    use chamber_runtime::{GraphBuilder, RunConfig, RunController, RunOutcome};

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn start(script: &str) -> RunHandle {
        let registry = CommandRegistry::with_builtins();
        let graph = GraphBuilder::from_script(&registry, RunConfig::default(), script).unwrap();
        RunController::new(graph).start().unwrap()
    }

    fn drive(handle: &RunHandle, input: &str) -> String {
        let mut out = Vec::new();
        run_with(handle, input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_directive_from_words() {
        assert_eq!(Directive::from_words(words(&["start"])), Some(Directive::Start));
        assert_eq!(Directive::from_words(words(&["kill", "now"])), Some(Directive::Kill));
        assert_eq!(
            Directive::from_words(words(&["watch", "a"])),
            Some(Directive::Forward(words(&["watch", "a"])))
        );
        assert_eq!(Directive::from_words(Vec::new()), None);
    }

    #[test]
    fn test_pause_start_then_kill() {
        let handle = start("Seq > x\nWatch < x");
        let out = drive(&handle, "pause\npause\n\nstart\nstart\nwatch\nkill\n");

        assert!(out.contains("Pausing processes..."));
        assert!(out.contains("Status is already set to pausing"));
        assert!(out.contains("Restarting processes..."));
        assert!(out.contains("Status is already set to running"));
        assert!(out.contains("Killing processes..."));
        assert_eq!(handle.wait().outcome, RunOutcome::Killed);
    }

    #[test]
    fn test_exit_refused_while_working() {
        let handle = start("Seq > x\nWatch < x");
        let out = drive(&handle, "exit\nkill\n");

        assert!(out.contains("Some processes are working"));
        assert_eq!(handle.wait().outcome, RunOutcome::Killed);
    }

    #[test]
    fn test_end_of_input_leaves_run_alone() {
        let handle = start("Seq > x : stop=3\nWatch < x");
        let out = drive(&handle, "");

        assert_eq!(out, ">>> \n");
        assert_eq!(handle.wait().outcome, RunOutcome::Completed);
    }

    #[test]
    fn test_bad_quote_is_reported_and_skipped() {
        let handle = start("Seq > x\nWatch < x");
        let out = drive(&handle, "watch \"open\nkill\n");

        assert!(out.contains("Killing processes..."));
        assert_eq!(handle.wait().outcome, RunOutcome::Killed);
    }
}
