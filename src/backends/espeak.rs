use super::SpeechBackend;

use std::io::{Error, ErrorKind, Read, Result};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

pub struct EspeakBackend {
    timeout: Duration,
}

impl EspeakBackend {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// `--` ends option parsing, so text starting with `-` is spoken.
    fn command(&self, text: &str, voice: Option<&str>) -> Command {
        let mut cmd = Command::new("espeak-ng");
        if let Some(v) = voice {
            cmd.arg("-v").arg(v);
        }
        cmd.arg("--stdout").arg("--").arg(text);
        cmd
    }
}

impl SpeechBackend for EspeakBackend {
    fn id(&self) -> &'static str {
        "espeak-ng"
    }

    fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Vec<u8>> {
        let mut child = self
            .command(text, voice)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain stdout while waiting, the WAV is larger than the pipe buffer.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::new(ErrorKind::Other, "espeak stdout unavailable"))?;
        let drain = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        match child.wait_timeout(self.timeout)? {
            Some(status) => {
                let audio = drain
                    .join()
                    .map_err(|_| Error::new(ErrorKind::Other, "espeak reader panicked"))??;
                if status.success() {
                    Ok(audio)
                } else {
                    let mut err_msg = String::new();
                    if let Some(mut stderr) = child.stderr.take() {
                        let _ = stderr.read_to_string(&mut err_msg);
                    }
                    Err(Error::new(
                        ErrorKind::Other,
                        format!("espeak error: {}", err_msg.trim()),
                    ))
                }
            }
            None => {
                // Timeout occurred, kill the process
                let _ = child.kill();
                let _ = child.wait();
                let _ = drain.join();
                Err(Error::new(
                    ErrorKind::TimedOut,
                    format!("Backend timed out after {}s", self.timeout.as_secs()),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn args(cmd: &Command) -> Vec<&OsStr> {
        cmd.get_args().collect()
    }

    #[test]
    fn test_text_is_never_an_option() {
        let backend = EspeakBackend::new(10);
        let cmd = backend.command("-w/x", Some("de"));
        assert_eq!(cmd.get_program(), "espeak-ng");
        assert_eq!(args(&cmd), ["-v", "de", "--stdout", "--", "-w/x"]);
    }

    #[test]
    fn test_command_without_voice() {
        let backend = EspeakBackend::new(10);
        let cmd = backend.command("Hallo", None);
        assert_eq!(args(&cmd), ["--stdout", "--", "Hallo"]);
    }
}
