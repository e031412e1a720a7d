use super::{EncoderLauncher, FrameSink};
use crate::error::{EncoderPass, ExportError, ExportResult};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

/// Launches the ffmpeg executable found at `executable` (or on `PATH`).
pub struct FfmpegLauncher {
    executable: PathBuf,
}

impl FfmpegLauncher {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    fn spawn_error(&self, pass: EncoderPass, source: std::io::Error) -> ExportError {
        match pass {
            EncoderPass::Probe => ExportError::EncoderUnavailable {
                path: self.executable.clone(),
                source,
            },
            _ => ExportError::Spawn { pass, source },
        }
    }
}

impl Default for FfmpegLauncher {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

fn failed(pass: EncoderPass, status: ExitStatus, stderr: &[u8]) -> ExportError {
    ExportError::EncoderFailed {
        pass,
        status: status.to_string(),
        stderr: String::from_utf8_lossy(stderr).trim().to_string(),
    }
}

impl EncoderLauncher for FfmpegLauncher {
    fn executable(&self) -> &Path {
        &self.executable
    }

    fn run(&mut self, args: &[String], pass: EncoderPass) -> ExportResult<String> {
        log::debug!("{} {}", self.executable.display(), args.join(" "));
        let output = Command::new(&self.executable)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(pass, e))?;

        if !output.status.success() {
            return Err(failed(pass, output.status, &output.stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn spawn_piped(&mut self, args: &[String], pass: EncoderPass) -> ExportResult<Box<dyn FrameSink>> {
        log::debug!("{} {}", self.executable.display(), args.join(" "));
        let mut child = Command::new(&self.executable)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(pass, e))?;

        // Drained on its own thread so the encoder never stalls on a full stderr pipe
        // while we block writing frames.
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                if let Err(e) = pipe.read_to_end(&mut buf) {
                    log::debug!("Reading encoder stderr failed: {}", e);
                }
                buf
            })
        });

        Ok(Box::new(FfmpegProcess { child, pass, stderr }))
    }
}

/// Running ffmpeg process fed through its stdin.
pub struct FfmpegProcess {
    child: Child,
    pass: EncoderPass,
    stderr: Option<JoinHandle<Vec<u8>>>,
}

impl FfmpegProcess {
    /// Everything the encoder wrote to stderr. Only complete once the process has exited.
    fn collect_stderr(&mut self) -> Vec<u8> {
        self.stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }

    /// Close stdin, reap the process and turn its exit into a result.
    fn wait(&mut self) -> ExportResult<()> {
        drop(self.child.stdin.take());
        let status = self.child.wait()?;
        let stderr = self.collect_stderr();

        if !status.success() {
            return Err(failed(self.pass, status, &stderr));
        }
        if !stderr.is_empty() {
            log::debug!("Encoder {}: {}", self.pass, String::from_utf8_lossy(&stderr).trim());
        }
        Ok(())
    }
}

impl FrameSink for FfmpegProcess {
    fn write_frame(&mut self, frame: &[u8]) -> ExportResult<()> {
        let Some(stdin) = self.child.stdin.as_mut() else {
            return Err(ExportError::Spawn {
                pass: self.pass,
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "encoder stdin already closed"),
            });
        };
        if let Err(e) = stdin.write_all(frame) {
            // A broken pipe means the encoder died; its stderr says why.
            self.wait()?;
            return Err(e.into());
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> ExportResult<()> {
        self.wait()?;
        log::info!("Encoder {} complete", self.pass);
        Ok(())
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        // Still running means the export was aborted mid-stream.
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
        self.collect_stderr();
    }
}
