use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};

const DEV_NULL: &str = "/dev/null";

/// The command and message streams of a simulation process.
///
/// Built in two steps so a failed redirect can still be reported on the
/// message stream: [`capture`](StdioStreams::capture) duplicates the original
/// stdin and stdout, then [`redirect_to_log`](StdioStreams::redirect_to_log)
/// points fd 0 at `/dev/null` and fd 1 at the simulation log.
#[derive(Debug)]
pub struct StdioStreams {
    commands: File,
    messages: File,
    log_path: Option<PathBuf>,
}

impl StdioStreams {
    /// Duplicate the process's current stdin and stdout for protocol use.
    pub fn capture() -> Result<Self> {
        let commands = duplicate(io::stdin().as_fd(), "stdin")?;
        let messages = duplicate(io::stdout().as_fd(), "stdout")?;
        Ok(Self {
            commands: File::from(commands),
            messages: File::from(messages),
            log_path: None,
        })
    }

    /// Point fd 0 at `/dev/null` and fd 1 at `log_path` (created or
    /// truncated), so whatever the simulation prints lands in its log.
    ///
    /// The log is opened before any descriptor is touched, so an unusable
    /// path leaves fd 0 and fd 1 as they were. The captured streams are never
    /// affected.
    pub fn redirect_to_log(&mut self, log_path: impl AsRef<Path>) -> Result<()> {
        let log_path = log_path.as_ref();

        let log = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(log_path)
            .map_err(|source| TransportError::Redirect {
                stream: "stdout",
                path: log_path.to_path_buf(),
                source,
            })?;
        let null = File::open(DEV_NULL).map_err(|source| TransportError::Redirect {
            stream: "stdin",
            path: PathBuf::from(DEV_NULL),
            source,
        })?;
        redirect(&null, libc::STDIN_FILENO, "stdin", Path::new(DEV_NULL))?;

        // Anything already buffered belongs to the original stdout.
        if let Err(err) = io::stdout().flush() {
            warn!(error = %err, "could not flush stdout before redirecting it");
        }
        redirect(&log, libc::STDOUT_FILENO, "stdout", log_path)?;

        info!(log = %log_path.display(), "standard streams rebound");
        self.log_path = Some(log_path.to_path_buf());
        Ok(())
    }

    /// Path of the simulation log once fd 1 has been redirected.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Split into `(commands, messages)`.
    pub fn into_parts(self) -> (File, File) {
        (self.commands, self.messages)
    }
}

fn duplicate(fd: BorrowedFd<'_>, stream: &'static str) -> Result<OwnedFd> {
    let owned = fd
        .try_clone_to_owned()
        .map_err(|source| TransportError::Duplicate { stream, source })?;
    debug!(stream, fd = owned.as_raw_fd(), "duplicated standard stream");
    Ok(owned)
}

/// Point `target` at the file behind `file`.
fn redirect(file: &File, target: RawFd, stream: &'static str, path: &Path) -> Result<()> {
    // SAFETY: `file` keeps its descriptor open for the duration of the call and
    // `target` is a standard descriptor number; dup2 atomically replaces it.
    let rc = unsafe { libc::dup2(file.as_raw_fd(), target) };
    if rc == -1 {
        return Err(TransportError::Redirect {
            stream,
            path: path.to_path_buf(),
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}
