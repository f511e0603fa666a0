use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use tracing::Level;

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();

/// Route all subsequent log output to `path`, appending. Only the first call
/// takes effect; later calls return `Ok(false)`.
pub fn log_to_file(path: impl AsRef<Path>) -> io::Result<bool> {
    if LOG_FILE.get().is_some() {
        return Ok(false);
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(LOG_FILE.set(Mutex::new(file)).is_ok())
}

pub struct DelegatingWriter {
    inner: DelegatingInner,
}

enum DelegatingInner {
    File(&'static Mutex<File>),
    Stderr(io::Stderr),
}

impl DelegatingWriter {
    fn new() -> Self {
        if let Some(file) = LOG_FILE.get() {
            DelegatingWriter {
                inner: DelegatingInner::File(file),
            }
        } else {
            DelegatingWriter {
                inner: DelegatingInner::Stderr(io::stderr()),
            }
        }
    }
}

impl Write for DelegatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            DelegatingInner::File(f) => match f.lock() {
                Ok(mut file) => file.write(buf),
                Err(poisoned) => poisoned.into_inner().write(buf),
            },
            DelegatingInner::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            DelegatingInner::File(f) => match f.lock() {
                Ok(mut file) => file.flush(),
                Err(poisoned) => poisoned.into_inner().flush(),
            },
            DelegatingInner::Stderr(s) => s.flush(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubscriberMakeWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SubscriberMakeWriter {
    type Writer = DelegatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DelegatingWriter::new()
    }
}

/// Initialize the global subscriber at `level`, writing to the log file when
/// one was opened with [`log_to_file`] and to stderr otherwise. Safe to call
/// more than once; only the first call installs a subscriber.
pub fn init_default(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(SubscriberMakeWriter)
        .with_target(false)
        .with_thread_names(false)
        .try_init();
}
