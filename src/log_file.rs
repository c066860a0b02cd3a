use parking_lot::Mutex;
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tempfile::NamedTempFile;
use tracing_subscriber::fmt::MakeWriter;

/// A log file reserved in the temp directory at startup.
///
/// Nothing touches it until the first record is written. `finish` keeps it
/// if anything was written and removes it otherwise.
#[derive(Clone)]
pub struct LogFile {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    file: Mutex<Option<NamedTempFile>>,
    wrote: AtomicBool,
}

impl LogFile {
    pub fn reserve() -> io::Result<Self> {
        Self::reserve_in(std::env::temp_dir())
    }

    pub fn reserve_in(dir: impl AsRef<Path>) -> io::Result<Self> {
        let file = tempfile::Builder::new().prefix("jak").suffix(".log").tempfile_in(dir)?;
        Ok(Self {
            inner: Arc::new(Inner {
                path: file.path().to_path_buf(),
                file: Mutex::new(Some(file)),
                wrote: AtomicBool::new(false),
            }),
        })
    }

    pub fn path(&self) -> &Path { &self.inner.path }

    pub fn wrote(&self) -> bool { self.inner.wrote.load(Ordering::Relaxed) }

    /// Closes the file. Later writes are discarded. Returns the path when the
    /// file was kept.
    pub fn finish(&self) -> Option<PathBuf> {
        let file = self.inner.file.lock().take()?;
        if !self.wrote() {
            // Dropping the handle deletes the file.
            let _ = file.close();
            return None;
        }
        file.keep().ok().map(|(_, path)| path)
    }
}

pub struct LogWriter<'a> {
    inner: &'a Inner,
}

impl Write for LogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.file.lock();
        let Some(file) = guard.as_mut() else { return Ok(buf.len()) };
        let n = file.write(buf)?;
        if n > 0 {
            self.inner.wrote.store(true, Ordering::Relaxed);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.file.lock().as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter { inner: &self.inner }
    }
}

/// Installs the global subscriber writing into `log`. `RUST_LOG` wins over
/// the default level. Returns false if a subscriber was already installed.
pub fn init(log: &LogFile, verbose: bool) -> bool {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(log.clone())
        .try_init()
        .is_ok();
    if installed {
        install_panic_hook();
    }
    installed
}

fn install_panic_hook() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(target: "panic", %info, "panic");
        default_panic(info);
    }));
}

/// Window title naming the log location, with the path cut to 100 characters.
pub fn title(log: Option<&LogFile>) -> String {
    match log {
        Some(log) => {
            let path: String = log.path().display().to_string().chars().take(100).collect();
            format!("Log file is in: {path}")
        }
        None => "Log file unavailable".to_owned(),
    }
}
