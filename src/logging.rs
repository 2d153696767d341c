use crate::{config::LogSettings, traits::LogSink};
use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use file_rotate::{ContentLimit, FileRotate, compression::Compression, suffix::AppendCount};
use log::{error, info, warn};
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Installs the process logger: every record goes to stderr and to a
/// size-rotated file in `log_dir`. Returns the log file path.
pub fn init(settings: &LogSettings, log_dir: &Path) -> Result<PathBuf> {
    let path = log_dir.join(settings.file_name());
    let file = rotating_file(&path, *settings.max_bytes(), *settings.backup_count());

    Builder::new()
        .filter_level(*settings.level())
        .parse_default_env()
        .format(|buf, record| {
            let ts = buf.timestamp_seconds();
            writeln!(
                buf,
                "{} | {} | {} | {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(Tee {
            file,
            console: io::stderr(),
        })))
        .try_init()
        .context("logger was already initialised")?;

    Ok(path)
}

/// Log file that moves itself to `<name>.1` once it has grown past
/// `max_bytes`, shifting older backups up to `<name>.<backup_count>`.
/// Rotation is off when either limit is zero.
pub fn rotating_file(path: &Path, max_bytes: u64, backup_count: usize) -> FileRotate<AppendCount> {
    let limit = if max_bytes == 0 || backup_count == 0 {
        ContentLimit::None
    } else {
        ContentLimit::BytesSurpassed(usize::try_from(max_bytes).unwrap_or(usize::MAX))
    };
    FileRotate::new(
        path,
        AppendCount::new(backup_count.max(1)),
        limit,
        Compression::None,
        #[cfg(unix)]
        None,
    )
}

struct Tee<F, C> {
    file: F,
    console: C,
}

impl<F: Write, C: Write> Write for Tee<F, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        self.console.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.console.flush()
    }
}

/// `LogSink` backed by the `log` facade.
pub struct FacadeSink {
    target: &'static str,
}

impl FacadeSink {
    pub fn new(target: &'static str) -> Self {
        FacadeSink { target }
    }
}

impl LogSink for FacadeSink {
    fn info(&self, message: &str) {
        info!(target: self.target, "{message}");
    }

    fn warning(&self, message: &str) {
        warn!(target: self.target, "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: self.target, "{message}");
    }

    fn exception(&self, message: &str, err: &anyhow::Error) {
        error!(target: self.target, "{message}: {err:?}");
    }
}
