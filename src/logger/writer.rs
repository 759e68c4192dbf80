//! File writer for the logger

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing_subscriber::fmt::MakeWriter;

use crate::logger::config::FileConfig;
use crate::logger::error::LoggerError;

/// Append-or-truncate log file shared by every event.
///
/// A failed write is retried once against stderr so that events are not
/// lost silently when the disk is full or the file was removed.
#[derive(Clone)]
pub struct LogFileWriter {
    file: Arc<Mutex<File>>,
}

impl LogFileWriter {
    pub fn new(config: &FileConfig) -> Result<Self, LoggerError> {
        if let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self {
            file: Arc::new(Mutex::new(open_log_file(&config.path, config.append)?)),
        })
    }
}

fn open_log_file(path: &Path, append: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).write(true);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options.open(path)
}

/// Per-event handle returned by `MakeWriter`.
pub struct LogFileGuard<'a> {
    file: MutexGuard<'a, File>,
}

impl Write for LogFileGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.write(buf) {
            Ok(n) => Ok(n),
            Err(_) => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl<'a> MakeWriter<'a> for LogFileWriter {
    type Writer = LogFileGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        let file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        LogFileGuard { file }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::config::LogFormat;
    use tempfile::TempDir;

    fn file_config(dir: &TempDir, append: bool) -> FileConfig {
        FileConfig {
            enabled: true,
            path: dir.path().join("nested").join("octobullet.log"),
            append,
            format: LogFormat::Full,
        }
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, true);

        let writer = LogFileWriter::new(&config).unwrap();
        writer.make_writer().write_all(b"hello\n").unwrap();

        assert_eq!(std::fs::read_to_string(&config.path).unwrap(), "hello\n");
    }

    #[test]
    fn test_append_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, true);

        LogFileWriter::new(&config)
            .unwrap()
            .make_writer()
            .write_all(b"first\n")
            .unwrap();
        LogFileWriter::new(&config)
            .unwrap()
            .make_writer()
            .write_all(b"second\n")
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&config.path).unwrap(),
            "first\nsecond\n"
        );
    }

    #[test]
    fn test_truncate_when_not_appending() {
        let dir = TempDir::new().unwrap();
        let mut config = file_config(&dir, true);
        LogFileWriter::new(&config)
            .unwrap()
            .make_writer()
            .write_all(b"old\n")
            .unwrap();

        config.append = false;
        LogFileWriter::new(&config)
            .unwrap()
            .make_writer()
            .write_all(b"new\n")
            .unwrap();

        assert_eq!(std::fs::read_to_string(&config.path).unwrap(), "new\n");
    }
}
