use crossbeam_channel::{Receiver, Sender, unbounded};
use std::fs::{File, OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

mod log_message;
pub use log_message::{LogMessage, Severity};

/// Global logger instance
static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Log file configuration
const LOG_FILE_MAX_SIZE: u64 = 1024 * 1024; // 1MB
const LOG_FILE_MAX_COUNT: usize = 5;
const LOG_FILE_NAME: &str = "evaluator.log";

/// File-based log writer with rotation
#[derive(Debug)]
pub struct LogFileWriter {
    log_dir: PathBuf,
    current_file: Option<File>,
    current_size: u64,
}

impl LogFileWriter {
    /// Writer logging to the default directory, `<config dir>/evaluator/logs`.
    pub fn new() -> Result<Self, std::io::Error> {
        Self::with_dir(Self::default_log_directory())
    }

    pub fn with_dir(log_dir: PathBuf) -> Result<Self, std::io::Error> {
        create_dir_all(&log_dir)?;
        Ok(LogFileWriter {
            log_dir,
            current_file: None,
            current_size: 0,
        })
    }

    fn default_log_directory() -> PathBuf {
        let mut path = dirs::config_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        path.push("evaluator");
        path.push("logs");
        path
    }

    fn current_log_path(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    fn rotate_logs(&mut self) -> Result<(), std::io::Error> {
        let current_path = self.current_log_path();
        self.current_file = None;

        for i in (1..LOG_FILE_MAX_COUNT).rev() {
            let old_path = self.log_dir.join(format!("{}.{}", LOG_FILE_NAME, i));
            if !old_path.exists() {
                continue;
            }
            if i == LOG_FILE_MAX_COUNT - 1 {
                std::fs::remove_file(&old_path)?;
            } else {
                let new_path = self.log_dir.join(format!("{}.{}", LOG_FILE_NAME, i + 1));
                std::fs::rename(&old_path, &new_path)?;
            }
        }

        if current_path.exists() {
            let archived_path = self.log_dir.join(format!("{}.1", LOG_FILE_NAME));
            std::fs::rename(&current_path, &archived_path)?;
        }

        self.current_size = 0;
        Ok(())
    }

    fn ensure_file_open(&mut self) -> Result<(), std::io::Error> {
        if self.current_file.is_none() {
            let path = self.current_log_path();
            self.current_file = Some(OpenOptions::new().create(true).append(true).open(&path)?);
            if let Ok(metadata) = std::fs::metadata(&path) {
                self.current_size = metadata.len();
            }
        }
        Ok(())
    }

    pub fn write_log(&mut self, log_msg: &LogMessage) -> Result<(), std::io::Error> {
        self.ensure_file_open()?;

        let formatted_log = format!("{}\n", log_msg);
        let log_bytes = formatted_log.as_bytes();

        if self.current_size + log_bytes.len() as u64 > LOG_FILE_MAX_SIZE {
            self.rotate_logs()?;
            self.ensure_file_open()?;
        }

        if let Some(ref mut file) = self.current_file {
            file.write_all(log_bytes)?;
            file.flush()?;
            self.current_size += log_bytes.len() as u64;
        }

        Ok(())
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.current_log_path()
    }
}

/// Logger operating mode
#[derive(Debug, Clone)]
pub enum LoggerMode {
    /// Logs to the terminal only
    Standalone,
    /// Hands every message to the host through a channel
    Embedded(Sender<LogMessage>),
    /// Logs to the rotating log file only
    File,
    /// Logs to the terminal and to the log file
    Dual,
}

/// Logging for the control side: compilation, program hand-off and
/// configuration. Nothing on the render path logs.
pub struct Logger {
    mode: Mutex<LoggerMode>,
    level: Mutex<Severity>,
    file_writer: Mutex<Option<LogFileWriter>>,
}

fn open_default_log_file() -> Option<LogFileWriter> {
    match LogFileWriter::new() {
        Ok(writer) => Some(writer),
        Err(e) => {
            eprintln!("Failed to create log file writer: {}", e);
            None
        }
    }
}

fn write_to_terminal(log_msg: &LogMessage) {
    match log_msg.level {
        Severity::Fatal | Severity::Error => {
            eprintln!("{}", log_msg);
            let _ = std::io::stderr().flush();
        }
        _ => {
            println!("{}", log_msg);
            let _ = std::io::stdout().flush();
        }
    }
}

impl Logger {
    fn with_mode(mode: LoggerMode, file_writer: Option<LogFileWriter>) -> Self {
        Logger {
            mode: Mutex::new(mode),
            level: Mutex::new(Severity::Info),
            file_writer: Mutex::new(file_writer),
        }
    }

    /// Create a new logger in standalone mode
    pub fn new_standalone() -> Self {
        Self::with_mode(LoggerMode::Standalone, None)
    }

    /// Create a new logger in embedded mode with a channel sender
    pub fn new_embedded(sender: Sender<LogMessage>) -> Self {
        Self::with_mode(LoggerMode::Embedded(sender), None)
    }

    /// Create a new logger writing to the given log file writer
    pub fn with_file_writer(writer: LogFileWriter) -> Self {
        Self::with_mode(LoggerMode::File, Some(writer))
    }

    /// Switch to file mode, opening the default log file if needed
    pub fn set_file_mode(&self) {
        self.ensure_file_writer();
        if let Ok(mut mode) = self.mode.lock() {
            *mode = LoggerMode::File;
        }
    }

    /// Switch to dual mode (terminal + file)
    pub fn set_dual_mode(&self) {
        self.ensure_file_writer();
        if let Ok(mut mode) = self.mode.lock() {
            *mode = LoggerMode::Dual;
        }
    }

    fn ensure_file_writer(&self) {
        if let Ok(mut file_writer) = self.file_writer.lock() {
            if file_writer.is_none() {
                *file_writer = open_default_log_file();
            }
        }
    }

    /// Messages less severe than `level` are dropped.
    pub fn set_level(&self, level: Severity) {
        if let Ok(mut current) = self.level.lock() {
            *current = level;
        }
    }

    pub fn level(&self) -> Severity {
        self.level.lock().map(|level| *level).unwrap_or(Severity::Info)
    }

    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.file_writer
            .lock()
            .ok()
            .and_then(|writer| writer.as_ref().map(|w| w.log_file_path()))
    }

    /// Log a message with the specified severity
    pub fn log(&self, level: Severity, msg: String) {
        if level > self.level() {
            return;
        }
        let log_msg = LogMessage::new(level, msg);

        let write_to_file = |log_msg: &LogMessage| {
            if let Ok(mut file_writer) = self.file_writer.lock() {
                if let Some(writer) = file_writer.as_mut() {
                    if let Err(e) = writer.write_log(log_msg) {
                        eprintln!("Failed to write to log file: {}", e);
                    }
                }
            }
        };

        if let Ok(mode) = self.mode.lock() {
            match &*mode {
                LoggerMode::Standalone => write_to_terminal(&log_msg),
                LoggerMode::Embedded(sender) => {
                    if sender.try_send(log_msg.clone()).is_err() {
                        // Fallback to terminal if channel is full/closed
                        eprintln!("Logger channel error: {}", log_msg);
                    }
                }
                LoggerMode::File => write_to_file(&log_msg),
                LoggerMode::Dual => {
                    write_to_file(&log_msg);
                    write_to_terminal(&log_msg);
                }
            }
        }
    }

    pub fn debug(&self, msg: String) {
        self.log(Severity::Debug, msg);
    }

    pub fn info(&self, msg: String) {
        self.log(Severity::Info, msg);
    }

    pub fn warn(&self, msg: String) {
        self.log(Severity::Warn, msg);
    }

    pub fn error(&self, msg: String) {
        self.log(Severity::Error, msg);
    }

    pub fn fatal(&self, msg: String) {
        self.log(Severity::Fatal, msg);
    }
}

/// Initialize the global logger in standalone mode
pub fn init_standalone() {
    let _ = GLOBAL_LOGGER.set(Logger::new_standalone());
}

/// Create a logging channel pair
pub fn create_log_channel() -> (Sender<LogMessage>, Receiver<LogMessage>) {
    unbounded()
}

/// Get the global logger instance
pub fn get_logger() -> &'static Logger {
    GLOBAL_LOGGER.get_or_init(Logger::new_standalone)
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().debug(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().warn(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().error(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_fatal {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().fatal(format!($($arg)*))
    };
}

/// Drop-in replacement for println! that goes through the logging system
#[macro_export]
macro_rules! log_println {
    () => {
        $crate::logger::get_logger().info("".to_string())
    };
    ($($arg:tt)*) => {
        $crate::logger::get_logger().info(format!($($arg)*))
    };
}
