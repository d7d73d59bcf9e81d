use log::{Level, Metadata, SetLoggerError};

struct SimpleLogger {
  level: Level,
}

impl log::Log for SimpleLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= self.level
  }
  fn log(&self, rec: &log::Record) {
    if !self.enabled(rec.metadata()) {
      return;
    }
    let log_str = format!(
      "[{}] {}:{} {}",
      rec.level(),
      rec.file().unwrap_or("unknown file"),
      rec.line().unwrap_or(0),
      rec.args()
    );
    println!("{}", log_str)
  }
  fn flush(&self) {}
}

pub fn init(level: Level) -> Result<(), SetLoggerError> {
  let logger = SimpleLogger { level };
  log::set_boxed_logger(Box::new(logger)).map(|()| log::set_max_level(level.to_level_filter()))
}
