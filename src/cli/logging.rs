use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Initialize logging with the requested verbosity.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    SimpleLogger::new().with_level(level).init().unwrap();
}
