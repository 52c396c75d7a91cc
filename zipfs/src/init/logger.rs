use super::config::CONFIG;
use log::LevelFilter;

fn level_of(log_level: usize) -> LevelFilter {
    match log_level {
        #[cfg(debug_assertions)]
        0 => LevelFilter::Trace,
        #[cfg(not(debug_assertions))]
        0 => LevelFilter::Debug,
        1 => LevelFilter::Debug,
        2 => LevelFilter::Info,
        3 => LevelFilter::Warn,
        4 => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

// setup logger and panic handler
//
// `debug` traces both this crate and the fuse session
pub fn init(debug: bool) {
    let level = match (debug, CONFIG.get()) {
        (true, _) => LevelFilter::Trace,
        (false, Some(config)) => level_of(config.log_level),
        (false, None) => LevelFilter::Info,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_module("zipfs", level);
    if debug {
        builder.filter_module("fuse3", LevelFilter::Trace);
    }
    builder.try_init().ok();
    // a panicked request must not leave a half working mount behind
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        log::error!(
            "Panic at {}",
            info.location().map(|x| x.to_string()).unwrap_or_default()
        );
        std::process::exit(1);
    }));
}
