use std::ffi::c_int;

use log::LevelFilter;

fn level_filter(level: c_int) -> LevelFilter {
    match level {
        i32::MIN..=0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Route this library's log output to stderr.
///
/// `level`: 0 off, 1 error, 2 warn, 3 info, 4 debug, 5 trace. Environment
/// variables are not consulted. Returns 1 if a logger was installed, 0 if one
/// was already present (this call or another logger in the process).
#[unsafe(no_mangle)]
pub extern "C" fn exiv2_log_init(level: c_int) -> c_int {
    let installed = env_logger::Builder::new()
        .filter_module(module_path!().split("::").next().unwrap_or("exiv_bridge"), level_filter(level))
        .format_timestamp(None)
        .try_init()
        .is_ok();
    if installed {
        log::debug!("Logging initialised at {}", level_filter(level));
    }
    c_int::from(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_clamp() {
        assert_eq!(level_filter(-3), LevelFilter::Off);
        assert_eq!(level_filter(2), LevelFilter::Warn);
        assert_eq!(level_filter(99), LevelFilter::Trace);
    }

    #[test]
    fn second_init_is_a_no_op() {
        let _ = exiv2_log_init(2);
        assert_eq!(exiv2_log_init(4), 0);
    }
}
