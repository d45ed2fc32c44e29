use std::time::{Duration, Instant};

/// Run `operation`, logging its name before and its elapsed time after. Durations up to a minute are
/// logged in seconds, longer ones in minutes.
pub fn timed<T>(name: &str, operation: impl FnOnce() -> T) -> (T, Duration) {
    log::info!("Computing {}...", name);
    let start = Instant::now();
    let result = operation();
    let elapsed = start.elapsed();
    log::info!("{} took {}", name, format_elapsed(elapsed));
    (result, elapsed)
}

fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 60.0 {
        format!("{:.2} seconds", seconds)
    } else {
        format!("{:.2} minutes", seconds / 60.0)
    }
}
