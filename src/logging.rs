use std::io::Write;

use env_logger::fmt::Color;

fn level_color(level: log::Level) -> Color {
    match level {
        log::Level::Error => Color::Red,
        log::Level::Warn => Color::Yellow,
        log::Level::Info => Color::Green,
        log::Level::Debug | log::Level::Trace => Color::Ansi256(244),
    }
}

/// Install the global logger, `info` unless `RUST_LOG` says otherwise.
///
/// Lines read `<timestamp> - <LEVEL> - <message> (<file>:<line>)`.
pub fn init_logging() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let mut level_style = buf.style();
            level_style.set_color(level_color(record.level())).set_bold(true);
            writeln!(
                buf,
                "{} - {} - {} ({}:{})",
                buf.timestamp(),
                level_style.value(record.level()),
                record.args(),
                record.file().unwrap_or("<unknown>"),
                record.line().unwrap_or(0)
            )
        })
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use env_logger::fmt::Color;
    use rstest::rstest;

    use super::level_color;

    #[rstest]
    #[case(log::Level::Error, Color::Red)]
    #[case(log::Level::Warn, Color::Yellow)]
    #[case(log::Level::Info, Color::Green)]
    #[case(log::Level::Debug, Color::Ansi256(244))]
    fn test_level_color(#[case] level: log::Level, #[case] expected: Color) {
        assert_eq!(expected, level_color(level));
    }
}
