use std::{
    io::Write,
    sync::OnceLock,
    time::{Duration, Instant},
};

use env_logger::Builder;
use log::LevelFilter;

#[derive(Debug, Clone)]
pub struct ConsoleLoggerConfig {
    pub level: LevelFilter,
    pub colors: bool,
    pub include_module: bool,
}

impl ConsoleLoggerConfig {
    pub fn from_env() -> Self {
        let level = std::env::var("LIFEPACE_LOG")
            .ok()
            .and_then(|v| v.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Info);
        let colors = std::env::var("LIFEPACE_LOG_COLORS")
            .ok()
            .map(|v| v != "0")
            .unwrap_or(true);
        let include_module = std::env::var("LIFEPACE_LOG_MODULE")
            .ok()
            .map(|v| v != "0")
            .unwrap_or(false);

        Self {
            level,
            colors,
            include_module,
        }
    }
}

impl Default for ConsoleLoggerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

static BOOT: OnceLock<Instant> = OnceLock::new();

/// Installs the process-wide console logger.
///
/// Format: `[+mm:ss.mmm] [LEVEL] [target] message`, the stamp being uptime
/// since this call.
pub fn init_console_logger(config: &ConsoleLoggerConfig) -> anyhow::Result<()> {
    BOOT.get_or_init(Instant::now);

    let mut builder = Builder::new();
    builder.filter_level(config.level);
    builder.write_style(if config.colors {
        env_logger::WriteStyle::Auto
    } else {
        env_logger::WriteStyle::Never
    });

    let config = config.clone();
    builder.format(move |buf, record| {
        let boot = *BOOT.get_or_init(Instant::now);
        let stamp = fmt_uptime(boot.elapsed());

        let level = record.level();
        let style = buf.default_level_style(level);
        let lvl = if config.colors {
            format!("{style}{level:<5}{style:#}")
        } else {
            format!("{level:<5}")
        };

        if config.include_module {
            writeln!(buf, "[{stamp}] [{lvl}] [{}] {}", record.target(), record.args())
        } else {
            writeln!(buf, "[{stamp}] [{lvl}] {}", record.args())
        }
    });

    builder
        .try_init()
        .map_err(|e| anyhow::anyhow!("logger init failed: {e}"))
}

/// mm:ss.mmm (or hh:mm:ss.mmm past the first hour)
fn fmt_uptime(d: Duration) -> String {
    let total_ms = d.as_millis() as u64;

    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;

    let s = total_s % 60;
    let total_m = total_s / 60;

    let m = total_m % 60;
    let h = total_m / 60;

    if h > 0 {
        format!("+{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
    } else {
        format!("+{:02}:{:02}.{:03}", m, s, ms)
    }
}
