//! Process-wide tracing subscriber, installed once from `main`.
use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

pub const LEVEL_ENV: &str = "LOGLEVEL";
pub const FORMAT_ENV: &str = "LOGFORMAT";

#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    /// Any `EnvFilter` directive, e.g. `info` or `dojo_core=debug,warn`.
    pub level: String,
    pub json: bool,
    pub with_target: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            with_target: false,
        }
    }
}

impl LogSettings {
    /// CLI flags win over `LOGLEVEL`; `LOGFORMAT=json` switches the format.
    pub fn resolve(debug: bool, quiet: bool) -> Self {
        Self::from_parts(
            debug,
            quiet,
            std::env::var(LEVEL_ENV).ok(),
            std::env::var(FORMAT_ENV).ok(),
        )
    }

    fn from_parts(debug: bool, quiet: bool, level: Option<String>, format: Option<String>) -> Self {
        let level = if debug {
            "debug".to_string()
        } else if quiet {
            "warn".to_string()
        } else {
            level
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "info".to_string())
        };

        Self {
            level,
            json: format.is_some_and(|f| f.eq_ignore_ascii_case("json")),
            with_target: debug,
        }
    }
}

pub fn init(settings: &LogSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&settings.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(settings.with_target);

    let installed = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("failed to initialise logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_overrides_env_level() {
        let s = LogSettings::from_parts(true, false, Some("error".into()), None);
        assert_eq!(s.level, "debug");
        assert!(s.with_target);
    }

    #[test]
    fn quiet_flag_lowers_to_warn() {
        let s = LogSettings::from_parts(false, true, None, None);
        assert_eq!(s.level, "warn");
    }

    #[test]
    fn env_level_is_normalised() {
        let s = LogSettings::from_parts(false, false, Some("DEBUG".into()), Some("JSON".into()));
        assert_eq!(s.level, "debug");
        assert!(s.json);
    }

    #[test]
    fn defaults_to_info_text() {
        assert_eq!(LogSettings::from_parts(false, false, None, None), LogSettings::default());
    }
}
