//! Configuration Management
use config::File;
use config::Source;
use config::Value;
use once_cell::sync::Lazy;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::MutexGuard;
use tracing::level_filters::LevelFilter;

/// Get global configuration
pub fn config() -> Config {
    get_config().clone()
}

// helper to deal with poisoned Mutex
fn get_config() -> MutexGuard<'static, Config> {
    CONFIG.lock().unwrap_or_else(|poison| {
        warn!("config poisoned, restoring initial config");
        let mut c = poison.into_inner();
        *c = init_config();
        CONFIG.clear_poison();
        c
    })
}

fn init_config() -> Config {
    let mut settings = ::config::Config::builder();

    // user config
    if let Some(mut path) = dirs::config_dir() {
        path.push("hoplink");
        path.push("config.toml");

        settings = settings.add_source(File::from(path).required(false));
    }

    // project config
    settings =
        settings.add_source(File::new("config.toml", config::FileFormat::Toml).required(false));

    // env config
    settings = settings.add_source(config::Environment::with_prefix("hoplink"));

    // start from default config
    let mut c = Config::default();

    match settings.build() {
        Ok(settings) => match settings.collect() {
            Ok(config) => {
                for (k, v) in config.into_iter() {
                    c.set_value(k, v);
                }
            }
            Err(e) => warn!("error parsing config {e:?}"),
        },
        Err(e) => warn!("error reading config {e:?}"),
    }
    c
}

static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(init_config()));

/// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Default output capacity in items for host buffers
    pub buffer_size: usize,
    /// Log level
    pub log_level: LevelFilter,
}

impl Config {
    fn set_value<V: Into<config::Value>>(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        let value = value.into();

        match name.as_str() {
            "buffer_size" => {
                if let Some(v) = config_parse::<usize>(&name, &value) {
                    self.buffer_size = v;
                }
            }
            "log_level" => {
                if let Some(v) = config_parse::<LevelFilter>(&name, &value) {
                    self.log_level = v;
                }
            }
            _ => debug!("ignoring unknown config key {name}"),
        }
    }
}

impl Default for Config {
    #[cfg(debug_assertions)]
    fn default() -> Self {
        Config {
            buffer_size: 32768,
            log_level: LevelFilter::DEBUG,
        }
    }

    #[cfg(not(debug_assertions))]
    fn default() -> Self {
        Config {
            buffer_size: 32768,
            log_level: LevelFilter::INFO,
        }
    }
}

fn config_parse<T: FromStr>(name: &str, v: &Value) -> Option<T> {
    let parsed = v
        .clone()
        .into_string()
        .ok()
        .and_then(|s| s.parse::<T>().ok());
    if parsed.is_none() {
        warn!("invalid config value for {name}: {v:?}, keeping previous");
    }
    parsed
}
