use std::{collections::BTreeMap, env, fmt, fs, path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::monitoring::{Device, ProbeKind};

#[derive(Debug)]
pub enum Error {
    ReadFailed(()),
    WriteFailed(()),
    ParseFailed(()),
    ConfigPathUnavailable,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub server: Server,
    pub monitoring: Monitoring,
    /// Device display name -> probe address. Fixed for the process
    /// lifetime.
    pub devices: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Monitoring {
    /// Check period, applied uniformly to every device.
    pub interval_seconds: u64,
    /// Per-probe timeout; must be strictly less than the interval.
    pub timeout_seconds: u64,
    pub probe: ProbeKind,
    pub log_file: path::PathBuf,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/netwatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("netwatch/config.toml"))
}

impl Default for Config {
    fn default() -> Self {
        let devices = BTreeMap::from([
            ("Home Router".into(), "10.0.0.1".into()),
            ("Google DNS".into(), "8.8.8.8".into()),
            ("Cloudflare DNS".into(), "1.1.1.1".into()),
            ("OpenDNS".into(), "208.67.222.222".into()),
        ]);

        Self {
            server: Server { bind: "127.0.0.1".into(), port: 5000 },
            monitoring: Monitoring {
                interval_seconds: 30,
                timeout_seconds: 5,
                probe: ProbeKind::Ping,
                log_file: "network_log.csv".into(),
            },
            devices,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;
        write_title_1(f, "Monitoring")?;
        write_1(f, "Check Interval (s)", &self.monitoring.interval_seconds)?;
        write_1(f, "Probe Timeout (s)", &self.monitoring.timeout_seconds)?;
        write_1(f, "Status Log", &self.monitoring.log_file.display())?;
        write_title_1(f, "Devices")?;
        for (name, address) in &self.devices {
            write_1(f, name, address)?;
        }

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/netwatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string =
                fs::read_to_string(&config_path).map_err(|_err| Error::ReadFailed(()))?;
            toml::from_str(raw_string.as_str()).map_err(|_err| Error::ParseFailed(()))
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &std::path::Path) -> Result<(), Error> {
        let config_str: String =
            toml::to_string_pretty(self).map_err(|_err| Error::ParseFailed(()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_err| Error::WriteFailed(()))?;
        }

        std::fs::write(path, config_str).map_err(|_err| Error::WriteFailed(()))
    }

    /// The configured devices as monitor inputs, in name order.
    pub fn monitored_devices(&self) -> Vec<Device> {
        let interval = Duration::from_secs(self.monitoring.interval_seconds);

        self.devices
            .iter()
            .map(|(name, address)| Device {
                name: name.clone(),
                address: address.clone(),
                interval,
            })
            .collect()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.monitoring.timeout_seconds)
    }
}
