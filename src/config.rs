//! Application configuration.
//!
//! One immutable [`Config`] value, constructed at process start and
//! registered into the application container. Components resolve it like
//! any other service instead of reaching into process state themselves —
//! `Config::from_env` is the single place environment variables are read.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// The environment the application believes it is running in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Env {
    #[default]
    Development,
    Production,
    Test,
}

impl Env {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl FromStr for Env {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(()),
        }
    }
}

/// Immutable application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub env: Env,
    /// Directory the application treats as its working root.
    pub root: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Reads `SELENE_ENV`, `HOST`, and `PORT`, falling back to
    /// development defaults. Unrecognized values fall back rather than
    /// fail — a typo in `SELENE_ENV` should not take the service down.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            env: env::var("SELENE_ENV")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.env),
            root: env::current_dir().unwrap_or(defaults.root),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    /// `host:port`, as accepted by [`Server::bind`](crate::Server::bind).
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: Env::Development,
            root: PathBuf::from("."),
            host: "0.0.0.0".to_owned(),
            port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parsing_round_trips() {
        for env in [Env::Development, Env::Production, Env::Test] {
            assert_eq!(env.as_str().parse::<Env>().unwrap(), env);
        }
        assert!("staging".parse::<Env>().is_err());
    }

    #[test]
    fn addr_joins_host_and_port() {
        let config = Config { port: 8080, ..Config::default() };
        assert_eq!(config.addr(), "0.0.0.0:8080");
    }
}
