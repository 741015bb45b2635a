use std::path::{Path, PathBuf};
use std::{env, fs, io};

use derive_more::{Display, FromStr};
use serde::Deserialize;
use thiserror::Error;

const FILE_NAME: &str = "seqbuf.toml";

#[derive(Deserialize)]
pub struct Config {
    #[serde(default)]
    grow: Grow,
    #[serde(default)]
    churn: Churn,
}

#[derive(Deserialize, Default)]
pub struct Grow {
    count: Option<usize>,
    element: Option<Element>,
}

#[derive(Deserialize, Default)]
pub struct Churn {
    seed: Option<u64>,
    steps: Option<usize>,
    max_len: Option<usize>,
}

/// Element type pushed by `seqbuf grow`.
#[derive(Deserialize, Display, FromStr, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    #[display("u8")]
    U8,
    #[display("u32")]
    U32,
    #[display("u64")]
    U64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("parsing {}: {source}", .path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
}

fn set_env_option<T: ToString>(name: &str, value: Option<T>) {
    if let Some(value) = value {
        env::set_var(name, value.to_string());
    }
}

/// Export every configured value as the environment variable its
/// command line option falls back to.
pub fn load_into_env(config: &Config) {
    set_env_option("SEQBUF_GROW_COUNT", config.grow.count);
    set_env_option("SEQBUF_GROW_ELEMENT", config.grow.element);
    set_env_option("SEQBUF_CHURN_SEED", config.churn.seed);
    set_env_option("SEQBUF_CHURN_STEPS", config.churn.steps);
    set_env_option("SEQBUF_CHURN_MAX_LEN", config.churn.max_len);
}

fn load_file(path: &Path) -> Result<Option<Config>, ConfigError> {
    log::debug!("looking for config in {}", path.display());

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ConfigError::Read { path: path.to_owned(), source }),
    };

    let config = toml::from_str(&contents)
        .map_err(|source| ConfigError::Parse { path: path.to_owned(), source })?;

    log::info!("reading config from {}", path.display());
    Ok(Some(config))
}

/// Find `seqbuf.toml` in the working directory, then in the XDG config
/// directories. A missing file is not an error, a malformed one is.
pub fn read() -> Result<Option<Config>, ConfigError> {
    if let Some(config) = load_file(Path::new(FILE_NAME))? {
        return Ok(Some(config));
    }

    let dirs = match xdg::BaseDirectories::new() {
        Ok(dirs) => dirs,
        Err(e) => {
            log::warn!("can't locate xdg config dirs: {}", e);
            return Ok(None);
        }
    };

    match dirs.find_config_file(FILE_NAME) {
        Some(path) => load_file(&path),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections() {
        let config: Config = toml::from_str(
            r#"
            [grow]
            count = 64
            element = "u32"

            [churn]
            seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.grow.count, Some(64));
        assert!(matches!(config.grow.element, Some(Element::U32)));
        assert_eq!(config.churn.seed, Some(7));
        assert_eq!(config.churn.steps, None);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.grow.count.is_none());
        assert!(config.churn.max_len.is_none());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let path = env::temp_dir().join("seqbuf-config-test-missing.toml");
        assert!(matches!(load_file(&path), Ok(None)));
    }

    #[test]
    fn malformed_file_is_reported() {
        let path = env::temp_dir().join(format!("seqbuf-config-test-{}.toml", std::process::id()));
        fs::write(&path, "[grow]\ncount = \"many\"\n").unwrap();

        let result = load_file(&path);
        fs::remove_file(&path).unwrap();

        match result {
            Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a parse error, got {:?}", other.map(|c| c.is_some())),
        }
    }

    #[test]
    fn element_round_trips_through_text() {
        for element in [Element::U8, Element::U32, Element::U64] {
            let parsed: Element = element.to_string().parse().unwrap();
            assert_eq!(parsed.to_string(), element.to_string());
        }
    }
}
