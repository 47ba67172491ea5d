//! # Configuration du client SOAP
//!
//! La configuration est lue depuis un fichier YAML fusionné avec la
//! configuration par défaut intégrée, puis surchargée par les variables
//! d'environnement `PMOSOAP_CONFIG__<CLÉ>`.
//!
//! ```no_run
//! use pmosoap::ClientConfig;
//!
//! let config = ClientConfig::load("soap.yaml")?;
//! println!("timeout: {}s", config.timeout_secs);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::version::SoapVersion;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{env, fs, path::Path, time::Duration};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmosoap.yaml");

const ENV_PREFIX: &str = "PMOSOAP_CONFIG__";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_user_agent() -> String {
    format!("pmosoap/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

/// Paramètres du transport HTTP et version SOAP par défaut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Délai global d'une requête, en secondes
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// URL du proxy HTTP, ex: `http://proxy.local:3128`
    #[serde(default)]
    pub proxy: Option<String>,

    /// Annonce `Accept-Encoding: gzip` et décompresse les réponses
    #[serde(default = "default_true")]
    pub enable_decompression: bool,

    /// Force la version SOAP des appels ; sinon celle du contrat
    #[serde(default)]
    pub version: Option<SoapVersion>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            proxy: None,
            enable_decompression: true,
            version: None,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Charge la configuration depuis `path`.
    ///
    /// Un fichier absent n'est pas une erreur : la configuration intégrée
    /// est utilisée.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let external = match fs::read_to_string(path) {
            Ok(data) => {
                info!(config_file = %path.display(), "Loaded SOAP client config file");
                Some(data)
            }
            Err(_) => {
                info!(
                    config_file = %path.display(),
                    "Config file not found, using default embedded config"
                );
                None
            }
        };
        Self::build(external.as_deref(), env::vars())
            .with_context(|| format!("Invalid SOAP client configuration {}", path.display()))
    }

    /// Lit une configuration YAML fournie en mémoire, fusionnée avec les
    /// valeurs par défaut et les surcharges d'environnement.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::build(Some(yaml), env::vars())
    }

    fn build(external: Option<&str>, vars: impl Iterator<Item = (String, String)>) -> Result<Self> {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        if let Some(yaml) = external {
            let external: Value = serde_yaml::from_str(yaml)?;
            // un fichier vide se lit comme Null
            if !external.is_null() {
                merge_yaml(&mut value, &lower_keys(external));
            }
        }

        apply_env_overrides(&mut value, vars);

        let config: ClientConfig = serde_yaml::from_value(value)?;
        Ok(config)
    }
}

fn apply_env_overrides(config: &mut Value, vars: impl Iterator<Item = (String, String)>) {
    for (key, value) in vars {
        if let Some(path) = key.strip_prefix(ENV_PREFIX) {
            let path = path.split("__").collect::<Vec<_>>();
            let _ = set_value(config, &path, convert_env_value(&value));
        }
    }
}

fn set_value(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if let Value::Mapping(map) = data {
        let key = Value::String(path[0].to_lowercase());
        if path.len() == 1 {
            map.insert(key, value);
        } else {
            let entry = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
            set_value(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn convert_env_value(value: &str) -> Value {
    serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn lower_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| match k {
                    Value::String(s) => (Value::String(s.to_lowercase()), lower_keys(v)),
                    k => (k, lower_keys(v)),
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys).collect()),
        _ => value,
    }
}

fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        // scalaires et séquences : remplacement
        (d, e) => *d = e.clone(),
    }
}
