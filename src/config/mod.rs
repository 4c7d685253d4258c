use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::mapping::MappingSpec;
use crate::source::SourceKind;
use crate::validate::FieldRules;

pub const DEFAULT_CONFIG_FILE: &str = "branch-config.toml";
pub const ENV_PREFIX: &str = "BRANCH_CONFIG";

const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// Config holds all application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default record source for `generate`
    pub source: SourceKind,
    pub template_path: PathBuf,
    pub output_dir: PathBuf,
    /// Where `<site_id>_site_info.json` files live
    pub data_dir: PathBuf,
    pub sheets: SheetsConfig,
    pub rules: FieldRules,
    pub mapping: MappingSpec,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            template_path: PathBuf::from("template.jinja2"),
            output_dir: PathBuf::from("."),
            data_dir: PathBuf::from("."),
            sheets: SheetsConfig::default(),
            rules: FieldRules::default(),
            mapping: MappingSpec::default(),
        }
    }
}

/// Inventory spreadsheet coordinates and credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    /// A1 notation, e.g. "Sites!A1:AZ500"
    pub range: String,
    pub credentials_path: PathBuf,
    /// Zero-based index of the header row; rows above it are skipped
    pub header_row: usize,
    pub timeout_secs: u64,
    pub api_base: String,
    pub scopes: Vec<String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            range: String::new(),
            credentials_path: PathBuf::from("GCP-API-key.json"),
            header_row: 2,
            timeout_secs: 5,
            api_base: "https://sheets.googleapis.com/v4".to_string(),
            scopes: vec![READONLY_SCOPE.to_string()],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file overlaid with environment variables.
    ///
    /// Without an explicit path, `branch-config.toml` in the working directory is
    /// used if present. Environment keys look like
    /// `BRANCH_CONFIG_SHEETS__SPREADSHEET_ID`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(anyhow!("Config file {} does not exist", p.display()));
                }
                builder = builder.add_source(config::File::from(p));
            }
            None => {
                builder = builder
                    .add_source(config::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let cfg: Config = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        cfg.check()?;
        Ok(cfg)
    }

    fn check(&self) -> Result<()> {
        if self.sheets.timeout_secs == 0 {
            return Err(anyhow!("sheets.timeout_secs must be greater than zero"));
        }
        for mapping in &self.mapping.fields {
            if mapping.source.is_empty() || mapping.placeholder.is_empty() {
                return Err(anyhow!("mapping entries need both source and placeholder"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Transform;
    use std::sync::{Mutex, MutexGuard};

    // The environment is process-wide; every test that calls `Config::load`
    // holds this lock and starts from a clean BRANCH_CONFIG_* slate.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clean_env() -> MutexGuard<'static, ()> {
        let guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let prefix = format!("{}_", ENV_PREFIX);
        for (key, _) in std::env::vars() {
            if key.starts_with(&prefix) {
                std::env::remove_var(key);
            }
        }
        guard
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.source, SourceKind::Local);
        assert_eq!(cfg.template_path, PathBuf::from("template.jinja2"));
        assert_eq!(cfg.sheets.header_row, 2);
        assert_eq!(cfg.sheets.timeout_secs, 5);
        assert_eq!(cfg.sheets.credentials_path, PathBuf::from("GCP-API-key.json"));
        assert!(cfg.mapping.passthrough);
    }

    #[test]
    fn test_load_toml() {
        let _env = clean_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("branch-config.toml");
        std::fs::write(
            &path,
            r#"
source = "sheets"
output_dir = "out"

[sheets]
spreadsheet_id = "sheet-123"
range = "Sites!A1:Z500"
timeout_secs = 10

[rules]
required = ["Site_ID", "WAN_IP", "LAN_Subnet"]
ip_fields = ["WAN_IP"]
ip_list_fields = ["LAN_Subnet"]

[mapping]
passthrough = false

[[mapping.fields]]
source = "LAN_Subnet"
placeholder = "lan_subnets"
transform = "lines"

[[mapping.fields]]
source = "WAN_IP"
placeholder = "wan_ip"
"#,
        )
        .unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.source, SourceKind::Sheets);
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.sheets.spreadsheet_id, "sheet-123");
        assert_eq!(cfg.sheets.timeout_secs, 10);
        assert_eq!(cfg.sheets.header_row, 2);
        assert_eq!(cfg.rules.required.len(), 3);
        assert!(cfg.rules.is_ip_field("WAN_IP"));
        assert!(cfg.rules.is_ip_list_field("LAN_Subnet"));
        assert!(!cfg.mapping.passthrough);
        assert_eq!(cfg.mapping.fields.len(), 2);
        assert_eq!(cfg.mapping.fields[0].transform, Transform::Lines);
        assert_eq!(cfg.mapping.fields[1].transform, Transform::None);
    }

    #[test]
    fn test_env_overrides_file() {
        let _env = clean_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("branch-config.toml");
        std::fs::write(
            &path,
            "[sheets]\nspreadsheet_id = \"from-file\"\nrange = \"Sites!A1:Z9\"\nheader_row = 2\n",
        )
        .unwrap();

        std::env::set_var("BRANCH_CONFIG_SHEETS__SPREADSHEET_ID", "from-env");
        std::env::set_var("BRANCH_CONFIG_SHEETS__HEADER_ROW", "0");
        let cfg = Config::load(Some(&path));
        std::env::remove_var("BRANCH_CONFIG_SHEETS__SPREADSHEET_ID");
        std::env::remove_var("BRANCH_CONFIG_SHEETS__HEADER_ROW");

        let cfg = cfg.unwrap();
        assert_eq!(cfg.sheets.spreadsheet_id, "from-env");
        assert_eq!(cfg.sheets.header_row, 0);
        assert_eq!(cfg.sheets.range, "Sites!A1:Z9");
    }

    #[test]
    fn test_dotenv_file_feeds_overlay() {
        let _env = clean_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("branch-config.toml");
        std::fs::write(&path, "template_path = \"from-file.jinja2\"\n").unwrap();
        let env_path = dir.path().join(".env");
        std::fs::write(
            &env_path,
            "BRANCH_CONFIG_TEMPLATE_PATH=from-dotenv.jinja2\nBRANCH_CONFIG_SHEETS__TIMEOUT_SECS=9\n",
        )
        .unwrap();

        dotenvy::from_path(&env_path).unwrap();
        let cfg = Config::load(Some(&path));
        std::env::remove_var("BRANCH_CONFIG_TEMPLATE_PATH");
        std::env::remove_var("BRANCH_CONFIG_SHEETS__TIMEOUT_SECS");

        let cfg = cfg.unwrap();
        assert_eq!(cfg.template_path, PathBuf::from("from-dotenv.jinja2"));
        assert_eq!(cfg.sheets.timeout_secs, 9);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let _env = clean_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        std::fs::write(&path, "[sheets]\ntimeout_secs = 0\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
