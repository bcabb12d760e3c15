use anyhow::{Context, Result};
use rainmap::RunConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub run: RunConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub stations: PathBuf, // .json (API response) or .csv
    pub boundary: PathBuf,
    pub regions: PathBuf,
    pub region_id_field: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub grid_csv: PathBuf,
    pub stats_csv: PathBuf,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rainmap::StatisticKind;
    use std::io::Write;

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[input]
stations = "stations.json"
boundary = "border.geojson"
regions = "municipalities.shp"
region_id_field = "NM_MUN"

[run]
excluded_ids = ["A1", "B2"]
width = 500
height = 400
statistic = "mean"

[run.idw]
power = 2.5

[output]
grid_csv = "grid.csv"
stats_csv = "stats.csv"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.input.region_id_field, "NM_MUN");
        assert_eq!(config.run.excluded_ids.len(), 2);
        assert_eq!(config.run.width, 500);
        assert_eq!(config.run.statistic, StatisticKind::Mean);
        assert_eq!(config.run.idw.power, 2.5);
        assert!(config.run.bbox.is_none());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = AppConfig::load_from_file(Path::new("/nonexistent/rainmap.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
