use crate::adapters::memory_store::InMemoryStore;
use crate::domain::model::{Float, Measurement, Profile};
use crate::utils::error::{FloatChatError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

pub const FLOATS_FILE: &str = "floats.csv";
pub const PROFILES_FILE: &str = "profiles.csv";
pub const MEASUREMENTS_FILE: &str = "measurements.csv";

/// 從 CSV 匯出目錄載入浮標、剖面與量測資料
///
/// `floats.csv` is required; missing profile or measurement exports load as
/// empty tables.
pub fn load_directory<P: AsRef<Path>>(dir: P) -> Result<InMemoryStore> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(FloatChatError::InvalidConfigValueError {
            field: "data.directory".to_string(),
            value: dir.display().to_string(),
            reason: "Directory does not exist".to_string(),
        });
    }

    let floats_path = dir.join(FLOATS_FILE);
    if !floats_path.exists() {
        return Err(FloatChatError::MissingConfigError {
            field: floats_path.display().to_string(),
        });
    }

    let floats: Vec<Float> = read_records(&floats_path)?;
    let profiles: Vec<Profile> = read_optional(&dir.join(PROFILES_FILE))?;
    let measurements: Vec<Measurement> = read_optional(&dir.join(MEASUREMENTS_FILE))?;

    tracing::info!(
        "📂 Loaded {} floats, {} profiles, {} measurements from {}",
        floats.len(),
        profiles.len(),
        measurements.len(),
        dir.display()
    );

    Ok(InMemoryStore::new(floats, profiles, measurements))
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        tracing::warn!("{} not found, continuing without it", path.display());
        return Ok(Vec::new());
    }
    read_records(path)
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<T>().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::error!("❌ {} row {}: {}", path.display(), line + 2, e);
                return Err(FloatChatError::CsvError(e));
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_is_config_error() {
        let err = load_directory("/definitely/not/here").unwrap_err();
        assert!(matches!(err, FloatChatError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_missing_floats_file() {
        let dir = TempDir::new().unwrap();
        let err = load_directory(dir.path()).unwrap_err();
        assert!(matches!(err, FloatChatError::MissingConfigError { .. }));
    }

    #[test]
    fn test_floats_only_directory_loads() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(FLOATS_FILE),
            "id,wmo_id,latitude,longitude,status\n1,5904818,10.5,-150.25,active\n",
        )
        .unwrap();

        let store = load_directory(dir.path()).unwrap();
        assert_eq!(store.float_count(), 1);
    }

    #[test]
    fn test_bad_status_is_csv_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(FLOATS_FILE),
            "id,wmo_id,latitude,longitude,status\n1,5904818,10.5,-150.25,sunk\n",
        )
        .unwrap();

        let err = load_directory(dir.path()).unwrap_err();
        assert!(matches!(err, FloatChatError::CsvError(_)));
    }
}
