use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Parses a JSON file into a given type `T`.
///
/// Errors are automatically converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let data = fs::read_to_string(file_path)?;
    let parsed_data: T = serde_json::from_str(&data)?;

    Ok(parsed_data)
}

/// Writes `value` as pretty-printed JSON, creating missing parent directories.
pub fn write_json_file<T: Serialize>(file_path: impl AsRef<Path>, value: &T) -> Result<()> {
    let file_path = file_path.as_ref();
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(value)?;
    fs::write(file_path, json)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::BTreeMap;

    #[test]
    fn test_write_then_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/params.json");

        let mut value = BTreeMap::new();
        value.insert("data".to_string(), 10u64);
        write_json_file(&path, &value).unwrap();

        let parsed: BTreeMap<String, u64> = parse_json_file(&path).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_error_file_not_found() {
        let result = parse_json_file::<BTreeMap<String, u64>>("non_existent_file.json");
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_error_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"data\": ").unwrap();

        let result = parse_json_file::<BTreeMap<String, u64>>(&path);
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }
}
