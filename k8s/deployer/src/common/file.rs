use crate::common::error::{
    ReadingFile, Result, WriteToStagedFile, YamlParseFromFile, YamlSerialize,
};
use serde::Serialize;
use serde_yaml::Mapping;
use snafu::ResultExt;
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

/// Reads a YAML mapping of Helm values from a file.
pub fn read_values_file<P>(filepath: P) -> Result<Mapping>
where
    P: AsRef<Path>,
{
    let filepath = filepath.as_ref();
    let buf = fs::read(filepath).context(ReadingFile {
        filepath: filepath.to_path_buf(),
    })?;
    serde_yaml::from_slice(buf.as_slice()).context(YamlParseFromFile {
        filepath: filepath.to_path_buf(),
    })
}

/// Serialize a value as YAML and write it to a new file at the given path.
pub(crate) fn write_yaml_to_file<T, P>(filepath: P, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let filepath = filepath.as_ref();
    let buf = serde_yaml::to_string(value).context(YamlSerialize {
        filepath: filepath.to_path_buf(),
    })?;

    let mut handle = File::create(filepath).context(WriteToStagedFile {
        filepath: filepath.to_path_buf(),
    })?;
    handle
        .write_all(buf.as_bytes())
        .and_then(|_| handle.sync_all())
        .context(WriteToStagedFile {
            filepath: filepath.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::{read_values_file, write_yaml_to_file};
    use serde_yaml::{Mapping, Value};
    use std::fs;

    #[test]
    fn test_write_yaml_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value0");

        let mut mapping = Mapping::new();
        mapping.insert(Value::from("replicas"), Value::from(3));
        mapping.insert(Value::from("name"), Value::from("concourse"));

        write_yaml_to_file(&path, &mapping).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "replicas: 3\nname: concourse\n");
    }

    #[test]
    fn test_write_multiline_string_as_literal_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value0");

        let mut mapping = Mapping::new();
        mapping.insert(
            Value::from("cert"),
            Value::from("-----BEGIN-----\nabc\n-----END-----\n"),
        );

        write_yaml_to_file(&path, &mapping).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("cert: |"));

        let parsed: Mapping = serde_yaml::from_str(contents.as_str()).unwrap();
        assert_eq!(parsed, mapping);
    }

    #[test]
    fn test_read_values_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.yaml");
        fs::write(&path, "web:\n  replicas: 2\nworker:\n  replicas: 4\n").unwrap();

        let values = read_values_file(&path).unwrap();
        let keys: Vec<&str> = values.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["web", "worker"]);

        fs::write(&path, "- not\n- a mapping\n").unwrap();
        assert!(read_values_file(&path).is_err());
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("value0");
        assert!(write_yaml_to_file(&path, &Mapping::new()).is_err());
    }
}
