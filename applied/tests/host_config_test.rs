use std::io::Write;

use applied::demos;
use applied::host::{HostConfig, HostError};
use tempfile::NamedTempFile;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "worker_count": 2, "log_level": "warn", "demos": ["date-utils"] }}"#
        )
        .unwrap();

        let config = HostConfig::load(file.path()).unwrap();
        assert_eq!(config.worker_count, Some(2));
        assert_eq!(config.demos, vec!["date-utils".to_string()]);
        assert!(!config.json_logs);

        let executor = config.executor_config().unwrap();
        assert_eq!(executor.worker_count, 2);
        assert_eq!(config.log_config().unwrap().level, tracing::Level::WARN);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        match HostConfig::load(&path) {
            Err(HostError::Io { path: reported, error }) => {
                assert_eq!(reported, path);
                assert_eq!(error.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ \"worker_count\": \"many\" }").unwrap();

        assert!(matches!(HostConfig::load(file.path()), Err(HostError::Parse(_))));
    }

    // The configured demos run against the configured pool size
    #[test]
    fn test_configured_demos_run() {
        let config = HostConfig::from_json(r#"{ "worker_count": 1, "demos": ["applied-queue", "applied-list"] }"#)
            .unwrap();
        let registry = demos::bundled(&config.executor_config().unwrap());

        for name in &config.demos {
            assert!(registry.contains(name));
            registry.run_demo(name).unwrap();
        }
    }
}
