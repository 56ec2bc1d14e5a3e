use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use linedupe::cli::OutputFormat;
use linedupe::config::{Config, ConfigError};
use linedupe::duplicates::ReportOrder;
use linedupe::scanner::{DigestWidth, HashAlgorithm};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config.threshold, 1);
    assert_eq!(config.long_line_threshold, 32);
    assert_eq!(config.channel_capacity, 0);
    assert!(config.max_line_length.is_none());
}

#[test]
fn test_config_load_from_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
threshold = 3
long_line_threshold = 128
hash_algorithm = "blake3"
digest_width = 128
channel_capacity = 256
max_line_length = 65536
output = "json"
sort = "none"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.threshold, 3);
    assert_eq!(config.long_line_threshold, 128);
    assert_eq!(config.hash_algorithm, HashAlgorithm::Blake3);
    assert_eq!(config.digest_width, DigestWidth::Bits128);
    assert_eq!(config.channel_capacity, 256);
    assert_eq!(config.max_line_length, Some(65536));
    assert_eq!(config.output, OutputFormat::Json);
    assert_eq!(config.sort, ReportOrder::None);

    let key_config = config.key_config();
    assert_eq!(key_config.long_line_threshold, 128);
    assert_eq!(key_config.algorithm, HashAlgorithm::Blake3);
}

#[test]
fn test_config_partial_file_keeps_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "output = \"csv\"\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.output, OutputFormat::Csv);
    assert_eq!(config.threshold, 1);
    assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
}

#[test]
fn test_config_invalid_values_are_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    fs::write(&path, "hash_algorithm = \"md5\"\n").unwrap();
    assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Invalid(_))));

    fs::write(&path, "threshold = \"many\"\n").unwrap();
    assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_config_invalid_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "threshold = = 2").unwrap();

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract();
    assert!(result.is_err());
}

#[test]
fn test_config_save_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let config = Config {
        threshold: 9,
        max_line_length: Some(1024),
        output: OutputFormat::Json,
        ..Default::default()
    };

    config.save(Some(&path)).unwrap();
    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains("threshold = 9"));
    assert!(saved.contains("max_line_length = 1024"));
    assert!(saved.contains("output = \"json\""));

    assert_eq!(Config::load(Some(&path)).unwrap(), config);
}
