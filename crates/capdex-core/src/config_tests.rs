//! Tests for config module

#[cfg(test)]
mod tests {
    use crate::config::*;
    use serial_test::serial;

    // ========================================================================
    // CapdexConfig default tests
    // ========================================================================

    #[test]
    fn test_config_default_values() {
        // Arrange & Act
        let config = CapdexConfig::default();

        // Assert
        assert_eq!(config.index.fragment_len, 5);
        assert_eq!(config.index.prefix_len, 3);
        assert_eq!(config.index.prune_threshold, 5000);
        assert_eq!(config.resolve.max_parent_depth, 64);
        assert!(config.resolve.memoize);
        assert_eq!(config.source.version_section, "GJK_Browscap_Version");
        assert_eq!(config.source.version_key, "Version");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_config_default_validates() {
        assert!(CapdexConfig::default().validate().is_ok());
    }

    // ========================================================================
    // TOML parsing tests
    // ========================================================================

    #[test]
    fn test_config_from_toml_minimal() {
        // Arrange
        let toml = r#"
[index]
prune_threshold = 8000
"#;

        // Act
        let config = CapdexConfig::from_toml(toml).expect("parse");

        // Assert
        assert_eq!(config.index.prune_threshold, 8000);
        // Other values should be defaults
        assert_eq!(config.index.fragment_len, 5);
        assert!(config.resolve.memoize);
    }

    #[test]
    fn test_config_from_toml_full() {
        // Arrange
        let toml = r#"
[index]
fragment_len = 4
prefix_len = 2
prune_threshold = 100

[resolve]
max_parent_depth = 16
memoize = false

[source]
version_section = "Browscap_Version"
version_key = "Release"

[logging]
level = "debug"
format = "json"
"#;

        // Act
        let config = CapdexConfig::from_toml(toml).expect("parse");

        // Assert
        assert_eq!(config.index.fragment_len, 4);
        assert_eq!(config.index.prefix_len, 2);
        assert_eq!(config.index.prune_threshold, 100);
        assert_eq!(config.resolve.max_parent_depth, 16);
        assert!(!config.resolve.memoize);
        assert_eq!(config.source.version_section, "Browscap_Version");
        assert_eq!(config.source.version_key, "Release");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml_wrong_type() {
        let toml = r#"
[index]
fragment_len = "five"
"#;

        let result = CapdexConfig::from_toml(toml);

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    // ========================================================================
    // Validation tests
    // ========================================================================

    #[test]
    fn test_config_validate_fragment_len_too_small() {
        let mut config = CapdexConfig::default();
        config.index.fragment_len = 1;

        let err = config.validate().expect_err("should reject");

        assert!(err.to_string().contains("index.fragment_len"));
    }

    #[test]
    fn test_config_validate_prefix_len_zero() {
        let mut config = CapdexConfig::default();
        config.index.prefix_len = 0;

        let err = config.validate().expect_err("should reject");

        assert!(err.to_string().contains("index.prefix_len"));
    }

    #[test]
    fn test_config_validate_prune_threshold_zero() {
        let mut config = CapdexConfig::default();
        config.index.prune_threshold = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_parent_depth_out_of_range() {
        let mut config = CapdexConfig::default();
        config.resolve.max_parent_depth = 0;
        assert!(config.validate().is_err());

        config.resolve.max_parent_depth = 4096;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_invalid_log_level() {
        // Arrange
        let mut config = CapdexConfig::default();
        config.logging.level = "verbose".to_string();

        // Act
        let result = config.validate();

        // Assert
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "logging.level"
        ));
    }

    #[test]
    fn test_config_validate_invalid_log_format() {
        let mut config = CapdexConfig::default();
        config.logging.format = "xml".to_string();

        assert!(config.validate().is_err());
    }

    // ========================================================================
    // Serialization and sources
    // ========================================================================

    #[test]
    fn test_config_roundtrip() {
        // Arrange
        let mut config = CapdexConfig::default();
        config.index.prune_threshold = 1234;
        config.resolve.memoize = false;

        // Act
        let toml_str = config.to_toml().expect("serialize");
        let parsed = CapdexConfig::from_toml(&toml_str).expect("parse");

        // Assert
        assert!(toml_str.contains("[index]"));
        assert_eq!(parsed.index.prune_threshold, 1234);
        assert!(!parsed.resolve.memoize);
    }

    #[test]
    #[serial(env)]
    fn test_config_load_from_file() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("capdex.toml");
        std::fs::write(&path, "[resolve]\nmax_parent_depth = 10\n").expect("write");

        // Act
        let config = CapdexConfig::load_from_path(&path).expect("load");

        // Assert
        assert_eq!(config.resolve.max_parent_depth, 10);
    }

    #[test]
    #[serial(env)]
    fn test_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");

        let config = CapdexConfig::load_from_path(dir.path().join("absent.toml")).expect("load");

        assert_eq!(config.index.fragment_len, 5);
    }

    #[test]
    #[serial(env)]
    fn test_env_overrides_file() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("capdex.toml");
        std::fs::write(&path, "[index]\nprune_threshold = 10\n").expect("write");
        std::env::set_var("CAPDEX_INDEX__PRUNE_THRESHOLD", "20");

        // Act
        let config = CapdexConfig::load_from_path(&path);
        std::env::remove_var("CAPDEX_INDEX__PRUNE_THRESHOLD");

        // Assert
        assert_eq!(config.expect("load").index.prune_threshold, 20);
    }
}
