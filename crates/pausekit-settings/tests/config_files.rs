use pausekit_gcode::pause::{PauseAt, PauseVariant};
use pausekit_settings::{Config, ConfigError, SettingsError};
use tempfile::TempDir;

fn custom_config() -> Config {
    let mut config = Config::new();
    config.pause.pause_at = PauseAt::LayerNo;
    config.pause.pause_layer = 7;
    config.pause.retraction_amount = 3.5;
    config.pause.display_text = "Insert magnets".to_string();
    config.pause.variant = PauseVariant::AnycubicI3Mega;
    config.machine.firmware_retract = true;
    config.logging.json = true;
    config
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pause.toml");

    let config = custom_config();
    config.save_to_file(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("variant = \"anycubic_i3_mega\""));

    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pause.json");

    let config = custom_config();
    config.save_to_file(&path).unwrap();
    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.pause.display_text(), Some("Insert magnets"));
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("config.toml");
    Config::new().save_to_file(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "pause: {}").unwrap();

    match Config::load_from_file(&path) {
        Err(SettingsError::Config(ConfigError::UnsupportedFormat(ext))) => {
            assert_eq!(ext, "yaml")
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(Config::new().save_to_file(&path).is_err());
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SettingsError::LoadError(_)));
}

#[test]
fn test_malformed_files() {
    let dir = TempDir::new().unwrap();

    let json = dir.path().join("bad.json");
    std::fs::write(&json, "{ not json").unwrap();
    assert!(matches!(
        Config::load_from_file(&json),
        Err(SettingsError::Json(_))
    ));

    let toml = dir.path().join("bad.toml");
    std::fs::write(&toml, "[pause\nx = ").unwrap();
    assert!(matches!(
        Config::load_from_file(&toml),
        Err(SettingsError::Toml(_))
    ));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[pause]\nextrude_speed = -2.0\n").unwrap();

    match Config::load_from_file(&path) {
        Err(SettingsError::Config(ConfigError::ValueOutOfRange { key, .. })) => {
            assert_eq!(key, "pause.extrude_speed")
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_load_explicit_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "pause": { "pause_height": 12.5 } }"#).unwrap();

    let config = Config::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.pause.pause_height, 12.5);
    assert_eq!(config.pause.pause_layer, 48);
}
