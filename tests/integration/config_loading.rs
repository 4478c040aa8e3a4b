//! Configuration loading through the public loader

use crate::integration::test_utils::{env_lock, EnvGuard};
use quill::config::{ConfigLoader, GenerationDefaults};
use quill::logging::LoggingConfig;
use quill::provider::ApiStyle;
use quill::GenerationError;
use std::time::Duration;
use tempfile::TempDir;

fn isolated(temp_dir: &TempDir) -> EnvGuard {
    let home = temp_dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    let home = home.to_string_lossy().to_string();
    EnvGuard::set(&[
        ("HOME", Some(home.as_str())),
        ("XDG_CONFIG_HOME", None),
        ("QUILL_ENV", None),
        ("QUILL_MODEL", None),
        ("QUILL__GENERATION__MODEL_CANDIDATES", None),
        ("QUILL__GENERATION__TOKEN_BUDGET", None),
        ("QUILL__PROVIDER__API_STYLE", None),
    ])
}

#[test]
fn test_defaults_without_any_files() {
    let _lock = env_lock();
    let temp_dir = TempDir::new().unwrap();
    let _env = isolated(&temp_dir);

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config.generation, GenerationDefaults::default());
    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.provider.api_style, ApiStyle::Responses);
}

#[test]
fn test_env_candidate_list_is_comma_separated() {
    let _lock = env_lock();
    let temp_dir = TempDir::new().unwrap();
    let _env = isolated(&temp_dir);
    let _list = EnvGuard::set(&[
        ("QUILL__GENERATION__MODEL_CANDIDATES", Some("local-a,local-b")),
        ("QUILL__PROVIDER__API_STYLE", Some("chat_completions")),
    ]);

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config.generation.model_candidates, vec!["local-a", "local-b"]);
    assert_eq!(config.provider.api_style, ApiStyle::ChatCompletions);
}

#[test]
fn test_xdg_config_home_is_preferred() {
    let _lock = env_lock();
    let temp_dir = TempDir::new().unwrap();
    let _env = isolated(&temp_dir);
    let xdg = temp_dir.path().join("xdg");
    let xdg_str = xdg.to_string_lossy().to_string();
    let _xdg = EnvGuard::set(&[("XDG_CONFIG_HOME", Some(xdg_str.as_str()))]);

    let path = ConfigLoader::global_config_path().unwrap();
    assert_eq!(path, xdg.join("quill").join("config.toml"));

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "[generation]\nretry_base_delay_ms = 10\ncall_timeout_secs = 7\n").unwrap();

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    let policy = config.generation.invoke_policy();
    assert_eq!(policy.retry_base_delay, Duration::from_millis(10));
    assert_eq!(policy.call_timeout, Duration::from_secs(7));
}

#[test]
fn test_invalid_values_fail_validation() {
    let _lock = env_lock();
    let temp_dir = TempDir::new().unwrap();
    let _env = isolated(&temp_dir);
    let path = temp_dir.path().join("bad.toml");
    std::fs::write(
        &path,
        "[generation]\nmax_segments = 0\n\n[logging]\nlevel = \"loud\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(matches!(
        config.validated(),
        Err(GenerationError::ConfigError(_))
    ));
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let _lock = env_lock();
    let temp_dir = TempDir::new().unwrap();
    let _env = isolated(&temp_dir);
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[generation\nmodel_candidates = ").unwrap();

    assert!(matches!(
        ConfigLoader::load_from_file(&path),
        Err(GenerationError::ConfigError(_))
    ));
}
