use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::{Builder, NamedTempFile};

use ppe_sentinel::config::MonitorConfig;
use ppe_sentinel::{AggregationMode, PpeCategory};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PPE_CONFIG",
        "PPE_REQUIRED",
        "PPE_COOLDOWN_SECS",
        "PPE_INFERENCE_STRIDE",
        "PPE_LOG_DIR",
        "PPE_SNAPSHOT_DIR",
        "PPE_AGGREGATION",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_json_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "required_ppe": ["helmet", "gloves"],
        "cooldown_secs": 5,
        "aggregation": "per_person",
        "inference": { "stride": 2, "keypoint_confidence": 0.6 },
        "output": { "log_dir": "/var/log/ppe", "snapshot_dir": "/var/lib/ppe/snaps" },
        "labels": { "helmet": ["Bump_Cap"] },
        "overrides": { "mask": true }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("PPE_CONFIG", file.path());
    std::env::set_var("PPE_INFERENCE_STRIDE", "4");
    std::env::set_var("PPE_SNAPSHOT_DIR", "/tmp/ppe-snaps");

    let cfg = MonitorConfig::load().expect("load config");
    assert_eq!(
        cfg.required_ppe,
        vec![PpeCategory::Helmet, PpeCategory::Gloves]
    );
    assert_eq!(cfg.cooldown, Duration::from_secs(5));
    assert_eq!(cfg.aggregation, AggregationMode::PerPerson);
    assert_eq!(cfg.inference.stride, 4);
    assert_eq!(cfg.inference.keypoint_confidence, 0.6);
    assert_eq!(cfg.output.log_dir, PathBuf::from("/var/log/ppe"));
    assert_eq!(cfg.output.snapshot_dir, PathBuf::from("/tmp/ppe-snaps"));
    assert!(cfg
        .vocabulary
        .keywords(PpeCategory::Helmet)
        .contains(&"bump_cap".to_string()));
    assert!(cfg.overrides.is_forced(PpeCategory::Mask));
    assert!(!cfg.overrides.is_forced(PpeCategory::Helmet));

    clear_env();
}

#[test]
fn loads_toml_config_by_extension() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    let toml = r#"
required_ppe = ["shoes"]
cooldown_secs = 1.5

[output]
log_dir = "site-logs"
"#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");

    let cfg = MonitorConfig::load_from(Some(file.path())).expect("load config");
    assert_eq!(cfg.required_ppe, vec![PpeCategory::Shoes]);
    assert_eq!(cfg.cooldown, Duration::from_millis(1500));
    assert_eq!(cfg.output.log_dir, PathBuf::from("site-logs"));
    assert_eq!(cfg.output.snapshot_dir, PathBuf::from("violations"));
    assert_eq!(cfg.inference.stride, 3);

    clear_env();
}

#[test]
fn env_only_config_uses_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PPE_REQUIRED", "Mask, helmet");
    std::env::set_var("PPE_COOLDOWN_SECS", "0");
    std::env::set_var("PPE_AGGREGATION", "per-person");

    let cfg = MonitorConfig::load().expect("load config");
    assert_eq!(cfg.required_ppe, vec![PpeCategory::Mask, PpeCategory::Helmet]);
    assert_eq!(cfg.cooldown, Duration::ZERO);
    assert_eq!(cfg.aggregation, AggregationMode::PerPerson);
    assert_eq!(cfg.output.log_dir, PathBuf::from("logs"));

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PPE_REQUIRED", "helmet,visor");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("PPE_REQUIRED", "helmet,helmet");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("PPE_INFERENCE_STRIDE", "0");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("PPE_COOLDOWN_SECS", "-2");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, br#"{"inference": {"keypoint_confidence": 1.5}}"#)
        .expect("write config");
    assert!(MonitorConfig::load_from(Some(file.path())).is_err());

    clear_env();
}
