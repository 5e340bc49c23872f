//! Integration tests for logging functionality
//!
//! The global subscriber can only be installed once per process, so a single
//! test in this file calls `init_logging`.

use std::sync::Arc;
use tempfile::TempDir;
use vigil::adapters::memory::MemoryStore;
use vigil::config::LoggingConfig;
use vigil::core::repair::{RepairOptions, RepairPass};
use vigil::domain::CommunityId;
use vigil::logging::init_logging;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
    assert_eq!(config.local_path, "/var/log/vigil");
}

#[test]
fn test_invalid_level_is_rejected_before_install() {
    let config = LoggingConfig {
        local_enabled: false,
        ..LoggingConfig::default()
    };
    let result = init_logging("verbose", &config);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_file_logging_writes_json_events() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");
    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
        local_max_size_mb: 10,
    };

    let guard = init_logging("info", &config).unwrap();
    assert!(log_path.exists());

    let store = Arc::new(MemoryStore::new());
    RepairPass::new(store, RepairOptions::default())
        .run()
        .await
        .unwrap();
    drop(guard);

    let contents: String = std::fs::read_dir(&log_path)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("vigil.log"))
        .map(|entry| std::fs::read_to_string(entry.path()).unwrap_or_default())
        .collect();
    assert!(contents.contains("Starting community repair"));
    assert!(contents.lines().all(|line| line.starts_with('{')));
}

#[test]
fn test_logging_macros_compile() {
    // Events before a subscriber is installed are discarded
    let id = CommunityId::new();
    vigil::log_repair_action!("relocated", id, "Asokwa", "sub_district_id -> district_id");
    vigil::log_node_created!(vigil::domain::HierarchyLevel::Community, id, "Asokwa");
    let error = vigil::domain::VigilError::Persistence("connection reset".to_string());
    vigil::log_error_with_context!(error, "merge failed");
}
