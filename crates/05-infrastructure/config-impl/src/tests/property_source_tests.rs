//! 属性源测试

use crate::*;
use config_abstractions::PropertySource;
use infrastructure_common::ConfigError;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// 测试 TOML 嵌套表展开为点号键
#[tokio::test]
async fn test_toml_source_flattens_tables() {
    let file = temp_file(
        ".toml",
        r#"
name = "demo"

[server]
port = 8080
ratio = 0.75

[server.tls]
enabled = true
"#,
    );

    let properties = TomlPropertySource::new(file.path()).load().await.unwrap();

    assert_eq!(properties["name"], json!("demo"));
    assert_eq!(properties["server.port"], json!(8080));
    assert_eq!(properties["server.ratio"], json!(0.75));
    assert_eq!(properties["server.tls.enabled"], json!(true));
    assert!(!properties.contains_key("server"));
}

/// 测试 JSON 属性文件
#[tokio::test]
async fn test_json_source_flattens_objects() {
    let file = temp_file(
        ".json",
        r#"{ "database": { "url": "postgres://localhost", "pool": 4 }, "tags": ["a", "b"] }"#,
    );

    let properties = JsonPropertySource::new(file.path()).load().await.unwrap();

    assert_eq!(properties.len(), 3);
    assert_eq!(properties["database.url"], json!("postgres://localhost"));
    assert_eq!(properties["database.pool"], json!(4));
    assert_eq!(properties["tags"], json!(["a", "b"]));
}

/// 测试 JSON 根节点不是对象
#[tokio::test]
async fn test_json_source_rejects_non_object_root() {
    let file = temp_file(".json", "[1, 2, 3]");

    let err = JsonPropertySource::new(file.path()).load().await.unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

/// 测试无效 TOML 内容
#[tokio::test]
async fn test_toml_source_reports_parse_error() {
    let file = temp_file(".toml", "name = ");

    let err = TomlPropertySource::new(file.path()).load().await.unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

/// 测试文件不存在
#[tokio::test]
async fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    let err = TomlPropertySource::new(&path).load().await.unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

/// 测试高优先级属性源覆盖低优先级
#[tokio::test]
async fn test_chain_merges_by_priority() {
    let file = temp_file(".toml", "name = \"from-file\"\nport = 80\n");

    let chain = PropertySourceChain::new()
        .with_source(
            MapPropertySource::default()
                .with_property("name", "from-override")
                .with_priority(500),
        )
        .with_source(TomlPropertySource::new(file.path()))
        .with_source(
            MapPropertySource::default()
                .with_property("name", "from-defaults")
                .with_property("timeout", 30),
        );

    assert_eq!(chain.source_count(), 3);

    let properties = chain.load_all().await.unwrap();
    assert_eq!(properties["name"], json!("from-override"));
    assert_eq!(properties["port"], json!(80));
    assert_eq!(properties["timeout"], json!(30));
}

/// 测试属性源链中任一属性源失败时整体失败
#[tokio::test]
async fn test_chain_propagates_source_error() {
    let chain = PropertySourceChain::new()
        .with_source(MapPropertySource::default().with_property("a", 1))
        .with_source(JsonPropertySource::new("/nonexistent/lorn-koin.json"));

    let err = chain.load_all().await.unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

/// 测试属性源链可以嵌套在另一条链中
#[tokio::test]
async fn test_chain_is_itself_a_source() {
    let defaults = PropertySourceChain::new()
        .with_source(MapPropertySource::default().with_property("mode", "default"));
    let chain = PropertySourceChain::new()
        .with_source(
            MapPropertySource::default()
                .with_property("mode", "override")
                .with_priority(10),
        )
        .with_source(defaults);

    assert_eq!(chain.name(), "PropertySourceChain");
    assert_eq!(chain.priority(), 10);
    assert_eq!(chain.load().await.unwrap()["mode"], json!("override"));
}
