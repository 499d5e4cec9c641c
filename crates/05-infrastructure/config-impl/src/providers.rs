//! 属性源实现

use async_trait::async_trait;
use config_abstractions::{PropertyMap, PropertySource};
use infrastructure_common::{ConfigError, ConfigResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// TOML 文件属性源
///
/// 嵌套表展开为点号分隔的键，例如 `[server] port = 80` 得到 `server.port`
#[derive(Debug)]
pub struct TomlPropertySource {
    file_path: PathBuf,
    priority: i32,
}

impl TomlPropertySource {
    /// 创建新的 TOML 属性源
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file_path: path.as_ref().to_path_buf(),
            priority: 100, // 文件默认中等优先级
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl PropertySource for TomlPropertySource {
    async fn load(&self) -> ConfigResult<PropertyMap> {
        debug!("加载 TOML 属性文件: {}", self.file_path.display());
        let content = read_file(&self.file_path).await?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;

        let mut properties = PropertyMap::new();
        for (key, value) in &table {
            flatten_into(key.clone(), toml_to_json(value), &mut properties);
        }
        debug!("TOML 属性文件加载完成: {} 个属性", properties.len());
        Ok(properties)
    }

    fn name(&self) -> &str {
        "TomlPropertySource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// JSON 文件属性源
#[derive(Debug)]
pub struct JsonPropertySource {
    file_path: PathBuf,
    priority: i32,
}

impl JsonPropertySource {
    /// 创建新的 JSON 属性源
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file_path: path.as_ref().to_path_buf(),
            priority: 100,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl PropertySource for JsonPropertySource {
    async fn load(&self) -> ConfigResult<PropertyMap> {
        debug!("加载 JSON 属性文件: {}", self.file_path.display());
        let content = read_file(&self.file_path).await?;

        let root = match serde_json::from_str::<Value>(&content)? {
            Value::Object(root) => root,
            _ => {
                return Err(ConfigError::ParseError {
                    source: format!("{} 的根节点不是对象", self.file_path.display()).into(),
                })
            }
        };

        let mut properties = PropertyMap::new();
        for (key, value) in root {
            flatten_into(key, value, &mut properties);
        }
        debug!("JSON 属性文件加载完成: {} 个属性", properties.len());
        Ok(properties)
    }

    fn name(&self) -> &str {
        "JsonPropertySource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 环境变量属性源
///
/// `PREFIX_SERVER_PORT=80` 映射为 `server.port = 80`，标量值按布尔、整数、浮点数、字符串的顺序推断类型
#[derive(Debug)]
pub struct EnvironmentPropertySource {
    prefix: String,
    separator: String,
    priority: i32,
}

impl EnvironmentPropertySource {
    /// 创建新的环境变量属性源
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: "_".to_string(),
            priority: 200, // 环境变量最高优先级
        }
    }

    /// 设置分隔符
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 从给定的变量集合中提取属性
    pub fn collect<I>(&self, vars: I) -> PropertyMap
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter_map(|(key, value)| {
                let property_key = self.env_key_to_property_key(&key)?;
                Some((property_key, parse_scalar(&value)))
            })
            .collect()
    }

    /// 将环境变量键转换为属性键，前缀不匹配时返回 `None`
    fn env_key_to_property_key(&self, env_key: &str) -> Option<String> {
        let key = if self.prefix.is_empty() {
            env_key
        } else {
            // 前缀之后必须紧跟分隔符，`APPLE_COLOR` 不属于前缀 `APP`
            env_key
                .strip_prefix(&self.prefix)?
                .strip_prefix(self.separator.as_str())?
        };
        if key.is_empty() {
            return None;
        }
        Some(key.replace(self.separator.as_str(), ".").to_lowercase())
    }
}

#[async_trait]
impl PropertySource for EnvironmentPropertySource {
    async fn load(&self) -> ConfigResult<PropertyMap> {
        debug!("加载环境变量，前缀: {}", self.prefix);
        let properties = self.collect(std::env::vars());
        debug!("加载了 {} 个环境变量", properties.len());
        Ok(properties)
    }

    fn name(&self) -> &str {
        "EnvironmentPropertySource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 内存属性源
#[derive(Debug, Default)]
pub struct MapPropertySource {
    properties: PropertyMap,
    priority: i32,
}

impl MapPropertySource {
    /// 创建新的内存属性源
    pub fn new(properties: PropertyMap) -> Self {
        Self {
            properties,
            priority: 0,
        }
    }

    /// 添加属性
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl PropertySource for MapPropertySource {
    async fn load(&self) -> ConfigResult<PropertyMap> {
        Ok(self.properties.clone())
    }

    fn name(&self) -> &str {
        "MapPropertySource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 按扩展名创建文件属性源，`.json` 使用 JSON 格式，其余按 TOML 解析
pub fn file_property_source<P: AsRef<Path>>(path: P) -> Box<dyn PropertySource> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Box::new(JsonPropertySource::new(path))
    } else {
        Box::new(TomlPropertySource::new(path))
    }
}

async fn read_file(path: &Path) -> ConfigResult<String> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(tokio::fs::read_to_string(path).await?)
}

/// 将嵌套对象递归展开为点号分隔的键，数组和标量作为叶子值
fn flatten_into(prefix: String, value: Value, properties: &mut PropertyMap) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(format!("{}.{}", prefix, key), nested, properties);
            }
        }
        leaf => {
            properties.insert(prefix, leaf);
        }
    }
}

/// 将 TOML 值转换为 JSON 值
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number(serde_json::Number::from(*i)),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Array(arr) => Value::Array(arr.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}

/// 推断标量字符串的类型
fn parse_scalar(value: &str) -> Value {
    if let Ok(bool_val) = value.parse::<bool>() {
        Value::Bool(bool_val)
    } else if let Ok(int_val) = value.parse::<i64>() {
        Value::Number(serde_json::Number::from(int_val))
    } else if let Some(number) = value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        Value::Number(number)
    } else {
        Value::String(value.to_string())
    }
}
