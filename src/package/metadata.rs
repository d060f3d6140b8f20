//! Files that make the package loadable by Embulk's JRuby runtime

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::naming::PackageName;
use crate::domain::PluginDescriptor;

/// Platform recorded for packaged Java plugins
pub const PLATFORM: &str = "java";

/// Returns the build time, honoring `SOURCE_DATE_EPOCH` for reproducible builds
pub fn build_timestamp() -> DateTime<Utc> {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|epoch| epoch.trim().parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(Utc::now)
}

/// Relative path of the Ruby registration stub inside the package
pub fn ruby_stub_path(descriptor: &PluginDescriptor) -> String {
    format!(
        "lib/embulk/{}/{}.rb",
        descriptor.category(),
        descriptor.plugin_type()
    )
}

/// Renders the Ruby stub that registers the plugin's classpath with Embulk
pub fn ruby_stub(descriptor: &PluginDescriptor) -> String {
    format!(
        "Embulk::JavaPlugin.register_{category}(\n  \"{plugin_type}\", \"{main_class}\",\n  File.expand_path(\"../../../../classpath\", __FILE__))\n",
        category = descriptor.category(),
        plugin_type = descriptor.plugin_type(),
        main_class = descriptor.main_class(),
    )
}

/// Contents of `metadata.yml`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageMetadata {
    pub name: String,

    /// Gem version, absent for unspecified project versions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub platform: String,
    pub summary: String,
    pub date: String,
    pub require_paths: Vec<String>,
    pub plugin: PluginMetadata,

    /// Package-relative paths, sorted
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginMetadata {
    pub main_class: String,
    pub category: String,

    #[serde(rename = "type")]
    pub plugin_type: String,
}

impl PackageMetadata {
    pub fn new(
        name: &PackageName,
        descriptor: &PluginDescriptor,
        summary: &str,
        built_at: DateTime<Utc>,
        mut files: Vec<String>,
    ) -> Self {
        files.sort();

        Self {
            name: name.name().to_string(),
            version: name.version().map(str::to_string),
            platform: PLATFORM.to_string(),
            summary: summary.to_string(),
            date: built_at.format("%Y-%m-%d").to_string(),
            require_paths: vec!["lib".to_string()],
            plugin: PluginMetadata {
                main_class: descriptor.main_class().to_string(),
                category: descriptor.category().to_string(),
                plugin_type: descriptor.plugin_type().to_string(),
            },
            files,
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> PluginDescriptor {
        PluginDescriptor::new("org.embulk.input.example.ExampleInputPlugin", "input", "example").unwrap()
    }

    #[test]
    fn stub_path_and_contents() {
        let descriptor = descriptor();
        assert_eq!(ruby_stub_path(&descriptor), "lib/embulk/input/example.rb");

        let stub = ruby_stub(&descriptor);
        assert!(stub.starts_with("Embulk::JavaPlugin.register_input("));
        assert!(stub.contains("\"example\", \"org.embulk.input.example.ExampleInputPlugin\""));
        assert!(stub.contains("File.expand_path(\"../../../../classpath\", __FILE__)"));
    }

    #[test]
    fn metadata_yaml() {
        let name = PackageName::new("embulk-input-example", Some("0.1.0".to_string()), "java").unwrap();
        let built_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let metadata = PackageMetadata::new(
            &name,
            &descriptor(),
            "Example input",
            built_at,
            vec!["lib/embulk/input/example.rb".to_string(), "classpath/a.jar".to_string()],
        );

        assert_eq!(metadata.date, "2024-03-01");
        assert_eq!(metadata.files, vec!["classpath/a.jar", "lib/embulk/input/example.rb"]);

        let yaml = metadata.to_yaml().unwrap();
        assert!(yaml.contains("name: embulk-input-example"));
        assert!(yaml.contains("platform: java"));
        assert!(yaml.contains("type: example"));
    }

    #[test]
    fn metadata_without_version() {
        let name = PackageName::new("my-plugin", None, "java").unwrap();
        let metadata = PackageMetadata::new(&name, &descriptor(), "", Utc::now(), Vec::new());

        let yaml = metadata.to_yaml().unwrap();
        assert!(!yaml.contains("version:"));
    }
}
