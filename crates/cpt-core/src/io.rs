//! Reading and writing problem instances.
//!
//! Instances are plain serde documents. The format is picked from the file
//! extension (`.json`, `.yaml`, `.yml`); anything else is tried as YAML first
//! and then as JSON. Loading does not validate; call
//! [`ProblemInstance::validate`] or [`ProblemInstance::diagnose`] afterwards.

use std::fs;
use std::path::Path;

use crate::error::{CptError, CptResult};
use crate::instance::ProblemInstance;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceFormat {
    Json,
    Yaml,
}

impl InstanceFormat {
    /// Guess the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(InstanceFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Some(InstanceFormat::Yaml)
            }
            _ => None,
        }
    }
}

/// Parse an instance from a string in the given format
pub fn parse_instance(data: &str, format: InstanceFormat) -> CptResult<ProblemInstance> {
    match format {
        InstanceFormat::Json => Ok(serde_json::from_str(data)?),
        InstanceFormat::Yaml => Ok(serde_yaml::from_str(data)?),
    }
}

/// Load an instance from disk
pub fn load_instance(path: impl AsRef<Path>) -> CptResult<ProblemInstance> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    match InstanceFormat::from_path(path) {
        Some(format) => parse_instance(&data, format),
        None => parse_instance(&data, InstanceFormat::Yaml).or_else(|yaml_err| {
            parse_instance(&data, InstanceFormat::Json).map_err(|json_err| {
                CptError::Parse(format!(
                    "'{}' is neither YAML ({}) nor JSON ({})",
                    path.display(),
                    yaml_err,
                    json_err
                ))
            })
        }),
    }
}

/// Write an instance to disk, format chosen by extension (JSON by default)
pub fn save_instance(instance: &ProblemInstance, path: impl AsRef<Path>) -> CptResult<()> {
    let path = path.as_ref();
    let data = match InstanceFormat::from_path(path).unwrap_or(InstanceFormat::Json) {
        InstanceFormat::Json => serde_json::to_string_pretty(instance)?,
        InstanceFormat::Yaml => serde_yaml::to_string(instance)?,
    };
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NetworkNode, Provider, ProviderId, Router, RouterId, UserId};

    const YAML_INSTANCE: &str = r#"
users:
  - name: alice
vm_types:
  - name: small
    reservation_cost: 6.0
    cpu: 1.0
    bandwidth: 1.0
providers:
  - name: p0
    cpu_capacity: 10.0
routers:
  - name: r0
    reservation_cost: 1.0
    bandwidth_capacity: 10.0
arcs:
  - from: { provider: 0 }
    to: { router: 0 }
  - from: { router: 0 }
    to: { user: 0 }
scenarios:
  - name: low
    probability: 0.5
    vm_costs: [{ utilization: 1.0, on_demand: 10.0 }]
    router_costs: [{ utilization: 0.0, on_demand: 1.5 }]
    demand: [[2.0]]
  - name: high
    probability: 0.5
    vm_costs: [{ utilization: 1.0, on_demand: 10.0 }]
    router_costs: [{ utilization: 0.0, on_demand: 1.5 }]
    demand: [[4.0]]
"#;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            InstanceFormat::from_path(Path::new("a.JSON")),
            Some(InstanceFormat::Json)
        );
        assert_eq!(
            InstanceFormat::from_path(Path::new("a.yml")),
            Some(InstanceFormat::Yaml)
        );
        assert_eq!(InstanceFormat::from_path(Path::new("a.txt")), None);
    }

    #[test]
    fn yaml_instance_parses() {
        let instance = parse_instance(YAML_INSTANCE, InstanceFormat::Yaml).unwrap();
        instance.validate().unwrap();
        assert_eq!(instance.num_scenarios(), 2);
        let provider: &Provider = &instance.providers[0];
        assert_eq!(provider.cpu_capacity, 10.0);
        assert!(provider.storage_capacity.is_infinite());
        assert_eq!(
            instance.arcs[1].to,
            NetworkNode::User(UserId::new(0))
        );
        let router: &Router = instance.router(RouterId::new(0));
        assert_eq!(router.bandwidth_capacity, 10.0);
        assert_eq!(
            instance.arcs[0].from,
            NetworkNode::Provider(ProviderId::new(0))
        );
    }

    #[test]
    fn save_and_load_through_files() {
        let instance = parse_instance(YAML_INSTANCE, InstanceFormat::Yaml).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("instance.json");
        save_instance(&instance, &json_path).unwrap();
        assert_eq!(load_instance(&json_path).unwrap(), instance);

        let unknown_path = dir.path().join("instance.data");
        save_instance(&instance, &unknown_path).unwrap();
        assert_eq!(load_instance(&unknown_path).unwrap(), instance);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_instance(&path), Err(CptError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            load_instance("/nonexistent/instance.yaml"),
            Err(CptError::Io(_))
        ));
    }
}
