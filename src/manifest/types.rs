//! Docker Compose manifest structure
//!
//! Maps are ordered so regenerated manifests diff cleanly.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// One service in the compose file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceNode {
    #[serde(skip)]
    pub name: String,
    pub image: String,
    pub container_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cap_add: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<String>,
    pub networks: Vec<String>,
    pub restart: String,
}

impl ServiceNode {
    pub fn new(name: impl Into<String>, image: impl Into<String>, network: &str) -> Self {
        let name = name.into();
        Self {
            container_name: name.clone(),
            name,
            image: image.into(),
            cap_add: Vec::new(),
            devices: Vec::new(),
            environment: BTreeMap::new(),
            ports: Vec::new(),
            volumes: Vec::new(),
            depends_on: BTreeSet::new(),
            networks: vec![network.to_string()],
            restart: "unless-stopped".to_string(),
        }
    }
}

/// The shared network every service joins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkSpec {
    /// Pre-existing network managed outside this manifest
    External(String),
    /// Private bridge created with the stack
    Bridge(String),
}

impl NetworkSpec {
    pub fn name(&self) -> &str {
        match self {
            NetworkSpec::External(name) | NetworkSpec::Bridge(name) => name,
        }
    }
}

#[derive(Serialize)]
struct NetworkDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    external: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    driver: Option<&'static str>,
}

impl Serialize for NetworkSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let definition = match self {
            NetworkSpec::External(_) => NetworkDefinition {
                external: Some(true),
                driver: None,
            },
            NetworkSpec::Bridge(_) => NetworkDefinition {
                external: None,
                driver: Some("bridge"),
            },
        };
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.name(), &definition)?;
        map.end()
    }
}

/// Validated, immutable compose manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentManifest {
    pub(super) services: BTreeMap<String, ServiceNode>,
    pub(super) networks: NetworkSpec,
}

impl DeploymentManifest {
    pub fn services(&self) -> &BTreeMap<String, ServiceNode> {
        &self.services
    }

    pub fn service(&self, name: &str) -> Option<&ServiceNode> {
        self.services.get(name)
    }

    pub fn network(&self) -> &NetworkSpec {
        &self.networks
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
