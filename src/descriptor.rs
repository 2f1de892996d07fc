use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Source language of a chaincode package, named the way the network SDKs
/// name it on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChaincodeLanguage {
    Golang,
    Node,
    Java,
    Car,
}

impl ChaincodeLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Golang => "golang",
            Self::Node => "node",
            Self::Java => "java",
            Self::Car => "car",
        }
    }

    /// Golang packages are built from a GOPATH workspace, so their source
    /// path has to be split around the `src` segment.
    pub fn requires_workspace_split(&self) -> bool {
        matches!(self, Self::Golang)
    }
}

impl fmt::Display for ChaincodeLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChaincodeLanguage {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "golang" => Ok(Self::Golang),
            "node" => Ok(Self::Node),
            "java" => Ok(Self::Java),
            "car" => Ok(Self::Car),
            other => Err(anyhow!(
                "unsupported chaincode language `{other}` (expected golang, node, java or car)"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChaincodeDescriptor {
    pub name: String,
    pub version: String,
    pub path: String,
    pub language: ChaincodeLanguage,
}

impl ChaincodeDescriptor {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<String>,
        language: ChaincodeLanguage,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            path: path.into(),
            language,
        }
    }

    pub fn id(&self) -> ChaincodeId {
        ChaincodeId::new(&self.name, &self.version)
    }
}

impl fmt::Display for ChaincodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Identity key of a chaincode: `(name, version)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChaincodeId {
    pub name: String,
    pub version: String,
}

impl ChaincodeId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Exact comparison, no normalisation.
    pub fn matches(&self, name: &str, version: &str) -> bool {
        self.name == name && self.version == version
    }
}

impl fmt::Display for ChaincodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
