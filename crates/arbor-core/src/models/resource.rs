//! Resource node domain model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parent id of top-level nodes.
pub const ROOT_PARENT_ID: &str = "-1";

/// Category of a resource node.
///
/// Serialized as its numeric code (`"0"`, `"1"`, `"2"`, `"4"`), which is also
/// the form stored and accepted from callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// Top-level subsystem menu, always parented at [`ROOT_PARENT_ID`].
    #[serde(rename = "0")]
    Subsystem,
    /// Menu entry inside a subsystem.
    #[serde(rename = "1")]
    SubsystemMenu,
    /// Function button.
    #[serde(rename = "2")]
    Button,
    /// Reserved category with no runtime behaviour.
    #[serde(rename = "4")]
    Reserved,
}

impl ResourceType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "0" => Some(Self::Subsystem),
            "1" => Some(Self::SubsystemMenu),
            "2" => Some(Self::Button),
            "4" => Some(Self::Reserved),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Subsystem => "0",
            Self::SubsystemMenu => "1",
            Self::Button => "2",
            Self::Reserved => "4",
        }
    }

    /// Structural role of nodes of this type.
    pub fn attr(self) -> NodeAttr {
        match self {
            Self::Subsystem | Self::Reserved => NodeAttr::Container,
            Self::SubsystemMenu | Self::Button => NodeAttr::Leaf,
        }
    }

    /// Parent id imposed on nodes of this type, overriding caller input.
    pub fn forced_parent(self) -> Option<&'static str> {
        match self {
            Self::Subsystem => Some(ROOT_PARENT_ID),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Whether a node may hold children.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NodeAttr {
    Leaf,
    Container,
}

impl NodeAttr {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leaf => "Leaf",
            Self::Container => "Container",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Leaf" => Some(Self::Leaf),
            "Container" => Some(Self::Container),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceNode {
    pub id: String,
    pub name: String,
    pub attr: NodeAttr,
    /// Parent node id, or [`ROOT_PARENT_ID`] for top-level nodes.
    pub parent_id: String,
    pub resource_type: ResourceType,
    /// Protected nodes cannot be deleted.
    pub system_owned: bool,
    /// `true` when the node is not tied to an external service.
    pub inner_flag: bool,
    pub service_code: Option<String>,
}

impl ResourceNode {
    pub fn is_top_level(&self) -> bool {
        self.parent_id == ROOT_PARENT_ID
    }
}

/// Flattened id/name/parent projection, used to offer candidate parents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceNodeSummary {
    pub id: String,
    pub name: String,
    pub parent_id: String,
}

impl From<&ResourceNode> for ResourceNodeSummary {
    fn from(node: &ResourceNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            parent_id: node.parent_id.clone(),
        }
    }
}

/// Caller input for creating a node. Fields arrive unvalidated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateResourceNode {
    pub id: String,
    pub name: String,
    /// Raw type code, see [`ResourceType::from_code`].
    pub resource_type: String,
    pub parent_id: String,
    pub service_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UpdateResourceNode {
    pub id: String,
    pub name: String,
    pub parent_id: String,
    pub service_code: Option<String>,
}

impl UpdateResourceNode {
    /// Inner flag implied by the new service code.
    pub fn inner_flag(&self) -> bool {
        self.service_code.as_deref().is_none_or(str::is_empty)
    }
}
