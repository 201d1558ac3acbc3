//! Field checks applied before any resource write.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ResourceError, ResourceResult};
use crate::models::resource::{
    CreateResourceNode, ResourceNode, ResourceType, UpdateResourceNode,
};

static RESOURCE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{1,30}$").expect("resource id pattern is valid"));

/// `true` when `id` is 1-30 ASCII letters or digits.
pub fn is_word(id: &str) -> bool {
    RESOURCE_ID.is_match(id)
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require(value: &str, field: &'static str) -> ResourceResult<()> {
    if is_blank(value) {
        return Err(ResourceError::MissingField { field });
    }
    Ok(())
}

/// Validate create input and derive the node to store.
///
/// Subsystem nodes get their parent forced to the top level before the
/// parent check runs, so a blank parent is accepted for them.
pub fn prepare_create(input: CreateResourceNode) -> ResourceResult<ResourceNode> {
    let resource_type = ResourceType::from_code(&input.resource_type);
    let parent_id = match resource_type.and_then(ResourceType::forced_parent) {
        Some(forced) => forced.to_string(),
        None => input.parent_id,
    };

    if !is_word(&input.id) {
        return Err(ResourceError::InvalidIdentifier { id: input.id });
    }
    require(&input.name, "name")?;
    require(&input.resource_type, "type")?;
    let resource_type = resource_type.ok_or(ResourceError::UnknownType {
        code: input.resource_type,
    })?;
    require(&parent_id, "parent_id")?;

    let service_code = input.service_code.filter(|code| !code.is_empty());

    Ok(ResourceNode {
        id: input.id,
        name: input.name,
        attr: resource_type.attr(),
        parent_id,
        resource_type,
        system_owned: false,
        inner_flag: service_code.is_none(),
        service_code,
    })
}

/// Field-level update checks. An empty service code is cleared. Cycle
/// detection needs the stored tree and is done by the service.
pub fn prepare_update(mut input: UpdateResourceNode) -> ResourceResult<UpdateResourceNode> {
    require(&input.name, "name")?;
    if input.parent_id == input.id {
        return Err(ResourceError::SelfParent { id: input.id });
    }
    input.service_code = input.service_code.filter(|code| !code.is_empty());
    Ok(input)
}
