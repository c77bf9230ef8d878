//! OData filter expressions for the search service.

use crate::domain::models::COMMON_TENANT;

/// Module value for documents that apply to every module.
pub const ALL_MODULES: &str = "all";

/// Quote a string literal, doubling embedded single quotes.
pub fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn eq(field: &str, value: &str) -> String {
    format!("{field} eq {}", literal(value))
}

/// `tenant ∈ {tenant_id, "common"}`
pub fn tenant_scope(tenant_id: &str) -> String {
    format!("({} or {})", eq("clientId", tenant_id), eq("clientId", COMMON_TENANT))
}

/// `module ∈ {module, "all"}`, or no constraint when the module is unset.
pub fn module_scope(module: Option<&str>) -> Option<String> {
    module
        .filter(|m| !m.trim().is_empty())
        .map(|m| format!("({} or {})", eq("module", m), eq("module", ALL_MODULES)))
}

/// Tenant scope, narrowed by module when one is given.
pub fn scoped(tenant_id: &str, module: Option<&str>) -> String {
    let tenant = tenant_scope(tenant_id);
    match module_scope(module) {
        Some(module) => format!("{tenant} and {module}"),
        None => tenant,
    }
}
