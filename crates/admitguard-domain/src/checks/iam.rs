use super::utils::{id_of, section, str_field};
use crate::error::CheckError;
use crate::scan::CheckFinding;
use serde_json::{Value, json};

pub fn permission_boundaries(snapshot: &Value) -> Result<CheckFinding, CheckError> {
    let roles = section(snapshot, "iam.roles")?;
    if roles.is_empty() {
        return Ok(CheckFinding::info("no IAM roles in snapshot").with_details(json!({ "roles": 0 })));
    }

    let missing: Vec<String> = roles
        .iter()
        .filter(|r| str_field(r, "permission_boundary").is_none())
        .map(id_of)
        .collect();
    let details = json!({ "roles": roles.len(), "missing_boundary": missing });
    if missing.is_empty() {
        Ok(CheckFinding::pass(format!(
            "{} role(s) have permission boundaries",
            roles.len()
        ))
        .with_details(details))
    } else {
        Ok(CheckFinding::fail(format!(
            "{} role(s) lack a permission boundary",
            missing.len()
        ))
        .with_details(details))
    }
}
