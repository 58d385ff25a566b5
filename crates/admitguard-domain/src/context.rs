use admitguard_types::ResourceRef;
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const DEFAULT_OPERATION: &str = "CREATE";

static NULL: Value = Value::Null;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub username: String,
    pub groups: Vec<String>,
}

/// Ambient request metadata exposed under `request.*`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestInfo {
    pub operation: String,
    pub timestamp: Option<OffsetDateTime>,
    pub user: Option<UserInfo>,
}

impl Default for RequestInfo {
    fn default() -> Self {
        Self {
            operation: DEFAULT_OPERATION.to_string(),
            timestamp: None,
            user: None,
        }
    }
}

/// Read-only view of one admission request.
///
/// The tree is rooted at `request`, so expressions read
/// `request.object.metadata.name` or `request.userInfo.username`.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationContext {
    root: Value,
}

impl EvaluationContext {
    pub fn new(resource: Value) -> Self {
        Self::with_request(resource, &RequestInfo::default())
    }

    pub fn with_request(resource: Value, request: &RequestInfo) -> Self {
        let mut req = json!({
            "object": resource,
            "operation": request.operation,
        });
        if let Some(ts) = request.timestamp
            && let Ok(formatted) = ts.format(&Rfc3339)
        {
            req["timestamp"] = Value::String(formatted);
        }
        if let Some(user) = &request.user {
            req["userInfo"] = json!({
                "username": user.username,
                "groups": user.groups,
            });
        }
        Self {
            root: json!({ "request": req }),
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The resource under test (`request.object`).
    pub fn resource(&self) -> &Value {
        self.root
            .get("request")
            .and_then(|r| r.get("object"))
            .unwrap_or(&NULL)
    }

    pub fn resource_ref(&self) -> ResourceRef {
        let resource = self.resource();
        let metadata = resource.get("metadata");
        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
        ResourceRef {
            kind: text(resource.get("kind")).unwrap_or_default(),
            name: text(metadata.and_then(|m| m.get("name"))),
            namespace: text(metadata.and_then(|m| m.get("namespace"))),
        }
    }
}
