use crate::error::RollcallError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn no_workspace() -> Self {
        HandlerErr {
            code: "no_workspace",
            message: "select a workspace first".to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<RollcallError> for HandlerErr {
    fn from(e: RollcallError) -> Self {
        let details = match &e {
            RollcallError::NotFound { what, id } => Some(json!({ "what": what, "id": id })),
            RollcallError::RemoteHttp { status, path } => {
                Some(json!({ "status": status, "path": path }))
            }
            RollcallError::CorruptStore { key, .. } => Some(json!({ "key": key })),
            _ => None,
        };
        HandlerErr {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

/// Folds a handler result into the response envelope.
pub fn respond(id: &str, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => e.response(id),
    }
}
