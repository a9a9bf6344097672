use actix_web::HttpResponse;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-field validation messages, rendered as a 422 response body:
/// `{"errors": {"field": ["message", ...]}}`
#[derive(Debug, Default, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::UnprocessableEntity().json(serde_json::json!({ "errors": self.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_multiple_messages_per_field() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());
        errors.push("start_date", "required");
        errors.push("start_date", "must be a date");
        errors.push("end_date", "must not be before start_date");
        assert!(!errors.is_empty());
        assert!(errors.contains("start_date"));
        assert!(errors.contains("end_date"));
        assert!(!errors.contains("status"));
    }

    #[test]
    fn serializes_as_field_message_map() {
        let mut errors = FieldErrors::new();
        errors.push("email", "already taken");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["email"][0], "already taken");
    }
}
