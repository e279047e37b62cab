//! Response-shape handling for the backend's JSON bodies.
//!
//! List endpoints answer with `{ "<resource>": [...] }` or `{ "data": [...] }`
//! (optionally `{ "data": { "<resource>": [...] } }`). Anything else is
//! accepted only through a logged degraded path that takes the first
//! array-valued property.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::backend::Location;
use crate::errors::{OnboardingError, Result};

/// Pulls the item array out of a list response.
pub fn extract_list(body: &Value, resource: &str) -> Result<Vec<Value>> {
    if let Some(items) = documented_list(body, resource) {
        return Ok(items.clone());
    }

    let fallback = first_array(body).or_else(|| body.get("data").and_then(first_array));
    match fallback {
        Some((key, items)) => {
            tracing::warn!(
                resource,
                key,
                "list response did not match the documented shape; using first array property"
            );
            Ok(items.clone())
        }
        None => Err(OnboardingError::UnexpectedResponse(format!(
            "no `{}` list in response",
            resource
        ))),
    }
}

fn documented_list<'a>(body: &'a Value, resource: &str) -> Option<&'a Vec<Value>> {
    if let Some(items) = body.as_array() {
        return Some(items);
    }
    if let Some(items) = body.get(resource).and_then(Value::as_array) {
        return Some(items);
    }
    let data = body.get("data")?;
    data.as_array()
        .or_else(|| data.get(resource).and_then(Value::as_array))
}

fn first_array(value: &Value) -> Option<(&str, &Vec<Value>)> {
    value
        .as_object()?
        .iter()
        .find_map(|(key, item)| item.as_array().map(|items| (key.as_str(), items)))
}

/// Deserializes each item, dropping malformed entries.
pub fn parse_items<T: DeserializeOwned>(items: Vec<Value>, resource: &str) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::debug!(resource, error = %err, "skipping malformed list entry");
                None
            }
        })
        .collect()
}

/// Active locations from a list response.
pub fn parse_locations(body: &Value, resource: &str) -> Result<Vec<Location>> {
    let items = extract_list(body, resource)?;
    Ok(parse_items::<Location>(items, resource)
        .into_iter()
        .filter(|location| location.active)
        .collect())
}

/// Unwraps a single object that may or may not be nested under `data`.
pub fn parse_object<T: DeserializeOwned>(body: Value) -> Result<T> {
    match body {
        Value::Object(mut map) if map.get("data").map_or(false, Value::is_object) => {
            let data = map.remove("data").unwrap_or(Value::Null);
            Ok(serde_json::from_value(data)?)
        }
        other => Ok(serde_json::from_value(other)?),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
    pub user: Option<LoginUser>,
}

/// Reads the login response. The token may sit under `token` or
/// `access_token`, at the top level or under `data`.
pub fn parse_login(body: &Value) -> Result<LoginResponse> {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(OnboardingError::Auth(if message.is_empty() {
            "login rejected".into()
        } else {
            message
        }));
    }

    let scopes = [Some(body), body.get("data")];
    let token = scopes.iter().flatten().find_map(|scope| {
        ["token", "access_token"]
            .iter()
            .find_map(|key| scope.get(*key).and_then(Value::as_str))
    });
    let Some(token) = token.filter(|token| !token.is_empty()) else {
        return Err(OnboardingError::Auth("login response carried no token".into()));
    };

    let user = scopes
        .iter()
        .flatten()
        .find_map(|scope| scope.get("user"))
        .and_then(|user| serde_json::from_value(user.clone()).ok());

    Ok(LoginResponse {
        token: token.to_string(),
        message,
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn documented_shapes_are_read_directly() {
        let keyed = json!({ "states": [{ "id": 1, "name": "Texas" }] });
        assert_eq!(extract_list(&keyed, "states").unwrap().len(), 1);

        let wrapped = json!({ "data": [{ "id": 1, "name": "Texas" }] });
        assert_eq!(extract_list(&wrapped, "states").unwrap().len(), 1);

        let nested = json!({ "data": { "states": [{ "id": 1, "name": "Texas" }] } });
        assert_eq!(extract_list(&nested, "states").unwrap().len(), 1);
    }

    #[test]
    fn degraded_shape_uses_first_array() {
        let body = json!({ "meta": { "total": 2 }, "items": [{ "id": 1 }, { "id": 2 }] });
        assert_eq!(extract_list(&body, "countries").unwrap().len(), 2);
    }

    #[test]
    fn missing_list_is_an_error() {
        let body = json!({ "message": "ok" });
        assert!(matches!(
            extract_list(&body, "countries"),
            Err(OnboardingError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn only_active_locations_are_kept() {
        let body = json!({ "countries": [
            { "id": 1, "name": "United States", "iso2": "US", "active": true },
            { "id": 2, "name": "Atlantis", "active": false },
            { "id": 3, "name": "Canada", "iso2": "CA" },
            { "name": "missing id" }
        ]});
        let names: Vec<_> = parse_locations(&body, "countries")
            .unwrap()
            .into_iter()
            .map(|location| location.name)
            .collect();
        assert_eq!(names, vec!["United States", "Canada"]);
    }

    #[test]
    fn login_token_found_under_any_key() {
        let top = json!({ "token": "abc", "message": "welcome" });
        assert_eq!(parse_login(&top).unwrap().token, "abc");

        let nested = json!({
            "success": true,
            "data": { "access_token": "xyz", "user": { "id": 7, "email": "dana@reyesdental.com" } }
        });
        let login = parse_login(&nested).unwrap();
        assert_eq!(login.token, "xyz");
        assert_eq!(login.user.unwrap().email, "dana@reyesdental.com");
    }

    #[test]
    fn login_failure_is_an_auth_error() {
        let body = json!({ "success": false, "message": "Invalid credentials" });
        match parse_login(&body) {
            Err(OnboardingError::Auth(message)) => assert_eq!(message, "Invalid credentials"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_login(&json!({ "success": true })).is_err());
    }
}
