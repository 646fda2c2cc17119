//! Translation of launch form input into the node's scan launch document.
//!
//! List inputs arrive as free text and are split on whitespace. Sections of
//! the document only appear when their input carries at least one token.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const LOGIN_TYPE: &str = "UsernameAndPasswordLogin";
pub const NAMED_CONFIGURATION_TYPE: &str = "NamedConfiguration";
pub const SIMPLE_SCOPE_TYPE: &str = "SimpleScope";

/// JSON body posted to `{node}/scan`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfiguration {
    pub scan_callback: ScanCallback,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_logins: Option<Vec<ApplicationLogin>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_configurations: Option<Vec<NamedConfiguration>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<SimpleScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanCallback {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationLogin {
    pub password: String,
    #[serde(rename = "type")]
    pub login_type: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedConfiguration {
    pub name: String,
    #[serde(rename = "type")]
    pub configuration_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleScope {
    #[serde(rename = "type")]
    pub scope_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<ScopeRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<ScopeRule>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeRule {
    pub rule: String,
}

fn tokens(input: Option<&str>) -> Vec<&str> {
    input
        .map(|s| s.split_whitespace().collect())
        .unwrap_or_default()
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Parse one `username:password` token. The split happens at the first `:`.
fn parse_login(token: &str) -> Result<ApplicationLogin, ApiError> {
    let (username, password) = token.split_once(':').ok_or_else(|| {
        ApiError::validation(format!(
            "Credential '{}' must have the form username:password",
            token
        ))
    })?;

    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::validation("Credential username cannot be empty"));
    }

    Ok(ApplicationLogin {
        password: password.trim().to_string(),
        login_type: LOGIN_TYPE.to_string(),
        username: username.to_string(),
    })
}

fn scope_rules(input: Option<&str>) -> Option<Vec<ScopeRule>> {
    non_empty(
        tokens(input)
            .into_iter()
            .map(|rule| ScopeRule {
                rule: rule.to_string(),
            })
            .collect(),
    )
}

pub fn build_scan_configuration(
    callback_url: &str,
    credentials: Option<&str>,
    configurations: Option<&str>,
    scope_includes: Option<&str>,
    scope_excludes: Option<&str>,
    asset_urls: &[String],
) -> Result<ScanConfiguration, ApiError> {
    let logins = tokens(credentials)
        .into_iter()
        .map(parse_login)
        .collect::<Result<Vec<_>, _>>()?;

    let named = tokens(configurations)
        .into_iter()
        .map(|name| NamedConfiguration {
            name: name.to_string(),
            configuration_type: NAMED_CONFIGURATION_TYPE.to_string(),
        })
        .collect();

    let include = scope_rules(scope_includes);
    let exclude = scope_rules(scope_excludes);
    let scope = if include.is_some() || exclude.is_some() {
        Some(SimpleScope {
            scope_type: SIMPLE_SCOPE_TYPE.to_string(),
            include,
            exclude,
        })
    } else {
        None
    };

    Ok(ScanConfiguration {
        scan_callback: ScanCallback {
            url: callback_url.to_string(),
        },
        application_logins: non_empty(logins),
        scan_configurations: non_empty(named),
        scope,
        urls: non_empty(asset_urls.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CALLBACK: &str = "http://dash.local/api/callback/1";

    #[test]
    fn test_minimal_configuration_only_has_callback() {
        let config = build_scan_configuration(CALLBACK, None, Some("   "), Some(""), None, &[])
            .unwrap();

        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({ "scan_callback": { "url": CALLBACK } })
        );
    }

    #[test]
    fn test_full_configuration() {
        let urls = vec![
            "https://a.example.com".to_string(),
            "https://b.example.com/app".to_string(),
        ];
        let config = build_scan_configuration(
            CALLBACK,
            Some("admin:secret\n guest:pa:ss"),
            Some("Crawl-Fast  Audit-Lightweight"),
            Some("https://a.example.com/"),
            Some("https://a.example.com/logout https://a.example.com/admin"),
            &urls,
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({
                "scan_callback": { "url": CALLBACK },
                "application_logins": [
                    { "password": "secret", "type": "UsernameAndPasswordLogin", "username": "admin" },
                    { "password": "pa:ss", "type": "UsernameAndPasswordLogin", "username": "guest" }
                ],
                "scan_configurations": [
                    { "name": "Crawl-Fast", "type": "NamedConfiguration" },
                    { "name": "Audit-Lightweight", "type": "NamedConfiguration" }
                ],
                "scope": {
                    "type": "SimpleScope",
                    "include": [ { "rule": "https://a.example.com/" } ],
                    "exclude": [
                        { "rule": "https://a.example.com/logout" },
                        { "rule": "https://a.example.com/admin" }
                    ]
                },
                "urls": ["https://a.example.com", "https://b.example.com/app"]
            })
        );
    }

    #[test]
    fn test_scope_with_only_excludes() {
        let config =
            build_scan_configuration(CALLBACK, None, None, None, Some("/logout"), &[]).unwrap();
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["scope"]["type"], "SimpleScope");
        assert!(value["scope"].get("include").is_none());
        assert_eq!(value["scope"]["exclude"][0]["rule"], "/logout");
    }

    #[test]
    fn test_empty_password_is_allowed() {
        let config =
            build_scan_configuration(CALLBACK, Some("user:"), None, None, None, &[]).unwrap();
        let logins = config.application_logins.unwrap();

        assert_eq!(logins[0].username, "user");
        assert_eq!(logins[0].password, "");
    }

    #[test]
    fn test_malformed_credentials_are_rejected() {
        let missing_colon =
            build_scan_configuration(CALLBACK, Some("admin"), None, None, None, &[]);
        assert!(matches!(missing_colon, Err(ApiError::Validation(_))));

        let empty_user =
            build_scan_configuration(CALLBACK, Some(":secret"), None, None, None, &[]);
        assert!(matches!(empty_user, Err(ApiError::Validation(_))));
    }
}
