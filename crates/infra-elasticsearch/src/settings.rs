// Connection settings: host list and auth mode resolution

use crate::error::ConnectError;
use reqwest::Url;
use std::fmt;

/// Authentication sent with every request
///
/// Precedence when several credentials are configured: API key > basic > none.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    ApiKey { id: String, secret: String },
    Basic { user: String, password: String },
    None,
}

impl AuthMode {
    /// Pick the auth mode from optional credential parts
    ///
    /// A pair only counts when both halves are present and non-empty.
    pub fn resolve(
        api_key_id: Option<&str>,
        api_key_secret: Option<&str>,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Self {
        if let (Some(id), Some(secret)) = (non_empty(api_key_id), non_empty(api_key_secret)) {
            return AuthMode::ApiKey {
                id: id.to_string(),
                secret: secret.to_string(),
            };
        }
        if let (Some(user), Some(password)) = (non_empty(user), non_empty(password)) {
            return AuthMode::Basic {
                user: user.to_string(),
                password: password.to_string(),
            };
        }
        AuthMode::None
    }

    pub fn describe(&self) -> &'static str {
        match self {
            AuthMode::ApiKey { .. } => "API Key",
            AuthMode::Basic { .. } => "Basic Auth",
            AuthMode::None => "no authentication",
        }
    }
}

// Credentials never reach the logs
impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::ApiKey { id, .. } => f
                .debug_struct("ApiKey")
                .field("id", id)
                .field("secret", &"***")
                .finish(),
            AuthMode::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"***")
                .finish(),
            AuthMode::None => f.write_str("None"),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Everything needed to reach the cluster
#[derive(Debug, Clone)]
pub struct ElasticsearchSettings {
    pub hosts: Vec<Url>,
    pub auth: AuthMode,
}

impl ElasticsearchSettings {
    /// Build settings from raw configuration values
    ///
    /// # Errors
    /// - ConnectError::NoHosts if no host is configured
    /// - ConnectError::InvalidHost if a host is not a valid URL
    pub fn from_parts(
        hosts: Option<&str>,
        api_key_id: Option<&str>,
        api_key_secret: Option<&str>,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, ConnectError> {
        Ok(Self {
            hosts: parse_hosts(hosts)?,
            auth: AuthMode::resolve(api_key_id, api_key_secret, user, password),
        })
    }

    pub fn host_names(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|h| h.as_str().trim_end_matches('/').to_string())
            .collect()
    }
}

/// Split a comma-separated host list into base URLs
///
/// Entries are trimmed, empty entries dropped, `http://` added when no scheme
/// is given. Every URL ends with `/` so request paths can be joined onto it.
pub fn parse_hosts(raw: Option<&str>) -> Result<Vec<Url>, ConnectError> {
    let raw = raw.unwrap_or_default();

    let mut hosts = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let with_scheme = if entry.contains("://") {
            entry.to_string()
        } else {
            format!("http://{entry}")
        };

        let mut url = Url::parse(&with_scheme).map_err(|e| ConnectError::InvalidHost {
            host: entry.to_string(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(ConnectError::InvalidHost {
                host: entry.to_string(),
                reason: "missing host".to_string(),
            });
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        hosts.push(url);
    }

    if hosts.is_empty() {
        return Err(ConnectError::NoHosts);
    }
    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_takes_precedence_over_basic() {
        let auth = AuthMode::resolve(Some("id"), Some("secret"), Some("elastic"), Some("pw"));
        assert_eq!(
            auth,
            AuthMode::ApiKey {
                id: "id".to_string(),
                secret: "secret".to_string()
            }
        );
        assert_eq!(auth.describe(), "API Key");
    }

    #[test]
    fn test_incomplete_api_key_falls_back_to_basic() {
        let auth = AuthMode::resolve(Some("id"), None, Some("elastic"), Some("pw"));
        assert_eq!(auth.describe(), "Basic Auth");

        let auth = AuthMode::resolve(Some("id"), Some(""), Some("elastic"), Some("pw"));
        assert_eq!(auth.describe(), "Basic Auth");
    }

    #[test]
    fn test_no_credentials() {
        assert_eq!(AuthMode::resolve(None, None, Some("elastic"), None), AuthMode::None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = AuthMode::resolve(None, None, Some("elastic"), Some("hunter2"));
        let printed = format!("{auth:?}");
        assert!(printed.contains("elastic"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_parse_hosts_normalizes_entries() {
        let hosts = parse_hosts(Some(" localhost:9200 , https://es.example.com:9243/ ,")).unwrap();
        let hosts: Vec<&str> = hosts.iter().map(|h| h.as_str()).collect();
        assert_eq!(
            hosts,
            vec!["http://localhost:9200/", "https://es.example.com:9243/"]
        );
    }

    #[test]
    fn test_parse_hosts_keeps_path_prefix() {
        let hosts = parse_hosts(Some("http://proxy.local/elastic")).unwrap();
        assert_eq!(hosts[0].as_str(), "http://proxy.local/elastic/");
        assert_eq!(
            hosts[0].join("orders/_search").unwrap().as_str(),
            "http://proxy.local/elastic/orders/_search"
        );
    }

    #[test]
    fn test_parse_hosts_missing() {
        assert!(matches!(parse_hosts(None), Err(ConnectError::NoHosts)));
        assert!(matches!(parse_hosts(Some(" , ")), Err(ConnectError::NoHosts)));
    }

    #[test]
    fn test_parse_hosts_invalid() {
        assert!(matches!(
            parse_hosts(Some("http://")),
            Err(ConnectError::InvalidHost { .. })
        ));
    }

    #[test]
    fn test_host_names_for_logging() {
        let settings =
            ElasticsearchSettings::from_parts(Some("localhost:9200"), None, None, None, None)
                .unwrap();
        assert_eq!(settings.host_names(), vec!["http://localhost:9200"]);
        assert_eq!(settings.auth, AuthMode::None);
    }
}
