//! Caller-supplied extra maps carried by requests.

use std::collections::HashMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::packstream::Value;

/// Client identification sent with HELLO.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoltAgent {
    pub product: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_details: Option<String>,
}

impl BoltAgent {
    pub fn current() -> Self {
        Self {
            product: format!("bolt-driver/{}", env!("CARGO_PKG_VERSION")),
            platform: Some(format!(
                "{}; {}",
                std::env::consts::OS,
                std::env::consts::ARCH
            )),
            language: Some("Rust".to_string()),
            language_details: None,
        }
    }
}

impl Default for BoltAgent {
    fn default() -> Self {
        Self::current()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelloExtra {
    /// Should look like `Name/Version`.
    pub user_agent: String,
    pub patch_bolt: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_minimum_severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_disabled_categories: Option<Vec<String>>,
    pub bolt_agent: BoltAgent,
}

impl HelloExtra {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            patch_bolt: Vec::new(),
            routing: None,
            notifications_minimum_severity: None,
            notifications_disabled_categories: None,
            bolt_agent: BoltAgent::current(),
        }
    }

    pub fn routing(mut self, routing: HashMap<String, String>) -> Self {
        self.routing = Some(routing);
        self
    }
}

impl Default for HelloExtra {
    fn default() -> Self {
        Self::new(format!("bolt-driver/{}", env!("CARGO_PKG_VERSION")))
    }
}

/// Credentials sent with LOGON.
#[derive(Clone, PartialEq)]
pub struct Auth {
    pub scheme: String,
    pub parameters: HashMap<String, Value>,
}

impl Auth {
    pub const DEFAULT_USERNAME: &'static str = "neo4j";

    pub fn basic(username: Option<&str>, password: impl Into<String>) -> Self {
        let mut parameters = HashMap::new();
        parameters.insert(
            "principal".to_string(),
            Value::from(username.unwrap_or(Self::DEFAULT_USERNAME)),
        );
        parameters.insert("credentials".to_string(), Value::String(password.into()));
        Self::custom("basic", parameters)
    }

    /// Unauthenticated access, for servers with auth disabled.
    pub fn none() -> Self {
        Self::custom("none", HashMap::new())
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        let mut parameters = HashMap::new();
        parameters.insert("credentials".to_string(), Value::String(token.into()));
        Self::custom("bearer", parameters)
    }

    pub fn custom(scheme: impl Into<String>, parameters: HashMap<String, Value>) -> Self {
        Self {
            scheme: scheme.into(),
            parameters,
        }
    }
}

impl Default for Auth {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.parameters.keys().collect();
        keys.sort();
        f.debug_struct("Auth")
            .field("scheme", &self.scheme)
            .field("parameters", &keys)
            .finish_non_exhaustive()
    }
}

impl Serialize for Auth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.parameters.len() + 1 - usize::from(self.parameters.contains_key("scheme"));
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, value) in &self.parameters {
            if key != "scheme" {
                map.serialize_entry(key, value)?;
            }
        }
        map.serialize_entry("scheme", &self.scheme)?;
        map.end()
    }
}

/// Access mode of a transaction or auto-commit query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    #[serde(rename = "w")]
    Write,
    #[serde(rename = "r")]
    Read,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BeginExtra {
    pub bookmarks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_metadata: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imp_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_minimum_severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_disabled_categories: Option<Vec<String>>,
}

impl BeginExtra {
    pub fn db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    pub fn tx_timeout(mut self, millis: i64) -> Self {
        self.tx_timeout = Some(millis);
        self
    }
}

/// RUN carries the same keys as BEGIN.
pub type RunExtra = BeginExtra;

/// Number of records to pull or discard. `-1` means all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Amount(pub i64);

impl Amount {
    pub const ALL: Amount = Amount(-1);
}

impl From<i64> for Amount {
    fn from(n: i64) -> Self {
        Amount(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PullExtra {
    pub n: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qid: Option<i64>,
}

impl PullExtra {
    pub fn new(n: Amount, qid: Option<i64>) -> Self {
        Self { n, qid }
    }
}

pub type DiscardExtra = PullExtra;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteExtra {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imp_user: Option<String>,
}

/// Which driver API issued the work, reported through TELEMETRY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum TelemetryApi {
    ManagedTransaction = 0,
    ExplicitTransaction = 1,
    ImplicitTransaction = 2,
    DriverLevel = 3,
}

impl Serialize for TelemetryApi {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*self as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packstream::to_value;

    #[test]
    fn test_basic_auth_map() {
        let auth = Auth::basic(None, "secret");
        let map = to_value(&auth).unwrap().into_map().unwrap();
        assert_eq!(map.get("scheme"), Some(&Value::from("basic")));
        assert_eq!(map.get("principal"), Some(&Value::from("neo4j")));
        assert_eq!(map.get("credentials"), Some(&Value::from("secret")));
    }

    #[test]
    fn test_auth_debug_hides_credentials() {
        let text = format!("{:?}", Auth::bearer("tok-123"));
        assert!(text.contains("bearer"));
        assert!(!text.contains("tok-123"));
    }

    #[test]
    fn test_begin_extra_skips_unset_keys() {
        let extra = BeginExtra::default().db("movies").mode(Mode::Read);
        let map = to_value(&extra).unwrap().into_map().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("bookmarks"), Some(&Value::List(vec![])));
        assert_eq!(map.get("mode"), Some(&Value::from("r")));
        assert!(!map.contains_key("tx_timeout"));
    }

    #[test]
    fn test_pull_extra_amount_is_integer() {
        let map = to_value(&PullExtra::new(Amount::ALL, None))
            .unwrap()
            .into_map()
            .unwrap();
        assert_eq!(map.get("n"), Some(&Value::Integer(-1)));
        assert!(!map.contains_key("qid"));
    }

    #[test]
    fn test_hello_extra_shape() {
        let map = to_value(&HelloExtra::new("app/1.0")).unwrap().into_map().unwrap();
        assert_eq!(map.get("user_agent"), Some(&Value::from("app/1.0")));
        assert_eq!(map.get("patch_bolt"), Some(&Value::List(vec![])));
        assert!(!map.contains_key("routing"));
        let agent = map.get("bolt_agent").and_then(Value::as_map).unwrap();
        assert!(agent
            .get("product")
            .and_then(Value::as_str)
            .unwrap()
            .starts_with("bolt-driver/"));
    }

    #[test]
    fn test_telemetry_api_is_integer() {
        assert_eq!(
            to_value(&TelemetryApi::DriverLevel).unwrap(),
            Value::Integer(3)
        );
    }
}
