//! Warehouse types

use serde::Serialize;

/// A statement the warehouse refused to run, or could not be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// SQLSTATE, when the server reported one
    pub code: Option<String>,
    /// Server or client message
    pub message: String,
}

impl LoadFailure {
    /// Create a failure
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} (SQLSTATE {code})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<tokio_postgres::Error> for LoadFailure {
    fn from(e: tokio_postgres::Error) -> Self {
        match e.as_db_error() {
            Some(db) => Self::new(Some(db.code().code().to_string()), db.message()),
            None => Self::new(None, e.to_string()),
        }
    }
}

/// Result of one COPY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Data committed
    Loaded,
    /// Warehouse rejected the data; logged and not retried
    SoftSkip,
}

/// How a load failure is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorClass {
    /// Data problem: log and drop the chunk
    Soft,
    /// Anything else: fail the chunk so it is retried
    Fatal,
}

/// Credentials placed in the COPY statement
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Static access key pair
    Keys {
        /// Access key id
        access_key_id: String,
        /// Secret access key
        secret_access_key: String,
    },
    /// Role assumed by the warehouse
    IamRole(String),
}

impl Credentials {
    /// The `CREDENTIALS` string
    pub fn render(&self) -> String {
        match self {
            Credentials::Keys {
                access_key_id,
                secret_access_key,
            } => format!(
                "aws_access_key_id={access_key_id};aws_secret_access_key={secret_access_key}"
            ),
            Credentials::IamRole(arn) => format!("aws_iam_role={arn}"),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Keys { access_key_id, .. } => f
                .debug_struct("Keys")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"********")
                .finish(),
            Credentials::IamRole(arn) => f.debug_tuple("IamRole").field(arn).finish(),
        }
    }
}
