//! COPY statement rendering

use super::types::Credentials;
use crate::config::SinkConfig;
use crate::error::{Error, Result};
use crate::schema::TableIdentifier;

/// Placeholder that replaces credentials in logged statements
pub const REDACTED: &str = "********";

/// Per-loader COPY template; only the object key varies between loads
#[derive(Debug, Clone)]
pub struct CopyTemplate {
    /// Target table
    table: TableIdentifier,
    /// Staging bucket
    bucket: String,
    /// Credentials for reading the bucket
    credentials: Credentials,
    /// Field delimiter
    delimiter: char,
    /// DATEFORMAT value
    date_format: String,
    /// TIMEFORMAT value
    time_format: String,
    /// Options after ESCAPE
    base_options: String,
    /// Options appended last
    extra_options: String,
}

impl CopyTemplate {
    /// Create a template with `auto` date/time formats and no options
    pub fn new(
        table: TableIdentifier,
        bucket: impl Into<String>,
        credentials: Credentials,
        delimiter: char,
    ) -> Self {
        Self {
            table,
            bucket: bucket.into(),
            credentials,
            delimiter,
            date_format: "auto".to_string(),
            time_format: "auto".to_string(),
            base_options: String::new(),
            extra_options: String::new(),
        }
    }

    /// Build the template described by a sink config
    pub fn from_config(config: &SinkConfig) -> Result<Self> {
        let credentials = match &config.load.iam_role {
            Some(arn) => Credentials::IamRole(arn.clone()),
            None => match (&config.storage.access_key_id, &config.storage.secret_access_key) {
                (Some(id), Some(secret)) => Credentials::Keys {
                    access_key_id: id.clone(),
                    secret_access_key: secret.clone(),
                },
                _ => return Err(Error::missing_field("storage.secret_access_key")),
            },
        };

        Ok(Self::new(
            config.warehouse.table_identifier(),
            &config.storage.bucket,
            credentials,
            config.format.delimiter()?,
        )
        .with_formats(&config.load.date_format, &config.load.time_format)
        .with_options(&config.load.base_options, &config.load.extra_options))
    }

    /// Set DATEFORMAT and TIMEFORMAT
    #[must_use]
    pub fn with_formats(mut self, date_format: &str, time_format: &str) -> Self {
        self.date_format = date_format.to_string();
        self.time_format = time_format.to_string();
        self
    }

    /// Set the options following ESCAPE
    #[must_use]
    pub fn with_options(mut self, base_options: &str, extra_options: &str) -> Self {
        self.base_options = base_options.trim().to_string();
        self.extra_options = extra_options.trim().to_string();
        self
    }

    /// Target table
    pub fn table(&self) -> &TableIdentifier {
        &self.table
    }

    /// `s3://bucket/key`
    pub fn uri(&self, key: &str) -> String {
        format!("s3://{}/{key}", self.bucket)
    }

    /// The statement to execute for `key`
    pub fn render(&self, key: &str) -> String {
        self.build(key, &self.credentials.render())
    }

    /// The statement for `key` with credentials masked, safe to log
    pub fn render_redacted(&self, key: &str) -> String {
        self.build(key, REDACTED)
    }

    fn build(&self, key: &str, credentials: &str) -> String {
        let mut sql = format!(
            "COPY {} FROM '{}' CREDENTIALS '{}' delimiter '{}' \
             DATEFORMAT '{}' TIMEFORMAT '{}' GZIP ESCAPE",
            self.table,
            quote(&self.uri(key)),
            quote(credentials),
            delimiter_literal(self.delimiter),
            quote(&self.date_format),
            quote(&self.time_format),
        );
        for options in [&self.base_options, &self.extra_options] {
            if !options.is_empty() {
                sql.push(' ');
                sql.push_str(options);
            }
        }
        sql.push(';');
        sql
    }
}

/// Double single quotes for use inside a string literal
fn quote(value: &str) -> String {
    value.replace('\'', "''")
}

/// Delimiter as written inside `delimiter '...'`
fn delimiter_literal(delimiter: char) -> String {
    match delimiter {
        '\t' => "\\t".to_string(),
        '\'' => "''".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn template() -> CopyTemplate {
        CopyTemplate::new(
            TableIdentifier::new(Some("public".to_string()), "events"),
            "staging",
            Credentials::Keys {
                access_key_id: "AKIA".to_string(),
                secret_access_key: "s3cr3t".to_string(),
            },
            '\t',
        )
        .with_options("TRUNCATECOLUMNS", "")
    }

    #[test]
    fn test_render() {
        assert_eq!(
            template().render("logs/20240309-0705_00.gz"),
            "COPY public.events FROM 's3://staging/logs/20240309-0705_00.gz' \
             CREDENTIALS 'aws_access_key_id=AKIA;aws_secret_access_key=s3cr3t' \
             delimiter '\\t' DATEFORMAT 'auto' TIMEFORMAT 'auto' GZIP ESCAPE TRUNCATECOLUMNS;"
        );
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let sql = template().render_redacted("k_00.gz");
        assert!(!sql.contains("s3cr3t"));
        assert!(!sql.contains("AKIA"));
        assert!(sql.contains("CREDENTIALS '********'"));
    }

    #[test]
    fn test_iam_role_and_extra_options() {
        let sql = CopyTemplate::new(
            TableIdentifier::table("events"),
            "staging",
            Credentials::IamRole("arn:aws:iam::1:role/load".to_string()),
            ',',
        )
        .with_formats("YYYY-MM-DD", "epochsecs")
        .with_options("", " MAXERROR 10 ")
        .render("k_00.gz");

        assert_eq!(
            sql,
            "COPY events FROM 's3://staging/k_00.gz' \
             CREDENTIALS 'aws_iam_role=arn:aws:iam::1:role/load' delimiter ',' \
             DATEFORMAT 'YYYY-MM-DD' TIMEFORMAT 'epochsecs' GZIP ESCAPE MAXERROR 10;"
        );
    }

    #[test]
    fn test_quotes_are_doubled() {
        assert_eq!(delimiter_literal('\''), "''");
        assert_eq!(quote("it's"), "it''s");
        let sql = template().render("o'brien_00.gz");
        assert!(sql.contains("'s3://staging/o''brien_00.gz'"));
    }

    #[test]
    fn test_debug_masks_secret() {
        let debug = format!("{:?}", template());
        assert!(!debug.contains("s3cr3t"));
    }
}
