//! Per-request access log records.
//!
//! One [`AccessRecord`] is emitted for every dispatched request, on the
//! [`ACCESS_TARGET`] tracing target. The message is the Common Log Format
//! line extended with referrer and user agent:
//!
//! ```text
//! 10.0.0.7 - - [19/Oct/2026:14:03:11 +0200] "GET /users HTTP/1.1" 200 512 "-" "curl/8.5.0"
//! ```

use chrono::{DateTime, FixedOffset, Local};
use conduit_core::headers;
use conduit_core::RequestContext;
use conduit_telemetry::ACCESS_TARGET;

/// Longest referrer or user agent kept in a record, in characters.
pub const MAX_HEADER_CHARS: usize = 255;

const CLF_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// What the access log knows about one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    /// Client address.
    pub remote_addr: Option<String>,
    /// When the request was received.
    pub timestamp: DateTime<FixedOffset>,
    /// Method as sent by the client.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Protocol, e.g. `HTTP/1.1`.
    pub protocol: String,
    /// Response status code.
    pub status: u16,
    /// Body bytes written.
    pub bytes: u64,
    /// `Referer` header, truncated.
    pub referrer: Option<String>,
    /// `User-Agent` header, truncated.
    pub user_agent: Option<String>,
}

impl AccessRecord {
    /// Captures the request side of a record. Status and size are zero until
    /// [`AccessRecord::with_outcome`] is called.
    pub fn from_context(ctx: &RequestContext) -> Self {
        Self {
            remote_addr: ctx.remote_addr().map(str::to_string),
            timestamp: Local::now().fixed_offset(),
            method: ctx.method_name().to_string(),
            path: ctx.path().to_string(),
            protocol: ctx.protocol().to_string(),
            status: 0,
            bytes: 0,
            referrer: ctx.get_header(headers::REFERRER).map(truncate),
            user_agent: ctx.get_header(headers::USER_AGENT).map(truncate),
        }
    }

    /// Records the response side.
    #[must_use]
    pub const fn with_outcome(mut self, status: u16, bytes: u64) -> Self {
        self.status = status;
        self.bytes = bytes;
        self
    }

    /// Renders the record as an extended Common Log Format line.
    pub fn to_clf(&self) -> String {
        let bytes = if self.bytes == 0 {
            "-".to_string()
        } else {
            self.bytes.to_string()
        };
        format!(
            "{} - - [{}] \"{} {} {}\" {} {} \"{}\" \"{}\"",
            self.remote_addr.as_deref().unwrap_or("-"),
            self.timestamp.format(CLF_TIME_FORMAT),
            self.method,
            self.path,
            self.protocol,
            self.status,
            bytes,
            self.referrer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    /// Emits the record at `INFO` on the access log target.
    pub fn emit(&self) {
        tracing::info!(
            target: ACCESS_TARGET,
            remote_addr = self.remote_addr.as_deref().unwrap_or("-"),
            status = self.status,
            method = %self.method,
            path = %self.path,
            protocol = %self.protocol,
            bytes = self.bytes,
            referrer = self.referrer.as_deref().unwrap_or("-"),
            user_agent = self.user_agent.as_deref().unwrap_or("-"),
            "{}",
            self.to_clf()
        );
    }
}

fn truncate(value: &str) -> String {
    value.chars().take(MAX_HEADER_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use http::HeaderValue;

    fn fixed_time() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 14, 3, 11)
            .unwrap()
    }

    #[test]
    fn test_clf_line() {
        let ctx = RequestContext::new("GET", "/users")
            .with_remote_addr("10.0.0.7")
            .with_header(headers::USER_AGENT, HeaderValue::from_static("curl/8.5.0"));
        let mut record = AccessRecord::from_context(&ctx).with_outcome(200, 512);
        record.timestamp = fixed_time();

        assert_eq!(
            record.to_clf(),
            "10.0.0.7 - - [19/Oct/2026:14:03:11 +0200] \"GET /users HTTP/1.1\" 200 512 \"-\" \"curl/8.5.0\""
        );
    }

    #[test]
    fn test_missing_values_render_as_dash() {
        let ctx = RequestContext::new("POST", "/submit");
        let mut record = AccessRecord::from_context(&ctx).with_outcome(302, 0);
        record.timestamp = fixed_time();

        assert_eq!(
            record.to_clf(),
            "- - - [19/Oct/2026:14:03:11 +0200] \"POST /submit HTTP/1.1\" 302 - \"-\" \"-\""
        );
    }

    #[test]
    fn test_long_headers_are_truncated() {
        let long = "a".repeat(400);
        let ctx = RequestContext::new("GET", "/")
            .with_header(headers::REFERRER, HeaderValue::from_str(&long).unwrap())
            .with_header(headers::USER_AGENT, HeaderValue::from_static("short"));
        let record = AccessRecord::from_context(&ctx);

        assert_eq!(record.referrer.as_deref().map(str::len), Some(MAX_HEADER_CHARS));
        assert_eq!(record.user_agent.as_deref(), Some("short"));
    }

    #[test]
    fn test_emit_without_subscriber() {
        AccessRecord::from_context(&RequestContext::new("GET", "/")).emit();
    }
}
