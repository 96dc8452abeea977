//! Rendering check results into a chat webhook message.
//!
//! The payload follows the incoming-webhook shape used by Discord-style chat
//! services: a `content` string plus a list of embeds, each with a title, a
//! description and name/value fields.

use std::fmt;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::check::CheckResult;

pub const EMBED_TITLE: &str = "Server Status";

const PASS_GLYPH: &str = "✅";
const FAIL_GLYPH: &str = "❌";

/// How the embed description is worded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionFormat {
    /// `"<N> server(s) as of <YYYY-MM-DD HH:MM:SS>"`
    #[default]
    Timestamped,
    /// `"<N> server(s)"`
    Plain,
}

impl fmt::Display for DescriptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamped => write!(f, "timestamped"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub fields: Vec<EmbedField>,
}

/// The JSON body POSTed to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub content: String,
    pub embeds: Vec<Embed>,
}

impl WebhookPayload {
    pub fn field_count(&self) -> usize {
        self.embeds.iter().map(|e| e.fields.len()).sum()
    }
}

/// Build the report message for `results`, keeping their order.
pub fn render<Tz>(
    results: &[CheckResult],
    format: DescriptionFormat,
    generated_at: &DateTime<Tz>,
) -> WebhookPayload
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let fields = results.iter().map(render_field).collect();

    WebhookPayload {
        content: String::new(),
        embeds: vec![Embed {
            title: EMBED_TITLE.to_string(),
            description: describe(results.len(), format, generated_at),
            fields,
        }],
    }
}

fn describe<Tz>(count: usize, format: DescriptionFormat, generated_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match format {
        DescriptionFormat::Timestamped => format!(
            "{} server(s) as of {}",
            count,
            generated_at.format("%Y-%m-%d %H:%M:%S")
        ),
        DescriptionFormat::Plain => format!("{} server(s)", count),
    }
}

fn render_field(result: &CheckResult) -> EmbedField {
    let glyph = if result.matched { PASS_GLYPH } else { FAIL_GLYPH };
    let status = match result.observed_status {
        Some(code) => code.to_string(),
        None => "unreachable".to_string(),
    };

    EmbedField {
        name: result.url.clone(),
        value: format!(
            "**Response Time**: {}ms\n**Status**: {} {}",
            result.response_time_ms, status, glyph
        ),
    }
}
