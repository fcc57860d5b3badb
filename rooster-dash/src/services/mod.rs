//! Outbound integrations: AI text combination, alert email and Slack

pub mod combiner;
pub mod mailer;
pub mod slack;

pub use combiner::{JoinCombiner, OpenAiCombiner, TextCombiner};
pub use mailer::SmtpNotifier;
pub use slack::{ReviewMessage, SlackClient};
