//! SMTP delivery of subscription alerts

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rooster_common::Article;

use crate::notify::{NotifyError, Notifier};

/// Subject line of an alert email
pub fn alert_subject(article: &Article) -> String {
    format!("MarketRooster Alert: {}", article.title)
}

/// Plain-text alert body
pub fn alert_text(article: &Article) -> String {
    format!(
        "{}\n\nSource: {}\n\n{}\n\nRead more: {}\n",
        article.title, article.source, article.summary, article.url
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// HTML alert body
pub fn alert_html(article: &Article) -> String {
    format!(
        "<h1>{}</h1><p><b>Source:</b> {}</p><p>{}</p><a href=\"{}\">Read more</a>",
        escape_html(&article.title),
        escape_html(&article.source),
        escape_html(&article.summary),
        escape_html(&article.url)
    )
}

/// Alert notifier over an authenticated SMTP relay (STARTTLS on port 587)
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(
        smtp_host: &str,
        sender: &str,
        password: &str,
        sender_name: &str,
    ) -> Result<Self, NotifyError> {
        let from: Mailbox = format!("{} <{}>", sender_name, sender)
            .parse()
            .map_err(|e: lettre::address::AddressError| {
                NotifyError::InvalidAddress(sender.to_string(), e.to_string())
            })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .build();

        Ok(Self { transport, from })
    }

    fn build_message(&self, recipient: &str, article: &Article) -> Result<Message, NotifyError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e: lettre::address::AddressError| {
                NotifyError::InvalidAddress(recipient.to_string(), e.to_string())
            })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(alert_subject(article))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(alert_text(article)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(alert_html(article)),
                    ),
            )
            .map_err(|e| NotifyError::Message(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, recipient: &str, article: &Article) -> Result<(), NotifyError> {
        let message = self.build_message(recipient, article)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        tracing::info!(recipient = %recipient, article_id = article.id, "Alert email sent");
        Ok(())
    }
}
