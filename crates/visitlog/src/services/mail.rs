use async_trait::async_trait;

use super::error::Result;
use super::Mailer;

/// Mail dispatcher that only records the message in the log. No outbound
/// mail transport is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        log::info!(
            "Queued confirmation mail to {}: '{}' ({} bytes)",
            to,
            subject,
            html_body.len()
        );
        log::trace!("Mail body: {}", html_body);
        Ok(())
    }
}
