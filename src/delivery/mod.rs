//! Report delivery
//!
//! `DeliveryChannel` takes a recipient and a rendered report and reports
//! success or failure. The SMTP channel is the only production one.

pub mod smtp;

use serde::Serialize;

use crate::error::DeliveryError;
use crate::report::ReportArtifact;

pub use smtp::{build_report_message, parse_recipient, SmtpConfig, SmtpDelivery, REPORT_SUBJECT};

/// Confirmation of a delivered report
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    pub recipient: String,
    /// Transport-specific detail (e.g. SMTP response code)
    pub detail: String,
}

#[async_trait::async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(
        &self,
        recipient: &str,
        artifact: &ReportArtifact,
    ) -> Result<DeliveryReceipt, DeliveryError>;

    /// Get channel name for logging
    fn name(&self) -> &str;
}
