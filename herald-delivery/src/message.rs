//! Message assembly
//!
//! Turns (template, recipient, campaign) into the subject and body handed
//! to the transport: placeholder substitution for both, plus the
//! unsubscribe footer carrying a minted opt-out link.

use chrono::{DateTime, Utc};
use herald_catalog::{Campaign, Template, substitute};
use herald_common::Recipient;
use herald_compliance::{TokenMinter, opt_out_url};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sender identity and footer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Name shown in the compliance footer.
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Subject used when a campaign's descriptor does not set one. May
    /// contain `{{placeholders}}`.
    #[serde(default = "default_subject")]
    pub default_subject: String,

    /// Base URL of the external opt-out endpoint. Without it no link can
    /// be minted and the footer falls back to reply instructions.
    #[serde(default)]
    pub opt_out_base_url: Option<String>,

    /// Whether to append the compliance footer at all.
    #[serde(default = "default_footer_enabled")]
    pub footer_enabled: bool,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            from_name: default_from_name(),
            default_subject: default_subject(),
            opt_out_base_url: None,
            footer_enabled: default_footer_enabled(),
        }
    }
}

fn default_from_name() -> String {
    "Professional Outreach".to_string()
}

fn default_subject() -> String {
    "A note from {{organization}}".to_string()
}

const fn default_footer_enabled() -> bool {
    true
}

/// A message ready for the transport.
#[derive(Debug, Clone)]
pub struct AssembledMessage {
    pub subject: String,
    pub body: String,
    /// Placeholder names left unresolved in subject or body; flagged in
    /// validation output, never a crash.
    pub unresolved: Vec<String>,
}

/// Builds transport-ready messages for one configured sender.
#[derive(Debug, Clone)]
pub struct MessageAssembler {
    config: SenderConfig,
    minter: Option<TokenMinter>,
}

impl MessageAssembler {
    #[must_use]
    pub const fn new(config: SenderConfig, minter: Option<TokenMinter>) -> Self {
        Self { config, minter }
    }

    /// Render subject and body for one recipient and append the footer.
    #[must_use]
    pub fn assemble(
        &self,
        campaign: &Campaign,
        template: &Template,
        recipient: &Recipient,
        now: DateTime<Utc>,
    ) -> AssembledMessage {
        let subject_template = campaign
            .subject
            .as_deref()
            .unwrap_or(&self.config.default_subject);
        let subject = substitute(subject_template, recipient);
        let rendered = template.render(recipient);

        let mut unresolved = subject.unresolved;
        for name in rendered.unresolved {
            if !unresolved.contains(&name) {
                unresolved.push(name);
            }
        }

        let mut body = rendered.body;
        if self.config.footer_enabled {
            body.push_str(&self.footer(campaign, recipient, now));
        }

        AssembledMessage {
            subject: subject.body,
            body,
            unresolved,
        }
    }

    fn footer(&self, campaign: &Campaign, recipient: &Recipient, now: DateTime<Utc>) -> String {
        let mut footer = format!(
            "\n\n--\nYou received this as professional outreach from {}.\n",
            self.config.from_name
        );

        match self.opt_out_link(campaign, recipient, now) {
            Some(url) => footer.push_str(&format!("To opt out: {url}\n")),
            None => {
                footer.push_str("To opt out: reply with \"UNSUBSCRIBE\" in the subject line.\n");
            }
        }

        footer.push_str("We honor all opt-out requests immediately.\n");
        footer
    }

    fn opt_out_link(
        &self,
        campaign: &Campaign,
        recipient: &Recipient,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let minter = self.minter.as_ref()?;
        let base = self.config.opt_out_base_url.as_deref()?;

        let token = minter.mint(&recipient.email, campaign.id.as_str(), now);
        match opt_out_url(base, &recipient.email, campaign.id.as_str(), &token) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!(base, error = %e, "Opt-out base URL invalid, omitting link");
                None
            }
        }
    }
}
