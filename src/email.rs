//! Delivers one-time password reset codes by email.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::{Error, auth::OTP_LIFETIME_MINUTES};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Sends a one-time code to a user.
#[async_trait]
pub trait OtpSender: Send + Sync {
    /// Email `code` to `to_email`.
    ///
    /// # Errors
    /// Returns [Error::EmailDelivery] if the message could not be sent.
    async fn send_otp(&self, to_email: &str, code: &str) -> Result<(), Error>;
}

/// The body the Resend API expects.
#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
}

/// An [OtpSender] backed by the Resend HTTP API.
pub struct ResendSender {
    api_key: String,
    from: String,
    client: Client,
}

impl ResendSender {
    /// Create a sender that authenticates with `api_key` and sends as `from`.
    ///
    /// # Errors
    /// Returns [Error::EmailDelivery] if the HTTP client could not be built.
    pub fn new(api_key: &str, from: &str) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|error| Error::EmailDelivery(format!("could not build HTTP client: {error}")))?;

        Ok(Self {
            api_key: api_key.to_owned(),
            from: from.to_owned(),
            client,
        })
    }
}

#[async_trait]
impl OtpSender for ResendSender {
    async fn send_otp(&self, to_email: &str, code: &str) -> Result<(), Error> {
        let request = ResendRequest {
            from: &self.from,
            to: [to_email],
            subject: format!("Tu código de verificación: {code}"),
            html: render_otp_email(code),
        };

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| Error::EmailDelivery(format!("Resend request failed: {error}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_owned());

            return Err(Error::EmailDelivery(format!(
                "Resend API error ({status}): {body}"
            )));
        }

        tracing::info!("Sent password reset code to {to_email}");

        Ok(())
    }
}

/// Render the HTML body of a password reset email.
pub fn render_otp_email(code: &str) -> String {
    format!(
        r#"<div style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 400px; margin: 0 auto; padding: 40px 20px;">
    <h2 style="color: #111; text-align: center; font-size: 20px;">Expense Tracker</h2>
    <div style="background: #f9fafb; border: 1px solid #e5e7eb; border-radius: 8px; padding: 30px; text-align: center;">
        <p style="color: #374151; font-size: 14px;">Usa este código para restablecer tu contraseña:</p>
        <div style="background: #111; color: #fff; font-size: 32px; font-weight: 700; letter-spacing: 8px; padding: 16px 24px; border-radius: 8px; display: inline-block;">{code}</div>
        <p style="color: #6b7280; font-size: 12px;">Este código expira en {OTP_LIFETIME_MINUTES} minutos.<br/>Si no solicitaste esto, ignora este email.</p>
    </div>
</div>"#
    )
}
