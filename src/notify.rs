use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;
use crate::error::{EnumError, Result};
use crate::model::HostRecord;

/// Sends a plain-text summary of a completed run. Only the trigger
/// condition (`-e` plus at least one new host) is in scope here; the SMTP
/// transport itself is a thin wrapper over `lettre`.
pub async fn send_summary(config: &Config, apex: &str, new_hosts: &[HostRecord]) -> Result<()> {
    let host = config
        .email_host
        .clone()
        .ok_or(EnumError::EmailConfigIncomplete("email_host"))?;
    let port = config.email_port.unwrap_or(587);
    let username = config.email_username.clone().unwrap_or_default();
    let password = config.email_password.clone().unwrap_or_default();
    let sender = config
        .email_sender
        .clone()
        .ok_or(EnumError::EmailConfigIncomplete("email_sender"))?;
    let receiver = config
        .email_receiver
        .clone()
        .ok_or(EnumError::EmailConfigIncomplete("email_receiver"))?;

    let body = summary_body(apex, new_hosts);

    let message = Message::builder()
        .from(parse_mailbox(&sender)?)
        .to(parse_mailbox(&receiver)?)
        .subject(format!("subrecur: {} new host(s) for {apex}", new_hosts.len()))
        .body(body)
        .map_err(|e| EnumError::EmailSendFailed(e.to_string()))?;

    let creds = Credentials::new(username, password);
    let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
        .map_err(|e| EnumError::EmailSendFailed(e.to_string()))?
        .port(port)
        .credentials(creds)
        .build();

    mailer
        .send(message)
        .await
        .map_err(|e| EnumError::EmailSendFailed(e.to_string()))?;
    Ok(())
}

fn parse_mailbox(addr: &str) -> Result<Mailbox> {
    addr.parse()
        .map_err(|_| EnumError::EmailConfigIncomplete("a valid email_sender/email_receiver address"))
}

fn summary_body(apex: &str, new_hosts: &[HostRecord]) -> String {
    let mut body = format!("Enumeration of {apex} found {} new host(s):\n\n", new_hosts.len());
    for host in new_hosts {
        let ips = host
            .ips
            .iter()
            .map(|ip| ip.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        body.push_str(&format!("{}  [{}]\n", host.name, ips));
    }
    body
}
