use std::net::{SocketAddr, ToSocketAddrs};

use native_tls::TlsConnector;
use tracing::{debug, info, warn};

use crate::smtp_verify::error::SmtpError;
use crate::smtp_verify::options::ProbeOptions;
use crate::smtp_verify::session::{SmtpReply, SmtpSession};
use crate::smtp_verify::types::{HostAttempt, MailboxStatus, ProbeReport};
use crate::smtp_verify::util::{default_sender, is_command_safe, local_hostname};
use crate::validator::validate_syntax;

/// Mailbox existence check against an ordered list of MX hosts.
pub trait MailboxProber {
    fn probe(&self, address: &str, mx_hosts: &[String]) -> MailboxStatus;
}

/// Probe `address` against `mx_hosts` with the default [`ProbeOptions`].
pub fn probe_mailbox(address: &str, mx_hosts: &[String]) -> MailboxStatus {
    if mx_hosts.is_empty() {
        return MailboxStatus::Unverifiable;
    }
    SmtpProber::new(ProbeOptions::default()).probe(address, mx_hosts)
}

/// Partial SMTP dialogue (EHLO, optional STARTTLS, MAIL FROM, RCPT TO, QUIT)
/// that never reaches DATA.
pub struct SmtpProber {
    options: ProbeOptions,
    helo: String,
    mail_from: String,
    connector: Option<TlsConnector>,
}

impl SmtpProber {
    pub fn new(options: ProbeOptions) -> Self {
        let helo = match options.helo_name.as_deref() {
            Some(name) if is_command_safe(name) => name.to_string(),
            Some(name) => {
                warn!(helo = ?name, "unusable HELO name, using local hostname");
                local_hostname()
            }
            None => local_hostname(),
        };
        let mail_from = match options.mail_from.as_deref() {
            Some(sender) if validate_syntax(sender) => sender.to_string(),
            Some(sender) => {
                warn!(sender = ?sender, "unusable MAIL FROM, using default sender");
                default_sender(&helo)
            }
            None => default_sender(&helo),
        };
        let connector = if options.starttls {
            build_connector(options.verify_tls)
        } else {
            None
        };
        Self {
            options,
            helo,
            mail_from,
            connector,
        }
    }

    pub fn helo_name(&self) -> &str {
        &self.helo
    }

    pub fn mail_from(&self) -> &str {
        &self.mail_from
    }

    /// An address that is not a single valid mailbox is never put on the
    /// wire: no host is contacted and the result is `Unverifiable`.
    pub fn probe_report(&self, address: &str, mx_hosts: &[String]) -> ProbeReport {
        if !validate_syntax(address) {
            warn!(address = ?address, "refusing to probe malformed address");
            return ProbeReport::unanswered(Vec::new());
        }
        probe_hosts(mx_hosts, |host| self.probe_host(address, host))
    }

    fn probe_host(&self, address: &str, host: &str) -> HostAttempt {
        let first = self.dialogue(address, host, self.connector.as_ref());
        let outcome = match first {
            Err(err @ SmtpError::TlsHandshake { .. }) => {
                // the handshake consumed the socket: reconnect and stay in plaintext
                warn!(host, error = %err, "STARTTLS failed, retrying without TLS");
                self.dialogue(address, host, None)
            }
            other => other,
        };
        match outcome {
            Ok(reply) => HostAttempt::Classified {
                status: MailboxStatus::from_rcpt_code(reply.code),
                code: reply.code,
            },
            Err(err) => HostAttempt::Failed(err),
        }
    }

    /// Runs one connection through RCPT TO and returns the RCPT reply.
    fn dialogue(
        &self,
        address: &str,
        host: &str,
        tls: Option<&TlsConnector>,
    ) -> Result<SmtpReply, SmtpError> {
        let addrs = resolve_addrs(host, self.options.port, self.options.ipv6)?;
        let mut session = SmtpSession::connect(
            host,
            &addrs,
            self.options.connect_timeout(),
            self.options.command_timeout(),
        )?;

        let banner = session.read_banner()?;
        if banner.code != 220 {
            session.quit().ok();
            return Err(SmtpError::Greeting { code: banner.code });
        }

        let ehlo_cmd = format!("EHLO {}", self.helo);
        let ehlo = session.send_command(&ehlo_cmd)?;
        if ehlo.is_positive_completion() {
            if let Some(connector) = tls.filter(|_| ehlo.has_capability("STARTTLS")) {
                let reply = session.starttls(connector)?;
                if session.is_tls() {
                    // capabilities are reset by the upgrade
                    session.send_command(&ehlo_cmd)?;
                } else {
                    debug!(host, code = reply.code, "STARTTLS refused, continuing in plaintext");
                }
            }
        } else {
            let helo = session.send_command(&format!("HELO {}", self.helo))?;
            if !helo.is_positive_completion() {
                session.quit().ok();
                return Err(SmtpError::HeloRejected { code: helo.code });
            }
        }

        let mail = session.send_command(&format!("MAIL FROM:<{}>", self.mail_from))?;
        if !mail.is_positive_completion() {
            debug!(host, code = mail.code, "MAIL FROM not accepted");
        }

        let rcpt = session.send_command(&format!("RCPT TO:<{address}>"))?;

        if let Err(err) = session.quit() {
            debug!(host, error = %err, "QUIT failed");
        }
        Ok(rcpt)
    }
}

impl MailboxProber for SmtpProber {
    fn probe(&self, address: &str, mx_hosts: &[String]) -> MailboxStatus {
        self.probe_report(address, mx_hosts).status
    }
}

/// Tries `hosts` in order. The first host whose dialogue completes decides
/// the result, even when it classifies as `Unverifiable`; failed hosts are
/// skipped.
pub(crate) fn probe_hosts<F>(hosts: &[String], mut attempt: F) -> ProbeReport
where
    F: FnMut(&str) -> HostAttempt,
{
    let mut tried = Vec::new();
    for host in hosts {
        tried.push(host.clone());
        match attempt(host) {
            HostAttempt::Classified { status, code } => {
                info!(host = %host, code, %status, "RCPT TO answered");
                return ProbeReport {
                    status,
                    hosts_tried: tried,
                    answered_by: Some(host.clone()),
                    rcpt_code: Some(code),
                };
            }
            HostAttempt::Failed(err) => {
                if err.is_transport() {
                    warn!(host = %host, error = %err, "SMTP transport failure");
                } else {
                    warn!(host = %host, error = %err, "SMTP protocol failure");
                }
            }
        }
    }
    ProbeReport::unanswered(tried)
}

fn resolve_addrs(host: &str, port: u16, allow_ipv6: bool) -> Result<Vec<SocketAddr>, SmtpError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|err| SmtpError::Resolve {
            host: host.to_string(),
            source: err,
        })?
        .filter(|addr| allow_ipv6 || addr.is_ipv4())
        .collect();
    if addrs.is_empty() {
        return Err(SmtpError::NoAddresses {
            host: host.to_string(),
        });
    }
    Ok(addrs)
}

fn build_connector(verify: bool) -> Option<TlsConnector> {
    let built = TlsConnector::builder()
        .danger_accept_invalid_certs(!verify)
        .danger_accept_invalid_hostnames(!verify)
        .build();
    match built {
        Ok(connector) => Some(connector),
        Err(err) => {
            warn!(error = %err, "TLS unavailable, STARTTLS disabled");
            None
        }
    }
}
