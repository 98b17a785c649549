use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use native_tls::{HandshakeError, TlsConnector, TlsStream};
use tracing::trace;

use crate::smtp_verify::error::SmtpError;

/// Longest reply line accepted, CRLF included.
const MAX_LINE: usize = 8192;
/// Most lines accepted in one multiline reply.
const MAX_REPLY_LINES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }

    /// EHLO keyword lookup; the first line is the server greeting, not a keyword.
    pub fn has_capability(&self, cap: &str) -> bool {
        self.lines.iter().skip(1).any(|line| {
            line.split_whitespace()
                .next()
                .map(|token| token.eq_ignore_ascii_case(cap))
                .unwrap_or(false)
        })
    }
}

#[derive(Debug)]
enum StreamState {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    Invalid,
}

#[derive(Debug)]
pub struct SmtpStream {
    state: StreamState,
    buffer: Vec<u8>,
}

impl SmtpStream {
    pub fn connect(
        addr: &SocketAddr,
        connect_timeout: Option<Duration>,
        command_timeout: Option<Duration>,
    ) -> Result<Self, SmtpError> {
        let stream = match connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(addr, timeout),
            None => TcpStream::connect(addr),
        }
        .map_err(|err| SmtpError::Connect {
            host: addr.to_string(),
            source: err,
        })?;
        stream
            .set_read_timeout(command_timeout)
            .map_err(|err| SmtpError::Io { source: err })?;
        stream
            .set_write_timeout(command_timeout)
            .map_err(|err| SmtpError::Io { source: err })?;
        Ok(Self {
            state: StreamState::Plain(stream),
            buffer: Vec::new(),
        })
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.state, StreamState::Tls(_))
    }

    /// Wraps the plain socket in TLS. A failed handshake consumes the socket
    /// and leaves the stream unusable.
    pub fn upgrade_tls(&mut self, domain: &str, connector: &TlsConnector) -> Result<(), SmtpError> {
        let state = std::mem::replace(&mut self.state, StreamState::Invalid);
        let plain = match state {
            StreamState::Plain(stream) => stream,
            StreamState::Tls(stream) => {
                self.state = StreamState::Tls(stream);
                return Ok(());
            }
            StreamState::Invalid => {
                return Err(SmtpError::Protocol("invalid stream state".into()));
            }
        };

        // the server may have pipelined bytes before the handshake; they are void
        self.buffer.clear();
        let tls = complete_handshake(connector, domain, plain)?;
        self.state = StreamState::Tls(Box::new(tls));
        Ok(())
    }

    pub fn send_command(&mut self, command: &str) -> Result<(), SmtpError> {
        let mut data = command.as_bytes().to_vec();
        data.extend_from_slice(b"\r\n");
        self.write_all(&data)
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<(), SmtpError> {
        let result = match &mut self.state {
            StreamState::Plain(stream) => stream.write_all(data).and_then(|()| stream.flush()),
            StreamState::Tls(stream) => stream.write_all(data).and_then(|()| stream.flush()),
            StreamState::Invalid => {
                return Err(SmtpError::Protocol("invalid stream state".into()));
            }
        };
        result.map_err(|err| SmtpError::Io { source: err })
    }

    pub fn read_reply(&mut self) -> Result<SmtpReply, SmtpError> {
        let mut lines = Vec::new();
        let mut code: Option<u16> = None;
        loop {
            let line = self.read_line()?;
            if line.len() < 3 || !line.is_char_boundary(3) {
                return Err(SmtpError::Protocol(format!("invalid reply: {line}")));
            }
            let parsed_code = line[..3]
                .parse::<u16>()
                .map_err(|_| SmtpError::Protocol(format!("invalid code in line: {line}")))?;
            if let Some(existing) = code {
                if existing != parsed_code {
                    return Err(SmtpError::Protocol(format!(
                        "inconsistent reply codes: {existing} vs {parsed_code}"
                    )));
                }
            } else {
                code = Some(parsed_code);
            }
            if lines.len() >= MAX_REPLY_LINES {
                return Err(SmtpError::Protocol("too many reply lines".into()));
            }
            let is_last = line.as_bytes().get(3) != Some(&b'-');
            let text = line.get(4..).unwrap_or_default().to_string();
            lines.push(text);
            if is_last {
                break;
            }
        }
        let code = code.ok_or_else(|| SmtpError::Protocol("reply without status code".into()))?;
        Ok(SmtpReply { code, lines })
    }

    fn read_line(&mut self) -> Result<String, SmtpError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                if pos >= MAX_LINE {
                    return Err(SmtpError::Protocol("line too long".into()));
                }
                let mut line = self.buffer.drain(..=pos).collect::<Vec<_>>();
                if line.ends_with(b"\r\n") {
                    line.truncate(line.len() - 2);
                } else if line.ends_with(b"\n") {
                    line.truncate(line.len() - 1);
                }
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }

            if self.buffer.len() >= MAX_LINE {
                return Err(SmtpError::Protocol("line too long".into()));
            }

            let mut buf = [0u8; 512];
            let read = match &mut self.state {
                StreamState::Plain(stream) => stream.read(&mut buf),
                StreamState::Tls(stream) => stream.read(&mut buf),
                StreamState::Invalid => {
                    return Err(SmtpError::Protocol("invalid stream state".into()));
                }
            };
            let read = read.map_err(|err| SmtpError::Io { source: err })?;
            if read == 0 {
                return Err(SmtpError::Io {
                    source: io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"),
                });
            }
            self.buffer.extend_from_slice(&buf[..read]);
        }
    }
}

fn complete_handshake(
    connector: &TlsConnector,
    domain: &str,
    stream: TcpStream,
) -> Result<TlsStream<TcpStream>, SmtpError> {
    let failed = |source| SmtpError::TlsHandshake {
        host: domain.to_string(),
        source,
    };
    match connector.connect(domain, stream) {
        Ok(tls) => Ok(tls),
        Err(HandshakeError::Failure(err)) => Err(failed(err)),
        Err(HandshakeError::WouldBlock(mut mid)) => loop {
            match mid.handshake() {
                Ok(tls) => break Ok(tls),
                Err(HandshakeError::Failure(err)) => break Err(failed(err)),
                Err(HandshakeError::WouldBlock(next)) => mid = next,
            }
        },
    }
}

/// One SMTP connection to one MX host, with the dialogue traced per host.
pub struct SmtpSession {
    host: String,
    stream: SmtpStream,
}

impl SmtpSession {
    /// Tries each address in order and keeps the first that connects.
    pub fn connect(
        host: &str,
        addresses: &[SocketAddr],
        connect_timeout: Option<Duration>,
        command_timeout: Option<Duration>,
    ) -> Result<Self, SmtpError> {
        let mut last_err = None;
        for addr in addresses {
            match SmtpStream::connect(addr, connect_timeout, command_timeout) {
                Ok(stream) => {
                    trace!(host, peer = %addr, "connected");
                    return Ok(Self {
                        host: host.to_string(),
                        stream,
                    });
                }
                Err(err) => {
                    trace!(host, peer = %addr, error = %err, "connect failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| SmtpError::NoAddresses {
            host: host.to_string(),
        }))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_tls(&self) -> bool {
        self.stream.is_tls()
    }

    pub fn read_banner(&mut self) -> Result<SmtpReply, SmtpError> {
        let reply = self.stream.read_reply()?;
        self.record_reply(&reply);
        Ok(reply)
    }

    pub fn send_command(&mut self, command: &str) -> Result<SmtpReply, SmtpError> {
        trace!(host = %self.host, "C: {command}");
        self.stream.send_command(command)?;
        let reply = self.stream.read_reply()?;
        self.record_reply(&reply);
        Ok(reply)
    }

    /// Sends `STARTTLS` and upgrades on a positive reply. A refusal is
    /// returned as-is and leaves the session in plaintext.
    pub fn starttls(&mut self, connector: &TlsConnector) -> Result<SmtpReply, SmtpError> {
        let reply = self.send_command("STARTTLS")?;
        if !reply.is_positive_completion() {
            return Ok(reply);
        }
        let host = self.host.clone();
        self.stream.upgrade_tls(&host, connector)?;
        Ok(reply)
    }

    pub fn quit(&mut self) -> Result<(), SmtpError> {
        trace!(host = %self.host, "C: QUIT");
        self.stream.send_command("QUIT")?;
        if let Ok(reply) = self.stream.read_reply() {
            self.record_reply(&reply);
        }
        Ok(())
    }

    fn record_reply(&self, reply: &SmtpReply) {
        if reply.lines.is_empty() {
            trace!(host = %self.host, "S: {}", reply.code);
        } else {
            for line in &reply.lines {
                trace!(host = %self.host, "S: {} {}", reply.code, line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    fn reply(code: u16, lines: &[&str]) -> SmtpReply {
        SmtpReply {
            code,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn capability_lookup_skips_greeting_line() {
        let ehlo = reply(250, &["mx.example STARTTLS ready", "PIPELINING", "starttls"]);
        assert!(ehlo.has_capability("STARTTLS"));
        let ehlo = reply(250, &["STARTTLS.example greets you", "SIZE 1000"]);
        assert!(!ehlo.has_capability("STARTTLS"));
        assert!(ehlo.has_capability("size"));
    }

    #[test]
    fn reply_classes() {
        assert!(reply(250, &[]).is_positive_completion());
        assert!(reply(451, &[]).is_transient_failure());
        assert!(reply(550, &[]).is_permanent_failure());
        assert!(!reply(354, &[]).is_positive_completion());
    }

    fn serve(bytes: impl AsRef<[u8]> + Send + 'static) -> (SocketAddr, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let _ = stream.write_all(bytes.as_ref());
                let _ = stream.flush();
            }
        });
        (addr, handle)
    }

    #[test]
    fn reads_multiline_reply() {
        let (addr, handle) = serve(b"250-mx.example\r\n250-SIZE 10\r\n250 STARTTLS\r\n");
        let timeout = Some(Duration::from_secs(5));
        let mut stream = SmtpStream::connect(&addr, timeout, timeout).expect("connect");
        let reply = stream.read_reply().expect("reply");
        assert_eq!(reply.code, 250);
        assert_eq!(reply.lines, vec!["mx.example", "SIZE 10", "STARTTLS"]);
        handle.join().expect("server thread");
    }

    #[test]
    fn malformed_reply_is_protocol_error() {
        let (addr, handle) = serve(b"hello there\r\n");
        let timeout = Some(Duration::from_secs(5));
        let mut stream = SmtpStream::connect(&addr, timeout, timeout).expect("connect");
        let err = stream.read_reply().expect_err("malformed");
        assert!(matches!(err, SmtpError::Protocol(_)), "{err}");
        handle.join().expect("server thread");
    }

    #[test]
    fn closed_connection_is_io_error() {
        let (addr, handle) = serve(b"");
        let timeout = Some(Duration::from_secs(5));
        let mut stream = SmtpStream::connect(&addr, timeout, timeout).expect("connect");
        handle.join().expect("server thread");
        let err = stream.read_reply().expect_err("eof");
        assert!(matches!(err, SmtpError::Io { .. }), "{err}");
    }

    #[test]
    fn overlong_line_is_protocol_error() {
        let mut banner = b"220 ".to_vec();
        banner.extend(std::iter::repeat_n(b'A', MAX_LINE + 100));
        banner.extend_from_slice(b"\r\n");
        let (addr, handle) = serve(banner);
        let timeout = Some(Duration::from_secs(5));
        let mut stream = SmtpStream::connect(&addr, timeout, timeout).expect("connect");
        let err = stream.read_reply().expect_err("line too long");
        assert!(matches!(&err, SmtpError::Protocol(msg) if msg == "line too long"), "{err}");
        drop(stream);
        handle.join().expect("server thread");
    }

    #[test]
    fn line_at_the_limit_is_accepted() {
        let mut banner = b"220 ".to_vec();
        banner.extend(std::iter::repeat_n(b'A', MAX_LINE - 8));
        banner.extend_from_slice(b"\r\n");
        let (addr, handle) = serve(banner);
        let timeout = Some(Duration::from_secs(5));
        let mut stream = SmtpStream::connect(&addr, timeout, timeout).expect("connect");
        let reply = stream.read_reply().expect("reply");
        assert_eq!(reply.code, 220);
        assert_eq!(reply.lines[0].len(), MAX_LINE - 8);
        handle.join().expect("server thread");
    }

    #[test]
    fn endless_multiline_reply_is_protocol_error() {
        let mut reply = "250-x\r\n".repeat(MAX_REPLY_LINES + 10);
        reply.push_str("250 end\r\n");
        let (addr, handle) = serve(reply);
        let timeout = Some(Duration::from_secs(5));
        let mut stream = SmtpStream::connect(&addr, timeout, timeout).expect("connect");
        let err = stream.read_reply().expect_err("too many lines");
        assert!(matches!(&err, SmtpError::Protocol(msg) if msg == "too many reply lines"), "{err}");
        drop(stream);
        handle.join().expect("server thread");
    }

    #[test]
    fn session_without_addresses_fails() {
        let err = SmtpSession::connect("mx.example", &[], None, None)
            .err()
            .expect("no addresses");
        assert!(matches!(err, SmtpError::NoAddresses { .. }));
    }
}
