//! Out-of-band control socket.
//!
//! Other recovery tools connect to a Unix stream socket and send line-oriented
//! commands that drive the dialog overlay:
//!
//! ```text
//! dialog show <text>
//! dialog dismiss
//! ```
//!
//! When a client disconnects, any dialog it may have raised is dismissed.

use std::io::{self, Read};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;

use socket2::{Domain, SockAddr, Socket, Type};

const MAX_MESSAGE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    ShowDialog(String),
    DismissDialog,
}

impl ControlCommand {
    /// Parse one line. Unknown or incomplete commands yield None.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n', '\0']);
        let mut fields = line.splitn(3, ' ');
        if fields.next()? != "dialog" {
            return None;
        }
        match (fields.next()?, fields.next()) {
            ("show", Some(text)) if !text.is_empty() => Some(ControlCommand::ShowDialog(text.to_string())),
            ("dismiss", _) => Some(ControlCommand::DismissDialog),
            _ => None,
        }
    }
}

/// Bind the control socket, replacing a stale socket file if present.
pub fn bind(path: &Path) -> Result<UnixListener, Box<dyn std::error::Error + Send + Sync>> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }

    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    socket.bind(&SockAddr::unix(path)?)?;
    socket.listen(4)?;
    socket.set_nonblocking(true)?;

    log::info!("Control socket listening on {}", path.display());
    Ok(socket.into())
}

/// One connected control client.
pub struct ControlClient {
    stream: UnixStream,
}

/// Result of servicing a readable client.
#[derive(Debug, PartialEq, Eq)]
pub enum ClientRead {
    Commands(Vec<ControlCommand>),
    Closed,
}

impl ControlClient {
    pub fn new(stream: UnixStream) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> &UnixStream {
        &self.stream
    }

    /// Read one message (up to 256 bytes) and parse every line in it.
    pub fn read_commands(&mut self) -> io::Result<ClientRead> {
        read_commands(&mut self.stream)
    }
}

fn read_commands(reader: &mut impl Read) -> io::Result<ClientRead> {
    let mut buf = [0u8; MAX_MESSAGE];
    let n = reader.read(&mut buf)?;
    if n == 0 {
        return Ok(ClientRead::Closed);
    }

    let text = String::from_utf8_lossy(&buf[..n]);
    let commands = text
        .split(['\n', '\0'])
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = ControlCommand::parse(line);
            if parsed.is_none() {
                log::warn!("Ignoring control message <{}>", line);
            }
            parsed
        })
        .collect();
    Ok(ClientRead::Commands(commands))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_show_keeps_spaces() {
        assert_eq!(
            ControlCommand::parse("dialog show Backing up /data, please wait\n"),
            Some(ControlCommand::ShowDialog("Backing up /data, please wait".into()))
        );
    }

    #[test]
    fn test_parse_dismiss() {
        assert_eq!(ControlCommand::parse("dialog dismiss"), Some(ControlCommand::DismissDialog));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(ControlCommand::parse("dialog"), None);
        assert_eq!(ControlCommand::parse("dialog show"), None);
        assert_eq!(ControlCommand::parse("menu show x"), None);
        assert_eq!(ControlCommand::parse(""), None);
    }

    #[test]
    fn test_read_multiple_lines() {
        let mut input: &[u8] = b"dialog show one\ndialog dismiss\nbogus\n";
        assert_eq!(
            read_commands(&mut input).unwrap(),
            ClientRead::Commands(vec![
                ControlCommand::ShowDialog("one".into()),
                ControlCommand::DismissDialog,
            ])
        );
    }

    #[test]
    fn test_read_eof_is_closed() {
        let mut input: &[u8] = b"";
        assert_eq!(read_commands(&mut input).unwrap(), ClientRead::Closed);
    }

    #[test]
    fn test_socket_roundtrip() {
        use std::io::Write;

        let path = std::env::temp_dir().join(format!("recovery-input-test-{}.sock", std::process::id()));
        let listener = bind(&path).unwrap();
        let mut writer = UnixStream::connect(&path).unwrap();
        writer.write_all(b"dialog show hello\n").unwrap();

        // the listener is nonblocking; retry until the connection is queued
        let stream = loop {
            match listener.accept() {
                Ok((stream, _)) => break stream,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::thread::yield_now(),
                Err(e) => panic!("accept failed: {}", e),
            }
        };
        stream.set_nonblocking(false).unwrap();
        let mut client = ControlClient::new(stream);
        assert_eq!(
            client.read_commands().unwrap(),
            ClientRead::Commands(vec![ControlCommand::ShowDialog("hello".into())])
        );
        let _ = std::fs::remove_file(&path);
    }
}
