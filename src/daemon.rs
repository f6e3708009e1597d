use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{DaemonInfo, HostRecord};

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

const LOGIN_METHOD: &str = "daemon.login";
const INFO_METHOD: &str = "daemon.info";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConnectError {
    #[error("resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("connect {endpoint}: {source}")]
    Tcp {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("login rejected: {0}")]
    Login(String),
    #[error("login failed: {0}")]
    Protocol(String),
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum InfoError {
    #[error("info request failed: {0}")]
    Request(#[from] io::Error),
    #[error("daemon error: {0}")]
    Remote(String),
    #[error("malformed info reply: {0}")]
    Malformed(String),
}

/// Opens short-lived connections to a daemon. Implementations hold no
/// per-connection state so one client can serve every probe thread.
pub(crate) trait DaemonClient: Send + Sync {
    fn connect(&self, host: &HostRecord) -> Result<Box<dyn DaemonConnection>, ConnectError>;
}

pub(crate) trait DaemonConnection: Send {
    fn info(&mut self) -> Result<DaemonInfo, InfoError>;
    fn disconnect(self: Box<Self>);
}

#[derive(Debug, Clone)]
pub(crate) struct TcpDaemonClient {
    timeout: Duration,
}

impl TcpDaemonClient {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl DaemonClient for TcpDaemonClient {
    fn connect(&self, host: &HostRecord) -> Result<Box<dyn DaemonConnection>, ConnectError> {
        let endpoint = host.endpoint();
        let addrs = (host.address.as_str(), host.port)
            .to_socket_addrs()
            .map_err(|source| ConnectError::Resolve {
                endpoint: endpoint.clone(),
                source,
            })?;
        let mut last_err = None;
        let mut tcp = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    tcp = Some(stream);
                    break;
                }
                Err(err) => last_err = Some(err),
            }
        }
        let tcp = tcp.ok_or_else(|| ConnectError::Tcp {
            endpoint: endpoint.clone(),
            source: last_err
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses")),
        })?;
        let mut rpc = configure_stream(&tcp, self.timeout)
            .and_then(|()| RpcStream::new(tcp))
            .map_err(|source| ConnectError::Tcp {
                endpoint: endpoint.clone(),
                source,
            })?;
        let params = [
            Value::String(host.username.clone()),
            Value::String(host.password.clone()),
        ];
        match rpc.call(LOGIN_METHOD, &params) {
            Ok(_) => Ok(Box::new(TcpDaemonConnection { rpc })),
            Err(err) => {
                rpc.close();
                Err(match err {
                    CallError::Remote(message) => ConnectError::Login(message),
                    CallError::Io(err) => ConnectError::Protocol(err.to_string()),
                    CallError::Malformed(message) => ConnectError::Protocol(message),
                })
            }
        }
    }
}

/// Every read and write on a daemon stream is bounded by `timeout`.
fn configure_stream(tcp: &TcpStream, timeout: Duration) -> io::Result<()> {
    tcp.set_read_timeout(Some(timeout))?;
    tcp.set_write_timeout(Some(timeout))?;
    tcp.set_nodelay(true).ok();
    Ok(())
}

struct TcpDaemonConnection {
    rpc: RpcStream,
}

impl DaemonConnection for TcpDaemonConnection {
    fn info(&mut self) -> Result<DaemonInfo, InfoError> {
        let result = self.rpc.call(INFO_METHOD, &[]).map_err(|err| match err {
            CallError::Io(err) => InfoError::Request(err),
            CallError::Remote(message) => InfoError::Remote(message),
            CallError::Malformed(message) => InfoError::Malformed(message),
        })?;
        match result {
            Value::String(version) => Ok(DaemonInfo { version }),
            other => Err(InfoError::Malformed(format!("expected version string, got {other}"))),
        }
    }

    fn disconnect(self: Box<Self>) {
        self.rpc.close();
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    id: u64,
    method: &'a str,
    params: &'a [Value],
}

#[derive(Deserialize)]
struct RpcResponse {
    id: u64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    message: String,
}

enum CallError {
    Io(io::Error),
    Remote(String),
    Malformed(String),
}

/// Newline delimited JSON request/response framing over one TCP stream.
struct RpcStream {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    next_id: u64,
}

impl RpcStream {
    fn new(stream: TcpStream) -> io::Result<Self> {
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            next_id: 1,
        })
    }

    fn call(&mut self, method: &str, params: &[Value]) -> Result<Value, CallError> {
        let id = self.next_id;
        self.next_id += 1;
        let request = RpcRequest { id, method, params };
        let mut line = serde_json::to_string(&request)
            .map_err(|err| CallError::Malformed(err.to_string()))?;
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(CallError::Io)?;

        let mut reply = String::new();
        let read = self.reader.read_line(&mut reply).map_err(CallError::Io)?;
        if read == 0 {
            return Err(CallError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "daemon closed the connection",
            )));
        }
        let response: RpcResponse = serde_json::from_str(reply.trim_end())
            .map_err(|err| CallError::Malformed(err.to_string()))?;
        if response.id != id {
            return Err(CallError::Malformed(format!(
                "reply id {} does not match request {id}",
                response.id
            )));
        }
        if let Some(error) = response.error {
            return Err(CallError::Remote(error.message));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    fn close(self) {
        let _ = self.writer.shutdown(Shutdown::Both);
    }
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) enum MockBehavior {
    Online(String),
    InfoFails,
    ConnectFails,
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct MockDaemonClient {
    behaviors: std::sync::Mutex<HashMap<String, MockBehavior>>,
    delays: std::sync::Mutex<HashMap<String, Duration>>,
    connects: AtomicUsize,
    opened: AtomicUsize,
    disconnects: Arc<AtomicUsize>,
}

#[cfg(test)]
impl MockDaemonClient {
    pub(crate) fn set_behavior(&self, address: &str, behavior: MockBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(address.to_string(), behavior);
    }

    pub(crate) fn set_delay(&self, address: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(address.to_string(), delay);
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
impl DaemonClient for MockDaemonClient {
    fn connect(&self, host: &HostRecord) -> Result<Box<dyn DaemonConnection>, ConnectError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().unwrap().get(&host.address).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&host.address)
            .cloned()
            .unwrap_or(MockBehavior::ConnectFails);
        let version = match behavior {
            MockBehavior::ConnectFails => {
                return Err(ConnectError::Tcp {
                    endpoint: host.endpoint(),
                    source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
                });
            }
            MockBehavior::InfoFails => None,
            MockBehavior::Online(version) => Some(version),
        };
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            version,
            disconnects: Arc::clone(&self.disconnects),
        }))
    }
}

#[cfg(test)]
struct MockConnection {
    version: Option<String>,
    disconnects: Arc<AtomicUsize>,
}

#[cfg(test)]
impl DaemonConnection for MockConnection {
    fn info(&mut self) -> Result<DaemonInfo, InfoError> {
        match &self.version {
            Some(version) => Ok(DaemonInfo {
                version: version.clone(),
            }),
            None => Err(InfoError::Remote("info unavailable".to_string())),
        }
    }

    fn disconnect(self: Box<Self>) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}
