#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use libota::network::error::Error;
use libota::network::{Close, Connect, Connection, Read, TlsSession, Write};
use libota::storage::error::Error as StorageError;
use libota::storage::ota::OtaStorage;
use libota::system::{Clock, Delay};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// -------------------------
// Scripted update server
// -------------------------

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Request {
    pub raw: String,
    pub path: String,
    pub body: String,
}

impl Request {
    fn parse(raw: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(raw).into_owned();
        let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw.as_str(), ""));
        let path = head
            .lines()
            .next()
            .and_then(|line| line.split(' ').nth(1))
            .unwrap_or_default()
            .to_string();
        let body = body.to_string();
        Self { raw, path, body }
    }
}

pub type Responder = Box<dyn FnMut(&Request) -> Vec<u8>>;

pub struct ServerState {
    responder: Responder,
    pub requests: Vec<Request>,
    pub connects: usize,
    pub closes: usize,
    pub refuse_connect: bool,
    pub verify_flags: u32,
    pub handshake_stalls: u32,
    pub init_failures: u32,
    pub inits: usize,
    pub read_timeout_at: Option<usize>,
    rng: StdRng,
}

/// Connector handed to the client; clones share the same server.
#[derive(Clone)]
pub struct MockTls {
    pub server: Rc<RefCell<ServerState>>,
}

impl MockTls {
    pub fn new(seed: u64, responder: impl FnMut(&Request) -> Vec<u8> + 'static) -> Self {
        Self {
            server: Rc::new(RefCell::new(ServerState {
                responder: Box::new(responder),
                requests: Vec::new(),
                connects: 0,
                closes: 0,
                refuse_connect: false,
                verify_flags: 0,
                handshake_stalls: 0,
                init_failures: 0,
                inits: 0,
                read_timeout_at: None,
                rng: StdRng::seed_from_u64(seed),
            })),
        }
    }

    /// Serves the queued responses in order, then `500`.
    pub fn scripted(seed: u64, responses: Vec<Vec<u8>>) -> Self {
        let mut queue: VecDeque<Vec<u8>> = responses.into();
        Self::new(seed, move |_| queue.pop_front().unwrap_or_else(|| http_response(500, b"")))
    }

    pub fn requests(&self) -> Vec<Request> {
        self.server.borrow().requests.clone()
    }

    pub fn connects(&self) -> usize {
        self.server.borrow().connects
    }

    pub fn closes(&self) -> usize {
        self.server.borrow().closes
    }
}

impl Connect for MockTls {
    type Connection = MockSession;
    type Error = Error;

    fn init(&mut self, _host: &str, _port: u16) -> Result<(), Error> {
        let mut server = self.server.borrow_mut();
        server.inits += 1;
        if server.init_failures > 0 {
            server.init_failures -= 1;
            return Err(Error::HandshakeFailed);
        }
        Ok(())
    }

    fn connect(&mut self, _host: &str, _port: u16) -> Result<MockSession, Error> {
        let mut server = self.server.borrow_mut();
        if server.refuse_connect {
            return Err(Error::ConnectionRefused);
        }
        server.connects += 1;
        let seed = server.rng.r#gen();
        Ok(MockSession {
            server: Rc::clone(&self.server),
            written: Vec::new(),
            response: None,
            pos: 0,
            stalls_left: server.handshake_stalls,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

/// One TLS session: collects the request, then serves the response in
/// random-sized chunks with spurious `WouldBlock`s.
pub struct MockSession {
    server: Rc<RefCell<ServerState>>,
    written: Vec<u8>,
    response: Option<Vec<u8>>,
    pos: usize,
    stalls_left: u32,
    rng: StdRng,
}

impl Read for MockSession {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if self.rng.gen_bool(0.2) {
            return Err(Error::WouldBlock);
        }
        if self.response.is_none() {
            let request = Request::parse(&self.written);
            let mut server = self.server.borrow_mut();
            let response = (server.responder)(&request);
            server.requests.push(request);
            self.response = Some(response);
        }
        if self.server.borrow().read_timeout_at.is_some_and(|at| self.pos >= at) {
            return Err(Error::Timeout);
        }
        let response = self.response.as_deref().unwrap_or_default();
        let remaining = response.len() - self.pos;
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let n = self.rng.gen_range(1..=remaining.min(buf.len()).min(7));
        buf[..n].copy_from_slice(&response[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for MockSession {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if self.rng.gen_bool(0.2) {
            return Err(Error::WouldBlock);
        }
        let n = self.rng.gen_range(1..=buf.len().clamp(1, 11)).min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

impl Close for MockSession {
    type Error = Error;

    fn close(self) -> Result<(), Error> {
        self.server.borrow_mut().closes += 1;
        Ok(())
    }
}

impl Connection for MockSession {}

impl TlsSession for MockSession {
    fn handshake(&mut self) -> Result<(), Error> {
        if self.stalls_left > 0 {
            self.stalls_left -= 1;
            return Err(Error::WouldBlock);
        }
        Ok(())
    }

    fn verify_result(&self) -> u32 {
        self.server.borrow().verify_flags
    }
}

pub fn http_response(status: u16, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {} X\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

// -------------------------
// Firmware storage mock
// -------------------------

#[derive(Debug, Default)]
pub struct RecordingStorage {
    pub block_size: usize,
    pub refuse_begin: bool,
    pub fail_write_at: Option<usize>,
    pub fail_validation: bool,
    pub begins: usize,
    pub blocks: Vec<Vec<u8>>,
    pub validated: bool,
    pub aborted: usize,
    pub reboots: usize,
}

impl RecordingStorage {
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            block_size,
            ..Self::default()
        }
    }

    pub fn image(&self) -> Vec<u8> {
        self.blocks.concat()
    }
}

impl OtaStorage for RecordingStorage {
    type Error = StorageError;

    fn begin(&mut self) -> Result<usize, StorageError> {
        if self.refuse_begin {
            return Err(StorageError::NotReady);
        }
        self.begins += 1;
        self.blocks.clear();
        Ok(self.block_size)
    }

    fn write_block(&mut self, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_write_at == Some(self.blocks.len()) {
            return Err(StorageError::WriteError);
        }
        self.blocks.push(data.to_vec());
        Ok(())
    }

    fn end_and_validate(&mut self) -> Result<(), StorageError> {
        if self.fail_validation {
            return Err(StorageError::ValidationFailed);
        }
        self.validated = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted += 1;
    }

    fn reboot(&mut self) {
        self.reboots += 1;
    }
}

// -------------------------
// Time
// -------------------------

/// Shared millisecond counter; sleeping advances it.
#[derive(Debug, Clone, Default)]
pub struct FakeTime {
    pub now: Rc<Cell<u64>>,
    pub sleeps: Rc<RefCell<Vec<u32>>>,
}

impl FakeTime {
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for FakeTime {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl Delay for FakeTime {
    fn delay_ms(&mut self, ms: u32) {
        self.sleeps.borrow_mut().push(ms);
        self.advance(u64::from(ms));
    }
}

// -------------------------
// Image helpers
// -------------------------

pub const CURRENT_FW: &str = "11111111-1111-1111-1111-111111111111";
pub const TARGET_FW: &str = "22222222-2222-2222-2222-222222222222";

pub fn image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

#[derive(serde::Deserialize)]
pub struct BlockRequest<'a> {
    #[serde(rename = "targetFwUuid")]
    pub target: &'a str,
    pub offset: usize,
    #[serde(rename = "maxNumBytes")]
    pub max_num_bytes: usize,
}

pub fn block_request(body: &str) -> BlockRequest<'_> {
    serde_json_core::from_str(body).unwrap().0
}

/// Answers check-ins with `target` and serves `firmware` block requests.
pub fn update_server(target: &'static str, firmware: Vec<u8>) -> impl FnMut(&Request) -> Vec<u8> {
    move |request| {
        if request.path.ends_with("/devs/checkforupdate") {
            let body = format!("{}{:09}", target, firmware.len());
            http_response(200, body.as_bytes())
        } else {
            let block = block_request(&request.body);
            let end = (block.offset + block.max_num_bytes).min(firmware.len());
            http_response(200, &firmware[block.offset.min(end)..end])
        }
    }
}
