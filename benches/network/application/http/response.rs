use criterion::{Criterion, Throughput};
use libota::network::application::http::Client;
use libota::network::application::http::response::ResponseParser;
use libota::network::error::Error;
use libota::network::{Close, Connect, Connection, Read, TlsSession, Write};
use std::hint::black_box;

const BLOCK_SIZE: usize = 1024;

/// Serves a canned response in chunks of at most `chunk` bytes.
struct MemorySession {
    response: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl MemorySession {
    fn new(response: &[u8], chunk: usize) -> Self {
        Self {
            response: response.to_vec(),
            pos: 0,
            chunk,
        }
    }
}

impl Read for MemorySession {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.chunk).min(self.response.len() - self.pos);
        buf[..n].copy_from_slice(&self.response[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for MemorySession {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for MemorySession {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for MemorySession {}

impl TlsSession for MemorySession {
    fn handshake(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn verify_result(&self) -> u32 {
        0
    }
}

struct MemoryConnector {
    response: Vec<u8>,
}

impl Connect for MemoryConnector {
    type Connection = MemorySession;
    type Error = Error;

    fn connect(&mut self, _host: &str, _port: u16) -> Result<MemorySession, Error> {
        Ok(MemorySession::new(&self.response, 256))
    }
}

fn block_response() -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 200 OK\r\nDate: Thu, 01 Jan 2026 00:00:00 GMT\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        BLOCK_SIZE
    )
    .into_bytes();
    out.extend((0..BLOCK_SIZE).map(|i| i as u8));
    out
}

pub fn bench_parse_head(c: &mut Criterion) {
    let response = block_response();
    c.bench_function("http_parse_head", |b| {
        b.iter(|| {
            let mut session = MemorySession::new(&response, 64);
            let mut parser = ResponseParser::new(&mut session);
            let status = parser.parse_status_line().unwrap();
            let length = parser.parse_content_length().unwrap();
            parser.skip_to_body().unwrap();
            black_box((status, length))
        })
    });
}

pub fn bench_read_block(c: &mut Criterion) {
    let response = block_response();
    let mut group = c.benchmark_group("http_read_block");
    group.throughput(Throughput::Bytes(BLOCK_SIZE as u64));
    for chunk in [1usize, 16, 256] {
        group.bench_function(format!("chunk_{}", chunk), |b| {
            let mut body = [0u8; BLOCK_SIZE + 1];
            b.iter(|| {
                let mut session = MemorySession::new(&response, chunk);
                let mut parser = ResponseParser::new(&mut session);
                parser.parse_status_line().unwrap();
                let length = parser.parse_content_length().unwrap();
                parser.skip_to_body().unwrap();
                black_box(parser.read_body(length, &mut body).unwrap())
            })
        });
    }
    group.finish();
}

pub fn bench_post_json(c: &mut Criterion) {
    let connector = MemoryConnector {
        response: block_response(),
    };
    let mut client = Client::new(connector, "api.otaupdate.net", 443).unwrap();
    client.init().unwrap();
    let body = r#"{"targetFwUuid":"22222222-2222-2222-2222-222222222222","offset":0,"maxNumBytes":1024}"#;
    let mut out = [0u8; BLOCK_SIZE + 1];

    c.bench_function("http_post_json_block", |b| {
        b.iter(|| {
            let response = client
                .post_json("/v1/devs/getfwdata", black_box(body), &mut out)
                .unwrap();
            black_box(response.content_length)
        })
    });
}
