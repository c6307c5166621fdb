// src/protocol.rs

//! RESP framing.
//!
//! Requests arrive either as a RESP array of bulk strings
//! (`*2\r\n$4\r\nSCARD\r\n$1\r\nS\r\n`) or as an inline text line
//! (`SCARD S\r\n`). Arguments stay raw bytes: set members are binary-safe.

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Longest bulk string accepted from a client.
const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Option<Vec<u8>>),
    Array(Vec<Vec<u8>>),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Simple("OK".into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    /// Serialize into RESP wire format.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Reply::Simple(s) => {
                out.push(b'+');
                out.extend_from_slice(s.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Reply::Error(e) => {
                out.push(b'-');
                out.extend_from_slice(e.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Reply::Integer(n) => {
                out.extend_from_slice(format!(":{}\r\n", n).as_bytes());
            }
            Reply::Bulk(None) => out.extend_from_slice(b"$-1\r\n"),
            Reply::Bulk(Some(data)) => encode_bulk(&mut out, data),
            Reply::Array(items) => {
                out.extend_from_slice(format!("*{}\r\n", items.len()).as_bytes());
                for item in items {
                    encode_bulk(&mut out, item);
                }
            }
        }
        out
    }
}

fn encode_bulk(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(format!("${}\r\n", data.len()).as_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
}

/// Read the next command. `Ok(None)` means the client closed the stream.
/// Blank inline lines yield an empty command, which callers skip.
pub async fn read_command<R>(reader: &mut R) -> Result<Option<Vec<Vec<u8>>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line).await? == 0 {
        return Ok(None);
    }
    trim_crlf(&mut line);

    if line.first() != Some(&b'*') {
        // inline command
        let parts = line
            .split(|b| b.is_ascii_whitespace())
            .filter(|p| !p.is_empty())
            .map(<[u8]>::to_vec)
            .collect();
        return Ok(Some(parts));
    }

    let count = parse_len(&line[1..]).context("invalid multibulk length")?;
    let mut parts = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            bail!("connection closed inside a command");
        }
        trim_crlf(&mut line);
        if line.first() != Some(&b'$') {
            bail!("expected '$', got {:?}", String::from_utf8_lossy(&line));
        }
        let len = parse_len(&line[1..]).context("invalid bulk length")?;
        if len > MAX_BULK_LEN {
            bail!("bulk length {} exceeds limit", len);
        }

        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await?;
        if &buf[len..] != b"\r\n" {
            bail!("bulk string not terminated by CRLF");
        }
        buf.truncate(len);
        parts.push(buf);
    }
    Ok(Some(parts))
}

fn trim_crlf(line: &mut Vec<u8>) {
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
}

fn parse_len(raw: &[u8]) -> Result<usize> {
    let s = std::str::from_utf8(raw)?;
    Ok(s.trim().parse::<usize>()?)
}
