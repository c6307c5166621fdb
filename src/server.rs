// src/server.rs
//! Network layer:
//! - listen for TCP connections
//! - decode requests (RESP arrays or inline text)
//! - run each command on the engine
//! - write the RESP-encoded reply back
use anyhow::Result;
use std::sync::Arc;

use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    task,
};
use tracing::{debug, error, info, warn};

use crate::{engine::Engine, protocol, store::KvStore};

/// Bind `addr` and serve until the listener fails.
pub async fn start<S>(addr: &str, engine: Arc<Engine<S>>) -> Result<()>
where
    S: KvStore + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "crab-set server listening");
    serve(listener, engine).await
}

/// Accept loop: one task per connection.
pub async fn serve<S>(listener: TcpListener, engine: Arc<Engine<S>>) -> Result<()>
where
    S: KvStore + 'static,
{
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(%peer, "accepted connection");

        let engine = engine.clone();
        tokio::spawn(async move {
            engine.metrics().client_connected();
            if let Err(err) = handle_connection(stream, engine.clone()).await {
                warn!(%peer, error = %err, "connection error");
            }
            engine.metrics().client_disconnected();
        });
    }
}

/// Read commands until the client disconnects or sends QUIT.
async fn handle_connection<S>(stream: TcpStream, engine: Arc<Engine<S>>) -> Result<()>
where
    S: KvStore + 'static,
{
    let peer = stream.peer_addr()?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    loop {
        let parts = match protocol::read_command(&mut reader).await {
            Ok(Some(parts)) => parts,
            Ok(None) => {
                debug!(%peer, "disconnected");
                break;
            }
            Err(err) => {
                // framing is lost, report and drop the connection
                let reply = protocol::Reply::error(format!("ERR Protocol error: {}", err));
                writer.write_all(&reply.encode()).await?;
                return Err(err);
            }
        };
        if parts.is_empty() {
            continue;
        }

        let quit = parts[0].eq_ignore_ascii_case(b"QUIT");

        // set operations block on store I/O and key locks
        let engine_ref = engine.clone();
        let reply = match task::spawn_blocking(move || engine_ref.execute(&parts)).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(%peer, error = %err, "command task failed");
                protocol::Reply::error("ERR internal error")
            }
        };

        writer.write_all(&reply.encode()).await?;
        if quit {
            break;
        }
    }

    Ok(())
}
