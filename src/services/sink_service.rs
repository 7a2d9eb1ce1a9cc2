use std::{io, net::SocketAddr, time::Duration};

use tokio::{net::UdpSocket, sync::watch, task};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::errors::FormError;
use crate::persistence::JsonStore;
use crate::services::form_service;
use crate::state::record;

/// Pause after a failed `recv_from` so a persistent socket error cannot spin.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Receive loop that turns datagrams into store entries.
///
/// Datagrams are handled one at a time: the previous one is fully decoded and
/// written before the next `recv_from`, which keeps the store single-writer.
pub struct DatagramSink {
    socket: UdpSocket,
    buffer_size: usize,
    store: JsonStore,
}

impl DatagramSink {
    pub async fn bind(cfg: &AppConfig, store: JsonStore) -> io::Result<Self> {
        let socket = UdpSocket::bind(cfg.sink_addr).await?;
        Ok(Self {
            socket,
            buffer_size: cfg.recv_buffer_size,
            store,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Run until `shutdown` flips (or its sender is dropped). The socket is
    /// closed when this returns.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let addr = self.local_addr().ok();
        let mut buf = vec![0u8; self.buffer_size];
        info!("Datagram sink listening on {:?}", addr);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => {
                        if len == buf.len() {
                            warn!(
                                "Datagram from {} filled the {}-byte buffer and may be truncated",
                                peer, len
                            );
                        }
                        self.process(buf[..len].to_vec()).await;
                    }
                    Err(e) => recv_failed(&e).await,
                },
            }
        }

        info!("Datagram sink on {:?} stopped", addr);
    }

    async fn process(&self, payload: Vec<u8>) {
        let store = self.store.clone();
        let text = String::from_utf8_lossy(&payload).into_owned();

        match task::spawn_blocking(move || store_submission(&store, &payload)).await {
            Ok(Ok(timestamp)) => info!("Stored submission {}", timestamp),
            Ok(Err(e)) => error!("Dropping submission {:?}: {}", text, e),
            Err(e) => error!("Store task for submission {:?} failed: {}", text, e),
        }
    }
}

async fn recv_failed(e: &io::Error) {
    error!("Datagram receive failed: {}", e);
    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
}

/// Decode one raw form body and merge it into the store under a fresh
/// timestamp. Returns the key it was stored under.
pub fn store_submission(store: &JsonStore, payload: &[u8]) -> Result<String, FormError> {
    let record = form_service::decode(payload)?;
    let timestamp = record::timestamp_now();
    store.merge_write(&timestamp, &record)?;
    Ok(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::{fs, time::Instant};
    use tokio::time::sleep;

    async fn sink_in(dir: &std::path::Path, buffer: usize) -> DatagramSink {
        let cfg = AppConfig {
            sink_addr: "127.0.0.1:0".parse().unwrap(),
            recv_buffer_size: buffer,
            ..AppConfig::default()
        };
        DatagramSink::bind(&cfg, JsonStore::new(dir.join("storage"), "data.json"))
            .await
            .unwrap()
    }

    async fn wait_for_entry(store: &JsonStore, entry: Value) -> serde_json::Map<String, Value> {
        for _ in 0..200 {
            if let Ok(doc) = store.load() {
                if doc.values().any(|v| *v == entry) {
                    return doc;
                }
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("store never received {entry}");
    }

    #[test]
    fn store_submission_writes_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonStore::new(tmp.path().join("storage"), "data.json");

        let ts = store_submission(&store, b"name=Alice&email=a%40b.com").unwrap();

        let doc = store.load().unwrap();
        assert_eq!(doc[&ts], json!({"name": "Alice", "email": "a@b.com"}));
    }

    #[test]
    fn store_submission_rejects_bad_body_without_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonStore::new(tmp.path().join("storage"), "data.json");

        assert!(matches!(
            store_submission(&store, b"a=1&b"),
            Err(FormError::Parse(_))
        ));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn receive_errors_back_off() {
        let started = Instant::now();
        recv_failed(&io::Error::from(io::ErrorKind::OutOfMemory)).await;
        assert!(started.elapsed() >= RECV_ERROR_BACKOFF);
    }

    #[tokio::test]
    async fn survives_bad_datagrams_and_stops_on_shutdown() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = sink_in(tmp.path(), 1024).await;
        let addr = sink.local_addr().unwrap();
        let store = sink.store.clone();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(sink.run(rx));

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"garbage", addr).await.unwrap();
        client.send_to(b"a=1&b", addr).await.unwrap();
        client.send_to(b"name=Bob", addr).await.unwrap();

        let doc = wait_for_entry(&store, json!({"name": "Bob"})).await;
        assert_eq!(doc.len(), 1);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        // Port is released once the loop returns.
        UdpSocket::bind(addr).await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_store_does_not_stop_the_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = sink_in(tmp.path(), 1024).await;
        let addr = sink.local_addr().unwrap();
        let store = sink.store.clone();
        fs::create_dir_all(tmp.path().join("storage")).unwrap();
        fs::write(store.path(), "{not json").unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(sink.run(rx));

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"a=1", addr).await.unwrap();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{not json");

        // Repair the file; the same loop keeps storing.
        fs::write(store.path(), "").unwrap();
        client.send_to(b"a=2", addr).await.unwrap();
        wait_for_entry(&store, json!({"a": "2"})).await;

        drop(tx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn oversized_datagram_is_truncated() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = sink_in(tmp.path(), 16).await;
        let addr = sink.local_addr().unwrap();
        let store = sink.store.clone();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(sink.run(rx));

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        // 24 bytes; only "message=aaaaaaaa" (16) survives.
        client
            .send_to(b"message=aaaaaaaabbbbbbbb", addr)
            .await
            .unwrap();

        let doc = wait_for_entry(&store, json!({"message": "aaaaaaaa"})).await;
        assert_eq!(doc.len(), 1);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
