//! In-memory transport doubles.

use async_trait::async_trait;
use bytes::Bytes;
use runagent::config::EnvSource;
use runagent::transport::{
    FrameConnection, HttpReply, HttpRequest, HttpTransport, StreamConnector,
};
use runagent::{Error, Result};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn status(s: &str) -> String {
    json!({"type": "status", "status": s}).to_string()
}

pub fn data(content: Value) -> String {
    json!({"type": "data", "content": content}).to_string()
}

/// Environment whose values can change after a client is built.
#[derive(Clone, Default)]
pub struct SharedEnv(Arc<Mutex<HashMap<String, String>>>);

impl SharedEnv {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        let env = Self::default();
        for (k, v) in pairs {
            env.set(k, v);
        }
        env
    }

    pub fn set(&self, key: &str, value: &str) {
        self.0.lock().unwrap().insert(key.to_string(), value.to_string());
    }
}

impl EnvSource for SharedEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key).cloned()
    }
}

/// HTTP transport that answers every request with the same reply.
pub struct CountingTransport {
    reply_status: u16,
    reply_body: String,
    calls: AtomicUsize,
    last: Mutex<Option<HttpRequest>>,
}

impl CountingTransport {
    pub fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply_status: status,
            reply_body: body.to_string(),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for CountingTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request);
        Ok(HttpReply {
            status: self.reply_status,
            body: Bytes::from(self.reply_body.clone()),
        })
    }
}

/// What a scripted connection does once its frames run out.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum AfterScript {
    /// Peer closes the connection.
    Close,
    /// Never answers again.
    Hang,
}

/// Counters shared between a connector and the connection it hands out.
#[derive(Default)]
pub struct ConnectionLog {
    pub sent: Mutex<Vec<String>>,
    pub closes: AtomicUsize,
    pub reads: AtomicUsize,
    pub remaining: AtomicUsize,
}

impl ConnectionLog {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn handshake(&self) -> Value {
        let sent = self.sent.lock().unwrap();
        serde_json::from_str(sent.first().expect("handshake was sent")).unwrap()
    }
}

struct ScriptedConnection {
    frames: VecDeque<String>,
    after: AfterScript,
    fail_send: bool,
    log: Arc<ConnectionLog>,
}

#[async_trait]
impl FrameConnection for ScriptedConnection {
    async fn send_text(&mut self, text: String) -> Result<()> {
        if self.fail_send {
            return Err(Error::connection("write failed"));
        }
        self.log.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn recv_text(&mut self) -> Result<Option<String>> {
        self.log.reads.fetch_add(1, Ordering::SeqCst);
        match self.frames.pop_front() {
            Some(frame) => {
                self.log.remaining.store(self.frames.len(), Ordering::SeqCst);
                Ok(Some(frame))
            }
            None if self.after == AfterScript::Hang => {
                std::future::pending::<Result<Option<String>>>().await
            }
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector handing out one scripted connection.
pub struct ScriptedConnector {
    script: Mutex<Option<VecDeque<String>>>,
    after: AfterScript,
    fail_connect: bool,
    fail_send: bool,
    connects: AtomicUsize,
    last_url: Mutex<Option<String>>,
    last_headers: Mutex<Vec<(String, String)>>,
    pub log: Arc<ConnectionLog>,
}

impl ScriptedConnector {
    fn build(frames: Vec<String>, after: AfterScript, fail_connect: bool, fail_send: bool) -> Arc<Self> {
        let log = Arc::new(ConnectionLog::default());
        log.remaining.store(frames.len(), Ordering::SeqCst);
        Arc::new(Self {
            script: Mutex::new(Some(frames.into())),
            after,
            fail_connect,
            fail_send,
            connects: AtomicUsize::new(0),
            last_url: Mutex::new(None),
            last_headers: Mutex::new(Vec::new()),
            log,
        })
    }

    pub fn new(frames: Vec<String>) -> Arc<Self> {
        Self::build(frames, AfterScript::Close, false, false)
    }

    pub fn hanging(frames: Vec<String>) -> Arc<Self> {
        Self::build(frames, AfterScript::Hang, false, false)
    }

    pub fn refusing() -> Arc<Self> {
        Self::build(Vec::new(), AfterScript::Close, true, false)
    }

    pub fn failing_write() -> Arc<Self> {
        Self::build(Vec::new(), AfterScript::Close, false, true)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().unwrap().clone()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.last_headers
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }
}

#[async_trait]
impl StreamConnector for ScriptedConnector {
    async fn connect(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<Box<dyn FrameConnection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(url.to_string());
        *self.last_headers.lock().unwrap() = headers.to_vec();
        if self.fail_connect {
            return Err(Error::connection("connection refused"));
        }
        let frames = self.script.lock().unwrap().take().unwrap_or_default();
        Ok(Box::new(ScriptedConnection {
            frames,
            after: self.after,
            fail_send: self.fail_send,
            log: self.log.clone(),
        }))
    }
}
