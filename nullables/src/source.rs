//! Nullable source: scripted answers without touching the network.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use extip_consensus::{Context, IpProtocol, Source, SourceError};

enum Answer {
    Ip(IpAddr),
    PerProtocol { v4: Ipv4Addr, v6: Ipv6Addr },
    Fail(String),
    Hang,
}

/// A test source that answers from a script.
///
/// By default it answers immediately and stops as soon as the context is
/// done. Use [`with_delay`](Self::with_delay) to simulate a slow provider
/// and [`ignoring_cancellation`](Self::ignoring_cancellation) to simulate
/// one that keeps running after the consensus has given up.
pub struct NullSource {
    answer: Answer,
    delay: Duration,
    honour_cancellation: bool,
    calls: AtomicUsize,
    finished: AtomicUsize,
    protocols: Mutex<Vec<IpProtocol>>,
}

impl NullSource {
    fn with_answer(answer: Answer) -> Self {
        Self {
            answer,
            delay: Duration::ZERO,
            honour_cancellation: true,
            calls: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            protocols: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `ip`.
    pub fn answering(ip: IpAddr) -> Self {
        Self::with_answer(Answer::Ip(ip))
    }

    /// Answer with `v6` when asked for IPv6, with `v4` otherwise.
    pub fn per_protocol(v4: Ipv4Addr, v6: Ipv6Addr) -> Self {
        Self::with_answer(Answer::PerProtocol { v4, v6 })
    }

    /// Always fail with a fetch error carrying `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::with_answer(Answer::Fail(reason.into()))
    }

    /// Never answer. Returns only once the context is done.
    pub fn hanging() -> Self {
        Self::with_answer(Answer::Hang)
    }

    /// Wait `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Keep going after the context is done.
    pub fn ignoring_cancellation(mut self) -> Self {
        self.honour_cancellation = false;
        self
    }

    /// Number of times `resolve` was entered.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of times `resolve` returned.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Protocol filters seen, in call order.
    pub fn protocols(&self) -> Vec<IpProtocol> {
        self.protocols.lock().unwrap().clone()
    }

    async fn answer(&self, protocol: IpProtocol) -> Result<IpAddr, SourceError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.answer {
            Answer::Ip(ip) => Ok(*ip),
            Answer::PerProtocol { v4, v6 } => match protocol {
                IpProtocol::V6 => Ok(IpAddr::V6(*v6)),
                IpProtocol::Any | IpProtocol::V4 => Ok(IpAddr::V4(*v4)),
            },
            Answer::Fail(reason) => Err(SourceError::Fetch(reason.clone())),
            Answer::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl Source for NullSource {
    async fn resolve(&self, ctx: &Context, protocol: IpProtocol) -> Result<IpAddr, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.protocols.lock().unwrap().push(protocol);

        let outcome = if self.honour_cancellation {
            tokio::select! {
                biased;
                reason = ctx.done() => Err(SourceError::Cancelled(reason)),
                outcome = self.answer(protocol) => outcome,
            }
        } else {
            self.answer(protocol).await
        };

        self.finished.fetch_add(1, Ordering::SeqCst);
        outcome
    }
}
