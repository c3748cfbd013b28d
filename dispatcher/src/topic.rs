use anyhow::Result;
use futures::{
    channel::{mpsc, oneshot},
    StreamExt as _,
};

use crate::{context::Context, error::Error};

struct Envelope<Req, Res> {
    context: Context,
    payload: Req,
    reply: oneshot::Sender<Result<Res>>,
}

/// The requesting half of a topic. Cheap to clone; every holder talks to
/// the same responder.
pub struct Requester<Req, Res> {
    topic: &'static str,
    tx: mpsc::UnboundedSender<Envelope<Req, Res>>,
}

impl<Req, Res> Clone for Requester<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            topic: self.topic,
            tx: self.tx.clone(),
        }
    }
}

impl<Req, Res> Requester<Req, Res> {
    /// Sends `payload` and blocks the task until the responder replies or
    /// `context` is cancelled, whichever happens first.
    pub async fn request(&self, context: Context, payload: Req) -> Result<Res> {
        let (reply, response) = oneshot::channel();

        let envelope = Envelope {
            context: context.clone(),
            payload,
            reply,
        };

        self.tx
            .unbounded_send(envelope)
            .map_err(|_| Error::NoResponder { topic: self.topic })?;

        tokio::select! {
            _ = context.cancelled() => Err(Error::ContextCancelled.into()),
            result = response => {
                result.map_err(|_| Error::NoResponder { topic: self.topic })?
            }
        }
    }
}

/// A single in-flight request as seen by the responder.
pub struct Request<Req, Res> {
    pub context: Context,
    pub payload: Req,
    reply: oneshot::Sender<Result<Res>>,
}

impl<Req, Res> Request<Req, Res> {
    /// Delivers the result. If the caller is gone (cancelled or dropped),
    /// the result is silently discarded.
    pub fn respond(self, result: Result<Res>) {
        let _ = self.reply.send(result);
    }

    /// The checkpoint a responder takes before starting work: a request
    /// whose context is already cancelled is answered and dropped here.
    #[must_use]
    pub fn reject_if_cancelled(self) -> Option<Self> {
        if self.context.is_cancelled() {
            self.respond(Err(Error::ContextCancelled.into()));
            return None;
        }

        Some(self)
    }
}

/// The consuming half of a topic. Exactly one exists per topic.
pub struct Responder<Req, Res> {
    rx: mpsc::UnboundedReceiver<Envelope<Req, Res>>,
}

impl<Req, Res> Responder<Req, Res> {
    pub async fn next(&mut self) -> Option<Request<Req, Res>> {
        self.rx.next().await.map(|envelope| Request {
            context: envelope.context,
            payload: envelope.payload,
            reply: envelope.reply,
        })
    }
}

pub(crate) fn channel<Req, Res>(
    topic: &'static str,
) -> (Requester<Req, Res>, Responder<Req, Res>) {
    let (tx, rx) = mpsc::unbounded();

    (Requester { topic, tx }, Responder { rx })
}
