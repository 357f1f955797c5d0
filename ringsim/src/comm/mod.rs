//! Point-to-point messaging between workers.
//!
//! Every component that talks to other workers receives a `&impl
//! Communicator` explicitly; there is no ambient world handle. Operations
//! are blocking rendezvous: a send returns once the peer has taken the
//! message. The only primitive that talks to two peers at once is
//! [`Communicator::send_recv`], which completes its send and its receive in
//! whichever order the peers become ready so a ring of simultaneous
//! exchanges cannot deadlock.

pub mod local;

pub use local::{LocalComm, LocalWorld};

use std::mem;

use crate::error::{CommError, CommResult};
use crate::simulation::states::Body;

/// Rank of the worker that coordinates initialization, checkpoints and
/// diagnostics.
pub const COORDINATOR: usize = 0;

/// Payload carried between two workers.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Iteration(i32),
    Bodies(Vec<Body>),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Iteration(_) => "iteration",
            Message::Bodies(_) => "bodies",
        }
    }
}

pub trait Communicator {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Blocking send; returns once `dest` has received.
    fn send(&self, dest: usize, msg: Message) -> CommResult<()>;

    /// Blocking receive of the next message from `source`.
    fn recv(&self, source: usize) -> CommResult<Message>;

    /// Send `msg` to `dest` while receiving from `source`, as one
    /// operation.
    fn send_recv(&self, msg: Message, dest: usize, source: usize) -> CommResult<Message>;

    /// Tear the whole group down. Every worker blocked in (or later
    /// entering) a communication call fails with `CommError::Aborted`.
    fn abort(&self, code: i32);

    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR
    }

    fn predecessor(&self) -> usize {
        (self.rank() + self.size() - 1) % self.size()
    }

    fn successor(&self) -> usize {
        (self.rank() + 1) % self.size()
    }

    fn send_bodies(&self, dest: usize, bodies: &[Body]) -> CommResult<()> {
        self.send(dest, Message::Bodies(bodies.to_vec()))
    }

    /// Receive a body partition into `buf`, checking it holds `expected`
    /// records.
    fn recv_bodies_into(
        &self,
        source: usize,
        buf: &mut Vec<Body>,
        expected: usize,
    ) -> CommResult<()> {
        let payload = take_bodies(source, self.recv(source)?, expected)?;
        buf.clear();
        buf.extend_from_slice(&payload);
        Ok(())
    }

    fn send_iteration(&self, dest: usize, iteration: i32) -> CommResult<()> {
        self.send(dest, Message::Iteration(iteration))
    }

    fn recv_iteration(&self, source: usize) -> CommResult<i32> {
        match self.recv(source)? {
            Message::Iteration(i) => Ok(i),
            other => Err(CommError::UnexpectedMessage {
                peer: source,
                expected: "iteration",
                actual: other.kind(),
            }),
        }
    }

    /// Hand the `outgoing` buffer to `dest` and move the partition arriving
    /// from `source` into `incoming`. Buffers change owner instead of being
    /// copied: `incoming` takes the received allocation and its previous,
    /// now empty, allocation is left in `outgoing` for the next round.
    fn exchange_bodies(
        &self,
        outgoing: &mut Vec<Body>,
        dest: usize,
        source: usize,
        incoming: &mut Vec<Body>,
        expected: usize,
    ) -> CommResult<()> {
        let msg = self.send_recv(Message::Bodies(mem::take(outgoing)), dest, source)?;
        let mut received = take_bodies(source, msg, expected)?;
        mem::swap(incoming, &mut received);
        received.clear();
        *outgoing = received;
        Ok(())
    }
}

fn take_bodies(source: usize, msg: Message, expected: usize) -> CommResult<Vec<Body>> {
    match msg {
        Message::Bodies(payload) if payload.len() == expected => Ok(payload),
        Message::Bodies(payload) => Err(CommError::PayloadSize {
            peer: source,
            expected,
            actual: payload.len(),
        }),
        other => Err(CommError::UnexpectedMessage {
            peer: source,
            expected: "bodies",
            actual: other.kind(),
        }),
    }
}
