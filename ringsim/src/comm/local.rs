//! In-process worker group.
//!
//! Each worker runs on its own thread and owns one `LocalComm`. Every
//! ordered pair of workers gets a zero-capacity crossbeam channel, which
//! gives the blocking rendezvous semantics of a synchronous send: nothing
//! is buffered, a send completes only when the peer receives. A shared
//! abort channel is selected next to every operation so one worker can
//! fail the whole group.

use crossbeam_channel::{bounded, select, unbounded, Receiver, RecvError, Select, Sender};
use tracing::warn;

use super::{Communicator, Message};
use crate::error::{CommError, CommResult};

pub struct LocalComm {
    rank: usize,
    size: usize,
    outbox: Vec<Sender<Message>>, // outbox[dest]
    inbox: Vec<Receiver<Message>>, // inbox[source]
    abort_tx: Sender<i32>,
    abort_rx: Receiver<i32>,
}

/// Factory for a fully connected group of `LocalComm`s.
pub struct LocalWorld;

impl LocalWorld {
    /// One communication context per worker, indexed by rank.
    pub fn new(size: usize) -> Vec<LocalComm> {
        let (abort_tx, abort_rx) = unbounded();

        // links[src][dest]
        let links: Vec<Vec<(Sender<Message>, Receiver<Message>)>> = (0..size)
            .map(|_| (0..size).map(|_| bounded(0)).collect())
            .collect();

        (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                outbox: links[rank].iter().map(|(tx, _)| tx.clone()).collect(),
                inbox: links.iter().map(|row| row[rank].1.clone()).collect(),
                abort_tx: abort_tx.clone(),
                abort_rx: abort_rx.clone(),
            })
            .collect()
    }
}

impl LocalComm {
    fn check_peer(&self, peer: usize) -> CommResult<()> {
        if peer >= self.size {
            Err(CommError::InvalidPeer { peer, size: self.size })
        } else if peer == self.rank {
            Err(CommError::SelfMessage { rank: self.rank })
        } else {
            Ok(())
        }
    }
}

fn aborted(code: Result<i32, RecvError>) -> CommError {
    // every LocalComm keeps an abort sender alive, so RecvError cannot occur
    CommError::Aborted { code: code.unwrap_or(1) }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, msg: Message) -> CommResult<()> {
        self.check_peer(dest)?;
        select! {
            send(self.outbox[dest], msg) -> res => {
                res.map_err(|_| CommError::Disconnected { peer: dest })
            }
            recv(self.abort_rx) -> code => Err(aborted(code)),
        }
    }

    fn recv(&self, source: usize) -> CommResult<Message> {
        self.check_peer(source)?;
        select! {
            recv(self.inbox[source]) -> msg => {
                msg.map_err(|_| CommError::Disconnected { peer: source })
            }
            recv(self.abort_rx) -> code => Err(aborted(code)),
        }
    }

    fn send_recv(&self, msg: Message, dest: usize, source: usize) -> CommResult<Message> {
        // a single worker exchanging with itself
        if dest == self.rank && source == self.rank {
            return Ok(msg);
        }
        self.check_peer(dest)?;
        self.check_peer(source)?;

        let tx = &self.outbox[dest];
        let rx = &self.inbox[source];
        let mut outgoing = Some(msg);
        let mut incoming: Option<Message> = None;

        loop {
            if outgoing.is_none() {
                if let Some(msg) = incoming.take() {
                    return Ok(msg);
                }
            }

            let mut sel = Select::new();
            let abort_op = sel.recv(&self.abort_rx);
            let send_op = outgoing.as_ref().map(|_| sel.send(tx));
            let recv_op = incoming.is_none().then(|| sel.recv(rx));

            let oper = sel.select();
            let index = oper.index();
            if index == abort_op {
                return Err(aborted(oper.recv(&self.abort_rx)));
            } else if Some(index) == recv_op {
                let msg = oper
                    .recv(rx)
                    .map_err(|_| CommError::Disconnected { peer: source })?;
                incoming = Some(msg);
            } else if Some(index) == send_op {
                match outgoing.take() {
                    Some(msg) => oper
                        .send(tx, msg)
                        .map_err(|_| CommError::Disconnected { peer: dest })?,
                    None => unreachable!("send selected with nothing pending"),
                }
            }
        }
    }

    fn abort(&self, code: i32) {
        warn!(rank = self.rank, code, "aborting worker group");
        for _ in 0..self.size {
            let _ = self.abort_tx.send(code);
        }
    }
}
