//! Bounded channel between producers and the dispatch thread
//!
//! Thin wrapper around crossbeam-channel that reports a hung-up peer as
//! [`Error::ChannelClosed`] and an empty channel as `Ok(None)`.

use std::time::Duration;

use crossbeam_channel::{self as cc, RecvTimeoutError, TryRecvError};

use crate::{Error, Result};

/// Producer half
#[derive(Debug)]
pub struct Sender<T> {
    inner: cc::Sender<T>,
}

impl<T> Sender<T> {
    /// Send, blocking while the channel is full
    #[inline]
    pub fn send(&self, value: T) -> Result<()> {
        self.inner.send(value).map_err(|_| Error::ChannelClosed)
    }
}

/// Consumer half, owned by the dispatch loop
#[derive(Debug)]
pub struct Receiver<T> {
    inner: cc::Receiver<T>,
}

impl<T> Receiver<T> {
    /// Receive without blocking
    #[inline]
    pub fn try_recv(&self) -> Result<Option<T>> {
        match self.inner.try_recv() {
            Ok(v) => Ok(Some(v)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::ChannelClosed),
        }
    }

    /// Receive, waiting at most `timeout`
    #[inline]
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<T>> {
        match self.inner.recv_timeout(timeout) {
            Ok(v) => Ok(Some(v)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::ChannelClosed),
        }
    }
}

/// Create a bounded channel with the given capacity
pub fn bounded_channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = cc::bounded(capacity);
    (Sender { inner: tx }, Receiver { inner: rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_then_try_recv() {
        let (tx, rx) = bounded_channel::<i32>(4);
        assert_eq!(rx.try_recv().unwrap(), None);
        tx.send(7).unwrap();
        tx.send(8).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Some(7));
        assert_eq!(rx.try_recv().unwrap(), Some(8));
        assert_eq!(rx.try_recv().unwrap(), None);
    }

    #[test]
    fn test_recv_timeout_expires() {
        let (_tx, rx) = bounded_channel::<i32>(4);
        assert_eq!(rx.recv_timeout(Duration::from_millis(5)).unwrap(), None);
    }

    #[test]
    fn test_closed_after_sender_drops() {
        let (tx, rx) = bounded_channel::<i32>(4);
        tx.send(1).unwrap();
        drop(tx);
        // Queued values are still delivered
        assert_eq!(rx.recv_timeout(Duration::ZERO).unwrap(), Some(1));
        assert!(matches!(
            rx.recv_timeout(Duration::ZERO),
            Err(Error::ChannelClosed)
        ));
        assert!(matches!(rx.try_recv(), Err(Error::ChannelClosed)));
    }

    #[test]
    fn test_send_fails_without_receiver() {
        let (tx, rx) = bounded_channel::<i32>(4);
        drop(rx);
        assert!(matches!(tx.send(1), Err(Error::ChannelClosed)));
    }

    #[test]
    fn test_cross_thread() {
        let (tx, rx) = bounded_channel::<String>(1);
        let producer = std::thread::spawn(move || {
            for i in 0..3 {
                tx.send(format!("req {}", i)).unwrap();
            }
        });
        let got: Vec<_> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap())
            .collect();
        producer.join().unwrap();
        assert_eq!(got, vec!["req 0", "req 1", "req 2"]);
    }
}
