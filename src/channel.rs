// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Byte-stream channels linking the garbler and the evaluator.
//!
//! The protocol core only needs a reliable, ordered duplex byte carrier;
//! three concrete kinds are provided: an in-memory buffer for
//! garble-then-evaluate in a single process, a single-socket TCP channel,
//! and a dual-socket TCP channel with a large send buffer for high-volume
//! streaming. [`TrackChannel`] wraps any of them and counts traffic.

use std::cell::RefCell;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::rc::Rc;

use crate::errors::Error;
use crate::label::{Bit, Word, LAMBDA_BYTES};

/// Buffer size for the dedicated send socket of the dual-socket channel.
const HIGH_SPEED_SEND_BUFFER: usize = 1 << 20;

/// Tag identifying the concrete carrier behind a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelKind {
    /// Shared in-memory buffer.
    Mem,
    /// Single TCP socket.
    Tcp,
    /// Dedicated TCP sockets for each direction.
    HighSpeedTcp,
}

/// A reliable, ordered duplex byte stream.
pub trait Channel {
    /// Write all of `bytes` to the peer.
    fn send(&mut self, bytes: &[u8]) -> Result<(), Error>;
    /// Fill `bytes` completely from the peer.
    fn recv(&mut self, bytes: &mut [u8]) -> Result<(), Error>;
    /// Push any buffered writes to the peer.
    fn flush(&mut self) -> Result<(), Error>;
    /// Which concrete carrier this is; used to pick buffering strategy.
    fn kind(&self) -> ChannelKind;

    /// Send a little-endian `u64`.
    fn send_u64(&mut self, x: u64) -> Result<(), Error> {
        self.send(&x.to_le_bytes())
    }

    /// Receive a little-endian `u64`.
    fn recv_u64(&mut self) -> Result<u64, Error> {
        let mut bytes = [0u8; 8];
        self.recv(&mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Send one wire label.
    fn send_bit(&mut self, bit: &Bit) -> Result<(), Error> {
        self.send(bit.as_bytes())
    }

    /// Receive one wire label.
    fn recv_bit(&mut self) -> Result<Bit, Error> {
        let mut bytes = [0u8; LAMBDA_BYTES];
        self.recv(&mut bytes)?;
        Ok(Bit::new(bytes))
    }

    /// Send every label of a word, LSB first.
    fn send_word(&mut self, word: &Word) -> Result<(), Error> {
        for bit in word.bits() {
            self.send_bit(bit)?;
        }
        Ok(())
    }

    /// Receive a word of `width` labels.
    fn recv_word(&mut self, width: usize) -> Result<Word, Error> {
        let bits = (0..width)
            .map(|_| self.recv_bit())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Word::from_bits(bits))
    }
}

#[derive(Default)]
struct MemBuf {
    buf: Vec<u8>,
    pos: usize,
}

/// In-memory channel: bytes written by either end are read back in FIFO
/// order. Handles are cheap clones of a shared buffer, so the garbler and the
/// evaluator of a single-process session hold the same stream.
#[derive(Clone, Default)]
pub struct MemChannel {
    inner: Rc<RefCell<MemBuf>>,
}

impl MemChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        MemChannel::default()
    }
}

impl Channel for MemChannel {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.inner.borrow_mut().buf.extend_from_slice(bytes);
        Ok(())
    }

    fn recv(&mut self, bytes: &mut [u8]) -> Result<(), Error> {
        let mut inner = self.inner.borrow_mut();
        if inner.pos + bytes.len() > inner.buf.len() {
            return Err(Error::Channel(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "in-memory channel ran out of bytes",
            )));
        }
        let pos = inner.pos;
        bytes.copy_from_slice(&inner.buf[pos..pos + bytes.len()]);
        inner.pos += bytes.len();
        if inner.pos == inner.buf.len() {
            inner.buf.clear();
            inner.pos = 0;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Mem
    }
}

/// Channel over a single TCP stream with buffered reads and writes.
///
/// Writes are flushed automatically before the first read that follows them,
/// so a party that alternates directions never stalls on its own buffer.
pub struct TcpChannel {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    flushed: bool,
}

impl TcpChannel {
    /// Wrap an established stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self, Error> {
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(TcpChannel {
            reader,
            writer: BufWriter::new(stream),
            flushed: true,
        })
    }

    /// Bind `addr` and wrap the first accepted connection.
    pub fn listen<A: ToSocketAddrs>(addr: A) -> Result<Self, Error> {
        let (stream, _) = TcpListener::bind(addr)?.accept()?;
        Self::from_stream(stream)
    }

    /// Connect to a listening peer.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, Error> {
        Self::from_stream(TcpStream::connect(addr)?)
    }
}

impl Channel for TcpChannel {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.writer.write_all(bytes)?;
        self.flushed = false;
        Ok(())
    }

    fn recv(&mut self, bytes: &mut [u8]) -> Result<(), Error> {
        if !self.flushed {
            self.flush()?;
        }
        self.reader.read_exact(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        self.flushed = true;
        Ok(())
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Tcp
    }
}

/// Channel over two TCP streams, one per direction, with a large send buffer.
pub struct HighSpeedTcpChannel {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    flushed: bool,
}

impl HighSpeedTcpChannel {
    /// Wrap established streams: `send` carries this party's writes, `recv`
    /// the peer's. The two parties must cross their streams.
    pub fn from_streams(send: TcpStream, recv: TcpStream) -> Result<Self, Error> {
        send.set_nodelay(true)?;
        recv.set_nodelay(true)?;
        Ok(HighSpeedTcpChannel {
            reader: BufReader::new(recv),
            writer: BufWriter::with_capacity(HIGH_SPEED_SEND_BUFFER, send),
            flushed: true,
        })
    }

    /// Bind `addr`, accept two connections, send on the first and receive on
    /// the second.
    pub fn listen<A: ToSocketAddrs>(addr: A) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr)?;
        let (send, _) = listener.accept()?;
        let (recv, _) = listener.accept()?;
        Self::from_streams(send, recv)
    }

    /// Connect twice to a listening peer, receiving on the first stream and
    /// sending on the second.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, Error> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no address"))?;
        let recv = TcpStream::connect(addr)?;
        let send = TcpStream::connect(addr)?;
        Self::from_streams(send, recv)
    }
}

impl Channel for HighSpeedTcpChannel {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.writer.write_all(bytes)?;
        self.flushed = false;
        Ok(())
    }

    fn recv(&mut self, bytes: &mut [u8]) -> Result<(), Error> {
        if !self.flushed {
            self.flush()?;
        }
        self.reader.read_exact(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        self.flushed = true;
        Ok(())
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::HighSpeedTcp
    }
}

/// Wrapper counting the bytes that cross an underlying channel.
pub struct TrackChannel<C> {
    channel: C,
    bytes_sent: u64,
    bytes_received: u64,
}

impl<C: Channel> TrackChannel<C> {
    /// Wrap `channel` with zeroed counters.
    pub fn new(channel: C) -> Self {
        TrackChannel {
            channel,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    /// Bytes written so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Bytes read so far.
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Reset both counters.
    pub fn clear(&mut self) {
        self.bytes_sent = 0;
        self.bytes_received = 0;
    }
}

impl<C: Channel> Channel for TrackChannel<C> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.channel.send(bytes)?;
        self.bytes_sent += bytes.len() as u64;
        Ok(())
    }

    fn recv(&mut self, bytes: &mut [u8]) -> Result<(), Error> {
        self.channel.recv(bytes)?;
        self.bytes_received += bytes.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.channel.flush()
    }

    fn kind(&self) -> ChannelKind {
        self.channel.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn mem_channel_roundtrip() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = MemChannel::new();
        let mut b = a.clone();
        let bit = Bit::rand(&mut rng);
        let word = Word::rand(&mut rng, 5);
        a.send_u64(42).unwrap();
        a.send_bit(&bit).unwrap();
        a.send_word(&word).unwrap();
        assert_eq!(b.recv_u64().unwrap(), 42);
        assert_eq!(b.recv_bit().unwrap(), bit);
        assert_eq!(b.recv_word(5).unwrap(), word);
    }

    #[test]
    fn mem_channel_eof() {
        let mut chan = MemChannel::new();
        chan.send(&[1, 2, 3]).unwrap();
        let mut buf = [0u8; 4];
        assert!(matches!(
            chan.recv(&mut buf),
            Err(Error::Channel(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
    }

    #[test]
    fn track_channel_counts() {
        let mut chan = TrackChannel::new(MemChannel::new());
        chan.send_u64(7).unwrap();
        chan.send(&[0u8; 3]).unwrap();
        assert_eq!(chan.bytes_sent(), 11);
        chan.recv_u64().unwrap();
        assert_eq!(chan.bytes_received(), 8);
        assert_eq!(chan.kind(), ChannelKind::Mem);
        chan.clear();
        assert_eq!(chan.bytes_sent(), 0);
    }
}
