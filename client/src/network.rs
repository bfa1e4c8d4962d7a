//! Nonblocking TCP connection with length-prefixed frame reassembly.
//!
//! The client has no runtime of its own; the socket is polled once per
//! render frame. Partial reads and writes are buffered between frames.

use bincode::{deserialize, serialize};
use log::{info, warn};
use shared::{Packet, MAX_FRAME_BYTES};
use std::io::{self, ErrorKind, Read, Write};
use std::net::TcpStream;

pub struct Connection {
    stream: TcpStream,
    incoming: Vec<u8>,
    outgoing: Vec<u8>,
    closed: bool,
}

impl Connection {
    pub fn connect(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;
        info!("connected to {}", addr);

        Ok(Self {
            stream,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            closed: false,
        })
    }

    /// True once the server has closed the connection or an io error was
    /// seen. A closed connection never recovers; the caller should exit.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Queues one packet and tries to flush. Bytes the socket will not
    /// take yet stay buffered for the next frame.
    pub fn send(&mut self, packet: &Packet) -> io::Result<()> {
        let body =
            serialize(packet).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;
        self.outgoing
            .extend_from_slice(&(body.len() as u32).to_le_bytes());
        self.outgoing.extend_from_slice(&body);
        self.flush_outgoing()
    }

    /// Drains everything the socket has ready and returns the complete
    /// packets. Undecodable frames are skipped; an oversized length prefix
    /// closes the connection since the byte stream can no longer be
    /// trusted.
    pub fn poll(&mut self) -> io::Result<Vec<Packet>> {
        if self.closed {
            return Ok(Vec::new());
        }
        self.flush_outgoing()?;

        let mut buf = [0u8; 4096];
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    info!("server closed the connection");
                    self.closed = true;
                    break;
                }
                Ok(n) => self.incoming.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.closed = true;
                    return Err(e);
                }
            }
        }

        Ok(self.drain_frames())
    }

    fn drain_frames(&mut self) -> Vec<Packet> {
        let mut packets = Vec::new();

        loop {
            if self.incoming.len() < 4 {
                break;
            }
            let mut len_buf = [0u8; 4];
            len_buf.copy_from_slice(&self.incoming[..4]);
            let len = u32::from_le_bytes(len_buf) as usize;

            if len > MAX_FRAME_BYTES {
                warn!("oversized frame ({} bytes), closing connection", len);
                self.closed = true;
                break;
            }
            if self.incoming.len() < 4 + len {
                break;
            }

            let body: Vec<u8> = self.incoming.drain(..4 + len).skip(4).collect();
            match deserialize::<Packet>(&body) {
                Ok(packet) => packets.push(packet),
                Err(e) => warn!("skipping undecodable frame: {}", e),
            }
        }

        packets
    }

    fn flush_outgoing(&mut self) -> io::Result<()> {
        while !self.outgoing.is_empty() {
            match self.stream.write(&self.outgoing) {
                Ok(0) => {
                    self.closed = true;
                    return Err(io::Error::new(ErrorKind::WriteZero, "socket closed"));
                }
                Ok(n) => {
                    self.outgoing.drain(..n);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.closed = true;
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::net::TcpListener;

    fn frame(packet: &Packet) -> Vec<u8> {
        let body = serialize(packet).unwrap();
        let mut buf = (body.len() as u32).to_le_bytes().to_vec();
        buf.extend_from_slice(&body);
        buf
    }

    #[test]
    fn reassembles_frames_split_across_reads() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut conn = Connection::connect(&addr.to_string()).unwrap();
        let (mut server_side, _) = listener.accept().unwrap();

        let bytes = frame(&Packet::Leave { id: 9 });
        let (head, tail) = bytes.split_at(3);

        server_side.write_all(head).unwrap();
        server_side.flush().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(conn.poll().unwrap().is_empty());

        server_side.write_all(tail).unwrap();
        server_side.flush().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));

        let packets = conn.poll().unwrap();
        assert_eq!(packets, vec![Packet::Leave { id: 9 }]);
        assert!(!conn.is_closed());
    }

    #[test]
    fn multiple_frames_in_one_read_all_arrive() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut conn = Connection::connect(&addr.to_string()).unwrap();
        let (mut server_side, _) = listener.accept().unwrap();

        let mut bytes = frame(&Packet::Leave { id: 1 });
        bytes.extend(frame(&Packet::Leave { id: 2 }));
        server_side.write_all(&bytes).unwrap();
        server_side.flush().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));

        let packets = conn.poll().unwrap();
        assert_eq!(
            packets,
            vec![Packet::Leave { id: 1 }, Packet::Leave { id: 2 }]
        );
    }

    #[test]
    fn oversized_prefix_closes_the_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut conn = Connection::connect(&addr.to_string()).unwrap();
        let (mut server_side, _) = listener.accept().unwrap();

        let len = (MAX_FRAME_BYTES as u32 + 1).to_le_bytes();
        server_side.write_all(&len).unwrap();
        server_side.flush().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));

        let packets = conn.poll().unwrap();
        assert!(packets.is_empty());
        assert!(conn.is_closed());
    }

    #[test]
    fn server_hangup_marks_connection_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut conn = Connection::connect(&addr.to_string()).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        drop(server_side);
        std::thread::sleep(std::time::Duration::from_millis(20));

        let _ = conn.poll().unwrap();
        assert!(conn.is_closed());
    }
}
