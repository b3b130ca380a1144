//! Worker pools for parallel BGZF block (de)compression.
//!
//! Blocks are read from (or written to) the underlying stream sequentially
//! (I/O must stay sequential), handed to `threads - 1` workers for DEFLATE
//! decompression or compression, and delivered back to the consumer strictly
//! in block order — the consumer never observes reordering, only
//! parallelism in the (de)compression work itself (spec §5).

use std::io::{Read, Write};
use std::thread::JoinHandle;

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

struct RawBlock {
    seq: u64,
    compressed: Vec<u8>,
}

struct DecodedBlock {
    seq: u64,
    data: Vec<u8>,
}

/// Decompresses a stream of raw DEFLATE payloads (one per BGZF block) across
/// a fixed pool of worker threads, re-assembling the in-order decompressed
/// byte stream for the caller.
pub struct BlockWorkerPool {
    job_tx: crossbeam_channel::Sender<RawBlock>,
    result_rx: crossbeam_channel::Receiver<DecodedBlock>,
    workers: Vec<JoinHandle<()>>,
    next_seq: u64,
    pending: std::collections::BTreeMap<u64, Vec<u8>>,
}

impl BlockWorkerPool {
    /// Spawn `worker_count` decompression workers (must be >= 1).
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (job_tx, job_rx) = crossbeam_channel::bounded::<RawBlock>(worker_count * 2);
        let (result_tx, result_rx) = crossbeam_channel::bounded::<DecodedBlock>(worker_count * 2);

        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            workers.push(std::thread::spawn(move || {
                while let Ok(block) = job_rx.recv() {
                    let mut decoder = DeflateDecoder::new(&block.compressed[..]);
                    let mut data = Vec::new();
                    if decoder.read_to_end(&mut data).is_err() {
                        data.clear();
                    }
                    if result_tx.send(DecodedBlock { seq: block.seq, data }).is_err() {
                        break;
                    }
                }
            }));
        }

        Self {
            job_tx,
            result_rx,
            workers,
            next_seq: 0,
            pending: std::collections::BTreeMap::new(),
        }
    }

    /// Submit a block's raw DEFLATE payload for decompression, tagged by its
    /// sequence number (monotonically increasing block index).
    pub fn submit(&self, seq: u64, compressed: Vec<u8>) -> Result<()> {
        self.job_tx
            .send(RawBlock { seq, compressed })
            .map_err(|_| Error::WorkerTerminated)
    }

    /// Block until the decompressed bytes for `seq` (the next block in
    /// order) are available, returning them.
    pub fn recv_in_order(&mut self, seq: u64) -> Result<Vec<u8>> {
        if let Some(data) = self.pending.remove(&seq) {
            return Ok(data);
        }
        loop {
            let block = self.result_rx.recv().map_err(|_| Error::WorkerTerminated)?;
            if block.seq == seq {
                return Ok(block.data);
            }
            self.pending.insert(block.seq, block.data);
        }
    }
}

impl Drop for BlockWorkerPool {
    fn drop(&mut self) {
        // Replace the real sender with a disconnected stand-in and drop the
        // original: that's the last sender (workers only hold the receiver
        // clone), so it closes the channel and lets workers exit their recv
        // loop. Cloning and dropping the clone, as a naive implementation
        // might, leaves `self.job_tx` itself alive and deadlocks the `join`
        // below waiting on workers that never see a channel close.
        let (disconnected_tx, _) = crossbeam_channel::bounded::<RawBlock>(0);
        let real_tx = std::mem::replace(&mut self.job_tx, disconnected_tx);
        drop(real_tx);
        for w in self.workers.drain(..) {
            let _ = w.join();
        }
    }
}

struct RawWriteBlock {
    seq: u64,
    data: Vec<u8>,
    level: u32,
}

/// A compressed block's framing inputs: the DEFLATE payload plus the CRC-32
/// and size of the uncompressed bytes it came from (the BGZF trailer needs
/// both, and computing them on the worker thread avoids shipping the
/// uncompressed block back to the caller only to re-scan it).
pub struct CompressedBlock {
    pub compressed: Vec<u8>,
    pub crc: u32,
    pub isize: u32,
}

/// Compresses a stream of raw uncompressed blocks across a fixed pool of
/// worker threads, re-assembling the in-order compressed byte stream for the
/// caller. The write-side mirror of [`BlockWorkerPool`].
pub struct BlockCompressPool {
    job_tx: crossbeam_channel::Sender<RawWriteBlock>,
    result_rx: crossbeam_channel::Receiver<(u64, CompressedBlock)>,
    workers: Vec<JoinHandle<()>>,
    pending: std::collections::BTreeMap<u64, CompressedBlock>,
}

impl BlockCompressPool {
    /// Spawn `worker_count` compression workers (must be >= 1).
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (job_tx, job_rx) = crossbeam_channel::bounded::<RawWriteBlock>(worker_count * 2);
        let (result_tx, result_rx) =
            crossbeam_channel::bounded::<(u64, CompressedBlock)>(worker_count * 2);

        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            workers.push(std::thread::spawn(move || {
                while let Ok(block) = job_rx.recv() {
                    let crc = {
                        let mut hasher = crc32fast::Hasher::new();
                        hasher.update(&block.data);
                        hasher.finalize()
                    };
                    let isize = block.data.len() as u32;
                    let mut encoder =
                        DeflateEncoder::new(Vec::new(), Compression::new(block.level));
                    let compressed = match encoder.write_all(&block.data).and_then(|()| encoder.finish())
                    {
                        Ok(compressed) => compressed,
                        Err(_) => Vec::new(),
                    };
                    let result = CompressedBlock { compressed, crc, isize };
                    if result_tx.send((block.seq, result)).is_err() {
                        break;
                    }
                }
            }));
        }

        Self {
            job_tx,
            result_rx,
            workers,
            pending: std::collections::BTreeMap::new(),
        }
    }

    /// Submit a block's raw uncompressed bytes for compression at `level`,
    /// tagged by its sequence number (monotonically increasing block index).
    pub fn submit(&self, seq: u64, data: Vec<u8>, level: u32) -> Result<()> {
        self.job_tx
            .send(RawWriteBlock { seq, data, level })
            .map_err(|_| Error::WorkerTerminated)
    }

    /// Block until the compressed block for `seq` (the next block in order)
    /// is available, returning it.
    pub fn recv_in_order(&mut self, seq: u64) -> Result<CompressedBlock> {
        if let Some(block) = self.pending.remove(&seq) {
            return Ok(block);
        }
        loop {
            let (got_seq, block) = self.result_rx.recv().map_err(|_| Error::WorkerTerminated)?;
            if got_seq == seq {
                return Ok(block);
            }
            self.pending.insert(got_seq, block);
        }
    }
}

impl Drop for BlockCompressPool {
    fn drop(&mut self) {
        // See `BlockWorkerPool::drop`: replace the sender rather than clone
        // it, so the channel actually closes and workers see `recv` fail.
        let (disconnected_tx, _) = crossbeam_channel::bounded::<RawWriteBlock>(0);
        let real_tx = std::mem::replace(&mut self.job_tx, disconnected_tx);
        drop(real_tx);
        for w in self.workers.drain(..) {
            let _ = w.join();
        }
    }
}
