// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded output capture

use super::{FailureMarker, MarkerKind};
use std::collections::VecDeque;

/// Keeps the last `limit` bytes of a stream and watches for markers
///
/// Markers are matched against everything that passes through, not just the
/// retained tail, so a signature printed early by a chatty tool is still seen.
/// A marker split across two reads is found through a small carry-over buffer.
#[derive(Debug)]
pub struct StreamCapture {
    tail: VecDeque<u8>,
    limit: usize,
    markers: Vec<FailureMarker>,
    carry: Vec<u8>,
    carry_len: usize,
    found: Option<MarkerKind>,
    total: u64,
}

impl StreamCapture {
    pub fn new(limit: usize, markers: Vec<FailureMarker>) -> Self {
        let carry_len = markers
            .iter()
            .map(|m| m.pattern.len())
            .max()
            .unwrap_or(0)
            .saturating_sub(1);
        Self {
            tail: VecDeque::with_capacity(limit.min(64 * 1024)),
            limit,
            markers,
            carry: Vec::new(),
            carry_len,
            found: None,
            total: 0,
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) {
        self.total += chunk.len() as u64;
        self.scan(chunk);

        if chunk.len() >= self.limit {
            self.tail.clear();
            self.tail.extend(&chunk[chunk.len() - self.limit..]);
            return;
        }
        self.tail.extend(chunk);
        let excess = self.tail.len().saturating_sub(self.limit);
        self.tail.drain(..excess);
    }

    fn scan(&mut self, chunk: &[u8]) {
        if self.found.is_some() || self.markers.is_empty() {
            return;
        }
        let mut window = std::mem::take(&mut self.carry);
        window.extend_from_slice(chunk);

        let text = String::from_utf8_lossy(&window);
        self.found = self
            .markers
            .iter()
            .find(|m| text.contains(m.pattern.as_str()))
            .map(|m| m.kind);

        let keep = window.len().min(self.carry_len);
        self.carry = window.split_off(window.len() - keep);
    }

    pub fn marker(&self) -> Option<MarkerKind> {
        self.found
    }

    /// Total bytes seen, including those dropped from the tail
    pub fn total_bytes(&self) -> u64 {
        self.total
    }

    pub fn tail(&self) -> String {
        let (front, back) = self.tail.as_slices();
        let mut bytes = Vec::with_capacity(front.len() + back.len());
        bytes.extend_from_slice(front);
        bytes.extend_from_slice(back);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
