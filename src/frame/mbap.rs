// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MBAP (Modbus-over-TCP) framing types.

use crate::{codec::u16_len, frame::Pdu, slave::SlaveId};

/// Size of the MBAP header in bytes.
pub(crate) const HEADER_LEN: usize = 7;

/// Protocol identifier; always zero for Modbus.
pub(crate) const PROTOCOL_ID: u16 = 0x0000;

/// Maximum size of an assembled MBAP frame.
pub(crate) const MAX_FRAME_LEN: usize = 260;

/// A framed MBAP request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MbapFrame {
    pub transaction_id: u16,
    pub protocol_id: u16,
    pub unit_id: SlaveId,
    pub pdu: Pdu,
}

impl MbapFrame {
    /// The value of the header length field: unit id + function code + data.
    #[must_use]
    pub fn length(&self) -> u16 {
        u16_len(1 + 1 + self.pdu.data.len())
    }
}
