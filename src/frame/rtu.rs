// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTU framing types.

use crate::{frame::Pdu, slave::SlaveId};

// [Modbus over Serial Line Specification and Implementation Guide V1.02](http://modbus.org/docs/Modbus_over_serial_line_V1_02.pdf), page 13
// "The maximum size of a Modbus RTU frame is 256 bytes."
pub(crate) const MAX_FRAME_LEN: usize = 256;

/// Slave id + function code + CRC.
pub(crate) const MIN_FRAME_LEN: usize = 4;

/// Slave id + function code + exception code + CRC.
pub(crate) const EXCEPTION_FRAME_LEN: usize = 5;

/// A framed RTU request or response.
///
/// The trailing CRC-16 is not stored; it is recomputed whenever the frame
/// is serialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtuFrame {
    pub slave_id: SlaveId,
    pub pdu: Pdu,
}
