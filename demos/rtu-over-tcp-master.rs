// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drives the rtu-over-tcp-slave demo.

use modbus_kit::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let master = Master::rtu_over_tcp("127.0.0.1:5021");
    let slave_id = 1;

    let registers = master.read_holding_registers(slave_id, 0x082B, 1).await?;
    println!("holding register 0x082B: {registers:?}");

    master.write_single_register(slave_id, 0x0000, 0x1234).await?;
    let registers = master.read_holding_registers(slave_id, 0x0000, 1).await?;
    println!("holding register 0x0000: {registers:?}");

    master
        .write_multiple_coils(slave_id, 0, &[true, true, false, true])
        .await?;
    let coils = master.read_coils(slave_id, 0, 4).await?;
    println!("coils 0..4: {coils}");
    Ok(())
}
