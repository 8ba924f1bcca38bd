// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exercises every master operation against the tcp-slave demo.

use modbus_kit::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let master = Master::tcp("127.0.0.1:5020");
    let slave_id = 1;

    let coils = master.read_coils(slave_id, 0, 10).await?;
    println!("coils 0..10: {coils}");

    let inputs = master.read_discrete_inputs(slave_id, 0, 10).await?;
    println!("discrete inputs 0..10: {inputs}");

    let holding = master.read_holding_registers(slave_id, 0, 5).await?;
    println!("holding registers 0..5: {holding:?}");

    let input = master.read_input_registers(slave_id, 0, 5).await?;
    println!("input registers 0..5: {input:?}");

    master.write_single_coil(slave_id, 10, true).await?;
    master.write_single_register(slave_id, 10, 0x1234).await?;
    master
        .write_multiple_coils(slave_id, 20, &[true, false, true, true])
        .await?;
    master
        .write_multiple_registers(
            slave_id,
            20,
            &[Register::from(1), Register::from(2), Register::from(3)],
        )
        .await?;
    println!("writes acknowledged");

    match master.read_device_identification(slave_id).await {
        Ok(identification) => println!("device identification: {identification:?}"),
        Err(Error::Exception(response)) => println!("no identification: {response}"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
