//! Simulated BMP180 behind a [`BusController`], for host tests.

use crate::bus::{Ack, BusController};
use crate::registers::*;
use core::convert::Infallible;
use std::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start,
    Restart,
    Stop,
    Transmit(u8),
    Receive(u8),
    Acknowledge(Ack),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Address,
    Register,
    Data,
    Reading,
}

/// Register file of a BMP180 plus the framing the master produced.
pub struct SimBus {
    pub registers: [u8; 256],
    pub events: Vec<Event>,
    /// Commands written to the control register, in order.
    pub commands: Vec<u8>,
    /// Result loaded into 0xF6.. when a temperature conversion is started.
    pub ut: u16,
    /// 24-bit result loaded into 0xF6.. when a pressure conversion is started.
    pub up_raw: u32,
    /// `false` makes every address byte go unacknowledged.
    pub present: bool,
    /// Number of phases that complete before the completion flag sticks.
    pub stall_after: Option<usize>,
    /// Never deliver received bytes.
    pub withhold_bytes: bool,
    state: State,
    pointer: u8,
    phases: usize,
    pending: Option<u8>,
    ack: Ack,
}

impl SimBus {
    pub fn new() -> Self {
        let mut registers = [0u8; 256];
        registers[CHIP_ID_REG as usize] = CHIP_ID;
        Self {
            registers,
            events: Vec::new(),
            commands: Vec::new(),
            ut: 0,
            up_raw: 0,
            present: true,
            stall_after: None,
            withhold_bytes: false,
            state: State::Idle,
            pointer: 0,
            phases: 0,
            pending: None,
            ack: Ack::Ack,
        }
    }

    pub fn with_calibration(mut self, wire: &[u8; CALIBRATION_LEN]) -> Self {
        let base = CALIBRATION_REG as usize;
        self.registers[base..base + CALIBRATION_LEN].copy_from_slice(wire);
        self
    }

    fn phase(&mut self, event: Event) {
        self.phases += 1;
        self.events.push(event);
    }

    fn register_written(&mut self, reg: u8, value: u8) {
        self.registers[reg as usize] = value;
        if reg != CONTROL_REG {
            return;
        }
        self.commands.push(value);
        let result = RESULT_REG as usize;
        if value == CONVERT_TEMP_CMD {
            self.registers[result..result + 2].copy_from_slice(&self.ut.to_be_bytes());
        } else if value & 0x3F == CONVERT_PRESSURE_CMD {
            let bytes = self.up_raw.to_be_bytes();
            self.registers[result..result + 3].copy_from_slice(&bytes[1..]);
        }
    }
}

impl BusController for SimBus {
    type Error = Infallible;

    fn start(&mut self) -> Result<(), Infallible> {
        self.phase(Event::Start);
        self.state = State::Address;
        Ok(())
    }

    fn restart(&mut self) -> Result<(), Infallible> {
        self.phase(Event::Restart);
        self.state = State::Address;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Infallible> {
        self.phase(Event::Stop);
        self.state = State::Idle;
        Ok(())
    }

    fn transmit(&mut self, byte: u8) -> Result<(), Infallible> {
        self.phase(Event::Transmit(byte));
        self.ack = Ack::Ack;
        match self.state {
            State::Address if self.present && byte >> 1 == BMP180_ADDRESS => {
                self.state = if byte & 1 == 1 { State::Reading } else { State::Register };
            }
            State::Register => {
                self.pointer = byte;
                self.state = State::Data;
            }
            State::Data => {
                self.register_written(self.pointer, byte);
                self.pointer = self.pointer.wrapping_add(1);
            }
            _ => self.ack = Ack::Nack,
        }
        Ok(())
    }

    fn enable_receive(&mut self) -> Result<(), Infallible> {
        let byte = self.registers[self.pointer as usize];
        self.pointer = self.pointer.wrapping_add(1);
        self.phases += 1;
        if !self.withhold_bytes {
            self.events.push(Event::Receive(byte));
            self.pending = Some(byte);
        }
        Ok(())
    }

    fn acknowledge(&mut self, ack: Ack) -> Result<(), Infallible> {
        self.phase(Event::Acknowledge(ack));
        Ok(())
    }

    fn is_idle(&mut self) -> Result<bool, Infallible> {
        Ok(self.stall_after.is_none_or(|n| self.phases <= n))
    }

    fn read_received(&mut self) -> Result<Option<u8>, Infallible> {
        Ok(self.pending.take())
    }

    fn last_ack(&mut self) -> Result<Ack, Infallible> {
        Ok(self.ack)
    }
}
