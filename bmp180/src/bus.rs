//! Two-wire bus transaction engine.
//!
//! [`BusEngine`] frames register writes and block reads against the BMP180's
//! fixed address. It only talks to the bus through a [`BusController`], which
//! exposes the primitive phases (start, restart, stop, byte out, byte in,
//! ACK/NACK) and the completion flags a hardware master latches for them.
//!
//! Every phase is started and then polled until the controller reports
//! completion. With a poll limit configured, a phase that never completes
//! ends the transaction with [`Error::Timeout`] instead of hanging.

use crate::config::BusConfig;
use crate::error::{Error, Phase};
use crate::registers::{ADDRESS_READ, ADDRESS_WRITE, SCRATCH_LEN};

/// Acknowledge bit of a byte transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ack {
    /// Receiver pulled SDA low: keep going.
    Ack,
    /// Receiver left SDA high: this was the last byte.
    Nack,
}

/// Primitive phases of a two-wire master.
///
/// The phase methods only *begin* a phase. Completion is observed through
/// [`is_idle`](BusController::is_idle) and
/// [`read_received`](BusController::read_received), the same way firmware
/// polls a hardware master's status register.
pub trait BusController {
    type Error;

    /// Generate a START condition.
    fn start(&mut self) -> Result<(), Self::Error>;
    /// Generate a repeated START without releasing the bus.
    fn restart(&mut self) -> Result<(), Self::Error>;
    /// Generate a STOP condition.
    fn stop(&mut self) -> Result<(), Self::Error>;
    /// Shift one byte out and clock in the receiver's acknowledge bit.
    fn transmit(&mut self, byte: u8) -> Result<(), Self::Error>;
    /// Enable reception of exactly one byte.
    fn enable_receive(&mut self) -> Result<(), Self::Error>;
    /// Drive the acknowledge bit after a received byte.
    fn acknowledge(&mut self, ack: Ack) -> Result<(), Self::Error>;

    /// `true` once the phase most recently started has finished.
    fn is_idle(&mut self) -> Result<bool, Self::Error>;
    /// The received byte, once one is available.
    fn read_received(&mut self) -> Result<Option<u8>, Self::Error>;
    /// Acknowledge bit the peripheral returned for the last transmitted byte.
    fn last_ack(&mut self) -> Result<Ack, Self::Error>;
}

/// Register-level transactions against the BMP180.
pub struct BusEngine<C> {
    controller: C,
    poll_limit: Option<u32>,
    scratch: [u8; SCRATCH_LEN],
}

impl<C: BusController> BusEngine<C> {
    pub fn new(controller: C, config: &BusConfig) -> Self {
        Self {
            controller,
            poll_limit: config.poll_limit,
            scratch: [0; SCRATCH_LEN],
        }
    }

    /// Write one byte to a register.
    ///
    /// START, address(W), register, data, STOP.
    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Error<C::Error>> {
        trace!("write reg 0x{:02X} <- 0x{:02X}", reg, value);
        let result = self.write_frame(reg, value);
        self.finish(result)
    }

    /// Read `count` consecutive bytes starting at `reg` into the scratch
    /// buffer and return them.
    ///
    /// START, address(W), register, RESTART, address(R), then for each byte
    /// a receive followed by ACK, or NACK for the last one, then STOP.
    pub fn read_block(&mut self, reg: u8, count: usize) -> Result<&[u8], Error<C::Error>> {
        if count == 0 || count > SCRATCH_LEN {
            return Err(Error::InvalidLength);
        }
        trace!("read {} bytes from reg 0x{:02X}", count, reg);
        let result = self.read_frame(reg, count);
        self.finish(result)?;
        Ok(&self.scratch[..count])
    }

    /// Scratch buffer holding the bytes of the last block read.
    pub fn scratch(&self) -> &[u8; SCRATCH_LEN] {
        &self.scratch
    }

    /// Give the controller back.
    pub fn release(self) -> C {
        self.controller
    }

    fn write_frame(&mut self, reg: u8, value: u8) -> Result<(), Error<C::Error>> {
        self.begin(Phase::Start)?;
        self.send(ADDRESS_WRITE, Phase::AddressWrite)?;
        self.send(reg, Phase::Register)?;
        self.send(value, Phase::Data)
    }

    fn read_frame(&mut self, reg: u8, count: usize) -> Result<(), Error<C::Error>> {
        self.begin(Phase::Start)?;
        self.send(ADDRESS_WRITE, Phase::AddressWrite)?;
        self.send(reg, Phase::Register)?;
        self.begin(Phase::Restart)?;
        self.send(ADDRESS_READ, Phase::AddressRead)?;

        for i in 0..count {
            self.controller.enable_receive().map_err(Error::Bus)?;
            self.scratch[i] = self.wait_for_byte()?;

            let ack = if i == count - 1 { Ack::Nack } else { Ack::Ack };
            self.controller.acknowledge(ack).map_err(Error::Bus)?;
            self.wait_idle(Phase::Acknowledge)?;
        }
        Ok(())
    }

    /// Close the transaction with a STOP. After a failure the STOP is still
    /// attempted so the peripheral lets go of the bus, but its outcome is
    /// not waited for.
    fn finish(&mut self, result: Result<(), Error<C::Error>>) -> Result<(), Error<C::Error>> {
        match result {
            Ok(()) => self.begin(Phase::Stop),
            Err(e) => {
                warn!("bus transaction aborted");
                let _ = self.controller.stop();
                Err(e)
            }
        }
    }

    fn begin(&mut self, phase: Phase) -> Result<(), Error<C::Error>> {
        let issued = match phase {
            Phase::Start => self.controller.start(),
            Phase::Restart => self.controller.restart(),
            _ => self.controller.stop(),
        };
        issued.map_err(Error::Bus)?;
        self.wait_idle(phase)
    }

    fn send(&mut self, byte: u8, phase: Phase) -> Result<(), Error<C::Error>> {
        self.controller.transmit(byte).map_err(Error::Bus)?;
        self.wait_idle(phase)?;
        match self.controller.last_ack().map_err(Error::Bus)? {
            Ack::Ack => Ok(()),
            Ack::Nack => Err(Error::NoAck(phase)),
        }
    }

    fn wait_idle(&mut self, phase: Phase) -> Result<(), Error<C::Error>> {
        let mut polls = 0u32;
        while !self.controller.is_idle().map_err(Error::Bus)? {
            self.tick(&mut polls, phase)?;
        }
        Ok(())
    }

    fn wait_for_byte(&mut self) -> Result<u8, Error<C::Error>> {
        let mut polls = 0u32;
        loop {
            if let Some(byte) = self.controller.read_received().map_err(Error::Bus)? {
                return Ok(byte);
            }
            self.tick(&mut polls, Phase::Receive)?;
        }
    }

    fn tick(&self, polls: &mut u32, phase: Phase) -> Result<(), Error<C::Error>> {
        *polls = polls.saturating_add(1);
        match self.poll_limit {
            Some(limit) if *polls >= limit => {
                error!("timed out waiting for {:?}", phase);
                Err(Error::Timeout(phase))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, SimBus};
    use std::vec::Vec;

    fn engine(bus: SimBus) -> BusEngine<SimBus> {
        BusEngine::new(bus, &BusConfig::default())
    }

    #[test]
    fn write_register_frames_transaction() {
        let mut engine = engine(SimBus::new());
        engine.write_register(0xF4, 0x2E).unwrap();

        let bus = engine.release();
        assert_eq!(
            bus.events,
            [
                Event::Start,
                Event::Transmit(0xEE),
                Event::Transmit(0xF4),
                Event::Transmit(0x2E),
                Event::Stop,
            ]
        );
        assert_eq!(bus.registers[0xF4], 0x2E);
    }

    #[test]
    fn read_block_frames_transaction() {
        let mut bus = SimBus::new();
        bus.registers[0xF6] = 0x6C;
        bus.registers[0xF7] = 0xFA;
        let mut engine = engine(bus);

        assert_eq!(engine.read_block(0xF6, 2).unwrap(), &[0x6C, 0xFA]);

        let bus = engine.release();
        assert_eq!(
            bus.events,
            [
                Event::Start,
                Event::Transmit(0xEE),
                Event::Transmit(0xF6),
                Event::Restart,
                Event::Transmit(0xEF),
                Event::Receive(0x6C),
                Event::Acknowledge(Ack::Ack),
                Event::Receive(0xFA),
                Event::Acknowledge(Ack::Nack),
                Event::Stop,
            ]
        );
    }

    #[test]
    fn read_block_keeps_receive_order_and_nacks_last_byte_only() {
        for count in 1..=SCRATCH_LEN {
            let mut bus = SimBus::new();
            for i in 0..count {
                bus.registers[0x20 + i] = (i as u8).wrapping_mul(37) ^ 0x5A;
            }
            let expected: Vec<u8> = bus.registers[0x20..0x20 + count].to_vec();

            let mut engine = engine(bus);
            assert_eq!(engine.read_block(0x20, count).unwrap(), &expected[..]);
            assert_eq!(&engine.scratch()[..count], &expected[..]);

            let acks: Vec<Ack> = engine
                .release()
                .events
                .iter()
                .filter_map(|e| match e {
                    Event::Acknowledge(ack) => Some(*ack),
                    _ => None,
                })
                .collect();
            assert_eq!(acks.len(), count);
            assert_eq!(acks.iter().filter(|a| **a == Ack::Nack).count(), 1);
            assert_eq!(acks.last(), Some(&Ack::Nack));
        }
    }

    #[test]
    fn read_block_rejects_bad_lengths() {
        let mut engine = engine(SimBus::new());
        assert_eq!(engine.read_block(0xAA, 0), Err(Error::InvalidLength));
        assert_eq!(engine.read_block(0xAA, 23), Err(Error::InvalidLength));
        assert!(engine.release().events.is_empty());
    }

    #[test]
    fn missing_peripheral_reports_no_ack_and_stops() {
        let mut bus = SimBus::new();
        bus.present = false;
        let mut engine = engine(bus);

        assert_eq!(
            engine.write_register(0xF4, 0x2E),
            Err(Error::NoAck(Phase::AddressWrite))
        );
        let bus = engine.release();
        assert_eq!(
            bus.events,
            [Event::Start, Event::Transmit(0xEE), Event::Stop]
        );
    }

    #[test]
    fn stuck_completion_flag_times_out() {
        let mut bus = SimBus::new();
        bus.stall_after = Some(2);
        let config = BusConfig {
            poll_limit: Some(50),
            ..BusConfig::default()
        };
        let mut engine = BusEngine::new(bus, &config);

        assert_eq!(
            engine.read_block(0xAA, 22),
            Err(Error::Timeout(Phase::Register))
        );
        assert_eq!(engine.release().events.last(), Some(&Event::Stop));
    }

    #[test]
    fn receive_that_never_arrives_times_out() {
        let mut bus = SimBus::new();
        bus.withhold_bytes = true;
        let config = BusConfig {
            poll_limit: Some(10),
            ..BusConfig::default()
        };
        let mut engine = BusEngine::new(bus, &config);

        assert_eq!(
            engine.read_block(0xF6, 2),
            Err(Error::Timeout(Phase::Receive))
        );
    }
}
