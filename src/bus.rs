//! Single-transaction Wishbone master.

use log::trace;

use crate::device::WishboneDevice;
use crate::error::{HarnessError, Result};
use crate::testbench::Testbench;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Read,
    Write,
}

impl std::fmt::Display for BusOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusOp::Read => f.write_str("read"),
            BusOp::Write => f.write_str("write"),
        }
    }
}

/// One completed request/acknowledge exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub address: u32,
    pub data: u32,
    pub op: BusOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusTiming {
    /// Cycles held after driving a request and after releasing it.
    pub settle_cycles: u32,
    /// Cycles to wait for acknowledge before giving up.
    pub ack_timeout: u64,
}

impl Default for BusTiming {
    fn default() -> Self {
        Self {
            settle_cycles: 10,
            ack_timeout: 10_000,
        }
    }
}

/// Borrows the testbench for a sequence of transactions. Only one
/// transaction is ever in flight.
#[derive(Debug)]
pub struct WishboneMaster<'tb, D> {
    tb: &'tb mut Testbench<D>,
    timing: BusTiming,
    journal: Option<Vec<Transaction>>,
}

impl<'tb, D: WishboneDevice> WishboneMaster<'tb, D> {
    pub fn new(tb: &'tb mut Testbench<D>, timing: BusTiming) -> Self {
        Self {
            tb,
            timing,
            journal: None,
        }
    }

    /// Keep a record of every completed transaction.
    pub fn with_journal(mut self) -> Self {
        self.journal = Some(Vec::new());
        self
    }

    pub fn journal(&self) -> &[Transaction] {
        self.journal.as_deref().unwrap_or_default()
    }

    pub fn take_journal(&mut self) -> Vec<Transaction> {
        self.journal.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub fn testbench(&mut self) -> &mut Testbench<D> {
        &mut *self.tb
    }

    pub fn write(&mut self, address: u32, data: u32) -> Result<()> {
        self.tb.set_address(address);
        self.tb.set_data_in(data);
        self.tb.set_write_enable(true);
        self.tb.set_strobe(true);
        self.tb.advance(self.timing.settle_cycles)?;

        self.wait_for_ack(BusOp::Write, address)?;

        self.tb.set_strobe(false);
        self.tb.set_write_enable(false);
        self.tb.advance(self.timing.settle_cycles)?;
        self.wait_for_release(BusOp::Write, address)?;

        self.record(Transaction {
            address,
            data,
            op: BusOp::Write,
        });
        Ok(())
    }

    pub fn read(&mut self, address: u32) -> Result<u32> {
        self.tb.set_address(address);
        self.tb.set_data_in(0);
        self.tb.set_write_enable(false);
        self.tb.set_strobe(true);
        self.tb.advance(self.timing.settle_cycles)?;

        self.wait_for_ack(BusOp::Read, address)?;
        let data = self.tb.data_out();

        self.tb.set_strobe(false);
        self.tb.advance(self.timing.settle_cycles)?;
        self.wait_for_release(BusOp::Read, address)?;

        self.record(Transaction {
            address,
            data,
            op: BusOp::Read,
        });
        Ok(data)
    }

    fn wait_for_ack(&mut self, op: BusOp, address: u32) -> Result<()> {
        match self.wait_for_acknowledge(true)? {
            None => Ok(()),
            Some(cycles) => Err(HarnessError::AckTimeout { op, address, cycles }),
        }
    }

    /// Acknowledge must drop before the next request, or that request would
    /// complete on this one's acknowledge.
    fn wait_for_release(&mut self, op: BusOp, address: u32) -> Result<()> {
        match self.wait_for_acknowledge(false)? {
            None => Ok(()),
            Some(cycles) => Err(HarnessError::AckStuck { op, address, cycles }),
        }
    }

    /// Clock until acknowledge reads `level`; `Some(cycles)` if the budget
    /// ran out first.
    fn wait_for_acknowledge(&mut self, level: bool) -> Result<Option<u64>> {
        let started = self.tb.cycles();
        while self.tb.acknowledge() != level {
            let waited = self.tb.cycles() - started;
            if waited >= self.timing.ack_timeout {
                return Ok(Some(waited));
            }
            self.tb.advance(1)?;
        }
        Ok(None)
    }

    fn record(&mut self, txn: Transaction) {
        trace!("{} {:#010x} = {:#010x}", txn.op, txn.address, txn.data);
        if let Some(journal) = self.journal.as_mut() {
            journal.push(txn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DftModel, ModelConfig};
    use crate::regs::Register;

    fn bench(config: ModelConfig) -> Testbench<DftModel> {
        let mut tb = Testbench::new(DftModel::new(config));
        tb.reset(100).unwrap();
        tb
    }

    #[test]
    fn write_then_read_back_staging_register() {
        let mut tb = bench(ModelConfig::default());
        let mut bus = WishboneMaster::new(&mut tb, BusTiming::default()).with_journal();
        let addr = Register::WriteDataLo.address(0);
        bus.write(addr, 0xDEAD_BEEF).unwrap();
        assert_eq!(bus.read(addr).unwrap(), 0xDEAD_BEEF);
        assert_eq!(
            bus.journal(),
            [
                Transaction { address: addr, data: 0xDEAD_BEEF, op: BusOp::Write },
                Transaction { address: addr, data: 0xDEAD_BEEF, op: BusOp::Read },
            ]
        );
    }

    #[test]
    fn transaction_releases_the_bus() {
        let mut tb = bench(ModelConfig::default());
        let before = tb.cycles();
        WishboneMaster::new(&mut tb, BusTiming::default())
            .write(Register::WriteAddr.address(0), 7)
            .unwrap();
        let ports = tb.ports();
        assert!(!ports.strobe);
        assert!(!ports.write_enable);
        assert!(!ports.acknowledge);
        // Acknowledge arrives inside the first settle window.
        assert_eq!(tb.cycles() - before, 20);
    }

    #[test]
    fn slow_acknowledge_is_waited_for() {
        let mut tb = bench(ModelConfig {
            ack_latency: Some(25),
            ..ModelConfig::default()
        });
        let before = tb.cycles();
        let mut bus = WishboneMaster::new(&mut tb, BusTiming::default());
        bus.write(Register::WriteDataHi.address(0), 0x55).unwrap();
        assert_eq!(bus.read(Register::WriteDataHi.address(0)).unwrap(), 0x55);
        assert!(tb.cycles() - before > 40);
    }

    #[test]
    fn missing_acknowledge_times_out() {
        let mut tb = bench(ModelConfig {
            ack_latency: None,
            ..ModelConfig::default()
        });
        let timing = BusTiming {
            settle_cycles: 10,
            ack_timeout: 50,
        };
        let err = WishboneMaster::new(&mut tb, timing)
            .read(Register::ReadAddr.address(0))
            .unwrap_err();
        match err {
            HarnessError::AckTimeout { op, address, cycles } => {
                assert_eq!(op, BusOp::Read);
                assert_eq!(address, 0x14);
                assert_eq!(cycles, 50);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn back_to_back_without_settle_delay() {
        let mut tb = bench(ModelConfig::default());
        let timing = BusTiming {
            settle_cycles: 0,
            ack_timeout: 100,
        };
        let mut bus = WishboneMaster::new(&mut tb, timing);
        bus.write(Register::WriteDataLo.address(0), 0x1111).unwrap();
        bus.write(Register::WriteDataHi.address(0), 0x2222).unwrap();
        assert_eq!(bus.read(Register::WriteDataHi.address(0)).unwrap(), 0x2222);
        assert_eq!(bus.read(Register::WriteDataLo.address(0)).unwrap(), 0x1111);
        assert!(!tb.acknowledge());
    }

    /// A slave that holds acknowledge after strobe drops.
    #[derive(Default)]
    struct StickyAck {
        clock: bool,
        strobe: bool,
        ack: bool,
    }

    impl WishboneDevice for StickyAck {
        fn set_clock(&mut self, high: bool) {
            self.clock = high;
        }
        fn set_address(&mut self, _: u32) {}
        fn set_data_in(&mut self, _: u32) {}
        fn set_write_enable(&mut self, _: bool) {}
        fn set_strobe(&mut self, active: bool) {
            self.strobe = active;
        }
        fn data_out(&self) -> u32 {
            0
        }
        fn acknowledge(&self) -> bool {
            self.ack
        }
        fn eval(&mut self) -> Result<()> {
            self.ack |= self.clock && self.strobe;
            Ok(())
        }
    }

    #[test]
    fn stuck_acknowledge_times_out_on_release() {
        let mut tb = Testbench::new(StickyAck::default());
        let timing = BusTiming {
            settle_cycles: 1,
            ack_timeout: 30,
        };
        let err = WishboneMaster::new(&mut tb, timing)
            .write(Register::WriteAddr.address(0), 3)
            .unwrap_err();
        assert!(matches!(
            err,
            HarnessError::AckStuck { op: BusOp::Write, address: 0x08, cycles: 30 }
        ));
    }
}
