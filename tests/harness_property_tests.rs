use std::collections::HashMap;

use proptest::prelude::*;

use dft_tb::{
    pack, unpack, BusOp, BusTiming, DftDriver, DftModel, HarnessConfig, ModelConfig, Register,
    SampleQuad, Testbench, Transaction, Verdict, Verifier, WishboneMaster, SLOTS,
};

/// Property testing helper: a freshly reset model.
fn reset_bench(model: ModelConfig) -> Testbench<DftModel> {
    let mut tb = Testbench::new(DftModel::new(model));
    tb.reset(HarnessConfig::default().reset_cycles).unwrap();
    tb
}

/// Registers that hold whatever was last written to them.
fn storage_register() -> impl Strategy<Value = Register> {
    prop_oneof![
        Just(Register::WriteAddr),
        Just(Register::WriteDataLo),
        Just(Register::WriteDataHi),
    ]
}

fn base_address() -> impl Strategy<Value = u32> {
    (0u32..0x1000).prop_map(|page| page << 20)
}

fn sample_quad() -> impl Strategy<Value = SampleQuad> {
    any::<[u16; 4]>().prop_map(SampleQuad)
}

/// Faster bus settings keep the property runs short.
fn quick_timing() -> BusTiming {
    BusTiming {
        settle_cycles: 2,
        ack_timeout: 100,
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// Property: storage registers read back the last value written
        #[test]
        fn prop_register_round_trip(
            reg in storage_register(),
            base in base_address(),
            data in any::<u32>(),
        ) {
            let mut tb = reset_bench(ModelConfig { base_address: base, ..ModelConfig::default() });
            let mut bus = WishboneMaster::new(&mut tb, quick_timing());
            bus.write(reg.address(base), data).unwrap();
            prop_assert_eq!(bus.read(reg.address(base)).unwrap(), data);
        }

        /// Property: back-to-back transactions each complete on their own
        /// acknowledge, however short the settle delay and however slow the
        /// device
        #[test]
        fn prop_tight_timing_round_trip(
            settle_cycles in 0u32..4,
            ack_latency in 0u32..20,
            lo in any::<u32>(),
            hi in any::<u32>(),
            addr in any::<u32>(),
        ) {
            let mut tb = reset_bench(ModelConfig {
                ack_latency: Some(ack_latency),
                ..ModelConfig::default()
            });
            let timing = BusTiming { settle_cycles, ack_timeout: 100 };
            let mut bus = WishboneMaster::new(&mut tb, timing).with_journal();
            bus.write(Register::WriteDataLo.offset(), lo).unwrap();
            bus.write(Register::WriteDataHi.offset(), hi).unwrap();
            bus.write(Register::WriteAddr.offset(), addr).unwrap();
            prop_assert_eq!(bus.read(Register::WriteDataHi.offset()).unwrap(), hi);
            prop_assert_eq!(bus.read(Register::WriteAddr.offset()).unwrap(), addr);
            prop_assert_eq!(bus.read(Register::WriteDataLo.offset()).unwrap(), lo);
            prop_assert_eq!(bus.journal().len(), 6);
            prop_assert!(!tb.acknowledge());
        }

        /// Property: strobe registers never read back what was written
        #[test]
        fn prop_strobes_self_clear(data in any::<u32>()) {
            let mut tb = reset_bench(ModelConfig::default());
            let mut bus = WishboneMaster::new(&mut tb, quick_timing());
            for reg in [Register::Control, Register::LoadStrobe] {
                bus.write(reg.address(0), data).unwrap();
                prop_assert_eq!(bus.read(reg.address(0)).unwrap(), 0);
                bus.write(reg.address(0), 0).unwrap();
            }
        }

        /// Property: unpacking a packed pair is the identity
        #[test]
        fn prop_pack_unpack_inverse(a in any::<u16>(), b in any::<u16>()) {
            prop_assert_eq!(unpack(pack(a, b)), (a, b));
            prop_assert_eq!(pack(a, b), (u32::from(b) << 16) | u32::from(a));
        }

        /// Property: slot words survive the trip through the bus layout
        #[test]
        fn prop_quad_words_inverse(quad in sample_quad()) {
            prop_assert_eq!(SampleQuad::from_words(quad.low_word(), quad.high_word()), quad);
        }

        /// Property: once a comparison fails the verdict stays failed
        #[test]
        fn prop_verdict_is_sticky(
            pass_before in 0usize..20,
            pass_after in 0usize..20,
            quad in sample_quad(),
            component in 0usize..4,
        ) {
            let mut verifier = Verifier::new();
            for i in 0..pass_before {
                prop_assert!(verifier.compare(i, &quad, &quad));
            }
            prop_assert_eq!(verifier.verdict(), Verdict::Pass);

            let mut broken = quad;
            broken.0[component] ^= 1;
            prop_assert!(!verifier.compare(pass_before, &quad, &broken));

            for i in 0..pass_after {
                prop_assert!(verifier.compare(pass_before + 1 + i, &quad, &quad));
                prop_assert_eq!(verifier.verdict(), Verdict::Fail);
            }
            prop_assert_eq!(verifier.mismatches().len(), 1);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        /// Property: loading a block addresses every slot exactly once per
        /// packed word, with each load strobe pulsed 1 then 0
        #[test]
        fn prop_load_block_is_complete(
            inputs in prop::collection::vec(sample_quad(), SLOTS),
        ) {
            let mut tb = reset_bench(ModelConfig::default());
            let bus = WishboneMaster::new(&mut tb, quick_timing()).with_journal();
            let mut driver = DftDriver::from_bus(bus, 0, 1_000);
            driver.load_block(&inputs).unwrap();
            let journal = driver.bus().take_journal();

            prop_assert!(journal.iter().all(|t| t.op == BusOp::Write));
            prop_assert_eq!(journal.len(), SLOTS * 8);

            let mut lo_slots: HashMap<u32, usize> = HashMap::new();
            let mut hi_slots: HashMap<u32, usize> = HashMap::new();
            for (n, chunk) in journal.chunks(4).enumerate() {
                let [data, addr, strobe_on, strobe_off]: &[Transaction; 4] =
                    chunk.try_into().unwrap();
                let slot = addr.data;
                prop_assert_eq!(addr.address, Register::WriteAddr.offset());
                prop_assert_eq!(strobe_on.address, Register::LoadStrobe.offset());
                prop_assert_eq!(strobe_on.data, 1);
                prop_assert_eq!(strobe_off.address, Register::LoadStrobe.offset());
                prop_assert_eq!(strobe_off.data, 0);

                let quad = inputs[slot as usize];
                if n % 2 == 0 {
                    prop_assert_eq!(data.address, Register::WriteDataLo.offset());
                    prop_assert_eq!(data.data, quad.low_word());
                    *lo_slots.entry(slot).or_default() += 1;
                } else {
                    prop_assert_eq!(data.address, Register::WriteDataHi.offset());
                    prop_assert_eq!(data.data, quad.high_word());
                    *hi_slots.entry(slot).or_default() += 1;
                }
            }
            prop_assert_eq!(lo_slots.len(), SLOTS);
            prop_assert_eq!(hi_slots.len(), SLOTS);
            prop_assert!(lo_slots.values().chain(hi_slots.values()).all(|&n| n == 1));

            prop_assert_eq!(&tb.device().inputs()[..], &inputs[..]);
        }
    }
}
