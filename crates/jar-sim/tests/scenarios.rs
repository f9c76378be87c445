//! End-to-end scenarios against the simulated appliance.

use jar_kernel::hal::Melody;
use jar_kernel::Lifecycle;
use jar_proto::records::{CommandRecord, StatusCode, SLOT_APPEND};
use jar_sim::{HarnessOptions, JarHarness, PeerMode, ScriptedPeer};

const SEC: u64 = 1_000_000;

fn coarse() -> HarnessOptions {
    HarnessOptions {
        poll_period_us: 100_000,
        ..Default::default()
    }
}

#[test]
fn cold_boot_with_fresh_nv_store() {
    let mut jar = JarHarness::new(HarnessOptions::default());

    // A factory-fresh store read as NaN; the defaults were written back.
    assert_eq!(jar.nv.raw(0, 4), 0.3f32.to_le_bytes().to_vec());
    assert_eq!(jar.nv.raw(4, 4), 0.01f32.to_le_bytes().to_vec());
    assert_eq!(jar.nv.raw(8, 4), 0.0f32.to_le_bytes().to_vec());
    assert_eq!(jar.shared.with(|s| s.kp), 0.3);

    // The first published status frame leads with code 0.
    jar.run_for(SEC);
    let statuses = jar.link.statuses();
    assert!(!statuses.is_empty());
    assert_eq!(statuses[0].1.code, 0);
    // The OLED helper saw the same record.
    assert_eq!(jar.display.last().unwrap().code, 0);
}

#[test]
fn absolute_slot_upload_then_execute() {
    let mut jar = JarHarness::new(coarse());

    // Absolute slot 0: TARGET_TEMPERATURE 8 °C.
    jar.send_line("WV,001B,0200080000000000.");
    jar.set_vessel_temperature(8.0);

    // Ten seconds to fill the sample pipeline, then the 120 s dwell.
    jar.run_for(140 * SEC);

    let status = jar.snapshot();
    assert_eq!(status.cmdid, 1, "dwell did not complete: {status:?}");
    assert_eq!(jar.shared.with(|s| s.target_c), 8.0);
    // The measured temperature rode within the band the whole time.
    let current = jar.shared.with(|s| s.current_c);
    assert!((current - 8.0).abs() <= 0.5, "current was {current}");
}

#[test]
fn append_beyond_capacity_latches_overflow() {
    let mut jar = JarHarness::new(coarse());

    for _ in 0..33 {
        jar.send_command(&CommandRecord::hold(1, SLOT_APPEND));
    }
    jar.run_for(SEC);

    let status = jar.snapshot();
    assert_eq!(status.cmdnum, 32);
    assert_eq!(status.code, StatusCode::CommandOverflow as i8);

    // The fault is sticky: later passes keep publishing it.
    jar.run_for(5 * SEC);
    assert_eq!(jar.snapshot().code, StatusCode::CommandOverflow as i8);
    // Control is frozen.
    assert_eq!(jar.shared.with(|s| s.target_c), 0.0);
}

#[test]
fn hold_with_long_remaining_time() {
    let mut jar = JarHarness::new(coarse());

    jar.send_command(&CommandRecord::hold(120, SLOT_APPEND));
    jar.run_for(SEC);

    // 120 minutes pending: reported as minutes with bit 15 set.
    assert_eq!(jar.snapshot().remain_time, 120 | 0x8000);

    // An hour from the end the encoding switches to plain seconds.
    jar.run_for(3599 * SEC);
    let remain = jar.snapshot().remain_time;
    assert_eq!(remain & 0x8000, 0, "still in minutes: {remain:#06x}");
    assert!(
        (3590..=3600).contains(&remain),
        "remain was {remain} seconds"
    );

    // Past the full two hours: melody and advance.
    jar.run_for(3700 * SEC);
    assert_eq!(jar.snapshot().cmdid, 1);
    assert_eq!(jar.snapshot().remain_time, 0);
    assert_eq!(jar.sounder.played(), vec![Melody::Notify]);
}

#[test]
fn phase_angle_firing_distance_at_half_rate() {
    let mut jar = JarHarness::new(HarnessOptions {
        zero_cross_period_us: Some(10_000),
        poll_period_us: 1_000,
        ..Default::default()
    });

    // Pin the controller inputs to a clean rate of 0.5; the short run ends
    // before the sampler would overwrite the measurement.
    jar.shared.with(|s| {
        s.kp = 0.5;
        s.target_c = 61.0;
        s.current_c = 60.0;
    });

    jar.run_for(35_000);

    let transitions = jar.gate.transitions();
    let highs: Vec<u64> = transitions
        .iter()
        .filter(|(_, level)| *level)
        .map(|(t, _)| *t)
        .collect();
    assert!(!highs.is_empty(), "gate never fired: {transitions:?}");
    for t_high in &highs {
        // Distance from the preceding zero-cross edge on the 10 ms grid.
        let offset = t_high % 10_000;
        assert!(
            (5_000..=5_200).contains(&offset),
            "gate HIGH at {offset} µs into the half-cycle"
        );
    }
    assert_eq!(jar.snapshot().power, 50);
}

#[test]
fn wireless_loss_recovers_through_module_reboot() {
    let mut jar = JarHarness::new(HarnessOptions {
        poll_period_us: 10_000,
        peer: PeerMode::Scripted(ScriptedPeer {
            drop_acks: 3,
            nak_acks: 0,
            drop_reboots: 1,
        }),
        ..Default::default()
    });

    // t=0 publish, timeouts at 1 s and 2 s trigger resends, 3 s starts the
    // module reboot; the first `R,1` is ignored, the second gets `CMD`.
    jar.run_for(6 * SEC);

    assert_eq!(jar.link.reboot_requests(), 2);
    assert_eq!(jar.link.statuses().len(), 3);
    assert_eq!(jar.snapshot().code, 0, "recovery must not latch a fault");

    // Traffic continues normally afterwards.
    jar.run_for(10 * SEC);
    assert!(jar.link.statuses().len() > 3);
    assert_eq!(jar.snapshot().code, 0);
}

#[test]
fn wireless_loss_exhausts_and_latches_device_fault() {
    let mut jar = JarHarness::new(HarnessOptions {
        poll_period_us: 10_000,
        peer: PeerMode::Scripted(ScriptedPeer {
            drop_acks: usize::MAX,
            nak_acks: 0,
            drop_reboots: usize::MAX,
        }),
        ..Default::default()
    });

    // 3 unanswered notifications, then 3 unanswered reboots.
    jar.run_for(8 * SEC);
    assert_eq!(jar.snapshot().code, StatusCode::BtDeviceError as i8);
    assert_eq!(jar.link.reboot_requests(), 3);
}

#[test]
fn power_switch_shuts_the_appliance_down() {
    let mut jar = JarHarness::new(HarnessOptions::default());
    jar.run_for(SEC);
    assert_eq!(jar.kernel.lifecycle(), Lifecycle::Active);
    assert!(jar.power_hold.is_high());

    jar.power_switch.press();
    jar.run_for(SEC);

    assert_eq!(jar.kernel.lifecycle(), Lifecycle::Shutdown);
    assert!(!jar.power_hold.is_high());
    assert!(!jar.gate.is_high());
    assert_eq!(jar.sounder.played(), vec![Melody::Shutdown]);
}

#[test]
fn plant_coupled_cook_reaches_and_holds_target() {
    let mut jar = JarHarness::new(HarnessOptions {
        zero_cross_period_us: Some(10_000),
        poll_period_us: 10_000,
        plant: Some(jar_sim::JarPlant::new(25.0)),
        ..Default::default()
    });

    // target 60 °C, then finish.
    jar.send_command(&CommandRecord::target_temperature(60, SLOT_APPEND));
    jar.send_command(&CommandRecord::finish(SLOT_APPEND));

    jar.run_for(600 * SEC);

    let current = jar.shared.with(|s| s.current_c);
    assert!(
        (current - 60.0).abs() < 3.0,
        "vessel settled at {current} °C"
    );
    assert_eq!(jar.snapshot().code, 1);
}
