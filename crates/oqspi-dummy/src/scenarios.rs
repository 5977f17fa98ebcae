//! Driver scenarios run against the emulator

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;

use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash};
use oqspi_core::background::{
    BackgroundScheduler, BlockingQueue, OperationQueue, OperationStatus, PendingFlashOperation,
    Requester,
};
use oqspi_core::bus::{opcodes, BusFeatures, BusMode, ClockDivider, OqspiBus, SysClock};
use oqspi_core::chip::{
    macronix::MX25U6432, winbond::W25Q64JWIM, FlashDeviceConfig, JedecId, DEVICE_TABLE,
};
use oqspi_core::config::{DetectionPolicy, DriverConfig, PowerMode};
use oqspi_core::flash::{FlashController, FlashDevice, OqspiFlash};
use oqspi_core::Error;

use crate::{DummyConfig, DummyOqspi, ProgramRecord};

static W25Q: FlashDeviceConfig = W25Q64JWIM;
static MX: FlashDeviceConfig = MX25U6432;

const MAX_IDLE_SLOTS: usize = 100_000;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ready(bus: DummyOqspi, settings: DriverConfig) -> OqspiFlash<DummyOqspi> {
    init_logger();
    let mut flash = OqspiFlash::new(bus, settings);
    assert_eq!(flash.init(), Ok(true));
    flash.controller_mut().bus_mut().clear_log();
    flash
}

fn ready_default() -> OqspiFlash<DummyOqspi> {
    ready(DummyOqspi::new_default(), DriverConfig::default())
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

/// Run the CPU's interrupt handler if anything is pending
fn service_interrupts(bus: &mut DummyOqspi) {
    let was_enabled = bus.disable_interrupts();
    bus.restore_interrupts(was_enabled);
}

/// Hand idle slots to the scheduler until nothing is pending
///
/// Code keeps executing from flash between slots, which the emulator
/// flags if the device is still busy.
fn drain<R: Requester>(
    sched: &mut BackgroundScheduler<'_, R>,
    ctrl: &mut FlashController<DummyOqspi>,
) -> usize {
    let mut completed = 0;
    for _ in 0..MAX_IDLE_SLOTS {
        if !sched.is_pending() {
            return completed;
        }
        if sched.idle_cycle(ctrl) {
            completed += 1;
        }
        service_interrupts(ctrl.bus_mut());
        let mut fetch = [0u8; 4];
        ctrl.read(0, &mut fetch);
    }
    panic!("background operations never finished");
}

#[derive(Clone)]
struct Completions(Rc<RefCell<Vec<Result<u32, Error>>>>);

impl Completions {
    fn new() -> Self {
        Self(Rc::new(RefCell::new(Vec::new())))
    }

    fn seen(&self) -> Vec<Result<u32, Error>> {
        self.0.borrow().clone()
    }
}

impl Requester for Completions {
    fn complete(self, result: Result<u32, Error>) {
        self.0.borrow_mut().push(result);
    }
}

// ============================================================================
// Identification
// ============================================================================

#[test]
fn test_init_identifies_every_table_part() {
    for chip in DEVICE_TABLE.iter() {
        let mut flash = ready(
            DummyOqspi::new(DummyConfig::new(chip)),
            DriverConfig::default(),
        );
        assert_eq!(flash.controller().active_config().name, chip.name);
        assert_eq!(flash.get_config(), (chip.jedec.id, true));
        assert_eq!(flash.device_size(), chip.size_bytes());

        let bus = flash.controller().bus();
        assert!(bus.quad_enabled(), "{}", chip.name);
        assert!(bus.violations().is_empty(), "{}: {:?}", chip.name, bus.violations());

        // Quad continuous read straight after init
        let mut buf = [0u8; 8];
        flash.read(0x100, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 8]);
        let bus = flash.controller().bus();
        assert!(bus.in_continuous_mode());
        assert!(bus.violations().is_empty(), "{}: {:?}", chip.name, bus.violations());
    }
}

#[test]
fn test_autodetect_identify_is_idempotent() {
    let mut flash = ready_default();
    let id = JedecId::new(0xEF, 0x80, 0x17);

    let mut buf = [0u8; 4];
    flash.read(0, &mut buf).unwrap();
    assert_eq!(flash.identify(), Some(id));
    flash.read(0, &mut buf).unwrap();
    assert_eq!(flash.identify(), Some(id));

    assert_eq!(flash.controller().active_config().name, "W25Q64JWIM");
    assert!(flash.controller().bus().violations().is_empty());
}

#[test]
fn test_reset_recovers_unknown_device_states() {
    let configs = [
        DummyConfig::default().starting_in_continuous_mode(),
        DummyConfig::default().starting_powered_down(),
        DummyConfig::default().starting_in_qpi(),
        DummyConfig::new(&MX)
            .starting_in_continuous_mode()
            .starting_powered_down(),
    ];
    for config in configs {
        let flash = ready(DummyOqspi::new(config), DriverConfig::default());
        let bus = flash.controller().bus();
        assert!(!bus.is_powered_down());
        assert!(!bus.in_qpi());
        assert!(bus.violations().is_empty(), "{:?}", bus.violations());
    }
}

#[test]
fn test_config_verify_reset_exits_continuous_mode() {
    let bus = DummyOqspi::new(DummyConfig::default().starting_in_continuous_mode());
    let flash = ready(
        bus,
        DriverConfig::new(DetectionPolicy::ConfigVerify(&W25Q)),
    );
    let bus = flash.controller().bus();
    assert!(bus.violations().is_empty(), "{:?}", bus.violations());
}

#[test]
fn test_config_verify_exit_word_uses_read_opcode_mode() {
    let mut flash = ready(
        DummyOqspi::new_default(),
        DriverConfig::new(DetectionPolicy::ConfigVerify(&W25Q)),
    );
    let mut buf = [0u8; 8];
    flash.read(0x100, &mut buf).unwrap();
    assert!(flash.controller().bus().in_continuous_mode());

    let ctrl = flash.controller_mut();
    ctrl.set_bus_mode(BusMode::Quad, false);
    ctrl.bus_mut().clear_log();
    ctrl.reset_sequence();

    let bus = flash.controller().bus();
    let exit = bus
        .log()
        .iter()
        .find(|t| !t.bytes.is_empty() && t.bytes.iter().all(|&b| b == 0xFF))
        .expect("no exit sequence sent");
    assert_eq!(exit.mode, W25Q.read.opcode_bus_mode);
    assert!(!bus.in_continuous_mode());
    assert!(bus.violations().is_empty(), "{:?}", bus.violations());
}

#[test]
fn test_reset_settle_delay() {
    init_logger();
    let mut flash = OqspiFlash::new(DummyOqspi::new_default(), DriverConfig::default());
    assert_eq!(flash.init(), Ok(true));
    assert!(flash.controller().bus().total_delay_us() >= 12000);
}

#[test]
fn test_octa_reset_uses_dual_byte_opcodes() {
    let bus = DummyOqspi::new(DummyConfig::default().with_features(BusFeatures::OCTA_PINS));
    init_logger();
    let mut flash = OqspiFlash::new(bus, DriverConfig::default());
    assert_eq!(flash.init(), Ok(true));

    let log = flash.controller().bus().log();
    let octa = |bytes: &[u8]| {
        log.iter()
            .any(|t| t.mode == BusMode::Octa && t.bytes == bytes)
    };
    assert!(octa(&[opcodes::RSTEN]));
    assert!(octa(&[opcodes::RSTEN, !opcodes::RSTEN]));
    assert!(octa(&[opcodes::RST, !opcodes::RST]));
    assert!(octa(&[opcodes::RDP, !opcodes::RDP]));
    assert!(log.iter().any(|t| t.mode == BusMode::Octa && t.is_dual_byte()));
    assert!(flash.controller().bus().violations().is_empty());
}

#[test]
fn test_slow_clock_fallback_restores_divider() {
    init_logger();
    let bus = DummyOqspi::new(DummyConfig::default().with_rdid_min_divider(ClockDivider::Div8));
    let mut flash = OqspiFlash::new(bus, DriverConfig::default());
    assert_eq!(flash.init(), Ok(true));
    assert_eq!(flash.controller().bus().clock_divider(), ClockDivider::Div1);

    assert!(flash.identify().is_some());
    assert_eq!(flash.controller().bus().clock_divider(), ClockDivider::Div1);
}

#[test]
fn test_alternate_rdid_fallback() {
    init_logger();
    let bus = DummyOqspi::new(DummyConfig::default().with_rdid_alternate_only());
    let mut flash = OqspiFlash::new(bus, DriverConfig::default());
    assert_eq!(flash.init(), Ok(true));

    let rdid: Vec<_> = flash
        .controller()
        .bus()
        .log()
        .iter()
        .filter(|t| t.opcode() == Some(opcodes::RDID))
        .map(|t| t.bytes.len())
        .collect();
    assert_eq!(rdid, [1, 4]);
}

#[test]
fn test_absent_device_under_every_policy() {
    init_logger();
    let strict = [
        DriverConfig::default(),
        DriverConfig::new(DetectionPolicy::ConfigVerify(&W25Q)),
    ];
    for settings in strict {
        let mut flash = OqspiFlash::new(DummyOqspi::new(DummyConfig::absent()), settings);
        assert_eq!(flash.init(), Err(Error::ChipNotFound));
        assert_eq!(flash.get_config(), (JedecId::default(), false));
    }

    let settings = DriverConfig::new(DetectionPolicy::Default(&W25Q));
    let mut flash = OqspiFlash::new(DummyOqspi::new(DummyConfig::absent()), settings);
    assert_eq!(flash.init(), Ok(false));
    assert_eq!(flash.controller().active_config().name, "generic");
    assert_eq!(flash.device_size(), W25Q.size_bytes());
    assert_eq!(flash.get_config(), (JedecId::default(), false));

    // Both RDID forms at both clock dividers
    let reads = flash
        .controller()
        .bus()
        .log()
        .iter()
        .filter(|t| t.opcode() == Some(opcodes::RDID))
        .count();
    assert_eq!(reads, 4);
}

#[test]
fn test_default_policy_accepts_any_answering_device() {
    init_logger();
    let bus = DummyOqspi::new(DummyConfig::default().with_jedec(JedecId::new(0x20, 0xBA, 0x17)));
    let settings = DriverConfig::new(DetectionPolicy::Default(&W25Q));
    let mut flash = OqspiFlash::new(bus, settings);
    assert_eq!(flash.init(), Ok(true));
    assert_eq!(flash.controller().active_config().name, "W25Q64JWIM");
    assert_eq!(flash.get_config(), (JedecId::new(0x20, 0xBA, 0x17), true));
}

#[test]
fn test_config_verify_rejects_other_part() {
    init_logger();
    let bus = DummyOqspi::new(DummyConfig::new(&MX));
    let settings = DriverConfig::new(DetectionPolicy::ConfigVerify(&W25Q));
    let mut flash = OqspiFlash::new(bus, settings);
    assert_eq!(flash.init(), Err(Error::ChipNotFound));
}

// ============================================================================
// Blocking operations
// ============================================================================

#[test]
fn test_write_page_stays_in_its_page() {
    let mut flash = ready_default();

    assert_eq!(flash.write_page(0x10F0, &[0xAA; 64]), Ok(16));
    assert_eq!(flash.write_page(0x2000, &[0x55; 200]), Ok(128));
    assert_eq!(flash.write_page(0x3000, &[]), Err(Error::InvalidLength));
    let size = flash.device_size();
    assert_eq!(flash.write_page(size, &[0]), Err(Error::AddressOutOfBounds));

    let bus = flash.controller().bus();
    assert_eq!(
        bus.program_log(),
        &[
            ProgramRecord {
                addr: 0x10F0,
                len: 16
            },
            ProgramRecord {
                addr: 0x2000,
                len: 128
            },
        ]
    );
    assert_eq!(&bus.data()[0x10F0..0x1100], &[0xAA; 16]);
    assert_eq!(bus.data()[0x1100], 0xFF);
    assert!(bus.violations().is_empty());
}

#[test]
fn test_oversized_max_write_size_is_clamped() {
    let settings = DriverConfig::default().with_max_write_size(512);
    let mut flash = ready(DummyOqspi::new_default(), settings);
    assert_eq!(flash.write_page(0x4000, &[0x00; 300]), Ok(256));
    assert!(flash.controller().bus().violations().is_empty());
}

#[test]
fn test_write_across_pages() {
    let mut flash = ready_default();
    let data = pattern(400);
    FlashDevice::write(&mut flash, 0x5080, &data).unwrap();

    let lens: Vec<_> = flash
        .controller()
        .bus()
        .program_log()
        .iter()
        .map(|p| p.len)
        .collect();
    assert_eq!(lens, [128, 128, 128, 16]);

    let mut back = vec![0u8; 400];
    flash.read(0x5080, &mut back).unwrap();
    assert_eq!(back, data);
}

#[test]
fn test_erase_sector_leaves_all_ones() {
    let mut image = vec![0u8; 0x4000];
    image[0x0FFF] = 0x12;
    let mut flash = ready(
        DummyOqspi::with_data(DummyConfig::default(), &image),
        DriverConfig::default(),
    );

    flash.erase_sector(0x1234).unwrap();
    let bus = flash.controller().bus();
    assert!(bus.data()[0x1000..0x2000].iter().all(|&b| b == 0xFF));
    assert_eq!(bus.data()[0x0FFF], 0x12);
    assert_eq!(bus.data()[0x2000], 0x00);
    assert_eq!(bus.erase_log(), &[0x1000]);
    assert!(bus.violations().is_empty());

    let size = flash.device_size();
    assert_eq!(flash.erase_sector(size), Err(Error::AddressOutOfBounds));
}

#[test]
fn test_erase_range_alignment() {
    let mut flash = ready_default();
    assert_eq!(
        FlashDevice::erase(&mut flash, 0x1001, 0x1000),
        Err(Error::InvalidAlignment)
    );
    FlashDevice::erase(&mut flash, 0x2000, 0x3000).unwrap();
    assert_eq!(flash.controller().bus().erase_log(), &[0x2000, 0x3000, 0x4000]);
}

#[test]
fn test_chip_erase() {
    let image = vec![0u8; 0x2000];
    let mut flash = ready(
        DummyOqspi::with_data(DummyConfig::default(), &image),
        DriverConfig::default(),
    );
    flash.erase_chip();
    let bus = flash.controller().bus();
    assert!(bus.data().iter().all(|&b| b == 0xFF));
    assert!(!bus.is_busy());
}

#[test]
fn test_auto_erase_engine() {
    let image = vec![0u8; 0x4000];
    let bus = DummyOqspi::with_data(
        DummyConfig::default().with_features(BusFeatures::AUTO_ERASE),
        &image,
    );
    let settings = DriverConfig::default().with_erase_in_auto_mode(true);
    let mut flash = ready(bus, settings);

    flash.erase_sector(0x3000).unwrap();
    let bus = flash.controller().bus();
    assert!(bus.erase_instruction().is_some());
    assert_eq!(bus.erase_log(), &[0x3000]);
    assert!(bus.log().iter().all(|t| t.opcode() != Some(opcodes::SE_20)));
    assert!(bus.data()[0x3000..0x4000].iter().all(|&b| b == 0xFF));
    assert!(bus.violations().is_empty());
}

#[test]
fn test_address_helpers() {
    let flash = ready_default();
    assert_eq!(flash.physical_address(0x100), 0x3800_0100);
    assert!(flash.is_valid_address(0));
    assert!(flash.is_valid_address(flash.device_size() - 1));
    assert!(!flash.is_valid_address(flash.device_size()));
}

// ============================================================================
// Power and clocking
// ============================================================================

#[test]
fn test_deep_power_down_round_trip() {
    let settings = DriverConfig::default().with_power_mode(PowerMode::PowerDown);
    let mut flash = ready(DummyOqspi::new_default(), settings);

    flash.power_down();
    assert!(flash.controller().bus().is_powered_down());
    assert!(!flash.controller().bus().clock_enabled());

    flash.power_up().unwrap();
    assert!(!flash.controller().bus().is_powered_down());
    assert!(flash.controller().bus().clock_enabled());

    assert_eq!(flash.write_page(0x100, &[0x5A]), Ok(1));
    let mut buf = [0u8; 1];
    flash.read(0x100, &mut buf).unwrap();
    assert_eq!(buf, [0x5A]);
    assert!(flash.controller().bus().violations().is_empty());
}

#[test]
fn test_power_off_reinitializes() {
    let settings = DriverConfig::default().with_power_mode(PowerMode::PowerOff);
    let mut flash = ready(DummyOqspi::new_default(), settings);

    flash.power_down();
    assert!(!flash.controller().bus().is_powered_down());
    let before = flash.controller().bus().total_delay_us();
    flash.power_up().unwrap();
    let waited = flash.controller().bus().total_delay_us() - before;
    assert!(waited >= u64::from(W25Q.delays.power_up_us));

    let mut buf = [0u8; 4];
    flash.read(0, &mut buf).unwrap();
    assert!(flash.controller().bus().violations().is_empty());
}

#[test]
fn test_sys_clock_cfg_retunes_macronix_dummy_cycles() {
    let mut flash = ready(DummyOqspi::new(DummyConfig::new(&MX)), DriverConfig::default());
    assert_eq!(flash.controller().bus().dummy_bytes(), 1);

    flash.sys_clock_cfg(SysClock::Rchs96).unwrap();
    let bus = flash.controller().bus();
    assert_eq!(bus.dummy_bytes(), 3);
    assert_eq!(bus.read_pipe_delay(), 0);
    assert_eq!(bus.config_register() & 0xC0, 0x80);

    flash.sys_clock_cfg(SysClock::Pll160).unwrap();
    let bus = flash.controller().bus();
    assert_eq!(bus.dummy_bytes(), 2);
    assert_eq!(bus.clock_divider(), ClockDivider::Div2);
    assert_eq!(bus.config_register() & 0xC0, 0x00);

    let mut buf = [0u8; 4];
    flash.read(0, &mut buf).unwrap();
    assert!(flash.controller().bus().violations().is_empty());
}

#[test]
fn test_init_follows_the_running_system_clock() {
    let config = DummyConfig::new(&MX).with_system_clock(SysClock::Rchs96);
    let flash = ready(DummyOqspi::new(config), DriverConfig::default());

    let bus = flash.controller().bus();
    assert_eq!(bus.dummy_bytes(), 3);
    assert_eq!(bus.config_register() & 0xC0, 0x80);
    assert_eq!(bus.clock_divider(), ClockDivider::Div1);
    assert_eq!(bus.status1() & 0x03, 0);
    assert_eq!(
        bus.read_status_instruction().map(|i| i.opcode),
        Some(MX.read_status.opcode)
    );
    assert_eq!(
        bus.suspend_resume_instruction().map(|i| i.suspend_opcode),
        Some(MX.suspend_resume.suspend_opcode)
    );
}

#[test]
fn test_sys_clock_cfg_leaves_fixed_dummy_parts_alone() {
    let mut flash = ready_default();
    flash.sys_clock_cfg(SysClock::Rchs96).unwrap();
    let bus = flash.controller().bus();
    assert_eq!(bus.dummy_bytes(), 2);
    assert_eq!(bus.read_pipe_delay(), 0);
    assert!(bus.log().is_empty());
}

// ============================================================================
// embedded-storage
// ============================================================================

#[test]
fn test_nor_flash_traits() {
    let mut flash = ready_default();
    assert_eq!(ReadNorFlash::capacity(&flash), 8 * 1024 * 1024);

    NorFlash::erase(&mut flash, 0x6000, 0x8000).unwrap();
    NorFlash::write(&mut flash, 0x6010, b"hello").unwrap();
    let mut buf = [0u8; 5];
    ReadNorFlash::read(&mut flash, 0x6010, &mut buf).unwrap();
    assert_eq!(&buf, b"hello");

    let err = NorFlash::erase(&mut flash, 0x6001, 0x7000).unwrap_err();
    assert_eq!(err.kind(), NorFlashErrorKind::NotAligned);
    let err = ReadNorFlash::read(&mut flash, 0x7F_FFFF, &mut buf).unwrap_err();
    assert_eq!(err.kind(), NorFlashErrorKind::OutOfBounds);
}

// ============================================================================
// Background operations
// ============================================================================

#[test]
fn test_background_write_in_two_passes() {
    let settings = DriverConfig::default().with_max_write_size(256);
    let mut flash = ready(DummyOqspi::new_default(), settings);
    let data = pattern(300);

    let done = Completions::new();
    let queue = OperationQueue::new();
    queue.submit(PendingFlashOperation::write(done.clone(), 0x1000, data.clone()).unwrap());
    let mut sched = BackgroundScheduler::new(&queue);
    assert_eq!(drain(&mut sched, flash.controller_mut()), 1);
    assert_eq!(done.seen(), [Ok(300)]);

    let bus = flash.controller().bus();
    assert_eq!(
        bus.program_log(),
        &[
            ProgramRecord {
                addr: 0x1000,
                len: 256
            },
            ProgramRecord {
                addr: 0x1100,
                len: 44
            },
        ]
    );
    assert_eq!(&bus.data()[0x1000..0x1000 + 300], &data[..]);
    assert!(bus.violations().is_empty());
}

fn run_background(config: DummyConfig) -> DummyOqspi {
    let image = vec![0u8; 0x8000];
    let mut flash = ready(DummyOqspi::with_data(config, &image), DriverConfig::default());

    let done = Completions::new();
    let queue = OperationQueue::new();
    queue.submit(PendingFlashOperation::erase(done.clone(), 0x4000));
    queue.submit(PendingFlashOperation::write(done.clone(), 0x4100, pattern(600)).unwrap());
    let mut sched = BackgroundScheduler::new(&queue);
    assert_eq!(drain(&mut sched, flash.controller_mut()), 2);
    assert_eq!(done.seen(), [Ok(4096), Ok(600)]);

    let bus = flash.into_bus();
    assert!(bus.violations().is_empty(), "{:?}", bus.violations());
    bus
}

#[test]
fn test_suspended_operations_match_uninterrupted_run() {
    let slow = DummyConfig::default().with_busy_ticks(6, 10);
    let quiet = run_background(slow.clone());
    let interrupted = run_background(slow.with_irq_every(3));

    assert_eq!(quiet.suspend_count(), 0);
    assert!(interrupted.suspend_count() > 0);
    assert!(interrupted.irqs_serviced() > 0);
    assert!(quiet.data() == interrupted.data());

    assert!(interrupted.data()[0x4000..0x4100].iter().all(|&b| b == 0xFF));
    assert_eq!(&interrupted.data()[0x4100..0x4100 + 600], &pattern(600)[..]);
    assert!(interrupted.data()[0x4100 + 600..0x5000]
        .iter()
        .all(|&b| b == 0xFF));
}

#[test]
fn test_idle_slot_yields_to_pending_interrupt() {
    let mut flash = ready_default();
    let done = Completions::new();
    let queue = OperationQueue::new();
    queue.submit(PendingFlashOperation::erase(done.clone(), 0x3000));
    let mut sched = BackgroundScheduler::new(&queue);

    flash.controller_mut().bus_mut().raise_irq();
    assert!(!sched.idle_cycle(flash.controller_mut()));
    assert!(sched.active().is_none());
    assert!(flash.controller().bus().log().is_empty());
    assert!(flash.controller().bus().interrupts_enabled());

    service_interrupts(flash.controller_mut().bus_mut());
    assert_eq!(flash.controller().bus().irqs_serviced(), 1);
    assert_eq!(drain(&mut sched, flash.controller_mut()), 1);
    assert_eq!(done.seen(), [Ok(4096)]);
    assert_eq!(flash.controller().bus().erase_log(), &[0x3000]);
}

#[test]
fn test_resume_before_register_write() {
    let config = DummyConfig::new(&MX)
        .with_busy_ticks(6, 10)
        .with_irq_every(2);
    let mut flash = ready(DummyOqspi::new(config), DriverConfig::default());

    let done = Completions::new();
    let queue = OperationQueue::new();
    queue.submit(PendingFlashOperation::erase(done.clone(), 0x2000));
    let mut sched = BackgroundScheduler::new(&queue);

    assert!(!sched.idle_cycle(flash.controller_mut()));
    let status = sched.active().map(|op| op.status());
    assert_eq!(status, Some(OperationStatus::Suspended));
    assert!(flash.controller().bus().is_suspended());

    sched
        .sys_clock_cfg(flash.controller_mut(), SysClock::Rchs96)
        .unwrap();
    let bus = flash.controller().bus();
    assert!(!bus.is_suspended());
    assert_eq!(bus.config_register() & 0xC0, 0x80);

    assert_eq!(drain(&mut sched, flash.controller_mut()), 1);
    assert_eq!(done.seen(), [Ok(4096)]);
    assert!(flash.controller().bus().violations().is_empty());
}

#[test]
fn test_concurrent_erases_complete_in_submission_order() {
    let image = vec![0u8; 0x8000];
    let mut flash = ready(
        DummyOqspi::with_data(DummyConfig::default().with_irq_every(4), &image),
        DriverConfig::default(),
    );
    let queue = Arc::new(BlockingQueue::new());

    let mut requesters = Vec::new();
    for (i, addr) in [0x5000u32, 0x6000].into_iter().enumerate() {
        let q = Arc::clone(&queue);
        requesters.push(thread::spawn(move || q.erase_sector_bg(addr)));
        while queue.len() <= i {
            thread::yield_now();
        }
    }

    let mut sched = BackgroundScheduler::new(&*queue);
    assert_eq!(drain(&mut sched, flash.controller_mut()), 2);
    for requester in requesters {
        assert_eq!(requester.join().unwrap(), Ok(4096));
    }

    let bus = flash.controller().bus();
    assert_eq!(bus.erase_log(), &[0x5000, 0x6000]);
    assert!(bus.data()[0x5000..0x7000].iter().all(|&b| b == 0xFF));
    assert!(bus.data()[0x4000..0x5000].iter().all(|&b| b == 0x00));
    assert!(bus.violations().is_empty());
}

#[test]
fn test_blocking_write_from_another_thread() {
    let mut flash = ready_default();
    let queue = Arc::new(BlockingQueue::new());
    let data = pattern(700);

    let requester = {
        let q = Arc::clone(&queue);
        let data = data.clone();
        thread::spawn(move || q.write_page_bg(0x7010, &data))
    };
    while queue.is_empty() {
        thread::yield_now();
    }

    let mut sched = BackgroundScheduler::new(&*queue);
    assert_eq!(drain(&mut sched, flash.controller_mut()), 1);
    assert_eq!(requester.join().unwrap(), Ok(700));
    assert_eq!(&flash.controller().bus().data()[0x7010..0x7010 + 700], &data[..]);
}

#[test]
fn test_background_write_past_device_end_is_refused() {
    let mut flash = ready_default();
    let size = flash.device_size();

    let done = Completions::new();
    let queue = OperationQueue::new();
    queue.submit(PendingFlashOperation::write(done.clone(), size - 0x80, pattern(256)).unwrap());
    queue.submit(PendingFlashOperation::erase(done.clone(), size));
    queue.submit(PendingFlashOperation::write(done.clone(), size - 0x100, pattern(256)).unwrap());
    let mut sched = BackgroundScheduler::new(&queue);
    assert_eq!(drain(&mut sched, flash.controller_mut()), 1);
    assert_eq!(
        done.seen(),
        [
            Err(Error::AddressOutOfBounds),
            Err(Error::AddressOutOfBounds),
            Ok(256)
        ]
    );

    let bus = flash.controller().bus();
    assert_eq!(
        bus.program_log(),
        &[ProgramRecord {
            addr: size - 0x100,
            len: 256
        }]
    );
    assert!(bus.erase_log().is_empty());
    assert!(bus.violations().is_empty());
}

#[test]
fn test_blocking_write_past_device_end_reports_error() {
    let mut flash = ready_default();
    let size = flash.device_size();
    let queue = Arc::new(BlockingQueue::new());

    assert_eq!(
        queue.write_page_bg(0xFFFF_FF80, &pattern(256)),
        Err(Error::AddressOutOfBounds)
    );
    assert!(queue.is_empty());

    let requester = {
        let q = Arc::clone(&queue);
        thread::spawn(move || q.write_page_bg(size - 0x80, &pattern(256)))
    };
    while queue.is_empty() {
        thread::yield_now();
    }

    let mut sched = BackgroundScheduler::new(&*queue);
    assert_eq!(drain(&mut sched, flash.controller_mut()), 0);
    assert_eq!(requester.join().unwrap(), Err(Error::AddressOutOfBounds));
    let bus = flash.controller().bus();
    assert!(bus.program_log().is_empty());
    assert!(bus.violations().is_empty(), "{:?}", bus.violations());
}
