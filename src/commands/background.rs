//! Background command implementation
//!
//! Requester threads queue erases and writes and block until they are
//! done, while the main thread plays the idle context: it hands idle
//! slots to the scheduler, services the interrupts the emulator raises
//! and keeps fetching from the mapped window in between.

use crate::error::{CliError, Result};
use crate::target::{check_range, Target};
use indicatif::ProgressBar;
use oqspi_core::background::{BackgroundScheduler, BlockingQueue, CompletionSender};
use oqspi_core::bus::OqspiBus;
use oqspi_core::flash::{FlashController, FlashDevice};
use std::thread;

/// One sector's share of the programmed range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    sector: u32,
    start: u32,
    len: u32,
}

/// Split `start..start + len` at erase block boundaries
fn segments(start: u32, len: u32, block: u32) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut addr = start;
    let end = start + len;
    while addr < end {
        let sector = addr - addr % block;
        let seg_end = end.min(sector + block);
        out.push(Segment {
            sector,
            start: addr,
            len: seg_end - addr,
        });
        addr = seg_end;
    }
    out
}

/// Byte expected at `addr` after the command
fn pattern_byte(addr: u32) -> u8 {
    (addr ^ (addr >> 8)) as u8
}

/// Run the background command
///
/// Every sector the range touches is erased as a whole before its share
/// is written.
pub fn run_background(flash: &mut Target, address: u32, length: u32, threads: u32) -> Result<()> {
    let block = flash.erase_granularity();
    check_range(address, length, flash.size())?;

    let segments = segments(address, length, block);
    let threads = (threads.max(1) as usize).min(segments.len().max(1));
    let suspends_before = flash.controller().bus().suspend_count();
    let irqs_before = flash.controller().bus().irqs_serviced();

    let queue = BlockingQueue::new();
    let pb = ProgressBar::new(length as u64);

    let slots = thread::scope(|s| -> Result<u64> {
        let mut requesters = Vec::new();
        for worker in 0..threads {
            let mine: Vec<Segment> = segments
                .iter()
                .copied()
                .skip(worker)
                .step_by(threads)
                .collect();
            let queue = &queue;
            let pb = pb.clone();
            requesters.push(s.spawn(move || -> Result<()> {
                for seg in mine {
                    queue.erase_sector_bg(seg.sector)?;
                    let data: Vec<u8> =
                        (seg.start..seg.start + seg.len).map(pattern_byte).collect();
                    let written = queue.write_page_bg(seg.start, &data)?;
                    pb.inc(written as u64);
                }
                Ok(())
            }));
        }

        let mut sched = BackgroundScheduler::new(&queue);
        let slots = run_idle_loop(&mut sched, flash.controller_mut(), || {
            requesters.iter().all(|r| r.is_finished())
        });

        for requester in requesters {
            requester.join().map_err(|_| CliError::RequesterPanicked)??;
        }
        Ok(slots)
    })?;
    pb.finish_with_message("Background programming complete");

    let mut readback = vec![0u8; length as usize];
    flash.read(address, &mut readback)?;
    for (i, &found) in readback.iter().enumerate() {
        let addr = address + i as u32;
        if found != pattern_byte(addr) {
            return Err(CliError::VerifyMismatch {
                addr,
                expected: pattern_byte(addr),
                found,
            });
        }
    }

    let bus = flash.controller().bus();
    println!(
        "Programmed {} bytes in {} segments from {} threads",
        length,
        segments.len(),
        threads
    );
    println!("  Idle slots:         {}", slots);
    println!("  Suspends:           {}", bus.suspend_count() - suspends_before);
    println!("  Interrupts handled: {}", bus.irqs_serviced() - irqs_before);
    Ok(())
}

/// Play the idle context until `done` reports every requester finished
///
/// Returns the number of idle slots handed to the scheduler.
fn run_idle_loop<B: OqspiBus>(
    sched: &mut BackgroundScheduler<'_, CompletionSender>,
    ctrl: &mut FlashController<B>,
    done: impl Fn() -> bool,
) -> u64 {
    let mut slots = 0u64;
    loop {
        if sched.is_pending() {
            slots += 1;
            sched.idle_cycle(ctrl);
        } else if done() {
            return slots;
        } else {
            thread::yield_now();
        }

        // Interrupt handlers run whenever the mask is lifted
        let was_enabled = ctrl.bus_mut().disable_interrupts();
        ctrl.bus_mut().restore_interrupts(was_enabled);

        // Application code keeps executing from flash
        let mut fetch = [0u8; 4];
        ctrl.read(0, &mut fetch);
    }
}
