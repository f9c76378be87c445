//! Status notification with retry and module recovery.
//!
//! A non-blocking state machine run from the foreground. Every publish
//! period it snapshots the status board (one critical section, all 8 bytes),
//! writes the `SHW` line and waits for `AOK`. A negative or missing reply is
//! retried; after the configured attempts the wireless module itself is
//! suspected and rebooted with `R,1`, expecting `CMD`. When even that ladder
//! runs dry the device fault latches and publication falls back to its
//! normal cadence for diagnostics.

use jar_proto::frame;
use jar_proto::records::StatusCode;

use crate::config::KernelConfig;
use crate::hal::{SerialLink, StatusDisplay};
use crate::ingest::LinkEvent;
use crate::status::StatusBoard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for the next publish slot.
    Idle { next_due_us: u64 },
    /// Notification sent; waiting for `AOK`.
    AwaitAck { sent_at_us: u64, attempt: u8 },
    /// `R,1` sent; waiting for `CMD`.
    AwaitReady { sent_at_us: u64, attempt: u8 },
}

pub struct StatusPublisher {
    phase: Phase,
}

impl StatusPublisher {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle { next_due_us: 0 },
        }
    }

    pub fn poll<L: SerialLink, D: StatusDisplay>(
        &mut self,
        now_us: u64,
        link: &mut L,
        display: &mut D,
        cfg: &KernelConfig,
        status: &StatusBoard,
        events: &[LinkEvent],
    ) {
        match self.phase {
            Phase::Idle { next_due_us } => {
                if now_us >= next_due_us {
                    self.send_status(link, display, status);
                    self.phase = Phase::AwaitAck {
                        sent_at_us: now_us,
                        attempt: 1,
                    };
                }
            }
            Phase::AwaitAck { sent_at_us, attempt } => {
                if events.contains(&LinkEvent::Ack) {
                    self.phase = Phase::Idle {
                        next_due_us: now_us + cfg.publish_period_us,
                    };
                } else if events.contains(&LinkEvent::Nak)
                    || now_us >= sent_at_us + cfg.reply_timeout_us
                {
                    if attempt < cfg.publish_retries {
                        self.send_status(link, display, status);
                        self.phase = Phase::AwaitAck {
                            sent_at_us: now_us,
                            attempt: attempt + 1,
                        };
                    } else {
                        link.write_all(frame::REBOOT_LINE);
                        self.phase = Phase::AwaitReady {
                            sent_at_us: now_us,
                            attempt: 1,
                        };
                    }
                }
            }
            Phase::AwaitReady { sent_at_us, attempt } => {
                if events.contains(&LinkEvent::Ready) {
                    self.phase = Phase::Idle {
                        next_due_us: now_us + cfg.publish_period_us,
                    };
                } else if now_us >= sent_at_us + cfg.reply_timeout_us {
                    // The reply ceiling doubles as the attempt spacing.
                    if attempt < cfg.reboot_retries {
                        link.write_all(frame::REBOOT_LINE);
                        self.phase = Phase::AwaitReady {
                            sent_at_us: now_us,
                            attempt: attempt + 1,
                        };
                    } else {
                        status.latch(StatusCode::BtDeviceError);
                        self.phase = Phase::Idle {
                            next_due_us: now_us + cfg.publish_period_us,
                        };
                    }
                }
            }
        }
    }

    fn send_status<L: SerialLink, D: StatusDisplay>(
        &self,
        link: &mut L,
        display: &mut D,
        status: &StatusBoard,
    ) {
        let snapshot = status.snapshot();
        link.write_all(&frame::status_line(&snapshot));
        display.render(&snapshot);
    }
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}
