//! Busy flags standing in for a disabled submit button

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct ControlFlag {
    name: &'static str,
    busy: AtomicBool,
}

impl ControlFlag {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Mark the control busy until the returned guard is dropped
    pub fn try_acquire(&self) -> Result<ControlGuard<'_>> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(Error::Busy(format!("{} is already running", self.name)));
        }
        debug!("Control {} busy", self.name);
        Ok(ControlGuard { flag: self })
    }
}

pub struct ControlGuard<'a> {
    flag: &'a ControlFlag,
}

impl Drop for ControlGuard<'_> {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::Release);
        debug!("Control {} ready", self.flag.name);
    }
}
