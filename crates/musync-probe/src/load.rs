//! Host load probe backed by `sysinfo`.

use musync_core::HostLoad;
use sysinfo::System;

use crate::{LoadProbe, ProbeError};

/// Reads uptime and 1/5/15-minute load averages from the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoadProbe;

impl SystemLoadProbe {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl LoadProbe for SystemLoadProbe {
    fn sample(&self) -> Result<HostLoad, ProbeError> {
        let avg = System::load_average();
        let load = [avg.one, avg.five, avg.fifteen];
        if load.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ProbeError::Load(format!("invalid load averages {load:?}")));
        }
        Ok(HostLoad {
            uptime_secs: System::uptime(),
            load,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_sane() {
        let load = SystemLoadProbe::new().sample().unwrap();
        assert!(load.load.iter().all(|v| *v >= 0.0));
    }
}
