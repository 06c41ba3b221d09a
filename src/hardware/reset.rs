//! Reset-cause decoding
//!
//! The hardware reports the last reset cause per CPU as a raw code. The
//! original 16-entry name table was indexed without a bounds check; here the
//! decode is a total function and out-of-range codes map to [`ResetSource::Unknown`].

use std::fmt;

/// Decoded hardware reset cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetSource {
    NoMean,
    PowerOn,
    Software,
    OuterWatchdog,
    DeepSleep,
    Sdio,
    TimerGroup0Watchdog,
    TimerGroup1Watchdog,
    RtcWatchdogSys,
    Intrusion,
    TimerGroupCpuWatchdog,
    SoftwareCpu,
    RtcWatchdogCpu,
    ExternalCpu,
    BrownOut,
    RtcWatchdogRtc,
    /// Any code outside the documented 0..=15 range
    Unknown(u8),
}

impl ResetSource {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ResetSource::NoMean,
            1 => ResetSource::PowerOn,
            2 => ResetSource::Software,
            3 => ResetSource::OuterWatchdog,
            4 => ResetSource::DeepSleep,
            5 => ResetSource::Sdio,
            6 => ResetSource::TimerGroup0Watchdog,
            7 => ResetSource::TimerGroup1Watchdog,
            8 => ResetSource::RtcWatchdogSys,
            9 => ResetSource::Intrusion,
            10 => ResetSource::TimerGroupCpuWatchdog,
            11 => ResetSource::SoftwareCpu,
            12 => ResetSource::RtcWatchdogCpu,
            13 => ResetSource::ExternalCpu,
            14 => ResetSource::BrownOut,
            15 => ResetSource::RtcWatchdogRtc,
            other => ResetSource::Unknown(other),
        }
    }

    /// Name reported in `INFO` replies
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetSource::NoMean => "NO_MEAN",
            ResetSource::PowerOn => "POWERON_RESET",
            ResetSource::Software => "SW_RESET",
            ResetSource::OuterWatchdog => "OWDT_RESET",
            ResetSource::DeepSleep => "DEEPSLEEP_RESET",
            ResetSource::Sdio => "SDIO_RESET",
            ResetSource::TimerGroup0Watchdog => "TG0WDT_SYS_RESET",
            ResetSource::TimerGroup1Watchdog => "TG1WDT_SYS_RESET",
            ResetSource::RtcWatchdogSys => "RTCWDT_SYS_RESET",
            ResetSource::Intrusion => "INTRUSION_RESET",
            ResetSource::TimerGroupCpuWatchdog => "TGWDT_CPU_RESET",
            ResetSource::SoftwareCpu => "SW_CPU_RESET",
            ResetSource::RtcWatchdogCpu => "RTCWDT_CPU_RESET",
            ResetSource::ExternalCpu => "EXT_CPU_RESET",
            ResetSource::BrownOut => "RTCWDT_BROWN_OUT_RESET",
            ResetSource::RtcWatchdogRtc => "RTCWDT_RTC_RESET",
            ResetSource::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for ResetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
