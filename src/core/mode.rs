use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
    time::Duration,
};

use super::error::HarnessError;

/// Poll interval while rendering interactively.
pub const INTERACTIVE_CADENCE: Duration = Duration::from_millis(100);
/// Poll interval for every benchmark, stress test and demo run.
pub const BENCHMARK_CADENCE: Duration = Duration::from_millis(4 * 1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BenchmarkVariant {
    NoSpectralOclGpu,
    NoSpectralOclCpuGpu,
    NoSpectralOclCpu,
    NoSpectralOclCustom,
    NoSpectralHybridGpu,
    NoSpectralHybridCustom,
    NoSpectralNativePath,
    SpectralHybridGpu,
    SpectralHybridCustom,
    SpectralNativePath,
    SpectralNativeBidir,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StressVariant {
    NoSpectralOclGpu,
    NoSpectralOclCpuGpu,
    NoSpectralOclCpu,
    SpectralNativeBidir,
}

/// What the controller is asked to run. Fixes the poll cadence and whether the
/// benchmark deadline applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Paused,
    Interactive,
    Benchmark(BenchmarkVariant),
    StressTest(StressVariant),
    Demo,
}

impl Mode {
    pub const ALL: [Mode; 18] = [
        Mode::Benchmark(BenchmarkVariant::NoSpectralOclGpu),
        Mode::Benchmark(BenchmarkVariant::NoSpectralOclCpuGpu),
        Mode::Benchmark(BenchmarkVariant::NoSpectralOclCpu),
        Mode::Benchmark(BenchmarkVariant::NoSpectralOclCustom),
        Mode::Benchmark(BenchmarkVariant::NoSpectralHybridGpu),
        Mode::Benchmark(BenchmarkVariant::NoSpectralHybridCustom),
        Mode::Benchmark(BenchmarkVariant::NoSpectralNativePath),
        Mode::Benchmark(BenchmarkVariant::SpectralHybridGpu),
        Mode::Benchmark(BenchmarkVariant::SpectralHybridCustom),
        Mode::Benchmark(BenchmarkVariant::SpectralNativePath),
        Mode::Benchmark(BenchmarkVariant::SpectralNativeBidir),
        Mode::StressTest(StressVariant::NoSpectralOclGpu),
        Mode::StressTest(StressVariant::NoSpectralOclCpuGpu),
        Mode::StressTest(StressVariant::NoSpectralOclCpu),
        Mode::StressTest(StressVariant::SpectralNativeBidir),
        Mode::Demo,
        Mode::Interactive,
        Mode::Paused,
    ];

    /// Poll interval for this mode. `None` for `Paused`, which never polls.
    pub fn cadence(&self) -> Option<Duration> {
        match self {
            Mode::Paused => None,
            Mode::Interactive => Some(INTERACTIVE_CADENCE),
            Mode::Benchmark(_) | Mode::StressTest(_) | Mode::Demo => Some(BENCHMARK_CADENCE),
        }
    }

    /// Whether the fixed benchmark deadline ends a run in this mode.
    pub fn has_deadline(&self) -> bool {
        !matches!(self, Mode::Interactive | Mode::Demo | Mode::Paused)
    }

    /// Interactive and demo sessions run until stopped.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Mode::Interactive | Mode::Demo)
    }

    /// Stable identifier accepted on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            Mode::Paused => "PAUSE",
            Mode::Interactive => "INTERACTIVE",
            Mode::Demo => "DEMO_LUXVR",
            Mode::Benchmark(v) => match v {
                BenchmarkVariant::NoSpectralOclGpu => "BENCHMARK_NOSPECTRAL_OCL_GPU",
                BenchmarkVariant::NoSpectralOclCpuGpu => "BENCHMARK_NOSPECTRAL_OCL_CPUGPU",
                BenchmarkVariant::NoSpectralOclCpu => "BENCHMARK_NOSPECTRAL_OCL_CPU",
                BenchmarkVariant::NoSpectralOclCustom => "BENCHMARK_NOSPECTRAL_OCL_CUSTOM",
                BenchmarkVariant::NoSpectralHybridGpu => "BENCHMARK_NOSPECTRAL_HYBRID_GPU",
                BenchmarkVariant::NoSpectralHybridCustom => "BENCHMARK_NOSPECTRAL_HYBRID_CUSTOM",
                BenchmarkVariant::NoSpectralNativePath => "BENCHMARK_NOSPECTRAL_NATIVE_PATH",
                BenchmarkVariant::SpectralHybridGpu => "BENCHMARK_SPECTRAL_HYBRID_GPU",
                BenchmarkVariant::SpectralHybridCustom => "BENCHMARK_SPECTRAL_HYBRID_CUSTOM",
                BenchmarkVariant::SpectralNativePath => "BENCHMARK_SPECTRAL_NATIVE_PATH",
                BenchmarkVariant::SpectralNativeBidir => "BENCHMARK_SPECTRAL_NATIVE_BIDIR",
            },
            Mode::StressTest(v) => match v {
                StressVariant::NoSpectralOclGpu => "STRESSTEST_NOSPECTRAL_OCL_GPU",
                StressVariant::NoSpectralOclCpuGpu => "STRESSTEST_NOSPECTRAL_OCL_CPUGPU",
                StressVariant::NoSpectralOclCpu => "STRESSTEST_NOSPECTRAL_OCL_CPU",
                StressVariant::SpectralNativeBidir => "STRESSTEST_SPECTRAL_NATIVE_BIDIR",
            },
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Paused => "Pause",
            Mode::Interactive => "Interactive",
            Mode::Demo => "LuxVR Demo",
            Mode::Benchmark(v) => match v {
                BenchmarkVariant::NoSpectralOclGpu => "OpenCL GPUs",
                BenchmarkVariant::NoSpectralOclCpuGpu => "OpenCL CPUs+GPUs",
                BenchmarkVariant::NoSpectralOclCpu => "OpenCL CPUs",
                BenchmarkVariant::NoSpectralOclCustom => "OpenCL Custom",
                BenchmarkVariant::NoSpectralHybridGpu => "Hybrid GPUs",
                BenchmarkVariant::NoSpectralHybridCustom => "Hybrid Custom",
                BenchmarkVariant::NoSpectralNativePath => "Native Path",
                BenchmarkVariant::SpectralHybridGpu => "Spectral Hybrid GPUs",
                BenchmarkVariant::SpectralHybridCustom => "Spectral Hybrid Custom",
                BenchmarkVariant::SpectralNativePath => "Spectral Native Path",
                BenchmarkVariant::SpectralNativeBidir => "Spectral Native BiDir",
            },
            Mode::StressTest(v) => match v {
                StressVariant::NoSpectralOclGpu => "Stress Test OpenCL GPUs",
                StressVariant::NoSpectralOclCpuGpu => "Stress Test OpenCL CPUs+GPUs",
                StressVariant::NoSpectralOclCpu => "Stress Test OpenCL CPUs",
                StressVariant::SpectralNativeBidir => "Stress Test Spectral Native BiDir",
            },
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Mode {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| HarnessError::InvalidMode {
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_per_mode() {
        for mode in Mode::ALL {
            match mode {
                Mode::Paused => assert_eq!(mode.cadence(), None),
                Mode::Interactive => {
                    assert_eq!(mode.cadence(), Some(Duration::from_millis(100)))
                }
                _ => assert_eq!(mode.cadence(), Some(Duration::from_millis(4000))),
            }
        }
    }

    #[test]
    fn deadline_excludes_interactive_and_demo() {
        assert!(!Mode::Interactive.has_deadline());
        assert!(!Mode::Demo.has_deadline());
        assert!(Mode::Benchmark(BenchmarkVariant::SpectralNativePath).has_deadline());
        assert!(Mode::StressTest(StressVariant::NoSpectralOclCpu).has_deadline());
    }

    #[test]
    fn parses_ids_case_insensitively() {
        let mode: Mode = "benchmark_spectral_native_bidir".parse().unwrap();
        assert_eq!(mode, Mode::Benchmark(BenchmarkVariant::SpectralNativeBidir));
        assert_eq!("PAUSE".parse::<Mode>().unwrap(), Mode::Paused);
    }

    #[test]
    fn every_mode_round_trips_through_its_id() {
        for mode in Mode::ALL {
            assert_eq!(mode.id().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "BENCHMARK_WARP_DRIVE".parse::<Mode>().unwrap_err();
        assert!(err.is_invalid_request());
    }
}
