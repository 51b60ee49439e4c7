pub mod error;
pub mod metrics;
pub mod mode;
pub mod scene;

pub use error::{EngineError, FatalRenderError, HarnessError, Result};
pub use metrics::{MetricsSnapshot, RawCounters, BENCHMARK_DEADLINE_SECS};
pub use mode::{BenchmarkVariant, Mode, StressVariant};
pub use scene::Scene;
