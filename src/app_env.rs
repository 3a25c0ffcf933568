/// URL for accessing the PostgreSQL database (should contain a schema name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. Follows tracing_subscriber's
/// [EnvFilter directive format](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// OpenTelemetry span export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs traces to the correct place. Telemetry
/// export is disabled when this variable is unset.
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place. Telemetry
/// export is disabled when this variable is unset.
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";
