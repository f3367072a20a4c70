pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# LOGTRAIN CONFIGURATION
# =============================================================================
# Streams Railway environment logs, enriches them with project, environment
# and service names, and forwards them to an HTTP ingest endpoint.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/logtrain/config.yml
#   3. /etc/logtrain/config.yml
# Without a config file, settings are read from environment variables
# (RAILWAY_API_KEY, RAILWAY_ENVIRONMENT_ID, INGEST_URL, ...).
#
# $env{VAR} references are replaced with the variable's value at load time.

railway:
  api_key: $env{RAILWAY_API_KEY}
  # Environment whose logs are streamed
  environment_id: 00000000-0000-0000-0000-000000000000
  # With a project ID and no services, every service that has an instance in
  # the environment is discovered at startup. Restart to pick up new services.
  project_id: 00000000-0000-0000-0000-000000000000
  # Pin services explicitly instead of discovering them
  services: []

# Global filters. Empty means allow everything.
filters:
  # Severity levels to keep, e.g. [error, warn]
  levels: []
  # Case-insensitive substring the message must contain
  content: ""

stream:
  # Batches buffered between the stream and the sinks; a full buffer
  # slows the stream down instead of dropping logs
  channel_capacity: 100
  report_status_every: 10s
  request_timeout: 30s

webhook:
  url: https://ingest.example.com/logs
  headers: {}
  # Filters for this sink only; the content filter matches the record's JSON
  filters:
    levels: []
    content: ""
"#
    .to_string()
}
