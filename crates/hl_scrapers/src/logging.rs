use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

/// Tags every event with the source (and any narrower scope) it belongs to,
/// so interleaved runs can be told apart in the output.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    scopes: Vec<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_source(source_id: &str) -> Self {
        Self::new().with_scope(source_id)
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    fn scope(&self) -> String {
        self.scopes.join("/")
    }

    pub fn info(&self, message: &str) {
        tracing::info!(scope = %self.scope(), "{}", message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(scope = %self.scope(), "{}", message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(scope = %self.scope(), "{}", message);
    }
}

/// Installs the fmt subscriber once. A dispatcher set elsewhere (tests,
/// embedding binaries) is left alone.
pub fn init_logging() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(false)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_nest() {
        assert_eq!(Logger::new().scope(), "");

        let logger = Logger::for_source("regio7").with_scope("page 3");
        assert_eq!(logger.scope(), "regio7/page 3");
        assert_eq!(Logger::for_source("elperiodico").scope(), "elperiodico");
    }
}
