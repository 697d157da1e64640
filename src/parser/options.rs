//! Parser configuration

/// Default bound on nested expressions and bodies.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 256;

/// Default number of errors after which parsing stops.
pub const DEFAULT_MAX_ERRORS: usize = 100;

/// Knobs for a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest allowed nesting of groups, arrays, calls, `!` and bodies.
    pub max_nesting_depth: usize,
    /// Stop after this many error diagnostics. `None` never stops.
    pub max_errors: Option<usize>,
    /// Accept `name + text` inside directive bodies.
    pub expanding_assign: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_errors: Some(DEFAULT_MAX_ERRORS),
            expanding_assign: true,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_max_errors(mut self, limit: Option<usize>) -> Self {
        self.max_errors = limit;
        self
    }

    pub fn with_expanding_assign(mut self, enabled: bool) -> Self {
        self.expanding_assign = enabled;
        self
    }
}
