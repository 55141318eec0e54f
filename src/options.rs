/// Runtime knobs shared by every stage of a formatting job.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Emit a unified diff instead of the formatted source.
    pub diff: bool,
    /// Restrict formatting to chunks parsed from a unified diff on stdin.
    pub diff_parse: bool,
    /// Write the result back to the source file.
    pub in_place: bool,
    /// Enable the simplification passes.
    pub simple: bool,
    /// Verbosity, each level revealing more tracing.
    pub verbose: u8,
    /// Testing backdoor, wraps every expression in parenthesis.
    pub test: bool,
}
