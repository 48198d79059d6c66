use std::fmt::Display;

/// One member of the evolving population, as handed over for a match.
///
/// The gene vector is opaque to the engine and sent verbatim during the handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Index in the outer population. Final scores are keyed by it.
    pub population_index: usize,
    /// Executable to launch.
    pub command: String,
    /// Extra command-line arguments.
    pub args: Vec<String>,
    /// Decision parameters of this individual.
    pub genes: Vec<f64>,
}

impl Agent {
    /// Create an agent launched as `command` with no arguments.
    pub fn new(population_index: usize, command: impl Into<String>, genes: Vec<f64>) -> Agent {
        Agent {
            population_index,
            command: command.into(),
            args: vec![],
            genes,
        }
    }

    /// Set the command-line arguments passed to the executable.
    pub fn with_args<I, S>(mut self, args: I) -> Agent
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Gene vector as one whitespace-separated line, without the newline.
    pub fn genes_line(&self) -> String {
        self.genes
            .iter()
            .map(f64::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} ({})", self.population_index, self.command)
    }
}
