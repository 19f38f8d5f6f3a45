//! Graph construction from parsed statements.
//!
//! Statements are compiled in declaration order. A variable must be bound
//! as an output before a later statement reads it, which keeps the graph
//! acyclic without a separate check. Declaring an existing name as an output
//! again rebinds every subsequent reader to the new producer.

use chamber_command::{CommandError, CommandRegistry};
use chamber_plan::{parse_script, Statement};
use indexmap::IndexMap;
use std::sync::Arc;

use crate::config::RunConfig;
use crate::distributor::DistributorVariable;
use crate::error::{BuildError, BuildErrorKind};
use crate::processor::Processor;

/// A compiled pipeline, ready to run
#[derive(Debug)]
pub struct Graph {
    stages: Vec<Arc<Processor>>,
    variables: IndexMap<String, Arc<DistributorVariable>>,
}

impl Graph {
    /// Stages in statement order
    #[must_use]
    pub fn stages(&self) -> &[Arc<Processor>] {
        &self.stages
    }

    /// Number of stages
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check for an empty graph
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Total worker tasks a run will spawn
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.stages.iter().map(|s| s.workers()).sum()
    }

    /// Current binding of a variable name
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Arc<DistributorVariable>> {
        self.variables.get(name)
    }
}

/// Incremental graph builder
pub struct GraphBuilder<'r> {
    registry: &'r CommandRegistry,
    config: RunConfig,
    variables: IndexMap<String, Arc<DistributorVariable>>,
    stages: Vec<Arc<Processor>>,
}

impl<'r> GraphBuilder<'r> {
    /// Create a builder resolving commands in `registry`
    #[must_use]
    pub fn new(registry: &'r CommandRegistry, config: RunConfig) -> Self {
        Self {
            registry,
            config,
            variables: IndexMap::new(),
            stages: Vec::new(),
        }
    }

    /// Compile one statement into a processor
    ///
    /// # Errors
    ///
    /// Returns error if the command is unknown, rejects its arity or options,
    /// or reads an undefined variable
    pub fn add_statement(&mut self, statement: &Statement) -> Result<(), BuildError> {
        let line = statement.line;
        let command = |err: CommandError| BuildError::new(line, BuildErrorKind::Command(err));

        let entry = self.registry.resolve(&statement.command).map_err(command)?;
        let threads = statement.threads.unwrap_or(self.config.threads).max(1);
        let instances = entry.instantiate(&statement.options, threads).map_err(command)?;
        if let Some(first) = instances.first() {
            entry
                .descriptor
                .check_arity(statement.inputs.len(), statement.outputs.len(), first)
                .map_err(command)?;
        }

        let inputs = statement
            .inputs
            .iter()
            .map(|name| {
                self.variables.get(name).cloned().ok_or_else(|| {
                    BuildError::new(line, BuildErrorKind::UndefinedVariable { name: name.clone() })
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let outputs: Vec<Arc<DistributorVariable>> = statement
            .outputs
            .iter()
            .map(|name| Arc::new(DistributorVariable::new(name.clone())))
            .collect();

        let workers = entry.descriptor.concurrency.workers(threads);
        let processor = Arc::new(Processor::new(
            line,
            &entry.descriptor,
            inputs.len(),
            outputs.clone(),
            instances,
            threads,
            self.config.window_for(workers),
        ));
        for (slot, variable) in inputs.iter().enumerate() {
            variable.bind(&processor, slot);
        }
        for variable in outputs {
            if self.variables.contains_key(variable.name()) {
                tracing::debug!(line, variable = variable.name(), "variable rebound");
            }
            self.variables.insert(variable.name().to_string(), variable);
        }

        tracing::debug!(line, command = %statement.command, workers, "stage compiled");
        self.stages.push(processor);
        Ok(())
    }

    /// Finish construction
    #[must_use]
    pub fn build(self) -> Graph {
        tracing::info!(stages = self.stages.len(), "graph built");
        Graph {
            stages: self.stages,
            variables: self.variables,
        }
    }

    /// Compile a statement list
    ///
    /// # Errors
    ///
    /// Returns the first build error; no partial graph is produced
    pub fn from_statements(
        registry: &'r CommandRegistry,
        config: RunConfig,
        statements: &[Statement],
    ) -> Result<Graph, BuildError> {
        let mut builder = Self::new(registry, config);
        for statement in statements {
            builder.add_statement(statement)?;
        }
        Ok(builder.build())
    }

    /// Parse and compile a script
    ///
    /// # Errors
    ///
    /// Returns the first parse or build error
    pub fn from_script(registry: &'r CommandRegistry, config: RunConfig, source: &str) -> Result<Graph, BuildError> {
        let statements = parse_script(source)?;
        Self::from_statements(registry, config, &statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chamber_plan::ParseError;

    fn build(source: &str) -> Result<Graph, BuildError> {
        let registry = CommandRegistry::with_builtins();
        GraphBuilder::from_script(&registry, RunConfig::default(), source)
    }

    #[test]
    fn test_build_simple_chain() {
        let graph = build("Seq > x : stop=5\nWatch < x").unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.worker_count(), 2);
        assert_eq!(graph.stages()[0].line(), 1);
        assert_eq!(graph.stages()[1].command(), "Watch");
        assert_eq!(graph.variable("x").unwrap().fan_out(), 1);
    }

    #[test]
    fn test_undefined_variable() {
        let err = build("Seq > x\nWatch < y").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, BuildErrorKind::UndefinedVariable { name: "y".to_string() });
        assert_eq!(err.to_string(), "At line 2: Variable \"y\" is not defined");
    }

    #[test]
    fn test_unknown_command() {
        let err = build("\nNope > x").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.to_string(), "At line 2: Command \"Nope\" is not found");
    }

    #[test]
    fn test_arity_mismatch() {
        let err = build("Seq > x y").unwrap_err();
        assert_eq!(err.to_string(), "At line 1: Output size mismatch (required 1, given 2)");

        // Seq with stop takes no pacing input
        let err = build("Seq > a\nSeq < a > b : stop=3").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, BuildErrorKind::Command(CommandError::Arity(_))));
    }

    #[test]
    fn test_parse_error_keeps_line() {
        let err = build("Seq > x\nWatch < x * 2 * 3").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, BuildErrorKind::Parse(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_rebinding_redirects_later_readers() {
        let graph = build("Seq > x : stop=1\nWatch < x\nSeq > x : stop=2\nWatch < x\nWatch < x").unwrap();
        let first = graph.stages()[0].outputs()[0].clone();
        let second = graph.stages()[2].outputs()[0].clone();
        assert_eq!(first.fan_out(), 1);
        assert_eq!(second.fan_out(), 2);
        assert!(Arc::ptr_eq(graph.variable("x").unwrap(), &second));
    }

    #[test]
    fn test_thread_count_only_for_parallel_stages() {
        let registry = CommandRegistry::with_builtins();
        let config = RunConfig::default().with_threads(4);
        let graph = GraphBuilder::from_script(&registry, config, "Seq > x : stop=3 * 8\nWatch < x").unwrap();
        // Built-ins are sequential, so each runs a single worker
        assert_eq!(graph.worker_count(), 2);
    }
}
