//! Layer processor pipeline and registry

use pausekit_core::{ProcessorError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for G-code post-processors
///
/// A processor receives the whole document as an ordered sequence of layer
/// texts and returns the transformed sequence. Processors are applied in a
/// pipeline, each one seeing the output of the previous.
///
/// # Examples
/// - Pause at a height or layer
/// - Two pauses at different heights, as two processor instances
pub trait LayerProcessor: Send + Sync {
    /// Get the name/identifier of this processor
    fn name(&self) -> &str;

    /// Get a description of what this processor does
    fn description(&self) -> &str;

    /// Transform the layer sequence
    fn process(&self, layers: Vec<String>) -> Result<Vec<String>>;

    /// Check if this processor is enabled
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Arc-wrapped processor for thread-safe sharing
pub type ProcessorHandle = Arc<dyn LayerProcessor>;

/// Ordered chain of layer processors
///
/// # Example
/// ```ignore
/// let mut pipeline = ProcessorPipeline::new();
/// pipeline.register(Arc::new(PauseAtHeight::new(options, machine)));
/// let layers = pipeline.process(layers)?;
/// ```
#[derive(Default)]
pub struct ProcessorPipeline {
    processors: Vec<ProcessorHandle>,
}

impl ProcessorPipeline {
    /// Create a new empty processor pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor in the pipeline
    ///
    /// Processors are applied in the order they are registered.
    pub fn register(&mut self, processor: ProcessorHandle) -> &mut Self {
        self.processors.push(processor);
        self
    }

    /// Get the number of registered processors
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// List all registered processors as (name, description, enabled)
    pub fn list_processors(&self) -> Vec<(&str, &str, bool)> {
        self.processors
            .iter()
            .map(|p| (p.name(), p.description(), p.is_enabled()))
            .collect()
    }

    /// Run every enabled processor in order
    ///
    /// Stops at the first failure and reports it as
    /// [`ProcessorError::ProcessingFailed`].
    pub fn process(&self, layers: Vec<String>) -> Result<Vec<String>> {
        let mut current = layers;

        for processor in &self.processors {
            if !processor.is_enabled() {
                tracing::debug!("Skipping disabled processor '{}'", processor.name());
                continue;
            }

            current = processor.process(current).map_err(|e| {
                tracing::warn!("Processor '{}' failed: {}", processor.name(), e);
                ProcessorError::ProcessingFailed {
                    processor: processor.name().to_string(),
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(current)
    }
}

type ProcessorFactory = Arc<dyn Fn() -> ProcessorHandle + Send + Sync>;

/// Processor registry for managing available processors
///
/// Maps processor names to factories and builds pipelines from name lists.
#[derive(Default)]
pub struct ProcessorRegistry {
    factories: HashMap<String, ProcessorFactory>,
}

impl ProcessorRegistry {
    /// Create a new processor registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor factory
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> ProcessorHandle + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Create a processor by name
    pub fn create(&self, name: &str) -> Option<ProcessorHandle> {
        self.factories.get(name).map(|f| f())
    }

    /// Create a pipeline with the specified processor names
    pub fn create_pipeline(&self, names: &[&str]) -> Result<ProcessorPipeline> {
        let mut pipeline = ProcessorPipeline::new();

        for name in names {
            let processor = self
                .create(name)
                .ok_or_else(|| ProcessorError::UnknownProcessor {
                    name: name.to_string(),
                })?;
            pipeline.register(processor);
        }

        Ok(pipeline)
    }

    /// List all registered processor names, sorted
    pub fn list_registered(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pausekit_core::Error;

    struct Append(&'static str, bool);

    impl LayerProcessor for Append {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "appends its name to every layer"
        }

        fn process(&self, layers: Vec<String>) -> Result<Vec<String>> {
            Ok(layers.into_iter().map(|l| l + self.0).collect())
        }

        fn is_enabled(&self) -> bool {
            self.1
        }
    }

    struct Failing;

    impl LayerProcessor for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        fn process(&self, _layers: Vec<String>) -> Result<Vec<String>> {
            Err(Error::other("bad input"))
        }
    }

    #[test]
    fn test_pipeline_order_and_disabled() {
        let mut pipeline = ProcessorPipeline::new();
        pipeline
            .register(Arc::new(Append("a", true)))
            .register(Arc::new(Append("b", false)))
            .register(Arc::new(Append("c", true)));

        assert_eq!(pipeline.processor_count(), 3);
        let out = pipeline.process(vec!["x".to_string()]).unwrap();
        assert_eq!(out, vec!["xac".to_string()]);
        assert_eq!(pipeline.list_processors()[1], ("b", "appends its name to every layer", false));
    }

    #[test]
    fn test_pipeline_failure() {
        let mut pipeline = ProcessorPipeline::new();
        pipeline.register(Arc::new(Failing));
        let err = pipeline.process(vec![]).unwrap_err();
        assert!(err.is_processor_error());
        assert_eq!(err.to_string(), "Processor 'failing' failed: bad input");
    }

    #[test]
    fn test_registry() {
        let mut registry = ProcessorRegistry::new();
        registry.register("b", || Arc::new(Append("b", true)) as ProcessorHandle);
        registry.register("a", || Arc::new(Append("a", true)) as ProcessorHandle);

        assert_eq!(registry.list_registered(), vec!["a", "b"]);
        assert!(registry.create("missing").is_none());

        let pipeline = registry.create_pipeline(&["a", "b"]).unwrap();
        assert_eq!(pipeline.processor_count(), 2);

        let err = registry.create_pipeline(&["a", "nope"]).err().unwrap();
        assert_eq!(err.to_string(), "Unknown processor: nope");
    }
}
