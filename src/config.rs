use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

use serde::{Deserialize, Serialize};

use crate::error::StandoffError;

/// Default size of the annotation batches flushed by the storing listener.
/// Batch boundaries are a resource-usage optimization only; they carry no
/// transactional meaning.
pub(crate) const DEFAULT_BATCH_SIZE: usize = 1000;

/// Configures one XML-to-standoff conversion: which elements are copied to the
/// output text, how whitespace is handled, and which annotation generators run.
///
/// Element names in the name sets are written as `local` or `prefix:local`;
/// prefixes must be registered with [`ConversionConfig::with_prefix`] (the `xml`
/// prefix is built in).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// Maps namespace prefixes (as used in this configuration, independent of
    /// the document's own prefixes) to namespace URIs
    #[serde(default)]
    pub(crate) namespaces: HashMap<String, String>,

    /// Elements whose subtrees are copied to the output text even inside an
    /// excluded subtree. An empty set plus an empty `excluded` set means the
    /// whole document is visible.
    #[serde(default)]
    pub(crate) included: Vec<String>,

    /// Elements whose subtrees are hidden from the output text (and generate no
    /// annotations), unless re-included further down
    #[serde(default)]
    pub(crate) excluded: Vec<String>,

    /// Container elements: elements that structure other elements rather than
    /// carry prose. Whitespace-only text directly inside them is formatting and
    /// is dropped entirely, as is their leading whitespace at the very start of
    /// the document.
    #[serde(default)]
    pub(crate) containers: Vec<String>,

    /// Elements before which the line separator is inserted into the output text
    #[serde(default)]
    pub(crate) line_elements: Vec<String>,

    /// What to insert before each line element
    #[serde(default = "default_line_separator")]
    pub(crate) line_separator: String,

    /// Generate milestone annotations (TEI `milestone`, `pb`, `lb`, `cb`, `gb`)
    #[serde(default = "default_true")]
    pub(crate) milestones: bool,

    /// Generate spanning-element annotations (`spanTo` / id pairs)
    #[serde(default = "default_true")]
    pub(crate) spanning: bool,

    /// Capture the structural node path of each element into its annotation data
    #[serde(default = "default_true")]
    pub(crate) node_paths: bool,

    /// The attribute that closes pending spans, default `xml:id`
    #[serde(default = "default_id_attribute")]
    pub(crate) id_attribute: String,

    /// Annotations per store batch
    #[serde(default = "default_batch_size")]
    pub(crate) batch_size: usize,

    /// Debug mode: verbose conversion output on standard error
    #[serde(skip_deserializing, default)]
    pub(crate) debug: bool,
}

fn default_true() -> bool {
    true
}

fn default_line_separator() -> String {
    "\n".to_string()
}

fn default_id_attribute() -> String {
    "xml:id".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            namespaces: HashMap::new(),
            included: Vec::new(),
            excluded: Vec::new(),
            containers: Vec::new(),
            line_elements: Vec::new(),
            line_separator: default_line_separator(),
            milestones: true,
            spanning: true,
            node_paths: true,
            id_attribute: default_id_attribute(),
            batch_size: DEFAULT_BATCH_SIZE,
            debug: false,
        }
    }
}

impl ConversionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a namespace prefix for use in the name sets of this configuration
    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), namespace.into());
        self
    }

    /// Add an element to the inclusion set
    pub fn with_include(mut self, name: impl Into<String>) -> Self {
        self.included.push(name.into());
        self
    }

    /// Add an element to the exclusion set
    pub fn with_exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded.push(name.into());
        self
    }

    /// Add a container element (see the field documentation)
    pub fn with_container(mut self, name: impl Into<String>) -> Self {
        self.containers.push(name.into());
        self
    }

    /// Add an element before which the line separator is inserted
    pub fn with_line_element(mut self, name: impl Into<String>) -> Self {
        self.line_elements.push(name.into());
        self
    }

    pub fn with_line_separator(mut self, separator: impl Into<String>) -> Self {
        self.line_separator = separator.into();
        self
    }

    /// Enable or disable the milestone annotation generator
    pub fn with_milestones(mut self, value: bool) -> Self {
        self.milestones = value;
        self
    }

    /// Enable or disable the spanning-element annotation generator
    pub fn with_spanning(mut self, value: bool) -> Self {
        self.spanning = value;
        self
    }

    /// Enable or disable node-path capture in annotation data
    pub fn with_node_paths(mut self, value: bool) -> Self {
        self.node_paths = value;
        self
    }

    /// Set the attribute that closes pending spans (default `xml:id`)
    pub fn with_id_attribute(mut self, name: impl Into<String>) -> Self {
        self.id_attribute = name.into();
        self
    }

    /// Set the annotation batch size used when persisting a conversion
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable or disable debug mode. In debug mode, verbose output will be
    /// printed to standard error output.
    pub fn with_debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Is debug mode enabled or not?
    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Is the milestone annotation generator enabled?
    pub fn milestones(&self) -> bool {
        self.milestones
    }

    /// Is the spanning-element annotation generator enabled?
    pub fn spanning(&self) -> bool {
        self.spanning
    }

    /// Is node-path capture enabled?
    pub fn node_paths(&self) -> bool {
        self.node_paths
    }

    /// Loads a configuration from a JSON file
    pub fn from_file(filename: &str) -> Result<Self, StandoffError> {
        let file = File::open(filename)
            .map_err(|e| StandoffError::IoError(e, "Opening configuration file failed"))?;
        let reader = BufReader::new(file);
        let deserializer = &mut serde_json::Deserializer::from_reader(reader);
        let result: Result<Self, _> = serde_path_to_error::deserialize(deserializer);
        result.map_err(|e| {
            StandoffError::JsonError(e, filename.to_string(), "Reading configuration from file")
        })
    }
}

/// Lazily formats and prints a debug message to standard error, only when debug
/// mode is enabled on the configuration.
pub(crate) fn debug<F>(config: &ConversionConfig, message: F)
where
    F: FnOnce() -> String,
{
    if config.debug {
        eprintln!("[standoff debug] {}", message());
    }
}
