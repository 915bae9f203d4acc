//! Template parameters: the flat key-value set, its typed job view, and JSON parameter files

/// Parameter values and the set passed to the renderer
pub mod set;

/// Typed parameters of the bundled job template and their constraints
pub mod job;

/// Compile the bundled JSON schema for parameter files
pub mod schema;

/// Read and validate JSON parameter files
pub mod read;
