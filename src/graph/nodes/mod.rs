// Graph Nodes Module
// One node per research stage

pub mod retrieve;
pub mod synthesize;
pub mod validate;

pub use retrieve::RetrieveNode;
pub use synthesize::SynthesizeNode;
pub use validate::ValidateNode;
