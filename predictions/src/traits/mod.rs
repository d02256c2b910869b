mod generic;

pub use generic::*;
