pub mod bench;
pub mod error;
pub mod generate;
pub mod guard;
pub mod implementations;
pub mod matrix;
pub mod oracle;
pub mod partition;
pub mod pool;

pub use error::{KernelError, KernelResult};
pub use implementations::{Dijkstra, FloydWarshall, Jacobi, Kernel, Prim, SearchParams};
pub use matrix::{Graph, Matrix, INF};
pub use partition::{partition, PartitionPlan};
pub use pool::{Backend, ParallelConfig, WorkerPool};
