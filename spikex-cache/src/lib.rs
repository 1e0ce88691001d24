pub mod cache;
pub mod epoch;

pub use cache::ReadCache;
pub use epoch::{Atom, EpochName, epoch_name};
