//! Reachability engine.
//!
//! For each task group (one origin, many query times) the engine builds a
//! reachability table per time with a label-correcting dynamic program over
//! walking and scheduled transit, reusing work between neighbouring times
//! where the strategy allows. Every reached location's itinerary is written
//! to a shared score card.
//!
//! Task groups run independently, either on the calling thread or on a
//! dedicated worker pool. A table never leaves the worker that built it.

mod algorithm;
mod assembler;
mod config;
mod error;
mod executor;
mod interrupt;
mod range;
mod rank;
mod score_card;
mod table;
mod task;
mod time_tracker;


pub use algorithm::DynamicProgrammingAlgorithm;
pub use assembler::MovementAssembler;
pub use config::{ConfigError, EngineConfig, ExecutorKind};
pub use error::EngineError;
pub use executor::{
    ExecutionSummary, ParallelExecutor, SequentialExecutor, TaskExecutor, from_config as executor_for,
};
pub use interrupt::Interrupt;
pub use range::{RangeSummary, Strategy, run as run_range};
pub use rank::{deduplicate, rank_itineraries};
pub use score_card::{CountingScoreCard, LocationScore, PathScoreCard, ScoreCard, ScoreSummary};
pub use table::{ReachabilityTable, Record, Slide};
pub use task::{Calculation, CalculationBuilder, Task, TaskGroup, TaskGroupIdentifier};
pub use time_tracker::TimeTracker;
