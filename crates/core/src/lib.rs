pub mod checkpoint;
pub mod config;
pub mod fetcher;
pub mod metrics;
pub mod notifier;
pub mod orchestrator;
pub mod scheduler;
pub mod storage;
pub mod task;
pub mod testing;
pub mod train_locations;
pub mod transform;

pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore, SqliteParameterStore};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use fetcher::{GtfsFetchTask, HttpFeedSource};
pub use notifier::{create_notifier, Notification, Notifier, NotifierError};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, OrchestratorStatus, PipelineOrchestrator, RunOutcome,
    RunReport,
};
pub use scheduler::{spawn_job, CronSchedule};
pub use storage::{FsObjectStore, ObjectStore, StorageError};
pub use task::{FetchStatus, FetchTask, TaskError, TransformTask};
pub use train_locations::{
    previous_utc_day, CtaTrainTrackerApi, TrainLocationError, TrainLocationFetcher,
    TrainLocationProcessor, TrainLocationsConfig,
};
pub use transform::ExpectedScheduleTask;
