mod clock;
mod config;
mod error;
mod loader;
mod pipeline;
mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::*;
pub use error::{OutdoorError, SchemaError};

pub use types::frequency::Frequency;
pub use types::period::{Month, StartEndDate};

pub use loader::data_loader::RecordLoader;
pub use loader::error::FetchError;
pub use loader::source::{ClimateSource, Source};
pub use loader::FetchRecords;

pub use pipeline::aggregate::{pivot_by_date_hour, SuitabilityMatrix, HOURS_PER_DAY};
pub use pipeline::classify::{classify, good_for_outdoor_expr, is_good_for_outdoor};
pub use pipeline::columns::*;
pub use pipeline::merge::{merge_on_date, Merged};
pub use pipeline::normalize::{coerce_numeric, scoring_input};
pub use pipeline::select::{derive_calendar_date, select_fields, FieldKind, FieldSpec};
pub use pipeline::{OutdoorPipeline, PipelineOutput, RawTable, Selection};
