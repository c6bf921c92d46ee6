#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod history;
pub mod quiz;
pub mod reporting;
pub mod settings;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ControllerError, QuizSourceError, SubmissionError};
pub use history::{AttemptHistoryService, AttemptListItem};
pub use quiz::{
    Delivery, DeliveryOutcome, InMemoryQuizSource, QuizController, QuizLoopService, QuizPorts,
    QuizSource, ReportTask, Ticks,
};
pub use reporting::{
    GradeReceipt, HttpReporter, HttpReporterConfig, LocalReporter, QuizReport, QuizReporter,
};
pub use settings::QuizSettings;
