mod controller;
pub mod countdown;
mod source;
mod workflow;

// Public API of the quiz subsystem.
pub use controller::{Delivery, DeliveryOutcome, QuizController, QuizPorts, ReportTask};
pub use countdown::{CountdownHandle, Ticks};
pub use source::{InMemoryQuizSource, QuizSource};
pub use workflow::QuizLoopService;
