//! Terminal driver for a single quiz attempt.
//!
//! Stdin lines, countdown ticks and report deliveries are multiplexed with
//! `tokio::select!`; the controller is only touched from this loop.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use quiz_core::model::{QuizId, TickOutcome};
use services::{Delivery, DeliveryOutcome, QuizController, QuizLoopService};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Next,
    Previous,
    /// Zero-based question index.
    GoTo(usize),
    /// Zero-based option index on the current question.
    Select(usize),
    Submit,
    Reset,
    Quit,
    Help,
    Empty,
    Unknown(String),
}

#[must_use]
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let mut parts = line.split_whitespace();
    let unknown = || Input::Unknown(line.to_string());

    match (parts.next(), parts.next(), parts.next()) {
        (None, _, _) => Input::Empty,
        (Some("n"), None, _) => Input::Next,
        (Some("p"), None, _) => Input::Previous,
        (Some("s"), None, _) => Input::Submit,
        (Some("r"), None, _) => Input::Reset,
        (Some("q"), None, _) => Input::Quit,
        (Some("h" | "?"), None, _) => Input::Help,
        (Some("g"), Some(k), None) => one_based(k).map_or_else(unknown, Input::GoTo),
        (Some(k), None, _) => one_based(k).map_or_else(unknown, Input::Select),
        _ => unknown(),
    }
}

fn one_based(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok()?.checked_sub(1)
}

#[must_use]
pub fn format_remaining(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Run `quiz_id` interactively until it is reported, the user quits, or
/// stdin closes.
///
/// # Errors
///
/// Returns an error if the quiz cannot be loaded or stdin fails.
pub async fn run_quiz(
    quiz_loop: &QuizLoopService,
    quiz_id: QuizId,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut controller, mut ticks) = quiz_loop.start(quiz_id).await?;

    println!("{}", controller.session().quiz().title());
    if controller.was_restored() {
        println!(
            "Resumed {} saved answer(s).",
            controller.progress().answered
        );
    }
    print_help();
    render(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight: Option<JoinHandle<Delivery>> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed: let a running delivery land before leaving.
                    if let Some(delivery) = wait_for(&mut in_flight).await {
                        on_delivery(&mut controller, delivery);
                    }
                    break;
                };
                match parse_input(&line) {
                    Input::Quit => break,
                    input => apply(&mut controller, input, &mut in_flight).await,
                }
            }
            tick = ticks.next(), if controller.is_counting_down() => {
                if tick.is_some() {
                    on_tick(&mut controller, &mut in_flight).await;
                }
            }
            delivery = wait_for(&mut in_flight), if in_flight.is_some() => {
                if let Some(delivery) = delivery {
                    on_delivery(&mut controller, delivery);
                }
                if controller.receipt().is_some() {
                    break;
                }
            }
        }
    }

    controller.unmount();
    if controller.session().is_active() {
        println!("Answers saved; run again to continue.");
    }
    Ok(())
}

async fn apply(
    controller: &mut QuizController,
    input: Input,
    in_flight: &mut Option<JoinHandle<Delivery>>,
) {
    match input {
        Input::Next => {
            controller.next();
            render(controller);
        }
        Input::Previous => {
            controller.previous();
            render(controller);
        }
        Input::GoTo(index) => {
            controller.go_to(index);
            if index >= controller.progress().total {
                println!("No question {}.", index + 1);
            }
            render(controller);
        }
        Input::Select(choice) => {
            let question = controller.session().current_question();
            let id = question.id();
            let Some(option) = question.options().get(choice).cloned() else {
                println!("No option {}.", choice + 1);
                return;
            };
            match controller.select_answer(id, option).await {
                Ok(()) => render(controller),
                Err(err) => println!("{err}"),
            }
        }
        Input::Submit => submit(controller, in_flight).await,
        Input::Reset => match controller.reset().await {
            Ok(()) => render(controller),
            Err(err) => println!("{err}"),
        },
        Input::Help => print_help(),
        Input::Empty => render(controller),
        Input::Unknown(raw) => println!("Unknown command `{raw}` (h for help)."),
        Input::Quit => {}
    }
}

async fn submit(controller: &mut QuizController, in_flight: &mut Option<JoinHandle<Delivery>>) {
    if controller.session().is_active() {
        match controller.submit().await {
            Ok(score) => {
                println!("Submitted. Score: {score}%");
                dispatch(controller, in_flight);
            }
            Err(err) => println!("{err}"),
        }
    } else if in_flight.is_some() {
        println!("Still sending results...");
    } else if controller.pending_report().is_some() {
        println!("Retrying submission...");
        dispatch(controller, in_flight);
    } else {
        println!("Quiz already finished.");
    }
}

async fn on_tick(controller: &mut QuizController, in_flight: &mut Option<JoinHandle<Delivery>>) {
    match controller.tick().await {
        TickOutcome::Running { remaining_seconds }
            if remaining_seconds % 60 == 0 || remaining_seconds <= 10 =>
        {
            println!("{} left", format_remaining(remaining_seconds));
        }
        TickOutcome::TimedOut { score } => {
            println!("Time is up. Score: {score}%");
            dispatch(controller, in_flight);
        }
        TickOutcome::Running { .. } | TickOutcome::Idle => {}
    }
}

fn dispatch(controller: &QuizController, in_flight: &mut Option<JoinHandle<Delivery>>) {
    if let Some(task) = controller.report_task() {
        debug!(attempt_id = %task.report().attempt_id, "sending report");
        *in_flight = Some(tokio::spawn(task.run()));
    }
}

async fn wait_for(slot: &mut Option<JoinHandle<Delivery>>) -> Option<Delivery> {
    let handle = slot.as_mut()?;
    let joined = handle.await;
    *slot = None;
    match joined {
        Ok(delivery) => Some(delivery),
        Err(err) => {
            warn!(error = %err, "report task ended without a result");
            None
        }
    }
}

fn on_delivery(controller: &mut QuizController, delivery: Delivery) {
    match controller.accept_delivery(delivery) {
        DeliveryOutcome::Applied(receipt) => {
            let verdict = if receipt.passed { "Passed" } else { "Not passed" };
            println!("{verdict}.");
            if let Some(next) = receipt.next_module {
                println!("Next module: {next}");
            }
        }
        DeliveryOutcome::Failed(err) => {
            println!("Could not send results ({err}). Press s to retry.");
        }
        DeliveryOutcome::Discarded => {}
    }
}

fn render(controller: &QuizController) {
    let session = controller.session();
    let progress = controller.progress();
    let question = session.current_question();
    let chosen = session.answer_for(question.id());

    println!();
    println!(
        "[{}/{}] {}   ({} answered, {} left)",
        progress.current_index + 1,
        progress.total,
        question.prompt(),
        progress.answered,
        format_remaining(progress.remaining_seconds),
    );
    for (i, option) in question.options().iter().enumerate() {
        let marker = if chosen == Some(option.as_str()) { '*' } else { ' ' };
        println!(" {marker} {}) {option}", i + 1);
    }
    if session.is_active() && controller.can_submit() {
        println!("All questions answered. s to submit.");
    }
}

fn print_help() {
    println!("Commands: n next, p previous, g <k> go to question k, <k> pick option k,");
    println!("          s submit, r reset answers, q quit (answers stay saved)");
}
