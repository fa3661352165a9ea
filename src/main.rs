use std::sync::Arc;

use benchwatch::run::normalize;
use benchwatch::view::{ConsoleView, ResultView};
use benchwatch::{
    AppError, BenchClient, BenchConfig, Column, DataType, RunController, RunUpdate, SessionEvent,
    SortDirection,
};

#[tokio::main]
async fn main() {
    benchwatch::logging::init();

    if let Err(e) = run().await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = BenchConfig::from_env()?;
    let client = BenchClient::new(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("run-all");

    match command {
        "models" => list_models(&client).await,
        "results" => show_persisted_results(&client).await,
        "run" => {
            let model_id = args.get(1).ok_or_else(|| {
                AppError::Validation("usage: benchwatch run <model-id>".into())
            })?;
            run_single(&client, model_id).await
        }
        "subset" => run_subset(&client).await,
        "problem" => match (args.get(1), args.get(2)) {
            (Some(text), Some(answer)) => update_problem(&client, text, answer).await,
            _ => Err(AppError::Validation(
                "usage: benchwatch problem <text> <answer>".into(),
            )),
        },
        "run-all" => run_all(&client).await,
        other => Err(AppError::Validation(format!(
            "unknown command '{other}' (expected models|results|run|subset|problem|run-all)"
        ))),
    }
}

/// List the models the server can test.
async fn list_models(client: &BenchClient) -> Result<(), AppError> {
    let models = client.list_models().await?;
    if models.is_empty() {
        println!("No models available.");
        return Ok(());
    }
    for model in &models {
        match &model.provider {
            Some(provider) => println!("{:<48} {} ({provider})", model.id, model.name),
            None => println!("{:<48} {}", model.id, model.name),
        }
    }
    Ok(())
}

/// Load results persisted by earlier sessions and show them sorted by
/// score, best first.
async fn show_persisted_results(client: &BenchClient) -> Result<(), AppError> {
    let payloads = client.persisted_results().await?;

    let mut controller = RunController::new();
    let store = controller.store_mut();
    for payload in &payloads {
        store.insert(normalize::normalize(payload));
    }
    store.sort_by(Column::Score, DataType::Number, Some(SortDirection::Desc));

    let mut view = ConsoleView::new();
    view.render_results(controller.store().results(), &controller.store().sort_state());
    Ok(())
}

/// Run the benchmark against one model and show the result.
async fn run_single(client: &BenchClient, model_id: &str) -> Result<(), AppError> {
    tracing::info!(model_id = %model_id, "testing single model");
    let payload = client.run_model(model_id).await?;
    let result = normalize::normalize(&payload);

    let mut controller = RunController::new();
    controller.store_mut().insert(result);

    let mut view = ConsoleView::new();
    view.render_results(controller.store().results(), &controller.store().sort_state());
    Ok(())
}

/// Quick run over the server's subset of models.
async fn run_subset(client: &BenchClient) -> Result<(), AppError> {
    let payloads = client.run_subset().await?;

    let mut controller = RunController::new();
    let store = controller.store_mut();
    for payload in &payloads {
        store.insert(normalize::normalize(payload));
    }
    store.sort_by(Column::Score, DataType::Number, Some(SortDirection::Desc));

    let mut view = ConsoleView::new();
    view.render_results(controller.store().results(), &controller.store().sort_state());
    Ok(())
}

/// Replace the benchmark problem and its expected answer.
async fn update_problem(
    client: &BenchClient,
    problem_text: &str,
    correct_answer: &str,
) -> Result<(), AppError> {
    let response = client.update_problem(problem_text, correct_answer).await?;
    println!("{}", response.message);
    println!("Problem: {}", response.current_problem);
    println!("Expected answer: {}", response.current_correct_answer);
    Ok(())
}

/// Stream a full run, rendering results as they arrive. Ctrl-C cancels.
async fn run_all(client: &BenchClient) -> Result<(), AppError> {
    let mut view = ConsoleView::new();
    let (updates_tx, updates_rx) = std::sync::mpsc::channel::<RunUpdate>();

    let mut controller = RunController::new();
    controller.set_sink(Arc::new(move |update| {
        let _ = updates_tx.send(update.clone());
    }));

    let session = client.open_run_feed().await?;
    controller.start(session);
    drain_updates(&updates_rx, &mut view, &controller);

    enum Step {
        Event(Option<SessionEvent>),
        Interrupt,
    }

    while !controller.state().is_terminal() {
        let step = tokio::select! {
            event = controller.next_event() => Step::Event(event),
            signal = tokio::signal::ctrl_c() => {
                signal?;
                Step::Interrupt
            }
        };
        match step {
            Step::Event(Some(event)) => controller.apply(event),
            Step::Event(None) => break, // feed ended without a terminal envelope
            Step::Interrupt => controller.cancel(),
        }
        drain_updates(&updates_rx, &mut view, &controller);
    }

    view.render_results(controller.store().results(), &controller.store().sort_state());
    Ok(())
}

/// Forward queued controller updates to the view.
fn drain_updates(
    updates: &std::sync::mpsc::Receiver<RunUpdate>,
    view: &mut ConsoleView,
    controller: &RunController,
) {
    for update in updates.try_iter() {
        match update {
            RunUpdate::State { state, message } => view.render_state(state, message.as_deref()),
            RunUpdate::Progress(progress) => view.render_progress(&progress),
            RunUpdate::ResultAdded { index } => {
                if let Some(result) = controller.store().results().get(index) {
                    view.render_result(result);
                }
            }
            RunUpdate::SoftError { model_name, message } => {
                view.render_soft_error(&model_name, &message);
            }
        }
    }
}
