use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;

use operator_assist_lib::{
    alerts::{standard_alerts, SafetyAlert},
    capabilities::Capability,
    checklist::{CheckStatus, ChecklistState},
    console::{parse_line, ConsoleCommand, HELP},
    init_logging,
    jobs::Job,
    narration::{ConsoleSynthesizer, ViewSnapshots, PRIMARY_REGION},
    offline::{spawn_connectivity_monitor, ConnectivityState},
    settings::{resolve_data_dir, NarrationSettings},
    voice::View,
    OperatorAssistant, Platform,
};

fn render_checklist(state: &ChecklistState) -> String {
    let Some(section) = state.current() else {
        return "No inspection sections".to_string();
    };

    let mut lines = vec![format!(
        "{} ({} of {}), {}% complete",
        section.title,
        state.current_section + 1,
        state.inspection.sections.len(),
        state.inspection.progress_percent()
    )];
    for check in &section.checks {
        let mark = match check.status {
            CheckStatus::NotStarted => " ",
            CheckStatus::Completed => "✓",
            CheckStatus::Failed => "✗",
        };
        let note = check
            .note
            .as_deref()
            .map(|note| format!(" ({note})"))
            .unwrap_or_default();
        lines.push(format!("[{mark}] {}: {}{note}", check.id, check.prompt));
    }
    lines.join("\n")
}

fn render_jobs(jobs: &[Job]) -> String {
    jobs.iter()
        .map(|job| {
            format!(
                "#{} {} [{} / {}] {} -> {}",
                job.id,
                job.title,
                job.status.as_str(),
                job.priority.as_str(),
                job.location,
                job.destination
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_alerts(alerts: &[SafetyAlert]) -> String {
    alerts
        .iter()
        .map(|alert| {
            format!(
                "!{} [{} P{}] {}",
                alert.id,
                alert.level.as_str(),
                alert.priority,
                alert.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn render_view(assistant: &OperatorAssistant) -> String {
    match assistant.voice.current_view() {
        View::Dashboard => assistant.status_summary().await,
        View::Inspection => render_checklist(&assistant.checklist.snapshot().await),
        View::Jobs => render_jobs(&assistant.jobs.jobs().await),
    }
}

async fn handle(
    assistant: &OperatorAssistant,
    connectivity: &mpsc::Sender<ConnectivityState>,
    command: ConsoleCommand,
) -> Result<bool> {
    match command {
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Online => connectivity.send(ConnectivityState::Online).await?,
        ConsoleCommand::Offline => connectivity.send(ConnectivityState::Offline).await?,
        ConsoleCommand::Sync => println!("{:?}", assistant.store.sync().await),
        ConsoleCommand::Say(phrase) => {
            assistant.voice.handle_transcript(&phrase);
        }
        ConsoleCommand::Listen => {
            assistant.voice.toggle();
        }
        ConsoleCommand::Read => {
            assistant.narration.read_current_view(None);
        }
        ConsoleCommand::Pass(check_id) => {
            assistant
                .checklist
                .record_result(&check_id, CheckStatus::Completed)
                .await?;
        }
        ConsoleCommand::Fail(check_id) => {
            assistant
                .checklist
                .record_result(&check_id, CheckStatus::Failed)
                .await?;
        }
        ConsoleCommand::Reset(check_id) => {
            assistant.checklist.reset_check(&check_id).await?;
        }
        ConsoleCommand::Note { check_id, text } => {
            assistant.checklist.add_note(&check_id, &text).await?;
        }
        ConsoleCommand::Photo { check_id, path } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let photo = assistant.checklist.attach_photo(&check_id, bytes).await?;
            println!(
                "saved {} ({}x{} {})",
                photo.id, photo.width, photo.height, photo.format
            );
        }
        ConsoleCommand::Next => {
            assistant.checklist.advance_section().await;
        }
        ConsoleCommand::Prev => {
            assistant.checklist.retreat_section().await;
        }
        ConsoleCommand::Guide => {
            assistant.checklist.voice_guide().await;
        }
        ConsoleCommand::Checklist => {
            assistant.voice.navigate(View::Inspection);
            println!("{}", render_checklist(&assistant.checklist.snapshot().await));
        }
        ConsoleCommand::Progress => {
            let progress = assistant.checklist.progress().await;
            println!("{progress:.0}%");
            assistant
                .narration
                .speak(&format!("Inspection {progress:.0} percent complete"));
        }
        ConsoleCommand::Complete => {
            let record = assistant.checklist.complete_inspection().await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        ConsoleCommand::Jobs => {
            assistant.voice.navigate(View::Jobs);
            println!("{}", render_jobs(&assistant.jobs.jobs().await));
        }
        ConsoleCommand::Summary => {
            assistant.jobs.summarize().await;
        }
        ConsoleCommand::Start(id) => {
            assistant.jobs.start_job(id).await?;
        }
        ConsoleCommand::Done(id) => {
            assistant.jobs.complete_job(id).await?;
        }
        ConsoleCommand::Select(id) => {
            assistant.jobs.select_job(id).await?;
        }
        ConsoleCommand::Navigate(id) => {
            assistant
                .jobs
                .focus_for_navigation(id, &assistant.geolocation)
                .await?;
        }
        ConsoleCommand::Instructions => {
            if assistant.jobs.read_navigation_instructions().await.is_none() {
                println!("not navigating");
            }
        }
        ConsoleCommand::Status => {
            assistant.read_status().await;
        }
        ConsoleCommand::Alerts => {
            println!("{}", render_alerts(&assistant.alerts.alerts().await));
            assistant.alerts.speak_all().await;
        }
        ConsoleCommand::Hear(id) => {
            assistant.alerts.speak_alert(id).await?;
        }
        ConsoleCommand::Dismiss(id) => {
            assistant.alerts.dismiss(id).await?;
        }
        ConsoleCommand::Raise {
            level,
            priority,
            message,
        } => {
            assistant.alerts.raise(level, &message, priority).await;
        }
        ConsoleCommand::Rate(rate) => {
            assistant.update_narration(NarrationSettings {
                rate,
                ..assistant.settings.narration()
            })?;
        }
        ConsoleCommand::Reload => assistant.reload_settings()?,
        ConsoleCommand::Stop => assistant.narration.stop(),
        ConsoleCommand::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    info!("Operator Assist starting up...");

    let data_dir = resolve_data_dir()?;
    let views = Arc::new(ViewSnapshots::new());
    let platform = Platform {
        synthesizer: Capability::Available(Arc::new(ConsoleSynthesizer::new())),
        views: Capability::Available(views.clone()),
        ..Platform::default()
    };

    let assistant =
        OperatorAssistant::bootstrap(&data_dir, platform, ConnectivityState::Online).await?;
    info!("Data directory: {}", data_dir.display());

    let cancel_token = CancellationToken::new();
    let (connectivity_tx, connectivity_rx) = mpsc::channel(8);
    let monitor = spawn_connectivity_monitor(
        assistant.store.clone(),
        connectivity_rx,
        cancel_token.clone(),
    );

    for (level, message, priority) in standard_alerts() {
        assistant.alerts.raise(level, message, priority).await;
    }

    views.publish(PRIMARY_REGION, render_view(&assistant).await);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match handle(&assistant, &connectivity_tx, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                error!("{err:?}");
                println!("{err}");
            }
        }

        views.publish(PRIMARY_REGION, render_view(&assistant).await);
    }

    cancel_token.cancel();
    monitor.await.context("connectivity monitor failed to join")?;
    assistant.shutdown().await
}
