use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use serde_json::Value;
use stream_core::{update, Msg, PagingState, PollPhase, Viewport};
use stream_engine::{
    random_secret, EngineEvent, EngineHandle, JobTokenCodec, NonceIssuer, RecordForwarder,
    ReqwestSearchJobClient, RowFormat, SearchDriver, SearchEndpoints, TableRowRenderer,
};
use stream_logging::{stream_debug, stream_info};

use super::cli::{Cli, Command, SearchOpts};
use super::config::{load_config, StreamConfig};
use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::ui::TerminalUi;

const FORWARD_TIMEOUT: Duration = Duration::from_secs(30);

pub enum UiEvent {
    Engine(Msg),
    /// The user asked for the next screen of rows.
    Scroll,
    InputClosed,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    logging::initialize(LogDestination::from_args(cli.log_file.clone()), cli.verbose);

    let mut config = load_config(&cli.config)?;
    config.apply_env_overrides(|name| std::env::var(name).ok());

    let endpoints = Arc::new(build_endpoints(&config, cli.search.html)?);
    let (engine, events) =
        EngineHandle::new(endpoints.clone()).context("failed to start the engine")?;

    match cli.command {
        Some(Command::Forward { record }) => forward(&engine, &events, &record),
        None => search(&cli.search, &config, &endpoints, engine, events),
    }
}

fn build_endpoints(config: &StreamConfig, html: bool) -> anyhow::Result<SearchEndpoints> {
    let service = config.service();
    let settings = config.api_settings();
    let api = ReqwestSearchJobClient::new(service.clone(), settings.clone())
        .context("failed to build the search API client")?;
    let forwarder = RecordForwarder::new(&service, &settings)
        .context("failed to build the record forwarder")?;
    let driver = Arc::new(SearchDriver::new(Arc::new(api), forwarder, service));

    let secret = config
        .token_secret()
        .map(<[u8]>::to_vec)
        .unwrap_or_else(random_secret);
    let session = format!("cli-{}", std::process::id());
    let format = if html { RowFormat::Html } else { RowFormat::Text };

    Ok(SearchEndpoints::new(
        driver,
        JobTokenCodec::new(secret.clone()),
        NonceIssuer::new(secret, session),
        Arc::new(TableRowRenderer::new(format)),
    )
    .with_page_size(settings.page_size))
}

fn search(
    opts: &SearchOpts,
    config: &StreamConfig,
    endpoints: &SearchEndpoints,
    engine: EngineHandle,
    events: mpsc::Receiver<EngineEvent>,
) -> anyhow::Result<()> {
    let nonce = endpoints
        .issue_nonce()
        .context("failed to issue a request nonce")?;
    let visible_rows = opts.rows.max(1);
    let runner = EffectRunner::new(engine.clone(), nonce);

    let (ui_tx, ui_rx) = mpsc::channel();
    runner.spawn_event_loop(
        events,
        Viewport {
            first_visible_row: 0,
            visible_rows,
        },
        ui_tx.clone(),
    );
    let mut input_open = !opts.all;
    if input_open {
        spawn_input_reader(ui_tx);
    }

    engine.submit(opts.to_args());

    let mut state = PagingState::with_config(config.paging_config());
    let mut ui = TerminalUi::new(io::stdout().lock(), io::stderr().lock());
    let mut opened = false;
    let mut prompted_at = None;

    while let Ok(event) = ui_rx.recv() {
        let mut pending = VecDeque::new();
        match event {
            UiEvent::Engine(msg) => pending.push_back(msg),
            UiEvent::Scroll => pending.push_back(scrolled(&state, visible_rows)),
            UiEvent::InputClosed => input_open = false,
        }

        while let Some(msg) = pending.pop_front() {
            opened |= matches!(msg, Msg::PageOpened { .. });
            let follow = opts.all && keeps_scrolling(&msg);
            let (next, effects) = update(state, msg);
            state = next;
            for message in runner.enqueue(effects) {
                ui.alert(&message)?;
            }
            if follow {
                pending.push_back(scrolled(&state, visible_rows));
            }
        }

        if state.consume_dirty() {
            ui.render(&state.view())?;
        }
        if !opened {
            continue;
        }
        if state.is_settled() {
            stream_debug!("Search settled with {} row(s)", state.loaded_count());
            break;
        }
        if waiting_for_scroll(&state) {
            if !input_open {
                stream_info!("Input closed; stopping at {} row(s)", state.loaded_count());
                break;
            }
            if prompted_at != Some(state.loaded_count()) {
                ui.prompt_more(state.loaded_count(), state.results_count())?;
                prompted_at = Some(state.loaded_count());
            }
        }
    }
    Ok(())
}

fn scrolled(state: &PagingState, visible_rows: u64) -> Msg {
    Msg::ViewportChanged(Viewport::at_bottom(state.loaded_count(), visible_rows))
}

/// With `--all`, every status and every non-empty page counts as a scroll to
/// the bottom. Empty pages wait for the next status.
fn keeps_scrolling(msg: &Msg) -> bool {
    match msg {
        Msg::StatusReceived { .. } => true,
        Msg::PageReceived { count, .. } => *count > 0,
        _ => false,
    }
}

/// Job finished and idle, but more rows only load on scroll.
fn waiting_for_scroll(state: &PagingState) -> bool {
    state.phase() == PollPhase::Terminal && !state.is_loading() && !state.is_settled()
}

fn spawn_input_reader(ui_tx: mpsc::Sender<UiEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() || ui_tx.send(UiEvent::Scroll).is_err() {
                break;
            }
        }
        let _ = ui_tx.send(UiEvent::InputClosed);
    });
}

fn forward(
    engine: &EngineHandle,
    events: &mpsc::Receiver<EngineEvent>,
    record: &str,
) -> anyhow::Result<()> {
    let value: Value = serde_json::from_str(record).context("record is not valid JSON")?;
    let Value::Object(record) = value else {
        bail!("record must be a JSON object");
    };

    engine.forward(record);
    loop {
        let event = events
            .recv_timeout(FORWARD_TIMEOUT)
            .context("no answer from the receiver")?;
        if let EngineEvent::Forwarded { result } = event {
            return match result {
                Ok(()) => {
                    stream_info!("Record forwarded");
                    Ok(())
                }
                Err(err) => bail!("failed to forward record: {err}"),
            };
        }
    }
}
