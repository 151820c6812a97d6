use std::io::BufRead as _;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use termlayer::render::process::Command;
use termlayer::{
    AnchorWindow, BackendKind, BackendSettings, CellRect, Compositor, CompositorOpts, FixedGrid,
    NativeBackendOpts, ProcessBackendOpts, ResampleFilter, TermlayerResult, create_backend,
};
use tracing_subscriber::EnvFilter;

/// Overlay images on the terminal, driven by JSON commands on stdin.
///
/// Each stdin line is an `add` or `remove` record with an already resolved local `path`.
#[derive(Parser, Debug)]
#[command(name = "termlayer", version)]
struct Cli {
    /// How images are drawn.
    #[arg(long, value_enum, default_value_t = BackendKind::Native)]
    backend: BackendKind,

    /// Renderer executable for the process backend.
    #[arg(long, default_value = "ueberzug")]
    renderer: String,

    /// Terminal width in columns, used when the window manager gives no cell size.
    #[arg(long, env = "COLUMNS")]
    columns: Option<u32>,

    /// Terminal height in lines, used when the window manager gives no cell size.
    #[arg(long, env = "LINES")]
    lines: Option<u32>,

    /// Interval between change checks, in milliseconds.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Modification times closer than this are treated as equal, in milliseconds.
    #[arg(long, default_value_t = 200)]
    granularity_ms: u64,

    /// Resampling filter of the native backend.
    #[arg(long, value_enum, default_value_t = ResampleFilter::Bilinear)]
    resample: ResampleFilter,
}

enum Msg {
    Command(Command),
    Tick,
    InputClosed,
}

/// Server events handled per tick at most.
const EVENTS_PER_TICK: usize = 32;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = backend_settings(&cli)?;
    let backend = create_backend(cli.backend, settings).context("create backend")?;
    let mut compositor = Compositor::new(
        backend,
        CompositorOpts {
            mtime_granularity: Duration::from_millis(cli.granularity_ms),
        },
    );

    let (tx, rx) = mpsc::channel();
    spawn_input(tx.clone());
    spawn_timer(tx, Duration::from_millis(cli.tick_ms.max(1)));

    for msg in rx {
        match msg {
            Msg::Command(cmd) => {
                if let Err(e) = apply(&mut compositor, cmd) {
                    tracing::warn!(error = %e, "command rejected");
                }
            }
            Msg::Tick => pump(&compositor),
            Msg::InputClosed => break,
        }
        if let Err(e) = compositor.render() {
            tracing::error!(error = %e, "render failed");
        }
    }

    compositor.shutdown().context("shut down backend")?;
    Ok(())
}

fn backend_settings(cli: &Cli) -> anyhow::Result<BackendSettings> {
    let mut settings = BackendSettings {
        native: None,
        process: ProcessBackendOpts {
            program: cli.renderer.clone(),
            ..ProcessBackendOpts::default()
        },
    };
    if cli.backend == BackendKind::Native {
        let anchor = AnchorWindow::from_env().context("locate terminal window")?;
        settings.native = Some(NativeBackendOpts {
            resample: cli.resample,
            grid: Arc::new(FixedGrid::new(
                cli.columns.unwrap_or(0),
                cli.lines.unwrap_or(0),
            )),
            ..NativeBackendOpts::new(anchor)
        });
    }
    Ok(settings)
}

fn apply(c: &mut Compositor, cmd: Command) -> TermlayerResult<()> {
    match cmd {
        Command::Add {
            identifier,
            x,
            y,
            path,
            width,
            height,
            draw: _,
            synchronously_draw,
            scaler,
            scaling_position_x,
            scaling_position_y,
        } => {
            c.set_source(&identifier, &path)?;
            c.set_rect(
                &identifier,
                CellRect {
                    x,
                    y,
                    width,
                    height,
                },
            );
            c.set_policy(&identifier, scaler);
            c.set_scaling_position(&identifier, scaling_position_x, scaling_position_y);
            c.set_synchronous(&identifier, synchronously_draw);
            c.set_visible(&identifier, true);
        }
        Command::Remove { identifier, .. } => {
            c.remove_layer(&identifier)?;
        }
    }
    Ok(())
}

fn pump(c: &Compositor) {
    for _ in 0..EVENTS_PER_TICK {
        match c.backend().pump_events(false) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "event pump failed");
                break;
            }
        }
    }
}

fn spawn_input(tx: mpsc::Sender<Msg>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!(error = %e, "read stdin");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Command>(&line) {
                Ok(cmd) => {
                    if tx.send(Msg::Command(cmd)).is_err() {
                        return;
                    }
                }
                Err(e) => tracing::warn!(error = %e, line = %line, "malformed command"),
            }
        }
        let _ = tx.send(Msg::InputClosed);
    });
}

fn spawn_timer(tx: mpsc::Sender<Msg>, tick: Duration) {
    std::thread::spawn(move || {
        loop {
            std::thread::sleep(tick);
            if tx.send(Msg::Tick).is_err() {
                return;
            }
        }
    });
}
