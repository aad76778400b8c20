#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::Window;

use window_restorer::config::Config;
use window_restorer::constants;
use window_restorer::event_handler::{WatchStatus, handle_event};
use window_restorer::x11_utils::{AppContext, X11Screens, X11Window, parse_window_id};
use window_restorer::{GeometryReconciler, GeometryStore};

#[derive(Parser)]
#[command(name = "window-restorer", version, about = "Save and restore X11 window geometry")]
struct Cli {
    /// Geometry file (defaults to <config dir>/<app>/window-geometry.json)
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Application name used to locate the geometry file
    #[arg(long, global = true, default_value = constants::config::APP_DIR)]
    app: String,

    /// trace, debug, info, warn or error (overrides LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print stored geometry, for one code or all of them
    Show { code: Option<String> },
    /// Apply stored geometry to a window
    Restore(WindowArgs),
    /// Store the current geometry of a window
    Capture(WindowArgs),
    /// Restore a window, then store its geometry when it is destroyed
    Watch(WindowArgs),
}

#[derive(Args)]
struct WindowArgs {
    /// X11 window id, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_window_id)]
    window: Window,

    /// Window-code the geometry is stored under
    #[arg(long)]
    code: String,
}

fn show(config: &Config, code: Option<&str>) -> Result<()> {
    let store = config.json_store()?;
    let document = store.load()?;
    match code {
        Some(code) => match document.record(code) {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("no geometry stored for '{code}'"),
        },
        None => println!("{}", serde_json::to_string_pretty(document.as_map())?),
    }
    Ok(())
}

fn reconciler_for(config: &Config, ctx: &Rc<AppContext>) -> GeometryReconciler {
    let store: Rc<dyn GeometryStore> = config.open_store();
    info!(store = store.name(), "Using geometry store");
    GeometryReconciler::new(store, Rc::new(X11Screens::new(ctx.clone())))
}

fn watch(ctx: &Rc<AppContext>, reconciler: &GeometryReconciler, args: &WindowArgs) -> Result<()> {
    let window = X11Window::new(ctx.clone(), args.window)?;
    reconciler.restore(&window, &args.code);
    reconciler.capture_on_close(&window, &args.code);
    ctx.conn.flush().context("Failed to flush X11 connection")?;
    info!(window = args.window, code = %args.code, "Watching window until it is destroyed");

    loop {
        let event = ctx
            .conn
            .wait_for_event()
            .context("Lost connection to the X server")?;
        match handle_event(&window, event) {
            Ok(WatchStatus::Closed) => return Ok(()),
            Ok(WatchStatus::Open) => {}
            Err(err) => error!("encountered error in 'handle_event': err={err:#?}"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.file, &cli.app, cli.log_level.as_deref());

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Command::Show { code } = &cli.command {
        return show(&config, code.as_deref());
    }

    let ctx = AppContext::connect()?;
    let screen = ctx.screen();
    info!("successfully connected to x11: screen={}, dimensions={}x{}",
          ctx.screen_num, screen.width_in_pixels, screen.height_in_pixels);
    let reconciler = reconciler_for(&config, &ctx);

    match &cli.command {
        Command::Show { .. } => Ok(()),
        Command::Restore(args) => {
            let window = X11Window::new(ctx.clone(), args.window)?;
            if reconciler.restore(&window, &args.code) {
                println!("restored '{}' on window {:#x}", args.code, args.window);
            } else {
                println!("no geometry restored for '{}'", args.code);
            }
            Ok(())
        }
        Command::Capture(args) => {
            let window = X11Window::new(ctx.clone(), args.window)?;
            let record = reconciler
                .capture(&window, &args.code)
                .with_context(|| format!("Failed to store geometry for '{}'", args.code))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Command::Watch(args) => watch(&ctx, &reconciler, args),
    }
}
