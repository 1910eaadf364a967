mod attendance;
mod backend;
mod backup;
mod calendar;
mod db;
mod error;
mod instructor_attendance;
mod ipc;
mod model;
mod navigation;
mod remote;
mod render;
mod roster;
mod store;

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// JSON-lines attendance daemon: one request per stdin line, one response
/// per stdout line.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Workspace directory to open at start.
    #[arg(long, env = "ROLLCALL_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Base URL of the attendance service; starts in remote mode.
    #[arg(long, env = "ROLLCALL_REMOTE")]
    remote: Option<String>,

    /// Year whose January-March school days make up a student's history.
    #[arg(long, env = "ROLLCALL_ACADEMIC_YEAR", default_value_t = 2025)]
    academic_year: i32,
}

fn main() {
    let args = Args::parse();

    // stdout carries responses, so logs go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let mut state = ipc::AppState::new(args.academic_year);
    ipc::bootstrap(&mut state, args.workspace.as_deref(), args.remote.as_deref());
    log::info!(
        "rollcalld {} ready ({} backend)",
        env!("CARGO_PKG_VERSION"),
        state.backend_mode()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                log::warn!("dropping malformed request: {}", e);
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    log::info!("stdin closed, exiting");
}
