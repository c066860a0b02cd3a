mod app;
mod cli;
mod heartbeat;
mod injector;
mod jiggle;
mod log_file;
mod ticker;


use eframe::egui;
use std::{io::BufRead, process::ExitCode};

#[derive(Debug, thiserror::Error)]
enum LaunchError {
    #[error("failed to create window: {0}")]
    Window(#[from] eframe::Error),
}

fn native_options(title: String) -> eframe::NativeOptions {
    let mut opts = eframe::NativeOptions::default();
    opts.viewport = egui::ViewportBuilder::default()
        .with_title(title)
        .with_inner_size(egui::vec2(640.0, 160.0))
        .with_resizable(true);
    opts.follow_system_theme = true;
    opts
}

/// Parks until Enter is pressed so a debugger can attach.
fn wait_for_debugger() {
    let pid = std::process::id();
    tracing::info!(pid, "waiting for debugger");
    eprintln!("kiseger: pid {pid} waiting for debugger, press Enter to continue");
    let _ = std::io::stdin().lock().lines().next();
}

fn run(log: Option<log_file::LogFile>) -> Result<(), LaunchError> {
    let title = log_file::title(log.as_ref());
    eframe::run_native(
        "Kiseger",
        native_options(title),
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(app::KisegerApp::new(cc.egui_ctx.clone(), injector::EnigoSink::new, log))
        }),
    )?;
    Ok(())
}

fn main() -> ExitCode {
    let invocation = match cli::parse(std::env::args_os().map(|a| a.to_string_lossy().into_owned())) {
        Ok(invocation) => invocation,
        Err(err) => {
            eprintln!("kiseger: {err}");
            cli::Invocation::default()
        }
    };

    // No log file means no logging at all.
    let log = log_file::LogFile::reserve().ok();
    if let Some(log) = &log {
        log_file::init(log, invocation.args.debug_break);
    }
    for rejected in &invocation.rejected {
        tracing::warn!(%rejected, "skipping argument");
    }

    if invocation.args.help {
        let usage = cli::usage();
        tracing::info!(%usage, "usage requested");
        print!("{usage}");
        if let Some(log) = &log {
            log.finish();
        }
        return ExitCode::from(2);
    }

    if invocation.args.debug_break {
        wait_for_debugger();
    }

    let code = match run(log.clone()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "startup failed");
            eprintln!("kiseger: {err}");
            ExitCode::FAILURE
        }
    };
    if let Some(log) = &log {
        log.finish();
    }
    code
}
