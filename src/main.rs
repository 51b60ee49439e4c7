use std::{process, sync::Arc};

use log::{error, info};
use render_bench::{
    core::{Mode, Scene},
    create_clap_command,
    engine::{StaticSelection, SyntheticEngineFactory},
    handle_clap_matches, logging,
    session::ConsoleListener,
    CliAction, Harness, HarnessConfig, HarnessContext, RunOutcome,
};

fn main() {
    let matches = create_clap_command().get_matches();
    let action = match handle_clap_matches(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    let code = match action {
        CliAction::List => {
            list();
            0
        }
        CliAction::Run(config) => run(config),
    };
    process::exit(code);
}

fn list() {
    println!("Modes:");
    for mode in Mode::ALL {
        println!("  {:<36} {}", mode.id(), mode);
    }
    println!("Scenes:");
    for scene in Scene::ALL {
        let note = if scene.is_available() {
            ""
        } else {
            " (not available on this platform)"
        };
        println!("  {:<12} {}{}", scene.id(), scene, note);
    }
}

fn run(config: HarnessConfig) -> i32 {
    if let Err(e) = logging::init(config.log_level, config.log_file.as_deref()) {
        eprintln!("{}", e);
        return 1;
    }
    logging::install_panic_hook();
    info!("render_bench v{}", env!("CARGO_PKG_VERSION"));
    info!("{}", config);
    info!("{}", config.scene.credits());

    let mut ctx = HarnessContext::new(
        Arc::new(SyntheticEngineFactory),
        Arc::new(ConsoleListener::default()),
    )
    .single_run(config.single_run);
    if let Some(selection) = config.device_selection.clone() {
        ctx = ctx.with_hardware(Arc::new(StaticSelection(selection)));
    }

    let mut harness = Harness::new(ctx).exit_when_idle(true);
    let outcome = harness.run(config.mode, config.scene);
    // Joins every worker before the process goes away.
    drop(harness);

    match outcome {
        Ok(RunOutcome::Exit(report)) => {
            println!("{}", report);
            report.exit_code()
        }
        Ok(RunOutcome::Idle {
            error: Some(message),
            ..
        }) => {
            error!("paused after engine error: {}", message);
            1
        }
        Ok(RunOutcome::Idle {
            result: Some(_), ..
        })
        | Ok(RunOutcome::Shutdown) => 0,
        Ok(RunOutcome::Idle { result: None, .. }) => {
            if config.mode == Mode::Paused {
                0
            } else {
                error!("no session could be started");
                1
            }
        }
        Err(e) => {
            error!("{}", e);
            if e.is_invalid_request() {
                2
            } else {
                1
            }
        }
    }
}
