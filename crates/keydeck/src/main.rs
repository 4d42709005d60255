mod cli;
mod output;

use clap::Parser;
use cli::{Cli, Command, ThemeChoice};
use keydeck_core::{
    ActionOutcome, Console, ConsoleAction, ConsoleConfig, ConsoleConfigStore, ConsoleError,
    DEFAULT_STATS_INTERVAL_SECS, EditForm, FilePreferenceStore, NotificationLevel, Theme,
};
use keydeck_driver_http::HttpBackend;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match load_config(cli.url.as_deref(), cli.page_size) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut console = match open_console(&config) {
        Ok(console) => console,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let succeeded = runtime.block_on(run(&mut console, &config, cli.command));
    print_notifications(&mut console);

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn load_config(url: Option<&str>, page_size: Option<usize>) -> Result<ConsoleConfig, ConsoleError> {
    let mut config = ConsoleConfigStore::new()?.load()?;

    if let Some(url) = url {
        config = config.with_base_url(url);
    }
    if let Some(page_size) = page_size {
        config = config.with_page_size(page_size);
    }

    config.validate()?;
    Ok(config)
}

fn open_console(config: &ConsoleConfig) -> Result<Console, ConsoleError> {
    let backend = HttpBackend::new(config)?;
    let preferences = FilePreferenceStore::new()?;

    Ok(Console::new(
        Arc::new(backend),
        Box::new(preferences),
        config.page_size,
    ))
}

async fn run(console: &mut Console, config: &ConsoleConfig, command: Command) -> bool {
    match command {
        Command::Keys {
            filter,
            sort,
            page,
            html,
        } => {
            let outcome = console.dispatch(ConsoleAction::Reload).await;
            if matches!(outcome, ActionOutcome::Failed(_)) {
                return false;
            }

            console.set_filter(filter.into());
            console.set_sort(sort.into());
            let outcome = console.go_to_page(page);
            print_outcome(console, &outcome, html)
        }

        Command::Search { pattern } => {
            let outcome = console.dispatch(ConsoleAction::Reload).await;
            if matches!(outcome, ActionOutcome::Failed(_)) {
                return false;
            }

            let outcome = console.dispatch(ConsoleAction::Search(pattern)).await;
            print_outcome(console, &outcome, false)
        }

        Command::View { key, html } => {
            let outcome = console.dispatch(ConsoleAction::View(key)).await;
            print_outcome(console, &outcome, html)
        }

        Command::Edit { key, value, ttl } => {
            let outcome = console.dispatch(ConsoleAction::BeginEdit(key)).await;
            let mut form = match outcome {
                ActionOutcome::Form(form) => form,
                other => return print_outcome(console, &other, false),
            };

            if value.is_none() && ttl.is_none() {
                eprintln!("{}", form.hint());
                println!("{}", form.text);
                return true;
            }

            if let Some(value) = value {
                form.text = value;
            }
            if let Some(ttl) = ttl {
                form.ttl = ttl;
            }

            let outcome = console.dispatch(ConsoleAction::Submit(form)).await;
            !matches!(outcome, ActionOutcome::Failed(_))
        }

        Command::Set {
            key,
            key_type,
            value,
            ttl,
        } => {
            let form = EditForm::new_key()
                .with_key(key)
                .with_key_type(key_type.into())
                .with_text(value)
                .with_ttl(ttl);

            let outcome = console.dispatch(ConsoleAction::Submit(form)).await;
            !matches!(outcome, ActionOutcome::Failed(_))
        }

        Command::Delete { key, yes } => {
            let outcome = console.dispatch(ConsoleAction::RequestDelete(key)).await;
            confirm_pending(console, &outcome, yes).await
        }

        Command::Flush { yes } => {
            let outcome = console.dispatch(ConsoleAction::RequestFlush).await;
            confirm_pending(console, &outcome, yes).await
        }

        Command::Ping => {
            let outcome = console.dispatch(ConsoleAction::CheckConnection).await;
            print_outcome(console, &outcome, false)
        }

        Command::Stats { watch } => {
            let outcome = console.dispatch(ConsoleAction::TickStats).await;
            let succeeded = print_outcome(console, &outcome, false);
            if !watch {
                return succeeded;
            }

            let every = config
                .stats_refresh
                .duration()
                .unwrap_or(Duration::from_secs(DEFAULT_STATS_INTERVAL_SECS as u64));
            log::info!("Polling stats every {}s", every.as_secs());

            loop {
                tokio::time::sleep(every).await;
                print_notifications(console);
                let outcome = console.dispatch(ConsoleAction::TickStats).await;
                println!();
                print_outcome(console, &outcome, false);
            }
        }

        Command::Theme { choice } => {
            let outcome = match choice {
                None => ActionOutcome::Theme(console.theme()),
                Some(ThemeChoice::Light) => console.set_theme(Theme::Light),
                Some(ThemeChoice::Dark) => console.set_theme(Theme::Dark),
                Some(ThemeChoice::Toggle) => console.dispatch(ConsoleAction::ToggleTheme).await,
            };
            print_outcome(console, &outcome, false)
        }
    }
}

fn print_outcome(console: &Console, outcome: &ActionOutcome, html: bool) -> bool {
    match outcome {
        ActionOutcome::Table(view) => {
            if html {
                println!("{}", view.to_html());
            } else {
                println!("{}", output::table_text(view, &console.page_meta()));
            }
        }
        ActionOutcome::View(view) => {
            if html {
                println!("{}", view.to_html());
            } else {
                println!("{}", view.to_text());
            }
        }
        ActionOutcome::Form(form) => println!("{}", form.text),
        ActionOutcome::Confirm(pending) => println!("{}", pending.prompt()),
        ActionOutcome::Stats(_) => {
            if let Some(stats) = console.latest_stats() {
                println!(
                    "{}",
                    output::stats_text(stats, console.connection_status())
                );
            }
        }
        ActionOutcome::Theme(theme) => println!("{}", theme.as_str()),
        ActionOutcome::Connection(connected) => return *connected,
        ActionOutcome::Idle => {}
        ActionOutcome::Failed(_) => return false,
    }
    true
}

async fn confirm_pending(console: &mut Console, outcome: &ActionOutcome, yes: bool) -> bool {
    let ActionOutcome::Confirm(pending) = outcome else {
        return print_outcome(console, outcome, false);
    };

    if !yes && !ask(&pending.prompt()) {
        console.dispatch(ConsoleAction::Cancel).await;
        println!("Cancelled");
        return true;
    }

    let outcome = console.dispatch(ConsoleAction::Confirm).await;
    !matches!(outcome, ActionOutcome::Failed(_))
}

fn ask(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(e) => {
            log::warn!("Failed to read confirmation: {}", e);
            false
        }
    }
}

fn print_notifications(console: &mut Console) {
    for notification in console.take_notifications() {
        let line = output::notification_line(&notification);
        match notification.level {
            NotificationLevel::Error => eprintln!("{}", line),
            NotificationLevel::Success | NotificationLevel::Info => println!("{}", line),
        }
    }
}
