use std::{env, process::ExitCode, sync::Arc};

use clap::Parser;
use time::{Date, macros::format_description};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use expense_tracker_client::{
    Category, ClientConfig, Credentials, DeleteStrategy, ExpenseId, FilterChange, HyperTransport,
    ListConfig, ListController, LoggingTransport, RestExpenseService, Session, SessionContext,
    UserProfile,
};

/// The environment variable holding a bearer token from an earlier log in.
const TOKEN_VAR: &str = "EXPENSES_TOKEN";

/// List and delete expenses stored on an expense tracker server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The URL the API is served under.
    #[arg(long, default_value = "http://localhost:8080/api")]
    base_url: String,

    /// Log in as this user. The password is prompted for.
    ///
    /// Without this, the token in the EXPENSES_TOKEN environment variable is used.
    #[arg(long)]
    email: Option<String>,

    /// The page to show, starting from 1.
    #[arg(short, long, default_value_t = 1)]
    page: i64,

    /// The number of expenses per page.
    #[arg(short = 's', long, default_value_t = 10)]
    page_size: u64,

    /// Only show expenses in this category, e.g. "food" or "Personal Care".
    #[arg(short, long)]
    category: Option<Category>,

    /// Only show expenses on or after this date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    start_date: Option<Date>,

    /// Only show expenses on or before this date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    end_date: Option<Date>,

    /// Delete the expense with this ID from the displayed page.
    #[arg(long)]
    delete: Option<ExpenseId>,

    /// How to update the list after a delete: "refetch" or "local-splice".
    #[arg(long, default_value = "refetch")]
    strategy: DeleteStrategy,
}

fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("expected a date like 2024-01-31: {error}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let args = Args::parse();

    let client_config = ClientConfig::new(&args.base_url);
    let transport = LoggingTransport::new(HyperTransport::new(client_config.timeout));
    let session = SessionContext::new();

    if let Ok(token) = env::var(TOKEN_VAR) {
        session.establish(Session::new(&token, UserProfile::default()));
    }

    let service = Arc::new(RestExpenseService::new(
        client_config,
        transport,
        session.clone(),
    ));

    if let Some(email) = &args.email {
        let password = match rpassword::prompt_password("Password: ") {
            Ok(password) => password,
            Err(error) => {
                eprintln!("Could not read the password: {error}");
                return ExitCode::FAILURE;
            }
        };

        if let Err(error) = service.log_in(&Credentials::new(email, &password)).await {
            let message = error.user_message();
            eprintln!("{}: {}", message.message, message.details);
            return ExitCode::FAILURE;
        }
    } else if !session.is_active() {
        tracing::warn!("No {TOKEN_VAR} set and no --email given, requests will be anonymous");
    }

    let list_config = ListConfig {
        default_page_size: args.page_size,
        delete_strategy: args.strategy,
        ..ListConfig::default()
    };

    let mut controller = match ListController::new(service, list_config) {
        Ok(controller) => controller,
        Err(error) => {
            let message = error.user_message();
            eprintln!("{}: {}", message.message, message.details);
            return ExitCode::FAILURE;
        }
    };

    controller
        .set_filter(
            FilterChange::new()
                .category(args.category)
                .start_date(args.start_date)
                .end_date(args.end_date),
        )
        .await;

    if args.page > 1 {
        controller.set_page(args.page - 1).await;
    }

    if let Some(id) = args.delete {
        controller.delete_record(id).await;
    }

    let state = controller.state();

    if let Some(message) = state.error_message() {
        eprintln!("{}: {}", message.message, message.details);
        return ExitCode::FAILURE;
    }

    if state.content().is_empty() {
        println!("No expenses found.");
    }

    for record in state.content() {
        println!(
            "{:>6}  {}  {} {:<16} {:>10}  {}",
            record.id(),
            record.date(),
            record.category().icon(),
            record.category().label(),
            format!("${:.2}", record.amount()),
            record.description()
        );
    }

    println!("\n{}", controller.navigation().label);

    ExitCode::SUCCESS
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
